//! The entry model: one typed data record inside a var.
//!
//! An entry is a meta envelope (meta length, type ID, name, optional
//! version/archived pair) wrapped around an opaque data payload. The type ID
//! names the [`EntryKind`] that governs how the payload is interpreted;
//! entries parsed generically self-coerce to the registered kind for their
//! type ID, or stay [`EntryKind::Generic`] when none is registered.
//!
//! # Wire layout
//!
//! `[2 LE meta_length][2 LE data_length][1 type_id][8 name][version?]
//! [archived?][2 LE data_length (repeated)][data]`, where the version and
//! archived bytes are present iff the meta length is 13.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use std::sync::{OnceLock, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tivar_model::{MODELS, Model, OsVersion};

use crate::diag::{Diagnostics, Warning};
use crate::error::{Result, VarError};
use crate::field::{BOOLEAN, BYTES, ByteReader, Codec, INTEGER, Section};
use crate::header::HEADER_LEN;
use crate::token;

/// Meta length of an entry without flash bytes.
pub const BASE_META_LENGTH: u16 = 11;

/// Meta length of an entry carrying version and archived bytes.
pub const FLASH_META_LENGTH: u16 = 13;

/// The "no type" sentinel; entries with this ID are never coerced.
pub const SENTINEL_TYPE_ID: u8 = 0xFF;

/// Length of a real number's data section.
pub(crate) const REAL_WIDTH: usize = 9;

/// Length of a complex number's data section (two real components).
pub(crate) const COMPLEX_WIDTH: usize = 18;

const TYPE_ID: Section<u64> = Section::new("type_id", Some(1), INTEGER);
const VERSION: Section<u64> = Section::new("version", Some(1), INTEGER);
const ARCHIVED: Section<bool> = Section::new("archived", Some(1), BOOLEAN);
const DATA: Section<Vec<u8>> = Section::new("data", None, BYTES);

const NAME_CODEC: Codec<String> = Codec {
    encode: |value| token::encode_name(value),
    decode: token::decode_name,
};
const NAME: Section<String> = Section::new("name", Some(8), NAME_CODEC);

const LIST_NAME_CODEC: Codec<String> = Codec {
    encode: |value| token::encode_list_name(value),
    decode: token::decode_list_name,
};
const LIST_NAME: Section<String> = Section::new("name", Some(8), LIST_NAME_CODEC);

/// How an entry kind's data section is consumed from a raw stream.
///
/// Inside a group payload, entries carry no envelope; this shape tells the
/// parser how many bytes belong to each one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DataShape {
    /// Exactly this many bytes.
    Fixed(usize),
    /// A 2-byte LE element count, then count × element-width bytes.
    Counted(usize),
    /// A width byte, a height byte, then width × height real elements.
    Grid,
    /// A 2-byte LE payload length, then that many bytes.
    Sized,
    /// Everything remaining.
    Rest,
}

/// The closed set of entry kinds this crate can interpret.
///
/// `Generic` carries entries whose type ID has no registered kind (including
/// the 0xFF sentinel); their data stays opaque.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Real,
    Complex,
    RealList,
    ComplexList,
    Matrix,
    Equation,
    StringVar,
    Program,
    ProtectedProgram,
    Group,
    Generic,
}

impl EntryKind {
    /// The type ID this kind registers under.
    #[must_use]
    pub fn type_id(self) -> u8 {
        match self {
            Self::Real => 0x00,
            Self::RealList => 0x01,
            Self::Matrix => 0x02,
            Self::Equation => 0x03,
            Self::StringVar => 0x04,
            Self::Program => 0x05,
            Self::ProtectedProgram => 0x06,
            Self::Complex => 0x0C,
            Self::ComplexList => 0x0D,
            Self::Group => 0x17,
            Self::Generic => SENTINEL_TYPE_ID,
        }
    }

    /// Human-readable kind label, used in error messages.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Real => "real",
            Self::Complex => "complex",
            Self::RealList => "real list",
            Self::ComplexList => "complex list",
            Self::Matrix => "matrix",
            Self::Equation => "equation",
            Self::StringVar => "string",
            Self::Program => "program",
            Self::ProtectedProgram => "protected program",
            Self::Group => "group",
            Self::Generic => "generic",
        }
    }

    /// The legal version bytes for this kind; the first is the default.
    #[must_use]
    pub fn versions(self) -> &'static [u8] {
        match self {
            Self::RealList | Self::ComplexList | Self::Matrix => &[0x00, 0x0B, 0x10],
            Self::Equation | Self::StringVar | Self::Program | Self::ProtectedProgram => &[
                0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x0A, 0x0B, 0x0C, 0x20, 0x21, 0x22,
                0x23, 0x24, 0x25, 0x26, 0x2A, 0x2B, 0x2C,
            ],
            _ => &[0x00],
        }
    }

    /// The minimum length of this kind's data section.
    #[must_use]
    pub fn min_data_length(self) -> usize {
        match self.shape() {
            DataShape::Fixed(width) => width,
            DataShape::Rest => 0,
            _ => 2,
        }
    }

    pub(crate) fn shape(self) -> DataShape {
        match self {
            Self::Real => DataShape::Fixed(REAL_WIDTH),
            Self::Complex => DataShape::Fixed(COMPLEX_WIDTH),
            Self::RealList => DataShape::Counted(REAL_WIDTH),
            Self::ComplexList => DataShape::Counted(COMPLEX_WIDTH),
            Self::Matrix => DataShape::Grid,
            Self::Equation | Self::StringVar | Self::Program | Self::ProtectedProgram
            | Self::Group => DataShape::Sized,
            Self::Generic => DataShape::Rest,
        }
    }

    /// The default on-calc name for a fresh entry of this kind.
    #[must_use]
    pub fn default_name(self) -> &'static str {
        match self {
            Self::RealList | Self::ComplexList => "L1",
            Self::Matrix => "[A]",
            Self::Group => "GROUP",
            _ => "UNNAMED",
        }
    }

    fn uses_list_name(self) -> bool {
        matches!(self, Self::RealList | Self::ComplexList)
    }

    fn extension_letter(self) -> char {
        match self {
            Self::Real => 'n',
            Self::Complex => 'c',
            Self::RealList | Self::ComplexList => 'l',
            Self::Matrix => 'm',
            Self::Equation => 'y',
            Self::StringVar => 's',
            Self::Program | Self::ProtectedProgram => 'p',
            Self::Group | Self::Generic => 'g',
        }
    }

    /// The file extension for a single-entry var of this kind, targeted at
    /// `model` (the generic `8x` prefix when no model is given).
    #[must_use]
    pub fn extension(self, model: Option<&Model>) -> String {
        let prefix = match model.map(|m| m.magic) {
            Some("**TI82**") => "82",
            Some("**TI83**") => "83",
            _ => "8x",
        };
        format!("{prefix}{}", self.extension_letter())
    }
}

fn builtin_kinds() -> BTreeMap<u8, EntryKind> {
    [
        EntryKind::Real,
        EntryKind::RealList,
        EntryKind::Matrix,
        EntryKind::Equation,
        EntryKind::StringVar,
        EntryKind::Program,
        EntryKind::ProtectedProgram,
        EntryKind::Complex,
        EntryKind::ComplexList,
        EntryKind::Group,
    ]
    .into_iter()
    .map(|kind| (kind.type_id(), kind))
    .collect()
}

static KIND_REGISTRY: OnceLock<RwLock<BTreeMap<u8, EntryKind>>> = OnceLock::new();

fn registry() -> &'static RwLock<BTreeMap<u8, EntryKind>> {
    KIND_REGISTRY.get_or_init(|| RwLock::new(builtin_kinds()))
}

fn registry_read() -> RwLockReadGuard<'static, BTreeMap<u8, EntryKind>> {
    match registry().read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn registry_write() -> RwLockWriteGuard<'static, BTreeMap<u8, EntryKind>> {
    match registry().write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Map a type ID onto a kind in the process-wide registry.
///
/// The last registration for a given ID wins.
pub fn register_kind(type_id: u8, kind: EntryKind) {
    registry_write().insert(type_id, kind);
}

/// The kind registered for a type ID, if any.
#[must_use]
pub fn registered_kind(type_id: u8) -> Option<EntryKind> {
    registry_read().get(&type_id).copied()
}

/// Options for constructing an [`Entry`].
#[derive(Debug, Clone)]
pub struct EntryOptions {
    /// The kind of the new entry.
    pub kind: EntryKind,
    /// Whether the entry carries flash bytes (meta length 13 vs. 11).
    pub for_flash: bool,
    /// On-calc name; defaults per kind.
    pub name: Option<String>,
    /// Version byte; defaults to the kind's computed version.
    pub version: Option<u8>,
    /// Archived flag.
    pub archived: Option<bool>,
    /// Initial data section.
    pub data: Option<Vec<u8>>,
}

impl EntryOptions {
    #[must_use]
    pub fn new(kind: EntryKind) -> Self {
        Self {
            kind,
            for_flash: true,
            name: None,
            version: None,
            archived: None,
            data: None,
        }
    }

    /// Build a flashless (11-byte-meta) entry.
    #[must_use]
    pub fn flashless(mut self) -> Self {
        self.for_flash = false;
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_version(mut self, version: u8) -> Self {
        self.version = Some(version);
        self
    }

    #[must_use]
    pub fn with_archived(mut self, archived: bool) -> Self {
        self.archived = Some(archived);
        self
    }

    #[must_use]
    pub fn with_data(mut self, data: Vec<u8>) -> Self {
        self.data = Some(data);
        self
    }
}

/// One typed data record inside a var.
#[derive(Debug, Clone)]
pub struct Entry {
    meta_length: u16,
    type_id: Vec<u8>,
    name: Vec<u8>,
    version: Vec<u8>,
    archived: Vec<u8>,
    data: Vec<u8>,
    kind: EntryKind,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.bytes() == other.bytes()
    }
}

impl Eq for Entry {}

impl Entry {
    /// Create an empty flash entry of the given kind with default fields.
    #[must_use]
    pub fn new(kind: EntryKind) -> Self {
        let (entry, _) = Self::with_options(&EntryOptions::new(kind));
        entry
    }

    /// Create an entry from options.
    ///
    /// Requesting a version or archived flag on a flashless entry is
    /// reported as a warning and ignored, matching on-calc behavior.
    pub fn with_options(options: &EntryOptions) -> (Self, Diagnostics) {
        let mut diag = Diagnostics::new();
        let mut entry = Self {
            meta_length: if options.for_flash {
                FLASH_META_LENGTH
            } else {
                BASE_META_LENGTH
            },
            type_id: vec![options.kind.type_id()],
            name: Vec::new(),
            version: vec![0x00],
            archived: vec![0x00],
            data: Vec::new(),
            kind: options.kind,
        };

        let name = options
            .name
            .clone()
            .unwrap_or_else(|| options.kind.default_name().to_string());
        entry.set_name(&name, &mut diag);
        entry.clear();

        if options.for_flash {
            if let Some(archived) = options.archived {
                ARCHIVED.set(&mut entry.archived, &archived, &mut diag);
            }
        } else if options.version.is_some() || options.archived.is_some() {
            diag.warn(Warning::FlashlessVersioning);
        }

        if let Some(data) = &options.data {
            DATA.set(&mut entry.data, data, &mut diag);
            entry.coerce(&mut diag);
        }

        let version = options.version.filter(|_| options.for_flash);
        let version = version.unwrap_or_else(|| entry.get_version());
        VERSION.set(&mut entry.version, &u64::from(version), &mut diag);

        (entry, diag)
    }

    /// The kind governing this entry's data.
    #[must_use]
    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    /// The stored type ID byte.
    #[must_use]
    pub fn type_id(&self) -> u8 {
        TYPE_ID.get(&self.type_id) as u8
    }

    /// The meta-envelope length: 11 without flash bytes, 13 with.
    #[must_use]
    pub fn meta_length(&self) -> u16 {
        self.meta_length
    }

    /// The entry's name, decoded per its kind's name convention.
    #[must_use]
    pub fn name(&self) -> String {
        if self.kind.uses_list_name() {
            LIST_NAME.get(&self.name)
        } else {
            NAME.get(&self.name)
        }
    }

    pub fn set_name(&mut self, name: &str, diag: &mut Diagnostics) {
        let name = name.to_string();
        if self.kind.uses_list_name() {
            LIST_NAME.set(&mut self.name, &name, diag);
        } else {
            NAME.set(&mut self.name, &name, diag);
        }
    }

    /// The version byte (0 on flashless entries).
    #[must_use]
    pub fn version(&self) -> u8 {
        VERSION.get(&self.version) as u8
    }

    pub fn set_version(&mut self, version: u8, diag: &mut Diagnostics) {
        VERSION.set(&mut self.version, &u64::from(version), diag);
    }

    /// Whether the entry is archived.
    #[must_use]
    pub fn archived(&self) -> bool {
        ARCHIVED.get(&self.archived)
    }

    /// Archive this entry. Fails on flashless entries, which have nowhere
    /// to record the flag.
    pub fn archive(&mut self) -> Result<()> {
        self.set_archive_flag(true)
    }

    /// Unarchive this entry. Fails on flashless entries.
    pub fn unarchive(&mut self) -> Result<()> {
        self.set_archive_flag(false)
    }

    fn set_archive_flag(&mut self, archived: bool) -> Result<()> {
        if self.flash_bytes().is_empty() {
            return Err(VarError::unsupported(
                "flashless entries do not support archiving",
            ));
        }

        let mut diag = Diagnostics::new();
        ARCHIVED.set(&mut self.archived, &archived, &mut diag);
        Ok(())
    }

    /// The raw data section.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn set_data(&mut self, data: Vec<u8>) {
        self.data = data;
    }

    /// The raw data slot, for view-based access by the composite types.
    pub(crate) fn data_mut(&mut self) -> &mut Vec<u8> {
        &mut self.data
    }

    /// Length of the data section in bytes.
    #[must_use]
    pub fn data_length(&self) -> usize {
        self.data.len()
    }

    /// Total serialized length: `2 + meta_length + 2 + data_length`.
    #[must_use]
    pub fn total_length(&self) -> usize {
        2 + usize::from(self.meta_length) + 2 + self.data.len()
    }

    /// The version + archived byte pair, present only with a flash-capable
    /// meta length.
    #[must_use]
    pub fn flash_bytes(&self) -> Vec<u8> {
        let take = usize::from(self.meta_length.saturating_sub(BASE_META_LENGTH)).min(2);
        let mut out = Vec::with_capacity(take);
        out.extend_from_slice(&self.version);
        out.extend_from_slice(&self.archived);
        out.truncate(take);
        out
    }

    /// Whether the entry holds no user data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self.kind.shape() {
            DataShape::Sized => crate::types::sized_length(&self.data) == 0,
            _ => self.data.is_empty(),
        }
    }

    /// Reset the data section to the kind's empty form.
    pub fn clear(&mut self) {
        self.data = vec![0; self.kind.min_data_length()];
    }

    /// The 8-byte raw name slot.
    pub(crate) fn raw_name(&self) -> &[u8] {
        &self.name
    }

    pub(crate) fn set_raw_name(&mut self, bytes: &[u8]) {
        let mut name = bytes.to_vec();
        name.truncate(8);
        name.resize(8, 0);
        self.name = name;
    }

    pub(crate) fn set_raw_type_id(&mut self, type_id: u8) {
        self.type_id = vec![type_id];
    }

    pub(crate) fn set_raw_archived(&mut self, byte: u8) {
        self.archived = vec![byte];
    }

    /// Total length of the next entry in `data`, without consuming it.
    pub fn next_entry_length(data: &[u8]) -> Result<usize> {
        let mut reader = ByteReader::new(data);
        let meta_length = reader.take_u16()?;
        let data_length = reader.take_u16()?;
        Ok(2 + usize::from(meta_length) + 2 + usize::from(data_length))
    }

    /// Load this entry from one serialized entry record.
    ///
    /// Structural oddities (unexpected meta length, mismatched data
    /// lengths, odd archive-flag bytes, out-of-table versions) are
    /// recoverable warnings; only a stream shorter than its declared fields
    /// is fatal. Generic entries self-coerce afterwards.
    pub fn load_bytes(&mut self, data: &[u8], diag: &mut Diagnostics) -> Result<()> {
        let mut reader = ByteReader::new(data);

        self.meta_length = reader.take_u16()?;
        let declared = reader.take_u16()?;

        let type_id = reader.take_u8()?;
        if self.kind != EntryKind::Generic && type_id != self.kind.type_id() {
            diag.warn(Warning::EntryTypeMismatch {
                expected: self.kind.type_id(),
                actual: type_id,
            });
        }
        self.type_id = vec![type_id];

        self.name = reader.take(8)?.to_vec();

        match self.meta_length {
            FLASH_META_LENGTH => self.read_flash_bytes(&mut reader, diag)?,
            BASE_META_LENGTH => {
                self.version = vec![0x00];
                self.archived = vec![0x00];
            }
            meta_length => {
                diag.warn(Warning::UnexpectedMetaLength { meta_length });
                self.read_flash_bytes(&mut reader, diag)?;
            }
        }

        let repeated = reader.take_u16()?;
        if declared != repeated {
            diag.warn(Warning::DataLengthMismatch { declared, repeated });
        }
        self.data = reader.take(usize::from(repeated))?.to_vec();

        self.coerce(diag);

        let versions = self.kind.versions();
        if versions.len() > 1 && !versions.contains(&self.version()) {
            diag.warn(Warning::UnrecognizedVersion {
                version: self.version(),
            });
        }
        self.validate_data(diag);

        Ok(())
    }

    fn read_flash_bytes(&mut self, reader: &mut ByteReader<'_>, diag: &mut Diagnostics) -> Result<()> {
        self.version = reader.take(1)?.to_vec();
        let archived = reader.take_u8()?;
        if archived != 0x00 && archived != 0x80 {
            diag.warn(Warning::UnexpectedArchiveFlag { value: archived });
        }
        self.archived = vec![archived];
        Ok(())
    }

    /// Retype a generic entry to the registered kind for its type ID.
    ///
    /// Already-coerced entries are left untouched, so repeated calls are
    /// no-ops. Unregistered type IDs warn; the 0xFF sentinel warns with its
    /// own message and stays generic by design.
    pub fn coerce(&mut self, diag: &mut Diagnostics) {
        if self.kind != EntryKind::Generic {
            return;
        }

        let type_id = self.type_id();
        match registered_kind(type_id) {
            Some(kind) => self.kind = kind,
            None if type_id == SENTINEL_TYPE_ID => diag.warn(Warning::SentinelTypeId),
            None => diag.warn(Warning::UnrecognizedTypeId { type_id }),
        }
    }

    /// Consume this entry's data section from a raw (envelope-free) stream,
    /// as found inside a group payload.
    pub(crate) fn load_data_section(
        &mut self,
        reader: &mut ByteReader<'_>,
        diag: &mut Diagnostics,
    ) -> Result<()> {
        self.data = match self.kind.shape() {
            DataShape::Fixed(width) => reader.take(width)?.to_vec(),
            DataShape::Counted(width) => {
                let count_bytes = reader.take(2)?;
                let count = u16::from_le_bytes([count_bytes[0], count_bytes[1]]);
                let mut data = count_bytes.to_vec();
                data.extend_from_slice(reader.take(usize::from(count) * width)?);
                data
            }
            DataShape::Grid => {
                let dims = reader.take(2)?;
                let elements = usize::from(dims[0]) * usize::from(dims[1]);
                let mut data = dims.to_vec();
                data.extend_from_slice(reader.take(elements * REAL_WIDTH)?);
                data
            }
            DataShape::Sized => {
                let length_bytes = reader.take(2)?;
                let length = u16::from_le_bytes([length_bytes[0], length_bytes[1]]);
                let mut data = length_bytes.to_vec();
                data.extend_from_slice(reader.take(usize::from(length))?);
                data
            }
            DataShape::Rest => reader.rest().to_vec(),
        };

        self.validate_data(diag);
        Ok(())
    }

    /// Check the data section's internal length fields against its actual
    /// size and the kind's on-calc limits.
    pub(crate) fn validate_data(&self, diag: &mut Diagnostics) {
        match self.kind.shape() {
            DataShape::Counted(width) => {
                let declared = crate::types::sized_length(&self.data);
                let actual = self.data.len().saturating_sub(2) / width;
                if declared != actual {
                    diag.warn(Warning::ElementCountMismatch {
                        expected: actual,
                        actual: declared,
                    });
                }
                if declared > 999 {
                    diag.warn(Warning::ListTooLong { len: declared });
                }
            }
            DataShape::Grid => {
                let width = self.data.first().copied().unwrap_or(0) as usize;
                let height = self.data.get(1).copied().unwrap_or(0) as usize;
                for (dimension, value) in [("width", width), ("height", height)] {
                    if value > 99 {
                        diag.warn(Warning::MatrixDimension { dimension, value });
                    }
                }
                if width * height > 400 {
                    diag.warn(Warning::MatrixTooBig {
                        elements: width * height,
                    });
                }

                let actual = self.data.len().saturating_sub(2) / REAL_WIDTH;
                if actual != width * height {
                    diag.warn(Warning::ElementCountMismatch {
                        expected: width * height,
                        actual,
                    });
                }
            }
            DataShape::Sized => {
                let declared = crate::types::sized_length(&self.data);
                let actual = self.data.len().saturating_sub(2);
                if declared != actual {
                    diag.warn(Warning::SizedLengthMismatch {
                        expected: declared,
                        actual,
                    });
                }
            }
            DataShape::Fixed(_) | DataShape::Rest => {}
        }
    }

    /// Serialize this entry.
    #[must_use]
    pub fn bytes(&self) -> Vec<u8> {
        let data_length = (self.data.len() as u16).to_le_bytes();

        let mut out = Vec::with_capacity(self.total_length());
        out.extend_from_slice(&self.meta_length.to_le_bytes());
        out.extend_from_slice(&data_length);
        out.extend_from_slice(&self.type_id);
        out.extend_from_slice(&self.name);
        out.extend_from_slice(&self.flash_bytes());
        out.extend_from_slice(&data_length);
        out.extend_from_slice(&self.data);
        out
    }

    /// The version byte appropriate for this entry's current data.
    ///
    /// Most kinds report the first entry of their version table; groups
    /// report the maximum over their members.
    #[must_use]
    pub fn get_version(&self) -> u8 {
        match self.kind {
            EntryKind::Group => crate::types::group::member_version(self),
            kind => kind.versions()[0],
        }
    }

    /// The minimum OS version that supports this entry's data.
    #[must_use]
    pub fn get_min_os(&self) -> OsVersion {
        match self.kind {
            EntryKind::Group => crate::types::group::member_min_os(self),
            _ => OsVersion::INITIAL,
        }
    }

    /// Whether `model` can hold this entry.
    #[must_use]
    pub fn supported_by(&self, model: &Model) -> bool {
        self.get_min_os() < model.os("latest")
    }

    /// Every model that can hold this entry.
    #[must_use]
    pub fn supporting_models(&self) -> Vec<&'static Model> {
        MODELS.iter().filter(|m| self.supported_by(m)).collect()
    }

    /// The file extension for this entry saved alone, targeted at `model`.
    #[must_use]
    pub fn extension(&self, model: Option<&Model>) -> String {
        self.kind.extension(model)
    }

    /// Read the entry at `index` from a var file.
    ///
    /// Skips the 53-byte header and the 2-byte entry-block length, then
    /// walks entry envelopes without parsing them until `index` is reached.
    pub fn open_indexed(path: impl AsRef<Path>, index: usize) -> Result<(Self, Diagnostics)> {
        let path = path.as_ref();
        let mut file = std::fs::File::open(path).map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => VarError::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => err.into(),
        })?;

        let mut data = Vec::new();
        file.read_to_end(&mut data)?;

        let mut offset = HEADER_LEN + 2;
        for _ in 0..index {
            let skipped = Self::next_entry_length(data.get(offset..).unwrap_or_default())?;
            offset += skipped;
        }

        let remaining = data.get(offset..).unwrap_or_default();
        let length = Self::next_entry_length(remaining)?;
        if remaining.len() < length {
            return Err(VarError::truncated(
                data.len(),
                length - remaining.len(),
            ));
        }

        let mut diag = Diagnostics::new();
        let mut entry = Self {
            meta_length: FLASH_META_LENGTH,
            type_id: vec![SENTINEL_TYPE_ID],
            name: vec![0; 8],
            version: vec![0x00],
            archived: vec![0x00],
            data: Vec::new(),
            kind: EntryKind::Generic,
        };
        entry.load_bytes(&remaining[..length], &mut diag)?;
        Ok((entry, diag))
    }

    /// Read the first entry from a var file.
    pub fn open(path: impl AsRef<Path>) -> Result<(Self, Diagnostics)> {
        Self::open_indexed(path, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn real_bytes() -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&13u16.to_le_bytes());
        out.extend_from_slice(&9u16.to_le_bytes());
        out.push(0x00);
        out.extend_from_slice(b"A\0\0\0\0\0\0\0");
        out.push(0x00); // version
        out.push(0x80); // archived
        out.extend_from_slice(&9u16.to_le_bytes());
        out.extend_from_slice(&[0x00, 0x83, 0x15, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);
        out
    }

    #[test]
    fn load_coerces_by_type_id() {
        let mut entry = Entry::new(EntryKind::Generic);
        let mut diag = Diagnostics::new();

        entry.load_bytes(&real_bytes(), &mut diag).unwrap();
        assert_eq!(entry.kind(), EntryKind::Real);
        assert_eq!(entry.name(), "A");
        assert!(entry.archived());
        assert!(diag.is_empty());
    }

    #[test]
    fn coercion_is_idempotent() {
        let mut entry = Entry::new(EntryKind::Generic);
        let mut diag = Diagnostics::new();
        entry.load_bytes(&real_bytes(), &mut diag).unwrap();

        let before = entry.bytes();
        entry.coerce(&mut diag);
        assert_eq!(entry.kind(), EntryKind::Real);
        assert_eq!(entry.bytes(), before);
    }

    #[test]
    fn round_trip_reproduces_bytes() {
        let bytes = real_bytes();
        let mut entry = Entry::new(EntryKind::Generic);
        let mut diag = Diagnostics::new();
        entry.load_bytes(&bytes, &mut diag).unwrap();
        assert_eq!(entry.bytes(), bytes);
    }

    #[test]
    fn sentinel_type_id_warns_and_stays_generic() {
        let mut bytes = real_bytes();
        bytes[4] = SENTINEL_TYPE_ID;

        let mut entry = Entry::new(EntryKind::Generic);
        let mut diag = Diagnostics::new();
        entry.load_bytes(&bytes, &mut diag).unwrap();

        assert_eq!(entry.kind(), EntryKind::Generic);
        assert!(diag.any(|w| matches!(w, Warning::SentinelTypeId)));
    }

    #[test]
    fn unregistered_type_id_warns() {
        let mut bytes = real_bytes();
        bytes[4] = 0x42;

        let mut entry = Entry::new(EntryKind::Generic);
        let mut diag = Diagnostics::new();
        entry.load_bytes(&bytes, &mut diag).unwrap();

        assert_eq!(entry.kind(), EntryKind::Generic);
        assert!(diag.any(|w| matches!(w, Warning::UnrecognizedTypeId { type_id: 0x42 })));
    }

    #[test]
    fn mismatched_data_lengths_trust_the_second() {
        let mut bytes = real_bytes();
        bytes[2] = 0x0A; // declared length off by one

        let mut entry = Entry::new(EntryKind::Generic);
        let mut diag = Diagnostics::new();
        entry.load_bytes(&bytes, &mut diag).unwrap();

        assert_eq!(entry.data_length(), 9);
        assert!(diag.any(|w| matches!(
            w,
            Warning::DataLengthMismatch {
                declared: 10,
                repeated: 9
            }
        )));
    }

    #[test]
    fn unexpected_meta_length_reads_flash_bytes_anyway() {
        let mut bytes = real_bytes();
        bytes[0] = 12;

        let mut entry = Entry::new(EntryKind::Generic);
        let mut diag = Diagnostics::new();
        entry.load_bytes(&bytes, &mut diag).unwrap();

        assert_eq!(entry.meta_length(), 12);
        assert!(diag.any(|w| matches!(w, Warning::UnexpectedMetaLength { meta_length: 12 })));
        // Serialization clips the flash bytes to the declared meta length.
        assert_eq!(entry.flash_bytes().len(), 1);
    }

    #[test]
    fn truncated_data_section_is_fatal() {
        let mut bytes = real_bytes();
        bytes.truncate(bytes.len() - 3);

        let mut entry = Entry::new(EntryKind::Generic);
        let mut diag = Diagnostics::new();
        let err = entry.load_bytes(&bytes, &mut diag).unwrap_err();
        assert!(matches!(err, VarError::TruncatedInput { .. }));
    }

    #[test]
    fn flashless_entries_reject_archiving() {
        let (mut entry, diag) =
            Entry::with_options(&EntryOptions::new(EntryKind::Real).flashless());
        assert!(diag.is_empty());
        assert_eq!(entry.meta_length(), BASE_META_LENGTH);
        assert!(entry.flash_bytes().is_empty());

        let err = entry.archive().unwrap_err();
        assert!(matches!(err, VarError::UnsupportedOperation { .. }));
    }

    #[test]
    fn flashless_versioning_request_warns() {
        let (entry, diag) = Entry::with_options(
            &EntryOptions::new(EntryKind::Real)
                .flashless()
                .with_version(0x0B),
        );
        assert_eq!(entry.version(), 0x00);
        assert!(diag.any(|w| matches!(w, Warning::FlashlessVersioning)));
    }

    #[test]
    fn odd_archive_flag_warns() {
        let mut bytes = real_bytes();
        bytes[14] = 0x01;

        let mut entry = Entry::new(EntryKind::Generic);
        let mut diag = Diagnostics::new();
        entry.load_bytes(&bytes, &mut diag).unwrap();
        assert!(diag.any(|w| matches!(w, Warning::UnexpectedArchiveFlag { value: 0x01 })));
    }

    #[test]
    fn out_of_table_version_warns() {
        let mut program = Entry::new(EntryKind::Program).bytes();
        program[13] = 0x55; // version byte

        let mut entry = Entry::new(EntryKind::Generic);
        let mut diag = Diagnostics::new();
        entry.load_bytes(&program, &mut diag).unwrap();
        assert!(diag.any(|w| matches!(w, Warning::UnrecognizedVersion { version: 0x55 })));
    }

    #[test]
    fn typed_load_warns_on_foreign_type_id() {
        let mut entry = Entry::new(EntryKind::Program);
        let mut diag = Diagnostics::new();
        entry.load_bytes(&real_bytes(), &mut diag).unwrap();

        assert_eq!(entry.kind(), EntryKind::Program);
        assert!(diag.any(|w| matches!(
            w,
            Warning::EntryTypeMismatch {
                expected: 0x05,
                actual: 0x00
            }
        )));
    }

    #[test]
    fn registry_last_registration_wins() {
        register_kind(0x60, EntryKind::Program);
        register_kind(0x60, EntryKind::StringVar);
        assert_eq!(registered_kind(0x60), Some(EntryKind::StringVar));
        assert_eq!(registered_kind(0x02), Some(EntryKind::Matrix));
    }

    #[test]
    fn clear_resets_to_minimum_data() {
        let mut entry = Entry::new(EntryKind::Real);
        entry.set_data(vec![1; 9]);
        entry.clear();
        assert_eq!(entry.data(), [0; 9]);

        let program = Entry::new(EntryKind::Program);
        assert_eq!(program.data(), [0, 0]);
        assert!(program.is_empty());
    }

    #[test]
    fn next_entry_length_peeks() {
        let bytes = real_bytes();
        assert_eq!(Entry::next_entry_length(&bytes).unwrap(), bytes.len());
        assert!(Entry::next_entry_length(&bytes[..3]).is_err());
    }

    #[test]
    fn extensions_follow_the_model_line() {
        let entry = Entry::new(EntryKind::Real);
        assert_eq!(entry.extension(None), "8xn");

        let ti82 = tivar_model::by_name("TI-82").unwrap();
        assert_eq!(entry.extension(Some(ti82)), "82n");

        let group = Entry::new(EntryKind::Group);
        assert_eq!(group.extension(None), "8xg");
    }

    #[test]
    fn list_entries_use_list_names() {
        let entry = Entry::new(EntryKind::RealList);
        assert_eq!(entry.name(), "L1");
        assert_eq!(&entry.raw_name()[..2], &[0x5D, 0x00]);
    }
}
