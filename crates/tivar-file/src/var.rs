//! The var container: header + entries + checksum.
//!
//! # Wire layout
//!
//! `[53-byte header][2-byte LE entry-block length][entries...][2-byte LE
//! checksum]`. The checksum is the low 16 bits of the sum of every byte of
//! every serialized entry.

use std::io::Read;
use std::path::Path;

use tivar_model::Model;

use crate::diag::{Diagnostics, Warning};
use crate::entry::{Entry, EntryKind};
use crate::error::{Result, VarError};
use crate::field::ByteReader;
use crate::header::{HEADER_LEN, Header, HeaderOptions};

/// Options for constructing a [`Var`].
#[derive(Debug, Clone, Default)]
pub struct VarOptions {
    /// Var name, used for default file names.
    pub name: Option<String>,
    /// A prebuilt header to attach.
    pub header: Option<Header>,
    /// Model to target when no header is given.
    pub model: Option<&'static Model>,
}

impl VarOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_header(mut self, header: Header) -> Self {
        self.header = Some(header);
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: &'static Model) -> Self {
        self.model = Some(model);
        self
    }
}

/// A complete calculator file.
#[derive(Debug, Clone)]
pub struct Var {
    name: String,
    header: Header,
    entries: Vec<Entry>,
}

// Equality is structural over the wire form; the name is file metadata and
// never serialized.
impl PartialEq for Var {
    fn eq(&self, other: &Self) -> bool {
        self.bytes() == other.bytes()
    }
}

impl Eq for Var {}

impl Default for Var {
    fn default() -> Self {
        Self::new()
    }
}

impl Var {
    /// Create an empty var with a default header.
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: "UNNAMED".to_string(),
            header: Header::new(),
            entries: Vec::new(),
        }
    }

    /// Create an empty var from options.
    pub fn with_options(options: &VarOptions) -> (Self, Diagnostics) {
        let mut diag = Diagnostics::new();
        let header = match (&options.header, options.model) {
            (Some(header), _) => header.clone(),
            (None, Some(model)) => {
                let (header, header_diag) =
                    Header::with_options(&HeaderOptions::new().with_model(model));
                diag.extend(header_diag);
                header
            }
            (None, None) => Header::new(),
        };

        let var = Self {
            name: options.name.clone().unwrap_or_else(|| "UNNAMED".to_string()),
            header,
            entries: Vec::new(),
        };
        (var, diag)
    }

    /// The var's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// The attached header.
    #[must_use]
    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn header_mut(&mut self) -> &mut Header {
        &mut self.header
    }

    /// The entries, in file order.
    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Whether the var holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Total serialized length of the entry block.
    #[must_use]
    pub fn entry_length(&self) -> usize {
        self.entries.iter().map(Entry::total_length).sum()
    }

    /// The checksum over the serialized entries.
    #[must_use]
    pub fn checksum(&self) -> u16 {
        let sum: u64 = self
            .entries
            .iter()
            .flat_map(|entry| entry.bytes())
            .map(u64::from)
            .sum();
        sum as u16
    }

    /// Append an entry.
    ///
    /// Mixing flash and flashless entries in one var is unusual but not
    /// rejected; it is reported as a warning.
    pub fn add_entry(&mut self, entry: Entry, diag: &mut Diagnostics) {
        if let Some(first) = self.entries.first()
            && first.meta_length() != entry.meta_length()
        {
            diag.warn(Warning::ConflictingMetaLength {
                expected: first.meta_length(),
                actual: entry.meta_length(),
            });
        }

        self.entries.push(entry);
    }

    /// The file extension for this var, targeted at `model`.
    ///
    /// Multi-entry (and empty) vars use the group extension.
    #[must_use]
    pub fn extension(&self, model: Option<&Model>) -> String {
        match self.entries.as_slice() {
            [entry] => {
                let lowest = self.header.targets().iter().min_by_key(|m| m.order).copied();
                entry.extension(model.or(lowest))
            }
            _ => "8xg".to_string(),
        }
    }

    /// The default file name: the var's name plus its extension.
    #[must_use]
    pub fn default_filename(&self, model: Option<&Model>) -> String {
        format!("{}.{}", self.name, self.extension(model))
    }

    /// Whether `model` supports the header and every entry.
    #[must_use]
    pub fn supported_by(&self, model: &Model) -> bool {
        self.header.supported_by(model)
            && self.entries.iter().all(|entry| entry.supported_by(model))
    }

    /// Every model that supports this var.
    #[must_use]
    pub fn supporting_models(&self) -> Vec<&'static Model> {
        self.header
            .supports()
            .iter()
            .copied()
            .filter(|model| self.entries.iter().all(|entry| entry.supported_by(model)))
            .collect()
    }

    /// Load a var from its serialized form.
    ///
    /// A wrong entry-block length or checksum is reported as a warning and
    /// the parsed data kept; only a stream shorter than its declared fields
    /// aborts.
    pub fn load_bytes(&mut self, data: &[u8], diag: &mut Diagnostics) -> Result<()> {
        let mut reader = ByteReader::new(data);

        self.header.load_bytes(reader.take(HEADER_LEN)?, diag)?;
        let declared = usize::from(reader.take_u16()?);

        self.clear();
        let mut remaining = declared as i64;
        while remaining > 0 {
            let length = Entry::next_entry_length(&data[reader.position()..])?;

            let mut entry = Entry::new(EntryKind::Generic);
            entry.load_bytes(reader.take(length)?, diag)?;
            self.entries.push(entry);

            remaining -= length as i64;
        }

        if remaining < 0 {
            diag.warn(Warning::EntryBlockLengthMismatch {
                expected: declared,
                actual: self.entry_length(),
            });
        }

        let stored = reader.take_u16()?;
        let computed = self.checksum();
        if stored != computed {
            diag.warn(Warning::ChecksumMismatch {
                expected: computed,
                actual: stored,
            });
        }

        Ok(())
    }

    /// Serialize this var.
    #[must_use]
    pub fn bytes(&self) -> Vec<u8> {
        let mut out = self.header.bytes();
        out.extend_from_slice(&(self.entry_length() as u16).to_le_bytes());
        for entry in &self.entries {
            out.extend_from_slice(&entry.bytes());
        }
        out.extend_from_slice(&self.checksum().to_le_bytes());
        out
    }

    /// Read a var from a file.
    pub fn open(path: impl AsRef<Path>) -> Result<(Self, Diagnostics)> {
        let path = path.as_ref();
        let mut file = std::fs::File::open(path).map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => VarError::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => err.into(),
        })?;

        let mut data = Vec::new();
        file.read_to_end(&mut data)?;

        let mut diag = Diagnostics::new();
        let mut var = Self::new();
        var.load_bytes(&data, &mut diag)?;
        Ok((var, diag))
    }

    /// Write this var to a file, targeting `model`.
    ///
    /// The model defaults to the lowest-ranked one that supports the var.
    /// Saving to a model that does not support the var, or an entry whose
    /// minimum OS exceeds the model's, is reported as a warning and the
    /// file written anyway.
    pub fn save(
        &self,
        path: impl AsRef<Path>,
        model: Option<&'static Model>,
        diag: &mut Diagnostics,
    ) -> Result<()> {
        let fallback = self.supporting_models().into_iter().min_by_key(|m| m.order);

        if let Some(model) = model.or(fallback) {
            if !self.supported_by(model) {
                diag.warn(Warning::UnsupportedModel {
                    model: model.to_string(),
                });
            }

            for (index, entry) in self.entries.iter().enumerate() {
                if entry.get_min_os() > model.os("latest") {
                    diag.warn(Warning::UnsupportedEntry {
                        index: index + 1,
                        model: model.to_string(),
                    });
                }
            }
        }

        std::fs::write(path, self.bytes())?;
        Ok(())
    }
}

impl Entry {
    /// Wrap this entry in a var of its own.
    pub fn export(&self, options: &VarOptions) -> (Var, Diagnostics) {
        let options = VarOptions {
            name: options.name.clone().or_else(|| Some(self.name())),
            ..options.clone()
        };

        let (mut var, mut diag) = Var::with_options(&options);
        var.add_entry(self.clone(), &mut diag);
        (var, diag)
    }

    /// Save this entry alone as a var file.
    pub fn save(
        &self,
        path: impl AsRef<Path>,
        model: Option<&'static Model>,
        diag: &mut Diagnostics,
    ) -> Result<()> {
        let (var, export_diag) = self.export(&VarOptions::new());
        diag.extend(export_diag);
        var.save(path, model, diag)
    }
}
