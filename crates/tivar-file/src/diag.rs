//! Recoverable-warning channel.
//!
//! The format tolerates a lot of slightly-wrong input: bad checksums,
//! mismatched lengths, unknown magics. None of these abort parsing; they are
//! collected as structured [`Warning`]s so callers can decide what to treat
//! as fatal. Every warning is also emitted through `tracing`.

use thiserror::Error;

/// A recoverable condition observed while loading or building data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum Warning {
    /// A value wider than its section; the stored bytes were truncated.
    #[error("value for {field} is {len} bytes, wider than {width}; truncating")]
    ValueTooWide {
        field: &'static str,
        width: usize,
        len: usize,
    },

    /// The header magic matches no known model.
    #[error("file magic {magic:?} not recognized")]
    UnrecognizedMagic { magic: String },

    /// The header product ID matches no magic-compatible model.
    #[error("product ID {product_id:#04x} not recognized")]
    UnrecognizedProductId { product_id: u8 },

    /// A generic entry carried a type ID with no registered kind.
    #[error("type ID {type_id:#04x} is not recognized; entry will not be coerced")]
    UnrecognizedTypeId { type_id: u8 },

    /// The 0xFF sentinel type ID; the entry stays generic by design.
    #[error("type ID is 0xFF; no coercion will occur")]
    SentinelTypeId,

    /// A typed entry was loaded from bytes carrying a different type ID.
    #[error("entry type mismatch (expected {expected:#04x}, got {actual:#04x})")]
    EntryTypeMismatch { expected: u8, actual: u8 },

    /// Meta length was neither 11 nor 13; flash bytes were read anyway.
    #[error("entry meta length has an unexpected value ({meta_length})")]
    UnexpectedMetaLength { meta_length: u16 },

    /// The archived flag byte was neither 0x00 nor 0x80.
    #[error("archive flag {value:#04x} is set to an unexpected value")]
    UnexpectedArchiveFlag { value: u8 },

    /// The two data-length fields of an entry disagree; the second wins.
    #[error("entry data lengths are mismatched ({declared} vs. {repeated}); using {repeated}")]
    DataLengthMismatch { declared: u16, repeated: u16 },

    /// The version byte is outside the entry kind's version table.
    #[error("version {version:#04x} is not recognized")]
    UnrecognizedVersion { version: u8 },

    /// Versioning fields requested on a flashless entry.
    #[error("flashless entries do not support versioning or archiving")]
    FlashlessVersioning,

    /// The var's entry-block length disagrees with the entries read.
    #[error("total entry length is incorrect (expected {expected}, got {actual})")]
    EntryBlockLengthMismatch { expected: usize, actual: usize },

    /// The stored checksum disagrees with the computed one.
    #[error("checksum is incorrect (expected {expected:#06x}, got {actual:#06x})")]
    ChecksumMismatch { expected: u16, actual: u16 },

    /// Entries with different meta lengths mixed in one var.
    #[error("new entry has a conflicting meta length (expected {expected}, got {actual})")]
    ConflictingMetaLength { expected: u16, actual: u16 },

    /// Saving to a model that does not support the var.
    #[error("{model} does not support this var")]
    UnsupportedModel { model: String },

    /// An entry's minimum OS exceeds the save target's.
    #[error("entry #{index} is not supported by {model}")]
    UnsupportedEntry { index: usize, model: String },

    /// A sized entry's length prefix disagrees with its payload.
    #[error("entry has an unexpected data length (expected {expected}, got {actual})")]
    SizedLengthMismatch { expected: usize, actual: usize },

    /// A list or matrix element count disagrees with its data length.
    #[error("container has an unexpected element count (expected {expected}, got {actual})")]
    ElementCountMismatch { expected: usize, actual: usize },

    /// The list exceeds the on-calc limit of 999 elements.
    #[error("list is too long ({len} > 999)")]
    ListTooLong { len: usize },

    /// A matrix dimension exceeds the on-calc limit of 99.
    #[error("matrix {dimension} is too large ({value} > 99)")]
    MatrixDimension {
        dimension: &'static str,
        value: usize,
    },

    /// The matrix exceeds the on-calc limit of 400 elements.
    #[error("matrix is too big ({elements} > 400)")]
    MatrixTooBig { elements: usize },

    /// A VAT record's name length exceeds the bound for its layout.
    #[error("name length of grouped entry #{index} ({len}) exceeds {bound}")]
    VatNameTooLong {
        index: usize,
        len: usize,
        bound: usize,
    },
}

/// Collector for [`Warning`]s raised during one operation.
///
/// Warnings never unwind the call stack; parsing continues best-effort and
/// the caller inspects the collector afterwards.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning and emit it through `tracing`.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!(warning = %warning, "recoverable var condition");
        self.warnings.push(warning);
    }

    #[must_use]
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    /// Whether any recorded warning satisfies `predicate`.
    pub fn any(&self, predicate: impl FnMut(&Warning) -> bool) -> bool {
        self.warnings.iter().any(predicate)
    }

    /// Append all warnings from another collector.
    pub fn extend(&mut self, other: Diagnostics) {
        self.warnings.extend(other.warnings);
    }
}
