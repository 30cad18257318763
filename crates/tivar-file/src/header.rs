//! The 53-byte var file header.
//!
//! # Layout
//!
//! | Offset | Length | Field      |
//! |--------|--------|------------|
//! | 0      | 8      | magic      |
//! | 8      | 2      | extra      |
//! | 10     | 1      | product ID |
//! | 11     | 42     | comment    |
//!
//! The magic determines which models can load the file at all; the product
//! ID optionally narrows that set to specific targets. Neither mismatch is
//! fatal on load.

use tivar_model::{Model, by_name, supports_magic};

use crate::diag::{Diagnostics, Warning};
use crate::error::{Result, VarError};
use crate::field::{BYTES, ByteReader, INTEGER, STRING, Section};

/// Total header length in bytes.
pub const HEADER_LEN: usize = 53;

/// Default export bytes.
pub const DEFAULT_EXTRA: [u8; 2] = [0x1A, 0x0A];

const DEFAULT_COMMENT: &str = concat!("Created with tivar-file v", env!("CARGO_PKG_VERSION"));
const DEFAULT_MODEL: &str = "TI-84+CE";

const MAGIC: Section<String> = Section::new("magic", Some(8), STRING);
const EXTRA: Section<Vec<u8>> = Section::new("extra", Some(2), BYTES);
const PRODUCT_ID: Section<u64> = Section::new("product_id", Some(1), INTEGER);
const COMMENT: Section<String> = Section::new("comment", Some(42), STRING);

/// Options for constructing a [`Header`].
#[derive(Debug, Clone)]
pub struct HeaderOptions {
    /// Minimum model to target.
    pub model: &'static Model,
    /// Override for the file magic (defaults to the model's).
    pub magic: Option<String>,
    /// Export bytes.
    pub extra: [u8; 2],
    /// Override for the product ID (defaults to the model's).
    pub product_id: Option<u8>,
    /// Comment text.
    pub comment: String,
}

impl Default for HeaderOptions {
    fn default() -> Self {
        Self {
            model: by_name(DEFAULT_MODEL).expect("default model is in the registry"),
            magic: None,
            extra: DEFAULT_EXTRA,
            product_id: None,
            comment: DEFAULT_COMMENT.to_string(),
        }
    }
}

impl HeaderOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Target a specific minimum model.
    #[must_use]
    pub fn with_model(mut self, model: &'static Model) -> Self {
        self.model = model;
        self
    }

    /// Override the file magic.
    #[must_use]
    pub fn with_magic(mut self, magic: impl Into<String>) -> Self {
        self.magic = Some(magic.into());
        self
    }

    /// Override the product ID.
    #[must_use]
    pub fn with_product_id(mut self, product_id: u8) -> Self {
        self.product_id = Some(product_id);
        self
    }

    /// Set the comment text.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }
}

/// Parser and builder for var file headers.
///
/// Owns the raw bytes of each field; all access goes through the section
/// schema, and the model-compatibility sets are recomputed whenever the
/// magic or product ID changes.
#[derive(Debug, Clone)]
pub struct Header {
    magic: Vec<u8>,
    extra: Vec<u8>,
    product_id: Vec<u8>,
    comment: Vec<u8>,
    supports: Vec<&'static Model>,
    targets: Vec<&'static Model>,
}

impl Default for Header {
    fn default() -> Self {
        let (header, _) = Header::with_options(&HeaderOptions::default());
        header
    }
}

impl PartialEq for Header {
    fn eq(&self, other: &Self) -> bool {
        self.bytes() == other.bytes()
    }
}

impl Eq for Header {}

impl Header {
    /// Create a header targeting the default model.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a header from options, reporting unknown magics or product
    /// IDs as warnings.
    pub fn with_options(options: &HeaderOptions) -> (Self, Diagnostics) {
        let mut diag = Diagnostics::new();
        let mut header = Self {
            magic: Vec::new(),
            extra: Vec::new(),
            product_id: Vec::new(),
            comment: Vec::new(),
            supports: Vec::new(),
            targets: Vec::new(),
        };

        let magic = options
            .magic
            .clone()
            .unwrap_or_else(|| options.model.magic.to_string());
        MAGIC.set(&mut header.magic, &magic, &mut diag);
        EXTRA.set(&mut header.extra, &options.extra.to_vec(), &mut diag);
        PRODUCT_ID.set(
            &mut header.product_id,
            &u64::from(options.product_id.unwrap_or(options.model.product_id)),
            &mut diag,
        );
        COMMENT.set(&mut header.comment, &options.comment, &mut diag);

        header.recompute_support(&mut diag);
        (header, diag)
    }

    /// The file magic.
    #[must_use]
    pub fn magic(&self) -> String {
        MAGIC.get(&self.magic)
    }

    pub fn set_magic(&mut self, magic: &str, diag: &mut Diagnostics) {
        MAGIC.set(&mut self.magic, &magic.to_string(), diag);
        self.recompute_support(diag);
    }

    /// The extra export bytes. Their exact meaning is not determined; tools
    /// disagree on them without consequence.
    #[must_use]
    pub fn extra(&self) -> Vec<u8> {
        EXTRA.get(&self.extra)
    }

    pub fn set_extra(&mut self, extra: &[u8], diag: &mut Diagnostics) {
        EXTRA.set(&mut self.extra, &extra.to_vec(), diag);
    }

    /// The product ID; zero means no product constraint.
    #[must_use]
    pub fn product_id(&self) -> u8 {
        PRODUCT_ID.get(&self.product_id) as u8
    }

    pub fn set_product_id(&mut self, product_id: u8, diag: &mut Diagnostics) {
        PRODUCT_ID.set(&mut self.product_id, &u64::from(product_id), diag);
        self.recompute_support(diag);
    }

    /// The comment attached to the var.
    #[must_use]
    pub fn comment(&self) -> String {
        COMMENT.get(&self.comment)
    }

    pub fn set_comment(&mut self, comment: &str, diag: &mut Diagnostics) {
        COMMENT.set(&mut self.comment, &comment.to_string(), diag);
    }

    /// Models that can load files with this header's magic.
    #[must_use]
    pub fn supports(&self) -> &[&'static Model] {
        &self.supports
    }

    /// The support set narrowed by product ID.
    #[must_use]
    pub fn targets(&self) -> &[&'static Model] {
        &self.targets
    }

    /// Whether `model` can be sent this header.
    #[must_use]
    pub fn supported_by(&self, model: &Model) -> bool {
        self.supports.iter().any(|m| *m == model)
    }

    /// Whether `model` is explicitly targeted by this header.
    #[must_use]
    pub fn targeted_at(&self, model: &Model) -> bool {
        self.targets.iter().any(|m| *m == model)
    }

    /// Load the header from exactly [`HEADER_LEN`] leading bytes.
    pub fn load_bytes(&mut self, data: &[u8], diag: &mut Diagnostics) -> Result<()> {
        let mut reader = ByteReader::new(data);

        self.magic = reader.take(8)?.to_vec();
        self.extra = reader.take(2)?.to_vec();
        self.product_id = reader.take(1)?.to_vec();
        self.comment = reader.take(42)?.to_vec();

        self.recompute_support(diag);
        Ok(())
    }

    /// Serialize the header.
    #[must_use]
    pub fn bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN);
        out.extend_from_slice(&self.magic);
        out.extend_from_slice(&self.extra);
        out.extend_from_slice(&self.product_id);
        out.extend_from_slice(&self.comment);
        out
    }

    pub(crate) fn recompute_support(&mut self, diag: &mut Diagnostics) {
        let magic = self.magic();
        self.supports = supports_magic(&magic);
        if self.supports.is_empty() {
            diag.warn(Warning::UnrecognizedMagic { magic });
        }

        let product_id = self.product_id();
        self.targets = self
            .supports
            .iter()
            .copied()
            .filter(|m| product_id == 0x00 || m.product_id == product_id)
            .collect();

        if product_id != 0x00 && self.targets.is_empty() && !self.supports.is_empty() {
            diag.warn(Warning::UnrecognizedProductId { product_id });
        }
    }
}

/// Parse a header from a byte stream, returning it with its diagnostics.
pub fn parse_header(data: &[u8]) -> Result<(Header, Diagnostics)> {
    if data.len() < HEADER_LEN {
        return Err(VarError::truncated(data.len(), HEADER_LEN - data.len()));
    }

    let mut diag = Diagnostics::new();
    let mut header = Header::new();
    header.load_bytes(&data[..HEADER_LEN], &mut diag)?;
    Ok((header, diag))
}
