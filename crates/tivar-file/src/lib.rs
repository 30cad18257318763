//! Codec for TI graphing-calculator var files.
//!
//! A var file holds a 53-byte [`Header`] plus one or more typed entries
//! (reals, complex numbers, lists, matrices, tokenized programs, grouped
//! bundles), closed by a 16-bit checksum. Every entry shares the same meta
//! envelope; its type ID selects the [`EntryKind`] that governs the data
//! payload, with interpretation helpers under [`types`].
//!
//! Parsing is deliberately lenient: structural oddities the calculator
//! itself tolerates (bad checksums, mismatched lengths, unknown magics) are
//! collected as [`Warning`]s in a [`Diagnostics`] channel rather than
//! failing the load. Only truncated input and a handful of structural
//! errors are fatal; see [`VarError`].
//!
//! ```
//! use tivar_file::{Diagnostics, Entry, EntryKind, EntryOptions, Var, VarOptions};
//! use tivar_file::types::real;
//!
//! let mut diag = Diagnostics::new();
//! let (mut entry, _) = Entry::with_options(&EntryOptions::new(EntryKind::Real).with_name("A"));
//! real::load_string(&mut entry, "1.5e3", &mut diag)?;
//!
//! let (var, _) = entry.export(&VarOptions::new());
//! let bytes = var.bytes();
//!
//! let mut parsed = Var::new();
//! parsed.load_bytes(&bytes, &mut diag)?;
//! assert_eq!(parsed, var);
//! assert!(diag.is_empty());
//! # Ok::<(), tivar_file::VarError>(())
//! ```

pub mod diag;
pub mod entry;
pub mod error;
pub mod field;
pub mod header;
pub mod token;
pub mod types;
pub mod var;

pub use diag::{Diagnostics, Warning};
pub use entry::{
    BASE_META_LENGTH, Entry, EntryKind, EntryOptions, FLASH_META_LENGTH, SENTINEL_TYPE_ID,
    register_kind, registered_kind,
};
pub use error::{Result, VarError};
pub use field::{BOOLEAN, BYTES, Codec, INTEGER, STRING, Section, SliceSpec, View};
pub use header::{HEADER_LEN, Header, HeaderOptions, parse_header};
pub use var::{Var, VarOptions};
