//! Interpretation of entry data sections, per kind.
//!
//! Entries own their payload as raw bytes; these modules decode and build
//! the kind-specific layouts in place through the field framework. Sized
//! entries (programs, equations, strings, groups) share the 2-byte length
//! prefix handled here.

pub mod complex;
pub mod group;
pub mod list;
pub mod matrix;
pub mod real;
pub mod tokenized;

use crate::diag::Diagnostics;
use crate::entry::Entry;
use crate::field::{BYTES, INTEGER, SliceSpec, View};

/// The length prefix of a sized data section.
const SIZED_LENGTH: View<u64> = View::new("length", None, SliceSpec::range(0, 2), INTEGER);

/// The user payload of a sized data section.
const SIZED_DATA: View<Vec<u8>> = View::new("data", None, SliceSpec::from(2), BYTES);

/// The declared payload length of a sized data section.
#[must_use]
pub(crate) fn sized_length(data: &[u8]) -> usize {
    SIZED_LENGTH.get(data) as usize
}

/// The payload of a sized entry, past the length prefix.
#[must_use]
pub fn sized_payload(entry: &Entry) -> Vec<u8> {
    SIZED_DATA.get(entry.data())
}

/// Replace a sized entry's payload, keeping the length prefix in sync.
pub fn set_sized_payload(entry: &mut Entry, payload: &[u8], diag: &mut Diagnostics) {
    let data = entry.data_mut();
    SIZED_DATA.set(data, &payload.to_vec(), diag);
    SIZED_LENGTH.set(data, &(payload.len() as u64), diag);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EntryKind;

    #[test]
    fn sized_payload_round_trip() {
        let mut entry = Entry::new(EntryKind::Program);
        let mut diag = Diagnostics::new();

        set_sized_payload(&mut entry, &[0xDE, 0x2A, 0x55], &mut diag);
        assert_eq!(entry.data(), [3, 0, 0xDE, 0x2A, 0x55]);
        assert_eq!(sized_payload(&entry), [0xDE, 0x2A, 0x55]);
        assert!(!entry.is_empty());
        assert!(diag.is_empty());

        set_sized_payload(&mut entry, &[], &mut diag);
        assert_eq!(entry.data(), [0, 0]);
        assert!(entry.is_empty());
    }
}
