//! Property tests over the codec invariants.

use proptest::prelude::*;

use tivar_file::types::real::{from_bcd, to_bcd};
use tivar_file::{Diagnostics, Entry, EntryKind, STRING, Section, Var, Warning};

proptest! {
    // Packing and unpacking BCD are exact inverses over the full 14-digit
    // mantissa range.
    #[test]
    fn bcd_is_invertible(mantissa in 0u64..100_000_000_000_000) {
        prop_assert_eq!(from_bcd(&to_bcd(mantissa)), mantissa);
    }

    // The checksum is the low 16 bits of the byte sum over all serialized
    // entries.
    #[test]
    fn checksum_matches_its_definition(
        payloads in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..40), 0..4)
    ) {
        let mut var = Var::new();
        let mut diag = Diagnostics::new();

        for payload in payloads {
            let mut entry = Entry::new(EntryKind::Generic);
            entry.set_data(payload);
            var.add_entry(entry, &mut diag);
        }

        let byte_sum: u64 = var
            .entries()
            .iter()
            .flat_map(Entry::bytes)
            .map(u64::from)
            .sum();
        prop_assert_eq!(var.checksum(), byte_sum as u16);

        let bytes = var.bytes();
        let trailer = var.checksum().to_le_bytes();
        prop_assert_eq!(&bytes[bytes.len() - 2..], trailer.as_slice());
    }

    // Any well-formed serialization parses back to an equal var that
    // reserializes to the same bytes.
    #[test]
    fn var_serialization_round_trips(
        payloads in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..40), 1..4)
    ) {
        let mut var = Var::new();
        let mut diag = Diagnostics::new();

        for payload in payloads {
            let mut entry = Entry::new(EntryKind::Generic);
            entry.set_data(payload);
            var.add_entry(entry, &mut diag);
        }

        let bytes = var.bytes();
        let mut parsed = Var::new();
        let mut diag = Diagnostics::new();
        parsed.load_bytes(&bytes, &mut diag).unwrap();

        prop_assert_eq!(&parsed, &var);
        prop_assert_eq!(parsed.bytes(), bytes);
    }

    // Writing an over-wide value to a bounded section always yields exactly
    // the declared width, left-aligned and zero-padded, without failing.
    #[test]
    fn bounded_sections_truncate_and_pad(text in "[A-Za-z0-9]{0,24}") {
        const FIELD: Section<String> = Section::new("field", Some(8), STRING);

        let mut slot = Vec::new();
        let mut diag = Diagnostics::new();
        FIELD.set(&mut slot, &text, &mut diag);

        prop_assert_eq!(slot.len(), 8);
        prop_assert!(slot.starts_with(text.as_bytes().get(..text.len().min(8)).unwrap()));
        if text.len() > 8 {
            let warned = diag.any(|w| matches!(w, Warning::ValueTooWide { .. }));
            prop_assert!(warned, "missing truncation warning");
        } else {
            prop_assert!(diag.is_empty());
        }
    }
}
