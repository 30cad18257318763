//! The group type.
//!
//! A group packages independent entries for transfer or archival. Its sized
//! payload is a sequence of `[VAT record][entry data]` pairs with no outer
//! framing; parsing consumes until the payload ends. The VAT record mirrors
//! the calculator's variable allocation table and is re-derived on import,
//! so on read everything except the type ID, version, archived flag, and
//! name is ignorable.
//!
//! Three record layouts exist, keyed by type ID. The reader masks the type
//! ID to its low nibble first, so a nested group (0x17) falls through to
//! the default layout even though the writer matched it unmasked; that
//! asymmetry is kept as-is.

use tivar_model::OsVersion;

use crate::diag::{Diagnostics, Warning};
use crate::entry::{BASE_META_LENGTH, Entry, EntryKind, EntryOptions};
use crate::error::Result;
use crate::field::ByteReader;
use crate::types::{set_sized_payload, sized_payload};

/// Package `entries` into a new group entry with defaulted VAT data.
pub fn group(entries: &[Entry], name: &str) -> (Entry, Diagnostics) {
    let for_flash = entries
        .first()
        .is_none_or(|entry| entry.meta_length() > BASE_META_LENGTH);

    let mut options = EntryOptions::new(EntryKind::Group)
        .with_name(name)
        .with_archived(true);
    if !for_flash {
        options = options.flashless();
    }
    let (mut group, mut diag) = Entry::with_options(&options);

    let mut payload = Vec::new();
    for entry in entries {
        let raw_name = entry.raw_name();
        let end = raw_name.iter().rposition(|&byte| byte != 0).map_or(0, |i| i + 1);
        let name = &raw_name[..end];

        payload.extend_from_slice(&[
            entry.type_id(),
            0,
            entry.version(),
            0,
            0,
            u8::from(entry.archived()),
        ]);

        match entry.type_id() {
            0x05 | 0x06 | 0x15 | 0x17 => {
                payload.push(name.len() as u8);
                payload.extend_from_slice(name);
            }
            0x01 | 0x0D => {
                payload.push(name.len() as u8 + 1);
                payload.extend_from_slice(name);
                payload.push(0);
            }
            _ => {
                let mut padded = name.to_vec();
                padded.truncate(3);
                padded.resize(3, 0);
                payload.extend_from_slice(&padded);
            }
        }

        payload.extend_from_slice(entry.data());
    }

    set_sized_payload(&mut group, &payload, &mut diag);
    (group, diag)
}

/// Unpack this group's entries.
///
/// Each entry is rebuilt generically from its VAT record and coerced by
/// type ID; over-long VAT name lengths are recoverable warnings.
pub fn ungroup(entry: &Entry, diag: &mut Diagnostics) -> Result<Vec<Entry>> {
    let payload = sized_payload(entry);
    let for_flash = entry.meta_length() > BASE_META_LENGTH;
    let mut reader = ByteReader::new(&payload);
    let mut entries = Vec::new();

    let mut index = 1;
    while reader.remaining() > 0 {
        let type_byte = reader.take_u8()?;
        let version = reader.take(2)?[1];

        let type_id = type_byte & 15;
        let (archived_byte, name) = match type_id {
            0x05 | 0x06 | 0x15 | 0x17 => {
                let rest = reader.take(4)?;
                let (page, length) = (rest[2], usize::from(rest[3]));

                if length > 8 {
                    diag.warn(Warning::VatNameTooLong {
                        index,
                        len: length,
                        bound: 8,
                    });
                }
                (page, reader.take(length)?.to_vec())
            }
            0x01 | 0x0D => {
                let rest = reader.take(4)?;
                let (page, length) = (rest[2], usize::from(rest[3]));

                if length > 7 {
                    diag.warn(Warning::VatNameTooLong {
                        index,
                        len: length,
                        bound: 7,
                    });
                }
                let name = reader.take(length.saturating_sub(1))?.to_vec();
                reader.take(1)?;
                (page, name)
            }
            _ => {
                let rest = reader.take(3)?;
                (rest[2], reader.take(3)?.to_vec())
            }
        };

        let mut options = EntryOptions::new(EntryKind::Generic)
            .with_version(version)
            .with_archived(archived_byte > 0);
        if !for_flash {
            options = options.flashless();
        }
        let (mut member, member_diag) = Entry::with_options(&options);
        diag.extend(member_diag);

        member.set_raw_type_id(type_id);
        member.coerce(diag);
        member.set_raw_name(&name);
        member.set_raw_archived(if archived_byte > 0 { 0x80 } else { 0x00 });
        member.load_data_section(&mut reader, diag)?;

        entries.push(member);
        index += 1;
    }

    Ok(entries)
}

/// The group's version byte: the maximum recorded over its members.
#[must_use]
pub(crate) fn member_version(entry: &Entry) -> u8 {
    let mut diag = Diagnostics::new();
    match ungroup(entry, &mut diag) {
        Ok(members) => members.iter().map(Entry::version).max().unwrap_or(0x00),
        Err(_) => 0x00,
    }
}

/// The group's minimum supporting OS: the maximum over its members.
#[must_use]
pub(crate) fn member_min_os(entry: &Entry) -> OsVersion {
    let mut diag = Diagnostics::new();
    match ungroup(entry, &mut diag) {
        Ok(members) => members
            .iter()
            .map(Entry::get_min_os)
            .max()
            .unwrap_or(OsVersion::INITIAL),
        Err(_) => OsVersion::INITIAL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{list, real};

    fn sample_real() -> Entry {
        let (mut entry, _) =
            Entry::with_options(&EntryOptions::new(EntryKind::Real).with_name("A"));
        let mut diag = Diagnostics::new();
        real::load_string(&mut entry, "1.5e3", &mut diag).unwrap();
        entry
    }

    fn sample_list() -> Entry {
        let (mut entry, _) =
            Entry::with_options(&EntryOptions::new(EntryKind::RealList).with_name("L1"));
        let mut diag = Diagnostics::new();
        list::load_string(&mut entry, "[1, 2, 3]", &mut diag).unwrap();
        entry
    }

    #[test]
    fn group_then_ungroup_restores_entries() {
        let originals = [sample_real(), sample_list()];
        let (grouped, diag) = group(&originals, "GROUP");
        assert!(diag.is_empty());
        assert_eq!(grouped.kind(), EntryKind::Group);
        assert!(grouped.archived());

        let mut diag = Diagnostics::new();
        let restored = ungroup(&grouped, &mut diag).unwrap();
        assert!(diag.is_empty());
        assert_eq!(restored.len(), 2);

        // VAT-only fields aside, the members match the originals.
        for (original, restored) in originals.iter().zip(&restored) {
            assert_eq!(restored.kind(), original.kind());
            assert_eq!(restored.type_id(), original.type_id());
            assert_eq!(restored.name(), original.name());
            assert_eq!(restored.data(), original.data());
        }
    }

    #[test]
    fn empty_group_has_no_members() {
        let (grouped, _) = group(&[], "GROUP");
        let mut diag = Diagnostics::new();
        assert!(ungroup(&grouped, &mut diag).unwrap().is_empty());
        assert_eq!(grouped.get_version(), 0x00);
    }

    #[test]
    fn program_names_use_the_counted_layout() {
        let (program, _) = Entry::with_options(
            &EntryOptions::new(EntryKind::Program).with_name("PRGMNAME"),
        );

        let (grouped, _) = group(&[program], "GROUP");
        let payload = sized_payload(&grouped);
        // [type, 0, version, 0, 0, archived, len, name...]
        assert_eq!(payload[0], 0x05);
        assert_eq!(payload[6], 8);
        assert_eq!(&payload[7..15], b"PRGMNAME");

        let mut diag = Diagnostics::new();
        let restored = ungroup(&grouped, &mut diag).unwrap();
        assert_eq!(restored[0].name(), "PRGMNAME");
        assert_eq!(restored[0].kind(), EntryKind::Program);
    }

    #[test]
    fn default_layout_clips_names_to_three_bytes() {
        let (real, _) =
            Entry::with_options(&EntryOptions::new(EntryKind::Real).with_name("ABCDE"));

        let (grouped, _) = group(&[real], "GROUP");
        let mut diag = Diagnostics::new();
        let restored = ungroup(&grouped, &mut diag).unwrap();
        assert_eq!(restored[0].name(), "ABC");
    }

    #[test]
    fn version_and_min_os_aggregate_over_members() {
        let (mut program, _) = Entry::with_options(&EntryOptions::new(EntryKind::Program));
        let mut diag = Diagnostics::new();
        program.set_version(0x0B, &mut diag);

        let (grouped, _) = group(&[sample_real(), program], "GROUP");
        assert_eq!(member_version(&grouped), 0x0B);
        assert_eq!(member_min_os(&grouped), OsVersion::INITIAL);
    }

    #[test]
    fn oversized_vat_name_length_warns() {
        let (grouped, _) = group(&[sample_real()], "GROUP");

        // Hand-build a program record claiming a 9-byte name.
        let mut payload = vec![0x05, 0, 0, 0, 0, 0, 9];
        payload.extend_from_slice(b"LONGNAME9");
        payload.extend_from_slice(&[0, 0]); // empty sized data

        let mut patched = grouped.clone();
        let mut diag = Diagnostics::new();
        set_sized_payload(&mut patched, &payload, &mut diag);

        let mut diag = Diagnostics::new();
        let restored = ungroup(&patched, &mut diag).unwrap();
        assert_eq!(restored.len(), 1);
        assert!(diag.any(|w| matches!(
            w,
            Warning::VatNameTooLong {
                index: 1,
                len: 9,
                bound: 8
            }
        )));
    }
}
