//! The complex number type.
//!
//! Data layout: two back-to-back real components, `[real:9][imaginary:9]`.
//! Each component is an ordinary real with flags bits 2 and 3 set to mark it
//! as half of a complex number.

use crate::diag::Diagnostics;
use crate::entry::{COMPLEX_WIDTH, Entry, EntryKind, EntryOptions, REAL_WIDTH};
use crate::error::{Result, VarError};
use crate::field::{BYTES, SliceSpec, View};
use crate::types::real;

/// Flags bits marking a real as a complex component.
pub const COMPONENT_BITS: u8 = 1 << 2 | 1 << 3;

const REAL_PART: View<Vec<u8>> = View::new(
    "real",
    Some(COMPLEX_WIDTH),
    SliceSpec::range(0, REAL_WIDTH as isize),
    BYTES,
);
const IMAGINARY_PART: View<Vec<u8>> = View::new(
    "imaginary",
    Some(COMPLEX_WIDTH),
    SliceSpec::range(REAL_WIDTH as isize, COMPLEX_WIDTH as isize),
    BYTES,
);

fn expect_complex(entry: &Entry, representation: &'static str) -> Result<()> {
    match entry.kind() {
        EntryKind::Complex => Ok(()),
        kind => Err(VarError::not_implemented(kind.label(), representation)),
    }
}

fn component(entry: &Entry, view: &View<Vec<u8>>) -> Entry {
    let options = EntryOptions::new(EntryKind::Real).with_data(view.get(entry.data()));
    let options = if entry.meta_length() > crate::entry::BASE_META_LENGTH {
        options
    } else {
        options.flashless()
    };
    let (real, _) = Entry::with_options(&options);
    real
}

/// The real and imaginary components as real entries.
pub fn components(entry: &Entry) -> Result<(Entry, Entry)> {
    expect_complex(entry, "component")?;
    Ok((
        component(entry, &REAL_PART),
        component(entry, &IMAGINARY_PART),
    ))
}

/// Store two real entries as this entry's components.
///
/// Both must carry a full 9-byte real payload; their component flag bits
/// are set on the stored copies.
pub fn load_components(
    entry: &mut Entry,
    real_part: &Entry,
    imaginary_part: &Entry,
    diag: &mut Diagnostics,
) -> Result<()> {
    expect_complex(entry, "component")?;

    for part in [real_part, imaginary_part] {
        if part.data_length() != REAL_WIDTH {
            return Err(VarError::structural(format!(
                "complex component has {} data bytes, expected {REAL_WIDTH}",
                part.data_length()
            )));
        }
    }

    let tag = |part: &Entry| {
        let mut data = part.data().to_vec();
        data[0] |= COMPONENT_BITS;
        data
    };

    REAL_PART.set(entry.data_mut(), &tag(real_part), diag);
    IMAGINARY_PART.set(entry.data_mut(), &tag(imaginary_part), diag);
    Ok(())
}

/// Parse a string of the form `a + bi` (or `a - bi`, or a bare `bi`).
pub fn load_string(entry: &mut Entry, string: &str, diag: &mut Diagnostics) -> Result<()> {
    expect_complex(entry, "string")?;

    let compact: String = string.chars().filter(|c| !c.is_whitespace()).collect();
    let compact = compact.replace('~', "-");

    let (real_text, imaginary_text) = split_components(&compact);

    let mut real_part = Entry::new(EntryKind::Real);
    real::load_string(&mut real_part, &real_text, diag)?;

    let mut imaginary_part = Entry::new(EntryKind::Real);
    real::load_string(&mut imaginary_part, &imaginary_text, diag)?;

    load_components(entry, &real_part, &imaginary_part, diag)
}

/// Split `a+bi` into real and imaginary numeric strings.
fn split_components(compact: &str) -> (String, String) {
    if let Some(rest) = compact.strip_suffix('i') {
        // Find the sign separating the parts, skipping a leading sign and
        // any sign that belongs to an exponent.
        let bytes = rest.as_bytes();
        let split = (1..rest.len()).rfind(|&i| {
            (bytes[i] == b'+' || bytes[i] == b'-')
                && bytes[i - 1] != b'e'
                && bytes[i - 1] != b'E'
        });

        match split {
            Some(i) => {
                let (real_text, imaginary) = rest.split_at(i);
                let imaginary = match imaginary {
                    "+" | "" => "1".to_string(),
                    "-" => "-1".to_string(),
                    text => text.to_string(),
                };
                (real_text.to_string(), imaginary)
            }
            None => {
                let imaginary = match rest {
                    "" | "+" => "1",
                    "-" => "-1",
                    text => text,
                };
                ("0".to_string(), imaginary.to_string())
            }
        }
    } else {
        (compact.to_string(), "0".to_string())
    }
}

/// Render this entry as `a + bi`.
pub fn string(entry: &Entry) -> Result<String> {
    expect_complex(entry, "string")?;
    let (real_part, imaginary_part) = components(entry)?;

    let real_text = real::string(&real_part)?;
    let imaginary_text = real::string(&imaginary_part)?;

    Ok(match imaginary_text.strip_prefix('-') {
        Some(magnitude) => format!("{real_text} - {magnitude}i"),
        None => format!("{real_text} + {imaginary_text}i"),
    })
}
