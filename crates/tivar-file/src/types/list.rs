//! The list types.
//!
//! A list is a one-dimensional array of real or complex elements. Data
//! layout: `[count:2 LE][count × element]`, where an element is the 9- or
//! 18-byte payload of its numeric kind. TI-OS caps lists at 999 elements.

use crate::diag::{Diagnostics, Warning};
use crate::entry::{Entry, EntryKind, EntryOptions};
use crate::error::{Result, VarError};
use crate::field::{BYTES, INTEGER, SliceSpec, View};
use crate::types::{complex, real};

const COUNT: View<u64> = View::new("length", None, SliceSpec::range(0, 2), INTEGER);
const ELEMENTS: View<Vec<u8>> = View::new("data", None, SliceSpec::from(2), BYTES);

fn element_kind(entry: &Entry) -> Result<EntryKind> {
    match entry.kind() {
        EntryKind::RealList => Ok(EntryKind::Real),
        EntryKind::ComplexList => Ok(EntryKind::Complex),
        kind => Err(VarError::not_implemented(kind.label(), "list")),
    }
}

/// The declared element count.
#[must_use]
pub fn length(entry: &Entry) -> usize {
    COUNT.get(entry.data()) as usize
}

/// Replace this list's contents with `elements`.
///
/// Every element must be of the list's element kind and carry a full
/// payload. Lists beyond the on-calc limit of 999 load with a warning.
pub fn load_list(entry: &mut Entry, elements: &[Entry], diag: &mut Diagnostics) -> Result<()> {
    let kind = element_kind(entry)?;
    let width = kind.min_data_length();

    let mut data = Vec::with_capacity(elements.len() * width);
    for element in elements {
        if element.kind() != kind || element.data_length() != width {
            return Err(VarError::structural(format!(
                "list element is not a full {}",
                kind.label()
            )));
        }
        data.extend_from_slice(element.data());
    }

    if elements.len() > 999 {
        diag.warn(Warning::ListTooLong {
            len: elements.len(),
        });
    }

    COUNT.set(entry.data_mut(), &(elements.len() as u64), diag);
    ELEMENTS.set(entry.data_mut(), &data, diag);
    Ok(())
}

/// The elements of this list as entries of its element kind.
pub fn list(entry: &Entry) -> Result<Vec<Entry>> {
    let kind = element_kind(entry)?;
    let width = kind.min_data_length();
    let flashless = entry.meta_length() <= crate::entry::BASE_META_LENGTH;

    Ok(ELEMENTS
        .get(entry.data())
        .chunks_exact(width)
        .map(|data| {
            let options = EntryOptions::new(kind).with_data(data.to_vec());
            let options = if flashless { options.flashless() } else { options };
            Entry::with_options(&options).0
        })
        .collect())
}

/// Parse a string of the form `[1, 2.5, 3e2]` (braces work too).
pub fn load_string(entry: &mut Entry, string: &str, diag: &mut Diagnostics) -> Result<()> {
    let kind = element_kind(entry)?;

    let stripped: String = string
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .trim_matches(['[', ']', '{', '}'])
        .to_string();

    let mut elements = Vec::new();
    if !stripped.is_empty() {
        for item in stripped.split(',') {
            let mut element = Entry::new(kind);
            match kind {
                EntryKind::Complex => complex::load_string(&mut element, item, diag)?,
                _ => real::load_string(&mut element, item, diag)?,
            }
            elements.push(element);
        }
    }

    load_list(entry, &elements, diag)
}

/// Render this list as `[a, b, c]`.
pub fn string(entry: &Entry) -> Result<String> {
    let kind = element_kind(entry)?;

    let rendered: Vec<String> = list(entry)?
        .iter()
        .map(|element| match kind {
            EntryKind::Complex => complex::string(element),
            _ => real::string(element),
        })
        .collect::<Result<_>>()?;

    Ok(format!("[{}]", rendered.join(", ")))
}
