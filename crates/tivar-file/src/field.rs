//! Declarative field framework.
//!
//! Every container in the format (header, entry) owns a set of raw byte
//! slots. A [`Section`] binds a name, an optional fixed width, and a
//! bytes⇄value [`Codec`] to one slot; a [`View`] addresses a sub-slice of a
//! section's *current* bytes, so it always reflects live data rather than a
//! snapshot. Descriptors are schema: they hold no per-instance state, and
//! all mutation happens in place on the owning slot.
//!
//! Writing a value wider than a bounded section truncates to the declared
//! width and zero-pads, with a recoverable warning; it never fails.

use crate::diag::{Diagnostics, Warning};
use crate::error::{Result, VarError};

/// A bidirectional bytes⇄value converter.
///
/// Codecs are plain function pairs so sections can live in `const` schema
/// tables.
pub struct Codec<T> {
    pub encode: fn(&T) -> Vec<u8>,
    pub decode: fn(&[u8]) -> T,
}

// Manual impls: the function pointers are always copyable, and a derive
// would demand `T: Copy`.
impl<T> Clone for Codec<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Codec<T> {}

/// Identity codec.
pub const BYTES: Codec<Vec<u8>> = Codec {
    encode: |value| value.clone(),
    decode: <[u8]>::to_vec,
};

/// Little-endian unsigned integer, encoded in as few bytes as the value
/// needs (the section width supplies the padding).
pub const INTEGER: Codec<u64> = Codec {
    encode: |value| {
        let len = ((64 - value.leading_zeros()).div_ceil(8)).max(1) as usize;
        value.to_le_bytes()[..len].to_vec()
    },
    decode: |data| {
        let mut bytes = [0u8; 8];
        let len = data.len().min(8);
        bytes[..len].copy_from_slice(&data[..len]);
        u64::from_le_bytes(bytes)
    },
};

/// Boolean stored as 0x80 (true) / 0x00 (false).
pub const BOOLEAN: Codec<bool> = Codec {
    encode: |value| vec![if *value { 0x80 } else { 0x00 }],
    decode: |data| data == [0x80],
};

/// UTF-8 string with trailing NULs stripped on decode.
pub const STRING: Codec<String> = Codec {
    encode: |value| value.as_bytes().to_vec(),
    decode: |data| {
        String::from_utf8_lossy(data)
            .trim_end_matches('\0')
            .to_string()
    },
};

/// A named, fixed-or-unbounded-width byte range of an owning raw slot.
pub struct Section<T: 'static> {
    pub name: &'static str,
    /// `None` means variable-length: the slot consumes whatever it is given.
    pub width: Option<usize>,
    pub codec: Codec<T>,
}

impl<T> Section<T> {
    #[must_use]
    pub const fn new(name: &'static str, width: Option<usize>, codec: Codec<T>) -> Self {
        Self { name, width, codec }
    }

    /// Decode the slot's current bytes.
    pub fn get(&self, slot: &[u8]) -> T {
        (self.codec.decode)(slot)
    }

    /// Encode `value` into the slot, truncating and zero-padding to the
    /// declared width (left-aligned). Over-wide values warn, never fail.
    pub fn set(&self, slot: &mut Vec<u8>, value: &T, diag: &mut Diagnostics) {
        let mut bytes = (self.codec.encode)(value);

        if let Some(width) = self.width {
            if bytes.len() > width {
                diag.warn(Warning::ValueTooWide {
                    field: self.name,
                    width,
                    len: bytes.len(),
                });
                bytes.truncate(width);
            }
            bytes.resize(width, 0);
        }

        *slot = bytes;
    }

    /// Reset the slot to all zeroes (or empty when unbounded).
    pub fn clear(&self, slot: &mut Vec<u8>) {
        *slot = vec![0; self.width.unwrap_or(0)];
    }
}

/// A start/stop/step slice specification with Python-style negative and
/// open bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceSpec {
    pub start: Option<isize>,
    pub stop: Option<isize>,
    pub step: isize,
}

impl SliceSpec {
    /// The full slice `[..]`.
    #[must_use]
    pub const fn full() -> Self {
        Self {
            start: None,
            stop: None,
            step: 1,
        }
    }

    /// The slice `[start..stop]`.
    #[must_use]
    pub const fn range(start: isize, stop: isize) -> Self {
        Self {
            start: Some(start),
            stop: Some(stop),
            step: 1,
        }
    }

    /// The slice `[start..]`.
    #[must_use]
    pub const fn from(start: isize) -> Self {
        Self {
            start: Some(start),
            stop: None,
            step: 1,
        }
    }

    /// Clamp the bounds against a concrete length, producing the effective
    /// `(start, stop, step)` triple.
    fn indices(&self, len: usize) -> (isize, isize, isize) {
        let len = len as isize;
        let step = self.step;

        let resolve = |bound: Option<isize>, default: isize| -> isize {
            match bound {
                None => default,
                Some(b) if b < 0 => (b + len).clamp(if step > 0 { 0 } else { -1 }, len),
                Some(b) => b.min(len),
            }
        };

        if step > 0 {
            (resolve(self.start, 0), resolve(self.stop, len), step)
        } else {
            (
                resolve(self.start, len - 1).min(len - 1),
                resolve(self.stop, -1),
                step,
            )
        }
    }

    /// The byte positions this slice selects in a buffer of length `len`.
    pub fn positions(&self, len: usize) -> Vec<usize> {
        let (start, stop, step) = self.indices(len);
        let mut out = Vec::new();

        let mut i = start;
        if step > 0 {
            while i < stop {
                out.push(i as usize);
                i += step;
            }
        } else {
            while i > stop {
                if i >= 0 {
                    out.push(i as usize);
                }
                i += step;
            }
        }

        out
    }

    /// The number of positions this slice selects in a buffer of length
    /// `len`.
    #[must_use]
    pub fn count(&self, len: usize) -> usize {
        let (start, stop, step) = self.indices(len);
        if step > 0 {
            ((stop - start).max(0) as usize).div_ceil(step as usize)
        } else {
            ((start - stop).max(0) as usize).div_ceil((-step) as usize)
        }
    }
}

/// A derived section addressing a sub-slice of a target section's bytes.
pub struct View<T: 'static> {
    pub name: &'static str,
    /// The target section's declared width, if bounded.
    pub target_width: Option<usize>,
    pub slice: SliceSpec,
    pub codec: Codec<T>,
}

impl<T> View<T> {
    #[must_use]
    pub const fn new(
        name: &'static str,
        target_width: Option<usize>,
        slice: SliceSpec,
        codec: Codec<T>,
    ) -> Self {
        Self {
            name,
            target_width,
            slice,
            codec,
        }
    }

    /// Re-derive this view with a replacement slice (chained re-slicing
    /// replaces, it does not compose).
    #[must_use]
    pub const fn reslice(&self, slice: SliceSpec) -> View<T> {
        View {
            name: self.name,
            target_width: self.target_width,
            slice,
            codec: self.codec,
        }
    }

    /// Effective width of the view, if defined.
    ///
    /// Bounded targets resolve the slice against the target width. For
    /// unbounded targets an open or negative bound leaves the width
    /// undefined, which disables truncation entirely.
    #[must_use]
    pub fn width(&self) -> Option<usize> {
        match self.target_width {
            Some(target_width) => Some(self.slice.count(target_width)),
            None => {
                if self.slice.step > 0 && !matches!(self.slice.stop, Some(stop) if stop >= 0) {
                    return None;
                }
                let start = match self.slice.start {
                    Some(start) if start >= 0 => start,
                    _ => return None,
                };
                let stop = self.slice.stop.unwrap_or(0);
                let span = (stop - start).max(0) as usize;
                Some(span.div_ceil(self.slice.step.unsigned_abs()))
            }
        }
    }

    /// Decode the view's bytes out of the target's current contents.
    pub fn get(&self, target: &[u8]) -> T {
        let bytes: Vec<u8> = self
            .slice
            .positions(target.len())
            .into_iter()
            .map(|i| target[i])
            .collect();
        (self.codec.decode)(&bytes)
    }

    /// Encode `value` into the target's slice region.
    ///
    /// Bounded views truncate over-wide values (warning) and zero-pad on
    /// the right, keeping little-endian layouts intact; unbounded views
    /// splice the encoded bytes in as-is, growing or shrinking the target.
    pub fn set(&self, target: &mut Vec<u8>, value: &T, diag: &mut Diagnostics) {
        let mut bytes = (self.codec.encode)(value);

        if let Some(width) = self.width() {
            if bytes.len() > width {
                diag.warn(Warning::ValueTooWide {
                    field: self.name,
                    width,
                    len: bytes.len(),
                });
                bytes.truncate(width);
            }
            bytes.resize(width, 0);
        }

        self.splice(target, bytes);
    }

    /// Reset the slice region to zeroes (or remove it when unbounded).
    pub fn clear(&self, target: &mut Vec<u8>) {
        let bytes = match self.width() {
            Some(width) => vec![0; width],
            None => Vec::new(),
        };
        self.splice(target, bytes);
    }

    fn splice(&self, target: &mut Vec<u8>, bytes: Vec<u8>) {
        let positions = self.slice.positions(target.len());

        // Contiguous forward slices may resize the target; strided slices
        // must match the selection exactly.
        if self.slice.step == 1 {
            let start = positions.first().copied().unwrap_or_else(|| {
                let (start, _, _) = self.slice.indices(target.len());
                (start.max(0) as usize).min(target.len())
            });
            let end = positions.last().map_or(start, |last| last + 1);
            target.splice(start..end, bytes);
        } else {
            debug_assert_eq!(positions.len(), bytes.len());
            for (position, byte) in positions.into_iter().zip(bytes) {
                target[position] = byte;
            }
        }
    }
}

/// Sequential reader over a fully materialized buffer.
///
/// Running past the end is the one fatal condition in the parsing core.
pub(crate) struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Consume exactly `n` bytes.
    pub(crate) fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        match self.data.get(self.pos..self.pos + n) {
            Some(bytes) => {
                self.pos += n;
                Ok(bytes)
            }
            None => Err(VarError::truncated(
                self.pos,
                n - (self.data.len() - self.pos),
            )),
        }
    }

    /// Consume a little-endian u16.
    pub(crate) fn take_u16(&mut self) -> Result<u16> {
        let bytes = self.take(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    /// Consume a single byte.
    pub(crate) fn take_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    /// Consume everything left.
    pub(crate) fn rest(&mut self) -> &'a [u8] {
        let rest = &self.data[self.pos..];
        self.pos = self.data.len();
        rest
    }

    pub(crate) fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAME: Section<String> = Section::new("name", Some(8), STRING);
    const DATA: Section<Vec<u8>> = Section::new("data", None, BYTES);

    #[test]
    fn section_pads_left_aligned() {
        let mut slot = Vec::new();
        let mut diag = Diagnostics::new();

        NAME.set(&mut slot, &"AB".to_string(), &mut diag);
        assert_eq!(slot, b"AB\0\0\0\0\0\0");
        assert!(diag.is_empty());
        assert_eq!(NAME.get(&slot), "AB");
    }

    #[test]
    fn section_truncates_with_warning() {
        let mut slot = Vec::new();
        let mut diag = Diagnostics::new();

        NAME.set(&mut slot, &"ABCDEFGHIJ".to_string(), &mut diag);
        assert_eq!(slot, b"ABCDEFGH");
        assert_eq!(diag.len(), 1);
        assert!(diag.any(|w| matches!(w, Warning::ValueTooWide { width: 8, len: 10, .. })));
    }

    #[test]
    fn section_clear() {
        let mut slot = b"ABCDEFGH".to_vec();
        NAME.clear(&mut slot);
        assert_eq!(slot, [0; 8]);

        let mut slot = b"xyz".to_vec();
        DATA.clear(&mut slot);
        assert!(slot.is_empty());
    }

    #[test]
    fn unbounded_section_stores_as_is() {
        let mut slot = Vec::new();
        let mut diag = Diagnostics::new();
        DATA.set(&mut slot, &vec![1, 2, 3, 4, 5], &mut diag);
        assert_eq!(slot, [1, 2, 3, 4, 5]);
        assert!(diag.is_empty());
    }

    #[test]
    fn integer_codec_round_trip() {
        assert_eq!((INTEGER.encode)(&0), vec![0]);
        assert_eq!((INTEGER.encode)(&0x1234), vec![0x34, 0x12]);
        assert_eq!((INTEGER.decode)(&[0x34, 0x12]), 0x1234);
        assert_eq!((INTEGER.decode)(&[]), 0);
    }

    #[test]
    fn view_reads_live_data() {
        let view: View<u64> = View::new("length", None, SliceSpec::range(0, 2), INTEGER);
        let mut target = vec![0x05, 0x00, b'a', b'b', b'c', b'd', b'e'];
        assert_eq!(view.get(&target), 5);

        target[0] = 0x06;
        target.push(b'f');
        assert_eq!(view.get(&target), 6);
    }

    #[test]
    fn view_set_pads_little_endian() {
        let view: View<u64> = View::new("length", None, SliceSpec::range(0, 2), INTEGER);
        let mut target = vec![0xFF, 0xFF, 1, 2, 3];
        let mut diag = Diagnostics::new();

        view.set(&mut target, &7, &mut diag);
        // LE encoding of 7 is one byte; the two-byte view pads the high
        // byte, so the stored prefix stays little-endian.
        assert_eq!(target, [7, 0, 1, 2, 3]);
        assert_eq!(view.get(&target), 7);
        assert!(diag.is_empty());
    }

    #[test]
    fn open_tail_view_resizes_target() {
        let view: View<Vec<u8>> = View::new("payload", None, SliceSpec::from(2), BYTES);
        let mut target = vec![9, 9, 1, 2, 3];
        let mut diag = Diagnostics::new();

        assert_eq!(view.width(), None);
        view.set(&mut target, &vec![7, 8, 9, 10], &mut diag);
        assert_eq!(target, [9, 9, 7, 8, 9, 10]);

        view.clear(&mut target);
        assert_eq!(target, [9, 9]);
    }

    #[test]
    fn view_width_rules() {
        // Bounded target: slice resolved against the target width.
        let bounded: View<u64> = View::new("exp", Some(9), SliceSpec::range(1, 2), INTEGER);
        assert_eq!(bounded.width(), Some(1));

        let clipped: View<Vec<u8>> = View::new("tail", Some(9), SliceSpec::from(2), BYTES);
        assert_eq!(clipped.width(), Some(7));

        // Unbounded target, open stop: undefined.
        let open: View<Vec<u8>> = View::new("tail", None, SliceSpec::from(2), BYTES);
        assert_eq!(open.width(), None);

        // Unbounded target, closed bounds: computed from the slice.
        let closed: View<u64> = View::new("len", None, SliceSpec::range(0, 2), INTEGER);
        assert_eq!(closed.width(), Some(2));
    }

    #[test]
    fn reslice_replaces_bounds() {
        let view: View<Vec<u8>> = View::new("data", Some(9), SliceSpec::full(), BYTES);
        let sub = view.reslice(SliceSpec::range(2, 9));
        assert_eq!(sub.width(), Some(7));

        let target: Vec<u8> = (0..9).collect();
        assert_eq!(sub.get(&target), vec![2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn negative_bounds_resolve() {
        let spec = SliceSpec {
            start: Some(-3),
            stop: None,
            step: 1,
        };
        assert_eq!(spec.positions(5), vec![2, 3, 4]);
    }

    #[test]
    fn byte_reader_truncation_is_fatal() {
        let mut reader = ByteReader::new(&[1, 2, 3]);
        assert_eq!(reader.take(2).unwrap(), &[1, 2]);
        let err = reader.take(4).unwrap_err();
        assert!(matches!(
            err,
            VarError::TruncatedInput {
                offset: 2,
                needed: 3
            }
        ));
    }
}
