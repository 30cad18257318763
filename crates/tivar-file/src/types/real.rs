//! The real number type.
//!
//! Data layout: `[flags:1][exponent:1][mantissa:7]`. The exponent carries a
//! bias of 0x80; the mantissa is 14 decimal digits packed BCD, two per byte,
//! most significant first. Flags bit 7 is the sign.

use crate::diag::Diagnostics;
use crate::entry::{Entry, EntryKind, REAL_WIDTH};
use crate::error::{Result, VarError};
use crate::field::{Codec, INTEGER, SliceSpec, View};

/// Exponent bias.
pub const EXPONENT_BIAS: u8 = 0x80;

/// Sign bit within the flags byte.
pub const SIGN_BIT: u8 = 1 << 7;

/// Pack an integer of up to 14 decimal digits as BCD.
#[must_use]
pub fn to_bcd(number: u64) -> [u8; 7] {
    let mut out = [0u8; 7];
    let mut n = number;

    for byte in out.iter_mut().rev() {
        let ones = (n % 10) as u8;
        n /= 10;
        let tens = (n % 10) as u8;
        n /= 10;
        *byte = tens << 4 | ones;
    }

    out
}

/// Unpack a BCD byte string back to an integer. Exact inverse of
/// [`to_bcd`].
#[must_use]
pub fn from_bcd(bcd: &[u8]) -> u64 {
    bcd.iter().fold(0, |acc, &byte| {
        acc * 100 + u64::from(byte >> 4) * 10 + u64::from(byte & 0x0F)
    })
}

const MANTISSA_CODEC: Codec<u64> = Codec {
    encode: |value| to_bcd(*value).to_vec(),
    decode: from_bcd,
};

const FLAGS: View<u64> = View::new("flags", Some(REAL_WIDTH), SliceSpec::range(0, 1), INTEGER);
const EXPONENT: View<u64> =
    View::new("exponent", Some(REAL_WIDTH), SliceSpec::range(1, 2), INTEGER);
const MANTISSA: View<u64> = View::new(
    "mantissa",
    Some(REAL_WIDTH),
    SliceSpec::range(2, 9),
    MANTISSA_CODEC,
);

/// The flags byte. Bit 1 marks an undefined value, bits 2 and 3 a complex
/// component, bit 7 a negative number.
#[must_use]
pub fn flags(entry: &Entry) -> u8 {
    FLAGS.get(entry.data()) as u8
}

pub fn set_flags(entry: &mut Entry, value: u8, diag: &mut Diagnostics) {
    FLAGS.set(entry.data_mut(), &u64::from(value), diag);
}

/// The biased exponent byte.
#[must_use]
pub fn exponent(entry: &Entry) -> u8 {
    EXPONENT.get(entry.data()) as u8
}

pub fn set_exponent(entry: &mut Entry, value: u8, diag: &mut Diagnostics) {
    EXPONENT.set(entry.data_mut(), &u64::from(value), diag);
}

/// The mantissa as a 14-digit integer.
#[must_use]
pub fn mantissa(entry: &Entry) -> u64 {
    MANTISSA.get(entry.data())
}

pub fn set_mantissa(entry: &mut Entry, value: u64, diag: &mut Diagnostics) {
    MANTISSA.set(entry.data_mut(), &value, diag);
}

/// Whether the sign bit is set.
#[must_use]
pub fn is_negative(entry: &Entry) -> bool {
    flags(entry) & SIGN_BIT != 0
}

/// Flip the sign bit.
pub fn negate(entry: &mut Entry, diag: &mut Diagnostics) {
    let flipped = flags(entry) ^ SIGN_BIT;
    set_flags(entry, flipped, diag);
}

fn expect_real(entry: &Entry, representation: &'static str) -> Result<()> {
    match entry.kind() {
        EntryKind::Real => Ok(()),
        kind => Err(VarError::not_implemented(kind.label(), representation)),
    }
}

/// Parse a decimal string into this entry's data section.
///
/// Accepts an optional `-` or `~` sign, digits, an optional `.`, and an
/// optional case-insensitive `e<exponent>` (a `|e` prefix is tolerated as a
/// synonym). The decimal point is shifted until a single integer digit
/// remains, incrementing the exponent per shift.
pub fn load_string(entry: &mut Entry, string: &str, diag: &mut Diagnostics) -> Result<()> {
    expect_real(entry, "string")?;

    let mut string = string
        .to_lowercase()
        .replace('~', "-")
        .replace("|e", "e")
        .replace(char::is_whitespace, "");

    if !string.contains('e') {
        string.push_str("e0");
    }
    if !string.contains('.') {
        string = string.replace('e', ".e");
    }

    let negative = string.starts_with('-');
    let string = string.trim_matches(['+', '-']);

    let (number, exponent) = string
        .split_once('e')
        .ok_or_else(|| VarError::structural(format!("invalid numeric string {string:?}")))?;
    let (integer, decimal) = number
        .split_once('.')
        .ok_or_else(|| VarError::structural(format!("invalid numeric string {string:?}")))?;

    let mut integer = if integer.is_empty() { "0" } else { integer }.to_string();
    let mut decimal = if decimal.is_empty() { "0" } else { decimal }.to_string();
    let mut exponent: i32 = if exponent.is_empty() {
        0
    } else {
        exponent
            .parse()
            .map_err(|_| VarError::structural(format!("invalid exponent {exponent:?}")))?
    };

    while integer.len() > 1 {
        let last = integer.split_off(integer.len() - 1);
        decimal.insert_str(0, &last);
        exponent += 1;
    }

    let mut digits = format!("{integer}{decimal}");
    digits.truncate(14);
    let mantissa: u64 = format!("{digits:0<14}")
        .parse()
        .map_err(|_| VarError::structural(format!("invalid numeric string {string:?}")))?;

    set_flags(entry, 0, diag);
    set_exponent(
        entry,
        (exponent + i32::from(EXPONENT_BIAS)) as u8,
        diag,
    );
    set_mantissa(entry, mantissa, diag);

    if negative {
        negate(entry, diag);
    }

    Ok(())
}

/// Render this entry's exact decimal value.
pub fn string(entry: &Entry) -> Result<String> {
    expect_real(entry, "string")?;

    let mantissa = mantissa(entry);
    if mantissa == 0 {
        return Ok("0".to_string());
    }

    let digits = format!("{mantissa:014}");
    let exponent = i32::from(exponent(entry)) - i32::from(EXPONENT_BIAS);

    let unsigned = if exponent < 0 {
        let fraction = digits.trim_end_matches('0');
        format!("0.{}{}", "0".repeat((-exponent - 1) as usize), fraction)
    } else {
        let point = (exponent + 1) as usize;
        if point >= digits.len() {
            format!("{digits}{}", "0".repeat(point - digits.len()))
                .trim_start_matches('0')
                .to_string()
        } else {
            let (whole, fraction) = digits.split_at(point);
            let whole = whole.trim_start_matches('0');
            let whole = if whole.is_empty() { "0" } else { whole };
            let fraction = fraction.trim_end_matches('0');
            if fraction.is_empty() {
                whole.to_string()
            } else {
                format!("{whole}.{fraction}")
            }
        }
    };

    Ok(if is_negative(entry) {
        format!("-{unsigned}")
    } else {
        unsigned
    })
}
