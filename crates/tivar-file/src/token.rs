//! Tokenizer collaborator interface.
//!
//! The calculator stores program source as token byte sequences. The token
//! trie itself lives outside this crate; we consume it as two pure
//! functions over supplied maps, plus the small name codecs the entry
//! envelope needs.

use std::collections::BTreeMap;

/// Text token → token bytes.
pub type TokenMap = BTreeMap<String, Vec<u8>>;

/// Token bytes → text token.
pub type ByteMap = BTreeMap<Vec<u8>, String>;

/// The theta character used in on-calc names.
pub const THETA: char = '\u{03b8}';

/// Byte encoding of theta in name sections.
pub const THETA_BYTE: u8 = 0x5B;

/// Tokenize `text` with greedy longest-match against `token_map`.
///
/// Characters with no token mapping pass through as their low byte, which
/// covers plain ASCII source for maps that omit single characters.
pub fn encode(text: &str, token_map: &TokenMap) -> Vec<u8> {
    let mut out = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        let matched = token_map
            .iter()
            .filter(|(token, _)| rest.starts_with(token.as_str()))
            .max_by_key(|(token, _)| token.len());

        match matched {
            Some((token, bytes)) => {
                out.extend_from_slice(bytes);
                rest = &rest[token.len()..];
            }
            None => {
                let ch = rest.chars().next().unwrap_or('\0');
                out.push(ch as u8);
                rest = &rest[ch.len_utf8()..];
            }
        }
    }

    out
}

/// Detokenize `bytes` with greedy longest-match against `byte_map`.
///
/// Bytes with no mapping pass through as ASCII where printable, `?`
/// otherwise.
pub fn decode(bytes: &[u8], byte_map: &ByteMap) -> String {
    let mut out = String::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let matched = byte_map
            .iter()
            .filter(|(seq, _)| bytes[pos..].starts_with(seq))
            .max_by_key(|(seq, _)| seq.len());

        match matched {
            Some((seq, text)) => {
                out.push_str(text);
                pos += seq.len();
            }
            None => {
                let byte = bytes[pos];
                if byte.is_ascii_graphic() || byte == b' ' {
                    out.push(byte as char);
                } else {
                    out.push('?');
                }
                pos += 1;
            }
        }
    }

    out
}

/// Encode an entry name into its 8-byte tokenized form.
///
/// Names are upper-case A–Z, 0–9, and theta; anything else is dropped.
pub fn encode_name(name: &str) -> Vec<u8> {
    name.chars()
        .filter_map(|ch| match ch {
            'a'..='z' => Some(ch.to_ascii_uppercase() as u8),
            'A'..='Z' | '0'..='9' => Some(ch as u8),
            THETA | '\u{0398}' | '\u{03F4}' | '\u{1DBF}' => Some(THETA_BYTE),
            _ => None,
        })
        .take(8)
        .collect()
}

/// Decode an 8-byte name section back to text, stripping trailing NULs.
pub fn decode_name(data: &[u8]) -> String {
    data.iter()
        .take_while(|&&byte| byte != 0)
        .map(|&byte| match byte {
            THETA_BYTE => THETA,
            _ => byte as char,
        })
        .collect()
}

/// List-name marker byte.
const LIST_PREFIX: u8 = 0x5D;

/// Encode a list name as shown in the memory viewer.
///
/// `L1`–`L6` map to the two-byte builtin tokens; `IDList` has a dedicated
/// token; anything else becomes the marker byte plus up to five name
/// characters.
pub fn encode_list_name(name: &str) -> Vec<u8> {
    let cleaned: String = name
        .chars()
        .take(7)
        .filter_map(|ch| match ch {
            'a'..='z' => Some(ch.to_ascii_uppercase()),
            'A'..='Z' | '0'..='9' => Some(ch),
            THETA | '\u{0398}' | '\u{03F4}' | '\u{1DBF}' => Some(THETA),
            _ => None,
        })
        .collect();

    if name.contains("IDList") {
        return vec![LIST_PREFIX, 0x40];
    }

    if let Some(digit) = cleaned.strip_prefix('L').and_then(|rest| {
        let mut chars = rest.chars();
        match (chars.next(), chars.next()) {
            (Some(d @ '1'..='6'), None) => Some(d as u8 - b'1'),
            _ => None,
        }
    }) {
        return vec![LIST_PREFIX, digit];
    }

    let mut out = vec![LIST_PREFIX];
    out.extend(encode_name(&cleaned).into_iter().take(5));
    out
}

/// Decode a list name section as shown in the memory viewer.
pub fn decode_list_name(data: &[u8]) -> String {
    match data {
        [LIST_PREFIX, index, ..] if *index < 6 => format!("L{}", index + 1),
        [LIST_PREFIX, 0x40, ..] => "IDList".to_string(),
        [LIST_PREFIX, rest @ ..] => decode_name(rest),
        _ => decode_name(data),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_maps() -> (TokenMap, ByteMap) {
        let mut tokens = TokenMap::new();
        tokens.insert("Disp ".to_string(), vec![0xDE]);
        tokens.insert("sin(".to_string(), vec![0xC2]);
        tokens.insert("sinh(".to_string(), vec![0xBB, 0x0A]);

        let bytes = tokens
            .iter()
            .map(|(text, seq)| (seq.clone(), text.clone()))
            .collect();
        (tokens, bytes)
    }

    #[test]
    fn encode_prefers_longest_match() {
        let (tokens, _) = sample_maps();
        assert_eq!(encode("sinh(", &tokens), vec![0xBB, 0x0A]);
        assert_eq!(encode("sin(", &tokens), vec![0xC2]);
    }

    #[test]
    fn encode_decode_round_trip() {
        let (tokens, bytes) = sample_maps();
        let source = "Disp sin(X";
        let encoded = encode(source, &tokens);
        assert_eq!(encoded, vec![0xDE, 0xC2, b'X']);
        assert_eq!(decode(&encoded, &bytes), source);
    }

    #[test]
    fn name_round_trip() {
        assert_eq!(encode_name("ABC12"), b"ABC12");
        assert_eq!(decode_name(b"ABC12\0\0\0"), "ABC12");
        assert_eq!(encode_name("lower"), b"LOWER");
        assert_eq!(encode_name("TOOLONGNAME").len(), 8);
    }

    #[test]
    fn theta_maps_to_its_byte() {
        let encoded = encode_name("A\u{03b8}B");
        assert_eq!(encoded, [b'A', THETA_BYTE, b'B']);
        assert_eq!(decode_name(&encoded), "A\u{03b8}B");
    }

    #[test]
    fn builtin_list_names() {
        assert_eq!(encode_list_name("L1"), vec![0x5D, 0x00]);
        assert_eq!(encode_list_name("L6"), vec![0x5D, 0x05]);
        assert_eq!(decode_list_name(&[0x5D, 0x02]), "L3");
    }

    #[test]
    fn custom_list_names() {
        let encoded = encode_list_name("SCORES");
        assert_eq!(encoded[0], 0x5D);
        assert_eq!(&encoded[1..], b"SCORE");
        assert_eq!(decode_list_name(&encoded), "SCORE");
    }

    #[test]
    fn id_list_token() {
        assert_eq!(encode_list_name("IDList"), vec![0x5D, 0x40]);
        assert_eq!(decode_list_name(&[0x5D, 0x40]), "IDList");
    }
}
