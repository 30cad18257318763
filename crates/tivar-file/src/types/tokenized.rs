//! Tokenized var types: equations, strings, and programs.
//!
//! Their sized payload is a calculator token stream; conversion to and from
//! source text goes through the tokenizer interface with a caller-supplied
//! token map.

use crate::diag::Diagnostics;
use crate::entry::{Entry, EntryKind};
use crate::error::{Result, VarError};
use crate::token::{ByteMap, TokenMap};
use crate::types::{set_sized_payload, sized_payload};

fn expect_tokenized(entry: &Entry, representation: &'static str) -> Result<()> {
    match entry.kind() {
        EntryKind::Equation
        | EntryKind::StringVar
        | EntryKind::Program
        | EntryKind::ProtectedProgram => Ok(()),
        kind => Err(VarError::not_implemented(kind.label(), representation)),
    }
}

/// Tokenize source text into this entry's payload.
pub fn load_string(
    entry: &mut Entry,
    string: &str,
    token_map: &TokenMap,
    diag: &mut Diagnostics,
) -> Result<()> {
    expect_tokenized(entry, "string")?;
    let tokens = crate::token::encode(string, token_map);
    set_sized_payload(entry, &tokens, diag);
    Ok(())
}

/// Detokenize this entry's payload back to source text.
pub fn string(entry: &Entry, byte_map: &ByteMap) -> Result<String> {
    expect_tokenized(entry, "string")?;
    Ok(crate::token::decode(&sized_payload(entry), byte_map))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_maps() -> (TokenMap, ByteMap) {
        let mut tokens = TokenMap::new();
        tokens.insert("Disp ".to_string(), vec![0xDE]);
        tokens.insert("\"".to_string(), vec![0x2A]);

        let bytes = tokens
            .iter()
            .map(|(text, seq)| (seq.clone(), text.clone()))
            .collect();
        (tokens, bytes)
    }

    #[test]
    fn program_source_round_trips() {
        let (tokens, bytes) = sample_maps();
        let mut entry = Entry::new(EntryKind::Program);
        let mut diag = Diagnostics::new();

        let source = "Disp \"HELLO\"";
        load_string(&mut entry, source, &tokens, &mut diag).unwrap();
        assert!(diag.is_empty());
        assert_eq!(entry.data()[..2], [8, 0]);
        assert_eq!(string(&entry, &bytes).unwrap(), source);
    }

    #[test]
    fn numeric_kinds_are_not_tokenized() {
        let (tokens, _) = sample_maps();
        let mut entry = Entry::new(EntryKind::Real);
        let mut diag = Diagnostics::new();

        let err = load_string(&mut entry, "1", &tokens, &mut diag).unwrap_err();
        assert!(matches!(err, VarError::NotImplemented { .. }));
    }
}
