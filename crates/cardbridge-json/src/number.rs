//! Number lexing for the restricted JSON grammar.
//!
//! JSON numbers are recognized by a small state machine rather than a
//! regex or a greedy "grab every digit-ish byte" scan, so that inputs
//! like `1..2` or `1e+` fail exactly where the grammar says they
//! should instead of wherever `f32::from_str` happens to give up.
//!
//! States, matching the grammar in the wire profile:
//!
//! ```text
//! A: start — '-' or digit
//! B: after '-' — need digit
//! C: leading-zero form — '.' , [eE], or terminator
//! D: integer digits — more digits | '.' | [eE] | terminator
//! E: after '.' — need digit
//! F: fraction digits — more digits | [eE] | terminator
//! G: after exponent mark — digit | sign
//! H: after exponent sign — need digit
//! I: exponent digits — more digits | terminator
//! ```
//!
//! C, D, F and I are accepting states; the rest require more input.

use cardbridge_core::constants::MAX_NUMBER_LEN;
use cardbridge_core::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
}

fn is_terminator(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b',' | b']' | b'}')
}

fn is_accepting(s: State) -> bool {
    matches!(s, State::C | State::D | State::F | State::I)
}

/// Lex a number token starting at `input[0]`. Returns the number of
/// bytes consumed and the parsed value. Does not consume the
/// terminating byte (if any) — the caller re-inspects it.
pub fn lex_number(input: &[u8]) -> Result<(usize, f32)> {
    let mut state = State::A;
    let mut i = 0usize;

    while i < input.len() {
        if i >= MAX_NUMBER_LEN {
            return Err(Error::NumberTooLong);
        }
        let b = input[i];
        state = match (state, b) {
            (State::A, b'-') => State::B,
            (State::A, b'0') => State::C,
            (State::A, b'1'..=b'9') => State::D,
            (State::B, b'0') => State::C,
            (State::B, b'1'..=b'9') => State::D,
            (State::C, b'.') => State::E,
            (State::C, b'e' | b'E') => State::G,
            (State::C, _) if is_terminator(b) => break,
            (State::D, b'0'..=b'9') => State::D,
            (State::D, b'.') => State::E,
            (State::D, b'e' | b'E') => State::G,
            (State::D, _) if is_terminator(b) => break,
            (State::E, b'0'..=b'9') => State::F,
            (State::F, b'0'..=b'9') => State::F,
            (State::F, b'e' | b'E') => State::G,
            (State::F, _) if is_terminator(b) => break,
            (State::G, b'+' | b'-') => State::H,
            (State::G, b'0'..=b'9') => State::I,
            (State::H, b'0'..=b'9') => State::I,
            (State::I, b'0'..=b'9') => State::I,
            (State::I, _) if is_terminator(b) => break,
            _ => return Err(Error::InvalidJson(format!("malformed number at byte {i}"))),
        };
        i += 1;
    }

    if !is_accepting(state) {
        return Err(Error::InvalidJson(
            "number literal ended in an incomplete state".into(),
        ));
    }

    let text = std::str::from_utf8(&input[..i])
        .map_err(|e| Error::InvalidUtf8(e.to_string()))?;
    let value: f32 = text
        .parse()
        .map_err(|_| Error::InvalidJson(format!("number literal does not parse: {text}")))?;
    Ok((i, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("0", 0.0)]
    #[case("-0", 0.0)]
    #[case("42", 42.0)]
    #[case("-17", -17.0)]
    #[case("3.14", 3.14)]
    #[case("0.5", 0.5)]
    #[case("1e10", 1e10)]
    #[case("1E+10", 1e10)]
    #[case("1e-10", 1e-10)]
    #[case("2.5e3", 2500.0)]
    fn accepts_valid_numbers(#[case] input: &str, #[case] expected: f32) {
        let (consumed, value) = lex_number(input.as_bytes()).unwrap();
        assert_eq!(consumed, input.len());
        assert!((value - expected).abs() < 1e-3, "{value} != {expected}");
    }

    #[test]
    fn stops_before_terminator() {
        let (consumed, value) = lex_number(b"42,true").unwrap();
        assert_eq!(consumed, 2);
        assert_eq!(value, 42.0);
    }

    #[rstest]
    #[case("-")]
    #[case("00")]
    #[case("1.")]
    #[case("1e")]
    #[case("1e+")]
    #[case(".5")]
    fn rejects_malformed_numbers(#[case] input: &str) {
        assert!(lex_number(input.as_bytes()).is_err(), "expected rejection of {input:?}");
    }

    #[test]
    fn rejects_overlong_number() {
        let long = "1".repeat(MAX_NUMBER_LEN + 1);
        assert!(lex_number(long.as_bytes()).is_err());
    }
}
