//! Recursive-descent parser for the restricted JSON grammar.
//!
//! The parser consumes the *entire* input — trailing bytes after the
//! root value are a parse failure, not garbage to be ignored, since a
//! frame is expected to hold exactly one JSON document.

use crate::number::lex_number;
use crate::value::JsonValue;
use cardbridge_core::constants::MAX_JSON_DEPTH;
use cardbridge_core::{Error, Result};

pub fn parse(input: &[u8]) -> Result<JsonValue> {
    let mut p = Parser { input, pos: 0, depth: 0 };
    p.skip_ws();
    let value = p.parse_value()?;
    p.skip_ws();
    if p.pos != p.input.len() {
        return Err(Error::InvalidJson(format!(
            "trailing data after root value at byte {}",
            p.pos
        )));
    }
    Ok(value)
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, byte: u8) -> Result<()> {
        match self.advance() {
            Some(b) if b == byte => Ok(()),
            Some(b) => Err(Error::InvalidJson(format!(
                "expected {:?}, found {:?} at byte {}",
                byte as char, b as char, self.pos - 1
            ))),
            None => Err(Error::InvalidJson("unexpected end of input".into())),
        }
    }

    fn expect_literal(&mut self, text: &'static str) -> Result<()> {
        if self.input[self.pos..].starts_with(text.as_bytes()) {
            self.pos += text.len();
            Ok(())
        } else {
            Err(Error::InvalidJson(format!(
                "expected literal {text:?} at byte {}",
                self.pos
            )))
        }
    }

    fn parse_value(&mut self) -> Result<JsonValue> {
        match self.peek() {
            Some(b'n') => {
                self.expect_literal("null")?;
                Ok(JsonValue::Null)
            }
            Some(b't') => {
                self.expect_literal("true")?;
                Ok(JsonValue::Bool(true))
            }
            Some(b'f') => {
                self.expect_literal("false")?;
                Ok(JsonValue::Bool(false))
            }
            Some(b'"') => self.parse_string().map(JsonValue::String),
            Some(b'[') => self.parse_array(),
            Some(b'{') => self.parse_object(),
            Some(b'-') | Some(b'0'..=b'9') => self.parse_number(),
            Some(other) => Err(Error::InvalidJson(format!(
                "unexpected byte {:?} at {}",
                other as char, self.pos
            ))),
            None => Err(Error::InvalidJson("unexpected end of input".into())),
        }
    }

    fn parse_number(&mut self) -> Result<JsonValue> {
        let (consumed, value) = lex_number(&self.input[self.pos..])?;
        self.pos += consumed;
        Ok(JsonValue::Number(value))
    }

    fn parse_string(&mut self) -> Result<String> {
        self.expect(b'"')?;
        let mut bytes = Vec::new();
        loop {
            let b = self
                .advance()
                .ok_or_else(|| Error::InvalidJson("unterminated string".into()))?;
            match b {
                b'"' => break,
                b'\\' => {
                    let esc = self
                        .advance()
                        .ok_or_else(|| Error::InvalidJson("unterminated escape".into()))?;
                    let decoded = match esc {
                        b'"' => b'"',
                        b'\\' => b'\\',
                        b'/' => b'/',
                        b'b' => 0x08,
                        b'f' => 0x0C,
                        b'n' => b'\n',
                        b'r' => b'\r',
                        b't' => b'\t',
                        other => {
                            return Err(Error::InvalidJson(format!(
                                "unsupported escape \\{}",
                                other as char
                            )))
                        }
                    };
                    bytes.push(decoded);
                }
                b if b < 0x20 => {
                    return Err(Error::InvalidJson(format!(
                        "control byte 0x{b:02X} in string literal"
                    )))
                }
                b if b < 0x80 => bytes.push(b),
                b => {
                    // Multi-byte UTF-8 lead byte — copy the whole
                    // sequence verbatim and let the final validation
                    // pass confirm it's well-formed.
                    let len = utf8_seq_len(b)?;
                    bytes.push(b);
                    for _ in 1..len {
                        let cont = self.advance().ok_or_else(|| {
                            Error::InvalidJson("truncated UTF-8 sequence in string".into())
                        })?;
                        bytes.push(cont);
                    }
                }
            }
        }
        String::from_utf8(bytes).map_err(|e| Error::InvalidUtf8(e.to_string()))
    }

    fn enter_nesting(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_JSON_DEPTH {
            return Err(Error::NestingTooDeep { max: MAX_JSON_DEPTH });
        }
        Ok(())
    }

    fn parse_array(&mut self) -> Result<JsonValue> {
        self.enter_nesting()?;
        self.expect(b'[')?;
        let mut items = Vec::new();
        self.skip_ws();
        if self.peek() == Some(b']') {
            self.pos += 1;
            self.depth -= 1;
            return Ok(JsonValue::Array(items));
        }
        loop {
            self.skip_ws();
            items.push(self.parse_value()?);
            self.skip_ws();
            match self.advance() {
                Some(b',') => continue,
                Some(b']') => break,
                Some(other) => {
                    return Err(Error::InvalidJson(format!(
                        "expected ',' or ']' in array, found {:?}",
                        other as char
                    )))
                }
                None => return Err(Error::InvalidJson("unterminated array".into())),
            }
        }
        self.depth -= 1;
        Ok(JsonValue::Array(items))
    }

    fn parse_object(&mut self) -> Result<JsonValue> {
        self.enter_nesting()?;
        self.expect(b'{')?;
        let mut entries = Vec::new();
        self.skip_ws();
        if self.peek() == Some(b'}') {
            self.pos += 1;
            self.depth -= 1;
            return Ok(JsonValue::Object(entries));
        }
        loop {
            self.skip_ws();
            if self.peek() != Some(b'"') {
                return Err(Error::InvalidJson("expected string key in object".into()));
            }
            let key = self.parse_string()?;
            self.skip_ws();
            self.expect(b':')?;
            self.skip_ws();
            let value = self.parse_value()?;
            entries.push((key, value));
            self.skip_ws();
            match self.advance() {
                Some(b',') => continue,
                Some(b'}') => break,
                Some(other) => {
                    return Err(Error::InvalidJson(format!(
                        "expected ',' or '}}' in object, found {:?}",
                        other as char
                    )))
                }
                None => return Err(Error::InvalidJson("unterminated object".into())),
            }
        }
        self.depth -= 1;
        Ok(JsonValue::Object(entries))
    }
}

fn utf8_seq_len(lead: u8) -> Result<usize> {
    match lead {
        0xC0..=0xDF => Ok(2),
        0xE0..=0xEF => Ok(3),
        0xF0..=0xF7 => Ok(4),
        _ => Err(Error::InvalidUtf8(format!("invalid UTF-8 lead byte 0x{lead:02X}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_literals() {
        assert_eq!(parse(b"null").unwrap(), JsonValue::Null);
        assert_eq!(parse(b"true").unwrap(), JsonValue::Bool(true));
        assert_eq!(parse(b"false").unwrap(), JsonValue::Bool(false));
    }

    #[test]
    fn parses_nested_object() {
        let v = parse(br#"{"i":"q1","c":2,"r":0}"#).unwrap();
        assert_eq!(v.get("i").unwrap().as_str(), Some("q1"));
        assert_eq!(v.get("c").unwrap().as_f32(), Some(2.0));
        assert_eq!(v.get("r").unwrap().as_f32(), Some(0.0));
    }

    #[test]
    fn parses_array_of_objects() {
        let v = parse(br#"[{"n":"Reader 1","a":"3B00"},{"n":"Reader 2","a":""}]"#).unwrap();
        let items = v.as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].get("n").unwrap().as_str(), Some("Reader 1"));
    }

    #[test]
    fn rejects_trailing_garbage() {
        assert!(parse(b"{}garbage").is_err());
    }

    #[test]
    fn rejects_leading_comma() {
        assert!(parse(b"[,1]").is_err());
    }

    #[test]
    fn rejects_trailing_comma() {
        assert!(parse(b"[1,]").is_err());
    }

    #[test]
    fn rejects_missing_comma() {
        assert!(parse(b"[1 2]").is_err());
    }

    #[test]
    fn rejects_control_byte_in_string() {
        assert!(parse(b"\"a\nb\"").is_err());
    }

    #[test]
    fn accepts_escaped_newline() {
        let v = parse(b"\"a\\nb\"").unwrap();
        assert_eq!(v.as_str(), Some("a\nb"));
    }

    #[test]
    fn rejects_unknown_escape() {
        assert!(parse(br#""\q""#).is_err());
    }

    #[test]
    fn rejects_nesting_past_limit() {
        let deep = "[".repeat(MAX_JSON_DEPTH + 1) + &"]".repeat(MAX_JSON_DEPTH + 1);
        assert!(parse(deep.as_bytes()).is_err());
    }

    #[test]
    fn duplicate_keys_keep_first() {
        let v = parse(br#"{"a":1,"a":2}"#).unwrap();
        assert_eq!(v.get("a").unwrap().as_f32(), Some(1.0));
    }

    #[test]
    fn round_trips_multibyte_utf8() {
        let v = parse("\"caf\u{e9}\"".as_bytes()).unwrap();
        assert_eq!(v.as_str(), Some("caf\u{e9}"));
    }
}
