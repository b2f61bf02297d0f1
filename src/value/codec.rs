//! Literal decoding and canonical encoding.

use std::collections::BTreeMap;

use super::{Array, Scope, Value};
use crate::error::BasicError;

pub fn decode_integer(text: &str) -> Result<i64, BasicError> {
    let mut decoded: i64 = 0;
    for c in text.chars() {
        let digit = c.to_digit(10).ok_or(BasicError::InvalidDecimal(c))?;
        decoded = decoded.wrapping_mul(10).wrapping_add(digit as i64);
    }
    Ok(decoded)
}

/// Decodes hex digits, with or without a leading `0x`.
pub fn decode_hex(text: &str) -> Result<i64, BasicError> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    decode_hex_digits(digits)
}

/// Bare hex digits, wrapping on overflow. No `0x` prefix is accepted.
fn decode_hex_digits(digits: &str) -> Result<i64, BasicError> {
    let mut decoded: i64 = 0;
    for c in digits.chars() {
        let digit = c.to_digit(16).ok_or(BasicError::InvalidHex(c))?;
        decoded = decoded.wrapping_mul(16).wrapping_add(digit as i64);
    }
    Ok(decoded)
}

pub fn encode_integer(v: i64) -> String {
    v.to_string()
}

pub fn decode_double(text: &str) -> Result<f64, BasicError> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| BasicError::InvalidDouble(text.to_string()))
}

/// Shortest round-trip form, always with a fractional part.
pub fn encode_double(v: f64) -> String {
    if v.is_nan() {
        return "NaN".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "Inf" } else { "-Inf" }.to_string();
    }
    let mut text = v.to_string();
    if !text.contains('.') {
        text.push_str(".0");
    }
    text
}

/// Decodes a string literal. One pair of surrounding quotes is stripped if
/// present; escape positions are reported relative to the unquoted text.
pub fn decode_string(encoded: &str) -> Result<String, BasicError> {
    let inner = match encoded.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        Some(inner) if encoded.len() >= 2 => inner,
        _ => encoded,
    };
    let bytes = inner.as_bytes();
    let mut decoded = String::with_capacity(inner.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'\\' {
            let start = i;
            while i < bytes.len() && bytes[i] != b'\\' {
                i += 1;
            }
            decoded.push_str(&inner[start..i]);
            continue;
        }

        match bytes.get(i + 1) {
            Some(b'\\') => {
                decoded.push('\\');
                i += 2;
            }
            Some(b'"') => {
                decoded.push('"');
                i += 2;
            }
            Some(b't') => {
                decoded.push('\t');
                i += 2;
            }
            Some(b'r') => {
                decoded.push('\r');
                i += 2;
            }
            Some(b'n') => {
                decoded.push('\n');
                i += 2;
            }
            Some(b'\r') if bytes.get(i + 2) == Some(&b'\n') => i += 3,
            Some(b'\r') | Some(b'\n') => i += 2,
            Some(b'x') => i = push_code_point(&mut decoded, inner, i, 2)?,
            Some(b'u') => i = push_code_point(&mut decoded, inner, i, 4)?,
            Some(b'U') => i = push_code_point(&mut decoded, inner, i, 8)?,
            _ => return Err(BasicError::InvalidEscape(i)),
        }
    }

    Ok(decoded)
}

/// Appends the code point spelled by the `width` hex digits after the
/// escape at `at`, returning the index past them.
fn push_code_point(out: &mut String, text: &str, at: usize, width: usize) -> Result<usize, BasicError> {
    let end = at + 2 + width;
    let digits = text.get(at + 2..end).ok_or(BasicError::InvalidEscape(at))?;
    let code = decode_hex_digits(digits)? as u32;
    let ch = char::from_u32(code).ok_or(BasicError::InvalidCodePoint(code))?;
    out.push(ch);
    Ok(end)
}

pub fn encode_string(decoded: &str) -> String {
    let mut encoded = String::with_capacity(decoded.len() + 2);
    encoded.push('"');
    for c in decoded.chars() {
        match c {
            '\\' => encoded.push_str("\\\\"),
            '"' => encoded.push_str("\\\""),
            '\r' => encoded.push_str("\\r"),
            '\n' => encoded.push_str("\\n"),
            '\t' => encoded.push_str("\\t"),
            c => encoded.push(c),
        }
    }
    encoded.push('"');
    encoded
}

pub fn encode_array(array: &Array) -> Result<String, BasicError> {
    let mut encoded = String::from("[");
    for (i, item) in array.snapshot().iter().enumerate() {
        if i > 0 {
            encoded.push(',');
        }
        for line in item.encoded()?.split('\n') {
            encoded.push_str("\n  ");
            encoded.push_str(line);
        }
    }
    encoded.push_str("\n]");
    Ok(encoded)
}

/// Encodes a map, optionally preceded by a `__PARENT__` entry. `GLOBAL`
/// and `UPSCOPE` are written as placeholders since they point back up the
/// scope chain.
pub fn encode_object(entries: &BTreeMap<String, Value>, parent: Option<&Scope>) -> Result<String, BasicError> {
    let mut encoded = String::from("{");
    let mut first = true;

    if let Some(parent) = parent {
        encoded.push_str("\n  __PARENT__ : ");
        push_nested(&mut encoded, &encode_scope(parent)?);
        first = false;
    }

    for (key, value) in entries {
        if !first {
            encoded.push(',');
        }
        first = false;
        encoded.push_str("\n  ");
        encoded.push_str(key);
        encoded.push_str(" : ");
        if key == "GLOBAL" || key == "UPSCOPE" {
            encoded.push('<');
            encoded.push_str(key);
            encoded.push('>');
        } else {
            push_nested(&mut encoded, &value.encoded()?);
        }
    }

    encoded.push_str("\n}");
    Ok(encoded)
}

pub fn encode_scope(scope: &Scope) -> Result<String, BasicError> {
    let entries: BTreeMap<String, Value> = scope.local_entries().into_iter().collect();
    encode_object(&entries, scope.parent().as_ref())
}

fn push_nested(out: &mut String, child: &str) {
    for (j, line) in child.split('\n').enumerate() {
        if j > 0 {
            out.push_str("\n  ");
        }
        out.push_str(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn integer_decode() {
        assert_eq!(decode_integer("0").unwrap(), 0);
        assert_eq!(decode_integer("1234").unwrap(), 1234);
        assert_eq!(decode_integer("9223372036854775808").unwrap(), i64::MIN);
        assert_eq!(decode_integer("12a").unwrap_err().to_string(), "Invalid decimal character: a");
    }

    #[test]
    fn hex_decode() {
        assert_eq!(decode_hex("0xff").unwrap(), 255);
        assert_eq!(decode_hex("0XFF").unwrap(), 255);
        assert_eq!(decode_hex("7f").unwrap(), 127);
        assert_eq!(decode_hex("0xffffffffffffffff").unwrap(), -1);
        assert_eq!(decode_hex("0x1g").unwrap_err().to_string(), "Invalid hexadecimal character: g");
    }

    #[test]
    fn double_encode() {
        assert_eq!(encode_double(3.0), "3.0");
        assert_eq!(encode_double(0.1), "0.1");
        assert_eq!(encode_double(2.5), "2.5");
        assert_eq!(encode_double(-7.0), "-7.0");
        assert_eq!(encode_double(f64::INFINITY), "Inf");
        assert_eq!(encode_double(f64::NEG_INFINITY), "-Inf");
        assert_eq!(encode_double(f64::NAN), "NaN");
    }

    #[test]
    fn double_round_trip() {
        for v in [0.1, 1.0 / 3.0, 1e-7, 123456.789, -2.5e10] {
            assert_eq!(decode_double(&encode_double(v)).unwrap(), v);
        }
        assert!(decode_double("x1").is_err());
    }

    #[test]
    fn string_escapes() {
        assert_eq!(decode_string(r#""a\tb\nc""#).unwrap(), "a\tb\nc");
        assert_eq!(decode_string(r#""q\"q\\""#).unwrap(), "q\"q\\");
        assert_eq!(decode_string(r#""\x41é\U0001F600""#).unwrap(), "Aé😀");
    }

    #[test]
    fn string_line_continuation() {
        assert_eq!(decode_string("\"a\\\nb\"").unwrap(), "ab");
        assert_eq!(decode_string("\"a\\\r\nb\"").unwrap(), "ab");
        assert_eq!(decode_string("\"a\\\rb\"").unwrap(), "ab");
    }

    #[test]
    fn string_bad_escapes() {
        assert_eq!(
            decode_string(r#""ab\q""#).unwrap_err().to_string(),
            "Invalid backslash sequence in string at position 2"
        );
        assert_eq!(decode_string(r#""\x4""#).unwrap_err(), BasicError::InvalidEscape(0));
        assert_eq!(decode_string(r#""\x4z""#).unwrap_err(), BasicError::InvalidHex('z'));
        assert_eq!(decode_string(r#""\u0x41""#).unwrap_err(), BasicError::InvalidHex('x'));
        assert_eq!(decode_string(r#""\x0X""#).unwrap_err(), BasicError::InvalidHex('X'));
        assert_eq!(decode_string(r#""\uD800""#).unwrap_err(), BasicError::InvalidCodePoint(0xD800));
        assert_eq!(decode_string("\"trailing\\\"").unwrap_err(), BasicError::InvalidEscape(8));
    }

    #[test]
    fn string_without_quotes() {
        assert_eq!(decode_string("plain").unwrap(), "plain");
        assert_eq!(decode_string("\"").unwrap(), "\"");
    }

    #[test]
    fn string_round_trip() {
        for s in ["", "plain", "tab\there", "quote\"back\\slash", "multi\nline\r\n", "ünïcödé"] {
            assert_eq!(decode_string(&encode_string(s)).unwrap(), s);
        }
    }

    #[test]
    fn array_layout() {
        let empty = Array::default();
        assert_eq!(encode_array(&empty).unwrap(), "[\n]");

        let nested = Array::new(vec![
            Value::from(1),
            Value::array([Value::from("x"), Value::from(2.0)]),
        ]);
        assert_eq!(
            encode_array(&nested).unwrap(),
            "[\n  1,\n  [\n    \"x\",\n    2.0\n  ]\n]"
        );
    }

    #[test]
    fn object_layout() {
        let mut entries = BTreeMap::new();
        entries.insert("b".to_string(), Value::array([Value::from(1)]));
        entries.insert("a".to_string(), Value::from("s"));
        assert_eq!(
            encode_object(&entries, None).unwrap(),
            "{\n  a : \"s\",\n  b : [\n    1\n  ]\n}"
        );
        assert_eq!(encode_object(&BTreeMap::new(), None).unwrap(), "{\n}");
    }

    #[test]
    fn scope_layout_hides_back_links() {
        let root = Scope::empty();
        root.set("x", Value::from(1));
        let child = Scope::with_parent(&root);
        child.set("y", Value::from(2));
        assert_eq!(
            encode_scope(&child).unwrap(),
            "{\n  __PARENT__ : {\n    x : 1\n  },\n  GLOBAL : <GLOBAL>,\n  UPSCOPE : <UPSCOPE>,\n  y : 2\n}"
        );
    }
}
