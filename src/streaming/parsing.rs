//! Zero-allocation measurement parsing.
//!
//! Values are parsed into integer tenths with fixed offsets from the end of
//! the field. Accepted shapes are `D.D`, `-D.D`, `DD.D` and `-DD.D`;
//! anything else is rejected rather than misparsed.

use crate::measurements::MalformedKind;
use memchr::memchr;

/// Convert one ASCII digit.
#[inline(always)]
fn digit(b: u8) -> Option<i16> {
    let d = b.wrapping_sub(b'0');
    if d > 9 {
        return None;
    }
    Some(d as i16)
}

/// Parse a one-decimal value field into tenths.
///
/// Returns None for any field outside the four supported shapes, including
/// three integer digits (`100.0`), two fractional digits (`1.25`), a leading
/// `+`, or a missing digit.
///
/// # Performance
///
/// No loop over digits: the last byte is the tenths digit, the one before it
/// must be `.`, and the third from last is the ones digit. The field length
/// decides whether a tens digit and/or a sign precede it.
#[inline(always)]
pub fn parse_tenths(field: &[u8]) -> Option<i16> {
    let len = field.len();
    if !(3..=5).contains(&len) || field[len - 2] != b'.' {
        return None;
    }

    let tenths = digit(field[len - 1])?;
    let ones = digit(field[len - 3])?;
    let low = ones * 10 + tenths;

    match len {
        3 => Some(low),
        4 if field[0] == b'-' => Some(-low),
        4 => Some(digit(field[0])? * 100 + low),
        _ if field[0] == b'-' => Some(-(digit(field[1])? * 100 + low)),
        _ => None,
    }
}

/// Split a line (without its terminator) into station bytes and tenths.
///
/// The station is everything before the first `;`. A station containing
/// `;` therefore surfaces as an invalid value.
#[inline(always)]
pub fn parse_record(line: &[u8]) -> Result<(&[u8], i16), MalformedKind> {
    let sep = memchr(b';', line).ok_or(MalformedKind::MissingSeparator)?;
    if sep == 0 {
        return Err(MalformedKind::EmptyKey);
    }
    let value = parse_tenths(&line[sep + 1..]).ok_or(MalformedKind::InvalidValue)?;
    Ok((&line[..sep], value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tenths_shapes() {
        assert_eq!(parse_tenths(b"0.0"), Some(0));
        assert_eq!(parse_tenths(b"5.0"), Some(50));
        assert_eq!(parse_tenths(b"-3.2"), Some(-32));
        assert_eq!(parse_tenths(b"12.3"), Some(123));
        assert_eq!(parse_tenths(b"-99.9"), Some(-999));
        assert_eq!(parse_tenths(b"99.9"), Some(999));
        assert_eq!(parse_tenths(b"-0.0"), Some(0));
        assert_eq!(parse_tenths(b"07.5"), Some(75));
    }

    #[test]
    fn test_parse_tenths_rejects_malformed() {
        assert_eq!(parse_tenths(b"100.0"), None);
        assert_eq!(parse_tenths(b"-100.0"), None);
        assert_eq!(parse_tenths(b"1.25"), None);
        assert_eq!(parse_tenths(b"1.2.3"), None);
        assert_eq!(parse_tenths(b"+1.0"), None);
        assert_eq!(parse_tenths(b"--1.0"), None);
        assert_eq!(parse_tenths(b"1."), None);
        assert_eq!(parse_tenths(b".5"), None);
        assert_eq!(parse_tenths(b"15"), None);
        assert_eq!(parse_tenths(b"150"), None);
        assert_eq!(parse_tenths(b"a.5"), None);
        assert_eq!(parse_tenths(b"1.x"), None);
        assert_eq!(parse_tenths(b"1,5"), None);
        assert_eq!(parse_tenths(b"1.0\r"), None);
        assert_eq!(parse_tenths(b""), None);
    }

    #[test]
    fn test_parse_tenths_round_trip_all_values() {
        for value in -999i16..=999 {
            let text = crate::streaming::output::Tenths(value as i64).to_string();
            assert_eq!(parse_tenths(text.as_bytes()), Some(value), "{}", text);
        }
    }

    #[test]
    fn test_parse_record() {
        assert_eq!(parse_record(b"Hamburg;12.0"), Ok((&b"Hamburg"[..], 120)));
        assert_eq!(parse_record(b"St. John's;-4.5"), Ok((&b"St. John's"[..], -45)));
        assert_eq!(
            parse_record("İzmir;17.9".as_bytes()),
            Ok(("İzmir".as_bytes(), 179))
        );
    }

    #[test]
    fn test_parse_record_errors() {
        assert_eq!(parse_record(b"Hamburg 12.0"), Err(MalformedKind::MissingSeparator));
        assert_eq!(parse_record(b""), Err(MalformedKind::MissingSeparator));
        assert_eq!(parse_record(b";12.0"), Err(MalformedKind::EmptyKey));
        assert_eq!(parse_record(b"A;"), Err(MalformedKind::InvalidValue));
        assert_eq!(parse_record(b"A;B;1.0"), Err(MalformedKind::InvalidValue));
        assert_eq!(parse_record(b"A;100.0"), Err(MalformedKind::InvalidValue));
    }
}
