//! Dimension lexing: numeric literals with an optional unit suffix.
//!
//! All dimensions resolve to PostScript points. The `w` and `h` suffixes are
//! fractions of the current output sheet and are only valid once a sheet size
//! is known.

use crate::types::{Dims, ImposeError, Result};

pub const POINTS_PER_INCH: f64 = 72.0;
pub const POINTS_PER_CM: f64 = 28.346456692913385;
pub const POINTS_PER_MM: f64 = 2.8346456692913385;

/// Consume an unsigned decimal integer from the front of `s`.
pub(crate) fn parse_uint(s: &mut &str) -> Result<usize> {
    let end = s
        .as_bytes()
        .iter()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(s.len());
    if end == 0 {
        return Err(ImposeError::Dimension(format!("expected a number at `{s}`")));
    }
    let (digits, rest) = s.split_at(end);
    let num = digits
        .parse()
        .map_err(|_| ImposeError::Dimension(format!("number out of range at `{digits}`")))?;
    *s = rest;
    Ok(num)
}

/// Consume a signed real number from the front of `s`.
pub(crate) fn parse_double(s: &mut &str) -> Result<f64> {
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let int_digits = count_digits(&bytes[end..]);
    end += int_digits;
    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = count_digits(&bytes[end + 1..]);
        end += 1 + frac_digits;
    }
    if int_digits + frac_digits == 0 {
        return Err(ImposeError::Dimension(format!("expected a number at `{s}`")));
    }
    let (num, rest) = s.split_at(end);
    let value = num
        .parse()
        .map_err(|_| ImposeError::Dimension(format!("number out of range at `{num}`")))?;
    *s = rest;
    Ok(value)
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes
        .iter()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(bytes.len())
}

/// Consume a dimension from the front of `s`: a real number with an optional
/// `pt`, `in`, `cm`, `mm`, `w`, or `h` suffix. A bare number is in points.
pub(crate) fn parse_dimen(s: &mut &str, sheet: Option<Dims>) -> Result<f64> {
    let mut num = parse_double(s)?;
    if let Some(rest) = s.strip_prefix("pt") {
        *s = rest;
    } else if let Some(rest) = s.strip_prefix("in") {
        num *= POINTS_PER_INCH;
        *s = rest;
    } else if let Some(rest) = s.strip_prefix("cm") {
        num *= POINTS_PER_CM;
        *s = rest;
    } else if let Some(rest) = s.strip_prefix("mm") {
        num *= POINTS_PER_MM;
        *s = rest;
    } else if let Some(rest) = s.strip_prefix('w') {
        num *= sheet.ok_or(ImposeError::Unset("width"))?.width;
        *s = rest;
    } else if let Some(rest) = s.strip_prefix('h') {
        num *= sheet.ok_or(ImposeError::Unset("height"))?.height;
        *s = rest;
    }
    Ok(num)
}

/// Parse a string that must be exactly one dimension.
pub fn single_dimen(s: &str, sheet: Option<Dims>) -> Result<f64> {
    let mut rest = s;
    let num = parse_dimen(&mut rest, sheet)?;
    if !rest.is_empty() {
        return Err(ImposeError::Dimension(format!(
            "trailing junk `{rest}` in `{s}`"
        )));
    }
    Ok(num)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_number_is_points() {
        assert_eq!(single_dimen("12", None).unwrap(), 12.0);
        assert_eq!(single_dimen("-3.5pt", None).unwrap(), -3.5);
    }

    #[test]
    fn unit_conversions() {
        assert_eq!(single_dimen("1in", None).unwrap(), 72.0);
        assert!((single_dimen("2.54cm", None).unwrap() - 72.0).abs() < 1e-9);
        assert!((single_dimen("25.4mm", None).unwrap() - 72.0).abs() < 1e-9);
    }

    #[test]
    fn sheet_relative_units() {
        let a4 = Dims::new(595.0, 842.0);
        assert_eq!(single_dimen("1w", Some(a4)).unwrap(), 595.0);
        assert_eq!(single_dimen("0.5h", Some(a4)).unwrap(), 421.0);
        assert!(matches!(
            single_dimen("1w", None),
            Err(ImposeError::Unset("width"))
        ));
    }

    #[test]
    fn rejects_garbage() {
        assert!(single_dimen("abc", None).is_err());
        assert!(single_dimen("1inch", None).is_err());
        assert!(single_dimen("", None).is_err());
    }

    #[test]
    fn uint_stops_at_first_nondigit() {
        let mut s = "42:rest";
        assert_eq!(parse_uint(&mut s).unwrap(), 42);
        assert_eq!(s, ":rest");
    }
}
