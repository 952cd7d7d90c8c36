//! The page specification language.
//!
//! A specification string is an optional `modulo:` prefix followed by specs
//! separated by `,` (new sheet) or `+` (same sheet):
//!
//! ```text
//! pagespecs = [ modulo ":" ] specs
//! specs     = spec ( ( "+" | "," ) spec )*
//! spec      = [ "-" ] [ pageno ] turns? ( "@" scale )? ( "(" xoff "," yoff ")" )?
//! turns     = ( "L" | "R" | "U" | "H" | "V" )+
//! ```
//!
//! Page numbers address positions inside each block of `modulo` consecutive
//! input pages; a leading `-` counts blocks from the end of the document.

use crate::dimen;
use crate::types::{Dims, ImposeError, Result};

/// One region of one input page placed on an output sheet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSpec {
    /// Page index within a block, `0 <= pageno < modulo`.
    pub pageno: usize,
    /// Count blocks from the end of the document.
    pub reversed: bool,
    /// Merge the following spec onto the same output sheet.
    pub add_next: bool,
    /// Accumulated rotation, canonicalised to 0, 90, 180 or 270 degrees.
    pub rotate: Option<i32>,
    pub hflip: bool,
    pub vflip: bool,
    pub scale: Option<f64>,
    pub xoff: f64,
    pub yoff: f64,
    /// Whether an `(x,y)` offset was given.
    pub offset: bool,
}

impl Default for PageSpec {
    fn default() -> Self {
        Self {
            pageno: 0,
            reversed: false,
            add_next: false,
            rotate: None,
            hflip: false,
            vflip: false,
            scale: None,
            xoff: 0.0,
            yoff: 0.0,
            offset: false,
        }
    }
}

impl PageSpec {
    /// Whether placing this page needs any coordinate transformation.
    pub fn has_transform(&self) -> bool {
        self.rotate.is_some() || self.hflip || self.vflip || self.scale.is_some() || self.offset
    }

    fn turn(&mut self, degrees: i32) {
        let rotated = self.rotate.unwrap_or(0) + degrees;
        self.rotate = Some(rotated.rem_euclid(360));
    }
}

/// Number of output sheets produced per block of `modulo` input pages:
/// the comma-separated groups of the specification.
pub fn group_count(specs: &[PageSpec]) -> usize {
    specs.iter().filter(|s| !s.add_next).count().max(1)
}

/// A parsed specification string.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSpecs {
    pub modulo: usize,
    pub specs: Vec<PageSpec>,
}

/// Parse a page specification string. `sheet` supplies the output sheet size
/// for `w`/`h` dimension suffixes in offsets.
pub fn parse_specs(text: &str, sheet: Option<Dims>) -> Result<ParsedSpecs> {
    let err = |msg: String| ImposeError::Spec(msg);

    let mut modulo = 1usize;
    let mut seen_modulo = false;
    let mut specs = vec![PageSpec::default()];
    let mut num: Option<usize> = None;
    let mut s = text;

    while !s.is_empty() {
        if s.as_bytes()[0].is_ascii_digit() {
            num = Some(dimen::parse_uint(&mut s)?);
            continue;
        }
        let c = s.chars().next().unwrap();
        s = &s[c.len_utf8()..];
        let tail = specs.last_mut().unwrap();
        match c {
            ':' => {
                if seen_modulo || specs.len() > 1 {
                    return Err(err(format!("misplaced ':' in `{text}`")));
                }
                match num.take() {
                    Some(m) if m >= 1 => modulo = m,
                    _ => return Err(err("modulo must be at least 1".into())),
                }
                seen_modulo = true;
            }
            '-' => tail.reversed = !tail.reversed,
            '@' => {
                let factor = dimen::parse_double(&mut s)?;
                if factor <= 0.0 {
                    return Err(err(format!("scale must be positive, got {factor}")));
                }
                tail.scale = Some(tail.scale.unwrap_or(1.0) * factor);
            }
            'l' | 'L' => tail.turn(90),
            'r' | 'R' => tail.turn(-90),
            'u' | 'U' => tail.turn(180),
            'h' | 'H' => tail.hflip = !tail.hflip,
            'v' | 'V' => tail.vflip = !tail.vflip,
            '(' => {
                tail.xoff += dimen::parse_dimen(&mut s, sheet)?;
                s = s
                    .strip_prefix(',')
                    .ok_or_else(|| err(format!("expected ',' in offset in `{text}`")))?;
                tail.yoff += dimen::parse_dimen(&mut s, sheet)?;
                s = s
                    .strip_prefix(')')
                    .ok_or_else(|| err(format!("expected ')' in offset in `{text}`")))?;
                tail.offset = true;
            }
            '+' | ',' => {
                tail.add_next = c == '+';
                tail.pageno = match num.take() {
                    Some(n) if n < modulo => n,
                    Some(n) => {
                        return Err(err(format!("page number {n} out of range for modulo {modulo}")))
                    }
                    None => return Err(err(format!("page number missing before '{c}'"))),
                };
                specs.push(PageSpec::default());
            }
            _ => return Err(err(format!("unexpected character '{c}' in `{text}`"))),
        }
    }

    match num {
        Some(n) if n < modulo => specs.last_mut().unwrap().pageno = n,
        Some(n) => {
            return Err(err(format!(
                "page number {n} out of range for modulo {modulo}"
            )))
        }
        // The page number may only be left implicit in a one-spec list.
        None if specs.len() == 1 => {}
        None => return Err(err("page number missing in final spec".into())),
    }

    Ok(ParsedSpecs { modulo, specs })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_single_page_zero() {
        let parsed = parse_specs("0", None).unwrap();
        assert_eq!(parsed.modulo, 1);
        assert_eq!(parsed.specs, vec![PageSpec::default()]);
    }

    #[test]
    fn implicit_pageno_allowed_for_single_spec() {
        let parsed = parse_specs("L", None).unwrap();
        assert_eq!(parsed.specs.len(), 1);
        assert_eq!(parsed.specs[0].pageno, 0);
        assert_eq!(parsed.specs[0].rotate, Some(90));
        assert!(parse_specs("0,U", None).is_err());
    }

    #[test]
    fn two_up_specification() {
        let parsed = parse_specs("2:0L@.7(21cm,0)+1L@.7(21cm,14.85cm)", None).unwrap();
        assert_eq!(parsed.modulo, 2);
        assert_eq!(parsed.specs.len(), 2);

        let first = parsed.specs[0];
        assert!(first.add_next);
        assert_eq!(first.pageno, 0);
        assert_eq!(first.rotate, Some(90));
        assert_eq!(first.scale, Some(0.7));
        assert!((first.xoff - 21.0 * dimen::POINTS_PER_CM).abs() < 1e-9);
        assert_eq!(first.yoff, 0.0);

        let second = parsed.specs[1];
        assert!(!second.add_next);
        assert_eq!(second.pageno, 1);
        assert!((second.yoff - 14.85 * dimen::POINTS_PER_CM).abs() < 1e-9);
    }

    #[test]
    fn turns_accumulate_and_cancel() {
        let parsed = parse_specs("0LL", None).unwrap();
        assert_eq!(parsed.specs[0].rotate, Some(180));
        let parsed = parse_specs("0LR", None).unwrap();
        assert_eq!(parsed.specs[0].rotate, Some(0));
        let parsed = parse_specs("0R", None).unwrap();
        assert_eq!(parsed.specs[0].rotate, Some(270));
        let parsed = parse_specs("0HH", None).unwrap();
        assert!(!parsed.specs[0].hflip);
        assert!(!parsed.specs[0].has_transform());
    }

    #[test]
    fn scales_multiply() {
        let parsed = parse_specs("0@2@0.25", None).unwrap();
        assert_eq!(parsed.specs[0].scale, Some(0.5));
    }

    #[test]
    fn reversed_spec() {
        let parsed = parse_specs("2:-0", None).unwrap();
        assert_eq!(parsed.modulo, 2);
        assert!(parsed.specs[0].reversed);
        assert_eq!(parsed.specs[0].pageno, 0);
    }

    #[test]
    fn sheet_relative_offsets() {
        let sheet = Some(Dims::new(500.0, 800.0));
        let parsed = parse_specs("0(0.5w,0.25h)", sheet).unwrap();
        assert_eq!(parsed.specs[0].xoff, 250.0);
        assert_eq!(parsed.specs[0].yoff, 200.0);
        assert!(parse_specs("0(0.5w,0)", None).is_err());
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse_specs("0:", None).is_err());
        assert!(parse_specs("x", None).is_err());
        assert!(parse_specs("2:2", None).is_err());
        assert!(parse_specs("1:0+", None).is_err());
        assert!(parse_specs("3:1:0", None).is_err());
        assert!(parse_specs("0@0", None).is_err());
    }

    #[test]
    fn group_counting() {
        let parsed = parse_specs("4:0+1,2+3", None).unwrap();
        assert_eq!(group_count(&parsed.specs), 2);
        let parsed = parse_specs("2:0+1", None).unwrap();
        assert_eq!(group_count(&parsed.specs), 1);
    }
}
