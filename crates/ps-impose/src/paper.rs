//! Paper size registry.
//!
//! Maps paper names to sheet dimensions in PostScript points. The default
//! paper comes from the `PAPERSIZE` environment variable, falling back to A4.

use crate::types::Dims;

const PAPER_SIZES: &[(&str, Dims)] = &[
    ("a0", Dims::new(2384.0, 3370.0)),
    ("a1", Dims::new(1684.0, 2384.0)),
    ("a2", Dims::new(1191.0, 1684.0)),
    ("a3", Dims::new(842.0, 1191.0)),
    ("a4", Dims::new(595.0, 842.0)),
    ("a5", Dims::new(420.0, 595.0)),
    ("a6", Dims::new(297.0, 420.0)),
    ("b4", Dims::new(709.0, 1001.0)),
    ("b5", Dims::new(499.0, 709.0)),
    ("letter", Dims::new(612.0, 792.0)),
    ("legal", Dims::new(612.0, 1008.0)),
    ("ledger", Dims::new(1224.0, 792.0)),
    ("tabloid", Dims::new(792.0, 1224.0)),
    ("executive", Dims::new(522.0, 756.0)),
    ("statement", Dims::new(396.0, 612.0)),
    ("folio", Dims::new(612.0, 936.0)),
    ("quarto", Dims::new(610.0, 780.0)),
    ("10x14", Dims::new(720.0, 1008.0)),
];

/// Look up a paper size by name (case-insensitive).
pub fn paper_size(name: &str) -> Option<Dims> {
    PAPER_SIZES
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|&(_, dims)| dims)
}

/// The system default paper size.
pub fn default_paper() -> Dims {
    std::env::var("PAPERSIZE")
        .ok()
        .and_then(|name| paper_size(&name))
        .unwrap_or(Dims::new(595.0, 842.0))
}
