//! Page selection: turning `-R`/`-e`/`-o`/`-r` options into the ordered list
//! of input pages the engine draws from.
//!
//! Range syntax is a comma-separated list of `N`, `N-M`, `N-` (to the last
//! page) and `-M` (from the first page); `_N` counts from the end of the
//! document, and a bare `_` inserts a blank page.

use crate::types::{ImposeError, Result};

/// One page range, still unresolved: negative numbers count from the end of
/// the document, and `0-0` marks an inserted blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub first: i64,
    pub last: i64,
}

/// Which pages to feed to the engine, in which order.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub ranges: Vec<PageRange>,
    pub odd: bool,
    pub even: bool,
    pub reverse: bool,
}

/// Parse a `-R` argument into a list of ranges.
pub fn parse_ranges(text: &str) -> Result<Vec<PageRange>> {
    let mut ranges = Vec::new();
    for part in text.split(',') {
        if part == "_" {
            ranges.push(PageRange { first: 0, last: 0 });
            continue;
        }
        let (first_text, last_text) = match part.split_once('-') {
            Some((f, l)) => (f, Some(l)),
            None => (part, None),
        };
        let first = parse_bound(first_text)?.unwrap_or(1);
        let last = match last_text {
            // "N" selects the single page N.
            None => match parse_bound(first_text)? {
                Some(n) => n,
                None => return Err(ImposeError::Range(part.to_string())),
            },
            // "N-" runs to the last page.
            Some(l) => parse_bound(l)?.unwrap_or(-1),
        };
        ranges.push(PageRange { first, last });
    }
    Ok(ranges)
}

/// Parse one range bound: digits, optionally prefixed with `_` for
/// end-relative counting. Empty input is `None`.
fn parse_bound(text: &str) -> Result<Option<i64>> {
    if text.is_empty() {
        return Ok(None);
    }
    let (negate, digits) = match text.strip_prefix('_') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ImposeError::Range(text.to_string()));
    }
    let n: i64 = digits
        .parse()
        .map_err(|_| ImposeError::Range(text.to_string()))?;
    Ok(Some(if negate { -n } else { n }))
}

/// Resolve an end-relative page number against the document length.
fn absolute_page(n: i64, pages: usize) -> i64 {
    if n < 0 {
        (n + pages as i64 + 1).max(1)
    } else {
        n
    }
}

/// Flatten a selection into the ordered page list: `Some(index)` for an
/// input page, `None` for an inserted blank.
pub fn select_pages(selection: &Selection, pages: usize) -> Result<Vec<Option<usize>>> {
    let ranges = if selection.ranges.is_empty() {
        vec![PageRange { first: 1, last: -1 }]
    } else {
        selection.ranges.clone()
    };

    let mut list = Vec::new();
    for range in &ranges {
        let first = absolute_page(range.first, pages);
        let last = absolute_page(range.last, pages);
        let step = if last < first { -1 } else { 1 };
        let mut current = first;
        loop {
            if current > pages as i64 {
                return Err(ImposeError::Range(format!(
                    "page {current} is beyond the last page ({pages})"
                )));
            }
            let skipped = (selection.odd && !selection.even && current % 2 == 0)
                || (selection.even && !selection.odd && current % 2 == 1);
            if !skipped {
                if current == 0 {
                    list.push(None);
                } else {
                    list.push(Some(current as usize - 1));
                }
            }
            if current == last {
                break;
            }
            current += step;
        }
    }
    if selection.reverse {
        list.reverse();
    }
    Ok(list)
}

/// The identity selection: every page in document order.
pub fn all_pages(pages: usize) -> Vec<Option<usize>> {
    (0..pages).map(Some).collect()
}
