//! N-up layout: choosing a grid and scale for placing N input pages on one
//! output sheet, then driving the rearrangement engine with an equivalent
//! specification.
//!
//! Finding the best layout is an optimisation problem: every divisor pair
//! `hor * ver == n` is tried in both normal and rotated orientation, scoring
//! each candidate by its squared wasted area.

use std::io::{Read, Seek, Write};

use crate::engine::{rearrange, RearrangeOptions, RearrangeStats};
use crate::dsc::DocumentIndex;
use crate::select;
use crate::spec::PageSpec;
use crate::types::{Dims, ImposeError, Result};

/// Options for an N-up run.
#[derive(Debug, Clone)]
pub struct NupOptions {
    /// Pages per output sheet.
    pub nup: usize,
    /// Output sheet size.
    pub paper: Dims,
    /// Input page size, when it differs from the output sheet.
    pub input_paper: Option<Dims>,
    /// Margin around the whole sheet.
    pub margin: f64,
    /// Border inside each grid cell.
    pub border: f64,
    /// Fill cells column-major instead of row-major.
    pub column: bool,
    /// Fill columns left-to-right.
    pub leftright: bool,
    /// Fill rows top-to-bottom.
    pub topbottom: bool,
    /// Exchange the output sheet's axes.
    pub flip: bool,
    /// Override the computed page scale.
    pub scale: Option<f64>,
    /// Largest acceptable wasted-area score.
    pub tolerance: f64,
    /// Border line width around each placed page; 0 draws nothing.
    pub draw: f64,
}

impl NupOptions {
    pub fn new(nup: usize, paper: Dims) -> Self {
        Self {
            nup,
            paper,
            input_paper: None,
            margin: 0.0,
            border: 0.0,
            column: false,
            leftright: true,
            topbottom: true,
            flip: false,
            scale: None,
            tolerance: 100_000.0,
            draw: 0.0,
        }
    }
}

/// A chosen grid: cell counts, orientation, page scale, and the shifts that
/// centre each page inside its cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    pub horiz: usize,
    pub vert: usize,
    /// Pages are placed rotated 90 degrees.
    pub rotated: bool,
    pub scale: f64,
    pub hshift: f64,
    pub vshift: f64,
}

/// The next divisor of `m` above `n`, or `None` when `n` is the largest.
fn next_divisor(n: usize, m: usize) -> Option<usize> {
    (n + 1..=m).find(|candidate| m % candidate == 0)
}

/// Search the grid and orientation space for the layout wasting the least
/// area, failing if nothing beats the tolerance ceiling.
pub fn pick_layout(options: &NupOptions) -> Result<GridLayout> {
    let printable_width = options.paper.width - 2.0 * options.margin;
    let printable_height = options.paper.height - 2.0 * options.margin;
    if printable_width <= 0.0 || printable_height <= 0.0 {
        return Err(ImposeError::MarginsTooLarge);
    }
    let input = options.input_paper.unwrap_or(options.paper);
    let border = options.border;

    let mut best_score = options.tolerance;
    let mut best: Option<GridLayout> = None;
    let mut hor = 1;
    loop {
        let ver = options.nup / hor;
        let horf = hor as f64;
        let verf = ver as f64;

        // Normal orientation.
        let fit = (printable_height / (input.height * verf))
            .min(printable_width / (input.width * horf));
        let score = (printable_width - fit * input.width * horf).powi(2)
            + (printable_height - fit * input.height * verf).powi(2);
        if score < best_score {
            best_score = score;
            let scale = ((printable_height - 2.0 * border * verf) / (input.height * verf))
                .min((printable_width - 2.0 * border * horf) / (input.width * horf));
            best = Some(GridLayout {
                horiz: hor,
                vert: ver,
                rotated: options.flip,
                scale,
                hshift: (printable_width / horf - input.width * scale) / 2.0,
                vshift: (printable_height / verf - input.height * scale) / 2.0,
            });
        }

        // Rotated orientation.
        let fit = (printable_height / (input.width * horf))
            .min(printable_width / (input.height * verf));
        let score = (printable_height - fit * input.width * horf).powi(2)
            + (printable_width - fit * input.height * verf).powi(2);
        if score < best_score {
            best_score = score;
            let scale = ((printable_height - 2.0 * border * horf) / (input.width * horf))
                .min((printable_width - 2.0 * border * verf) / (input.height * verf));
            best = Some(GridLayout {
                horiz: ver,
                vert: hor,
                rotated: !options.flip,
                scale,
                hshift: (printable_width / verf - input.height * scale) / 2.0,
                vshift: (printable_height / horf - input.width * scale) / 2.0,
            });
        }

        match next_divisor(hor, options.nup) {
            Some(next) => hor = next,
            None => break,
        }
    }

    best.ok_or(ImposeError::Layout(options.nup))
}

/// Synthesise the specification placing pages 0..n into the grid cells,
/// all merged onto one output sheet.
pub fn build_specs(layout: &GridLayout, options: &NupOptions) -> Vec<PageSpec> {
    let printable_width = options.paper.width - 2.0 * options.margin;
    let printable_height = options.paper.height - 2.0 * options.margin;

    // Rotating the grid also rotates the traversal order.
    let mut column = options.column;
    let mut leftright = options.leftright;
    let mut topbottom = options.topbottom;
    if layout.rotated {
        let previous_topbottom = topbottom;
        topbottom = !leftright;
        leftright = previous_topbottom;
        column = !column;
    }

    let (horiz, vert) = (layout.horiz, layout.vert);
    let scale = options.scale.unwrap_or(layout.scale);

    let mut specs = Vec::with_capacity(options.nup);
    for page in 0..options.nup {
        let (across, up) = if column {
            (
                if leftright { page / vert } else { horiz - 1 - page / vert },
                if topbottom { vert - 1 - page % vert } else { page % vert },
            )
        } else {
            (
                if leftright { page % horiz } else { horiz - 1 - page % horiz },
                if topbottom { vert - 1 - page / horiz } else { page / horiz },
            )
        };

        let mut ps = PageSpec {
            pageno: page,
            scale: Some(scale),
            offset: true,
            add_next: page + 1 < options.nup,
            ..PageSpec::default()
        };
        if layout.rotated {
            ps.xoff = options.margin + (across + 1) as f64 * printable_width / horiz as f64
                - layout.hshift;
            ps.rotate = Some(90);
        } else {
            ps.xoff =
                options.margin + across as f64 * printable_width / horiz as f64 + layout.hshift;
        }
        ps.yoff = options.margin + up as f64 * printable_height / vert as f64 + layout.vshift;
        specs.push(ps);
    }
    specs
}

/// Lay out and rearrange a scanned document N-up.
pub fn nup<R: Read + Seek, W: Write>(
    input: &mut R,
    index: &DocumentIndex,
    options: &NupOptions,
    out: W,
) -> Result<RearrangeStats> {
    let layout = pick_layout(options)?;
    let specs = build_specs(&layout, options);

    // Flipping exchanges the sheet's axes for the header media lines and the
    // per-page clip alike.
    let paper = if options.flip {
        options.paper.rotated()
    } else {
        options.paper
    };
    let engine_options = RearrangeOptions {
        modulo: options.nup,
        nobind: false,
        draw: options.draw,
        paper: Some(paper),
        page_size: None,
    };
    let page_list = select::all_pages(index.pages());
    rearrange(input, index, &page_list, &specs, &engine_options, out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const A4: Dims = Dims::new(595.0, 842.0);

    #[test]
    fn divisor_walk() {
        assert_eq!(next_divisor(1, 12), Some(2));
        assert_eq!(next_divisor(2, 12), Some(3));
        assert_eq!(next_divisor(6, 12), Some(12));
        assert_eq!(next_divisor(12, 12), None);
        assert_eq!(next_divisor(1, 7), Some(7));
    }

    #[test]
    fn two_up_rotates() {
        let layout = pick_layout(&NupOptions::new(2, A4)).unwrap();
        assert!(layout.rotated);
        assert_eq!((layout.horiz, layout.vert), (1, 2));
        assert!((layout.scale - 595.0 / 842.0).abs() < 1e-9);
    }

    #[test]
    fn four_up_keeps_orientation() {
        let layout = pick_layout(&NupOptions::new(4, A4)).unwrap();
        assert!(!layout.rotated);
        assert_eq!((layout.horiz, layout.vert), (2, 2));
        assert!((layout.scale - 0.5).abs() < 1e-9);
        assert_eq!(layout.hshift, 0.0);
        assert_eq!(layout.vshift, 0.0);
    }

    #[test]
    fn three_up_picks_rotated_column() {
        let layout = pick_layout(&NupOptions::new(3, A4)).unwrap();
        assert!(layout.rotated);
        assert_eq!((layout.horiz, layout.vert), (1, 3));
    }

    #[test]
    fn one_up_with_margin_shrinks() {
        let mut options = NupOptions::new(1, A4);
        options.margin = 20.0;
        let layout = pick_layout(&options).unwrap();
        assert!(!layout.rotated);
        assert_eq!((layout.horiz, layout.vert), (1, 1));
        assert!((layout.scale - 555.0 / 595.0).abs() < 1e-9);
    }

    #[test]
    fn impossible_layout_is_rejected() {
        let mut options = NupOptions::new(1, A4);
        options.tolerance = 0.0;
        assert!(matches!(
            pick_layout(&options),
            Err(ImposeError::Layout(1))
        ));

        let mut options = NupOptions::new(1, A4);
        options.margin = 400.0;
        assert!(matches!(
            pick_layout(&options),
            Err(ImposeError::MarginsTooLarge)
        ));
    }

    #[test]
    fn four_up_spec_order_is_top_row_first() {
        let options = NupOptions::new(4, A4);
        let layout = pick_layout(&options).unwrap();
        let specs = build_specs(&layout, &options);
        assert_eq!(specs.len(), 4);
        assert!(specs[0].add_next && specs[1].add_next && specs[2].add_next);
        assert!(!specs[3].add_next);

        // Page 0 top-left, page 1 top-right, page 2 bottom-left.
        assert_eq!(specs[0].xoff, 0.0);
        assert!((specs[0].yoff - 421.0).abs() < 1e-9);
        assert!((specs[1].xoff - 297.5).abs() < 1e-9);
        assert!((specs[1].yoff - 421.0).abs() < 1e-9);
        assert_eq!(specs[2].xoff, 0.0);
        assert_eq!(specs[2].yoff, 0.0);
        for ps in &specs {
            assert_eq!(ps.scale, Some(0.5));
            assert!(ps.offset);
            assert_eq!(ps.rotate, None);
        }
    }

    #[test]
    fn user_scale_overrides_layout_scale() {
        let mut options = NupOptions::new(4, A4);
        options.scale = Some(0.4);
        let layout = pick_layout(&options).unwrap();
        let specs = build_specs(&layout, &options);
        assert!(specs.iter().all(|ps| ps.scale == Some(0.4)));
    }

    #[test]
    fn two_up_specs_rotate_and_offset() {
        let options = NupOptions::new(2, A4);
        let layout = pick_layout(&options).unwrap();
        let specs = build_specs(&layout, &options);
        assert_eq!(specs.len(), 2);
        for ps in &specs {
            assert_eq!(ps.rotate, Some(90));
        }
        // Rotated 2-up fills the bottom cell first, which reads first once
        // the sheet is turned.
        assert!(specs[0].yoff < specs[1].yoff);
    }
}
