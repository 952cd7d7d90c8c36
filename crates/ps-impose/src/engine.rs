//! The imposition engine: reads an indexed document and emits a new one in
//! which each output sheet carries one or more transformed input pages.
//!
//! The output is assembled strictly in order: header (with media lines
//! replaced), the PStoPS procset, the document prologue and setup with any
//! previously embedded PStoPS procset spliced out, the rearranged pages, and
//! the trailer. Every emitted page brackets its contents in a `save`/
//! `restore` pair, and the wrapped `showpage` only fires when the page ends
//! its merge group.

use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};

use log::info;

use crate::dsc::{self, DocumentIndex};
use crate::procset::{PROCSET, XFORM_PRESERVE};
use crate::spec::{self, PageSpec};
use crate::types::{Dims, ImposeError, Result};
use crate::writer::PsWriter;

/// Options for one rearrangement run.
#[derive(Debug, Clone)]
pub struct RearrangeOptions {
    /// Input pages per specification cycle.
    pub modulo: usize,
    /// Append `/bind{}def` to the procset, for interpreters whose `bind`
    /// misbehaves with the wrapped operators.
    pub nobind: bool,
    /// Border line width around each placed page; 0 draws nothing.
    pub draw: f64,
    /// Output sheet size. Replaces the header media lines when set.
    pub paper: Option<Dims>,
    /// Placed page size, when it differs from the output sheet. Governs the
    /// flip matrices and the per-page clip.
    pub page_size: Option<Dims>,
}

impl Default for RearrangeOptions {
    fn default() -> Self {
        Self {
            modulo: 1,
            nobind: false,
            draw: 0.0,
            paper: None,
            page_size: None,
        }
    }
}

impl RearrangeOptions {
    fn clip_size(&self) -> Option<Dims> {
        self.page_size.or(self.paper)
    }
}

/// Totals reported after a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RearrangeStats {
    /// Output sheets emitted, blanks included.
    pub sheets: usize,
    /// Total bytes written.
    pub bytes: u64,
}

/// Rearrange `input` according to `specs`, writing the new document to `out`.
///
/// `page_list` is the ordered list of input pages to draw from (`None` for a
/// forced blank); use [`crate::select::all_pages`] for the whole document.
pub fn rearrange<R: Read + Seek, W: Write>(
    input: &mut R,
    index: &DocumentIndex,
    page_list: &[Option<usize>],
    specs: &[PageSpec],
    options: &RearrangeOptions,
    out: W,
) -> Result<RearrangeStats> {
    if options.modulo < 1 {
        return Err(ImposeError::Spec("modulo must be at least 1".into()));
    }
    if specs.is_empty() {
        return Err(ImposeError::Spec("empty specification list".into()));
    }

    let mut input = BufReader::new(input);
    let mut writer = PsWriter::new(out);

    let pages = page_list.len();
    let groups = spec::group_count(specs);
    let max_page = pages.div_ceil(options.modulo) * options.modulo;

    write_header(&mut input, &mut writer, index, options, max_page, groups)?;
    write_procset(&mut writer, options)?;
    write_prologue_and_setup(&mut input, &mut writer, index)?;

    let mut sheet_index = 0;
    let mut base = 0;
    while base < max_page {
        let mut in_group = false;
        for (spec_index, ps) in specs.iter().enumerate() {
            let slot = if ps.reversed {
                max_page - base - options.modulo + ps.pageno
            } else {
                base + ps.pageno
            };
            let actual = page_list.get(slot).copied().flatten();
            if let Some(page) = actual {
                dsc::seek_page(&mut input, index, page)?;
            }

            if !in_group {
                let label = group_label(&specs[spec_index..], page_list, base, max_page, options);
                if actual.is_some() {
                    sheet_index += 1;
                    info!("[{sheet_index}]");
                } else {
                    info!("[*]");
                }
                writer.page_heading(&label)?;
            }

            writer.write_str("userdict/PStoPSsaved save put\n")?;
            if ps.has_transform() {
                write_transform(&mut writer, ps, options)?;
            }
            in_group = ps.add_next;
            if ps.add_next {
                writer.write_str("/PStoPSenablepage false def\n")?;
            }

            if let Some(page) = actual {
                copy_page_setup(&mut input, &mut writer, index)?;
                writer.write_str("PStoPSxform concat\n")?;
                writer
                    .copy_range(&mut input, index.page_offsets[page + 1], &[])
                    .map_err(|_| ImposeError::WritePage(writer.pages_written()))?;
            } else {
                writer.write_str("PStoPSxform concat showpage\n")?;
            }
            writer.write_str("PStoPSsaved restore\n")?;
        }
        base += options.modulo;
    }

    // Trailer, verbatim to end of input.
    input.seek(SeekFrom::Start(index.trailer()))?;
    writer
        .copy_to_eof(&mut input)
        .map_err(ImposeError::section("trailer"))?;
    writer.flush()?;

    info!(
        "Wrote {} pages, {} bytes",
        writer.pages_written(),
        writer.bytes_written()
    );
    Ok(RearrangeStats {
        sheets: writer.pages_written(),
        bytes: writer.bytes_written(),
    })
}

/// Copy the header, replacing the media lines and the page count.
fn write_header<I: BufRead + Seek, W: Write>(
    input: &mut I,
    writer: &mut PsWriter<W>,
    index: &DocumentIndex,
    options: &RearrangeOptions,
    max_page: usize,
    groups: usize,
) -> Result<()> {
    input.seek(SeekFrom::Start(0))?;
    let ignore: &[u64] = if options.paper.is_some() {
        &index.size_headers
    } else {
        &[]
    };
    if let Some(pages_comment) = index.pages_comment {
        writer
            .copy_range(input, pages_comment, ignore)
            .map_err(ImposeError::section("header"))?;
        dsc::read_line(input)?.ok_or_else(|| {
            ImposeError::Section {
                section: "header",
                source: std::io::ErrorKind::UnexpectedEof.into(),
            }
        })?;
        if let Some(paper) = options.paper {
            writer.write_str(&format!(
                "%%DocumentMedia: plain {} {} 0 () ()\n",
                paper.width as i64, paper.height as i64
            ))?;
            writer.write_str(&format!(
                "%%BoundingBox: 0 0 {} {}\n",
                paper.width as i64, paper.height as i64
            ))?;
        }
        writer.write_str(&format!(
            "%%Pages: {} 0\n",
            (max_page / options.modulo) * groups
        ))?;
    }
    writer
        .copy_range(input, index.header_end, ignore)
        .map_err(ImposeError::section("header"))
}

fn write_procset<W: Write>(writer: &mut PsWriter<W>, options: &RearrangeOptions) -> Result<()> {
    writer.write_str("%%BeginProcSet: PStoPS")?;
    if options.nobind {
        writer.write_str("-nobind")?;
    }
    writer.write_str(" 1 15\n")?;
    writer.write_str(PROCSET)?;
    if options.nobind {
        writer.write_str("/bind{}def\n")?;
    }
    writer.write_str("%%EndProcSet\n")?;
    Ok(())
}

/// Copy the prologue and setup sections, splicing out any PStoPS procset a
/// previous run embedded. When the input carried no such procset, the current
/// transformation is folded into `PStoPSxform` so pre-existing coordinate
/// systems survive the re-wrapping.
fn write_prologue_and_setup<I: BufRead + Seek, W: Write>(
    input: &mut I,
    writer: &mut PsWriter<W>,
    index: &DocumentIndex,
) -> Result<()> {
    if let Some(begin) = index.begin_procset {
        writer
            .copy_range(input, begin, &[])
            .map_err(ImposeError::section("prologue"))?;
    }
    if let Some(end) = index.end_procset {
        input.seek(SeekFrom::Start(end))?;
    }
    writer
        .copy_range(input, index.end_setup, &[])
        .map_err(ImposeError::section("prologue"))?;
    if index.begin_procset.is_none() {
        writer.write_str(XFORM_PRESERVE)?;
    }
    writer
        .copy_range(input, index.page_offsets[0], &[])
        .map_err(ImposeError::section("setup"))
}

/// The composite label naming every input page on this sheet, 1-based, with
/// `*` for slots past the end of the document.
fn group_label(
    group: &[PageSpec],
    page_list: &[Option<usize>],
    base: usize,
    max_page: usize,
    options: &RearrangeOptions,
) -> String {
    let mut label = String::from("(");
    for (i, ps) in group.iter().enumerate() {
        if i > 0 {
            label.push(',');
        }
        let slot = if ps.reversed {
            max_page - base - options.modulo + ps.pageno
        } else {
            base + ps.pageno
        };
        match page_list.get(slot).copied().flatten() {
            Some(page) => label.push_str(&(page + 1).to_string()),
            None => label.push('*'),
        }
        if !ps.add_next {
            break;
        }
    }
    label.push(')');
    label
}

/// Emit the transformation for one placed page, in the canonical order
/// translate, rotate, flip, scale.
fn write_transform<W: Write>(
    writer: &mut PsWriter<W>,
    ps: &PageSpec,
    options: &RearrangeOptions,
) -> Result<()> {
    let scale = ps.scale.unwrap_or(1.0);
    writer.write_str("PStoPSmatrix setmatrix\n")?;
    if ps.offset {
        writer.write_str(&format!("{:.6} {:.6} translate\n", ps.xoff, ps.yoff))?;
    }
    if let Some(degrees) = ps.rotate {
        writer.write_str(&format!("{degrees} rotate\n"))?;
    }
    if ps.hflip {
        let width = options.clip_size().ok_or(ImposeError::Unset("width"))?.width;
        writer.write_str(&format!("[ -1 0 0 1 {:.6} 0 ] concat\n", width * scale))?;
    }
    if ps.vflip {
        let height = options
            .clip_size()
            .ok_or(ImposeError::Unset("height"))?
            .height;
        writer.write_str(&format!("[ 1 0 0 -1 0 {:.6} ] concat\n", height * scale))?;
    }
    if ps.scale.is_some() {
        writer.write_str(&format!("{scale:.6} dup scale\n"))?;
    }
    writer.write_str("userdict/PStoPSmatrix matrix currentmatrix put\n")?;
    if let Some(clip) = options.clip_size() {
        writer.write_str(&format!(
            "userdict/PStoPSclip{{0 0 moveto\n {:.6} 0 rlineto 0 {:.6} rlineto -{:.6} 0 rlineto\n closepath}}put initclip\n",
            clip.width, clip.height, clip.width
        ))?;
        if options.draw > 0.0 {
            writer.write_str(&format!(
                "gsave clippath 0 setgray {:.6} setlinewidth stroke grestore\n",
                options.draw
            ))?;
        }
    }
    Ok(())
}

/// When the input was produced by a previous PStoPS run, its per-page setup
/// runs up to a `PStoPSxform` line; copy the setup and drop that line.
fn copy_page_setup<I: BufRead + Seek, W: Write>(
    input: &mut I,
    writer: &mut PsWriter<W>,
    index: &DocumentIndex,
) -> Result<()> {
    if index.begin_procset.is_none() {
        return Ok(());
    }
    loop {
        let line = dsc::read_line(input)?
            .ok_or_else(|| ImposeError::ReadPageSetup(writer.pages_written()))?;
        if line.starts_with(b"PStoPSxform") {
            return Ok(());
        }
        writer
            .write_bytes(&line)
            .map_err(|_| ImposeError::WritePage(writer.pages_written()))?;
    }
}
