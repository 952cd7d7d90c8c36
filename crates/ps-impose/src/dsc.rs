//! DSC scanning: a single forward pass over a PostScript document that
//! records where its structural sections and pages begin.
//!
//! The scanner trusts the document's DSC comments. It does not interpret any
//! drawing operators, and mismatched `%%Begin*`/`%%End*` pairs are tolerated
//! silently.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom, Write};

use log::debug;

use crate::types::{ImposeError, Result};

/// Byte offsets of the structural sections of a scanned document.
///
/// Produced once by [`scan`] and immutable thereafter. `page_offsets[i]` is
/// the offset of the `%%Page:` line beginning page `i`; the final entry is
/// the offset of the trailer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentIndex {
    /// First byte after the header comment block.
    pub header_end: u64,
    /// Offset of the header's `%%Pages:` line, if it has one.
    pub pages_comment: Option<u64>,
    /// Offset of the `%%EndSetup` line, clamped to the first page.
    pub end_setup: u64,
    /// Offset of an embedded `%%BeginProcSet: PStoPS` line.
    pub begin_procset: Option<u64>,
    /// First byte after the matching `%%EndProcSet` line.
    pub end_procset: Option<u64>,
    /// `%%Page:` line offsets, terminated by the trailer offset.
    pub page_offsets: Vec<u64>,
    /// Offsets of media-describing header lines (`%%BoundingBox:` etc.).
    pub size_headers: Vec<u64>,
}

impl DocumentIndex {
    /// Number of pages in the document.
    pub fn pages(&self) -> usize {
        self.page_offsets.len() - 1
    }

    /// Offset of the trailer (first byte after the last page body).
    pub fn trailer(&self) -> u64 {
        *self.page_offsets.last().unwrap()
    }
}

fn starts(line: &[u8], keyword: &str) -> bool {
    line.starts_with(keyword.as_bytes())
}

/// Index the structural sections of `input` in one forward pass.
pub fn scan<R: Read + Seek>(input: &mut R) -> Result<DocumentIndex> {
    let mut reader = BufReader::new(input);
    reader.seek(SeekFrom::Start(0))?;

    let mut header_end: Option<u64> = None;
    let mut pages_comment = None;
    let mut end_setup = 0;
    let mut begin_procset = None;
    let mut end_procset = None;
    let mut page_offsets = Vec::new();
    let mut size_headers = Vec::new();

    let mut nesting = 0i32;
    let mut offset = 0u64;
    let mut line = Vec::new();
    let trailer = loop {
        line.clear();
        let n = reader.read_until(b'\n', &mut line)?;
        if n == 0 {
            break offset;
        }
        let record = offset;
        offset += n as u64;

        if starts(&line, "%%") {
            if nesting == 0 && starts(&line, "%%Page:") {
                page_offsets.push(record);
            } else if header_end.is_none()
                && (starts(&line, "%%BoundingBox:")
                    || starts(&line, "%%HiResBoundingBox:")
                    || starts(&line, "%%DocumentPaperSizes:")
                    || starts(&line, "%%DocumentMedia:"))
            {
                size_headers.push(record);
            } else if header_end.is_none() && starts(&line, "%%Pages:") {
                pages_comment = Some(record);
            } else if header_end.is_none() && starts(&line, "%%EndComments") {
                header_end = Some(offset);
            } else if starts(&line, "%%BeginDocument")
                || starts(&line, "%%BeginBinary")
                || starts(&line, "%%BeginFile")
            {
                nesting += 1;
            } else if starts(&line, "%%EndDocument")
                || starts(&line, "%%EndBinary")
                || starts(&line, "%%EndFile")
            {
                nesting -= 1;
            } else if nesting == 0 && starts(&line, "%%EndSetup") {
                end_setup = record;
            } else if nesting == 0 && header_end.is_none() && starts(&line, "%%BeginProlog") {
                header_end = Some(offset);
            } else if nesting == 0 && starts(&line, "%%BeginProcSet: PStoPS") {
                begin_procset = Some(record);
            } else if begin_procset.is_some()
                && end_procset.is_none()
                && starts(&line, "%%EndProcSet")
            {
                end_procset = Some(offset);
            } else if nesting == 0 && (starts(&line, "%%Trailer") || starts(&line, "%%EOF")) {
                break record;
            }
        } else if starts(&line, "%") {
            if header_end.is_none() && line.get(1) != Some(&b'!') {
                header_end = Some(record);
            }
        } else if header_end.is_none() {
            header_end = Some(record);
        }
    };
    page_offsets.push(trailer);

    // A missing or misplaced %%EndSetup falls back to the first page.
    if end_setup == 0 || end_setup > page_offsets[0] {
        end_setup = page_offsets[0];
    }

    let index = DocumentIndex {
        header_end: header_end.unwrap_or(0),
        pages_comment,
        end_setup,
        begin_procset,
        end_procset,
        page_offsets,
        size_headers,
    };
    debug!(
        "scanned {} pages, header ends at {}, trailer at {}",
        index.pages(),
        index.header_end,
        index.trailer()
    );
    Ok(index)
}

/// The label and ordinal parsed from a `%%Page:` comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageHeading {
    pub label: String,
    pub ordinal: i64,
}

/// Seek to page `page` and consume its `%%Page:` line, leaving the input
/// positioned at the start of the page's contents.
pub fn seek_page<I: BufRead + Seek>(
    input: &mut I,
    index: &DocumentIndex,
    page: usize,
) -> Result<PageHeading> {
    input.seek(SeekFrom::Start(index.page_offsets[page]))?;
    let line = read_line(input)?.ok_or(ImposeError::SeekPage(page))?;
    if !starts(&line, "%%Page:") {
        return Err(ImposeError::SeekPage(page));
    }
    parse_page_heading(&line[7..]).ok_or(ImposeError::PageLabel(page))
}

/// Parse the remainder of a `%%Page:` line: a label (either parenthesised,
/// with balanced nested parentheses, or a bare word) and an ordinal.
fn parse_page_heading(rest: &[u8]) -> Option<PageHeading> {
    let rest = trim_leading_space(rest);
    let label_len = if rest.first() == Some(&b'(') {
        let mut depth = 1usize;
        let mut i = 1;
        while depth > 0 {
            match rest.get(i)? {
                b'(' => depth += 1,
                b')' => depth -= 1,
                _ => {}
            }
            i += 1;
        }
        i
    } else {
        rest.iter()
            .position(|b| b.is_ascii_whitespace())
            .unwrap_or(rest.len())
    };
    let label = String::from_utf8_lossy(&rest[..label_len]).into_owned();
    let tail = trim_leading_space(&rest[label_len..]);
    let digits: Vec<u8> = tail
        .iter()
        .take_while(|b| b.is_ascii_digit() || **b == b'-')
        .copied()
        .collect();
    let ordinal = String::from_utf8_lossy(&digits).parse().unwrap_or(0);
    Some(PageHeading { label, ordinal })
}

fn trim_leading_space(bytes: &[u8]) -> &[u8] {
    let n = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    &bytes[n..]
}

/// Read one line (including its newline) from the current position.
/// Returns `None` at end of input.
pub(crate) fn read_line<I: BufRead>(input: &mut I) -> io::Result<Option<Vec<u8>>> {
    let mut line = Vec::new();
    input.read_until(b'\n', &mut line)?;
    Ok(if line.is_empty() { None } else { Some(line) })
}

/// Probe a file for seekability, spooling it to a temporary file if the
/// underlying stream cannot seek (for example a named pipe).
pub fn seekable(mut file: File) -> Result<File> {
    let pos = match file.stream_position() {
        Ok(pos) => pos,
        Err(_) => return spool(file),
    };
    if file.seek(SeekFrom::End(0)).is_ok() && file.seek(SeekFrom::Start(pos)).is_ok() {
        Ok(file)
    } else {
        spool(file)
    }
}

/// Copy a non-seekable stream to an unnamed temporary file and rewind it.
/// The file is removed by the operating system once dropped.
pub fn spool<R: Read>(mut input: R) -> Result<File> {
    let mut tmp = tempfile::tempfile()?;
    io::copy(&mut input, &mut tmp)?;
    tmp.flush()?;
    tmp.seek(SeekFrom::Start(0))?;
    Ok(tmp)
}
