//! Byte-counted PostScript emission.
//!
//! `PsWriter` owns the output stream and provides the primitives the engine
//! is built from: literal emission, `%%Page:` headings with the running
//! output page number, and bulk copies of input ranges that can skip over
//! lines the caller wants dropped.

use std::io::{self, BufRead, Seek, Write};

use crate::dsc;

pub struct PsWriter<W: Write> {
    out: W,
    bytes: u64,
    pages: usize,
}

impl<W: Write> PsWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            bytes: 0,
            pages: 0,
        }
    }

    /// Total bytes emitted so far.
    pub fn bytes_written(&self) -> u64 {
        self.bytes
    }

    /// Number of `%%Page:` headings emitted so far.
    pub fn pages_written(&self) -> usize {
        self.pages
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.out.write_all(bytes)?;
        self.bytes += bytes.len() as u64;
        Ok(())
    }

    pub fn write_str(&mut self, s: &str) -> io::Result<()> {
        self.write_bytes(s.as_bytes())
    }

    /// Emit a `%%Page:` heading, advancing the output page counter.
    pub fn page_heading(&mut self, label: &str) -> io::Result<usize> {
        self.pages += 1;
        let pages = self.pages;
        self.write_str(&format!("%%Page: {label} {pages}\n"))?;
        Ok(pages)
    }

    /// Copy input from its current position up to offset `upto`, dropping
    /// every line that starts at an offset in `ignore` (sorted ascending).
    pub fn copy_range<I: BufRead + Seek>(
        &mut self,
        input: &mut I,
        upto: u64,
        ignore: &[u64],
    ) -> io::Result<()> {
        let mut here = input.stream_position()?;
        for &skip in ignore {
            if skip < here {
                continue;
            }
            if skip >= upto {
                break;
            }
            self.copy_exact(input, skip - here)?;
            let line = dsc::read_line(input)?
                .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "short read"))?;
            here = skip + line.len() as u64;
        }
        self.copy_exact(input, upto.saturating_sub(here))
    }

    /// Copy the rest of the input verbatim.
    pub fn copy_to_eof<I: BufRead>(&mut self, input: &mut I) -> io::Result<()> {
        loop {
            let buf = input.fill_buf()?;
            if buf.is_empty() {
                return Ok(());
            }
            let n = buf.len();
            self.out.write_all(buf)?;
            self.bytes += n as u64;
            input.consume(n);
        }
    }

    fn copy_exact<I: BufRead>(&mut self, input: &mut I, mut remaining: u64) -> io::Result<()> {
        while remaining > 0 {
            let buf = input.fill_buf()?;
            if buf.is_empty() {
                return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "short read"));
            }
            let n = buf.len().min(remaining as usize);
            self.out.write_all(&buf[..n])?;
            input.consume(n);
            self.bytes += n as u64;
            remaining -= n as u64;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}
