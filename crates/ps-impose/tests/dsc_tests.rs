use std::io::{Cursor, Read};

use ps_impose::dsc::{scan, seek_page, spool};

/// A small DSC-conformant document with `pages` one-line pages.
fn sample_doc(pages: usize) -> Vec<u8> {
    let mut doc = String::new();
    doc.push_str("%!PS-Adobe-3.0\n");
    doc.push_str(&format!("%%Pages: {pages} 0\n"));
    doc.push_str("%%BoundingBox: 0 0 612 792\n");
    doc.push_str("%%DocumentMedia: plain 612 792 0 () ()\n");
    doc.push_str("%%EndComments\n");
    doc.push_str("%%BeginProlog\n/box { 0 0 moveto } bind def\n%%EndProlog\n");
    doc.push_str("%%BeginSetup\n1 setlinewidth\n%%EndSetup\n");
    for page in 1..=pages {
        doc.push_str(&format!("%%Page: {page} {page}\nbox stroke % page {page}\nshowpage\n"));
    }
    doc.push_str("%%Trailer\nend\n%%EOF\n");
    doc.into_bytes()
}

fn offset_of(doc: &[u8], needle: &str) -> u64 {
    doc.windows(needle.len())
        .position(|window| window == needle.as_bytes())
        .unwrap() as u64
}

#[test]
fn scan_indexes_sections_and_pages() {
    let doc = sample_doc(3);
    let index = scan(&mut Cursor::new(&doc)).unwrap();

    assert_eq!(index.pages(), 3);
    assert_eq!(index.pages_comment, Some(offset_of(&doc, "%%Pages:")));
    assert_eq!(index.header_end, offset_of(&doc, "%%BeginProlog"));
    assert_eq!(index.end_setup, offset_of(&doc, "%%EndSetup"));
    assert_eq!(index.page_offsets[0], offset_of(&doc, "%%Page: 1 1"));
    assert_eq!(index.page_offsets[2], offset_of(&doc, "%%Page: 3 3"));
    assert_eq!(index.trailer(), offset_of(&doc, "%%Trailer"));
    assert_eq!(
        index.size_headers,
        vec![
            offset_of(&doc, "%%BoundingBox:"),
            offset_of(&doc, "%%DocumentMedia:")
        ]
    );
    assert_eq!(index.begin_procset, None);
    assert_eq!(index.end_procset, None);
}

#[test]
fn nested_documents_are_opaque() {
    let doc = b"%!PS-Adobe-3.0\n\
                %%EndComments\n\
                %%Page: 1 1\n\
                %%BeginDocument: inner.ps\n\
                %%Page: inner 1\n\
                %%EndDocument\n\
                showpage\n\
                %%Page: 2 2\n\
                showpage\n\
                %%EOF\n";
    let index = scan(&mut Cursor::new(&doc[..])).unwrap();
    assert_eq!(index.pages(), 2);
}

#[test]
fn missing_end_comments_falls_back_to_first_body_line() {
    let doc = b"%!PS-Adobe-3.0\n\
                %%Pages: 1 0\n\
                /init { pop } def\n\
                %%Page: 1 1\n\
                showpage\n\
                %%EOF\n";
    let index = scan(&mut Cursor::new(&doc[..])).unwrap();
    assert_eq!(index.header_end, offset_of(doc, "/init"));
    assert_eq!(index.pages(), 1);
}

#[test]
fn missing_end_setup_clamps_to_first_page() {
    let doc = b"%!PS-Adobe-3.0\n\
                %%EndComments\n\
                %%Page: 1 1\n\
                showpage\n\
                %%EOF\n";
    let index = scan(&mut Cursor::new(&doc[..])).unwrap();
    assert_eq!(index.end_setup, index.page_offsets[0]);
}

#[test]
fn embedded_procset_is_delimited() {
    let doc = b"%!PS-Adobe-3.0\n\
                %%EndComments\n\
                %%BeginProcSet: PStoPS 1 15\n\
                userdict begin\n\
                end\n\
                %%EndProcSet\n\
                %%Page: 1 1\n\
                showpage\n\
                %%EOF\n";
    let index = scan(&mut Cursor::new(&doc[..])).unwrap();
    assert_eq!(index.begin_procset, Some(offset_of(doc, "%%BeginProcSet")));
    let end = index.end_procset.unwrap();
    assert_eq!(end, offset_of(doc, "%%EndProcSet") + "%%EndProcSet\n".len() as u64);
}

#[test]
fn scan_stops_at_trailer() {
    let doc = b"%!PS-Adobe-3.0\n\
                %%EndComments\n\
                %%Page: 1 1\n\
                showpage\n\
                %%Trailer\n\
                %%Page: bogus 99\n\
                %%EOF\n";
    let index = scan(&mut Cursor::new(&doc[..])).unwrap();
    assert_eq!(index.pages(), 1);
    assert_eq!(index.trailer(), offset_of(doc, "%%Trailer"));
}

#[test]
fn seek_page_parses_the_heading() {
    let doc = sample_doc(2);
    let mut input = Cursor::new(&doc);
    let index = scan(&mut input).unwrap();
    let heading = seek_page(&mut input, &index, 1).unwrap();
    assert_eq!(heading.label, "2");
    assert_eq!(heading.ordinal, 2);

    // The input is left at the start of the page contents.
    let mut rest = vec![0u8; 3];
    input.read_exact(&mut rest).unwrap();
    assert_eq!(&rest, b"box");
}

#[test]
fn spool_copies_and_rewinds() {
    let doc = sample_doc(1);
    let mut spooled = spool(&doc[..]).unwrap();
    let mut copied = Vec::new();
    spooled.read_to_end(&mut copied).unwrap();
    assert_eq!(copied, doc);
}
