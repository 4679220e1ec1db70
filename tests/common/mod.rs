//! Shared fixture builder: assembles a small scripture package in
//! memory with the container descriptor, package document, chapter
//! navigation markers, and chapter content files.

use std::io::{Cursor, Write};

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Build a package zip holding the given books. Each entry is
/// (book number, chapter body fragments); chapters are emitted in
/// order behind the book's navigation marker. Books must be given in
/// ascending canonical order.
pub fn build_package(books: &[(u8, Vec<&str>)]) -> Cursor<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let opts = SimpleFileOptions::default();

    zip.start_file("META-INF/container.xml", opts).unwrap();
    zip.write_all(
        br#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#,
    )
    .unwrap();

    let mut manifest = String::new();
    let mut spine = String::new();
    let mut files: Vec<(String, String)> = Vec::new();

    for (book, chapters) in books {
        let nav = format!("biblechapternav{book}.xhtml");
        manifest.push_str(&format!(
            "    <item id=\"nav{book}\" href=\"{nav}\" media-type=\"application/xhtml+xml\"/>\n"
        ));
        spine.push_str(&format!("    <itemref idref=\"nav{book}\"/>\n"));
        files.push((
            nav,
            format!("<html><body><p>Chapters of book {book}</p></body></html>"),
        ));

        for (i, body) in chapters.iter().enumerate() {
            let chapter = i + 1;
            let href = format!("chapter{book}_{chapter}.xhtml");
            manifest.push_str(&format!(
                "    <item id=\"c{book}_{chapter}\" href=\"{href}\" media-type=\"application/xhtml+xml\"/>\n"
            ));
            spine.push_str(&format!("    <itemref idref=\"c{book}_{chapter}\"/>\n"));
            files.push((
                href,
                format!(
                    "<html><head><script>track();</script><style>p{{}}</style></head>\
                     <body><p>{body}</p></body></html>"
                ),
            ));
        }
    }

    zip.start_file("OEBPS/content.opf", opts).unwrap();
    zip.write_all(
        format!(
            "<?xml version=\"1.0\"?>\n<package xmlns=\"http://www.idpf.org/2007/opf\" version=\"3.0\">\n\
             <manifest>\n{manifest}</manifest>\n<spine>\n{spine}</spine>\n</package>"
        )
        .as_bytes(),
    )
    .unwrap();

    for (href, content) in files {
        zip.start_file(format!("OEBPS/{href}"), opts).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }

    zip.finish().unwrap()
}
