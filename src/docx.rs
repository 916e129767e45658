//! Minimal WordprocessingML writer.
//!
//! Projects a [`FunctionalDocument`] into a `.docx` package: the title uses
//! the `Title` style, top-level sections `Heading1`, per-file sections
//! `Heading2`, and bodies `Normal` paragraphs. Single newlines inside a
//! paragraph become `<w:br/>` line breaks.
//!
//! [`read_outline`] reads the paragraph styles and text back out of a
//! package, which is how callers verify the two outputs agree.

use std::io::{Cursor, Read, Write};

use anyhow::{bail, Context, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;

use crate::report::{Block, FunctionalDocument};

const MAX_DOCUMENT_XML_BYTES: u64 = 64 * 1024 * 1024;

const WORDML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
<Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>
<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>
</Types>"#;

const ROOT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
</Relationships>"#;

const DOCUMENT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#;

const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:pPr><w:spacing w:after="160"/></w:pPr><w:rPr><w:sz w:val="22"/></w:rPr></w:style>
<w:style w:type="paragraph" w:styleId="Title"><w:name w:val="Title"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:pPr><w:spacing w:after="240"/></w:pPr><w:rPr><w:sz w:val="56"/></w:rPr></w:style>
<w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:pPr><w:keepNext/><w:spacing w:before="360" w:after="120"/><w:outlineLvl w:val="0"/></w:pPr><w:rPr><w:b/><w:sz w:val="32"/></w:rPr></w:style>
<w:style w:type="paragraph" w:styleId="Heading2"><w:name w:val="heading 2"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:pPr><w:keepNext/><w:spacing w:before="240" w:after="80"/><w:outlineLvl w:val="1"/></w:pPr><w:rPr><w:b/><w:sz w:val="26"/></w:rPr></w:style>
</w:styles>"#;

/// Render the document as `.docx` bytes.
pub fn render_docx(doc: &FunctionalDocument) -> Result<Vec<u8>> {
    let document_xml = document_xml(doc)?;
    let core_xml = core_xml(&doc.title);

    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let parts: [(&str, &[u8]); 6] = [
        ("[Content_Types].xml", CONTENT_TYPES_XML.as_bytes()),
        ("_rels/.rels", ROOT_RELS_XML.as_bytes()),
        ("word/document.xml", &document_xml),
        ("word/_rels/document.xml.rels", DOCUMENT_RELS_XML.as_bytes()),
        ("word/styles.xml", STYLES_XML.as_bytes()),
        ("docProps/core.xml", core_xml.as_bytes()),
    ];
    for (name, bytes) in parts {
        zip.start_file(name, options)
            .with_context(|| format!("cannot start {}", name))?;
        zip.write_all(bytes)
            .with_context(|| format!("cannot write {}", name))?;
    }

    Ok(zip.finish().context("cannot finish docx package")?.into_inner())
}

fn document_xml(doc: &FunctionalDocument) -> Result<Vec<u8>> {
    let mut writer = quick_xml::Writer::new(Vec::new());
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    writer.write_event(Event::Start(
        BytesStart::new("w:document").with_attributes([("xmlns:w", WORDML_NS)]),
    ))?;
    writer.write_event(Event::Start(BytesStart::new("w:body")))?;

    for block in doc.blocks() {
        match block {
            Block::Title(text) => write_paragraph(&mut writer, Some("Title"), text)?,
            Block::Heading { level, text } => {
                let style = format!("Heading{}", level);
                write_paragraph(&mut writer, Some(&style), text)?
            }
            Block::Paragraph(text) => write_paragraph(&mut writer, None, text)?,
        }
    }

    writer.write_event(Event::End(BytesEnd::new("w:body")))?;
    writer.write_event(Event::End(BytesEnd::new("w:document")))?;
    Ok(writer.into_inner())
}

fn write_paragraph(
    writer: &mut quick_xml::Writer<Vec<u8>>,
    style: Option<&str>,
    text: &str,
) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new("w:p")))?;
    if let Some(style) = style {
        writer.write_event(Event::Start(BytesStart::new("w:pPr")))?;
        writer.write_event(Event::Empty(
            BytesStart::new("w:pStyle").with_attributes([("w:val", style)]),
        ))?;
        writer.write_event(Event::End(BytesEnd::new("w:pPr")))?;
    }

    writer.write_event(Event::Start(BytesStart::new("w:r")))?;
    let clean = xml_safe(text);
    for (i, line) in clean.split('\n').enumerate() {
        if i > 0 {
            writer.write_event(Event::Empty(BytesStart::new("w:br")))?;
        }
        writer.write_event(Event::Start(
            BytesStart::new("w:t").with_attributes([("xml:space", "preserve")]),
        ))?;
        writer.write_event(Event::Text(BytesText::new(line)))?;
        writer.write_event(Event::End(BytesEnd::new("w:t")))?;
    }
    writer.write_event(Event::End(BytesEnd::new("w:r")))?;
    writer.write_event(Event::End(BytesEnd::new("w:p")))?;
    Ok(())
}

fn core_xml(title: &str) -> String {
    let created = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
<dc:title>{}</dc:title>
<dc:creator>fdoc</dc:creator>
<dcterms:created xsi:type="dcterms:W3CDTF">{}</dcterms:created>
</cp:coreProperties>"#,
        quick_xml::escape::escape(xml_safe(title).as_str()),
        created
    )
}

/// Drop characters XML 1.0 cannot carry. Carriage returns are folded away.
fn xml_safe(text: &str) -> String {
    text.chars()
        .filter(|&c| {
            matches!(c, '\t' | '\n')
                || (c >= '\u{20}' && c != '\u{FFFE}' && c != '\u{FFFF}')
        })
        .collect()
}

/// One paragraph read back from a package: its style id (if any) and text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineEntry {
    pub style: Option<String>,
    pub text: String,
}

/// Read the paragraphs of `word/document.xml` in document order.
pub fn read_outline(bytes: &[u8]) -> Result<Vec<OutlineEntry>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).context("not a docx package")?;
    let mut xml = Vec::new();
    archive
        .by_name("word/document.xml")
        .context("word/document.xml not found")?
        .take(MAX_DOCUMENT_XML_BYTES)
        .read_to_end(&mut xml)?;
    if xml.len() as u64 >= MAX_DOCUMENT_XML_BYTES {
        bail!("word/document.xml exceeds size limit");
    }

    let mut reader = quick_xml::Reader::from_reader(xml.as_slice());
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();
    let mut entries = Vec::new();
    let mut current: Option<OutlineEntry> = None;
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"p" => {
                    current = Some(OutlineEntry {
                        style: None,
                        text: String::new(),
                    })
                }
                b"t" => in_text = true,
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"pStyle" => {
                    if let (Some(entry), Some(attr)) =
                        (current.as_mut(), e.try_get_attribute("w:val")?)
                    {
                        entry.style = Some(attr.unescape_value()?.into_owned());
                    }
                }
                b"br" => {
                    if let Some(entry) = current.as_mut() {
                        entry.text.push('\n');
                    }
                }
                _ => {}
            },
            Event::Text(te) if in_text => {
                if let Some(entry) = current.as_mut() {
                    entry.text.push_str(&te.unescape()?);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => entries.extend(current.take()),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FileNote, NoteStatus, OverviewReport};

    fn sample() -> FunctionalDocument {
        let notes = vec![
            FileNote {
                file_name: "main.py".to_string(),
                relative_path: "main.py".to_string(),
                body: "Entry point.\nCalls `run`.\n\nUses <stdin> & args.".to_string(),
                status: NoteStatus::Analyzed,
            },
            FileNote {
                file_name: "util.py".to_string(),
                relative_path: "lib/util.py".to_string(),
                body: "Helpers\u{0007} here.".to_string(),
                status: NoteStatus::Analyzed,
            },
        ];
        FunctionalDocument::new(
            "Project Functional Documentation",
            &OverviewReport {
                text: "A small tool.".to_string(),
                context_chunks: 2,
            },
            &notes,
        )
    }

    fn style(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    #[test]
    fn package_contains_required_parts() {
        let bytes = render_docx(&sample()).unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        for name in [
            "[Content_Types].xml",
            "_rels/.rels",
            "word/document.xml",
            "word/_rels/document.xml.rels",
            "word/styles.xml",
            "docProps/core.xml",
        ] {
            assert!(archive.by_name(name).is_ok(), "missing {}", name);
        }
    }

    #[test]
    fn outline_matches_document_blocks() {
        let bytes = render_docx(&sample()).unwrap();
        let outline = read_outline(&bytes).unwrap();
        assert_eq!(
            outline,
            vec![
                OutlineEntry { style: style("Title"), text: "Project Functional Documentation".into() },
                OutlineEntry { style: style("Heading1"), text: "Overview".into() },
                OutlineEntry { style: None, text: "A small tool.".into() },
                OutlineEntry { style: style("Heading1"), text: "File-by-File Analysis".into() },
                OutlineEntry { style: style("Heading2"), text: "main.py".into() },
                OutlineEntry { style: None, text: "Entry point.\nCalls `run`.".into() },
                OutlineEntry { style: None, text: "Uses <stdin> & args.".into() },
                OutlineEntry { style: style("Heading2"), text: "util.py".into() },
                OutlineEntry { style: None, text: "Helpers here.".into() },
            ]
        );
    }

    #[test]
    fn markdown_headings_in_bodies_stay_normal_paragraphs() {
        let doc = FunctionalDocument::new(
            "T",
            &OverviewReport {
                text: "# Summary\n\n## Core features\nGreeting.".to_string(),
                context_chunks: 1,
            },
            &[FileNote {
                file_name: "main.py".to_string(),
                relative_path: "main.py".to_string(),
                body: "### Purpose\nGreets.".to_string(),
                status: NoteStatus::Analyzed,
            }],
        );
        let outline = read_outline(&render_docx(&doc).unwrap()).unwrap();
        let styled: Vec<&str> = outline
            .iter()
            .filter(|e| e.style.is_some())
            .map(|e| e.text.as_str())
            .collect();
        assert_eq!(styled, vec!["T", "Overview", "File-by-File Analysis", "main.py"]);
        assert!(outline
            .iter()
            .any(|e| e.style.is_none() && e.text == "## Core features\nGreeting."));
        assert!(outline
            .iter()
            .any(|e| e.style.is_none() && e.text == "### Purpose\nGreets."));
    }

    #[test]
    fn control_characters_are_dropped() {
        assert_eq!(xml_safe("a\u{0}b\u{1b}c\td\r\ne"), "abc\td\ne");
    }

    #[test]
    fn title_is_escaped_in_core_properties() {
        let core = core_xml("Docs <&> more");
        assert!(core.contains("<dc:title>Docs &lt;&amp;&gt; more</dc:title>"));
    }

    #[test]
    fn read_outline_rejects_non_zip() {
        assert!(read_outline(b"plain text").is_err());
    }
}
