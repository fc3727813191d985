/// XML serialization and atomic persistence of workflow documents
///
/// Output is indented by two spaces with an `utf-8` declaration. Elements that
/// carry text are written inline so their content is not altered by indentation.
/// Names and character data are checked while writing; a tree that would not
/// parse back is rejected before anything reaches the disk.

use crate::document::element::{Document, Element, XmlNode};
use crate::document::DocumentError;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Write;
use std::path::Path;

/// Serialize a full document, including the XML declaration
pub fn to_string(document: &Document) -> Result<String, DocumentError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .map_err(write_error)?;
    write_element(&mut writer, document.root())?;
    finish(writer)
}

/// Serialize a single element without declaration (fragment preview)
pub fn element_to_string(element: &Element) -> Result<String, DocumentError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    write_element(&mut writer, element)?;
    finish(writer)
}

/// Write the document to `path` through a temporary file in the same directory
///
/// The temporary file is flushed and synced before being renamed over the
/// target, so readers never observe a half-written document.
pub fn persist(document: &Document, path: &Path) -> Result<(), DocumentError> {
    let xml = to_string(document)?;
    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(xml.as_bytes())?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;

    tracing::debug!("💾 Wrote workflow document to {}", path.display());
    Ok(())
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<(), DocumentError> {
    let name = element.qualified_name();
    check_name(&name)?;
    let mut start = BytesStart::new(name.as_str());
    for attr in element.attributes() {
        check_name(&attr.name)?;
        check_chars(&attr.value)?;
        start.push_attribute((attr.name.as_str(), attr.value.as_str()));
    }

    if element.nodes().is_empty() {
        return writer.write_event(Event::Empty(start)).map_err(write_error);
    }

    writer.write_event(Event::Start(start)).map_err(write_error)?;
    for node in element.nodes() {
        match node {
            XmlNode::Element(child) => write_element(writer, child)?,
            XmlNode::Text(text) => {
                check_chars(text)?;
                writer
                    .write_event(Event::Text(BytesText::new(text)))
                    .map_err(write_error)?
            }
            XmlNode::CData(data) => {
                check_chars(data)?;
                if data.contains("]]>") {
                    return Err(DocumentError::Invalid("CDATA section contains ']]>'".into()));
                }
                writer
                    .write_event(Event::CData(BytesCData::new(data.as_str())))
                    .map_err(write_error)?
            }
            XmlNode::Comment(comment) => {
                check_chars(comment)?;
                if comment.contains("--") || comment.ends_with('-') {
                    return Err(DocumentError::Invalid("comment contains '--'".into()));
                }
                writer
                    .write_event(Event::Comment(BytesText::from_escaped(comment.as_str())))
                    .map_err(write_error)?
            }
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(name.as_str())))
        .map_err(write_error)
}

/// `Name` production of XML 1.0 (fifth edition)
pub fn is_xml_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(is_name_start_char) && chars.all(is_name_char)
}

fn is_name_start_char(c: char) -> bool {
    matches!(c,
        ':' | 'A'..='Z' | '_' | 'a'..='z'
        | '\u{C0}'..='\u{D6}' | '\u{D8}'..='\u{F6}' | '\u{F8}'..='\u{2FF}'
        | '\u{370}'..='\u{37D}' | '\u{37F}'..='\u{1FFF}' | '\u{200C}'..='\u{200D}'
        | '\u{2070}'..='\u{218F}' | '\u{2C00}'..='\u{2FEF}' | '\u{3001}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}' | '\u{FDF0}'..='\u{FFFD}' | '\u{10000}'..='\u{EFFFF}')
}

fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || matches!(c, '-' | '.' | '0'..='9' | '\u{B7}' | '\u{300}'..='\u{36F}' | '\u{203F}'..='\u{2040}')
}

/// `Char` production: tab, newline, carriage return and everything from
/// U+0020 except U+FFFE and U+FFFF
fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r') || (c >= ' ' && c != '\u{FFFE}' && c != '\u{FFFF}')
}

fn check_name(name: &str) -> Result<(), DocumentError> {
    if is_xml_name(name) {
        Ok(())
    } else {
        Err(DocumentError::Invalid(format!("'{}' is not a valid XML name", name)))
    }
}

fn check_chars(text: &str) -> Result<(), DocumentError> {
    match text.chars().find(|c| !is_xml_char(*c)) {
        Some(c) => Err(DocumentError::Invalid(format!(
            "character U+{:04X} is not allowed in XML",
            c as u32
        ))),
        None => Ok(()),
    }
}

fn finish(writer: Writer<Vec<u8>>) -> Result<String, DocumentError> {
    String::from_utf8(writer.into_inner()).map_err(|e| DocumentError::Write(e.to_string()))
}

fn write_error<E: std::fmt::Display>(error: E) -> DocumentError {
    DocumentError::Write(error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::reader;

    #[test]
    fn escapes_attribute_values() {
        let element = Element::new("Setting").with_attribute("value", "a < b & \"c\"");
        let xml = element_to_string(&element).unwrap();
        assert!(xml.contains("a &lt; b &amp; &quot;c&quot;"), "{xml}");

        let parsed = reader::parse(&xml).unwrap();
        assert_eq!(parsed.root().attribute("value"), Some("a < b & \"c\""));
    }

    #[test]
    fn serialization_is_stable_across_reparse() {
        let source = r#"<Workflow xmlns="urn:x" id="1"><Settings><Setting name="a" value="1"/></Settings><!-- c --><Tasks/></Workflow>"#;
        let first = to_string(&reader::parse(source).unwrap()).unwrap();
        let second = to_string(&reader::parse(&first).unwrap()).unwrap();
        assert_eq!(first, second);
        assert!(first.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
    }

    #[test]
    fn rejects_invalid_names_and_characters() {
        let setting = || Element::new("Setting").with_attribute("name", "s");
        for bad in ["bad name", "", "1st", "a>b"] {
            let element = setting().with_attribute(bad, "x");
            assert!(
                matches!(element_to_string(&element), Err(DocumentError::Invalid(_))),
                "attribute '{bad}' should be rejected"
            );
        }
        let control = setting().with_attribute("value", "a\u{1}b");
        assert!(matches!(element_to_string(&control), Err(DocumentError::Invalid(_))));

        let mut text = Element::new("Description");
        text.push_node(XmlNode::Text("bell \u{7}".into()));
        assert!(matches!(element_to_string(&text), Err(DocumentError::Invalid(_))));

        assert!(element_to_string(&setting().with_attribute("xml:lang", "é\ttab")).is_ok());
    }

    #[test]
    fn persist_leaves_file_untouched_on_invalid_tree() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wf.xml");
        std::fs::write(&path, "old").unwrap();

        let doc = Document::new(Element::new("Workflow").with_attribute("bad name", "x"));
        assert!(persist(&doc, &path).is_err());

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "old");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
        assert!(persist(&doc, &dir.path().join("new.xml")).is_err());
        assert!(!dir.path().join("new.xml").exists());
    }

    #[test]
    fn persist_replaces_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wf.xml");
        std::fs::write(&path, "old").unwrap();

        let doc = Document::new(Element::new("Workflow").with_attribute("id", "3"));
        persist(&doc, &path).unwrap();

        let reloaded = reader::load(&path).unwrap();
        assert_eq!(reloaded.root().attribute("id"), Some("3"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
