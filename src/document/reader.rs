/// XML parsing into the workflow document tree
///
/// Uses quick-xml's pull reader and resolves namespaces with an explicit
/// scope stack. Whitespace-only text between elements is dropped, so a
/// document re-serialized after editing gets consistent indentation.

use crate::document::element::{Attribute, Document, Element, XmlNode};
use crate::document::DocumentError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::path::Path;

/// One level of namespace declarations: (prefix, uri), `None` prefix = default
type Scope = Vec<(Option<String>, String)>;

/// Parse a document from its textual form
pub fn parse(xml: &str) -> Result<Document, DocumentError> {
    let mut reader = Reader::from_str(xml);

    let mut scopes: Vec<Scope> = Vec::new();
    let mut open: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| malformed(&reader, e))?;

        match event {
            Event::Start(start) => {
                let (element, scope) = open_element(&start, &scopes)?;
                scopes.push(scope);
                open.push(element);
            }
            Event::Empty(start) => {
                let (element, _) = open_element(&start, &scopes)?;
                attach(element, &mut open, &mut root)?;
            }
            Event::End(_) => {
                scopes.pop();
                let element = open
                    .pop()
                    .ok_or_else(|| DocumentError::Malformed("unexpected closing tag".into()))?;
                attach(element, &mut open, &mut root)?;
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(|e| malformed(&reader, e))?;
                // indentation between elements
                let formatting = text.chars().all(char::is_whitespace);
                match open.last_mut() {
                    Some(parent) if !formatting => {
                        parent.push_node(XmlNode::Text(text.into_owned()))
                    }
                    _ => {}
                }
            }
            Event::CData(data) => {
                if let Some(parent) = open.last_mut() {
                    parent.push_node(XmlNode::CData(utf8(&data)?));
                }
            }
            Event::Comment(comment) => {
                if let Some(parent) = open.last_mut() {
                    parent.push_node(XmlNode::Comment(utf8(&comment)?));
                }
            }
            Event::Eof => break,
            // Declaration, processing instructions and doctype are regenerated
            // or dropped on write.
            _ => {}
        }
    }

    if !open.is_empty() {
        return Err(DocumentError::Malformed(format!(
            "unclosed element <{}>",
            open.last().map(Element::qualified_name).unwrap_or_default()
        )));
    }

    root.map(Document::new)
        .ok_or_else(|| DocumentError::Malformed("document has no root element".into()))
}

/// Read and parse a document from disk
pub fn load(path: &Path) -> Result<Document, DocumentError> {
    let xml = std::fs::read_to_string(path)?;
    parse(&xml)
}

fn open_element(start: &BytesStart<'_>, scopes: &[Scope]) -> Result<(Element, Scope), DocumentError> {
    let raw_name = utf8(start.name().as_ref())?;

    let mut attributes = Vec::new();
    let mut scope = Scope::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| DocumentError::Malformed(e.to_string()))?;
        let name = utf8(attr.key.as_ref())?;
        let value = attr
            .unescape_value()
            .map_err(|e| DocumentError::Malformed(e.to_string()))?
            .into_owned();

        if name == "xmlns" {
            scope.push((None, value.clone()));
        } else if let Some(prefix) = name.strip_prefix("xmlns:") {
            scope.push((Some(prefix.to_string()), value.clone()));
        }
        attributes.push(Attribute { name, value });
    }

    let (prefix, local) = match raw_name.split_once(':') {
        Some((prefix, local)) => (Some(prefix.to_string()), local.to_string()),
        None => (None, raw_name),
    };

    let namespace = resolve(prefix.as_deref(), &scope, scopes);
    if prefix.is_some() && namespace.is_none() {
        return Err(DocumentError::Malformed(format!(
            "unbound namespace prefix in <{}:{}>",
            prefix.unwrap_or_default(),
            local
        )));
    }

    Ok((Element::from_parts(prefix, local, namespace, attributes), scope))
}

/// Resolve a prefix against the element's own declarations, then outward
fn resolve(prefix: Option<&str>, own: &Scope, outer: &[Scope]) -> Option<String> {
    std::iter::once(own)
        .chain(outer.iter().rev())
        .flat_map(|scope| scope.iter())
        .find(|(declared, _)| declared.as_deref() == prefix)
        .map(|(_, uri)| uri.clone())
        // `xmlns=""` undeclares the default namespace
        .filter(|uri| !uri.is_empty())
}

fn attach(element: Element, open: &mut [Element], root: &mut Option<Element>) -> Result<(), DocumentError> {
    match open.last_mut() {
        Some(parent) => parent.push_child(element),
        None if root.is_none() => *root = Some(element),
        None => {
            return Err(DocumentError::Malformed(
                "document has more than one root element".into(),
            ))
        }
    }
    Ok(())
}

fn utf8(bytes: &[u8]) -> Result<String, DocumentError> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|e| DocumentError::Malformed(e.to_string()))
}

fn malformed<E: std::fmt::Display>(reader: &Reader<&[u8]>, error: E) -> DocumentError {
    DocumentError::Malformed(format!(
        "{} (at byte {})",
        error,
        reader.buffer_position()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_default_namespace() {
        let doc = parse(
            r#"<?xml version="1.0" encoding="utf-8"?>
<Workflow xmlns="urn:wexflow-schema" id="1">
  <Settings>
    <Setting name="enabled" value="true" />
  </Settings>
</Workflow>"#,
        )
        .unwrap();

        let ns = Some("urn:wexflow-schema");
        let root = doc.root();
        assert!(root.is(ns, "Workflow"));
        let settings = root.child(ns, "Settings").unwrap();
        assert_eq!(settings.elements().count(), 1);
        assert_eq!(
            settings.child(ns, "Setting").unwrap().attribute("value"),
            Some("true")
        );
    }

    #[test]
    fn resolves_prefixed_namespace() {
        let doc = parse(r#"<wf:Workflow xmlns:wf="urn:x"><wf:Tasks/><Other/></wf:Workflow>"#).unwrap();
        let root = doc.root();
        assert!(root.is(Some("urn:x"), "Workflow"));
        assert_eq!(root.prefix(), Some("wf"));
        assert!(root.child(Some("urn:x"), "Tasks").is_some());
        assert!(root.child(None, "Other").is_some());
    }

    #[test]
    fn keeps_comments_and_text() {
        let doc = parse("<a><!-- note --><b>x &amp; y</b></a>").unwrap();
        let root = doc.root();
        assert_eq!(root.nodes()[0], XmlNode::Comment(" note ".into()));
        assert_eq!(root.child(None, "b").unwrap().text(), "x & y");
    }

    #[test]
    fn keeps_surrounding_whitespace_of_text() {
        let doc = parse("<a>\n  <b>  padded value \n</b>\n  <c>   </c>\n</a>").unwrap();
        let root = doc.root();
        assert_eq!(root.nodes().len(), 2);
        assert_eq!(root.child(None, "b").unwrap().text(), "  padded value \n");
        assert!(root.child(None, "c").unwrap().nodes().is_empty());
    }

    #[test]
    fn rejects_broken_documents() {
        assert!(parse("").is_err());
        assert!(parse("<a><b></a>").is_err());
        assert!(parse("<p:a/>").is_err());
        assert!(parse("<a/><b/>").is_err());
    }
}
