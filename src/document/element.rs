/// In-memory XML tree used for workflow documents
///
/// A deliberately small DOM: elements keep their raw prefix, their resolved
/// namespace URI, attributes in document order, and child nodes. Queries are
/// namespace-qualified so a document written with a default namespace and one
/// written with a `wf:` prefix are navigated the same way.

/// Attribute on an element, stored with its raw (possibly prefixed) name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// Child content of an element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(Element),
    Text(String),
    CData(String),
    Comment(String),
}

/// XML element with namespace information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Raw prefix as written in the document (`None` for unprefixed names)
    prefix: Option<String>,
    /// Local part of the element name
    local: String,
    /// Resolved namespace URI (`None` when the element is in no namespace)
    namespace: Option<String>,
    attributes: Vec<Attribute>,
    children: Vec<XmlNode>,
}

impl Element {
    /// Create an element in no namespace
    pub fn new(local: impl Into<String>) -> Self {
        Self {
            prefix: None,
            local: local.into(),
            namespace: None,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Create an unprefixed element bound to `namespace`
    ///
    /// The element relies on a default namespace declaration in scope (or on
    /// [`Element::adopt_prefix`] when inserted below a prefixed parent).
    pub fn new_ns(namespace: Option<&str>, local: impl Into<String>) -> Self {
        Self {
            namespace: namespace.map(str::to_string),
            ..Self::new(local)
        }
    }

    pub(crate) fn from_parts(
        prefix: Option<String>,
        local: String,
        namespace: Option<String>,
        attributes: Vec<Attribute>,
    ) -> Self {
        Self {
            prefix,
            local,
            namespace,
            attributes,
            children: Vec::new(),
        }
    }

    pub fn local_name(&self) -> &str {
        &self.local
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Qualified name as it is serialized (`prefix:local` or `local`)
    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.local),
            None => self.local.clone(),
        }
    }

    /// True when the element has the given namespace and local name
    pub fn is(&self, namespace: Option<&str>, local: &str) -> bool {
        self.local == local && self.namespace.as_deref() == namespace
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    /// Set an attribute, overwriting an existing one in place or appending it
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|attr| attr.name == name) {
            Some(existing) => existing.value = value,
            None => self.attributes.push(Attribute { name, value }),
        }
    }

    /// Builder form of [`Element::set_attribute`]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn nodes(&self) -> &[XmlNode] {
        &self.children
    }

    pub fn push_node(&mut self, node: XmlNode) {
        self.children.push(node);
    }

    pub fn push_child(&mut self, child: Element) {
        self.children.push(XmlNode::Element(child));
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.push_child(child);
        self
    }

    /// Child elements in document order
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(element) => Some(element),
            _ => None,
        })
    }

    fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|node| match node {
            XmlNode::Element(element) => Some(element),
            _ => None,
        })
    }

    /// Child elements matching a namespace-qualified name
    pub fn children_named<'a>(
        &'a self,
        namespace: Option<&'a str>,
        local: &'a str,
    ) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements().filter(move |element| element.is(namespace, local))
    }

    pub fn child(&self, namespace: Option<&str>, local: &str) -> Option<&Element> {
        self.elements().find(|element| element.is(namespace, local))
    }

    pub fn child_mut(&mut self, namespace: Option<&str>, local: &str) -> Option<&mut Element> {
        self.elements_mut().find(|element| element.is(namespace, local))
    }

    /// First child with the given name whose attribute `attr` equals `value`
    ///
    /// Equivalent of the `ns:Local[@attr='value']` path step.
    pub fn child_with_attribute_mut(
        &mut self,
        namespace: Option<&str>,
        local: &str,
        attr: &str,
        value: &str,
    ) -> Option<&mut Element> {
        self.elements_mut()
            .find(|element| element.is(namespace, local) && element.attribute(attr) == Some(value))
    }

    pub fn child_with_attribute(
        &self,
        namespace: Option<&str>,
        local: &str,
        attr: &str,
        value: &str,
    ) -> Option<&Element> {
        self.elements()
            .find(|element| element.is(namespace, local) && element.attribute(attr) == Some(value))
    }

    /// Remove every child element with the given name, keeping other content
    ///
    /// Returns the number of removed elements.
    pub fn remove_children_named(&mut self, namespace: Option<&str>, local: &str) -> usize {
        let before = self.children.len();
        self.children.retain(|node| match node {
            XmlNode::Element(element) => !element.is(namespace, local),
            _ => true,
        });
        before - self.children.len()
    }

    /// Text content of the element's direct text and CDATA children
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                XmlNode::Text(text) | XmlNode::CData(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Give this element, and every descendant in the same namespace, the
    /// prefix used by the parent it is about to be inserted under.
    pub fn adopt_prefix(&mut self, prefix: Option<&str>) {
        let namespace = self.namespace.clone();
        self.apply_prefix(namespace.as_deref(), prefix);
    }

    fn apply_prefix(&mut self, namespace: Option<&str>, prefix: Option<&str>) {
        if self.namespace.as_deref() == namespace {
            self.prefix = prefix.map(str::to_string);
        }
        for child in self.elements_mut() {
            child.apply_prefix(namespace, prefix);
        }
    }
}

/// A parsed or freshly built workflow document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    root: Element,
}

impl Document {
    pub fn new(root: Element) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NS: Option<&str> = Some("urn:test");

    #[test]
    fn set_attribute_overwrites_in_place() {
        let mut element = Element::new("Setting")
            .with_attribute("name", "a")
            .with_attribute("value", "1");
        element.set_attribute("name", "b");
        element.set_attribute("extra", "x");

        let names: Vec<_> = element.attributes().iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["name", "value", "extra"]);
        assert_eq!(element.attribute("name"), Some("b"));
    }

    #[test]
    fn queries_respect_namespace() {
        let root = Element::new_ns(NS, "Workflow")
            .with_child(Element::new("Settings"))
            .with_child(Element::new_ns(NS, "Settings"));

        assert_eq!(root.children_named(NS, "Settings").count(), 1);
        assert_eq!(root.children_named(None, "Settings").count(), 1);
    }

    #[test]
    fn remove_children_keeps_other_nodes() {
        let mut tasks = Element::new_ns(NS, "Tasks");
        tasks.push_child(Element::new_ns(NS, "Task"));
        tasks.push_node(XmlNode::Comment("keep".into()));
        tasks.push_child(Element::new_ns(NS, "Task"));

        assert_eq!(tasks.remove_children_named(NS, "Task"), 2);
        assert_eq!(tasks.nodes(), &[XmlNode::Comment("keep".into())]);
    }

    #[test]
    fn adopt_prefix_only_touches_same_namespace() {
        let mut task = Element::new_ns(NS, "Task")
            .with_child(Element::new_ns(NS, "Setting"))
            .with_child(Element::new("Foreign"));
        task.adopt_prefix(Some("wf"));

        assert_eq!(task.qualified_name(), "wf:Task");
        let names: Vec<_> = task.elements().map(Element::qualified_name).collect();
        assert_eq!(names, ["wf:Setting", "Foreign"]);
    }
}
