use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;

use crate::parser::{ParseError, ParseErrorKind};

/// Namespace of the flowchart payload elements.
pub const CHART_NS: &str = "http://schemas.datacontract.org/2004/07/raptor";
/// XML Schema instance namespace, used for `type` and `nil` attributes.
pub const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// One element of a FlowXML document with its namespace resolved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    pub name: String,
    pub namespace: Option<String>,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Element>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub namespace: Option<String>,
    pub value: String,
}

fn xml_error(detail: impl Into<String>) -> ParseError {
    ParseError::new(ParseErrorKind::XmlStructure(detail.into()))
}

impl Element {
    /// Read a document into an element tree.
    pub fn parse(document: &str) -> Result<Element, ParseError> {
        let mut reader = NsReader::from_str(document);
        reader.config_mut().trim_text(true);

        // index 0 is a virtual root so the loop never pops an empty stack
        let mut stack: Vec<Element> = vec![Element::default()];

        loop {
            match reader.read_event() {
                Err(e) => return Err(xml_error(format!("XML parse error: {e}"))),
                Ok(Event::Start(start)) => {
                    let element = read_element(&reader, &start)?;
                    stack.push(element);
                }
                Ok(Event::Empty(start)) => {
                    let element = read_element(&reader, &start)?;
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(element);
                    }
                }
                Ok(Event::End(_)) => {
                    let Some(element) = stack.pop() else {
                        return Err(xml_error("unbalanced element nesting"));
                    };
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(element),
                        None => return Err(xml_error("unbalanced element nesting")),
                    }
                }
                Ok(Event::Text(text)) => {
                    let text = text
                        .unescape()
                        .map_err(|e| xml_error(format!("bad character data: {e}")))?;
                    if let Some(top) = stack.last_mut() {
                        top.text.push_str(&text);
                    }
                }
                Ok(Event::CData(data)) => {
                    if let Some(top) = stack.last_mut() {
                        top.text
                            .push_str(&String::from_utf8_lossy(&data.into_inner()));
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
            }
        }

        let Some(root) = stack.pop() else {
            return Err(xml_error("unbalanced element nesting"));
        };
        root.children
            .into_iter()
            .next()
            .ok_or_else(|| xml_error("document contains no root element"))
    }

    /// Find a direct child, preferring an exact namespace match and falling
    /// back to the local name alone.
    pub fn find(&self, tag: &str) -> Option<&Element> {
        self.children
            .iter()
            .find(|child| child.name == tag && child.namespace.as_deref() == Some(CHART_NS))
            .or_else(|| self.children.iter().find(|child| child.name == tag))
    }

    /// Depth-first search over this element and everything below it.
    pub fn find_descendant(&self, tag: &str) -> Option<&Element> {
        if self.name == tag {
            return Some(self);
        }
        self.children
            .iter()
            .find_map(|child| child.find_descendant(tag))
    }

    pub fn attribute(&self, namespace: &str, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name == name && attr.namespace.as_deref() == Some(namespace))
            .or_else(|| self.attributes.iter().find(|attr| attr.name == name))
            .map(|attr| attr.value.as_str())
    }

    /// Text content of a child element, or `default` when the child is
    /// missing or empty.
    pub fn text_of(&self, tag: &str, default: &str) -> String {
        self.find(tag)
            .map(|child| child.text.as_str())
            .filter(|text| !text.is_empty())
            .unwrap_or(default)
            .to_owned()
    }

    /// The flowchart node kind: the `i:type` attribute when present (with
    /// any namespace prefix stripped), otherwise the element's local name.
    pub fn node_type(&self) -> String {
        if let Some(type_attr) = self.attribute(XSI_NS, "type") {
            return type_attr
                .rsplit(':')
                .next()
                .unwrap_or(type_attr)
                .to_owned();
        }
        self.name.clone()
    }

    pub fn is_nil(&self) -> bool {
        self.attribute(XSI_NS, "nil") == Some("true")
    }

    /// Resolve a link container to the component it points at: the container
    /// itself when it is typed, otherwise its first child element.
    pub fn component(&self) -> Option<&Element> {
        if self.attribute(XSI_NS, "type").is_some() {
            return Some(self);
        }
        self.children.first()
    }
}

fn namespace_string(resolve: ResolveResult) -> Option<String> {
    match resolve {
        ResolveResult::Bound(Namespace(ns)) => Some(String::from_utf8_lossy(ns).into_owned()),
        _ => None,
    }
}

fn read_element(reader: &NsReader<&[u8]>, start: &BytesStart) -> Result<Element, ParseError> {
    let (resolve, local) = reader.resolve_element(start.name());
    let name = String::from_utf8_lossy(local.as_ref()).into_owned();
    let namespace = namespace_string(resolve);

    let mut attributes = vec![];
    for attribute in start.attributes() {
        let attribute =
            attribute.map_err(|e| xml_error(format!("bad attribute on <{name}>: {e}")))?;

        let key = attribute.key.as_ref();
        if key == b"xmlns" || key.starts_with(b"xmlns:") {
            continue;
        }

        let (attr_resolve, attr_local) = reader.resolve_attribute(attribute.key);
        let value = attribute
            .unescape_value()
            .map_err(|e| xml_error(format!("bad attribute on <{name}>: {e}")))?
            .into_owned();

        attributes.push(Attribute {
            name: String::from_utf8_lossy(attr_local.as_ref()).into_owned(),
            namespace: namespace_string(attr_resolve),
            value,
        });
    }

    Ok(Element {
        name,
        namespace,
        attributes,
        children: vec![],
        text: String::new(),
    })
}
