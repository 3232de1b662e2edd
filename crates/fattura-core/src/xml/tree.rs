//! Minimal owned element tree built from quick-xml events.

use std::collections::HashSet;

use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::Event;

use crate::error::XmlError;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Deepest element nesting accepted by [`XmlElement::parse`].
pub const MAX_DEPTH: usize = 256;

/// An XML element with its text and child elements.
///
/// Attributes, comments and processing instructions are dropped; only the
/// element structure and text content are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    name: String,
    text: Option<String>,
    children: Vec<XmlElement>,
}

impl XmlElement {
    /// Parse a complete document and return its root element.
    ///
    /// Text is decoded with the encoding named in the XML declaration,
    /// UTF-8 when there is none.
    pub fn parse(bytes: &[u8]) -> Result<Self, XmlError> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        let mut reader = Reader::from_reader(bytes);

        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            let event = reader.read_event().map_err(|e| XmlError::Malformed {
                position: reader.error_position() as u64,
                message: e.to_string(),
            })?;

            match event {
                Event::Start(ref e) => {
                    let name = decode(&reader, e.name().as_ref())?;
                    if stack.is_empty() && root.is_some() {
                        return Err(junk_after_root(&reader, &name));
                    }
                    if stack.len() >= MAX_DEPTH {
                        return Err(XmlError::TooDeep(MAX_DEPTH));
                    }
                    stack.push(XmlElement::named(name));
                }
                Event::Empty(ref e) => {
                    let name = decode(&reader, e.name().as_ref())?;
                    if stack.is_empty() && root.is_some() {
                        return Err(junk_after_root(&reader, &name));
                    }
                    attach(&mut stack, &mut root, XmlElement::named(name));
                }
                Event::End(_) => {
                    let element = stack.pop().ok_or_else(|| XmlError::Malformed {
                        position: reader.buffer_position() as u64,
                        message: "end tag without matching start tag".to_string(),
                    })?;
                    attach(&mut stack, &mut root, element);
                }
                Event::Text(ref e) => {
                    let raw = decode(&reader, &**e)?;
                    let text = unescape(&raw).map_err(|err| XmlError::Malformed {
                        position: reader.buffer_position() as u64,
                        message: err.to_string(),
                    })?;
                    push_text(&mut stack, &reader, &text)?;
                }
                Event::CData(ref e) => {
                    let text = decode(&reader, &**e)?;
                    push_text(&mut stack, &reader, &text)?;
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = stack.pop() {
            return Err(XmlError::Unclosed(open.name));
        }

        root.ok_or(XmlError::NoRoot)
    }

    /// Parse from a string slice.
    pub fn parse_str(xml: &str) -> Result<Self, XmlError> {
        Self::parse(xml.as_bytes())
    }

    fn named(name: String) -> Self {
        Self {
            name,
            text: None,
            children: Vec::new(),
        }
    }

    /// Qualified name as written in the document.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name with any namespace prefix or `{uri}` qualifier removed.
    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }

    /// Text content before the first child element.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn children(&self) -> &[XmlElement] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// First descendant matching a slash-separated path of local names.
    ///
    /// Each step may match at any depth below the previous one, so
    /// `find("Body/Line")` behaves like the XPath `.//Body//Line`.
    pub fn find(&self, path: &str) -> Option<&XmlElement> {
        self.find_all(path).into_iter().next()
    }

    /// All descendants matching `path`, in document order.
    pub fn find_all(&self, path: &str) -> Vec<&XmlElement> {
        let mut current: Vec<&XmlElement> = vec![self];

        for step in path.split('/').filter(|s| !s.is_empty()) {
            let mut next: Vec<&XmlElement> = Vec::new();
            let mut seen: HashSet<*const XmlElement> = HashSet::new();
            for element in current {
                for child in &element.children {
                    child.collect_named(step, &mut next, &mut seen);
                }
            }
            current = next;
        }

        current
    }

    fn collect_named<'a>(
        &'a self,
        local: &str,
        out: &mut Vec<&'a XmlElement>,
        seen: &mut HashSet<*const XmlElement>,
    ) {
        // Nested matches reach the same element from several ancestors.
        if self.local_name() == local && seen.insert(self as *const XmlElement) {
            out.push(self);
        }
        for child in &self.children {
            child.collect_named(local, out, seen);
        }
    }
}

/// Strip a `prefix:` or `{uri}` qualifier from an element name.
pub fn local_name(name: &str) -> &str {
    let name = name.rsplit('}').next().unwrap_or(name);
    name.rsplit(':').next().unwrap_or(name)
}

fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => *root = Some(element),
    }
}

fn push_text(stack: &mut [XmlElement], reader: &Reader<&[u8]>, text: &str) -> Result<(), XmlError> {
    match stack.last_mut() {
        // Text after the first child is tail text and is not kept.
        Some(current) if current.children.is_empty() => {
            current.text.get_or_insert_with(String::new).push_str(text);
            Ok(())
        }
        Some(_) => Ok(()),
        None if text.trim().is_empty() => Ok(()),
        None => Err(XmlError::Malformed {
            position: reader.buffer_position() as u64,
            message: "text outside of the root element".to_string(),
        }),
    }
}

fn decode(reader: &Reader<&[u8]>, bytes: &[u8]) -> Result<String, XmlError> {
    reader
        .decoder()
        .decode(bytes)
        .map(|text| text.into_owned())
        .map_err(|e| XmlError::Encoding(e.to_string()))
}

fn junk_after_root(reader: &Reader<&[u8]>, name: &str) -> XmlError {
    XmlError::Malformed {
        position: reader.buffer_position() as u64,
        message: format!("element <{}> after the root element", name),
    }
}
