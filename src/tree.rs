//! In-memory XML element tree.
//!
//! The whole document is loaded at once into an owned tree of [`Element`]s.
//! Each element remembers where its start tag sits in the source so that
//! extraction failures can point at the offending record.

use crate::decode::decode_xml_bytes;
use crate::error::{Error, Result};
use quick_xml::events::Event;

/// An XML element with its text content and ordered children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    /// Tag name exactly as written in the document (prefix included)
    pub name: String,

    /// Character data between the start tag and the first child element,
    /// if any
    pub text: Option<String>,

    /// Child elements in document order
    pub children: Vec<Element>,

    /// Byte offset of the start tag
    pub position: u64,

    /// 1-based line of the start tag
    pub line: usize,
}

impl Element {
    /// Create a new element with no text or children.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            line: 1,
            ..Default::default()
        }
    }

    /// Set the text content (builder style).
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Append a child element (builder style).
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Parse a document from bytes, detecting UTF-8/UTF-16 encodings.
    ///
    /// Returns the root element.
    pub fn parse_bytes(data: &[u8]) -> Result<Element> {
        let text = decode_xml_bytes(data)?;
        Self::parse_str(&text)
    }

    /// Parse a document from a string and return its root element.
    ///
    /// # Example
    ///
    /// ```
    /// use ecucsheet::tree::Element;
    ///
    /// let root = Element::parse_str("<A><B>text</B></A>")?;
    /// assert_eq!(root.name, "A");
    /// assert_eq!(root.children[0].text.as_deref(), Some("text"));
    /// # Ok::<(), ecucsheet::Error>(())
    /// ```
    pub fn parse_str(xml: &str) -> Result<Element> {
        TreeBuilder::new(xml).build()
    }

    /// Iterate over all descendants in document order (depth-first,
    /// pre-order), excluding `self`.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: vec![self.children.iter()],
        }
    }

    /// Find the first descendant with the given tag name, in document order.
    ///
    /// The search is not limited to direct children.
    pub fn find_descendant(&self, name: &str) -> Option<&Element> {
        self.descendants().find(|e| e.name == name)
    }

    /// Find every element named `child` whose parent is named `parent`,
    /// with the parent located anywhere below `self`.
    ///
    /// `self` is never a candidate parent. Parents are visited in document
    /// order and each parent's matching children are yielded in order.
    pub fn find_all_under(&self, parent: &str, child: &str) -> Vec<&Element> {
        self.descendants()
            .filter(|e| e.name == parent)
            .flat_map(|p| p.children.iter().filter(|c| c.name == child))
            .collect()
    }

    /// Text content, or the empty string when the element has none.
    pub fn text_or_empty(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }
}

/// Depth-first iterator over the descendants of an [`Element`].
pub struct Descendants<'a> {
    stack: Vec<std::slice::Iter<'a, Element>>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let iter = self.stack.last_mut()?;
            match iter.next() {
                Some(element) => {
                    if !element.children.is_empty() {
                        self.stack.push(element.children.iter());
                    }
                    return Some(element);
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

/// Event-driven builder turning quick-xml events into an element tree.
struct TreeBuilder<'x> {
    source: &'x str,
    reader: quick_xml::Reader<&'x [u8]>,
    open: Vec<Element>,
    root: Option<Element>,
    line: usize,
    line_scanned_to: usize,
}

impl<'x> TreeBuilder<'x> {
    fn new(source: &'x str) -> Self {
        let mut reader = quick_xml::Reader::from_str(source);
        reader.config_mut().check_end_names = true;
        Self {
            source,
            reader,
            open: Vec::new(),
            root: None,
            line: 1,
            line_scanned_to: 0,
        }
    }

    /// Line number of a byte offset. Offsets must be queried in
    /// non-decreasing order.
    fn line_at(&mut self, offset: usize) -> usize {
        let offset = offset.min(self.source.len());
        if offset > self.line_scanned_to {
            self.line += self.source.as_bytes()[self.line_scanned_to..offset]
                .iter()
                .filter(|&&b| b == b'\n')
                .count();
            self.line_scanned_to = offset;
        }
        self.line
    }

    fn error_at(&mut self, offset: u64, message: impl Into<String>) -> Error {
        let line = self.line_at(offset as usize);
        Error::Parse {
            line,
            position: offset,
            message: message.into(),
        }
    }

    fn build(mut self) -> Result<Element> {
        let mut buf = Vec::new();

        loop {
            let before = self.reader.buffer_position();
            let event = match self.reader.read_event_into(&mut buf) {
                Ok(event) => event,
                Err(e) => {
                    let offset = self.reader.error_position();
                    return Err(self.error_at(offset, e.to_string()));
                }
            };

            match event {
                Event::Start(e) => {
                    let element = self.start_element(before, e.name().as_ref())?;
                    self.open.push(element);
                }
                Event::Empty(e) => {
                    let element = self.start_element(before, e.name().as_ref())?;
                    self.close_element(element, before)?;
                }
                Event::End(_) => match self.open.pop() {
                    Some(element) => self.close_element(element, before)?,
                    None => return Err(self.error_at(before, "unexpected closing tag")),
                },
                Event::Text(e) => {
                    let text = match e.unescape() {
                        Ok(text) => text.into_owned(),
                        Err(err) => return Err(self.error_at(before, err.to_string())),
                    };
                    self.append_text(before, &text)?;
                }
                Event::CData(e) => {
                    let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                    self.append_text(before, &text)?;
                }
                Event::Eof => break,
                // Declarations, comments, processing instructions and
                // doctypes carry no configuration data
                _ => {}
            }
            buf.clear();
        }

        if let Some(unclosed) = self.open.last() {
            let message = format!("element <{}> is never closed", unclosed.name);
            let end = self.source.len() as u64;
            return Err(self.error_at(end, message));
        }

        match self.root.take() {
            Some(root) => Ok(root),
            None => {
                let end = self.source.len() as u64;
                Err(self.error_at(end, "document has no root element"))
            }
        }
    }

    fn start_element(&mut self, before: u64, raw_name: &[u8]) -> Result<Element> {
        // The tag begins at the first '<' after the previous event
        let start = self.source.as_bytes()[before as usize..]
            .iter()
            .position(|&b| b == b'<')
            .map(|i| before + i as u64)
            .unwrap_or(before);

        if self.open.is_empty() && self.root.is_some() {
            return Err(self.error_at(start, "document has more than one root element"));
        }

        let line = self.line_at(start as usize);
        Ok(Element {
            name: String::from_utf8_lossy(raw_name).into_owned(),
            text: None,
            children: Vec::new(),
            position: start,
            line,
        })
    }

    fn close_element(&mut self, element: Element, at: u64) -> Result<()> {
        match self.open.last_mut() {
            Some(parent) => {
                parent.children.push(element);
                Ok(())
            }
            None if self.root.is_none() => {
                self.root = Some(element);
                Ok(())
            }
            None => Err(self.error_at(at, "document has more than one root element")),
        }
    }

    fn append_text(&mut self, at: u64, text: &str) -> Result<()> {
        match self.open.last_mut() {
            // Text after a child element belongs to that child's tail
            Some(element) if !element.children.is_empty() => Ok(()),
            Some(element) => {
                element.text.get_or_insert_with(String::new).push_str(text);
                Ok(())
            }
            None if text.trim().is_empty() => Ok(()),
            None => {
                let offset = at + (text.len() - text.trim_start().len()) as u64;
                Err(self.error_at(offset, "text content outside of the root element"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested() {
        let root = Element::parse_str(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<ROOT>
  <A><B>one</B></A>
  <C/>
</ROOT>"#,
        )
        .unwrap();

        assert_eq!(root.name, "ROOT");
        assert_eq!(root.line, 2);
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.children[0].children[0].text.as_deref(), Some("one"));
        assert_eq!(root.children[1].name, "C");
        assert_eq!(root.children[1].line, 4);
        assert!(root.children[1].text.is_none());
    }

    #[test]
    fn test_start_tag_position() {
        let xml = "<R>\n  <X>v</X></R>";
        let root = Element::parse_str(xml).unwrap();
        let x = &root.children[0];
        assert_eq!(x.position, 6);
        assert_eq!(&xml[x.position as usize..x.position as usize + 3], "<X>");
        assert_eq!(x.line, 2);
    }

    #[test]
    fn test_entities_and_cdata() {
        let root = Element::parse_str("<R><A>a &amp; b</A><B><![CDATA[<raw>]]></B></R>").unwrap();
        assert_eq!(root.children[0].text.as_deref(), Some("a & b"));
        assert_eq!(root.children[1].text.as_deref(), Some("<raw>"));
    }

    #[test]
    fn test_descendants_document_order() {
        let root = Element::parse_str("<R><A><B/><C/></A><D><E/></D></R>").unwrap();
        let names: Vec<&str> = root.descendants().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["A", "B", "C", "D", "E"]);
    }

    #[test]
    fn test_find_descendant_is_deep() {
        let root = Element::parse_str("<R><A><B><TARGET>deep</TARGET></B></A><TARGET>late</TARGET></R>")
            .unwrap();
        let found = root.find_descendant("TARGET").unwrap();
        assert_eq!(found.text.as_deref(), Some("deep"));
        assert!(root.find_descendant("R").is_none());
    }

    #[test]
    fn test_find_all_under_matches_direct_children_of_any_parent() {
        let root = Element::parse_str(
            "<R><P><X>1</X><Y/><X>2</X></P><Q><P><X>3</X></P></Q><X>not</X></R>",
        )
        .unwrap();
        let found: Vec<&str> = root
            .find_all_under("P", "X")
            .iter()
            .map(|e| e.text_or_empty())
            .collect();
        assert_eq!(found, ["1", "2", "3"]);
    }

    #[test]
    fn test_find_all_under_skips_self() {
        let root = Element::parse_str("<P><X>1</X><Q><P><X>2</X></P></Q></P>").unwrap();
        let found: Vec<&str> = root
            .find_all_under("P", "X")
            .iter()
            .map(|e| e.text_or_empty())
            .collect();
        assert_eq!(found, ["2"]);
    }

    #[test]
    fn test_text_stops_at_first_child() {
        let root = Element::parse_str("<R>A<X/>B<Y>inner</Y>C</R>").unwrap();
        assert_eq!(root.text.as_deref(), Some("A"));
        assert_eq!(root.children[1].text.as_deref(), Some("inner"));

        let root = Element::parse_str("<R><X/>tail</R>").unwrap();
        assert!(root.text.is_none());
    }

    #[test]
    fn test_malformed_xml() {
        let err = Element::parse_str("<R><A></B></R>").unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_unclosed_element() {
        let err = Element::parse_str("<R>\n<A>").unwrap_err();
        match err {
            Error::Parse { message, .. } => assert!(message.contains("<A>")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_not_xml() {
        let err = Element::parse_str("this is plain text").unwrap_err();
        assert!(matches!(err, Error::Parse { line: 1, .. }));
    }

    #[test]
    fn test_empty_document() {
        let err = Element::parse_str("  \n").unwrap_err();
        match err {
            Error::Parse { message, .. } => assert!(message.contains("no root")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_multiple_roots() {
        let err = Element::parse_str("<A/><B/>").unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_builder() {
        let root = Element::new("R").with_child(Element::new("A").with_text("x"));
        assert_eq!(root.find_descendant("A").unwrap().text_or_empty(), "x");
    }
}
