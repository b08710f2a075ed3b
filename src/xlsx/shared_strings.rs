//! XLSX shared strings table, for reading and for writing.

use crate::error::{Error, Result};
use quick_xml::escape::escape;
use std::collections::HashMap;
use std::fmt::Write as FmtWrite;

/// Shared strings table read from `xl/sharedStrings.xml`.
#[derive(Debug, Clone, Default)]
pub struct SharedStrings {
    /// All strings in order
    strings: Vec<String>,
}

impl SharedStrings {
    /// Parse shared strings from XML content.
    ///
    /// Text is taken verbatim; rich text runs inside one `<si>` are
    /// concatenated.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut strings = Vec::new();
        let mut reader = quick_xml::Reader::from_str(xml);

        let mut buf = Vec::new();
        let mut in_si = false;
        let mut in_t = false;
        let mut current_text = String::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(quick_xml::events::Event::Start(e)) => match e.name().as_ref() {
                    b"si" => {
                        in_si = true;
                        current_text.clear();
                    }
                    b"t" if in_si => {
                        in_t = true;
                    }
                    _ => {}
                },
                Ok(quick_xml::events::Event::Empty(e)) => {
                    // <si/> denotes the empty string
                    if e.name().as_ref() == b"si" {
                        strings.push(String::new());
                    }
                }
                Ok(quick_xml::events::Event::Text(e)) => {
                    if in_t {
                        let text = e.unescape().map_err(|e| Error::XmlParse(e.to_string()))?;
                        current_text.push_str(&text);
                    }
                }
                Ok(quick_xml::events::Event::End(e)) => match e.name().as_ref() {
                    b"si" => {
                        strings.push(std::mem::take(&mut current_text));
                        in_si = false;
                    }
                    b"t" => {
                        in_t = false;
                    }
                    _ => {}
                },
                Ok(quick_xml::events::Event::Eof) => break,
                Err(e) => return Err(Error::XmlParse(e.to_string())),
                _ => {}
            }
            buf.clear();
        }

        Ok(Self { strings })
    }

    /// Get a string by index.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.strings.get(index).map(|s| s.as_str())
    }

    /// Get the count of shared strings.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

/// Shared strings table under construction.
///
/// Every distinct cell text is stored once; cells refer to it by index.
#[derive(Debug, Default)]
pub struct SharedStringsBuilder {
    strings: Vec<String>,
    index: HashMap<String, usize>,
    /// Number of cell references, duplicates included
    references: usize,
}

impl SharedStringsBuilder {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a string and return its index.
    pub fn add(&mut self, s: &str) -> usize {
        self.references += 1;
        if let Some(&idx) = self.index.get(s) {
            return idx;
        }
        let idx = self.strings.len();
        self.strings.push(s.to_string());
        self.index.insert(s.to_string(), idx);
        idx
    }

    /// Number of unique strings.
    pub fn unique_count(&self) -> usize {
        self.strings.len()
    }

    /// Serialize to `xl/sharedStrings.xml` content.
    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(128 + self.strings.len() * 32);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        // Writing into a String cannot fail
        let _ = write!(
            xml,
            r#"<sst xmlns="{}" count="{}" uniqueCount="{}">"#,
            super::SPREADSHEETML_NS,
            self.references,
            self.strings.len()
        );

        for s in &self.strings {
            if s.trim() != s.as_str() {
                let _ = write!(xml, r#"<si><t xml:space="preserve">{}</t></si>"#, escape(s.as_str()));
            } else {
                let _ = write!(xml, "<si><t>{}</t></si>", escape(s.as_str()));
            }
        }

        xml.push_str("</sst>");
        xml
    }
}
