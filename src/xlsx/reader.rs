//! XLSX reader implementation.

use crate::container::OoxmlContainer;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use super::column_index;
use super::shared_strings::SharedStrings;

/// Sheet info from workbook.xml.
#[derive(Debug, Clone)]
struct SheetInfo {
    name: String,
    rel_id: String,
}

/// A worksheet's name and cell values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetData {
    /// Sheet name as shown on its tab
    pub name: String,
    /// Rows of cell text, first row first
    pub rows: Vec<Vec<String>>,
}

/// Reader for XLSX workbooks.
#[derive(Debug)]
pub struct WorkbookReader {
    container: OoxmlContainer,
    shared_strings: SharedStrings,
    sheets: Vec<SheetInfo>,
    relationships: HashMap<String, String>,
}

impl WorkbookReader {
    /// Open an XLSX file for reading.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let container = OoxmlContainer::open(path)?;
        Self::from_container(container)
    }

    /// Create a reader from bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let container = OoxmlContainer::from_bytes(data)?;
        Self::from_container(container)
    }

    fn from_container(container: OoxmlContainer) -> Result<Self> {
        // A workbook without any text cells has no shared strings part
        let shared_strings = if container.exists("xl/sharedStrings.xml") {
            SharedStrings::parse(&container.read_xml("xl/sharedStrings.xml")?)?
        } else {
            SharedStrings::default()
        };

        let relationships = Self::parse_workbook_rels(&container)?;
        let sheets = Self::parse_workbook(&container)?;

        Ok(Self {
            container,
            shared_strings,
            sheets,
            relationships,
        })
    }

    /// Parse workbook relationships: relationship id → target.
    fn parse_workbook_rels(container: &OoxmlContainer) -> Result<HashMap<String, String>> {
        let mut rels = HashMap::new();

        let xml = container.read_xml("xl/_rels/workbook.xml.rels")?;
        let mut reader = quick_xml::Reader::from_str(&xml);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(quick_xml::events::Event::Empty(e))
                | Ok(quick_xml::events::Event::Start(e)) => {
                    if e.name().as_ref() == b"Relationship" {
                        let mut id = String::new();
                        let mut target = String::new();

                        for attr in e.attributes().flatten() {
                            match attr.key.as_ref() {
                                b"Id" => {
                                    id = String::from_utf8_lossy(&attr.value).to_string();
                                }
                                b"Target" => {
                                    target = String::from_utf8_lossy(&attr.value).to_string();
                                }
                                _ => {}
                            }
                        }

                        if !id.is_empty() && !target.is_empty() {
                            rels.insert(id, target);
                        }
                    }
                }
                Ok(quick_xml::events::Event::Eof) => break,
                Err(e) => return Err(Error::XmlParse(e.to_string())),
                _ => {}
            }
            buf.clear();
        }

        Ok(rels)
    }

    /// Parse workbook.xml for sheet names and relationship ids, in tab order.
    fn parse_workbook(container: &OoxmlContainer) -> Result<Vec<SheetInfo>> {
        let mut sheets = Vec::new();

        let xml = container.read_xml("xl/workbook.xml")?;
        let mut reader = quick_xml::Reader::from_str(&xml);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(quick_xml::events::Event::Empty(e))
                | Ok(quick_xml::events::Event::Start(e)) => {
                    if e.name().as_ref() == b"sheet" {
                        let mut name = String::new();
                        let mut rel_id = String::new();

                        for attr in e.attributes().flatten() {
                            match attr.key.as_ref() {
                                b"name" => {
                                    name = attr
                                        .unescape_value()
                                        .map(|v| v.into_owned())
                                        .unwrap_or_else(|_| {
                                            String::from_utf8_lossy(&attr.value).to_string()
                                        });
                                }
                                b"r:id" => {
                                    rel_id = String::from_utf8_lossy(&attr.value).to_string();
                                }
                                _ => {}
                            }
                        }

                        if !name.is_empty() {
                            sheets.push(SheetInfo { name, rel_id });
                        }
                    }
                }
                Ok(quick_xml::events::Event::Eof) => break,
                Err(e) => return Err(Error::XmlParse(e.to_string())),
                _ => {}
            }
            buf.clear();
        }

        Ok(sheets)
    }

    /// Get the number of sheets.
    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// Get sheet names in tab order.
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    /// Read one sheet by name.
    pub fn read_sheet(&self, name: &str) -> Result<SheetData> {
        let info = self
            .sheets
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| Error::MissingComponent(format!("sheet {:?}", name)))?;
        self.load_sheet(info)
    }

    /// Read every sheet in tab order.
    pub fn read_all(&self) -> Result<Vec<SheetData>> {
        self.sheets.iter().map(|info| self.load_sheet(info)).collect()
    }

    fn load_sheet(&self, info: &SheetInfo) -> Result<SheetData> {
        let target = self
            .relationships
            .get(&info.rel_id)
            .ok_or_else(|| Error::MissingComponent(format!("relationship {}", info.rel_id)))?;

        let sheet_path = match target.strip_prefix('/') {
            Some(absolute) => absolute.to_string(),
            None => format!("xl/{}", target),
        };

        let xml = self.container.read_xml(&sheet_path)?;
        Ok(SheetData {
            name: info.name.clone(),
            rows: self.parse_sheet(&xml)?,
        })
    }

    /// Parse a worksheet XML into rows of cell text.
    ///
    /// Cells are placed by their `r` reference when present, so gaps in a
    /// row come back as empty strings.
    fn parse_sheet(&self, xml: &str) -> Result<Vec<Vec<String>>> {
        let mut rows = Vec::new();
        let mut reader = quick_xml::Reader::from_str(xml);

        let mut buf = Vec::new();
        let mut in_row = false;
        let mut in_cell = false;
        let mut in_value = false;
        let mut current_row: Vec<String> = Vec::new();
        let mut current_cell_type: Option<String> = None;
        let mut current_cell_col: Option<usize> = None;
        let mut current_cell_value = String::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(quick_xml::events::Event::Start(ref e)) => match e.name().as_ref() {
                    b"row" => {
                        in_row = true;
                        current_row.clear();
                    }
                    b"c" if in_row => {
                        in_cell = true;
                        current_cell_type = None;
                        current_cell_col = None;
                        current_cell_value.clear();

                        for attr in e.attributes().flatten() {
                            match attr.key.as_ref() {
                                b"t" => {
                                    current_cell_type =
                                        Some(String::from_utf8_lossy(&attr.value).to_string());
                                }
                                b"r" => {
                                    current_cell_col =
                                        column_index(&String::from_utf8_lossy(&attr.value));
                                }
                                _ => {}
                            }
                        }
                    }
                    b"v" | b"t" if in_cell => {
                        in_value = true;
                    }
                    _ => {}
                },
                Ok(quick_xml::events::Event::Text(ref e)) => {
                    if in_value {
                        let text = e.unescape().map_err(|e| Error::XmlParse(e.to_string()))?;
                        current_cell_value.push_str(&text);
                    }
                }
                Ok(quick_xml::events::Event::End(ref e)) => match e.name().as_ref() {
                    b"row" => {
                        if !current_row.is_empty() {
                            rows.push(std::mem::take(&mut current_row));
                        }
                        in_row = false;
                    }
                    b"c" => {
                        let value = self
                            .resolve_cell_value(&current_cell_value, current_cell_type.as_deref());
                        let col = current_cell_col.unwrap_or(current_row.len());
                        if col >= current_row.len() {
                            current_row.resize(col, String::new());
                            current_row.push(value);
                        } else {
                            current_row[col] = value;
                        }
                        in_cell = false;
                    }
                    b"v" | b"t" => {
                        in_value = false;
                    }
                    _ => {}
                },
                Ok(quick_xml::events::Event::Eof) => break,
                Err(e) => return Err(Error::XmlParse(e.to_string())),
                _ => {}
            }
            buf.clear();
        }

        Ok(rows)
    }

    /// Resolve a cell value based on its type.
    fn resolve_cell_value(&self, value: &str, cell_type: Option<&str>) -> String {
        match cell_type {
            Some("s") => match value.trim().parse::<usize>() {
                Ok(idx) => self.shared_strings.get(idx).unwrap_or("").to_string(),
                Err(_) => value.to_string(),
            },
            Some("b") => {
                if value == "1" {
                    "TRUE".to_string()
                } else {
                    "FALSE".to_string()
                }
            }
            Some("e") => format!("#ERROR:{}", value),
            // Inline strings, formula strings, numbers
            _ => value.to_string(),
        }
    }
}
