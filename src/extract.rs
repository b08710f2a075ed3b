//! Container extraction from ECU configuration documents.
//!
//! An ECU configuration description lists module configurations whose
//! `CONTAINERS` element holds `ECUC-CONTAINER-VALUE` entries; each of those
//! may in turn hold further entries below a `SUB-CONTAINERS` element.
//!
//! ```xml
//! <ECUC-MODULE-CONFIGURATION-VALUES>
//!   <SHORT-NAME>EcuC</SHORT-NAME>
//!   <CONTAINERS>
//!     <ECUC-CONTAINER-VALUE>
//!       <SHORT-NAME>EcucGeneral</SHORT-NAME>
//!       <DEFINITION-REF DEST="ECUC-PARAM-CONF-CONTAINER-DEF">/AUTOSAR/EcuC/EcucGeneral</DEFINITION-REF>
//!       <SUB-CONTAINERS>
//!         <ECUC-CONTAINER-VALUE>...</ECUC-CONTAINER-VALUE>
//!       </SUB-CONTAINERS>
//!     </ECUC-CONTAINER-VALUE>
//!   </CONTAINERS>
//! </ECUC-MODULE-CONFIGURATION-VALUES>
//! ```

use crate::error::{Error, Result};
use crate::tree::Element;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Tag of a container entry.
pub const CONTAINER_VALUE_TAG: &str = "ECUC-CONTAINER-VALUE";
/// Tag holding a container's identifier.
pub const SHORT_NAME_TAG: &str = "SHORT-NAME";
/// Tag holding a container's definition reference.
pub const DEFINITION_REF_TAG: &str = "DEFINITION-REF";

/// The two categories of extracted containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContainerKind {
    /// `ECUC-CONTAINER-VALUE` directly below `CONTAINERS`
    Container,
    /// `ECUC-CONTAINER-VALUE` directly below `SUB-CONTAINERS`
    SubContainer,
}

impl ContainerKind {
    /// Both kinds, in output order.
    pub const ALL: [ContainerKind; 2] = [ContainerKind::Container, ContainerKind::SubContainer];

    /// Tag of the element the container values are listed under.
    pub fn parent_tag(self) -> &'static str {
        match self {
            ContainerKind::Container => "CONTAINERS",
            ContainerKind::SubContainer => "SUB-CONTAINERS",
        }
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerKind::Container => f.write_str("container"),
            ContainerKind::SubContainer => f.write_str("sub-container"),
        }
    }
}

/// One extracted container: its short name and definition reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerRecord {
    /// Text of the first `SHORT-NAME` below the container
    pub name: String,
    /// Text of the first `DEFINITION-REF` below the container
    pub reference: String,
}

impl ContainerRecord {
    /// Create a new record.
    pub fn new(name: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reference: reference.into(),
        }
    }

    /// Build a record from a matched container element.
    ///
    /// Both fields are taken from the first matching descendant in document
    /// order, at any depth. `index` is only used for error reporting.
    fn from_element(element: &Element, kind: ContainerKind, index: usize) -> Result<Self> {
        let field = |tag: &'static str| {
            element
                .find_descendant(tag)
                .map(|e| e.text_or_empty().to_string())
                .ok_or_else(|| Error::MissingField {
                    kind,
                    index,
                    field: tag,
                    line: element.line,
                    position: element.position,
                })
        };

        Ok(Self {
            name: field(SHORT_NAME_TAG)?,
            reference: field(DEFINITION_REF_TAG)?,
        })
    }
}

/// Containers and sub-containers found in a document, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Entries below `CONTAINERS`
    pub containers: Vec<ContainerRecord>,
    /// Entries below `SUB-CONTAINERS`
    pub sub_containers: Vec<ContainerRecord>,
}

impl ExtractionResult {
    /// Records of one category.
    pub fn records(&self, kind: ContainerKind) -> &[ContainerRecord] {
        match kind {
            ContainerKind::Container => &self.containers,
            ContainerKind::SubContainer => &self.sub_containers,
        }
    }

    /// Total number of records across both categories.
    pub fn len(&self) -> usize {
        self.containers.len() + self.sub_containers.len()
    }

    /// Check if nothing was extracted.
    pub fn is_empty(&self) -> bool {
        self.containers.is_empty() && self.sub_containers.is_empty()
    }
}

/// Extract containers and sub-containers from a parsed document.
///
/// Fails on the first container lacking a `SHORT-NAME` or `DEFINITION-REF`
/// descendant; no partial result is returned.
pub fn extract(root: &Element) -> Result<ExtractionResult> {
    Ok(ExtractionResult {
        containers: collect(root, ContainerKind::Container)?,
        sub_containers: collect(root, ContainerKind::SubContainer)?,
    })
}

fn collect(root: &Element, kind: ContainerKind) -> Result<Vec<ContainerRecord>> {
    root.find_all_under(kind.parent_tag(), CONTAINER_VALUE_TAG)
        .into_iter()
        .enumerate()
        .map(|(index, element)| ContainerRecord::from_element(element, kind, index))
        .collect()
}

/// Parse a document from a string and extract its containers.
///
/// # Example
///
/// ```
/// use ecucsheet::extract::extract_str;
///
/// let result = extract_str(
///     "<AR><CONTAINERS><ECUC-CONTAINER-VALUE>\
///        <SHORT-NAME>EcuC</SHORT-NAME>\
///        <DEFINITION-REF>/AUTOSAR/EcuC/EcucDef</DEFINITION-REF>\
///      </ECUC-CONTAINER-VALUE></CONTAINERS></AR>",
/// )?;
/// assert_eq!(result.containers[0].name, "EcuC");
/// assert!(result.sub_containers.is_empty());
/// # Ok::<(), ecucsheet::Error>(())
/// ```
pub fn extract_str(xml: &str) -> Result<ExtractionResult> {
    let root = Element::parse_str(xml)?;
    extract(&root)
}

/// Parse a document from bytes and extract its containers.
pub fn extract_bytes(data: &[u8]) -> Result<ExtractionResult> {
    let root = Element::parse_bytes(data)?;
    extract(&root)
}

/// Read a document file and extract its containers.
pub fn extract_file(path: impl AsRef<Path>) -> Result<ExtractionResult> {
    let data = std::fs::read(path.as_ref())?;
    extract_bytes(&data)
}
