//! Rendering options configuration.

use crate::extract::ContainerKind;

/// Sheet name and column headers for one record category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetLayout {
    /// Worksheet tab name
    pub sheet_name: String,
    /// Header of the SHORT-NAME column
    pub name_header: String,
    /// Header of the DEFINITION-REF column
    pub reference_header: String,
}

impl SheetLayout {
    /// Create a layout.
    pub fn new(
        sheet_name: impl Into<String>,
        name_header: impl Into<String>,
        reference_header: impl Into<String>,
    ) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            name_header: name_header.into(),
            reference_header: reference_header.into(),
        }
    }

    /// Standard layout for a category.
    pub fn standard(kind: ContainerKind) -> Self {
        match kind {
            ContainerKind::Container => Self::new(
                "Containers",
                "Container SHORT-NAME",
                "Container DEFINITION-REFERENCE",
            ),
            ContainerKind::SubContainer => Self::new(
                "Sub-Containers",
                "Sub-Container SHORT-NAME",
                "Sub-Container DEFINITION-REFERENCE",
            ),
        }
    }

    /// Header row cells.
    pub fn headers(&self) -> [&str; 2] {
        [self.name_header.as_str(), self.reference_header.as_str()]
    }
}

/// Options for rendering extraction results.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Layout of the containers sheet
    pub containers: SheetLayout,

    /// Layout of the sub-containers sheet
    pub sub_containers: SheetLayout,

    /// Render header rows in bold
    pub bold_headers: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            containers: SheetLayout::standard(ContainerKind::Container),
            sub_containers: SheetLayout::standard(ContainerKind::SubContainer),
            bold_headers: true,
        }
    }
}

impl RenderOptions {
    /// Create new default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Layout used for a category.
    pub fn layout(&self, kind: ContainerKind) -> &SheetLayout {
        match kind {
            ContainerKind::Container => &self.containers,
            ContainerKind::SubContainer => &self.sub_containers,
        }
    }

    /// Replace the layout of a category.
    pub fn with_layout(mut self, kind: ContainerKind, layout: SheetLayout) -> Self {
        match kind {
            ContainerKind::Container => self.containers = layout,
            ContainerKind::SubContainer => self.sub_containers = layout,
        }
        self
    }

    /// Rename the sheet of a category, keeping its headers.
    pub fn with_sheet_name(mut self, kind: ContainerKind, name: impl Into<String>) -> Self {
        match kind {
            ContainerKind::Container => self.containers.sheet_name = name.into(),
            ContainerKind::SubContainer => self.sub_containers.sheet_name = name.into(),
        }
        self
    }

    /// Set whether header rows are bold.
    pub fn with_bold_headers(mut self, bold: bool) -> Self {
        self.bold_headers = bold;
        self
    }
}
