//! Workbook renderer: one sheet per record category.

use crate::error::Result;
use crate::extract::{ContainerKind, ExtractionResult};
use crate::xlsx::{Workbook, Worksheet};
use std::path::Path;

use super::options::RenderOptions;

/// Build the report workbook for an extraction result.
///
/// The workbook holds the containers sheet followed by the sub-containers
/// sheet. Each starts with its header row, followed by one row per record
/// in order. An empty category yields a header-only sheet.
pub fn to_workbook(result: &ExtractionResult, options: &RenderOptions) -> Result<Workbook> {
    let mut workbook = Workbook::new().with_bold_headers(options.bold_headers);

    for kind in ContainerKind::ALL {
        let layout = options.layout(kind);
        let sheet = workbook.add_sheet(Worksheet::new(layout.sheet_name.as_str())?)?;
        sheet.push_header(layout.headers());
        for record in result.records(kind) {
            sheet.push_row([record.name.as_str(), record.reference.as_str()]);
        }
    }

    Ok(workbook)
}

/// Render an extraction result and save it as an `.xlsx` file.
///
/// An existing file at `path` is replaced. Nothing is written if the
/// workbook cannot be built.
pub fn write_xlsx(
    result: &ExtractionResult,
    path: impl AsRef<Path>,
    options: &RenderOptions,
) -> Result<()> {
    to_workbook(result, options)?.save(path)
}
