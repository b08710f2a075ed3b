//! # ecucsheet
//!
//! Extract ECU configuration containers from AUTOSAR XML into Excel workbooks.
//!
//! An ECU configuration description (`.arxml`) lists `ECUC-CONTAINER-VALUE`
//! entries below `CONTAINERS` and `SUB-CONTAINERS` elements. This library
//! collects the `SHORT-NAME` and `DEFINITION-REF` of every entry and writes
//! them to a workbook with a "Containers" and a "Sub-Containers" sheet.
//!
//! ## Quick Start
//!
//! ```no_run
//! // Extract and write in one step
//! let result = ecucsheet::convert("EcuC.arxml", "EcuC.xlsx")?;
//! println!("{} containers", result.containers.len());
//!
//! // Or inspect the records first
//! let result = ecucsheet::extract_file("EcuC.arxml")?;
//! for record in &result.sub_containers {
//!     println!("{} -> {}", record.name, record.reference);
//! }
//! # Ok::<(), ecucsheet::Error>(())
//! ```
//!
//! ## Reading a report back
//!
//! ```no_run
//! use ecucsheet::xlsx::WorkbookReader;
//!
//! let reader = WorkbookReader::open("EcuC.xlsx")?;
//! let sheet = reader.read_sheet("Containers")?;
//! println!("{} rows", sheet.rows.len());
//! # Ok::<(), ecucsheet::Error>(())
//! ```

pub mod container;
pub mod decode;
pub mod error;
pub mod extract;
pub mod render;
pub mod tree;
pub mod xlsx;

// Re-exports
pub use error::{Error, Result};
pub use extract::{
    extract, extract_bytes, extract_file, extract_str, ContainerKind, ContainerRecord,
    ExtractionResult,
};
pub use render::{JsonFormat, RenderOptions, SheetLayout};
pub use tree::Element;

use std::path::Path;

/// Extract containers from `input` and write the report workbook to
/// `output`.
///
/// Extraction completes before the output is touched, so a malformed input
/// never leaves a workbook behind.
///
/// # Example
///
/// ```no_run
/// let result = ecucsheet::convert("EcuC.arxml", "EcuC.xlsx")?;
/// assert_eq!(result.len(), result.containers.len() + result.sub_containers.len());
/// # Ok::<(), ecucsheet::Error>(())
/// ```
pub fn convert(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<ExtractionResult> {
    convert_with_options(input, output, &RenderOptions::default())
}

/// Extract and write with custom render options.
///
/// # Example
///
/// ```no_run
/// use ecucsheet::{ContainerKind, RenderOptions};
///
/// let options = RenderOptions::new()
///     .with_sheet_name(ContainerKind::SubContainer, "Nested")
///     .with_bold_headers(false);
///
/// ecucsheet::convert_with_options("EcuC.arxml", "EcuC.xlsx", &options)?;
/// # Ok::<(), ecucsheet::Error>(())
/// ```
pub fn convert_with_options(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    options: &RenderOptions,
) -> Result<ExtractionResult> {
    let result = extract_file(input)?;
    render::write_xlsx(&result, output, options)?;
    Ok(result)
}

/// Extract containers from `input` and render them as JSON.
pub fn to_json(input: impl AsRef<Path>, format: JsonFormat) -> Result<String> {
    let result = extract_file(input)?;
    render::to_json(&result, format)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<AUTOSAR>
  <CONTAINERS>
    <ECUC-CONTAINER-VALUE>
      <SHORT-NAME>EcuC</SHORT-NAME>
      <DEFINITION-REF>/AUTOSAR/EcuC/EcucDef</DEFINITION-REF>
    </ECUC-CONTAINER-VALUE>
  </CONTAINERS>
</AUTOSAR>"#;

    #[test]
    fn test_convert() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("EcuC.arxml");
        let output = dir.path().join("EcuC.xlsx");
        std::fs::write(&input, SAMPLE).unwrap();

        let result = convert(&input, &output).unwrap();
        assert_eq!(result.containers.len(), 1);
        assert!(output.exists());
    }

    #[test]
    fn test_convert_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.xlsx");
        let err = convert(dir.path().join("absent.arxml"), &output).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert!(!output.exists());
    }

    #[test]
    fn test_to_json() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("EcuC.arxml");
        std::fs::write(&input, SAMPLE).unwrap();

        let json = to_json(&input, JsonFormat::Compact).unwrap();
        assert!(json.contains("\"name\":\"EcuC\""));
    }
}
