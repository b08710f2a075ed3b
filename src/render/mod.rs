//! Output rendering for extraction results.
//!
//! This module renders an [`ExtractionResult`](crate::ExtractionResult)
//! as an Excel workbook or as JSON.
//!
//! # Example
//!
//! ```no_run
//! use ecucsheet::{extract_file, render::*};
//!
//! let result = extract_file("EcuC.arxml")?;
//!
//! // Render to an .xlsx report
//! write_xlsx(&result, "EcuC.xlsx", &RenderOptions::default())?;
//!
//! // Render to JSON
//! let json = to_json(&result, JsonFormat::Pretty)?;
//! # Ok::<(), ecucsheet::Error>(())
//! ```

mod json;
mod options;
mod workbook;

pub use json::{to_json, JsonFormat};
pub use options::{RenderOptions, SheetLayout};
pub use workbook::{to_workbook, write_xlsx};
