// src/interchange/mod.rs

//! Import/export formats.
//!
//! - [`json`]: the structured project payload and holiday lists.
//! - [`mermaid`]: text Gantt charts.

pub mod json;
pub mod mermaid;

pub use json::{HolidayFile, export_holidays, export_project, import_project, parse_holidays};
pub use mermaid::{MermaidOptions, ParsedGantt};
