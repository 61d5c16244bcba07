pub mod csv_netlist;
pub mod eagle;
pub mod format_detector;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use csv_netlist::CsvNetlistParser;
pub use eagle::EagleSchematicParser;
pub use format_detector::{detect_and_parse, detect_format, NetlistFormat};

/// One pin-to-net connection as exported by the CAD tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawNetRecord {
    pub net_name: String,
    pub raw_pin: String,
    pub component_type: String,
    pub designator: String,
}

impl RawNetRecord {
    pub fn new(net_name: &str, raw_pin: &str, component_type: &str, designator: &str) -> Self {
        Self {
            net_name: net_name.to_string(),
            raw_pin: raw_pin.to_string(),
            component_type: component_type.to_string(),
            designator: designator.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("CSV header is missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Empty {field} field on line {line}")]
    EmptyField { field: &'static str, line: u64 },

    #[error("No netlist records found")]
    NoRecords,

    #[error("Not an EAGLE file: root element is <{0}>")]
    NotEagle(String),

    #[error("EAGLE file has no schematic drawing (board files are not netlists)")]
    MissingSchematic,

    #[error("Cannot determine netlist format of {0}")]
    UnsupportedFormat(PathBuf),
}
