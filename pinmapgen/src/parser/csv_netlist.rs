//! CSV netlist reader
//!
//! Reads the `Net,Pin,Component,RefDes` export produced by the Fusion 360
//! electronics ULP. Header lookup is case-insensitive and columns may come
//! in any order; extra columns are ignored.

use std::fs;
use std::path::Path;
use tracing::debug;

use super::{ParseError, RawNetRecord};

pub const NET_COLUMN: &str = "Net";
pub const PIN_COLUMN: &str = "Pin";
pub const COMPONENT_COLUMN: &str = "Component";
pub const REFDES_COLUMN: &str = "RefDes";

const REQUIRED_COLUMNS: [&str; 4] = [NET_COLUMN, PIN_COLUMN, COMPONENT_COLUMN, REFDES_COLUMN];

pub struct CsvNetlistParser;

impl CsvNetlistParser {
    pub fn parse_file(path: &Path) -> Result<Vec<RawNetRecord>, ParseError> {
        let content = fs::read_to_string(path).map_err(|source| ParseError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_str(&content)
    }

    pub fn parse_str(content: &str) -> Result<Vec<RawNetRecord>, ParseError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(content.as_bytes());

        let headers = reader.headers()?.clone();
        let column = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));

        let missing: Vec<String> = REQUIRED_COLUMNS
            .into_iter()
            .filter(|&name| column(name).is_none())
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ParseError::MissingColumns(missing));
        }

        // indices in REQUIRED_COLUMNS order: net, pin, component, refdes
        let indices: Vec<usize> = REQUIRED_COLUMNS.into_iter().filter_map(column).collect();

        let mut records = Vec::new();
        for result in reader.records() {
            let row = result?;
            if row.iter().all(str::is_empty) {
                continue;
            }
            let line = row.position().map_or(0, |p| p.line());

            let mut fields = [""; 4];
            for (slot, (&index, name)) in fields.iter_mut().zip(indices.iter().zip(REQUIRED_COLUMNS)) {
                let value = row.get(index).unwrap_or("");
                if value.is_empty() {
                    return Err(ParseError::EmptyField { field: name, line });
                }
                *slot = value;
            }

            let [net, pin, component, refdes] = fields;
            records.push(RawNetRecord::new(net, pin, component, refdes));
        }

        if records.is_empty() {
            return Err(ParseError::NoRecords);
        }

        debug!("Parsed {} CSV netlist records", records.len());
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic() {
        let csv = "Net,Pin,Component,RefDes\nI2C0_SDA,GP0,RP2040,U1\nI2C0_SDA,SDA,BME280,U2\n";
        let records = CsvNetlistParser::parse_str(csv).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], RawNetRecord::new("I2C0_SDA", "GP0", "RP2040", "U1"));
    }

    #[test]
    fn test_columns_reordered_trimmed_and_extra() {
        let csv = "refdes, pin ,Net,Component,Value\n U1 , GP4 , LED ,RP2040,\n\n,,,,\n";
        let records = CsvNetlistParser::parse_str(csv).unwrap();
        assert_eq!(records, vec![RawNetRecord::new("LED", "GP4", "RP2040", "U1")]);
    }

    #[test]
    fn test_missing_columns() {
        let err = CsvNetlistParser::parse_str("Net,Pin\nA,1\n").unwrap_err();
        match err {
            ParseError::MissingColumns(cols) => {
                assert_eq!(cols, vec!["Component".to_string(), "RefDes".to_string()])
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_field_reports_line() {
        let csv = "Net,Pin,Component,RefDes\nA,GP1,RP2040,U1\nB,,RP2040,U1\n";
        match CsvNetlistParser::parse_str(csv).unwrap_err() {
            ParseError::EmptyField { field, line } => {
                assert_eq!(field, "Pin");
                assert_eq!(line, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_header_only_has_no_records() {
        assert!(matches!(
            CsvNetlistParser::parse_str("Net,Pin,Component,RefDes\n"),
            Err(ParseError::NoRecords)
        ));
    }
}
