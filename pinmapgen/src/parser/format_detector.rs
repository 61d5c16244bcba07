use std::fs;
use std::path::Path;

use super::{CsvNetlistParser, EagleSchematicParser, ParseError, RawNetRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetlistFormat {
    Csv,
    EagleSchematic,
}

/// Detect the netlist format from the file extension, falling back to the
/// first bytes of the content.
pub fn detect_format(path: &Path, content: &str) -> Option<NetlistFormat> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("csv") => return Some(NetlistFormat::Csv),
        Some("sch") => return Some(NetlistFormat::EagleSchematic),
        _ => {}
    }

    let head = content.trim_start_matches('\u{feff}').trim_start();
    if head.starts_with('<') {
        if head.contains("<eagle") {
            return Some(NetlistFormat::EagleSchematic);
        }
        return None;
    }

    let header = head.lines().next()?.to_ascii_lowercase();
    let columns: Vec<&str> = header.split(',').map(str::trim).collect();
    if ["net", "pin", "component", "refdes"]
        .iter()
        .all(|c| columns.contains(c))
    {
        return Some(NetlistFormat::Csv);
    }

    None
}

/// Read a netlist file of either supported format.
pub fn detect_and_parse(path: &Path) -> Result<Vec<RawNetRecord>, ParseError> {
    let content = fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    match detect_format(path, &content) {
        Some(NetlistFormat::Csv) => CsvNetlistParser::parse_str(&content),
        Some(NetlistFormat::EagleSchematic) => EagleSchematicParser::parse_str(&content),
        None => Err(ParseError::UnsupportedFormat(path.to_path_buf())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_wins() {
        assert_eq!(
            detect_format(Path::new("board.SCH"), "Net,Pin"),
            Some(NetlistFormat::EagleSchematic)
        );
        assert_eq!(
            detect_format(Path::new("nets.csv"), "<eagle>"),
            Some(NetlistFormat::Csv)
        );
    }

    #[test]
    fn test_content_sniffing() {
        assert_eq!(
            detect_format(Path::new("export.txt"), "Net,Pin,Component,RefDes\n"),
            Some(NetlistFormat::Csv)
        );
        assert_eq!(
            detect_format(Path::new("export"), "<?xml version=\"1.0\"?>\n<eagle version=\"9\">"),
            Some(NetlistFormat::EagleSchematic)
        );
        assert_eq!(detect_format(Path::new("x.kicad_sch"), "(kicad_sch)"), None);
    }
}
