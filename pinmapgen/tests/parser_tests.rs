//! Netlist reader tests against the fixture files

use pinmapgen::parser::{
    detect_format, CsvNetlistParser, EagleSchematicParser, NetlistFormat, ParseError,
};
use pinmapgen::RawNetRecord;
use std::fs;
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn test_parse_csv_fixture() {
    let records = CsvNetlistParser::parse_file(&fixture_path("sensor_hub.csv")).unwrap();
    assert_eq!(records.len(), 30);
    assert_eq!(
        records[0],
        RawNetRecord::new("I2C0_SDA", "GPIO0", "RP2040", "U1")
    );
    assert_eq!(records.iter().filter(|r| r.designator == "U1").count(), 14);
}

#[test]
fn test_parse_schematic_fixture() {
    let records = EagleSchematicParser::parse_file(&fixture_path("sensor_hub.sch")).unwrap();

    let mcu: Vec<&RawNetRecord> = records.iter().filter(|r| r.designator == "U1").collect();
    assert_eq!(mcu.len(), 14);
    assert!(mcu.iter().all(|r| r.component_type == "RP2040"));

    let cs = records
        .iter()
        .find(|r| r.designator == "U3" && r.net_name == "FLASH_CS")
        .unwrap();
    assert_eq!(cs.raw_pin, "/CS");
    assert_eq!(cs.component_type, "W25Q16");

    let supply: Vec<&str> = records
        .iter()
        .filter(|r| r.net_name == "+3V3")
        .map(|r| r.designator.as_str())
        .collect();
    assert_eq!(supply, vec!["U2", "U3"]);
}

#[test]
fn test_detect_fixture_formats() {
    for (name, expected) in [
        ("sensor_hub.csv", NetlistFormat::Csv),
        ("sensor_hub.sch", NetlistFormat::EagleSchematic),
    ] {
        let path = fixture_path(name);
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(detect_format(&path, &content), Some(expected));
    }
}

#[test]
fn test_unknown_format_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("netlist.txt");
    fs::write(&path, "just some text\n").unwrap();

    let err = pinmapgen::parse_netlist(&path).unwrap_err();
    assert!(matches!(
        err,
        pinmapgen::PinmapGenError::Parse(ParseError::UnsupportedFormat(_))
    ));
}

#[test]
fn test_csv_without_extension_is_sniffed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("export");
    fs::write(&path, "Net,Pin,Component,RefDes\nLED,GP25,RP2040,U1\n").unwrap();

    let records = pinmapgen::parse_netlist(&path).unwrap();
    assert_eq!(records, vec![RawNetRecord::new("LED", "GP25", "RP2040", "U1")]);
}

#[test]
fn test_malformed_xml_is_reported() {
    let err = EagleSchematicParser::parse_str(
        "<eagle><drawing><schematic><parts></drawing></eagle>",
    )
    .unwrap_err();
    assert!(matches!(err, ParseError::Xml(_)));
}

#[test]
fn test_schematic_without_pinrefs() {
    let err = EagleSchematicParser::parse_str(
        "<eagle><drawing><schematic><sheets><sheet><nets/></sheet></sheets></schematic></drawing></eagle>",
    )
    .unwrap_err();
    assert!(matches!(err, ParseError::NoRecords));
}
