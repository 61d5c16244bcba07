//! End-to-end pipeline tests for the pinmapgen library

use chrono::{TimeZone, Utc};
use pinmapgen::normalize::normalize_records;
use pinmapgen::prelude::*;
use pinmapgen::profiles::{get_profile, profile_for};
use pinmapgen::roles::infer_roles;
use pinmapgen::validate::{ValidationInput, Validator};
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn rp2040(records: &[RawNetRecord]) -> CanonicalPinmap {
    PinmapCore::run(records, &PipelineOptions::new("rp2040", "U1")).unwrap()
}

/// Same pipeline as `PinmapCore::run`, with a fixed timestamp
fn run_at_fixed_time(records: &[RawNetRecord], mcu: &str) -> CanonicalPinmap {
    let profile = get_profile(mcu).unwrap();
    let normalized = normalize_records(records, profile, "U1").unwrap();
    let inference = infer_roles(normalized.pins.iter().map(|p| p.net_name.as_str()), profile);
    let findings = Validator::with_default_checks().validate(&ValidationInput {
        profile,
        pins: &normalized.pins,
        unresolved: &normalized.unresolved,
        roles: &inference.roles,
        buses: &inference.buses,
        pairs: &inference.pairs,
    });
    pinmapgen::assemble_at(
        normalized.pins,
        inference.roles,
        inference.buses,
        inference.pairs,
        findings,
        profile.id(),
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
    )
}

#[test]
fn test_i2c_bus_is_clean() {
    let records = vec![
        RawNetRecord::new("I2C0_SDA", "GPIO0", "RP2040", "U1"),
        RawNetRecord::new("I2C0_SCL", "GPIO1", "RP2040", "U1"),
    ];
    let pinmap = rp2040(&records);

    assert_eq!(pinmap.primary_pin("I2C0_SDA"), Some("GP0"));
    assert_eq!(pinmap.primary_pin("I2C0_SCL"), Some("GP1"));
    assert_eq!(pinmap.role_of("I2C0_SDA"), Role::I2cSda);
    assert_eq!(pinmap.role_of("I2C0_SCL"), Role::I2cScl);
    assert_eq!(pinmap.buses.len(), 1);
    assert_eq!(pinmap.buses[0].label(), "I2C0");
    assert_eq!(
        pinmap.buses[0].members,
        vec!["I2C0_SCL".to_string(), "I2C0_SDA".to_string()]
    );
    assert!(pinmap.findings.is_empty(), "{:?}", pinmap.findings);
}

#[test]
fn test_lonely_usb_positive() {
    let records = vec![RawNetRecord::new("USB_DP", "GPIO24", "RP2040", "U1")];
    let pinmap = rp2040(&records);

    assert_eq!(pinmap.role_of("USB_DP"), Role::DiffPos);
    assert_eq!(pinmap.differential_pairs.len(), 1);
    assert!(pinmap.differential_pairs[0].negative.is_none());

    assert_eq!(pinmap.findings.len(), 1, "{:?}", pinmap.findings);
    let finding = &pinmap.findings[0];
    assert_eq!(finding.severity, Severity::Warning);
    assert!(finding.message.contains("incomplete differential pair"));
    assert!(!pinmap.has_errors());
}

#[test]
fn test_two_nets_on_one_pin() {
    let records = vec![
        RawNetRecord::new("NET_A", "GPIO5", "RP2040", "U1"),
        RawNetRecord::new("NET_B", "GPIO5", "RP2040", "U1"),
    ];
    let pinmap = rp2040(&records);

    let errors: Vec<_> = pinmap.errors().collect();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("pin conflict"));
    assert_eq!(errors[0].related_pin.as_deref(), Some("GP5"));
    assert!(pinmap.has_errors());
}

#[test]
fn test_unknown_mcu_is_fatal() {
    let records = vec![RawNetRecord::new("LED", "GPIO1", "X", "U1")];
    let err = PinmapCore::run(&records, &PipelineOptions::new("unknownchip", "U1")).unwrap_err();
    assert!(matches!(err, PinmapGenError::UnknownMcu { .. }));
    assert!(err.to_string().contains("unknownchip"));
}

#[test]
fn test_multi_pin_signal_net() {
    let records = vec![
        RawNetRecord::new("SIG", "GPIO1", "RP2040", "U1"),
        RawNetRecord::new("SIG", "GPIO2", "RP2040", "U1"),
        RawNetRecord::new("SIG", "GPIO3", "RP2040", "U1"),
    ];
    let pinmap = rp2040(&records);

    assert_eq!(pinmap.pins["SIG"].len(), 3);
    assert!(pinmap
        .findings
        .iter()
        .any(|f| f.message.contains("multi-pin net, check for short circuit")));
}

#[test]
fn test_two_pin_net_is_not_a_short() {
    let records = vec![
        RawNetRecord::new("SIG", "GPIO1", "RP2040", "U1"),
        RawNetRecord::new("SIG", "GPIO2", "RP2040", "U1"),
    ];
    let pinmap = rp2040(&records);

    assert_eq!(pinmap.pins["SIG"].len(), 2);
    assert!(pinmap.findings.iter().all(|f| f.check != "multi_pin_net"));
}

#[test]
fn test_rail_named_adc_net_is_capability_checked() {
    let records = vec![RawNetRecord::new("VBAT_ADC2", "GPIO3", "RP2040", "U1")];
    let pinmap = rp2040(&records);

    assert_eq!(pinmap.role_of("VBAT_ADC2"), Role::Adc);
    let mismatch: Vec<_> = pinmap
        .findings
        .iter()
        .filter(|f| f.check == "capability_mismatch")
        .collect();
    assert_eq!(mismatch.len(), 1);
    assert_eq!(mismatch[0].related_pin.as_deref(), Some("GP3"));
}

#[test]
fn test_no_resolved_pins() {
    let records = vec![
        RawNetRecord::new("LED", "1", "LED", "D1"),
        RawNetRecord::new("X", "NOT_A_PIN", "RP2040", "U1"),
    ];
    let err = PinmapCore::run(&records, &PipelineOptions::new("rp2040", "U1")).unwrap_err();
    assert!(matches!(
        err,
        PinmapGenError::NoResolvedPins {
            records_seen: 1,
            rejected: 1,
            ..
        }
    ));
}

#[test]
fn test_sensor_hub_fixture_is_clean() {
    let pinmap = PinmapCore::run_file(
        &fixture_path("sensor_hub.csv"),
        &PipelineOptions::new("rp2040", "U1"),
    )
    .unwrap();

    assert_eq!(pinmap.pins.len(), 14);
    assert!(pinmap.findings.is_empty(), "{:?}", pinmap.findings);

    let labels: Vec<String> = pinmap.buses.iter().map(|b| b.label()).collect();
    assert_eq!(labels, vec!["I2C0", "SPI0", "UART0"]);
    assert_eq!(pinmap.buses[1].members.len(), 4);
    assert_eq!(pinmap.role_of("FLASH_CS"), Role::SpiCs);
    assert_eq!(pinmap.role_of("USB_DM"), Role::DiffNeg);
    assert_eq!(pinmap.differential_pairs[0].negative.as_deref(), Some("USB_DM"));
    assert!(!pinmap.pins.contains_key("+3V3"));
}

#[test]
fn test_csv_and_schematic_agree() {
    let options = PipelineOptions::new("rp2040", "U1");
    let from_csv = PinmapCore::run_file(&fixture_path("sensor_hub.csv"), &options).unwrap();
    let from_sch = PinmapCore::run_file(&fixture_path("sensor_hub.sch"), &options).unwrap();

    assert_eq!(from_csv.pins, from_sch.pins);
    assert_eq!(from_csv.roles, from_sch.roles);
    assert_eq!(from_csv.buses, from_sch.buses);
    assert_eq!(from_csv.differential_pairs, from_sch.differential_pairs);
    assert_eq!(from_csv.findings, from_sch.findings);
}

#[test]
fn test_output_is_deterministic() {
    let records = pinmapgen::parse_netlist(&fixture_path("esp32_board.csv")).unwrap();
    let first = run_at_fixed_time(&records, "esp32");
    let second = run_at_fixed_time(&records, "esp32");

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
    assert_eq!(
        pinmapgen::emit::json::render(&first).unwrap(),
        pinmapgen::emit::json::render(&second).unwrap()
    );
}

#[test]
fn test_record_order_does_not_matter() {
    let mut records = pinmapgen::parse_netlist(&fixture_path("sensor_hub.csv")).unwrap();
    let forward = run_at_fixed_time(&records, "rp2040");
    records.reverse();
    let reversed = run_at_fixed_time(&records, "rp2040");

    assert_eq!(forward.pins, reversed.pins);
    assert_eq!(forward.buses, reversed.buses);
    assert_eq!(forward.differential_pairs, reversed.differential_pairs);
}

#[test]
fn test_canonical_names_normalize_to_themselves() {
    for id in McuId::ALL {
        let profile = profile_for(id);
        for name in profile.pin_table().keys() {
            assert_eq!(&profile.normalize(name).unwrap(), name, "{id}");
        }
    }
}

#[test]
fn test_conflict_iff_shared_pin() {
    let shared = rp2040(&[
        RawNetRecord::new("A", "GPIO3", "RP2040", "U1"),
        RawNetRecord::new("B", "GP3", "RP2040", "U1"),
        RawNetRecord::new("C", "GPIO4", "RP2040", "U1"),
    ]);
    let conflicts: Vec<_> = shared
        .findings
        .iter()
        .filter(|f| f.check == "pin_conflict")
        .collect();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].related_pin.as_deref(), Some("GP3"));

    // the same net listed twice on one pin is not a conflict
    let repeated = rp2040(&[
        RawNetRecord::new("A", "GPIO3", "RP2040", "U1"),
        RawNetRecord::new("A", "3", "RP2040", "U1"),
    ]);
    assert!(repeated.findings.iter().all(|f| f.check != "pin_conflict"));
    assert_eq!(repeated.pins["A"].len(), 1);
}

#[test]
fn test_every_incomplete_pair_warns_once() {
    let pinmap = rp2040(&[
        RawNetRecord::new("LVDS_P", "GPIO6", "RP2040", "U1"),
        RawNetRecord::new("LVDS_N", "GPIO7", "RP2040", "U1"),
        RawNetRecord::new("CAN_CANH", "GPIO8", "RP2040", "U1"),
        RawNetRecord::new("CLK_PLUS", "GPIO9", "RP2040", "U1"),
    ]);

    let lonely: Vec<&str> = pinmap
        .findings
        .iter()
        .filter(|f| f.check == "lonely_diff_pair")
        .filter_map(|f| f.related_net.as_deref())
        .collect();
    assert_eq!(lonely, vec!["CAN_CANH", "CLK_PLUS"]);

    let complete = pinmap
        .differential_pairs
        .iter()
        .filter(|p| p.is_complete())
        .count();
    assert_eq!(complete, 1);
}

#[test]
fn test_other_designators_are_ignored() {
    let pinmap = rp2040(&[
        RawNetRecord::new("LED", "GPIO25", "RP2040", "U1"),
        RawNetRecord::new("LED", "GPIO25", "RP2040", "U2"),
        RawNetRecord::new("OTHER", "GPIO25", "RP2040", "U2"),
    ]);
    assert_eq!(pinmap.pins.len(), 1);
    assert!(pinmap.findings.iter().all(|f| f.check != "pin_conflict"));
}
