//! Canonical pinmap assembly
//!
//! The pinmap is the single artifact every emitter reads. All collections
//! are ordered, so two runs over the same input differ only in
//! `generated_at`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::normalize::NormalizedPin;
use crate::profiles::McuId;
use crate::roles::{BusGroup, DifferentialPair, Role};
use crate::validate::{Severity, ValidationFinding};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalPinmap {
    pub mcu: McuId,
    /// Net name -> its MCU pins, sorted by canonical pin
    pub pins: BTreeMap<String, Vec<NormalizedPin>>,
    pub roles: BTreeMap<String, Role>,
    pub buses: Vec<BusGroup>,
    pub differential_pairs: Vec<DifferentialPair>,
    pub findings: Vec<ValidationFinding>,
    pub generated_at: DateTime<Utc>,
}

/// Counts reported after a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinmapSummary {
    pub nets: usize,
    pub pins: usize,
    pub buses: usize,
    pub differential_pairs: usize,
    pub warnings: usize,
    pub errors: usize,
}

impl CanonicalPinmap {
    pub fn summary(&self) -> PinmapSummary {
        let errors = self.errors().count();
        PinmapSummary {
            nets: self.pins.len(),
            pins: self.pins.values().map(Vec::len).sum(),
            buses: self.buses.len(),
            differential_pairs: self.differential_pairs.len(),
            warnings: self.findings.len() - errors,
            errors,
        }
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationFinding> {
        self.findings.iter().filter(|f| f.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationFinding> {
        self.findings.iter().filter(|f| f.severity == Severity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn has_warnings(&self) -> bool {
        self.warnings().next().is_some()
    }

    pub fn role_of(&self, net_name: &str) -> Role {
        self.roles.get(net_name).copied().unwrap_or(Role::Unknown)
    }

    /// First canonical pin of a net
    pub fn primary_pin(&self, net_name: &str) -> Option<&str> {
        self.pins
            .get(net_name)
            .and_then(|pins| pins.first())
            .map(|pin| pin.canonical_pin.as_str())
    }

    /// Bus group a net belongs to
    pub fn bus_of(&self, net_name: &str) -> Option<&BusGroup> {
        self.buses
            .iter()
            .find(|bus| bus.members.iter().any(|m| m == net_name))
    }
}

/// Assemble a pinmap stamped with the current time.
pub fn assemble(
    normalized_pins: Vec<NormalizedPin>,
    roles: BTreeMap<String, Role>,
    buses: Vec<BusGroup>,
    differential_pairs: Vec<DifferentialPair>,
    findings: Vec<ValidationFinding>,
    mcu: McuId,
) -> CanonicalPinmap {
    assemble_at(
        normalized_pins,
        roles,
        buses,
        differential_pairs,
        findings,
        mcu,
        Utc::now(),
    )
}

/// Assemble a pinmap with an explicit timestamp.
pub fn assemble_at(
    normalized_pins: Vec<NormalizedPin>,
    mut roles: BTreeMap<String, Role>,
    mut buses: Vec<BusGroup>,
    mut differential_pairs: Vec<DifferentialPair>,
    findings: Vec<ValidationFinding>,
    mcu: McuId,
    generated_at: DateTime<Utc>,
) -> CanonicalPinmap {
    let mut pins: BTreeMap<String, Vec<NormalizedPin>> = BTreeMap::new();
    for pin in normalized_pins {
        pins.entry(pin.net_name.clone()).or_default().push(pin);
    }
    for (net, net_pins) in pins.iter_mut() {
        net_pins.sort_by(|a, b| a.canonical_pin.cmp(&b.canonical_pin));
        roles.entry(net.clone()).or_insert(Role::Unknown);
    }

    for bus in &mut buses {
        bus.members.sort();
    }
    buses.sort_by(|a, b| (a.kind, a.instance).cmp(&(b.kind, b.instance)));
    differential_pairs.sort_by(|a, b| a.positive.cmp(&b.positive));

    CanonicalPinmap {
        mcu,
        pins,
        roles,
        buses,
        differential_pairs,
        findings,
        generated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::BusKind;
    use chrono::TimeZone;

    fn pin(net: &str, canonical: &str) -> NormalizedPin {
        NormalizedPin {
            net_name: net.into(),
            canonical_pin: canonical.into(),
            designator: "U1".into(),
            raw_pin: canonical.into(),
        }
    }

    #[test]
    fn test_assemble_groups_and_sorts() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let pinmap = assemble_at(
            vec![pin("B", "GP9"), pin("A", "GP3"), pin("B", "GP2")],
            BTreeMap::new(),
            vec![BusGroup {
                kind: BusKind::I2c,
                instance: 0,
                members: vec!["Z".into(), "Y".into()],
            }],
            Vec::new(),
            vec![ValidationFinding::new(Severity::Error, "pin_conflict", "x")],
            McuId::Rp2040,
            at,
        );

        assert_eq!(pinmap.pins.keys().collect::<Vec<_>>(), vec!["A", "B"]);
        assert_eq!(pinmap.primary_pin("B"), Some("GP2"));
        assert_eq!(pinmap.role_of("A"), Role::Unknown);
        assert_eq!(pinmap.buses[0].members, vec!["Y".to_string(), "Z".to_string()]);
        assert!(pinmap.has_errors());
        assert!(!pinmap.has_warnings());

        let summary = pinmap.summary();
        assert_eq!(summary.nets, 2);
        assert_eq!(summary.pins, 3);
        assert_eq!(summary.errors, 1);
        assert_eq!(pinmap.generated_at, at);
    }
}
