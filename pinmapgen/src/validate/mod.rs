//! Validation engine
//!
//! Findings are data, never errors: every check runs and reports what it
//! sees, and nothing here aborts the pipeline. Generic checks run first in a
//! fixed order, then the checks contributed by the MCU profile.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::normalize::{NormalizedPin, UnresolvedPin};
use crate::profiles::McuProfile;
use crate::roles::{BusGroup, DifferentialPair, Role};

pub mod checks;

pub use checks::{
    CapabilityCheck, LonelyPairCheck, MultiPinNetCheck, PinConflictCheck, ReservedPinCheck,
    UnresolvedPinCheck,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationFinding {
    pub severity: Severity,
    /// Identifier of the check that produced the finding
    pub check: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_net: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_pin: Option<String>,
}

impl ValidationFinding {
    pub fn new(severity: Severity, check: &str, message: impl Into<String>) -> Self {
        Self {
            severity,
            check: check.to_string(),
            message: message.into(),
            related_net: None,
            related_pin: None,
        }
    }

    pub fn with_net(mut self, net: &str) -> Self {
        self.related_net = Some(net.to_string());
        self
    }

    pub fn with_pin(mut self, pin: &str) -> Self {
        self.related_pin = Some(pin.to_string());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Everything a check may look at. Borrowed, never mutated.
#[derive(Clone, Copy)]
pub struct ValidationInput<'a> {
    pub profile: &'a dyn McuProfile,
    pub pins: &'a [NormalizedPin],
    pub unresolved: &'a [UnresolvedPin],
    pub roles: &'a BTreeMap<String, Role>,
    pub buses: &'a [BusGroup],
    pub pairs: &'a [DifferentialPair],
}

impl<'a> ValidationInput<'a> {
    pub fn role_of(&self, net_name: &str) -> Role {
        self.roles.get(net_name).copied().unwrap_or(Role::Unknown)
    }

    /// Canonical pin -> distinct nets using it
    pub fn nets_by_pin(&self) -> BTreeMap<&'a str, BTreeSet<&'a str>> {
        let mut map: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for pin in self.pins {
            map.entry(pin.canonical_pin.as_str())
                .or_default()
                .insert(pin.net_name.as_str());
        }
        map
    }

    /// Net -> distinct canonical pins it touches
    pub fn pins_by_net(&self) -> BTreeMap<&'a str, BTreeSet<&'a str>> {
        let mut map: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for pin in self.pins {
            map.entry(pin.net_name.as_str())
                .or_default()
                .insert(pin.canonical_pin.as_str());
        }
        map
    }
}

/// A single validation check
pub trait Check: Send + Sync {
    /// Stable identifier carried by every finding of this check
    fn id(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn run(&self, input: &ValidationInput<'_>) -> Vec<ValidationFinding>;
}

/// Ordered collection of checks
pub struct Validator {
    checks: Vec<Arc<dyn Check>>,
}

impl Validator {
    pub fn new() -> Self {
        Self { checks: Vec::new() }
    }

    /// The generic checks, in reporting order
    pub fn with_default_checks() -> Self {
        let mut validator = Self::new();
        validator.add_check(Arc::new(UnresolvedPinCheck));
        validator.add_check(Arc::new(PinConflictCheck));
        validator.add_check(Arc::new(MultiPinNetCheck));
        validator.add_check(Arc::new(LonelyPairCheck));
        validator.add_check(Arc::new(CapabilityCheck));
        validator.add_check(Arc::new(ReservedPinCheck));
        validator
    }

    pub fn add_check(&mut self, check: Arc<dyn Check>) {
        self.checks.push(check);
    }

    pub fn check_ids(&self) -> Vec<&'static str> {
        self.checks.iter().map(|c| c.id()).collect()
    }

    /// Run the registered checks, then the profile's own.
    pub fn validate(&self, input: &ValidationInput<'_>) -> Vec<ValidationFinding> {
        let mut findings: Vec<ValidationFinding> = Vec::new();
        for check in &self.checks {
            findings.extend(check.run(input));
        }
        findings.extend(input.profile.validate(input));

        debug!(
            "Validation produced {} findings ({} errors)",
            findings.len(),
            findings.iter().filter(|f| f.is_error()).count()
        );
        findings
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::with_default_checks()
    }
}

/// Run the default checks plus the profile's checks.
pub fn validate(input: &ValidationInput<'_>) -> Vec<ValidationFinding> {
    Validator::with_default_checks().validate(input)
}
