//! Pin name normalization
//!
//! Schematic pin labels come in many spellings (`GPIO4`, `IO4`, `4`,
//! `PA5/ADC_IN5`, `USB_DP`). Each profile owns a [`RewriteTable`] that maps
//! those spellings onto the canonical keys of its pin table. Resolution order:
//!
//! 1. the upper-cased name is already a canonical pin
//! 2. an exact literal rewrite
//! 3. the longest prefix match among the regex rewrites, ties going to the
//!    rule registered first
//!
//! A rewrite that lands outside the pin table is rejected rather than
//! retried against later rules.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, trace};

use crate::core::PinmapGenError;
use crate::parser::RawNetRecord;
use crate::profiles::{McuProfile, PinTable};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizeError {
    #[error("empty pin name")]
    Empty,

    #[error("unrecognized pin name '{raw}'")]
    Unrecognized { raw: String },

    #[error("pin name '{raw}' rewrites to '{candidate}', which this MCU does not have")]
    OutOfRange { raw: String, candidate: String },
}

/// Ordered literal and pattern rewrites for one MCU family
#[derive(Debug, Clone, Default)]
pub struct RewriteTable {
    literals: BTreeMap<String, String>,
    patterns: Vec<(Regex, String)>,
}

impl RewriteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exact, case-insensitive alias
    pub fn literal(mut self, from: &str, to: &str) -> Self {
        self.literals.insert(from.to_uppercase(), to.to_string());
        self
    }

    /// Prefix-anchored regex rewrite; `template` uses `$1`-style references.
    ///
    /// # Panics
    ///
    /// Panics if `pattern` is not a valid regex. Patterns are compile-time
    /// constants of the profile tables.
    pub fn pattern(mut self, pattern: &str, template: &str) -> Self {
        let anchored = format!("^(?:{pattern})");
        let regex = Regex::new(&anchored).expect("rewrite pattern must be a valid regex");
        self.patterns.push((regex, template.to_string()));
        self
    }

    pub fn len(&self) -> usize {
        self.literals.len() + self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Apply the literal and regex rules without consulting any pin table.
    pub fn rewrite(&self, raw_pin: &str) -> Result<String, NormalizeError> {
        let key = raw_pin.trim().to_uppercase();
        if key.is_empty() {
            return Err(NormalizeError::Empty);
        }

        if let Some(target) = self.literals.get(&key) {
            return Ok(target.clone());
        }

        let mut best: Option<(usize, regex::Captures<'_>, &str)> = None;
        for (regex, template) in &self.patterns {
            if let Some(caps) = regex.captures(&key) {
                let matched = caps.get(0).map_or(0, |m| m.len());
                if best.as_ref().map_or(true, |(len, _, _)| matched > *len) {
                    best = Some((matched, caps, template.as_str()));
                }
            }
        }

        match best {
            Some((_, caps, template)) => {
                let mut candidate = String::new();
                caps.expand(template, &mut candidate);
                Ok(candidate)
            }
            None => Err(NormalizeError::Unrecognized {
                raw: raw_pin.to_string(),
            }),
        }
    }

    /// Resolve a raw pin name to a key of `table`.
    pub fn resolve(&self, raw_pin: &str, table: &PinTable) -> Result<String, NormalizeError> {
        let key = raw_pin.trim().to_uppercase();
        if table.contains_key(&key) {
            return Ok(key);
        }

        let candidate = self.rewrite(raw_pin)?;
        if table.contains_key(&candidate) {
            Ok(candidate)
        } else {
            Err(NormalizeError::OutOfRange {
                raw: raw_pin.to_string(),
                candidate,
            })
        }
    }
}

/// One resolved MCU pin connection
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NormalizedPin {
    pub net_name: String,
    pub canonical_pin: String,
    pub designator: String,
    pub raw_pin: String,
}

/// An MCU record whose pin name could not be resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvedPin {
    pub net_name: String,
    pub designator: String,
    pub raw_pin: String,
    pub reason: String,
}

/// Output of [`normalize_records`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Normalization {
    pub pins: Vec<NormalizedPin>,
    pub unresolved: Vec<UnresolvedPin>,
    /// Records that belonged to the target designator
    pub records_seen: usize,
}

/// Keep the records of the target MCU and resolve their pin names.
///
/// Records for other designators are ignored. Repeated `(net, pin)`
/// connections collapse to one entry. Per-record failures are collected in
/// [`Normalization::unresolved`]; the call only fails when nothing resolves.
pub fn normalize_records(
    records: &[RawNetRecord],
    profile: &dyn McuProfile,
    mcu_ref: &str,
) -> Result<Normalization, PinmapGenError> {
    let target = mcu_ref.trim();
    let mut result = Normalization::default();
    let mut seen: BTreeSet<(String, String)> = BTreeSet::new();

    for record in records.iter().filter(|r| r.designator.trim() == target) {
        result.records_seen += 1;

        match profile.normalize(&record.raw_pin) {
            Ok(canonical_pin) => {
                trace!("{} {} -> {}", record.net_name, record.raw_pin, canonical_pin);
                if seen.insert((record.net_name.clone(), canonical_pin.clone())) {
                    result.pins.push(NormalizedPin {
                        net_name: record.net_name.clone(),
                        canonical_pin,
                        designator: record.designator.clone(),
                        raw_pin: record.raw_pin.clone(),
                    });
                }
            }
            Err(e) => {
                debug!("Unresolved pin '{}' on net '{}': {}", record.raw_pin, record.net_name, e);
                result.unresolved.push(UnresolvedPin {
                    net_name: record.net_name.clone(),
                    designator: record.designator.clone(),
                    raw_pin: record.raw_pin.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    debug!(
        "Normalized {} pins for {} ({} records, {} unresolved)",
        result.pins.len(),
        target,
        result.records_seen,
        result.unresolved.len()
    );

    if result.pins.is_empty() {
        return Err(PinmapGenError::NoResolvedPins {
            mcu_ref: target.to_string(),
            records_seen: result.records_seen,
            rejected: result.unresolved.len(),
        });
    }

    Ok(result)
}
