//! Pipeline entry points shared by the CLI and library users.

use std::path::Path;
use tracing::{debug, info};

use crate::normalize::normalize_records;
use crate::parser::{detect_and_parse, ParseError, RawNetRecord};
use crate::pinmap::{assemble, CanonicalPinmap};
use crate::profiles::get_profile;
use crate::roles::infer_roles;
use crate::validate::{ValidationInput, Validator};

#[derive(Debug, thiserror::Error)]
pub enum PinmapGenError {
    #[error("Unknown MCU '{mcu_id}' (supported: {supported})")]
    UnknownMcu { mcu_id: String, supported: String },

    #[error(
        "No pins resolved for MCU '{mcu_ref}' ({records_seen} records for that designator, {rejected} rejected)"
    )]
    NoResolvedPins {
        mcu_ref: String,
        records_seen: usize,
        rejected: usize,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Which MCU to extract, and how to interpret it.
#[derive(Clone, Debug)]
pub struct PipelineOptions {
    /// Profile identifier (`rp2040`, `stm32g0`, `esp32`)
    pub mcu: String,
    /// Reference designator of the MCU in the netlist
    pub mcu_ref: String,
}

impl PipelineOptions {
    pub fn new(mcu: impl Into<String>, mcu_ref: impl Into<String>) -> Self {
        Self {
            mcu: mcu.into(),
            mcu_ref: mcu_ref.into(),
        }
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            mcu: "rp2040".to_string(),
            mcu_ref: "U1".to_string(),
        }
    }
}

pub struct PinmapCore;

impl PinmapCore {
    /// Run the pipeline over parsed records.
    ///
    /// Fails only on an unknown MCU or when no pin of the target designator
    /// resolves; everything else ends up as findings on the pinmap.
    pub fn run(
        records: &[RawNetRecord],
        options: &PipelineOptions,
    ) -> Result<CanonicalPinmap, PinmapGenError> {
        let profile = get_profile(&options.mcu)?;
        info!(
            "Building {} pinmap for {} from {} records",
            profile.id().display_name(),
            options.mcu_ref,
            records.len()
        );

        let normalized = normalize_records(records, profile, &options.mcu_ref)?;
        let inference = infer_roles(
            normalized.pins.iter().map(|p| p.net_name.as_str()),
            profile,
        );

        let findings = Validator::with_default_checks().validate(&ValidationInput {
            profile,
            pins: &normalized.pins,
            unresolved: &normalized.unresolved,
            roles: &inference.roles,
            buses: &inference.buses,
            pairs: &inference.pairs,
        });

        let pinmap = assemble(
            normalized.pins,
            inference.roles,
            inference.buses,
            inference.pairs,
            findings,
            profile.id(),
        );

        debug!("Pinmap summary: {:?}", pinmap.summary());
        Ok(pinmap)
    }

    /// Parse a CSV or EAGLE netlist file and run the pipeline on it.
    pub fn run_file(
        path: &Path,
        options: &PipelineOptions,
    ) -> Result<CanonicalPinmap, PinmapGenError> {
        // profile errors take precedence over parse errors
        get_profile(&options.mcu)?;
        let records = detect_and_parse(path)?;
        Self::run(&records, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_mcu_before_parsing() {
        let options = PipelineOptions::new("z80", "U1");
        let err = PinmapCore::run_file(Path::new("/does/not/exist.csv"), &options).unwrap_err();
        assert!(matches!(err, PinmapGenError::UnknownMcu { .. }));
    }

    #[test]
    fn test_missing_file_is_parse_error() {
        let err = PinmapCore::run_file(Path::new("/does/not/exist.csv"), &PipelineOptions::default())
            .unwrap_err();
        assert!(matches!(err, PinmapGenError::Parse(ParseError::Io { .. })));
    }
}
