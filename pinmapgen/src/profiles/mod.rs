//! MCU Profile Registry
//!
//! Each supported microcontroller family is described by a static profile:
//! a physical pin table with capability tags, the set of pins designs should
//! leave alone, the differential-pair suffix templates, a pin-name rewrite
//! table and the family-specific validation checks.
//!
//! Profiles are built lazily once per process and are read-only afterwards.
//! Lookup goes through [`McuId`], so adding a family means adding a module,
//! a variant and one arm in [`profile_for`].

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, LazyLock};

use crate::core::PinmapGenError;
use crate::normalize::NormalizeError;
use crate::validate::{Check, ValidationFinding, ValidationInput};

pub mod esp32;
pub mod rp2040;
pub mod stm32g0;

pub use esp32::Esp32Profile;
pub use rp2040::Rp2040Profile;
pub use stm32g0::Stm32g0Profile;

/// Supported microcontroller families
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum McuId {
    Rp2040,
    Stm32g0,
    Esp32,
}

impl McuId {
    /// Every registered family, in registry order
    pub const ALL: [McuId; 3] = [McuId::Rp2040, McuId::Stm32g0, McuId::Esp32];

    /// Identifier accepted on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            McuId::Rp2040 => "rp2040",
            McuId::Stm32g0 => "stm32g0",
            McuId::Esp32 => "esp32",
        }
    }

    /// Vendor spelling used in generated files
    pub fn display_name(&self) -> &'static str {
        match self {
            McuId::Rp2040 => "RP2040",
            McuId::Stm32g0 => "STM32G0",
            McuId::Esp32 => "ESP32",
        }
    }

    /// Whether firmware frameworks address pins of this family by GPIO number
    /// (`GP4` -> `4`) rather than by port name (`PA5`).
    pub fn numeric_pins(&self) -> bool {
        !matches!(self, McuId::Stm32g0)
    }
}

impl fmt::Display for McuId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for McuId {
    type Err = PinmapGenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        McuId::ALL
            .into_iter()
            .find(|id| id.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| PinmapGenError::UnknownMcu {
                mcu_id: s.to_string(),
                supported: supported_ids(),
            })
    }
}

/// Capability tags a physical pin can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinCapability {
    Gpio,
    Adc,
    Pwm,
    I2c,
    Spi,
    Uart,
    Usb,
    InputOnly,
    Strapping,
    Boot,
    Clock,
    Debug,
}

impl PinCapability {
    pub fn as_str(&self) -> &'static str {
        match self {
            PinCapability::Gpio => "gpio",
            PinCapability::Adc => "adc",
            PinCapability::Pwm => "pwm",
            PinCapability::I2c => "i2c",
            PinCapability::Spi => "spi",
            PinCapability::Uart => "uart",
            PinCapability::Usb => "usb",
            PinCapability::InputOnly => "input_only",
            PinCapability::Strapping => "strapping",
            PinCapability::Boot => "boot",
            PinCapability::Clock => "clock",
            PinCapability::Debug => "debug",
        }
    }
}

impl fmt::Display for PinCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type PinCapabilities = BTreeSet<PinCapability>;

/// Static description of one physical pin
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PinInfo {
    pub name: String,
    pub capabilities: PinCapabilities,
    pub special_function: Option<&'static str>,
}

impl PinInfo {
    pub fn new(name: impl Into<String>, capabilities: &[PinCapability]) -> Self {
        Self {
            name: name.into(),
            capabilities: capabilities.iter().copied().collect(),
            special_function: None,
        }
    }

    pub fn with_special_function(mut self, description: &'static str) -> Self {
        self.special_function = Some(description);
        self
    }

    pub fn with_capability(mut self, capability: PinCapability) -> Self {
        self.capabilities.insert(capability);
        self
    }

    pub fn has(&self, capability: PinCapability) -> bool {
        self.capabilities.contains(&capability)
    }
}

/// Canonical pin name -> pin description
pub type PinTable = BTreeMap<String, PinInfo>;

/// A positive/negative suffix pair identifying differential nets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiffTemplate {
    pub positive: &'static str,
    pub negative: &'static str,
}

impl DiffTemplate {
    pub const fn new(positive: &'static str, negative: &'static str) -> Self {
        Self { positive, negative }
    }
}

impl fmt::Display for DiffTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.positive, self.negative)
    }
}

/// Templates tried in order when pairing nets
pub const DEFAULT_DIFF_TEMPLATES: &[DiffTemplate] = &[
    DiffTemplate::new("_P", "_N"),
    DiffTemplate::new("DP", "DM"),
    DiffTemplate::new("DP", "DN"),
    DiffTemplate::new("CANH", "CANL"),
    DiffTemplate::new("_PLUS", "_MINUS"),
];

/// Family descriptor: pin model plus the two polymorphic operations,
/// normalization and validation.
pub trait McuProfile: Send + Sync {
    fn id(&self) -> McuId;

    fn pin_table(&self) -> &PinTable;

    /// Pins whose use always deserves a warning
    fn reserved_pins(&self) -> &BTreeSet<String>;

    fn differential_templates(&self) -> &[DiffTemplate] {
        DEFAULT_DIFF_TEMPLATES
    }

    /// Resolve a raw schematic pin name to a key of [`McuProfile::pin_table`].
    fn normalize(&self, raw_pin: &str) -> Result<String, NormalizeError>;

    /// Family-specific checks appended to the validation pipeline
    fn checks(&self) -> &[Arc<dyn Check>];

    fn validate(&self, input: &ValidationInput<'_>) -> Vec<ValidationFinding> {
        self.checks()
            .iter()
            .flat_map(|check| check.run(input))
            .collect()
    }

    fn pin(&self, canonical_pin: &str) -> Option<&PinInfo> {
        self.pin_table().get(canonical_pin)
    }
}

static RP2040: LazyLock<Rp2040Profile> = LazyLock::new(Rp2040Profile::new);
static STM32G0: LazyLock<Stm32g0Profile> = LazyLock::new(Stm32g0Profile::new);
static ESP32: LazyLock<Esp32Profile> = LazyLock::new(Esp32Profile::new);

/// Profile for an already-parsed identifier
pub fn profile_for(id: McuId) -> &'static dyn McuProfile {
    match id {
        McuId::Rp2040 => &*RP2040,
        McuId::Stm32g0 => &*STM32G0,
        McuId::Esp32 => &*ESP32,
    }
}

/// Look a profile up by its identifier string.
///
/// Unknown identifiers are fatal: there is no fallback profile.
pub fn get_profile(mcu_id: &str) -> Result<&'static dyn McuProfile, PinmapGenError> {
    let id: McuId = mcu_id.parse()?;
    Ok(profile_for(id))
}

fn supported_ids() -> String {
    McuId::ALL
        .iter()
        .map(|id| id.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(get_profile("RP2040").unwrap().id(), McuId::Rp2040);
        assert_eq!(get_profile(" stm32g0 ").unwrap().id(), McuId::Stm32g0);
        assert_eq!(get_profile("Esp32").unwrap().id(), McuId::Esp32);
    }

    #[test]
    fn test_unknown_mcu() {
        let err = get_profile("unknownchip").err().unwrap();
        match err {
            PinmapGenError::UnknownMcu { mcu_id, supported } => {
                assert_eq!(mcu_id, "unknownchip");
                assert!(supported.contains("rp2040"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_registry_returns_same_instance() {
        let a = get_profile("rp2040").unwrap() as *const dyn McuProfile as *const ();
        let b = get_profile("rp2040").unwrap() as *const dyn McuProfile as *const ();
        assert_eq!(a, b);
    }

    #[test]
    fn test_every_pin_is_gpio_and_self_named() {
        for id in McuId::ALL {
            let profile = profile_for(id);
            assert!(!profile.pin_table().is_empty());
            for (name, info) in profile.pin_table() {
                assert_eq!(name, &info.name);
                assert_eq!(name, &name.to_uppercase());
                assert!(info.has(PinCapability::Gpio), "{id}: {name} lacks gpio");
            }
            for reserved in profile.reserved_pins() {
                assert!(profile.pin(reserved).is_some(), "{id}: reserved {reserved} not in table");
            }
        }
    }
}
