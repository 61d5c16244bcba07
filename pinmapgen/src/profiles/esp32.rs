use std::collections::BTreeSet;
use std::sync::Arc;

use super::{McuId, McuProfile, PinCapability, PinInfo, PinTable};
use crate::normalize::{NormalizeError, RewriteTable};
use crate::roles::Role;
use crate::validate::{Check, Severity, ValidationFinding, ValidationInput};

/// GPIOs bonded out on the ESP32-WROOM-32 module
const MODULE_GPIOS: &[u8] = &[
    0, 1, 2, 3, 4, 5, 12, 13, 14, 15, 16, 17, 18, 19, 21, 22, 23, 25, 26, 27, 32, 33, 34, 35,
    36, 37, 38, 39,
];
const INPUT_ONLY: &[u8] = &[34, 35, 36, 37, 38, 39];
const STRAPPING: &[u8] = &[0, 2, 5, 12, 15];
const ADC1: &[u8] = &[32, 33, 34, 35, 36, 37, 38, 39];
/// ADC2 is unavailable while the WiFi radio is running
pub const ADC2: &[u8] = &[0, 2, 4, 12, 13, 14, 15, 25, 26, 27];
/// UART0 is the boot console and flashing port
const CONSOLE_PINS: &[&str] = &["GPIO1", "GPIO3"];

fn special_function(gpio: u8) -> Option<&'static str> {
    Some(match gpio {
        0 => "Boot mode strapping pin",
        1 => "UART0 TX (console)",
        2 => "Strapping pin, on-board LED on some boards",
        3 => "UART0 RX (console)",
        5 => "Strapping pin (SDIO timing)",
        12 => "Strapping pin (flash voltage)",
        15 => "Strapping pin (boot log)",
        25 => "DAC1",
        26 => "DAC2",
        36 => "SENSOR_VP",
        39 => "SENSOR_VN",
        _ => return None,
    })
}

/// Espressif ESP32 (WROOM-32 module pinout)
pub struct Esp32Profile {
    pins: PinTable,
    reserved: BTreeSet<String>,
    rewrites: RewriteTable,
    checks: Vec<Arc<dyn Check>>,
}

impl Esp32Profile {
    pub fn new() -> Self {
        let mut pins = PinTable::new();

        for &gpio in MODULE_GPIOS {
            let name = format!("GPIO{gpio}");
            let mut info = if INPUT_ONLY.contains(&gpio) {
                PinInfo::new(name.clone(), &[PinCapability::Gpio, PinCapability::InputOnly])
            } else {
                PinInfo::new(
                    name.clone(),
                    &[
                        PinCapability::Gpio,
                        PinCapability::Pwm,
                        PinCapability::I2c,
                        PinCapability::Spi,
                        PinCapability::Uart,
                    ],
                )
            };
            if ADC1.contains(&gpio) || ADC2.contains(&gpio) {
                info = info.with_capability(PinCapability::Adc);
            }
            if STRAPPING.contains(&gpio) {
                info = info.with_capability(PinCapability::Strapping);
            }
            if gpio == 0 {
                info = info.with_capability(PinCapability::Boot);
            }
            if let Some(description) = special_function(gpio) {
                info = info.with_special_function(description);
            }
            pins.insert(name, info);
        }

        let rewrites = RewriteTable::new()
            .literal("VP", "GPIO36")
            .literal("SENSOR_VP", "GPIO36")
            .literal("VN", "GPIO39")
            .literal("SENSOR_VN", "GPIO39")
            .literal("TXD0", "GPIO1")
            .literal("U0TXD", "GPIO1")
            .literal("RXD0", "GPIO3")
            .literal("U0RXD", "GPIO3")
            .pattern(r"GPIO0*(\d+)", "GPIO$1")
            .pattern(r"IO0*(\d+)", "GPIO$1")
            // a bare number must be the whole name: "3V3" is not pin 3
            .pattern(r"0*(\d+)$", "GPIO$1");

        Self {
            pins,
            reserved: BTreeSet::new(),
            rewrites,
            checks: vec![
                Arc::new(StrappingPinCheck),
                Arc::new(InputOnlyPinCheck),
                Arc::new(ConsolePinCheck),
                Arc::new(Adc2WifiCheck),
            ],
        }
    }
}

impl Default for Esp32Profile {
    fn default() -> Self {
        Self::new()
    }
}

impl McuProfile for Esp32Profile {
    fn id(&self) -> McuId {
        McuId::Esp32
    }

    fn pin_table(&self) -> &PinTable {
        &self.pins
    }

    fn reserved_pins(&self) -> &BTreeSet<String> {
        &self.reserved
    }

    fn normalize(&self, raw_pin: &str) -> Result<String, NormalizeError> {
        self.rewrites.resolve(raw_pin, &self.pins)
    }

    fn checks(&self) -> &[Arc<dyn Check>] {
        &self.checks
    }
}

/// Warn for every pin use where `flag` holds, one finding per pin/net.
fn flag_pins<F>(check: &dyn Check, input: &ValidationInput<'_>, flag: F) -> Vec<ValidationFinding>
where
    F: Fn(&PinInfo, Role) -> Option<String>,
{
    let mut findings = Vec::new();
    for pin in input.pins {
        let Some(info) = input.profile.pin(&pin.canonical_pin) else {
            continue;
        };
        let role = input.role_of(&pin.net_name);
        if let Some(message) = flag(info, role) {
            findings.push(
                ValidationFinding::new(
                    Severity::Warning,
                    check.id(),
                    format!("{} on net '{}': {}", pin.canonical_pin, pin.net_name, message),
                )
                .with_net(&pin.net_name)
                .with_pin(&pin.canonical_pin),
            );
        }
    }
    findings
}

pub struct StrappingPinCheck;

impl Check for StrappingPinCheck {
    fn id(&self) -> &'static str {
        "esp32_strapping_pin"
    }

    fn description(&self) -> &'static str {
        "Strapping pins driven at reset can change the boot mode"
    }

    fn run(&self, input: &ValidationInput<'_>) -> Vec<ValidationFinding> {
        flag_pins(self, input, |info, role| {
            (info.has(PinCapability::Strapping) && role.drives_pin()).then(|| {
                format!("strapping pin driven as {role}; external circuitry may alter boot mode")
            })
        })
    }
}

pub struct InputOnlyPinCheck;

impl Check for InputOnlyPinCheck {
    fn id(&self) -> &'static str {
        "esp32_input_only"
    }

    fn description(&self) -> &'static str {
        "GPIO34-39 have no output driver"
    }

    fn run(&self, input: &ValidationInput<'_>) -> Vec<ValidationFinding> {
        flag_pins(self, input, |info, role| {
            (info.has(PinCapability::InputOnly) && role.drives_pin())
                .then(|| format!("input-only pin cannot drive {role}"))
        })
    }
}

pub struct ConsolePinCheck;

impl Check for ConsolePinCheck {
    fn id(&self) -> &'static str {
        "esp32_uart0_console"
    }

    fn description(&self) -> &'static str {
        "GPIO1/GPIO3 carry the UART0 boot console"
    }

    fn run(&self, input: &ValidationInput<'_>) -> Vec<ValidationFinding> {
        flag_pins(self, input, |info, role| {
            (CONSOLE_PINS.contains(&info.name.as_str())
                && !matches!(role, Role::UartTx | Role::UartRx))
            .then(|| format!("UART0 console pin reused as {role}; flashing and logs share it"))
        })
    }
}

pub struct Adc2WifiCheck;

impl Check for Adc2WifiCheck {
    fn id(&self) -> &'static str {
        "esp32_adc2_wifi"
    }

    fn description(&self) -> &'static str {
        "ADC2 channels cannot be sampled while WiFi is active"
    }

    fn run(&self, input: &ValidationInput<'_>) -> Vec<ValidationFinding> {
        flag_pins(self, input, |info, role| {
            let gpio = info.name.trim_start_matches("GPIO").parse::<u8>().ok()?;
            (role == Role::Adc && ADC2.contains(&gpio))
                .then(|| "ADC2 channel, unavailable while WiFi is active".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_table_shape() {
        let profile = Esp32Profile::new();
        assert_eq!(profile.pin_table().len(), MODULE_GPIOS.len());
        assert!(profile.pin("GPIO6").is_none());

        let gpio34 = profile.pin("GPIO34").unwrap();
        assert!(gpio34.has(PinCapability::InputOnly));
        assert!(gpio34.has(PinCapability::Adc));
        assert!(!gpio34.has(PinCapability::Pwm));

        let gpio0 = profile.pin("GPIO0").unwrap();
        assert!(gpio0.has(PinCapability::Strapping));
        assert!(gpio0.has(PinCapability::Boot));
        assert!(!profile.pin("GPIO16").unwrap().has(PinCapability::Adc));
    }

    #[test]
    fn test_normalize_spellings() {
        let profile = Esp32Profile::new();
        for (raw, expected) in [
            ("IO21", "GPIO21"),
            ("gpio22", "GPIO22"),
            ("5", "GPIO5"),
            ("SENSOR_VP", "GPIO36"),
            ("TXD0", "GPIO1"),
        ] {
            assert_eq!(profile.normalize(raw).unwrap(), expected, "{raw}");
        }
        assert!(matches!(
            profile.normalize("IO6"),
            Err(NormalizeError::OutOfRange { .. })
        ));
    }
}
