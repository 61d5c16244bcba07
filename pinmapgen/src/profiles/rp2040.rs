use std::collections::BTreeSet;
use std::sync::Arc;

use super::{McuId, McuProfile, PinCapability, PinInfo, PinTable};
use crate::normalize::{NormalizeError, RewriteTable};
use crate::roles::Role;
use crate::validate::{Check, Severity, ValidationFinding, ValidationInput};

use PinCapability::*;

/// GPIO23 drives the on-board SMPS mode select on reference designs
pub const SMPS_PIN: &str = "GP23";
pub const USB_DM_PIN: &str = "GP24";
pub const USB_DP_PIN: &str = "GP25";
/// The only pins wired to the ADC
pub const ADC_PINS: [&str; 4] = ["GP26", "GP27", "GP28", "GP29"];

/// Raspberry Pi RP2040
pub struct Rp2040Profile {
    pins: PinTable,
    reserved: BTreeSet<String>,
    rewrites: RewriteTable,
    checks: Vec<Arc<dyn Check>>,
}

impl Rp2040Profile {
    pub fn new() -> Self {
        let mut pins = PinTable::new();

        for n in (0..=22).chain(26..=29) {
            let name = format!("GP{n}");
            let mut info = PinInfo::new(name.clone(), &[Gpio, Pwm, I2c, Spi, Uart]);
            if n >= 26 {
                info = info
                    .with_capability(Adc)
                    .with_special_function(match n {
                        26 => "ADC0",
                        27 => "ADC1",
                        28 => "ADC2",
                        _ => "ADC3",
                    });
            }
            pins.insert(name, info);
        }

        pins.insert(
            SMPS_PIN.to_string(),
            PinInfo::new(SMPS_PIN, &[Gpio]).with_special_function("SMPS mode select"),
        );
        pins.insert(
            USB_DM_PIN.to_string(),
            PinInfo::new(USB_DM_PIN, &[Gpio, Usb]).with_special_function("USB D-"),
        );
        pins.insert(
            USB_DP_PIN.to_string(),
            PinInfo::new(USB_DP_PIN, &[Gpio, Usb]).with_special_function("USB D+"),
        );

        let rewrites = RewriteTable::new()
            .literal("USB_DP", USB_DP_PIN)
            .literal("USBDP", USB_DP_PIN)
            .literal("USB_DM", USB_DM_PIN)
            .literal("USB_DN", USB_DM_PIN)
            .literal("USBDM", USB_DM_PIN)
            .literal("USBDN", USB_DM_PIN)
            .literal("ADC0", "GP26")
            .literal("ADC1", "GP27")
            .literal("ADC2", "GP28")
            .literal("ADC3", "GP29")
            .pattern(r"GPIO0*(\d+)", "GP$1")
            .pattern(r"GP0*(\d+)", "GP$1")
            .pattern(r"IO0*(\d+)", "GP$1")
            // a bare number must be the whole name: "3V3" is not pin 3
            .pattern(r"0*(\d+)$", "GP$1");

        Self {
            pins,
            reserved: BTreeSet::from([SMPS_PIN.to_string()]),
            rewrites,
            checks: vec![Arc::new(UsbPinCheck), Arc::new(AdcPinCheck)],
        }
    }
}

impl Default for Rp2040Profile {
    fn default() -> Self {
        Self::new()
    }
}

impl McuProfile for Rp2040Profile {
    fn id(&self) -> McuId {
        McuId::Rp2040
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

/// The USB PHY pins only make sense on USB differential nets.
pub struct UsbPinCheck;

impl UsbPinCheck {
    fn is_usb_net(net_name: &str, role: Role) -> bool {
        role.is_differential() && net_name.to_uppercase().contains("USB")
    }
}

impl Check for UsbPinCheck {
    fn id(&self) -> &'static str {
        "rp2040_usb_pin"
    }

    fn description(&self) -> &'static str {
        "GP24/GP25 are the USB D-/D+ pins and should carry USB nets"
    }

    fn run(&self, input: &ValidationInput<'_>) -> Vec<ValidationFinding> {
        input
            .pins
            .iter()
            .filter(|pin| pin.canonical_pin == USB_DM_PIN || pin.canonical_pin == USB_DP_PIN)
            .filter_map(|pin| {
                let role = input.role_of(&pin.net_name);
                if Self::is_usb_net(&pin.net_name, role) {
                    return None;
                }
                Some(
                    ValidationFinding::new(
                        Severity::Warning,
                        self.id(),
                        format!(
                            "USB pin {} used for non-USB net '{}' (role {})",
                            pin.canonical_pin, pin.net_name, role
                        ),
                    )
                    .with_net(&pin.net_name)
                    .with_pin(&pin.canonical_pin),
                )
            })
            .collect()
    }
}

/// Digital outputs parked on one of the four analog inputs
pub struct AdcPinCheck;

impl Check for AdcPinCheck {
    fn id(&self) -> &'static str {
        "rp2040_adc_pin"
    }

    fn description(&self) -> &'static str {
        "GP26-GP29 are the only ADC inputs; prefer other pins for outputs"
    }

    fn run(&self, input: &ValidationInput<'_>) -> Vec<ValidationFinding> {
        input
            .pins
            .iter()
            .filter(|pin| ADC_PINS.contains(&pin.canonical_pin.as_str()))
            .filter_map(|pin| {
                let role = input.role_of(&pin.net_name);
                if !matches!(role, Role::Pwm | Role::GpioOut) {
                    return None;
                }
                Some(
                    ValidationFinding::new(
                        Severity::Warning,
                        self.id(),
                        format!(
                            "ADC pin {} used as {} by net '{}'; consider keeping it for analog input",
                            pin.canonical_pin, role, pin.net_name
                        ),
                    )
                    .with_net(&pin.net_name)
                    .with_pin(&pin.canonical_pin),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{PinmapCore, PipelineOptions};
    use crate::parser::RawNetRecord;

    #[test]
    fn test_pin_table_shape() {
        let profile = Rp2040Profile::new();
        assert_eq!(profile.pin_table().len(), 30);
        assert!(profile.pin("GP26").unwrap().has(Adc));
        assert!(!profile.pin("GP0").unwrap().has(Adc));
        assert!(profile.pin("GP25").unwrap().has(Usb));
        assert!(!profile.pin("GP23").unwrap().has(I2c));
        assert!(profile.reserved_pins().contains("GP23"));
    }

    #[test]
    fn test_normalize_spellings() {
        let profile = Rp2040Profile::new();
        for (raw, expected) in [
            ("GPIO4", "GP4"),
            ("gp4", "GP4"),
            ("IO4", "GP4"),
            ("4", "GP4"),
            ("GPIO04", "GP4"),
            ("GPIO0", "GP0"),
            ("USB_DP", "GP25"),
            ("usb_dn", "GP24"),
            ("ADC2", "GP28"),
        ] {
            assert_eq!(profile.normalize(raw).unwrap(), expected, "{raw}");
        }
    }

    #[test]
    fn test_normalize_rejects() {
        let profile = Rp2040Profile::new();
        assert!(matches!(
            profile.normalize("GPIO30"),
            Err(NormalizeError::OutOfRange { .. })
        ));
        assert!(matches!(
            profile.normalize("VBUS"),
            Err(NormalizeError::Unrecognized { .. })
        ));
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let profile = Rp2040Profile::new();
        for name in profile.pin_table().keys() {
            assert_eq!(&profile.normalize(name).unwrap(), name);
        }
    }

    #[test]
    fn test_outputs_on_adc_pins_warn() {
        let records = vec![
            RawNetRecord::new("STATUS_LED", "GP26", "RP2040", "U1"),
            RawNetRecord::new("FAN_PWM", "GP27", "RP2040", "U1"),
            RawNetRecord::new("BATT_ADC", "GP28", "RP2040", "U1"),
            RawNetRecord::new("BTN_USER", "GP29", "RP2040", "U1"),
            RawNetRecord::new("ERROR_LED", "GP2", "RP2040", "U1"),
        ];
        let pinmap = PinmapCore::run(&records, &PipelineOptions::new("rp2040", "U1")).unwrap();

        let mut flagged: Vec<&str> = pinmap
            .findings
            .iter()
            .filter(|f| f.check == "rp2040_adc_pin")
            .filter_map(|f| f.related_pin.as_deref())
            .collect();
        flagged.sort();
        assert_eq!(flagged, vec!["GP26", "GP27"]);
        assert!(!pinmap.has_errors());
    }
}
