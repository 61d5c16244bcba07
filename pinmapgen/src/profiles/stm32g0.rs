use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use super::{McuId, McuProfile, PinCapability, PinInfo, PinTable};
use crate::normalize::{NormalizeError, RewriteTable};
use crate::roles::{BusGroup, Role};
use crate::validate::{Check, Severity, ValidationFinding, ValidationInput};

/// One alternate-function mapping: `pin` can act as `role` of `peripheral`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AltFunction {
    pub pin: &'static str,
    pub peripheral: &'static str,
    pub role: Role,
}

const fn af(pin: &'static str, peripheral: &'static str, role: Role) -> AltFunction {
    AltFunction {
        pin,
        peripheral,
        role,
    }
}

/// Serial peripheral alternate functions of the 48-pin STM32G071
pub const ALT_FUNCTIONS: &[AltFunction] = &[
    af("PA9", "I2C1", Role::I2cScl),
    af("PB6", "I2C1", Role::I2cScl),
    af("PB8", "I2C1", Role::I2cScl),
    af("PA10", "I2C1", Role::I2cSda),
    af("PB7", "I2C1", Role::I2cSda),
    af("PB9", "I2C1", Role::I2cSda),
    af("PA11", "I2C2", Role::I2cScl),
    af("PB10", "I2C2", Role::I2cScl),
    af("PB13", "I2C2", Role::I2cScl),
    af("PA12", "I2C2", Role::I2cSda),
    af("PB11", "I2C2", Role::I2cSda),
    af("PB14", "I2C2", Role::I2cSda),
    af("PA5", "SPI1", Role::SpiSck),
    af("PB3", "SPI1", Role::SpiSck),
    af("PA6", "SPI1", Role::SpiMiso),
    af("PB4", "SPI1", Role::SpiMiso),
    af("PA7", "SPI1", Role::SpiMosi),
    af("PB5", "SPI1", Role::SpiMosi),
    af("PA4", "SPI1", Role::SpiCs),
    af("PA15", "SPI1", Role::SpiCs),
    af("PB13", "SPI2", Role::SpiSck),
    af("PB14", "SPI2", Role::SpiMiso),
    af("PB15", "SPI2", Role::SpiMosi),
    af("PB12", "SPI2", Role::SpiCs),
    af("PB9", "SPI2", Role::SpiCs),
    af("PA9", "USART1", Role::UartTx),
    af("PB6", "USART1", Role::UartTx),
    af("PA10", "USART1", Role::UartRx),
    af("PB7", "USART1", Role::UartRx),
    af("PA2", "USART2", Role::UartTx),
    af("PA14", "USART2", Role::UartTx),
    af("PA3", "USART2", Role::UartRx),
    af("PA15", "USART2", Role::UartRx),
    af("PB10", "USART3", Role::UartTx),
    af("PB11", "USART3", Role::UartRx),
];

const PWM_PINS: &[&str] = &[
    "PA0", "PA1", "PA2", "PA3", "PA6", "PA7", "PA8", "PA9", "PA10", "PA11", "PB0", "PB1", "PB3",
    "PB4", "PB5", "PB6", "PB7", "PB8", "PB9", "PB14", "PB15", "PC6",
];

const ADC_PINS: &[&str] = &[
    "PA0", "PA1", "PA2", "PA3", "PA4", "PA5", "PA6", "PA7", "PB0", "PB1", "PB2", "PB10", "PB11",
    "PB12",
];

fn port_pins() -> impl Iterator<Item = String> {
    let ports: [(char, &[u8]); 5] = [
        ('A', &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15]),
        ('B', &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15]),
        ('C', &[6, 13, 14, 15]),
        ('D', &[0, 1, 2, 3, 8, 9]),
        ('F', &[0, 1, 2]),
    ];
    ports
        .into_iter()
        .flat_map(|(port, numbers)| numbers.iter().map(move |n| format!("P{port}{n}")))
}

fn special_function(pin: &str) -> Option<&'static str> {
    Some(match pin {
        "PA13" => "SWDIO",
        "PA14" => "SWCLK / BOOT0",
        "PB2" => "BOOT1",
        "PC14" => "OSC32_IN",
        "PC15" => "OSC32_OUT",
        "PF0" => "OSC_IN",
        "PF1" => "OSC_OUT",
        "PF2" => "NRST",
        _ => return None,
    })
}

/// Peripheral instances per (pin, role)
pub type AltFunctionMap = BTreeMap<(String, Role), BTreeSet<&'static str>>;

/// ST STM32G0 family (STM32G071, 48-pin package)
pub struct Stm32g0Profile {
    pins: PinTable,
    reserved: BTreeSet<String>,
    rewrites: RewriteTable,
    checks: Vec<Arc<dyn Check>>,
}

impl Stm32g0Profile {
    pub fn new() -> Self {
        let mut pins = PinTable::new();
        for name in port_pins() {
            let mut info = PinInfo::new(name.clone(), &[PinCapability::Gpio]);
            if PWM_PINS.contains(&name.as_str()) {
                info = info.with_capability(PinCapability::Pwm);
            }
            if ADC_PINS.contains(&name.as_str()) {
                info = info.with_capability(PinCapability::Adc);
            }
            for entry in ALT_FUNCTIONS.iter().filter(|entry| entry.pin == name) {
                if let Some(capability) = entry.role.required_capability() {
                    info = info.with_capability(capability);
                }
            }
            match name.as_str() {
                "PA13" => info = info.with_capability(PinCapability::Debug),
                "PA14" => {
                    info = info
                        .with_capability(PinCapability::Debug)
                        .with_capability(PinCapability::Boot)
                }
                "PB2" => info = info.with_capability(PinCapability::Boot),
                "PC14" | "PC15" | "PF0" | "PF1" => {
                    info = info.with_capability(PinCapability::Clock)
                }
                _ => {}
            }
            if let Some(description) = special_function(&name) {
                info = info.with_special_function(description);
            }
            pins.insert(name, info);
        }

        let mut af_map = AltFunctionMap::new();
        for entry in ALT_FUNCTIONS {
            af_map
                .entry((entry.pin.to_string(), entry.role))
                .or_default()
                .insert(entry.peripheral);
        }

        let rewrites = RewriteTable::new()
            .pattern(r"GPIO([A-F])0*(\d+)", "P$1$2")
            .pattern(r"PORT([A-F])_?0*(\d+)", "P$1$2")
            .pattern(r"P([A-F])_0*(\d+)", "P$1$2")
            .pattern(r"P([A-F])0*(\d+)", "P$1$2")
            .pattern(r"([A-F])0*(\d+)", "P$1$2");

        Self {
            pins,
            reserved: BTreeSet::from(["PF2".to_string()]),
            rewrites,
            checks: vec![
                Arc::new(BootPinCheck),
                Arc::new(SwdPinCheck),
                Arc::new(AltFunctionCheck {
                    alt_functions: Arc::new(af_map),
                }),
            ],
        }
    }
}

impl Default for Stm32g0Profile {
    fn default() -> Self {
        Self::new()
    }
}

impl McuProfile for Stm32g0Profile {
    fn id(&self) -> McuId {
        McuId::Stm32g0
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

pub struct BootPinCheck;

impl Check for BootPinCheck {
    fn id(&self) -> &'static str {
        "stm32g0_boot_pin"
    }

    fn description(&self) -> &'static str {
        "Boot pins used as plain GPIO need a defined level at reset"
    }

    fn run(&self, input: &ValidationInput<'_>) -> Vec<ValidationFinding> {
        let mut findings = Vec::new();
        for pin in input.pins {
            let Some(info) = input.profile.pin(&pin.canonical_pin) else {
                continue;
            };
            let role = input.role_of(&pin.net_name);
            if info.has(PinCapability::Boot)
                && matches!(role, Role::GpioIn | Role::GpioOut | Role::Unknown)
            {
                findings.push(
                    ValidationFinding::new(
                        Severity::Warning,
                        self.id(),
                        format!(
                            "boot pin {} used as {} by net '{}'; ensure the level at reset selects the intended boot mode",
                            pin.canonical_pin, role, pin.net_name
                        ),
                    )
                    .with_net(&pin.net_name)
                    .with_pin(&pin.canonical_pin),
                );
            }
        }
        findings
    }
}

pub struct SwdPinCheck;

impl Check for SwdPinCheck {
    fn id(&self) -> &'static str {
        "stm32g0_swd_pin"
    }

    fn description(&self) -> &'static str {
        "PA13/PA14 are the SWD debug pins"
    }

    fn run(&self, input: &ValidationInput<'_>) -> Vec<ValidationFinding> {
        input
            .pins
            .iter()
            .filter(|pin| {
                input
                    .profile
                    .pin(&pin.canonical_pin)
                    .is_some_and(|info| info.has(PinCapability::Debug))
            })
            .map(|pin| {
                ValidationFinding::new(
                    Severity::Warning,
                    self.id(),
                    format!(
                        "SWD pin {} used by net '{}'; debugging will be unavailable",
                        pin.canonical_pin, pin.net_name
                    ),
                )
                .with_net(&pin.net_name)
                .with_pin(&pin.canonical_pin)
            })
            .collect()
    }
}

/// Every member of a bus must sit on pins one peripheral instance can
/// serve, and two buses cannot both depend on the same sole instance.
pub struct AltFunctionCheck {
    alt_functions: Arc<AltFunctionMap>,
}

impl AltFunctionCheck {
    /// Instances able to serve the whole group, `None` for groups with no pins
    fn candidates(
        &self,
        group: &BusGroup,
        input: &ValidationInput<'_>,
    ) -> Option<BTreeSet<&'static str>> {
        let mut candidates: Option<BTreeSet<&'static str>> = None;
        for member in &group.members {
            let role = input.role_of(member);
            for pin in input.pins.iter().filter(|pin| &pin.net_name == member) {
                let served = self
                    .alt_functions
                    .get(&(pin.canonical_pin.clone(), role))
                    .cloned()
                    .unwrap_or_default();
                candidates = Some(match candidates {
                    Some(current) => current.intersection(&served).copied().collect(),
                    None => served,
                });
            }
        }
        candidates
    }
}

impl Check for AltFunctionCheck {
    fn id(&self) -> &'static str {
        "stm32g0_alt_function"
    }

    fn description(&self) -> &'static str {
        "Bus pins must map onto a single free peripheral instance"
    }

    fn run(&self, input: &ValidationInput<'_>) -> Vec<ValidationFinding> {
        let mut findings = Vec::new();
        let mut sole_owner: Vec<(&BusGroup, &'static str)> = Vec::new();

        for group in input.buses {
            let Some(candidates) = self.candidates(group, input) else {
                continue;
            };
            if candidates.is_empty() {
                findings.push(
                    ValidationFinding::new(
                        Severity::Warning,
                        self.id(),
                        format!(
                            "alternate-function conflict: no single {} peripheral can serve bus {} ({})",
                            group.kind,
                            group.label(),
                            group.members.join(", ")
                        ),
                    )
                    .with_net(&group.members[0]),
                );
            } else if candidates.len() == 1 {
                if let Some(instance) = candidates.into_iter().next() {
                    sole_owner.push((group, instance));
                }
            }
        }

        for (i, (first, instance)) in sole_owner.iter().enumerate() {
            for (second, other) in &sole_owner[i + 1..] {
                if instance == other {
                    findings.push(
                        ValidationFinding::new(
                            Severity::Warning,
                            self.id(),
                            format!(
                                "alternate-function conflict: buses {} and {} both require {}",
                                first.label(),
                                second.label(),
                                instance
                            ),
                        )
                        .with_net(&second.members[0]),
                    );
                }
            }
        }

        findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_table_shape() {
        let profile = Stm32g0Profile::new();
        assert_eq!(profile.pin_table().len(), 16 + 16 + 4 + 6 + 3);
        assert!(profile.pin("PA9").unwrap().has(PinCapability::I2c));
        assert!(profile.pin("PA9").unwrap().has(PinCapability::Uart));
        assert!(profile.pin("PA13").unwrap().has(PinCapability::Debug));
        assert!(profile.pin("PB2").unwrap().has(PinCapability::Boot));
        assert!(profile.pin("PF0").unwrap().has(PinCapability::Clock));
        assert!(!profile.pin("PC13").unwrap().has(PinCapability::Spi));
        assert!(profile.pin("PE0").is_none());
    }

    #[test]
    fn test_normalize_spellings() {
        let profile = Stm32g0Profile::new();
        for (raw, expected) in [
            ("PA5", "PA5"),
            ("pa05", "PA5"),
            ("GPIOB7", "PB7"),
            ("PORTA_9", "PA9"),
            ("PB_12", "PB12"),
            ("A10", "PA10"),
            ("PA13/SWDIO", "PA13"),
        ] {
            assert_eq!(profile.normalize(raw).unwrap(), expected, "{raw}");
        }
        assert!(matches!(
            profile.normalize("PE3"),
            Err(NormalizeError::OutOfRange { .. })
        ));
    }
}
