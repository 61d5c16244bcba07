use super::{Check, Severity, ValidationFinding, ValidationInput};

/// Records of the target MCU whose pin names did not resolve
pub struct UnresolvedPinCheck;

impl Check for UnresolvedPinCheck {
    fn id(&self) -> &'static str {
        "unresolved_pin"
    }

    fn description(&self) -> &'static str {
        "Pin names the profile could not map to a physical pin"
    }

    fn run(&self, input: &ValidationInput<'_>) -> Vec<ValidationFinding> {
        input
            .unresolved
            .iter()
            .map(|pin| {
                ValidationFinding::new(
                    Severity::Warning,
                    self.id(),
                    format!(
                        "unrecognized pin '{}' on net '{}' ({})",
                        pin.raw_pin, pin.net_name, pin.reason
                    ),
                )
                .with_net(&pin.net_name)
            })
            .collect()
    }
}

/// Two nets on one physical pin
pub struct PinConflictCheck;

impl Check for PinConflictCheck {
    fn id(&self) -> &'static str {
        "pin_conflict"
    }

    fn description(&self) -> &'static str {
        "A physical pin may belong to only one net"
    }

    fn run(&self, input: &ValidationInput<'_>) -> Vec<ValidationFinding> {
        let mut findings = Vec::new();
        for (pin, nets) in input.nets_by_pin() {
            if nets.len() < 2 {
                continue;
            }
            let names: Vec<&str> = nets.iter().copied().collect();
            let mut finding = ValidationFinding::new(
                Severity::Error,
                self.id(),
                format!("pin conflict: {} is claimed by nets {}", pin, names.join(", ")),
            )
            .with_pin(pin);
            if let Some(first) = names.first() {
                finding = finding.with_net(first);
            }
            findings.push(finding);
        }
        findings
    }
}

/// Signal nets landing on more than two MCU pins
pub struct MultiPinNetCheck;

impl Check for MultiPinNetCheck {
    fn id(&self) -> &'static str {
        "multi_pin_net"
    }

    fn description(&self) -> &'static str {
        "Signal nets tied to several MCU pins are usually shorts"
    }

    fn run(&self, input: &ValidationInput<'_>) -> Vec<ValidationFinding> {
        input
            .pins_by_net()
            .into_iter()
            .filter(|(net, pins)| pins.len() > 2 && !input.role_of(net).is_supply())
            .map(|(net, pins)| {
                let pins: Vec<&str> = pins.into_iter().collect();
                ValidationFinding::new(
                    Severity::Warning,
                    self.id(),
                    format!(
                        "multi-pin net, check for short circuit: '{}' connects {} MCU pins ({})",
                        net,
                        pins.len(),
                        pins.join(", ")
                    ),
                )
                .with_net(net)
            })
            .collect()
    }
}

/// Positive differential nets with no negative partner
pub struct LonelyPairCheck;

impl Check for LonelyPairCheck {
    fn id(&self) -> &'static str {
        "lonely_diff_pair"
    }

    fn description(&self) -> &'static str {
        "Differential positives need their negative partner"
    }

    fn run(&self, input: &ValidationInput<'_>) -> Vec<ValidationFinding> {
        input
            .pairs
            .iter()
            .filter(|pair| !pair.is_complete())
            .map(|pair| {
                ValidationFinding::new(
                    Severity::Warning,
                    self.id(),
                    format!(
                        "incomplete differential pair: '{}' has no '{}' partner",
                        pair.positive,
                        pair.expected_negative()
                    ),
                )
                .with_net(&pair.positive)
            })
            .collect()
    }
}

/// Role needs a capability the pin does not have
pub struct CapabilityCheck;

impl Check for CapabilityCheck {
    fn id(&self) -> &'static str {
        "capability_mismatch"
    }

    fn description(&self) -> &'static str {
        "Each net's role must be supported by its pin"
    }

    fn run(&self, input: &ValidationInput<'_>) -> Vec<ValidationFinding> {
        let mut findings = Vec::new();
        for pin in input.pins {
            let role = input.role_of(&pin.net_name);
            let Some(capability) = role.required_capability() else {
                continue;
            };
            let Some(info) = input.profile.pin(&pin.canonical_pin) else {
                continue;
            };
            if !info.has(capability) {
                findings.push(
                    ValidationFinding::new(
                        Severity::Warning,
                        self.id(),
                        format!(
                            "role/pin capability mismatch: net '{}' is {} but {} has no {} capability",
                            pin.net_name, role, pin.canonical_pin, capability
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

/// Pins the profile marks as reserved
pub struct ReservedPinCheck;

impl Check for ReservedPinCheck {
    fn id(&self) -> &'static str {
        "reserved_pin"
    }

    fn description(&self) -> &'static str {
        "Reserved pins are wired to board functions"
    }

    fn run(&self, input: &ValidationInput<'_>) -> Vec<ValidationFinding> {
        let reserved = input.profile.reserved_pins();
        input
            .pins
            .iter()
            .filter(|pin| reserved.contains(&pin.canonical_pin))
            .map(|pin| {
                let function = input
                    .profile
                    .pin(&pin.canonical_pin)
                    .and_then(|info| info.special_function)
                    .unwrap_or("reserved");
                ValidationFinding::new(
                    Severity::Warning,
                    self.id(),
                    format!(
                        "reserved pin {} ({}) used by net '{}'",
                        pin.canonical_pin, function, pin.net_name
                    ),
                )
                .with_net(&pin.net_name)
                .with_pin(&pin.canonical_pin)
            })
            .collect()
    }
}
