use std::collections::BTreeMap;

use super::{net_sections, pin_number, ConstantNames};
use crate::pinmap::CanonicalPinmap;
use crate::roles::Role;

/// Short key used in the bus helper dictionaries
fn bus_key(role: Role) -> Option<&'static str> {
    Some(match role {
        Role::I2cSda => "sda",
        Role::I2cScl => "scl",
        Role::SpiSck => "sck",
        Role::SpiMosi => "mosi",
        Role::SpiMiso => "miso",
        Role::SpiCs => "cs",
        Role::UartTx => "tx",
        Role::UartRx => "rx",
        _ => return None,
    })
}

fn pin_literal(pinmap: &CanonicalPinmap, canonical_pin: &str) -> String {
    match pin_number(canonical_pin) {
        Some(n) if pinmap.mcu.numeric_pins() => n.to_string(),
        _ => format!("\"{canonical_pin}\""),
    }
}

/// MicroPython module with one constant per signal net.
pub fn render(pinmap: &CanonicalPinmap) -> String {
    let mut out = String::new();
    out.push_str("\"\"\"\n");
    out.push_str(&format!("Pin definitions for {}.\n\n", pinmap.mcu.display_name()));
    out.push_str(&format!(
        "Generated by pinmapgen {} on {}. Do not edit by hand.\n",
        env!("CARGO_PKG_VERSION"),
        pinmap.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    out.push_str("\"\"\"\n\n");

    let mut names = ConstantNames::default();
    let mut constants: BTreeMap<&str, String> = BTreeMap::new();

    for section in net_sections(pinmap) {
        out.push_str(&format!("# {}\n", section.title));
        for net in &section.nets {
            let Some(pins) = pinmap.pins.get(*net) else {
                continue;
            };
            let Some(primary) = pins.first() else {
                continue;
            };
            let name = names.claim(net);
            let mut comment = format!("{}, {}", primary.canonical_pin, pinmap.role_of(net));
            if pins.len() > 1 {
                let others: Vec<&str> = pins[1..].iter().map(|p| p.canonical_pin.as_str()).collect();
                comment.push_str(&format!(", also on {}", others.join(", ")));
            }
            out.push_str(&format!(
                "{} = {}  # {}\n",
                name,
                pin_literal(pinmap, &primary.canonical_pin),
                comment
            ));
            constants.insert(*net, name);
        }
        out.push('\n');
    }

    if !pinmap.buses.is_empty() {
        out.push_str("# Bus helpers\n");
        for bus in &pinmap.buses {
            let mut entries: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
            for member in &bus.members {
                if let (Some(key), Some(constant)) =
                    (bus_key(pinmap.role_of(member)), constants.get(member.as_str()))
                {
                    entries.entry(key).or_default().push(constant.as_str());
                }
            }
            // a role held by several nets (chip selects) becomes a list
            let body: Vec<String> = entries
                .iter()
                .map(|(key, constants)| match constants.as_slice() {
                    [single] => format!("\"{key}\": {single}"),
                    many => format!("\"{key}\": [{}]", many.join(", ")),
                })
                .collect();
            out.push_str(&format!("{}_PINS = {{{}}}\n", bus.label(), body.join(", ")));
        }
    }

    out
}
