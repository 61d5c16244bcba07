use super::{net_sections, pin_number, ConstantNames};
use crate::pinmap::CanonicalPinmap;

const GUARD: &str = "PINMAP_ARDUINO_H";

/// Arduino header. Numeric-pin families get GPIO numbers; STM32 boards use
/// the `PA5`-style constants STM32duino already defines.
pub fn render(pinmap: &CanonicalPinmap) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "// Pin definitions for {}\n// Generated by pinmapgen {} on {}. Do not edit by hand.\n\n",
        pinmap.mcu.display_name(),
        env!("CARGO_PKG_VERSION"),
        pinmap.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    out.push_str(&format!("#ifndef {GUARD}\n#define {GUARD}\n\n"));

    let mut names = ConstantNames::default();
    for section in net_sections(pinmap) {
        out.push_str(&format!("// {}\n", section.title));
        for net in &section.nets {
            let Some(primary) = pinmap.pins.get(*net).and_then(|pins| pins.first()) else {
                continue;
            };
            let value = match pin_number(&primary.canonical_pin) {
                Some(n) if pinmap.mcu.numeric_pins() => n.to_string(),
                _ => primary.canonical_pin.clone(),
            };
            out.push_str(&format!(
                "#define {} {}  // {}, {}\n",
                names.claim(net),
                value,
                primary.canonical_pin,
                pinmap.role_of(net)
            ));
        }
        out.push('\n');
    }

    out.push_str(&format!("#endif  // {GUARD}\n"));
    out
}
