use crate::pinmap::CanonicalPinmap;
use crate::validate::Severity;

/// Human-readable pinout reference
pub fn render(pinmap: &CanonicalPinmap) -> String {
    let mut out = String::new();
    let designator = pinmap
        .pins
        .values()
        .flatten()
        .next()
        .map(|p| p.designator.as_str())
        .unwrap_or("MCU");

    out.push_str(&format!(
        "# {} Pinout ({})\n\n",
        pinmap.mcu.display_name(),
        designator
    ));
    out.push_str(&format!(
        "_Generated by pinmapgen {} on {}._\n\n",
        env!("CARGO_PKG_VERSION"),
        pinmap.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    out.push_str("## Pin Assignments\n\n");
    out.push_str("| Net | Pin | Schematic Pin | Role | Bus |\n");
    out.push_str("|-----|-----|---------------|------|-----|\n");
    for (net, pins) in &pinmap.pins {
        let canonical: Vec<&str> = pins.iter().map(|p| p.canonical_pin.as_str()).collect();
        let raw: Vec<&str> = pins.iter().map(|p| p.raw_pin.as_str()).collect();
        let bus = pinmap.bus_of(net).map(|b| b.label()).unwrap_or_default();
        out.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            net,
            canonical.join(", "),
            raw.join(", "),
            pinmap.role_of(net).description(),
            bus
        ));
    }
    out.push('\n');

    if !pinmap.buses.is_empty() {
        out.push_str("## Buses\n\n");
        for bus in &pinmap.buses {
            out.push_str(&format!("- **{}**: {}\n", bus.label(), bus.members.join(", ")));
        }
        out.push('\n');
    }

    if !pinmap.differential_pairs.is_empty() {
        out.push_str("## Differential Pairs\n\n");
        for pair in &pinmap.differential_pairs {
            match &pair.negative {
                Some(negative) => {
                    out.push_str(&format!("- {} / {}\n", pair.positive, negative))
                }
                None => out.push_str(&format!(
                    "- {} / _missing {}_\n",
                    pair.positive,
                    pair.expected_negative()
                )),
            }
        }
        out.push('\n');
    }

    out.push_str("## Validation\n\n");
    if pinmap.findings.is_empty() {
        out.push_str("No issues found.\n");
    } else {
        for finding in &pinmap.findings {
            let marker = match finding.severity {
                Severity::Error => "**ERROR**",
                Severity::Warning => "Warning",
            };
            out.push_str(&format!(
                "- {} `{}`: {}\n",
                marker, finding.check, finding.message
            ));
        }
    }

    out
}
