use serde_json::{json, Map, Value};

use crate::pinmap::CanonicalPinmap;

/// Canonical pinmap document, consumed by firmware tooling and CI.
pub fn render(pinmap: &CanonicalPinmap) -> Result<String, serde_json::Error> {
    let mut pins = Map::new();
    for (net, net_pins) in &pinmap.pins {
        let role = pinmap.role_of(net);
        let canonical: Vec<&str> = net_pins.iter().map(|p| p.canonical_pin.as_str()).collect();
        let raw: Vec<&str> = net_pins.iter().map(|p| p.raw_pin.as_str()).collect();
        pins.insert(
            net.clone(),
            json!({
                "pins": canonical,
                "raw_pins": raw,
                "role": role,
                "description": role.description(),
                "bus": pinmap.bus_of(net).map(|bus| bus.label()),
            }),
        );
    }

    let buses: Vec<Value> = pinmap
        .buses
        .iter()
        .map(|bus| {
            json!({
                "name": bus.label(),
                "kind": bus.kind,
                "instance": bus.instance,
                "members": bus.members,
            })
        })
        .collect();

    let document = json!({
        "mcu": pinmap.mcu,
        "pins": Value::Object(pins),
        "buses": buses,
        "differential_pairs": pinmap.differential_pairs,
        "findings": pinmap.findings,
        "summary": pinmap.summary(),
        "metadata": {
            "generator": "pinmapgen",
            "version": env!("CARGO_PKG_VERSION"),
            "generated_at": pinmap.generated_at.to_rfc3339(),
        },
    });

    let mut out = serde_json::to_string_pretty(&document)?;
    out.push('\n');
    Ok(out)
}
