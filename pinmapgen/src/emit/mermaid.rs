use std::collections::BTreeMap;

use super::ConstantNames;
use crate::pinmap::CanonicalPinmap;

/// Node ids per net, unique even when two names sanitize alike
fn node_ids(pinmap: &CanonicalPinmap) -> BTreeMap<&str, String> {
    let mut names = ConstantNames::default();
    pinmap
        .pins
        .keys()
        .map(|net| (net.as_str(), format!("net_{}", names.claim(net))))
        .collect()
}

/// Mermaid flowchart linking the MCU to each of its nets
pub fn render(pinmap: &CanonicalPinmap) -> String {
    let mut out = String::from("graph LR\n");
    let designator = pinmap
        .pins
        .values()
        .flatten()
        .next()
        .map(|p| p.designator.as_str())
        .unwrap_or("MCU");
    out.push_str(&format!(
        "    MCU[\"{} ({})\"]\n",
        pinmap.mcu.display_name(),
        designator
    ));

    let ids = node_ids(pinmap);
    for (net, pins) in &pinmap.pins {
        let Some(id) = ids.get(net.as_str()) else {
            continue;
        };
        out.push_str(&format!(
            "    {}[\"{}<br/>{}\"]\n",
            id,
            net.replace('"', "'"),
            pinmap.role_of(net)
        ));
        for pin in pins {
            out.push_str(&format!("    MCU -->|{}| {}\n", pin.canonical_pin, id));
        }
    }

    for bus in &pinmap.buses {
        out.push_str(&format!("    subgraph {}\n", bus.label()));
        for member in &bus.members {
            if let Some(id) = ids.get(member.as_str()) {
                out.push_str(&format!("        {}\n", id));
            }
        }
        out.push_str("    end\n");
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{PinmapCore, PipelineOptions};
    use crate::parser::RawNetRecord;

    fn rp2040(records: &[RawNetRecord]) -> CanonicalPinmap {
        PinmapCore::run(records, &PipelineOptions::new("rp2040", "U1")).unwrap()
    }

    #[test]
    fn test_node_ids_are_safe() {
        let pinmap = rp2040(&[
            RawNetRecord::new("I2C0_SDA", "GP0", "RP2040", "U1"),
            RawNetRecord::new("status.led", "GP2", "RP2040", "U1"),
        ]);
        let ids = node_ids(&pinmap);
        assert_eq!(ids["I2C0_SDA"], "net_I2C0_SDA");
        assert_eq!(ids["status.led"], "net_STATUS_LED");
    }

    #[test]
    fn test_similar_names_get_distinct_nodes() {
        let pinmap = rp2040(&[
            RawNetRecord::new("LED-1", "GP2", "RP2040", "U1"),
            RawNetRecord::new("LED_1", "GP3", "RP2040", "U1"),
        ]);
        let text = render(&pinmap);

        assert!(text.contains("net_LED_1[\"LED-1<br/>gpio_out\"]"));
        assert!(text.contains("net_LED_1_2[\"LED_1<br/>gpio_out\"]"));
        assert!(text.contains("MCU -->|GP2| net_LED_1\n"));
        assert!(text.contains("MCU -->|GP3| net_LED_1_2\n"));
    }
}
