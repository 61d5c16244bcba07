//! Output generation
//!
//! Every emitter is a pure `render` function from the canonical pinmap to a
//! string; [`write_outputs`] places the results under the output root.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::core::PinmapGenError;
use crate::pinmap::CanonicalPinmap;
use crate::roles::Role;

pub mod arduino;
pub mod json;
pub mod markdown;
pub mod mermaid;
pub mod micropython;

/// Emitted artifacts and their location relative to the output root
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Json,
    MicroPython,
    Arduino,
    Markdown,
    Mermaid,
}

impl OutputKind {
    pub fn relative_path(&self) -> &'static str {
        match self {
            OutputKind::Json => "pinmaps/pinmap.json",
            OutputKind::MicroPython => "firmware/micropython/pinmap_micropython.py",
            OutputKind::Arduino => "firmware/include/pinmap_arduino.h",
            OutputKind::Markdown => "firmware/docs/PINOUT.md",
            OutputKind::Mermaid => "firmware/docs/pinout.mmd",
        }
    }

    pub fn render(&self, pinmap: &CanonicalPinmap) -> Result<String, PinmapGenError> {
        Ok(match self {
            OutputKind::Json => json::render(pinmap).map_err(std::io::Error::from)?,
            OutputKind::MicroPython => micropython::render(pinmap),
            OutputKind::Arduino => arduino::render(pinmap),
            OutputKind::Markdown => markdown::render(pinmap),
            OutputKind::Mermaid => mermaid::render(pinmap),
        })
    }
}

#[derive(Clone, Debug)]
pub struct EmitOptions {
    pub out_root: PathBuf,
    /// Also write the Mermaid diagram
    pub mermaid: bool,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            out_root: PathBuf::from("."),
            mermaid: false,
        }
    }
}

impl EmitOptions {
    pub fn outputs(&self) -> Vec<OutputKind> {
        let mut kinds = vec![
            OutputKind::Json,
            OutputKind::MicroPython,
            OutputKind::Arduino,
            OutputKind::Markdown,
        ];
        if self.mermaid {
            kinds.push(OutputKind::Mermaid);
        }
        kinds
    }
}

/// Render every requested output and write it below `options.out_root`.
pub fn write_outputs(
    pinmap: &CanonicalPinmap,
    options: &EmitOptions,
) -> Result<Vec<PathBuf>, PinmapGenError> {
    let mut written = Vec::new();
    for kind in options.outputs() {
        let path = options.out_root.join(kind.relative_path());
        write_file(&path, &kind.render(pinmap)?)?;
        info!("Wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}

fn write_file(path: &Path, contents: &str) -> Result<(), PinmapGenError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)?;
    Ok(())
}

/// Upper-case identifier safe for C and Python
pub fn constant_name(net_name: &str) -> String {
    let mut name: String = net_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    name = name.trim_matches('_').to_string();
    if name.is_empty() {
        name.push_str("NET");
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert_str(0, "PIN_");
    }
    name
}

/// Hands out unique constant names
#[derive(Default)]
pub(crate) struct ConstantNames {
    used: BTreeSet<String>,
}

impl ConstantNames {
    pub(crate) fn claim(&mut self, net_name: &str) -> String {
        let base = constant_name(net_name);
        let mut candidate = base.clone();
        let mut n = 2;
        while !self.used.insert(candidate.clone()) {
            candidate = format!("{base}_{n}");
            n += 1;
        }
        candidate
    }
}

/// GPIO number of a numerically addressed pin (`GP12` -> 12)
pub fn pin_number(canonical_pin: &str) -> Option<u32> {
    let digits_at = canonical_pin.find(|c: char| c.is_ascii_digit())?;
    canonical_pin[digits_at..].parse().ok()
}

/// A titled set of nets, in the order emitters print them
pub(crate) struct NetSection<'a> {
    pub title: String,
    pub nets: Vec<&'a str>,
}

/// Signal nets grouped for code emitters: buses, differential pairs, then
/// one section per remaining role. Supply nets are left out.
pub(crate) fn net_sections(pinmap: &CanonicalPinmap) -> Vec<NetSection<'_>> {
    let mut placed: BTreeSet<&str> = BTreeSet::new();
    let mut sections = Vec::new();

    for bus in &pinmap.buses {
        let nets: Vec<&str> = bus
            .members
            .iter()
            .map(String::as_str)
            .filter(|n| pinmap.pins.contains_key(*n))
            .collect();
        placed.extend(nets.iter().copied());
        if !nets.is_empty() {
            sections.push(NetSection {
                title: format!("{} bus", bus.label()),
                nets,
            });
        }
    }

    let mut diff: Vec<&str> = Vec::new();
    for pair in &pinmap.differential_pairs {
        diff.push(pair.positive.as_str());
        if let Some(negative) = &pair.negative {
            diff.push(negative.as_str());
        }
    }
    diff.retain(|n| pinmap.pins.contains_key(*n));
    placed.extend(diff.iter().copied());
    if !diff.is_empty() {
        sections.push(NetSection {
            title: "Differential pairs".to_string(),
            nets: diff,
        });
    }

    let by_role: [(&str, &[Role]); 5] = [
        ("PWM outputs", &[Role::Pwm]),
        ("Analog inputs", &[Role::Adc]),
        ("Digital inputs", &[Role::GpioIn]),
        ("Digital outputs", &[Role::GpioOut]),
        ("Other signals", &[Role::Unknown]),
    ];
    for (title, roles) in by_role {
        let nets: Vec<&str> = pinmap
            .pins
            .keys()
            .map(String::as_str)
            .filter(|n| !placed.contains(n) && roles.contains(&pinmap.role_of(n)))
            .collect();
        if !nets.is_empty() {
            sections.push(NetSection {
                title: title.to_string(),
                nets,
            });
        }
    }

    sections
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_name() {
        assert_eq!(constant_name("I2C0_SDA"), "I2C0_SDA");
        assert_eq!(constant_name("led-status"), "LED_STATUS");
        assert_eq!(constant_name("+3V3"), "PIN_3V3");
        assert_eq!(constant_name("5V_EN"), "PIN_5V_EN");
        assert_eq!(constant_name("/"), "NET");
    }

    #[test]
    fn test_unique_names() {
        let mut names = ConstantNames::default();
        assert_eq!(names.claim("LED-1"), "LED_1");
        assert_eq!(names.claim("LED_1"), "LED_1_2");
        assert_eq!(names.claim("LED.1"), "LED_1_3");
    }

    #[test]
    fn test_pin_number() {
        assert_eq!(pin_number("GP12"), Some(12));
        assert_eq!(pin_number("GPIO0"), Some(0));
        assert_eq!(pin_number("VBUS"), None);
    }
}
