//! EAGLE / Fusion 360 schematic reader
//!
//! Extracts pin-to-net connections from the XML schematic format
//! (`eagle/drawing/schematic`). Connections live in
//! `sheets/sheet/nets/net/segment/pinref`; component types come from
//! `parts/part`. Geometry (wires, junctions, labels) is ignored: the net
//! name attribute already carries the connectivity.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::debug;

use super::{ParseError, RawNetRecord};

const UNKNOWN_COMPONENT: &str = "UNKNOWN";

#[derive(Debug, Default)]
struct PartInfo {
    deviceset: Option<String>,
    library: Option<String>,
}

impl PartInfo {
    fn component_type(&self) -> &str {
        self.deviceset
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.library.as_deref().filter(|s| !s.is_empty()))
            .unwrap_or(UNKNOWN_COMPONENT)
    }
}

struct PinRef {
    net: String,
    part: String,
    pin: String,
}

pub struct EagleSchematicParser;

impl EagleSchematicParser {
    pub fn parse_file(path: &Path) -> Result<Vec<RawNetRecord>, ParseError> {
        let content = fs::read_to_string(path).map_err(|source| ParseError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_str(&content)
    }

    pub fn parse_str(content: &str) -> Result<Vec<RawNetRecord>, ParseError> {
        let mut reader = Reader::from_str(content);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<String> = Vec::new();
        let mut parts: HashMap<String, PartInfo> = HashMap::new();
        let mut pinrefs: Vec<PinRef> = Vec::new();
        let mut current_net: Option<String> = None;
        let mut seen_root = false;
        let mut seen_schematic = false;

        loop {
            let (element, is_empty) = match reader.read_event()? {
                Event::Start(e) => (e, false),
                Event::Empty(e) => (e, true),
                Event::End(_) => {
                    if stack.pop().as_deref() == Some("net") {
                        current_net = None;
                    }
                    continue;
                }
                Event::Eof => break,
                _ => continue,
            };

            let name = String::from_utf8_lossy(element.local_name().as_ref()).into_owned();
            let parent = stack.last().map(String::as_str);

            if !seen_root {
                if name != "eagle" {
                    return Err(ParseError::NotEagle(name));
                }
                seen_root = true;
            }

            match (name.as_str(), parent) {
                ("schematic", Some("drawing")) => seen_schematic = true,
                ("part", Some("parts")) => {
                    if let Some(part_name) = attribute(&element, b"name")? {
                        parts.insert(
                            part_name,
                            PartInfo {
                                deviceset: attribute(&element, b"deviceset")?,
                                library: attribute(&element, b"library")?,
                            },
                        );
                    }
                }
                ("net", Some("nets")) if !is_empty => {
                    current_net = attribute(&element, b"name")?;
                }
                ("pinref", Some("segment")) => {
                    if let (Some(net), Some(part), Some(pin)) = (
                        current_net.as_ref(),
                        attribute(&element, b"part")?,
                        attribute(&element, b"pin")?,
                    ) {
                        pinrefs.push(PinRef {
                            net: net.clone(),
                            part,
                            pin,
                        });
                    }
                }
                _ => {}
            }

            if !is_empty {
                stack.push(name);
            }
        }

        if !seen_root {
            return Err(ParseError::NotEagle(String::new()));
        }
        if !seen_schematic {
            return Err(ParseError::MissingSchematic);
        }

        let unknown = PartInfo::default();
        let records: Vec<RawNetRecord> = pinrefs
            .iter()
            .map(|r| {
                let component = parts.get(&r.part).unwrap_or(&unknown).component_type();
                RawNetRecord::new(&r.net, &r.pin, component, &r.part)
            })
            .collect();

        if records.is_empty() {
            return Err(ParseError::NoRecords);
        }

        debug!(
            "Parsed {} pin references across {} parts from EAGLE schematic",
            records.len(),
            parts.len()
        );
        Ok(records)
    }
}

fn attribute(element: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>, ParseError> {
    for attr in element.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.as_ref() == key {
            return Ok(Some(attr.unescape_value()?.trim().to_string()));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMATIC: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE eagle SYSTEM "eagle.dtd">
<eagle version="9.6.2">
  <drawing>
    <schematic>
      <parts>
        <part name="U1" library="rp2040" deviceset="RP2040" device=""/>
        <part name="R1" library="rcl" deviceset="" device="R0603"/>
      </parts>
      <sheets>
        <sheet>
          <nets>
            <net name="LED" class="0">
              <segment>
                <wire x1="0" y1="0" x2="1" y2="0" width="0.1524" layer="91"/>
                <pinref part="U1" gate="G$1" pin="GPIO25"/>
                <wire x1="1" y1="0" x2="2" y2="0" width="0.1524" layer="91"/>
                <pinref part="R1" gate="G$1" pin="1"/>
              </segment>
            </net>
            <net name="GND &amp; SHIELD" class="0">
              <segment>
                <pinref part="X9" gate="G$1" pin="2"/>
              </segment>
            </net>
          </nets>
        </sheet>
      </sheets>
    </schematic>
  </drawing>
</eagle>
"#;

    #[test]
    fn test_parse_pinrefs() {
        let records = EagleSchematicParser::parse_str(SCHEMATIC).unwrap();
        assert_eq!(
            records,
            vec![
                RawNetRecord::new("LED", "GPIO25", "RP2040", "U1"),
                RawNetRecord::new("LED", "1", "rcl", "R1"),
                RawNetRecord::new("GND & SHIELD", "2", "UNKNOWN", "X9"),
            ]
        );
    }

    #[test]
    fn test_rejects_non_eagle() {
        assert!(matches!(
            EagleSchematicParser::parse_str("<kicad_sch/>"),
            Err(ParseError::NotEagle(root)) if root == "kicad_sch"
        ));
    }

    #[test]
    fn test_rejects_board_file() {
        let board = r#"<eagle version="9.6.2"><drawing><board/></drawing></eagle>"#;
        assert!(matches!(
            EagleSchematicParser::parse_str(board),
            Err(ParseError::MissingSchematic)
        ));
    }
}
