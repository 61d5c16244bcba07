//! PinmapGen - netlist to firmware pinmap generator
//!
//! Turns an EAGLE / Fusion 360 netlist (CSV export or `.sch` schematic) into
//! a canonical, validated pin mapping for one microcontroller, and renders
//! that mapping as firmware sources and documentation.
//!
//! # Quick Start
//!
//! ```no_run
//! use pinmapgen::{EmitOptions, PinmapCore, PipelineOptions};
//! use std::path::Path;
//!
//! let options = PipelineOptions::new("rp2040", "U1");
//! let pinmap = PinmapCore::run_file(Path::new("netlist.csv"), &options).unwrap();
//!
//! for finding in &pinmap.findings {
//!     println!("{}: {}", finding.severity, finding.message);
//! }
//!
//! pinmapgen::emit::write_outputs(&pinmap, &EmitOptions::default()).unwrap();
//! ```
//!
//! # Pipeline
//!
//! - **Parse**: CSV or EAGLE XML into raw pin/net records
//! - **Normalize**: per-MCU pin name rewriting (`GPIO4`, `IO4`, `4` -> `GP4`)
//! - **Roles**: net name heuristics, bus grouping, differential pairs
//! - **Validate**: conflicts, capabilities, MCU-specific hazards
//! - **Emit**: JSON, MicroPython, Arduino, Markdown, Mermaid

pub mod core;
pub mod emit;
pub mod normalize;
pub mod parser;
pub mod pinmap;
pub mod profiles;
pub mod roles;
pub mod validate;

// Re-export main types
pub use crate::core::{PinmapCore, PinmapGenError, PipelineOptions};
pub use emit::{write_outputs, EmitOptions, OutputKind};
pub use normalize::{normalize_records, NormalizeError, NormalizedPin, UnresolvedPin};
pub use parser::{ParseError, RawNetRecord};
pub use pinmap::{assemble, assemble_at, CanonicalPinmap, PinmapSummary};
pub use profiles::{get_profile, McuId, McuProfile, PinCapability, PinInfo};
pub use roles::{infer_roles, BusGroup, BusKind, DifferentialPair, Role};
pub use validate::{Check, Severity, ValidationFinding, ValidationInput, Validator};

/// Parse a CSV or EAGLE netlist file (convenience wrapper).
pub fn parse_netlist(path: &std::path::Path) -> Result<Vec<RawNetRecord>, PinmapGenError> {
    Ok(parser::detect_and_parse(path)?)
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        CanonicalPinmap, EmitOptions, McuId, PinmapCore, PinmapGenError, PipelineOptions,
        RawNetRecord, Role, Severity, ValidationFinding,
    };
}
