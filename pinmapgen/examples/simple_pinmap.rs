//! Example: generate a pinmap and all firmware outputs from a netlist.
//! Run with: cargo run --example simple_pinmap [netlist.csv|netlist.sch] [mcu] [mcu-ref]

use pinmapgen::{EmitOptions, PinmapCore, PipelineOptions, Severity};
use std::path::{Path, PathBuf};

fn main() -> Result<(), pinmapgen::PinmapGenError> {
    let mut args = std::env::args().skip(1);
    let path = args
        .next()
        .unwrap_or_else(|| "tests/fixtures/sensor_hub.csv".to_string());
    let mcu = args.next().unwrap_or_else(|| "rp2040".to_string());
    let mcu_ref = args.next().unwrap_or_else(|| "U1".to_string());
    let path = Path::new(&path);

    if !path.exists() {
        eprintln!("File not found: {}", path.display());
        eprintln!("Usage: cargo run --example simple_pinmap [netlist] [mcu] [mcu-ref]");
        std::process::exit(1);
    }

    let pinmap = PinmapCore::run_file(path, &PipelineOptions::new(mcu, mcu_ref))?;

    println!("{} pinmap for {}", pinmap.mcu.display_name(), path.display());
    for (net, pins) in &pinmap.pins {
        let names: Vec<&str> = pins.iter().map(|p| p.canonical_pin.as_str()).collect();
        println!("  {:<16} {:<10} {}", net, names.join(","), pinmap.role_of(net));
    }

    for finding in &pinmap.findings {
        let tag = match finding.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARN ",
        };
        println!("  [{}] {}", tag, finding.message);
    }

    let options = EmitOptions {
        out_root: PathBuf::from("target/pinmap-example"),
        mermaid: true,
    };
    for written in pinmapgen::write_outputs(&pinmap, &options)? {
        println!("Wrote {}", written.display());
    }

    if pinmap.has_errors() {
        std::process::exit(1);
    }
    Ok(())
}
