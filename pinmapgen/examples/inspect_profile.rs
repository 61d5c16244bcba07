//! Example: inspect an MCU profile and try its pin name normalization.
//! Run with: cargo run --example inspect_profile [mcu] [pin names...]

use pinmapgen::profiles::get_profile;

fn main() -> Result<(), pinmapgen::PinmapGenError> {
    let mut args = std::env::args().skip(1);
    let mcu = args.next().unwrap_or_else(|| "rp2040".to_string());
    let profile = get_profile(&mcu)?;

    println!("{} ({} pins)", profile.id().display_name(), profile.pin_table().len());
    for (name, info) in profile.pin_table() {
        let caps: Vec<&str> = info.capabilities.iter().map(|c| c.as_str()).collect();
        let reserved = if profile.reserved_pins().contains(name) {
            " [reserved]"
        } else {
            ""
        };
        println!(
            "  {:<8} {}{}{}",
            name,
            caps.join(","),
            info.special_function
                .map(|f| format!(" ({f})"))
                .unwrap_or_default(),
            reserved
        );
    }

    println!("Checks:");
    for check in profile.checks() {
        println!("  {:<24} {}", check.id(), check.description());
    }

    for raw in args {
        match profile.normalize(&raw) {
            Ok(canonical) => println!("{raw} -> {canonical}"),
            Err(e) => println!("{raw}: {e}"),
        }
    }
    Ok(())
}
