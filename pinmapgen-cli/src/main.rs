//! PinmapGen CLI - turn EAGLE/Fusion netlists into firmware pinmaps.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use notify::RecursiveMode;
use notify_debouncer_mini::new_debouncer;
use pinmapgen::emit::write_outputs;
use pinmapgen::profiles::profile_for;
use pinmapgen::{
    CanonicalPinmap, EmitOptions, McuId, PinmapCore, PipelineOptions, Severity, ValidationFinding,
};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::mpsc;
use std::time::Duration;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pinmapgen")]
#[command(about = "Generate firmware pinmaps from EAGLE/Fusion netlists", long_about = None)]
#[command(version)]
struct Cli {
    /// Log pipeline details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct InputArgs {
    #[command(flatten)]
    source: Source,

    /// Target MCU profile
    #[arg(long, default_value = "rp2040")]
    mcu: String,

    /// Reference designator of the MCU in the netlist
    #[arg(long, default_value = "U1")]
    mcu_ref: String,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct Source {
    /// Fusion/EAGLE CSV netlist export
    #[arg(long, value_name = "FILE")]
    csv: Option<PathBuf>,

    /// EAGLE .sch schematic
    #[arg(long, value_name = "FILE")]
    sch: Option<PathBuf>,
}

impl Source {
    fn path(&self) -> &Path {
        match (&self.csv, &self.sch) {
            (Some(path), _) | (None, Some(path)) => path.as_path(),
            // clap enforces exactly one of the two
            (None, None) => Path::new(""),
        }
    }
}

impl InputArgs {
    fn options(&self) -> PipelineOptions {
        PipelineOptions::new(&self.mcu, &self.mcu_ref)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Generate pinmap JSON, firmware headers and docs
    Generate {
        #[command(flatten)]
        input: InputArgs,

        /// Root directory for generated files
        #[arg(long, value_name = "DIR", default_value = ".")]
        out_root: PathBuf,

        /// Also write a Mermaid pin diagram
        #[arg(long)]
        mermaid: bool,

        /// Findings output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,

        /// Exit with error code if findings at this severity or higher exist
        #[arg(long, value_enum)]
        fail_on: Option<FailOnSeverity>,
    },

    /// Validate a netlist without writing any files
    Check {
        #[command(flatten)]
        input: InputArgs,

        /// Findings output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,

        /// Exit with error code if findings at this severity or higher exist
        #[arg(long, value_enum)]
        fail_on: Option<FailOnSeverity>,
    },

    /// Regenerate outputs whenever the netlist changes
    Watch {
        #[command(flatten)]
        input: InputArgs,

        /// Root directory for generated files
        #[arg(long, value_name = "DIR", default_value = ".")]
        out_root: PathBuf,

        /// Also write a Mermaid pin diagram
        #[arg(long)]
        mermaid: bool,

        /// Quiet period before regenerating
        #[arg(long, value_name = "MS", default_value_t = 500)]
        debounce_ms: u64,
    },

    /// List supported MCU profiles
    Profiles {
        /// Print every pin with its capabilities
        #[arg(short, long)]
        pins: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output for CI/CD
    Json,
    /// GitHub Actions annotations
    Github,
}

#[derive(Clone, ValueEnum)]
enum FailOnSeverity {
    Error,
    Warning,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let exit_code = match cli.command {
        Commands::Generate {
            input,
            out_root,
            mermaid,
            format,
            fail_on,
        } => handle_generate(&input, out_root, mermaid, format, fail_on),
        Commands::Check {
            input,
            format,
            fail_on,
        } => handle_check(&input, format, fail_on),
        Commands::Watch {
            input,
            out_root,
            mermaid,
            debounce_ms,
        } => match handle_watch(&input, out_root, mermaid, debounce_ms) {
            Ok(()) => 0,
            Err(e) => {
                eprintln!("Error: {:#}", e);
                1
            }
        },
        Commands::Profiles { pins } => {
            handle_profiles(pins);
            0
        }
    };

    process::exit(exit_code);
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("warn,pinmapgen=debug,pinmapgen_cli=debug")
        } else {
            EnvFilter::new("warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn handle_generate(
    input: &InputArgs,
    out_root: PathBuf,
    mermaid: bool,
    format: OutputFormat,
    fail_on: Option<FailOnSeverity>,
) -> i32 {
    let path = input.source.path();
    let pinmap = match PinmapCore::run_file(path, &input.options()) {
        Ok(pinmap) => pinmap,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let options = EmitOptions { out_root, mermaid };
    let written = match write_outputs(&pinmap, &options) {
        Ok(written) => written,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    output_results(path, &pinmap, &format);
    if matches!(format, OutputFormat::Human) {
        println!("\n  Generated:");
        for file in &written {
            println!("    {}", file.display());
        }
    }

    exit_code_for(&pinmap, fail_on.as_ref())
}

fn handle_check(input: &InputArgs, format: OutputFormat, fail_on: Option<FailOnSeverity>) -> i32 {
    let path = input.source.path();
    match PinmapCore::run_file(path, &input.options()) {
        Ok(pinmap) => {
            output_results(path, &pinmap, &format);
            exit_code_for(&pinmap, fail_on.as_ref())
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn handle_watch(input: &InputArgs, out_root: PathBuf, mermaid: bool, debounce_ms: u64) -> Result<()> {
    let path = input
        .source
        .path()
        .canonicalize()
        .with_context(|| format!("Failed to resolve netlist path: {:?}", input.source.path()))?;
    let watch_dir = path
        .parent()
        .map(Path::to_path_buf)
        .with_context(|| format!("Netlist has no parent directory: {:?}", path))?;
    let options = EmitOptions { out_root, mermaid };

    regenerate(&path, input, &options);

    let (tx, rx) = mpsc::channel();
    let mut debouncer = new_debouncer(Duration::from_millis(debounce_ms), tx)
        .context("Failed to create file watcher debouncer")?;
    // editors often replace the file on save, so watch the directory
    debouncer
        .watcher()
        .watch(&watch_dir, RecursiveMode::NonRecursive)
        .with_context(|| format!("Failed to start watching: {:?}", watch_dir))?;

    info!("Watching {:?} for changes", path);
    println!("Watching {} (Ctrl+C to stop)", path.display());

    for result in rx {
        match result {
            Ok(events) => {
                let touched = events
                    .iter()
                    .any(|event| event.path.file_name() == path.file_name());
                if touched {
                    debug!("Netlist changed, regenerating");
                    regenerate(&path, input, &options);
                }
            }
            Err(e) => warn!("Watch error: {:?}", e),
        }
    }

    Ok(())
}

/// One watch cycle; failures are reported and the watcher keeps running.
fn regenerate(path: &Path, input: &InputArgs, options: &EmitOptions) {
    let pinmap = match PinmapCore::run_file(path, &input.options()) {
        Ok(pinmap) => pinmap,
        Err(e) => {
            eprintln!("Error: {}", e);
            return;
        }
    };

    match write_outputs(&pinmap, options) {
        Ok(written) => {
            let summary = pinmap.summary();
            println!(
                "[{}] {} nets, {} errors, {} warnings, {} files written",
                timestamp(&pinmap),
                summary.nets,
                summary.errors,
                summary.warnings,
                written.len()
            );
            for finding in &pinmap.findings {
                println!("  {} [{}] {}", finding.severity, finding.check, finding.message);
            }
        }
        Err(e) => eprintln!("Error: {}", e),
    }
}

fn timestamp(pinmap: &CanonicalPinmap) -> String {
    pinmap.generated_at.format("%H:%M:%S").to_string()
}

fn exit_code_for(pinmap: &CanonicalPinmap, fail_on: Option<&FailOnSeverity>) -> i32 {
    match fail_on {
        Some(severity) if should_fail(pinmap, severity) => 1,
        _ => 0,
    }
}

fn should_fail(pinmap: &CanonicalPinmap, severity: &FailOnSeverity) -> bool {
    match severity {
        FailOnSeverity::Error => pinmap.has_errors(),
        FailOnSeverity::Warning => pinmap.has_errors() || pinmap.has_warnings(),
    }
}

fn output_results(path: &Path, pinmap: &CanonicalPinmap, format: &OutputFormat) {
    match format {
        OutputFormat::Human => output_human(path, pinmap),
        OutputFormat::Json => output_json(path, pinmap),
        OutputFormat::Github => output_github(path, pinmap),
    }
}

fn output_human(path: &Path, pinmap: &CanonicalPinmap) {
    println!("\nFile: {}", path.display());
    println!("MCU:  {}", pinmap.mcu.display_name());
    println!("{}", "─".repeat(60));

    for (net, pins) in &pinmap.pins {
        let names: Vec<&str> = pins.iter().map(|p| p.canonical_pin.as_str()).collect();
        println!("  {:<20} {:<12} {}", net, names.join(", "), pinmap.role_of(net));
    }

    if pinmap.findings.is_empty() {
        println!("\n  No issues found");
    } else {
        print_findings("ERRORS", pinmap.errors());
        print_findings("WARNINGS", pinmap.warnings());
    }

    let summary = pinmap.summary();
    println!("\n  Summary:");
    println!("    Nets:     {}", summary.nets);
    println!("    Pins:     {}", summary.pins);
    println!("    Buses:    {}", summary.buses);
    println!("    Errors:   {}", summary.errors);
    println!("    Warnings: {}", summary.warnings);
}

fn print_findings<'a>(title: &str, findings: impl Iterator<Item = &'a ValidationFinding>) {
    let findings: Vec<_> = findings.collect();
    if findings.is_empty() {
        return;
    }
    println!("\n  {}:", title);
    for finding in findings {
        println!("    - [{}] {}", finding.check, finding.message);
    }
}

fn output_json(path: &Path, pinmap: &CanonicalPinmap) {
    let output = serde_json::json!({
        "file": path.display().to_string(),
        "mcu": pinmap.mcu,
        "findings": pinmap.findings,
        "summary": pinmap.summary(),
    });
    match serde_json::to_string_pretty(&output) {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("Error: {}", e),
    }
}

fn output_github(path: &Path, pinmap: &CanonicalPinmap) {
    for finding in &pinmap.findings {
        let level = match finding.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        println!(
            "::{} file={}::{}",
            level,
            path.display(),
            finding.message.replace('\n', " ")
        );
    }
}

fn handle_profiles(pins: bool) {
    println!("Supported MCU profiles:\n");

    for id in McuId::ALL {
        let profile = profile_for(id);
        println!("  {}", id);
        println!("    {} ({} pins)", id.display_name(), profile.pin_table().len());

        if pins {
            for (name, info) in profile.pin_table() {
                let capabilities: Vec<&str> =
                    info.capabilities.iter().map(|c| c.as_str()).collect();
                let reserved = if profile.reserved_pins().contains(name) {
                    " [reserved]"
                } else {
                    ""
                };
                print!("      {:<8} {}{}", name, capabilities.join(","), reserved);
                match info.special_function {
                    Some(special) => println!("  ({})", special),
                    None => println!(),
                }
            }
        }
        println!();
    }
}
