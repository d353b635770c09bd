//! labdrv: inspect vendor instrument libraries from the command line.
//!
//! Probes the native libraries behind the laboratory drivers, decodes their
//! status codes and exercises the channel bitmask codec.

mod config;
mod output;
mod probe;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lib_drivers::sepia2::SupportRequestOptions;
use lib_types::{decode_bitmask, encode_bitmask, BitMask8};
use output::Report;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "labdrv")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Output format
    #[arg(short, long, default_value = "text", global = true)]
    format: OutputFormat,

    /// Configuration file (TOML, or JSON by extension)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum Vendor {
    /// PicoQuant Sepia II
    Sepia2,
    /// Andor SDK
    Andor,
    /// attocube attoDRY
    Attodry,
    /// Thorlabs APT
    Apt,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a vendor library and report library and device information
    Probe {
        vendor: Vendor,
    },

    /// Name and describe a vendor status code
    DecodeError {
        vendor: Vendor,

        /// Status code returned by the library
        #[arg(allow_negative_numbers = true)]
        code: i32,
    },

    /// Create a PicoQuant support request for a Sepia II device
    SupportRequest {
        /// USB device index
        #[arg(short, long, default_value = "0")]
        device: i32,

        /// Text placed before the generated report
        #[arg(long, default_value = "")]
        preamble: String,

        /// Name of the software reported as caller
        #[arg(long, default_value = "labdrv")]
        calling_software: String,

        /// Omit the title line
        #[arg(long)]
        no_title: bool,

        /// Omit operating system information
        #[arg(long)]
        no_system_info: bool,

        /// Write the text to a file instead of printing it
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Convert channel-enable registers
    Bitmask {
        #[command(subcommand)]
        action: BitmaskAction,
    },

    /// Print the effective configuration
    ShowConfig,
}

#[derive(Subcommand)]
enum BitmaskAction {
    /// Expand a register byte (decimal, 0x.. or 0b..) into channel flags
    Decode {
        #[arg(value_parser = parse_byte)]
        value: u8,
    },

    /// Pack eight channel flags, written as 0/1 from channel 0, into a byte
    Encode {
        bits: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    let config = config::resolve_config(cli.config.as_deref())?;

    let report = match cli.command {
        Commands::Probe { vendor } => probe::probe(vendor, &config)?,
        Commands::DecodeError { vendor, code } => probe::decode_error(vendor, code, &config)?,
        Commands::SupportRequest {
            device,
            preamble,
            calling_software,
            no_title,
            no_system_info,
            output,
        } => {
            let mut options = SupportRequestOptions::empty();
            options.set(SupportRequestOptions::NO_PREAMBLE, preamble.is_empty());
            options.set(SupportRequestOptions::NO_TITLE, no_title);
            options.set(SupportRequestOptions::NO_SYSTEM_INFO, no_system_info);
            let request = probe::SupportRequest {
                device,
                preamble,
                calling_software,
                options,
                output,
            };
            probe::support_request(&request, &config)?
        }
        Commands::Bitmask { action } => match action {
            BitmaskAction::Decode { value } => bitmask_decode(value)?,
            BitmaskAction::Encode { bits } => bitmask_encode(&bits)?,
        },
        Commands::ShowConfig => show_config(&config, cli.format)?,
    };

    output::print_report(&report, cli.format)
}

fn parse_byte(s: &str) -> Result<u8, String> {
    let parsed = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u8::from_str_radix(hex, 16)
    } else if let Some(bin) = s.strip_prefix("0b") {
        u8::from_str_radix(bin, 2)
    } else {
        s.parse()
    };
    parsed.map_err(|e| format!("invalid register byte {s:?}: {e}"))
}

/// Parse `0`/`1` flags; `_` and spaces may separate groups.
fn parse_flags(bits: &str) -> Result<Vec<bool>> {
    bits.chars()
        .filter(|c| *c != '_' && !c.is_whitespace())
        .map(|c| match c {
            '0' => Ok(false),
            '1' => Ok(true),
            other => anyhow::bail!("invalid flag {:?}, expected 0 or 1", other),
        })
        .collect()
}

fn channels_report(byte: u8) -> Result<Report> {
    let mask = BitMask8(byte);
    let mut report = Report::new("Channel bitmask");
    report.push("value", byte)?;
    report.push("hex", format!("{byte:#04x}"))?;
    report.push("binary", mask.to_string())?;
    report.push("channels", decode_bitmask(byte))?;
    report.push("enabled", mask.enabled().collect::<Vec<_>>())?;
    Ok(report)
}

fn bitmask_decode(value: u8) -> Result<Report> {
    tracing::debug!(value, "Decoding channel bitmask");
    channels_report(value)
}

fn bitmask_encode(bits: &str) -> Result<Report> {
    let flags = parse_flags(bits)?;
    let byte = encode_bitmask(&flags).context("Channel registers hold exactly eight flags")?;
    channels_report(byte)
}

fn show_config(config: &config::DriverConfig, format: OutputFormat) -> Result<Report> {
    let mut report = Report::new("Configuration");
    match format {
        OutputFormat::Text => {
            let text = toml::to_string_pretty(config)?;
            report.push("toml", format!("\n{}", text.trim_end()))?;
        }
        OutputFormat::Json => report.push("config", config)?,
    }
    Ok(report)
}
