//! Commands that talk to the vendor libraries.

use crate::config::DriverConfig;
use crate::output::Report;
use crate::Vendor;
use anyhow::{Context, Result};
use lib_drivers::sepia2::SupportRequestOptions;
use lib_drivers::{andor, apt, Andor, Apt, AttoDry, Sepia2};
use lib_native_ffi::{ErrorDecoder, MessageTable, Watchdog};
use lib_types::{CodeEnum, StatusCode};
use std::path::PathBuf;

/// Load a vendor library, start its session where it has one and report
/// what the library and the attached hardware say about themselves.
pub fn probe(vendor: Vendor, config: &DriverConfig) -> Result<Report> {
    tracing::info!(vendor = ?vendor, "Probing vendor library");
    match vendor {
        Vendor::Sepia2 => probe_sepia2(config),
        Vendor::Andor => probe_andor(config),
        Vendor::Attodry => probe_attodry(config),
        Vendor::Apt => probe_apt(config),
    }
}

fn open_sepia2(config: &DriverConfig) -> Result<Sepia2> {
    // SAFETY: the locator only resolves the PicoQuant library name or a path
    // the user configured for it.
    let sepia = unsafe { Sepia2::open(config.sepia2.path.as_deref(), config.sepia2_encoding()) }
        .context("Failed to open the Sepia II library")?;
    Ok(sepia.with_watchdog(Watchdog::new(config.watchdog.clone())))
}

fn probe_sepia2(config: &DriverConfig) -> Result<Report> {
    let mut sepia = open_sepia2(config)?;
    let mut report = Report::new("PicoQuant Sepia II");
    report.push("library", sepia.binding().path())?;
    report.push("version", sepia.library_version()?)?;
    report.push("usb_devices", sepia.list_usb_devices()?)?;
    sepia.close()?;
    Ok(report)
}

fn probe_andor(config: &DriverConfig) -> Result<Report> {
    // SAFETY: as for Sepia II, with the Andor SDK.
    let andor = unsafe { Andor::open(config.andor.library.path.as_deref(), config.andor_encoding()) }
        .context("Failed to open the Andor SDK")?;
    let mut andor = andor.with_watchdog(Watchdog::new(config.watchdog.clone()));
    let mut report = Report::new("Andor SDK");
    report.push("library", andor.binding().path())?;

    andor
        .initialize(&config.andor.init_dir)
        .context("Failed to initialize the Andor camera")?;
    report.push("head_model", andor.head_model()?)?;
    report.push("serial_number", andor.camera_serial_number()?)?;
    report.push("detector", andor.detector()?)?;
    report.push("hardware_version", andor.hardware_version()?)?;
    report.push("temperature", andor.temperature()?)?;
    andor.close()?;
    Ok(report)
}

fn probe_attodry(config: &DriverConfig) -> Result<Report> {
    let device = config.attodry.device_type;
    // SAFETY: as for Sepia II, with the attoDRY interface library.
    let mut dry = unsafe {
        AttoDry::open(config.attodry.library.path.as_deref(), config.attodry_encoding(), device)
    }
    .context("Failed to start the attoDRY interface")?;
    let mut report = Report::new("attocube attoDRY");
    report.push("library", dry.binding().path())?;
    report.push("device_type", device)?;

    match config.attodry.com_port.as_deref() {
        Some(port) => {
            dry.connect(port)
                .with_context(|| format!("Failed to connect to the cryostat on {port}"))?;
            report.push("com_port", port)?;
            report.push("connected", dry.is_connected()?)?;
            report.push("initialised", dry.is_initialised()?)?;
            report.push("sample_temperature_k", dry.sample_temperature()?)?;
            report.push("user_temperature_k", dry.user_temperature()?)?;
            report.push("error_status", dry.error_status()?)?;
            dry.disconnect()?;
        }
        None => tracing::info!("No COM port configured, skipping cryostat connection"),
    }
    dry.close()?;
    Ok(report)
}

fn probe_apt(config: &DriverConfig) -> Result<Report> {
    let hardware = config.apt.hardware_type()?;
    // SAFETY: as for Sepia II, with the Thorlabs APT server.
    let apt = unsafe { Apt::open(config.apt.library.path.as_deref(), config.apt_encoding()) }
        .context("Failed to start the APT server")?;
    let mut apt = apt.with_watchdog(Watchdog::new(config.watchdog.clone()));
    let mut report = Report::new("Thorlabs APT");
    report.push("library", apt.binding().path())?;
    report.push("hardware_type", hardware.name())?;

    apt.enable_event_dialog(false)?;
    let mut units = Vec::new();
    for unit in apt.list_hardware_units(hardware)? {
        let info = apt.hardware_info(unit.serial)?;
        units.push(serde_json::json!({
            "index": unit.index,
            "serial": unit.serial,
            "model": info.model,
            "software_version": info.software_version,
        }));
    }
    report.push("units", units)?;
    apt.close()?;
    Ok(report)
}

/// Name and describe a vendor status code.
///
/// Only Sepia II decodes through its library; the other vendors' names and
/// messages are compiled in, or absent.
pub fn decode_error(vendor: Vendor, code: i32, config: &DriverConfig) -> Result<Report> {
    let (name, message) = match vendor {
        Vendor::Sepia2 => {
            let mut sepia = open_sepia2(config)?;
            let message = sepia.decode_error(code)?;
            sepia.close()?;
            (None, Some(message))
        }
        Vendor::Andor => (andor::exit_code_name(code), None),
        Vendor::Attodry => (None, None),
        Vendor::Apt => (None, MessageTable(apt::ERROR_MESSAGES).decode(StatusCode(code)).ok()),
    };

    let mut report = Report::new(format!("{vendor:?} status code"));
    report.push("code", code)?;
    report.push("name", name)?;
    report.push("message", message)?;
    Ok(report)
}

/// Inputs to a Sepia II support request.
#[derive(Clone, Debug)]
pub struct SupportRequest {
    pub device: i32,
    pub preamble: String,
    pub calling_software: String,
    pub options: SupportRequestOptions,
    pub output: Option<PathBuf>,
}

/// Render a support request for the Sepia II device at USB index `device`.
pub fn support_request(request: &SupportRequest, config: &DriverConfig) -> Result<Report> {
    let mut sepia = open_sepia2(config)?;
    let device = sepia
        .usb_open_device(request.device, None, None)
        .with_context(|| format!("Failed to open Sepia II device {}", request.device))?;
    let text = sepia.support_request_text(
        request.device,
        &request.preamble,
        &request.calling_software,
        request.options,
    );
    sepia.usb_close_device(request.device)?;
    let text = text?;
    sepia.close()?;

    let mut report = Report::new("Sepia II support request");
    report.push("product", &device.product)?;
    report.push("serial", &device.serial)?;
    match &request.output {
        Some(path) => {
            std::fs::write(path, &text).with_context(|| format!("Failed to write {:?}", path))?;
            tracing::info!(path = %path.display(), bytes = text.len(), "Wrote support request");
            report.push("written_to", path)?;
        }
        None => report.push("text", text)?,
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_compiled_in_codes() {
        let config = DriverConfig::default();

        let report = decode_error(Vendor::Andor, 20017, &config).unwrap();
        assert_eq!(report.get("name").unwrap(), "DRV_ACQUISITION_ERRORS");
        assert!(report.get("message").unwrap().is_null());

        let report = decode_error(Vendor::Apt, 10100, &config).unwrap();
        assert!(report.get("name").unwrap().is_null());
        assert!(report
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap()
            .starts_with("SERIALNUMUNKNOWN_ERR"));
    }

    #[test]
    fn test_decode_without_descriptions() {
        let config = DriverConfig::default();
        let report = decode_error(Vendor::Attodry, 5003, &config).unwrap();
        assert_eq!(report.get("code").unwrap(), 5003);
        assert!(report.get("name").unwrap().is_null());
        assert!(report.get("message").unwrap().is_null());

        let report = decode_error(Vendor::Apt, 42, &config).unwrap();
        assert!(report.get("message").unwrap().is_null());
    }

    #[test]
    fn test_missing_library_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = DriverConfig::default();
        config.sepia2.path = Some(dir.path().join("Sepia2_Lib.dll"));

        let err = probe(Vendor::Sepia2, &config).unwrap_err();
        assert_eq!(err.to_string(), "Failed to open the Sepia II library");
    }
}
