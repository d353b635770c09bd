//! Driver configuration loading and validation.

use anyhow::{Context, Result};
use lib_drivers::{andor, apt, attodry, sepia2};
use lib_native_ffi::{TextEncoding, WatchdogConfig};
use lib_types::CodeEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "labdrv.toml";

/// Top-level configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DriverConfig {
    /// PicoQuant Sepia II library.
    #[serde(default)]
    pub sepia2: LibraryConfig,

    /// Andor SDK library and camera initialization.
    #[serde(default)]
    pub andor: AndorConfig,

    /// attoDRY interface library and cryostat connection.
    #[serde(default)]
    pub attodry: AttoDryConfig,

    /// Thorlabs APT server.
    #[serde(default)]
    pub apt: AptConfig,

    /// Limits for calls that block on hardware.
    #[serde(default)]
    pub watchdog: WatchdogConfig,
}

/// Where to load a vendor library from and how to encode its strings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Explicit library file. Falls back to the vendor install location,
    /// then the library search path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Text encoding; each vendor has its own default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<TextEncoding>,
}

impl LibraryConfig {
    pub fn encoding_or(&self, default: TextEncoding) -> TextEncoding {
        self.encoding.unwrap_or(default)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AndorConfig {
    #[serde(flatten)]
    pub library: LibraryConfig,

    /// Directory holding the camera's `.ini` files, passed to `Initialize`.
    #[serde(default)]
    pub init_dir: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AttoDryConfig {
    #[serde(flatten)]
    pub library: LibraryConfig,

    /// Cryostat model the interface server is started for.
    #[serde(default)]
    pub device_type: attodry::DeviceType,

    /// Serial port of the cryostat. Probing stays offline without one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub com_port: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AptConfig {
    #[serde(flatten)]
    pub library: LibraryConfig,

    /// Hardware type code used for enumeration.
    #[serde(default = "default_hardware_type")]
    pub hardware_type: i32,
}

fn default_hardware_type() -> i32 {
    apt::HardwareType::Prm1z8.code()
}

impl Default for AptConfig {
    fn default() -> Self {
        Self {
            library: LibraryConfig::default(),
            hardware_type: default_hardware_type(),
        }
    }
}

impl AptConfig {
    pub fn hardware_type(&self) -> Result<apt::HardwareType> {
        apt::HardwareType::from_code(self.hardware_type)
            .with_context(|| format!("Unknown APT hardware type: {}", self.hardware_type))
    }
}

impl DriverConfig {
    pub fn sepia2_encoding(&self) -> TextEncoding {
        self.sepia2.encoding_or(sepia2::DEFAULT_ENCODING)
    }

    pub fn andor_encoding(&self) -> TextEncoding {
        self.andor.library.encoding_or(andor::DEFAULT_ENCODING)
    }

    pub fn attodry_encoding(&self) -> TextEncoding {
        self.attodry.library.encoding_or(attodry::DEFAULT_ENCODING)
    }

    pub fn apt_encoding(&self) -> TextEncoding {
        self.apt.library.encoding_or(apt::DEFAULT_ENCODING)
    }
}

/// Load configuration from `path`, or from [`DEFAULT_CONFIG_FILE`] when no
/// path is given. A file that does not exist yields the defaults.
pub fn resolve_config(path: Option<&Path>) -> Result<DriverConfig> {
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
    if !path.exists() {
        tracing::debug!(path = %path.display(), "No configuration file, using defaults");
        return Ok(DriverConfig::default());
    }
    load_config(path)
}

/// Load configuration from a file.
pub fn load_config(path: &Path) -> Result<DriverConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: DriverConfig = if path.extension().is_some_and(|e| e == "json") {
        serde_json::from_str(&content).with_context(|| "Failed to parse config as JSON")?
    } else {
        toml::from_str(&content).with_context(|| "Failed to parse config as TOML")?
    };

    validate_config(&config)?;
    tracing::info!(path = %path.display(), "Loaded configuration");

    Ok(config)
}

/// Validate configuration.
pub fn validate_config(config: &DriverConfig) -> Result<()> {
    if config.watchdog.timeout.is_zero() {
        anyhow::bail!("Watchdog timeout must be greater than zero");
    }

    let libraries = [
        ("sepia2", &config.sepia2),
        ("andor", &config.andor.library),
        ("attodry", &config.attodry.library),
        ("apt", &config.apt.library),
    ];
    for (vendor, library) in libraries {
        if let Some(ref path) = library.path {
            if !path.exists() {
                anyhow::bail!("{} library not found: {:?}", vendor, path);
            }
        }
    }

    config.apt.hardware_type()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    fn write_config(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = DriverConfig::default();
        assert_eq!(config.watchdog.timeout, Duration::from_secs(30));
        assert_eq!(config.apt.hardware_type().unwrap(), apt::HardwareType::Prm1z8);
        assert_eq!(config.attodry.device_type, attodry::DeviceType::AttoDry2100);
        assert_eq!(config.sepia2_encoding(), TextEncoding::Utf8);
        assert_eq!(config.andor_encoding(), TextEncoding::Ascii);
        assert_eq!(config.attodry_encoding(), TextEncoding::Latin1);
        validate_config(&config).unwrap();
    }

    #[test]
    fn test_load_toml() {
        let file = write_config(
            ".toml",
            r#"
            [sepia2]
            encoding = "ascii"

            [andor]
            init_dir = 'C:\Program Files\Andor SDK'

            [attodry]
            device_type = "AttoDry800"
            com_port = "COM4"

            [apt]
            hardware_type = 48

            [watchdog]
            timeout_ms = 2500
            catch_panics = false
            "#,
        );

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.sepia2_encoding(), TextEncoding::Ascii);
        assert_eq!(config.andor.init_dir, r"C:\Program Files\Andor SDK");
        assert_eq!(config.attodry.device_type, attodry::DeviceType::AttoDry800);
        assert_eq!(config.attodry.com_port.as_deref(), Some("COM4"));
        assert_eq!(config.apt.hardware_type().unwrap(), apt::HardwareType::Mff10x);
        assert_eq!(config.watchdog.timeout, Duration::from_millis(2500));
        assert!(!config.watchdog.catch_panics);
    }

    #[test]
    fn test_load_json_by_extension() {
        let file = write_config(".json", r#"{"andor": {"encoding": "utf-8"}}"#);
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.andor_encoding(), TextEncoding::Utf8);
        assert_eq!(config.apt, AptConfig::default());
    }

    #[test]
    fn test_missing_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = resolve_config(Some(&dir.path().join("labdrv.toml"))).unwrap();
        assert_eq!(config, DriverConfig::default());
    }

    #[test]
    fn test_library_path_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let library = dir.path().join("Sepia2_Lib.dll");
        let file = write_config(".json", &serde_json::json!({ "sepia2": { "path": library } }).to_string());

        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("sepia2 library not found"));

        std::fs::write(&library, b"").unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.sepia2.path.as_deref(), Some(library.as_path()));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let file = write_config(".toml", "[watchdog]\ntimeout_ms = 0\n");
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn test_unknown_hardware_type_rejected() {
        let file = write_config(".toml", "[apt]\nhardware_type = 7\n");
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("Unknown APT hardware type: 7"));
    }

    #[test]
    fn test_invalid_toml_has_context() {
        let file = write_config(".toml", "[watchdog\n");
        let err = load_config(file.path()).unwrap_err();
        assert_eq!(err.to_string(), "Failed to parse config as TOML");
    }
}
