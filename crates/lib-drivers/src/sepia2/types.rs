//! Value types returned by the Sepia II library.

use bitflags::bitflags;
use lib_types::{code_enum, BitMask8};
use serde::{Deserialize, Serialize};

code_enum! {
    /// Whether parameter changes survive a power cycle.
    pub enum WorkingMode {
        StayPermanent = 0,
        Volatile = 1,
    }
}

code_enum! {
    /// Preset slots of a module.
    pub enum Preset {
        FactoryDefaults = -1,
        CurrentSettings = 0,
        Preset1 = 1,
        Preset2 = 2,
    }
}

bitflags! {
    /// Options for the support request text.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct SupportRequestOptions: i32 {
        /// Ignore the preamble argument.
        const NO_PREAMBLE = 0x1;
        const NO_TITLE = 0x2;
        /// Do not indent the lines describing the calling software.
        const NO_CALLING_SOFTWARE_INDENT = 0x4;
        const NO_SYSTEM_INFO = 0x8;
    }
}

impl Default for SupportRequestOptions {
    fn default() -> Self {
        Self::empty()
    }
}

bitflags! {
    /// SOM-D module state register.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct SomdState: u16 {
        const INIT = 0x01;
        const BUSY = 0x02;
        /// An error code is pending.
        const HARDWARE_ERROR = 0x10;
        const FW_UPDATE_RUNNING = 0x20;
        const FRAM_WRITE_PROTECTED = 0x40;
        const PLL_UNSTABLE = 0x80;
    }
}

impl SomdState {
    /// No flag set.
    pub fn is_ready(self) -> bool {
        self.is_empty()
    }
}

/// USB product model and serial number.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UsbDevice {
    pub index: i32,
    pub product: String,
    pub serial: String,
}

/// Last error recorded by the firmware.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FirmwareError {
    pub code: i32,
    pub phase: i32,
    pub location: i32,
    pub slot: i32,
    pub condition: String,
}

/// Position of a module in the module map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ModuleInfo {
    pub slot: i32,
    pub is_primary: bool,
    pub is_back_plane: bool,
    pub has_uptime_counter: bool,
}

/// Uptime counters of a module, in minutes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct UptimeInfo {
    pub main_power: u64,
    pub active_power: u64,
    pub scaled_power: u64,
}

/// Everything known about one module of the map.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ModuleSummary {
    pub map_index: i32,
    pub info: ModuleInfo,
    pub module_type: i32,
    pub type_name: String,
    pub abbreviation: String,
    pub serial: String,
}

/// Descriptive data stored in a module.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SupplementaryInfo {
    pub label: String,
    /// As stored by the vendor, `YY/MM/DD`.
    pub release_date: String,
    pub revision: String,
    pub memo: String,
}

impl SupplementaryInfo {
    /// Release date as `(year, month, day)`, years counted from 2000.
    pub fn release_date_parts(&self) -> Option<(u16, u8, u8)> {
        let mut parts = self.release_date.trim().split('/');
        let year: u16 = parts.next()?.parse().ok()?;
        let month: u8 = parts.next()?.parse().ok()?;
        let day: u8 = parts.next()?.parse().ok()?;
        if parts.next().is_some() || year > 99 || !(1..=12).contains(&month) || !(1..=31).contains(&day) {
            return None;
        }
        Some((2000 + year, month, day))
    }
}

/// Stored content of a preset slot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PresetInfo {
    pub is_set: bool,
    pub memo: String,
}

/// Front panel LEDs of the SCM laser driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ScmLeds {
    pub power: bool,
    pub laser_active: bool,
}

/// SLM pulse settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SlmPulseParameters {
    /// Frequency or trigger mode index, see `SEPIA2_SLM_DecodeFreqTrigMode`.
    pub freq_trig_mode: i32,
    pub pulse_mode: bool,
    /// Read only; ignored when written.
    pub head_type: i32,
}

/// SML laser settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SmlParameters {
    pub pulse_mode: bool,
    /// Read only; ignored when written.
    pub head_type: i32,
    /// Percent, 0 to 100.
    pub intensity: u8,
}

/// SOM-D trigger level limits in millivolts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TriggerRange {
    pub low_mv: i32,
    pub high_mv: i32,
}

impl TriggerRange {
    pub fn contains(&self, level_mv: i32) -> bool {
        (self.low_mv..=self.high_mv).contains(&level_mv)
    }
}

/// SOM-D sequencer control through the AUX connectors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct AuxIoSequencerCtrl {
    /// Sequencer index is mirrored on AUX OUT.
    pub aux_out: bool,
    /// How AUX IN gates the sequencer, see `SEPIA2_SOMD_DecodeAUXINSequencerCtrl`.
    pub aux_in: u8,
}

/// SOM-D burst settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct BurstValues {
    pub divider: u16,
    pub pre_sync: u8,
    pub sync_mask: u8,
}

/// SOM-D output and sync enables, one bit per channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct OutputEnables {
    pub outputs: BitMask8,
    pub sync: BitMask8,
    pub sync_inverse: bool,
}

/// SOM-D state flags and pending error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct StatusError {
    pub state: SomdState,
    pub error: i16,
}

/// SOM-D frequency and trigger source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct FreqTrigMode {
    pub mode: i32,
    pub synchronize: bool,
}

/// Measured trigger or sync frequency.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TrigSyncFreq {
    pub stable: bool,
    pub frequency_hz: u64,
}

/// SOM-D delay resolution.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct DelayUnits {
    /// Coarse delay step in seconds.
    pub coarse_step: f64,
    pub fine_steps: u8,
}

/// SOM-D firmware version.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct FirmwareVersion {
    pub major: u8,
    pub minor: u8,
    pub build: u16,
}

impl FirmwareVersion {
    /// Split the packed register: major in the high byte, then minor, then
    /// a 16-bit build number.
    pub fn from_packed(packed: u32) -> Self {
        let [major, minor, build_hi, build_lo] = packed.to_be_bytes();
        Self {
            major,
            minor,
            build: u16::from_be_bytes([build_hi, build_lo]),
        }
    }
}

impl std::fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.build)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib_types::{decode_enum, Coded};

    #[test]
    fn test_firmware_version_split() {
        let version = FirmwareVersion::from_packed(0x0102_0304);
        assert_eq!(version, FirmwareVersion { major: 1, minor: 2, build: 0x0304 });
        assert_eq!(version.to_string(), "1.2.772");
    }

    #[test]
    fn test_release_date_parts() {
        let info = SupplementaryInfo {
            label: "SOM 828".into(),
            release_date: "21/07/15".into(),
            revision: "1.0".into(),
            memo: String::new(),
        };
        assert_eq!(info.release_date_parts(), Some((2021, 7, 15)));

        let bad = SupplementaryInfo { release_date: "21/13/01".into(), ..info.clone() };
        assert_eq!(bad.release_date_parts(), None);
        let empty = SupplementaryInfo { release_date: String::new(), ..info };
        assert_eq!(empty.release_date_parts(), None);
    }

    #[test]
    fn test_state_flags() {
        let state = SomdState::from_bits_retain(0x11);
        assert!(state.contains(SomdState::INIT | SomdState::HARDWARE_ERROR));
        assert!(!state.is_ready());
        assert!(SomdState::empty().is_ready());
        // Unknown bits survive
        assert_eq!(SomdState::from_bits_retain(0x8100).bits(), 0x8100);
    }

    #[test]
    fn test_trigger_range_is_inclusive() {
        let range = TriggerRange { low_mv: -1200, high_mv: 1200 };
        assert!(range.contains(-1200));
        assert!(range.contains(1200));
        assert!(!range.contains(1201));
    }

    #[test]
    fn test_preset_and_mode_codes() {
        assert_eq!(decode_enum::<Preset>(-1), Coded::Known(Preset::FactoryDefaults));
        assert_eq!(decode_enum::<WorkingMode>(2), Coded::Unknown(2));
        assert_eq!(
            (SupportRequestOptions::NO_TITLE | SupportRequestOptions::NO_SYSTEM_INFO).bits(),
            10
        );
    }
}
