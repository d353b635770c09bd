//! PicoQuant Sepia II laser driver library (`Sepia2_Lib`).
//!
//! Devices are addressed by USB index (`device`), modules by slot. Every
//! entry point returns 0 on success; other codes are described by the
//! library itself through `SEPIA2_LIB_DecodeError`.

mod api;
mod types;

pub use api::Api;
pub use types::*;

use crate::binding::Binding;
use lib_native_ffi::{
    call_with_growing_buffer, decode_with_fallback, to_native, BufferRequest, CallAdapter,
    CallError, ErrorDecoder, FromNative, LibraryLocator, MarshalResult, NativeError,
    NativeResult, OutBuffer, TextEncoding, Watchdog,
};
use lib_types::{decode_enum, BitMask8, CodeEnum, Coded, StatusCode};
use std::ffi::{c_char, c_int, c_long, c_ulong};
use std::path::Path;

pub const DEFAULT_PATH: &str = r"C:\Program Files\Picoquant\GenericLaserDriver\Sepia2_Lib.dll";

pub const LIBRARY: LibraryLocator = LibraryLocator::with_default("Sepia2_Lib", DEFAULT_PATH);

pub const DEFAULT_ENCODING: TextEncoding = TextEncoding::Utf8;

pub const SUCCESS: StatusCode = StatusCode::ZERO;

/// "FW: memory allocation error", reported when an output buffer is too small.
pub const BUFFER_EXHAUSTED: StatusCode = StatusCode(-1001);

/// USB indices probed during discovery.
pub const MAX_USB_DEVICES: i32 = 8;

/// Channels of the SOM-D burst length array.
pub const BURST_CHANNELS: usize = 8;

const DECODE_ERROR: &str = "SEPIA2_LIB_DecodeError";

/// Output buffer capacities, including the terminator.
mod len {
    pub const ERROR_STRING: usize = 64;
    pub const VERSION: usize = 12;
    pub const PRODUCT_MODEL: usize = 32;
    pub const SERIAL_NUMBER: usize = 12;
    pub const DESCRIPTOR: usize = 255;
    pub const FW_VERSION: usize = 8;
    pub const ERROR_CONDITION: usize = 55;
    pub const PHASE_NAME: usize = 24;
    pub const MODULE_TYPE: usize = 55;
    pub const MODULE_ABBR: usize = 4;
    pub const LABEL: usize = 8;
    pub const RELEASE_DATE: usize = 8;
    pub const REVISION: usize = 8;
    pub const MEMO: usize = 128;
    pub const PRESET_MEMO: usize = 64;
    pub const MODULE_STATE: usize = 95;
    pub const SLM_FREQ_TRIG_MODE: usize = 28;
    pub const HEAD_TYPE: usize = 18;
    pub const AUX_IN_CTRL: usize = 24;
}

/// Full scale of the SLM fine intensity, in per mille.
pub const SLM_INTENSITY_FULL_SCALE: u16 = 1000;

/// Full scale of the SML intensity, in percent.
pub const SML_INTENSITY_FULL_SCALE: u8 = 100;

type DecodeErrorFn = unsafe extern "C" fn(c_int, *mut c_char) -> c_int;

/// Error decoder backed by `SEPIA2_LIB_DecodeError`.
struct LibDecoder {
    decode: DecodeErrorFn,
    encoding: TextEncoding,
}

impl ErrorDecoder for LibDecoder {
    fn decode(&self, code: StatusCode) -> NativeResult<String> {
        decode_with_fallback(DECODE_ERROR, code, SUCCESS, self.encoding, |code| {
            let mut buffer = OutBuffer::new(len::ERROR_STRING);
            let status = unsafe { (self.decode)(code.get(), buffer.as_mut_ptr()) };
            Ok((StatusCode::from(status), buffer))
        })
    }
}

fn flag(value: u8) -> bool {
    value != 0
}

/// Handle to an open `Sepia2_Lib`.
#[derive(Debug)]
pub struct Sepia2 {
    binding: Binding<Api>,
}

impl Sepia2 {
    /// Load the library from `path`, the vendor install location or the
    /// library search path.
    ///
    /// # Safety
    ///
    /// The library found must be a Sepia II library.
    pub unsafe fn open(path: Option<&Path>, encoding: TextEncoding) -> NativeResult<Self> {
        let binding = unsafe { Binding::open(&LIBRARY, path, encoding, |lib| Api::bind(lib))? };
        Ok(Self { binding })
    }

    /// Use an entry-point table that is already in the process.
    pub fn from_api(api: Api, encoding: TextEncoding) -> Self {
        Self {
            binding: Binding::from_api(LIBRARY.name, api, encoding),
        }
    }

    /// Run [`synchronize_now`](Self::synchronize_now) under `watchdog`.
    pub fn with_watchdog(mut self, watchdog: Watchdog) -> Self {
        self.binding.set_watchdog(Some(watchdog));
        self
    }

    pub fn binding(&self) -> &Binding<Api> {
        &self.binding
    }

    pub fn close(&mut self) -> NativeResult<()> {
        self.binding.close()
    }

    fn with_adapter<T>(
        &self,
        f: impl FnOnce(&Api, &CallAdapter<'_>) -> NativeResult<T>,
    ) -> NativeResult<T> {
        let api = self.binding.api()?;
        let decoder = LibDecoder {
            decode: api.lib_decode_error,
            encoding: self.binding.encoding(),
        };
        f(&api, &self.binding.adapter(SUCCESS, &decoder))
    }

    fn call<R: FromNative>(
        &self,
        function: &str,
        call: impl FnOnce(&Api) -> MarshalResult<(c_int, R)>,
    ) -> NativeResult<R::Output> {
        self.with_adapter(|api, adapter| adapter.invoke(function, &[], || call(api)))
    }

    fn call_status(&self, function: &str, call: impl FnOnce(&Api) -> c_int) -> NativeResult<()> {
        self.call(function, |api| Ok((call(api), ())))
    }

    fn call_flag(&self, function: &str, call: impl FnOnce(&Api, *mut u8) -> c_int) -> NativeResult<bool> {
        self.call(function, |api| {
            let mut value = 0u8;
            let code = call(api, &mut value as *mut u8);
            Ok((code, value))
        })
        .map(flag)
    }

    fn call_text(
        &self,
        function: &str,
        capacity: usize,
        call: impl FnOnce(&Api, *mut c_char) -> c_int,
    ) -> NativeResult<String> {
        self.call(function, |api| {
            let mut buffer = OutBuffer::new(capacity);
            let code = call(api, buffer.as_mut_ptr());
            Ok((code, buffer))
        })
    }

    // --- LIB ---

    /// Vendor description of `code`.
    ///
    /// Fails if the library cannot describe `code`; see
    /// [`decode_with_fallback`].
    pub fn decode_error(&self, code: i32) -> NativeResult<String> {
        let api = self.binding.api()?;
        LibDecoder {
            decode: api.lib_decode_error,
            encoding: self.binding.encoding(),
        }
        .decode(StatusCode(code))
    }

    pub fn library_version(&self) -> NativeResult<String> {
        self.call_text("SEPIA2_LIB_GetVersion", len::VERSION, |api, buf| unsafe {
            (api.lib_get_version)(buf)
        })
    }

    pub fn is_running_on_wine(&self) -> NativeResult<bool> {
        self.call("SEPIA2_LIB_IsRunningOnWine", |api| {
            let mut wine = 0u8;
            let code = unsafe { (api.lib_is_running_on_wine)(&mut wine) };
            Ok((code, wine))
        })
        .map(flag)
    }

    // --- USB ---

    /// Open the device at `device`.
    ///
    /// Non-empty `product` and `serial` restrict which device the library
    /// accepts at that index.
    pub fn usb_open_device(
        &self,
        device: i32,
        product: Option<&str>,
        serial: Option<&str>,
    ) -> NativeResult<UsbDevice> {
        let encoding = self.binding.encoding();
        let (product, serial) = self.call("SEPIA2_USB_OpenDevice", |api| {
            let mut product = OutBuffer::with_text(len::PRODUCT_MODEL, encoding, product.unwrap_or(""))?;
            let mut serial = OutBuffer::with_text(len::SERIAL_NUMBER, encoding, serial.unwrap_or(""))?;
            let code = unsafe {
                (api.usb_open_device)(device, product.as_mut_ptr(), serial.as_mut_ptr())
            };
            Ok((code, (product, serial)))
        })?;
        Ok(UsbDevice {
            index: device,
            product,
            serial,
        })
    }

    /// Read product and serial without keeping the device open.
    pub fn usb_open_get_ser_num_and_close(&self, device: i32) -> NativeResult<UsbDevice> {
        let (product, serial) = self.call("SEPIA2_USB_OpenGetSerNumAndClose", |api| {
            let mut product = OutBuffer::new(len::PRODUCT_MODEL);
            let mut serial = OutBuffer::new(len::SERIAL_NUMBER);
            let code = unsafe {
                (api.usb_open_get_ser_num_and_close)(device, product.as_mut_ptr(), serial.as_mut_ptr())
            };
            Ok((code, (product, serial)))
        })?;
        Ok(UsbDevice {
            index: device,
            product,
            serial,
        })
    }

    pub fn usb_str_descriptor(&self, device: i32) -> NativeResult<String> {
        self.call_text("SEPIA2_USB_GetStrDescriptor", len::DESCRIPTOR, |api, buf| unsafe {
            (api.usb_get_str_descriptor)(device, buf)
        })
    }

    pub fn usb_close_device(&self, device: i32) -> NativeResult<()> {
        self.call_status("SEPIA2_USB_CloseDevice", |api| unsafe { (api.usb_close_device)(device) })
    }

    /// Probe every USB index and list the devices that answer.
    ///
    /// Indices whose probe fails with a library status are skipped.
    pub fn list_usb_devices(&self) -> NativeResult<Vec<UsbDevice>> {
        let mut devices = Vec::new();
        for index in 0..MAX_USB_DEVICES {
            match self.usb_open_get_ser_num_and_close(index) {
                Ok(device) => devices.push(device),
                Err(e) if e.as_call().is_some() => {
                    tracing::debug!(index, error = %e, "No Sepia II device at USB index");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(devices)
    }

    /// Open the first USB index that accepts `product` and `serial`.
    ///
    /// Returns the failure of the last index when none does.
    pub fn open_first_device(&self, product: Option<&str>, serial: Option<&str>) -> NativeResult<UsbDevice> {
        let mut last_error = None;
        for index in 0..MAX_USB_DEVICES {
            match self.usb_open_device(index, product, serial) {
                Ok(device) => {
                    tracing::info!(index, product = %device.product, serial = %device.serial, "Opened Sepia II device");
                    return Ok(device);
                }
                Err(e) if e.as_call().is_some() => last_error = Some(e),
                Err(e) => return Err(e),
            }
        }
        Err(last_error.unwrap_or_else(|| NativeError::invalid_argument("device", "no USB index to probe")))
    }

    // --- FWR ---

    pub fn firmware_version(&self, device: i32) -> NativeResult<String> {
        self.call_text("SEPIA2_FWR_GetVersion", len::FW_VERSION, |api, buf| unsafe {
            (api.fwr_get_version)(device, buf)
        })
    }

    pub fn last_firmware_error(&self, device: i32) -> NativeResult<FirmwareError> {
        let (code, phase, location, slot, condition) = self.call("SEPIA2_FWR_GetLastError", |api| {
            let (mut code, mut phase, mut location, mut slot) = (0, 0, 0, 0);
            let mut condition = OutBuffer::new(len::ERROR_CONDITION);
            let status = unsafe {
                (api.fwr_get_last_error)(
                    device,
                    &mut code,
                    &mut phase,
                    &mut location,
                    &mut slot,
                    condition.as_mut_ptr(),
                )
            };
            Ok((status, (code, phase, location, slot, condition)))
        })?;
        Ok(FirmwareError {
            code,
            phase,
            location,
            slot,
            condition,
        })
    }

    pub fn decode_error_phase(&self, phase: i32) -> NativeResult<String> {
        self.call_text("SEPIA2_FWR_DecodeErrPhaseName", len::PHASE_NAME, |api, buf| unsafe {
            (api.fwr_decode_err_phase_name)(phase, buf)
        })
    }

    pub fn working_mode(&self, device: i32) -> NativeResult<Coded<WorkingMode>> {
        self.call("SEPIA2_FWR_GetWorkingMode", |api| {
            let mut mode = 0;
            let code = unsafe { (api.fwr_get_working_mode)(device, &mut mode) };
            Ok((code, mode))
        })
        .map(decode_enum)
    }

    pub fn set_working_mode(&self, device: i32, mode: WorkingMode) -> NativeResult<()> {
        self.call_status("SEPIA2_FWR_SetWorkingMode", |api| unsafe {
            (api.fwr_set_working_mode)(device, mode.code())
        })
    }

    pub fn roll_back_to_permanent_values(&self, device: i32) -> NativeResult<()> {
        self.call_status("SEPIA2_FWR_RollBackToPermanentValues", |api| unsafe {
            (api.fwr_roll_back_to_permanent_values)(device)
        })
    }

    pub fn store_as_permanent_values(&self, device: i32) -> NativeResult<()> {
        self.call_status("SEPIA2_FWR_StoreAsPermanentValues", |api| unsafe {
            (api.fwr_store_as_permanent_values)(device)
        })
    }

    /// Build the module map and return the number of modules.
    pub fn module_map(&self, device: i32, perform_restart: bool) -> NativeResult<i32> {
        self.call("SEPIA2_FWR_GetModuleMap", |api| {
            let mut count = 0;
            let code = unsafe { (api.fwr_get_module_map)(device, c_int::from(perform_restart), &mut count) };
            Ok((code, count))
        })
    }

    pub fn module_info(&self, device: i32, map_index: i32) -> NativeResult<ModuleInfo> {
        let (slot, primary, back_plane, uptime) = self.call("SEPIA2_FWR_GetModuleInfoByMapIdx", |api| {
            let mut slot = 0;
            let (mut primary, mut back_plane, mut uptime) = (0u8, 0u8, 0u8);
            let code = unsafe {
                (api.fwr_get_module_info_by_map_idx)(
                    device,
                    map_index,
                    &mut slot,
                    &mut primary,
                    &mut back_plane,
                    &mut uptime,
                )
            };
            Ok((code, (slot, primary, back_plane, uptime)))
        })?;
        Ok(ModuleInfo {
            slot,
            is_primary: flag(primary),
            is_back_plane: flag(back_plane),
            has_uptime_counter: flag(uptime),
        })
    }

    pub fn uptime_info(&self, device: i32, map_index: i32) -> NativeResult<UptimeInfo> {
        let (main, active, scaled) = self.call("SEPIA2_FWR_GetUptimeInfoByMapIdx", |api| {
            let (mut main, mut active, mut scaled): (c_ulong, c_ulong, c_ulong) = (0, 0, 0);
            let code = unsafe {
                (api.fwr_get_uptime_info_by_map_idx)(device, map_index, &mut main, &mut active, &mut scaled)
            };
            Ok((code, (main, active, scaled)))
        })?;
        Ok(UptimeInfo {
            main_power: u64::from(main),
            active_power: u64::from(active),
            scaled_power: u64::from(scaled),
        })
    }

    pub fn free_module_map(&self, device: i32) -> NativeResult<()> {
        self.call_status("SEPIA2_FWR_FreeModuleMap", |api| unsafe { (api.fwr_free_module_map)(device) })
    }

    /// Describe every module of the map, then release the map.
    ///
    /// The map is freed even when describing a module fails.
    pub fn list_modules(&self, device: i32, perform_restart: bool) -> NativeResult<Vec<ModuleSummary>> {
        let count = self.module_map(device, perform_restart)?;
        let listed: NativeResult<Vec<_>> = (0..count)
            .map(|map_index| self.module_summary(device, map_index))
            .collect();
        let freed = self.free_module_map(device);
        let modules = listed?;
        freed?;
        Ok(modules)
    }

    fn module_summary(&self, device: i32, map_index: i32) -> NativeResult<ModuleSummary> {
        let info = self.module_info(device, map_index)?;
        let module_type = self.module_type(device, info.slot, info.is_primary)?;
        Ok(ModuleSummary {
            map_index,
            info,
            module_type,
            type_name: self.decode_module_type(module_type)?,
            abbreviation: self.decode_module_type_abbr(module_type)?,
            serial: self.serial_number(device, info.slot, info.is_primary)?,
        })
    }

    /// Text for a PicoQuant support request.
    ///
    /// The size of the text is unknown up front: the buffer starts at 8 KiB
    /// and doubles while the library reports [`BUFFER_EXHAUSTED`].
    pub fn support_request_text(
        &self,
        device: i32,
        preamble: &str,
        calling_software: &str,
        options: SupportRequestOptions,
    ) -> NativeResult<String> {
        const FUNCTION: &str = "SEPIA2_FWR_CreateSupportRequestText";
        let encoding = self.binding.encoding();
        let preamble = encoding
            .to_c_string("preamble", preamble)
            .map_err(|e| CallError::marshal(FUNCTION, e))?;
        let calling_software = encoding
            .to_c_string("calling_software", calling_software)
            .map_err(|e| CallError::marshal(FUNCTION, e))?;

        self.with_adapter(|api, adapter| {
            call_with_growing_buffer(adapter, FUNCTION, BUFFER_EXHAUSTED, BufferRequest::default(), |buffer| {
                let capacity: c_int = buffer.len_arg()?;
                Ok(unsafe {
                    (api.fwr_create_support_request_text)(
                        device,
                        preamble.as_ptr(),
                        calling_software.as_ptr(),
                        options.bits(),
                        capacity,
                        buffer.as_mut_ptr(),
                    )
                })
            })
        })
    }

    // --- COM ---

    pub fn decode_module_type(&self, module_type: i32) -> NativeResult<String> {
        self.call_text("SEPIA2_COM_DecodeModuleType", len::MODULE_TYPE, |api, buf| unsafe {
            (api.com_decode_module_type)(module_type, buf)
        })
    }

    pub fn decode_module_type_abbr(&self, module_type: i32) -> NativeResult<String> {
        self.call_text("SEPIA2_COM_DecodeModuleTypeAbbr", len::MODULE_ABBR, |api, buf| unsafe {
            (api.com_decode_module_type_abbr)(module_type, buf)
        })
    }

    pub fn module_type(&self, device: i32, slot: i32, primary: bool) -> NativeResult<i32> {
        self.call("SEPIA2_COM_GetModuleType", |api| {
            let mut module_type = 0;
            let code = unsafe {
                (api.com_get_module_type)(device, slot, c_int::from(primary), &mut module_type)
            };
            Ok((code, module_type))
        })
    }

    pub fn has_secondary_module(&self, device: i32, slot: i32) -> NativeResult<bool> {
        self.call("SEPIA2_COM_HasSecondaryModule", |api| {
            let mut secondary = 0;
            let code = unsafe { (api.com_has_secondary_module)(device, slot, &mut secondary) };
            Ok((code, secondary))
        })
        .map(|secondary| secondary != 0)
    }

    pub fn serial_number(&self, device: i32, slot: i32, primary: bool) -> NativeResult<String> {
        self.call_text("SEPIA2_COM_GetSerialNumber", len::SERIAL_NUMBER, |api, buf| unsafe {
            (api.com_get_serial_number)(device, slot, c_int::from(primary), buf)
        })
    }

    pub fn supplementary_info(&self, device: i32, slot: i32, primary: bool) -> NativeResult<SupplementaryInfo> {
        let (label, release_date, revision, memo) = self.call("SEPIA2_COM_GetSupplementaryInfos", |api| {
            let mut label = OutBuffer::new(len::LABEL);
            let mut release_date = OutBuffer::new(len::RELEASE_DATE);
            let mut revision = OutBuffer::new(len::REVISION);
            let mut memo = OutBuffer::new(len::MEMO);
            let code = unsafe {
                (api.com_get_supplementary_infos)(
                    device,
                    slot,
                    c_int::from(primary),
                    label.as_mut_ptr(),
                    release_date.as_mut_ptr(),
                    revision.as_mut_ptr(),
                    memo.as_mut_ptr(),
                )
            };
            Ok((code, (label, release_date, revision, memo)))
        })?;
        Ok(SupplementaryInfo {
            label,
            release_date,
            revision,
            memo,
        })
    }

    pub fn preset_info(&self, device: i32, slot: i32, primary: bool, preset: Preset) -> NativeResult<PresetInfo> {
        let (is_set, memo) = self.call("SEPIA2_COM_GetPresetInfo", |api| {
            let mut is_set = 0u8;
            let mut memo = OutBuffer::new(len::PRESET_MEMO);
            let code = unsafe {
                (api.com_get_preset_info)(
                    device,
                    slot,
                    c_int::from(primary),
                    preset.code(),
                    &mut is_set,
                    memo.as_mut_ptr(),
                )
            };
            Ok((code, (is_set, memo)))
        })?;
        Ok(PresetInfo {
            is_set: flag(is_set),
            memo,
        })
    }

    pub fn recall_preset(&self, device: i32, slot: i32, primary: bool, preset: Preset) -> NativeResult<()> {
        self.call_status("SEPIA2_COM_RecallPreset", |api| unsafe {
            (api.com_recall_preset)(device, slot, c_int::from(primary), preset.code())
        })
    }

    /// Store the current settings in `preset` with a memo of at most 63 bytes.
    pub fn save_as_preset(
        &self,
        device: i32,
        slot: i32,
        primary: bool,
        preset: Preset,
        memo: &str,
    ) -> NativeResult<()> {
        let encoding = self.binding.encoding();
        self.call("SEPIA2_COM_SaveAsPreset", |api| {
            let memo = OutBuffer::with_text(len::PRESET_MEMO, encoding, memo)?;
            let code = unsafe {
                (api.com_save_as_preset)(
                    device,
                    slot,
                    c_int::from(primary),
                    preset.code(),
                    memo.raw().as_ptr().cast(),
                )
            };
            Ok((code, ()))
        })
    }

    pub fn is_writable_module(&self, device: i32, slot: i32, primary: bool) -> NativeResult<bool> {
        self.call("SEPIA2_COM_IsWritableModule", |api| {
            let mut writable = 0u8;
            let code = unsafe {
                (api.com_is_writable_module)(device, slot, c_int::from(primary), &mut writable)
            };
            Ok((code, writable))
        })
        .map(flag)
    }

    // --- SCM ---

    pub fn power_and_laser_leds(&self, device: i32, slot: i32) -> NativeResult<ScmLeds> {
        let (power, laser_active) = self.call("SEPIA2_SCM_GetPowerAndLaserLEDS", |api| {
            let (mut power, mut laser_active) = (0u8, 0u8);
            let code = unsafe { (api.scm_get_power_and_laser_leds)(device, slot, &mut power, &mut laser_active) };
            Ok((code, (power, laser_active)))
        })?;
        Ok(ScmLeds {
            power: flag(power),
            laser_active: flag(laser_active),
        })
    }

    /// Hard lock: key switch or interlock open.
    pub fn laser_locked(&self, device: i32, slot: i32) -> NativeResult<bool> {
        self.call_flag("SEPIA2_SCM_GetLaserLocked", |api, locked| unsafe {
            (api.scm_get_laser_locked)(device, slot, locked)
        })
    }

    pub fn laser_soft_lock(&self, device: i32, slot: i32) -> NativeResult<bool> {
        self.call_flag("SEPIA2_SCM_GetLaserSoftLock", |api, locked| unsafe {
            (api.scm_get_laser_soft_lock)(device, slot, locked)
        })
    }

    pub fn set_laser_soft_lock(&self, device: i32, slot: i32, locked: bool) -> NativeResult<()> {
        self.call_status("SEPIA2_SCM_SetLaserSoftLock", |api| unsafe {
            (api.scm_set_laser_soft_lock)(device, slot, u8::from(locked))
        })
    }

    // --- SLM ---

    pub fn slm_decode_freq_trig_mode(&self, mode: i32) -> NativeResult<String> {
        self.call_text("SEPIA2_SLM_DecodeFreqTrigMode", len::SLM_FREQ_TRIG_MODE, |api, buf| unsafe {
            (api.slm_decode_freq_trig_mode)(mode, buf)
        })
    }

    pub fn slm_decode_head_type(&self, head_type: i32) -> NativeResult<String> {
        self.call_text("SEPIA2_SLM_DecodeHeadType", len::HEAD_TYPE, |api, buf| unsafe {
            (api.slm_decode_head_type)(head_type, buf)
        })
    }

    pub fn slm_pulse_parameters(&self, device: i32, slot: i32) -> NativeResult<SlmPulseParameters> {
        let (freq_trig_mode, pulse_mode, head_type) = self.call("SEPIA2_SLM_GetPulseParameters", |api| {
            let (mut mode, mut pulse_mode, mut head_type) = (0, 0u8, 0);
            let code = unsafe {
                (api.slm_get_pulse_parameters)(device, slot, &mut mode, &mut pulse_mode, &mut head_type)
            };
            Ok((code, (mode, pulse_mode, head_type)))
        })?;
        Ok(SlmPulseParameters {
            freq_trig_mode,
            pulse_mode: flag(pulse_mode),
            head_type,
        })
    }

    pub fn set_slm_pulse_parameters(&self, device: i32, slot: i32, params: SlmPulseParameters) -> NativeResult<()> {
        self.call_status("SEPIA2_SLM_SetPulseParameters", |api| unsafe {
            (api.slm_set_pulse_parameters)(device, slot, params.freq_trig_mode, u8::from(params.pulse_mode))
        })
    }

    /// Intensity in per mille of full scale.
    pub fn slm_intensity_fine_step(&self, device: i32, slot: i32) -> NativeResult<u16> {
        self.call("SEPIA2_SLM_GetIntensityFineStep", |api| {
            let mut intensity = 0u16;
            let code = unsafe { (api.slm_get_intensity_fine_step)(device, slot, &mut intensity) };
            Ok((code, intensity))
        })
    }

    pub fn set_slm_intensity_fine_step(&self, device: i32, slot: i32, permille: u16) -> NativeResult<()> {
        if permille > SLM_INTENSITY_FULL_SCALE {
            return Err(NativeError::invalid_argument(
                "intensity",
                format!("{permille} exceeds {SLM_INTENSITY_FULL_SCALE} per mille"),
            ));
        }
        self.call_status("SEPIA2_SLM_SetIntensityFineStep", |api| unsafe {
            (api.slm_set_intensity_fine_step)(device, slot, permille)
        })
    }

    // --- SML ---

    pub fn sml_decode_head_type(&self, head_type: i32) -> NativeResult<String> {
        self.call_text("SEPIA2_SML_DecodeHeadType", len::HEAD_TYPE, |api, buf| unsafe {
            (api.sml_decode_head_type)(head_type, buf)
        })
    }

    pub fn sml_parameters(&self, device: i32, slot: i32) -> NativeResult<SmlParameters> {
        let (pulse_mode, head_type, intensity) = self.call("SEPIA2_SML_GetParameters", |api| {
            let (mut pulse_mode, mut head_type, mut intensity) = (0u8, 0, 0u8);
            let code = unsafe {
                (api.sml_get_parameters)(device, slot, &mut pulse_mode, &mut head_type, &mut intensity)
            };
            Ok((code, (pulse_mode, head_type, intensity)))
        })?;
        Ok(SmlParameters {
            pulse_mode: flag(pulse_mode),
            head_type,
            intensity,
        })
    }

    pub fn set_sml_parameters(&self, device: i32, slot: i32, params: SmlParameters) -> NativeResult<()> {
        if params.intensity > SML_INTENSITY_FULL_SCALE {
            return Err(NativeError::invalid_argument(
                "intensity",
                format!("{} exceeds {SML_INTENSITY_FULL_SCALE} percent", params.intensity),
            ));
        }
        self.call_status("SEPIA2_SML_SetParameters", |api| unsafe {
            (api.sml_set_parameters)(device, slot, u8::from(params.pulse_mode), params.intensity)
        })
    }

    // --- SOMD ---

    pub fn freq_trig_mode(&self, device: i32, slot: i32) -> NativeResult<FreqTrigMode> {
        let (mode, synchronize) = self.call("SEPIA2_SOMD_GetFreqTrigMode", |api| {
            let mut mode = 0;
            let mut synchronize = 0u8;
            let code = unsafe { (api.somd_get_freq_trig_mode)(device, slot, &mut mode, &mut synchronize) };
            Ok((code, (mode, synchronize)))
        })?;
        Ok(FreqTrigMode {
            mode,
            synchronize: flag(synchronize),
        })
    }

    pub fn set_freq_trig_mode(&self, device: i32, slot: i32, mode: FreqTrigMode) -> NativeResult<()> {
        self.call_status("SEPIA2_SOMD_SetFreqTrigMode", |api| unsafe {
            (api.somd_set_freq_trig_mode)(device, slot, mode.mode, u8::from(mode.synchronize))
        })
    }

    pub fn trigger_range(&self, device: i32, slot: i32) -> NativeResult<TriggerRange> {
        let (low_mv, high_mv) = self.call("SEPIA2_SOMD_GetTriggerRange", |api| {
            let (mut low, mut high) = (0, 0);
            let code = unsafe { (api.somd_get_trigger_range)(device, slot, &mut low, &mut high) };
            Ok((code, (low, high)))
        })?;
        Ok(TriggerRange { low_mv, high_mv })
    }

    /// Trigger threshold in millivolts.
    pub fn trigger_level(&self, device: i32, slot: i32) -> NativeResult<i32> {
        self.call("SEPIA2_SOMD_GetTriggerLevel", |api| {
            let mut level = 0;
            let code = unsafe { (api.somd_get_trigger_level)(device, slot, &mut level) };
            Ok((code, level))
        })
    }

    pub fn set_trigger_level(&self, device: i32, slot: i32, level_mv: i32) -> NativeResult<()> {
        self.call_status("SEPIA2_SOMD_SetTriggerLevel", |api| unsafe {
            (api.somd_set_trigger_level)(device, slot, level_mv)
        })
    }

    pub fn decode_aux_in_sequencer_ctrl(&self, aux_in: u8) -> NativeResult<String> {
        self.call_text("SEPIA2_SOMD_DecodeAUXINSequencerCtrl", len::AUX_IN_CTRL, |api, buf| unsafe {
            (api.somd_decode_aux_in_sequencer_ctrl)(c_int::from(aux_in), buf)
        })
    }

    pub fn aux_io_sequencer_ctrl(&self, device: i32, slot: i32) -> NativeResult<AuxIoSequencerCtrl> {
        let (aux_out, aux_in) = self.call("SEPIA2_SOMD_GetAUXIOSequencerCtrl", |api| {
            let (mut aux_out, mut aux_in) = (0u8, 0u8);
            let code = unsafe { (api.somd_get_aux_io_sequencer_ctrl)(device, slot, &mut aux_out, &mut aux_in) };
            Ok((code, (aux_out, aux_in)))
        })?;
        Ok(AuxIoSequencerCtrl {
            aux_out: flag(aux_out),
            aux_in,
        })
    }

    pub fn set_aux_io_sequencer_ctrl(&self, device: i32, slot: i32, ctrl: AuxIoSequencerCtrl) -> NativeResult<()> {
        self.call_status("SEPIA2_SOMD_SetAUXIOSequencerCtrl", |api| unsafe {
            (api.somd_set_aux_io_sequencer_ctrl)(device, slot, u8::from(ctrl.aux_out), ctrl.aux_in)
        })
    }

    pub fn burst_values(&self, device: i32, slot: i32) -> NativeResult<BurstValues> {
        let (divider, pre_sync, sync_mask) = self.call("SEPIA2_SOMD_GetBurstValues", |api| {
            let mut divider = 0u16;
            let (mut pre_sync, mut sync_mask) = (0u8, 0u8);
            let code = unsafe {
                (api.somd_get_burst_values)(device, slot, &mut divider, &mut pre_sync, &mut sync_mask)
            };
            Ok((code, (divider, pre_sync, sync_mask)))
        })?;
        Ok(BurstValues {
            divider,
            pre_sync,
            sync_mask,
        })
    }

    pub fn set_burst_values(&self, device: i32, slot: i32, values: BurstValues) -> NativeResult<()> {
        self.call_status("SEPIA2_SOMD_SetBurstValues", |api| unsafe {
            (api.somd_set_burst_values)(device, slot, values.divider, values.pre_sync, values.sync_mask)
        })
    }

    /// Burst length of each of the eight channels.
    pub fn burst_length_array(&self, device: i32, slot: i32) -> NativeResult<[i64; BURST_CHANNELS]> {
        let raw = self.call("SEPIA2_SOMD_GetBurstLengthArray", |api| {
            let mut l: [c_long; BURST_CHANNELS] = [0; BURST_CHANNELS];
            let [l0, l1, l2, l3, l4, l5, l6, l7] = &mut l;
            let code = unsafe { (api.somd_get_burst_length_array)(device, slot, l0, l1, l2, l3, l4, l5, l6, l7) };
            Ok((code, l))
        })?;
        Ok(raw.map(i64::from))
    }

    /// Set all eight burst lengths.
    ///
    /// `lengths` must hold exactly one value per channel; anything else is
    /// rejected before the library is called.
    pub fn set_burst_length_array(&self, device: i32, slot: i32, lengths: &[i64]) -> NativeResult<()> {
        let lengths: &[i64; BURST_CHANNELS] = lengths.try_into().map_err(|_| {
            NativeError::invalid_argument(
                "burst_lengths",
                format!("expected {BURST_CHANNELS} channels, got {}", lengths.len()),
            )
        })?;
        self.call("SEPIA2_SOMD_SetBurstLengthArray", |api| {
            let mut l: [c_long; BURST_CHANNELS] = [0; BURST_CHANNELS];
            for (dst, &value) in l.iter_mut().zip(lengths) {
                *dst = to_native(value, "long")?;
            }
            let [l0, l1, l2, l3, l4, l5, l6, l7] = l;
            let code = unsafe { (api.somd_set_burst_length_array)(device, slot, l0, l1, l2, l3, l4, l5, l6, l7) };
            Ok((code, ()))
        })
    }

    pub fn out_n_sync_enable(&self, device: i32, slot: i32) -> NativeResult<OutputEnables> {
        let (outputs, sync, inverse) = self.call("SEPIA2_SOMD_GetOutNSyncEnable", |api| {
            let (mut outputs, mut sync, mut inverse) = (0u8, 0u8, 0u8);
            let code = unsafe {
                (api.somd_get_out_n_sync_enable)(device, slot, &mut outputs, &mut sync, &mut inverse)
            };
            Ok((code, (outputs, sync, inverse)))
        })?;
        Ok(OutputEnables {
            outputs: BitMask8(outputs),
            sync: BitMask8(sync),
            sync_inverse: flag(inverse),
        })
    }

    pub fn set_out_n_sync_enable(&self, device: i32, slot: i32, enables: OutputEnables) -> NativeResult<()> {
        self.call_status("SEPIA2_SOMD_SetOutNSyncEnable", |api| unsafe {
            (api.somd_set_out_n_sync_enable)(
                device,
                slot,
                enables.outputs.0,
                enables.sync.0,
                u8::from(enables.sync_inverse),
            )
        })
    }

    /// Like [`set_out_n_sync_enable`](Self::set_out_n_sync_enable), with one
    /// flag per channel. Both slices must hold eight flags.
    pub fn set_out_n_sync_enable_channels(
        &self,
        device: i32,
        slot: i32,
        outputs: &[bool],
        sync: &[bool],
        sync_inverse: bool,
    ) -> NativeResult<()> {
        let enables = OutputEnables {
            outputs: BitMask8::from_channels(outputs)?,
            sync: BitMask8::from_channels(sync)?,
            sync_inverse,
        };
        self.set_out_n_sync_enable(device, slot, enables)
    }

    /// Resynchronize the sequencer.
    ///
    /// Blocks until the module has locked; runs under the watchdog when one
    /// is configured.
    pub fn synchronize_now(&self, device: i32, slot: i32) -> NativeResult<()> {
        const FUNCTION: &str = "SEPIA2_SOMD_SynchronizeNow";
        self.with_adapter(|api, adapter| {
            let synchronize = api.somd_synchronize_now;
            let code = self.binding.blocking(move || unsafe { synchronize(device, slot) })?;
            adapter.check(FUNCTION, StatusCode::from(code), &[])
        })
    }

    pub fn decode_module_state(&self, state: u16) -> NativeResult<String> {
        self.call_text("SEPIA2_SOMD_DecodeModuleState", len::MODULE_STATE, |api, buf| unsafe {
            (api.somd_decode_module_state)(state, buf)
        })
    }

    pub fn status_error(&self, device: i32, slot: i32) -> NativeResult<StatusError> {
        let (state, error) = self.call("SEPIA2_SOMD_GetStatusError", |api| {
            let mut state = 0u16;
            let mut error = 0i16;
            let code = unsafe { (api.somd_get_status_error)(device, slot, &mut state, &mut error) };
            Ok((code, (state, error)))
        })?;
        Ok(StatusError {
            state: SomdState::from_bits_retain(state),
            error,
        })
    }

    pub fn trig_sync_freq(&self, device: i32, slot: i32) -> NativeResult<TrigSyncFreq> {
        let (stable, frequency) = self.call("SEPIA2_SOMD_GetTrigSyncFreq", |api| {
            let mut stable = 0u8;
            let mut frequency: c_ulong = 0;
            let code = unsafe { (api.somd_get_trig_sync_freq)(device, slot, &mut stable, &mut frequency) };
            Ok((code, (stable, frequency)))
        })?;
        Ok(TrigSyncFreq {
            stable: flag(stable),
            frequency_hz: u64::from(frequency),
        })
    }

    pub fn delay_units(&self, device: i32, slot: i32) -> NativeResult<DelayUnits> {
        let (coarse_step, fine_steps) = self.call("SEPIA2_SOMD_GetDelayUnits", |api| {
            let mut coarse = 0f64;
            let mut fine = 0u8;
            let code = unsafe { (api.somd_get_delay_units)(device, slot, &mut coarse, &mut fine) };
            Ok((code, (coarse, fine)))
        })?;
        Ok(DelayUnits {
            coarse_step,
            fine_steps,
        })
    }

    pub fn somd_firmware_version(&self, device: i32, slot: i32) -> NativeResult<FirmwareVersion> {
        self.call("SEPIA2_SOMD_GetFWVersion", |api| {
            let mut packed: c_ulong = 0;
            let code = unsafe { (api.somd_get_fw_version)(device, slot, &mut packed) };
            // Only the low 32 bits are defined
            let packed: u32 = to_native(packed & 0xffff_ffff, "32-bit version word")?;
            Ok((code, packed))
        })
        .map(FirmwareVersion::from_packed)
    }
}
