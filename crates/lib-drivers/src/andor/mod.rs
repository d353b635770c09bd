//! Andor SDK camera library (`atmcd64d`).
//!
//! Every function returns an exit code, `DRV_SUCCESS` (20002) on success.
//! The SDK publishes no messages, so failures carry the symbolic name from
//! [`ExitCode`] instead.
//!
//! The SDK must be initialized before use and shut down before the library
//! is unloaded; [`Andor::close`] does both in that order.

mod api;
mod codes;

pub use api::Api;
pub use codes::*;

use crate::binding::Binding;
use lib_native_ffi::{
    to_native, CallAdapter, DeviceSession, EnumNames, FromNative, LibraryLocator,
    MarshalResult, NativeResult, OutBuffer, SessionState, Teardown, TextEncoding, Watchdog,
};
use lib_types::{decode_enum, CodeEnum, Coded, StatusCode};
use serde::Serialize;
use std::ffi::{c_int, c_long, c_uint, c_ulong};
use std::path::Path;

pub const DEFAULT_PATH: &str = r"C:\Program Files\Andor SDK\atmcd64d.dll";

pub const LIBRARY: LibraryLocator = LibraryLocator::with_default("atmcd64d", DEFAULT_PATH);

pub const DEFAULT_ENCODING: TextEncoding = TextEncoding::Ascii;

pub const SUCCESS: StatusCode = StatusCode(20002);

const HEAD_MODEL_LEN: usize = 260;

/// `SetFilterMode` argument that enables cosmic ray filtering.
const FILTER_COSMIC_RAY: c_int = 2;

const DECODER: EnumNames<ExitCode> = EnumNames::new();

/// Detector temperature with the cooling state reported alongside it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TemperatureReading {
    /// Degrees Celsius, to the nearest degree.
    pub celsius: i32,
    pub status: Coded<ExitCode>,
}

impl TemperatureReading {
    pub fn is_stabilized(&self) -> bool {
        self.status == Coded::Known(ExitCode::DRV_TEMPERATURE_STABILIZED)
    }
}

/// Valid acquisition timings, in seconds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct AcquisitionTimings {
    pub exposure: f32,
    pub accumulate: f32,
    pub kinetic: f32,
}

/// Detector size in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DetectorSize {
    /// Along the readout register.
    pub x: i32,
    pub y: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct HardwareVersion {
    pub pcb: u32,
    pub decode: u32,
    pub firmware_version: u32,
    pub firmware_build: u32,
}

/// Camera handle from [`Andor::camera_handle`], valid for the lifetime of
/// the loaded SDK.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct CameraHandle(pub i32);

/// Shutter configuration for [`Andor::set_shutter`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Shutter {
    pub kind: ShutterType,
    pub mode: ShutterMode,
    /// Milliseconds.
    pub closing_time: i32,
    /// Milliseconds.
    pub opening_time: i32,
}

/// Handle to an open Andor SDK.
#[derive(Debug)]
pub struct Andor {
    binding: Binding<Api>,
    session: DeviceSession,
}

impl Andor {
    /// Load the SDK library. The SDK itself is not initialized yet.
    ///
    /// # Safety
    ///
    /// The library found must be the Andor SDK.
    pub unsafe fn open(path: Option<&Path>, encoding: TextEncoding) -> NativeResult<Self> {
        let binding = unsafe { Binding::open(&LIBRARY, path, encoding, |lib| Api::bind(lib))? };
        Ok(Self::with_binding(binding))
    }

    pub fn from_api(api: Api, encoding: TextEncoding) -> Self {
        Self::with_binding(Binding::from_api(LIBRARY.name, api, encoding))
    }

    fn with_binding(binding: Binding<Api>) -> Self {
        Self {
            binding,
            session: DeviceSession::new("Andor SDK"),
        }
    }

    /// Run [`wait_for_acquisition`](Self::wait_for_acquisition) under
    /// `watchdog`.
    pub fn with_watchdog(mut self, watchdog: Watchdog) -> Self {
        self.binding.set_watchdog(Some(watchdog));
        self
    }

    pub fn binding(&self) -> &Binding<Api> {
        &self.binding
    }

    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    fn with_adapter<T>(
        &self,
        f: impl FnOnce(&Api, &CallAdapter<'_>) -> NativeResult<T>,
    ) -> NativeResult<T> {
        let api = self.binding.api()?;
        f(&api, &self.binding.adapter(SUCCESS, &DECODER))
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

    /// Initialize the SDK, reading detector files from `directory`.
    pub fn initialize(&mut self, directory: &str) -> NativeResult<()> {
        let api = self.binding.api()?;
        let adapter = self.binding.adapter(SUCCESS, &DECODER);
        let encoding = self.binding.encoding();
        self.session.begin(|| {
            adapter.invoke_status("Initialize", || {
                let mut directory = encoding
                    .to_c_string("directory", directory)?
                    .into_bytes_with_nul();
                Ok(unsafe { (api.initialize)(directory.as_mut_ptr().cast()) })
            })
        })
    }

    // --- camera selection ---
    //
    // Available before `initialize`; the selected camera is the one the
    // following `initialize` and every later call address.

    pub fn available_cameras(&self) -> NativeResult<i32> {
        self.call("GetAvailableCameras", |api| {
            let mut total: c_long = 0;
            let code = unsafe { (api.get_available_cameras)(&mut total) };
            Ok((code, to_native::<i32, _>(total, "long")?))
        })
    }

    /// Handle of the camera at `index`, counted from 0.
    pub fn camera_handle(&self, index: i32) -> NativeResult<CameraHandle> {
        self.call("GetCameraHandle", |api| {
            let mut handle: c_long = 0;
            let code = unsafe { (api.get_camera_handle)(c_long::from(index), &mut handle) };
            Ok((code, to_native::<i32, _>(handle, "long")?))
        })
        .map(CameraHandle)
    }

    pub fn set_current_camera(&self, camera: CameraHandle) -> NativeResult<()> {
        tracing::debug!(handle = camera.0, "Selecting Andor camera");
        self.call_status("SetCurrentCamera", |api| unsafe {
            (api.set_current_camera)(c_long::from(camera.0))
        })
    }

    /// Shut the SDK down, then unload the library.
    ///
    /// `ShutDown` is only sent after a successful [`initialize`](Self::initialize).
    /// The library is unloaded even if shutting down fails; the first
    /// failure is returned.
    pub fn close(&mut self) -> NativeResult<()> {
        let mut teardown = Teardown::new(LIBRARY.name);
        let binding = &self.binding;
        let session = &mut self.session;
        teardown.step("ShutDown", || {
            session.end(|| {
                let api = binding.api()?;
                binding
                    .adapter(SUCCESS, &DECODER)
                    .invoke_status("ShutDown", || Ok(unsafe { (api.shut_down)() }))
            })
        });
        teardown.step("unload", || self.binding.close());
        teardown.finish()
    }

    // --- cooling ---

    pub fn cooler_on(&self) -> NativeResult<()> {
        self.call_status("CoolerON", |api| unsafe { (api.cooler_on)() })
    }

    pub fn cooler_off(&self) -> NativeResult<()> {
        self.call_status("CoolerOFF", |api| unsafe { (api.cooler_off)() })
    }

    pub fn is_cooler_on(&self) -> NativeResult<bool> {
        self.call("IsCoolerOn", |api| {
            let mut on = 0;
            let code = unsafe { (api.is_cooler_on)(&mut on) };
            Ok((code, on))
        })
        .map(|on| on != 0)
    }

    /// Current detector temperature.
    ///
    /// The SDK signals the cooling state through the exit code; the
    /// not-stabilized, stabilized and not-reached states still come with a
    /// valid reading and are returned in [`TemperatureReading::status`].
    pub fn temperature(&self) -> NativeResult<TemperatureReading> {
        let (status, celsius) = self.with_adapter(|api, adapter| {
            adapter.invoke_with_status("GetTemperature", &TEMPERATURE_READING_STATUSES, || {
                let mut celsius = 0;
                let code = unsafe { (api.get_temperature)(&mut celsius) };
                Ok((code, celsius))
            })
        })?;
        Ok(TemperatureReading {
            celsius,
            status: decode_enum(status.get()),
        })
    }

    /// Target temperature in degrees Celsius.
    pub fn set_temperature(&self, celsius: i32) -> NativeResult<()> {
        self.call_status("SetTemperature", |api| unsafe { (api.set_temperature)(celsius) })
    }

    /// Valid target range as `(min, max)` in degrees Celsius.
    pub fn temperature_range(&self) -> NativeResult<(i32, i32)> {
        self.call("GetTemperatureRange", |api| {
            let (mut min, mut max) = (0, 0);
            let code = unsafe { (api.get_temperature_range)(&mut min, &mut max) };
            Ok((code, (min, max)))
        })
    }

    // --- acquisition setup ---

    /// Acquisition status, itself an exit code (`DRV_IDLE`,
    /// `DRV_ACQUIRING`, ...). Codes outside the table are kept as numbers.
    pub fn status(&self) -> NativeResult<Coded<ExitCode>> {
        self.call("GetStatus", |api| {
            let mut status = 0;
            let code = unsafe { (api.get_status)(&mut status) };
            Ok((code, status))
        })
        .map(decode_enum)
    }

    pub fn set_acquisition_mode(&self, mode: AcquisitionMode) -> NativeResult<()> {
        self.call_status("SetAcquisitionMode", |api| unsafe {
            (api.set_acquisition_mode)(mode.code())
        })
    }

    pub fn set_read_mode(&self, mode: ReadMode) -> NativeResult<()> {
        self.call_status("SetReadMode", |api| unsafe { (api.set_read_mode)(mode.code()) })
    }

    pub fn set_trigger_mode(&self, mode: TriggerMode) -> NativeResult<()> {
        self.call_status("SetTriggerMode", |api| unsafe { (api.set_trigger_mode)(mode.code()) })
    }

    pub fn set_shutter(&self, shutter: Shutter) -> NativeResult<()> {
        self.call_status("SetShutter", |api| unsafe {
            (api.set_shutter)(
                shutter.kind.code(),
                shutter.mode.code(),
                shutter.closing_time,
                shutter.opening_time,
            )
        })
    }

    /// Exposure time in seconds; the SDK rounds to the nearest valid value.
    pub fn set_exposure_time(&self, seconds: f32) -> NativeResult<()> {
        self.call_status("SetExposureTime", |api| unsafe { (api.set_exposure_time)(seconds) })
    }

    /// Single track read mode parameters: centre row (1-based) and height.
    pub fn set_single_track(&self, center: i32, height: i32) -> NativeResult<()> {
        self.call_status("SetSingleTrack", |api| unsafe { (api.set_single_track)(center, height) })
    }

    pub fn set_number_accumulations(&self, number: i32) -> NativeResult<()> {
        self.call_status("SetNumberAccumulations", |api| unsafe {
            (api.set_number_accumulations)(number)
        })
    }

    pub fn set_accumulation_cycle_time(&self, seconds: f32) -> NativeResult<()> {
        self.call_status("SetAccumulationCycleTime", |api| unsafe {
            (api.set_accumulation_cycle_time)(seconds)
        })
    }

    /// Whether cosmic ray filtering is on.
    pub fn filter_mode(&self) -> NativeResult<bool> {
        self.call("GetFilterMode", |api| {
            let mut mode = 0;
            let code = unsafe { (api.get_filter_mode)(&mut mode) };
            Ok((code, mode != 0))
        })
    }

    pub fn set_filter_mode(&self, cosmic_ray_filter: bool) -> NativeResult<()> {
        let mode = if cosmic_ray_filter { FILTER_COSMIC_RAY } else { 0 };
        self.call_status("SetFilterMode", |api| unsafe { (api.set_filter_mode)(mode) })
    }

    pub fn number_pre_amp_gains(&self) -> NativeResult<i32> {
        self.call("GetNumberPreAmpGains", |api| {
            let mut count = 0;
            let code = unsafe { (api.get_number_pre_amp_gains)(&mut count) };
            Ok((code, count))
        })
    }

    pub fn pre_amp_gain(&self, index: i32) -> NativeResult<f32> {
        self.call("GetPreAmpGain", |api| {
            let mut gain = 0f32;
            let code = unsafe { (api.get_pre_amp_gain)(index, &mut gain) };
            Ok((code, gain))
        })
    }

    pub fn set_pre_amp_gain(&self, index: i32) -> NativeResult<()> {
        self.call_status("SetPreAmpGain", |api| unsafe { (api.set_pre_amp_gain)(index) })
    }

    pub fn number_hs_speeds(&self, channel: i32, amplifier: OutputAmplifier) -> NativeResult<i32> {
        self.call("GetNumberHSSpeeds", |api| {
            let mut count = 0;
            let code = unsafe { (api.get_number_hs_speeds)(channel, amplifier.code(), &mut count) };
            Ok((code, count))
        })
    }

    /// Horizontal shift speed at `index`, in MHz.
    pub fn hs_speed(&self, channel: i32, amplifier: OutputAmplifier, index: i32) -> NativeResult<f32> {
        self.call("GetHSSpeed", |api| {
            let mut speed = 0f32;
            let code = unsafe { (api.get_hs_speed)(channel, amplifier.code(), index, &mut speed) };
            Ok((code, speed))
        })
    }

    /// Every horizontal shift speed of `channel` and `amplifier`, by index.
    pub fn hs_speeds(&self, channel: i32, amplifier: OutputAmplifier) -> NativeResult<Vec<f32>> {
        (0..self.number_hs_speeds(channel, amplifier)?)
            .map(|index| self.hs_speed(channel, amplifier, index))
            .collect()
    }

    pub fn set_hs_speed(&self, amplifier: OutputAmplifier, index: i32) -> NativeResult<()> {
        self.call_status("SetHSSpeed", |api| unsafe { (api.set_hs_speed)(amplifier.code(), index) })
    }

    pub fn number_vs_speeds(&self) -> NativeResult<i32> {
        self.call("GetNumberVSSpeeds", |api| {
            let mut count = 0;
            let code = unsafe { (api.get_number_vs_speeds)(&mut count) };
            Ok((code, count))
        })
    }

    /// Vertical shift speed at `index`, in microseconds per row.
    pub fn vs_speed(&self, index: i32) -> NativeResult<f32> {
        self.call("GetVSSpeed", |api| {
            let mut speed = 0f32;
            let code = unsafe { (api.get_vs_speed)(index, &mut speed) };
            Ok((code, speed))
        })
    }

    pub fn vs_speeds(&self) -> NativeResult<Vec<f32>> {
        (0..self.number_vs_speeds()?).map(|index| self.vs_speed(index)).collect()
    }

    pub fn set_vs_speed(&self, index: i32) -> NativeResult<()> {
        self.call_status("SetVSSpeed", |api| unsafe { (api.set_vs_speed)(index) })
    }

    // --- acquisition ---

    pub fn start_acquisition(&self) -> NativeResult<()> {
        self.call_status("StartAcquisition", |api| unsafe { (api.start_acquisition)() })
    }

    pub fn abort_acquisition(&self) -> NativeResult<()> {
        self.call_status("AbortAcquisition", |api| unsafe { (api.abort_acquisition)() })
    }

    /// Sleep until the next acquisition event.
    ///
    /// Runs under the watchdog when one is configured; a timed out wait can
    /// be released with [`cancel_wait`](Self::cancel_wait).
    pub fn wait_for_acquisition(&self) -> NativeResult<()> {
        self.with_adapter(|api, adapter| {
            let wait = api.wait_for_acquisition;
            let code = self.binding.blocking(move || unsafe { wait() })?;
            adapter.check("WaitForAcquisition", StatusCode::from(code), &[])
        })
    }

    pub fn cancel_wait(&self) -> NativeResult<()> {
        self.call_status("CancelWait", |api| unsafe { (api.cancel_wait)() })
    }

    /// Data of the last acquisition, `pixels` values long.
    pub fn acquired_data(&self, pixels: usize) -> NativeResult<Vec<i64>> {
        let data = self.call("GetAcquiredData", |api| {
            let size: c_ulong = to_native(pixels, "unsigned long")?;
            let mut data: Vec<c_long> = vec![0; pixels];
            let code = unsafe { (api.get_acquired_data)(data.as_mut_ptr(), size) };
            Ok((code, data))
        })?;
        Ok(data.into_iter().map(i64::from).collect())
    }

    pub fn acquisition_timings(&self) -> NativeResult<AcquisitionTimings> {
        let (exposure, accumulate, kinetic) = self.call("GetAcquisitionTimings", |api| {
            let (mut exposure, mut accumulate, mut kinetic) = (0f32, 0f32, 0f32);
            let code = unsafe { (api.get_acquisition_timings)(&mut exposure, &mut accumulate, &mut kinetic) };
            Ok((code, (exposure, accumulate, kinetic)))
        })?;
        Ok(AcquisitionTimings {
            exposure,
            accumulate,
            kinetic,
        })
    }

    // --- camera ---

    pub fn detector(&self) -> NativeResult<DetectorSize> {
        let (x, y) = self.call("GetDetector", |api| {
            let (mut x, mut y) = (0, 0);
            let code = unsafe { (api.get_detector)(&mut x, &mut y) };
            Ok((code, (x, y)))
        })?;
        Ok(DetectorSize { x, y })
    }

    pub fn head_model(&self) -> NativeResult<String> {
        self.call("GetHeadModel", |api| {
            let mut model = OutBuffer::new(HEAD_MODEL_LEN);
            let code = unsafe { (api.get_head_model)(model.as_mut_ptr()) };
            Ok((code, model))
        })
    }

    pub fn camera_serial_number(&self) -> NativeResult<i32> {
        self.call("GetCameraSerialNumber", |api| {
            let mut serial = 0;
            let code = unsafe { (api.get_camera_serial_number)(&mut serial) };
            Ok((code, serial))
        })
    }

    pub fn hardware_version(&self) -> NativeResult<HardwareVersion> {
        let [pcb, decode, _, _, firmware_version, firmware_build] = self.call("GetHardwareVersion", |api| {
            let mut v: [c_uint; 6] = [0; 6];
            let [v0, v1, v2, v3, v4, v5] = &mut v;
            let code = unsafe { (api.get_hardware_version)(v0, v1, v2, v3, v4, v5) };
            Ok((code, v))
        })?;
        Ok(HardwareVersion {
            pcb,
            decode,
            firmware_version,
            firmware_build,
        })
    }
}

impl Drop for Andor {
    fn drop(&mut self) {
        if self.session.is_active() {
            if let Err(e) = self.close() {
                tracing::warn!(error = %e, "Andor SDK shut down failed during drop");
            }
        }
    }
}

/// Symbolic name of an Andor exit code.
pub fn exit_code_name(code: i32) -> Option<&'static str> {
    ExitCode::from_code(code).map(CodeEnum::name)
}

#[cfg(test)]
mod tests;
