//! Thorlabs APT server (`APT.dll`) for motion controllers such as the
//! PRM1Z8 rotation mount and the MFF10x flip mount.
//!
//! The server is started with `APTInit` and stopped with `APTCleanUp`.
//! Devices are addressed by serial number. Functions return 0 on success;
//! error codes from 10000 up are described by a table in [`ERROR_MESSAGES`].

mod api;
mod codes;

pub use api::Api;
pub use codes::*;

use crate::binding::Binding;
use lib_native_ffi::{
    to_native, CallAdapter, DeviceSession, FromNative, LibraryLocator, MarshalResult,
    MessageTable, NativeError, NativeResult, OutBuffer, SessionState, Teardown, TextEncoding, Watchdog,
};
use lib_types::{CodeEnum, StatusCode};
use serde::Serialize;
use std::ffi::{c_int, c_long};
use std::path::Path;

pub const DEFAULT_PATH: &str = r"C:\Program Files\Thorlabs\APT\APT Server\APT.dll";

pub const LIBRARY: LibraryLocator = LibraryLocator::with_default("APT", DEFAULT_PATH);

pub const DEFAULT_ENCODING: TextEncoding = TextEncoding::Latin1;

pub const SUCCESS: StatusCode = StatusCode::ZERO;

const INFO_LEN: usize = 255;

const DECODER: MessageTable = MessageTable(ERROR_MESSAGES);

/// A device found by enumeration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct HardwareUnit {
    pub index: i32,
    pub serial: i32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HardwareInfo {
    pub model: String,
    pub software_version: String,
    pub notes: String,
}

/// Handle to a running APT server.
#[derive(Debug)]
pub struct Apt {
    binding: Binding<Api>,
    session: DeviceSession,
}

impl Apt {
    /// Load the library and start the server.
    ///
    /// # Safety
    ///
    /// The library found must be the Thorlabs APT server.
    pub unsafe fn open(path: Option<&Path>, encoding: TextEncoding) -> NativeResult<Self> {
        let binding = unsafe { Binding::open(&LIBRARY, path, encoding, |lib| Api::bind(lib))? };
        let mut apt = Self::with_binding(binding);
        apt.init()?;
        Ok(apt)
    }

    /// Use an entry-point table that is already in the process. The server
    /// is not started.
    pub fn from_api(api: Api, encoding: TextEncoding) -> Self {
        Self::with_binding(Binding::from_api(LIBRARY.name, api, encoding))
    }

    fn with_binding(binding: Binding<Api>) -> Self {
        Self {
            binding,
            session: DeviceSession::new("APT server"),
        }
    }

    /// Run waiting moves under `watchdog`.
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

    /// Run a move, under the watchdog when it waits for completion.
    fn motion<F>(&self, function: &str, wait: bool, call: F) -> NativeResult<()>
    where
        F: FnOnce() -> c_int + Send + 'static,
    {
        let code = if wait { self.binding.blocking(call)? } else { call() };
        self.with_adapter(|_, adapter| adapter.check(function, StatusCode::from(code), &[]))
    }

    /// Start the server.
    pub fn init(&mut self) -> NativeResult<()> {
        let api = self.binding.api()?;
        let adapter = self.binding.adapter(SUCCESS, &DECODER);
        self.session
            .begin(|| adapter.invoke_status("APTInit", || Ok(unsafe { (api.apt_init)() })))
    }

    /// Stop the server, then unload the library even if stopping failed.
    pub fn close(&mut self) -> NativeResult<()> {
        let mut teardown = Teardown::new(LIBRARY.name);
        let binding = &self.binding;
        let session = &mut self.session;
        teardown.step("APTCleanUp", || {
            session.end(|| {
                let api = binding.api()?;
                binding
                    .adapter(SUCCESS, &DECODER)
                    .invoke_status("APTCleanUp", || Ok(unsafe { (api.apt_clean_up)() }))
            })
        });
        teardown.step("unload", || self.binding.close());
        teardown.finish()
    }

    /// Show or suppress the server's own error dialogs.
    pub fn enable_event_dialog(&self, enable: bool) -> NativeResult<()> {
        self.call_status("EnableEventDlg", |api| unsafe {
            (api.enable_event_dlg)(c_long::from(enable))
        })
    }

    // --- enumeration ---

    pub fn hardware_unit_count(&self, hardware: HardwareType) -> NativeResult<i32> {
        self.call("GetNumHWUnitsEx", |api| {
            let mut count: c_long = 0;
            let code = unsafe { (api.get_num_hw_units_ex)(c_long::from(hardware.code()), &mut count) };
            Ok((code, to_native::<i32, _>(count, "int")?))
        })
    }

    /// Serial number of the `index`th device of type `hardware`.
    pub fn hardware_serial_number(&self, hardware: HardwareType, index: i32) -> NativeResult<i32> {
        self.call("GetHWSerialNumEx", |api| {
            let mut serial: c_long = 0;
            let code = unsafe {
                (api.get_hw_serial_num_ex)(c_long::from(hardware.code()), c_long::from(index), &mut serial)
            };
            Ok((code, to_native::<i32, _>(serial, "int")?))
        })
    }

    pub fn list_hardware_units(&self, hardware: HardwareType) -> NativeResult<Vec<HardwareUnit>> {
        let count = self.hardware_unit_count(hardware)?;
        (0..count)
            .map(|index| {
                let serial = self.hardware_serial_number(hardware, index)?;
                Ok(HardwareUnit { index, serial })
            })
            .collect()
    }

    /// Start communicating with the device `serial`.
    pub fn init_hardware_device(&self, serial: i32) -> NativeResult<()> {
        self.call_status("InitHWDevice", |api| unsafe { (api.init_hw_device)(c_long::from(serial)) })
    }

    pub fn hardware_info(&self, serial: i32) -> NativeResult<HardwareInfo> {
        let (model, software_version, notes) = self.call("GetHWInfo", |api| {
            let mut model = OutBuffer::new(INFO_LEN);
            let mut version = OutBuffer::new(INFO_LEN);
            let mut notes = OutBuffer::new(INFO_LEN);
            let len: c_long = model.len_arg()?;
            let code = unsafe {
                (api.get_hw_info)(
                    c_long::from(serial),
                    model.as_mut_ptr(),
                    len,
                    version.as_mut_ptr(),
                    len,
                    notes.as_mut_ptr(),
                    len,
                )
            };
            Ok((code, (model, version, notes)))
        })?;
        Ok(HardwareInfo {
            model,
            software_version,
            notes,
        })
    }

    // --- motor ---

    pub fn status_bits(&self, serial: i32) -> NativeResult<StatusBits> {
        let bits = self.call("MOT_GetStatusBits", |api| {
            let mut bits: c_long = 0;
            let code = unsafe { (api.mot_get_status_bits)(c_long::from(serial), &mut bits) };
            // The register is 32 bits wide; a 64-bit long carries it sign-extended
            let word: u32 = to_native(i64::from(bits) & 0xffff_ffff, "32-bit status word")?;
            Ok((code, word))
        })?;
        Ok(StatusBits::from_bits_retain(bits))
    }

    /// Position in the stage's units (degrees for rotation mounts).
    pub fn position(&self, serial: i32) -> NativeResult<f32> {
        self.call("MOT_GetPosition", |api| {
            let mut position = 0f32;
            let code = unsafe { (api.mot_get_position)(c_long::from(serial), &mut position) };
            Ok((code, position))
        })
    }

    /// Jog one step; with `wait` the call returns once the move is done.
    pub fn move_jog(&self, serial: i32, direction: JogDirection, wait: bool) -> NativeResult<()> {
        let jog = self.binding.api()?.mot_move_jog;
        let direction = c_long::from(direction.code());
        self.motion("MOT_MoveJog", wait, move || unsafe {
            jog(c_long::from(serial), direction, c_long::from(wait))
        })
    }

    /// Move to `position`; with `wait` the call returns once it is reached.
    pub fn move_absolute(&self, serial: i32, position: f32, wait: bool) -> NativeResult<()> {
        let move_absolute = self.binding.api()?.mot_move_absolute_ex;
        self.motion("MOT_MoveAbsoluteEx", wait, move || unsafe {
            move_absolute(c_long::from(serial), position, c_long::from(wait))
        })
    }

    /// Move a flip mount to position 0 or 1.
    pub fn flip_to(&self, serial: i32, position: u8, wait: bool) -> NativeResult<()> {
        let direction = match position {
            0 => JogDirection::Forward,
            1 => JogDirection::Reverse,
            other => {
                return Err(NativeError::invalid_argument(
                    "position",
                    format!("flip mounts have positions 0 and 1, got {other}"),
                ))
            }
        };
        self.move_jog(serial, direction, wait)
    }
}

impl Drop for Apt {
    fn drop(&mut self) {
        if self.session.is_active() {
            if let Err(e) = self.close() {
                tracing::warn!(error = %e, "APT server clean up failed during drop");
            }
        }
    }
}
