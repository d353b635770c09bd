//! attocube attoDRY cryostat interface (`AttoDryInterfaceLib64bit`).
//!
//! The library runs a server process that talks to the cryostat. It is
//! started for one device model by `AttoDRY_Interface_begin` right after
//! loading and must be stopped by `AttoDRY_Interface_end` before the library
//! is unloaded. Functions return 0 on success; the library publishes no
//! descriptions of its error codes.

mod api;

pub use api::Api;

use crate::binding::Binding;
use lib_native_ffi::{
    CallAdapter, DeviceSession, FromNative, LibraryLocator, MarshalResult, NativeResult,
    NoDecoder, OutBuffer, SessionState, Teardown, TextEncoding,
};
use lib_types::StatusCode;
use serde::{Deserialize, Serialize};
use std::ffi::{c_char, c_int};
use std::fmt;
use std::path::Path;

pub const LIBRARY: LibraryLocator = LibraryLocator::new("AttoDryInterfaceLib64bit");

pub const DEFAULT_ENCODING: TextEncoding = TextEncoding::Latin1;

pub const SUCCESS: StatusCode = StatusCode::ZERO;

/// Capacity of the error and action message buffers.
pub const MESSAGE_LEN: usize = 500;

/// Cryostat model the interface server is started for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum DeviceType {
    AttoDry1100 = 0,
    #[default]
    AttoDry2100 = 1,
    AttoDry800 = 2,
}

impl DeviceType {
    pub fn code(self) -> u16 {
        self as u16
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Handle to a started attoDRY interface.
#[derive(Debug)]
pub struct AttoDry {
    binding: Binding<Api>,
    session: DeviceSession,
}

impl AttoDry {
    /// Load the library and start the interface server for `device`.
    ///
    /// The library is unloaded again if the server does not start.
    ///
    /// # Safety
    ///
    /// The library found must be the attoDRY interface library.
    pub unsafe fn open(path: Option<&Path>, encoding: TextEncoding, device: DeviceType) -> NativeResult<Self> {
        let binding = unsafe { Binding::open(&LIBRARY, path, encoding, |lib| Api::bind(lib))? };
        let mut dry = Self::with_binding(binding);
        dry.begin(device)?;
        Ok(dry)
    }

    /// Use an entry-point table that is already in the process. The server
    /// is not started.
    pub fn from_api(api: Api, encoding: TextEncoding) -> Self {
        Self::with_binding(Binding::from_api(LIBRARY.name, api, encoding))
    }

    fn with_binding(binding: Binding<Api>) -> Self {
        Self {
            binding,
            session: DeviceSession::new("attoDRY"),
        }
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
        f(&api, &self.binding.adapter(SUCCESS, &NoDecoder))
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

    fn call_flag(&self, function: &str, call: impl FnOnce(&Api, *mut c_int) -> c_int) -> NativeResult<bool> {
        self.call(function, |api| {
            let mut flag = 0;
            let code = call(api, &mut flag);
            Ok((code, flag))
        })
        .map(|flag| flag != 0)
    }

    fn call_message(&self, function: &str, call: impl FnOnce(&Api, *mut c_char, i32) -> c_int) -> NativeResult<String> {
        self.call(function, |api| {
            let mut message = OutBuffer::new(MESSAGE_LEN);
            let capacity: i32 = message.len_arg()?;
            let code = call(api, message.as_mut_ptr(), capacity);
            Ok((code, message))
        })
    }

    // --- session ---

    /// Start the interface server for `device`.
    pub fn begin(&mut self, device: DeviceType) -> NativeResult<()> {
        let api = self.binding.api()?;
        let adapter = self.binding.adapter(SUCCESS, &NoDecoder);
        tracing::debug!(device = %device, "Starting attoDRY interface");
        self.session.begin(|| {
            adapter.invoke_status("AttoDRY_Interface_begin", || Ok(unsafe { (api.begin)(device.code()) }))
        })
    }

    /// Stop the interface server; does nothing if it is not running.
    pub fn end(&mut self) -> NativeResult<()> {
        let binding = &self.binding;
        self.session.end(|| {
            let api = binding.api()?;
            binding
                .adapter(SUCCESS, &NoDecoder)
                .invoke_status("AttoDRY_Interface_end", || Ok(unsafe { (api.end)() }))
        })
    }

    /// Stop the interface server, then unload the library even if stopping
    /// failed. Returns the first failure.
    pub fn close(&mut self) -> NativeResult<()> {
        let mut teardown = Teardown::new(LIBRARY.name);
        teardown.step("end", || self.end());
        teardown.step("unload", || self.binding.close());
        teardown.finish()
    }

    // --- connection ---

    /// Connect to the cryostat on `com_port`, e.g. `COM3`.
    pub fn connect(&self, com_port: &str) -> NativeResult<()> {
        let encoding = self.binding.encoding();
        self.call("AttoDRY_Interface_Connect", |api| {
            let port = encoding.to_c_string("com_port", com_port)?;
            let code = unsafe { (api.connect)(port.as_ptr()) };
            Ok((code, ()))
        })
    }

    pub fn disconnect(&self) -> NativeResult<()> {
        self.call_status("AttoDRY_Interface_Disconnect", |api| unsafe { (api.disconnect)() })
    }

    /// Whether the cryostat finished initializing after [`connect`](Self::connect).
    pub fn is_initialised(&self) -> NativeResult<bool> {
        self.call_flag("AttoDRY_Interface_isDeviceInitialised", |api, flag| unsafe {
            (api.is_device_initialised)(flag)
        })
    }

    pub fn is_connected(&self) -> NativeResult<bool> {
        self.call_flag("AttoDRY_Interface_isDeviceConnected", |api, flag| unsafe {
            (api.is_device_connected)(flag)
        })
    }

    // --- temperature ---

    /// Sample temperature in kelvin, as of the last status message.
    pub fn sample_temperature(&self) -> NativeResult<f32> {
        self.call("AttoDRY_Interface_getSampleTemperature", |api| {
            let mut kelvin = 0f32;
            let code = unsafe { (api.get_sample_temperature)(&mut kelvin) };
            Ok((code, kelvin))
        })
    }

    /// Temperature control set point in kelvin.
    pub fn user_temperature(&self) -> NativeResult<f32> {
        self.call("AttoDRY_Interface_getUserTemperature", |api| {
            let mut kelvin = 0f32;
            let code = unsafe { (api.get_user_temperature)(&mut kelvin) };
            Ok((code, kelvin))
        })
    }

    pub fn set_user_temperature(&self, kelvin: f32) -> NativeResult<()> {
        self.call_status("AttoDRY_Interface_setUserTemperature", |api| unsafe {
            (api.set_user_temperature)(kelvin)
        })
    }

    pub fn is_controlling_temperature(&self) -> NativeResult<bool> {
        self.call_flag("AttoDRY_Interface_isControllingTemperature", |api, flag| unsafe {
            (api.is_controlling_temperature)(flag)
        })
    }

    /// Same as the thermometer icon on the touch screen.
    pub fn toggle_full_temperature_control(&self) -> NativeResult<()> {
        self.call_status("AttoDRY_Interface_toggleFullTemperatureControl", |api| unsafe {
            (api.toggle_full_temperature_control)()
        })
    }

    /// Toggle only the sample temperature controller, without pumping.
    pub fn toggle_sample_temperature_control(&self) -> NativeResult<()> {
        self.call_status("AttoDRY_Interface_toggleSampleTemperatureControl", |api| unsafe {
            (api.toggle_sample_temperature_control)()
        })
    }

    // --- messages ---

    pub fn error_status(&self) -> NativeResult<i8> {
        self.call("AttoDRY_Interface_getAttodryErrorStatus", |api| {
            let mut status = 0i8;
            let code = unsafe { (api.get_error_status)(&mut status) };
            Ok((code, status))
        })
    }

    pub fn error_message(&self) -> NativeResult<String> {
        self.call_message("AttoDRY_Interface_getAttodryErrorMessage", |api, buf, len| unsafe {
            (api.get_error_message)(buf, len)
        })
    }

    /// Action in progress, as shown in pop ups on the display.
    pub fn action_message(&self) -> NativeResult<String> {
        self.call_message("AttoDRY_Interface_getActionMessage", |api, buf, len| unsafe {
            (api.get_action_message)(buf, len)
        })
    }

    /// Answer a pop up positively.
    pub fn confirm(&self) -> NativeResult<()> {
        self.call_status("AttoDRY_Interface_Confirm", |api| unsafe { (api.confirm)() })
    }

    /// Cancel an action or answer a pop up negatively.
    pub fn cancel(&self) -> NativeResult<()> {
        self.call_status("AttoDRY_Interface_Cancel", |api| unsafe { (api.cancel)() })
    }
}

impl Drop for AttoDry {
    fn drop(&mut self) {
        if self.session.is_active() {
            if let Err(e) = self.close() {
                tracing::warn!(error = %e, "attoDRY interface shut down failed during drop");
            }
        }
    }
}

#[cfg(test)]
mod tests;
