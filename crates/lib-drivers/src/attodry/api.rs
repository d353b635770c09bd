//! attoDRY interface library exports.

use crate::api::native_api;
use std::ffi::{c_char, c_int};

native_api! {
    /// Entry points of `AttoDryInterfaceLib64bit`.
    pub struct Api: extern "C" {
        begin = "AttoDRY_Interface_begin": fn(u16);
        end = "AttoDRY_Interface_end": fn();
        connect = "AttoDRY_Interface_Connect": fn(*const c_char);
        disconnect = "AttoDRY_Interface_Disconnect": fn();
        is_device_initialised = "AttoDRY_Interface_isDeviceInitialised": fn(*mut c_int);
        is_device_connected = "AttoDRY_Interface_isDeviceConnected": fn(*mut c_int);

        get_sample_temperature = "AttoDRY_Interface_getSampleTemperature": fn(*mut f32);
        get_user_temperature = "AttoDRY_Interface_getUserTemperature": fn(*mut f32);
        set_user_temperature = "AttoDRY_Interface_setUserTemperature": fn(f32);
        is_controlling_temperature = "AttoDRY_Interface_isControllingTemperature": fn(*mut c_int);
        toggle_full_temperature_control = "AttoDRY_Interface_toggleFullTemperatureControl": fn();
        toggle_sample_temperature_control = "AttoDRY_Interface_toggleSampleTemperatureControl": fn();

        get_error_status = "AttoDRY_Interface_getAttodryErrorStatus": fn(*mut i8);
        get_error_message = "AttoDRY_Interface_getAttodryErrorMessage": fn(*mut c_char, i32);
        get_action_message = "AttoDRY_Interface_getActionMessage": fn(*mut c_char, i32);
        confirm = "AttoDRY_Interface_Confirm": fn();
        cancel = "AttoDRY_Interface_Cancel": fn();
    }
}
