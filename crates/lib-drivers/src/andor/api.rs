//! Andor SDK exports.

use crate::api::native_api;
use std::ffi::{c_char, c_int, c_long, c_uint, c_ulong};

native_api! {
    /// Entry points of `atmcd64d`, exported with the Windows API calling
    /// convention.
    pub struct Api: extern "system" {
        initialize = "Initialize": fn(*mut c_char);
        shut_down = "ShutDown": fn();

        get_available_cameras = "GetAvailableCameras": fn(*mut c_long);
        get_camera_handle = "GetCameraHandle": fn(c_long, *mut c_long);
        set_current_camera = "SetCurrentCamera": fn(c_long);

        cooler_on = "CoolerON": fn();
        cooler_off = "CoolerOFF": fn();
        is_cooler_on = "IsCoolerOn": fn(*mut c_int);
        get_temperature = "GetTemperature": fn(*mut c_int);
        set_temperature = "SetTemperature": fn(c_int);
        get_temperature_range = "GetTemperatureRange": fn(*mut c_int, *mut c_int);

        get_status = "GetStatus": fn(*mut c_int);
        set_acquisition_mode = "SetAcquisitionMode": fn(c_int);
        set_read_mode = "SetReadMode": fn(c_int);
        set_trigger_mode = "SetTriggerMode": fn(c_int);
        set_shutter = "SetShutter": fn(c_int, c_int, c_int, c_int);
        set_exposure_time = "SetExposureTime": fn(f32);
        set_single_track = "SetSingleTrack": fn(c_int, c_int);
        set_number_accumulations = "SetNumberAccumulations": fn(c_int);
        set_accumulation_cycle_time = "SetAccumulationCycleTime": fn(f32);
        get_filter_mode = "GetFilterMode": fn(*mut c_int);
        set_filter_mode = "SetFilterMode": fn(c_int);

        start_acquisition = "StartAcquisition": fn();
        abort_acquisition = "AbortAcquisition": fn();
        wait_for_acquisition = "WaitForAcquisition": fn();
        cancel_wait = "CancelWait": fn();
        get_acquired_data = "GetAcquiredData": fn(*mut c_long, c_ulong);
        get_acquisition_timings = "GetAcquisitionTimings": fn(*mut f32, *mut f32, *mut f32);

        get_detector = "GetDetector": fn(*mut c_int, *mut c_int);
        get_head_model = "GetHeadModel": fn(*mut c_char);
        get_camera_serial_number = "GetCameraSerialNumber": fn(*mut c_int);
        get_hardware_version = "GetHardwareVersion": fn(
            *mut c_uint, *mut c_uint, *mut c_uint,
            *mut c_uint, *mut c_uint, *mut c_uint,
        );
        get_number_pre_amp_gains = "GetNumberPreAmpGains": fn(*mut c_int);
        get_pre_amp_gain = "GetPreAmpGain": fn(c_int, *mut f32);
        set_pre_amp_gain = "SetPreAmpGain": fn(c_int);
        get_number_hs_speeds = "GetNumberHSSpeeds": fn(c_int, c_int, *mut c_int);
        get_hs_speed = "GetHSSpeed": fn(c_int, c_int, c_int, *mut f32);
        set_hs_speed = "SetHSSpeed": fn(c_int, c_int);
        get_number_vs_speeds = "GetNumberVSSpeeds": fn(*mut c_int);
        get_vs_speed = "GetVSSpeed": fn(c_int, *mut f32);
        set_vs_speed = "SetVSSpeed": fn(c_int);
    }
}
