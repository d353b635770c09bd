//! APT server exports.

use crate::api::native_api;
use std::ffi::{c_char, c_long};

native_api! {
    /// Entry points of `APT.dll`. Every export returns a `long`, which is a
    /// 32-bit integer on Windows.
    pub struct Api: extern "C" {
        apt_init = "APTInit": fn();
        apt_clean_up = "APTCleanUp": fn();
        enable_event_dlg = "EnableEventDlg": fn(c_long);
        get_num_hw_units_ex = "GetNumHWUnitsEx": fn(c_long, *mut c_long);
        get_hw_serial_num_ex = "GetHWSerialNumEx": fn(c_long, c_long, *mut c_long);
        get_hw_info = "GetHWInfo": fn(c_long, *mut c_char, c_long, *mut c_char, c_long, *mut c_char, c_long);
        init_hw_device = "InitHWDevice": fn(c_long);

        mot_get_status_bits = "MOT_GetStatusBits": fn(c_long, *mut c_long);
        mot_move_jog = "MOT_MoveJog": fn(c_long, c_long, c_long);
        mot_get_position = "MOT_GetPosition": fn(c_long, *mut f32);
        mot_move_absolute_ex = "MOT_MoveAbsoluteEx": fn(c_long, f32, c_long);
    }
}
