//! Sepia II library exports.

use crate::api::native_api;
use std::ffi::{c_char, c_int, c_long, c_ulong};

native_api! {
    /// Entry points of `Sepia2_Lib`.
    pub struct Api: extern "C" {
        lib_decode_error = "SEPIA2_LIB_DecodeError": fn(c_int, *mut c_char);
        lib_get_version = "SEPIA2_LIB_GetVersion": fn(*mut c_char);
        lib_is_running_on_wine = "SEPIA2_LIB_IsRunningOnWine": fn(*mut u8);

        usb_open_device = "SEPIA2_USB_OpenDevice": fn(c_int, *mut c_char, *mut c_char);
        usb_open_get_ser_num_and_close = "SEPIA2_USB_OpenGetSerNumAndClose": fn(c_int, *mut c_char, *mut c_char);
        usb_get_str_descriptor = "SEPIA2_USB_GetStrDescriptor": fn(c_int, *mut c_char);
        usb_close_device = "SEPIA2_USB_CloseDevice": fn(c_int);

        fwr_decode_err_phase_name = "SEPIA2_FWR_DecodeErrPhaseName": fn(c_int, *mut c_char);
        fwr_get_version = "SEPIA2_FWR_GetVersion": fn(c_int, *mut c_char);
        fwr_get_last_error = "SEPIA2_FWR_GetLastError": fn(c_int, *mut c_int, *mut c_int, *mut c_int, *mut c_int, *mut c_char);
        fwr_get_working_mode = "SEPIA2_FWR_GetWorkingMode": fn(c_int, *mut c_int);
        fwr_set_working_mode = "SEPIA2_FWR_SetWorkingMode": fn(c_int, c_int);
        fwr_roll_back_to_permanent_values = "SEPIA2_FWR_RollBackToPermanentValues": fn(c_int);
        fwr_store_as_permanent_values = "SEPIA2_FWR_StoreAsPermanentValues": fn(c_int);
        fwr_get_module_map = "SEPIA2_FWR_GetModuleMap": fn(c_int, c_int, *mut c_int);
        fwr_get_module_info_by_map_idx = "SEPIA2_FWR_GetModuleInfoByMapIdx": fn(c_int, c_int, *mut c_int, *mut u8, *mut u8, *mut u8);
        fwr_get_uptime_info_by_map_idx = "SEPIA2_FWR_GetUptimeInfoByMapIdx": fn(c_int, c_int, *mut c_ulong, *mut c_ulong, *mut c_ulong);
        fwr_create_support_request_text = "SEPIA2_FWR_CreateSupportRequestText": fn(c_int, *const c_char, *const c_char, c_int, c_int, *mut c_char);
        fwr_free_module_map = "SEPIA2_FWR_FreeModuleMap": fn(c_int);

        com_decode_module_type = "SEPIA2_COM_DecodeModuleType": fn(c_int, *mut c_char);
        com_decode_module_type_abbr = "SEPIA2_COM_DecodeModuleTypeAbbr": fn(c_int, *mut c_char);
        com_get_module_type = "SEPIA2_COM_GetModuleType": fn(c_int, c_int, c_int, *mut c_int);
        com_has_secondary_module = "SEPIA2_COM_HasSecondaryModule": fn(c_int, c_int, *mut c_int);
        com_get_serial_number = "SEPIA2_COM_GetSerialNumber": fn(c_int, c_int, c_int, *mut c_char);
        com_get_supplementary_infos = "SEPIA2_COM_GetSupplementaryInfos": fn(c_int, c_int, c_int, *mut c_char, *mut c_char, *mut c_char, *mut c_char);
        com_get_preset_info = "SEPIA2_COM_GetPresetInfo": fn(c_int, c_int, c_int, c_int, *mut u8, *mut c_char);
        com_recall_preset = "SEPIA2_COM_RecallPreset": fn(c_int, c_int, c_int, c_int);
        com_save_as_preset = "SEPIA2_COM_SaveAsPreset": fn(c_int, c_int, c_int, c_int, *const c_char);
        com_is_writable_module = "SEPIA2_COM_IsWritableModule": fn(c_int, c_int, c_int, *mut u8);

        scm_get_power_and_laser_leds = "SEPIA2_SCM_GetPowerAndLaserLEDS": fn(c_int, c_int, *mut u8, *mut u8);
        scm_get_laser_locked = "SEPIA2_SCM_GetLaserLocked": fn(c_int, c_int, *mut u8);
        scm_get_laser_soft_lock = "SEPIA2_SCM_GetLaserSoftLock": fn(c_int, c_int, *mut u8);
        scm_set_laser_soft_lock = "SEPIA2_SCM_SetLaserSoftLock": fn(c_int, c_int, u8);

        slm_decode_freq_trig_mode = "SEPIA2_SLM_DecodeFreqTrigMode": fn(c_int, *mut c_char);
        slm_decode_head_type = "SEPIA2_SLM_DecodeHeadType": fn(c_int, *mut c_char);
        slm_get_intensity_fine_step = "SEPIA2_SLM_GetIntensityFineStep": fn(c_int, c_int, *mut u16);
        slm_set_intensity_fine_step = "SEPIA2_SLM_SetIntensityFineStep": fn(c_int, c_int, u16);
        slm_get_pulse_parameters = "SEPIA2_SLM_GetPulseParameters": fn(c_int, c_int, *mut c_int, *mut u8, *mut c_int);
        slm_set_pulse_parameters = "SEPIA2_SLM_SetPulseParameters": fn(c_int, c_int, c_int, u8);

        sml_decode_head_type = "SEPIA2_SML_DecodeHeadType": fn(c_int, *mut c_char);
        sml_get_parameters = "SEPIA2_SML_GetParameters": fn(c_int, c_int, *mut u8, *mut c_int, *mut u8);
        sml_set_parameters = "SEPIA2_SML_SetParameters": fn(c_int, c_int, u8, u8);

        somd_get_freq_trig_mode = "SEPIA2_SOMD_GetFreqTrigMode": fn(c_int, c_int, *mut c_int, *mut u8);
        somd_set_freq_trig_mode = "SEPIA2_SOMD_SetFreqTrigMode": fn(c_int, c_int, c_int, u8);
        somd_get_burst_values = "SEPIA2_SOMD_GetBurstValues": fn(c_int, c_int, *mut u16, *mut u8, *mut u8);
        somd_set_burst_values = "SEPIA2_SOMD_SetBurstValues": fn(c_int, c_int, u16, u8, u8);
        somd_get_burst_length_array = "SEPIA2_SOMD_GetBurstLengthArray": fn(
            c_int, c_int,
            *mut c_long, *mut c_long, *mut c_long, *mut c_long,
            *mut c_long, *mut c_long, *mut c_long, *mut c_long,
        );
        somd_set_burst_length_array = "SEPIA2_SOMD_SetBurstLengthArray": fn(
            c_int, c_int,
            c_long, c_long, c_long, c_long,
            c_long, c_long, c_long, c_long,
        );
        somd_get_trigger_range = "SEPIA2_SOMD_GetTriggerRange": fn(c_int, c_int, *mut c_int, *mut c_int);
        somd_get_trigger_level = "SEPIA2_SOMD_GetTriggerLevel": fn(c_int, c_int, *mut c_int);
        somd_set_trigger_level = "SEPIA2_SOMD_SetTriggerLevel": fn(c_int, c_int, c_int);
        somd_decode_aux_in_sequencer_ctrl = "SEPIA2_SOMD_DecodeAUXINSequencerCtrl": fn(c_int, *mut c_char);
        somd_get_aux_io_sequencer_ctrl = "SEPIA2_SOMD_GetAUXIOSequencerCtrl": fn(c_int, c_int, *mut u8, *mut u8);
        somd_set_aux_io_sequencer_ctrl = "SEPIA2_SOMD_SetAUXIOSequencerCtrl": fn(c_int, c_int, u8, u8);
        somd_get_out_n_sync_enable = "SEPIA2_SOMD_GetOutNSyncEnable": fn(c_int, c_int, *mut u8, *mut u8, *mut u8);
        somd_set_out_n_sync_enable = "SEPIA2_SOMD_SetOutNSyncEnable": fn(c_int, c_int, u8, u8, u8);
        somd_synchronize_now = "SEPIA2_SOMD_SynchronizeNow": fn(c_int, c_int);
        somd_decode_module_state = "SEPIA2_SOMD_DecodeModuleState": fn(u16, *mut c_char);
        somd_get_status_error = "SEPIA2_SOMD_GetStatusError": fn(c_int, c_int, *mut u16, *mut i16);
        somd_get_trig_sync_freq = "SEPIA2_SOMD_GetTrigSyncFreq": fn(c_int, c_int, *mut u8, *mut c_ulong);
        somd_get_delay_units = "SEPIA2_SOMD_GetDelayUnits": fn(c_int, c_int, *mut f64, *mut u8);
        somd_get_fw_version = "SEPIA2_SOMD_GetFWVersion": fn(c_int, c_int, *mut c_ulong);
    }
}
