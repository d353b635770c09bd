use super::*;
use lib_native_ffi::{NativeError, WatchdogConfig};
use std::cell::RefCell;
use std::ffi::{c_char, CStr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

const DRV_SUCCESS: c_int = 20002;

thread_local! {
    static EVENTS: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

fn event(name: impl Into<String>) {
    EVENTS.with(|e| e.borrow_mut().push(name.into()));
}

fn events() -> Vec<String> {
    EVENTS.with(|e| e.borrow().clone())
}

fn andor(api: Api) -> Andor {
    Andor::from_api(api, DEFAULT_ENCODING)
}

unsafe extern "system" fn initialize(dir: *mut c_char) -> c_int {
    let dir = unsafe { CStr::from_ptr(dir) }.to_string_lossy().into_owned();
    event(format!("Initialize({dir})"));
    DRV_SUCCESS
}

unsafe extern "system" fn shut_down() -> c_int {
    event("ShutDown");
    DRV_SUCCESS
}

unsafe extern "system" fn shut_down_fails() -> c_int {
    event("ShutDown");
    20075
}

#[test]
fn test_failure_carries_code_name() {
    unsafe extern "system" fn set_temperature(_: c_int) -> c_int {
        20075
    }

    let andor = andor(Api {
        set_temperature,
        ..Api::stubbed()
    });
    let err = andor.set_temperature(-60).unwrap_err();
    let call = err.as_call().unwrap();
    assert_eq!(call.code, Some(StatusCode(20075)));
    assert_eq!(call.code_name, Some("DRV_NOT_INITIALIZED"));
    assert_eq!(call.message, None);
    assert_eq!(
        err.to_string(),
        "Library function 'SetTemperature' failed with 20075 (DRV_NOT_INITIALIZED)"
    );
}

#[test]
fn test_unknown_code_has_no_name() {
    unsafe extern "system" fn cooler_on() -> c_int {
        31337
    }

    let andor = andor(Api {
        cooler_on,
        ..Api::stubbed()
    });
    let err = andor.cooler_on().unwrap_err();
    assert_eq!(err.as_call().unwrap().code_name, None);
    assert_eq!(err.to_string(), "Library function 'CoolerON' failed with 31337");
}

#[test]
fn test_temperature_reports_cooling_status() {
    unsafe extern "system" fn stabilized(t: *mut c_int) -> c_int {
        unsafe { *t = -60 };
        20036
    }
    unsafe extern "system" fn not_reached(t: *mut c_int) -> c_int {
        unsafe { *t = -12 };
        20037
    }

    let reading = andor(Api {
        get_temperature: stabilized,
        ..Api::stubbed()
    })
    .temperature()
    .unwrap();
    assert_eq!(reading.celsius, -60);
    assert!(reading.is_stabilized());

    let reading = andor(Api {
        get_temperature: not_reached,
        ..Api::stubbed()
    })
    .temperature()
    .unwrap();
    assert_eq!(reading.celsius, -12);
    assert_eq!(reading.status, Coded::Known(ExitCode::DRV_TEMPERATURE_NOT_REACHED));
    assert!(!reading.is_stabilized());
}

#[test]
fn test_temperature_off_is_an_error() {
    unsafe extern "system" fn cooler_off(t: *mut c_int) -> c_int {
        unsafe { *t = 20 };
        20034
    }

    let andor = andor(Api {
        get_temperature: cooler_off,
        ..Api::stubbed()
    });
    let err = andor.temperature().unwrap_err();
    assert_eq!(err.as_call().unwrap().code_name, Some("DRV_TEMPERATURE_OFF"));
}

#[test]
fn test_status_is_lenient() {
    unsafe extern "system" fn idle(s: *mut c_int) -> c_int {
        unsafe { *s = 20073 };
        DRV_SUCCESS
    }
    unsafe extern "system" fn undocumented(s: *mut c_int) -> c_int {
        unsafe { *s = 20500 };
        DRV_SUCCESS
    }

    let status = andor(Api {
        get_status: idle,
        ..Api::stubbed()
    })
    .status()
    .unwrap();
    assert_eq!(status, Coded::Known(ExitCode::DRV_IDLE));

    let status = andor(Api {
        get_status: undocumented,
        ..Api::stubbed()
    })
    .status()
    .unwrap();
    assert_eq!(status, Coded::Unknown(20500));
}

#[test]
fn test_initialize_then_close_shuts_down_before_unload() {
    let mut andor = andor(Api {
        initialize,
        shut_down,
        ..Api::stubbed()
    });
    andor.initialize(r"C:\Andor").unwrap();
    assert_eq!(andor.session_state(), SessionState::Active);

    let err = andor.initialize(r"C:\Andor").unwrap_err();
    assert!(matches!(err, NativeError::InvalidState { .. }));

    andor.close().unwrap();
    assert_eq!(events(), [r"Initialize(C:\Andor)", "ShutDown"]);
    assert_eq!(andor.session_state(), SessionState::Closed);
    assert!(!andor.binding().is_open());
    assert!(andor.cooler_on().unwrap_err().is_not_initialized());
}

#[test]
fn test_close_without_initialize_skips_shut_down() {
    let mut andor = andor(Api {
        shut_down,
        ..Api::stubbed()
    });
    andor.close().unwrap();
    assert!(events().is_empty());
    assert!(!andor.binding().is_open());
}

#[test]
fn test_failed_shut_down_still_unloads() {
    let mut andor = andor(Api {
        initialize,
        shut_down: shut_down_fails,
        ..Api::stubbed()
    });
    andor.initialize("").unwrap();

    let err = andor.close().unwrap_err();
    assert_eq!(err.as_call().unwrap().function.as_deref(), Some("ShutDown"));
    assert_eq!(andor.session_state(), SessionState::Faulted);
    assert!(!andor.binding().is_open());
}

#[test]
fn test_failed_initialize_leaves_session_closed() {
    unsafe extern "system" fn no_camera(_: *mut c_char) -> c_int {
        20990
    }

    let mut andor = andor(Api {
        initialize: no_camera,
        shut_down,
        ..Api::stubbed()
    });
    let err = andor.initialize("").unwrap_err();
    assert_eq!(err.as_call().unwrap().code_name, Some("DRV_ERROR_NOCAMERA"));
    assert_eq!(andor.session_state(), SessionState::Uninitialized);

    andor.close().unwrap();
    assert!(events().is_empty());
}

#[test]
fn test_directory_with_nul_is_rejected() {
    let mut andor = andor(Api {
        initialize,
        ..Api::stubbed()
    });
    let err = andor.initialize("C:\\\0").unwrap_err();
    assert!(err.as_call().unwrap().cause.is_some());
    assert!(events().is_empty());
}

#[test]
fn test_acquired_data_size() {
    unsafe extern "system" fn get_acquired_data(data: *mut c_long, size: c_ulong) -> c_int {
        for i in 0..size as usize {
            unsafe { *data.add(i) = (i as c_long) * 2 - 1 };
        }
        event(format!("size={size}"));
        DRV_SUCCESS
    }

    let andor = andor(Api {
        get_acquired_data,
        ..Api::stubbed()
    });
    assert_eq!(andor.acquired_data(4).unwrap(), [-1, 1, 3, 5]);
    assert_eq!(events(), ["size=4"]);
}

#[test]
fn test_shutter_arguments() {
    unsafe extern "system" fn set_shutter(kind: c_int, mode: c_int, closing: c_int, opening: c_int) -> c_int {
        event(format!("{kind} {mode} {closing} {opening}"));
        DRV_SUCCESS
    }

    let andor = andor(Api {
        set_shutter,
        ..Api::stubbed()
    });
    andor
        .set_shutter(Shutter {
            kind: ShutterType::High,
            mode: ShutterMode::OpenForFvb,
            closing_time: 27,
            opening_time: 30,
        })
        .unwrap();
    assert_eq!(events(), ["1 4 27 30"]);
}

#[test]
fn test_hardware_version_skips_reserved_words() {
    unsafe extern "system" fn get_hardware_version(
        pcb: *mut c_uint,
        decode: *mut c_uint,
        r1: *mut c_uint,
        r2: *mut c_uint,
        fw: *mut c_uint,
        build: *mut c_uint,
    ) -> c_int {
        unsafe {
            *pcb = 3;
            *decode = 5;
            *r1 = 99;
            *r2 = 99;
            *fw = 7;
            *build = 11;
        }
        DRV_SUCCESS
    }

    let andor = andor(Api {
        get_hardware_version,
        ..Api::stubbed()
    });
    assert_eq!(
        andor.hardware_version().unwrap(),
        HardwareVersion {
            pcb: 3,
            decode: 5,
            firmware_version: 7,
            firmware_build: 11,
        }
    );
}

static WAITS: AtomicUsize = AtomicUsize::new(0);

unsafe extern "system" fn wait_for_acquisition() -> c_int {
    WAITS.fetch_add(1, Ordering::SeqCst);
    DRV_SUCCESS
}

#[test]
fn test_wait_for_acquisition_under_watchdog() {
    let andor = andor(Api {
        wait_for_acquisition,
        ..Api::stubbed()
    })
    .with_watchdog(Watchdog::new(WatchdogConfig {
        timeout: Duration::from_secs(5),
        catch_panics: true,
    }));
    andor.wait_for_acquisition().unwrap();
    assert_eq!(WAITS.load(Ordering::SeqCst), 1);
}

#[test]
fn test_select_second_camera_before_initialize() {
    unsafe extern "system" fn get_available_cameras(total: *mut c_long) -> c_int {
        event("GetAvailableCameras");
        unsafe { *total = 2 };
        DRV_SUCCESS
    }

    unsafe extern "system" fn get_camera_handle(index: c_long, handle: *mut c_long) -> c_int {
        if index > 1 {
            return 20066; // DRV_P1INVALID
        }
        unsafe { *handle = 100 + index };
        DRV_SUCCESS
    }

    unsafe extern "system" fn set_current_camera(handle: c_long) -> c_int {
        event(format!("SetCurrentCamera({handle})"));
        DRV_SUCCESS
    }

    let mut andor = andor(Api {
        get_available_cameras,
        get_camera_handle,
        set_current_camera,
        initialize,
        ..Api::stubbed()
    });
    assert_eq!(andor.available_cameras().unwrap(), 2);
    let handle = andor.camera_handle(1).unwrap();
    assert_eq!(handle, CameraHandle(101));
    andor.set_current_camera(handle).unwrap();
    andor.initialize("ini").unwrap();
    assert_eq!(
        events(),
        ["GetAvailableCameras", "SetCurrentCamera(101)", "Initialize(ini)"]
    );

    let err = andor.camera_handle(2).unwrap_err();
    assert_eq!(err.as_call().unwrap().code_name, Some("DRV_P1INVALID"));
}

#[test]
fn test_filter_mode_uses_cosmic_ray_code() {
    unsafe extern "system" fn get_filter_mode(mode: *mut c_int) -> c_int {
        unsafe { *mode = 2 };
        DRV_SUCCESS
    }

    unsafe extern "system" fn set_filter_mode(mode: c_int) -> c_int {
        event(format!("SetFilterMode({mode})"));
        DRV_SUCCESS
    }

    let andor = andor(Api {
        get_filter_mode,
        set_filter_mode,
        ..Api::stubbed()
    });
    assert!(andor.filter_mode().unwrap());
    andor.set_filter_mode(true).unwrap();
    andor.set_filter_mode(false).unwrap();
    assert_eq!(events(), ["SetFilterMode(2)", "SetFilterMode(0)"]);
}

#[test]
fn test_shift_speed_tables() {
    unsafe extern "system" fn get_number_hs_speeds(channel: c_int, typ: c_int, speeds: *mut c_int) -> c_int {
        event(format!("GetNumberHSSpeeds({channel}, {typ})"));
        unsafe { *speeds = 3 };
        DRV_SUCCESS
    }

    unsafe extern "system" fn get_hs_speed(_: c_int, _: c_int, index: c_int, speed: *mut f32) -> c_int {
        unsafe { *speed = [3.0, 1.0, 0.05][index as usize] };
        DRV_SUCCESS
    }

    unsafe extern "system" fn set_hs_speed(typ: c_int, index: c_int) -> c_int {
        event(format!("SetHSSpeed({typ}, {index})"));
        DRV_SUCCESS
    }

    unsafe extern "system" fn get_number_vs_speeds(speeds: *mut c_int) -> c_int {
        unsafe { *speeds = 2 };
        DRV_SUCCESS
    }

    unsafe extern "system" fn get_vs_speed(index: c_int, speed: *mut f32) -> c_int {
        if index >= 2 {
            return 20066; // DRV_P1INVALID
        }
        unsafe { *speed = 8.25 * (index + 1) as f32 };
        DRV_SUCCESS
    }

    unsafe extern "system" fn set_vs_speed(index: c_int) -> c_int {
        event(format!("SetVSSpeed({index})"));
        DRV_SUCCESS
    }

    let andor = andor(Api {
        get_number_hs_speeds,
        get_hs_speed,
        set_hs_speed,
        get_number_vs_speeds,
        get_vs_speed,
        set_vs_speed,
        ..Api::stubbed()
    });
    assert_eq!(
        andor.hs_speeds(0, OutputAmplifier::Conventional).unwrap(),
        [3.0, 1.0, 0.05]
    );
    assert_eq!(andor.vs_speeds().unwrap(), [8.25, 16.5]);
    assert!(andor.vs_speed(2).is_err());

    andor.set_hs_speed(OutputAmplifier::Conventional, 2).unwrap();
    andor.set_vs_speed(1).unwrap();
    assert_eq!(
        events(),
        ["GetNumberHSSpeeds(0, 1)", "SetHSSpeed(1, 2)", "SetVSSpeed(1)"]
    );
}

#[test]
fn test_exit_code_name_lookup() {
    assert_eq!(exit_code_name(20072), Some("DRV_ACQUIRING"));
    assert_eq!(exit_code_name(0), None);
}

#[test]
fn test_symbols() {
    assert!(Api::SYMBOLS.contains(&"WaitForAcquisition"));
    assert!(Api::SYMBOLS.contains(&"GetHeadModel"));
    assert!(Api::SYMBOLS.contains(&"SetCurrentCamera"));
    assert!(Api::SYMBOLS.iter().all(|s| !s.is_empty()));
}

#[test]
fn test_temperature_reading_serializes_status_name() {
    let reading = TemperatureReading {
        celsius: -60,
        status: Coded::Known(ExitCode::DRV_TEMPERATURE_STABILIZED),
    };
    assert_eq!(
        serde_json::to_value(reading).unwrap(),
        serde_json::json!({ "celsius": -60, "status": "DRV_TEMPERATURE_STABILIZED" })
    );
}
