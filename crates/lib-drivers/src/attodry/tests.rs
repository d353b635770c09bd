use super::*;
use lib_native_ffi::NativeError;
use std::cell::RefCell;
use std::ffi::CStr;

thread_local! {
    static EVENTS: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

fn event(name: impl Into<String>) {
    EVENTS.with(|e| e.borrow_mut().push(name.into()));
}

fn events() -> Vec<String> {
    EVENTS.with(|e| e.borrow().clone())
}

unsafe extern "C" fn begin(device: u16) -> c_int {
    event(format!("begin({device})"));
    0
}

unsafe extern "C" fn end() -> c_int {
    event("end");
    0
}

unsafe extern "C" fn end_fails() -> c_int {
    event("end");
    -1
}

fn started(api: Api) -> AttoDry {
    let mut dry = AttoDry::from_api(
        Api {
            begin,
            end,
            ..api
        },
        DEFAULT_ENCODING,
    );
    dry.begin(DeviceType::AttoDry2100).unwrap();
    dry
}

#[test]
fn test_device_type_codes() {
    assert_eq!(DeviceType::AttoDry1100.code(), 0);
    assert_eq!(DeviceType::AttoDry2100.code(), 1);
    assert_eq!(DeviceType::AttoDry800.code(), 2);
    assert_eq!(DeviceType::default(), DeviceType::AttoDry2100);
    assert_eq!(DeviceType::AttoDry800.to_string(), "AttoDry800");
}

#[test]
fn test_begin_passes_device_type() {
    let mut dry = AttoDry::from_api(
        Api {
            begin,
            end,
            ..Api::stubbed()
        },
        DEFAULT_ENCODING,
    );
    dry.begin(DeviceType::AttoDry800).unwrap();
    assert_eq!(dry.session_state(), SessionState::Active);
    assert_eq!(events(), ["begin(2)"]);

    let err = dry.begin(DeviceType::AttoDry800).unwrap_err();
    assert!(matches!(err, NativeError::InvalidState { .. }));
    assert_eq!(events().len(), 1);
}

#[test]
fn test_close_ends_then_unloads() {
    let mut dry = started(Api::stubbed());
    dry.close().unwrap();
    assert_eq!(events(), ["begin(1)", "end"]);
    assert_eq!(dry.session_state(), SessionState::Closed);
    assert!(!dry.binding().is_open());
    assert!(dry.confirm().unwrap_err().is_not_initialized());
}

#[test]
fn test_close_unloads_when_end_fails() {
    let mut dry = AttoDry::from_api(
        Api {
            begin,
            end: end_fails,
            ..Api::stubbed()
        },
        DEFAULT_ENCODING,
    );
    dry.begin(DeviceType::AttoDry2100).unwrap();

    let err = dry.close().unwrap_err();
    let call = err.as_call().unwrap();
    assert_eq!(call.function.as_deref(), Some("AttoDRY_Interface_end"));
    assert_eq!(call.code, Some(StatusCode(-1)));
    assert_eq!(call.message, None);
    assert_eq!(dry.session_state(), SessionState::Faulted);
    assert!(!dry.binding().is_open());
}

#[test]
fn test_end_without_begin_is_skipped() {
    let mut dry = AttoDry::from_api(
        Api {
            end,
            ..Api::stubbed()
        },
        DEFAULT_ENCODING,
    );
    dry.end().unwrap();
    dry.close().unwrap();
    assert!(events().is_empty());
}

#[test]
fn test_connect_sends_port_name() {
    unsafe extern "C" fn connect(port: *const c_char) -> c_int {
        event(unsafe { CStr::from_ptr(port) }.to_string_lossy().into_owned());
        0
    }

    let dry = started(Api {
        connect,
        ..Api::stubbed()
    });
    dry.connect("COM3").unwrap();
    assert_eq!(events(), ["begin(1)", "COM3"]);
}

#[test]
fn test_flags_and_temperatures() {
    unsafe extern "C" fn initialised(flag: *mut c_int) -> c_int {
        unsafe { *flag = 1 };
        0
    }
    unsafe extern "C" fn not_connected(flag: *mut c_int) -> c_int {
        unsafe { *flag = 0 };
        0
    }
    unsafe extern "C" fn sample(k: *mut f32) -> c_int {
        unsafe { *k = 3.5 };
        0
    }

    let dry = started(Api {
        is_device_initialised: initialised,
        is_device_connected: not_connected,
        get_sample_temperature: sample,
        ..Api::stubbed()
    });
    assert!(dry.is_initialised().unwrap());
    assert!(!dry.is_connected().unwrap());
    assert_eq!(dry.sample_temperature().unwrap(), 3.5);
}

#[test]
fn test_failure_has_no_message() {
    unsafe extern "C" fn set_user_temperature(_: f32) -> c_int {
        5003
    }

    let dry = started(Api {
        set_user_temperature,
        ..Api::stubbed()
    });
    let err = dry.set_user_temperature(4.0).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Library function 'AttoDRY_Interface_setUserTemperature' failed with 5003"
    );
}

#[test]
fn test_messages_use_full_buffer() {
    unsafe extern "C" fn get_error_message(buf: *mut c_char, len: i32) -> c_int {
        event(format!("len={len}"));
        let text = b"Pressure too high\0";
        unsafe { std::ptr::copy_nonoverlapping(text.as_ptr(), buf.cast::<u8>(), text.len()) };
        0
    }
    unsafe extern "C" fn get_error_status(status: *mut i8) -> c_int {
        unsafe { *status = -3 };
        0
    }

    let dry = started(Api {
        get_error_message,
        get_error_status,
        ..Api::stubbed()
    });
    assert_eq!(dry.error_message().unwrap(), "Pressure too high");
    assert_eq!(dry.error_status().unwrap(), -3);
    assert_eq!(events(), ["begin(1)", "len=500"]);
}

#[test]
fn test_symbols() {
    assert_eq!(Api::SYMBOLS.len(), 17);
    assert!(Api::SYMBOLS.iter().all(|s| s.starts_with("AttoDRY_Interface_")));
}

#[test]
fn test_device_type_serde() {
    assert_eq!(serde_json::to_string(&DeviceType::AttoDry800).unwrap(), "\"AttoDry800\"");
    let device: DeviceType = serde_json::from_str("\"AttoDry1100\"").unwrap();
    assert_eq!(device, DeviceType::AttoDry1100);
}
