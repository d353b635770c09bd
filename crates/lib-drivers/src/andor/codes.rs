//! Andor SDK exit codes and mode selectors.

use lib_types::{code_enum, StatusCode};

code_enum! {
    /// Exit codes returned by every SDK function, also used as the
    /// acquisition status reported by `GetStatus`.
    #[allow(non_camel_case_types)]
    pub enum ExitCode {
        DRV_ERROR_CODES = 20001,
        DRV_SUCCESS = 20002,
        DRV_VXDNOTINSTALLED = 20003,
        DRV_ERROR_SCAN = 20004,
        DRV_ERROR_CHECK_SUM = 20005,
        DRV_ERROR_FILELOAD = 20006,
        DRV_UNKNOWN_FUNCTION = 20007,
        DRV_ERROR_VXD_INIT = 20008,
        DRV_ERROR_ADDRESS = 20009,
        DRV_ERROR_PAGELOCK = 20010,
        DRV_ERROR_PAGEUNLOCK = 20011,
        DRV_ERROR_BOARDTEST = 20012,
        DRV_ERROR_ACK = 20013,
        DRV_ERROR_UP_FIFO = 20014,
        DRV_ERROR_PATTERN = 20015,
        DRV_ACQUISITION_ERRORS = 20017,
        DRV_ACQ_BUFFER = 20018,
        DRV_ACQ_DOWNFIFO_FULL = 20019,
        DRV_PROC_UNKONWN_INSTRUCTION = 20020,
        DRV_ILLEGAL_OP_CODE = 20021,
        DRV_KINETIC_TIME_NOT_MET = 20022,
        DRV_ACCUM_TIME_NOT_MET = 20023,
        DRV_NO_NEW_DATA = 20024,
        DRV_PCI_DMA_FAIL = 20025,
        DRV_SPOOLERROR = 20026,
        DRV_SPOOLSETUPERROR = 20027,
        DRV_FILESIZELIMITERROR = 20028,
        DRV_ERROR_FILESAVE = 20029,
        DRV_TEMPERATURE_CODES = 20033,
        DRV_TEMPERATURE_OFF = 20034,
        DRV_TEMPERATURE_NOT_STABILIZED = 20035,
        DRV_TEMPERATURE_STABILIZED = 20036,
        DRV_TEMPERATURE_NOT_REACHED = 20037,
        DRV_TEMPERATURE_OUT_RANGE = 20038,
        DRV_TEMPERATURE_NOT_SUPPORTED = 20039,
        DRV_TEMPERATURE_DRIFT = 20040,
        DRV_GENERAL_ERRORS = 20049,
        DRV_INVALID_AUX = 20050,
        DRV_COF_NOTLOADED = 20051,
        DRV_FPGAPROG = 20052,
        DRV_FLEXERROR = 20053,
        DRV_GPIBERROR = 20054,
        DRV_EEPROMVERSIONERROR = 20055,
        DRV_DATATYPE = 20064,
        DRV_DRIVER_ERRORS = 20065,
        DRV_P1INVALID = 20066,
        DRV_P2INVALID = 20067,
        DRV_P3INVALID = 20068,
        DRV_P4INVALID = 20069,
        DRV_INIERROR = 20070,
        DRV_COFERROR = 20071,
        DRV_ACQUIRING = 20072,
        DRV_IDLE = 20073,
        DRV_TEMPCYCLE = 20074,
        DRV_NOT_INITIALIZED = 20075,
        DRV_P5INVALID = 20076,
        DRV_P6INVALID = 20077,
        DRV_INVALID_MODE = 20078,
        DRV_INVALID_FILTER = 20079,
        DRV_I2CERRORS = 20080,
        DRV_I2CDEVNOTFOUND = 20081,
        DRV_I2CTIMEOUT = 20082,
        DRV_P7INVALID = 20083,
        DRV_P8INVALID = 20084,
        DRV_P9INVALID = 20085,
        DRV_P10INVALID = 20086,
        DRV_P11INVALID = 20087,
        DRV_USBERROR = 20089,
        DRV_IOCERROR = 20090,
        DRV_VRMVERSIONERROR = 20091,
        DRV_GATESTEPERROR = 20092,
        DRV_USB_INTERRUPT_ENDPOINT_ERROR = 20093,
        DRV_RANDOM_TRACK_ERROR = 20094,
        DRV_INVALID_TRIGGER_MODE = 20095,
        DRV_LOAD_FIRMWARE_ERROR = 20096,
        DRV_DIVIDE_BY_ZERO_ERROR = 20097,
        DRV_INVALID_RINGEXPOSURES = 20098,
        DRV_BINNING_ERROR = 20099,
        DRV_INVALID_AMPLIFIER = 20100,
        DRV_INVALID_COUNTCONVERT_MODE = 20101,
        DRV_ERROR_NOCAMERA = 20990,
        DRV_NOT_SUPPORTED = 20991,
        DRV_NOT_AVAILABLE = 20992,
        DRV_ERROR_MAP = 20115,
        DRV_ERROR_UNMAP = 20116,
        DRV_ERROR_MDL = 20117,
        DRV_ERROR_UNMDL = 20118,
        DRV_ERROR_BUFFSIZE = 20119,
        DRV_ERROR_NOHANDLE = 20121,
        DRV_GATING_NOT_AVAILABLE = 20130,
        DRV_FPGA_VOLTAGE_ERROR = 20131,
        DRV_OW_CMD_FAIL = 20150,
        DRV_OWMEMORY_BAD_ADDR = 20151,
        DRV_OWCMD_NOT_AVAILABLE = 20152,
        DRV_OW_NO_SLAVES = 20153,
        DRV_OW_NOT_INITIALIZED = 20154,
        DRV_OW_ERROR_SLAVE_NUM = 20155,
        DRV_MSTIMINGS_ERROR = 20156,
        DRV_OA_NULL_ERROR = 20173,
        DRV_OA_PARSE_DTD_ERROR = 20174,
        DRV_OA_DTD_VALIDATE_ERROR = 20175,
        DRV_OA_FILE_ACCESS_ERROR = 20176,
        DRV_OA_FILE_DOES_NOT_EXIST = 20177,
        DRV_OA_XML_INVALID_OR_NOT_FOUND_ERROR = 20178,
        DRV_OA_PRESET_FILE_NOT_LOADED = 20179,
        DRV_OA_USER_FILE_NOT_LOADED = 20180,
        DRV_OA_PRESET_AND_USER_FILE_NOT_LOADED = 20181,
        DRV_OA_INVALID_FILE = 20182,
        DRV_OA_FILE_HAS_BEEN_MODIFIED = 20183,
        DRV_OA_BUFFER_FULL = 20184,
        DRV_OA_INVALID_STRING_LENGTH = 20185,
        DRV_OA_INVALID_CHARS_IN_NAME = 20186,
        DRV_OA_INVALID_NAMING = 20187,
        DRV_OA_GET_CAMERA_ERROR = 20188,
        DRV_OA_MODE_ALREADY_EXISTS = 20189,
        DRV_OA_STRINGS_NOT_EQUAL = 20190,
        DRV_OA_NO_USER_DATA = 20191,
        DRV_OA_VALUE_NOT_SUPPORTED = 20192,
        DRV_OA_MODE_DOES_NOT_EXIST = 20193,
        DRV_OA_CAMERA_NOT_SUPPORTED = 20194,
        DRV_OA_FAILED_TO_GET_MODE = 20195,
        DRV_PROCESSING_FAILED = 20211,
    }
}

code_enum! {
    pub enum AcquisitionMode {
        SingleScan = 1,
        Accumulate = 2,
        Kinetics = 3,
        FastKinetics = 4,
        RunUntilAbort = 5,
    }
}

code_enum! {
    pub enum ReadMode {
        FullVerticalBinning = 0,
        MultiTrack = 1,
        RandomTrack = 2,
        SingleTrack = 3,
        Image = 4,
    }
}

code_enum! {
    /// TTL level that opens the shutter.
    pub enum ShutterType {
        Low = 0,
        High = 1,
    }
}

code_enum! {
    pub enum ShutterMode {
        FullyAuto = 0,
        PermanentlyOpen = 1,
        PermanentlyClosed = 2,
        OpenForFvb = 4,
        OpenForAny = 5,
    }
}

code_enum! {
    pub enum TriggerMode {
        Internal = 0,
        External = 1,
        ExternalStart = 6,
        /// Bulb mode.
        ExternalExposure = 7,
        /// EM Newton models in full vertical binning only.
        ExternalFvbEm = 9,
        SoftwareTrigger = 10,
        ExternalChargeShift = 12,
    }
}

code_enum! {
    /// Output amplifier a horizontal shift speed applies to.
    pub enum OutputAmplifier {
        ElectronMultiplying = 0,
        Conventional = 1,
    }
}

/// Temperature statuses reported by `GetTemperature` that still carry a
/// valid reading.
pub const TEMPERATURE_READING_STATUSES: [StatusCode; 3] = [
    StatusCode(20035), // DRV_TEMPERATURE_NOT_STABILIZED
    StatusCode(20036), // DRV_TEMPERATURE_STABILIZED
    StatusCode(20037), // DRV_TEMPERATURE_NOT_REACHED
];

#[cfg(test)]
mod tests {
    use super::*;
    use lib_types::{decode_enum, CodeEnum, Coded};

    #[test]
    fn test_exit_code_names() {
        assert_eq!(ExitCode::from_code(20002), Some(ExitCode::DRV_SUCCESS));
        assert_eq!(ExitCode::DRV_NOT_INITIALIZED.name(), "DRV_NOT_INITIALIZED");
        assert_eq!(ExitCode::DRV_ERROR_NOCAMERA.code(), 20990);
        assert_eq!(ExitCode::from_code(20016), None);
    }

    #[test]
    fn test_reading_statuses_are_temperature_codes() {
        let names: Vec<_> = TEMPERATURE_READING_STATUSES
            .iter()
            .map(|code| ExitCode::from_code(code.get()).map(CodeEnum::name))
            .collect();
        assert_eq!(
            names,
            [
                Some("DRV_TEMPERATURE_NOT_STABILIZED"),
                Some("DRV_TEMPERATURE_STABILIZED"),
                Some("DRV_TEMPERATURE_NOT_REACHED"),
            ]
        );
    }

    #[test]
    fn test_mode_codes_have_gaps() {
        assert_eq!(decode_enum::<TriggerMode>(7), Coded::Known(TriggerMode::ExternalExposure));
        assert_eq!(decode_enum::<TriggerMode>(8), Coded::Unknown(8));
        assert_eq!(ShutterMode::OpenForAny.code(), 5);
        assert_eq!(decode_enum::<ShutterMode>(3), Coded::Unknown(3));
        assert_eq!(OutputAmplifier::Conventional.code(), 1);
    }
}
