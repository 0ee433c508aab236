use std::ffi::{CStr, CString};
use std::ops::ControlFlow;
use std::os::raw::{c_char, c_int, c_void};
use std::{ptr, slice};

use crate::{Error, Result};
use super::{Driver, RxHandler};

const HACKRF_SUCCESS: c_int = 0;
const HACKRF_TRUE: c_int = 1;
const HACKRF_ERROR_NOT_FOUND: c_int = -5;
const HACKRF_ERROR_NOT_LAST_DEVICE: c_int = -2000;

const VERSION_STRING_LEN: usize = 255;

#[repr(C)]
struct HackrfDevice {
    _private: [u8; 0],
}

#[allow(dead_code)]
#[repr(C)]
struct HackrfDeviceList {
    serial_numbers: *mut *mut c_char,
    usb_board_ids: *mut c_int,
    usb_device_index: *mut c_int,
    devicecount: c_int,
    usb_devices: *mut *mut c_void,
    usb_devicecount: c_int,
}

#[allow(dead_code)]
#[repr(C)]
struct HackrfTransfer {
    device: *mut HackrfDevice,
    buffer: *mut u8,
    buffer_length: c_int,
    valid_length: c_int,
    rx_ctx: *mut c_void,
    tx_ctx: *mut c_void,
}

extern "C" {
    fn hackrf_init() -> c_int;
    fn hackrf_exit() -> c_int;
    fn hackrf_error_name(errcode: c_int) -> *const c_char;

    fn hackrf_device_list() -> *mut HackrfDeviceList;
    fn hackrf_device_list_free(list: *mut HackrfDeviceList);

    fn hackrf_open_by_serial(
        desired_serial_number: *const c_char,
        device: *mut *mut HackrfDevice,
    ) -> c_int;
    fn hackrf_close(device: *mut HackrfDevice) -> c_int;

    fn hackrf_board_id_read(device: *mut HackrfDevice, value: *mut u8) -> c_int;
    fn hackrf_board_id_name(board_id: c_int) -> *const c_char;
    fn hackrf_version_string_read(device: *mut HackrfDevice, version: *mut c_char, length: u8) -> c_int;

    fn hackrf_set_freq(device: *mut HackrfDevice, freq_hz: u64) -> c_int;
    fn hackrf_set_sample_rate(device: *mut HackrfDevice, freq_hz: f64) -> c_int;

    fn hackrf_start_rx(
        device: *mut HackrfDevice,
        callback: unsafe extern "C" fn(*mut HackrfTransfer) -> c_int,
        rx_ctx: *mut c_void,
    ) -> c_int;
    fn hackrf_stop_rx(device: *mut HackrfDevice) -> c_int;
    fn hackrf_is_streaming(device: *mut HackrfDevice) -> c_int;
}

fn error_name(code: c_int) -> String {
    unsafe {
        let name = hackrf_error_name(code);
        if name.is_null() {
            "HACKRF_ERROR_UNKNOWN".to_owned()
        } else {
            CStr::from_ptr(name).to_string_lossy().into_owned()
        }
    }
}

fn check(call: &'static str, code: c_int) -> Result<()> {
    if code == HACKRF_SUCCESS {
        log::trace!("{}() = HACKRF_SUCCESS", call);
        Ok(())
    } else {
        Err(Error::Hackrf { call, code, name: error_name(code) })
    }
}

// `hackrf_exit` refuses with HACKRF_ERROR_NOT_LAST_DEVICE while another device is open, and
// the library stays initialized for it.
#[derive(Debug)]
struct Library;

fn check_exit(code: c_int) -> Result<()> {
    if code == HACKRF_ERROR_NOT_LAST_DEVICE {
        log::debug!("hackrf_exit() deferred, devices still open");
        Ok(())
    } else {
        check("hackrf_exit", code)
    }
}

impl Library {
    fn init() -> Result<Library> {
        check("hackrf_init", unsafe { hackrf_init() })?;
        Ok(Library)
    }
}

impl Drop for Library {
    fn drop(&mut self) {
        if let Err(error) = check_exit(unsafe { hackrf_exit() }) {
            log::error!("{}", error);
        }
    }
}

pub fn list_devices() -> Result<Vec<String>> {
    let _library = Library::init()?;
    unsafe {
        let list = hackrf_device_list();
        if list.is_null() {
            return Err(Error::Other("hackrf_device_list() returned null".into()))
        }

        let count = (*list).devicecount.max(0) as usize;
        let mut serials = Vec::with_capacity(count);
        for index in 0..count {
            let serial = *(*list).serial_numbers.add(index);
            if serial.is_null() {
                continue
            }
            serials.push(CStr::from_ptr(serial).to_string_lossy().into_owned());
        }

        hackrf_device_list_free(list);
        log::debug!("list_devices() = {:?}", serials);
        Ok(serials)
    }
}

unsafe extern "C" fn rx_callback(transfer: *mut HackrfTransfer) -> c_int {
    let transfer = &*transfer;
    // SAFETY: `rx_ctx` is the `RxHandler` boxed in `start_rx`; it outlives the stream.
    let handler = &mut *(transfer.rx_ctx as *mut RxHandler);
    let length = usize::try_from(transfer.valid_length).unwrap_or(0);
    let data = if length == 0 || transfer.buffer.is_null() {
        &[][..]
    } else {
        slice::from_raw_parts(transfer.buffer, length)
    };
    match handler(data) {
        ControlFlow::Continue(()) => 0,
        ControlFlow::Break(()) => -1,
    }
}

#[derive(Debug)]
pub struct HackrfDriverImpl {
    device: *mut HackrfDevice,
    rx_ctx: *mut RxHandler,
    // dropped last, after the device is closed
    _library: Library,
}

// SAFETY: libhackrf device handles may be used from any thread as long as calls are not
// concurrent, which `&mut self` guarantees.
unsafe impl Send for HackrfDriverImpl {}

impl HackrfDriverImpl {
    pub fn open(serial_number: Option<&str>) -> Result<HackrfDriverImpl> {
        let serial_number = serial_number
            .map(CString::new)
            .transpose()
            .map_err(|error| Error::Other(error.into()))?;

        let library = Library::init()?;
        let mut device: *mut HackrfDevice = ptr::null_mut();
        let code = unsafe {
            hackrf_open_by_serial(
                serial_number.as_ref().map_or(ptr::null(), |serial| serial.as_ptr()),
                &mut device,
            )
        };
        if code == HACKRF_ERROR_NOT_FOUND {
            return Err(Error::NotFound)
        }
        check("hackrf_open_by_serial", code)?;
        log::debug!("opened device {:?} (serial={:?})", device, serial_number);

        Ok(HackrfDriverImpl { device, rx_ctx: ptr::null_mut(), _library: library })
    }

    fn free_rx_ctx(&mut self) {
        if !self.rx_ctx.is_null() {
            // SAFETY: allocated in `start_rx`; no callback can run once the stream is stopped.
            drop(unsafe { Box::from_raw(self.rx_ctx) });
            self.rx_ctx = ptr::null_mut();
        }
    }
}

impl Driver for HackrfDriverImpl {
    fn set_freq(&mut self, freq_hz: u64) -> Result<()> {
        log::debug!("set_freq({})", freq_hz);
        check("hackrf_set_freq", unsafe { hackrf_set_freq(self.device, freq_hz) })
    }

    fn set_sample_rate(&mut self, rate_hz: f64) -> Result<()> {
        log::debug!("set_sample_rate({})", rate_hz);
        check("hackrf_set_sample_rate", unsafe { hackrf_set_sample_rate(self.device, rate_hz) })
    }

    fn start_rx(&mut self, handler: RxHandler) -> Result<()> {
        if !self.rx_ctx.is_null() {
            return Err(Error::InvalidState("receive callback already registered"))
        }
        let rx_ctx = Box::into_raw(Box::new(handler));
        let code = unsafe { hackrf_start_rx(self.device, rx_callback, rx_ctx as *mut c_void) };
        if let Err(error) = check("hackrf_start_rx", code) {
            drop(unsafe { Box::from_raw(rx_ctx) });
            return Err(error)
        }
        self.rx_ctx = rx_ctx;
        log::debug!("start_rx()");
        Ok(())
    }

    fn stop_rx(&mut self) -> Result<()> {
        log::debug!("stop_rx()");
        check("hackrf_stop_rx", unsafe { hackrf_stop_rx(self.device) })?;
        self.free_rx_ctx();
        Ok(())
    }

    fn is_streaming(&self) -> bool {
        unsafe { hackrf_is_streaming(self.device) == HACKRF_TRUE }
    }

    fn board_name(&mut self) -> Result<String> {
        let mut board_id = 0u8;
        check("hackrf_board_id_read", unsafe { hackrf_board_id_read(self.device, &mut board_id) })?;
        let name = unsafe { hackrf_board_id_name(board_id as c_int) };
        if name.is_null() {
            Ok(format!("board {:#04x}", board_id))
        } else {
            Ok(unsafe { CStr::from_ptr(name) }.to_string_lossy().into_owned())
        }
    }

    fn firmware_version(&mut self) -> Result<String> {
        let mut version = [0u8; VERSION_STRING_LEN + 1];
        check("hackrf_version_string_read", unsafe {
            hackrf_version_string_read(self.device, version.as_mut_ptr() as *mut c_char,
                                       VERSION_STRING_LEN as u8)
        })?;
        let version = CStr::from_bytes_until_nul(&version[..])
            .map_err(|error| Error::Other(error.into()))?;
        Ok(version.to_string_lossy().into_owned())
    }
}

impl Drop for HackrfDriverImpl {
    fn drop(&mut self) {
        // `hackrf_close` stops a running stream itself
        if let Err(error) = check("hackrf_close", unsafe { hackrf_close(self.device) }) {
            log::error!("{}", error);
        }
        self.free_rx_ctx();
        log::debug!("closed device {:?}", self.device);
    }
}
