mod sys;
mod config;
mod device;
mod capture;
pub mod signal;

use std::io;

#[derive(Debug)]
pub enum Error {
    NotFound,
    Unsupported,
    Hackrf {
        call: &'static str,
        code: i32,
        name: String,
    },
    InvalidState(&'static str),
    Io(io::Error),
    Other(Box<dyn std::error::Error + Sync + Send + 'static>),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::NotFound =>
                write!(f, "device not connected"),
            Self::Unsupported =>
                write!(f, "built without hardware support"),
            Self::Hackrf { call, code, name } =>
                write!(f, "{}() failed: {} ({})", call, name, code),
            Self::InvalidState(reason) =>
                write!(f, "invalid device state: {}", reason),
            Self::Io(io_error) =>
                write!(f, "I/O error: {}", io_error),
            Self::Other(error) =>
                write!(f, "{}", error),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            &Self::Io(ref io_error) => Some(io_error),
            &Self::Other(ref error) => Some(error.as_ref()),
            _ => None
        }
    }
}

impl From<Error> for io::Error {
    fn from(error: Error) -> Self {
        match error {
            Error::NotFound =>
                Self::new(io::ErrorKind::NotFound, error),
            Error::Unsupported =>
                Self::new(io::ErrorKind::Unsupported, error),
            Error::Io(io_error) =>
                io_error,
            error =>
                Self::new(io::ErrorKind::Other, error),
        }
    }
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        match error.downcast::<Self>() {
            Ok(error) => error,
            Err(error) => Error::Io(error),
        }
    }
}

pub type Result<T> =
    core::result::Result<T, Error>;

pub use sys::{Driver, RxHandler, list_devices};

pub use config::{
    FREQUENCY_HZ,
    SAMPLE_RATE_HZ,
    OUTPUT_FILE,
    CaptureConfiguration,
};

pub use device::StreamState;

pub type Device =
    device::Device<crate::sys::imp::HackrfDriverImpl>;

pub use capture::{
    StopFlag,
    Capture,
    CaptureSummary,
    record,
};
