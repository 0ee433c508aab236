use crate::{Error, Result};
use super::{Driver, RxHandler};

#[derive(Debug)]
pub struct HackrfDriverImpl(());

impl HackrfDriverImpl {
    pub fn open(_serial_number: Option<&str>) -> Result<HackrfDriverImpl> {
        Err(Error::Unsupported)
    }
}

pub fn list_devices() -> Result<Vec<String>> {
    Err(Error::Unsupported)
}

impl Driver for HackrfDriverImpl {
    fn set_freq(&mut self, _freq_hz: u64) -> Result<()> {
        Err(Error::Unsupported)
    }

    fn set_sample_rate(&mut self, _rate_hz: f64) -> Result<()> {
        Err(Error::Unsupported)
    }

    fn start_rx(&mut self, _handler: RxHandler) -> Result<()> {
        Err(Error::Unsupported)
    }

    fn stop_rx(&mut self) -> Result<()> {
        Err(Error::Unsupported)
    }

    fn is_streaming(&self) -> bool {
        false
    }

    fn board_name(&mut self) -> Result<String> {
        Err(Error::Unsupported)
    }

    fn firmware_version(&mut self) -> Result<String> {
        Err(Error::Unsupported)
    }
}
