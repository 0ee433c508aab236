use crate::{CaptureConfiguration, Error, Result};
use crate::sys::{Driver, RxHandler};
use crate::sys::imp::HackrfDriverImpl;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Idle,
    Streaming,
    Stopped,
}

#[derive(Debug)]
pub struct Device<D: Driver> {
    driver: D,
    state: StreamState,
}

impl Device<HackrfDriverImpl> {
    /// Opens the first device found.
    pub fn new() -> Result<Device<HackrfDriverImpl>> {
        Self::open(None)
    }

    pub fn open(serial_number: Option<&str>) -> Result<Device<HackrfDriverImpl>> {
        let driver = HackrfDriverImpl::open(serial_number)?;
        let mut device = Device::from_driver(driver);
        match (device.board_name(), device.firmware_version()) {
            (Ok(board), Ok(version)) =>
                log::info!("found {} (firmware {})", board, version),
            (Err(error), _) | (_, Err(error)) =>
                log::warn!("cannot identify device: {}", error),
        }
        Ok(device)
    }

    /// Opens a device, runs `f`, then stops any stream `f` left running and closes the device.
    pub fn with<F, R>(serial_number: Option<&str>, f: F) -> Result<R>
            where F: FnOnce(&mut Device<HackrfDriverImpl>) -> Result<R> {
        Self::open(serial_number)?.scoped(f)
    }
}

impl<D: Driver> Device<D> {
    pub fn from_driver(driver: D) -> Device<D> {
        Device { driver, state: StreamState::Idle }
    }

    /// Runs `f`, then stops any stream `f` left running and drops the device. An error from `f`
    /// takes precedence over one from stopping.
    pub fn scoped<F, R>(mut self, f: F) -> Result<R>
            where F: FnOnce(&mut Device<D>) -> Result<R> {
        let result = f(&mut self);
        let stopped = self.stop_rx();
        let value = result?;
        stopped?;
        Ok(value)
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn board_name(&mut self) -> Result<String> {
        self.driver.board_name()
    }

    pub fn firmware_version(&mut self) -> Result<String> {
        self.driver.firmware_version()
    }

    pub fn configure(&mut self, config: &CaptureConfiguration) -> Result<()> {
        if self.state != StreamState::Idle {
            return Err(Error::InvalidState("cannot configure after streaming has started"))
        }
        config.validate()?;
        log::debug!("configure({:?})", config);
        self.driver.set_freq(config.frequency_hz)?;
        self.driver.set_sample_rate(config.sample_rate_hz as f64)?;
        Ok(())
    }

    pub fn start_rx(&mut self, handler: RxHandler) -> Result<()> {
        match self.state {
            StreamState::Idle => (),
            StreamState::Streaming =>
                return Err(Error::InvalidState("stream already running")),
            StreamState::Stopped =>
                return Err(Error::InvalidState("stream already stopped")),
        }
        self.driver.start_rx(handler)?;
        self.state = StreamState::Streaming;
        log::info!("streaming started");
        Ok(())
    }

    pub fn stop_rx(&mut self) -> Result<()> {
        if self.state != StreamState::Streaming {
            return Ok(())
        }
        // not retried on failure; closing the device ends the stream regardless
        self.state = StreamState::Stopped;
        self.driver.stop_rx()?;
        log::info!("streaming stopped");
        Ok(())
    }

    pub fn is_streaming(&self) -> bool {
        self.state == StreamState::Streaming && self.driver.is_streaming()
    }
}

impl<D: Driver> Drop for Device<D> {
    fn drop(&mut self) {
        if let Err(error) = self.stop_rx() {
            log::error!("{}", error);
        }
    }
}
