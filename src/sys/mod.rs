use std::ops::ControlFlow;

use crate::Result;

/// Called on the driver's transfer thread with the valid bytes of each transfer.
pub type RxHandler = Box<dyn FnMut(&[u8]) -> ControlFlow<()> + Send>;

pub trait Driver {
    fn set_freq(&mut self, freq_hz: u64) -> Result<()>;
    fn set_sample_rate(&mut self, rate_hz: f64) -> Result<()>;

    fn start_rx(&mut self, handler: RxHandler) -> Result<()>;
    fn stop_rx(&mut self) -> Result<()>;
    fn is_streaming(&self) -> bool;

    fn board_name(&mut self) -> Result<String>;
    fn firmware_version(&mut self) -> Result<String>;
}

#[cfg(feature = "hardware")]
#[path = "hackrf.rs"]
pub mod imp;

#[cfg(not(feature = "hardware"))]
#[path = "stub.rs"]
pub mod imp;

pub use imp::list_devices;

#[cfg(test)]
pub mod mock;
