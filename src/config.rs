//! Fixed capture parameters.

use std::path::PathBuf;
use std::time::Duration;

use crate::{Error, Result};

pub const FREQUENCY_HZ: u64 = 85_500_000;
pub const SAMPLE_RATE_HZ: u32 = 256_000;
pub const OUTPUT_FILE: &str = "output_samples.raw";

const FREQUENCY_MAX_HZ: u64 = 7_250_000_000;
const SAMPLE_RATE_MAX_HZ: u32 = 20_000_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureConfiguration {
    pub frequency_hz: u64,
    pub sample_rate_hz: u32,
    pub output_path: PathBuf,
    /// `None` opens the first device found.
    pub serial_number: Option<String>,
    /// How often the capture loop checks the stop flag and the stream state.
    pub poll_interval: Duration,
}

impl Default for CaptureConfiguration {
    fn default() -> Self {
        CaptureConfiguration {
            frequency_hz: FREQUENCY_HZ,
            sample_rate_hz: SAMPLE_RATE_HZ,
            output_path: PathBuf::from(OUTPUT_FILE),
            serial_number: None,
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl CaptureConfiguration {
    pub fn validate(&self) -> Result<()> {
        if self.frequency_hz > FREQUENCY_MAX_HZ {
            return Err(Error::Other(format!(
                "frequency {} Hz above {} Hz", self.frequency_hz, FREQUENCY_MAX_HZ).into()))
        }
        if self.sample_rate_hz == 0 || self.sample_rate_hz > SAMPLE_RATE_MAX_HZ {
            return Err(Error::Other(format!(
                "sample rate {} Hz outside 1..={} Hz", self.sample_rate_hz, SAMPLE_RATE_MAX_HZ).into()))
        }
        Ok(())
    }
}
