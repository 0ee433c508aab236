use std::io::{self, Write};
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::sleep;

use crate::{CaptureConfiguration, Result};
use crate::device::Device;
use crate::sys::{Driver, RxHandler};

/// Exit flag shared between signal handlers, the capture loop and the transfer callback.
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> StopFlag {
        Default::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst)
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CaptureSummary {
    /// Transfers written to the output.
    pub transfers: u64,
    pub bytes: u64,
    /// Transfers that arrived after the stop flag was raised.
    pub discarded: u64,
}

#[derive(Debug)]
struct Sink<W> {
    writer: W,
    summary: CaptureSummary,
    error: Option<io::Error>,
}

fn lock<W>(sink: &Mutex<Sink<W>>) -> MutexGuard<'_, Sink<W>> {
    sink.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Writes every transfer delivered by the driver to `W`, byte for byte.
#[derive(Debug)]
pub struct Capture<W> {
    sink: Arc<Mutex<Sink<W>>>,
    stop: StopFlag,
}

impl<W: Write + Send + 'static> Capture<W> {
    pub fn new(writer: W, stop: StopFlag) -> Capture<W> {
        let sink = Sink { writer, summary: Default::default(), error: None };
        Capture { sink: Arc::new(Mutex::new(sink)), stop }
    }

    pub fn handler(&self) -> RxHandler {
        let sink = self.sink.clone();
        let stop = self.stop.clone();
        Box::new(move |data: &[u8]| {
            let mut sink = lock(&sink);
            if stop.is_raised() {
                sink.summary.discarded += 1;
                return ControlFlow::Continue(())
            }
            match sink.writer.write_all(data) {
                Ok(()) => {
                    sink.summary.transfers += 1;
                    sink.summary.bytes += data.len() as u64;
                    log::trace!("wrote transfer of {} bytes", data.len());
                    ControlFlow::Continue(())
                }
                Err(error) => {
                    log::error!("cannot write samples: {}", error);
                    sink.error.get_or_insert(error);
                    stop.raise();
                    ControlFlow::Break(())
                }
            }
        })
    }

    pub fn summary(&self) -> CaptureSummary {
        lock(&self.sink).summary
    }

    /// Flushes the output. Call only after the stream is stopped.
    pub fn finish(self) -> Result<CaptureSummary> {
        let mut sink = lock(&self.sink);
        if let Some(error) = sink.error.take() {
            return Err(error.into())
        }
        sink.writer.flush()?;
        Ok(sink.summary)
    }
}

/// Configures `device`, streams into `writer` until `stop` is raised or the device stops
/// streaming on its own, then stops the stream and flushes the output.
pub fn record<D, W>(device: &mut Device<D>, config: &CaptureConfiguration, writer: W, stop: &StopFlag)
        -> Result<CaptureSummary>
        where D: Driver, W: Write + Send + 'static {
    device.configure(config)?;

    let capture = Capture::new(writer, stop.clone());
    device.start_rx(capture.handler())?;
    log::info!("capturing at {} Hz, {} samples/s", config.frequency_hz, config.sample_rate_hz);

    while device.is_streaming() && !stop.is_raised() {
        sleep(config.poll_interval);
    }
    if !stop.is_raised() {
        log::warn!("device stopped streaming");
    }

    if let Err(error) = device.stop_rx() {
        log::error!("{}", error);
    }

    let summary = capture.finish()?;
    log::info!("wrote {} bytes in {} transfers", summary.bytes, summary.transfers);
    if summary.discarded > 0 {
        log::debug!("discarded {} transfers after stop", summary.discarded);
    }
    Ok(summary)
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use super::*;
    use crate::Error;
    use crate::sys::mock::MockDriver;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, data: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(data);
            Ok(data.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct FailingWriter {
        writes_left: usize,
        fail_flush: bool,
    }

    impl Write for FailingWriter {
        fn write(&mut self, data: &[u8]) -> io::Result<usize> {
            if self.writes_left == 0 {
                return Err(io::Error::new(io::ErrorKind::WriteZero, "no space left"))
            }
            self.writes_left -= 1;
            Ok(data.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            if self.fail_flush {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "flush failed"))
            } else {
                Ok(())
            }
        }
    }

    fn config() -> CaptureConfiguration {
        CaptureConfiguration { poll_interval: Duration::from_millis(1), ..Default::default() }
    }

    #[test]
    fn test_stop_flag_shared() {
        let flag = StopFlag::new();
        let other = flag.clone();
        assert!(!other.is_raised());
        flag.raise();
        assert!(other.is_raised());
    }

    #[test]
    fn test_handler_discards_after_stop() {
        let output = SharedBuf::default();
        let stop = StopFlag::new();
        let capture = Capture::new(output.clone(), stop.clone());
        let mut handler = capture.handler();
        assert!(handler(&[1u8, 2][..]).is_continue());
        stop.raise();
        assert!(handler(&[3u8, 4][..]).is_continue());
        assert_eq!(*output.0.lock().unwrap(), [1, 2]);
        assert_eq!(capture.summary(), CaptureSummary { transfers: 1, bytes: 2, discarded: 1 });
    }

    #[test]
    fn test_record_until_end_of_stream() {
        let mut driver = MockDriver::new(vec![vec![1, 2, 3], vec![0xfe, 0x7f], vec![], vec![0x80]]);
        driver.end_of_stream = true;
        let calls = driver.calls();
        let mut device = Device::from_driver(driver);
        let output = SharedBuf::default();
        let stop = StopFlag::new();

        let summary = record(&mut device, &config(), output.clone(), &stop).unwrap();
        assert_eq!(*output.0.lock().unwrap(), [1, 2, 3, 0xfe, 0x7f, 0x80]);
        assert_eq!(summary, CaptureSummary { transfers: 4, bytes: 6, discarded: 0 });
        assert_eq!(*calls.lock().unwrap(),
                   ["set_freq(85500000)", "set_sample_rate(256000)", "start_rx", "stop_rx"]);
        assert!(!stop.is_raised());
    }

    #[test]
    fn test_record_until_stop() {
        let stop = StopFlag::new();
        let mut driver = MockDriver::new(vec![vec![1], vec![2], vec![3], vec![4]]);
        driver.raise_before = Some((2, stop.clone()));
        let mut device = Device::from_driver(driver);
        let output = SharedBuf::default();

        let summary = record(&mut device, &config(), output.clone(), &stop).unwrap();
        assert_eq!(*output.0.lock().unwrap(), [1, 2]);
        assert_eq!(summary, CaptureSummary { transfers: 2, bytes: 2, discarded: 2 });
        assert_eq!(device.state(), crate::StreamState::Stopped);
    }

    #[test]
    fn test_record_write_error() {
        let mut driver = MockDriver::new(vec![vec![1], vec![2], vec![3]]);
        driver.end_of_stream = true;
        let mut device = Device::from_driver(driver);
        let stop = StopFlag::new();
        let writer = FailingWriter { writes_left: 1, fail_flush: false };

        match record(&mut device, &config(), writer, &stop) {
            Err(Error::Io(error)) => assert_eq!(error.kind(), io::ErrorKind::WriteZero),
            other => panic!("unexpected {:?}", other),
        }
        assert!(stop.is_raised());
    }

    #[test]
    fn test_record_flush_error() {
        let mut driver = MockDriver::new(vec![vec![1]]);
        driver.end_of_stream = true;
        let mut device = Device::from_driver(driver);
        let writer = FailingWriter { writes_left: 10, fail_flush: true };

        match record(&mut device, &config(), writer, &StopFlag::new()) {
            Err(Error::Io(error)) => assert_eq!(error.kind(), io::ErrorKind::BrokenPipe),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_record_survives_stop_failure() {
        let mut driver = MockDriver::new(vec![vec![9, 9]]);
        driver.end_of_stream = true;
        driver.fail_stop = true;
        let mut device = Device::from_driver(driver);
        let output = SharedBuf::default();

        let summary = record(&mut device, &config(), output.clone(), &StopFlag::new()).unwrap();
        assert_eq!(summary.bytes, 2);
        assert_eq!(*output.0.lock().unwrap(), [9, 9]);
    }

    #[test]
    fn test_record_start_failure() {
        let mut driver = MockDriver::new(vec![vec![1]]);
        driver.fail_start = true;
        let mut device = Device::from_driver(driver);

        let result = record(&mut device, &config(), SharedBuf::default(), &StopFlag::new());
        assert!(matches!(result, Err(Error::Hackrf { call: "hackrf_start_rx", .. })));
    }
}
