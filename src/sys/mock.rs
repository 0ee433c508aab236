//! Driver double that replays transfers from a worker thread, like libhackrf's transfer thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use crate::{Error, Result, StopFlag};
use super::{Driver, RxHandler};

pub struct MockDriver {
    transfers: Vec<Vec<u8>>,
    calls: Arc<Mutex<Vec<String>>>,
    streaming: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
    /// Raise this flag right before delivering the transfer at this index.
    pub raise_before: Option<(usize, StopFlag)>,
    /// Stop streaming on its own once every transfer is delivered.
    pub end_of_stream: bool,
    pub fail_start: bool,
    pub fail_stop: bool,
}

impl MockDriver {
    pub fn new(transfers: Vec<Vec<u8>>) -> MockDriver {
        MockDriver {
            transfers,
            calls: Arc::new(Mutex::new(Vec::new())),
            streaming: Arc::new(AtomicBool::new(false)),
            worker: None,
            raise_before: None,
            end_of_stream: false,
            fail_start: false,
            fail_stop: false,
        }
    }

    pub fn calls(&self) -> Arc<Mutex<Vec<String>>> {
        self.calls.clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call)
    }
}

fn error(call: &'static str) -> Error {
    Error::Hackrf { call, code: -1000, name: "HACKRF_ERROR_OTHER".to_owned() }
}

impl Driver for MockDriver {
    fn set_freq(&mut self, freq_hz: u64) -> Result<()> {
        self.record(format!("set_freq({})", freq_hz));
        Ok(())
    }

    fn set_sample_rate(&mut self, rate_hz: f64) -> Result<()> {
        self.record(format!("set_sample_rate({})", rate_hz));
        Ok(())
    }

    fn start_rx(&mut self, mut handler: RxHandler) -> Result<()> {
        if self.fail_start {
            return Err(error("hackrf_start_rx"))
        }
        self.record("start_rx".to_owned());
        self.streaming.store(true, Ordering::SeqCst);

        let transfers = std::mem::take(&mut self.transfers);
        let raise_before = self.raise_before.take();
        let end_of_stream = self.end_of_stream;
        let streaming = self.streaming.clone();
        self.worker = Some(std::thread::spawn(move || {
            for (index, transfer) in transfers.iter().enumerate() {
                if let Some((_, flag)) = raise_before.as_ref().filter(|(at, _)| *at == index) {
                    flag.raise();
                }
                if handler(&transfer[..]).is_break() {
                    streaming.store(false, Ordering::SeqCst);
                    return
                }
            }
            if end_of_stream {
                streaming.store(false, Ordering::SeqCst);
            }
        }));
        Ok(())
    }

    fn stop_rx(&mut self) -> Result<()> {
        self.record("stop_rx".to_owned());
        if let Some(worker) = self.worker.take() {
            worker.join().unwrap();
        }
        self.streaming.store(false, Ordering::SeqCst);
        if self.fail_stop {
            return Err(error("hackrf_stop_rx"))
        }
        Ok(())
    }

    fn is_streaming(&self) -> bool {
        self.streaming.load(Ordering::SeqCst)
    }

    fn board_name(&mut self) -> Result<String> {
        Ok("HackRF One".to_owned())
    }

    fn firmware_version(&mut self) -> Result<String> {
        Ok("2024.02.1".to_owned())
    }
}
