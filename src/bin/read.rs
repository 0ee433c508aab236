use std::fs::File;
use std::io::BufWriter;
use std::process::ExitCode;

use hackrf_read::{signal, CaptureConfiguration, Error, StopFlag};

fn capture(config: &CaptureConfiguration) -> hackrf_read::Result<()> {
    let output = File::create(&config.output_path).map_err(|error| {
        Error::Other(format!("cannot create {}: {}", config.output_path.display(), error).into())
    })?;

    let stop = StopFlag::new();
    let result = hackrf_read::Device::with(config.serial_number.as_deref(), |device| {
        signal::install(&stop, &signal::DEFAULT_SIGNALS)?;
        eprintln!("Stop with Ctrl-C");
        hackrf_read::record(device, config, BufWriter::new(output), &stop)
    });
    if let Some(signum) = signal::caught() {
        eprintln!("Caught signal {}", signum);
    }
    let summary = result?;

    println!("saved {} bytes of I/Q samples to {}", summary.bytes, config.output_path.display());
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    match capture(&CaptureConfiguration::default()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{}", error);
            ExitCode::FAILURE
        }
    }
}
