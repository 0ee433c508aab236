use std::process::ExitCode;

fn list() -> hackrf_read::Result<()> {
    let serials = hackrf_read::list_devices()?;
    if serials.is_empty() {
        println!("no devices found");
        return Ok(())
    }

    for (index, serial) in serials.iter().enumerate() {
        println!("device {}:", index);
        println!("  serial number:    {}", serial);
        match hackrf_read::Device::with(Some(serial), |device| {
            Ok((device.board_name()?, device.firmware_version()?))
        }) {
            Ok((board, version)) => {
                println!("  board:            {}", board);
                println!("  firmware version: {}", version);
            }
            Err(error) =>
                println!("  cannot open: {}", error),
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    match list() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{}", error);
            ExitCode::FAILURE
        }
    }
}
