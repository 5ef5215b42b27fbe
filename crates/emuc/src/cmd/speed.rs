use std::io::Read;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use emuc_frame::{FrameError, LineWriter, Reply, StreamDecoder};
use emuc_transport::SerialDevice;

use crate::cmd::{check_speed, parse_duration, SpeedArgs};
use crate::exit::{frame_error, transport_error, CliError, CliResult, FAILURE, SUCCESS, TIMEOUT};
use crate::output::{print_ack, OutputFormat};

pub fn run(args: SpeedArgs, format: OutputFormat) -> CliResult<i32> {
    let wait_timeout = parse_duration(&args.wait_timeout)?;
    check_speed(args.kbps);

    let device =
        SerialDevice::open(&args.device).map_err(|err| transport_error("open failed", err))?;

    // Start listening before the command goes out so the reply cannot be missed.
    let reply = if args.wait {
        let reader = device
            .try_clone()
            .map_err(|err| transport_error("open failed", err))?;
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = tx.send(wait_for_speed_reply(StreamDecoder::new(reader)));
        });
        Some(rx)
    } else {
        None
    };

    let mut writer = LineWriter::new(device);
    writer
        .set_speed(args.port, args.kbps)
        .map_err(|err| frame_error("set speed failed", err))?;
    tracing::info!(port = %args.port, kbps = args.kbps, "set speed sent");

    if let Some(rx) = reply {
        await_reply(&rx, wait_timeout)?;
        print_ack(format);
    }

    Ok(SUCCESS)
}

/// Read until the adapter acknowledges or rejects a set-speed command.
/// CAN traffic arriving in between is skipped.
fn wait_for_speed_reply<R: Read>(mut decoder: StreamDecoder<R>) -> Result<(), FrameError> {
    loop {
        match decoder.decode_next()? {
            Reply::Ack => return Ok(()),
            Reply::Message { port, message } => {
                tracing::trace!(%port, %message, "skipping message while waiting for ack");
            }
        }
    }
}

fn await_reply(rx: &Receiver<Result<(), FrameError>>, timeout: Duration) -> CliResult<()> {
    match rx.recv_timeout(timeout) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(FrameError::SpeedSetRejected)) => Err(CliError::new(
            FAILURE,
            "set speed rejected by adapter (NAK)",
        )),
        Ok(Err(err)) => Err(frame_error("waiting for ack failed", err)),
        Err(RecvTimeoutError::Timeout) => Err(CliError::new(
            TIMEOUT,
            format!("no reply from adapter within {timeout:?}"),
        )),
        Err(RecvTimeoutError::Disconnected) => Err(CliError::new(
            crate::exit::INTERNAL,
            "reader thread exited without a reply",
        )),
    }
}
