use std::io::Read;

use emuc_frame::{FrameError, LineWriter, Reply, StreamDecoder};
use emuc_transport::SerialDevice;

use crate::cmd::{check_speed, MonitorArgs};
use crate::exit::{frame_error, transport_error, CliError, CliResult, SUCCESS};
use crate::output::{print_ack, print_message, OutputFormat};

pub fn run(args: MonitorArgs, format: OutputFormat) -> CliResult<i32> {
    let device = match args.kbps {
        Some(kbps) => {
            let device = SerialDevice::open(&args.device)
                .map_err(|err| transport_error("open failed", err))?;
            check_speed(kbps);
            let mut writer = LineWriter::new(
                device
                    .try_clone()
                    .map_err(|err| transport_error("open failed", err))?,
            );
            writer
                .set_speed(args.port, kbps)
                .map_err(|err| frame_error("set speed failed", err))?;
            device
        }
        None => SerialDevice::open_read_only(&args.device)
            .map_err(|err| transport_error("open failed", err))?,
    };

    install_ctrlc_handler()?;

    let printed = monitor(StreamDecoder::new(device), args.count, format)?;
    tracing::debug!(printed, "monitor finished");

    Ok(SUCCESS)
}

/// Print replies until EOF or `count` messages. Returns the number of
/// messages printed.
fn monitor<R: Read>(
    mut decoder: StreamDecoder<R>,
    count: Option<usize>,
    format: OutputFormat,
) -> CliResult<usize> {
    let mut printed = 0usize;

    while count.is_none_or(|count| printed < count) {
        match decoder.decode_next() {
            Ok(Reply::Ack) => print_ack(format),
            Ok(Reply::Message { port, message }) => {
                print_message(port, &message, format);
                printed = printed.saturating_add(1);
            }
            Err(FrameError::SpeedSetRejected) => {
                tracing::warn!("set speed rejected by adapter");
            }
            Err(FrameError::ConnectionClosed) => break,
            Err(err) => return Err(frame_error("receive failed", err)),
        }
    }

    Ok(printed)
}

/// Ctrl-C ends the process right away; the reader may be blocked on a
/// silent bus.
fn install_ctrlc_handler() -> CliResult<()> {
    ctrlc::set_handler(|| {
        tracing::debug!("interrupted, exiting");
        std::process::exit(SUCCESS);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}
