use std::io::{self, BufRead};
use std::thread;

use emuc_frame::{CanMessage, FrameError, LineWriter, Port, Reply, StreamDecoder};
use emuc_transport::SerialDevice;

use crate::cmd::{check_speed, CatArgs};
use crate::exit::{frame_error, io_error, transport_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_ack, print_message, OutputFormat};

pub fn run(args: CatArgs, format: OutputFormat) -> CliResult<i32> {
    let device =
        SerialDevice::open(&args.device).map_err(|err| transport_error("open failed", err))?;
    let reader = device
        .try_clone()
        .map_err(|err| transport_error("open failed", err))?;
    let mut writer = LineWriter::new(device);

    // Any decode failure other than a NAK ends the whole session.
    thread::spawn(move || {
        let err = print_replies(StreamDecoder::new(reader), format);
        let err = frame_error("receive failed", err);
        eprintln!("error: {err}");
        std::process::exit(err.code);
    });

    if let Some(kbps) = args.kbps {
        check_speed(kbps);
        tracing::info!(kbps, port = %args.port, "setting speed");
        writer
            .set_speed(args.port, kbps)
            .map_err(|err| frame_error("set speed failed", err))?;
    }

    for line in io::stdin().lock().lines() {
        let line = line.map_err(|err| io_error("stdin read failed", err))?;
        if line.trim().is_empty() {
            continue;
        }

        let (port, message) = match parse_input_line(&line) {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::warn!(input = %line, "{err}");
                continue;
            }
        };
        writer
            .send(port, &message)
            .map_err(|err| frame_error("send failed", err))?;
    }

    Ok(SUCCESS)
}

/// Print everything the adapter sends until an unrecoverable error.
fn print_replies<R: io::Read>(mut decoder: StreamDecoder<R>, format: OutputFormat) -> FrameError {
    loop {
        match decoder.decode_next() {
            Ok(Reply::Ack) => print_ack(format),
            Ok(Reply::Message { port, message }) => print_message(port, &message, format),
            Err(FrameError::SpeedSetRejected) => tracing::warn!("set speed rejected by adapter"),
            Err(err) => return err,
        }
    }
}

/// Parse `PORT HEADER PAYLOAD`: decimal port, hex address, and a hex
/// 64-bit payload sent as 8 big-endian bytes on an extended message.
pub fn parse_input_line(line: &str) -> CliResult<(Port, CanMessage)> {
    let mut fields = line.split_whitespace();
    let (Some(port), Some(header), Some(payload), None) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return Err(CliError::new(
            USAGE,
            "expected \"PORT HEADER PAYLOAD\" (e.g. \"1 18FEF100 0102030405060708\")",
        ));
    };

    let port: u8 = port
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid port: {port}")))?;
    let header = u32::from_str_radix(header, 16)
        .map_err(|_| CliError::new(USAGE, format!("invalid header: {header}")))?;
    let payload = u64::from_str_radix(payload, 16)
        .map_err(|_| CliError::new(USAGE, format!("invalid payload: {payload}")))?;

    Ok((
        Port::from(port),
        CanMessage::new_extended(header, &payload.to_be_bytes()),
    ))
}
