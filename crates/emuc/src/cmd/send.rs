use emuc_frame::LineWriter;
use emuc_transport::SerialDevice;

use crate::cmd::SendArgs;
use crate::exit::{frame_error, transport_error, CliResult, SUCCESS};

pub fn run(args: SendArgs) -> CliResult<i32> {
    let message = args.message.to_message()?;
    let device =
        SerialDevice::open(&args.device).map_err(|err| transport_error("open failed", err))?;

    let mut writer = LineWriter::new(device);
    writer
        .send(args.message.port, &message)
        .map_err(|err| frame_error("send failed", err))?;

    tracing::info!(port = %args.message.port, %message, "sent");
    Ok(SUCCESS)
}
