use bytes::BytesMut;
use emuc_frame::{encode_received, encode_transmit, pack_record};

use crate::cmd::EncodeArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_line, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let message = args.message.to_message()?;
    let port = args.message.port;

    let mut buf = BytesMut::new();
    if args.received {
        encode_received(port, &message, &mut buf);
    } else {
        encode_transmit(port, &message, &mut buf);
    }

    let line = String::from_utf8_lossy(buf.trim_ascii_end());
    print_line(&line, &pack_record(port, &message), format);
    Ok(SUCCESS)
}
