use emuc_frame::{classify_line, FrameError, Reply, Request};

use crate::cmd::DecodeArgs;
use crate::exit::{frame_error, CliResult, SUCCESS};
use crate::output::{print_ack, print_message, print_nak, print_request, OutputFormat};

/// A decoded line, from either side of the link.
#[derive(Debug, PartialEq)]
enum Decoded {
    Request(Request),
    Reply(Reply),
    Nak,
}

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    match decode(&args.line).map_err(|err| frame_error("decode failed", err))? {
        Decoded::Request(request) => print_request(&request, format),
        Decoded::Reply(Reply::Ack) => print_ack(format),
        Decoded::Reply(Reply::Message { port, message }) => print_message(port, &message, format),
        Decoded::Nak => print_nak(format),
    }
    Ok(SUCCESS)
}

fn decode(line: &str) -> Result<Decoded, FrameError> {
    let line = line.trim().as_bytes();
    match line.first() {
        Some(b':' | b'<') => Request::parse(line).map(Decoded::Request),
        _ => match classify_line(line) {
            Ok(reply) => Ok(Decoded::Reply(reply)),
            Err(FrameError::SpeedSetRejected) => Ok(Decoded::Nak),
            Err(err) => Err(err),
        },
    }
}
