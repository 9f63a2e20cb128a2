use std::io::Read;

use serlink_frame::{decode_frame, scan_frame, FrameConfig};

use crate::cmd::DecodeArgs;
use crate::exit::{frame_error, io_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_message, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let input = match args.frame {
        Some(text) => text,
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .map_err(|err| io_error("failed reading stdin", err))?;
            text
        }
    };

    let config = FrameConfig::default();
    let bytes = input.as_bytes();
    let bounds = scan_frame(bytes, &config)
        .ok_or_else(|| CliError::new(DATA_INVALID, "no frame found in input"))?;
    let message = decode_frame(&bytes[bounds.text()], &config)
        .map_err(|err| frame_error("decode failed", err))?;

    let frame = &input[bounds.start..=bounds.stop];
    print_message("decoded", &message, Some(frame), format);
    Ok(SUCCESS)
}
