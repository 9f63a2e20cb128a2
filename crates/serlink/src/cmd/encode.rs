use bytes::BytesMut;
use serlink_frame::{encode_frame, FrameConfig};
use serlink_message::Message;

use crate::cmd::EncodeArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_message, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let config = FrameConfig::default();
    let (message, raw) = args
        .message
        .build(Message::with_config(config.message.clone()))?;

    let mut frame = BytesMut::new();
    encode_frame(&raw, &mut frame, &config);
    let text = String::from_utf8_lossy(&frame);

    print_message("encoded", &message, Some(text.as_ref()), format);
    Ok(SUCCESS)
}
