use serlink_peer::{connect_with_config, open_with_config};
use tracing::{debug, info};

use crate::cmd::{exchange_config, parse_duration, SendArgs};
use crate::exit::{peer_error, CliError, CliResult, FAILURE, SUCCESS, USAGE};
use crate::output::{print_send_report, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let mut config = exchange_config(parse_duration(&args.timeout)?, parse_duration(&args.quiet)?);
    config.max_attempts = args.retries;

    let mut peer = match (&args.device, &args.path) {
        (Some(device), _) => open_with_config(device, config),
        (None, Some(path)) => connect_with_config(path, config),
        (None, None) => return Err(CliError::new(USAGE, "a socket path or --device is required")),
    }
    .map_err(|err| peer_error("connect failed", err))?;

    args.message.fill(peer.message_mut())?;
    debug!(fields = args.message.fields.len(), "outbound message ready");

    let report = peer
        .send_with_retry(
            args.message.task,
            !args.message.failed,
            args.message.number,
            args.message.total,
        )
        .map_err(|err| peer_error("send failed", err))?;
    info!(acked = report.outcome.is_acked(), attempts = report.attempts, "send finished");

    print_send_report(report, format);
    if report.outcome.is_acked() {
        Ok(SUCCESS)
    } else {
        Ok(FAILURE)
    }
}
