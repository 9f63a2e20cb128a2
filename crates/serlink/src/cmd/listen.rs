use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serlink_peer::{
    open_with_config, Peer, PeerError, PeerListener, ReceiveOutcome, DEFAULT_QUIET_INTERVAL,
};
use tracing::{debug, warn};

use crate::cmd::{exchange_config, parse_duration, ListenArgs};
use crate::exit::{peer_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_message, OutputFormat};

enum Served {
    Disconnected,
    Stopped,
    CountReached,
}

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let config = exchange_config(parse_duration(&args.timeout)?, DEFAULT_QUIET_INTERVAL);

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut printed = 0usize;

    if let Some(device) = &args.device {
        let mut peer =
            open_with_config(device, config).map_err(|err| peer_error("open failed", err))?;
        serve(&mut peer, &args, &running, &mut printed, format)?;
        return Ok(SUCCESS);
    }

    let path = args
        .path
        .as_ref()
        .ok_or_else(|| CliError::new(USAGE, "a socket path or --device is required"))?;
    let listener = PeerListener::bind(path)
        .map_err(|err| peer_error("bind failed", err))?
        .with_config(config);

    while running.load(Ordering::SeqCst) {
        let mut peer = listener
            .accept()
            .map_err(|err| peer_error("accept failed", err))?;
        match serve(&mut peer, &args, &running, &mut printed, format)? {
            Served::Disconnected => debug!("peer disconnected"),
            Served::Stopped | Served::CountReached => break,
        }
    }

    Ok(SUCCESS)
}

fn serve<R: Read, W: Write>(
    peer: &mut Peer<R, W>,
    args: &ListenArgs,
    running: &AtomicBool,
    printed: &mut usize,
    format: OutputFormat,
) -> CliResult<Served> {
    while running.load(Ordering::SeqCst) {
        match peer.receive() {
            Ok(ReceiveOutcome::NoFrame) => continue,
            Ok(ReceiveOutcome::Rejected(err)) => {
                warn!(error = %err, "frame rejected, no reply sent");
                continue;
            }
            Ok(ReceiveOutcome::Accepted { .. }) => {}
            Err(PeerError::Disconnected(_)) => return Ok(Served::Disconnected),
            Err(err) => return Err(peer_error("receive failed", err)),
        }

        print_message("received", peer.inbound(), None, format);
        *printed = printed.saturating_add(1);

        if let Some(count) = args.count {
            if *printed >= count {
                return Ok(Served::CountReached);
            }
        }
    }
    Ok(Served::Stopped)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}
