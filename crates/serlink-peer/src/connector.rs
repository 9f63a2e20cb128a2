use std::path::Path;

use serlink_frame::{FrameReader, FrameWriter};
use serlink_transport::{open_device, LinkStream};

use crate::config::ExchangeConfig;
use crate::error::Result;
use crate::peer::Peer;

/// Connect to a peer listening on a Unix domain socket.
pub fn connect(path: impl AsRef<Path>) -> Result<Peer> {
    connect_with_config(path, ExchangeConfig::default())
}

/// Connect with explicit configuration.
pub fn connect_with_config(path: impl AsRef<Path>, config: ExchangeConfig) -> Result<Peer> {
    #[cfg(not(unix))]
    {
        let _ = config;
        return Err(serlink_transport::TransportError::Connect {
            path: path.as_ref().to_path_buf(),
            source: std::io::Error::new(
                std::io::ErrorKind::Unsupported,
                "socket links require Unix domain sockets",
            ),
        }
        .into());
    }

    #[cfg(unix)]
    {
        config.validate()?;
        let stream = serlink_transport::uds::connect(path)?;
        from_link(stream, config)
    }
}

/// Open an already-configured device node (serial port, pty) as a peer.
pub fn open(path: impl AsRef<Path>) -> Result<Peer> {
    open_with_config(path, ExchangeConfig::default())
}

/// Open a device node with explicit configuration.
pub fn open_with_config(path: impl AsRef<Path>, config: ExchangeConfig) -> Result<Peer> {
    config.validate()?;
    let stream = open_device(path)?;
    from_link(stream, config)
}

/// Wrap an open link, applying the configured timeouts.
pub fn from_link(stream: LinkStream, config: ExchangeConfig) -> Result<Peer> {
    let reader_stream = stream.try_clone()?;
    let reader = FrameReader::with_config_link(reader_stream, config.frame.clone())?;
    let writer = FrameWriter::with_config_link(stream, config.frame.clone())?;
    Peer::from_parts(reader, writer, config)
}

#[cfg(all(test, unix))]
mod tests {
    use std::thread;
    use std::time::Duration;

    use super::*;
    use crate::listener::PeerListener;
    use crate::state::{ReceiveOutcome, SendOutcome};

    fn sock_path(tag: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "serlink-peer-{tag}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("time should be after epoch")
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
        dir.join("link.sock")
    }

    fn quick() -> ExchangeConfig {
        ExchangeConfig {
            quiet_interval: Duration::ZERO,
            ..ExchangeConfig::default()
        }
    }

    #[test]
    fn connect_and_exchange() {
        let path = sock_path("connect");
        let listener = PeerListener::bind(&path)
            .expect("listener should bind")
            .with_config(quick());

        let server = thread::spawn(move || {
            let mut peer = listener.accept().expect("listener should accept");
            let outcome = peer.receive().expect("receive should not fail");
            assert!(matches!(outcome, ReceiveOutcome::Accepted { succeeded: true }));
            peer.inbound().read_str(0).expect("field 0 should be a string")
        });

        let mut client = connect_with_config(&path, quick()).expect("client should connect");
        client.message_mut().append("hello").expect("append should fit");
        let outcome = client.send_once(2, true, 1, 1).expect("send should not fail");
        assert_eq!(outcome, SendOutcome::Acked);

        assert_eq!(server.join().expect("server thread should finish"), "hello");
        if let Some(parent) = path.parent() {
            let _ = std::fs::remove_dir_all(parent);
        }
    }

    #[test]
    fn read_timeout_turns_silence_into_nack() {
        let path = sock_path("timeout");
        let listener = PeerListener::bind(&path).expect("listener should bind");

        let server = thread::spawn(move || {
            // Accept and hold the link open without replying.
            let peer = listener.accept().expect("listener should accept");
            thread::sleep(Duration::from_millis(200));
            drop(peer);
        });

        let mut cfg = quick();
        cfg.frame.read_timeout = Some(Duration::from_millis(20));
        let mut client = connect_with_config(&path, cfg).expect("client should connect");
        let outcome = client.send_once(1, true, 1, 1).expect("send should not fail");
        assert_eq!(outcome, SendOutcome::NackedOrTimeout);

        server.join().expect("server thread should finish");
        if let Some(parent) = path.parent() {
            let _ = std::fs::remove_dir_all(parent);
        }
    }

    #[test]
    fn invalid_config_is_refused_before_connecting() {
        let cfg = ExchangeConfig {
            ack_threshold: 0,
            ..ExchangeConfig::default()
        };
        let err = connect_with_config("/nonexistent/serlink.sock", cfg).unwrap_err();
        assert!(matches!(err, crate::PeerError::InvalidConfig(_)));
    }

    #[test]
    fn missing_device_is_a_transport_error() {
        let err = open("/nonexistent/serlink-tty").unwrap_err();
        assert!(matches!(err, crate::PeerError::Transport(_)));
    }
}
