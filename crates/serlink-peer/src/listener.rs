use std::path::Path;

use serlink_transport::UnixLinkListener;
use tracing::debug;

use crate::config::ExchangeConfig;
use crate::connector::from_link;
use crate::error::Result;
use crate::peer::Peer;

/// Accepts peers on a Unix domain socket.
pub struct PeerListener {
    socket: UnixLinkListener,
    config: ExchangeConfig,
}

impl PeerListener {
    /// Bind to a Unix domain socket path.
    pub fn bind(path: impl AsRef<Path>) -> Result<Self> {
        let socket = UnixLinkListener::bind(path)?;
        Ok(Self {
            socket,
            config: ExchangeConfig::default(),
        })
    }

    /// Override the exchange configuration given to accepted peers.
    pub fn with_config(mut self, config: ExchangeConfig) -> Self {
        self.config = config;
        self
    }

    /// Accept the next connection (blocking).
    pub fn accept(&self) -> Result<Peer> {
        self.config.validate()?;
        let stream = self.socket.accept()?;
        debug!(path = ?self.socket.path(), "peer connected");
        from_link(stream, self.config.clone())
    }

    /// Bound socket path.
    pub fn path(&self) -> &Path {
        self.socket.path()
    }
}
