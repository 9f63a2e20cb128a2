use std::io::{Read, Write};

use serlink_frame::{decode_frame, FrameError, FrameReader, FrameWriter};
use serlink_message::Message;
use serlink_transport::LinkStream;
use tracing::{debug, info, warn};

use crate::ack::{self, AckVerdict};
use crate::config::ExchangeConfig;
use crate::error::{PeerError, Result};
use crate::state::{ReceiveOutcome, ReceiveState, SendOutcome, SendReport, SendState};

/// Reply lines read while waiting for an ack, blank ones included.
const ACK_LINES: usize = 2;

/// One end of a half-duplex link.
///
/// Holds a single outbound and a single inbound [`Message`]. Fill the
/// outbound one through [`Peer::message_mut`], then call one of the send
/// methods; read what arrived through [`Peer::inbound`] after a receive.
pub struct Peer<R = LinkStream, W = LinkStream> {
    reader: FrameReader<R>,
    writer: FrameWriter<W>,
    outbound: Message,
    inbound: Message,
    config: ExchangeConfig,
    send_state: SendState,
    receive_state: ReceiveState,
}

impl<R: Read, W: Write> Peer<R, W> {
    /// Create a peer over a reader and writer with default configuration.
    pub fn new(reader: R, writer: W) -> Self {
        let config = ExchangeConfig::default();
        Self::assemble(
            FrameReader::with_config(reader, config.frame.clone()),
            FrameWriter::with_config(writer, config.frame.clone()),
            config,
        )
    }

    /// Create a peer with explicit configuration.
    ///
    /// Fails with [`PeerError::InvalidConfig`] if `config` does not validate.
    pub fn with_config(reader: R, writer: W, config: ExchangeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::assemble(
            FrameReader::with_config(reader, config.frame.clone()),
            FrameWriter::with_config(writer, config.frame.clone()),
            config,
        ))
    }

    pub fn from_parts(
        reader: FrameReader<R>,
        writer: FrameWriter<W>,
        config: ExchangeConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self::assemble(reader, writer, config))
    }

    fn assemble(reader: FrameReader<R>, writer: FrameWriter<W>, config: ExchangeConfig) -> Self {
        let message_config = config.frame.message.clone();
        Self {
            reader,
            writer,
            outbound: Message::with_config(message_config.clone()),
            inbound: Message::with_config(message_config),
            config,
            send_state: SendState::Idle,
            receive_state: ReceiveState::Idle,
        }
    }

    /// Outbound message, for appending fields before a send.
    pub fn message_mut(&mut self) -> &mut Message {
        &mut self.outbound
    }

    pub fn outbound(&self) -> &Message {
        &self.outbound
    }

    /// Last accepted inbound message; empty after a rejection.
    pub fn inbound(&self) -> &Message {
        &self.inbound
    }

    /// Inbound message, for cursor navigation.
    pub fn inbound_mut(&mut self) -> &mut Message {
        &mut self.inbound
    }

    pub fn config(&self) -> &ExchangeConfig {
        &self.config
    }

    pub fn send_state(&self) -> SendState {
        self.send_state
    }

    pub fn receive_state(&self) -> ReceiveState {
        self.receive_state
    }

    /// Build the outbound message, send it and wait for one reply.
    ///
    /// Nothing is written if the message cannot be built.
    pub fn send_once(
        &mut self,
        task_value: u8,
        succeeded: bool,
        message_number: u8,
        total_quantity: u8,
    ) -> Result<SendOutcome> {
        let raw = self
            .outbound
            .build(task_value, succeeded, message_number, total_quantity)?;

        self.set_send_state(SendState::Sending);
        if let Err(err) = self.writer.write_frame(&raw) {
            self.set_send_state(SendState::Idle);
            return Err(stream_error(err));
        }

        self.set_send_state(SendState::AwaitingAck);
        self.pause(1);
        let outcome = self.await_ack()?;
        self.set_send_state(match outcome {
            SendOutcome::Acked => SendState::Acked,
            SendOutcome::NackedOrTimeout => SendState::NackedOrTimeout,
        });
        Ok(outcome)
    }

    /// Repeat [`Peer::send_once`] until acked or `max_attempts` cycles ran.
    pub fn send_with_retry(
        &mut self,
        task_value: u8,
        succeeded: bool,
        message_number: u8,
        total_quantity: u8,
    ) -> Result<SendReport> {
        let max_attempts = self.config.max_attempts.max(1);
        for attempt in 1..=max_attempts {
            let outcome = self.send_once(task_value, succeeded, message_number, total_quantity)?;
            if outcome.is_acked() {
                return Ok(SendReport {
                    outcome,
                    attempts: attempt,
                });
            }
            debug!(attempt, max_attempts, "send not acknowledged");
        }

        warn!(attempts = max_attempts, "send attempts exhausted");
        Ok(SendReport {
            outcome: SendOutcome::NackedOrTimeout,
            attempts: max_attempts,
        })
    }

    /// Read one reply and classify it.
    ///
    /// Blank lines are skipped, up to two lines in total. No reply within the
    /// reader's timeout counts as a nack.
    pub fn await_ack(&mut self) -> Result<SendOutcome> {
        for _ in 0..ACK_LINES {
            let line = match self.reader.read_line() {
                Ok(Some(line)) => line,
                Ok(None) => {
                    debug!("no reply before timeout");
                    return Ok(SendOutcome::NackedOrTimeout);
                }
                Err(err) => return Err(stream_error(err)),
            };
            if ack::is_blank(&line) {
                continue;
            }
            return Ok(match ack::classify(&line, &self.config) {
                AckVerdict::Ack => SendOutcome::Acked,
                verdict => {
                    debug!(?verdict, "reply is not an ack");
                    SendOutcome::NackedOrTimeout
                }
            });
        }
        debug!("only blank reply lines");
        Ok(SendOutcome::NackedOrTimeout)
    }

    /// Look for one frame and answer it.
    ///
    /// An accepted frame replaces the inbound message and is answered with an
    /// ack burst if its success flag is set, else a nack burst. A rejected
    /// frame clears the inbound message and gets no reply.
    pub fn receive(&mut self) -> Result<ReceiveOutcome> {
        self.set_receive_state(ReceiveState::Listening);
        let text = match self.reader.read_frame_text() {
            Ok(Some(text)) => text,
            Ok(None) => {
                self.set_receive_state(ReceiveState::Idle);
                return Ok(ReceiveOutcome::NoFrame);
            }
            Err(err) => {
                self.set_receive_state(ReceiveState::Idle);
                return Err(stream_error(err));
            }
        };

        self.set_receive_state(ReceiveState::FrameFound);
        match decode_frame(&text, self.reader.config()) {
            Ok(message) => {
                let succeeded = message.succeeded();
                self.inbound = message;
                self.set_receive_state(ReceiveState::Accepted);
                let reply = ack::burst(succeeded, &self.config);
                self.writer.write_line(&reply).map_err(stream_error)?;
                info!(
                    task_value = self.inbound.task_value(),
                    succeeded,
                    fields = self.inbound.field_count(),
                    "accepted message"
                );
                Ok(ReceiveOutcome::Accepted { succeeded })
            }
            Err(err) => {
                warn!(error = %err, "rejected frame");
                self.inbound.clear();
                self.set_receive_state(ReceiveState::Rejected);
                Ok(ReceiveOutcome::Rejected(err))
            }
        }
    }

    /// Call [`Peer::receive`] up to `attempts` times until a frame turns up,
    /// pausing three quiet intervals between empty passes.
    pub fn listen(&mut self, attempts: u32) -> Result<ReceiveOutcome> {
        let attempts = attempts.max(1);
        for attempt in 1..=attempts {
            match self.receive()? {
                ReceiveOutcome::NoFrame if attempt < attempts => self.pause(3),
                outcome => return Ok(outcome),
            }
        }
        Ok(ReceiveOutcome::NoFrame)
    }

    /// Split into reader, writer and configuration.
    pub fn into_parts(self) -> (FrameReader<R>, FrameWriter<W>, ExchangeConfig) {
        (self.reader, self.writer, self.config)
    }

    fn pause(&self, intervals: u32) {
        let delay = self.config.quiet_interval * intervals;
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }

    fn set_send_state(&mut self, next: SendState) {
        debug!(from = %self.send_state, to = %next, "send state");
        self.send_state = next;
    }

    fn set_receive_state(&mut self, next: ReceiveState) {
        debug!(from = %self.receive_state, to = %next, "receive state");
        self.receive_state = next;
    }
}

impl<R, W> std::fmt::Debug for Peer<R, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Peer")
            .field("send_state", &self.send_state)
            .field("receive_state", &self.receive_state)
            .field("outbound_size", &self.outbound.size())
            .field("inbound_size", &self.inbound.size())
            .finish()
    }
}

fn stream_error(err: FrameError) -> PeerError {
    match err {
        FrameError::ConnectionClosed => PeerError::Disconnected("end of stream".to_string()),
        other => PeerError::Frame(other),
    }
}
