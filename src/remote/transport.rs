//! Transport abstraction — any message-oriented backend channel.
//!
//! Concrete implementations:
//! - WebSocket client over WiFi (ESP-IDF, see `adapters::ws`)
//! - scripted in-memory transport (tests)
//!
//! The remote client is generic over `Transport`, so swapping the backend
//! channel requires zero changes to the lifecycle or dispatch logic. All
//! calls are non-blocking; the client task supplies the pacing.

/// One inbound frame from the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// An application payload.
    Text(String),
    /// Keep-alive pong. Carries no application state; only the idle timer
    /// cares.
    Pong,
}

/// Message-oriented transport channel.
pub trait Transport {
    /// Error type for this transport.
    type Error: core::fmt::Debug;

    /// Begin establishing the connection. May complete asynchronously;
    /// poll [`Transport::is_connected`] afterwards.
    fn connect(&mut self) -> Result<(), Self::Error>;

    /// Tear the connection down. Idempotent.
    fn disconnect(&mut self);

    /// True while the transport-level connection is open.
    fn is_connected(&self) -> bool;

    /// Fetch the next pending inbound frame, if any (non-blocking).
    fn poll_frame(&mut self) -> Result<Option<Frame>, Self::Error>;

    /// Send a text payload. Returns the number of bytes written.
    fn send_text(&mut self, text: &str) -> Result<usize, Self::Error>;
}

/// A transport that never connects and discards all writes.
/// Useful as a default when no backend is configured.
pub struct NullTransport;

impl Transport for NullTransport {
    type Error = ();

    fn connect(&mut self) -> Result<(), ()> {
        Ok(())
    }

    fn disconnect(&mut self) {}

    fn is_connected(&self) -> bool {
        false
    }

    fn poll_frame(&mut self) -> Result<Option<Frame>, ()> {
        Ok(None)
    }

    fn send_text(&mut self, text: &str) -> Result<usize, ()> {
        Ok(text.len())
    }
}
