//! WebSocket transport (ESP-IDF).
//!
//! Wraps `esp_idf_svc::ws::client::EspWebSocketClient` behind the
//! [`Transport`] trait. The ESP-IDF client delivers events on its own task;
//! the callback forwards inbound frames into a bounded channel that
//! [`Transport::poll_frame`] drains from the client task.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, warn};

use esp_idf_svc::ws::client::{
    EspWebSocketClient, EspWebSocketClientConfig, FrameType, WebSocketEventType,
};

use crate::error::CommsError;
use crate::mailbox::Outbox;
use crate::remote::transport::{Frame, Transport};

/// Inbound frames buffered between the WS event task and the client task.
const INBOUND_DEPTH: usize = 8;

pub struct EspWsTransport {
    url: String,
    client: Option<EspWebSocketClient<'static>>,
    connected: Arc<AtomicBool>,
    inbound: Arc<Outbox<Frame, INBOUND_DEPTH>>,
}

impl EspWsTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: None,
            connected: Arc::new(AtomicBool::new(false)),
            inbound: Arc::new(Outbox::new()),
        }
    }
}

impl Transport for EspWsTransport {
    type Error = CommsError;

    fn connect(&mut self) -> Result<(), CommsError> {
        if self.client.is_some() {
            return Ok(());
        }
        let connected = self.connected.clone();
        let inbound = self.inbound.clone();

        let config = EspWebSocketClientConfig {
            ..Default::default()
        };
        let client = EspWebSocketClient::new(
            &self.url,
            &config,
            core::time::Duration::from_secs(10),
            move |event| match event {
                Ok(event) => match event.event_type {
                    Some(WebSocketEventType::Connected) => {
                        connected.store(true, Ordering::SeqCst);
                    }
                    Some(WebSocketEventType::Disconnected)
                    | Some(WebSocketEventType::Closed(_)) => {
                        connected.store(false, Ordering::SeqCst);
                    }
                    Some(WebSocketEventType::Text(text)) => {
                        if inbound.try_send(Frame::Text(text.to_string())).is_err() {
                            warn!("WS: inbound buffer full, frame dropped");
                        }
                    }
                    Some(WebSocketEventType::Pong) => {
                        if inbound.try_send(Frame::Pong).is_err() {
                            debug!("WS: inbound buffer full, pong dropped");
                        }
                    }
                    _ => {}
                },
                Err(e) => warn!("WS event error: {e}"),
            },
        )
        .map_err(|_| CommsError::ConnectFailed)?;

        self.client = Some(client);
        Ok(())
    }

    fn disconnect(&mut self) {
        // Dropping the client closes the socket and stops the event task.
        self.client = None;
        self.connected.store(false, Ordering::SeqCst);
        while self.inbound.try_recv().is_some() {}
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn poll_frame(&mut self) -> Result<Option<Frame>, CommsError> {
        Ok(self.inbound.try_recv())
    }

    fn send_text(&mut self, text: &str) -> Result<usize, CommsError> {
        let client = self.client.as_mut().ok_or(CommsError::NotConnected)?;
        client
            .send(FrameType::Text(false), text.as_bytes())
            .map_err(|_| CommsError::SendFailed)?;
        Ok(text.len())
    }
}
