//! Remote messaging client.
//!
//! Owns the single backend connection and its lifecycle:
//!
//! ```text
//!  Disconnected ──[message pending]──▶ Connecting ──▶ Registering ──[ack]──▶ Ready
//!        ▲                                                │                   │
//!        └────────────────[idle timeout / link failure]───┴───────────────────┘
//! ```
//!
//! - **Demand-driven connect**: while disconnected, a ~1 s poll opens the
//!   connection only when the outbound slot holds a message — no idle
//!   connection is held open with nothing to send.
//! - **Registration gate**: the outbound slot is not drained until the
//!   backend acknowledges the registration call; only the registration
//!   itself is sent before that.
//! - **Idle disconnect**: a quiet period with no inbound traffic tears the
//!   connection down, clears the readiness flags, and re-arms the
//!   demand-driven poll.
//! - **Inbound dispatch**: replies carrying an error object are logged and
//!   dropped (at-most-once, no retry). Otherwise the echoed correlation id
//!   recovers the path: the registration ack raises `REGISTERED`; a job
//!   assignment decodes into a `Recipe` and overwrite-publishes the job
//!   slot. Pongs reset only the idle timer.

use std::sync::Arc;
use std::time::Instant;

use core::time::Duration;

use log::{debug, error, info, warn};

use super::envelope;
use super::transport::{Frame, Transport};
use super::update::{METHOD_MUTATION, paths, registration_payload};
use crate::bus::Bus;
use crate::config::{OvenConfig, millis};
use crate::recipe;
use crate::status;

/// Pace of the client loop while a connection is up.
const LINK_TICK: Duration = Duration::from_millis(50);

/// Connection lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connecting,
    Registering,
    Ready,
}

/// Device identity presented to the backend.
#[derive(Debug, Clone)]
pub struct Identity {
    pub device_id: String,
    pub name: String,
    pub pairing_id: String,
}

/// The messaging client. Generic over the transport so the lifecycle and
/// dispatch logic is testable without a network.
pub struct RemoteClient<T: Transport> {
    transport: T,
    identity: Identity,
    cfg: OvenConfig,
    state: LinkState,
    last_inbound: Instant,
    last_register: Instant,
    connect_started: Instant,
}

impl<T: Transport> RemoteClient<T> {
    pub fn new(transport: T, identity: Identity, cfg: OvenConfig) -> Self {
        let now = Instant::now();
        Self {
            transport,
            identity,
            cfg,
            state: LinkState::Disconnected,
            last_inbound: now,
            last_register: now,
            connect_started: now,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    /// One lifecycle iteration. All transport calls are non-blocking; the
    /// task loop supplies the pacing.
    pub fn tick(&mut self, bus: &Bus) {
        match self.state {
            LinkState::Disconnected => self.tick_disconnected(bus),
            LinkState::Connecting => self.tick_connecting(bus),
            LinkState::Registering | LinkState::Ready => self.tick_linked(bus),
        }
    }

    /// Client task loop.
    pub async fn run(mut self, bus: Arc<Bus>) {
        info!("remote messaging client started");
        loop {
            self.tick(&bus);
            let pace = if self.state == LinkState::Disconnected {
                millis(self.cfg.connect_poll_ms)
            } else {
                LINK_TICK
            };
            async_io_mini::Timer::after(pace).await;
        }
    }

    // ── Lifecycle steps ───────────────────────────────────────

    fn tick_disconnected(&mut self, bus: &Bus) {
        if bus.outbox.is_empty() {
            return;
        }
        info!("message waiting, opening backend connection");
        match self.transport.connect() {
            Ok(()) => {
                self.connect_started = Instant::now();
                self.state = LinkState::Connecting;
                // Transports that connect synchronously proceed this tick.
                self.tick_connecting(bus);
            }
            Err(e) => warn!("backend connect failed: {e:?}"),
        }
    }

    fn tick_connecting(&mut self, bus: &Bus) {
        if self.transport.is_connected() {
            bus.status.set(status::CONNECTION_READY);
            self.last_inbound = Instant::now();
            self.send_register();
            self.state = LinkState::Registering;
        } else if self.connect_started.elapsed() >= millis(self.cfg.idle_disconnect_ms) {
            warn!("backend connect timed out");
            self.transport.disconnect();
            self.state = LinkState::Disconnected;
        }
    }

    fn tick_linked(&mut self, bus: &Bus) {
        self.pump_inbound(bus);
        if self.state == LinkState::Disconnected {
            return;
        }

        if self.state == LinkState::Registering
            && self.last_register.elapsed() >= millis(self.cfg.register_retry_ms)
        {
            self.send_register();
        }

        if self.state == LinkState::Ready {
            if let Some(update) = bus.outbox.try_recv() {
                let path = update.path();
                let text = envelope::encode(
                    &self.identity.device_id,
                    METHOD_MUTATION,
                    path,
                    update.payload(&self.identity.device_id),
                );
                match self.transport.send_text(&text) {
                    Ok(n) => info!("{METHOD_MUTATION} --> {path} = {n} bytes"),
                    Err(e) => {
                        warn!("send to backend failed: {e:?}");
                        self.drop_link(bus, "send failure");
                        return;
                    }
                }
            }
        }

        if self.last_inbound.elapsed() >= millis(self.cfg.idle_disconnect_ms) {
            self.drop_link(bus, "idle timeout");
        }
    }

    // ── Inbound ───────────────────────────────────────────────

    fn pump_inbound(&mut self, bus: &Bus) {
        loop {
            match self.transport.poll_frame() {
                Ok(None) => break,
                Ok(Some(Frame::Pong)) => {
                    self.last_inbound = Instant::now();
                }
                Ok(Some(Frame::Text(text))) => {
                    self.last_inbound = Instant::now();
                    self.handle_text(&text, bus);
                }
                Err(e) => {
                    warn!("transport read error: {e:?}");
                    self.drop_link(bus, "read failure");
                    break;
                }
            }
        }
    }

    fn handle_text(&mut self, text: &str, bus: &Bus) {
        let reply = match envelope::parse_reply(text) {
            Ok(r) => r,
            Err(e) => {
                warn!("dropping inbound message: {e}");
                return;
            }
        };

        if let Some(err) = &reply.error {
            // At-most-once: the triggering call is not retried.
            error!("server error: {err}");
            return;
        }

        let Some(id) = reply.id.as_deref() else {
            warn!("reply without id, dropped");
            return;
        };
        let path = match envelope::split_id(id) {
            Ok((_, path)) => path,
            Err(e) => {
                warn!("{e}: {id:?}");
                return;
            }
        };

        match path {
            paths::REGISTER => {
                if self.state != LinkState::Ready {
                    info!("registration acknowledged");
                    bus.status.set(status::REGISTERED);
                    self.state = LinkState::Ready;
                }
            }
            paths::SET_RECIPE => match reply.payload() {
                Some(payload) => match recipe::decode(payload) {
                    Ok(job) => {
                        info!("job assignment received: {}", job.job_id);
                        bus.jobs.publish(job);
                    }
                    Err(e) => warn!("{e}, assignment dropped"),
                },
                None => warn!("assignment reply without payload, dropped"),
            },
            other => debug!("unhandled reply path: {other}"),
        }
    }

    // ── Outbound ──────────────────────────────────────────────

    fn send_register(&mut self) {
        let payload = registration_payload(
            &self.identity.device_id,
            &self.identity.name,
            &self.identity.pairing_id,
        );
        let text = envelope::encode(
            &self.identity.device_id,
            METHOD_MUTATION,
            paths::REGISTER,
            payload,
        );
        match self.transport.send_text(&text) {
            Ok(n) => info!("{} --> {} = {} bytes", METHOD_MUTATION, paths::REGISTER, n),
            Err(e) => warn!("registration send failed: {e:?}"),
        }
        self.last_register = Instant::now();
    }

    fn drop_link(&mut self, bus: &Bus, reason: &str) {
        info!("closing backend connection: {reason}");
        self.transport.disconnect();
        bus.status.clear(status::CONNECTION_READY | status::REGISTERED);
        self.state = LinkState::Disconnected;
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
