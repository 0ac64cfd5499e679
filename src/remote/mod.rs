//! Remote messaging subsystem.
//!
//! One persistent backend connection, owned by the client task:
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                    Remote client                          │
//! │                                                           │
//! │  ┌───────────┐   ┌──────────┐   ┌─────────────────────┐  │
//! │  │ Transport │──▶│ Envelope │──▶│  Dispatch            │  │
//! │  │ (trait)   │   │ (corr.)  │   │  → job slot / flags  │  │
//! │  └───────────┘   └──────────┘   └─────────────────────┘  │
//! │        ▲                                                  │
//! │        │            ┌──────────┐   ┌──────────────────┐  │
//! │        └────────────│ Envelope │◀──│ Outbox (updates) │  │
//! │                     └──────────┘   └──────────────────┘  │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! Multiplexes outbound status updates, demultiplexes inbound commands, and
//! manages the connect / register / idle-disconnect lifecycle.

pub mod client;
pub mod envelope;
pub mod transport;
pub mod update;
