//! # FIX Message Types
//!
//! ## Purpose
//!
//! Pure data structures for one FIX message, shared by the codec, the queue
//! and whatever session/business layer sits above them:
//! - [`Message`]: header fields, ascending-ordered body fields, latency stamp
//! - [`MessageBuilder`]: the only way to construct a [`Message`]
//! - [`tags`]: well-known tag numbers and message type codes
//! - [`time`]: `SendingTime` representation and the `yyyyMMdd-HH:mm:ss.fff` format
//!
//! ## Architecture Role
//!
//! ```text
//! [fix-types] → fix-codec → message-queue
//!     ↑             ↓             ↓
//! Pure Data    Wire Rules     Transit
//! Message      encode/decode  LockFreeQueue
//! ```
//!
//! ## What This Crate Does NOT Contain
//! - Wire encoding, checksum or parsing rules (belong in fix-codec)
//! - Session semantics: sequence gaps, resend, heartbeats

pub mod error;
pub mod message;
pub mod tags;
pub mod time;

pub use error::MessageError;
pub use message::{Message, MessageBuilder};
pub use time::{format_sending_time, now_sending_time, parse_sending_time, SendingTime};
