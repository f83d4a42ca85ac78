//! # FIX Codec
//!
//! ## Purpose
//!
//! Wire rules for FIX tag-value messages: deterministic encoding, permissive
//! decoding and the byte-sum checksum with a runtime-selected vector path.
//!
//! ## Architecture Role
//!
//! ```text
//! fix-types → [fix-codec] → message-queue
//!     ↑             ↓             ↓
//!  Message     encode/decode   PooledWrapper
//!              checksum        LockFreeQueue
//! ```
//!
//! ## Wire Format
//!
//! `tag=value<SOH>` fields; header `8, 35, 49, 56, 34, 52, [43], [122]`,
//! body fields ascending by tag, trailer `10=NNN<SOH>`. BodyLength (9) is
//! not emitted on encode.
//!
//! ## Quick Start
//!
//! ```rust
//! use fix_codec::{decode, encode};
//! use fix_types::{tags, Message};
//!
//! let msg = Message::builder("FIX.4.2", "D")
//!     .sender_comp_id("BUYER")
//!     .target_comp_id("SELLER")
//!     .msg_seq_num(1)
//!     .field(tags::SYMBOL, "AAPL")
//!     .build();
//!
//! let bytes = encode(&msg);
//! let back = decode(&bytes).unwrap();
//! assert_eq!(back, msg);
//! ```
//!
//! ## Decoding Policy
//!
//! [`decode`] never fails on malformed tokens; it skips them. Use
//! [`Decoder::decode_detailed`] to see what was skipped, and
//! [`DecodePolicy`] to turn on checksum verification or duplicate-tag
//! rejection.

pub mod buffers;
pub mod checksum;
pub mod constants;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod policy;

pub use buffers::{with_encoded, BufferError};
pub use checksum::{
    checksum, checksum_strategy, scalar_checksum, simd_checksum, verify_checksum,
    ChecksumStrategy,
};
pub use constants::SOH;
pub use decoder::{decode, normalize_soh, DecodeOutcome, Decoder};
pub use encoder::{encode, encode_into, encoded_len_hint};
pub use error::{CodecError, CodecResult};
pub use policy::{ChecksumValidation, DecodePolicy, DuplicateTagPolicy};
