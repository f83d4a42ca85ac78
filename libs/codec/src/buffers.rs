//! Thread-Local Encode Buffers
//!
//! Producers encode on every message. [`with_encoded`] reuses one buffer per
//! thread so the steady state allocates nothing:
//!
//! ```text
//! Thread A: [encode buffer] ──encode_into──→ &[u8] ──→ caller copies/sends
//! Thread B: [encode buffer]   (independent, no contention)
//! ```
//!
//! The closure sees the encoded bytes only for the duration of the call.
//! Re-entrant use from inside the closure on the same thread is reported as
//! [`BufferError::AlreadyBorrowed`].

use std::cell::RefCell;

use fix_types::Message;

use crate::constants::TYPICAL_MESSAGE_SIZE;
use crate::encoder::encode_into;

/// Initial capacity of each thread's buffer
const ENCODE_BUFFER_SIZE: usize = 4 * TYPICAL_MESSAGE_SIZE;

/// Buffers that grew past this are shrunk back after use
const ENCODE_BUFFER_RETAIN_LIMIT: usize = 64 * 1024;

thread_local! {
    static ENCODE_BUFFER: RefCell<Vec<u8>> = RefCell::new(Vec::with_capacity(ENCODE_BUFFER_SIZE));
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum BufferError {
    #[error("Encode buffer already borrowed (re-entrant use on this thread)")]
    AlreadyBorrowed,
}

/// Encode `message` into this thread's buffer and pass the bytes to `f`
pub fn with_encoded<T, F>(message: &Message, f: F) -> Result<T, BufferError>
where
    F: FnOnce(&[u8]) -> T,
{
    ENCODE_BUFFER.with(|cell| {
        let mut buffer = cell.try_borrow_mut().map_err(|_| BufferError::AlreadyBorrowed)?;

        buffer.clear();
        encode_into(message, &mut buffer);
        let result = f(&buffer);

        if buffer.capacity() > ENCODE_BUFFER_RETAIN_LIMIT {
            buffer.clear();
            buffer.shrink_to(ENCODE_BUFFER_SIZE);
        }
        Ok(result)
    })
}
