//! # FIX Encoder
//!
//! Serialises a [`Message`] to tag-value bytes in a fixed order:
//!
//! ```text
//! 8 | 35 | 49 | 56 | 34 | 52 | [43] | [122] | body fields ascending | 10
//! ```
//!
//! Every field is `tag=value<SOH>`. BodyLength (9) is not emitted. The
//! trailer is `10=NNN<SOH>` where NNN is the zero-padded checksum of every
//! byte written before it. Output is a pure function of the message, so the
//! same message always encodes to the same bytes.

use chrono::{Datelike, Timelike};
use fix_types::{tags, Message, SendingTime};

use crate::checksum::checksum;
use crate::constants::{CHECKSUM_TRAILER_LEN, EQUALS, SOH};

/// Encode into a freshly allocated buffer
pub fn encode(message: &Message) -> Vec<u8> {
    let mut out = Vec::with_capacity(encoded_len_hint(message));
    encode_into(message, &mut out);
    out
}

/// Append the encoded message to `out`, returning the number of bytes written
///
/// Existing content of `out` is left untouched and excluded from the
/// checksum, so several messages can be framed back to back in one buffer.
pub fn encode_into(message: &Message, out: &mut Vec<u8>) -> usize {
    let start = out.len();

    put_field(out, tags::BEGIN_STRING, message.begin_string().as_bytes());
    put_field(out, tags::MSG_TYPE, message.msg_type().as_bytes());
    put_field(out, tags::SENDER_COMP_ID, message.sender_comp_id().as_bytes());
    put_field(out, tags::TARGET_COMP_ID, message.target_comp_id().as_bytes());

    put_tag(out, tags::MSG_SEQ_NUM);
    put_decimal(out, message.msg_seq_num());
    out.push(SOH);

    put_timestamp_field(out, tags::SENDING_TIME, &message.sending_time());

    if let Some(flag) = message.poss_dup_flag() {
        put_field(out, tags::POSS_DUP_FLAG, if flag { b"Y" } else { b"N" });
    }
    if let Some(orig) = message.orig_sending_time() {
        put_timestamp_field(out, tags::ORIG_SENDING_TIME, &orig);
    }

    for (&tag, value) in message.fields() {
        put_field(out, tag, value.as_bytes());
    }

    let sum = checksum(&out[start..]);
    put_tag(out, tags::CHECKSUM);
    put_padded(out, u32::from(sum), 3);
    out.push(SOH);

    out.len() - start
}

/// Size estimate for pre-sizing output buffers
pub fn encoded_len_hint(message: &Message) -> usize {
    // tag digits, '=' and SOH
    const FIELD_OVERHEAD: usize = 8;
    // seq num, both timestamps, PossDupFlag
    const FIXED_HEADER: usize = 72;

    let header = message.begin_string().len()
        + message.msg_type().len()
        + message.sender_comp_id().len()
        + message.target_comp_id().len()
        + 4 * FIELD_OVERHEAD;
    let body: usize = message
        .fields()
        .values()
        .map(|value| value.len() + FIELD_OVERHEAD)
        .sum();

    header + body + FIXED_HEADER + CHECKSUM_TRAILER_LEN
}

#[inline]
fn put_field(out: &mut Vec<u8>, tag: u32, value: &[u8]) {
    put_tag(out, tag);
    out.extend_from_slice(value);
    out.push(SOH);
}

#[inline]
fn put_tag(out: &mut Vec<u8>, tag: u32) {
    put_decimal(out, tag);
    out.push(EQUALS);
}

/// `yyyyMMdd-HH:mm:ss.fff`
fn put_timestamp_field(out: &mut Vec<u8>, tag: u32, time: &SendingTime) {
    put_tag(out, tag);
    put_padded(out, time.year().max(0) as u32, 4);
    put_padded(out, time.month(), 2);
    put_padded(out, time.day(), 2);
    out.push(b'-');
    put_padded(out, time.hour(), 2);
    out.push(b':');
    put_padded(out, time.minute(), 2);
    out.push(b':');
    // leap-second representation carries nanos >= 1e9
    put_padded(out, time.second(), 2);
    out.push(b'.');
    put_padded(out, (time.nanosecond() % 1_000_000_000) / 1_000_000, 3);
    out.push(SOH);
}

fn put_decimal(out: &mut Vec<u8>, value: u32) {
    let mut digits = [0u8; 10];
    let mut pos = digits.len();
    let mut rest = value;
    loop {
        pos -= 1;
        digits[pos] = b'0' + (rest % 10) as u8;
        rest /= 10;
        if rest == 0 {
            break;
        }
    }
    out.extend_from_slice(&digits[pos..]);
}

/// Decimal with leading zeros up to `width`; wider values are written in full
fn put_padded(out: &mut Vec<u8>, value: u32, width: usize) {
    let mut digits = [0u8; 10];
    let mut pos = digits.len();
    let mut rest = value;
    while rest > 0 || digits.len() - pos < width {
        pos -= 1;
        digits[pos] = b'0' + (rest % 10) as u8;
        rest /= 10;
    }
    out.extend_from_slice(&digits[pos..]);
}
