//! # FIX Decoder
//!
//! Parses tag-value bytes into a [`Message`]. Decoding is permissive by
//! default: a token that cannot be read is skipped and reported, never
//! fatal.
//!
//! ## Pipeline
//!
//! ```text
//! bytes ──normalize SOH──→ split on SOH ──→ tag=value ──→ header | trailer | body
//!           (Cow)            (empty dropped)   (bad → skipped)
//! ```
//!
//! - Corrupted SOH substitutes (U+FFFD, U+2401) are rewritten to SOH first;
//!   input without them is borrowed, not copied.
//! - Header tags 8, 35, 49, 56, 34, 52, 43, 122 fill header fields.
//! - CheckSum (10) is consumed and, under [`ChecksumValidation::Verify`],
//!   checked against the bytes preceding it.
//! - Everything else, BodyLength (9) included, becomes a body field.
//!
//! The decoded message is stamped with a hardware timestamp when decoding
//! starts.

use std::borrow::Cow;

use fix_types::{parse_sending_time, tags, Message, MessageBuilder};
use tracing::{debug, trace};

use crate::checksum::verify_checksum;
use crate::constants::{
    EQUALS, SOH, SOH_SUBSTITUTE_CONTROL_PICTURE, SOH_SUBSTITUTE_REPLACEMENT,
};
use crate::error::{CodecError, CodecResult};
use crate::policy::{ChecksumValidation, DecodePolicy};

/// Result of a decode that also reports what was skipped
#[derive(Debug, Clone)]
pub struct DecodeOutcome {
    pub message: Message,
    /// Soft [`CodecError::MalformedField`] entries in input order
    pub skipped: Vec<CodecError>,
    /// Whether corrupted SOH substitutes were rewritten
    pub normalized: bool,
}

/// Decode with the default permissive policy
pub fn decode(bytes: &[u8]) -> CodecResult<Message> {
    Decoder::default().decode(bytes)
}

/// Reusable decoder bound to a [`DecodePolicy`]
#[derive(Debug, Clone, Copy, Default)]
pub struct Decoder {
    policy: DecodePolicy,
}

impl Decoder {
    pub const fn new(policy: DecodePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> DecodePolicy {
        self.policy
    }

    pub fn decode(&self, bytes: &[u8]) -> CodecResult<Message> {
        self.decode_detailed(bytes).map(|outcome| outcome.message)
    }

    pub fn decode_detailed(&self, bytes: &[u8]) -> CodecResult<DecodeOutcome> {
        if bytes.is_empty() {
            return Err(CodecError::EmptyMessage);
        }

        let received_at = hotpath::high_resolution_timestamp_ns();
        let input = normalize_soh(bytes);
        let normalized = matches!(input, Cow::Owned(_));

        let mut builder = MessageBuilder::default();
        builder.hardware_timestamp(received_at);

        let mut skipped = Vec::new();
        // (offset of the `10=` token, declared value)
        let mut trailer: Option<(usize, &[u8])> = None;

        let mut offset = 0;
        for token in input.split(|&b| b == SOH) {
            let token_start = offset;
            offset += token.len() + 1;

            if token.is_empty() {
                continue;
            }

            let Some(eq) = memchr::memchr(EQUALS, token) else {
                skipped.push(CodecError::malformed_field(token_start, token, "missing '='"));
                continue;
            };
            let Some(tag) = parse_decimal(&token[..eq]) else {
                skipped.push(CodecError::malformed_field(token_start, token, "non-numeric tag"));
                continue;
            };
            let value = &token[eq + 1..];

            match tag {
                tags::BEGIN_STRING => {
                    builder.begin_string(text(value));
                }
                tags::MSG_TYPE => {
                    builder.msg_type(text(value));
                }
                tags::SENDER_COMP_ID => {
                    builder.sender_comp_id(text(value));
                }
                tags::TARGET_COMP_ID => {
                    builder.target_comp_id(text(value));
                }
                tags::MSG_SEQ_NUM => match parse_decimal(value) {
                    Some(seq) => {
                        builder.msg_seq_num(seq);
                    }
                    None => skipped.push(CodecError::malformed_field(
                        token_start,
                        token,
                        "MsgSeqNum is not a decimal integer",
                    )),
                },
                tags::SENDING_TIME => match parse_timestamp(value) {
                    Some(time) => {
                        builder.sending_time(time);
                    }
                    None => skipped.push(CodecError::malformed_field(
                        token_start,
                        token,
                        "SendingTime is not a UTCTimestamp",
                    )),
                },
                tags::ORIG_SENDING_TIME => match parse_timestamp(value) {
                    Some(time) => {
                        builder.orig_sending_time(time);
                    }
                    None => skipped.push(CodecError::malformed_field(
                        token_start,
                        token,
                        "OrigSendingTime is not a UTCTimestamp",
                    )),
                },
                tags::POSS_DUP_FLAG => match value {
                    b"Y" => {
                        builder.poss_dup_flag(true);
                    }
                    b"N" => {
                        builder.poss_dup_flag(false);
                    }
                    _ => skipped.push(CodecError::malformed_field(
                        token_start,
                        token,
                        "PossDupFlag is not Y or N",
                    )),
                },
                tags::CHECKSUM => {
                    trailer = Some((token_start, value));
                }
                _ => {
                    if self.policy.rejects_duplicates() && builder.has_field(tag) {
                        debug!(tag, "Rejecting message with duplicate body tag");
                        return Err(CodecError::DuplicateTag { tag });
                    }
                    builder.field(tag, text(value));
                }
            }
        }

        if self.policy.checksum == ChecksumValidation::Verify {
            let (checksum_offset, declared) = trailer.ok_or(CodecError::MissingChecksum)?;
            verify_checksum(&input[..checksum_offset], declared).map_err(|computed| {
                CodecError::ChecksumMismatch {
                    declared: String::from_utf8_lossy(declared).into_owned(),
                    computed,
                }
            })?;
        }

        if !skipped.is_empty() {
            debug!(
                skipped = skipped.len(),
                first = %skipped[0],
                "Skipped malformed fields while decoding"
            );
        }
        if normalized {
            trace!("Rewrote corrupted SOH substitutes before decoding");
        }

        Ok(DecodeOutcome {
            message: builder.build(),
            skipped,
            normalized,
        })
    }
}

/// Replace corrupted SOH substitutes with SOH, borrowing when none are present
pub fn normalize_soh(bytes: &[u8]) -> Cow<'_, [u8]> {
    let lead_replacement = SOH_SUBSTITUTE_REPLACEMENT[0];
    let lead_picture = SOH_SUBSTITUTE_CONTROL_PICTURE[0];

    let first = memchr::memchr2_iter(lead_replacement, lead_picture, bytes)
        .find(|&i| substitute_at(bytes, i).is_some());
    let Some(first) = first else {
        return Cow::Borrowed(bytes);
    };

    let mut out = Vec::with_capacity(bytes.len());
    out.extend_from_slice(&bytes[..first]);

    let mut i = first;
    while i < bytes.len() {
        match substitute_at(bytes, i) {
            Some(width) => {
                out.push(SOH);
                i += width;
            }
            None => {
                out.push(bytes[i]);
                i += 1;
            }
        }
    }
    Cow::Owned(out)
}

#[inline]
fn substitute_at(bytes: &[u8], i: usize) -> Option<usize> {
    let rest = &bytes[i..];
    [SOH_SUBSTITUTE_REPLACEMENT, SOH_SUBSTITUTE_CONTROL_PICTURE]
        .into_iter()
        .find(|pattern| rest.starts_with(pattern))
        .map(<[u8]>::len)
}

/// Unsigned decimal with no sign, whitespace or empty input
fn parse_decimal(bytes: &[u8]) -> Option<u32> {
    if bytes.is_empty() {
        return None;
    }
    bytes.iter().try_fold(0u32, |acc, &b| {
        if !b.is_ascii_digit() {
            return None;
        }
        acc.checked_mul(10)?.checked_add(u32::from(b - b'0'))
    })
}

fn parse_timestamp(value: &[u8]) -> Option<fix_types::SendingTime> {
    std::str::from_utf8(value).ok().and_then(parse_sending_time)
}

fn text(value: &[u8]) -> String {
    String::from_utf8_lossy(value).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::DuplicateTagPolicy;

    fn wire(s: &str) -> Vec<u8> {
        s.replace('|', "\x01").into_bytes()
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal(b"0"), Some(0));
        assert_eq!(parse_decimal(b"4294967295"), Some(u32::MAX));
        assert_eq!(parse_decimal(b"4294967296"), None);
        assert_eq!(parse_decimal(b""), None);
        assert_eq!(parse_decimal(b"-1"), None);
        assert_eq!(parse_decimal(b"12a"), None);
    }

    #[test]
    fn test_normalize_borrows_clean_input() {
        let clean = wire("8=FIX.4.2|35=0|");
        assert!(matches!(normalize_soh(&clean), Cow::Borrowed(_)));
    }

    #[test]
    fn test_normalize_rewrites_both_substitutes() {
        let corrupted = "8=FIX.4.2\u{FFFD}35=0\u{2401}49=A\x01".as_bytes();
        let normalized = normalize_soh(corrupted);
        assert_eq!(&normalized[..], b"8=FIX.4.2\x0135=0\x0149=A\x01");
    }

    #[test]
    fn test_normalize_keeps_other_multibyte_text() {
        let text = "58=caf\u{e9} \u{20ac}|".replace('|', "\x01");
        assert!(matches!(normalize_soh(text.as_bytes()), Cow::Borrowed(_)));
    }

    #[test]
    fn test_header_and_body_routing() {
        let msg = decode(&wire(
            "8=FIX.4.4|9=42|35=8|49=S|56=T|34=9|52=20240102-03:04:05.006|43=N|55=IBM|10=000|",
        ))
        .unwrap();

        assert_eq!(msg.begin_string(), "FIX.4.4");
        assert_eq!(msg.msg_type(), "8");
        assert_eq!(msg.sender_comp_id(), "S");
        assert_eq!(msg.target_comp_id(), "T");
        assert_eq!(msg.msg_seq_num(), 9);
        assert_eq!(msg.poss_dup_flag(), Some(false));
        assert_eq!(msg.field(tags::BODY_LENGTH), Some("42"));
        assert_eq!(msg.field(tags::SYMBOL), Some("IBM"));
        assert_eq!(msg.field(tags::CHECKSUM), None);
        assert!(msg.hardware_timestamp() > 0);
    }

    #[test]
    fn test_skipped_tokens_reported() {
        let outcome = Decoder::default()
            .decode_detailed(&wire("8=FIX.4.2|garbage|x=1|34=abc|55=MSFT|"))
            .unwrap();

        assert_eq!(outcome.message.field(tags::SYMBOL), Some("MSFT"));
        assert_eq!(outcome.message.msg_seq_num(), 0);
        assert_eq!(outcome.skipped.len(), 3);
        assert!(outcome.skipped.iter().all(CodecError::is_soft));
        assert!(!outcome.normalized);
    }

    #[test]
    fn test_skipped_offsets_point_at_token() {
        let input = wire("8=X|bad|");
        let outcome = Decoder::default().decode_detailed(&input).unwrap();
        match &outcome.skipped[0] {
            CodecError::MalformedField { offset, token, .. } => {
                assert_eq!(*offset, 4);
                assert_eq!(token, "bad");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_empty_value_kept() {
        let msg = decode(&wire("8=FIX.4.2|58=|")).unwrap();
        assert_eq!(msg.field(58), Some(""));
    }

    #[test]
    fn test_value_may_contain_equals() {
        let msg = decode(&wire("8=FIX.4.2|58=a=b|")).unwrap();
        assert_eq!(msg.field(58), Some("a=b"));
    }

    #[test]
    fn test_duplicate_policy() {
        let input = wire("8=FIX.4.2|55=AAPL|55=MSFT|");
        assert_eq!(decode(&input).unwrap().field(55), Some("MSFT"));

        let strict = Decoder::new(DecodePolicy {
            duplicate_tags: DuplicateTagPolicy::Reject,
            ..DecodePolicy::default()
        });
        assert_eq!(strict.decode(&input), Err(CodecError::DuplicateTag { tag: 55 }));
    }

    #[test]
    fn test_duplicate_header_tag_not_rejected() {
        let strict = Decoder::new(DecodePolicy::from_flags(false, true));
        let msg = strict.decode(&wire("35=0|35=A|")).unwrap();
        assert_eq!(msg.msg_type(), "A");
    }

    #[test]
    fn test_missing_sending_time_is_epoch() {
        let msg = decode(&wire("8=FIX.4.2|35=0|")).unwrap();
        assert_eq!(msg.sending_time(), fix_types::SendingTime::default());
    }

    #[test]
    fn test_verify_requires_checksum() {
        let verifying = Decoder::new(DecodePolicy::from_flags(true, false));
        assert_eq!(
            verifying.decode(&wire("8=FIX.4.2|35=0|")),
            Err(CodecError::MissingChecksum)
        );
    }
}
