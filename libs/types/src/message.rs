//! # FIX Message
//!
//! ## Purpose
//!
//! One FIX message as the pipeline sees it: the standard header, body fields
//! keyed by tag in ascending order, and a hardware timestamp used only for
//! latency measurement.
//!
//! ## Ownership
//!
//! ```text
//! MessageBuilder ──build()──→ Message ──enqueue──→ [queue] ──dequeue──→ consumer
//!   (mutable)                (immutable)            owns it              owns it, drops it
//! ```
//!
//! A [`Message`] has no setters. Once built it is moved, never shared
//! mutably; the queue transfers ownership from producer to consumer.
//! To change a message, turn it back into a builder with
//! [`Message::into_builder`].
//!
//! ## Field Ordering
//!
//! Body fields live in a `BTreeMap`, so iteration is ascending by tag and the
//! encoded form is deterministic regardless of insertion order.

use crate::error::MessageError;
use crate::tags;
use crate::time::{now_sending_time, parse_sending_time, SendingTime};
use chrono::SubsecRound;
use std::collections::BTreeMap;
use std::mem;

/// An immutable FIX message
#[derive(Debug, Clone)]
pub struct Message {
    begin_string: String,
    msg_type: String,
    msg_seq_num: u32,
    sender_comp_id: String,
    target_comp_id: String,
    sending_time: SendingTime,
    poss_dup_flag: Option<bool>,
    orig_sending_time: Option<SendingTime>,
    fields: BTreeMap<u32, String>,
    hardware_timestamp: i64,
}

impl Message {
    /// Start a builder with the two fields every message needs
    pub fn builder(begin_string: impl Into<String>, msg_type: impl Into<String>) -> MessageBuilder {
        MessageBuilder::new(begin_string, msg_type)
    }

    pub fn begin_string(&self) -> &str {
        &self.begin_string
    }

    pub fn msg_type(&self) -> &str {
        &self.msg_type
    }

    pub fn msg_seq_num(&self) -> u32 {
        self.msg_seq_num
    }

    pub fn sender_comp_id(&self) -> &str {
        &self.sender_comp_id
    }

    pub fn target_comp_id(&self) -> &str {
        &self.target_comp_id
    }

    pub fn sending_time(&self) -> SendingTime {
        self.sending_time
    }

    /// PossDupFlag (43), present only when set on the wire or by the builder
    pub fn poss_dup_flag(&self) -> Option<bool> {
        self.poss_dup_flag
    }

    /// OrigSendingTime (122)
    pub fn orig_sending_time(&self) -> Option<SendingTime> {
        self.orig_sending_time
    }

    /// Body fields in ascending tag order
    pub fn fields(&self) -> &BTreeMap<u32, String> {
        &self.fields
    }

    /// Value of a body field
    pub fn field(&self, tag: u32) -> Option<&str> {
        self.fields.get(&tag).map(String::as_str)
    }

    /// Nanosecond monotonic stamp taken at decode or construction; never transmitted
    pub fn hardware_timestamp(&self) -> i64 {
        self.hardware_timestamp
    }

    /// Check the header fields required for a well-formed message
    pub fn validate(&self) -> Result<(), MessageError> {
        let required = [
            (tags::BEGIN_STRING, "BeginString", &self.begin_string),
            (tags::MSG_TYPE, "MsgType", &self.msg_type),
            (tags::SENDER_COMP_ID, "SenderCompID", &self.sender_comp_id),
            (tags::TARGET_COMP_ID, "TargetCompID", &self.target_comp_id),
        ];

        for (tag, name, value) in required {
            if value.is_empty() {
                return Err(MessageError::MissingHeaderField { tag, name });
            }
        }
        Ok(())
    }

    /// Reopen the message for modification
    ///
    /// The hardware timestamp is carried over; call
    /// [`MessageBuilder::hardware_timestamp`] to restamp.
    pub fn into_builder(self) -> MessageBuilder {
        MessageBuilder {
            begin_string: self.begin_string,
            msg_type: self.msg_type,
            msg_seq_num: self.msg_seq_num,
            sender_comp_id: self.sender_comp_id,
            target_comp_id: self.target_comp_id,
            sending_time: Some(self.sending_time),
            poss_dup_flag: self.poss_dup_flag,
            orig_sending_time: self.orig_sending_time,
            fields: self.fields,
            hardware_timestamp: Some(self.hardware_timestamp),
        }
    }
}

/// Equality over wire content; the hardware timestamp is local and ignored
impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        self.begin_string == other.begin_string
            && self.msg_type == other.msg_type
            && self.msg_seq_num == other.msg_seq_num
            && self.sender_comp_id == other.sender_comp_id
            && self.target_comp_id == other.target_comp_id
            && self.sending_time == other.sending_time
            && self.poss_dup_flag == other.poss_dup_flag
            && self.orig_sending_time == other.orig_sending_time
            && self.fields == other.fields
    }
}

impl Eq for Message {}

/// Mutable staging area for a [`Message`]
///
/// Setters take `&mut self` so the builder works both chained and inside a
/// parse loop. [`build`](Self::build) moves the staged values out, leaving
/// the builder empty and reusable.
///
/// ```rust
/// use fix_types::{tags, Message};
///
/// let msg = Message::builder("FIX.4.2", "D")
///     .sender_comp_id("BUYER")
///     .target_comp_id("SELLER")
///     .msg_seq_num(1)
///     .field(tags::SYMBOL, "AAPL")
///     .build();
///
/// assert_eq!(msg.field(tags::SYMBOL), Some("AAPL"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MessageBuilder {
    begin_string: String,
    msg_type: String,
    msg_seq_num: u32,
    sender_comp_id: String,
    target_comp_id: String,
    sending_time: Option<SendingTime>,
    poss_dup_flag: Option<bool>,
    orig_sending_time: Option<SendingTime>,
    fields: BTreeMap<u32, String>,
    hardware_timestamp: Option<i64>,
}

impl MessageBuilder {
    /// Outbound builder, SendingTime defaults to now
    pub fn new(begin_string: impl Into<String>, msg_type: impl Into<String>) -> Self {
        Self {
            begin_string: begin_string.into(),
            msg_type: msg_type.into(),
            sending_time: Some(now_sending_time()),
            ..Self::default()
        }
    }

    pub fn begin_string(&mut self, value: impl Into<String>) -> &mut Self {
        self.begin_string = value.into();
        self
    }

    pub fn msg_type(&mut self, value: impl Into<String>) -> &mut Self {
        self.msg_type = value.into();
        self
    }

    pub fn msg_seq_num(&mut self, value: u32) -> &mut Self {
        self.msg_seq_num = value;
        self
    }

    pub fn sender_comp_id(&mut self, value: impl Into<String>) -> &mut Self {
        self.sender_comp_id = value.into();
        self
    }

    pub fn target_comp_id(&mut self, value: impl Into<String>) -> &mut Self {
        self.target_comp_id = value.into();
        self
    }

    /// Truncated to milliseconds, the precision carried on the wire
    pub fn sending_time(&mut self, value: SendingTime) -> &mut Self {
        self.sending_time = Some(value.trunc_subsecs(3));
        self
    }

    pub fn poss_dup_flag(&mut self, value: bool) -> &mut Self {
        self.poss_dup_flag = Some(value);
        self
    }

    pub fn orig_sending_time(&mut self, value: SendingTime) -> &mut Self {
        self.orig_sending_time = Some(value.trunc_subsecs(3));
        self
    }

    pub fn hardware_timestamp(&mut self, value: i64) -> &mut Self {
        self.hardware_timestamp = Some(value);
        self
    }

    /// Set a body field, replacing any earlier value for the same tag
    ///
    /// Header tags are routed to their dedicated setters, the way a decoder
    /// would read them back. Values those setters cannot represent are
    /// ignored, as is CheckSum (10), which the encoder always computes. Use
    /// [`try_field`](Self::try_field) for checked insertion.
    pub fn field(&mut self, tag: u32, value: impl Into<String>) -> &mut Self {
        let value = value.into();
        if tags::is_reserved(tag) {
            return self.header_field(tag, value);
        }
        self.fields.insert(tag, value);
        self
    }

    fn header_field(&mut self, tag: u32, value: String) -> &mut Self {
        match tag {
            tags::BEGIN_STRING => self.begin_string(value),
            tags::MSG_TYPE => self.msg_type(value),
            tags::SENDER_COMP_ID => self.sender_comp_id(value),
            tags::TARGET_COMP_ID => self.target_comp_id(value),
            tags::MSG_SEQ_NUM => match value.parse() {
                Ok(seq) => self.msg_seq_num(seq),
                Err(_) => self,
            },
            tags::SENDING_TIME => match parse_sending_time(&value) {
                Some(time) => self.sending_time(time),
                None => self,
            },
            tags::ORIG_SENDING_TIME => match parse_sending_time(&value) {
                Some(time) => self.orig_sending_time(time),
                None => self,
            },
            tags::POSS_DUP_FLAG => match value.as_str() {
                "Y" => self.poss_dup_flag(true),
                "N" => self.poss_dup_flag(false),
                _ => self,
            },
            _ => self,
        }
    }

    /// Set a body field, rejecting reserved tags and tags already present
    pub fn try_field(&mut self, tag: u32, value: impl Into<String>) -> Result<&mut Self, MessageError> {
        if tags::is_reserved(tag) {
            return Err(MessageError::ReservedTag { tag });
        }
        if self.fields.contains_key(&tag) {
            return Err(MessageError::DuplicateTag { tag });
        }
        self.fields.insert(tag, value.into());
        Ok(self)
    }

    pub fn has_field(&self, tag: u32) -> bool {
        self.fields.contains_key(&tag)
    }

    /// Freeze the staged values into a [`Message`]
    ///
    /// Stamps the hardware timestamp now if none was set. A builder from
    /// `Default` with no SendingTime yields the Unix epoch.
    pub fn build(&mut self) -> Message {
        let staged = mem::take(self);
        Message {
            begin_string: staged.begin_string,
            msg_type: staged.msg_type,
            msg_seq_num: staged.msg_seq_num,
            sender_comp_id: staged.sender_comp_id,
            target_comp_id: staged.target_comp_id,
            sending_time: staged.sending_time.unwrap_or_default(),
            poss_dup_flag: staged.poss_dup_flag,
            orig_sending_time: staged.orig_sending_time,
            fields: staged.fields,
            hardware_timestamp: staged
                .hardware_timestamp
                .unwrap_or_else(hotpath::high_resolution_timestamp_ns),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags;

    fn order() -> Message {
        Message::builder("FIX.4.2", tags::msg_type::NEW_ORDER_SINGLE)
            .sender_comp_id("BUYER")
            .target_comp_id("SELLER")
            .msg_seq_num(1)
            .field(tags::SYMBOL, "AAPL")
            .field(tags::SIDE, "1")
            .build()
    }

    #[test]
    fn test_builder_populates_header() {
        let msg = order();
        assert_eq!(msg.begin_string(), "FIX.4.2");
        assert_eq!(msg.msg_type(), "D");
        assert_eq!(msg.sender_comp_id(), "BUYER");
        assert_eq!(msg.target_comp_id(), "SELLER");
        assert_eq!(msg.msg_seq_num(), 1);
        assert_eq!(msg.poss_dup_flag(), None);
        assert!(msg.validate().is_ok());
    }

    #[test]
    fn test_fields_iterate_in_tag_order() {
        let msg = Message::builder("FIX.4.4", "D")
            .field(55, "MSFT")
            .field(11, "ORD-1")
            .field(38, "100")
            .build();

        let order: Vec<u32> = msg.fields().keys().copied().collect();
        assert_eq!(order, vec![11, 38, 55]);
    }

    #[test]
    fn test_field_last_write_wins() {
        let msg = Message::builder("FIX.4.4", "D")
            .field(tags::SYMBOL, "AAPL")
            .field(tags::SYMBOL, "MSFT")
            .build();
        assert_eq!(msg.field(tags::SYMBOL), Some("MSFT"));
        assert_eq!(msg.fields().len(), 1);
    }

    #[test]
    fn test_field_routes_header_tags() {
        let msg = Message::builder("FIX.4.2", "D")
            .sender_comp_id("BUYER")
            .field(tags::SENDER_COMP_ID, "OTHER")
            .field(tags::MSG_SEQ_NUM, "12")
            .field(tags::POSS_DUP_FLAG, "Y")
            .field(tags::SENDING_TIME, "20240102-03:04:05.006")
            .field(tags::CHECKSUM, "abc")
            .field(tags::SYMBOL, "AAPL")
            .build();

        assert_eq!(msg.sender_comp_id(), "OTHER");
        assert_eq!(msg.msg_seq_num(), 12);
        assert_eq!(msg.poss_dup_flag(), Some(true));
        assert_eq!(msg.sending_time(), parse_sending_time("20240102-03:04:05.006").unwrap());
        let body: Vec<u32> = msg.fields().keys().copied().collect();
        assert_eq!(body, vec![tags::SYMBOL]);
    }

    #[test]
    fn test_field_ignores_unrepresentable_header_values() {
        let msg = Message::builder("FIX.4.2", "D")
            .msg_seq_num(3)
            .field(tags::MSG_SEQ_NUM, "three")
            .field(tags::POSS_DUP_FLAG, "maybe")
            .field(tags::ORIG_SENDING_TIME, "yesterday")
            .build();

        assert_eq!(msg.msg_seq_num(), 3);
        assert_eq!(msg.poss_dup_flag(), None);
        assert_eq!(msg.orig_sending_time(), None);
        assert!(msg.fields().is_empty());
    }

    #[test]
    fn test_timestamps_truncated_to_millis() {
        use chrono::{TimeZone, Timelike, Utc};

        let precise = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()
            + chrono::Duration::microseconds(6_789);
        let msg = Message::builder("FIX.4.2", "D")
            .sending_time(precise)
            .orig_sending_time(precise)
            .build();

        assert_eq!(msg.sending_time().nanosecond(), 6_000_000);
        assert_eq!(msg.orig_sending_time().map(|t| t.nanosecond()), Some(6_000_000));
    }

    #[test]
    fn test_try_field_rejects_duplicates_and_reserved() {
        let mut builder = MessageBuilder::new("FIX.4.4", "D");
        assert!(builder.try_field(tags::SYMBOL, "AAPL").is_ok());
        assert_eq!(
            builder.try_field(tags::SYMBOL, "MSFT").err(),
            Some(MessageError::DuplicateTag { tag: tags::SYMBOL })
        );
        assert_eq!(
            builder.try_field(tags::CHECKSUM, "000").err(),
            Some(MessageError::ReservedTag { tag: tags::CHECKSUM })
        );
        assert_eq!(builder.build().field(tags::SYMBOL), Some("AAPL"));
    }

    #[test]
    fn test_validate_reports_missing_header() {
        let msg = Message::builder("FIX.4.2", "0").sender_comp_id("A").build();
        assert_eq!(
            msg.validate(),
            Err(MessageError::MissingHeaderField {
                tag: tags::TARGET_COMP_ID,
                name: "TargetCompID",
            })
        );
    }

    #[test]
    fn test_build_resets_builder() {
        let mut builder = MessageBuilder::new("FIX.4.2", "0");
        builder.field(tags::SYMBOL, "AAPL");
        let _ = builder.build();

        let empty = builder.build();
        assert_eq!(empty.begin_string(), "");
        assert!(empty.fields().is_empty());
        assert_eq!(empty.sending_time(), SendingTime::default());
    }

    #[test]
    fn test_hardware_timestamp_stamped_and_ignored_by_eq() {
        let a = order();
        let b = a.clone().into_builder().hardware_timestamp(a.hardware_timestamp() + 10).build();

        assert_eq!(b.hardware_timestamp(), a.hardware_timestamp() + 10);
        assert_eq!(a, b);
    }

    #[test]
    fn test_explicit_hardware_timestamp_kept() {
        let msg = Message::builder("FIX.4.2", "0").hardware_timestamp(77).build();
        assert_eq!(msg.hardware_timestamp(), 77);
    }
}
