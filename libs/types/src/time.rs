//! SendingTime representation
//!
//! FIX UTCTimestamp on the wire is `yyyyMMdd-HH:mm:ss.fff`. Values are kept
//! at millisecond precision so that a message survives encode → decode
//! unchanged.

use chrono::format::{DelayedFormat, StrftimeItems};
use chrono::{DateTime, NaiveDateTime, SubsecRound, TimeZone, Utc};

/// UTC instant carried in tags 52 and 122
pub type SendingTime = DateTime<Utc>;

/// Wire format for outbound timestamps
pub const SENDING_TIME_FORMAT: &str = "%Y%m%d-%H:%M:%S%.3f";

/// Inbound format: fractional seconds optional and of any length
const SENDING_TIME_PARSE_FORMAT: &str = "%Y%m%d-%H:%M:%S%.f";

/// Current UTC time truncated to the wire's millisecond precision
pub fn now_sending_time() -> SendingTime {
    Utc::now().trunc_subsecs(3)
}

/// Lazily formatted wire representation, written without an intermediate String
pub fn format_sending_time(time: &SendingTime) -> DelayedFormat<StrftimeItems<'static>> {
    time.format(SENDING_TIME_FORMAT)
}

/// Parse a wire timestamp; `None` when the value is not a UTCTimestamp
pub fn parse_sending_time(value: &str) -> Option<SendingTime> {
    NaiveDateTime::parse_from_str(value, SENDING_TIME_PARSE_FORMAT)
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}
