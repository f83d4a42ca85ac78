//! Well-known FIX tag numbers
//!
//! Only the tags needed to frame a message plus a handful of common order
//! fields. Business meaning of body tags is owned by the layers above.

/// BeginString - protocol version, always first on the wire
pub const BEGIN_STRING: u32 = 8;
/// BodyLength - not emitted by this codec, decoded as an ordinary body field
pub const BODY_LENGTH: u32 = 9;
/// CheckSum - always last on the wire
pub const CHECKSUM: u32 = 10;
pub const MSG_SEQ_NUM: u32 = 34;
pub const MSG_TYPE: u32 = 35;
pub const POSS_DUP_FLAG: u32 = 43;
pub const SENDER_COMP_ID: u32 = 49;
pub const SENDING_TIME: u32 = 52;
pub const TARGET_COMP_ID: u32 = 56;
pub const ORIG_SENDING_TIME: u32 = 122;

// Common body tags
pub const CL_ORD_ID: u32 = 11;
pub const ORDER_QTY: u32 = 38;
pub const ORD_TYPE: u32 = 40;
pub const PRICE: u32 = 44;
pub const SIDE: u32 = 54;
pub const SYMBOL: u32 = 55;
pub const TRANSACT_TIME: u32 = 60;

/// Tags that map onto dedicated `Message` header fields or the trailer
pub const RESERVED_TAGS: [u32; 9] = [
    BEGIN_STRING,
    MSG_TYPE,
    SENDER_COMP_ID,
    TARGET_COMP_ID,
    MSG_SEQ_NUM,
    SENDING_TIME,
    POSS_DUP_FLAG,
    ORIG_SENDING_TIME,
    CHECKSUM,
];

#[inline]
pub fn is_reserved(tag: u32) -> bool {
    RESERVED_TAGS.contains(&tag)
}

/// MsgType (35) codes
pub mod msg_type {
    pub const HEARTBEAT: &str = "0";
    pub const TEST_REQUEST: &str = "1";
    pub const LOGON: &str = "A";
    pub const LOGOUT: &str = "5";
    pub const NEW_ORDER_SINGLE: &str = "D";
    pub const ORDER_CANCEL_REQUEST: &str = "F";
    pub const EXECUTION_REPORT: &str = "8";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_tags() {
        assert!(is_reserved(BEGIN_STRING));
        assert!(is_reserved(CHECKSUM));
        assert!(is_reserved(ORIG_SENDING_TIME));
        assert!(!is_reserved(BODY_LENGTH));
        assert!(!is_reserved(SYMBOL));
    }
}
