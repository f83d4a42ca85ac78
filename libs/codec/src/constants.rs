//! Wire-level constants

/// Field delimiter (ASCII Start Of Heading)
pub const SOH: u8 = 0x01;

/// Tag/value separator
pub const EQUALS: u8 = b'=';

/// U+FFFD REPLACEMENT CHARACTER, what SOH becomes after a lossy UTF-8 round trip
pub const SOH_SUBSTITUTE_REPLACEMENT: &[u8] = "\u{FFFD}".as_bytes();

/// U+2401 SYMBOL FOR START OF HEADING, how log viewers and editors render SOH
pub const SOH_SUBSTITUTE_CONTROL_PICTURE: &[u8] = "\u{2401}".as_bytes();

/// `10=NNN<SOH>`
pub const CHECKSUM_TRAILER_LEN: usize = 7;

/// Typical encoded size used for buffer pre-sizing
pub const TYPICAL_MESSAGE_SIZE: usize = 256;
