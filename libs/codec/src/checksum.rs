//! FIX CheckSum (10) Calculation
//!
//! The FIX checksum is the sum of every byte preceding `10=`, modulo 256.
//! Two implementations share one contract: [`scalar_checksum`] and
//! [`simd_checksum`] return identical results for every input.
//!
//! ## Vector Path
//!
//! On x86_64 with SSE2 the input is consumed 16 bytes per step. `PSADBW`
//! against a zero vector sums each 8-byte half into a 64-bit lane, so lane
//! accumulators cannot overflow for any realistic message size. The two
//! lanes are folded and reduced modulo 256 at the end; the unaligned tail
//! goes through the scalar loop. Feature detection runs once per process.

use std::sync::OnceLock;

/// Width of one vector step in bytes
pub const LANE_WIDTH: usize = 16;

/// Inputs shorter than this go straight to the scalar loop
pub const SIMD_MIN_LEN: usize = 2 * LANE_WIDTH;

/// Implementation selected at runtime for [`checksum`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumStrategy {
    Scalar,
    Sse2,
}

impl ChecksumStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Scalar => "scalar",
            Self::Sse2 => "sse2",
        }
    }
}

static STRATEGY: OnceLock<ChecksumStrategy> = OnceLock::new();

/// Strategy detected for this CPU, cached after the first call
pub fn checksum_strategy() -> ChecksumStrategy {
    *STRATEGY.get_or_init(detect_strategy)
}

#[cfg(target_arch = "x86_64")]
fn detect_strategy() -> ChecksumStrategy {
    if is_x86_feature_detected!("sse2") {
        ChecksumStrategy::Sse2
    } else {
        ChecksumStrategy::Scalar
    }
}

#[cfg(not(target_arch = "x86_64"))]
fn detect_strategy() -> ChecksumStrategy {
    ChecksumStrategy::Scalar
}

/// Byte sum modulo 256, one byte at a time
#[inline]
pub fn scalar_checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

/// Byte sum modulo 256 using the vector unit when available
///
/// Falls back to [`scalar_checksum`] for short inputs and on CPUs without
/// SSE2.
pub fn simd_checksum(bytes: &[u8]) -> u8 {
    #[cfg(target_arch = "x86_64")]
    {
        if bytes.len() >= SIMD_MIN_LEN && checksum_strategy() == ChecksumStrategy::Sse2 {
            // SAFETY: SSE2 availability confirmed by runtime detection
            return unsafe { x86::sse2_checksum(bytes) };
        }
    }
    scalar_checksum(bytes)
}

/// Checksum using the detected strategy
#[inline]
pub fn checksum(bytes: &[u8]) -> u8 {
    match checksum_strategy() {
        ChecksumStrategy::Scalar => scalar_checksum(bytes),
        ChecksumStrategy::Sse2 => simd_checksum(bytes),
    }
}

/// Compare a declared `10=` value against the recomputed sum
///
/// The declared value must be exactly three ASCII digits.
pub fn verify_checksum(bytes: &[u8], declared: &[u8]) -> Result<(), u8> {
    let computed = checksum(bytes);
    match parse_declared(declared) {
        Some(value) if value == computed => Ok(()),
        _ => Err(computed),
    }
}

fn parse_declared(declared: &[u8]) -> Option<u8> {
    if declared.len() != 3 || !declared.iter().all(u8::is_ascii_digit) {
        return None;
    }
    let value = declared
        .iter()
        .fold(0u32, |acc, &d| acc * 10 + u32::from(d - b'0'));
    u8::try_from(value).ok()
}

#[cfg(target_arch = "x86_64")]
mod x86 {
    use std::arch::x86_64::{
        __m128i, _mm_add_epi64, _mm_cvtsi128_si64, _mm_loadu_si128, _mm_sad_epu8,
        _mm_setzero_si128, _mm_unpackhi_epi64,
    };

    use super::{scalar_checksum, LANE_WIDTH};

    #[target_feature(enable = "sse2")]
    pub(super) unsafe fn sse2_checksum(bytes: &[u8]) -> u8 {
        let zero = _mm_setzero_si128();
        let mut acc = _mm_setzero_si128();

        let mut chunks = bytes.chunks_exact(LANE_WIDTH);
        for chunk in &mut chunks {
            let v = _mm_loadu_si128(chunk.as_ptr() as *const __m128i);
            acc = _mm_add_epi64(acc, _mm_sad_epu8(v, zero));
        }

        let low = _mm_cvtsi128_si64(acc) as u64;
        let high = _mm_cvtsi128_si64(_mm_unpackhi_epi64(acc, acc)) as u64;
        let folded = low.wrapping_add(high) as u8;

        folded.wrapping_add(scalar_checksum(chunks.remainder()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_known_values() {
        assert_eq!(scalar_checksum(b""), 0);
        assert_eq!(scalar_checksum(&[0xFF, 0x01]), 0);
        assert_eq!(scalar_checksum(b"8=FIX.4.2\x01"), {
            let sum: u32 = b"8=FIX.4.2\x01".iter().map(|&b| u32::from(b)).sum();
            (sum % 256) as u8
        });
    }

    #[test]
    fn test_simd_matches_scalar_at_lane_boundaries() {
        for len in [0, 1, 15, 16, 17, 31, 32, 33, 47, 48, 64, 65, 255, 256, 257, 4096] {
            let data: Vec<u8> = (0..len).map(|i| (i * 31 + 7) as u8).collect();
            assert_eq!(simd_checksum(&data), scalar_checksum(&data), "len {len}");
            assert_eq!(checksum(&data), scalar_checksum(&data), "len {len}");
        }
    }

    #[test]
    fn test_all_high_bytes() {
        let data = vec![0xFFu8; 10_000];
        assert_eq!(simd_checksum(&data), scalar_checksum(&data));
    }

    #[test]
    fn test_strategy_is_stable() {
        let first = checksum_strategy();
        assert_eq!(first, checksum_strategy());
        #[cfg(target_arch = "x86_64")]
        assert_eq!(first, ChecksumStrategy::Sse2);
    }

    #[test]
    fn test_verify_checksum() {
        let body = b"8=FIX.4.2\x0135=0\x01";
        let sum = scalar_checksum(body);
        let declared = format!("{sum:03}");

        assert_eq!(verify_checksum(body, declared.as_bytes()), Ok(()));
        assert_eq!(verify_checksum(body, b"1"), Err(sum));
        assert_eq!(verify_checksum(body, b"999"), Err(sum));
        assert_eq!(verify_checksum(body, b"abc"), Err(sum));
    }
}
