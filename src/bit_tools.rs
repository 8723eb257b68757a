//! Word-level broadword primitives.
//!
//! The rank/select machinery in [`crate::bitvec`] reduces every query to
//! operations on a single 64-bit word. Population count is `u64::count_ones`
//! (a native instruction on all targets we care about); the two primitives
//! here are the ones the standard library does not provide:
//!
//! - [`select_in_word`]: position of the `k`-th set bit inside one word,
//!   via byte-wise prefix popcounts computed with a single multiplication.
//! - [`uleq_step_9`]: a SIMD-within-a-register comparison of seven packed
//!   9-bit lanes, used to locate the correct word inside a 512-bit block
//!   without branching.
//!
//! All operations are pure, total, and constant time.

/// A 1 in the lowest bit of each of the seven 9-bit lanes of a word.
pub const ONES_STEP_9: u64 = 0x0040_2010_0804_0201;

/// A 1 in the highest bit (bit 8) of each 9-bit lane.
pub const MSBS_STEP_9: u64 = ONES_STEP_9 << 8;

const ONES_STEP_8: u64 = 0x0101_0101_0101_0101;
const MSBS_STEP_8: u64 = 0x8080_8080_8080_8080;

/// Lane-wise unsigned `x <= y` over seven packed 9-bit lanes.
///
/// Returns a word with bit 0 of lane `i` set iff lane `i` of `x` is less
/// than or equal to lane `i` of `y`. Lane values must fit in 8 bits for
/// the borrow trick to be exact, which holds for intra-block ranks
/// (at most 448) only in their use below 512; callers replicate a value
/// `< 512` into lanes via multiplication by [`ONES_STEP_9`].
#[inline]
pub fn uleq_step_9(x: u64, y: u64) -> u64 {
    (((((y | MSBS_STEP_9).wrapping_sub(x & !MSBS_STEP_9)) | (x ^ y)) ^ (x & !y)) & MSBS_STEP_9) >> 8
}

/// Position (0..64) of the `k`-th set bit of `word`.
///
/// Requires `k < word.count_ones()`; this is a programmer-error contract,
/// checked only by `debug_assert`.
///
/// On x86_64 with BMI2 this compiles to a `pdep`/`tzcnt` pair. The
/// portable path computes byte-granular prefix popcounts with one
/// multiplication, picks the byte containing the target bit with the
/// same borrow trick as [`uleq_step_9`], and refines inside that byte by
/// clearing its lowest set bits.
#[inline]
pub fn select_in_word(word: u64, k: u64) -> u64 {
    debug_assert!(k < u64::from(word.count_ones()));

    #[cfg(all(target_arch = "x86_64", target_feature = "bmi2"))]
    {
        // SAFETY: gated on BMI2 at compile time.
        unsafe { u64::from(core::arch::x86_64::_pdep_u64(1u64 << k, word).trailing_zeros()) }
    }

    #[cfg(not(all(target_arch = "x86_64", target_feature = "bmi2")))]
    {
        // Per-byte popcounts, then prefix sums across bytes.
        let mut byte_sums = word - ((word >> 1) & 0x5555_5555_5555_5555);
        byte_sums =
            (byte_sums & 0x3333_3333_3333_3333) + ((byte_sums >> 2) & 0x3333_3333_3333_3333);
        byte_sums = (byte_sums + (byte_sums >> 4)) & 0x0F0F_0F0F_0F0F_0F0F;
        byte_sums = byte_sums.wrapping_mul(ONES_STEP_8);

        // Number of bytes whose cumulative popcount is <= k, times 8.
        let k_step_8 = k * ONES_STEP_8;
        let geq = ((k_step_8 | MSBS_STEP_8).wrapping_sub(byte_sums)) & MSBS_STEP_8;
        let place = u64::from(geq.count_ones()) * 8;

        // Rank of the target bit inside its byte.
        let byte_rank = k - (((byte_sums << 8) >> place) & 0xFF);
        let mut byte = (word >> place) & 0xFF;
        for _ in 0..byte_rank {
            byte &= byte - 1;
        }
        place + u64::from(byte.trailing_zeros())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive_select(word: u64, k: u64) -> u64 {
        let mut seen = 0;
        for i in 0..64 {
            if word & (1 << i) != 0 {
                if seen == k {
                    return i;
                }
                seen += 1;
            }
        }
        unreachable!("k out of range");
    }

    #[test]
    fn select_in_word_matches_naive() {
        let words = [
            1u64,
            u64::MAX,
            0x8000_0000_0000_0000,
            0xAAAA_AAAA_AAAA_AAAA,
            0x0123_4567_89AB_CDEF,
            0xFFFF_0000_0000_FFFF,
        ];
        for &w in &words {
            for k in 0..u64::from(w.count_ones()) {
                assert_eq!(select_in_word(w, k), naive_select(w, k), "w={w:#x} k={k}");
            }
        }
    }

    #[test]
    fn uleq_step_9_counts_lanes() {
        // Lanes hold 1..=7; exactly the lanes <= 4 should flag.
        let mut x = 0u64;
        for lane in 0..7u64 {
            x |= (lane + 1) << (9 * lane);
        }
        let y = 4 * ONES_STEP_9;
        let flags = uleq_step_9(x, y);
        let count = flags.wrapping_mul(ONES_STEP_9) >> 54 & 0x7;
        assert_eq!(count, 4);
    }
}
