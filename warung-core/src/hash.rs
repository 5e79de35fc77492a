//! Deterministic string hashing and seeded pseudo-randomness
//!
//! Decoy identity ids, cloaking phrase selection, cache keys and the IndexNow
//! key are all recomputed from the same inputs on every instance, so the
//! functions here are fixed bit for bit and never use the std hasher.
//!
//! `hash_seed` is 32-bit FNV-1a over the UTF-16 code units of the input:
//!
//! ```text
//! h = 0x811c9dc5
//! for unit in s.encode_utf16():
//!     h = (h ^ unit) * 0x01000193   (mod 2^32)
//! ```

const FNV_OFFSET: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

const LCG_MUL: u32 = 1_664_525;
const LCG_INC: u32 = 1_013_904_223;

/// 32-bit FNV-1a over UTF-16 code units
pub fn hash_seed(input: &str) -> u32 {
    input
        .encode_utf16()
        .fold(FNV_OFFSET, |h, unit| (h ^ u32::from(unit)).wrapping_mul(FNV_PRIME))
}

/// Hex digest of length `len` built by chaining `hash_seed(input + i)` for
/// i = 0, 1, 2, ... as zero-padded 8-digit hex words
pub fn hex_hash(input: &str, len: usize) -> String {
    let mut out = String::with_capacity(len + 8);
    let mut i = 0u32;
    while out.len() < len {
        out.push_str(&format!("{:08x}", hash_seed(&format!("{}{}", input, i))));
        i += 1;
    }
    out.truncate(len);
    out
}

/// Linear congruential generator (Numerical Recipes constants, mod 2^32)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lcg {
    state: u32,
}

impl Lcg {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Advance and return the new state
    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(LCG_MUL).wrapping_add(LCG_INC);
        self.state
    }

    /// Uniform-ish float in [0, 1)
    pub fn next_f64(&mut self) -> f64 {
        f64::from(self.next_u32()) / 4_294_967_296.0
    }
}

/// Fisher-Yates shuffle driven by [`Lcg`]; same seed, same permutation
pub fn seeded_shuffle<T: Clone>(items: &[T], seed: u32) -> Vec<T> {
    let mut out = items.to_vec();
    let mut rng = Lcg::new(seed);
    for i in (1..out.len()).rev() {
        let j = rng.next_u32() as usize % (i + 1);
        out.swap(i, j);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fnv1a_reference_vectors() {
        assert_eq!(hash_seed(""), 0x811c_9dc5);
        assert_eq!(hash_seed("a"), 0xe40c_292c);
        assert_eq!(hash_seed("foobar"), 0xbf9c_f968);
    }

    #[test]
    fn hashes_utf16_units_not_bytes() {
        // 'é' is one UTF-16 unit (0xE9) but two UTF-8 bytes
        let expected = (FNV_OFFSET ^ 0xE9).wrapping_mul(FNV_PRIME);
        assert_eq!(hash_seed("é"), expected);
    }

    #[test]
    fn hex_hash_has_requested_length_and_is_stable() {
        for len in [1, 8, 16, 20, 32] {
            let digest = hex_hash("example.com", len);
            assert_eq!(digest.len(), len);
            assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
        }
        assert_eq!(hex_hash("example.com", 16), hex_hash("example.com", 16));
        assert_eq!(&hex_hash("example.com", 8), &hex_hash("example.com", 16)[..8]);
        assert_eq!(&hex_hash("x", 8), &format!("{:08x}", hash_seed("x0")));
    }

    #[test]
    fn lcg_matches_reference_sequence() {
        let mut rng = Lcg::new(0);
        assert_eq!(rng.next_u32(), 1_013_904_223);
        assert_eq!(rng.next_u32(), 1_196_435_762);
    }

    #[test]
    fn shuffle_is_a_stable_permutation() {
        let items: Vec<u32> = (0..10).collect();
        let a = seeded_shuffle(&items, 42);
        let b = seeded_shuffle(&items, 42);
        assert_eq!(a, b);

        let mut sorted = a.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, items);
    }

    #[test]
    fn shuffle_of_short_inputs() {
        assert!(seeded_shuffle::<u8>(&[], 7).is_empty());
        assert_eq!(seeded_shuffle(&["only"], 7), vec!["only"]);
    }
}
