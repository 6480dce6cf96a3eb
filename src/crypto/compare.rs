/// Compares two byte strings in time that depends only on their lengths.
///
/// Every byte up to the shorter length is visited whether or not an earlier
/// byte differed, and the length difference is folded in at the end.
pub fn compare_equal(a: &[u8], b: &[u8]) -> bool {
    diff(a, b, || {}) == 0
}

/// Accumulated difference of `a` and `b`; zero iff they are equal.
///
/// `step` runs once per compared byte.
fn diff(a: &[u8], b: &[u8], mut step: impl FnMut()) -> usize {
    let len = a.len().min(b.len());

    let mut result = 0u8;
    for i in 0..len {
        step();
        result |= a[i] ^ b[i];
    }

    usize::from(std::hint::black_box(result)) | (a.len() ^ b.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steps(a: &[u8], b: &[u8]) -> usize {
        let mut count = 0;
        diff(a, b, || count += 1);
        count
    }

    #[test]
    fn equal_inputs_match() {
        assert!(compare_equal(b"abcdef", b"abcdef"));
        assert!(compare_equal(b"", b""));
    }

    #[test]
    fn different_content_does_not_match() {
        assert!(!compare_equal(b"abcdef", b"abcdeg"));
        assert!(!compare_equal(b"xbcdef", b"abcdef"));
    }

    #[test]
    fn prefix_does_not_match() {
        assert!(!compare_equal(b"abc", b"abcdef"));
        assert!(!compare_equal(b"abcdef", b"abc"));
        assert!(!compare_equal(b"", b"a"));
    }

    #[test]
    fn work_ignores_where_inputs_differ() {
        let reference = [7u8; 64];
        let mut first = reference;
        first[0] ^= 1;
        let mut last = reference;
        last[63] ^= 1;

        assert_eq!(steps(&reference, &reference), 64);
        assert_eq!(steps(&reference, &first), 64);
        assert_eq!(steps(&reference, &last), 64);
        assert_eq!(steps(&reference, &[0u8; 64]), 64);
    }

    #[test]
    fn work_follows_shorter_length() {
        assert_eq!(steps(&[1u8; 10], &[1u8; 64]), 10);
        assert_eq!(steps(&[1u8; 64], &[2u8; 10]), 10);
        assert_eq!(steps(&[], &[1u8; 64]), 0);
    }

    #[test]
    fn length_mismatch_that_cancels_in_low_bits_is_caught() {
        // 256 ^ 0 would vanish if the length difference were truncated to u8
        assert!(!compare_equal(&[0u8; 256], &[]));
    }
}
