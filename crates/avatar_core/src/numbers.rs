//! Numerological digit reduction.

/// Largest value an avatar point may take.
pub const MAX_INDEX: u64 = 22;

/// Sums the decimal digits of `n`.
pub fn digit_sum(mut n: u64) -> u64 {
    let mut sum = 0;
    while n > 0 {
        sum += n % 10;
        n /= 10;
    }
    sum
}

/// Reduces a number to a single digit: 38 → 11 → 2.
///
/// `0` is returned unchanged.
pub fn reduce_to_digit(n: u64) -> u64 {
    if n == 0 {
        return 0;
    }
    let mut n = n;
    while n > 9 {
        n = digit_sum(n);
    }
    n
}

/// Reduces a number into the avatar range 1–22.
///
/// Digits are summed only while the value exceeds 22, so 29 → 11 stays at 11
/// and 999 → 27 → 9.
pub fn reduce_to_index_range(n: u64) -> u64 {
    let mut n = n;
    while n > MAX_INDEX {
        n = digit_sum(n);
    }
    n
}
