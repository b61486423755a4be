/// Trial-division primality test.
///
/// The divisor bound is checked as `d <= n / d`, which never overflows for
/// inputs near `u64::MAX`. Worst case is `O(sqrt(n))` divisions.
#[inline]
pub fn is_prime(n: u64) -> bool {
    if n <= 1 {
        return false;
    }
    if n < 4 {
        return true;
    }
    if n % 2 == 0 {
        return false;
    }
    let mut d = 3u64;
    while d <= n / d {
        if n % d == 0 {
            return false;
        }
        d += 2;
    }
    true
}

/// Sequential reference count, used to check the parallel pipeline.
pub fn count_primes_in<I>(values: I) -> u64
where
    I: IntoIterator<Item = u64>,
{
    values.into_iter().filter(|&v| is_prime(v)).count() as u64
}
