use core::num::NonZeroU64;

use easy_ext::ext;
use integer_sqrt::IntegerSquareRoot as _;
use typenum::{NonZero, Unsigned};

#[ext(NonZeroExt)]
pub impl<N: Unsigned + NonZero> N {
    #[inline]
    #[must_use]
    fn non_zero() -> NonZeroU64 {
        Self::U64
            .try_into()
            .expect("the bound on N ensures that it is nonzero")
    }
}

#[ext(U64Ext)]
pub impl u64 {
    #[inline]
    #[must_use]
    fn is_multiple_of_nonzero(self, factor: NonZeroU64) -> bool {
        self % factor == 0
    }

    #[inline]
    #[must_use]
    fn prev_multiple_of(self, factor: NonZeroU64) -> Self {
        self - self % factor
    }

    #[inline]
    #[must_use]
    fn div_typenum<N: Unsigned + NonZero>(self) -> Self {
        self / N::U64
    }

    #[inline]
    #[must_use]
    fn mod_typenum<N: Unsigned + NonZero>(self) -> Self {
        self % N::U64
    }
}

/// Largest integer `x` such that `x * x <= n`.
///
/// Reward computations divide by this, so the result must be exact for every `u64`.
#[inline]
#[must_use]
pub fn integer_squareroot(n: u64) -> u64 {
    n.integer_sqrt()
}

#[cfg(test)]
mod tests {
    use test_case::test_case;
    use typenum::{U64, U8};

    use super::*;

    #[test_case(0 => 0)]
    #[test_case(1 => 1)]
    #[test_case(3 => 1)]
    #[test_case(4 => 2)]
    #[test_case(99 => 9)]
    #[test_case(100 => 10)]
    #[test_case(3_200_000_000_000 => 1_788_854)]
    #[test_case(u64::MAX => 4_294_967_295)]
    fn integer_squareroot_rounds_down(n: u64) -> u64 {
        integer_squareroot(n)
    }

    #[test]
    fn prev_multiple_of_rounds_down_to_increment() {
        let increment = NonZeroU64::new(1_000_000_000).expect("literal is nonzero");

        assert_eq!(32_999_999_999_u64.prev_multiple_of(increment), 32_000_000_000);
        assert_eq!(32_000_000_000_u64.prev_multiple_of(increment), 32_000_000_000);
        assert_eq!(999_u64.prev_multiple_of(increment), 0);
    }

    #[test]
    fn typenum_division_matches_runtime_division() {
        assert_eq!(130_u64.div_typenum::<U64>(), 2);
        assert_eq!(130_u64.mod_typenum::<U64>(), 2);
        assert_eq!(U8::non_zero().get(), 8);
        assert!(64_u64.is_multiple_of_nonzero(U8::non_zero()));
    }
}
