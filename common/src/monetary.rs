//! Decimal helpers for two-decimal monetary values.

use rust_decimal::{Decimal, RoundingStrategy};

/// Truncate a value to two decimal places, dropping anything beyond.
///
/// Used where the upstream APIs expect a plain two-decimal amount
/// (marketplace amount filters, the reference rate itself).
pub fn trunc2(value: Decimal) -> Decimal {
    value.trunc_with_scale(2)
}

/// Round a value to two decimal places, half away from zero.
///
/// Display-side rounding for derived figures.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_trunc2_drops_extra_digits() {
        assert_eq!(trunc2(dec!(36.5899)), dec!(36.58));
        assert_eq!(trunc2(dec!(36.5)), dec!(36.5));
        assert_eq!(trunc2(dec!(36)), dec!(36));
    }

    #[test]
    fn test_trunc2_does_not_round() {
        assert_eq!(trunc2(dec!(0.999)), dec!(0.99));
        assert_eq!(trunc2(dec!(-0.999)), dec!(-0.99));
    }

    #[test]
    fn test_round2_half_away_from_zero() {
        assert_eq!(round2(dec!(94.1176)), dec!(94.12));
        assert_eq!(round2(dec!(2.505)), dec!(2.51));
        assert_eq!(round2(dec!(-2.505)), dec!(-2.51));
    }
}
