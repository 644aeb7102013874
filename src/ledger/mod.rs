//! Quantity ledger primitives
//!
//! Decimal-safe arithmetic shared by every derived-status computation. Weights
//! are kilograms carried as [`Decimal`] with two decimal places; piece counts
//! are plain integers.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Decimal places kept on stored kilogram weights.
pub const KG_SCALE: u32 = 2;
/// Decimal places reported for tonnes.
pub const TON_SCALE: u32 = 3;
/// Absolute slack used when no explicit tolerance is configured.
pub const DEFAULT_TOLERANCE_KG: Decimal = Decimal::from_parts(20, 0, 0, false, 0);

/// Issuance state of a cached-counter ledger entity (lot or batch).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LedgerStatus {
    Open,
    Partial,
    Complete,
}

impl LedgerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerStatus::Open => "open",
            LedgerStatus::Partial => "partial",
            LedgerStatus::Complete => "complete",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Some(LedgerStatus::Open),
            "partial" => Some(LedgerStatus::Partial),
            "complete" => Some(LedgerStatus::Complete),
            _ => None,
        }
    }
}

impl fmt::Display for LedgerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derives the issuance status of an entity from its capacity and the running
/// total consumed by its children.
///
/// Nothing consumed is `Open`. Consumption that still leaves more than
/// `tolerance` behind is `Partial`. Anything else, including over-consumption,
/// is `Complete`.
pub fn derive_status(capacity: Decimal, consumed: Decimal, tolerance: Decimal) -> LedgerStatus {
    if consumed.is_zero() {
        LedgerStatus::Open
    } else if consumed < capacity && (capacity - consumed) > tolerance {
        LedgerStatus::Partial
    } else {
        LedgerStatus::Complete
    }
}

/// `capacity - consumed`, floored at zero.
pub fn remaining(capacity: Decimal, consumed: Decimal) -> Decimal {
    normalize_kg((capacity - consumed).max(Decimal::ZERO))
}

/// Rounds a weight to the stored kilogram scale and pins it there, so `2.5`
/// renders as `2.50`.
pub fn normalize_kg(value: Decimal) -> Decimal {
    with_scale(value, KG_SCALE)
}

fn with_scale(value: Decimal, scale: u32) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(scale);
    rounded
}

pub fn sum_kg<I>(values: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    normalize_kg(values.into_iter().fold(Decimal::ZERO, |acc, v| acc + v))
}

/// Total weight of `pieces` pieces of `slug_weight` kilograms each.
pub fn weight_kg(slug_weight: Decimal, pieces: i64) -> Decimal {
    normalize_kg(slug_weight * Decimal::from(pieces))
}

pub fn weight_ton(kg: Decimal) -> Decimal {
    with_scale(kg / Decimal::ONE_THOUSAND, TON_SCALE)
}

/// Direction of a packing-area ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum StockDirection {
    In,
    Out,
}

impl StockDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockDirection::In => "IN",
            StockDirection::Out => "OUT",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "IN" => Some(StockDirection::In),
            "OUT" => Some(StockDirection::Out),
            _ => None,
        }
    }
}

impl fmt::Display for StockDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// First two characters of the customer name, uppercased; `XX` when blank.
pub fn customer_initials(customer: &str) -> String {
    let trimmed = customer.trim();
    if trimmed.is_empty() {
        return "XX".to_string();
    }
    trimmed.chars().take(2).collect::<String>().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(dec!(1000), dec!(0), LedgerStatus::Open)]
    #[case(dec!(1000), dec!(1000), LedgerStatus::Complete)]
    #[case(dec!(1000), dec!(950), LedgerStatus::Partial)]
    #[case(dec!(1000), dec!(985), LedgerStatus::Complete)]
    #[case(dec!(1000), dec!(980), LedgerStatus::Complete)]
    #[case(dec!(1000), dec!(979.99), LedgerStatus::Partial)]
    #[case(dec!(1000), dec!(1200), LedgerStatus::Complete)]
    #[case(dec!(15), dec!(5), LedgerStatus::Complete)]
    fn status_follows_tolerance_rule(
        #[case] capacity: Decimal,
        #[case] consumed: Decimal,
        #[case] expected: LedgerStatus,
    ) {
        assert_eq!(
            derive_status(capacity, consumed, DEFAULT_TOLERANCE_KG),
            expected
        );
    }

    #[test]
    fn zero_tolerance_only_completes_on_exact_consumption() {
        assert_eq!(
            derive_status(dec!(100), dec!(99.99), Decimal::ZERO),
            LedgerStatus::Partial
        );
        assert_eq!(
            derive_status(dec!(100), dec!(100), Decimal::ZERO),
            LedgerStatus::Complete
        );
    }

    #[test]
    fn remaining_is_floored() {
        assert_eq!(remaining(dec!(1000), dec!(950)), dec!(50));
        assert_eq!(remaining(dec!(1000), dec!(1200)), Decimal::ZERO);
    }

    #[test]
    fn weights_are_rounded_per_unit() {
        assert_eq!(weight_kg(dec!(2.345), 3), dec!(7.04));
        assert_eq!(weight_ton(dec!(1234.5)), dec!(1.235));
        assert_eq!(weight_ton(Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn weights_render_at_a_fixed_scale() {
        assert_eq!(normalize_kg(dec!(2.5)).to_string(), "2.50");
        assert_eq!(normalize_kg(dec!(25)).to_string(), "25.00");
        assert_eq!(normalize_kg(dec!(7.005)).to_string(), "7.01");
        assert_eq!(weight_kg(dec!(2.5), 10).to_string(), "25.00");
        assert_eq!(weight_ton(dec!(25)).to_string(), "0.025");
        assert_eq!(weight_ton(Decimal::ZERO).to_string(), "0.000");
        assert_eq!(sum_kg(vec![dec!(1.5), dec!(2)]).to_string(), "3.50");
    }

    #[test]
    fn status_and_direction_parse_case_insensitively() {
        assert_eq!(LedgerStatus::from_str(" Partial "), Some(LedgerStatus::Partial));
        assert_eq!(LedgerStatus::from_str("closed"), None);
        assert_eq!(StockDirection::from_str("out"), Some(StockDirection::Out));
        assert_eq!(StockDirection::In.as_str(), "IN");
    }

    #[rstest]
    #[case("Acme Forge", "AC")]
    #[case("  tata", "TA")]
    #[case("x", "X")]
    #[case("", "XX")]
    #[case("   ", "XX")]
    fn initials_from_customer(#[case] customer: &str, #[case] expected: &str) {
        assert_eq!(customer_initials(customer), expected);
    }

    proptest! {
        #[test]
        fn remaining_plus_consumed_covers_capacity(
            capacity in 1i64..1_000_000,
            consumed in 0i64..1_000_000,
        ) {
            let capacity = Decimal::new(capacity, 2);
            let consumed = Decimal::new(consumed, 2);
            let left = remaining(capacity, consumed);
            prop_assert!(left >= Decimal::ZERO);
            prop_assert_eq!(left, (capacity - consumed).max(Decimal::ZERO));
        }

        #[test]
        fn status_agrees_with_remaining(
            capacity in 1i64..1_000_000,
            consumed in 0i64..1_000_000,
        ) {
            let capacity = Decimal::new(capacity, 2);
            let consumed = Decimal::new(consumed, 2);
            let status = derive_status(capacity, consumed, DEFAULT_TOLERANCE_KG);
            let left = remaining(capacity, consumed);
            match status {
                LedgerStatus::Open => prop_assert!(consumed.is_zero()),
                LedgerStatus::Partial => prop_assert!(left > DEFAULT_TOLERANCE_KG),
                LedgerStatus::Complete => prop_assert!(left <= DEFAULT_TOLERANCE_KG),
            }
        }
    }
}
