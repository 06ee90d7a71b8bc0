//! Property tests for term resolution over monotone pricing tables

use proptest::prelude::*;
use rust_decimal::Decimal;

use subarr_core::config::TierPrices;
use subarr_core::term::{resolve_term, CENT};

/// Strictly increasing tier prices with at least a $2 gap between tiers, so
/// the cent tolerance can never make two tiers ambiguous
fn monotone_table() -> impl Strategy<Value = TierPrices> {
    (
        500u32..5_000,
        200u32..5_000,
        200u32..5_000,
        200u32..5_000,
    )
        .prop_map(|(p1, gap3, gap6, gap12)| {
            let one = Decimal::new(i64::from(p1), 2);
            let three = one + Decimal::new(i64::from(gap3), 2);
            let six = three + Decimal::new(i64::from(gap6), 2);
            let twelve = six + Decimal::new(i64::from(gap12), 2);
            TierPrices {
                one_month: Some(one),
                three_month: Some(three),
                six_month: Some(six),
                twelve_month: Some(twelve),
            }
        })
}

proptest! {
    #[test]
    fn exact_tier_price_resolves_to_its_own_months(table in monotone_table()) {
        for months in [1u32, 3, 6, 12] {
            let r = resolve_term(table.price_for(months), &table, None, false);
            prop_assert_eq!(r.months, months);
            prop_assert_eq!(r.leftover, Decimal::ZERO);
            prop_assert!(r.exact);
        }
    }

    #[test]
    fn leftover_is_always_below_the_smallest_tier(
        table in monotone_table(),
        amount_cents in 0u32..200_000,
    ) {
        let amount = Decimal::new(i64::from(amount_cents), 2);
        let r = resolve_term(amount, &table, None, false);
        prop_assert!(r.leftover < table.price_for(1));
        prop_assert!(r.leftover >= Decimal::ZERO);
    }

    #[test]
    fn packed_total_plus_leftover_accounts_for_the_amount(
        table in monotone_table(),
        amount_cents in 0u32..200_000,
    ) {
        let amount = Decimal::new(i64::from(amount_cents), 2);
        let r = resolve_term(amount, &table, None, false);
        let packed: Decimal = r.breakdown.iter().map(|&m| table.price_for(m)).sum();
        // Exact matches may sit up to a cent off their tier price
        prop_assert!((packed + r.leftover - amount).abs() <= CENT);
    }

    #[test]
    fn month_counts_are_consistent_with_the_breakdown(
        table in monotone_table(),
        amount_cents in 0u32..200_000,
    ) {
        let amount = Decimal::new(i64::from(amount_cents), 2);
        let r = resolve_term(amount, &table, None, false);
        prop_assert_eq!(r.months, r.breakdown.iter().sum::<u32>());
        prop_assert_eq!(r.months == 0, r.breakdown.is_empty());
    }
}
