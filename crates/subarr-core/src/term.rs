//! Term resolution
//!
//! Maps a paid amount to a term length in months. Order matters: promotional
//! first-purchase prices are checked before the standard table, exact
//! matches before greedy packing, and longer terms before shorter ones so a
//! tie resolves in the customer's favor.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::config::TierPrices;

/// Currency granularity used for exact-match tolerance
pub const CENT: Decimal = dec!(0.01);

/// Term lengths sold, longest first
pub const TERM_MONTHS: [u32; 4] = [12, 6, 3, 1];

/// Result of resolving one payment
#[derive(Debug, Clone, PartialEq)]
pub struct TermResolution {
    /// Months of service purchased; 0 means the amount is unresolvable and
    /// the caller must reject the payment
    pub months: u32,
    /// Unconsumed remainder after packing
    pub leftover: Decimal,
    /// True when the amount reconciles to the cent
    pub exact: bool,
    /// Tier month-counts subtracted during packing, e.g. `[12, 3]`
    pub breakdown: Vec<u32>,
}

impl TermResolution {
    fn exact_match(months: u32) -> Self {
        Self {
            months,
            leftover: Decimal::ZERO,
            exact: true,
            breakdown: vec![months],
        }
    }

    /// One-line description of how the amount reconciled, for previews
    pub fn alignment_line(&self, amount: Decimal) -> String {
        if self.months > 0 && self.exact {
            let parts: Vec<String> = self.breakdown.iter().map(|m| m.to_string()).collect();
            format!(
                "Aligned Price: {} month(s) (total {})",
                parts.join("+"),
                self.months
            )
        } else {
            format!(
                "Non-standard amount: ${amount:.2} (leftover ${:.2})",
                self.leftover
            )
        }
    }
}

fn nearly_equal(a: Decimal, b: Decimal) -> bool {
    (a - b).abs() <= CENT
}

/// Resolve a paid amount against a tier price table
///
/// `promo` is consulted for exact matches only, and only on a first
/// purchase; a promo miss falls through to the standard table. Greedy
/// packing (12 -> 6 -> 3 -> 1) is optimal only while tier prices increase
/// with term length; pricing tables are expected to be monotone but this is
/// not verified here.
pub fn resolve_term(
    amount: Decimal,
    prices: &TierPrices,
    promo: Option<&TierPrices>,
    first_purchase: bool,
) -> TermResolution {
    let amount = amount.round_dp(2);

    if first_purchase {
        if let Some(promo) = promo {
            for months in TERM_MONTHS {
                let price = promo.price_for(months);
                if price > Decimal::ZERO && nearly_equal(amount, price) {
                    return TermResolution::exact_match(months);
                }
            }
        }
    }

    for months in TERM_MONTHS {
        let price = prices.price_for(months);
        if price > Decimal::ZERO && nearly_equal(amount, price) {
            return TermResolution::exact_match(months);
        }
    }

    let mut months = 0u32;
    let mut remaining = amount;
    let mut breakdown = Vec::new();
    for tier in TERM_MONTHS {
        let price = prices.price_for(tier);
        if price <= Decimal::ZERO {
            continue;
        }
        while remaining >= price {
            months += tier;
            remaining = (remaining - price).round_dp(2);
            breakdown.push(tier);
        }
    }

    TermResolution {
        months,
        leftover: remaining,
        exact: months > 0 && remaining <= CENT,
        breakdown,
    }
}

/// Result of resolving one payment covering several subscribers
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResolution {
    /// Term length every member receives
    pub months: u32,
    /// Total unconsumed remainder
    pub leftover_total: Decimal,
    /// Equal share of the remainder added to each member's paid amount
    pub leftover_each: Decimal,
    pub exact: bool,
}

/// Resolve one payment for `count` co-paying subscribers
///
/// The amount is resolved once against the tier-by-tier sum of every
/// member's price table; the leftover is split evenly (equal-split policy
/// for rounding error, rounded to the cent per member).
pub fn resolve_batch(amount: Decimal, summed: &TierPrices, count: usize) -> BatchResolution {
    let resolution = resolve_term(amount, summed, None, false);
    let divisor = Decimal::from(count.max(1) as u64);
    BatchResolution {
        months: resolution.months,
        leftover_total: resolution.leftover,
        leftover_each: (resolution.leftover / divisor).round_dp(2),
        exact: resolution.exact,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standard() -> TierPrices {
        TierPrices {
            one_month: Some(dec!(10.00)),
            three_month: Some(dec!(24.00)),
            six_month: Some(dec!(45.00)),
            twelve_month: Some(dec!(80.00)),
        }
    }

    fn promo() -> TierPrices {
        TierPrices {
            one_month: None,
            three_month: Some(dec!(20.00)),
            six_month: None,
            twelve_month: None,
        }
    }

    #[test]
    fn exact_tier_prices_resolve_to_their_months() {
        let prices = standard();
        for (amount, months) in [
            (dec!(10.00), 1),
            (dec!(24.00), 3),
            (dec!(45.00), 6),
            (dec!(80.00), 12),
        ] {
            let r = resolve_term(amount, &prices, None, false);
            assert_eq!(r.months, months, "amount {amount}");
            assert_eq!(r.leftover, Decimal::ZERO);
            assert!(r.exact);
        }
    }

    #[test]
    fn two_full_years_pack_to_24_months() {
        let r = resolve_term(dec!(160.00), &standard(), None, false);
        assert_eq!(r.months, 24);
        assert_eq!(r.leftover, Decimal::ZERO);
        assert!(r.exact);
        assert_eq!(r.breakdown, vec![12, 12]);
    }

    #[test]
    fn packing_reports_cent_accurate_leftover() {
        // 80 + 24 + 10 = 114 packed, 3.50 left
        let r = resolve_term(dec!(117.50), &standard(), None, false);
        assert_eq!(r.months, 16);
        assert_eq!(r.leftover, dec!(3.50));
        assert!(!r.exact);
        assert_eq!(r.breakdown, vec![12, 3, 1]);
    }

    #[test]
    fn promo_applies_only_on_first_purchase() {
        let prices = standard();
        let promo = promo();

        let first = resolve_term(dec!(20.00), &prices, Some(&promo), true);
        assert_eq!(first.months, 3);
        assert!(first.exact);

        // Same amount on a renewal ignores the promo and packs instead
        let renewal = resolve_term(dec!(20.00), &prices, Some(&promo), false);
        assert_eq!(renewal.months, 2);
        assert_eq!(renewal.leftover, Decimal::ZERO);
    }

    #[test]
    fn promo_miss_falls_through_to_standard() {
        let r = resolve_term(dec!(24.00), &standard(), Some(&promo()), true);
        assert_eq!(r.months, 3);
        assert!(r.exact);
    }

    #[test]
    fn cent_tolerance_still_matches() {
        let r = resolve_term(dec!(23.99), &standard(), None, false);
        assert_eq!(r.months, 3);
        assert!(r.exact);
        assert_eq!(r.leftover, Decimal::ZERO);
    }

    #[test]
    fn longer_term_wins_a_tie() {
        // 6-month priced the same as 3-month: descending scan prefers 6
        let prices = TierPrices {
            one_month: Some(dec!(10.00)),
            three_month: Some(dec!(30.00)),
            six_month: Some(dec!(30.00)),
            twelve_month: None,
        };
        let r = resolve_term(dec!(30.00), &prices, None, false);
        assert_eq!(r.months, 6);
    }

    #[test]
    fn unpriced_plan_is_unresolvable() {
        let r = resolve_term(dec!(24.00), &TierPrices::default(), None, false);
        assert_eq!(r.months, 0);
        assert_eq!(r.leftover, dec!(24.00));
        assert!(!r.exact);
    }

    #[test]
    fn amount_below_every_tier_is_unresolvable() {
        let r = resolve_term(dec!(4.00), &standard(), None, false);
        assert_eq!(r.months, 0);
        assert_eq!(r.leftover, dec!(4.00));
        assert!(!r.exact);
    }

    #[test]
    fn batch_splits_leftover_evenly() {
        // Two standard subscribers: summed table 20/48/90/160
        let summed = standard().add(&standard());
        let batch = resolve_batch(dec!(53.00), &summed, 2);
        // 48 (3 months) packs, 5.00 left, 2.50 each
        assert_eq!(batch.months, 3);
        assert_eq!(batch.leftover_total, dec!(5.00));
        assert_eq!(batch.leftover_each, dec!(2.50));
        assert!(!batch.exact);
    }

    #[test]
    fn batch_exact_match_has_no_leftover() {
        let summed = standard().add(&standard());
        let batch = resolve_batch(dec!(160.00), &summed, 2);
        assert_eq!(batch.months, 12);
        assert_eq!(batch.leftover_each, Decimal::ZERO);
        assert!(batch.exact);
    }

    #[test]
    fn alignment_line_formats() {
        let exact = resolve_term(dec!(104.00), &standard(), None, false);
        assert_eq!(exact.months, 15);
        assert_eq!(
            exact.alignment_line(dec!(104.00)),
            "Aligned Price: 12+3 month(s) (total 15)"
        );

        let inexact = resolve_term(dec!(117.50), &standard(), None, false);
        assert_eq!(
            inexact.alignment_line(dec!(117.50)),
            "Non-standard amount: $117.50 (leftover $3.50)"
        );
    }
}
