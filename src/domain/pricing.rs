//! Money arithmetic. Amounts are integer minor units; discounts are basis
//! points (1 bp = 0.01 %).

use chrono::{DateTime, Utc};

pub const BASIS_POINTS: i64 = 10_000;

pub fn line_total(quantity: i32, unit_price: i64) -> i64 {
    i64::from(quantity) * unit_price
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CartTotals {
    pub total_items: i64,
    pub total_price: i64,
    pub items_count: i64,
}

/// Fold `(quantity, unit_price)` pairs into cart totals.
pub fn cart_totals<I>(lines: I) -> CartTotals
where
    I: IntoIterator<Item = (i32, i64)>,
{
    lines
        .into_iter()
        .fold(CartTotals::default(), |acc, (quantity, price)| CartTotals {
            total_items: acc.total_items + i64::from(quantity),
            total_price: acc.total_price + line_total(quantity, price),
            items_count: acc.items_count + 1,
        })
}

/// A deal as seen by discount resolution.
#[derive(Debug, Clone, Copy)]
pub struct DealWindow {
    pub discount_bps: i32,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub is_active: bool,
}

impl DealWindow {
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.starts_at <= now && now <= self.ends_at
    }
}

/// Discount of the live deal that wins, if any.
///
/// When several deals are live at once the largest discount wins.
pub fn live_deal_discount(deals: &[DealWindow], now: DateTime<Utc>) -> Option<i32> {
    deals
        .iter()
        .filter(|deal| deal.is_live(now))
        .map(|deal| deal.discount_bps)
        .max()
}

/// Discount in basis points: live deal first, then the compare-at markdown
/// rounded to a whole percent, otherwise zero.
pub fn discount_bps(
    price: i64,
    compare_at_price: Option<i64>,
    deals: &[DealWindow],
    now: DateTime<Utc>,
) -> i32 {
    if let Some(bps) = live_deal_discount(deals, now).filter(|bps| *bps > 0) {
        return bps;
    }
    match compare_at_price {
        Some(compare) if compare > price && compare > 0 => {
            let percent = div_round_half_up((compare - price) * 100, compare);
            (percent * 100) as i32
        }
        _ => 0,
    }
}

pub fn is_on_sale(
    price: i64,
    compare_at_price: Option<i64>,
    deals: &[DealWindow],
    now: DateTime<Utc>,
) -> bool {
    compare_at_price.is_some_and(|compare| compare > price)
        || deals.iter().any(|deal| deal.is_live(now))
}

/// Price after applying a discount, rounded half-up to the minor unit.
pub fn discounted_price(price: i64, discount_bps: i32) -> i64 {
    let bps = i64::from(discount_bps.clamp(0, BASIS_POINTS as i32));
    price - div_round_half_up(price * bps, BASIS_POINTS)
}

pub fn bps_to_percent(bps: i32) -> f64 {
    f64::from(bps) / 100.0
}

fn div_round_half_up(numerator: i64, denominator: i64) -> i64 {
    (numerator * 2 + denominator) / (denominator * 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use proptest::prelude::*;

    fn window(bps: i32, active: bool, now: DateTime<Utc>) -> DealWindow {
        DealWindow {
            discount_bps: bps,
            starts_at: now - Duration::days(1),
            ends_at: now + Duration::days(1),
            is_active: active,
        }
    }

    #[test]
    fn empty_cart_totals_are_zero() {
        assert_eq!(cart_totals(Vec::new()), CartTotals::default());
    }

    #[test]
    fn totals_follow_quantity_times_price() {
        let totals = cart_totals(vec![(2, 1_500), (1, 300)]);
        assert_eq!(totals.total_items, 3);
        assert_eq!(totals.total_price, 3_300);
        assert_eq!(totals.items_count, 2);
    }

    #[test]
    fn total_price_is_sum_of_line_totals() {
        proptest!(|(lines in proptest::collection::vec((1i32..1_000, 0i64..1_000_000), 0..20))| {
            let expected: i64 = lines.iter().map(|(q, p)| i64::from(*q) * p).sum();
            let totals = cart_totals(lines.clone());
            prop_assert_eq!(totals.total_price, expected);
            prop_assert_eq!(totals.items_count, lines.len() as i64);
        });
    }

    #[test]
    fn live_deal_beats_compare_at_price() {
        let now = Utc::now();
        let deals = [window(1_050, true, now)];
        assert_eq!(discount_bps(9_000, Some(10_000), &deals, now), 1_050);
    }

    #[test]
    fn largest_of_several_live_deals_wins() {
        let now = Utc::now();
        let deals = [window(500, true, now), window(2_000, true, now), window(9_000, false, now)];
        assert_eq!(discount_bps(10_000, None, &deals, now), 2_000);
    }

    #[test]
    fn expired_deal_falls_back_to_compare_at() {
        let now = Utc::now();
        let expired = DealWindow {
            discount_bps: 3_000,
            starts_at: now - Duration::days(10),
            ends_at: now - Duration::days(1),
            is_active: true,
        };
        // (1200 - 900) / 1200 = 25 %
        assert_eq!(discount_bps(900, Some(1_200), &[expired], now), 2_500);
        assert!(is_on_sale(900, Some(1_200), &[expired], now));
        assert!(!is_on_sale(900, None, &[expired], now));
    }

    #[test]
    fn compare_at_percent_rounds_to_whole_number() {
        let now = Utc::now();
        // 1/3 off -> 33 %
        assert_eq!(discount_bps(2_000, Some(3_000), &[], now), 3_300);
        // compare-at below price is ignored
        assert_eq!(discount_bps(2_000, Some(1_000), &[], now), 0);
    }

    #[test]
    fn discounted_price_rounds_half_up() {
        assert_eq!(discounted_price(10_000, 1_050), 8_950);
        assert_eq!(discounted_price(999, 5_000), 499);
        assert_eq!(discounted_price(500, 0), 500);
        assert_eq!(discounted_price(500, 20_000), 0);
    }
}
