//! Stock ceiling rules for cart lines.
//!
//! A cart line may never hold more units than the product currently has in
//! stock. These functions only compute; the caller is expected to hold a row
//! lock on the product while acting on the result.

use thiserror::Error;

/// Why a requested quantity does not fit under the stock ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StockShortfall {
    /// Adding to an existing line; `available` is how many more units fit.
    #[error("Only {available} more available")]
    Additional { available: i32 },
    /// Creating or overwriting a line; `available` is the whole stock.
    #[error("Only {available} available")]
    Total { available: i32 },
}

impl StockShortfall {
    pub fn available(&self) -> i32 {
        match self {
            StockShortfall::Additional { available } | StockShortfall::Total { available } => {
                *available
            }
        }
    }
}

/// Outcome of setting a line to an explicit quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineChange {
    Set(i32),
    Remove,
}

/// Accept a client supplied quantity only if it is a positive `i32`.
pub fn positive_quantity(raw: i64) -> Option<i32> {
    i32::try_from(raw).ok().filter(|q| *q > 0)
}

/// Quantity a line ends up with after adding `requested` units.
///
/// `current` is the quantity already in the cart for this product, if any.
pub fn quantity_after_add(
    current: Option<i32>,
    requested: i32,
    stock: i32,
) -> Result<i32, StockShortfall> {
    let stock = stock.max(0);
    match current {
        None if requested > stock => Err(StockShortfall::Total { available: stock }),
        None => Ok(requested),
        Some(current) => {
            let wanted = i64::from(current) + i64::from(requested);
            if wanted > i64::from(stock) {
                Err(StockShortfall::Additional {
                    available: (stock - current).max(0),
                })
            } else {
                // wanted <= stock, which is an i32
                Ok(wanted as i32)
            }
        }
    }
}

/// Resolve an explicit quantity update. Zero or negative removes the line.
pub fn quantity_for_update(requested: i64, stock: i32) -> Result<LineChange, StockShortfall> {
    if requested <= 0 {
        return Ok(LineChange::Remove);
    }
    let stock = stock.max(0);
    if requested > i64::from(stock) {
        return Err(StockShortfall::Total { available: stock });
    }
    Ok(LineChange::Set(requested as i32))
}

/// `0 < stock <= threshold`. Products without a threshold are never low.
pub fn is_low_stock(stock: i32, threshold: Option<i32>) -> bool {
    match threshold {
        Some(threshold) => stock > 0 && stock <= threshold,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn second_addition_past_stock_reports_remaining() {
        let first = quantity_after_add(None, 3, 5).unwrap();
        assert_eq!(first, 3);

        let err = quantity_after_add(Some(first), 4, 5).unwrap_err();
        assert_eq!(err, StockShortfall::Additional { available: 2 });
        assert_eq!(err.to_string(), "Only 2 more available");
    }

    #[test]
    fn new_line_above_stock_reports_total() {
        let err = quantity_after_add(None, 6, 5).unwrap_err();
        assert_eq!(err.available(), 5);
        assert_eq!(err.to_string(), "Only 5 available");
    }

    #[test]
    fn line_already_above_stock_reports_zero_more() {
        // stock shrank after the line was written
        let err = quantity_after_add(Some(7), 1, 5).unwrap_err();
        assert_eq!(err, StockShortfall::Additional { available: 0 });
    }

    #[test]
    fn huge_additions_do_not_overflow() {
        let err = quantity_after_add(Some(i32::MAX), i32::MAX, 10).unwrap_err();
        assert_eq!(err, StockShortfall::Additional { available: 0 });
    }

    #[test]
    fn update_to_zero_or_negative_removes() {
        assert_eq!(quantity_for_update(0, 5), Ok(LineChange::Remove));
        assert_eq!(quantity_for_update(-3, 5), Ok(LineChange::Remove));
        assert_eq!(quantity_for_update(5, 5), Ok(LineChange::Set(5)));
        assert_eq!(
            quantity_for_update(6, 5),
            Err(StockShortfall::Total { available: 5 })
        );
    }

    #[test]
    fn positive_quantity_rejects_zero_negative_and_overflow() {
        assert_eq!(positive_quantity(1), Some(1));
        assert_eq!(positive_quantity(0), None);
        assert_eq!(positive_quantity(-1), None);
        assert_eq!(positive_quantity(i64::from(i32::MAX) + 1), None);
    }

    #[test]
    fn low_stock_excludes_empty_and_unset_threshold() {
        assert!(is_low_stock(3, Some(5)));
        assert!(is_low_stock(5, Some(5)));
        assert!(!is_low_stock(0, Some(5)));
        assert!(!is_low_stock(6, Some(5)));
        assert!(!is_low_stock(1, None));
    }

    #[test]
    fn adding_within_stock_to_empty_line_keeps_quantity() {
        proptest!(|(stock in 1i32..10_000, pick in 0.0f64..1.0)| {
            let quantity = 1 + ((stock - 1) as f64 * pick) as i32;
            prop_assert_eq!(quantity_after_add(None, quantity, stock), Ok(quantity));
        });
    }

    #[test]
    fn two_additions_within_stock_sum() {
        proptest!(|(q1 in 1i32..5_000, q2 in 1i32..5_000, slack in 0i32..100)| {
            let stock = q1 + q2 + slack;
            let first = quantity_after_add(None, q1, stock).unwrap();
            prop_assert_eq!(quantity_after_add(Some(first), q2, stock), Ok(q1 + q2));
        });
    }

    #[test]
    fn additions_past_stock_fail_with_remaining() {
        proptest!(|(current in 0i32..5_000, stock in 0i32..5_000, extra in 1i32..5_000)| {
            prop_assume!(current <= stock);
            let requested = stock - current + extra;
            let err = quantity_after_add(Some(current), requested, stock).unwrap_err();
            prop_assert_eq!(err.available(), stock - current);
        });
    }
}
