//! # Refund Calculator

use crate::error::{Error, Result};
use crate::policy::{normalize_reason, PolicyFacts};
use crate::store::OrderStore;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::sync::Arc;

pub const REFUND_METHOD: &str = "Original payment method";
pub const PROCESSING_TIME: &str = "5-7 business days";

/// Breakdown of a refund for an eligible order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefundQuote {
    pub order_id: String,
    pub reason: String,
    pub original_price: Decimal,
    pub refund_percent: u32,
    pub refund_amount: Decimal,
    pub withheld_amount: Decimal,
    pub refund_method: &'static str,
    pub processing_time: &'static str,
}

/// Computes refunds from the order store and the policy facts
#[derive(Debug, Clone)]
pub struct RefundCalculator {
    store: Arc<OrderStore>,
    policy: PolicyFacts,
}

impl RefundCalculator {
    pub fn new(store: Arc<OrderStore>, policy: PolicyFacts) -> Self {
        Self { store, policy }
    }

    /// Refund for `order_id` returned for `reason`.
    ///
    /// Fails with `OrderNotFound` for unknown ids and `ReturnIneligible`
    /// when the order is past the window or flagged ineligible, whatever
    /// the reason.
    pub fn calculate(&self, order_id: &str, reason: &str) -> Result<RefundQuote> {
        let order = self
            .store
            .lookup(order_id)
            .map_err(|e| e.with_operation("refund::calculate"))?;

        let window = self.policy.return_window_days();
        if order.days_since_purchase > window || !order.eligible {
            let detail = format!(
                "order {} was purchased {} days ago; returns are accepted within {} days",
                order.order_id, order.days_since_purchase, window
            );
            return Err(Error::return_ineligible(&order.order_id, detail)
                .with_operation("refund::calculate")
                .with_context("days_since_purchase", order.days_since_purchase.to_string()));
        }

        let percent = self.policy.refund_percent(reason);
        let refund_amount = round_currency(order.price * self.policy.refund_rate(reason));

        Ok(RefundQuote {
            order_id: order.order_id.clone(),
            reason: normalize_reason(reason),
            original_price: order.price,
            refund_percent: percent,
            refund_amount,
            withheld_amount: order.price - refund_amount,
            refund_method: REFUND_METHOD,
            processing_time: PROCESSING_TIME,
        })
    }
}

/// Round to cents, halves away from zero
pub fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn calculator() -> RefundCalculator {
        RefundCalculator::new(Arc::new(OrderStore::seeded()), PolicyFacts::new())
    }

    fn cents(value: i64) -> Decimal {
        Decimal::new(value, 2)
    }

    #[test]
    fn test_pinned_refunds_for_eligible_orders() {
        let calc = calculator();
        let cases = [
            ("ORD-001", "defective", 7999),
            ("ORD-001", "changed_mind", 7199),
            ("ORD-001", "unwanted", 7199),
            ("ORD-001", "general", 7999),
            ("ORD-003", "defective", 1599),
            ("ORD-003", "changed_mind", 1439),
            ("ORD-003", "unwanted", 1439),
            ("ORD-003", "general", 1599),
            ("ORD-005", "defective", 2499),
            ("ORD-005", "changed_mind", 2249),
            ("ORD-005", "unwanted", 2249),
            ("ORD-005", "general", 2499),
        ];

        for (order_id, reason, expected) in cases {
            let quote = calc.calculate(order_id, reason).unwrap();
            assert_eq!(quote.refund_amount, cents(expected), "{} / {}", order_id, reason);
            assert_eq!(quote.original_price - quote.refund_amount, quote.withheld_amount);
        }
    }

    #[test]
    fn test_ineligible_orders_reject_every_reason() {
        let calc = calculator();
        for order_id in ["ORD-002", "ORD-004"] {
            for reason in ["defective", "changed_mind", "unwanted", "general", ""] {
                let err = calc.calculate(order_id, reason).unwrap_err();
                assert_eq!(err.kind(), ErrorKind::ReturnIneligible, "{} / {}", order_id, reason);
                assert!(err.message().contains("30 days"));
            }
        }
    }

    #[test]
    fn test_unknown_order() {
        let err = calculator().calculate("ORD-404", "defective").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OrderNotFound);
        assert_eq!(err.operation(), "refund::calculate");
    }

    #[test]
    fn test_unrecognized_reason_falls_back_to_default() {
        let quote = calculator().calculate("ORD-003", "it spoke to me").unwrap();
        assert_eq!(quote.refund_percent, 100);
        assert_eq!(quote.refund_amount, cents(1599));
        assert_eq!(quote.reason, "it_spoke_to_me");
    }

    #[test]
    fn test_flag_overrides_days() {
        let mut record = OrderStore::seeded().lookup("ORD-001").unwrap().clone();
        record.eligible = false;
        let calc = RefundCalculator::new(Arc::new(OrderStore::new([record])), PolicyFacts::new());
        let err = calc.calculate("ORD-001", "defective").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ReturnIneligible);
    }

    #[test]
    fn test_round_currency_half_away_from_zero() {
        assert_eq!(round_currency(Decimal::new(2345, 3)), cents(235));
        assert_eq!(round_currency(Decimal::new(2344, 3)), cents(234));
        assert_eq!(round_currency(Decimal::new(71991, 3)), cents(7199));
    }
}
