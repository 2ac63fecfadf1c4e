//! # Order Store
//!
//! Read-only order records the tools look up. The store is built once,
//! wrapped in an `Arc` and shared by every session; nothing mutates it.

use crate::error::{Error, Result};
use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

/// A single purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderRecord {
    pub order_id: String,
    pub product_name: String,
    pub customer_name: String,
    pub category: String,
    pub price: Decimal,
    pub days_since_purchase: u32,
    /// Authored with the data, not recomputed from `days_since_purchase`
    pub eligible: bool,
}

impl OrderRecord {
    /// Calendar date of purchase relative to `today`
    pub fn purchase_date(&self, today: NaiveDate) -> NaiveDate {
        today
            .checked_sub_days(Days::new(u64::from(self.days_since_purchase)))
            .unwrap_or(NaiveDate::MIN)
    }
}

/// Immutable mapping from order id to record
#[derive(Debug, Clone, Default)]
pub struct OrderStore {
    orders: BTreeMap<String, OrderRecord>,
}

impl OrderStore {
    pub fn new(records: impl IntoIterator<Item = OrderRecord>) -> Self {
        Self {
            orders: records
                .into_iter()
                .map(|r| (r.order_id.clone(), r))
                .collect(),
        }
    }

    /// The five demo orders every run starts from
    pub fn seeded() -> Self {
        Self::new([
            seed("ORD-001", "Wireless Bluetooth Headphones", "John Smith", "electronics", 7999, 10, true),
            seed("ORD-002", "Smart Fitness Watch", "Sarah Johnson", "electronics", 19999, 35, false),
            seed("ORD-003", "USB-C Charging Cable", "Mike Davis", "accessories", 1599, 5, true),
            seed("ORD-004", "Portable Power Bank", "Emily Chen", "electronics", 4999, 45, false),
            seed("ORD-005", "Laptop Case", "Alex Rodriguez", "accessories", 2499, 20, true),
        ])
    }

    /// Exact, case-sensitive lookup by order id
    pub fn lookup(&self, order_id: &str) -> Result<&OrderRecord> {
        self.orders
            .get(order_id)
            .ok_or_else(|| Error::order_not_found(order_id).with_operation("store::lookup"))
    }

    /// All records in id order
    pub fn orders(&self) -> impl Iterator<Item = &OrderRecord> {
        self.orders.values()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

fn seed(
    order_id: &str,
    product_name: &str,
    customer_name: &str,
    category: &str,
    price_cents: i64,
    days_since_purchase: u32,
    eligible: bool,
) -> OrderRecord {
    OrderRecord {
        order_id: order_id.to_string(),
        product_name: product_name.to_string(),
        customer_name: customer_name.to_string(),
        category: category.to_string(),
        price: Decimal::new(price_cents, 2),
        days_since_purchase,
        eligible,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::policy::RETURN_WINDOW_DAYS;

    #[test]
    fn test_seed_eligibility() {
        let store = OrderStore::seeded();
        let expected = [
            ("ORD-001", true),
            ("ORD-002", false),
            ("ORD-003", true),
            ("ORD-004", false),
            ("ORD-005", true),
        ];

        assert_eq!(store.len(), expected.len());
        for (id, eligible) in expected {
            let record = store.lookup(id).unwrap();
            assert_eq!(record.eligible, eligible, "{}", id);
            assert_eq!(record.eligible, record.days_since_purchase <= RETURN_WINDOW_DAYS, "{}", id);
        }
    }

    #[test]
    fn test_seed_details() {
        let store = OrderStore::seeded();
        let watch = store.lookup("ORD-002").unwrap();
        assert_eq!(watch.product_name, "Smart Fitness Watch");
        assert_eq!(watch.days_since_purchase, 35);
        assert_eq!(watch.price, Decimal::new(19999, 2));
    }

    #[test]
    fn test_unknown_order() {
        let store = OrderStore::seeded();
        let err = store.lookup("ORD-999").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OrderNotFound);
        assert_eq!(err.context_value("order_id"), Some("ORD-999"));

        assert!(store.lookup("").is_err());
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let store = OrderStore::seeded();
        assert!(store.lookup("ORD-001").is_ok());
        assert!(store.lookup("ord-001").is_err_and(|e| e.kind() == ErrorKind::OrderNotFound));
        assert!(store.lookup(" ORD-001").is_err());
    }

    #[test]
    fn test_orders_iterate_in_id_order() {
        let store = OrderStore::seeded();
        let ids: Vec<&str> = store.orders().map(|o| o.order_id.as_str()).collect();
        assert_eq!(ids, vec!["ORD-001", "ORD-002", "ORD-003", "ORD-004", "ORD-005"]);
    }

    #[test]
    fn test_purchase_date() {
        let store = OrderStore::seeded();
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let date = store.lookup("ORD-002").unwrap().purchase_date(today);
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 2, 9).unwrap());
    }
}
