//! # Return Policy
//!
//! Fixed policy facts: the return window, per-category conditions and the
//! refund percentage for each return reason.

use rust_decimal::Decimal;
use serde::Serialize;

/// Days after purchase during which a return is accepted
pub const RETURN_WINDOW_DAYS: u32 = 30;

/// Percentage applied to reasons not listed in the reason table
pub const DEFAULT_REFUND_PERCENT: u32 = 100;

const RESTOCKING_NOTE: &str = "No restocking fee for defective items";

/// Policy details for one product category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryPolicy {
    pub category: &'static str,
    pub return_window_days: u32,
    pub condition_required: &'static str,
    pub refund_type: &'static str,
    pub restocking_fee: &'static str,
}

const CATEGORIES: [CategoryPolicy; 3] = [
    CategoryPolicy {
        category: "electronics",
        return_window_days: RETURN_WINDOW_DAYS,
        condition_required: "unopened or defective",
        refund_type: "full refund or exchange",
        restocking_fee: RESTOCKING_NOTE,
    },
    CategoryPolicy {
        category: "accessories",
        return_window_days: RETURN_WINDOW_DAYS,
        condition_required: "unused with original packaging",
        refund_type: "full refund or store credit",
        restocking_fee: RESTOCKING_NOTE,
    },
    CategoryPolicy {
        category: "default",
        return_window_days: RETURN_WINDOW_DAYS,
        condition_required: "unused and in original condition",
        refund_type: "full refund",
        restocking_fee: RESTOCKING_NOTE,
    },
];

/// Reason code -> refund percentage
const REASONS: [(&str, u32); 5] = [
    ("defective", 100),
    ("damaged", 100),
    ("wrong_item", 100),
    ("changed_mind", 90),
    ("unwanted", 90),
];

/// The return policy, shared read-only by every session
#[derive(Debug, Clone, Copy, Default)]
pub struct PolicyFacts;

impl PolicyFacts {
    pub fn new() -> Self {
        Self
    }

    pub fn return_window_days(&self) -> u32 {
        RETURN_WINDOW_DAYS
    }

    /// Policy for `category`; unknown categories get the default policy
    pub fn for_category(&self, category: &str) -> CategoryPolicy {
        let wanted = category.trim().to_lowercase();
        CATEGORIES
            .iter()
            .find(|p| p.category == wanted)
            .copied()
            .unwrap_or(CATEGORIES[2])
    }

    /// Refund percentage for a reason code, as a whole number
    pub fn refund_percent(&self, reason: &str) -> u32 {
        let reason = normalize_reason(reason);
        REASONS
            .iter()
            .find(|(code, _)| *code == reason)
            .map(|(_, pct)| *pct)
            .unwrap_or(DEFAULT_REFUND_PERCENT)
    }

    /// Refund percentage as a fraction (0.90 for 90%)
    pub fn refund_rate(&self, reason: &str) -> Decimal {
        Decimal::new(i64::from(self.refund_percent(reason)), 2)
    }

    /// Full policy as prose, the way it is quoted to customers
    pub fn policy_text(&self) -> String {
        let mut text = format!(
            "Items may be returned within {} days of purchase. \
             Orders older than {} days are not eligible for a return.\n",
            RETURN_WINDOW_DAYS, RETURN_WINDOW_DAYS
        );

        for p in &CATEGORIES {
            text.push_str(&format!(
                "- {}: must be {}; {}.\n",
                p.category, p.condition_required, p.refund_type
            ));
        }

        text.push_str("Refund percentages by return reason:\n");
        for (code, pct) in &REASONS {
            text.push_str(&format!("- {}: {}%\n", code, pct));
        }
        text.push_str(&format!("- any other reason: {}%\n", DEFAULT_REFUND_PERCENT));
        text.push_str(RESTOCKING_NOTE);
        text.push('.');
        text
    }
}

/// Lower-case, trim, and turn spaces and hyphens into underscores
pub fn normalize_reason(reason: &str) -> String {
    reason
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_text_mentions_window_and_carve_outs() {
        let text = PolicyFacts::new().policy_text();
        assert!(text.contains("30 days"));
        assert!(text.contains("electronics"));
        assert!(text.contains("accessories"));
        assert!(text.contains("changed_mind: 90%"));

        let lines: Vec<&str> = text.lines().collect();
        assert!(lines.contains(&"- changed_mind: 90%"));
        assert!(lines.contains(&"- any other reason: 100%"));
        assert_eq!(
            lines.iter().filter(|l| l.starts_with("- ")).count(),
            CATEGORIES.len() + REASONS.len() + 1
        );
    }

    #[test]
    fn test_for_category() {
        let facts = PolicyFacts::new();
        assert_eq!(facts.for_category("Electronics").refund_type, "full refund or exchange");
        assert_eq!(facts.for_category(" accessories ").category, "accessories");
        assert_eq!(facts.for_category("furniture").category, "default");
        assert_eq!(facts.for_category("furniture").return_window_days, 30);
    }

    #[test]
    fn test_refund_percent() {
        let facts = PolicyFacts::new();
        assert_eq!(facts.refund_percent("defective"), 100);
        assert_eq!(facts.refund_percent("Changed Mind"), 90);
        assert_eq!(facts.refund_percent("changed-mind"), 90);
        assert_eq!(facts.refund_percent("general"), 100);
        assert_eq!(facts.refund_percent("because"), 100);
        assert_eq!(facts.refund_rate("unwanted"), Decimal::new(90, 2));
    }

    #[test]
    fn test_normalize_reason() {
        assert_eq!(normalize_reason("  Wrong Item "), "wrong_item");
        assert_eq!(normalize_reason("changed-mind"), "changed_mind");
    }
}
