//! Subscription Plan Catalog
//!
//! The plans offered on the plan-selection page. Amounts are in the
//! deployment currency (ETB by default).

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// A purchasable subscription plan
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanOffer {
    /// Plan name, also used as the human-traceable part of references
    pub name: String,

    /// Short description shown on the plan list
    pub description: String,

    /// Monthly price in the deployment currency
    pub amount: Decimal,
}

impl PlanOffer {
    pub fn new(name: impl Into<String>, description: impl Into<String>, amount: Decimal) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            amount,
        }
    }
}

/// The plans available for purchase
pub fn catalog() -> Vec<PlanOffer> {
    vec![
        PlanOffer::new("Basic", "Standard access for one member", dec!(50)),
        PlanOffer::new("Pro", "Monthly access to premium features", dec!(100)),
        PlanOffer::new("Premium", "All features plus priority support", dec!(200)),
    ]
}

/// Look up a plan by name (case-insensitive)
pub fn find_plan(name: &str) -> Option<PlanOffer> {
    catalog()
        .into_iter()
        .find(|offer| offer.name.eq_ignore_ascii_case(name.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_has_pro_plan() {
        let pro = find_plan("Pro").unwrap();
        assert_eq!(pro.amount, dec!(100));
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert!(find_plan("premium").is_some());
        assert!(find_plan("  basic ").is_some());
        assert!(find_plan("enterprise").is_none());
    }
}
