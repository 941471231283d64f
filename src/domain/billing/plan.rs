//! Plan catalog entity.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{round_money, Currency, PlanId, Timestamp, ValidationError};

/// How often a plan is billed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingInterval {
    #[default]
    Month,
    Year,
    Week,
    Day,
}

impl BillingInterval {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingInterval::Month => "month",
            BillingInterval::Year => "year",
            BillingInterval::Week => "week",
            BillingInterval::Day => "day",
        }
    }
}

impl fmt::Display for BillingInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BillingInterval {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "month" => Ok(BillingInterval::Month),
            "year" => Ok(BillingInterval::Year),
            "week" => Ok(BillingInterval::Week),
            "day" => Ok(BillingInterval::Day),
            other => Err(ValidationError::unknown_variant("billing interval", other)),
        }
    }
}

/// A purchasable plan mapped to a Stripe price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: PlanId,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub currency: Currency,
    pub interval: BillingInterval,
    pub stripe_price_id: Option<String>,
    pub stripe_product_id: Option<String>,
    /// Feature names shown on the pricing page.
    pub features: JsonValue,
    /// Usage limits keyed by resource name.
    pub limits: JsonValue,
    pub is_active: bool,
    pub is_popular: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Plan {
    pub fn new(name: impl Into<String>, price: Decimal, interval: BillingInterval) -> Self {
        let now = Timestamp::now();
        Self {
            id: PlanId::new(),
            name: name.into(),
            description: None,
            price,
            currency: Currency::usd(),
            interval,
            stripe_price_id: None,
            stripe_product_id: None,
            features: JsonValue::Array(Vec::new()),
            limits: JsonValue::Object(Default::default()),
            is_active: true,
            is_popular: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_stripe_price(mut self, price_id: impl Into<String>) -> Self {
        self.stripe_price_id = Some(price_id.into());
        self
    }

    /// Price normalized to a month, rounded to two places.
    pub fn monthly_price(&self) -> Decimal {
        let monthly = match self.interval {
            BillingInterval::Month => self.price,
            BillingInterval::Year => self.price / Decimal::from(12),
            BillingInterval::Week => self.price * Decimal::new(433, 2),
            BillingInterval::Day => self.price * Decimal::new(3044, 2),
        };
        round_money(monthly)
    }
}
