//! Stored payment methods.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{PaymentMethodId, Timestamp, UserId, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethodKind {
    #[default]
    Card,
    BankAccount,
    Paypal,
}

impl PaymentMethodKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethodKind::Card => "card",
            PaymentMethodKind::BankAccount => "bank_account",
            PaymentMethodKind::Paypal => "paypal",
        }
    }

    /// Human-readable name, e.g. "Bank Account".
    pub fn title(&self) -> &'static str {
        match self {
            PaymentMethodKind::Card => "Card",
            PaymentMethodKind::BankAccount => "Bank Account",
            PaymentMethodKind::Paypal => "Paypal",
        }
    }
}

impl fmt::Display for PaymentMethodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethodKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "card" => Ok(PaymentMethodKind::Card),
            "bank_account" => Ok(PaymentMethodKind::BankAccount),
            "paypal" => Ok(PaymentMethodKind::Paypal),
            other => Err(ValidationError::unknown_variant("payment method kind", other)),
        }
    }
}

/// A customer's saved payment method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: PaymentMethodId,
    pub user_id: UserId,
    pub stripe_payment_method_id: String,
    pub stripe_customer_id: Option<String>,
    pub kind: PaymentMethodKind,
    pub brand: Option<String>,
    pub last4: Option<String>,
    pub exp_month: Option<i32>,
    pub exp_year: Option<i32>,
    pub is_default: bool,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl PaymentMethod {
    pub fn new(
        user_id: UserId,
        stripe_payment_method_id: impl Into<String>,
        kind: PaymentMethodKind,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id: PaymentMethodId::new(),
            user_id,
            stripe_payment_method_id: stripe_payment_method_id.into(),
            stripe_customer_id: None,
            kind,
            brand: None,
            last4: None,
            exp_month: None,
            exp_year: None,
            is_default: false,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_card(mut self, brand: impl Into<String>, last4: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self.last4 = Some(last4.into());
        self
    }

    /// Label shown in account settings, e.g. "VISA ****4242".
    pub fn display_label(&self) -> String {
        match self.kind {
            PaymentMethodKind::Card => {
                let brand = self
                    .brand
                    .as_deref()
                    .filter(|b| !b.is_empty())
                    .map(str::to_uppercase)
                    .unwrap_or_else(|| "Card".to_string());
                format!("{} ****{}", brand, self.last4.as_deref().unwrap_or(""))
            }
            other => format!("{} Payment Method", other.title()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_label_uppercases_brand() {
        let pm = PaymentMethod::new(UserId::new(), "pm_1", PaymentMethodKind::Card)
            .with_card("visa", "4242");
        assert_eq!(pm.display_label(), "VISA ****4242");
    }

    #[test]
    fn card_without_brand_falls_back() {
        let mut pm = PaymentMethod::new(UserId::new(), "pm_1", PaymentMethodKind::Card);
        pm.last4 = Some("1881".to_string());
        assert_eq!(pm.display_label(), "Card ****1881");
    }

    #[test]
    fn non_card_kinds_use_title() {
        let bank = PaymentMethod::new(UserId::new(), "pm_2", PaymentMethodKind::BankAccount);
        let paypal = PaymentMethod::new(UserId::new(), "pm_3", PaymentMethodKind::Paypal);

        assert_eq!(bank.display_label(), "Bank Account Payment Method");
        assert_eq!(paypal.display_label(), "Paypal Payment Method");
    }

    #[test]
    fn kind_parses_storage_strings() {
        assert_eq!(
            "bank_account".parse::<PaymentMethodKind>().unwrap(),
            PaymentMethodKind::BankAccount
        );
        assert!("crypto".parse::<PaymentMethodKind>().is_err());
    }
}
