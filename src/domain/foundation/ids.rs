//! Strongly-typed identifier value objects.
//!
//! Local records are keyed by UUIDs. Provider-side identifiers (Stripe
//! `sub_...`, `in_...`) stay plain strings on the entities that carry them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s.trim())?))
            }
        }
    };
}

uuid_id!(
    /// Unique identifier for a local subscription record.
    SubscriptionId
);

uuid_id!(
    /// Unique identifier for a local invoice record.
    InvoiceId
);

uuid_id!(
    /// Unique identifier for a catalog plan.
    PlanId
);

uuid_id!(
    /// Unique identifier for a stored payment method.
    PaymentMethodId
);

uuid_id!(
    /// Unique identifier for a subscription history entry.
    HistoryEntryId
);

uuid_id!(
    /// Unique identifier for the user owning a billing relationship.
    UserId
);
