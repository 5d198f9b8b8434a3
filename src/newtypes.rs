use serde::{Deserialize, Serialize};

use std::fmt::Display;

use crate::{Result, error::Error};

/// Duffel IDs carry a resource-specific prefix; catching a mismatched ID
/// locally beats a round trip that can only 404.
pub(crate) fn check_prefix(id: &str, prefix: &str) -> Result<()> {
    if id.is_empty() {
        Err(Error::Build("id is required".to_string()))
    } else if !id.starts_with(prefix) {
        Err(Error::Build(format!("id should begin with {prefix}")))
    } else {
        Ok(())
    }
}

macro_rules! newtype {
    ($name:ident) => {
        #[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }

        impl $name {
            pub fn new(value: impl Into<String>) -> $name {
                $name(value.into())
            }

            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }

            pub fn into_string(self) -> String {
                self.0
            }
        }
    };
}

newtype!(OfferRequestId);

newtype!(OfferId);

newtype!(OrderId);

newtype!(OrderCancellationId);

newtype!(OrderChangeRequestId);

newtype!(OrderChangeOfferId);

newtype!(OrderChangeId);

newtype!(AirlineInitiatedChangeId);

newtype!(PassengerId);

newtype!(ServiceId);

newtype!(PaymentCardId);

newtype!(LoyaltyProgrammeId);
