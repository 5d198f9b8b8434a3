use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Result, client::Duffel, newtypes::PaymentCardId, request::EmptyPayload};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentCardBrand {
    Visa,
    Uatp,
    Mastercard,
    AmericanExpress,
    DinersClub,
    Jcb,
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PaymentCard {
    pub id: PaymentCardId,
    pub live_mode: bool,
    pub last_4_digits: String,
    /// Whether the card is saved for future use rather than held temporarily.
    pub multi_use: bool,
    pub brand: PaymentCardBrand,
    #[serde(default)]
    pub unavailable_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct CreatePaymentCardInput {
    pub address_city: String,
    pub address_country_code: String,
    pub address_line_1: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_line_2: Option<String>,
    pub address_postal_code: String,
    pub address_region: String,
    pub expiry_month: String,
    pub expiry_year: String,
    pub name: String,
    pub number: String,
    #[serde(rename = "cvc")]
    pub security_code: String,
    pub multi_use: bool,
}

/// Mints a temporary card record from a previously saved multi-use card.
#[derive(Clone, Debug, Serialize)]
pub struct SavedPaymentCardInput {
    pub card_id: PaymentCardId,
    #[serde(rename = "cvc")]
    pub security_code: String,
}

impl Duffel {
    pub async fn create_payment_card(&self, input: CreatePaymentCardInput) -> Result<PaymentCard> {
        self.request::<CreatePaymentCardInput, PaymentCard>()
            .post("/vault/cards", &input)
            .single()
            .await
    }

    pub async fn create_temporary_payment_card_from_saved(
        &self,
        input: SavedPaymentCardInput,
    ) -> Result<PaymentCard> {
        self.request::<SavedPaymentCardInput, PaymentCard>()
            .post("/vault/cards", &input)
            .single()
            .await
    }

    pub async fn delete_saved_payment_card(&self, id: &PaymentCardId) -> Result<()> {
        self.request::<EmptyPayload, EmptyPayload>()
            .delete(format!("/vault/cards/{id}"))
            .empty()
            .await
    }
}
