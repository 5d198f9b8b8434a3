use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::newtypes::PassengerId;

/// Free-form key-value pairs attached to an object; the server stores them
/// untouched.
pub type Metadata = HashMap<String, serde_json::Value>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CabinClass {
    First,
    Business,
    PremiumEconomy,
    Economy,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassengerType {
    Adult,
    Child,
    InfantWithoutSeat,
}

/// Serialized as the single letters the API expects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "m")]
    Male,
    #[serde(rename = "f")]
    Female,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassengerTitle {
    Mr,
    Mrs,
    Ms,
    Miss,
    Dr,
}

/// How an order (or refund) is paid: the Duffel balance, ARC/BSP cash, or a
/// vault card.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Balance,
    ArcBspCash,
    Card,
    #[serde(other)]
    Unknown,
}

/// One payment against an order. The amount is the offer's decimal string
/// echoed back, not recomputed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PaymentCreateInput {
    #[serde(rename = "type")]
    pub kind: PaymentMethod,
    pub amount: String,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_id: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Airline {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub iata_code: Option<String>,
}

/// An airport or city endpoint of a slice.
#[derive(Clone, Debug, Deserialize)]
pub struct Place {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub iata_code: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

/// One leg of a journey as returned by the server. Distinct from the request
/// shape, which carries plain IATA codes.
#[derive(Clone, Debug, Deserialize)]
pub struct Slice {
    #[serde(default)]
    pub id: Option<String>,
    pub origin: Place,
    pub destination: Place,
    #[serde(default)]
    pub departure_date: Option<NaiveDate>,
    #[serde(default)]
    pub duration: Option<String>,
}

/// One requested leg: origin and destination as IATA codes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OfferRequestSlice {
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
}

/// A private fare code negotiated with an airline. The corporate and tour
/// codes come from the airline; the tracking reference identifies your
/// business to it.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PrivateFare {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corporate_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tour_code: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// Private fares keyed by the IATA code of the airline that issued them.
pub type PrivateFares = HashMap<String, Vec<PrivateFare>>;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoyaltyProgrammeAccount {
    pub airline_iata_code: String,
    pub account_number: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct OfferRequestPassenger {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<PassengerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    /// Age and type are mutually exclusive; airlines map ages to types
    /// differently, so the same passenger may come back as a different type
    /// in different offers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u8>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub loyalty_programme_accounts: Vec<LoyaltyProgrammeAccount>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<PassengerType>,
}
