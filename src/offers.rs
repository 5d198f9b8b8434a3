use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    Result,
    client::Duffel,
    iter::ListIter,
    newtypes::{OfferId, OfferRequestId, PassengerId, ServiceId, check_prefix},
    request::{ParamEncoder, Query},
    types::{Airline, LoyaltyProgrammeAccount, Metadata, OfferRequestPassenger, Slice},
};

const OFFER_ID_PREFIX: &str = "off_";
const OFFER_REQUEST_ID_PREFIX: &str = "orq_";

/// A priced itinerary returned by an airline. Amounts are decimal strings
/// paired with a currency code and are carried untouched.
#[derive(Clone, Debug, Deserialize)]
pub struct Offer {
    pub id: OfferId,
    pub live_mode: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub total_amount: String,
    pub total_currency: String,
    #[serde(default)]
    pub tax_amount: Option<String>,
    #[serde(default)]
    pub tax_currency: Option<String>,
    #[serde(default)]
    pub base_amount: Option<String>,
    #[serde(default)]
    pub base_currency: Option<String>,
    pub owner: Airline,
    #[serde(default)]
    pub slices: Vec<Slice>,
    #[serde(default)]
    pub passengers: Vec<OfferRequestPassenger>,
    #[serde(default)]
    pub partial: bool,
    #[serde(default)]
    pub payment_requirements: Option<PaymentRequirements>,
    /// Populated only when a single offer is fetched with
    /// `return_available_services`.
    #[serde(default)]
    pub available_services: Vec<AvailableService>,
}

/// An extra purchasable service (baggage, seat, meal) offered alongside an
/// offer or order. The metadata shape varies by service type, so it is
/// carried as-is.
#[derive(Clone, Debug, Deserialize)]
pub struct AvailableService {
    pub id: ServiceId,
    #[serde(rename = "type")]
    pub kind: String,
    pub maximum_quantity: u32,
    pub total_amount: String,
    pub total_currency: String,
    #[serde(default)]
    pub passenger_ids: Vec<PassengerId>,
    #[serde(default)]
    pub segment_ids: Vec<String>,
    #[serde(default)]
    pub metadata: Metadata,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PaymentRequirements {
    pub requires_instant_payment: bool,
    #[serde(default)]
    pub price_guarantee_expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub payment_required_by: Option<DateTime<Utc>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferSort {
    TotalAmount,
    TotalDuration,
}

impl OfferSort {
    fn as_str(self) -> &'static str {
        match self {
            OfferSort::TotalAmount => "total_amount",
            OfferSort::TotalDuration => "total_duration",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct ListOffersParams {
    pub sort: Option<OfferSort>,
    pub max_connections: Option<u32>,
}

impl ParamEncoder for ListOffersParams {
    fn encode(&self, query: &mut Query) {
        if let Some(sort) = self.sort {
            query.push(("sort".to_string(), sort.as_str().to_string()));
        }
        if let Some(max_connections) = self.max_connections {
            query.push(("max_connections".to_string(), max_connections.to_string()));
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct GetOfferParams {
    pub return_available_services: bool,
}

impl ParamEncoder for GetOfferParams {
    fn encode(&self, query: &mut Query) {
        if self.return_available_services {
            query.push(("return_available_services".to_string(), "true".to_string()));
        }
    }
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct PassengerUpdateInput {
    pub family_name: String,
    pub given_name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub loyalty_programme_accounts: Vec<LoyaltyProgrammeAccount>,
}

impl Duffel {
    pub fn list_offers(
        &self,
        offer_request_id: &OfferRequestId,
        params: ListOffersParams,
    ) -> ListIter<'_, Offer> {
        if let Err(err) = check_prefix(offer_request_id.as_str(), OFFER_REQUEST_ID_PREFIX) {
            return ListIter::failed(self, err);
        }
        self.request::<ListOffersParams, Offer>()
            .get("/air/offers")
            .with_param("offer_request_id", offer_request_id.as_str())
            .with_params(&params)
            .iter()
    }

    pub async fn get_offer(&self, id: &OfferId, params: GetOfferParams) -> Result<Offer> {
        check_prefix(id.as_str(), OFFER_ID_PREFIX)?;
        self.request::<GetOfferParams, Offer>()
            .get(format!("/air/offers/{id}"))
            .with_params(&params)
            .single()
            .await
    }

    pub async fn update_offer_passenger(
        &self,
        offer_id: &OfferId,
        passenger_id: &PassengerId,
        input: PassengerUpdateInput,
    ) -> Result<OfferRequestPassenger> {
        self.request::<PassengerUpdateInput, OfferRequestPassenger>()
            .patch(
                format!("/air/offers/{offer_id}/passengers/{passenger_id}"),
                &input,
            )
            .single()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_params_encode_in_order() {
        let params = ListOffersParams {
            sort: Some(OfferSort::TotalAmount),
            max_connections: Some(1),
        };
        let mut query = Query::new();
        params.encode(&mut query);
        assert_eq!(
            query,
            vec![
                ("sort".to_string(), "total_amount".to_string()),
                ("max_connections".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn default_params_encode_nothing() {
        let mut query = Query::new();
        ListOffersParams::default().encode(&mut query);
        GetOfferParams::default().encode(&mut query);
        assert!(query.is_empty());
    }
}
