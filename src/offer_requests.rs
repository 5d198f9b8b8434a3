use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    Result,
    client::Duffel,
    iter::ListIter,
    newtypes::{OfferId, OfferRequestId},
    offers::Offer,
    request::{EmptyPayload, ParamEncoder, Query},
    types::{CabinClass, OfferRequestPassenger, OfferRequestSlice, PrivateFares, Slice},
};

#[derive(Clone, Debug, Default, Serialize)]
pub struct OfferRequestInput {
    pub passengers: Vec<OfferRequestPassenger>,
    pub slices: Vec<OfferRequestSlice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cabin_class: Option<CabinClass>,
    /// Maximum connections within any slice; 0 means direct flights only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<u32>,
    #[serde(skip_serializing_if = "PrivateFares::is_empty")]
    pub private_fares: PrivateFares,
    /// Sent as a query parameter, not in the body. When true the created
    /// offer request includes every offer returned by the airlines.
    #[serde(skip)]
    pub return_offers: bool,
    /// Maximum time in milliseconds to wait for each airline to respond.
    #[serde(skip)]
    pub supplier_timeout: Option<u32>,
}

impl ParamEncoder for OfferRequestInput {
    fn encode(&self, query: &mut Query) {
        query.push(("return_offers".to_string(), self.return_offers.to_string()));
        if let Some(timeout) = self.supplier_timeout {
            query.push(("supplier_timeout".to_string(), timeout.to_string()));
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct OfferRequest {
    pub id: OfferRequestId,
    /// For embedding Duffel's ancillaries component.
    #[serde(default)]
    pub client_key: Option<String>,
    pub live_mode: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub slices: Vec<Slice>,
    #[serde(default)]
    pub passengers: Vec<OfferRequestPassenger>,
    #[serde(default)]
    pub cabin_class: Option<CabinClass>,
    #[serde(default)]
    pub offers: Vec<Offer>,
}

/// Selects offers from a partial offer request. The selected ids are sent
/// as a repeated `selected_partial_offer[]` query parameter.
#[derive(Clone, Debug, Serialize)]
pub struct PartialOfferRequestInput {
    pub partial_offer_request_id: OfferRequestId,
    pub selected_partial_offers: Vec<OfferId>,
}

impl ParamEncoder for PartialOfferRequestInput {
    fn encode(&self, query: &mut Query) {
        for offer in &self.selected_partial_offers {
            query.push((
                "selected_partial_offer[]".to_string(),
                offer.as_str().to_string(),
            ));
        }
    }
}

impl Duffel {
    pub async fn create_offer_request(&self, input: OfferRequestInput) -> Result<OfferRequest> {
        self.request::<OfferRequestInput, OfferRequest>()
            .post("/air/offer_requests", &input)
            .with_params(&input)
            .single()
            .await
    }

    pub async fn get_offer_request(&self, id: &OfferRequestId) -> Result<OfferRequest> {
        self.request::<EmptyPayload, OfferRequest>()
            .get(format!("/air/offer_requests/{id}"))
            .single()
            .await
    }

    /// Searches one slice at a time for multi-step booking flows; the
    /// returned offers stay partial until their fares are fetched.
    pub async fn create_partial_offer_request(
        &self,
        input: OfferRequestInput,
    ) -> Result<OfferRequest> {
        self.request::<OfferRequestInput, OfferRequest>()
            .post("/air/partial_offer_requests", &input)
            .single()
            .await
    }

    pub async fn get_partial_offer_request(
        &self,
        input: PartialOfferRequestInput,
    ) -> Result<OfferRequest> {
        self.request::<PartialOfferRequestInput, OfferRequest>()
            .get(format!(
                "/air/partial_offer_requests/{}",
                input.partial_offer_request_id
            ))
            .with_params(&input)
            .single()
            .await
    }

    /// Prices the selected partial offers into full, bookable offers.
    pub async fn get_full_partial_offer_request(
        &self,
        input: PartialOfferRequestInput,
    ) -> Result<OfferRequest> {
        self.request::<PartialOfferRequestInput, OfferRequest>()
            .get(format!(
                "/air/partial_offer_requests/{}/fares",
                input.partial_offer_request_id
            ))
            .with_params(&input)
            .single()
            .await
    }

    pub fn list_offer_requests(&self) -> ListIter<'_, OfferRequest> {
        self.request::<EmptyPayload, OfferRequest>()
            .get("/air/offer_requests")
            .iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PrivateFare;

    #[test]
    fn selected_partial_offers_encode_as_repeated_keys() {
        let input = PartialOfferRequestInput {
            partial_offer_request_id: OfferRequestId::new("orq_123"),
            selected_partial_offers: vec![OfferId::new("off_1"), OfferId::new("off_2")],
        };
        let mut query = Query::new();
        input.encode(&mut query);
        assert_eq!(
            query,
            vec![
                ("selected_partial_offer[]".to_string(), "off_1".to_string()),
                ("selected_partial_offer[]".to_string(), "off_2".to_string()),
            ]
        );
    }

    #[test]
    fn private_fares_serialize_keyed_by_airline() {
        let mut input = OfferRequestInput::default();
        input.private_fares.insert(
            "BA".to_string(),
            vec![PrivateFare {
                corporate_code: Some("FLX53".to_string()),
                ..Default::default()
            }],
        );
        let body = serde_json::to_value(&input).unwrap();
        assert_eq!(body["private_fares"]["BA"][0]["corporate_code"], "FLX53");
        assert!(body["private_fares"]["BA"][0].get("tour_code").is_none());

        let empty = serde_json::to_value(&OfferRequestInput::default()).unwrap();
        assert!(empty.get("private_fares").is_none());
    }

    #[test]
    fn body_excludes_query_only_fields() {
        let input = OfferRequestInput {
            slices: vec![OfferRequestSlice {
                origin: "LHR".to_string(),
                destination: "JFK".to_string(),
                departure_date: chrono::NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
            }],
            return_offers: true,
            supplier_timeout: Some(10_000),
            ..Default::default()
        };
        let body = serde_json::to_value(&input).unwrap();
        assert!(body.get("return_offers").is_none());
        assert!(body.get("supplier_timeout").is_none());
        assert_eq!(body["slices"][0]["origin"], "LHR");

        let mut query = Query::new();
        input.encode(&mut query);
        assert_eq!(
            query,
            vec![
                ("return_offers".to_string(), "true".to_string()),
                ("supplier_timeout".to_string(), "10000".to_string()),
            ]
        );
    }
}
