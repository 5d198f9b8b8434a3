//! Changing a paid order is a three-step flow: create an order change
//! request describing the slices to swap, pick one of the priced order
//! change offers it yields, create a pending order change from that offer,
//! then confirm it with a payment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    Result,
    client::Duffel,
    iter::ListIter,
    newtypes::{OrderChangeId, OrderChangeOfferId, OrderChangeRequestId, OrderId, check_prefix},
    request::{EmptyPayload, ParamEncoder, Query},
    types::{CabinClass, PaymentCreateInput, PaymentMethod, PrivateFares, Slice},
};

const ORDER_CHANGE_REQUEST_ID_PREFIX: &str = "ocr_";
const ORDER_CHANGE_OFFER_ID_PREFIX: &str = "oco_";
const ORDER_CHANGE_ID_PREFIX: &str = "oce_";

#[derive(Clone, Debug, Deserialize)]
pub struct OrderChangeRequest {
    pub id: OrderChangeRequestId,
    pub order_id: OrderId,
    pub live_mode: bool,
    #[serde(default)]
    pub slices: Option<SliceChangeset>,
    #[serde(default)]
    pub order_change_offers: Vec<OrderChangeOffer>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A priced way of making the requested change. Amounts are decimal strings
/// paired with a currency code and are carried untouched.
#[derive(Clone, Debug, Deserialize)]
pub struct OrderChangeOffer {
    pub id: OrderChangeOfferId,
    /// Set once an order change has been created from this offer.
    #[serde(default)]
    pub order_change_id: Option<OrderChangeId>,
    #[serde(default)]
    pub slices: Option<SliceChangeset>,
    #[serde(default)]
    pub refund_to: Option<PaymentMethod>,
    pub change_total_amount: String,
    pub change_total_currency: String,
    pub new_total_amount: String,
    pub new_total_currency: String,
    pub penalty_total_amount: String,
    pub penalty_total_currency: String,
    pub live_mode: bool,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A pending or confirmed change to an order.
#[derive(Clone, Debug, Deserialize)]
pub struct OrderChange {
    pub id: OrderChangeId,
    pub order_id: OrderId,
    #[serde(default)]
    pub slices: Option<SliceChangeset>,
    #[serde(default)]
    pub refund_to: Option<PaymentMethod>,
    pub change_total_amount: String,
    pub change_total_currency: String,
    pub new_total_amount: String,
    pub new_total_currency: String,
    pub penalty_total_amount: String,
    pub penalty_total_currency: String,
    pub live_mode: bool,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub confirmed_at: Option<DateTime<Utc>>,
}

/// Slices a change adds and removes, as echoed back by the server.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SliceChangeset {
    #[serde(default)]
    pub add: Vec<Slice>,
    #[serde(default)]
    pub remove: Vec<Slice>,
}

/// The slices of an existing paid order to remove, and search criteria for
/// the slices to add in their place.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SliceChange {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub add: Vec<SliceAdd>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub remove: Vec<SliceRemove>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SliceAdd {
    pub origin: String,
    pub destination: String,
    pub departure_date: chrono::NaiveDate,
    pub cabin_class: CabinClass,
}

#[derive(Clone, Debug, Serialize)]
pub struct SliceRemove {
    pub slice_id: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct OrderChangeRequestInput {
    pub order_id: OrderId,
    /// Keyed by the IATA code of the airline that issued the fare.
    #[serde(skip_serializing_if = "PrivateFares::is_empty")]
    pub private_fares: PrivateFares,
    pub slices: SliceChange,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderChangeOfferSort {
    ChangeTotalAmount,
    TotalDuration,
}

impl OrderChangeOfferSort {
    fn as_str(self) -> &'static str {
        match self {
            OrderChangeOfferSort::ChangeTotalAmount => "change_total_amount",
            OrderChangeOfferSort::TotalDuration => "total_duration",
        }
    }
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct ListOrderChangeOffersParams {
    pub order_change_request_id: Option<OrderChangeRequestId>,
    pub sort: Option<OrderChangeOfferSort>,
    pub max_connections: Option<u32>,
}

impl ParamEncoder for ListOrderChangeOffersParams {
    fn encode(&self, query: &mut Query) {
        if let Some(id) = &self.order_change_request_id {
            query.push(("order_change_request_id".to_string(), id.as_str().to_string()));
        }
        if let Some(sort) = self.sort {
            query.push(("sort".to_string(), sort.as_str().to_string()));
        }
        if let Some(max_connections) = self.max_connections {
            query.push(("max_connections".to_string(), max_connections.to_string()));
        }
    }
}

#[derive(Clone, Debug, Serialize)]
struct PendingOrderChangeInput<'a> {
    selected_order_change_offer: &'a OrderChangeOfferId,
}

impl Duffel {
    pub async fn create_order_change_request(
        &self,
        input: OrderChangeRequestInput,
    ) -> Result<OrderChangeRequest> {
        self.request::<OrderChangeRequestInput, OrderChangeRequest>()
            .post("/air/order_change_requests", &input)
            .single()
            .await
    }

    pub async fn get_order_change_request(
        &self,
        id: &OrderChangeRequestId,
    ) -> Result<OrderChangeRequest> {
        check_prefix(id.as_str(), ORDER_CHANGE_REQUEST_ID_PREFIX)?;
        self.request::<EmptyPayload, OrderChangeRequest>()
            .get(format!("/air/order_change_requests/{id}"))
            .single()
            .await
    }

    /// Creates a pending order change from a selected change offer; confirm
    /// it to apply the change.
    pub async fn create_pending_order_change(
        &self,
        offer_id: &OrderChangeOfferId,
    ) -> Result<OrderChange> {
        check_prefix(offer_id.as_str(), ORDER_CHANGE_OFFER_ID_PREFIX)?;
        self.request::<PendingOrderChangeInput<'_>, OrderChange>()
            .post(
                "/air/order_changes",
                &PendingOrderChangeInput {
                    selected_order_change_offer: offer_id,
                },
            )
            .single()
            .await
    }

    pub async fn confirm_order_change(
        &self,
        id: &OrderChangeId,
        payment: PaymentCreateInput,
    ) -> Result<OrderChange> {
        check_prefix(id.as_str(), ORDER_CHANGE_ID_PREFIX)?;
        self.request::<PaymentCreateInput, OrderChange>()
            .post(format!("/air/order_changes/{id}/actions/confirm"), &payment)
            .single()
            .await
    }

    pub async fn get_order_change(&self, id: &OrderChangeId) -> Result<OrderChange> {
        check_prefix(id.as_str(), ORDER_CHANGE_ID_PREFIX)?;
        self.request::<EmptyPayload, OrderChange>()
            .get(format!("/air/order_changes/{id}"))
            .single()
            .await
    }

    pub async fn get_order_change_offer(
        &self,
        id: &OrderChangeOfferId,
    ) -> Result<OrderChangeOffer> {
        check_prefix(id.as_str(), ORDER_CHANGE_OFFER_ID_PREFIX)?;
        self.request::<EmptyPayload, OrderChangeOffer>()
            .get(format!("/air/order_change_offers/{id}"))
            .single()
            .await
    }

    pub fn list_order_change_offers(
        &self,
        params: ListOrderChangeOffersParams,
    ) -> ListIter<'_, OrderChangeOffer> {
        self.request::<ListOrderChangeOffersParams, OrderChangeOffer>()
            .get("/air/order_change_offers")
            .with_params(&params)
            .iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_request_body_omits_empty_sides() {
        let input = OrderChangeRequestInput {
            order_id: OrderId::new("ord_123"),
            private_fares: PrivateFares::new(),
            slices: SliceChange {
                add: vec![SliceAdd {
                    origin: "LHR".to_string(),
                    destination: "JFK".to_string(),
                    departure_date: chrono::NaiveDate::from_ymd_opt(2026, 9, 14).unwrap(),
                    cabin_class: CabinClass::Economy,
                }],
                remove: Vec::new(),
            },
        };
        let body = serde_json::to_value(&input).unwrap();
        assert_eq!(body["order_id"], "ord_123");
        assert_eq!(body["slices"]["add"][0]["cabin_class"], "economy");
        assert!(body["slices"].get("remove").is_none());
        assert!(body.get("private_fares").is_none());
    }

    #[test]
    fn list_params_encode_in_order() {
        let params = ListOrderChangeOffersParams {
            order_change_request_id: Some(OrderChangeRequestId::new("ocr_123")),
            sort: Some(OrderChangeOfferSort::ChangeTotalAmount),
            max_connections: Some(2),
        };
        let mut query = Query::new();
        params.encode(&mut query);
        assert_eq!(
            query,
            vec![
                ("order_change_request_id".to_string(), "ocr_123".to_string()),
                ("sort".to_string(), "change_total_amount".to_string()),
                ("max_connections".to_string(), "2".to_string()),
            ]
        );
    }

    #[test]
    fn rejects_mismatched_change_offer_id() {
        let client = Duffel::new("duffel_test_123");
        let err = futures::executor::block_on(
            client.create_pending_order_change(&OrderChangeOfferId::new("ocr_123")),
        )
        .unwrap_err();
        assert!(matches!(err, crate::Error::Build(_)));
    }
}
