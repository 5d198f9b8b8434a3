use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    Result,
    client::Duffel,
    iter::ListIter,
    newtypes::{
        AirlineInitiatedChangeId, OfferId, OrderId, PassengerId, ServiceId, check_prefix,
    },
    offers::AvailableService,
    order_cancellations::OrderCancellation,
    request::{EmptyPayload, ParamEncoder, Query},
    types::{Airline, Gender, Metadata, PassengerTitle, PaymentCreateInput, PaymentMethod, Slice},
};

const ORDER_ID_PREFIX: &str = "ord_";
const AIRLINE_INITIATED_CHANGE_ID_PREFIX: &str = "aic_";

/// A booked (or held) itinerary. Amounts are decimal strings paired with a
/// currency code and are carried untouched.
#[derive(Clone, Debug, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub live_mode: bool,
    pub booking_reference: String,
    #[serde(rename = "type", default)]
    pub kind: Option<OrderType>,
    #[serde(default)]
    pub content: Option<OrderContent>,
    pub offer_id: OfferId,
    pub owner: Airline,
    #[serde(default)]
    pub metadata: Metadata,
    pub total_amount: String,
    pub total_currency: String,
    #[serde(default)]
    pub base_amount: Option<String>,
    #[serde(default)]
    pub base_currency: Option<String>,
    #[serde(default)]
    pub tax_amount: Option<String>,
    #[serde(default)]
    pub tax_currency: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub synced_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cancelled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub conditions: Option<OrderConditions>,
    #[serde(default)]
    pub documents: Vec<IssuedDocument>,
    #[serde(default)]
    pub passengers: Vec<OrderPassenger>,
    #[serde(default)]
    pub payment_status: Option<PaymentStatus>,
    #[serde(default)]
    pub services: Vec<Service>,
    #[serde(default)]
    pub slices: Vec<Slice>,
    #[serde(default)]
    pub cancellation: Option<OrderCancellation>,
    #[serde(default)]
    pub airline_initiated_changes: Vec<AirlineInitiatedChange>,
    #[serde(default, rename = "changes")]
    pub passenger_initiated_changes: Vec<PassengerInitiatedChange>,
}

/// Instant orders are paid at creation; hold orders are paid later, before
/// `payment_required_by`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    Hold,
    Instant,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderContent {
    Managed,
    SelfManaged,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PaymentStatus {
    pub awaiting_payment: bool,
    #[serde(default)]
    pub payment_required_by: Option<DateTime<Utc>>,
    #[serde(default)]
    pub price_guarantee_expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct OrderConditions {
    #[serde(default)]
    pub refund_before_departure: Option<ChangeCondition>,
    #[serde(default)]
    pub change_before_departure: Option<ChangeCondition>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ChangeCondition {
    pub allowed: bool,
    #[serde(default)]
    pub penalty_amount: Option<String>,
    #[serde(default)]
    pub penalty_currency: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct IssuedDocument {
    #[serde(rename = "type")]
    pub kind: IssuedDocumentType,
    pub unique_identifier: String,
    #[serde(default)]
    pub passenger_ids: Vec<PassengerId>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssuedDocumentType {
    ElectronicTicket,
    ElectronicMiscellaneousDocumentAssociated,
    ElectronicMiscellaneousDocumentStandalone,
    #[serde(other)]
    Unknown,
}

/// Personal details for one traveller, expanding on the sketch given when
/// the offer request was created.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct OrderPassenger {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<PassengerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<PassengerTitle>,
    pub given_name: String,
    pub family_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub born_on: Option<chrono::NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

/// A booked service; see [`AvailableService`] for what can be added.
#[derive(Clone, Debug, Deserialize)]
pub struct Service {
    pub id: ServiceId,
    #[serde(rename = "type")]
    pub kind: String,
    pub quantity: u32,
    #[serde(default)]
    pub total_amount: Option<String>,
    #[serde(default)]
    pub total_currency: Option<String>,
    #[serde(default)]
    pub passenger_ids: Vec<PassengerId>,
    #[serde(default)]
    pub segment_ids: Vec<String>,
    #[serde(default)]
    pub metadata: Metadata,
}

#[derive(Clone, Debug, Serialize)]
pub struct CreateOrderInput {
    #[serde(rename = "type")]
    pub kind: OrderType,
    /// Must contain exactly one offer id; the server rejects anything else.
    pub selected_offers: Vec<OfferId>,
    pub passengers: Vec<OrderPassenger>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub payments: Vec<PaymentCreateInput>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<ServiceCreateInput>,
    #[serde(skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

/// One service from an offer's `available_services` to book alongside it.
#[derive(Clone, Debug, Serialize)]
pub struct ServiceCreateInput {
    pub id: ServiceId,
    /// Always 1 for seat services.
    pub quantity: u32,
}

#[derive(Clone, Debug, Serialize)]
pub struct AddOrderServiceInput {
    pub add_services: Vec<ServiceCreateInput>,
    pub payment: PaymentCreateInput,
}

/// Only metadata is updateable after booking.
#[derive(Clone, Debug, Default, Serialize)]
pub struct OrderUpdateInput {
    pub metadata: Metadata,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum OrderSort {
    PaymentRequiredByAsc,
    PaymentRequiredByDesc,
}

impl OrderSort {
    fn as_str(self) -> &'static str {
        match self {
            OrderSort::PaymentRequiredByAsc => "payment_required_by",
            OrderSort::PaymentRequiredByDesc => "-payment_required_by",
        }
    }
}

/// Bounds for filtering orders on a datetime field; either side may be open.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct TimeFilter {
    pub before: Option<DateTime<Utc>>,
    pub after: Option<DateTime<Utc>>,
}

impl TimeFilter {
    fn encode(&self, field: &str, query: &mut Query) {
        if let Some(before) = self.before {
            query.push((format!("{field}[before]"), before.to_rfc3339()));
        }
        if let Some(after) = self.after {
            query.push((format!("{field}[after]"), after.to_rfc3339()));
        }
    }
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct ListOrdersParams {
    /// Exact match, case insensitive.
    pub booking_reference: Option<String>,
    pub awaiting_payment: Option<bool>,
    pub sort: Option<OrderSort>,
    /// Airline ids to filter owners by.
    pub owner_ids: Vec<String>,
    pub origin_ids: Vec<String>,
    pub destination_ids: Vec<String>,
    pub departing_at: Option<TimeFilter>,
    pub arriving_at: Option<TimeFilter>,
    pub created_at: Option<TimeFilter>,
    /// Case-insensitive, partial matches included.
    pub passenger_names: Vec<String>,
}

impl ParamEncoder for ListOrdersParams {
    fn encode(&self, query: &mut Query) {
        if let Some(reference) = &self.booking_reference {
            query.push(("booking_reference".to_string(), reference.clone()));
        }
        if let Some(awaiting) = self.awaiting_payment {
            query.push(("awaiting_payment".to_string(), awaiting.to_string()));
        }
        if let Some(sort) = self.sort {
            query.push(("sort".to_string(), sort.as_str().to_string()));
        }
        for owner_id in &self.owner_ids {
            query.push(("owner_id".to_string(), owner_id.clone()));
        }
        for origin_id in &self.origin_ids {
            query.push(("origin_id".to_string(), origin_id.clone()));
        }
        for destination_id in &self.destination_ids {
            query.push(("destination_id".to_string(), destination_id.clone()));
        }
        if let Some(filter) = &self.departing_at {
            filter.encode("departing_at", query);
        }
        if let Some(filter) = &self.arriving_at {
            filter.encode("arriving_at", query);
        }
        if let Some(filter) = &self.created_at {
            filter.encode("created_at", query);
        }
        for name in &self.passenger_names {
            query.push(("passenger_name".to_string(), name.clone()));
        }
    }
}

/// A schedule change imposed by the airline, to be accepted, changed, or
/// cancelled by the traveller.
#[derive(Clone, Debug, Deserialize)]
pub struct AirlineInitiatedChange {
    pub id: AirlineInitiatedChangeId,
    pub order_id: OrderId,
    #[serde(default)]
    pub action_taken: Option<ChangeAction>,
    #[serde(default)]
    pub action_taken_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub available_actions: Vec<ChangeAction>,
    #[serde(default)]
    pub added: Vec<Slice>,
    #[serde(default)]
    pub removed: Vec<Slice>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    Accept,
    Accepted,
    Cancel,
    Cancelled,
    Change,
    Changed,
}

#[derive(Clone, Debug, Serialize)]
pub struct UpdateAirlineInitiatedChangeInput {
    pub action_taken: ChangeAction,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct ListAirlineInitiatedChangesParams {
    pub order_id: Option<OrderId>,
}

impl ParamEncoder for ListAirlineInitiatedChangesParams {
    fn encode(&self, query: &mut Query) {
        if let Some(order_id) = &self.order_id {
            query.push(("order_id".to_string(), order_id.as_str().to_string()));
        }
    }
}

/// A change the traveller initiated, as echoed back on the order.
#[derive(Clone, Debug, Deserialize)]
pub struct PassengerInitiatedChange {
    pub id: String,
    pub order_id: OrderId,
    pub change_total_amount: String,
    pub change_total_currency: String,
    pub new_total_amount: String,
    pub new_total_currency: String,
    pub penalty_total_amount: String,
    pub penalty_total_currency: String,
    #[serde(default)]
    pub refund_to: Option<PaymentMethod>,
    #[serde(default)]
    pub confirmed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    pub live_mode: bool,
}

impl Duffel {
    /// Books an order from a selected offer. A 500 response may still have
    /// created the order on the airline's side; contact support before
    /// retrying.
    pub async fn create_order(&self, input: CreateOrderInput) -> Result<Order> {
        self.request::<CreateOrderInput, Order>()
            .post("/air/orders", &input)
            .single()
            .await
    }

    pub async fn get_order(&self, id: &OrderId) -> Result<Order> {
        check_prefix(id.as_str(), ORDER_ID_PREFIX)?;
        self.request::<EmptyPayload, Order>()
            .get(format!("/air/orders/{id}"))
            .single()
            .await
    }

    pub async fn update_order(&self, id: &OrderId, input: OrderUpdateInput) -> Result<Order> {
        check_prefix(id.as_str(), ORDER_ID_PREFIX)?;
        self.request::<OrderUpdateInput, Order>()
            .patch(format!("/air/orders/{id}"), &input)
            .single()
            .await
    }

    pub fn list_orders(&self, params: ListOrdersParams) -> ListIter<'_, Order> {
        self.request::<ListOrdersParams, Order>()
            .get("/air/orders")
            .with_params(&params)
            .iter()
    }

    /// Services that can still be added to a booked order.
    pub async fn list_order_services(&self, id: &OrderId) -> Result<Vec<AvailableService>> {
        check_prefix(id.as_str(), ORDER_ID_PREFIX)?;
        self.request::<EmptyPayload, AvailableService>()
            .get(format!("/air/orders/{id}/available_services"))
            .all()
            .await
    }

    pub async fn add_order_service(
        &self,
        id: &OrderId,
        input: AddOrderServiceInput,
    ) -> Result<Order> {
        check_prefix(id.as_str(), ORDER_ID_PREFIX)?;
        self.request::<AddOrderServiceInput, Order>()
            .post(format!("/air/orders/{id}/services"), &input)
            .single()
            .await
    }

    pub async fn update_airline_initiated_change(
        &self,
        id: &AirlineInitiatedChangeId,
        input: UpdateAirlineInitiatedChangeInput,
    ) -> Result<Order> {
        check_prefix(id.as_str(), AIRLINE_INITIATED_CHANGE_ID_PREFIX)?;
        self.request::<UpdateAirlineInitiatedChangeInput, Order>()
            .patch(format!("/air/airline_initiated_changes/{id}"), &input)
            .single()
            .await
    }

    pub async fn accept_airline_initiated_change(
        &self,
        id: &AirlineInitiatedChangeId,
    ) -> Result<Order> {
        check_prefix(id.as_str(), AIRLINE_INITIATED_CHANGE_ID_PREFIX)?;
        self.request::<EmptyPayload, Order>()
            .post_empty(format!(
                "/air/airline_initiated_changes/{id}/actions/accept"
            ))
            .single()
            .await
    }

    pub async fn list_airline_initiated_changes(
        &self,
        params: ListAirlineInitiatedChangesParams,
    ) -> Result<Vec<AirlineInitiatedChange>> {
        self.request::<ListAirlineInitiatedChangesParams, AirlineInitiatedChange>()
            .get("/air/airline_initiated_changes")
            .with_params(&params)
            .all()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_params_encode_repeats_and_time_bounds() {
        let params = ListOrdersParams {
            awaiting_payment: Some(true),
            sort: Some(OrderSort::PaymentRequiredByDesc),
            owner_ids: vec!["arl_1".to_string(), "arl_2".to_string()],
            created_at: Some(TimeFilter {
                after: Some("2026-01-01T00:00:00Z".parse().unwrap()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let mut query = Query::new();
        params.encode(&mut query);
        assert_eq!(
            query,
            vec![
                ("awaiting_payment".to_string(), "true".to_string()),
                ("sort".to_string(), "-payment_required_by".to_string()),
                ("owner_id".to_string(), "arl_1".to_string()),
                ("owner_id".to_string(), "arl_2".to_string()),
                (
                    "created_at[after]".to_string(),
                    "2026-01-01T00:00:00+00:00".to_string()
                ),
            ]
        );
    }

    #[test]
    fn create_order_body_shape() {
        let input = CreateOrderInput {
            kind: OrderType::Instant,
            selected_offers: vec![OfferId::new("off_123")],
            passengers: vec![OrderPassenger {
                id: Some(PassengerId::new("pas_123")),
                title: Some(PassengerTitle::Mrs),
                given_name: "Amelia".to_string(),
                family_name: "Earhart".to_string(),
                gender: Some(Gender::Female),
                born_on: chrono::NaiveDate::from_ymd_opt(1987, 7, 24),
                email: Some("amelia@duffel.com".to_string()),
                phone_number: Some("+442080160509".to_string()),
            }],
            payments: vec![PaymentCreateInput {
                kind: PaymentMethod::Balance,
                amount: "893.95".to_string(),
                currency: "GBP".to_string(),
                card_id: None,
            }],
            services: Vec::new(),
            metadata: Metadata::new(),
        };
        let body = serde_json::to_value(&input).unwrap();
        assert_eq!(body["type"], "instant");
        assert_eq!(body["selected_offers"][0], "off_123");
        assert_eq!(body["passengers"][0]["title"], "mrs");
        assert_eq!(body["passengers"][0]["gender"], "f");
        assert_eq!(body["payments"][0]["type"], "balance");
        assert!(body.get("services").is_none());
        assert!(body.get("metadata").is_none());
    }

    #[test]
    fn rejects_mismatched_order_id() {
        let client = Duffel::new("duffel_test_123");
        let err = futures::executor::block_on(client.get_order(&OrderId::new("ore_123")))
            .unwrap_err();
        assert!(matches!(err, crate::Error::Build(_)));
    }
}
