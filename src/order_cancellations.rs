use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    Result,
    client::Duffel,
    iter::ListIter,
    newtypes::{OrderCancellationId, OrderId, PassengerId, check_prefix},
    request::{EmptyPayload, ParamEncoder, Query},
};

const ORDER_CANCELLATION_ID_PREFIX: &str = "ore_";

/// A pending or confirmed order cancellation. Creating one quotes the
/// refund; confirming it actually cancels the booking with the airline.
#[derive(Clone, Debug, Deserialize)]
pub struct OrderCancellation {
    pub id: OrderCancellationId,
    pub order_id: OrderId,
    #[serde(default)]
    pub refund_to: Option<String>,
    pub refund_amount: String,
    pub refund_currency: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub confirmed_at: Option<DateTime<Utc>>,
    pub live_mode: bool,
    #[serde(default)]
    pub airline_credits: Vec<AirlineCredit>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AirlineCredit {
    pub id: String,
    pub credit_amount: String,
    pub credit_currency: String,
    #[serde(default)]
    pub credit_code: Option<String>,
    #[serde(default)]
    pub credit_name: Option<String>,
    #[serde(default)]
    pub issued_on: Option<chrono::NaiveDate>,
    #[serde(default)]
    pub passenger_id: Option<PassengerId>,
}

#[derive(Clone, Debug, Serialize)]
struct OrderCancellationInput<'a> {
    order_id: &'a OrderId,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct ListOrderCancellationsParams {
    pub order_id: Option<OrderId>,
}

impl ParamEncoder for ListOrderCancellationsParams {
    fn encode(&self, query: &mut Query) {
        if let Some(order_id) = &self.order_id {
            query.push(("order_id".to_string(), order_id.as_str().to_string()));
        }
    }
}

impl Duffel {
    /// Creates a pending cancellation, quoting the refund due.
    pub async fn create_order_cancellation(&self, order_id: &OrderId) -> Result<OrderCancellation> {
        self.request::<OrderCancellationInput<'_>, OrderCancellation>()
            .post("/air/order_cancellations", &OrderCancellationInput { order_id })
            .single()
            .await
    }

    /// Confirms a pending cancellation; the airline booking is cancelled.
    pub async fn confirm_order_cancellation(
        &self,
        id: &OrderCancellationId,
    ) -> Result<OrderCancellation> {
        check_prefix(id.as_str(), ORDER_CANCELLATION_ID_PREFIX)?;
        self.request::<EmptyPayload, OrderCancellation>()
            .post_empty(format!("/air/order_cancellations/{id}/actions/confirm"))
            .single()
            .await
    }

    pub async fn get_order_cancellation(
        &self,
        id: &OrderCancellationId,
    ) -> Result<OrderCancellation> {
        check_prefix(id.as_str(), ORDER_CANCELLATION_ID_PREFIX)?;
        self.request::<EmptyPayload, OrderCancellation>()
            .get(format!("/air/order_cancellations/{id}"))
            .single()
            .await
    }

    pub fn list_order_cancellations(
        &self,
        params: ListOrderCancellationsParams,
    ) -> ListIter<'_, OrderCancellation> {
        self.request::<ListOrderCancellationsParams, OrderCancellation>()
            .get("/air/order_cancellations")
            .with_params(&params)
            .iter()
    }
}
