use serde::Deserialize;

pub mod client;
pub mod error;
pub mod iter;
pub mod loyalty_programmes;
pub mod newtypes;
pub mod offer_requests;
pub mod offers;
pub mod order_cancellations;
pub mod order_changes;
pub mod orders;
pub mod payment_cards;
pub mod ratelimit;
pub mod request;
pub mod types;

pub use client::{Duffel, DuffelBuilder};
pub use error::{ApiError, Error, ErrorCode, ErrorType};
pub use iter::ListIter;
pub use request::{EmptyPayload, ParamEncoder, RequestBuilder, RequestSpec};

/// The `Duffel-Version` header sent with every request.
pub const API_VERSION: &str = "v2";

pub type Result<T> = std::result::Result<T, Error>;

/// Wire wrapper around every successful response body.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
    #[serde(default)]
    pub meta: Option<ListMeta>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ListMeta {
    #[serde(default)]
    pub after: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
}

impl ListMeta {
    /// An absent or empty `after` cursor both mean the last page.
    pub fn next_cursor(&self) -> Option<String> {
        self.after
            .as_deref()
            .filter(|after| !after.is_empty())
            .map(str::to_owned)
    }
}
