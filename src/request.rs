use std::marker::PhantomData;

use http::Method;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{Result, client::Duffel, error::Error, iter::ListIter};

/// Ordered query parameters for one request.
pub type Query = Vec<(String, String)>;

/// Capability for payload types that contribute URL query parameters.
/// Types that don't implement it contribute none.
pub trait ParamEncoder {
    fn encode(&self, query: &mut Query);
}

/// Payload for calls that send no body and no query parameters.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct EmptyPayload;

impl ParamEncoder for EmptyPayload {
    fn encode(&self, _query: &mut Query) {}
}

/// A fully assembled request: pure data, no I/O. The executor sends it; the
/// pagination iterator clones it once per page.
#[derive(Clone, Debug)]
pub struct RequestSpec {
    pub method: Method,
    pub path: String,
    pub query: Query,
    pub body: Option<serde_json::Value>,
}

impl RequestSpec {
    pub(crate) fn set_param(&mut self, key: &str, value: impl Into<String>) {
        self.query.retain(|(existing, _)| existing != key);
        self.query.push((key.to_string(), value.into()));
    }

    /// Renders the query pairs as a URL-encoded string, preserving insertion
    /// order.
    pub fn query_string(&self) -> Result<String> {
        serde_urlencoded::to_string(&self.query).map_err(|err| Error::Build(err.to_string()))
    }
}

/// Builds one request for the payload/result type pair, then hands it to the
/// executor via one of the terminators.
pub struct RequestBuilder<'a, Req, Res> {
    client: &'a Duffel,
    spec: RequestSpec,
    deferred: Option<Error>,
    _types: PhantomData<(Req, Res)>,
}

impl<'a, Req, Res> RequestBuilder<'a, Req, Res>
where
    Req: Serialize,
    Res: DeserializeOwned,
{
    pub(crate) fn new(client: &'a Duffel) -> RequestBuilder<'a, Req, Res> {
        RequestBuilder {
            client,
            spec: RequestSpec {
                method: Method::GET,
                path: String::new(),
                query: Vec::new(),
                body: None,
            },
            deferred: None,
            _types: PhantomData,
        }
    }

    pub fn get(mut self, path: impl Into<String>) -> Self {
        self.spec.method = Method::GET;
        self.spec.path = path.into();
        self
    }

    pub fn delete(mut self, path: impl Into<String>) -> Self {
        self.spec.method = Method::DELETE;
        self.spec.path = path.into();
        self
    }

    pub fn post(self, path: impl Into<String>, body: &Req) -> Self {
        self.with_body(Method::POST, path, Some(body))
    }

    /// POST with no request body, e.g. confirmation actions.
    pub fn post_empty(self, path: impl Into<String>) -> Self {
        self.with_body(Method::POST, path, None)
    }

    pub fn patch(self, path: impl Into<String>, body: &Req) -> Self {
        self.with_body(Method::PATCH, path, Some(body))
    }

    fn with_body(mut self, method: Method, path: impl Into<String>, body: Option<&Req>) -> Self {
        self.spec.method = method;
        self.spec.path = path.into();
        if let Some(body) = body {
            match serde_json::to_value(body) {
                Ok(value) => self.spec.body = Some(value),
                // Surfaced at the terminator so building stays infallible.
                Err(err) => self.deferred = Some(Error::Build(err.to_string())),
            }
        }
        self
    }

    pub fn with_param(mut self, key: &str, value: impl Into<String>) -> Self {
        self.spec.set_param(key, value);
        self
    }

    pub fn with_params(mut self, params: &Req) -> Self
    where
        Req: ParamEncoder,
    {
        params.encode(&mut self.spec.query);
        self
    }

    fn take(self) -> Result<(&'a Duffel, RequestSpec)> {
        match self.deferred {
            Some(err) => Err(err),
            None => Ok((self.client, self.spec)),
        }
    }

    /// Executes and decodes the envelope's `data` into one value.
    pub async fn single(self) -> Result<Res> {
        let (client, spec) = self.take()?;
        client.execute_single(&spec).await
    }

    /// Executes and decodes the envelope's `data` as a full sequence in one
    /// call, without pagination.
    pub async fn all(self) -> Result<Vec<Res>> {
        let (client, spec) = self.take()?;
        let (items, _) = client.execute_page(&spec).await?;
        Ok(items)
    }

    /// Executes and discards the body, for delete-style calls.
    pub async fn empty(self) -> Result<()> {
        let (client, spec) = self.take()?;
        client.execute_empty(&spec).await
    }

    /// Returns a lazy pagination iterator; nothing is sent until the first
    /// advance.
    pub fn iter(self) -> ListIter<'a, Res> {
        match self.deferred {
            None => ListIter::new(self.client, self.spec),
            Some(err) => ListIter::failed(self.client, err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_string_preserves_order_and_encodes() {
        let spec = RequestSpec {
            method: Method::GET,
            path: "/air/offers".to_string(),
            query: vec![
                ("offer_request_id".to_string(), "orq_123".to_string()),
                ("sort".to_string(), "total_amount".to_string()),
                ("note".to_string(), "a b&c".to_string()),
            ],
            body: None,
        };
        assert_eq!(
            spec.query_string().unwrap(),
            "offer_request_id=orq_123&sort=total_amount&note=a+b%26c"
        );
    }

    #[test]
    fn set_param_replaces_existing_key() {
        let mut spec = RequestSpec {
            method: Method::GET,
            path: "/air/offers".to_string(),
            query: vec![("after".to_string(), "old".to_string())],
            body: None,
        };
        spec.set_param("after", "new");
        assert_eq!(spec.query, vec![("after".to_string(), "new".to_string())]);
    }

    #[test]
    fn empty_payload_contributes_no_params() {
        let mut query = Query::new();
        EmptyPayload.encode(&mut query);
        assert!(query.is_empty());
    }
}
