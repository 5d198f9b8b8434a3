use http::{StatusCode, header};
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::{
    API_VERSION, Envelope, ListMeta, Result,
    error::{ApiError, Error},
    ratelimit::{Limiter, RateLimit},
    request::{RequestBuilder, RequestSpec},
};

const DEFAULT_HOST: &str = "https://api.duffel.com";
const USER_AGENT_BASE: &str = concat!("duffel-rust/", env!("CARGO_PKG_VERSION"));

/// Client for the Duffel API. Safe to share across tasks; the only shared
/// mutable state is the advisory rate limiter.
pub struct Duffel {
    http: reqwest::Client,
    token: String,
    host: String,
    user_agent: String,
    debug: bool,
    limiter: Limiter,
}

impl Duffel {
    /// A client for the production API with default options.
    pub fn new(token: impl Into<String>) -> Duffel {
        Duffel::builder(token).build()
    }

    pub fn builder(token: impl Into<String>) -> DuffelBuilder {
        DuffelBuilder {
            token: token.into(),
            host: DEFAULT_HOST.to_string(),
            debug: false,
            user_agent_suffix: None,
            http: None,
        }
    }

    /// Starts a request for the payload/result type pair. Resource methods
    /// chain a verb, parameters, and one of the terminators onto this.
    pub fn request<Req, Res>(&self) -> RequestBuilder<'_, Req, Res>
    where
        Req: Serialize,
        Res: DeserializeOwned,
    {
        RequestBuilder::new(self)
    }

    /// The most recent rate limit advertised by the server, if any.
    pub fn rate_limit(&self) -> Option<RateLimit> {
        self.limiter.snapshot()
    }

    pub(crate) async fn execute_single<T: DeserializeOwned>(&self, spec: &RequestSpec) -> Result<T> {
        let envelope: Envelope<T> = self.execute(spec).await?;
        Ok(envelope.data)
    }

    /// Fetches one page: the decoded items plus the cursor for the next page.
    pub(crate) async fn execute_page<T: DeserializeOwned>(
        &self,
        spec: &RequestSpec,
    ) -> Result<(Vec<T>, Option<String>)> {
        let envelope: Envelope<Vec<T>> = self.execute(spec).await?;
        let next_cursor = envelope.meta.as_ref().and_then(ListMeta::next_cursor);
        Ok((envelope.data, next_cursor))
    }

    pub(crate) async fn execute_empty(&self, spec: &RequestSpec) -> Result<()> {
        let (status, body) = self.send(spec).await?;
        if status.is_success() {
            Ok(())
        } else {
            Err(ApiError::from_body(status, &body).into())
        }
    }

    async fn execute<T: DeserializeOwned>(&self, spec: &RequestSpec) -> Result<Envelope<T>> {
        let (status, body) = self.send(spec).await?;
        if !status.is_success() {
            return Err(ApiError::from_body(status, &body).into());
        }
        match serde_json::from_str::<Envelope<T>>(&body) {
            Ok(envelope) => Ok(envelope),
            Err(err) => {
                // Routing keys off the envelope, not the status alone: a 2xx
                // carrying an errors array is still a server error.
                if let Some(api) = ApiError::from_error_body(status, &body) {
                    return Err(api.into());
                }
                Err(Error::Decode {
                    reason: err.to_string(),
                    body,
                })
            }
        }
    }

    async fn send(&self, spec: &RequestSpec) -> Result<(StatusCode, String)> {
        self.limiter.clearance().await;

        let url = self.url_for(spec)?;
        let mut request = self
            .http
            .request(spec.method.clone(), &url)
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", self.token),
            )
            .header(header::ACCEPT, "application/json")
            .header(header::USER_AGENT, &self.user_agent)
            .header("Duffel-Version", API_VERSION);
        if let Some(body) = &spec.body {
            request = request
                .header(header::CONTENT_TYPE, "application/json")
                .json(body);
        }
        if self.debug {
            debug!(method = %spec.method, %url, body = ?spec.body, "sending request");
        }

        let response = request.send().await?;
        let status = response.status();
        self.limiter.record(response.headers());
        let body = response.text().await?;
        if self.debug {
            debug!(%status, body = %body, "received response");
        }
        Ok((status, body))
    }

    fn url_for(&self, spec: &RequestSpec) -> Result<String> {
        let mut url = format!("{}{}", self.host, spec.path);
        if !spec.query.is_empty() {
            url.push('?');
            url.push_str(&spec.query_string()?);
        }
        Ok(url)
    }
}

/// Construction config: required bearer token plus named optional toggles.
pub struct DuffelBuilder {
    token: String,
    host: String,
    debug: bool,
    user_agent_suffix: Option<String>,
    http: Option<reqwest::Client>,
}

impl DuffelBuilder {
    /// Overrides the base host, e.g. for a sandbox deployment.
    pub fn host(mut self, host: impl Into<String>) -> DuffelBuilder {
        self.host = host.into().trim_end_matches('/').to_string();
        self
    }

    /// Logs every request and response at debug level.
    pub fn debug(mut self, debug: bool) -> DuffelBuilder {
        self.debug = debug;
        self
    }

    /// Appends a suffix to the `User-Agent` header.
    pub fn user_agent_suffix(mut self, suffix: impl Into<String>) -> DuffelBuilder {
        self.user_agent_suffix = Some(suffix.into());
        self
    }

    /// Supplies a preconfigured transport, e.g. with timeouts set.
    pub fn http_client(mut self, http: reqwest::Client) -> DuffelBuilder {
        self.http = Some(http);
        self
    }

    pub fn build(self) -> Duffel {
        let user_agent = match &self.user_agent_suffix {
            Some(suffix) => format!("{USER_AGENT_BASE} {suffix}"),
            None => USER_AGENT_BASE.to_string(),
        };
        Duffel {
            http: self.http.unwrap_or_default(),
            token: self.token,
            host: self.host,
            user_agent,
            debug: self.debug,
            limiter: Limiter::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    fn spec(path: &str, query: Vec<(String, String)>) -> RequestSpec {
        RequestSpec {
            method: Method::GET,
            path: path.to_string(),
            query,
            body: None,
        }
    }

    #[test]
    fn url_concatenates_host_path_and_query() {
        let client = Duffel::builder("duffel_test_123")
            .host("https://api.example.com/")
            .build();
        let with_query = spec(
            "/air/offers",
            vec![("offer_request_id".to_string(), "orq_123".to_string())],
        );
        assert_eq!(
            client.url_for(&with_query).unwrap(),
            "https://api.example.com/air/offers?offer_request_id=orq_123"
        );
        assert_eq!(
            client.url_for(&spec("/air/offers", Vec::new())).unwrap(),
            "https://api.example.com/air/offers"
        );
    }

    #[test]
    fn user_agent_suffix_is_appended() {
        let client = Duffel::builder("t").user_agent_suffix("acme/2.0").build();
        assert!(client.user_agent.starts_with("duffel-rust/"));
        assert!(client.user_agent.ends_with(" acme/2.0"));
    }
}
