use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use http::HeaderMap;
use tracing::warn;

/// Snapshot of the server-advertised request budget, rebuilt from the
/// `Ratelimit-*` response headers after every call.
#[derive(Clone, Debug, PartialEq)]
pub struct RateLimit {
    /// Requests allowed per window.
    pub limit: u32,
    /// Requests left in the current window.
    pub remaining: u32,
    /// Instant the current window ends.
    pub reset_at: DateTime<Utc>,
    /// Window length, derived from `reset_at` minus the server `Date` header.
    pub period: Duration,
}

impl RateLimit {
    /// Rebuilds the state from response headers. Any missing or malformed
    /// header yields `None` so the previous state stays in effect.
    pub fn from_headers(headers: &HeaderMap) -> Option<RateLimit> {
        let limit = header_u32(headers, "Ratelimit-Limit")?;
        let remaining = header_u32(headers, "Ratelimit-Remaining")?;
        let reset_at = parse_http_date(header_str(headers, "Ratelimit-Reset")?)?;
        let date = parse_http_date(header_str(headers, "Date")?)?;
        Some(RateLimit {
            limit,
            remaining,
            reset_at,
            period: reset_at - date,
        })
    }
}

// Servers are inconsistent about date headers; accept RFC 2822 (which covers
// both the two-digit and single-digit day spellings of RFC 1123) and ISO 8601
// as emitted by some proxies.
fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value)
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .map(|parsed| parsed.with_timezone(&Utc))
        .ok()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name)?.to_str().ok()
}

fn header_u32(headers: &HeaderMap, name: &str) -> Option<u32> {
    header_str(headers, name)?.trim().parse().ok()
}

/// Advisory limiter shared by all calls on one client. Concurrent callers may
/// both read a slightly stale `remaining` and proceed; the server remains the
/// authority.
#[derive(Debug, Default)]
pub struct Limiter {
    state: Mutex<Option<RateLimit>>,
}

impl Limiter {
    pub fn new() -> Limiter {
        Limiter::default()
    }

    /// Blocks until the advertised window permits another request. With the
    /// budget exhausted and the reset still ahead, sleeps until the reset and
    /// then proceeds optimistically. A reset already in the past means the
    /// window has rolled over, so no sleep.
    pub async fn clearance(&self) {
        let wait = {
            let state = self.state.lock().unwrap();
            match state.as_ref() {
                Some(limit) if limit.remaining == 0 => {
                    (limit.reset_at - Utc::now()).to_std().ok()
                }
                _ => None,
            }
        };
        if let Some(wait) = wait {
            tokio::time::sleep(wait).await;
        }
    }

    /// Records the headers of a response. Bookkeeping is best-effort: headers
    /// that are absent or fail to parse leave the prior state untouched and
    /// never fail the call.
    pub fn record(&self, headers: &HeaderMap) {
        match RateLimit::from_headers(headers) {
            Some(limit) => *self.state.lock().unwrap() = Some(limit),
            None => {
                if headers.contains_key("Ratelimit-Limit") {
                    warn!("could not parse rate limit headers, keeping previous state");
                }
            }
        }
    }

    /// The most recently recorded state, if any response has carried one.
    pub fn snapshot(&self) -> Option<RateLimit> {
        self.state.lock().unwrap().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn headers(limit: &str, remaining: &str, reset: &str, date: &str) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert("Ratelimit-Limit", HeaderValue::from_str(limit).unwrap());
        map.insert(
            "Ratelimit-Remaining",
            HeaderValue::from_str(remaining).unwrap(),
        );
        map.insert("Ratelimit-Reset", HeaderValue::from_str(reset).unwrap());
        map.insert("Date", HeaderValue::from_str(date).unwrap());
        map
    }

    #[test]
    fn parses_rfc2822_headers() {
        let parsed = RateLimit::from_headers(&headers(
            "5",
            "3",
            "Tue, 04 Jan 2022 16:13:02 GMT",
            "Tue, 04 Jan 2022 16:12:02 GMT",
        ))
        .unwrap();
        assert_eq!(parsed.limit, 5);
        assert_eq!(parsed.remaining, 3);
        assert_eq!(parsed.period, Duration::seconds(60));
    }

    #[test]
    fn parses_single_digit_day() {
        let parsed = RateLimit::from_headers(&headers(
            "5",
            "0",
            "Tue, 4 Jan 2022 16:13:02 GMT",
            "Tue, 4 Jan 2022 16:12:32 GMT",
        ))
        .unwrap();
        assert_eq!(parsed.period, Duration::seconds(30));
    }

    #[test]
    fn parses_iso8601_reset() {
        let parsed = RateLimit::from_headers(&headers(
            "5",
            "1",
            "2022-01-04T16:13:02Z",
            "Tue, 04 Jan 2022 16:12:02 GMT",
        ))
        .unwrap();
        assert_eq!(parsed.period, Duration::seconds(60));
    }

    #[test]
    fn malformed_reset_keeps_previous_state() {
        let limiter = Limiter::new();
        limiter.record(&headers(
            "5",
            "3",
            "Tue, 04 Jan 2022 16:13:02 GMT",
            "Tue, 04 Jan 2022 16:12:02 GMT",
        ));
        let before = limiter.snapshot().unwrap();

        limiter.record(&headers(
            "5",
            "2",
            "never o'clock",
            "Tue, 04 Jan 2022 16:12:30 GMT",
        ));
        assert_eq!(limiter.snapshot().unwrap(), before);
    }

    #[test]
    fn missing_headers_keep_previous_state() {
        let limiter = Limiter::new();
        limiter.record(&headers(
            "5",
            "3",
            "Tue, 04 Jan 2022 16:13:02 GMT",
            "Tue, 04 Jan 2022 16:12:02 GMT",
        ));
        limiter.record(&HeaderMap::new());
        assert!(limiter.snapshot().is_some());
    }

    #[tokio::test]
    async fn clearance_sleeps_until_reset() {
        let limiter = Limiter::new();
        *limiter.state.lock().unwrap() = Some(RateLimit {
            limit: 5,
            remaining: 0,
            reset_at: Utc::now() + Duration::milliseconds(50),
            period: Duration::seconds(60),
        });
        let started = std::time::Instant::now();
        limiter.clearance().await;
        assert!(started.elapsed() >= std::time::Duration::from_millis(40));
    }

    #[tokio::test]
    async fn clearance_is_immediate_with_budget_left() {
        let limiter = Limiter::new();
        *limiter.state.lock().unwrap() = Some(RateLimit {
            limit: 5,
            remaining: 3,
            reset_at: Utc::now() + Duration::seconds(60),
            period: Duration::seconds(60),
        });
        let started = std::time::Instant::now();
        limiter.clearance().await;
        assert!(started.elapsed() < std::time::Duration::from_millis(20));
    }

    #[tokio::test]
    async fn clearance_is_immediate_when_reset_has_passed() {
        // Stale headers: the window already ended, so we pass optimistically.
        let limiter = Limiter::new();
        *limiter.state.lock().unwrap() = Some(RateLimit {
            limit: 5,
            remaining: 0,
            reset_at: Utc::now() - Duration::seconds(10),
            period: Duration::seconds(60),
        });
        let started = std::time::Instant::now();
        limiter.clearance().await;
        assert!(started.elapsed() < std::time::Duration::from_millis(20));
    }
}
