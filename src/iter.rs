use std::collections::VecDeque;

use futures::Stream;
use http::Method;
use serde::de::DeserializeOwned;

use crate::{client::Duffel, error::Error, request::RequestSpec};

/// Lazy, forward-only iterator over a paginated collection. Follows the
/// server-issued `after` cursor one page at a time, buffering each page and
/// yielding items without further I/O until the buffer drains. Single-owner;
/// items are never re-delivered.
pub struct ListIter<'a, T> {
    client: &'a Duffel,
    spec: RequestSpec,
    buffer: VecDeque<T>,
    state: State,
    error: Option<Error>,
    page_limit: Option<u32>,
}

enum State {
    /// No page fetched yet.
    Ready,
    /// A page was fetched; its cursor (if any) drives the next fetch.
    Holding { next_cursor: Option<String> },
    /// No cursor left and the buffer drained. Terminal.
    Exhausted,
    /// A fetch errored; the error is held for [`ListIter::error`]. Terminal.
    Failed,
}

impl<'a, T: DeserializeOwned> ListIter<'a, T> {
    pub(crate) fn new(client: &'a Duffel, spec: RequestSpec) -> ListIter<'a, T> {
        ListIter {
            client,
            spec,
            buffer: VecDeque::new(),
            state: State::Ready,
            error: None,
            page_limit: None,
        }
    }

    /// An iterator that reports the given error on first advance, for
    /// failures detected before any request could be built.
    pub(crate) fn failed(client: &'a Duffel, error: Error) -> ListIter<'a, T> {
        ListIter {
            client,
            spec: RequestSpec {
                method: Method::GET,
                path: String::new(),
                query: Vec::new(),
                body: None,
            },
            buffer: VecDeque::new(),
            state: State::Failed,
            error: Some(error),
            page_limit: None,
        }
    }

    /// Sets the per-page `limit` query parameter sent with each fetch.
    pub fn limit(mut self, limit: u32) -> ListIter<'a, T> {
        self.page_limit = Some(limit);
        self
    }

    /// Advances to the next item. Fetches the next page only when the buffer
    /// is empty and the server has promised one; buffered items are yielded
    /// without I/O. Returns `None` once the sequence is exhausted or a fetch
    /// has failed; after a failure every later call also returns `None` and
    /// [`ListIter::error`] reports the cause.
    pub async fn next(&mut self) -> Option<T> {
        loop {
            if let Some(item) = self.buffer.pop_front() {
                return Some(item);
            }
            let cursor = match &self.state {
                State::Ready => None,
                State::Holding {
                    next_cursor: Some(cursor),
                } => Some(cursor.clone()),
                State::Holding { next_cursor: None } => {
                    self.state = State::Exhausted;
                    return None;
                }
                State::Exhausted | State::Failed => return None,
            };
            if let Err(err) = self.fetch(cursor).await {
                self.state = State::Failed;
                self.error = Some(err);
                return None;
            }
        }
    }

    async fn fetch(&mut self, cursor: Option<String>) -> Result<(), Error> {
        let mut spec = self.spec.clone();
        if let Some(cursor) = cursor {
            spec.set_param("after", cursor);
        }
        if let Some(limit) = self.page_limit {
            spec.set_param("limit", limit.to_string());
        }
        let (items, next_cursor) = self.client.execute_page(&spec).await?;
        self.buffer = items.into();
        self.state = State::Holding { next_cursor };
        Ok(())
    }

    /// The error that ended iteration, if any.
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Adapts the iterator into a stream that yields every item and then, if
    /// iteration ended in failure, the terminating error.
    pub fn into_stream(self) -> impl Stream<Item = Result<T, Error>> + 'a
    where
        T: 'a,
    {
        futures::stream::unfold(self, |mut iter| async move {
            match iter.next().await {
                Some(item) => Some((Ok(item), iter)),
                None => iter.error.take().map(|err| (Err(err), iter)),
            }
        })
    }
}
