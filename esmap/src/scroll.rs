//! Scroll pagination over a transport supplied by the caller.

use serde_json::Value;
use std::collections::VecDeque;

use crate::query::CriteriaQuery;
use crate::Result;

const DEFAULT_KEEP_ALIVE: &str = "1m";

/// One page of a scroll.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrollPage {
    pub scroll_id: Option<String>,
    pub hits: Vec<Value>,
}

/// The scroll endpoints of a cluster client.
pub trait ScrollClient {
    fn start_scroll(&self, index: &str, body: &Value, keep_alive: &str) -> Result<ScrollPage>;

    fn continue_scroll(&self, scroll_id: &str, keep_alive: &str) -> Result<ScrollPage>;

    fn clear_scroll(&self, scroll_ids: &[String]) -> Result<()>;
}

/// Yields hits page by page until a page comes back empty or `max_results`
/// hits have been returned, then clears every scroll id it was handed.
///
/// An error from the client is yielded once and ends the iteration; the
/// scroll is cleared either way, also when the iterator is dropped early.
pub struct ScrollIterator<'c, C: ScrollClient + ?Sized> {
    client: &'c C,
    index: String,
    body: Value,
    keep_alive: String,
    max_results: Option<usize>,
    skip: usize,
    buffer: VecDeque<Value>,
    current_id: Option<String>,
    scroll_ids: Vec<String>,
    returned: usize,
    started: bool,
    finished: bool,
}

impl<'c, C: ScrollClient + ?Sized> ScrollIterator<'c, C> {
    pub fn new(client: &'c C, index: impl Into<String>, body: Value) -> Self {
        Self {
            client,
            index: index.into(),
            body,
            keep_alive: DEFAULT_KEEP_ALIVE.to_string(),
            max_results: None,
            skip: 0,
            buffer: VecDeque::new(),
            current_id: None,
            scroll_ids: Vec::new(),
            returned: 0,
            started: false,
            finished: false,
        }
    }

    /// Scroll through the matches of a criteria query, honoring its limit.
    ///
    /// Scroll requests do not accept `from`. A page offset is dropped from
    /// the body and the leading hits are skipped here instead, while the page
    /// size stays as the size of each scroll batch.
    pub fn for_query(client: &'c C, index: impl Into<String>, query: &CriteriaQuery) -> Self {
        let mut body = query.to_request_body();
        if let Some(object) = body.as_object_mut() {
            object.remove("from");
        }
        let skip = query.pageable().map_or(0, |p| p.offset());
        Self::new(client, index, body)
            .max_results(query.max_results())
            .skip_hits(skip)
    }

    /// Discard the first `skip` hits. Skipped hits do not count towards
    /// `max_results`.
    pub fn skip_hits(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    pub fn keep_alive(mut self, keep_alive: impl Into<String>) -> Self {
        self.keep_alive = keep_alive.into();
        self
    }

    pub fn max_results(mut self, max_results: Option<usize>) -> Self {
        self.max_results = max_results;
        self
    }

    fn fetch(&mut self) -> Result<()> {
        let page = if !self.started {
            self.started = true;
            self.client
                .start_scroll(&self.index, &self.body, &self.keep_alive)?
        } else if let Some(id) = &self.current_id {
            self.client.continue_scroll(id, &self.keep_alive)?
        } else {
            ScrollPage::default()
        };

        if let Some(id) = page.scroll_id {
            if !self.scroll_ids.contains(&id) {
                self.scroll_ids.push(id.clone());
            }
            self.current_id = Some(id);
        } else {
            self.current_id = None;
        }

        tracing::trace!(index = %self.index, hits = page.hits.len(), "scroll page");
        self.buffer.extend(page.hits);
        Ok(())
    }

    fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.buffer.clear();

        if self.scroll_ids.is_empty() {
            return;
        }
        if let Err(e) = self.client.clear_scroll(&self.scroll_ids) {
            tracing::warn!(index = %self.index, error = %e, "failed to clear scroll");
        }
    }
}

impl<C: ScrollClient + ?Sized> Iterator for ScrollIterator<'_, C> {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if self.max_results.is_some_and(|max| self.returned >= max) {
            self.finish();
            return None;
        }

        loop {
            if self.buffer.is_empty() {
                if let Err(e) = self.fetch() {
                    self.finish();
                    return Some(Err(e));
                }
            }
            if self.skip == 0 || self.buffer.is_empty() {
                break;
            }
            let skipped = self.skip.min(self.buffer.len());
            self.buffer.drain(..skipped);
            self.skip -= skipped;
        }

        match self.buffer.pop_front() {
            Some(hit) => {
                self.returned += 1;
                Some(Ok(hit))
            }
            None => {
                self.finish();
                None
            }
        }
    }
}

impl<C: ScrollClient + ?Sized> Drop for ScrollIterator<'_, C> {
    fn drop(&mut self) {
        self.finish();
    }
}
