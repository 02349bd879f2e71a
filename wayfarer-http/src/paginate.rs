//! Transparent pagination.
//!
//! When a response carries a `next` link and a list-shaped body, the
//! paginator follows the chain and merges every page into one response.
//! Merging concatenates list bodies in page order, unions links, and
//! carries the last page's protocol line, status, and headers, with a
//! summed `Content-Length` when every page reported a numeric one.

use async_trait::async_trait;
use std::collections::HashSet;
use tracing::{debug, warn};
use wayfarer_core::models::response::Response;

use crate::error::HttpError;

/// Relation name that chains pages together.
pub const NEXT_REL: &str = "next";

/// Hard ceiling on pages followed in one merge, as loop insurance on top
/// of the visited-URI check.
pub const MAX_PAGES: usize = 1_000;

// ============================================================================
// Page Fetcher
// ============================================================================

/// Fetches one already-decoded page by absolute URI.
///
/// The client implements this over its full request path, so every page
/// goes through enrichment, retry, caching, and link extraction.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches and decodes the page at `uri`.
    async fn fetch_page(&self, uri: &str) -> Result<Response, HttpError>;
}

// ============================================================================
// Paginator
// ============================================================================

/// Follows `next` links and merges pages into one response.
pub struct Paginator {
    enabled: bool,
}

impl Paginator {
    /// Creates a paginator; when disabled, `follow` returns the first
    /// page untouched.
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Follows the `next` chain starting from `first`.
    ///
    /// Pages whose bodies are not lists cannot be merged: the chain stops
    /// with a warning and the pages gathered so far are returned. A URI
    /// seen twice also stops the chain.
    pub async fn follow(
        &self,
        first: Response,
        fetcher: &dyn PageFetcher,
    ) -> Result<Response, HttpError> {
        if !self.enabled || first.link(NEXT_REL).is_none() {
            return Ok(first);
        }

        if !first.body.is_list() {
            warn!("Response has a next link but a non-list body; not merging");
            return Ok(first);
        }

        let mut merged = first;
        let mut lengths = vec![content_length(&merged)];
        let mut visited: HashSet<String> = HashSet::new();
        let mut pages = 1;

        while let Some(next) = merged.link(NEXT_REL).map(|l| l.uri.clone()) {
            if !visited.insert(next.clone()) {
                warn!(uri = %next, "Pagination loop detected; stopping");
                break;
            }
            if pages >= MAX_PAGES {
                warn!(pages, "Page ceiling reached; stopping");
                break;
            }

            debug!(uri = %next, page = pages + 1, "Fetching next page");
            let page = fetcher.fetch_page(&next).await?;
            pages += 1;

            if !page.body.is_list() {
                warn!(uri = %next, "Page body is not a list; stopping merge");
                break;
            }

            lengths.push(content_length(&page));

            let mut combined = merged.body;
            combined.extend_list(&page.body);

            // Last page wins for everything except the accumulated body
            // and the union of links. The next relation is not unioned:
            // only the newest page knows where the chain continues.
            let mut links = merged.links;
            links.remove(NEXT_REL);
            merged = page;
            merged.body = combined;
            for (rel, page_links) in std::mem::take(&mut merged.links) {
                if rel == NEXT_REL {
                    links.insert(rel, page_links);
                } else {
                    links.entry(rel).or_default().extend(page_links);
                }
            }
            merged.links = links;
        }

        rewrite_content_length(&mut merged, &lengths);
        debug!(pages, "Pagination merge complete");
        Ok(merged)
    }
}

/// Reads a numeric `Content-Length` from a page.
fn content_length(page: &Response) -> Option<u64> {
    page.header("content-length").and_then(|v| v.parse().ok())
}

/// Writes the summed length when every page reported one.
fn rewrite_content_length(merged: &mut Response, lengths: &[Option<u64>]) {
    let Some(total) = lengths.iter().try_fold(0u64, |acc, l| l.map(|v| acc + v)) else {
        return;
    };
    if let Some((name, _)) = merged
        .headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .map(|(k, v)| (k.clone(), v.clone()))
    {
        merged.headers.insert(name, total.to_string());
    }
}

// ============================================================================
// Tests
// ============================================================================
