//! Cursor-following enumeration of paged listings.

use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use super::{CatalogError, Page};

/// Fetch every page of a listing and concatenate the items in page order
///
/// `fetch` is called with `None` first and then with each continuation
/// cursor until a page arrives without one. `delay` is slept between
/// requests. A failed request ends enumeration early: everything gathered
/// so far is returned rather than discarded. A cursor that was already
/// followed also ends enumeration, so cyclic listings terminate.
pub async fn paginate<T, F, Fut>(label: &str, delay: Duration, mut fetch: F) -> Vec<T>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, CatalogError>>,
{
    let mut items = Vec::new();
    let mut cursor: Option<String> = None;
    let mut seen_cursors: HashSet<String> = HashSet::new();
    let mut pages = 0usize;

    loop {
        let page = match fetch(cursor.clone()).await {
            Ok(page) => page,
            Err(e) => {
                warn!(
                    listing = label,
                    pages,
                    gathered = items.len(),
                    "Listing request failed, returning partial result: {}",
                    e
                );
                break;
            }
        };

        pages += 1;
        debug!(listing = label, page = pages, count = page.items.len(), "Fetched page");
        items.extend(page.items);

        let next = page.next_page_token.filter(|t| !t.is_empty());
        match next {
            None => break,
            Some(token) if !seen_cursors.insert(token.clone()) => {
                warn!(listing = label, cursor = %token, "Listing revisited a cursor, stopping");
                break;
            }
            Some(token) => cursor = Some(token),
        }

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    items
}
