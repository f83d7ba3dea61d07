use crate::error::SourceError;
use anisync_config::SearchConfig;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Limits applied to catalog-wide searches
#[derive(Debug, Clone, Copy)]
pub struct PageLimits {
    pub max_pages: u32,
    /// A page shorter than this is the last one
    pub page_size: usize,
    pub page_delay: Duration,
}

impl PageLimits {
    pub fn new(max_pages: u32, page_size: usize, page_delay: Duration) -> Self {
        Self {
            max_pages,
            page_size,
            page_delay,
        }
    }

    /// Configured `[search]` ceiling and delay for a service returning
    /// `page_size` results per page
    pub fn from_config(search: &SearchConfig, page_size: usize) -> Self {
        Self::new(
            search.max_pages,
            page_size,
            Duration::from_millis(search.page_delay_ms),
        )
    }
}

/// Collect results page by page, starting at page 1
///
/// Stops on an empty or short page, or after `max_pages`. Sleeps
/// `page_delay` between requests.
pub async fn paginate_search<T, F, Fut>(
    limits: PageLimits,
    mut fetch_page: F,
) -> Result<Vec<T>, SourceError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Vec<T>, SourceError>>,
{
    let mut results = Vec::new();

    for page in 1..=limits.max_pages {
        if page > 1 && !limits.page_delay.is_zero() {
            tokio::time::sleep(limits.page_delay).await;
        }

        let items = fetch_page(page).await?;
        let fetched = items.len();
        results.extend(items);
        debug!(page, fetched, total = results.len(), "Fetched search page");

        if fetched == 0 || fetched < limits.page_size {
            break;
        }
    }

    Ok(results)
}
