//! Page accumulation for multi-page occurrence results.

use crate::executor::OccurrenceSource;
use crate::query::OccurrenceQuery;
use crate::types::OccurrenceRecord;

/// Fetch every page of `query`, concatenated in page order
///
/// The first response reports the total page count; pages `1..total` are then
/// requested one by one. A page that fails contributes nothing, and the
/// remaining pages are still fetched. Queries without paging return only the
/// first response.
///
/// At most `max_pages` pages are requested; a larger reported total is logged
/// and truncated.
pub async fn fetch_all_pages<S>(
    source: &S,
    query: &OccurrenceQuery,
    max_pages: u32,
) -> Vec<OccurrenceRecord>
where
    S: OccurrenceSource + ?Sized,
{
    let first = source.fetch(query).await;
    let mut records = first.records;

    if query.paging().is_none() || first.total_pages <= 1 {
        return records;
    }

    let total_pages = first.total_pages.min(max_pages.max(1));
    if total_pages < first.total_pages {
        tracing::warn!(
            query = query.label(),
            reported = first.total_pages,
            max_pages,
            "server reported more pages than allowed, truncating"
        );
    }

    for index in 1..total_pages {
        let Some(page_query) = query.with_page(index) else {
            break;
        };
        let page = source.fetch(&page_query).await;
        tracing::debug!(
            query = query.label(),
            page = index,
            total_pages,
            records = page.records.len(),
            "fetched page"
        );
        records.extend(page.records);
    }

    records
}
