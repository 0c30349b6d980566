//! Batch OpenSearch paging.

use crate::client::CiniiClient;
use crate::error::{CiniiError, Result};
use crate::japanese::contains_japanese;
use crate::opensearch::{
    ItemsPerPage, OpenSearchItem, OpenSearchQuery, OpenSearchResponse, SearchType,
    MAX_START_INDEX,
};
use tracing::info;

/// Pages collected by one batch run
#[derive(Debug, Default)]
pub struct PageBatch {
    pub responses: Vec<OpenSearchResponse>,
    /// `start` to resume from in a later run; `None` when the results ran out
    pub next_offset: Option<u32>,
}

impl PageBatch {
    /// All items across pages, in page order
    pub fn items(&self) -> impl Iterator<Item = &OpenSearchItem> {
        self.responses.iter().flat_map(|r| r.items.iter())
    }
}

/// Check batch bounds before any request is sent
pub fn validate_batch(offset: u32, count: ItemsPerPage, batch_limit: u32) -> Result<()> {
    if offset
        .checked_add(count.get())
        .is_none_or(|end| end > MAX_START_INDEX)
    {
        return Err(CiniiError::Config(format!(
            "offset + count must not exceed {} (got {} + {})",
            MAX_START_INDEX,
            offset,
            count.get()
        )));
    }
    if !(1..=MAX_START_INDEX).contains(&batch_limit) {
        return Err(CiniiError::Config(format!(
            "batch limit must be within 1..={} (got {})",
            MAX_START_INDEX, batch_limit
        )));
    }
    Ok(())
}

/// Fetch up to `batch_limit` results starting at `offset`
pub async fn fetch_pages(
    client: &CiniiClient,
    search_type: SearchType,
    query: &OpenSearchQuery,
    offset: u32,
    count: ItemsPerPage,
    batch_limit: u32,
) -> Result<PageBatch> {
    fetch_pages_with(client, search_type, query, offset, count, batch_limit, |_| Ok(())).await
}

/// Like [`fetch_pages`], handing each page to `on_page` as soon as it arrives.
///
/// An error from `on_page` stops the batch.
pub async fn fetch_pages_with<F>(
    client: &CiniiClient,
    search_type: SearchType,
    query: &OpenSearchQuery,
    offset: u32,
    count: ItemsPerPage,
    batch_limit: u32,
    mut on_page: F,
) -> Result<PageBatch>
where
    F: FnMut(&OpenSearchResponse) -> Result<()>,
{
    validate_batch(offset, count, batch_limit)?;

    let per_page = count.get();
    let pages = batch_limit / per_page;
    let mut batch = PageBatch::default();
    let mut collected: u64 = 0;

    for i in 0..pages {
        let start = offset + i * per_page;
        let response = client
            .opensearch(search_type, &query.page(start, count))
            .await?;

        on_page(&response)?;
        collected += response.items.len() as u64;
        let total = response.total_results;
        batch.responses.push(response);

        let next = start + per_page;
        batch.next_offset = Some(next);

        if collected + per_page as u64 > batch_limit as u64 {
            info!(next_offset = next, collected, "Batch limit reached");
            break;
        }

        if next as u64 >= total {
            info!(collected, total, "No more pages");
            batch.next_offset = None;
            break;
        }
    }

    Ok(batch)
}

/// True when the item's title or any listed creator is written in Japanese
pub fn is_japanese_item(item: &OpenSearchItem) -> bool {
    contains_japanese(&item.title) || item.creators.iter().any(|c| contains_japanese(c))
}

/// Keep items whose title or any creator contains Japanese script
pub fn japanese_items<'a, I>(items: I) -> Vec<&'a OpenSearchItem>
where
    I: IntoIterator<Item = &'a OpenSearchItem>,
{
    items.into_iter().filter(|item| is_japanese_item(item)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str, creators: &[&str]) -> OpenSearchItem {
        OpenSearchItem {
            id: format!("https://cir.nii.ac.jp/crid/{}", title.len()),
            title: title.to_string(),
            creators: creators.iter().map(|c| c.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_batch_bounds() {
        assert!(validate_batch(1, ItemsPerPage::TwoHundred, 1000).is_ok());
        assert!(validate_batch(9800, ItemsPerPage::TwoHundred, 1000).is_ok());
        assert!(validate_batch(9801, ItemsPerPage::TwoHundred, 1000).is_err());
        assert!(validate_batch(1, ItemsPerPage::Twenty, 0).is_err());
        assert!(validate_batch(1, ItemsPerPage::Twenty, 10_001).is_err());
        assert!(validate_batch(u32::MAX - 10, ItemsPerPage::TwoHundred, 1000).is_err());
        assert!(validate_batch(u32::MAX, ItemsPerPage::Twenty, 1000).is_err());
    }

    #[test]
    fn test_japanese_items_by_title_or_creator() {
        let items = vec![
            item("がん治療の現状", &[]),
            item("Cancer therapy", &["Smith, John"]),
            item("Cancer therapy in Japan", &["Smith, John", "山田 太郎"]),
        ];

        let kept = japanese_items(&items);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].title, "がん治療の現状");
        assert_eq!(kept[1].title, "Cancer therapy in Japan");
    }
}
