//! Offset/limit pagination over any listable store
//!
//! `fetch_page` issues exactly two reads: the bounded list read and the
//! unbounded count read. The cursor only applies to the list read.

use async_trait::async_trait;

use super::DbError;
use crate::models::{Page, PageQuery, Window};

/// A store that can list a window of filtered rows and count them
#[async_trait]
pub trait PageSource: Sync {
    type Item: Send;
    type Filter: Sync;
    type Cursor: Sync;

    /// Rows matching `filter`, starting at `cursor` when given, then
    /// skipping `window.offset` and taking at most `window.limit`.
    async fn fetch_slice(
        &self,
        filter: &Self::Filter,
        window: Window,
        cursor: Option<&Self::Cursor>,
    ) -> Result<Vec<Self::Item>, DbError>;

    /// Number of rows matching `filter`.
    async fn count(&self, filter: &Self::Filter) -> Result<i64, DbError>;
}

/// Fetch one page and the total count.
///
/// Errors from either read propagate unchanged; no partial page is returned.
pub async fn fetch_page<S>(
    source: &S,
    query: &PageQuery<S::Filter, S::Cursor>,
) -> Result<Page<S::Item>, DbError>
where
    S: PageSource + ?Sized,
{
    let window = query.window();
    tracing::debug!(offset = window.offset, limit = window.limit, "fetching page");

    let items = source
        .fetch_slice(&query.filter, window, query.cursor.as_ref())
        .await?;
    let total = source.count(&query.filter).await?;

    Ok(Page::new(items, query.current_page(), query.take(), total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory rows `1..=n`; the filter keeps rows divisible by it.
    struct Rows {
        rows: Vec<i32>,
        reads: AtomicUsize,
    }

    impl Rows {
        fn new(n: i32) -> Self {
            Self {
                rows: (1..=n).collect(),
                reads: AtomicUsize::new(0),
            }
        }

        fn matching<'a>(&'a self, divisor: &'a Option<i32>) -> impl Iterator<Item = i32> + 'a {
            self.rows
                .iter()
                .copied()
                .filter(move |row| divisor.map_or(true, |d| row % d == 0))
        }
    }

    #[async_trait]
    impl PageSource for Rows {
        type Item = i32;
        type Filter = Option<i32>;
        type Cursor = i32;

        async fn fetch_slice(
            &self,
            filter: &Option<i32>,
            window: Window,
            cursor: Option<&i32>,
        ) -> Result<Vec<i32>, DbError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .matching(filter)
                .filter(|row| cursor.map_or(true, |c| row >= c))
                .skip(window.offset as usize)
                .take(window.limit as usize)
                .collect())
        }

        async fn count(&self, filter: &Option<i32>) -> Result<i64, DbError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(self.matching(filter).count() as i64)
        }
    }

    struct Broken;

    #[async_trait]
    impl PageSource for Broken {
        type Item = i32;
        type Filter = ();
        type Cursor = i32;

        async fn fetch_slice(
            &self,
            _: &(),
            _: Window,
            _: Option<&i32>,
        ) -> Result<Vec<i32>, DbError> {
            Err(DbError::Sqlx(sqlx::Error::PoolTimedOut))
        }

        async fn count(&self, _: &()) -> Result<i64, DbError> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn third_page_of_twenty_five() {
        let rows = Rows::new(25);
        let page = fetch_page(&rows, &PageQuery::new(None).page(3).page_size(10))
            .await
            .unwrap();

        assert_eq!(page.items, vec![21, 22, 23, 24, 25]);
        assert_eq!(page.current_page, 3);
        assert_eq!(page.page_size, 10);
        assert_eq!(page.total_count, 25);
        assert_eq!(page.total_pages, 3);
    }

    #[tokio::test]
    async fn issues_exactly_two_reads() {
        let rows = Rows::new(5);
        fetch_page(&rows, &PageQuery::new(None)).await.unwrap();
        assert_eq!(rows.reads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn defaults_to_first_ten() {
        let rows = Rows::new(25);
        let page = fetch_page(&rows, &PageQuery::new(None)).await.unwrap();

        assert_eq!(page.items, (1..=10).collect::<Vec<_>>());
        assert_eq!(page.current_page, 1);
        assert_eq!(page.page_size, 10);
    }

    #[tokio::test]
    async fn non_positive_page_reads_from_start() {
        let rows = Rows::new(25);
        let page = fetch_page(&rows, &PageQuery::new(None).page(-3).page_size(4))
            .await
            .unwrap();

        assert_eq!(page.items, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn count_uses_filter_but_not_cursor() {
        let rows = Rows::new(30);
        // Multiples of 3 from 15 onward: 15, 18, 21, ...
        let query = PageQuery::new(Some(3)).page_size(2).cursor(15);
        let page = fetch_page(&rows, &query).await.unwrap();

        assert_eq!(page.items, vec![15, 18]);
        assert_eq!(page.total_count, 10);
        assert_eq!(page.total_pages, 5);
    }

    #[tokio::test]
    async fn empty_set_has_zero_pages() {
        let rows = Rows::new(0);
        let page = fetch_page(&rows, &PageQuery::new(None)).await.unwrap();

        assert!(page.items.is_empty());
        assert_eq!(page.total_count, 0);
        assert_eq!(page.total_pages, 0);
    }

    #[tokio::test]
    async fn page_past_the_end_is_empty() {
        let rows = Rows::new(25);
        let page = fetch_page(&rows, &PageQuery::new(None).page(9))
            .await
            .unwrap();

        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 3);
    }

    #[tokio::test]
    async fn store_errors_propagate() {
        let err = fetch_page(&Broken, &PageQuery::new(())).await.unwrap_err();
        assert!(matches!(err, DbError::Sqlx(sqlx::Error::PoolTimedOut)));
    }
}
