//! pagination helpers
//!
//! cursor paginator for entity collections. subgraph collections are walked
//! with `first: N` and an `id_gt` cursor taken from the last node of the page.

use crate::error::{Error, Result};
use std::future::Future;

/// a single page of results
#[derive(Debug, Clone)]
pub struct EdgePage<T, C> {
    /// node payloads for this page
    pub nodes: Vec<T>,
    /// next cursor (if any)
    pub next_cursor: Option<C>,
}

/// generic cursor paginator
///
/// `fetch` receives the current cursor (`None` for the first page) and
/// `extract` turns its response into an [`EdgePage`]. iteration ends when a
/// page carries no next cursor.
pub struct Paginator<T, C, R, Fetch, Fut, Extract>
where
    C: Clone + PartialEq,
    Fetch: FnMut(Option<C>) -> Fut,
    Fut: Future<Output = Result<R>>,
    Extract: FnMut(R) -> Result<EdgePage<T, C>>,
{
    fetch: Fetch,
    extract: Extract,
    cursor: Option<C>,
    pages: usize,
    done: bool,
    _phantom: std::marker::PhantomData<(T, R)>,
}

impl<T, C, R, Fetch, Fut, Extract> Paginator<T, C, R, Fetch, Fut, Extract>
where
    C: Clone + PartialEq,
    Fetch: FnMut(Option<C>) -> Fut,
    Fut: Future<Output = Result<R>>,
    Extract: FnMut(R) -> Result<EdgePage<T, C>>,
{
    /// create a new paginator
    pub fn new(fetch: Fetch, extract: Extract) -> Self {
        Self {
            fetch,
            extract,
            cursor: None,
            pages: 0,
            done: false,
            _phantom: std::marker::PhantomData,
        }
    }

    /// number of pages fetched so far
    pub fn pages(&self) -> usize {
        self.pages
    }

    /// fetch the next page of results
    ///
    /// fails if the server hands back the cursor it was just given, which
    /// would otherwise loop forever.
    pub async fn next_page(&mut self) -> Result<Option<Vec<T>>> {
        if self.done {
            return Ok(None);
        }

        let response = (self.fetch)(self.cursor.clone()).await?;
        let page = (self.extract)(response)?;
        self.pages += 1;

        if page.next_cursor.is_some() && page.next_cursor == self.cursor {
            self.done = true;
            return Err(Error::Pagination(format!(
                "pagination cursor did not advance after page {}",
                self.pages
            )));
        }

        self.cursor = page.next_cursor;
        if self.cursor.is_none() {
            self.done = true;
        }

        Ok(Some(page.nodes))
    }

    /// fetch all pages and return a single collection
    pub async fn collect_all(mut self) -> Result<Vec<T>> {
        let mut items = Vec::new();
        while let Some(page) = self.next_page().await? {
            items.extend(page);
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[cfg_attr(miri, ignore)]
    #[tokio::test]
    async fn test_pagination_collect_all() {
        let seen: Arc<Mutex<Vec<Option<String>>>> = Arc::new(Mutex::new(Vec::new()));
        let seen_fetch = seen.clone();

        let fetch = move |cursor: Option<String>| {
            let seen = seen_fetch.clone();
            async move {
                seen.lock().unwrap().push(cursor.clone());
                match cursor.as_deref() {
                    None => Ok(EdgePage {
                        nodes: vec!["0x01", "0x02"],
                        next_cursor: Some("0x02".to_string()),
                    }),
                    Some("0x02") => Ok(EdgePage {
                        nodes: vec!["0x03"],
                        next_cursor: None,
                    }),
                    Some(other) => panic!("unexpected cursor {other}"),
                }
            }
        };

        let extract = |page: EdgePage<&'static str, String>| Ok(page);

        let paginator = Paginator::new(fetch, extract);
        let items = paginator.collect_all().await.unwrap();
        assert_eq!(items, vec!["0x01", "0x02", "0x03"]);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![None, Some("0x02".to_string())]
        );
    }

    #[cfg_attr(miri, ignore)]
    #[tokio::test]
    async fn test_pagination_next_page_done() {
        let fetch = |_: Option<u32>| async {
            Ok(EdgePage::<i32, u32> {
                nodes: vec![42],
                next_cursor: None,
            })
        };
        let extract = |page: EdgePage<i32, u32>| Ok(page);

        let mut paginator = Paginator::new(fetch, extract);
        let page = paginator.next_page().await.unwrap();
        assert_eq!(page.unwrap(), vec![42]);
        assert_eq!(paginator.pages(), 1);
        let none = paginator.next_page().await.unwrap();
        assert!(none.is_none());
        assert_eq!(paginator.pages(), 1);
    }

    #[cfg_attr(miri, ignore)]
    #[tokio::test]
    async fn test_pagination_stalled_cursor() {
        let fetch = |_: Option<String>| async {
            Ok(EdgePage::<i32, String> {
                nodes: vec![1],
                next_cursor: Some("same".to_string()),
            })
        };
        let extract = |page: EdgePage<i32, String>| Ok(page);

        let mut paginator = Paginator::new(fetch, extract);
        assert!(paginator.next_page().await.unwrap().is_some());
        let err = paginator.next_page().await.unwrap_err();
        assert!(matches!(err, Error::Pagination(_)));
        assert!(paginator.next_page().await.unwrap().is_none());
    }
}
