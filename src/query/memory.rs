//! In-memory query source for static option lists.

use async_trait::async_trait;
use serde::Serialize;

use super::{PageRequest, QueryError, QueryResult, QuerySource};

/// Serves pages out of a fixed list of items.
///
/// Filters are evaluated against the `serde_json` form of each item and the
/// continuation token is the offset at which the next page starts.
#[derive(Debug, Clone)]
pub struct VecQuerySource<I> {
    items: Vec<I>,
}

impl<I> VecQuerySource<I> {
    pub fn new(items: Vec<I>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[async_trait]
impl<I> QuerySource<I, usize> for VecQuerySource<I>
where
    I: Serialize + Clone + Send + Sync + 'static,
{
    async fn fetch_page(&self, request: PageRequest<I, usize>) -> Result<QueryResult<I, usize>, QueryError> {
        let start = request
            .previous_continuation
            .unwrap_or(request.page_index * request.page_size);

        let mut matching = Vec::new();
        for item in &self.items {
            let value = serde_json::to_value(item).map_err(|e| QueryError::InvalidData(e.to_string()))?;
            if request.filters.matches(&value) {
                matching.push(item);
            }
        }

        let items: Vec<I> = matching
            .into_iter()
            .skip(start)
            .take(request.limit)
            .cloned()
            .collect();

        Ok(QueryResult::new(items, Some(start + request.page_size)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Filter, FilterSet};

    fn request(page_index: usize, continuation: Option<usize>, filters: FilterSet) -> PageRequest<String, usize> {
        PageRequest {
            previous_item: None,
            previous_continuation: continuation,
            page_index,
            page_size: 2,
            limit: 3,
            filters,
        }
    }

    #[tokio::test]
    async fn test_pages_with_overflow_probe() {
        let source = VecQuerySource::new(vec!["a", "b", "c", "d", "e"].into_iter().map(String::from).collect());

        let first = source.fetch_page(request(0, None, FilterSet::default())).await.unwrap();
        assert_eq!(first.items, vec!["a", "b", "c"]);
        assert_eq!(first.continuation, Some(2));

        let last = source.fetch_page(request(2, Some(4), FilterSet::default())).await.unwrap();
        assert_eq!(last.items, vec!["e"]);
    }

    #[tokio::test]
    async fn test_filters_apply_before_paging() {
        #[derive(Clone, Serialize)]
        struct User {
            name: String,
            active: bool,
        }

        let users: Vec<User> = (0..6)
            .map(|i| User {
                name: format!("user{}", i),
                active: i % 2 == 0,
            })
            .collect();
        let source = VecQuerySource::new(users);
        let filters = FilterSet::default().with(Filter::equals("active", true));

        let page = source
            .fetch_page(PageRequest {
                previous_item: None,
                previous_continuation: None,
                page_index: 0,
                page_size: 10,
                limit: 11,
                filters,
            })
            .await
            .unwrap();

        let names: Vec<_> = page.items.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["user0", "user2", "user4"]);
    }
}
