//! Response shapes shared by the collection endpoints.
//!
//! Collections answer either with a plain JSON array or with a page object,
//! depending on the server's pagination settings. Workflow actions answer with
//! a message and the updated record.

use serde::{Deserialize, Serialize};

/// One page of a paginated collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    /// Wrap a complete, unpaginated result set
    pub fn single(results: Vec<T>) -> Self {
        Self {
            count: results.len() as u64,
            next: None,
            previous: None,
            results,
        }
    }
}

/// Either shape of a collection response
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Paginated(Page<T>),
    Plain(Vec<T>),
}

impl<T> Listing<T> {
    /// The items of this response, dropping pagination details
    pub fn into_items(self) -> Vec<T> {
        match self {
            Listing::Paginated(page) => page.results,
            Listing::Plain(items) => items,
        }
    }

    /// View the response as a page
    pub fn into_page(self) -> Page<T> {
        match self {
            Listing::Paginated(page) => page,
            Listing::Plain(items) => Page::single(items),
        }
    }
}

/// Answer of a workflow action (`review`, `submit_for_review`, `resolve`, ...)
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ActionResponse<T> {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(
        alias = "publication",
        alias = "request",
        alias = "notification",
        alias = "config",
        alias = "opinion"
    )]
    pub item: T,
}
