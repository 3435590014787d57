use crate::models::{BookRecord, Category};
use crate::store::{RecordStore, StoreError};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: usize = 12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LibraryQuery {
    pub search: String,
    pub category: Option<Category>,
    /// 1-based.
    pub page: usize,
    pub page_size: usize,
}

impl Default for LibraryQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            category: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryItem {
    pub id: Option<String>,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub category: Category,
    pub rating: f64,
    pub cover_url: Option<String>,
}

impl LibraryItem {
    fn from_record(record: &BookRecord) -> Self {
        let content = &record.content;
        let title = if content.title.trim().is_empty() {
            "Untitled".to_string()
        } else {
            content.title.clone()
        };
        Self {
            id: record.id.clone(),
            title,
            author: content.author.clone(),
            genre: content.genre.clone(),
            category: content.category,
            rating: content.rating,
            cover_url: content.cover_url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryPage {
    pub items: Vec<LibraryItem>,
    /// Matches across all pages.
    pub total: usize,
    pub page: usize,
    pub page_count: usize,
}

fn matches(record: &BookRecord, terms: &[String], category: Option<Category>) -> bool {
    if category.is_some_and(|category| record.content.category != category) {
        return false;
    }
    let haystack = format!(
        "{} {} {}",
        record.content.title, record.content.author, record.content.genre
    )
    .to_lowercase();
    terms.iter().all(|term| haystack.contains(term.as_str()))
}

/// Filters and pages records in store order. Out-of-range pages clamp to the
/// nearest valid one.
pub fn browse(records: &[BookRecord], query: &LibraryQuery) -> LibraryPage {
    let terms: Vec<String> = query
        .search
        .split_whitespace()
        .map(str::to_lowercase)
        .collect();
    let hits: Vec<&BookRecord> = records
        .iter()
        .filter(|record| matches(record, &terms, query.category))
        .collect();

    let page_size = query.page_size.max(1);
    let total = hits.len();
    let page_count = total.div_ceil(page_size).max(1);
    let page = query.page.clamp(1, page_count);
    let items = hits
        .into_iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .map(LibraryItem::from_record)
        .collect();

    LibraryPage {
        items,
        total,
        page,
        page_count,
    }
}

/// Read side of the journal, backed by a record store.
pub struct Library<S: RecordStore> {
    store: S,
}

impl<S: RecordStore> Library<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn page(&self, query: &LibraryQuery) -> Result<LibraryPage, StoreError> {
        let records = self.store.load_all()?;
        Ok(browse(&records, query))
    }

    pub fn record(&self, id: &str) -> Result<Option<BookRecord>, StoreError> {
        let records = self.store.load_all()?;
        Ok(records
            .into_iter()
            .find(|record| record.id.as_deref() == Some(id)))
    }

    pub fn delete(&self, id: &str) -> Result<bool, StoreError> {
        self.store.delete(id)
    }
}
