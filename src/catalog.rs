use rust_decimal::Decimal;

use crate::api::CatalogApi;
use crate::model::{Book, BookPage};

/// Category/language filter: `All` passes every book, `Only` requires an
/// exact tag match. A book with no tag recorded never matches `Only`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TagFilter {
    #[default]
    All,
    Only(String),
}

impl TagFilter {
    pub fn only(tag: impl Into<String>) -> Self {
        Self::Only(tag.into())
    }

    fn accepts(&self, tag: Option<&str>) -> bool {
        match self {
            Self::All => true,
            Self::Only(want) => tag == Some(want.as_str()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PriceBounds {
    pub min: Option<Decimal>,
    pub max: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterState {
    pub query: String,
    pub category: TagFilter,
    pub language: TagFilter,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub page: usize,
    pub page_size: usize,
}

impl FilterState {
    fn new(page_size: usize) -> Self {
        Self {
            query: String::new(),
            category: TagFilter::All,
            language: TagFilter::All,
            min_price: None,
            max_price: None,
            page: 0,
            page_size: page_size.max(1),
        }
    }

    /// AND of every active criterion.
    pub fn matches(&self, book: &Book) -> bool {
        let query = self.query.trim();
        if !query.is_empty() {
            let query = query.to_lowercase();
            let hit = book.title.to_lowercase().contains(&query)
                || book.author.to_lowercase().contains(&query)
                || book
                    .description
                    .as_deref()
                    .is_some_and(|description| description.to_lowercase().contains(&query));
            if !hit {
                return false;
            }
        }
        if !self.category.accepts(book.category.as_deref()) {
            return false;
        }
        if !self.language.accepts(book.language.as_deref()) {
            return false;
        }
        if let Some(min) = self.min_price
            && book.price < min
        {
            return false;
        }
        if let Some(max) = self.max_price
            && book.price > max
        {
            return false;
        }
        true
    }
}

/// Partial filter change. Fields left `None` keep their current value; a
/// field set to a different value is a criteria change and resets the page
/// index.
#[derive(Debug, Clone, Default)]
pub struct FilterUpdate {
    pub query: Option<String>,
    pub category: Option<TagFilter>,
    pub language: Option<TagFilter>,
    pub bounds: Option<PriceBounds>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationMode {
    /// The engine holds the full fetched set and slices pages locally.
    Client,
    /// The server slices; the engine holds the currently-loaded page and
    /// trusts the server-reported totals.
    Server,
}

/// Ticket for an in-flight catalog load. A completed fetch is applied only
/// while its token is still the newest one issued, so a superseded request
/// cannot clobber fresher state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadToken(u64);

/// Holds the fetched book collection and the filter/pagination state, and
/// derives the visible subset deterministically from them.
#[derive(Debug)]
pub struct CatalogFilterEngine {
    source: Vec<Book>,
    filter: FilterState,
    mode: PaginationMode,
    visible: Vec<Book>,
    total_pages: usize,
    total_matching: u64,
    loading: bool,
    error: Option<String>,
    generation: u64,
}

impl CatalogFilterEngine {
    pub fn new(page_size: usize) -> Self {
        Self {
            source: Vec::new(),
            filter: FilterState::new(page_size),
            mode: PaginationMode::Client,
            visible: Vec::new(),
            total_pages: 0,
            total_matching: 0,
            loading: false,
            error: None,
            generation: 0,
        }
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn mode(&self) -> PaginationMode {
        self.mode
    }

    /// The current page of the filtered set, in fetch insertion order.
    pub fn visible_books(&self) -> &[Book] {
        &self.visible
    }

    pub fn current_page(&self) -> usize {
        self.filter.page
    }

    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    pub fn total_matching(&self) -> u64 {
        self.total_matching
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Replaces the source collection with a full client-side set.
    pub fn set_books(&mut self, books: Vec<Book>) {
        self.mode = PaginationMode::Client;
        self.source = books;
        self.recompute();
    }

    /// Merges the provided fields into the filter state. Criteria changes
    /// reset the page index to 0; an update that sets a field to its current
    /// value does not.
    pub fn update_filter(&mut self, update: FilterUpdate) {
        let mut changed = false;
        if let Some(query) = update.query {
            changed |= query != self.filter.query;
            self.filter.query = query;
        }
        if let Some(category) = update.category {
            changed |= category != self.filter.category;
            self.filter.category = category;
        }
        if let Some(language) = update.language {
            changed |= language != self.filter.language;
            self.filter.language = language;
        }
        if let Some(bounds) = update.bounds {
            changed |= bounds.min != self.filter.min_price || bounds.max != self.filter.max_price;
            self.filter.min_price = bounds.min;
            self.filter.max_price = bounds.max;
        }
        if changed {
            self.filter.page = 0;
        }
        self.recompute();
    }

    /// Drops every filter criterion, keeping page size.
    pub fn clear_filters(&mut self) {
        self.update_filter(FilterUpdate {
            query: Some(String::new()),
            category: Some(TagFilter::All),
            language: Some(TagFilter::All),
            bounds: Some(PriceBounds::default()),
        });
    }

    pub fn next_page(&mut self) {
        self.go_to_page(self.filter.page + 1);
    }

    pub fn previous_page(&mut self) {
        if self.filter.page > 0 {
            self.go_to_page(self.filter.page - 1);
        }
    }

    /// Out-of-range requests are silently ignored; the range edges are where
    /// a UI simply disables the controls.
    pub fn go_to_page(&mut self, page: usize) {
        if page >= self.total_pages || page == self.filter.page {
            return;
        }
        self.filter.page = page;
        self.recompute();
    }

    /// Issues a new load ticket and enters the loading state. Any load begun
    /// earlier becomes stale.
    pub fn begin_load(&mut self) -> LoadToken {
        self.generation += 1;
        self.loading = true;
        self.error = None;
        LoadToken(self.generation)
    }

    /// Applies an unpaginated fetch outcome. Stale tokens are discarded and
    /// leave the state untouched. Returns whether the result was applied.
    pub fn apply_books(&mut self, token: LoadToken, result: anyhow::Result<Vec<Book>>) -> bool {
        if !self.is_current(token) {
            tracing::debug!(token = token.0, current = self.generation, "discarding stale book load");
            return false;
        }
        self.loading = false;
        match result {
            Ok(books) => {
                self.error = None;
                self.mode = PaginationMode::Client;
                self.source = books;
                self.recompute();
            }
            Err(err) => {
                self.error = Some(format!("{err:#}"));
            }
        }
        true
    }

    /// Applies a server-paginated page, trusting the server-reported totals.
    pub fn apply_server_page(&mut self, token: LoadToken, page: BookPage) -> bool {
        if !self.is_current(token) {
            tracing::debug!(token = token.0, current = self.generation, "discarding stale page load");
            return false;
        }
        self.loading = false;
        self.error = None;
        self.mode = PaginationMode::Server;
        self.total_pages = page.total_pages;
        self.total_matching = page.total_elements;
        self.source = page.items;
        self.recompute();
        true
    }

    /// Records a failed load for the view to display. The previous collection
    /// stays visible.
    pub fn apply_error(&mut self, token: LoadToken, message: impl Into<String>) -> bool {
        if !self.is_current(token) {
            return false;
        }
        self.loading = false;
        self.error = Some(message.into());
        true
    }

    /// Loads the current page. With server paging enabled the paginated
    /// endpoint is tried first; on failure the engine falls back exactly once
    /// to the unpaginated list and degrades to client-side paging.
    pub async fn reload(&mut self, api: &dyn CatalogApi, server_paging: bool) {
        let token = self.begin_load();
        if server_paging {
            match api
                .fetch_books_paginated(self.filter.page, self.filter.page_size)
                .await
            {
                Ok(page) => {
                    self.apply_server_page(token, page);
                    return;
                }
                Err(err) => {
                    tracing::warn!(?err, "paginated fetch failed; falling back to the full list");
                }
            }
        }
        let result = api.fetch_all_books().await;
        self.apply_books(token, result);
    }

    fn is_current(&self, token: LoadToken) -> bool {
        token.0 == self.generation
    }

    fn recompute(&mut self) {
        let filtered: Vec<Book> = self
            .source
            .iter()
            .filter(|book| self.filter.matches(book))
            .cloned()
            .collect();

        match self.mode {
            PaginationMode::Client => {
                let page_size = self.filter.page_size.max(1);
                self.total_matching = filtered.len() as u64;
                self.total_pages = filtered.len().div_ceil(page_size);
                if self.total_pages == 0 {
                    self.filter.page = 0;
                } else if self.filter.page >= self.total_pages {
                    self.filter.page = self.total_pages - 1;
                }
                let start = self.filter.page * page_size;
                self.visible = filtered.into_iter().skip(start).take(page_size).collect();
            }
            PaginationMode::Server => {
                // The server already sliced; totals were taken from it.
                self.visible = filtered;
            }
        }
    }
}
