use std::sync::Arc;

use crate::api::CatalogApi;
use crate::catalog::CatalogFilterEngine;
use crate::config::StoreConfig;
use crate::i18n::{
    environment_language, initial_language, LocalFsPreferenceStore, PreferenceStore,
    TranslationResolver, TranslationTable,
};
use crate::model::Book;
use crate::order::{CreatedOrder, CustomerDetails, OrderRequest, OrderValidationError};
use crate::selection::SelectionRegistry;

/// Why a checkout attempt failed. Validation failures never reached the
/// network; submission failures carry the server's reason when it sent one.
#[derive(Debug)]
pub enum CheckoutError {
    Validation(OrderValidationError),
    Submission(anyhow::Error),
}

impl CheckoutError {
    /// User-facing message in the storefront's active language.
    pub fn localized_message(&self, i18n: &TranslationResolver) -> String {
        match self {
            Self::Validation(err) => {
                let params = err.message_params();
                let params: Vec<(&str, &str)> = params
                    .iter()
                    .map(|(name, value)| (*name, value.as_str()))
                    .collect();
                i18n.translate_with(err.message_key(), &params)
            }
            Self::Submission(err) => format!("{}: {err:#}", i18n.translate("orderError")),
        }
    }
}

impl std::fmt::Display for CheckoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "order rejected before submission: {err}"),
            Self::Submission(err) => write!(f, "order submission failed: {err:#}"),
        }
    }
}

impl std::error::Error for CheckoutError {}

/// Per-session state container composing the catalog engine, the selection
/// registry, and the translation resolver. Constructed once at application
/// start; there is no other instance and no global state behind it.
pub struct Storefront {
    config: StoreConfig,
    api: Arc<dyn CatalogApi>,
    catalog: CatalogFilterEngine,
    selection: SelectionRegistry,
    i18n: TranslationResolver,
}

impl Storefront {
    pub fn new(config: StoreConfig, api: Arc<dyn CatalogApi>, table: TranslationTable) -> Self {
        let store: Option<Box<dyn PreferenceStore>> = config
            .language_preference_path()
            .map(|path| Box::new(LocalFsPreferenceStore::new(path)) as Box<dyn PreferenceStore>);
        let language = initial_language(
            store.as_deref(),
            environment_language().as_deref(),
            config.default_language,
        );
        let i18n = TranslationResolver::new(table, language, store);

        Self {
            catalog: CatalogFilterEngine::new(config.page_size),
            selection: SelectionRegistry::new(config.min_selection),
            i18n,
            api,
            config,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn api(&self) -> &dyn CatalogApi {
        self.api.as_ref()
    }

    pub fn catalog(&self) -> &CatalogFilterEngine {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut CatalogFilterEngine {
        &mut self.catalog
    }

    pub fn selection(&self) -> &SelectionRegistry {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut SelectionRegistry {
        &mut self.selection
    }

    pub fn i18n(&self) -> &TranslationResolver {
        &self.i18n
    }

    pub fn i18n_mut(&mut self) -> &mut TranslationResolver {
        &mut self.i18n
    }

    /// Loads the current catalog page, degrading to the unpaginated list when
    /// the paginated endpoint fails.
    pub async fn load_books(&mut self) {
        self.catalog
            .reload(self.api.as_ref(), self.config.server_paging)
            .await;
    }

    pub fn toggle_selection(&mut self, book: Book) {
        self.selection.toggle(book);
    }

    /// Validates and submits the current selection as an order. Validation
    /// failures are surfaced before any network traffic; a server rejection
    /// keeps the selection so the user can retry; success clears it.
    pub async fn submit_order(
        &mut self,
        customer: CustomerDetails,
    ) -> Result<CreatedOrder, CheckoutError> {
        let request = OrderRequest::from_selection(customer, self.selection.books());
        request.validate().map_err(CheckoutError::Validation)?;
        if !self.selection.can_checkout() {
            return Err(CheckoutError::Validation(
                OrderValidationError::BelowMinimumSelection {
                    required: self.selection.min_checkout(),
                    selected: self.selection.len(),
                },
            ));
        }

        match self.api.submit_order(&request).await {
            Ok(order) => {
                self.selection.clear();
                Ok(order)
            }
            Err(err) => Err(CheckoutError::Submission(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use rust_decimal::Decimal;

    use super::{CheckoutError, Storefront};
    use crate::api::CatalogApi;
    use crate::config::StoreConfig;
    use crate::i18n::TranslationTable;
    use crate::model::{Book, BookPage, Offer, Pack};
    use crate::order::{CreatedOrder, CustomerDetails, OrderRequest, OrderValidationError};

    struct StubApi {
        submissions: AtomicUsize,
        reject_orders: bool,
    }

    impl StubApi {
        fn new(reject_orders: bool) -> Arc<Self> {
            Arc::new(Self {
                submissions: AtomicUsize::new(0),
                reject_orders,
            })
        }
    }

    #[async_trait]
    impl CatalogApi for StubApi {
        async fn fetch_all_books(&self) -> anyhow::Result<Vec<Book>> {
            Ok(Vec::new())
        }
        async fn fetch_books_paginated(&self, _: usize, _: usize) -> anyhow::Result<BookPage> {
            anyhow::bail!("pagination unsupported")
        }
        async fn fetch_books_by_category(&self, _: &str) -> anyhow::Result<Vec<Book>> {
            Ok(Vec::new())
        }
        async fn search_books(&self, _: &str) -> anyhow::Result<Vec<Book>> {
            Ok(Vec::new())
        }
        async fn fetch_active_packs(&self) -> anyhow::Result<Vec<Pack>> {
            Ok(Vec::new())
        }
        async fn fetch_current_daily_offers(&self) -> anyhow::Result<Vec<Offer>> {
            Ok(Vec::new())
        }
        async fn fetch_pack_by_id(&self, id: i64) -> anyhow::Result<Pack> {
            anyhow::bail!("no pack {id}")
        }
        async fn submit_order(&self, _: &OrderRequest) -> anyhow::Result<CreatedOrder> {
            self.submissions.fetch_add(1, Ordering::SeqCst);
            if self.reject_orders {
                anyhow::bail!("catalog API error (422 Unprocessable Entity): stock exhausted");
            }
            Ok(CreatedOrder {
                id: 1001,
                order_number: Some("PW-1001".to_owned()),
                status: Some("PENDING".to_owned()),
                created_at: None,
            })
        }
    }

    fn storefront(api: Arc<StubApi>, min_selection: usize) -> Storefront {
        let config = StoreConfig {
            min_selection,
            state_dir: None,
            ..StoreConfig::default()
        };
        Storefront::new(config, api, TranslationTable::built_in())
    }

    fn book(id: i64, price: i64) -> Book {
        Book {
            id: Some(id),
            isbn: None,
            title: format!("Book {id}"),
            author: "Author".to_owned(),
            description: None,
            price: Decimal::from(price),
            original_price: None,
            category: None,
            language: None,
            available: true,
            stock: None,
            cover: None,
        }
    }

    fn customer() -> CustomerDetails {
        CustomerDetails {
            first_name: "Amina".to_owned(),
            last_name: "Belkadi".to_owned(),
            email: "amina@example.com".to_owned(),
            phone: "+212612345678".to_owned(),
            address: "12 Rue des Livres".to_owned(),
            city: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn empty_email_is_rejected_before_any_network_call() {
        let api = StubApi::new(false);
        let mut store = storefront(Arc::clone(&api), 1);
        store.selection_mut().add(book(1, 120));

        let mut details = customer();
        details.email = String::new();
        let err = store.submit_order(details).await.unwrap_err();

        assert!(matches!(
            err,
            CheckoutError::Validation(OrderValidationError::MissingRequiredFields)
        ));
        assert_eq!(api.submissions.load(Ordering::SeqCst), 0);
        assert_eq!(store.selection().len(), 1);
    }

    #[tokio::test]
    async fn successful_submission_clears_the_selection() {
        let api = StubApi::new(false);
        let mut store = storefront(Arc::clone(&api), 1);
        store.selection_mut().add(book(1, 120));
        store.selection_mut().add(book(2, 65));

        let order = store.submit_order(customer()).await.unwrap();
        assert_eq!(order.order_number.as_deref(), Some("PW-1001"));
        assert!(store.selection().is_empty());
        assert_eq!(api.submissions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn server_rejection_preserves_the_selection() {
        let api = StubApi::new(true);
        let mut store = storefront(Arc::clone(&api), 1);
        store.selection_mut().add(book(1, 120));

        let err = store.submit_order(customer()).await.unwrap_err();
        let CheckoutError::Submission(err) = err else {
            panic!("expected a submission error");
        };
        assert!(format!("{err:#}").contains("stock exhausted"));
        assert_eq!(store.selection().len(), 1);
    }

    #[tokio::test]
    async fn selection_below_threshold_refuses_checkout() {
        let api = StubApi::new(false);
        let mut store = storefront(Arc::clone(&api), 10);
        for id in 0..3 {
            store.selection_mut().add(book(id, 50));
        }

        let err = store.submit_order(customer()).await.unwrap_err();
        let CheckoutError::Validation(validation) = &err else {
            panic!("expected a validation error");
        };
        assert_eq!(
            *validation,
            OrderValidationError::BelowMinimumSelection {
                required: 10,
                selected: 3,
            }
        );
        let message = err.localized_message(store.i18n());
        assert!(message.contains("10"), "{message}");
        assert_eq!(api.submissions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn load_books_falls_back_to_the_full_list() {
        let api = StubApi::new(false);
        let mut store = storefront(api, 1);
        store.load_books().await;

        assert!(!store.catalog().is_loading());
        assert!(store.catalog().error().is_none());
    }
}
