use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use chrono::Utc;
use rust_decimal::Decimal;

use crate::api::HttpCatalogApi;
use crate::catalog::{FilterUpdate, PaginationMode, PriceBounds, TagFilter};
use crate::cli::{
    BrowseArgs, LangSetArgs, LangShowArgs, OffersArgs, OrderArgs, PackArgs, PacksArgs,
};
use crate::config::StoreConfig;
use crate::i18n::{
    environment_language, initial_language, Language, LocalFsPreferenceStore, PreferenceStore,
    TranslationTable,
};
use crate::order::{CustomerDetails, OrderLine, OrderRequest};
use crate::storefront::{CheckoutError, Storefront};

fn build_config(api_url: Option<String>) -> anyhow::Result<StoreConfig> {
    let mut config = StoreConfig::from_env().context("load configuration")?;
    if let Some(api_url) = api_url {
        config.api_base_url = api_url;
    }
    Ok(config)
}

fn build_table(locales: Option<&str>) -> anyhow::Result<TranslationTable> {
    let mut table = TranslationTable::built_in();
    if let Some(path) = locales {
        let overlay = TranslationTable::from_yaml_file(Path::new(path))?;
        table.merge(overlay);
    }
    Ok(table)
}

fn build_storefront(config: StoreConfig, table: TranslationTable) -> anyhow::Result<Storefront> {
    let api = HttpCatalogApi::new(&config.api_base_url).context("build catalog client")?;
    Ok(Storefront::new(config, Arc::new(api), table))
}

fn apply_language(store: &mut Storefront, lang: Option<&str>) -> anyhow::Result<()> {
    let Some(raw) = lang else {
        return Ok(());
    };
    let language = Language::parse(raw).ok_or_else(|| {
        anyhow::anyhow!("unsupported language: {raw:?}. expected one of: ar, fr, en")
    })?;
    store.i18n_mut().set_language(language);
    Ok(())
}

/// `all` is the UI sentinel for "no filter".
fn tag_filter(raw: String) -> TagFilter {
    if raw.eq_ignore_ascii_case("all") {
        TagFilter::All
    } else {
        TagFilter::Only(raw)
    }
}

pub async fn browse(args: BrowseArgs) -> anyhow::Result<()> {
    let mut config = build_config(args.api_url)?;
    if let Some(page_size) = args.page_size {
        config.page_size = page_size.max(1);
    }
    if args.client_paging {
        config.server_paging = false;
    }
    let table = build_table(args.locales.as_deref())?;
    let mut store = build_storefront(config, table)?;
    apply_language(&mut store, args.lang.as_deref())?;

    let bounds = (args.min_price.is_some() || args.max_price.is_some()).then_some(PriceBounds {
        min: args.min_price,
        max: args.max_price,
    });
    store.catalog_mut().update_filter(FilterUpdate {
        query: args.query,
        category: args.category.map(tag_filter),
        language: args.book_language.map(tag_filter),
        bounds,
    });

    store.load_books().await;
    bail_on_load_error(&store, "booksLoadError")?;

    if args.page > 0 {
        let was_server = store.catalog().mode() == PaginationMode::Server;
        store.catalog_mut().go_to_page(args.page);
        if was_server && store.catalog().current_page() == args.page {
            store.load_books().await;
            bail_on_load_error(&store, "booksLoadError")?;
        }
    }

    print_book_page(&store);
    Ok(())
}

fn bail_on_load_error(store: &Storefront, key: &str) -> anyhow::Result<()> {
    if let Some(message) = store.catalog().error() {
        anyhow::bail!("{}: {message}", store.i18n().translate(key));
    }
    Ok(())
}

fn print_book_page(store: &Storefront) {
    let i18n = store.i18n();
    let catalog = store.catalog();

    println!("{}", i18n.translate("allBooks"));
    if catalog.visible_books().is_empty() {
        println!("{}", i18n.translate("noBooksFound"));
        println!("{}", i18n.translate("changeSearchCriteria"));
        return;
    }

    for book in catalog.visible_books() {
        let availability = if book.available {
            i18n.translate("available")
        } else {
            i18n.translate("unavailable")
        };
        println!(
            "- {} | {} | {} [{}]",
            book.title,
            book.author,
            i18n.format_currency(book.price),
            availability
        );
    }
    println!(
        "{} {} {} {} ({} {})",
        i18n.translate("page"),
        i18n.format_number(Decimal::from(catalog.current_page() as u64 + 1)),
        i18n.translate("of"),
        i18n.format_number(Decimal::from(catalog.total_pages() as u64)),
        i18n.format_number(Decimal::from(catalog.total_matching())),
        i18n.translate("totalBooks"),
    );
}

pub async fn packs(args: PacksArgs) -> anyhow::Result<()> {
    let config = build_config(args.api_url)?;
    let table = build_table(args.locales.as_deref())?;
    let mut store = build_storefront(config, table)?;
    apply_language(&mut store, args.lang.as_deref())?;
    let i18n = store.i18n();

    let packs = match store.api().fetch_active_packs().await {
        Ok(packs) => packs,
        Err(err) => anyhow::bail!("{}: {err:#}", i18n.translate("packsLoadError")),
    };

    println!("{}", i18n.translate("thematicPacks"));
    if packs.is_empty() {
        println!("{}", i18n.translate("noPacksAvailable"));
        return Ok(());
    }
    for pack in &packs {
        let mut line = format!("- {} | {}", pack.title, i18n.format_currency(pack.price));
        if let Some(original) = pack.original_price
            && original > pack.price
        {
            line.push_str(&format!(
                " ({} {})",
                i18n.translate("save"),
                i18n.format_currency(original - pack.price)
            ));
        }
        if let Some(badge) = pack.badge {
            line.push_str(&format!(" [{}]", i18n.translate(badge.message_key())));
        }
        println!("{line}");
    }
    Ok(())
}

pub async fn offers(args: OffersArgs) -> anyhow::Result<()> {
    let config = build_config(args.api_url)?;
    let table = build_table(args.locales.as_deref())?;
    let mut store = build_storefront(config, table)?;
    apply_language(&mut store, args.lang.as_deref())?;
    let i18n = store.i18n();

    let offers = match store.api().fetch_current_daily_offers().await {
        Ok(offers) => offers,
        Err(err) => anyhow::bail!("{}: {err:#}", i18n.translate("offersLoadError")),
    };

    println!("{}", i18n.translate("dailyOffers"));
    if offers.is_empty() {
        println!("{}", i18n.translate("noOffersAvailable"));
        return Ok(());
    }
    let now = Utc::now();
    for offer in &offers {
        let status = if offer.is_expired(now) {
            i18n.translate("expiredOffer")
        } else {
            let days = offer.remaining_days(now).to_string();
            i18n.translate_with("remainingDays", &[("count", days.as_str())])
        };
        println!(
            "- {} | {} | -{}% | {}",
            offer.title,
            i18n.format_currency(offer.price),
            offer.discount,
            status
        );
    }
    Ok(())
}

pub async fn pack(args: PackArgs) -> anyhow::Result<()> {
    let config = build_config(args.api_url)?;
    let mut store = build_storefront(config, TranslationTable::built_in())?;
    apply_language(&mut store, args.lang.as_deref())?;
    let i18n = store.i18n();

    let pack = match store.api().fetch_pack_by_id(args.id).await {
        Ok(pack) => pack,
        Err(err) => anyhow::bail!("{}: {err:#}", i18n.translate("packsLoadError")),
    };

    println!("{} | {}", pack.title, i18n.format_currency(pack.price));
    println!("{}", pack.description);
    for book in &pack.books {
        println!("- {} | {}", book.title, book.author);
    }
    Ok(())
}

pub async fn order(args: OrderArgs) -> anyhow::Result<()> {
    let mut config = build_config(args.api_url)?;
    if let Some(min_selection) = args.min_selection {
        config.min_selection = min_selection;
    }
    let mut store = build_storefront(config, TranslationTable::built_in())?;
    apply_language(&mut store, args.lang.as_deref())?;

    let items = args
        .books
        .iter()
        .map(|raw| parse_order_line(raw))
        .collect::<anyhow::Result<Vec<_>>>()?;
    let request = OrderRequest {
        customer: CustomerDetails {
            first_name: args.first_name,
            last_name: args.last_name,
            email: args.email,
            phone: args.phone,
            address: args.address,
            city: args.city,
            notes: args.notes,
        },
        items,
    };

    let i18n = store.i18n();
    if let Err(err) = request.validate() {
        anyhow::bail!("{}", CheckoutError::Validation(err).localized_message(i18n));
    }
    if request.items.len() < store.config().min_selection {
        let required = store.config().min_selection.to_string();
        anyhow::bail!(
            "{}",
            i18n.translate_with("minimumSelection", &[("count", required.as_str())])
        );
    }

    match store.api().submit_order(&request).await {
        Ok(order) => {
            println!("{}", i18n.translate("orderSuccess"));
            if let Some(number) = &order.order_number {
                println!("{}: {number}", i18n.translate("summary"));
            }
            println!("{}", i18n.translate("emailConfirmation"));
            Ok(())
        }
        Err(err) => anyhow::bail!("{}: {err:#}", i18n.translate("orderError")),
    }
}

fn parse_order_line(raw: &str) -> anyhow::Result<OrderLine> {
    let (id, quantity) = match raw.split_once(':') {
        Some((id, quantity)) => {
            let quantity = quantity
                .trim()
                .parse()
                .with_context(|| format!("invalid quantity in --book {raw:?}"))?;
            (id, quantity)
        }
        None => (raw, 1),
    };
    if quantity == 0 {
        anyhow::bail!("quantity must be at least 1 in --book {raw:?}");
    }
    let book_id = id
        .trim()
        .parse()
        .with_context(|| format!("invalid book id in --book {raw:?}"))?;
    Ok(OrderLine { book_id, quantity })
}

pub fn lang_set(args: LangSetArgs) -> anyhow::Result<()> {
    let language = Language::parse(&args.code).ok_or_else(|| {
        anyhow::anyhow!("unsupported language: {:?}. expected one of: ar, fr, en", args.code)
    })?;
    let store = preference_store(args.state_dir)?
        .ok_or_else(|| anyhow::anyhow!("language persistence needs --state-dir or PAGEWAVE_STATE_DIR"))?;
    store.save(language).context("persist language choice")?;
    println!("{} ({})", language.code(), language.direction().as_str());
    Ok(())
}

pub fn lang_show(args: LangShowArgs) -> anyhow::Result<()> {
    let config = StoreConfig::from_env().context("load configuration")?;
    let store = preference_store(args.state_dir)?;
    let language = initial_language(
        store.as_ref().map(|store| store as &dyn PreferenceStore),
        environment_language().as_deref(),
        config.default_language,
    );
    println!("{} ({})", language.code(), language.direction().as_str());
    Ok(())
}

fn preference_store(state_dir: Option<String>) -> anyhow::Result<Option<LocalFsPreferenceStore>> {
    let config = StoreConfig::from_env().context("load configuration")?;
    let dir = state_dir.map(PathBuf::from).or(config.state_dir);
    Ok(dir.map(|dir| LocalFsPreferenceStore::new(dir.join("language.json"))))
}
