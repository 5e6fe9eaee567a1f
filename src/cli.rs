use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Browse the catalog with filters and pagination.
    Browse(BrowseArgs),
    /// List the active thematic packs.
    Packs(PacksArgs),
    /// List the current daily offers.
    Offers(OffersArgs),
    /// Show one pack with its books.
    Pack(PackArgs),
    /// Submit an order directly from the command line.
    Order(OrderArgs),
    Lang {
        #[command(subcommand)]
        command: LangCommand,
    },
}

#[derive(Debug, Args)]
pub struct BrowseArgs {
    /// Base URL of the bookstore API.
    #[arg(long)]
    pub api_url: Option<String>,

    /// Interface language (ar, fr, en).
    #[arg(long)]
    pub lang: Option<String>,

    /// Extra locale overlay file (YAML) merged over the built-in strings.
    #[arg(long)]
    pub locales: Option<String>,

    /// Free-text search over title, author and description.
    #[arg(long)]
    pub query: Option<String>,

    /// Category tag, e.g. FICTION, DEV, BUSINESS.
    #[arg(long)]
    pub category: Option<String>,

    /// Book language tag, e.g. ar, fr, en.
    #[arg(long)]
    pub book_language: Option<String>,

    /// Minimum price bound.
    #[arg(long)]
    pub min_price: Option<Decimal>,

    /// Maximum price bound.
    #[arg(long)]
    pub max_price: Option<Decimal>,

    /// Page index to display (0-based).
    #[arg(long, default_value_t = 0)]
    pub page: usize,

    /// Books per page.
    #[arg(long)]
    pub page_size: Option<usize>,

    /// Skip the server-paginated endpoint and fetch the full list.
    #[arg(long)]
    pub client_paging: bool,
}

#[derive(Debug, Args)]
pub struct PacksArgs {
    /// Base URL of the bookstore API.
    #[arg(long)]
    pub api_url: Option<String>,

    /// Interface language (ar, fr, en).
    #[arg(long)]
    pub lang: Option<String>,

    /// Extra locale overlay file (YAML) merged over the built-in strings.
    #[arg(long)]
    pub locales: Option<String>,
}

#[derive(Debug, Args)]
pub struct OffersArgs {
    /// Base URL of the bookstore API.
    #[arg(long)]
    pub api_url: Option<String>,

    /// Interface language (ar, fr, en).
    #[arg(long)]
    pub lang: Option<String>,

    /// Extra locale overlay file (YAML) merged over the built-in strings.
    #[arg(long)]
    pub locales: Option<String>,
}

#[derive(Debug, Args)]
pub struct PackArgs {
    /// Pack identifier.
    #[arg(long)]
    pub id: i64,

    /// Base URL of the bookstore API.
    #[arg(long)]
    pub api_url: Option<String>,

    /// Interface language (ar, fr, en).
    #[arg(long)]
    pub lang: Option<String>,
}

#[derive(Debug, Args)]
pub struct OrderArgs {
    /// Base URL of the bookstore API.
    #[arg(long)]
    pub api_url: Option<String>,

    /// Interface language (ar, fr, en).
    #[arg(long)]
    pub lang: Option<String>,

    #[arg(long)]
    pub first_name: String,

    #[arg(long)]
    pub last_name: String,

    #[arg(long)]
    pub email: String,

    #[arg(long)]
    pub phone: String,

    /// Delivery address.
    #[arg(long)]
    pub address: String,

    #[arg(long)]
    pub city: Option<String>,

    /// Free-text delivery notes.
    #[arg(long)]
    pub notes: Option<String>,

    /// Line item as `bookId` or `bookId:quantity`. Repeatable.
    #[arg(long = "book")]
    pub books: Vec<String>,

    /// Smallest selection size that permits checkout.
    #[arg(long)]
    pub min_selection: Option<usize>,
}

#[derive(Debug, Subcommand)]
pub enum LangCommand {
    /// Persist a language choice.
    Set(LangSetArgs),
    /// Show the language the storefront would start in.
    Show(LangShowArgs),
}

#[derive(Debug, Args)]
pub struct LangSetArgs {
    /// Language code (ar, fr, en).
    pub code: String,

    /// Directory for persisted client state.
    #[arg(long)]
    pub state_dir: Option<String>,
}

#[derive(Debug, Args)]
pub struct LangShowArgs {
    /// Directory for persisted client state.
    #[arg(long)]
    pub state_dir: Option<String>,
}
