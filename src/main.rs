use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    pagewave::logging::init().context("init logging")?;

    let cli = pagewave::cli::Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        pagewave::cli::Command::Browse(args) => {
            pagewave::commands::browse(args).await.context("browse")?;
        }
        pagewave::cli::Command::Packs(args) => {
            pagewave::commands::packs(args).await.context("packs")?;
        }
        pagewave::cli::Command::Offers(args) => {
            pagewave::commands::offers(args).await.context("offers")?;
        }
        pagewave::cli::Command::Pack(args) => {
            pagewave::commands::pack(args).await.context("pack")?;
        }
        pagewave::cli::Command::Order(args) => {
            pagewave::commands::order(args).await.context("order")?;
        }
        pagewave::cli::Command::Lang {
            command: pagewave::cli::LangCommand::Set(args),
        } => {
            pagewave::commands::lang_set(args).context("lang set")?;
        }
        pagewave::cli::Command::Lang {
            command: pagewave::cli::LangCommand::Show(args),
        } => {
            pagewave::commands::lang_show(args).context("lang show")?;
        }
    }

    Ok(())
}
