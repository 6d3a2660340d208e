//! `a11y` -- dispatch accessibility audits and query their results.
//!
//! Defaults come from the environment (see [`DispatchConfig::from_env`]);
//! command-line flags override them.
//!
//! | Variable   | Default                                             | Description |
//! |------------|-----------------------------------------------------|-------------|
//! | `RUST_LOG` | `a11y_cli=info,a11y_dispatch=info,a11y_client=warn` | Log filter  |

use std::sync::Arc;

use a11y_client::http::build_client;
use a11y_client::{ReportApi, SitemapClient, WorkerApi};
use a11y_core::types::NewReport;
use a11y_dispatch::{DispatchConfig, Dispatcher};
use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "a11y", version, about = "Accessibility audit dispatcher")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Audit every page listed in a sitemap.
    #[command(alias = "sm")]
    Sitemap {
        token: String,
        sitemap_url: String,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Audit a comma-separated list of pages.
    #[command(alias = "l")]
    List {
        token: String,
        #[arg(required = true, value_delimiter = ',')]
        urls: Vec<String>,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Fetch a single record by id.
    #[command(alias = "g")]
    Get {
        token: String,
        kind: RecordKind,
        id: String,
        #[arg(short = 'a', long = "api")]
        api_url: Option<String>,
    },
    /// List records, optionally filtered.
    #[command(alias = "gl")]
    Getlist {
        token: String,
        kind: ListKind,
        #[arg(short = 'a', long = "api")]
        api_url: Option<String>,
        /// Filter as `key=value`; repeatable.
        #[arg(long = "query", value_parser = parse_query)]
        query: Vec<(String, String)>,
    },
}

#[derive(Debug, Args)]
struct RunArgs {
    #[arg(short = 'a', long = "api")]
    api_url: Option<String>,
    #[arg(short = 'w', long = "worker")]
    worker_url: Option<String>,
    #[arg(short = 'c', long)]
    concurrency: Option<usize>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RecordKind {
    Issue,
    Report,
    Url,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ListKind {
    Issues,
    Reports,
    Urls,
    Contexts,
}

fn parse_query(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got {raw:?}")),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "a11y_cli=info,a11y_dispatch=info,a11y_client=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let mut config = DispatchConfig::from_env().context("Invalid configuration")?;

    match cli.command {
        Command::Sitemap {
            token,
            sitemap_url,
            run,
        } => {
            run.apply(&mut config)?;
            let client = build_client(config.request_timeout)?;
            let dispatcher = build_dispatcher(client.clone(), &token, config)?;
            let sitemap = SitemapClient::with_client(client);
            let new_report = dispatcher.prepare_sitemap(&sitemap, &sitemap_url).await?;
            dispatch(&dispatcher, new_report).await
        }
        Command::List { token, urls, run } => {
            run.apply(&mut config)?;
            let urls: Vec<String> = urls
                .into_iter()
                .map(|u| u.trim().to_string())
                .filter(|u| !u.is_empty())
                .collect();
            let client = build_client(config.request_timeout)?;
            let dispatcher = build_dispatcher(client, &token, config)?;
            let new_report = dispatcher.prepare_list(urls)?;
            dispatch(&dispatcher, new_report).await
        }
        Command::Get {
            token,
            kind,
            id,
            api_url,
        } => {
            let api = report_api(&config, api_url, &token)?;
            let value = match kind {
                RecordKind::Issue => api.get_issue(&id).await?,
                RecordKind::Report => serde_json::to_value(api.get_report(&id).await?)?,
                RecordKind::Url => api.get_url(&id).await?,
            };
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
        Command::Getlist {
            token,
            kind,
            api_url,
            query,
        } => {
            let api = report_api(&config, api_url, &token)?;
            let value = match kind {
                ListKind::Issues => serde_json::to_value(api.list_issues(&query).await?)?,
                ListKind::Reports => serde_json::to_value(api.list_reports(&query).await?)?,
                ListKind::Urls => serde_json::to_value(api.list_urls(&query).await?)?,
                ListKind::Contexts => serde_json::to_value(api.list_contexts(&query).await?)?,
            };
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
    }
}

impl RunArgs {
    fn apply(self, config: &mut DispatchConfig) -> anyhow::Result<()> {
        if let Some(api_url) = self.api_url {
            config.api_url = api_url;
        }
        if let Some(worker_url) = self.worker_url {
            config.worker_url = worker_url;
        }
        if let Some(concurrency) = self.concurrency {
            if concurrency == 0 {
                bail!("--concurrency must be at least 1");
            }
            config.concurrency = concurrency;
        }
        Ok(())
    }
}

fn report_api(
    config: &DispatchConfig,
    api_url: Option<String>,
    token: &str,
) -> anyhow::Result<ReportApi> {
    let client = build_client(config.request_timeout)?;
    let api_url = api_url.unwrap_or_else(|| config.api_url.clone());
    Ok(ReportApi::with_client(client, api_url, token)?)
}

fn build_dispatcher(
    client: reqwest::Client,
    token: &str,
    config: DispatchConfig,
) -> anyhow::Result<Dispatcher<ReportApi, WorkerApi>> {
    let store = Arc::new(ReportApi::with_client(client.clone(), &config.api_url, token)?);
    let auditor = Arc::new(WorkerApi::with_client(client, &config.worker_url, token)?);

    tracing::info!(
        api_url = %config.api_url,
        worker_url = %config.worker_url,
        concurrency = config.concurrency,
        "Starting dispatch",
    );
    Ok(Dispatcher::new(store, auditor, config))
}

/// Create the report, then drain its URLs until done or Ctrl-C.
async fn dispatch(
    dispatcher: &Dispatcher<ReportApi, WorkerApi>,
    new_report: NewReport,
) -> anyhow::Result<()> {
    let report = dispatcher.create_report(&new_report).await?;
    println!("Report created: {}", report.id);

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight URLs");
            on_signal.cancel();
        }
    });

    let summary = dispatcher.drain(&report, new_report.urls, &cancel).await?;
    println!(
        "Progress: {}% ({}/{} URLs, {} codes)",
        summary.progress.percent(),
        summary.progress.completed,
        summary.progress.total,
        summary.progress.codes.len(),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parses_query_pairs() {
        assert_eq!(
            parse_query("reportId=r1").unwrap(),
            ("reportId".to_string(), "r1".to_string())
        );
        assert_eq!(parse_query("code=a=b").unwrap().1, "a=b");
        assert!(parse_query("reportId").is_err());
        assert!(parse_query("=r1").is_err());
    }

    #[test]
    fn list_splits_comma_separated_urls() {
        let cli = Cli::try_parse_from([
            "a11y",
            "list",
            "tok",
            "https://a.test/1,https://a.test/2",
            "-c",
            "3",
        ])
        .unwrap();
        assert_matches!(cli.command, Command::List { token, urls, run } => {
            assert_eq!(token, "tok");
            assert_eq!(urls, vec!["https://a.test/1", "https://a.test/2"]);
            assert_eq!(run.concurrency, Some(3));
        });
    }

    #[test]
    fn getlist_collects_repeated_queries() {
        let cli = Cli::try_parse_from([
            "a11y", "getlist", "tok", "contexts", "--query", "reportId=r1", "--query", "code=X",
        ])
        .unwrap();
        assert_matches!(cli.command, Command::Getlist { kind: ListKind::Contexts, query, .. } => {
            assert_eq!(query.len(), 2);
            assert_eq!(query[1], ("code".to_string(), "X".to_string()));
        });
    }

    #[test]
    fn subcommand_aliases_resolve() {
        let cli = Cli::try_parse_from(["a11y", "sm", "tok", "https://a.test/sitemap.xml"]).unwrap();
        assert_matches!(cli.command, Command::Sitemap { .. });

        let cli = Cli::try_parse_from(["a11y", "l", "tok", "https://a.test/1"]).unwrap();
        assert_matches!(cli.command, Command::List { .. });

        let cli = Cli::try_parse_from(["a11y", "g", "tok", "report", "r1"]).unwrap();
        assert_matches!(cli.command, Command::Get { kind: RecordKind::Report, .. });

        let cli = Cli::try_parse_from(["a11y", "gl", "tok", "urls"]).unwrap();
        assert_matches!(cli.command, Command::Getlist { kind: ListKind::Urls, .. });
    }

    #[test]
    fn run_args_override_config() {
        let mut config = DispatchConfig::default();
        RunArgs {
            api_url: Some("http://localhost:3000".into()),
            worker_url: None,
            concurrency: Some(4),
        }
        .apply(&mut config)
        .unwrap();
        assert_eq!(config.api_url, "http://localhost:3000");
        assert_eq!(config.worker_url, a11y_dispatch::config::DEFAULT_WORKER_URL);
        assert_eq!(config.concurrency, 4);
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let mut config = DispatchConfig::default();
        let args = RunArgs {
            api_url: None,
            worker_url: None,
            concurrency: Some(0),
        };
        assert!(args.apply(&mut config).is_err());
    }
}
