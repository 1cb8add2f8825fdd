mod display;

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use lexlink_client::{ClientConfig, LawClient, TIMEOUT_RANGE};
use lexlink_core::{
    ArticleRef, CitationExtractor, ExtractorConfig, Record, choose_name_field, rank,
    rank_if_applicable,
};

#[derive(Parser)]
#[command(name = "lexlink", version, about = "Korean statute citations and search ranking")]
struct Cli {
    /// law.go.kr site root.
    #[arg(long, env = "LEXLINK_BASE_URL", default_value = "https://www.law.go.kr", global = true)]
    base_url: String,

    /// HTTP timeout in seconds (5-60).
    #[arg(
        long,
        env = "LEXLINK_TIMEOUT",
        default_value_t = 15,
        global = true,
        value_parser = clap::value_parser!(u64).range(TIMEOUT_RANGE)
    )]
    timeout: u64,

    /// Delay between the law lookup and the article fetch.
    #[arg(long, env = "LEXLINK_REQUEST_DELAY_MS", default_value_t = 100, global = true)]
    request_delay_ms: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract the citations of one or more articles of a law.
    Citations {
        /// Law MST code (법령일련번호).
        #[arg(long)]
        law_id: String,
        /// Law name, e.g. 민법.
        #[arg(long)]
        law_name: String,
        /// Article: 3, 37-2 or 제37조의2. Repeat for several.
        #[arg(long = "article", required = true, num_args = 1..)]
        articles: Vec<ArticleRef>,
        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },
    /// Re-rank a JSON array of search results by relevance to a query.
    Rank {
        #[arg(long)]
        query: String,
        /// Field holding the name to match, e.g. 법령명한글.
        #[arg(long)]
        field: String,
        /// Name field used instead for non-Korean queries, e.g. 법령명영문.
        #[arg(long)]
        other_field: Option<String>,
        /// Rank even wildcard or single-character queries.
        #[arg(long)]
        force: bool,
        /// JSON file to read; stdin when omitted.
        file: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Text,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    tracing::info!("lexlink v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    match cli.command {
        Command::Citations {
            ref law_id,
            ref law_name,
            ref articles,
            format,
        } => {
            let client = LawClient::new(ClientConfig {
                base_url: cli.base_url.clone(),
                timeout_secs: cli.timeout,
            })
            .context("building law.go.kr client")?;
            let extractor = Arc::new(CitationExtractor::new(
                client,
                ExtractorConfig {
                    request_delay: Duration::from_millis(cli.request_delay_ms),
                },
            ));

            let calls = articles.iter().map(|&article| {
                let extractor = Arc::clone(&extractor);
                async move { extractor.extract(law_id, law_name, article).await }
            });
            let mut results = Vec::with_capacity(articles.len());
            for result in futures::future::join_all(calls).await {
                results.push(result?);
            }

            match format {
                Format::Json => println!("{}", serde_json::to_string_pretty(&results)?),
                Format::Text => results.iter().for_each(display::print_citation_card),
            }
        }
        Command::Rank {
            query,
            field,
            other_field,
            force,
            file,
        } => {
            let input = match &file {
                Some(path) => std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buf)
                        .context("reading stdin")?;
                    buf
                }
            };
            let records: Vec<Record> =
                serde_json::from_str(&input).context("expected a JSON array of objects")?;

            let field = name_field(&records, &query, &field, other_field.as_deref());
            tracing::info!(count = records.len(), field, "ranking records");

            let ranked = if force {
                rank(records, &query, field)
            } else {
                rank_if_applicable(records, &query, field)
            };
            println!("{}", serde_json::to_string_pretty(&ranked)?);
        }
    }
    Ok(())
}

/// `--field` as given, or the language-appropriate one of `--field` and
/// `--other-field`.
fn name_field<'a>(
    records: &[Record],
    query: &str,
    field: &'a str,
    other: Option<&'a str>,
) -> &'a str {
    match other {
        Some(other) => choose_name_field(records, query, field, other),
        None => field,
    }
}
