//! Garbanzo - CURIE translation and exact-match lookups over Wikidata
//!
//! Command-line entry point; every subcommand prints JSON on stdout.
//!
//! Usage:
//!   garbanzo resolve DOID:8499
//!   garbanzo exact-matches DOID:1234 MESH:1234 wd:Q1049021
//!   garbanzo claims wd:Q7758678
//!   garbanzo statements wd:Q133696 --keywords blindness --page-number 1

use clap::{Parser, Subcommand};
use garbanzo::{config::GarbanzoConfig, logging, Garbanzo, StatementQuery};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(name = "garbanzo")]
#[command(about = "Translate CURIEs to Wikidata items and find exact matches")]
struct Args {
    /// Log filter, overridden by RUST_LOG
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    /// Outbound request timeout in seconds
    #[arg(long, default_value = "60", global = true)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Items carrying a CURIE
    Resolve { curie: String },

    /// Exact-match closure over CURIEs and `wd:` ids
    ExactMatches {
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// CURIEs carried by each item
    Claims {
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Item-valued statements around items
    Statements {
        #[arg(required = true)]
        ids: Vec<String>,

        #[arg(long, value_delimiter = ',')]
        keywords: Vec<String>,

        /// Semantic group codes, e.g. DISO,GENE
        #[arg(long, value_delimiter = ',')]
        types: Vec<String>,

        #[arg(long)]
        page_number: Option<usize>,

        #[arg(long)]
        page_size: Option<usize>,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    logging::init(&args.log_level)?;

    let config = GarbanzoConfig { request_timeout_secs: args.timeout_secs, ..GarbanzoConfig::default() };
    let garbanzo = Garbanzo::from_config(&config)?;

    match args.command {
        Command::Resolve { curie } => print_json(&garbanzo.resolve_equivalent_item(&curie).await?),
        Command::ExactMatches { ids } => print_json(&garbanzo.close_exact_matches(&ids).await?),
        Command::Claims { ids } => print_json(&garbanzo.get_claims_as_curies(&ids).await?),
        Command::Statements { ids, keywords, types, page_number, page_size } => {
            let query = StatementQuery {
                sources: ids,
                keywords,
                types,
                page_number,
                page_size,
                ..StatementQuery::default()
            };
            print_json(&garbanzo.query_statements_page(&query).await?)
        }
    }
}
