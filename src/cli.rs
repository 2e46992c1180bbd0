//! Command-line interface definitions for the regional news aggregator.
//!
//! Every option can also come from an environment variable. Flags given on the
//! command line override the matching values from the configuration file.

use clap::Parser;

/// Command-line arguments for one aggregation run.
///
/// # Examples
///
/// ```sh
/// # Built-in sources, digest written under ./json
/// regional_news -j ./json
///
/// # Custom sources and keywords, remembering what was already seen
/// regional_news -c sources.yaml -p seen.json --keyword istanbul --keyword kadıköy
///
/// # Print the digest instead of writing files
/// regional_news --dry-run
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML configuration file
    #[arg(short, long, env = "REGIONAL_NEWS_CONFIG")]
    pub config: Option<String>,

    /// Output directory for the JSON digest
    #[arg(short, long, env = "REGIONAL_NEWS_JSON_DIR", default_value = "./json")]
    pub json_output_dir: String,

    /// JSON file holding the URLs seen in previous runs
    #[arg(short, long, env = "REGIONAL_NEWS_PREVIOUS")]
    pub previous: Option<String>,

    /// Number of sources fetched at the same time
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Maximum number of items in the digest
    #[arg(long)]
    pub max_items: Option<usize>,

    /// Topical keyword (repeatable); replaces the keywords from the config file
    #[arg(long = "keyword")]
    pub keywords: Vec<String>,

    /// Print the digest to stdout and write nothing
    #[arg(long)]
    pub dry_run: bool,
}
