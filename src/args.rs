use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "yield-records")]
#[command(about = "Extract structured records from paginated listing pages")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a paginated extraction described by a JSON configuration file
    Run {
        /// Path to the extraction configuration file
        #[arg(short, long)]
        config: PathBuf,

        /// Output file (defaults to a name derived from the base URL)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Override the number of pages to fetch
        #[arg(long)]
        max_pages: Option<i64>,

        /// Override the delay between page requests, in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,

        /// Render pages through this WebDriver endpoint
        #[arg(long)]
        webdriver: Option<String>,
    },

    /// Show the selector and statistics for elements of a saved page
    Inspect {
        /// Saved HTML page
        #[arg(long)]
        html: PathBuf,

        /// CSS selector of the elements to inspect
        #[arg(short, long)]
        selector: String,

        /// URL the page was saved from, used to resolve links
        #[arg(long)]
        url: Option<String>,
    },

    /// Suggest a field for an element inside the first root element
    Path {
        /// Saved HTML page
        #[arg(long)]
        html: PathBuf,

        /// CSS selector of the root element
        #[arg(short, long)]
        root: String,

        /// CSS selector of the target element
        #[arg(short, long)]
        target: String,
    },
}
