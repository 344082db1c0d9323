use clap::{Parser, Subcommand, ValueEnum};
use pdf_harvest::filter::FilterMode;

#[derive(Parser, Debug)]
#[command(name = "pdf-harvest")]
#[command(about = "Crawls a rendered web page for PDF links, downloads and merges them")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to a JSON configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Crawl one page for PDF links and download them
    Crawl {
        /// Target page URL
        url: String,

        /// How to select candidates for download
        #[arg(short, long, value_enum, default_value_t = FilterModeArg::All)]
        filter: FilterModeArg,

        /// Keyword for the keyword filter (repeatable)
        #[arg(short, long)]
        keyword: Vec<String>,

        /// Write the full crawl result as JSON to this path
        #[arg(long)]
        report: Option<String>,

        /// Merge the downloaded files into this filename after the crawl
        #[arg(long, value_name = "NAME")]
        merge: Option<String>,

        /// Delete the source files after a successful merge
        #[arg(long, requires = "merge")]
        delete_originals: bool,
    },

    /// Merge the PDFs already sitting in a directory
    Merge {
        /// Directory to merge; defaults to the configured download directory
        dir: Option<String>,

        /// Output filename, created inside the directory
        #[arg(short, long, default_value = "merged_pdfs.pdf")]
        output: String,

        /// Which files to include, by filename
        #[arg(short, long, value_enum, default_value_t = FilterModeArg::All)]
        filter: FilterModeArg,

        /// Keyword for the keyword filter (repeatable)
        #[arg(short, long)]
        keyword: Vec<String>,

        /// Delete the source files after a successful merge
        #[arg(long)]
        delete_originals: bool,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum FilterModeArg {
    /// Download every discovered link
    All,
    /// Only names starting with a figure/table marker
    Prefix,
    /// Only names containing one of the given keywords
    Keyword,
}

/// Convert from CLI filter mode to internal filter mode
pub fn convert_filter_mode(arg_mode: FilterModeArg) -> FilterMode {
    match arg_mode {
        FilterModeArg::All => FilterMode::All,
        FilterModeArg::Prefix => FilterMode::PrefixMatch,
        FilterModeArg::Keyword => FilterMode::KeywordMatch,
    }
}
