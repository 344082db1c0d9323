use clap::Parser;
use pdf_harvest::{CrawlerConfig, FilterMode, PdfCrawler, crawler};
use std::error::Error;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Page to crawl for PDF links
    url: String,

    /// Path to crawler configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Merge everything that was downloaded into one file
    #[arg(short, long)]
    merge: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize logger
    env_logger::init();

    // Parse command line arguments
    let args = Args::parse();

    // Load configuration from file, or start from defaults
    let config = match &args.config {
        Some(path) => CrawlerConfig::from_file(path)?,
        None => CrawlerConfig::default(),
    };

    println!("Crawler configuration:");
    println!("  WebDriver URL: {}", config.webdriver_url);
    println!("  Download dir:  {}", config.output.base_dir);
    println!("  Max workers:   {}", config.download.max_workers);

    let harvester = PdfCrawler::new(config);

    let start_time = std::time::Instant::now();
    let result = harvester.crawl(&args.url, FilterMode::All, &[]).await;

    println!("{}", crawler::generate_report(&result));
    println!(
        "Crawl complete. Downloaded {} file(s) in {:.2} seconds.",
        result.pdf_downloaded,
        start_time.elapsed().as_secs_f64()
    );

    if args.merge && result.pdf_downloaded > 0 {
        let merged = harvester.merge_downloads("merged_pdfs.pdf", FilterMode::All, &[], false);
        match merged.output_file {
            Some(path) => println!(
                "Merged {} page(s) into {}",
                merged.total_pages,
                path.display()
            ),
            None => println!(
                "Merge failed: {}",
                merged.error.as_deref().unwrap_or("unknown error")
            ),
        }
    }

    Ok(())
}
