use clap::Parser;
use pdf_harvest::config::CrawlerConfig;
use pdf_harvest::crawler::{self, PdfCrawler};

mod args;
use args::{Args, Command, convert_filter_mode};

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    // Parse command-line arguments
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => match CrawlerConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                ::log::error!("Failed to load configuration from {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => CrawlerConfig::default(),
    };

    // Override the WebDriver URL with an environment variable if provided
    if let Ok(webdriver_url) = std::env::var("WEBDRIVER_URL") {
        if !webdriver_url.is_empty() {
            config.webdriver_url = webdriver_url;
        }
    }

    match args.command {
        Command::Crawl {
            url,
            filter,
            keyword,
            report,
            merge,
            delete_originals,
        } => {
            println!("Note: Crawling requires a WebDriver server (e.g., ChromeDriver).");
            println!(
                "Set WEBDRIVER_URL environment variable if not using the default {}",
                config.webdriver_url
            );

            let mode = convert_filter_mode(filter);
            let harvester = PdfCrawler::new(config);

            ::log::info!("Starting crawl for URL: {}", url);
            let result = harvester.crawl(&url, mode, &keyword).await;

            println!("{}", crawler::generate_report(&result));

            if let Some(path) = report {
                if let Err(e) = crawler::save_report(&result, std::path::Path::new(&path)) {
                    ::log::error!("Failed to save report to {}: {}", path, e);
                }
            }

            let mut failed = !result.success();

            if let Some(output) = merge {
                if result.pdf_downloaded > 0 {
                    let merged = harvester.merge_downloads(
                        &output,
                        pdf_harvest::filter::FilterMode::All,
                        &[],
                        delete_originals,
                    );
                    print_merge_outcome(&merged);
                    failed = failed || !merged.success;
                } else {
                    ::log::warn!("Nothing was downloaded, skipping merge");
                }
            }

            if failed {
                std::process::exit(1);
            }
        }
        Command::Merge {
            dir,
            output,
            filter,
            keyword,
            delete_originals,
        } => {
            if let Some(dir) = dir {
                config.output.base_dir = dir;
            }
            let mode = convert_filter_mode(filter);
            let harvester = PdfCrawler::new(config);
            let merged = harvester.merge_downloads(&output, mode, &keyword, delete_originals);
            print_merge_outcome(&merged);
            if !merged.success {
                std::process::exit(1);
            }
        }
    }
}

fn print_merge_outcome(merged: &pdf_harvest::results::MergeResult) {
    if merged.success {
        println!(
            "Merged {} file(s), {} page(s) into {} ({:.2} MB)",
            merged.files_merged,
            merged.total_pages,
            merged
                .output_file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            merged.output_size_mb
        );
        if merged.deleted_originals {
            println!("Deleted {} original file(s)", merged.deleted_files.len());
        }
    } else {
        println!(
            "Merge failed: {}",
            merged.error.as_deref().unwrap_or("unknown error")
        );
    }
}
