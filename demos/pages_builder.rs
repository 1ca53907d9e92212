use clap::Parser;
use std::error::Error;
use yield_records::{Extraction, ExtractionConfig, ExtractionEvent, FieldDescriptor, PaginationConfig};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Listing URL without the page parameter
    #[arg(short, long)]
    url: String,

    /// CSS selector of the repeating record element
    #[arg(short, long)]
    root: String,

    /// Fields as name=path pairs, extracted as text
    #[arg(short, long, value_parser = parse_field)]
    field: Vec<(String, String)>,

    /// Name of the page query parameter
    #[arg(long, default_value = "page")]
    page_param: String,

    /// Number of pages to fetch
    #[arg(short, long, default_value_t = 1)]
    max_pages: i64,

    /// Delay between pages in milliseconds
    #[arg(short, long)]
    delay_ms: Option<u64>,
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(name, path)| (name.to_string(), path.to_string()))
        .ok_or_else(|| format!("expected name=path, got {raw}"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize logger
    env_logger::init();

    // Parse command line arguments
    let args = Args::parse();

    println!("Starting extraction for URL: {}", args.url);

    let fields = args
        .field
        .iter()
        .map(|(name, path)| FieldDescriptor::text(name, path))
        .collect();
    let pagination = PaginationConfig::new(&args.url, &args.page_param, args.max_pages);

    // Create an Extraction builder with the configuration
    let mut extraction = Extraction::new(ExtractionConfig::new(&args.root, fields, pagination));

    if let Some(delay_ms) = args.delay_ms {
        println!("Overriding delay: {}ms", delay_ms);
        extraction = extraction.with_delay_ms(delay_ms);
    }

    // Start the run
    let mut rx = extraction.generate().await?;

    let mut records = 0;
    let start_time = std::time::Instant::now();

    while let Some(event) = rx.recv().await {
        match event {
            ExtractionEvent::Result { position, data } => {
                records += 1;
                println!(
                    "Page {} [{}/{}]: {}",
                    position.page,
                    position.element_number,
                    position.total_elements_on_page,
                    serde_json::Value::Object(data)
                );
            }
            ExtractionEvent::Error { page, message } => {
                println!("Page {} failed: {}", page, message);
            }
        }
    }

    println!(
        "Extraction complete. Received {} records in {:.2} seconds.",
        records,
        start_time.elapsed().as_secs_f64()
    );

    Ok(())
}
