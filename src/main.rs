use clap::Parser;
use std::error::Error;
use std::path::PathBuf;
use yield_records::selectors::{
    PickedElement, calculate_root_element_stats, generate_root_selector, structural_path,
    suggest_field,
};
use yield_records::utils::sanitize_filename;
use yield_records::{Dataset, Document, Extraction, ExtractionEvent};

mod args;
use args::{Args, Command};

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    // Parse command-line arguments
    let args = Args::parse();

    let outcome = match args.command {
        Command::Run {
            config,
            output,
            max_pages,
            delay_ms,
            webdriver,
        } => run(config, output, max_pages, delay_ms, webdriver).await,
        Command::Inspect {
            html,
            selector,
            url,
        } => inspect(html, &selector, url.as_deref()),
        Command::Path { html, root, target } => path(html, &root, &target),
    };

    if let Err(e) = outcome {
        ::log::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(
    config: PathBuf,
    output: Option<PathBuf>,
    max_pages: Option<i64>,
    delay_ms: Option<u64>,
    webdriver: Option<String>,
) -> Result<(), Box<dyn Error>> {
    let mut extraction = Extraction::with_config_file(&config)?;
    if let Some(max_pages) = max_pages {
        extraction = extraction.with_max_pages(max_pages);
    }
    if let Some(delay_ms) = delay_ms {
        extraction = extraction.with_delay_ms(delay_ms);
    }
    if let Some(webdriver) = &webdriver {
        println!("Note: Rendering pages requires a running WebDriver server (e.g., ChromeDriver).");
        extraction = extraction.with_webdriver_url(webdriver);
    }

    let report = extraction.validate();
    if !report.valid {
        for error in &report.errors {
            eprintln!("  - {error}");
        }
        return Err("configuration is not valid".into());
    }

    let output = output.unwrap_or_else(|| {
        let base_url = extraction
            .config()
            .pagination
            .as_ref()
            .map(|p| p.base_url.as_str())
            .unwrap_or_default();
        PathBuf::from(format!("{}.json", sanitize_filename(base_url)))
    });

    // Stop gracefully on Ctrl-C, keeping what was collected so far
    let cancel = extraction.cancel_token();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                ::log::warn!("Interrupted, stopping extraction");
                cancel.cancel();
            }
        }
    });

    let start_time = std::time::Instant::now();
    let mut rx = extraction.generate().await?;
    let mut dataset = Dataset::new();

    while let Some(event) = rx.recv().await {
        match &event {
            ExtractionEvent::Result { position, .. } => {
                ::log::debug!(
                    "Page {}: element {}/{}",
                    position.page,
                    position.element_number,
                    position.total_elements_on_page
                );
            }
            ExtractionEvent::Error { page, message } => {
                eprintln!("Page {page} failed: {message}");
            }
        }
        dataset.push(event);
    }

    dataset.write_json(&output)?;
    println!(
        "Extracted {} records ({} failed pages) in {:.2} seconds -> {}",
        dataset.items.len(),
        dataset.errors.len(),
        start_time.elapsed().as_secs_f64(),
        output.display()
    );

    if cancel.is_cancelled() {
        println!("Extraction was cancelled before all pages were fetched");
    }
    Ok(())
}

fn inspect(html: PathBuf, selector: &str, url: Option<&str>) -> Result<(), Box<dyn Error>> {
    let source = std::fs::read_to_string(html)?;
    let doc = match url {
        Some(url) => Document::parse_with_url(&source, url),
        None => Document::parse(&source),
    };

    let elements = doc.select_all(selector)?;
    println!("{} elements match {}", elements.len(), selector);

    let Some(first) = elements.first() else {
        return Ok(());
    };

    println!("Root selector: {}", generate_root_selector(first));
    println!(
        "{}",
        serde_json::to_string_pretty(&calculate_root_element_stats(first))?
    );
    println!(
        "{}",
        serde_json::to_string_pretty(&PickedElement::from_element(first, doc.base_url()))?
    );
    Ok(())
}

fn path(html: PathBuf, root: &str, target: &str) -> Result<(), Box<dyn Error>> {
    let source = std::fs::read_to_string(html)?;
    let doc = Document::parse(&source);

    let Some(root_element) = doc.select_first(root)? else {
        return Err(format!("no element matches root selector {root}").into());
    };

    let targets = doc.select_all(target)?;
    let Some(target_element) = targets
        .iter()
        .find(|t| yield_records::parsers::html::contains(&root_element, t))
    else {
        return Err(format!("no element matching {target} inside {root}").into());
    };

    let field = suggest_field(Some(&root_element), target_element);
    println!("{}", serde_json::to_string_pretty(&field)?);
    if let Some(structural) = structural_path(&root_element, target_element) {
        println!("Structural path: {structural}");
    }
    Ok(())
}
