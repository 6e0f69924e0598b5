//! PDF Translate Client CLI - upload a PDF to a translation server and follow its progress.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use pdf_translate_client_core::languages::NO_RESULTS_LABEL;
use pdf_translate_client_core::viewer::PageView;
use pdf_translate_client_core::{
    ClientConfig, ExportLinks, FlowObserver, LanguageMatches, NoticeLevel, Notification,
    PageController, PdfFile, ProgressView, TranslationStatus, UploadStatus,
};
use std::path::{Path, PathBuf};
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "pdf-translate-client")]
#[command(author, version, about = "Translate PDF documents on a translation server", long_about = None)]
struct Args {
    /// Translation server base URL
    #[arg(long, env = "PDF_TRANSLATE_SERVER")]
    server: Option<String>,

    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check whether the server can translate
    Status,

    /// List target languages, optionally filtered
    Languages {
        /// Case-insensitive substring
        query: Option<String>,
    },

    /// Upload a PDF, translate it and show the result
    Translate {
        /// Input PDF file
        input: PathBuf,

        /// Target language name (default: from config)
        #[arg(short, long)]
        language: Option<String>,

        /// Page to show (default: first page)
        #[arg(short, long)]
        page: Option<u32>,

        /// Show every page
        #[arg(long, conflicts_with = "page")]
        all_pages: bool,

        /// Save the PDF and Markdown exports into this directory
        #[arg(short, long)]
        download: Option<PathBuf>,
    },
}

/// Reports flow updates on a progress bar
struct BarObserver {
    pb: ProgressBar,
}

impl BarObserver {
    fn new() -> Self {
        let pb = ProgressBar::new(100);
        // Template is hardcoded and valid, unwrap is safe
        #[allow(clippy::unwrap_used)]
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg}")
                .unwrap()
                .progress_chars("#>-"),
        );
        Self { pb }
    }
}

impl FlowObserver for BarObserver {
    fn on_upload_status(&mut self, status: &UploadStatus) {
        match status {
            UploadStatus::Idle => {}
            UploadStatus::Uploading { file_name } | UploadStatus::Complete { file_name } => {
                self.pb.set_message(format!("{} {}", status.label(), file_name));
            }
            UploadStatus::Failed { file_name, message } => {
                self.pb
                    .println(format!("{} {}: {}", status.label(), file_name, message));
            }
        }
    }

    fn on_progress(&mut self, progress: &ProgressView) {
        self.pb.set_position(u64::from(progress.percent));
        self.pb
            .set_message(format!("{} {}", progress.status, progress.details));
    }

    fn on_completed(&mut self, _links: Option<&ExportLinks>) {
        self.pb.finish_with_message("Translation complete");
    }

    fn on_notification(&mut self, notification: &Notification) {
        self.pb.println(format_notification(notification));
    }
}

fn format_notification(notification: &Notification) -> String {
    let level = match notification.level {
        NoticeLevel::Error => "error",
        NoticeLevel::Warning => "warning",
    };
    format!("[{level}] {}", notification.message)
}

#[allow(clippy::print_stdout)]
fn print_notifications(controller: &PageController) {
    for notification in controller.notifications() {
        println!("{}", format_notification(notification));
    }
}

// CLI output is intentional
#[allow(clippy::print_stdout)]
fn print_page(view: &PageView<'_>) {
    println!("=== Page {} ===", view.page_number);
    println!("--- Original ---");
    println!("{}", view.original_text());
    println!("--- Translation ---");
    println!("{}", view.translated_text());
    println!();
}

#[allow(clippy::print_stdout)]
fn print_languages(matches: &LanguageMatches) {
    match matches {
        LanguageMatches::Matches(names) => {
            for name in names {
                println!("{name}");
            }
        }
        LanguageMatches::NoResults => println!("{NO_RESULTS_LABEL}"),
    }
}

#[allow(clippy::print_stdout)]
fn print_saved(paths: &[PathBuf]) {
    for path in paths {
        println!("Saved: {}", path.display());
    }
}

/// Fetch both exports and write them next to each other
async fn download_exports(
    controller: &PageController,
    links: &ExportLinks,
    dir: &Path,
    stem: &str,
    language: &str,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .context(format!("Failed to create directory: {}", dir.display()))?;

    let suffix = language.to_lowercase().replace(' ', "_");
    let mut written = Vec::with_capacity(2);
    for (url, extension) in [(&links.pdf, "pdf"), (&links.markdown, "md")] {
        let bytes = controller
            .download(url)
            .await
            .context(format!("Failed to download {url}"))?;
        let path = dir.join(format!("{stem}-{suffix}.{extension}"));
        std::fs::write(&path, bytes)
            .context(format!("Failed to write output: {}", path.display()))?;
        written.push(path);
    }
    Ok(written)
}

async fn translate(
    controller: PageController,
    input: &Path,
    language: &str,
    page: Option<u32>,
    all_pages: bool,
    download: Option<&Path>,
) -> Result<()> {
    let file = PdfFile::from_path(input)
        .context(format!("Failed to read PDF: {}", input.display()))?;

    let observer = BarObserver::new();
    let pb = observer.pb.clone();
    let mut controller = controller.with_observer(Box::new(observer));

    controller.initialize().await;
    if !controller.languages().is_enabled() {
        bail!("No target languages available from the server");
    }

    let document = controller
        .upload(file)
        .await
        .context(format!("Failed to upload: {}", input.display()))?;
    info!(
        "Uploaded {} ({} pages)",
        document.file_name,
        document.page_count()
    );

    let language = controller.select_language(language)?.to_string();

    let status = controller.start_translation().await;
    if !pb.is_finished() {
        pb.abandon();
    }

    match status {
        Some(TranslationStatus::Completed) => {}
        Some(_) => {
            let reason = controller
                .session()
                .and_then(|session| session.failure())
                .map_or_else(|| "unknown error".to_string(), |f| f.message.clone());
            controller.shutdown().await;
            bail!("Translation failed: {reason}");
        }
        None => bail!("Translation could not be started"),
    }

    match controller.viewer() {
        Some(viewer) => {
            let options = viewer.page_options();
            if all_pages {
                for option in &options {
                    print_page(&viewer.show(option.page_number));
                }
            } else {
                let first = options.first().map_or(1, |o| o.page_number);
                print_page(&viewer.show(page.unwrap_or(first)));
            }
        }
        None => warn!("Translated text is not available for viewing"),
    }

    if let Some(dir) = download {
        match controller.resolved_export_links() {
            Some(links) => {
                let stem = input
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("output");
                let written = download_exports(&controller, &links, dir, stem, &language).await?;
                print_saved(&written);
            }
            None => warn!("Server returned no export link"),
        }
    }

    controller.shutdown().await;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before parsing args so env vars are available)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Setup logging
    let log_level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    // Load config, then let CLI arguments override it
    let mut config = if let Some(config_path) = &args.config {
        ClientConfig::from_file(config_path).context("Failed to load config file")?
    } else {
        ClientConfig::load()
    };

    if let Some(server) = args.server {
        config.server_url = server;
    }
    let default_language = config.default_language.clone();

    info!("Using server {}", config.server_url);
    let mut controller =
        pdf_translate_client_core::connect(config).context("Failed to set up client")?;

    match args.command {
        Command::Status => {
            controller.initialize().await;
            let status = controller
                .service_status()
                .context("Could not reach the translation server")?;

            #[allow(clippy::print_stdout)]
            {
                println!(
                    "Translation available: {}",
                    if status.translation_available { "yes" } else { "no" }
                );
                if let Some(key_status) = &status.api_key_status {
                    println!("API key: {key_status}");
                }
            }
            print_notifications(&controller);
        }
        Command::Languages { query } => {
            controller.initialize().await;
            print_notifications(&controller);
            print_languages(&controller.filter_languages(query.as_deref().unwrap_or_default()));
        }
        Command::Translate {
            input,
            language,
            page,
            all_pages,
            download,
        } => {
            let Some(language) = language.or(default_language) else {
                bail!("No target language given (use --language or set default_language)");
            };
            translate(
                controller,
                &input,
                &language,
                page,
                all_pages,
                download.as_deref(),
            )
            .await?;
        }
    }

    Ok(())
}
