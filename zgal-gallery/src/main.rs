//! zgal-gallery - headless gallery session
//!
//! Fetches every configured community, builds the category index and the
//! default view, optionally applies a filter and page, and prints the
//! resulting view as JSON on stdout.

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use zgal_common::config::{ConfigResolver, TomlConfig};
use zgal_common::events::{EventBus, RevealCounts};
use zgal_gallery::api::ZenodoClient;
use zgal_gallery::controller::{CategoryListing, FetchSummary, GallerySession, SessionServices};
use zgal_gallery::pagination::PaginationView;
use zgal_gallery::render::headless::{HeadlessLayout, HeadlessLightbox, HeadlessMap, StaticHostPage};
use zgal_gallery::render::{HttpImageProbe, RenderServices};
use zgal_gallery::view::{Filter, ViewState};

#[derive(Parser, Debug)]
#[command(name = "zgal-gallery")]
#[command(about = "Headless photo gallery over Zenodo communities")]
#[command(version)]
struct Args {
    /// Config file (overrides ZGAL_CONFIG and the platform default)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Community to fetch; repeat for several (replaces the configured list)
    #[arg(long = "community")]
    communities: Vec<String>,

    /// Tag filter to apply once the fetch completes
    #[arg(short, long)]
    filter: Option<String>,

    /// Gallery page to show once the fetch completes
    #[arg(short, long)]
    page: Option<usize>,

    /// Items per gallery page
    #[arg(long)]
    page_size: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Serialize)]
struct VisibleItem {
    id: String,
    title: String,
    authors: String,
    year: Option<i32>,
    thumbnail_url: String,
    map_link: Option<String>,
    doi_url: Option<String>,
    shown: bool,
}

#[derive(Serialize)]
struct SessionReport {
    session_id: String,
    fetch: FetchSummary,
    skipped_records: usize,
    failed_collections: Vec<String>,
    view: ViewState,
    total_pages: usize,
    pagination: Option<PaginationView>,
    total_views: u64,
    categories: CategoryListing,
    visible: Vec<VisibleItem>,
}

fn load_config(args: &Args) -> Result<TomlConfig> {
    // Config is read before the global subscriber exists; log that phase to stderr
    let bootstrap = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_writer(std::io::stderr)
        .finish();
    let mut config = tracing::subscriber::with_default(bootstrap, || {
        ConfigResolver::new(args.config.clone()).resolve()
    });

    if !args.communities.is_empty() {
        config.api.communities = args.communities.clone();
    }
    if let Some(page_size) = args.page_size {
        config.gallery.page_size = page_size;
    }
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn init_tracing(config: &TomlConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("zgal_gallery={0},zgal_common={0}", config.logging.level).into());

    match &config.logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;
    init_tracing(&config)?;

    // Build identification right after tracing init
    info!(
        "Starting zgal gallery (zgal-gallery) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!("Communities: {}", config.api.communities.join(", "));

    let source = Arc::new(ZenodoClient::new(&config.api)?);
    let image_client = reqwest::Client::builder()
        .timeout(Duration::from_millis(config.gallery.reveal_timeout_ms))
        .build()
        .context("Failed to build image HTTP client")?;

    let services = SessionServices {
        source,
        host: Arc::new(StaticHostPage::new([
            config.gallery.container.clone(),
            config.map.container.clone(),
        ])),
        render: RenderServices {
            layout: Arc::new(HeadlessLayout::new()),
            lightbox: Arc::new(HeadlessLightbox::new()),
            probe: Arc::new(HttpImageProbe::new(image_client)),
        },
        map: Arc::new(HeadlessMap::new()),
    };

    let event_bus = EventBus::new(256);
    let mut events = event_bus.subscribe();
    let event_logger = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(json) => debug!(event = event.event_type(), "{}", json),
                    Err(e) => warn!("Failed to serialize {} event: {}", event.event_type(), e),
                },
                Err(RecvError::Lagged(skipped)) => warn!("Event logger lagged, {} events skipped", skipped),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let mut session = GallerySession::new(&config, services, event_bus);
    let fetch = session.run().await;

    let mut handle = session.take_render();
    if let Some(raw) = &args.filter {
        handle = Some(session.select_filter(Filter::from_input(raw)));
    }
    if let Some(page) = args.page {
        handle = Some(session.select_page(page));
    }
    let counts = match handle {
        Some(handle) => handle.wait().await,
        None => RevealCounts::default(),
    };
    info!(
        loaded = counts.loaded,
        failed = counts.failed,
        timed_out = counts.timed_out,
        "Visible page revealed"
    );

    if let Some(deadline) = session.progress().dismiss_deadline() {
        tokio::time::sleep_until(deadline).await;
        if session.tick_progress(tokio::time::Instant::now()) {
            debug!("Progress display dismissed");
        }
    }

    let state = session.fetch_state();
    let report = SessionReport {
        session_id: session.session_id().to_string(),
        fetch,
        skipped_records: state.skipped().len(),
        failed_collections: state
            .failures()
            .iter()
            .map(|f| format!("{}: {}", f.collection, f.error))
            .collect(),
        view: session.view().clone(),
        total_pages: session.total_pages(),
        pagination: session.pagination(),
        total_views: session.total_views(),
        categories: session.categories(),
        visible: session
            .pipeline()
            .items()
            .iter()
            .map(|item| VisibleItem {
                id: item.display.id.to_string(),
                title: item.display.title.clone(),
                authors: item.display.authors.clone(),
                year: item.display.year,
                thumbnail_url: item.display.thumbnail_url.clone(),
                map_link: item.display.map_link.clone(),
                doi_url: item.display.doi_url.clone(),
                shown: item.is_shown(),
            })
            .collect(),
    };

    println!("{}", serde_json::to_string_pretty(&report)?);

    drop(session);
    event_logger.abort();
    Ok(())
}
