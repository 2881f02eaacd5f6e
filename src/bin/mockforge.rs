use std::{
    collections::HashMap,
    fs::File,
    io::BufReader,
    net::SocketAddr,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use mockforge::{
    ColorGrade, ComposeOutcome, Compositor, EngineConfig, FillMode, HttpFetcher,
    HttpListingService, InMemoryArtworkStore, InMemoryCatalog, InMemoryListingService,
    InMemoryMockupStore, JobRegistry, JobRunner, LinkedListing, ListingService, ProductId,
    Registry, RegistrySeed, StaticToken, Template, TemplateId, TemplateSpec, WorkflowDeps,
    workflow::approval::ApprovalWorkflow,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "mockforge", version)]
struct Cli {
    /// Engine config JSON (defaults apply when omitted).
    #[arg(long, global = true, env = "MOCKFORGE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compose a single mockup to a file.
    Compose(ComposeArgs),
    /// Run the HTTP service with in-memory stores.
    Serve(ServeArgs),
}

#[derive(Parser, Debug)]
struct ComposeArgs {
    /// Poster image path or URL.
    #[arg(long)]
    poster: String,

    /// Template JSON (`name`, `scene_ref`, `scene_width`, `scene_height`, `corners`, `blend_mode`).
    #[arg(long)]
    template: PathBuf,

    /// Color grade preset.
    #[arg(long, default_value = "none")]
    grade: String,

    #[arg(long, value_enum, default_value_t = FillChoice::Fill)]
    fill: FillChoice,

    /// Output image path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct ServeArgs {
    #[arg(long, env = "MOCKFORGE_BIND", default_value = "127.0.0.1:8080")]
    bind: SocketAddr,

    /// Registry seed JSON (`templates`, `packs`).
    #[arg(long, env = "MOCKFORGE_SEED")]
    seed: Option<PathBuf>,

    /// Product-to-listing links JSON (`{"<product_id>": {listing_id, published}}`).
    #[arg(long, env = "MOCKFORGE_CATALOG")]
    catalog: Option<PathBuf>,

    /// Directory relative raster paths resolve against.
    #[arg(long, env = "MOCKFORGE_ASSETS", default_value = ".")]
    assets: PathBuf,

    /// Marketplace API base URL. Without it, listings are kept in memory.
    #[arg(long, env = "MOCKFORGE_MARKET_URL")]
    market_url: Option<String>,

    #[arg(long, env = "MOCKFORGE_SHOP_ID", default_value = "")]
    shop_id: String,

    #[arg(long, env = "MOCKFORGE_API_KEY", default_value = "", hide_env_values = true)]
    api_key: String,

    #[arg(long, env = "MOCKFORGE_TOKEN", default_value = "", hide_env_values = true)]
    token: String,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FillChoice {
    Fill,
    Fit,
    Stretch,
}

impl From<FillChoice> for FillMode {
    fn from(choice: FillChoice) -> Self {
        match choice {
            FillChoice::Fill => FillMode::Fill,
            FillChoice::Fit => FillMode::Fit,
            FillChoice::Stretch => FillMode::Stretch,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    let runtime = tokio::runtime::Runtime::new().context("start tokio runtime")?;
    runtime.block_on(async move {
        match cli.cmd {
            Command::Compose(args) => cmd_compose(args, config).await,
            Command::Serve(args) => cmd_serve(args, config).await,
        }
    })
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> anyhow::Result<T> {
    let f = File::open(path).with_context(|| format!("open {what} '{}'", path.display()))?;
    serde_json::from_reader(BufReader::new(f)).with_context(|| format!("parse {what} JSON"))
}

async fn cmd_compose(args: ComposeArgs, config: EngineConfig) -> anyhow::Result<()> {
    let spec: TemplateSpec = read_json(&args.template, "template")?;
    let template = Template {
        id: TemplateId(0),
        geometry: spec.validate()?,
        active: true,
        rank: 0,
    };
    let grade = ColorGrade::require(&args.grade)?;

    let root = args.template.parent().unwrap_or_else(|| Path::new("."));
    let fetcher = Arc::new(HttpFetcher::new(config.fetch_timeout(), root));
    let compositor = Compositor::new(fetcher, config.compose_settings());

    let poster = compositor.load_poster(&args.poster).await?;
    let bytes = match compositor
        .compose(poster, &template, args.fill.into(), &grade)
        .await?
    {
        ComposeOutcome::Composed(bytes) => bytes,
        ComposeOutcome::Skipped(reason) => anyhow::bail!("template skipped: {reason}"),
    };

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(&args.out, &bytes)
        .with_context(|| format!("write mockup '{}'", args.out.display()))?;
    tracing::info!(out = %args.out.display(), bytes = bytes.len(), "mockup written");
    Ok(())
}

async fn cmd_serve(args: ServeArgs, config: EngineConfig) -> anyhow::Result<()> {
    let registry = match &args.seed {
        Some(path) => Registry::from_seed(read_json::<RegistrySeed>(path, "registry seed")?)?,
        None => Registry::new(),
    };

    let listings: Arc<dyn ListingService> = match &args.market_url {
        Some(url) => Arc::new(HttpListingService::new(
            url.clone(),
            args.shop_id.clone(),
            args.api_key.clone(),
            config.marketplace_timeout(),
        )),
        None => {
            tracing::warn!("no marketplace url configured, listings stay in memory");
            Arc::new(InMemoryListingService::new())
        }
    };

    let token = match (&args.market_url, args.token.is_empty()) {
        (None, true) => "local".to_string(),
        _ => args.token.clone(),
    };

    let catalog = InMemoryCatalog::new();
    if let Some(path) = &args.catalog {
        let links: HashMap<ProductId, LinkedListing> = read_json(path, "catalog")?;
        for (product_id, listing) in links {
            catalog.link(product_id, listing);
        }
    }

    let fetcher = Arc::new(HttpFetcher::new(config.fetch_timeout(), &args.assets));
    let workflow = Arc::new(ApprovalWorkflow::new(WorkflowDeps {
        registry: Arc::new(registry),
        compositor: Arc::new(Compositor::new(fetcher, config.compose_settings())),
        mockups: Arc::new(InMemoryMockupStore::new()),
        artworks: Arc::new(InMemoryArtworkStore::new()),
        catalog: Arc::new(catalog),
        auth: Arc::new(StaticToken(token)),
        listings,
        sync: config.sync_options(),
    }));
    let jobs = JobRunner::new(Arc::clone(&workflow), Arc::new(JobRegistry::new()));
    let app = mockforge::server::router(mockforge::server::AppState::new(workflow, jobs));

    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("bind {}", args.bind))?;
    tracing::info!(addr = %args.bind, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("serve")?;
    Ok(())
}
