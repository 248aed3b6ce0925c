use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use coupon_validator::client::{build_sites_file, merge_sites, DEFAULT_SITES_API_URL};
use coupon_validator::prelude::*;
use coupon_validator::site::{has_placeholder, require};
use coupon_validator::{SitesClient, SitesFile};
use tracing_subscriber::EnvFilter;
#[cfg(feature = "otel")]
use tracing_subscriber::layer::SubscriberExt;
#[cfg(feature = "otel")]
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "coupon-validator")]
#[command(about = "Check whether a coupon code is accepted by a site", long_about = None)]
#[command(version)]
#[command(subcommand_negates_reqs = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Coupon code to validate
    #[arg(long, required = true)]
    coupon: Option<String>,

    /// Site domain, as keyed in the sites file
    #[arg(long, required = true)]
    domain: Option<String>,

    #[command(flatten)]
    options: RunOptions,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate several coupons against one domain, one after another
    Batch {
        /// Site domain, as keyed in the sites file
        #[arg(long)]
        domain: String,

        /// Coupon codes to validate
        #[arg(value_name = "CODE", required = true)]
        coupons: Vec<String>,

        #[command(flatten)]
        options: RunOptions,

        /// Enable verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// List configured domains
    List {
        #[command(flatten)]
        sites: SitesArg,
    },

    /// Validate the sites file without running anything
    Check {
        #[command(flatten)]
        sites: SitesArg,
    },

    /// Fetch site configs from the site registry into the sites file
    Sync {
        #[command(flatten)]
        sites: SitesArg,

        /// Only fetch this store and merge it into the existing file
        #[arg(long)]
        store_id: Option<u64>,

        /// Site registry endpoint
        #[arg(long, env = "COUPON_SITES_API_URL", default_value = DEFAULT_SITES_API_URL)]
        api_url: String,
    },
}

#[derive(Args)]
struct SitesArg {
    /// Path to the sites file (JSON or YAML)
    #[arg(long = "sites", env = "COUPON_SITES_FILE", default_value = "./actions.json")]
    path: PathBuf,
}

#[derive(Args)]
struct RunOptions {
    #[command(flatten)]
    sites: SitesArg,

    /// Inline site config (JSON), used instead of the sites file entry
    #[arg(long)]
    config: Option<String>,

    /// Replace the configured product URL
    #[arg(long = "used-on-product-url")]
    used_on_product_url: Option<String>,

    /// Where result.json and page snapshots are written
    #[arg(long, env = "COUPON_OUTPUT_DIR", default_value = "./output")]
    output_dir: PathBuf,

    /// Persistent browser profile directory
    #[arg(long, env = "COUPON_PROFILE_DIR", default_value = "./pw-user")]
    profile_dir: PathBuf,

    /// Browser engine
    #[arg(long, value_enum, default_value_t = BrowserType::Firefox)]
    browser: BrowserType,

    /// Show the browser window
    #[arg(long)]
    headed: bool,

    /// Upstream proxy as host:port
    #[arg(long, env = "PROXY_SERVER")]
    proxy_server: Option<String>,

    #[arg(long, env = "PROXY_USERNAME")]
    proxy_username: Option<String>,

    #[arg(long, env = "PROXY_PASSWORD", hide_env_values = true)]
    proxy_password: Option<String>,

    /// Proxy scheme for API requests
    #[arg(long, env = "PROXY_PROTOCOL")]
    proxy_protocol: Option<String>,
}

impl RunOptions {
    fn selection(&self, domain: &str) -> SiteSelection {
        SiteSelection {
            domain: domain.to_string(),
            inline_config: self.config.clone(),
            product_url: self.used_on_product_url.clone(),
        }
    }

    fn executor(&self) -> Executor {
        let proxy = ProxyConfig::from_parts(
            self.proxy_server.clone(),
            self.proxy_username.clone(),
            self.proxy_password.clone(),
            self.proxy_protocol.clone(),
        );

        Executor::new()
            .with_launch_options(LaunchOptions {
                browser: self.browser,
                headless: !self.headed,
                profile_dir: self.profile_dir.clone(),
                ..LaunchOptions::default()
            })
            .with_proxy(proxy)
    }
}

#[cfg(feature = "otel")]
fn init_otel_tracing(verbose: bool) {
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry_otlp::WithExportConfig;
    use opentelemetry_sdk::runtime::Tokio;
    use opentelemetry_sdk::trace::TracerProvider;

    let filter = if verbose {
        "coupon_validator=debug"
    } else {
        "coupon_validator=info"
    };

    let otlp_endpoint = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
        .unwrap_or_else(|_| "http://localhost:4317".to_string());

    let exporter = match opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(&otlp_endpoint)
        .build()
    {
        Ok(exporter) => exporter,
        Err(e) => {
            eprintln!("Failed to create OTLP exporter: {}", e);
            init_tracing(verbose);
            return;
        }
    };

    let provider = TracerProvider::builder()
        .with_batch_exporter(exporter, Tokio)
        .build();

    let tracer = provider.tracer("coupon-validator");
    let otel_layer = tracing_opentelemetry::layer().with_tracer(tracer);

    tracing_subscriber::registry()
        .with(EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(otel_layer)
        .init();

    opentelemetry::global::set_tracer_provider(provider);
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        "coupon_validator=debug"
    } else {
        "coupon_validator=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let verbose = match &cli.command {
        Some(Commands::Batch { verbose, .. }) => *verbose || cli.verbose,
        _ => cli.verbose,
    };

    #[cfg(feature = "otel")]
    init_otel_tracing(verbose);

    #[cfg(not(feature = "otel"))]
    init_tracing(verbose);

    let result = run(cli).await;

    #[cfg(feature = "otel")]
    opentelemetry::global::shutdown_tracer_provider();

    match result {
        Ok(success) => {
            if success {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            }
        }
        Err(e) => {
            eprintln!("❌ {:#}", e);
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    match cli.command {
        Some(Commands::Batch {
            domain,
            coupons,
            options,
            ..
        }) => run_batch(&domain, &coupons, &options).await,
        Some(Commands::List { sites }) => list_sites(&sites.path),
        Some(Commands::Check { sites }) => check_sites(&sites.path),
        Some(Commands::Sync {
            sites,
            store_id,
            api_url,
        }) => sync_sites(&sites.path, store_id, &api_url).await,
        None => {
            let coupon = cli.coupon.unwrap_or_default();
            let domain = cli.domain.unwrap_or_default();
            run_single(&coupon, &domain, &cli.options).await
        }
    }
}

async fn run_single(coupon: &str, domain: &str, options: &RunOptions) -> anyhow::Result<bool> {
    require("coupon", coupon)?;
    let site = SitesLoader::resolve(&options.sites.path, &options.selection(domain))?;

    let output = ArtifactWriter::new(&options.output_dir);
    let result = options.executor().run(&site, coupon, &output).await?;

    let status = if result.coupon_is_valid { "✓" } else { "✗" };
    println!("{} {} on {}", status, coupon, domain);
    println!("couponIsValid: {}", result.coupon_is_valid);
    println!("Result: {}", output.result_path().display());

    Ok(result.coupon_is_valid)
}

async fn run_batch(domain: &str, coupons: &[String], options: &RunOptions) -> anyhow::Result<bool> {
    for coupon in coupons {
        require("coupon", coupon)?;
    }
    let site = SitesLoader::resolve(&options.sites.path, &options.selection(domain))?;

    println!("Validating {} coupons on {}\n", coupons.len(), domain);

    let result = BatchRunner::new(options.executor())
        .run(&site, coupons, &options.output_dir)
        .await?;

    for entry in &result.entries {
        let status = if entry.coupon_is_valid { "✓" } else { "✗" };
        println!("  {} {} ({})", status, entry.coupon, entry.output_dir.display());
    }

    println!(
        "\n{}/{} coupons valid",
        result.valid_count(),
        result.entries.len()
    );

    Ok(result.any_valid())
}

fn list_sites(path: &Path) -> anyhow::Result<bool> {
    let sites = SitesLoader::load_file(path)?;

    if sites.sites.is_empty() {
        println!("No sites found in: {}", path.display());
        return Ok(true);
    }

    println!("Sites in {}:\n", path.display());
    for domain in sites.sites.keys() {
        match SitesLoader::lookup(&sites, domain) {
            Ok(site) if site.kind == SiteKind::Api => println!("  {} (api)", domain),
            Ok(site) => println!("  {} (session, {} actions)", domain, site.actions.len()),
            Err(_) => println!("  {} (invalid)", domain),
        }
    }

    Ok(true)
}

fn check_sites(path: &Path) -> anyhow::Result<bool> {
    let sites = SitesLoader::load_file(path)?;
    let typed = SitesLoader::check(&sites)?;

    for (domain, site) in &typed {
        if site.kind == SiteKind::Api && !has_placeholder(&site.params) {
            println!("  ! {}: params contain no {{{{COUPON}}}} placeholder", domain);
        }
    }

    println!("✓ {} is valid ({} sites)", path.display(), sites.sites.len());
    Ok(true)
}

async fn sync_sites(path: &Path, store_id: Option<u64>, api_url: &str) -> anyhow::Result<bool> {
    let client = SitesClient::new(api_url);

    let (sites, written) = match store_id {
        Some(id) => {
            println!("Fetching store {} from {}", id, api_url);
            let remote = client
                .fetch_store(id)
                .await?
                .ok_or_else(|| anyhow::anyhow!("No site found for store ID: {}", id))?;

            let mut sites = if path.exists() {
                SitesLoader::load_file(path)?
            } else {
                build_sites_file(&[])
            };
            let written = merge_sites(&mut sites, std::slice::from_ref(&remote));
            if written.is_empty() {
                anyhow::bail!("Store {} has no store domain", id);
            }
            (sites, written)
        }
        None => {
            println!("Fetching sites from {}", api_url);
            let remote = client.fetch_all().await?;
            let sites = build_sites_file(&remote);
            if sites.sites.is_empty() {
                anyhow::bail!("No sites returned by {}", api_url);
            }
            let written: Vec<String> = sites.sites.keys().cloned().collect();
            (sites, written)
        }
    };

    SitesLoader::save_file(path, &sites)?;

    for domain in &written {
        println!("  - {}", domain);
        warn_if_unusable(&sites, domain);
    }
    println!("✓ Wrote {} sites to {}", written.len(), path.display());

    Ok(true)
}

/// Synced entries are stored as-is; flag the ones a run would reject
fn warn_if_unusable(sites: &SitesFile, domain: &str) {
    let problem = match SitesLoader::lookup(sites, domain) {
        Ok(site) => site.validate().err(),
        Err(e) => Some(e.to_string()),
    };
    if let Some(reason) = problem {
        println!("  ! {}: {}", domain, reason);
    }
}
