// # zonecached - Zone Cache Daemon
//
// ⚠️ ARCHITECTURAL CONSTRAINTS ⚠️
//
// CRITICAL RULES:
// - This is a THIN integration layer ONLY
// - DO NOT add reconciliation logic or HTTP handling here
// - Reconciliation lives in zonecache-core, routes in zonecache-api
// - Configuration is via environment variables ONLY
//
// The zonecached daemon is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Registering providers and building the engine
// 4. Serving the HTTP API until SIGTERM/SIGINT
//
// ## Configuration
//
// ### Listener
// - `ZONECACHE_LISTEN_ADDR`: Socket address to bind (default `0.0.0.0:8080`)
// - `PORT`: Overrides the port of the listen address
//
// ### Upstream Provider
// - `ZONECACHE_PROVIDER`: Provider type (ns1, memory; default ns1)
// - `NS1_API_KEY`: NS1 API key (required for ns1)
// - `NS1_ENDPOINT`: NS1 API base URL (default `https://api.nsone.net/v1`)
// - `ZONECACHE_HTTP_TIMEOUT_SECS`: Per-request upstream timeout (default 10)
//
// ### Zone Cache
// - `ZONECACHE_CACHE_TYPE`: Cache type (file, memory; default file)
// - `ZONECACHE_CACHE_PATH`: Path to the cache file (default `./zones.json`)
//
// ### Logging
// - `ZONECACHE_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ## Example
//
// ```bash
// export NS1_API_KEY=your_key
// export ZONECACHE_CACHE_PATH=/var/lib/zonecache/zones.json
// export PORT=8080
//
// zonecached
// ```

use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use zonecache_core::config::{DEFAULT_CACHE_PATH, DEFAULT_LISTEN_ADDR, DEFAULT_NS1_ENDPOINT};
use zonecache_core::{
    CacheConfig, EngineConfig, ProviderConfig, ProviderRegistry, ServiceConfig, SyncEvent,
    ZoneEngine,
};

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// How long to wait for the event log to drain after the server stopped
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum ZonecacheExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<ZonecacheExitCode> for ExitCode {
    fn from(code: ZonecacheExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
#[derive(Debug)]
struct Config {
    listen_addr: SocketAddr,
    provider_type: String,
    ns1_api_key: Option<String>,
    ns1_endpoint: String,
    http_timeout_secs: u64,
    cache_type: String,
    cache_path: String,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through a variable lookup
    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let raw_addr =
            var("ZONECACHE_LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let mut listen_addr: SocketAddr = raw_addr
            .parse()
            .with_context(|| format!("ZONECACHE_LISTEN_ADDR '{}' is not a socket address", raw_addr))?;

        if let Some(port) = var("PORT") {
            let port: u16 = port
                .parse()
                .with_context(|| format!("PORT '{}' is not a valid port", port))?;
            listen_addr.set_port(port);
        }

        let http_timeout_secs = match var("ZONECACHE_HTTP_TIMEOUT_SECS") {
            Some(raw) => raw.parse().with_context(|| {
                format!("ZONECACHE_HTTP_TIMEOUT_SECS '{}' is not a number", raw)
            })?,
            None => 10,
        };

        Ok(Self {
            listen_addr,
            provider_type: var("ZONECACHE_PROVIDER").unwrap_or_else(|| "ns1".to_string()),
            ns1_api_key: var("NS1_API_KEY"),
            ns1_endpoint: var("NS1_ENDPOINT").unwrap_or_else(|| DEFAULT_NS1_ENDPOINT.to_string()),
            http_timeout_secs,
            cache_type: var("ZONECACHE_CACHE_TYPE").unwrap_or_else(|| "file".to_string()),
            cache_path: var("ZONECACHE_CACHE_PATH")
                .unwrap_or_else(|| DEFAULT_CACHE_PATH.to_string()),
            log_level: var("ZONECACHE_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the daemon-level settings
    ///
    /// Provider and cache settings are validated again by `ServiceConfig`.
    fn validate(&self) -> Result<()> {
        match self.provider_type.as_str() {
            "ns1" => {
                if !cfg!(feature = "ns1") {
                    anyhow::bail!(
                        "ZONECACHE_PROVIDER 'ns1' requires zonecached built with the ns1 feature"
                    );
                }
                if self.ns1_api_key.as_deref().is_none_or(str::is_empty) {
                    anyhow::bail!(
                        "NS1_API_KEY is required when ZONECACHE_PROVIDER=ns1. \
                        Set it via: export NS1_API_KEY=your_key"
                    );
                }
            }
            "memory" => {}
            other => anyhow::bail!(
                "ZONECACHE_PROVIDER '{}' is not supported. Supported providers: ns1, memory",
                other
            ),
        }

        match self.cache_type.as_str() {
            "file" | "memory" => {}
            other => anyhow::bail!(
                "ZONECACHE_CACHE_TYPE '{}' is not supported. Supported types: file, memory",
                other
            ),
        }

        if self.http_timeout_secs == 0 || self.http_timeout_secs > 300 {
            anyhow::bail!(
                "ZONECACHE_HTTP_TIMEOUT_SECS must be between 1 and 300 seconds. Got: {}",
                self.http_timeout_secs
            );
        }

        if self.log_level().is_none() {
            anyhow::bail!(
                "ZONECACHE_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            );
        }

        Ok(())
    }

    fn log_level(&self) -> Option<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Some(Level::TRACE),
            "debug" => Some(Level::DEBUG),
            "info" => Some(Level::INFO),
            "warn" => Some(Level::WARN),
            "error" => Some(Level::ERROR),
            _ => None,
        }
    }

    /// Build the core service configuration
    fn service_config(&self) -> Result<ServiceConfig> {
        let provider = match self.provider_type.as_str() {
            "memory" => ProviderConfig::Memory,
            _ => ProviderConfig::Ns1 {
                api_key: self.ns1_api_key.clone().unwrap_or_default(),
                endpoint: self.ns1_endpoint.clone(),
                timeout_secs: self.http_timeout_secs,
            },
        };
        let cache = match self.cache_type.as_str() {
            "memory" => CacheConfig::Memory,
            _ => CacheConfig::File {
                path: self.cache_path.clone(),
            },
        };

        let config = ServiceConfig {
            listen_addr: self.listen_addr,
            provider,
            cache,
            engine: EngineConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return ZonecacheExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return ZonecacheExitCode::ConfigError.into();
    }

    let service_config = match config.service_config() {
        Ok(service_config) => service_config,
        Err(e) => {
            eprintln!("Configuration validation error: {}", e);
            return ZonecacheExitCode::ConfigError.into();
        }
    };

    // Initialize tracing
    let log_level = config.log_level().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return ZonecacheExitCode::ConfigError.into();
    }

    info!("Starting zonecached daemon");
    info!(
        "Provider: {}, cache: {}",
        service_config.provider.type_name(),
        service_config.cache.type_name()
    );

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return ZonecacheExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(service_config).await {
            error!("Daemon error: {:#}", e);
            ZonecacheExitCode::RuntimeError
        } else {
            ZonecacheExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run the daemon
async fn run_daemon(config: ServiceConfig) -> Result<()> {
    let registry = ProviderRegistry::with_builtins();

    #[cfg(feature = "ns1")]
    {
        info!("Registering NS1 provider");
        zonecache_provider_ns1::register(&registry);
    }

    let upstream = registry
        .create_provider(&config.provider)
        .context("Failed to create upstream provider")?;
    let store = registry
        .create_store(&config.cache)
        .await
        .context("Failed to open zone cache")?;

    let (engine, mut events) = ZoneEngine::new(upstream, store, &config.engine)?;
    let engine = Arc::new(engine);

    let event_log = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            log_event(&event);
        }
    });

    let shutdown = shutdown_signal()?;
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;
    info!("Listening on {}", config.listen_addr);

    axum::serve(listener, zonecache_api::router(engine.clone()))
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server failed")?;

    info!("Shutting down daemon");
    engine.flush().await.context("Failed to flush zone cache")?;

    // Dropping the last engine handle closes the event channel
    drop(engine);
    if tokio::time::timeout(DRAIN_TIMEOUT, event_log).await.is_err() {
        warn!("Event log did not drain within {:?}", DRAIN_TIMEOUT);
    }

    Ok(())
}

fn log_event(event: &SyncEvent) {
    match event {
        SyncEvent::ZoneCreated { zone, id } => info!("event: zone {} created (id: {})", zone, id),
        SyncEvent::ZoneUpdated { zone } => info!("event: zone {} updated", zone),
        SyncEvent::ZoneDeleted { zone } => info!("event: zone {} deleted", zone),
        SyncEvent::ZoneSynced { zone, records } => {
            debug!("event: zone {} synced ({} records)", zone, records)
        }
        SyncEvent::RecordCreated { zone, record } => {
            info!("event: record {} created in {}", record, zone)
        }
        SyncEvent::UpstreamRejected {
            operation,
            zone,
            status,
        } => warn!("event: {} for {} rejected upstream ({})", operation, zone, status),
        SyncEvent::CacheDiverged {
            operation,
            zone,
            reason,
        } => error!(
            "event: cache for {} diverged from upstream after {}: {}",
            zone, operation, reason
        ),
    }
}

/// Resolve once SIGTERM or SIGINT arrives
///
/// Handlers are installed up front so a failure to install them is a
/// startup error rather than a server that cannot be stopped.
#[cfg(unix)]
fn shutdown_signal() -> Result<impl Future<Output = ()> + Send + 'static> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(async move {
        let name = tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        };
        info!("Received shutdown signal: {}", name);
    })
}

/// Resolve once CTRL-C arrives
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
fn shutdown_signal() -> Result<impl Future<Output = ()> + Send + 'static> {
    Ok(async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received shutdown signal: SIGINT"),
            Err(e) => error!("Failed to wait for CTRL-C: {}", e),
        }
    })
}
