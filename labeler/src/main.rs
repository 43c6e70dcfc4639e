//! GKE Node Labeler
//!
//! Keeps Kubernetes node labels in sync with facts held by Google Cloud:
//! - `topology`: runs on every node and labels it with the physical
//!   cluster, rack and host of its VM
//! - `predict`: runs as a scheduled job and labels GPU nodes with whether
//!   they are recommended to run large training workloads

mod cli;
mod config;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Command};
use config::Config;
use labeler_core::metrics::MetricsRegistry;
use labeler_core::predictor::{PredictionLabeler, PredictorConfig};
use labeler_core::topology::TopologyLabeler;
use labeler_gcp::{
    build_http_client, ComputeClient, MetadataClient, MonitoringClient, TokenSource,
};
use labeler_k8s::{K8sClient, NodeOperator};

/// Initialize the tracing/logging subsystem
fn init_logging(log_level: &str, json_format: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init();
    }
}

/// Resolve once SIGINT or SIGTERM is received
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown");
        }
    }
}

/// Run the topology labeler until shutdown, or a single cycle with `once`
async fn run_topology(config: Config, once: bool) -> Result<()> {
    let http = build_http_client(config.gcp.request_timeout)
        .context("Failed to create HTTP client")?;
    let metadata = MetadataClient::new(http, config.gcp.metadata_url.clone());

    let k8s_client = K8sClient::new().await?;
    let nodes = NodeOperator::new(k8s_client, config.dry_run);

    let metrics = Arc::new(MetricsRegistry::new());
    let labeler = TopologyLabeler::new(
        Arc::new(metadata),
        Arc::new(nodes),
        metrics,
        config.topology.interval,
    );

    if once {
        info!("Running single topology cycle (--once mode)");
        labeler
            .run_once()
            .await
            .context("Topology update cycle failed")?;
        return Ok(());
    }

    // Start metrics server if enabled
    if config.metrics.enabled {
        let port = config.metrics.port;
        tokio::spawn(async move {
            if let Err(e) = start_metrics_server(port).await {
                error!(error = %format!("{:#}", e), "Metrics server failed");
            }
        });
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    labeler.run(shutdown_rx).await?;

    info!("Topology labeler shutdown complete");
    Ok(())
}

/// Run a single prediction labeling pass
async fn run_predict(config: Config, project_id: Option<String>) -> Result<()> {
    let http = build_http_client(config.gcp.request_timeout)
        .context("Failed to create HTTP client")?;
    let metadata = MetadataClient::new(http.clone(), config.gcp.metadata_url.clone());

    let project_id = match project_id.or_else(|| config.predictor.project_id.clone()) {
        Some(project_id) => project_id,
        None => metadata
            .project_id()
            .await
            .context("Project ID is unknown; set --project-id or GOOGLE_CLOUD_PROJECT")?,
    };
    info!(project = %project_id, "Using project");

    let k8s_client = K8sClient::new().await?;
    let nodes = NodeOperator::new(k8s_client, config.dry_run);
    info!("Kubernetes client initialized");

    let tokens = Arc::new(TokenSource::from_env_or(metadata));
    let compute = ComputeClient::new(http.clone(), config.gcp.compute_url.clone(), tokens.clone());
    let monitoring = MonitoringClient::new(http, config.gcp.monitoring_url.clone(), tokens);
    info!("GCP clients initialized");

    let labeler = PredictionLabeler::new(
        Arc::new(nodes),
        Arc::new(compute),
        Arc::new(monitoring),
        PredictorConfig {
            project_id,
            label_selector: config.predictor.label_selector.clone(),
            window: config.predictor.window,
        },
    );

    if labeler.run().await.is_some() {
        info!("Prediction labeling finished");
    }
    Ok(())
}

/// Start the Prometheus metrics HTTP server
async fn start_metrics_server(port: u16) -> Result<()> {
    use std::net::SocketAddr;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!(port = port, "Metrics server listening");

    loop {
        let (mut socket, _) = listener.accept().await?;

        tokio::spawn(async move {
            let mut buf = [0; 1024];
            let _ = socket.read(&mut buf).await;

            let metrics_output = prometheus::TextEncoder::new()
                .encode_to_string(&prometheus::gather())
                .unwrap_or_default();

            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Length: {}\r\n\r\n{}",
                metrics_output.len(),
                metrics_output
            );

            let _ = socket.write_all(response.as_bytes()).await;
        });
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Initialize logging
    init_logging(&cli.log_level, cli.log_json);

    info!(version = env!("CARGO_PKG_VERSION"), "Node labeler starting");

    // Load configuration
    let mut config = if cli.config.exists() {
        Config::from_file(&cli.config)
            .with_context(|| format!("Failed to load config from {:?}", cli.config))?
    } else {
        warn!(path = ?cli.config, "Config file not found, using defaults");
        Config::default()
    };

    // Apply CLI overrides
    if cli.dry_run {
        config.dry_run = true;
    }

    // Validate configuration
    config.validate().context("Invalid configuration")?;

    info!(dry_run = config.dry_run, "Configuration loaded");

    match cli.command {
        Command::Topology { once } => run_topology(config, once).await,
        Command::Predict { project_id } => run_predict(config, project_id).await,
    }
}
