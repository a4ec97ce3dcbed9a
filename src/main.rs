// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::{Context, Result};
use axum::{http::StatusCode, routing::get, Router};
use clap::Parser;
use dnsman::{
    config::{ControllerKind, ControllerManagerArgs},
    constants::{METRICS_SERVER_BIND_ADDRESS, METRICS_SERVER_PATH, TOKIO_WORKER_THREADS},
    controller::{kube_reconciler, run_dnsannotation_controller, run_source_controller, Clusters},
    crd::DNSEntry,
    metrics::gather_metrics,
    reconcilers::{
        dnsentry::DNSEntryActuator, ingress::IngressActuator, service::ServiceActuator,
        source::SourceActuator,
    },
    state::AnnotationState,
    store::StoredObject,
};
use k8s_openapi::api::core::v1::Service;
use k8s_openapi::api::networking::v1::Ingress;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

fn main() -> Result<()> {
    let args = ControllerManagerArgs::parse();
    args.validate()?;

    // Build Tokio runtime with custom thread names
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(TOKIO_WORKER_THREADS)
        .thread_name("dnsman-controller")
        .enable_all()
        .build()?;

    runtime.block_on(async_main(args))
}

/// Initializes logging.
///
/// Respects `RUST_LOG` (default `info`) and `RUST_LOG_FORMAT` (`json` or `text`).
fn init_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }
}

async fn async_main(args: ControllerManagerArgs) -> Result<()> {
    init_logging();

    info!("Starting DNS source controller manager");
    debug!(?args, "Parsed command line");

    debug!("Initializing Kubernetes client");
    let source = Client::try_default().await?;
    let control_plane = control_plane_client(&args, &source).await?;
    let clusters = Clusters {
        source: source.clone(),
        control_plane,
    };
    debug!("Kubernetes clients initialized successfully");

    let state = Arc::new(AnnotationState::with_client(source.clone()));

    info!("Starting all controllers");

    // Controllers should never exit - if one fails, we log it and exit the main process
    tokio::select! {
        result = run_dnsannotation_controller(source, state.clone()) => {
            error!("CRITICAL: DNSAnnotation controller exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("DNSAnnotation controller exited unexpectedly without error")
        }
        result = run_enabled::<Service>(
            &args,
            ControllerKind::Service,
            Arc::new(ServiceActuator),
            &clusters,
            state.clone(),
        ) => {
            error!("CRITICAL: Service source controller exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("Service source controller exited unexpectedly without error")
        }
        result = run_enabled::<Ingress>(
            &args,
            ControllerKind::Ingress,
            Arc::new(IngressActuator),
            &clusters,
            state.clone(),
        ) => {
            error!("CRITICAL: Ingress source controller exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("Ingress source controller exited unexpectedly without error")
        }
        result = run_enabled::<DNSEntry>(
            &args,
            ControllerKind::Dnsentry,
            Arc::new(DNSEntryActuator),
            &clusters,
            state.clone(),
        ) => {
            error!("CRITICAL: DNSEntry source controller exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("DNSEntry source controller exited unexpectedly without error")
        }
        result = run_metrics_server(args.metrics_port) => {
            error!("CRITICAL: Metrics server exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("Metrics server exited unexpectedly without error")
        }
        result = shutdown_signal() => {
            result?;
            info!("Stopping all controllers");
            Ok(())
        }
    }
}

/// Client of the control plane cluster, the source cluster unless a kubeconfig is given.
async fn control_plane_client(args: &ControllerManagerArgs, source: &Client) -> Result<Client> {
    let Some(path) = &args.control_plane_kubeconfig else {
        return Ok(source.clone());
    };
    info!("Using control plane kubeconfig {}", path.display());
    let kubeconfig = Kubeconfig::read_from(path)
        .with_context(|| format!("failed to read kubeconfig {}", path.display()))?;
    let config = kube::Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
        .await
        .with_context(|| format!("invalid kubeconfig {}", path.display()))?;
    Ok(Client::try_from(config)?)
}

/// Runs a source controller, or waits forever if it is disabled.
async fn run_enabled<T: StoredObject>(
    args: &ControllerManagerArgs,
    kind: ControllerKind,
    actuator: Arc<dyn SourceActuator<T>>,
    clusters: &Clusters,
    state: Arc<AnnotationState>,
) -> Result<()> {
    if !args.is_enabled(kind) {
        info!("{} controller is disabled", actuator.controller_name());
        return std::future::pending().await;
    }
    let reconciler = kube_reconciler(
        actuator,
        args.source_controller_config(),
        clusters,
        state,
        Duration::from_secs(args.event_dedup_ttl_secs),
    );
    run_source_controller(clusters.clone(), Arc::new(reconciler)).await
}

async fn metrics_handler() -> Result<String, (StatusCode, String)> {
    gather_metrics().map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

/// Serves the Prometheus metrics.
async fn run_metrics_server(port: u16) -> Result<()> {
    let app = Router::new().route(METRICS_SERVER_PATH, get(metrics_handler));
    let addr = format!("{METRICS_SERVER_BIND_ADDRESS}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind metrics server to {addr}"))?;
    info!("Serving metrics on {}{}", addr, METRICS_SERVER_PATH);
    axum::serve(listener, app).await?;
    Ok(())
}

/// Completes on SIGINT, or on SIGTERM (pod termination) on Unix.
async fn shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                info!("Received SIGINT, initiating graceful shutdown...");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM (pod termination), initiating graceful shutdown...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        info!("Received SIGINT, initiating graceful shutdown...");
    }
    Ok(())
}
