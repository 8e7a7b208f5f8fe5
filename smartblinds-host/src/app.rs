use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use futures::future::join_all;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::configs::Settings;
use crate::handles::{CoverState, cover_router};
use crate::services::{BlindCover, CoverRegistry, HttpBlindDevice, spawn_cover};

pub async fn create_app(settings: &Arc<Settings>) -> anyhow::Result<Router> {
    let registry = create_registry(settings).await?;

    Ok(app_router(Arc::new(registry)))
}

/// Starts one worker per configured blind. Each cover is polled once before
/// it is registered.
pub async fn create_registry(settings: &Settings) -> anyhow::Result<CoverRegistry> {
    let mut covers = Vec::with_capacity(settings.blinds.len());
    for blind in &settings.blinds {
        let device = HttpBlindDevice::new(&blind.host, &settings.http)
            .with_context(|| format!("Fail to create device client for {}", blind.host))?;
        covers.push(BlindCover::new(blind.host.clone(), blind.name.clone(), Arc::new(device)));
    }

    let interval = settings.polling.interval();
    let handles = join_all(covers.into_iter().map(|cover| spawn_cover(cover, interval))).await;

    let mut registry = CoverRegistry::new();
    for handle in handles {
        registry.insert(handle);
    }

    if registry.is_empty() {
        tracing::warn!("No blinds configured");
    }

    Ok(registry)
}

pub fn app_router(registry: Arc<CoverRegistry>) -> Router {
    cover_router(CoverState { registry })
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
