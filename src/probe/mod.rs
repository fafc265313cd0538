//! Outbound website connectivity probing
//!
//! Each target gets exactly one GET attempt. Timing stops when the response
//! headers arrive; the body is never read. Failures are captured into the
//! result rather than returned, so one unreachable site cannot fail a run.

use crate::{
    error::{AppError, ErrorContext, Result},
    models::{ConnectivityResult, ServerConfig, WebsiteTarget},
};
use async_trait::async_trait;
use futures::future::join_all;
use reqwest::{redirect::Policy, Client};
use std::{
    collections::BTreeMap,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::{sync::Semaphore, time::timeout};

/// Something that can check whether a URL answers
#[async_trait]
pub trait HttpProbe: Send + Sync {
    /// Probe a single URL; never fails, errors are folded into the result
    async fn probe(&self, url: &str) -> ConnectivityResult;
}

/// Probe backed by a shared reqwest client
#[derive(Debug, Clone)]
pub struct WebsiteProber {
    client: Client,
    timeout: Duration,
}

impl WebsiteProber {
    /// Create a prober with the given per-request timeout
    pub fn new(probe_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .redirect(Policy::limited(crate::defaults::DEFAULT_MAX_REDIRECTS))
            .connect_timeout(probe_timeout)
            .user_agent(format!("{}/{}", crate::PKG_NAME, crate::VERSION))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            timeout: probe_timeout,
        })
    }

    /// Create a prober using the configured timeout
    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        Self::new(config.probe_timeout)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Issue one GET and time it up to the response headers
    pub async fn probe_url(&self, url: &str) -> ConnectivityResult {
        let start = Instant::now();

        match timeout(self.timeout, self.client.get(url).send()).await {
            Ok(Ok(response)) => {
                ConnectivityResult::success(url, start.elapsed(), response.status().as_u16())
            }
            Ok(Err(e)) => ConnectivityResult::failed(url, start.elapsed(), &AppError::from(e)),
            Err(_) => ConnectivityResult::failed(
                url,
                start.elapsed(),
                &AppError::timeout(format!("No response within {:?}", self.timeout)),
            ),
        }
    }
}

#[async_trait]
impl HttpProbe for WebsiteProber {
    async fn probe(&self, url: &str) -> ConnectivityResult {
        self.probe_url(url).await
    }
}

/// Probe every target with at most `max_concurrent` requests in flight.
///
/// Results are keyed by target key, so the outcome does not depend on
/// completion order. Only a panicked or cancelled probe task makes the
/// whole run fail.
pub async fn probe_all<P>(
    prober: Arc<P>,
    targets: &[WebsiteTarget],
    max_concurrent: usize,
) -> Result<BTreeMap<String, ConnectivityResult>>
where
    P: HttpProbe + 'static,
{
    let limiter = Arc::new(Semaphore::new(max_concurrent.max(1)));
    let mut tasks = Vec::with_capacity(targets.len());

    for target in targets {
        let key = target.key.clone();
        let url = target.url.clone();
        let prober = prober.clone();
        let limiter = limiter.clone();

        tasks.push(tokio::spawn(async move {
            let _permit = limiter
                .acquire_owned()
                .await
                .map_err(|e| AppError::internal(format!("Probe limiter closed: {}", e)))?;

            let result = prober.probe(&url).await;
            Ok::<_, AppError>((key, result))
        }));
    }

    let mut results = BTreeMap::new();
    for joined in join_all(tasks).await {
        let (key, result) = joined??;
        results.insert(key, result);
    }

    Ok(results)
}
