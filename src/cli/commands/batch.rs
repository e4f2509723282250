//! `glimpse batch`: fan a file of drafts out through the optimizer.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::adapters::samplers::HeuristicSampler;
use crate::cli::output::{output, truncate, CommandOutput};
use crate::domain::models::{Config, Draft, GlimpseStatus};
use crate::domain::ports::Sampler;
use crate::services::clarifier::ClarifierEngine;
use crate::services::performance::PerformanceOptimizer;

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// JSON file holding an array of drafts
    pub file: PathBuf,

    /// Run the clarifier before sampling
    #[arg(long)]
    pub clarify: bool,

    /// Simulated sampler latency in milliseconds
    #[arg(long, default_value = "0")]
    pub latency_ms: u64,
}

/// One entry of the batch file.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchEntry {
    #[serde(flatten)]
    pub draft: Draft,
    /// Lower runs first; any entry with a priority switches to queued dispatch
    #[serde(default)]
    pub priority: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct BatchItem {
    pub index: usize,
    pub status: GlimpseStatus,
    pub essence: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<String>,
    pub elapsed_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct BatchOutput {
    pub items: Vec<BatchItem>,
    pub prioritized: bool,
    pub cache_hit_rate: f64,
    pub timeouts: u64,
}

impl CommandOutput for BatchOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![format!(
            "{} drafts ({} dispatch)",
            self.items.len(),
            if self.prioritized { "priority" } else { "concurrent" }
        )];
        for item in &self.items {
            lines.push(format!(
                "  [{}] {:<11} {:>6} ms  {}",
                item.index,
                item.status.as_str(),
                item.elapsed_ms,
                truncate(&item.essence, 60)
            ));
            if let Some(ref delta) = item.delta {
                lines.push(format!("        {}", truncate(delta, 72)));
            }
        }
        lines.push(format!(
            "Cache hit rate: {:.0}%  Timeouts: {}",
            self.cache_hit_rate * 100.0,
            self.timeouts
        ));
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub fn parse_entries(raw: &str) -> Result<Vec<BatchEntry>> {
    serde_json::from_str(raw).context("Batch file must be a JSON array of drafts")
}

pub async fn execute(args: BatchArgs, config: &Config, json: bool) -> Result<()> {
    let raw = tokio::fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let entries = parse_entries(&raw)?;

    let mut sampler: Arc<dyn Sampler> = Arc::new(HeuristicSampler::with_latency(
        Duration::from_millis(args.latency_ms),
    ));
    if args.clarify {
        let clarifier = Arc::new(ClarifierEngine::new(&config.clarifier));
        sampler = Arc::new(clarifier.wrap(sampler));
    }

    let optimizer = PerformanceOptimizer::shared(config);
    let prioritized = entries.iter().any(|e| e.priority.is_some());
    let results = if prioritized {
        let items = entries
            .into_iter()
            .map(|e| (e.priority.unwrap_or(i32::MAX), e.draft))
            .collect();
        optimizer.batch_glimpses_prioritized(items, &sampler).await
    } else {
        let drafts: Vec<Draft> = entries.into_iter().map(|e| e.draft).collect();
        optimizer.batch_glimpses(&drafts, &sampler).await
    };

    let stats = optimizer.stats().await;
    let items = results
        .into_iter()
        .enumerate()
        .map(|(index, (result, elapsed))| BatchItem {
            index,
            status: result.status,
            essence: result.essence,
            delta: result.delta,
            elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        })
        .collect();

    output(
        &BatchOutput {
            items,
            prioritized,
            cache_hit_rate: stats.cache.hit_rate,
            timeouts: stats.timeouts,
        },
        json,
    );
    Ok(())
}
