//! `glimpse preview`: one attempt against the heuristic sampler.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use crate::adapters::samplers::HeuristicSampler;
use crate::cli::output::{indent, output, CommandOutput};
use crate::domain::models::{Config, Draft, GlimpseResult};
use crate::services::clarifier::ClarifierEngine;
use crate::services::glimpse_engine::GlimpseEngine;
use crate::services::performance::{OptimizedSampler, PerformanceOptimizer};
use crate::services::privacy_guard::{CommitReceipt, Committable};

#[derive(Args, Debug)]
pub struct PreviewArgs {
    /// Request text
    #[arg(short, long)]
    pub input: String,

    /// Intended outcome
    #[arg(short, long, default_value = "")]
    pub goal: String,

    /// Pipe-delimited constraints
    #[arg(short = 'C', long, default_value = "")]
    pub constraints: String,

    /// Return only the essence, not the sample
    #[arg(long)]
    pub essence_only: bool,

    /// Commit the result once it is aligned
    #[arg(long)]
    pub commit: bool,

    /// Run the clarifier before sampling
    #[arg(long)]
    pub clarify: bool,

    /// Route the sampler through the cache and adaptive timeout
    #[arg(long)]
    pub optimized: bool,

    /// Simulated sampler latency in milliseconds
    #[arg(long, default_value = "0")]
    pub latency_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct PreviewOutput {
    pub result: GlimpseResult,
    pub max_attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<CommitReceipt>,
}

impl CommandOutput for PreviewOutput {
    fn to_human(&self) -> String {
        let result = &self.result;
        let mut lines = vec![format!(
            "Status:   {} (attempt {}/{})",
            result.status, result.attempt, self.max_attempts
        )];
        if !result.essence.is_empty() {
            lines.push(format!("Essence:  {}", result.essence));
        }
        if !result.sample.is_empty() {
            lines.push("Sample:".to_string());
            lines.push(indent(&result.sample, 2));
        }
        if let Some(ref delta) = result.delta {
            lines.push(format!("Delta:    {delta}"));
        }
        if let Some(ref follow_up) = result.follow_up {
            lines.push(format!("Follow-up: {follow_up}"));
        }
        lines.push("History:".to_string());
        for entry in &result.status_history {
            lines.push(format!("  - {entry}"));
        }
        match &self.receipt {
            Some(receipt) if receipt.delivered => {
                lines.push(format!("Committed: {}", receipt.id));
            }
            Some(receipt) => lines.push(format!("Commit {} was not delivered", receipt.id)),
            None => {}
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: PreviewArgs, config: &Config, json: bool) -> Result<()> {
    let draft = Draft::new(args.input, args.goal, args.constraints);

    let mut sampler: Arc<dyn crate::domain::ports::Sampler> = Arc::new(
        HeuristicSampler::with_latency(Duration::from_millis(args.latency_ms)),
    );
    if args.optimized {
        sampler = Arc::new(OptimizedSampler::new(
            sampler,
            PerformanceOptimizer::shared(config),
        ));
    }

    let mut engine = GlimpseEngine::new(sampler, config)
        .context("Failed to build glimpse engine")?
        .with_commit_callback(|item| {
            let kind = match item {
                Committable::Draft(_) => "draft",
                Committable::Result(_) => "result",
            };
            tracing::info!(kind, "committed");
            Ok(())
        });
    if args.clarify || config.clarifier.curiosity || config.clarifier.legacy_ambiguity {
        engine = engine.with_clarifier(Arc::new(ClarifierEngine::new(&config.clarifier)));
    }
    engine.set_essence_only(args.essence_only || config.engine.essence_only);

    let canceller = engine.canceller();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            canceller.cancel();
        }
    });

    let result = engine.glimpse(&draft).await;
    interrupt.abort();
    let result = result.context("Sampler failed")?;

    let receipt = (args.commit && result.is_aligned()).then(|| engine.commit(result.clone()));

    output(
        &PreviewOutput {
            result,
            max_attempts: engine.max_attempts(),
            receipt,
        },
        json,
    );
    Ok(())
}
