mod cli;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::info;

use compass_core::config::load_dotenv;
use compass_core::{counter_target_from_slug, CanonicalPair, Config, CounterRecord};
use compass_eligibility::{
    recommended_answers, DictionaryCache, Eligibility, EligibilityEngine, PairResolver,
    SystemClock, TimeBucketCache,
};
use compass_store::{open_store, RowsOrEmpty};

use crate::cli::{CliArgs, Command};

// ── Output ──────────────────────────────────────────────────────────

#[derive(Serialize)]
struct PageReport<'a> {
    format_id: &'a str,
    time_bucket: &'a str,
    page: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pair: Option<CanonicalPair>,
    eligibility: Eligibility,
    /// Rendered reason, as a page would show it.
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    recommended: Option<Vec<&'a CounterRecord>>,
}

#[derive(Serialize)]
struct ResolveReport<'a> {
    slug: &'a str,
    pair: Option<CanonicalPair>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn print_json(value: &impl Serialize) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("failed to encode report")?;
    println!("{out}");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    load_dotenv();
    let args = CliArgs::parse();
    let config = Config::from_env();
    config.log_summary();

    let store = open_store(&config, args.snapshot.as_deref())
        .await
        .context("failed to open statistics store")?;
    info!(backend = store.backend_name(), "statistics store ready");

    let clock = Arc::new(SystemClock);
    let dictionary = Arc::new(DictionaryCache::new(
        store.clone(),
        clock.clone(),
        config.cache.dictionary_ttl(),
    ));
    let resolver = PairResolver::new(dictionary);
    let engine = EligibilityEngine::new(store.clone());

    let format_id = args.format.clone().unwrap_or_else(|| config.format.format_id.clone());

    // Archetype and resolve never need a time bucket.
    match &args.command {
        Command::Archetype { slug } => {
            let eligibility = engine.check_archetype(slug);
            return print_json(&PageReport {
                format_id: &format_id,
                time_bucket: "",
                page: "archetype",
                pair: None,
                eligibility,
                message: eligibility.reason.to_string(),
                recommended: None,
            });
        }
        Command::Resolve { slug } => {
            let report = match resolver.resolve(slug).await {
                Ok(pair) => ResolveReport { slug, pair: Some(pair), error: None },
                Err(e) => ResolveReport { slug, pair: None, error: Some(e.to_string()) },
            };
            return print_json(&report);
        }
        Command::Core { .. } | Command::Counter { .. } => {}
    }

    let time_bucket = match args.bucket.clone() {
        Some(bucket) => bucket,
        None => {
            TimeBucketCache::new(store.clone(), clock, config.cache.bucket_ttl())
                .latest(&format_id)
                .await
        }
    };

    match &args.command {
        Command::Core { slug } => {
            let page = engine
                .check_core_slug(&resolver, &format_id, &time_bucket, slug)
                .await;
            let eligibility = page.eligibility;
            print_json(&PageReport {
                format_id: &format_id,
                time_bucket: &time_bucket,
                page: "core",
                pair: page.pair,
                eligibility,
                message: eligibility.reason.to_string(),
                recommended: None,
            })
        }
        Command::Counter { target } => {
            let target = counter_target_from_slug(target);
            let eligibility = engine.check_counter(&format_id, &time_bucket, target).await;
            let answers = if eligibility.show_effectiveness {
                store
                    .counters(&format_id, &time_bucket, target)
                    .await
                    .rows_or_empty("counters")
            } else {
                Vec::new()
            };
            print_json(&PageReport {
                format_id: &format_id,
                time_bucket: &time_bucket,
                page: "counter",
                pair: None,
                eligibility,
                message: eligibility.reason.to_string(),
                recommended: eligibility
                    .show_effectiveness
                    .then(|| recommended_answers(&answers)),
            })
        }
        Command::Archetype { .. } | Command::Resolve { .. } => Ok(()),
    }
}
