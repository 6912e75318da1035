// src/main.rs

mod cli;

use cli::{Cli, Commands};
use rand::Rng;
use search_key_rotation::{config, AppError, KeyInput, KeySelector};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const SIMULATED_STATUSES: [u16; 4] = [429, 500, 403, 432];

fn init_tracing(log_level: &str, json_logs: bool) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let registry = tracing_subscriber::registry().with(env_filter);
    if json_logs {
        registry
            .with(fmt::layer().json().with_current_span(true).with_span_list(true))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse_args();
    init_tracing(&cli.log_level, cli.json_logs);

    let app_config = config::load_config(&cli.config).map_err(|e| {
        error!(config.path = %cli.config.display(), error = ?e, "Failed to load or validate configuration. Exiting.");
        e
    })?;

    match cli.command {
        Commands::Check => {
            for provider in &app_config.providers {
                println!("{}: {} keys", provider.name, provider.key_count());
            }
            println!(
                "{} providers, {} keys, default provider: {}",
                app_config.providers.len(),
                app_config.total_keys(),
                app_config.default_provider.as_deref().unwrap_or("none")
            );
        }
        Commands::Select { failures, inputs } => {
            let selector = KeySelector::from_config(&app_config);
            for (key, status) in &failures {
                selector.report_failure(key, *status);
            }
            let input = match <[String; 1]>::try_from(inputs) {
                Ok([single]) => KeyInput::Delimited(single),
                Err(many) => KeyInput::List(many),
            };
            println!("{}", selector.select(input));
        }
        Commands::Simulate {
            workers,
            rounds,
            failure_rate,
        } => {
            let selector = Arc::new(KeySelector::from_config(&app_config));
            let report = simulate(selector, workers, rounds, failure_rate).await?;
            println!("{report}");
        }
    }

    Ok(())
}

/// Each worker feeds one provider's first key as single-key input, so the
/// selector rotates across that provider's pool.
async fn simulate(
    selector: Arc<KeySelector>,
    workers: usize,
    rounds: usize,
    failure_rate: f64,
) -> Result<String, AppError> {
    let seeds: Vec<String> = selector
        .registry()
        .providers()
        .into_iter()
        .filter_map(|provider| selector.registry().all_keys_of(&provider).into_iter().next())
        .collect();
    if seeds.is_empty() {
        return Err(AppError::config_validation(
            "No provider keys configured to simulate with",
            Some("providers"),
        ));
    }

    info!(workers, rounds, failure_rate, "Starting selection simulation");
    let mut handles = Vec::with_capacity(workers);
    for worker in 0..workers {
        let selector = Arc::clone(&selector);
        let seed = seeds[worker % seeds.len()].clone();
        handles.push(tokio::spawn(async move {
            let mut picks: BTreeMap<String, usize> = BTreeMap::new();
            for _ in 0..rounds {
                let key = selector.select(seed.as_str());
                let failed_status = {
                    let mut rng = rand::thread_rng();
                    rng.gen_bool(failure_rate)
                        .then(|| SIMULATED_STATUSES[rng.gen_range(0..SIMULATED_STATUSES.len())])
                };
                if let Some(status) = failed_status {
                    selector.report_failure(&key, status);
                }
                *picks.entry(key).or_default() += 1;
                tokio::task::yield_now().await;
            }
            picks
        }));
    }

    let mut totals: BTreeMap<String, usize> = BTreeMap::new();
    for handle in handles {
        match handle.await {
            Ok(picks) => {
                for (key, count) in picks {
                    *totals.entry(search_key_rotation::storage::preview_key(&key)).or_default() += count;
                }
            }
            Err(e) => error!(error = %e, "Simulation worker failed"),
        }
    }

    let report = json!({
        "selections": totals,
        "keys": selector.key_statuses(),
    });
    Ok(serde_json::to_string_pretty(&report)?)
}
