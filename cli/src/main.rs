//! CLI entrypoint for abra-pool
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use abra_application::{
    BatchRunner, ClientPool, DEFAULT_COUNTRY, NoResultSink, PromptRequest, PromptService,
    RequestRecord, ResultSink, SessionClient,
};
use abra_domain::PromptOutcome;
use abra_infrastructure::{
    ConfigLoader, FileConfig, FileOutputFormat, JsonlResultSink, ReqwestTransport,
    ReqwestTransportFactory, Severity,
};
use abra_presentation::{Cli, Command, ConsoleFormatter, OutputFormat};
use anyhow::{Context, Result, bail};
use clap::Parser;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())?
    };

    if !config.output.color {
        colored::control::set_override(false);
    }

    let format = cli.output.unwrap_or(match config.output.format {
        Some(FileOutputFormat::Text) => OutputFormat::Text,
        Some(FileOutputFormat::Json) | None => OutputFormat::Json,
    });

    if let Command::ShowConfig = cli.command {
        return show_config(&cli, &config);
    }

    check_config(&config)?;
    let sink = result_sink(&config);

    match cli.command {
        Command::Ask {
            prompt,
            proxy,
            markdown,
        } => ask(&config, sink, format, &prompt, proxy, markdown).await,
        Command::Pool {
            prompts,
            pool_size,
            country,
            markdown,
        } => run_pool(&config, sink, format, prompts, pool_size, country, markdown).await,
        Command::Batch {
            prompt,
            total,
            parallel,
            max_retries,
        } => run_batch(&config, sink, format, prompt, total, parallel, max_retries).await,
        Command::ShowConfig => Ok(()),
    }
}

fn check_config(config: &FileConfig) -> Result<()> {
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            Severity::Warning => warn!("Config: {}", issue),
            Severity::Error => error!("Config: {}", issue),
        }
    }
    if FileConfig::has_errors(&issues) {
        bail!("Invalid configuration, see errors above (abra-pool show-config)");
    }
    Ok(())
}

fn result_sink(config: &FileConfig) -> Arc<dyn ResultSink> {
    if !config.output.record_results {
        return Arc::new(NoResultSink);
    }
    match JsonlResultSink::new(&config.output.results_path) {
        Some(sink) => {
            info!("Recording results to {}", sink.path().display());
            Arc::new(sink)
        }
        None => Arc::new(NoResultSink),
    }
}

fn show_config(cli: &Cli, config: &FileConfig) -> Result<()> {
    if cli.no_config {
        println!("Configuration files disabled (--no-config), using built-in defaults");
    } else {
        ConfigLoader::print_config_sources(cli.config.as_ref());
    }
    println!();

    let effective = toml::to_string_pretty(config).context("Failed to render configuration")?;
    println!("{}", effective);

    for issue in config.validate() {
        let label = match issue.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        println!("{}: {}", label, issue);
    }
    Ok(())
}

async fn ask(
    config: &FileConfig,
    sink: Arc<dyn ResultSink>,
    format: OutputFormat,
    prompt: &str,
    proxy: Option<String>,
    markdown: bool,
) -> Result<()> {
    let proxy = proxy.or_else(|| config.client.proxy.clone());
    let transport = ReqwestTransport::new(proxy, config.client.request_timeout())?;
    let client = SessionClient::new(Arc::new(transport), None)
        .with_exhaustion_policy(config.protocol.to_exhaustion_policy());

    let started = Instant::now();
    let result = client.send_prompt(prompt).await;
    if let Err(e) = client.close().await {
        warn!("Failed to close client: {}", e);
    }

    let outcome = match result {
        Ok(result) if markdown => PromptOutcome::from(result),
        Ok(result) => PromptOutcome::from(result.without_markup()),
        Err(e) => PromptOutcome::failure(e.to_string()),
    };
    sink.record(
        RequestRecord::new(prompt, DEFAULT_COUNTRY, &outcome).with_duration(started.elapsed()),
    );

    match format {
        OutputFormat::Json => println!("{}", ConsoleFormatter::format_json(&outcome)),
        OutputFormat::Text => println!("{}", ConsoleFormatter::format_outcome(prompt, &outcome)),
    }

    if let Some(error) = outcome.error() {
        bail!("Prompt failed: {}", error);
    }
    Ok(())
}

async fn run_pool(
    config: &FileConfig,
    sink: Arc<dyn ResultSink>,
    format: OutputFormat,
    prompts: Vec<String>,
    pool_size: Option<usize>,
    country: String,
    markdown: bool,
) -> Result<()> {
    let mut params = config.pool.to_pool_params();
    if let Some(size) = pool_size {
        if size == 0 {
            bail!("--pool-size must be greater than 0");
        }
        params = params.with_size(size);
    }

    let factory = ReqwestTransportFactory::new(
        config.client.proxy.clone(),
        config.client.request_timeout(),
    );
    let pool = Arc::new(ClientPool::with_factory(
        &factory,
        params,
        config.protocol.to_exhaustion_policy(),
    )?);

    let ready = pool.warmup().await?;
    info!("{}/{} clients ready", ready, pool.size());

    let service = PromptService::new(pool.clone()).with_sink(sink);
    let requests = prompts.iter().map(|prompt| {
        let request = PromptRequest::new(prompt.clone())
            .with_country(country.clone())
            .with_markdown(markdown);
        service.handle(request)
    });

    let responses = tokio::select! {
        responses = join_all(requests) => Some(responses),
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, shutting down pool");
            None
        }
    };

    let stats = pool.stats();
    pool.shutdown().await;

    let Some(responses) = responses else {
        bail!("Interrupted");
    };
    let results: Vec<(String, _)> = prompts.into_iter().zip(responses).collect();
    let failed = results.iter().filter(|(_, r)| !r.body.is_success()).count();

    match format {
        OutputFormat::Json => {
            let json: Vec<_> = results
                .iter()
                .map(|(prompt, response)| {
                    serde_json::json!({
                        "prompt": prompt,
                        "status_code": response.status_code,
                        "body": response.body,
                    })
                })
                .collect();
            println!("{}", ConsoleFormatter::format_json(&json));
        }
        OutputFormat::Text => {
            println!("{}", ConsoleFormatter::format_responses(&results));
            println!("{}", ConsoleFormatter::format_pool_stats(&stats));
        }
    }

    if failed > 0 {
        bail!("{}/{} prompts failed", failed, results.len());
    }
    Ok(())
}

async fn run_batch(
    config: &FileConfig,
    sink: Arc<dyn ResultSink>,
    format: OutputFormat,
    prompt: Option<String>,
    total: Option<usize>,
    parallel: Option<usize>,
    max_retries: Option<usize>,
) -> Result<()> {
    let mut params = config.batch.to_batch_params();
    if let Some(total) = total {
        params = params.with_total(total);
    }
    if let Some(parallel) = parallel {
        if parallel == 0 {
            bail!("--parallel must be greater than 0");
        }
        params = params.with_parallel(parallel);
    }
    if let Some(max_retries) = max_retries {
        params = params.with_max_retries(max_retries);
    }
    let prompt = prompt.unwrap_or_else(|| config.batch.prompt.clone());
    let total = params.total;

    let factory = ReqwestTransportFactory::new(
        config.client.proxy.clone(),
        config.client.request_timeout(),
    )
    .with_session_rotation(params.country.clone());

    let runner = BatchRunner::new(Arc::new(factory), params)
        .with_exhaustion_policy(config.protocol.to_exhaustion_policy())
        .with_sink(sink);

    let started = Instant::now();
    let summary = tokio::select! {
        summary = runner.run(&prompt, total) => summary,
        _ = tokio::signal::ctrl_c() => bail!("Interrupted"),
    };

    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "total": summary.total(),
                "ok": summary.ok,
                "failed": summary.failed,
                "success_rate": summary.success_rate(),
                "elapsed_secs": started.elapsed().as_secs_f64(),
            });
            println!("{}", ConsoleFormatter::format_json(&json));
        }
        OutputFormat::Text => {
            println!(
                "{}",
                ConsoleFormatter::format_batch_summary(&summary, started.elapsed())
            );
        }
    }
    Ok(())
}
