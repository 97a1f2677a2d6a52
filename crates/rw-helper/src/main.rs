//! Rewrite Helper
//!
//! URL rewrite helper for forward proxies: reads one request per line on
//! stdin, answers each with a decision line on stdout.

mod dispatcher;
mod logging;
mod protocol;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::io::BufReader;

use rw_compiler::{load_directory, LoadStats};
use rw_core::{MatchDecision, RuleSet};

#[derive(Parser)]
#[command(name = "rw-helper")]
#[command(about = "URL rewrite helper for forward proxies")]
struct Cli {
    /// Directory searched recursively for XML rule documents
    #[arg(long, global = true, default_value = "rules")]
    rule_directory: PathBuf,

    /// Worker threads for request processing (defaults to the CPU count)
    #[arg(long, global = true)]
    max_procs: Option<usize>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer proxy requests on stdin/stdout (default)
    Serve,

    /// Load the rule directory and report what it contains
    Check {
        /// Print stats as JSON
        #[arg(long)]
        json: bool,
    },

    /// Evaluate URLs against the rules and print the outcome
    Rewrite {
        /// URLs to evaluate
        #[arg(required = true)]
        urls: Vec<String>,

        /// Use this host instead of the one in each URL
        #[arg(long)]
        host: Option<String>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init();

    let result = match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => cmd_serve(&cli.rule_directory, cli.max_procs),
        Commands::Check { json } => cmd_check(&cli.rule_directory, json),
        Commands::Rewrite { urls, host, json } => {
            cmd_rewrite(&cli.rule_directory, &urls, host.as_deref(), json)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn load_rules(dir: &Path) -> Result<(RuleSet, LoadStats), String> {
    load_directory(dir).map_err(|e| format!("Failed to load rules: {}", e))
}

fn cmd_serve(dir: &Path, max_procs: Option<usize>) -> Result<(), String> {
    let (ruleset, _) = load_rules(dir)?;
    let ruleset = Arc::new(ruleset);

    let workers = max_procs
        .filter(|&n| n > 0)
        .or_else(|| std::thread::available_parallelism().ok().map(|n| n.get()))
        .unwrap_or(1);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(workers)
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to start tokio runtime: {}", e))?;

    log::info!("serving with {} worker threads", workers);

    let stats = runtime
        .block_on(dispatcher::run(
            ruleset,
            BufReader::new(tokio::io::stdin()),
            tokio::io::stdout(),
        ))
        .map_err(|e| format!("Request processing failed: {}", e))?;

    log::info!(
        "input closed: answered {} requests, ignored {} malformed lines",
        stats.accepted,
        stats.dropped
    );

    Ok(())
}

fn cmd_check(dir: &Path, json: bool) -> Result<(), String> {
    let start = Instant::now();
    let (_, stats) = load_rules(dir)?;
    let elapsed = start.elapsed();

    if json {
        let text = serde_json::to_string_pretty(&stats)
            .map_err(|e| format!("Failed to serialize JSON: {}", e))?;
        println!("{text}");
        return Ok(());
    }

    println!("Rules in '{}' are valid", dir.display());
    println!("  Files:       {}", stats.files);
    println!("  Bundles:     {} ({} disabled)", stats.bundles, stats.disabled);
    println!("  Targets:     {}", stats.targets);
    println!("  Exclusions:  {}", stats.exclusions);
    println!("  Rules:       {}", stats.rules);
    println!("  Time:        {:.1}ms", elapsed.as_secs_f64() * 1000.0);

    Ok(())
}

#[derive(Serialize)]
struct RewriteReport<'a> {
    url: &'a str,
    outcome: &'static str,
    result: Option<String>,
    bundle: Option<String>,
    error: Option<String>,
}

fn cmd_rewrite(dir: &Path, urls: &[String], host: Option<&str>, json: bool) -> Result<(), String> {
    let (ruleset, _) = load_rules(dir)?;

    let reports: Vec<RewriteReport<'_>> = urls
        .iter()
        .map(|url| match ruleset.apply(url, host) {
            Ok(result) if result.decision == MatchDecision::Redirect => RewriteReport {
                url,
                outcome: "redirect",
                result: Some(result.url),
                bundle: result.bundle,
                error: None,
            },
            Ok(_) => RewriteReport {
                url,
                outcome: "unchanged",
                result: None,
                bundle: None,
                error: None,
            },
            Err(e) => RewriteReport {
                url,
                outcome: "error",
                result: None,
                bundle: None,
                error: Some(e.to_string()),
            },
        })
        .collect();

    if json {
        let text = serde_json::to_string_pretty(&reports)
            .map_err(|e| format!("Failed to serialize JSON: {}", e))?;
        println!("{text}");
        return Ok(());
    }

    for report in &reports {
        match report.outcome {
            "redirect" => println!(
                "{} -> {} [{}]",
                report.url,
                report.result.as_deref().unwrap_or_default(),
                report.bundle.as_deref().unwrap_or_default()
            ),
            "error" => println!("{} error: {}", report.url, report.error.as_deref().unwrap_or_default()),
            _ => println!("{} unchanged", report.url),
        }
    }

    Ok(())
}
