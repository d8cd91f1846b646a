#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod cli;
mod error_fmt;
mod shoot;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::WrapErr;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};
use crate::shoot::{ShootOpts, ShootSummary, abort_reason_name};

fn main() {
    if let Err(e) = real_main() {
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", format_error_json(&e));
        } else {
            eprintln!("{}", humanize(&e));
        }
        std::process::exit(exit_code_for_error(&e));
    }
}

fn real_main() -> eyre::Result<()> {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    if let Err(e) = color_eyre::install() {
        eprintln!("color-eyre already installed: {e}");
    }

    let text = std::fs::read_to_string(&cli.config)
        .wrap_err_with(|| format!("read config {}", cli.config.display()))?;
    let cfg = autoshoot_config::load_toml(&text).wrap_err("parse config TOML")?;
    cfg.validate().wrap_err("invalid configuration")?;

    let level = cli
        .log_level
        .clone()
        .or_else(|| cfg.logging.level.clone())
        .unwrap_or_else(|| "info".to_string());
    init_tracing(cli.json, &level, &cfg.logging)?;

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let flag = Arc::clone(&shutdown);
        if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed)) {
            tracing::warn!(error = %e, "failed to install Ctrl-C handler");
        }
    }

    match cli.cmd {
        Commands::Shoot {
            max_run_ms,
            max_ticks,
            await_timeout_ms,
            realtime,
            trace_out,
        } => {
            let opts = ShootOpts {
                max_run_ms,
                max_ticks,
                await_timeout_ms,
                realtime,
                trace_out,
            };
            let summary = shoot::run_shoot(&cfg, &opts, &shutdown)?;
            print_summary("shoot", &summary, cli.json, false);
        }
        Commands::Replay { trace } => {
            let summary = shoot::run_replay(&cfg, &trace)?;
            print_summary("replay", &summary, cli.json, true);
        }
        Commands::SelfCheck => {
            shoot::self_check(&cfg)?;
            if cli.json {
                println!("{}", serde_json::json!({ "self_check": "ok" }));
            } else {
                println!("self-check ok");
            }
        }
    }
    Ok(())
}

fn print_summary(what: &str, s: &ShootSummary, json: bool, show_timeline: bool) {
    if json {
        println!("{}", s.to_json());
        return;
    }
    println!(
        "{what} complete: {} shots in {} ticks ({} ms), state {}",
        s.shots, s.ticks, s.elapsed_ms, s.state
    );
    if show_timeline {
        for e in &s.timeline {
            println!("{:>8} ms  {} -> {}", e.t_ms, e.from, e.to);
        }
    }
    if let Some(t) = s.first_feed_tick {
        println!("first feed on tick {t}");
    }
    if let Some(r) = s.reason {
        println!("finished: {} ({r})", abort_reason_name(&r));
    }
}

fn make_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Console logs go to stderr so stdout stays machine-readable; an optional
/// JSON-lines file layer follows `[logging]`.
fn init_tracing(json: bool, level: &str, logging: &autoshoot_config::Logging) -> eyre::Result<()> {
    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    if json {
        layers.push(
            fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_filter(make_filter(level))
                .boxed(),
        );
    } else {
        layers.push(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .with_filter(make_filter(level))
                .boxed(),
        );
    }

    if let Some(file) = logging.file.as_deref() {
        let path = Path::new(file);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let name = path
            .file_name()
            .ok_or_else(|| eyre::eyre!("logging.file has no file name: {file}"))?;
        let appender = match logging.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::daily(dir, name),
            Some("hourly") => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        layers.push(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(make_filter(level))
                .boxed(),
        );
    }

    let _ = tracing_subscriber::registry().with(layers).try_init();
    Ok(())
}
