//! FileFactory - Merge selected files and directories into one output
//!
//! Main entry point for the command-line application.
//!
//! # Overview
//!
//! This binary crate is a thin front end over the library. It initializes:
//! - Configuration loading ([`ConfigManager`])
//! - Logging infrastructure (file rotation + optional console output)
//! - The selection ([`FileListModel`]) built from the positional arguments
//! - A tokio runtime that runs the merge on a blocking worker
//! - State management ([`StateManager`]) acting as the merge's progress reporter
//!
//! The application uses a hybrid threading model:
//! - **Blocking worker**: Runs [`MergeEngine::run`] synchronously, start to finish
//! - **Console task**: Subscribes to state changes and prints milestones
//! - **Main task**: Waits for the merge or Ctrl-C, whichever comes first
//!
//! # Execution Flow
//!
//! 1. Load `FileFactory Config.yaml` from the config directory
//! 2. Initialize logging -> `<log dir>/file-factory.<date>`, where a relative
//!    configured log directory sits under the config directory
//! 3. Add every positional path to the selection (missing ones are ignored)
//! 4. Run the merge; Ctrl-C requests cancellation before the next file
//! 5. Print the result and log metrics

use anyhow::{Context, Result, bail};
use camino::Utf8PathBuf;
use clap::Parser;
use file_factory::{
    APP_NAME, ConfigManager, FileListModel, MergeEngine, Metrics, StateChange, StateManager,
    VERSION,
};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};

/// Merge files and directories into one file, each preceded by a metadata header
#[derive(Parser, Debug)]
#[command(name = "file-factory", version, about)]
struct Cli {
    /// Files and directories to merge, in merge order
    #[arg(required = true)]
    paths: Vec<Utf8PathBuf>,

    /// Output file
    #[arg(short, long)]
    output: Utf8PathBuf,

    /// Append to the output if it already has content
    #[arg(short, long, conflicts_with = "no_append")]
    append: bool,

    /// Always create or truncate the output, regardless of configuration
    #[arg(long)]
    no_append: bool,

    /// Directory holding FileFactory Config.yaml
    #[arg(long, default_value = "FileFactory Data")]
    config_dir: Utf8PathBuf,

    /// Log directory (overrides configuration)
    #[arg(long)]
    log_dir: Option<Utf8PathBuf>,

    /// Debug logging, also echoed to stderr
    #[arg(short, long)]
    debug: bool,

    /// Do not print progress
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("合并失败：{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config_manager = ConfigManager::new(&cli.config_dir)?;
    let user_config = config_manager.load_user_config()?;
    let settings = &user_config.merge_settings;

    // A relative Log Directory in the config file is relative to the config directory
    let log_dir = match &cli.log_dir {
        Some(dir) => dir.clone(),
        None => {
            let configured = Utf8PathBuf::from(&settings.log_directory);
            if configured.is_absolute() {
                configured
            } else {
                config_manager.config_dir().join(configured)
            }
        }
    };
    let debug = cli.debug || settings.debug_mode;
    let _log_guard = file_factory::logging::setup_logging(log_dir.as_str(), APP_NAME, debug, debug)?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);
    tracing::info!("Using config from {}", config_manager.config_dir());

    let append = if cli.append {
        true
    } else if cli.no_append {
        false
    } else {
        settings.append_mode
    };

    let mut list = FileListModel::new();
    for path in &cli.paths {
        if !list.add(path.clone()) {
            tracing::warn!("Ignoring missing or duplicate path: {}", path);
            eprintln!("已忽略：{}", path);
        }
    }
    if list.is_empty() {
        bail!("No existing files or directories were selected");
    }
    for (path, kind) in list.entries() {
        tracing::debug!("Selected {:?}: {}", kind, path);
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(2)
        .thread_name("file-factory-worker")
        .build()
        .context("Failed to create tokio runtime")?;

    let state_manager = StateManager::new();
    state_manager.load_from_user_config(&user_config);
    state_manager.begin_merge(&cli.output, append);

    let metrics = Arc::new(Metrics::new());
    let (cancel_tx, cancel_rx) = watch::channel(false);
    let engine = MergeEngine::from_settings(settings)
        .with_metrics(Arc::clone(&metrics))
        .with_cancellation(cancel_rx);

    let snapshot = list.snapshot();
    let output = cli.output.clone();
    let quiet = cli.quiet;

    let result = runtime.block_on(async move {
        let console = tokio::spawn(print_progress(state_manager.subscribe(), quiet));

        let mut reporter = state_manager.clone();
        let mut merge = tokio::task::spawn_blocking(move || {
            engine.run(&snapshot, &output, append, &mut reporter)
        });

        let joined = tokio::select! {
            joined = &mut merge => joined,
            signal = tokio::signal::ctrl_c() => {
                if signal.is_ok() {
                    tracing::warn!("Interrupted - cancelling merge after the current file");
                    let _ = cancel_tx.send(true);
                }
                merge.await
            }
        };

        let result = joined.context("Merge worker panicked")?;
        state_manager.finish_merge(&result);

        if let Err(e) = console.await {
            tracing::warn!("Progress console task failed: {}", e);
        }

        Ok::<_, anyhow::Error>(result)
    });

    runtime.shutdown_timeout(Duration::from_secs(5));
    metrics.log_summary();

    let summary = result??;
    if !quiet {
        println!(
            "合并完成：{} 个文件，{} 行 -> {}",
            summary.files_merged, summary.processed_lines, cli.output
        );
        if summary.metadata_failures > 0 {
            println!("元数据获取失败的文件：{}", summary.metadata_failures);
        }
    }

    tracing::info!("Application shutdown complete");
    Ok(())
}

/// Print each reported milestone until the merge finishes
async fn print_progress(mut rx: broadcast::Receiver<StateChange>, quiet: bool) {
    loop {
        match rx.recv().await {
            Ok(StateChange::MergeStarted { total_lines }) => {
                if !quiet {
                    println!("总行数：{}", total_lines);
                }
            }
            Ok(StateChange::FileProcessed {
                file_name,
                file_lines,
                processed_lines,
                total_lines,
            }) => {
                if !quiet {
                    println!("正在处理：{}", file_name);
                    println!("行数：{}", file_lines);
                    println!("总进度：{:.2}%", percent(processed_lines, total_lines));
                    println!();
                }
            }
            Ok(StateChange::MergeFinished { .. }) => break,
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!("Progress console lagged, {} events dropped", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn percent(processed: u64, total: u64) -> f64 {
    if total == 0 {
        100.0
    } else {
        processed as f64 / total as f64 * 100.0
    }
}
