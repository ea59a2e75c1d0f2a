// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod registry;
pub mod snapshot;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::fs::{FileSystem, RealFileSystem};
use crate::registry::{spawn_event_loop, FileWatcherRegistry, ReportingHandler};
use crate::snapshot::{snapshot_directory, FileSystemLocationSnapshot};
use crate::watch::{NativeEvent, NotifyBackend};

type CliRegistry = FileWatcherRegistry<NotifyBackend, ReportingHandler>;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the `notify` backend and the registry event loop
/// - initial scans of every root and keep location
/// - one `build_finished` + statistics report per work cycle
/// - re-scans after lost state
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;

    let fs = RealFileSystem;
    let base = config_root_dir(&config_path);
    let roots = resolve_paths(&fs, cfg.resolved_roots(&base));
    let keep = resolve_paths(&fs, cfg.resolved_keep(&base));

    if args.dry_run {
        print_dry_run(&cfg, &roots, &keep);
        return Ok(());
    }

    // Native events: notify threads -> event loop task.
    let (event_tx, event_rx) = mpsc::unbounded_channel::<NativeEvent>();
    // Lost-state notifications: handler -> this loop.
    let (rescan_tx, mut rescan_rx) = mpsc::unbounded_channel::<()>();

    let registry: CliRegistry = FileWatcherRegistry::new(
        NotifyBackend::new(event_tx),
        ReportingHandler::new(rescan_tx),
        keep.clone(),
    );
    let event_loop = spawn_event_loop(registry.clone(), event_rx);

    // Watch first, then scan, so nothing changes unobserved in between.
    for root in &roots {
        registry
            .register_watchable_hierarchy(root)
            .with_context(|| {
                format!("cannot watch {:?}; file watching is unavailable for this run", root)
            })?;
    }
    scan_into(&registry, &fs, &roots, ScanMode::Initial)?;
    scan_into(&registry, &fs, &keep, ScanMode::Initial)?;
    info!(
        roots = roots.len(),
        keep = keep.len(),
        entries = registry.snapshot().len(),
        "initial scan complete"
    );

    let mut cycle = tokio::time::interval(cfg.cycle());
    // The first tick completes immediately.
    cycle.tick().await;

    loop {
        tokio::select! {
            _ = cycle.tick() => {
                end_cycle(&registry, cfg.max_hierarchies())?;
            }
            Some(()) = rescan_rx.recv() => {
                // Collapse a burst of lost-state notifications into one scan.
                while rescan_rx.try_recv().is_ok() {}
                scan_into(&registry, &fs, &roots, ScanMode::Replace)?;
            }
            res = tokio::signal::ctrl_c() => {
                res.context("failed to listen for Ctrl+C")?;
                info!("Ctrl-C received; shutting down");
                break;
            }
        }
    }

    let closed = registry.close();
    event_loop.abort();
    closed?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanMode {
    /// Nothing is known about the paths yet.
    Initial,
    /// Replace whatever is known; a recreated root also gets a fresh watch.
    Replace,
}

/// Snapshot each of `paths` from disk and merge the result into the registry.
fn scan_into(
    registry: &CliRegistry,
    fs: &dyn FileSystem,
    paths: &[PathBuf],
    mode: ScanMode,
) -> Result<()> {
    for path in paths {
        let entries = snapshot_directory(fs, path)?;
        let removed = match mode {
            ScanMode::Initial => Vec::new(),
            ScanMode::Replace => vec![FileSystemLocationSnapshot::directory(path)],
        };
        registry.virtual_file_system_contents_changed(&removed, &entries)?;
        debug!(?path, entries = entries.len(), "re-scanned hierarchy");
    }
    Ok(())
}

fn end_cycle(registry: &CliRegistry, max_hierarchies: usize) -> Result<()> {
    let kept = registry.build_finished(max_hierarchies)?;
    let stats = registry.get_and_reset_statistics()?;

    info!(
        events = stats.number_of_received_events,
        watched = stats.number_of_watched_hierarchies,
        unknown_events = stats.unknown_event_encountered,
        entries = kept.len(),
        "work cycle finished"
    );
    if let Some(err) = stats.error_while_receiving_file_changes {
        warn!(error = %err, "problems while receiving file changes this cycle");
    }
    Ok(())
}

/// Figure out the directory relative config paths are resolved against.
///
/// - If the config path has a non-empty parent (e.g. "configs/Vfswatch.toml"),
///   we use that directory.
/// - If it's just a bare filename like "Vfswatch.toml" (parent = ""),
///   we fall back to the current working directory "."
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// Canonicalize so event paths (which the OS reports canonically) line up
/// with registered roots. Paths that don't exist yet are kept as given.
fn resolve_paths(fs: &dyn FileSystem, paths: Vec<PathBuf>) -> Vec<PathBuf> {
    paths
        .into_iter()
        .map(|p| match fs.canonicalize(&p) {
            Ok(canon) => canon,
            Err(err) => {
                warn!(path = ?p, error = %err, "could not canonicalize path; using it as given");
                p
            }
        })
        .collect()
}

/// Simple dry-run output: print the resolved configuration.
fn print_dry_run(cfg: &ConfigFile, roots: &[PathBuf], keep: &[PathBuf]) {
    println!("vfswatch dry-run");
    println!("  config.max_hierarchies = {}", cfg.max_hierarchies());
    println!("  config.cycle = {:?}", cfg.cycle());
    println!();

    println!("roots ({}):", roots.len());
    for root in roots {
        println!("  - {}", root.display());
    }
    if !keep.is_empty() {
        println!("keep ({}):", keep.len());
        for path in keep {
            println!("  - {}", path.display());
        }
    }

    debug!("dry-run complete (nothing watched)");
}
