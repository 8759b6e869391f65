// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod project;
pub mod tree;
pub mod uri;
pub mod watch;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{default_config_path, load_and_validate, load_or_default};
use crate::fs::{FileSystem, RealFileSystem};
use crate::tree::{render_tree, Node};
use crate::uri::Uri;
use crate::watch::{FileChangedHandler, FileSignal, TreeChangedHandler};

pub use crate::project::{ProjectWatcher, WatchOptions};

/// What the watcher callbacks forward to the main loop.
#[derive(Debug)]
enum CliEvent {
    TreeChanged(Arc<Node>),
    File(FileSignal, Uri),
}

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the project watcher over the real filesystem
/// - tree and per-file subscriptions that print to stdout
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = match &args.config {
        Some(path) => load_and_validate(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => load_or_default(default_config_path())?,
    };

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let watcher = ProjectWatcher::new(Arc::clone(&fs), &args.root, cfg.watch_options())?;

    let tree = watcher.build_tree(false).await?;
    print!("{}", render_tree(&tree));

    if args.once {
        debug!("--once: not watching");
        return Ok(());
    }

    let (tx, mut rx) = mpsc::unbounded_channel::<CliEvent>();

    let on_tree: TreeChangedHandler = {
        let tx = tx.clone();
        Arc::new(move |tree| {
            let _ = tx.send(CliEvent::TreeChanged(Arc::clone(tree)));
        })
    };
    watcher.on_tree_changed(on_tree);

    let on_file: FileChangedHandler = {
        let tx = tx.clone();
        Arc::new(move |signal, uri| {
            let _ = tx.send(CliEvent::File(signal, uri.clone()));
        })
    };
    for path in &args.watch_files {
        let uri = watch_file_uri(fs.as_ref(), watcher.root(), path)?;
        watcher
            .watch_file(&uri, Arc::clone(&on_file))
            .with_context(|| format!("watching {}", path.display()))?;
        info!(%uri, "watching file");
    }

    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Some(CliEvent::TreeChanged(tree)) => {
                    println!("--- tree changed ---");
                    print!("{}", render_tree(&tree));
                }
                Some(CliEvent::File(signal, uri)) => println!("{signal}: {uri}"),
                None => break,
            },
            res = tokio::signal::ctrl_c() => {
                if let Err(e) = res {
                    eprintln!("failed to listen for Ctrl+C: {e}");
                }
                break;
            }
        }
    }

    watcher.close();
    Ok(())
}

/// Resolve a `--watch-file` argument against the project root.
fn watch_file_uri(fs: &dyn FileSystem, root: &Path, path: &Path) -> Result<Uri> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    };
    let canonical = fs.canonicalize(&joined)?;
    Ok(Uri::from_path(canonical)?)
}
