//! cfix - classical metadata fixes from the command line
//!
//! Loads a JSON session (clusters of files with their tags), runs one action
//! over it and writes the session back.

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use cfix_common::config::TomlConfig;
use cfix_tagger::{actions, logging};
use cfix_tagger::models::Session;
use cfix_tagger::registry::ArtistRegistry;
use cfix_tagger::services::FieldReconciler;
use cfix_tagger::text::SimilarityMatcher;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

/// Command-line arguments for cfix
#[derive(Parser, Debug)]
#[command(name = "cfix")]
#[command(about = "Normalize classical music metadata against an artist lookup table")]
#[command(version)]
struct Args {
    /// Configuration file (defaults to CFIX_CONFIG, then the user config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Artist lookup file (overrides registry_path from the config)
    #[arg(short, long, env = "CFIX_REGISTRY")]
    registry: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug)]
struct SessionArgs {
    /// Session document to process
    session: PathBuf,

    /// Process without writing the session back
    #[arg(long)]
    dry_run: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classical fixes on every file, as one selection
    FixFiles(SessionArgs),
    /// Classical fixes cluster by cluster
    FixClusters(SessionArgs),
    /// Combine "Disc N" clusters into a single album
    CombineDiscs(SessionArgs),
    /// Renumber files sequentially by album
    RenumberFiles(SessionArgs),
    /// Renumber all files of all clusters in filename order
    RenumberClusters(SessionArgs),
    /// Add the files' composers to the lookup
    AddComposer(SessionArgs),
    /// Add the files' conductors to the lookup
    AddConductor(SessionArgs),
    /// Add the files' orchestras to the lookup
    AddOrchestra(SessionArgs),
    /// Show the lookup record for a name
    Lookup {
        name: String,
    },
}

#[derive(Debug, Clone, Copy)]
enum SessionAction {
    FixFiles,
    FixClusters,
    CombineDiscs,
    RenumberFiles,
    RenumberClusters,
    AddComposer,
    AddConductor,
    AddOrchestra,
}

impl Command {
    fn session_action(&self) -> Option<(SessionAction, &SessionArgs)> {
        let pair = match self {
            Command::FixFiles(a) => (SessionAction::FixFiles, a),
            Command::FixClusters(a) => (SessionAction::FixClusters, a),
            Command::CombineDiscs(a) => (SessionAction::CombineDiscs, a),
            Command::RenumberFiles(a) => (SessionAction::RenumberFiles, a),
            Command::RenumberClusters(a) => (SessionAction::RenumberClusters, a),
            Command::AddComposer(a) => (SessionAction::AddComposer, a),
            Command::AddConductor(a) => (SessionAction::AddConductor, a),
            Command::AddOrchestra(a) => (SessionAction::AddOrchestra, a),
            Command::Lookup { .. } => return None,
        };
        Some(pair)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_control = logging::init();

    let config = TomlConfig::load_or_default(args.config.as_deref())
        .context("Failed to load configuration")?;
    log_control
        .apply_config_level(&config.logging.level)
        .context("Failed to apply configured log level")?;

    info!(
        "Starting cfix v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let registry_path = args.registry.clone().unwrap_or_else(|| config.registry_path());
    info!("Artist lookup: {}", registry_path.display());
    let registry = ArtistRegistry::open(registry_path)
        .with_matcher(SimilarityMatcher::new(config.reconcile.similarity_threshold));

    match args.command.session_action() {
        Some((action, session_args)) => run_session(action, session_args, &registry, &config),
        None => match &args.command {
            Command::Lookup { name } => print_lookup(&registry, name),
            other => Err(anyhow!("unhandled command {:?}", other)),
        },
    }
}

fn run_session(
    action: SessionAction,
    args: &SessionArgs,
    registry: &ArtistRegistry,
    config: &TomlConfig,
) -> Result<()> {
    let mut session = Session::load(&args.session)
        .with_context(|| format!("Failed to load session {}", args.session.display()))?;

    apply(action, &mut session, registry, config)?;

    let dirty: Vec<&str> = session.dirty_files().map(|t| t.filename.as_str()).collect();
    info!(changed = dirty.len(), total = session.file_count(), "{:?} finished", action);
    for filename in &dirty {
        info!("  changed: {}", filename);
    }

    if args.dry_run {
        warn!("Dry run, session not written");
        return Ok(());
    }
    session
        .save(&args.session)
        .with_context(|| format!("Failed to write session {}", args.session.display()))?;
    Ok(())
}

fn apply(
    action: SessionAction,
    session: &mut Session,
    registry: &ArtistRegistry,
    config: &TomlConfig,
) -> Result<()> {
    match action {
        SessionAction::FixFiles => {
            let reconciler = FieldReconciler::new(registry, &config.reconcile)?;
            let mut files = session.files_mut();
            let report = actions::fix_files(&mut files, &reconciler);
            if report.failed > 0 {
                warn!(failed = report.failed, "Some files could not be fixed");
            }
        }
        SessionAction::FixClusters => {
            let reconciler = FieldReconciler::new(registry, &config.reconcile)?;
            let reports = actions::fix_clusters(&mut session.clusters, &reconciler);
            let failed: usize = reports.iter().map(|r| r.failed).sum();
            if failed > 0 {
                warn!(failed, "Some files could not be fixed");
            }
        }
        SessionAction::CombineDiscs => {
            let report = actions::combine_discs(&mut session.clusters)
                .ok_or_else(|| anyhow!("Clusters were not combined"))?;
            info!(
                album = %report.album,
                discs = report.total_discs,
                tracks = report.tracks_updated,
                "Combined discs"
            );
            if !report.skipped_ordinals.is_empty() {
                warn!(skipped = ?report.skipped_ordinals, "Some discs were not found");
            }
        }
        SessionAction::RenumberFiles => {
            let mut files = session.files_mut();
            actions::renumber_files(&mut files);
        }
        SessionAction::RenumberClusters => {
            actions::renumber_clusters(&mut session.clusters);
        }
        SessionAction::AddComposer => {
            actions::add_composers(session.files(), registry)
                .ok_or_else(|| anyhow!("Artist lookup was not updated"))?;
        }
        SessionAction::AddConductor => {
            actions::add_conductors(session.files(), registry)
                .ok_or_else(|| anyhow!("Artist lookup was not updated"))?;
        }
        SessionAction::AddOrchestra => {
            actions::add_orchestras(session.files(), registry)
                .ok_or_else(|| anyhow!("Artist lookup was not updated"))?;
        }
    }
    Ok(())
}

fn print_lookup(registry: &ArtistRegistry, name: &str) -> Result<()> {
    if !registry.is_available() {
        bail!("No artist lookup loaded from {}", registry.path().display());
    }
    let record = registry.read(|table| table.and_then(|t| t.lookup(name)).cloned())?;
    match record {
        Some(r) => {
            println!("name:       {}", r.name);
            println!("role:       {}", r.role);
            println!("sort:       {}", r.sort_order);
            println!("with dates: {}", r.sort_order_with_dates);
            println!("epoch:      {}", r.epoch);
            Ok(())
        }
        None => bail!("'{}' is not in the artist lookup", name),
    }
}
