mod cli;
mod config;
mod deps;
mod driver;
mod emitter;
mod error;
mod loader;
mod model;
mod moniker;
mod package_cache;
mod range;
mod resolver;
mod stdlib_names;
mod symbol_table;
#[cfg(test)]
mod tests;
mod vcs;

use std::fs::File;
use std::io::BufWriter;

use structopt::StructOpt;

use cli::Args;
use config::IndexerConfig;
use deps::{DependencyEnumerator, GoModEnumerator};
use driver::{CancelToken, IndexerDriver};
use emitter::StreamEmitter;
use loader::{Loader, TreeSitterLoader};
use moniker::MonikerEngine;
use package_cache::PackageDataCache;
use resolver::{GoModResolver, ModuleResolver};
use symbol_table::SymbolTables;
use vcs::{GitProbe, VcsProbe};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut args: Args = Args::from_args();
    args.canonicalize_paths();
    let project_root = args.project_root.clone().expect("canonicalized above");
    let output_path = args.output.clone().expect("canonicalized above");

    let mut config = IndexerConfig::load(args.config.as_deref())?;
    if let Some(jobs) = args.jobs {
        config.jobs = jobs;
    }
    if let Some(version) = args.language_version.clone() {
        config.language_version = version;
    }

    rayon::ThreadPoolBuilder::new()
        .num_threads(config.worker_count())
        .build_global()
        .unwrap_or_else(|err| tracing::warn!(%err, "global thread pool already initialized"));

    let loader = TreeSitterLoader::new();
    let packages = loader.load(&project_root)?;

    let vcs_info = GitProbe::new().probe(&project_root)?;
    let remote_url = vcs_info.as_ref().and_then(|v| v.remote_url.as_deref());
    let local_module = GoModResolver::new().resolve(&project_root, remote_url)?;
    let local_version = vcs_info.map(|v| v.version).unwrap_or_else(|| "0.0.0-dev".to_string());
    let dependencies = GoModEnumerator::new().dependencies(&project_root)?;

    let monikers = MonikerEngine::new(dependencies, config.stdlib_config(), local_module);

    let file = File::create(&output_path)?;
    let emitter = StreamEmitter::new(BufWriter::new(file));

    let driver = IndexerDriver::new(
        emitter,
        SymbolTables::new(),
        PackageDataCache::new(),
        monikers,
        local_version,
        CancelToken::new(),
    );

    driver.run(&packages, &project_root)?;

    tracing::info!(output = %output_path.display(), packages = packages.len(), "indexing complete");
    Ok(())
}
