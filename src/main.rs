//! # `repo`
//!
//! Fetch repositories into a predictable layout from short locators.
//!
//! ## Usage
//!
//! ```sh
//! repo github/Spoon-Knife
//! repo https://github.com/mizchi/monorepo/tree/main/packages/lib-base ./lib
//! repo manage ./scratch my-new-tool --private
//! ```
//!
//! Destinations are chosen from `REPO_FETCHER_OWNER`, `REPO_FETCHER_OWNER_ROOT`
//! and `REPO_FETCHER_ROOT`, falling back to `~/repo/<owner>/<repo>`.

use anyhow::Result;
use clap::{CommandFactory as _, Parser as _};
use repofetch::cli::Args;
use repofetch::error::RepoError;
use repofetch::process::RealRunner;
use repofetch::system::RealSystem;
use tracing::error;
use tracing_subscriber::{EnvFilter, fmt};

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    fmt()
        .with_target(false)
        .without_time()
        .with_level(args.verbose)
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    if args.wants_usage() {
        Args::command().print_help()?;
        std::process::exit(0);
    }

    let system = RealSystem::new();
    let runner = RealRunner::new().with_progress(!args.verbose);

    match repofetch::run(&args, &system, &runner) {
        Ok(()) => std::process::exit(0),
        Err(err) => {
            error!("[repo] {err:#}");
            std::process::exit(
                err.downcast_ref::<RepoError>()
                    .map_or(1, RepoError::exit_code),
            );
        }
    }
}
