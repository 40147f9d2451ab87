//! `repofetch` - clone, sync, or sparse-checkout repositories from shorthand locators
//!
//! A locator such as `owner/repo`, `https://github.com/owner/repo/tree/main/path`
//! or `git@github.com:owner/repo.git` is resolved to a local destination using
//! the `REPO_FETCHER_*` environment variables and fetched with `git`. The
//! `manage` subcommand adopts an existing local directory under the self-owner
//! root and registers its GitHub remote.

pub mod cli;
pub mod config;
pub mod error;
pub mod git;
pub mod operations;
pub mod process;
pub mod system;
pub mod utils;

use anyhow::Result;
use cli::{Args, Command};
use config::Settings;
use git::RepositoryReference;
use operations::{FetchOperation, ManageOperation};
use process::CommandRunner;
use system::System;
use tracing::debug;

/// Main entry point for the repofetch library
///
/// # Errors
///
/// Returns an error if the locator is invalid, configuration is missing, or
/// any filesystem or subprocess step fails
pub fn run(args: &Args, system: &dyn System, runner: &dyn CommandRunner) -> Result<()> {
    let settings = Settings::from_system(system, args.root.as_deref());

    if let Some(command) = &args.command {
        let Command::Manage { dir, name, .. } = command;
        let outcome = ManageOperation::new(
            dir,
            name.clone(),
            command.visibility(),
            &settings,
            system,
            runner,
        )?
        .execute()?;
        debug!("Managed: {outcome:?}");
        return Ok(());
    }

    let Some(locator) = args.locator.as_deref() else {
        return Err(error::RepoError::invalid_locator("", "no repository locator given").into());
    };

    let reference = RepositoryReference::parse(locator)?;
    debug!("Parsed {locator} as {reference}");

    let destination = settings.resolve_destination(&reference, args.dest.as_deref())?;
    let outcome = FetchOperation::new(
        reference,
        destination,
        args.branch.clone(),
        system,
        runner,
    )
    .execute()?;
    debug!("Fetched: {outcome:?}");

    Ok(())
}
