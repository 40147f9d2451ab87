use crate::operations::Visibility;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

const AFTER_HELP: &str = "\
Examples:
    $ repo https://github.com/github/Spoon-Knife
    $ repo github/Spoon-Knife
    $ repo https://github.com/mizchi/monorepo/tree/main/packages/lib-base ./lib
    $ repo mizchi/monorepo/packages/lib-base ./lib
    $ repo manage ./scratch my-new-tool --private

Environment Variables:
    export REPO_FETCHER_ROOT=$HOME/repo        # default
    export REPO_FETCHER_OWNER=yourname
    export REPO_FETCHER_OWNER_ROOT=$HOME/yourname  # clone if owner is you";

/// Command-line arguments for repo
#[derive(Parser, Debug, Clone)]
#[command(name = "repo")]
#[command(about = "Clone, sync, or sparse-checkout repositories from shorthand locators")]
#[command(long_about = None)]
#[command(version)]
#[command(after_help = AFTER_HELP)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Repository locator: owner/repo[/path], an https URL, or git@host:owner/repo
    #[arg(value_name = "LOCATOR")]
    pub locator: Option<String>,

    /// Explicit destination directory
    #[arg(value_name = "DEST")]
    pub dest: Option<PathBuf>,

    /// Branch to clone or pull instead of the one in the locator
    #[arg(short, long, value_name = "NAME")]
    pub branch: Option<String>,

    /// Root directory for repositories (overrides REPO_FETCHER_ROOT)
    #[arg(short, long, value_name = "PATH")]
    pub root: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Args {
    /// True when nothing was asked for and usage should be printed
    #[must_use]
    pub const fn wants_usage(&self) -> bool {
        self.command.is_none() && self.locator.is_none()
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Move a local directory under REPO_FETCHER_OWNER_ROOT and register its GitHub remote
    Manage {
        /// Directory to adopt
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// Repository name (defaults to the directory name)
        #[arg(value_name = "NAME")]
        name: Option<String>,

        /// Create the remote repository as public
        #[arg(long, conflicts_with = "private")]
        public: bool,

        /// Create the remote repository as private
        #[arg(long)]
        private: bool,
    },
}

impl Command {
    /// Visibility requested for `manage`, if any
    #[must_use]
    pub const fn visibility(&self) -> Option<Visibility> {
        match *self {
            Self::Manage {
                public, private, ..
            } => Visibility::from_flags(public, private),
        }
    }
}
