//! Fetch workflow tests driven through the mock system and process runner

use repofetch::cli::Args;
use repofetch::error::RepoError;
use repofetch::git::RepositoryReference;
use repofetch::operations::{FetchOperation, FetchOutcome};
use repofetch::process::{CommandOutput, Invocation, MockRunner};
use repofetch::system::{MockSystem, System};
use clap::Parser as _;
use std::path::{Path, PathBuf};

/// Runner that simulates `git checkout` by materializing `files` in the clone directory
fn checkout_runner(system: &MockSystem, files: &'static [(&'static str, &'static str)]) -> MockRunner {
    let system = system.clone();
    MockRunner::with_handler(move |invocation: &Invocation| {
        if invocation.args.first().map(String::as_str) == Some("--version") {
            return CommandOutput::ok("git version 2.43.0\n");
        }
        if invocation.args == ["checkout"]
            && let Some(cwd) = &invocation.cwd
        {
            for (path, contents) in files {
                let path = cwd.join(path);
                if let Some(parent) = path.parent() {
                    system.create_dir_all(parent).unwrap();
                }
                system.write(&path, contents.as_bytes()).unwrap();
            }
        }
        CommandOutput::ok("")
    })
}

fn clone_dir(runner: &MockRunner) -> PathBuf {
    runner
        .invocations()
        .iter()
        .find(|invocation| invocation.args.first().map(String::as_str) == Some("clone"))
        .and_then(|invocation| invocation.cwd.clone())
        .unwrap()
}

#[test]
fn test_subdirectory_checkout_moves_subtree_into_place() {
    let system = MockSystem::new().with_dir("/work").unwrap();
    let runner = checkout_runner(
        &system,
        &[
            ("packages/lib-base/package.json", "{}"),
            ("packages/lib-base/src/index.ts", "export {}"),
            ("README.md", "# monorepo"),
        ],
    );

    let reference =
        RepositoryReference::parse("https://github.com/mizchi/monorepo/tree/main/packages/lib-base")
            .unwrap();
    let outcome = FetchOperation::new(
        reference,
        PathBuf::from("/work/lib"),
        None,
        &system,
        &runner,
    )
    .execute()
    .unwrap();

    assert_eq!(outcome, FetchOutcome::CheckedOut);
    assert_eq!(
        system
            .read_to_string(Path::new("/work/lib/src/index.ts"))
            .unwrap(),
        "export {}"
    );
    assert!(system.exists(Path::new("/work/lib/package.json")));
    assert!(!system.exists(Path::new("/work/lib/README.md")));
    assert!(!system.exists(&clone_dir(&runner)));

    let commands = runner.commands();
    assert_eq!(
        commands[1],
        "git clone --filter=blob:none --no-checkout --depth 1 --sparse --branch main https://github.com/mizchi/monorepo ."
    );
    assert_eq!(commands[3], "git sparse-checkout add packages/lib-base");
}

#[test]
fn test_missing_subdirectory_reports_source_not_found() {
    let system = MockSystem::new().with_dir("/work").unwrap();
    let runner = checkout_runner(&system, &[("README.md", "# repo")]);

    let reference = RepositoryReference::parse("owner/repo/docs").unwrap();
    let err = FetchOperation::new(
        reference,
        PathBuf::from("/work/docs"),
        None,
        &system,
        &runner,
    )
    .execute()
    .unwrap_err();

    match err.downcast_ref::<RepoError>() {
        Some(RepoError::SourceNotFound { message }) => {
            assert!(message.contains("'docs' not found"));
            assert!(!message.contains('\n'));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!system.exists(Path::new("/work/docs")));
    assert!(!system.exists(&clone_dir(&runner)));
}

#[test]
fn test_failed_checkout_removes_temporary_clone() {
    let system = MockSystem::new().with_dir("/work").unwrap();
    let runner = MockRunner::with_handler(|invocation| {
        if invocation.args.first().map(String::as_str) == Some("sparse-checkout")
            && invocation.args.get(1).map(String::as_str) == Some("add")
        {
            CommandOutput::failed(128, "fatal: not a git repository")
        } else {
            CommandOutput::ok("")
        }
    });

    let reference = RepositoryReference::parse("owner/repo:packages/core").unwrap();
    let err = FetchOperation::new(
        reference,
        PathBuf::from("/work/core"),
        None,
        &system,
        &runner,
    )
    .execute()
    .unwrap_err();

    assert!(format!("{err:#}").contains("not a git repository"));
    assert!(!system.exists(&clone_dir(&runner)));
    assert!(!system.exists(Path::new("/work/core")));
}

#[test]
fn test_subdirectory_checkout_leaves_existing_destination_untouched() {
    let system = MockSystem::new()
        .with_file("/work/lib/keep.txt", b"mine")
        .unwrap();
    let runner = MockRunner::new();

    let reference = RepositoryReference::parse("mizchi/monorepo/packages/lib-base").unwrap();
    let err = FetchOperation::new(
        reference,
        PathBuf::from("/work/lib"),
        None,
        &system,
        &runner,
    )
    .execute()
    .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<RepoError>(),
        Some(RepoError::AlreadyExists { .. })
    ));
    assert!(runner.commands().is_empty());
    assert_eq!(
        system.read_to_string(Path::new("/work/lib/keep.txt")).unwrap(),
        "mine"
    );
}

#[test]
fn test_dirty_working_tree_is_not_pulled() {
    let system = MockSystem::new().with_dir("/home/me/repo/a/b").unwrap();
    let runner = MockRunner::with_handler(|invocation| {
        if invocation.args.first().map(String::as_str) == Some("status") {
            CommandOutput::ok(" M src/main.rs\n?? notes.txt\n")
        } else {
            CommandOutput::ok("")
        }
    });

    let reference = RepositoryReference::parse("a/b").unwrap();
    let err = FetchOperation::new(
        reference,
        PathBuf::from("/home/me/repo/a/b"),
        None,
        &system,
        &runner,
    )
    .execute()
    .unwrap_err();

    match err.downcast_ref::<RepoError>() {
        Some(RepoError::DirtyWorkingTree { path, changes }) => {
            assert_eq!(path, Path::new("/home/me/repo/a/b"));
            assert!(changes.contains("notes.txt"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.to_string().contains("is dirty repo"));
    assert!(
        !runner
            .commands()
            .iter()
            .any(|command| command.starts_with("git pull"))
    );
}

#[test]
fn test_run_clones_into_fallback_root() {
    let system = MockSystem::new()
        .with_env("HOME", "/home/me")
        .unwrap()
        .with_dir("/home/me")
        .unwrap();
    let runner = MockRunner::new();
    let args = Args::try_parse_from(["repo", "https://github.com/github/Spoon-Knife"]).unwrap();

    repofetch::run(&args, &system, &runner).unwrap();

    assert_eq!(
        runner.commands().last().map(String::as_str),
        Some(
            "git clone https://github.com/github/Spoon-Knife /home/me/repo/github/Spoon-Knife --depth 1"
        )
    );
}

#[test]
fn test_run_prefers_owner_root_for_self_owned_repository() {
    let system = MockSystem::new()
        .with_env("HOME", "/home/me")
        .unwrap()
        .with_env("REPO_FETCHER_OWNER", "mizchi")
        .unwrap()
        .with_env("REPO_FETCHER_OWNER_ROOT", "/home/me/mizchi")
        .unwrap()
        .with_env("REPO_FETCHER_ROOT", "/srv/repos")
        .unwrap();
    let runner = MockRunner::new();

    let args = Args::try_parse_from(["repo", "mizchi/dotfiles"]).unwrap();
    repofetch::run(&args, &system, &runner).unwrap();
    assert!(
        runner
            .commands()
            .contains(&"git clone https://github.com/mizchi/dotfiles /home/me/mizchi/dotfiles --depth 1".to_owned())
    );

    let args = Args::try_parse_from(["repo", "git@github.com:github/Spoon-Knife.git"]).unwrap();
    repofetch::run(&args, &system, &runner).unwrap();
    assert!(
        runner
            .commands()
            .contains(&"git clone https://github.com/github/Spoon-Knife /srv/repos/github/Spoon-Knife --depth 1".to_owned())
    );
}

#[test]
fn test_run_root_flag_overrides_environment() {
    let system = MockSystem::new()
        .with_env("REPO_FETCHER_ROOT", "/srv/repos")
        .unwrap();
    let runner = MockRunner::new();
    let args = Args::try_parse_from(["repo", "a/b", "--root", "/tmp/elsewhere", "-b", "dev"]).unwrap();

    repofetch::run(&args, &system, &runner).unwrap();

    assert_eq!(
        runner.commands().last().map(String::as_str),
        Some("git clone https://github.com/a/b /tmp/elsewhere/a/b --depth 1 --branch dev")
    );
}

#[test]
fn test_run_without_home_or_root_is_missing_configuration() {
    let system = MockSystem::new();
    let runner = MockRunner::new();
    let args = Args::try_parse_from(["repo", "a/b"]).unwrap();

    let err = repofetch::run(&args, &system, &runner).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<RepoError>(),
        Some(RepoError::MissingConfiguration { .. })
    ));
    assert!(runner.commands().is_empty());
}

#[test]
fn test_run_browser_page_url_clones_whole_repository() {
    let system = MockSystem::new()
        .with_env("REPO_FETCHER_ROOT", "/srv/repos")
        .unwrap();
    let runner = MockRunner::new();
    let args = Args::try_parse_from([
        "repo",
        "https://github.com/github/Spoon-Knife/blob/main/README.md",
    ])
    .unwrap();

    repofetch::run(&args, &system, &runner).unwrap();

    let commands = runner.commands();
    assert!(!commands.iter().any(|command| command.contains("sparse")));
    assert_eq!(
        commands.last().map(String::as_str),
        Some("git clone https://github.com/github/Spoon-Knife /srv/repos/github/Spoon-Knife --depth 1")
    );
}
