// Test fixtures: throwaway bare remotes seeded with one commit

use crate::git::process::run_git;
use std::path::{Path, PathBuf};

/// Create a bare remote under `dir` holding one commit on `master`
pub async fn seeded_remote(dir: &Path) -> PathBuf {
    let remote = dir.join("remote.git");
    run_git(
        None,
        &[
            "init",
            "--bare",
            "--initial-branch=master",
            &remote.display().to_string(),
        ],
        &[],
    )
    .await
    .unwrap();

    let seed = dir.join("seed-clone");
    run_git(
        None,
        &[
            "clone",
            &remote.display().to_string(),
            &seed.display().to_string(),
        ],
        &[],
    )
    .await
    .unwrap();

    std::fs::write(seed.join("seed.txt"), "seed").unwrap();
    run_git(Some(&seed), &["add", "--all"], &[]).await.unwrap();
    run_git(
        Some(&seed),
        &[
            "-c",
            "user.name=fixture",
            "-c",
            "user.email=fixture@example.com",
            "commit",
            "-m",
            "seed",
        ],
        &[],
    )
    .await
    .unwrap();
    run_git(Some(&seed), &["push", "origin", "HEAD:refs/heads/master"], &[])
        .await
        .unwrap();

    remote
}

/// HEAD commit hash of a repository (bare or not)
pub async fn head_of(repo: &Path) -> String {
    run_git(Some(repo), &["rev-parse", "HEAD"], &[])
        .await
        .unwrap()
        .stdout
        .trim()
        .to_string()
}

/// Author of the HEAD commit as "Name <email>"
pub async fn head_author_of(repo: &Path) -> String {
    run_git(Some(repo), &["log", "-1", "--format=%an <%ae>"], &[])
        .await
        .unwrap()
        .stdout
        .trim()
        .to_string()
}

/// Subject line of the HEAD commit
pub async fn head_message_of(repo: &Path) -> String {
    run_git(Some(repo), &["log", "-1", "--format=%s"], &[])
        .await
        .unwrap()
        .stdout
        .trim()
        .to_string()
}
