// Git integration: clean checkouts and publishing run output
//
// All operations shell out to the system `git` binary. Credentials are
// injected per invocation and never written to the workspace; anything a
// git subprocess prints is scrubbed before it can reach a log line.

pub mod process;
pub mod publisher;
#[cfg(test)]
pub mod testsupport;
pub mod workspace;

pub use process::{redact, run_git, GitOutput};
pub use publisher::{GitPublisher, PublishOutcome};
pub use workspace::GitWorkspace;
