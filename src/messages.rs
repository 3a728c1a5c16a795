//! Fixed text for the pull request, tracking issue and commits

use crate::types::NoteLog;

/// Title of every pull request opened by the tool
pub const PR_TITLE: &str = "Update package.json metadata";

/// Title of the issue raised when the open pull requests are ambiguous
pub const ISSUE_TITLE: &str = "More than one open manifest-sync pull request";

/// Commit message used when the manifest is rewritten
pub const MANIFEST_COMMIT_MESSAGE: &str = "docs: sync package.json with repository metadata";

/// Render the pull request body from the collected notes
pub fn pr_body(notes: &NoteLog) -> String {
    let mut body = String::from(
        "Hi! I went through this repository's manifest and compared it with the GitHub metadata.\n\n",
    );

    if notes.is_empty() {
        body.push_str("Everything I changed is in the diff; there is nothing else to review.\n");
    } else {
        body.push_str("Please have a look at the following:\n\n");
        for note in notes.notes() {
            body.push_str("- [ ] ");
            body.push_str(note);
            body.push('\n');
        }
    }

    body.push_str("\nRunning the tool again will update this pull request instead of opening a new one.\n");
    body
}

/// Render the tracking issue body listing the conflicting pull requests
pub fn issue_body(numbers: &[u64]) -> String {
    let list = numbers
        .iter()
        .map(|n| format!("- #{n}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "I found more than one open pull request that I authored, and I don't know which one to update:\n\n{list}\n\nPlease close all but one of them and run me again."
    )
}
