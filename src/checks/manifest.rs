//! npm manifest checker
//!
//! Lints `package.json` against the repository metadata. The lint itself is
//! pure ([`lint_manifest`]); [`ManifestChecker`] applies the metadata fixes
//! on GitHub and commits the rewritten manifest.

use super::{CheckContext, Checker};
use crate::error::{Error, RemoteOutcome, Result};
use crate::messages;
use crate::types::{RepoId, RepositoryInfo};
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use tracing::{debug, warn};

/// License filled in when the manifest has none
const DEFAULT_LICENSE: &str = "MIT";

/// GitHub's SPDX id for a license it couldn't identify
const UNKNOWN_SPDX: &str = "NOASSERTION";

/// Placeholder `npm init` writes for `scripts.test`
const PLACEHOLDER_TEST: &str = "no test specified";

/// A change to make on the hosting platform rather than in the manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataFix {
    /// Set the repository description
    Description(String),
    /// Replace the repository topics
    Topics(Vec<String>),
}

/// Result of linting a manifest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LintReport {
    /// Notes for the pull request body
    pub notes: Vec<String>,
    /// Platform-side fixes to attempt
    pub fixes: Vec<MetadataFix>,
}

fn quoted_list(items: &[String]) -> String {
    items
        .iter()
        .map(|k| format!("\"{k}\""))
        .collect::<Vec<_>>()
        .join(", ")
}

fn non_empty_str<'a>(pkg: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    pkg.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Lint `pkg` in place against the canonical repository metadata
///
/// `web_base` is the host the repository is browsed on, so homepage, bugs
/// and repository URLs are expected under it.
pub fn lint_manifest(
    pkg: &mut Map<String, Value>,
    repo: &RepoId,
    info: &RepositoryInfo,
    web_base: &str,
) -> LintReport {
    let mut report = LintReport::default();
    let web = repo.web_url(web_base);

    check_description(pkg, info, &mut report);
    check_keywords(pkg, info, &mut report);

    if !pkg.contains_key("homepage") {
        pkg.insert("homepage".into(), json!(web));
        report.notes.push(format!(
            "Check that the homepage in the `package.json` is OK. Another one besides your GitHub repo might work. We've set it to {web}."
        ));
    }

    let issues_url = format!("{web}/issues");
    match pkg.get("bugs") {
        None => {
            pkg.insert("bugs".into(), json!({ "url": issues_url }));
        }
        Some(bugs) => {
            let url = bugs
                .as_str()
                .or_else(|| bugs.get("url").and_then(Value::as_str));
            if url != Some(issues_url.as_str()) {
                report.notes.push(format!(
                    "Check that the bugs field in the package.json is OK. It doesn't match what we'd expect, which would be {issues_url}"
                ));
            }
        }
    }

    match non_empty_str(pkg, "license") {
        None => {
            pkg.insert("license".into(), json!(DEFAULT_LICENSE));
            report.notes.push(format!(
                "Check the license in your `package.json`. We added \"{DEFAULT_LICENSE}\" for now."
            ));
        }
        Some(license) => {
            if let Some(spdx) = info.license_spdx.as_deref()
                && spdx != UNKNOWN_SPDX
                && spdx != license
            {
                report.notes.push(
                    "Update the license in your `package.json`. It did not match what we found on GitHub, and we were unable to resolve this.".to_string(),
                );
            }
        }
    }

    let expected_repo = json!({ "type": "git", "url": format!("{web}.git") });
    match pkg.get("repository") {
        None => {
            pkg.insert("repository".into(), expected_repo);
        }
        Some(current) if *current != expected_repo => {
            report.notes.push(format!(
                "We expected the repository url in the `package.json` to be {web}, and it wasn't. Is this intentional?"
            ));
        }
        Some(_) => {}
    }

    if !pkg.contains_key("contributors") {
        let contributors: Vec<Value> = pkg.get("author").cloned().into_iter().collect();
        pkg.insert("contributors".into(), Value::Array(contributors));
        report.notes.push(
            "If there are more contributors, add them to the Contributors field in the `package.json`.".to_string(),
        );
    }

    let test_script = pkg
        .get("scripts")
        .and_then(|s| s.get("test"))
        .and_then(Value::as_str);
    if test_script.is_none_or(|t| t.contains(PLACEHOLDER_TEST)) {
        let title = urlencoding::encode("Add Tests");
        let body = urlencoding::encode(
            "Tests are useful for ensuring code quality. No tests were found in the package manifest.",
        );
        report.notes.push(format!(
            "Add some tests! There aren't any currently set. [Use this link to stub out an issue.]({web}/issues/new?title={title}&body={body})"
        ));
    }

    report
}

fn check_description(pkg: &mut Map<String, Value>, info: &RepositoryInfo, report: &mut LintReport) {
    let remote = info.description.as_deref().filter(|d| !d.is_empty());
    let local = non_empty_str(pkg, "description").map(str::to_string);

    match (remote, local) {
        (Some(remote), None) => {
            pkg.insert("description".into(), json!(remote));
            report.notes.push(format!(
                "We've added \"{remote}\" as the description in the `package.json`. We got this from the GitHub repo description."
            ));
        }
        (None, Some(local)) => report.fixes.push(MetadataFix::Description(local)),
        (Some(remote), Some(local)) if remote != local => {
            report.notes.push(
                "Check the `package.json` description. It didn't match the GitHub description for the repository.".to_string(),
            );
        }
        _ => {}
    }
}

fn check_keywords(pkg: &mut Map<String, Value>, info: &RepositoryInfo, report: &mut LintReport) {
    let current: Option<Vec<String>> = pkg.get("keywords").and_then(Value::as_array).map(|arr| {
        arr.iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect()
    });

    let mut merged: Vec<String> = Vec::new();
    for keyword in info.topics.iter().chain(current.iter().flatten()) {
        if !keyword.is_empty() && !merged.contains(keyword) {
            merged.push(keyword.clone());
        }
    }

    if current.as_ref() != Some(&merged) {
        pkg.insert("keywords".into(), json!(merged));
        if merged.is_empty() {
            report.notes.push(
                "Add some keywords to your package.json. We've added an empty `keywords` field for now.".to_string(),
            );
        } else {
            report.notes.push(format!(
                "Check the `package.json` keywords. We added these from your GitHub topics: {}.",
                quoted_list(&merged)
            ));
        }
    }

    if !merged.is_empty() && merged != info.topics {
        report.fixes.push(MetadataFix::Topics(merged));
    }
}

/// Checker for the npm manifest at a configurable path
pub struct ManifestChecker {
    path: String,
}

impl ManifestChecker {
    /// Check the manifest at `path`
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// Apply one platform fix, returning a note when the user has to act
    async fn apply_fix(&self, ctx: &CheckContext<'_>, fix: &MetadataFix) -> Option<String> {
        match fix {
            MetadataFix::Description(description) => {
                let fallback =
                    "Add a GitHub description. Your `package.json` description should work.";
                if ctx.options.dry_run {
                    ctx.reporter
                        .info("GitHub description not set, because dry run.")
                        .await;
                    return Some(fallback.to_string());
                }
                match ctx.platform.update_description(ctx.canonical, description).await {
                    Ok(stored) if stored == *description => {
                        ctx.reporter
                            .info("I set the GitHub description to match the `package.json` description.")
                            .await;
                        None
                    }
                    Ok(_) => None,
                    Err(e) => {
                        warn!(error = %e, "failed to set description");
                        ctx.reporter
                            .warn("Unable to set GitHub description using `package.json` description. Probably a permissions error.")
                            .await;
                        Some(fallback.to_string())
                    }
                }
            }
            MetadataFix::Topics(topics) => {
                let fallback = format!(
                    "Add these keywords (from your `package.json`) as GitHub topics to your repo: {}.",
                    quoted_list(topics)
                );
                if ctx.options.dry_run {
                    ctx.reporter
                        .info("GitHub topics not set, because dry run.")
                        .await;
                    return Some(fallback);
                }
                match ctx.platform.replace_topics(ctx.canonical, topics).await {
                    Ok(_) => {
                        ctx.reporter
                            .info("I set the GitHub topics to include all `package.json` keywords.")
                            .await;
                        Some(
                            "Check your GitHub topics. I added some from your `package.json` keywords."
                                .to_string(),
                        )
                    }
                    Err(e) => {
                        warn!(error = %e, "failed to set topics");
                        ctx.reporter
                            .warn("Unable to set GitHub topics using `package.json` keywords. Probably a permissions error.")
                            .await;
                        Some(fallback)
                    }
                }
            }
        }
    }
}

#[async_trait]
impl Checker for ManifestChecker {
    fn name(&self) -> &str {
        "manifest"
    }

    async fn check(&self, ctx: &CheckContext<'_>) -> Result<Vec<String>> {
        let (read_repo, read_branch) = ctx.read_location();
        let file = RemoteOutcome::from_result(
            ctx.platform.get_file(read_repo, &self.path, read_branch).await,
        )
        .found()?;

        let Some(file) = file else {
            ctx.reporter
                .info(&format!("No {} found, skipping manifest checks.", self.path))
                .await;
            return Ok(Vec::new());
        };

        let original: Value = serde_json::from_str(&file.text)
            .map_err(|e| Error::Manifest(format!("failed to parse {}: {e}", self.path)))?;
        let Value::Object(mut pkg) = original.clone() else {
            return Err(Error::Manifest(format!("{} is not a JSON object", self.path)));
        };

        let report = lint_manifest(&mut pkg, ctx.canonical, ctx.info, &ctx.options.web_base);
        let mut notes = report.notes;
        for fix in &report.fixes {
            if let Some(note) = self.apply_fix(ctx, fix).await {
                notes.push(note);
            }
        }

        let updated = Value::Object(pkg);
        if updated == original {
            debug!(path = %self.path, "manifest already up to date");
            return Ok(notes);
        }

        if ctx.options.dry_run || !ctx.branch_exists {
            ctx.reporter
                .info(&format!("Not committing {}, because dry run.", self.path))
                .await;
            return Ok(notes);
        }

        let mut contents = serde_json::to_string_pretty(&updated)?;
        contents.push('\n');
        ctx.platform
            .update_file(
                ctx.target.repo(),
                &self.path,
                ctx.branch,
                messages::MANIFEST_COMMIT_MESSAGE,
                &contents,
                &file.sha,
            )
            .await?;
        ctx.reporter
            .info(&format!("Committed {} to {}.", self.path, ctx.branch))
            .await;

        Ok(notes)
    }
}
