//! Live applications → per-app summaries and deployment history.

use std::collections::HashMap;

use anyhow::Result;
use gitdeck_core::sources::{LiveApplicationSource, RevisionMetadataSource};
use gitdeck_core::{format_timestamp, AppSummary, HistoryEntry, LiveApplication, RevisionMetadata};
use tracing::{debug, warn};

/// Canonical form of a repository URL for equality checks.
///
/// Drops scheme, user-info, trailing slashes and a `.git` suffix, and lowercases
/// the host. scp-style `git@host:org/repo` maps onto `host/org/repo`.
pub fn normalize_repo_url(raw: &str) -> String {
    let s = raw.trim();
    let (s, had_scheme) = match s.split_once("://") {
        Some((_, rest)) => (rest, true),
        None => (s, false),
    };
    let s = match s.split_once('@') {
        Some((user, rest)) if !user.contains('/') => rest,
        _ => s,
    };
    let s = s.trim_end_matches('/');
    let s = s.strip_suffix(".git").unwrap_or(s);
    let (host, path) = match s.split_once('/') {
        Some((h, p)) => (h, p),
        None => (s, ""),
    };
    let (host, path) = match host.split_once(':') {
        Some((h, first)) if !had_scheme => (h, if path.is_empty() { first.to_string() } else { format!("{first}/{path}") }),
        _ => (host, path.to_string()),
    };
    let host = host.to_ascii_lowercase();
    if path.is_empty() { host } else { format!("{host}/{path}") }
}

/// Merge live applications deployed from `repo_url` into one summary per logical app.
///
/// Arrays are appended in encounter order; summaries appear in order of first
/// encounter. Applications without a name label are skipped.
pub fn summarize(apps: &[LiveApplication], repo_url: &str) -> Vec<AppSummary> {
    let want = normalize_repo_url(repo_url);
    let mut out: Vec<AppSummary> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for app in apps.iter().filter(|a| normalize_repo_url(&a.source_repo_url) == want) {
        let Some(name) = app.app_name() else {
            debug!(app = %app.name, ns = %app.namespace, "skipping live application without name label");
            continue;
        };
        let idx = *index.entry(name.to_string()).or_insert_with(|| {
            out.push(AppSummary { name: name.to_string(), repo_url: app.source_repo_url.clone(), ..Default::default() });
            out.len() - 1
        });
        let summary = &mut out[idx];
        summary.environments.push(app.destination_namespace.clone());
        summary.sync_status.push(app.sync_status.clone());
        summary.last_deployed.push(format_timestamp(app.last_deployed()));
    }
    out
}

/// Fetch revision metadata, turning failure into blanks plus a warning.
pub async fn enrich(
    source: &dyn RevisionMetadataSource,
    app: &str,
    revision: &str,
) -> (RevisionMetadata, Option<String>) {
    match source.fetch(app, revision).await {
        Ok(meta) => (meta, None),
        Err(e) => (
            RevisionMetadata::default(),
            Some(format!("revision metadata for {app}@{revision} unavailable: {e:#}")),
        ),
    }
}

/// Deployment history of one live application, newest first.
pub async fn history(app: &LiveApplication, source: &dyn RevisionMetadataSource) -> Vec<HistoryEntry> {
    let mut entries = Vec::with_capacity(app.history.len());
    for record in &app.history {
        let (meta, warning) = enrich(source, &app.name, &record.revision).await;
        if let Some(w) = warning {
            warn!(app = %app.name, revision = %record.revision, "{}", w);
        }
        entries.push(HistoryEntry {
            author: meta.author,
            message: meta.message,
            revision: record.revision.clone(),
            environment: app.destination_namespace.clone(),
            repo_url: app.source_repo_url.clone(),
            deployed_at: format_timestamp(record.deployed_at),
        });
    }
    entries.reverse();
    entries
}

/// Find the live application for `app` in `env`.
///
/// First by the compound name `{env}-{app}`, then by the bare environment name
/// for deployments that predate the compound convention.
pub async fn find_live_application(
    source: &dyn LiveApplicationSource,
    env: &str,
    app: &str,
) -> Result<Option<LiveApplication>> {
    let compound = format!("{env}-{app}");
    if let Some(found) = source.list(Some(compound.as_str())).await?.into_iter().next() {
        return Ok(Some(found));
    }
    debug!(compound = %compound, env = %env, "no live application under compound name; trying environment name");
    Ok(source.list(Some(env)).await?.into_iter().next())
}
