#![forbid(unsafe_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use chrono::{TimeZone, Utc};
use gitdeck_aggregate::{find_live_application, history, summarize};
use gitdeck_core::sources::{LiveApplicationSource, RevisionMetadataSource};
use gitdeck_core::{HistoryRecord, LiveApplication, RevisionMetadata, NAME_LABEL};

fn record(id: i64, revision: &str, day: u32, hour: u32) -> HistoryRecord {
    HistoryRecord { id, revision: revision.into(), deployed_at: Some(Utc.with_ymd_and_hms(2021, 5, day, hour, 12, 13).unwrap()) }
}

fn live(name: &str, label: Option<&str>, ns: &str, repo: &str, sync: &str, history: Vec<HistoryRecord>) -> LiveApplication {
    let mut a = LiveApplication {
        name: name.into(),
        namespace: "argocd".into(),
        destination_namespace: ns.into(),
        destination_server: "https://kubernetes.default.svc".into(),
        source_repo_url: repo.into(),
        sync_status: sync.into(),
        history,
        ..Default::default()
    };
    if let Some(l) = label {
        a.labels.insert(NAME_LABEL.into(), l.into());
    }
    a
}

const REPO: &str = "https://github.com/test-repo/gitops.git";

#[test]
fn summarize_single_app_matches_with_and_without_git_suffix() {
    let apps = vec![live("dev-test-app", Some("test-app"), "dev", REPO, "Synced", vec![record(0, "a1", 15, 2)])];
    for query in ["https://github.com/test-repo/gitops", "https://github.com/test-repo/gitops.git"] {
        let got = summarize(&apps, query);
        assert_eq!(got.len(), 1, "query {}", query);
        assert_eq!(got[0].name, "test-app");
        assert_eq!(got[0].repo_url, REPO);
        assert_eq!(got[0].environments, vec!["dev"]);
        assert_eq!(got[0].sync_status, vec!["Synced"]);
        assert_eq!(got[0].last_deployed, vec!["2021-05-15T02:12:13Z"]);
    }
}

#[test]
fn summarize_merges_environments_in_encounter_order() {
    let apps = vec![
        live("dev-test-app", Some("test-app"), "dev", REPO, "Synced", vec![record(0, "a1", 15, 2)]),
        live("production-test-app", Some("test-app"), "production", "https://github.com/test-repo/gitops", "OutOfSync", vec![record(0, "a0", 14, 1), record(1, "a1", 16, 1)]),
    ];
    let got = summarize(&apps, "https://github.com/test-repo/gitops");
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].environments, vec!["dev", "production"]);
    assert_eq!(got[0].sync_status, vec!["Synced", "OutOfSync"]);
    assert_eq!(got[0].last_deployed, vec!["2021-05-15T02:12:13Z", "2021-05-16T01:12:13Z"]);

    let reversed: Vec<_> = apps.into_iter().rev().collect();
    let got = summarize(&reversed, REPO);
    assert_eq!(got[0].environments, vec!["production", "dev"]);
    assert_eq!(got[0].sync_status, vec!["OutOfSync", "Synced"]);
}

#[test]
fn summarize_filters_other_repos_and_unlabeled_apps() {
    let apps = vec![
        live("dev-a", Some("a"), "dev", REPO, "Synced", vec![]),
        live("dev-b", Some("b"), "dev", "https://github.com/other/gitops.git", "Synced", vec![]),
        live("dev-c", None, "dev", REPO, "Synced", vec![]),
        live("dev-d", Some("d"), "dev", "https://github.com/test-repo/gitops-extra", "Synced", vec![]),
    ];
    let got = summarize(&apps, REPO);
    let names: Vec<_> = got.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["a"]);
    // never deployed
    assert_eq!(got[0].last_deployed, vec![""]);
}

struct Revisions {
    failing: &'static str,
    calls: Mutex<Vec<(String, String)>>,
}

#[async_trait::async_trait]
impl RevisionMetadataSource for Revisions {
    async fn fetch(&self, app: &str, revision: &str) -> Result<RevisionMetadata> {
        self.calls.lock().unwrap().push((app.to_string(), revision.to_string()));
        if revision == self.failing {
            return Err(anyhow!("connection refused"));
        }
        Ok(RevisionMetadata { author: format!("author-{revision}"), message: format!("message-{revision}") })
    }
}

#[tokio::test]
async fn history_is_newest_first_and_survives_a_failed_lookup() {
    let app = live("dev-taxi", Some("taxi"), "dev", REPO, "Synced", vec![record(0, "r1", 14, 1), record(1, "r2", 15, 1), record(2, "r3", 16, 1)]);
    let source = Revisions { failing: "r2", calls: Mutex::new(Vec::new()) };
    let entries = history(&app, &source).await;

    let revisions: Vec<_> = entries.iter().map(|e| e.revision.as_str()).collect();
    assert_eq!(revisions, vec!["r3", "r2", "r1"]);
    assert_eq!(entries[0].author, "author-r3");
    assert_eq!(entries[0].message, "message-r3");
    assert_eq!(entries[1].author, "");
    assert_eq!(entries[1].message, "");
    assert_eq!(entries[2].author, "author-r1");
    for e in &entries {
        assert_eq!(e.environment, "dev");
        assert_eq!(e.repo_url, REPO);
    }
    assert_eq!(entries[0].deployed_at, "2021-05-16T01:12:13Z");

    let calls = source.calls.lock().unwrap().clone();
    assert_eq!(calls, vec![
        ("dev-taxi".to_string(), "r1".to_string()),
        ("dev-taxi".to_string(), "r2".to_string()),
        ("dev-taxi".to_string(), "r3".to_string()),
    ]);
}

#[tokio::test]
async fn history_of_undeployed_app_is_empty() {
    let app = live("dev-taxi", Some("taxi"), "dev", REPO, "Unknown", vec![]);
    let source = Revisions { failing: "", calls: Mutex::new(Vec::new()) };
    assert!(history(&app, &source).await.is_empty());
    assert!(source.calls.lock().unwrap().is_empty());
}

struct Listing {
    by_name: HashMap<String, LiveApplication>,
    queries: Mutex<Vec<Option<String>>>,
}

impl Listing {
    fn new(apps: Vec<LiveApplication>) -> Self {
        Self { by_name: apps.into_iter().map(|a| (a.name.clone(), a)).collect(), queries: Mutex::new(Vec::new()) }
    }

    fn queries(&self) -> Vec<Option<String>> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl LiveApplicationSource for Listing {
    async fn list(&self, name: Option<&str>) -> Result<Vec<LiveApplication>> {
        self.queries.lock().unwrap().push(name.map(str::to_string));
        Ok(match name {
            Some(n) => self.by_name.get(n).cloned().into_iter().collect(),
            None => self.by_name.values().cloned().collect(),
        })
    }
}

#[tokio::test]
async fn lookup_prefers_compound_name() {
    let listing = Listing::new(vec![
        live("dev-taxi", Some("taxi"), "dev", REPO, "Synced", vec![]),
        live("dev", Some("taxi"), "dev", REPO, "OutOfSync", vec![]),
    ]);
    let found = find_live_application(&listing, "dev", "taxi").await.unwrap().unwrap();
    assert_eq!(found.name, "dev-taxi");
    assert_eq!(listing.queries(), vec![Some("dev-taxi".to_string())]);
}

#[tokio::test]
async fn lookup_falls_back_to_environment_name() {
    let listing = Listing::new(vec![live("dev", Some("taxi"), "dev", REPO, "Synced", vec![])]);
    let found = find_live_application(&listing, "dev", "taxi").await.unwrap().unwrap();
    assert_eq!(found.name, "dev");
    assert_eq!(listing.queries(), vec![Some("dev-taxi".to_string()), Some("dev".to_string())]);
}

#[tokio::test]
async fn lookup_without_match_is_none() {
    let listing = Listing::new(vec![live("stage-taxi", Some("taxi"), "stage", REPO, "Synced", vec![])]);
    assert!(find_live_application(&listing, "dev", "taxi").await.unwrap().is_none());
    assert_eq!(listing.queries().len(), 2);
}

struct Down;

#[async_trait::async_trait]
impl LiveApplicationSource for Down {
    async fn list(&self, _name: Option<&str>) -> Result<Vec<LiveApplication>> {
        Err(anyhow!("cluster unavailable"))
    }
}

#[tokio::test]
async fn lookup_propagates_listing_failure() {
    let err = find_live_application(&Down, "dev", "taxi").await.unwrap_err();
    assert!(err.to_string().contains("cluster unavailable"));
}
