//! Declared configuration → application summaries (no live state).

use std::collections::HashMap;

use gitdeck_core::{AppSummary, Config};

/// One summary per declared app name with the environments it is declared in.
///
/// Environments are sorted; sync status and last-deployed stay empty since no
/// live state is consulted. Apps appear in order of first declaration.
pub fn declared_summaries(cfg: &Config) -> Vec<AppSummary> {
    let mut out: Vec<AppSummary> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for env in &cfg.environments {
        for app in &env.apps {
            let idx = *index.entry(app.name.as_str()).or_insert_with(|| {
                out.push(AppSummary { name: app.name.clone(), repo_url: cfg.gitops_url.clone(), ..Default::default() });
                out.len() - 1
            });
            out[idx].environments.push(env.name.clone());
        }
    }
    for summary in &mut out {
        summary.environments.sort();
    }
    out
}
