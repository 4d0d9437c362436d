//! Resources → services, grouped by the name label.

use std::collections::BTreeMap;

use gitdeck_core::{Environment, Resource, Service, Source, NAME_LABEL};
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    #[error("failed to parse Git repo URL {url:?}: {reason}")]
    SourceUrl { url: String, reason: String },
}

/// Group key for a resource; unlabeled resources share the empty key.
pub fn service_name(r: &Resource) -> &str {
    r.label(NAME_LABEL).unwrap_or("")
}

/// Host of a declared source URL, used as the source `type`. A non-default
/// port is kept as `host:port`.
pub fn host_from_url(url: &str) -> Result<String, AggregateError> {
    let parsed = Url::parse(url).map_err(|e| AggregateError::SourceUrl { url: url.to_string(), reason: e.to_string() })?;
    let host = parsed.host_str().unwrap_or_default();
    Ok(match parsed.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

fn source_for(env: &Environment, name: &str) -> Result<Option<Source>, AggregateError> {
    match env.find_service(name) {
        Some(declared) if !declared.source_url.is_empty() => Ok(Some(Source {
            url: declared.source_url.clone(),
            kind: host_from_url(&declared.source_url)?,
        })),
        _ => Ok(None),
    }
}

/// Group `resources` into services and attach declared source metadata.
///
/// Images are unioned per group and resources keep their input order within a
/// group. Services come out ordered by name. A declared source URL that does not
/// parse fails the whole call.
pub fn aggregate(env: &Environment, resources: Vec<Resource>) -> Result<Vec<Service>, AggregateError> {
    let mut groups: BTreeMap<String, Service> = BTreeMap::new();
    for r in resources {
        let name = service_name(&r).to_string();
        let svc = groups.entry(name).or_insert_with_key(|name| Service { name: name.clone(), ..Default::default() });
        svc.images.extend(r.images.iter().cloned());
        svc.resources.push(r);
    }
    groups
        .into_values()
        .map(|mut svc| {
            svc.source = source_for(env, &svc.name)?;
            Ok(svc)
        })
        .collect()
}
