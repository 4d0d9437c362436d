//! Rendered object → [`Resource`].

use std::collections::{BTreeMap, BTreeSet};

use gitdeck_core::Resource;
use serde_json::Value as Json;

use crate::convert::{convert, group_version};
use crate::images::images_from;

fn str_at<'a>(v: &'a Json, path: &[&str]) -> &'a str {
    path.iter()
        .try_fold(v, |cur, key| cur.get(key))
        .and_then(|v| v.as_str())
        .unwrap_or("")
}

fn labels_of(obj: &Json) -> BTreeMap<String, String> {
    obj.get("metadata")
        .and_then(|m| m.get("labels"))
        .and_then(|l| l.as_object())
        .map(|l| {
            l.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

/// Normalize one rendered object. Conversion failures leave `images` empty.
pub fn extract_resource(obj: &Json) -> Resource {
    let (group, version) = group_version(str_at(obj, &["apiVersion"]));
    let images = match convert(obj) {
        Ok(structured) => images_from(&structured),
        Err(_) => BTreeSet::new(),
    };
    Resource {
        group: group.to_string(),
        version: version.to_string(),
        kind: str_at(obj, &["kind"]).to_string(),
        name: str_at(obj, &["metadata", "name"]).to_string(),
        namespace: str_at(obj, &["metadata", "namespace"]).to_string(),
        labels: labels_of(obj),
        images,
    }
}

/// One resource per rendered object, in input order.
pub fn extract(objects: &[Json]) -> Vec<Resource> {
    objects.iter().map(extract_resource).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn non_string_labels_are_ignored() {
        let obj = json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": { "name": "cfg", "labels": { "a": "b", "n": 3 } }
        });
        let r = extract_resource(&obj);
        assert_eq!(r.labels.len(), 1);
        assert_eq!(r.label("a"), Some("b"));
    }

    #[test]
    fn missing_metadata_yields_empty_fields() {
        let r = extract_resource(&json!({ "kind": "Thing" }));
        assert_eq!(r.kind, "Thing");
        assert_eq!(r.name, "");
        assert_eq!(r.group, "");
        assert_eq!(r.version, "");
        assert!(r.labels.is_empty());
    }
}
