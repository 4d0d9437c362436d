//! Multi-document build output → structured objects.

use serde::Deserialize;
use serde_json::Value as Json;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("invalid rendered YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("rendered document {index} is not an object")]
    NotAnObject { index: usize },
}

fn is_list(obj: &Json) -> bool {
    obj.get("kind").and_then(|k| k.as_str()).is_some_and(|k| k.ends_with("List"))
        && obj.get("items").is_some_and(|i| i.is_array())
}

/// Split `---`-separated YAML into objects in document order.
///
/// Empty documents are skipped and `*List` documents are expanded into their items.
pub fn split_rendered(yaml: &str) -> Result<Vec<Json>, RenderError> {
    let mut out = Vec::new();
    for (index, doc) in serde_yaml::Deserializer::from_str(yaml).enumerate() {
        let value = Json::deserialize(doc)?;
        match value {
            Json::Null => continue,
            Json::Object(_) if is_list(&value) => {
                if let Some(Json::Array(items)) = value.get("items") {
                    out.extend(items.iter().filter(|i| i.is_object()).cloned());
                }
            }
            Json::Object(_) => out.push(value),
            _ => return Err(RenderError::NotAnObject { index }),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_documents_in_order() {
        let y = "apiVersion: v1\nkind: Service\nmetadata:\n  name: a\n---\napiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: b\n";
        let objs = split_rendered(y).unwrap();
        assert_eq!(objs.len(), 2);
        assert_eq!(objs[0]["metadata"]["name"], "a");
        assert_eq!(objs[1]["kind"], "Deployment");
    }

    #[test]
    fn skips_empty_documents() {
        let y = "---\n---\napiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: c\n---\n";
        let objs = split_rendered(y).unwrap();
        assert_eq!(objs.len(), 1);
    }

    #[test]
    fn expands_lists() {
        let y = "apiVersion: v1\nkind: List\nitems:\n- apiVersion: v1\n  kind: Service\n  metadata:\n    name: a\n- apiVersion: v1\n  kind: Service\n  metadata:\n    name: b\n";
        let objs = split_rendered(y).unwrap();
        let names: Vec<_> = objs.iter().map(|o| o["metadata"]["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn scalar_document_is_rejected() {
        let err = split_rendered("just a string\n").unwrap_err();
        assert!(matches!(err, RenderError::NotAnObject { index: 0 }), "err={}", err);
    }
}
