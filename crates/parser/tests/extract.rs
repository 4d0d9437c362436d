#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use gitdeck_core::{Resource, NAME_LABEL};
use gitdeck_parser::{extract, split_rendered};

const PART_OF_LABEL: &str = "app.kubernetes.io/part-of";

const GO_DEMO: &str = r#"
apiVersion: v1
kind: ConfigMap
metadata:
  name: go-demo-config
  labels:
    app.kubernetes.io/part-of: go-demo
data:
  REDIS_URL: redis:6379
---
apiVersion: v1
kind: Service
metadata:
  name: go-demo-http
  labels:
    app.kubernetes.io/name: go-demo
    app.kubernetes.io/part-of: go-demo
spec:
  ports:
  - port: 8080
---
apiVersion: apps/v1
kind: Deployment
metadata:
  name: go-demo-http
  labels:
    app.kubernetes.io/name: go-demo
    app.kubernetes.io/part-of: go-demo
spec:
  selector:
    matchLabels:
      app.kubernetes.io/name: go-demo
  template:
    spec:
      containers:
      - name: http
        image: bigkevmcd/go-demo:876ecb3
---
apiVersion: apps/v1
kind: Deployment
metadata:
  name: redis
  labels:
    app.kubernetes.io/name: redis
    app.kubernetes.io/part-of: go-demo
spec:
  selector:
    matchLabels:
      app.kubernetes.io/name: redis
  template:
    spec:
      containers:
      - name: redis
        image: redis:6-alpine
---
apiVersion: batch/v1beta1
kind: CronJob
metadata:
  name: hello
  labels:
    app.kubernetes.io/name: go-demo
    app.kubernetes.io/part-of: go-demo
spec:
  schedule: "*/1 * * * *"
  jobTemplate:
    spec:
      template:
        spec:
          restartPolicy: OnFailure
          containers:
          - name: hello
            image: alpine:latest
---
apiVersion: apps.openshift.io/v1
kind: DeploymentConfig
metadata:
  name: frontend
  namespace: dev
  labels:
    app.kubernetes.io/name: go-demo
    app.kubernetes.io/part-of: go-demo
spec:
  template:
    spec:
      containers:
      - name: frontend
        image: demo/demo-config:v5
"#;

fn labels(name: Option<&str>) -> BTreeMap<String, String> {
    let mut l = BTreeMap::new();
    if let Some(n) = name {
        l.insert(NAME_LABEL.to_string(), n.to_string());
    }
    l.insert(PART_OF_LABEL.to_string(), "go-demo".to_string());
    l
}

fn res(group: &str, version: &str, kind: &str, name: &str, ns: &str, svc: Option<&str>, images: &[&str]) -> Resource {
    Resource {
        group: group.into(),
        version: version.into(),
        kind: kind.into(),
        name: name.into(),
        namespace: ns.into(),
        labels: labels(svc),
        images: images.iter().map(|s| s.to_string()).collect(),
    }
}

#[test]
fn extracts_rendered_go_demo_in_output_order() {
    let objs = split_rendered(GO_DEMO).expect("split");
    let got = extract(&objs);
    let want = vec![
        res("", "v1", "ConfigMap", "go-demo-config", "", None, &[]),
        res("", "v1", "Service", "go-demo-http", "", Some("go-demo"), &[]),
        res("apps", "v1", "Deployment", "go-demo-http", "", Some("go-demo"), &["bigkevmcd/go-demo:876ecb3"]),
        res("apps", "v1", "Deployment", "redis", "", Some("redis"), &["redis:6-alpine"]),
        res("batch", "v1beta1", "CronJob", "hello", "", Some("go-demo"), &["alpine:latest"]),
        res("apps.openshift.io", "v1", "DeploymentConfig", "frontend", "dev", Some("go-demo"), &["demo/demo-config:v5"]),
    ];
    assert_eq!(got, want);
}

#[test]
fn malformed_workload_keeps_metadata() {
    let objs = vec![serde_json::json!({
        "apiVersion": "apps/v1",
        "kind": "Deployment",
        "metadata": { "name": "broken", "namespace": "dev", "labels": { "app.kubernetes.io/name": "broken" } },
        "spec": { "template": { "spec": { "containers": "not-a-list" } } }
    })];
    let got = extract(&objs);
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].name, "broken");
    assert_eq!(got[0].namespace, "dev");
    assert_eq!(got[0].label(NAME_LABEL), Some("broken"));
    assert!(got[0].images.is_empty());
}

#[test]
fn empty_input_yields_no_resources() {
    assert!(extract(&[]).is_empty());
}
