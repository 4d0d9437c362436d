//! Health/status breakdown of a live application's managed resources.

use gitdeck_core::{ResourceHealth, StatusBuckets, StatusRow};

/// Bucket managed resources by kind. Kinds outside the fixed set are dropped.
pub fn classify(resources: &[ResourceHealth]) -> StatusBuckets {
    let mut buckets = StatusBuckets::default();
    for r in resources {
        let bucket = match r.kind.as_str() {
            "Service" => &mut buckets.services,
            "Deployment" => &mut buckets.deployments,
            "Secret" | "SealedSecret" => &mut buckets.secrets,
            "Route" => &mut buckets.routes,
            "RoleBinding" => &mut buckets.role_bindings,
            "ClusterRole" => &mut buckets.cluster_roles,
            "ClusterRoleBinding" => &mut buckets.cluster_role_bindings,
            _ => continue,
        };
        bucket.push(StatusRow { name: r.name.clone(), health: r.health.clone(), status: r.status.clone() });
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rh(kind: &str, name: &str, health: &str, status: &str) -> ResourceHealth {
        ResourceHealth { kind: kind.into(), name: name.into(), namespace: "dev".into(), health: health.into(), status: status.into() }
    }

    #[test]
    fn buckets_known_kinds_and_drops_the_rest() {
        let b = classify(&[
            rh("Service", "taxi", "Healthy", "Synced"),
            rh("Deployment", "taxi", "Progressing", "OutOfSync"),
            rh("Secret", "creds", "", "Synced"),
            rh("SealedSecret", "sealed", "Healthy", "Synced"),
            rh("Route", "taxi", "", "Synced"),
            rh("RoleBinding", "rb", "", "Synced"),
            rh("ClusterRole", "cr", "", "Synced"),
            rh("ClusterRoleBinding", "crb", "", "Synced"),
            rh("ConfigMap", "cfg", "", "Synced"),
            rh("Namespace", "dev", "", "Synced"),
        ]);
        assert_eq!(b.services, vec![StatusRow { name: "taxi".into(), health: "Healthy".into(), status: "Synced".into() }]);
        assert_eq!(b.deployments[0].health, "Progressing");
        let secrets: Vec<_> = b.secrets.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(secrets, vec!["creds", "sealed"]);
        assert_eq!(b.routes.len(), 1);
        assert_eq!(b.role_bindings.len(), 1);
        assert_eq!(b.cluster_roles.len(), 1);
        assert_eq!(b.cluster_role_bindings.len(), 1);
        let total = b.services.len() + b.deployments.len() + b.secrets.len() + b.routes.len()
            + b.role_bindings.len() + b.cluster_roles.len() + b.cluster_role_bindings.len();
        assert_eq!(total, 8);
    }

    #[test]
    fn empty_input_gives_empty_buckets() {
        assert_eq!(classify(&[]), StatusBuckets::default());
    }
}
