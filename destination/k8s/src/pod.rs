use anyhow::{anyhow, Result};
use k8s_openapi::api::core::v1::Pod;
use kube::api::ResourceExt;
use linkerd_destination_core::{Labels, OwnerRef, Workload};

/// Set on pods that have been injected by a control plane, naming its namespace.
pub const CONTROL_PLANE_NS_LABEL: &str = "linkerd.io/control-plane-ns";

pub const IDENTITY_MODE_ANNOTATION: &str = "linkerd.io/identity-mode";

pub const POD_TEMPLATE_HASH_LABEL: &str = "pod-template-hash";

/// Builds the workload record for an endpoint backed by `pod`.
///
/// `owner` is the pod's top-level controller (e.g. a `Deployment` rather than its `ReplicaSet`),
/// as resolved by the caller.
pub fn workload(pod: &Pod, owner: Option<OwnerRef>) -> Result<Workload> {
    let name = pod
        .metadata
        .name
        .clone()
        .ok_or_else(|| anyhow!("pod missing name"))?;
    let namespace = pod
        .metadata
        .namespace
        .clone()
        .ok_or_else(|| anyhow!("pod {name} missing namespace"))?;
    let service_account = pod
        .spec
        .as_ref()
        .and_then(|spec| spec.service_account_name.clone())
        .unwrap_or_default();

    let control_plane_ns = pod
        .labels()
        .get(CONTROL_PLANE_NS_LABEL)
        .filter(|ns| !ns.is_empty())
        .cloned();
    let identity_mode = pod.annotations().get(IDENTITY_MODE_ANNOTATION).cloned();

    let mut labels = Labels::new();
    labels.insert("pod".to_string(), name.clone());
    if let Some(OwnerRef {
        kind,
        name: owner_name,
    }) = owner.as_ref()
    {
        labels.insert(owner_label(kind), owner_name.clone());
    }
    labels.insert("serviceaccount".to_string(), service_account.clone());
    if let Some(ns) = control_plane_ns.as_ref() {
        labels.insert("control_plane_ns".to_string(), ns.clone());
    }
    if let Some(hash) = pod
        .labels()
        .get(POD_TEMPLATE_HASH_LABEL)
        .filter(|h| !h.is_empty())
    {
        labels.insert("pod_template_hash".to_string(), hash.clone());
    }

    Ok(Workload {
        name,
        namespace,
        service_account,
        owner,
        control_plane_ns,
        identity_mode,
        labels,
    })
}

/// Metric label under which a workload's owner is named.
///
/// `job` collides with Prometheus' own label, so it is prefixed.
fn owner_label(kind: &str) -> String {
    if kind.eq_ignore_ascii_case("job") {
        return "k8s_job".to_string();
    }
    kind.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::PodSpec;
    use kube::api::ObjectMeta;
    use linkerd_destination_core::IDENTITY_MODE_DEFAULT;
    use maplit::btreemap;

    fn mk_pod(
        labels: std::collections::BTreeMap<String, String>,
        annotations: std::collections::BTreeMap<String, String>,
    ) -> Pod {
        Pod {
            metadata: ObjectMeta {
                namespace: Some("emojivoto".to_string()),
                name: Some("web-5f7b9c8d4-x2x7q".to_string()),
                labels: Some(labels),
                annotations: Some(annotations),
                ..Default::default()
            },
            spec: Some(PodSpec {
                service_account_name: Some("web".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn meshed_pod() {
        let pod = mk_pod(
            btreemap! {
                CONTROL_PLANE_NS_LABEL.to_string() => "linkerd".to_string(),
                POD_TEMPLATE_HASH_LABEL.to_string() => "5f7b9c8d4".to_string(),
                "app".to_string() => "web".to_string(),
            },
            btreemap! {
                IDENTITY_MODE_ANNOTATION.to_string() => IDENTITY_MODE_DEFAULT.to_string(),
            },
        );
        let owner = OwnerRef {
            kind: "Deployment".to_string(),
            name: "web".to_string(),
        };

        let wl = workload(&pod, Some(owner.clone())).expect("pod must convert");
        assert_eq!(wl.name, "web-5f7b9c8d4-x2x7q");
        assert_eq!(wl.namespace, "emojivoto");
        assert_eq!(wl.service_account, "web");
        assert_eq!(wl.owner, Some(owner));
        assert_eq!(wl.control_plane_ns.as_deref(), Some("linkerd"));
        assert_eq!(wl.identity_mode.as_deref(), Some(IDENTITY_MODE_DEFAULT));
        assert_eq!(
            wl.labels,
            btreemap! {
                "pod".to_string() => "web-5f7b9c8d4-x2x7q".to_string(),
                "deployment".to_string() => "web".to_string(),
                "serviceaccount".to_string() => "web".to_string(),
                "control_plane_ns".to_string() => "linkerd".to_string(),
                "pod_template_hash".to_string() => "5f7b9c8d4".to_string(),
            }
        );
    }

    #[test]
    fn unmeshed_pod() {
        let pod = mk_pod(
            btreemap! { "app".to_string() => "web".to_string() },
            Default::default(),
        );

        let wl = workload(&pod, None).expect("pod must convert");
        assert_eq!(wl.control_plane_ns, None);
        assert_eq!(wl.identity_mode, None);
        assert_eq!(
            wl.labels,
            btreemap! {
                "pod".to_string() => "web-5f7b9c8d4-x2x7q".to_string(),
                "serviceaccount".to_string() => "web".to_string(),
            }
        );
    }

    #[test]
    fn job_owner() {
        let pod = mk_pod(Default::default(), Default::default());
        let owner = OwnerRef {
            kind: "Job".to_string(),
            name: "migrate".to_string(),
        };

        let wl = workload(&pod, Some(owner)).expect("pod must convert");
        assert_eq!(wl.labels.get("k8s_job").map(String::as_str), Some("migrate"));
        assert!(!wl.labels.contains_key("job"));
    }

    #[test]
    fn empty_control_plane_label() {
        let pod = mk_pod(
            btreemap! { CONTROL_PLANE_NS_LABEL.to_string() => String::new() },
            Default::default(),
        );

        let wl = workload(&pod, None).expect("pod must convert");
        assert_eq!(wl.control_plane_ns, None);
        assert!(!wl.labels.contains_key("control_plane_ns"));
    }

    #[test]
    fn requires_namespace() {
        let mut pod = mk_pod(Default::default(), Default::default());
        pod.metadata.namespace = None;
        assert!(workload(&pod, None).is_err());

        let mut pod = mk_pod(Default::default(), Default::default());
        pod.metadata.name = None;
        assert!(workload(&pod, None).is_err());
    }
}
