// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `ingress.rs`

#[cfg(test)]
mod tests {
    use crate::config::SourceControllerConfig;
    use crate::labels::{ANNOTATION_CLASS, ANNOTATION_DNS_NAMES};
    use crate::reconcilers::ingress::IngressActuator;
    use crate::reconcilers::source::SourceActuator;
    use crate::reconcilers::test_support::{ingress, Harness};
    use crate::store::ObjectStore;
    use k8s_openapi::api::networking::v1::Ingress;
    use std::sync::Arc;

    fn harness(config: SourceControllerConfig) -> Harness<Ingress> {
        Harness::new(Arc::new(IngressActuator), config)
    }

    #[test]
    fn test_actuator_identity() {
        let actuator = IngressActuator;
        assert_eq!(actuator.controller_name(), "ingress-source");
        assert_eq!(actuator.finalizer_local_name(), "ingress-dns");
        assert_eq!(actuator.gvk().group, "networking.k8s.io");
        assert_eq!(actuator.gvk().kind, "Ingress");
    }

    #[test]
    fn test_relevance_follows_class() {
        let h = harness(SourceControllerConfig {
            source_class: Some("internal".to_string()),
            ..Default::default()
        });
        let matching = ingress(
            "web",
            &[(ANNOTATION_DNS_NAMES, "*"), (ANNOTATION_CLASS, "internal")],
            &["a.example.com"],
            "192.0.2.1",
        );
        assert!(h.reconciler.is_relevant(&matching));

        let default_class = ingress(
            "web",
            &[(ANNOTATION_DNS_NAMES, "*")],
            &["a.example.com"],
            "192.0.2.1",
        );
        assert!(!h.reconciler.is_relevant(&default_class));
    }

    #[tokio::test]
    async fn test_wildcard_expands_to_rule_hosts() {
        let h = harness(SourceControllerConfig::default());
        h.sources
            .insert(ingress(
                "web",
                &[(ANNOTATION_DNS_NAMES, "*")],
                &["a.example.com", "b.example.com"],
                "192.0.2.1",
            ))
            .unwrap();

        h.reconcile("web").await.unwrap();

        let entries = h.entries();
        let mut names: Vec<&str> = entries.iter().map(|e| e.spec.dns_name.as_str()).collect();
        names.sort_unstable();
        assert_eq!(names, vec!["a.example.com", "b.example.com"]);
        assert!(entries
            .iter()
            .all(|e| e.spec.targets == vec!["192.0.2.1".to_string()]));
        assert!(entries
            .iter()
            .all(|e| e.metadata.generate_name.as_deref() == Some("web-ingress-")));
        assert_eq!(h.events.reasons(), vec!["DNSEntryCreated", "DNSEntryCreated"]);
    }

    #[tokio::test]
    async fn test_undeclared_name_is_invalid() {
        let h = harness(SourceControllerConfig::default());
        h.sources
            .insert(ingress(
                "web",
                &[(ANNOTATION_DNS_NAMES, "a.example.com,c.example.com")],
                &["a.example.com", "b.example.com"],
                "192.0.2.1",
            ))
            .unwrap();

        let err = h.reconcile("web").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "annotated dns names c.example.com not declared by ingress"
        );
        assert!(h.entries().is_empty());
        assert_eq!(h.events.reasons(), vec!["Invalid"]);
    }

    #[tokio::test]
    async fn test_removed_rule_host_deletes_entry() {
        let h = harness(SourceControllerConfig::default());
        h.sources
            .insert(ingress(
                "web",
                &[(ANNOTATION_DNS_NAMES, "*")],
                &["a.example.com", "b.example.com"],
                "192.0.2.1",
            ))
            .unwrap();
        h.reconcile("web").await.unwrap();

        let mut updated = h.source("web").await.unwrap();
        let rules = updated.spec.as_mut().and_then(|s| s.rules.as_mut()).unwrap();
        rules.retain(|r| r.host.as_deref() == Some("a.example.com"));
        h.sources.update(&updated).await.unwrap();
        h.reconcile("web").await.unwrap();

        let entries = h.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].spec.dns_name, "a.example.com");
    }
}
