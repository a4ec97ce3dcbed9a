// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for desired state extraction.

#[cfg(test)]
mod tests {
    use crate::config::SourceControllerConfig;
    use crate::crd::{DNSEntry, DNSEntrySpec, ResourceReference};
    use crate::dns_errors::SpecInputError;
    use crate::labels::{
        ANNOTATION_AWS_LOAD_BALANCER_IP_ADDRESS_TYPE, ANNOTATION_CLASS,
        ANNOTATION_CNAME_LOOKUP_INTERVAL, ANNOTATION_DNS_NAMES, ANNOTATION_HARD_IGNORE,
        ANNOTATION_IGNORE, ANNOTATION_IP_STACK, ANNOTATION_OPENSTACK_LOAD_BALANCER_ADDRESS,
        ANNOTATION_RESOLVE_TARGETS_TO_ADDRESSES, ANNOTATION_ROUTING_POLICY, ANNOTATION_TTL,
        IP_STACK_DUAL_STACK, IP_STACK_IPV4, IP_STACK_IPV6,
    };
    use crate::source::spec_input::{
        augment, build_resource_reference, dns_names_from_annotations, dnsentry_spec_input,
        ingress_spec_input, merged_annotations, modify_entry_for, service_spec_input,
        IgnoreMode,
    };
    use crate::source::DNSSpecInput;
    use crate::state::AnnotationState;
    use crate::store::ObjectKey;
    use k8s_openapi::api::core::v1::{
        LoadBalancerIngress, LoadBalancerStatus, Service, ServiceSpec, ServiceStatus,
    };
    use k8s_openapi::api::networking::v1::{
        Ingress, IngressLoadBalancerIngress, IngressLoadBalancerStatus, IngressRule, IngressSpec,
        IngressStatus,
    };
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use kube::core::GroupVersionKind;
    use std::collections::BTreeMap;

    fn annotations(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn service(lb: Vec<LoadBalancerIngress>) -> Service {
        Service {
            metadata: ObjectMeta {
                name: Some("lb".to_string()),
                namespace: Some("default".to_string()),
                ..Default::default()
            },
            spec: Some(ServiceSpec {
                type_: Some("LoadBalancer".to_string()),
                ..Default::default()
            }),
            status: Some(ServiceStatus {
                load_balancer: Some(LoadBalancerStatus { ingress: Some(lb) }),
                ..Default::default()
            }),
        }
    }

    fn lb_ip(ip: &str) -> LoadBalancerIngress {
        LoadBalancerIngress {
            ip: Some(ip.to_string()),
            ..Default::default()
        }
    }

    fn lb_hostname(hostname: &str) -> LoadBalancerIngress {
        LoadBalancerIngress {
            hostname: Some(hostname.to_string()),
            ..Default::default()
        }
    }

    fn ingress(hosts: &[&str], lb: Vec<IngressLoadBalancerIngress>) -> Ingress {
        Ingress {
            metadata: ObjectMeta {
                name: Some("web".to_string()),
                namespace: Some("default".to_string()),
                ..Default::default()
            },
            spec: Some(IngressSpec {
                rules: Some(
                    hosts
                        .iter()
                        .map(|h| IngressRule {
                            host: Some((*h).to_string()),
                            http: None,
                        })
                        .collect(),
                ),
                ..Default::default()
            }),
            status: Some(IngressStatus {
                load_balancer: Some(IngressLoadBalancerStatus { ingress: Some(lb) }),
            }),
        }
    }

    fn ing_lb(ip: Option<&str>, hostname: Option<&str>) -> IngressLoadBalancerIngress {
        IngressLoadBalancerIngress {
            ip: ip.map(str::to_string),
            hostname: hostname.map(str::to_string),
            ports: None,
        }
    }

    #[test]
    fn test_dns_names_absent_and_empty() {
        assert!(dns_names_from_annotations(&BTreeMap::new()).unwrap().is_none());

        let err = dns_names_from_annotations(&annotations(&[(ANNOTATION_DNS_NAMES, "")]))
            .unwrap_err();
        assert!(matches!(err, SpecInputError::EmptyAnnotation { .. }));
        assert_eq!(
            err.to_string(),
            "empty value for annotation \"dns.gardener.cloud/dnsnames\""
        );
    }

    #[test]
    fn test_dns_names_split_and_trim() {
        let names = dns_names_from_annotations(&annotations(&[(
            ANNOTATION_DNS_NAMES,
            " b.example.com, a.example.com,,b.example.com ",
        )]))
        .unwrap()
        .unwrap();
        assert_eq!(names.to_vec(), vec!["a.example.com", "b.example.com"]);
    }

    #[test]
    fn test_augment_ttl_zero_is_unset() {
        let with_zero = augment(
            &annotations(&[(ANNOTATION_TTL, "0"), (ANNOTATION_CNAME_LOOKUP_INTERVAL, "0")]),
            DNSSpecInput::default(),
        )
        .unwrap();
        let without = augment(
            &annotations(&[(ANNOTATION_IP_STACK, "ipv4")]),
            DNSSpecInput::default(),
        )
        .unwrap();
        assert_eq!(with_zero.ttl, None);
        assert_eq!(with_zero.cname_lookup_interval, None);
        assert_eq!(without.ttl, None);
        assert!(without.ip_stack.is_empty());
        assert_eq!(with_zero, without);
    }

    #[test]
    fn test_augment_all_annotations() {
        let input = augment(
            &annotations(&[
                (ANNOTATION_TTL, "123"),
                (ANNOTATION_CNAME_LOOKUP_INTERVAL, "600"),
                (ANNOTATION_IGNORE, "true"),
                (ANNOTATION_RESOLVE_TARGETS_TO_ADDRESSES, "true"),
                (
                    ANNOTATION_ROUTING_POLICY,
                    r#"{"type":"weighted","setIdentifier":"a","parameters":{"weight":"10"}}"#,
                ),
            ]),
            DNSSpecInput::default(),
        )
        .unwrap();
        assert_eq!(input.ttl, Some(123));
        assert_eq!(input.cname_lookup_interval, Some(600));
        assert_eq!(input.ignore, "true");
        assert_eq!(input.ignore_mode(), Some(IgnoreMode::Reconcile));
        assert_eq!(input.resolve_targets_to_addresses, Some(true));
        let policy = input.routing_policy.unwrap();
        assert_eq!(policy.type_, "weighted");
        assert_eq!(policy.set_identifier, "a");
        assert_eq!(policy.parameters.get("weight").map(String::as_str), Some("10"));
    }

    #[test]
    fn test_augment_resolve_false() {
        let input = augment(
            &annotations(&[(ANNOTATION_RESOLVE_TARGETS_TO_ADDRESSES, "yes")]),
            DNSSpecInput::default(),
        )
        .unwrap();
        assert_eq!(input.resolve_targets_to_addresses, Some(false));
    }

    #[test]
    fn test_augment_errors() {
        let err = augment(&annotations(&[(ANNOTATION_TTL, "abc")]), DNSSpecInput::default())
            .unwrap_err();
        assert!(err.to_string().starts_with("invalid TTL: "));

        let err = augment(
            &annotations(&[(ANNOTATION_CNAME_LOOKUP_INTERVAL, "x")]),
            DNSSpecInput::default(),
        )
        .unwrap_err();
        assert!(err.to_string().starts_with("invalid CNameLookupInterval"));

        let err = augment(
            &annotations(&[(ANNOTATION_ROUTING_POLICY, "{not json")]),
            DNSSpecInput::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SpecInputError::InvalidRoutingPolicy { .. }));
    }

    #[test]
    fn test_ignore_mode_parse() {
        assert_eq!(IgnoreMode::parse("true"), Some(IgnoreMode::Reconcile));
        assert_eq!(IgnoreMode::parse("reconcile"), Some(IgnoreMode::Reconcile));
        assert_eq!(IgnoreMode::parse("full"), Some(IgnoreMode::Full));
        assert_eq!(IgnoreMode::parse("false"), None);
        assert_eq!(IgnoreMode::parse(""), None);
    }

    #[test]
    fn test_service_ip_targets() {
        let svc = service(vec![lb_ip("1.2.3.4")]);
        let input = service_spec_input(
            &svc,
            &annotations(&[(ANNOTATION_DNS_NAMES, "foo.example.com"), (ANNOTATION_TTL, "300")]),
        )
        .unwrap()
        .unwrap();
        assert_eq!(input.names.to_vec(), vec!["foo.example.com"]);
        assert_eq!(input.targets.to_vec(), vec!["1.2.3.4"]);
        assert_eq!(input.ttl, Some(300));
        assert_eq!(input.ip_stack, "");
    }

    #[test]
    fn test_service_hostname_targets() {
        let svc = service(vec![lb_hostname("lb.cloud.example")]);
        let names = (ANNOTATION_DNS_NAMES, "foo.example.com");

        let input = service_spec_input(&svc, &annotations(&[names]))
            .unwrap()
            .unwrap();
        assert_eq!(input.targets.to_vec(), vec!["lb.cloud.example"]);

        let input = service_spec_input(
            &svc,
            &annotations(&[names, (ANNOTATION_OPENSTACK_LOAD_BALANCER_ADDRESS, "10.0.0.1")]),
        )
        .unwrap()
        .unwrap();
        assert_eq!(input.targets.to_vec(), vec!["10.0.0.1"]);
    }

    #[test]
    fn test_service_without_names_is_irrelevant() {
        let svc = service(vec![lb_ip("1.2.3.4")]);
        assert!(service_spec_input(&svc, &BTreeMap::new()).unwrap().is_none());
    }

    #[test]
    fn test_service_rejects_wildcard() {
        let svc = service(vec![lb_ip("1.2.3.4")]);
        let err = service_spec_input(&svc, &annotations(&[(ANNOTATION_DNS_NAMES, "*")]))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "domain name annotation value '*' is not allowed for service objects"
        );
    }

    #[test]
    fn test_service_ip_stack() {
        let svc = service(vec![lb_ip("1.2.3.4")]);
        let names = (ANNOTATION_DNS_NAMES, "foo.example.com");

        let input = service_spec_input(&svc, &annotations(&[names, (ANNOTATION_IP_STACK, "ipv6")]))
            .unwrap()
            .unwrap();
        assert_eq!(input.ip_stack, IP_STACK_IPV6);

        let input = service_spec_input(
            &svc,
            &annotations(&[
                names,
                (ANNOTATION_IP_STACK, "ipv4"),
                (ANNOTATION_AWS_LOAD_BALANCER_IP_ADDRESS_TYPE, "dualstack"),
            ]),
        )
        .unwrap()
        .unwrap();
        assert_eq!(input.ip_stack, IP_STACK_DUAL_STACK);
    }

    #[test]
    fn test_ingress_wildcard_expands_to_rule_hosts() {
        let ing = ingress(
            &["example.com", "gardener.cloud", "wikipedia.org", ""],
            vec![ing_lb(Some("1.2.3.4"), None)],
        );
        let input = ingress_spec_input(&ing, &annotations(&[(ANNOTATION_DNS_NAMES, "*")]))
            .unwrap()
            .unwrap();
        assert_eq!(
            input.names.to_vec(),
            vec!["example.com", "gardener.cloud", "wikipedia.org"]
        );
    }

    #[test]
    fn test_ingress_subset_of_rule_hosts() {
        let ing = ingress(&["example.com", "gardener.cloud"], vec![]);
        let input = ingress_spec_input(
            &ing,
            &annotations(&[(ANNOTATION_DNS_NAMES, "gardener.cloud")]),
        )
        .unwrap()
        .unwrap();
        assert_eq!(input.names.to_vec(), vec!["gardener.cloud"]);
        assert!(input.targets.is_empty());
    }

    #[test]
    fn test_ingress_undeclared_names() {
        let ing = ingress(&["example.com"], vec![]);
        let err = ingress_spec_input(
            &ing,
            &annotations(&[(ANNOTATION_DNS_NAMES, "example.com,notfound.com")]),
        )
        .unwrap_err();
        assert!(matches!(err, SpecInputError::UndeclaredNames { .. }));
        assert_eq!(
            err.to_string(),
            "annotated dns names notfound.com not declared by ingress"
        );
    }

    #[test]
    fn test_ingress_targets_prefer_ips() {
        let ing = ingress(
            &["example.com"],
            vec![
                ing_lb(None, Some("lb.cloud.example")),
                ing_lb(Some("1.2.3.4"), None),
                ing_lb(Some("5.6.7.8"), Some("lb2.cloud.example")),
            ],
        );
        let names = annotations(&[(ANNOTATION_DNS_NAMES, "*")]);
        let input = ingress_spec_input(&ing, &names).unwrap().unwrap();
        assert_eq!(input.targets.to_vec(), vec!["1.2.3.4", "5.6.7.8"]);

        let ing = ingress(&["example.com"], vec![ing_lb(None, Some("lb.cloud.example"))]);
        let input = ingress_spec_input(&ing, &names).unwrap().unwrap();
        assert_eq!(input.targets.to_vec(), vec!["lb.cloud.example"]);
    }

    #[test]
    fn test_dnsentry_spec_input() {
        let mut entry = DNSEntry::new(
            "src",
            DNSEntrySpec {
                dns_name: "a.example.com".to_string(),
                targets: vec!["1.2.3.4".to_string()],
                ttl: Some(120),
                ..Default::default()
            },
        );
        let input = dnsentry_spec_input(
            &entry,
            &annotations(&[(ANNOTATION_IP_STACK, "ipv4"), (ANNOTATION_IGNORE, "full")]),
        )
        .unwrap();
        assert_eq!(input.names.to_vec(), vec!["a.example.com"]);
        assert_eq!(input.targets.to_vec(), vec!["1.2.3.4"]);
        assert_eq!(input.ttl, Some(120));
        assert_eq!(input.ip_stack, IP_STACK_IPV4);
        assert_eq!(input.ignore_mode(), Some(IgnoreMode::Full));

        entry.spec.dns_name = String::new();
        assert!(dnsentry_spec_input(&entry, &BTreeMap::new()).is_none());
    }

    #[test]
    fn test_build_resource_reference() {
        let svc = service(vec![]);
        let r = build_resource_reference(&GroupVersionKind::gvk("", "v1", "Service"), &svc);
        assert_eq!(
            r,
            ResourceReference {
                api_version: "v1".to_string(),
                kind: "Service".to_string(),
                name: "lb".to_string(),
                namespace: "default".to_string(),
            }
        );
    }

    #[test]
    fn test_merged_annotations_object_wins() {
        let gvk = GroupVersionKind::gvk("", "v1", "Service");
        let mut svc = service(vec![]);
        svc.metadata.annotations = Some(annotations(&[(ANNOTATION_TTL, "60")]));

        let state = AnnotationState::default();
        state
            .set_resource_annotations(
                &build_resource_reference(&gvk, &svc),
                &ObjectKey::new("default", "annot"),
                annotations(&[(ANNOTATION_TTL, "30"), (ANNOTATION_DNS_NAMES, "x.example.com")]),
            )
            .unwrap();

        let merged = merged_annotations(&state, &gvk, &svc);
        assert_eq!(merged.get(ANNOTATION_TTL).map(String::as_str), Some("60"));
        assert_eq!(
            merged.get(ANNOTATION_DNS_NAMES).map(String::as_str),
            Some("x.example.com")
        );
    }

    fn input_for(pairs: &[(&str, &str)]) -> DNSSpecInput {
        let mut a = annotations(pairs);
        a.insert(ANNOTATION_DNS_NAMES.to_string(), "a.example.com".to_string());
        service_spec_input(&service(vec![lb_ip("1.2.3.4"), lb_ip("1.2.3.3")]), &a)
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_modify_entry_for() {
        let config = SourceControllerConfig {
            target_class: Some("internal".to_string()),
            target_labels: BTreeMap::from([("app".to_string(), "dns".to_string())]),
            ..Default::default()
        };
        let input = input_for(&[
            (ANNOTATION_TTL, "300"),
            (ANNOTATION_IP_STACK, "dual-stack"),
            (ANNOTATION_IGNORE, "true"),
        ]);
        let mut entry = DNSEntry::new("", DNSEntrySpec::default());
        modify_entry_for(&mut entry, &config, &input, "a.example.com");

        assert_eq!(entry.spec.dns_name, "a.example.com");
        assert_eq!(entry.spec.targets, vec!["1.2.3.3", "1.2.3.4"]);
        assert_eq!(entry.spec.ttl, Some(300));
        let a = entry.metadata.annotations.as_ref().unwrap();
        assert_eq!(a.get(ANNOTATION_CLASS).map(String::as_str), Some("internal"));
        assert_eq!(a.get(ANNOTATION_IP_STACK).map(String::as_str), Some("dual-stack"));
        assert_eq!(a.get(ANNOTATION_IGNORE).map(String::as_str), Some("reconcile"));
        assert_eq!(
            entry
                .metadata
                .labels
                .as_ref()
                .and_then(|l| l.get("app"))
                .map(String::as_str),
            Some("dns")
        );

        let before = entry.clone();
        modify_entry_for(&mut entry, &config, &input, "a.example.com");
        assert_eq!(before, entry);
    }

    #[test]
    fn test_modify_entry_for_default_class_and_ignore_removal() {
        let config = SourceControllerConfig::default();
        let mut entry = DNSEntry::new("", DNSEntrySpec::default());
        entry.metadata.annotations = Some(annotations(&[
            (ANNOTATION_IGNORE, "full"),
            (ANNOTATION_HARD_IGNORE, "true"),
        ]));

        modify_entry_for(&mut entry, &config, &input_for(&[]), "a.example.com");
        let a = entry.metadata.annotations.as_ref().unwrap();
        assert!(!a.contains_key(ANNOTATION_CLASS));
        assert!(!a.contains_key(ANNOTATION_IGNORE));
        assert_eq!(a.get(ANNOTATION_HARD_IGNORE).map(String::as_str), Some("true"));
        assert!(entry.metadata.labels.is_none());
    }

    #[test]
    fn test_modify_entry_for_without_annotations_stays_bare() {
        let mut entry = DNSEntry::new("", DNSEntrySpec::default());
        modify_entry_for(
            &mut entry,
            &SourceControllerConfig::default(),
            &input_for(&[]),
            "a.example.com",
        );
        assert!(entry.metadata.annotations.is_none());
    }
}
