// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Tests for DNS sets and set names.

#[cfg(test)]
mod tests {
    use crate::crd;
    use crate::dns::{
        DNSSet, DNSSetName, DNSSets, RecordSet, RecordType, RoutingPolicy, RoutingPolicyType,
    };

    fn weighted() -> Option<RoutingPolicy> {
        Some(RoutingPolicy::new(RoutingPolicyType::Weighted, &[]))
    }

    #[test]
    fn test_name_is_normalized() {
        let name = DNSSetName::new("\\052.Example.COM.");
        assert_eq!(name.dns_name, "*.example.com");
        assert_eq!(name.to_string(), "*.example.com");

        let raw = DNSSetName {
            dns_name: "WWW.example.com.".to_string(),
            set_identifier: "blue".to_string(),
        };
        let normalized = raw.normalize();
        assert_eq!(normalized.dns_name, "www.example.com");
        assert_eq!(normalized.set_identifier, "blue");
        assert_eq!(normalized.to_string(), "www.example.com#blue");
    }

    #[test]
    fn test_name_for_entry_uses_set_identifier() {
        let policy = crd::RoutingPolicy {
            type_: "weighted".to_string(),
            set_identifier: "eu".to_string(),
            ..Default::default()
        };
        let name = DNSSetName::for_entry("www.example.com", Some(&policy));
        assert_eq!(name.set_identifier, "eu");
        assert_eq!(DNSSetName::for_entry("www.example.com", None).set_identifier, "");
    }

    #[test]
    fn test_set_record_set() {
        let mut set = DNSSet::new(&DNSSetName::new("example.com"), None);
        set.set_record_set(RecordType::A, 300, &["1.2.3.4", "5.6.7.8"]);
        set.set_record_set(RecordType::AAAA, 100, &["::1"]);

        let a = &set.sets[&RecordType::A];
        assert_eq!(a.ttl, 300);
        assert_eq!(a.records.len(), 2);
        assert_eq!(a.records[0].value, "1.2.3.4");
        assert_eq!(a.records[1].value, "5.6.7.8");
        assert_eq!(set.sets[&RecordType::AAAA].ttl, 100);
    }

    #[test]
    fn test_clone_matches() {
        let mut set = DNSSet::new(&DNSSetName::new("example.com"), weighted());
        set.update_group = "group1".to_string();
        set.set_record_set(RecordType::A, 300, &["1.2.3.4"]);
        set.set_record_set(RecordType::TXT, 300, &["v=spf1 include:_spf.example.com ~all"]);

        let other = set.clone();
        assert_eq!(other, set);
        assert!(set.matches(&other));
        assert!(set.match_record_type_subset(&other, RecordType::A));
        assert!(set.match_record_type_subset(&other, RecordType::TXT));
        assert!(set.match_record_type_subset(&other, RecordType::CNAME));
    }

    #[test]
    fn test_match_detects_differences() {
        let mut set = DNSSet::new(&DNSSetName::new("example.com"), None);
        set.set_record_set(RecordType::A, 300, &["1.2.3.4"]);
        set.set_record_set(RecordType::TXT, 300, &["hello"]);

        let mut other = set.clone();
        other.set_record_set(RecordType::TXT, 300, &["bye"]);
        assert!(!set.matches(&other));
        assert!(set.match_record_type_subset(&other, RecordType::A));
        assert!(!set.match_record_type_subset(&other, RecordType::TXT));

        let mut fewer = set.clone();
        fewer.sets.remove(&RecordType::TXT);
        assert!(!set.matches(&fewer));
        assert!(!set.match_record_type_subset(&fewer, RecordType::TXT));

        let mut renamed = set.clone();
        renamed.name = DNSSetName::new("www.example.com");
        assert!(!set.matches(&renamed));
    }

    #[test]
    fn test_add_record_set() {
        let mut sets = DNSSets::new();
        let name = DNSSetName::new("example.com");
        let record_set = RecordSet::from_values(RecordType::A, 300, &["1.2.3.4"]);
        let update = RecordSet::from_values(RecordType::A, 301, &["1.2.3.4", "5.6.7.8"]);

        sets.add_record_set(&name, weighted(), record_set.clone());
        sets.add_record_set(&name, weighted(), update.clone());

        let name2 = DNSSetName::new("www.example.com");
        sets.add_record_set(&name2, None, record_set.clone());

        assert_eq!(sets[&name].sets[&RecordType::A], update);
        assert_eq!(sets[&name].routing_policy, weighted());
        assert_eq!(sets[&name2].sets[&RecordType::A], record_set);
        assert_eq!(sets[&name2].routing_policy, None);
    }

    #[test]
    fn test_add_record_set_normalizes() {
        let mut sets = DNSSets::new();
        sets.add_record_set(
            &DNSSetName {
                dns_name: "WWW.Example.com.".to_string(),
                set_identifier: String::new(),
            },
            None,
            RecordSet::from_values(RecordType::CNAME, 300, &["LB.Example.com."]),
        );

        let name = DNSSetName::new("www.example.com");
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[&name].name, name);
        assert_eq!(sets[&name].sets[&RecordType::CNAME].records[0].value, "lb.example.com");
    }

    #[test]
    fn test_remove_record_set_drops_empty_set() {
        let mut sets = DNSSets::new();
        let name = DNSSetName::new("example.com");
        sets.add_record_set(
            &name,
            weighted(),
            RecordSet::from_values(RecordType::A, 300, &["1.2.3.4"]),
        );
        sets.add_record_set(
            &name,
            weighted(),
            RecordSet::from_values(RecordType::TXT, 300, &["hello"]),
        );

        sets.remove_record_set(&name, RecordType::A);
        assert!(sets.contains_key(&name));

        sets.remove_record_set(&name, RecordType::TXT);
        assert!(!sets.contains_key(&name));

        // removing from an unknown name is a no-op
        sets.remove_record_set(&DNSSetName::new("other.com"), RecordType::A);
        assert!(sets.is_empty());
    }

    #[test]
    fn test_clone_dnssets() {
        let mut sets = DNSSets::new();
        sets.add_record_set(
            &DNSSetName::new("example.com"),
            weighted(),
            RecordSet::from_values(RecordType::A, 300, &["1.2.3.4"]),
        );
        let clone = sets.clone();
        assert_eq!(clone, sets);
    }
}
