// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for DNS class helpers and name normalization.

#[cfg(test)]
mod tests {
    use crate::dns::{
        class_source_finalizer, equivalent_class, is_default_class, normalize_class,
        normalize_domain_name,
    };

    #[test]
    fn test_normalize_class() {
        assert_eq!(normalize_class(""), "gardendns");
        assert_eq!(normalize_class("gardendns"), "gardendns");
        assert_eq!(normalize_class("other"), "other");
    }

    #[test]
    fn test_equivalent_class() {
        assert!(equivalent_class("", "gardendns"));
        assert!(equivalent_class("", ""));
        assert!(equivalent_class("foo", "foo"));
        assert!(!equivalent_class("", "foo"));
    }

    #[test]
    fn test_is_default_class() {
        assert!(is_default_class(""));
        assert!(is_default_class("gardendns"));
        assert!(!is_default_class("foo"));
    }

    #[test]
    fn test_class_source_finalizer() {
        assert_eq!(
            class_source_finalizer(&normalize_class(""), "service-dns"),
            "gardendns.dns.gardener.cloud/service-dns"
        );
        assert_eq!(
            class_source_finalizer("other", "ingress-dns"),
            "other.dns.gardener.cloud/ingress-dns"
        );
    }

    #[test]
    fn test_normalize_domain_name() {
        assert_eq!(normalize_domain_name("Example.COM."), "example.com");
        assert_eq!(normalize_domain_name("\\052.example.com"), "*.example.com");
        assert_eq!(normalize_domain_name("*.example.com."), "*.example.com");
        assert_eq!(normalize_domain_name("www.example.com"), "www.example.com");
    }
}
