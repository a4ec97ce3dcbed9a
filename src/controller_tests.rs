// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for the controller wiring.

#[cfg(test)]
mod tests {
    use crate::controller::supervise_entry_watch;

    #[tokio::test]
    async fn test_ended_entry_watch_stops_controller() {
        let entry_watch = tokio::spawn(async {});
        let err = supervise_entry_watch("service-source", std::future::pending(), entry_watch)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("DNSEntry watch ended"));
    }

    #[tokio::test]
    async fn test_failed_entry_watch_stops_controller() {
        let entry_watch = tokio::spawn(async { panic!("watch failed") });
        let result =
            supervise_entry_watch("service-source", std::future::pending(), entry_watch).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_controller_end_is_ok() {
        let entry_watch = tokio::spawn(std::future::pending::<()>());
        supervise_entry_watch("service-source", async {}, entry_watch)
            .await
            .unwrap();
    }
}
