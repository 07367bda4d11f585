#[cfg(test)]
mod test {

    use std::sync::Arc;
    use std::time::Duration;

    use crate::cache::token_store::{TokenStore, TokenStoreSettings};
    use crate::tests::common::{test_credentials, token_store, CountingIssuer};

    #[tokio::test]
    async fn second_call_within_window_is_served_from_cache() {
        let issuer = CountingIssuer::new(3600);
        let store = token_store(issuer.clone());

        let first = store.get_valid_token().await.unwrap();
        let second = store.get_valid_token().await.unwrap();

        assert_eq!(first, "token-1");
        assert_eq!(first, second);
        assert_eq!(issuer.calls(), 1);
        assert!(store.is_token_valid().await);
    }

    #[tokio::test(start_paused = true)]
    async fn token_is_refreshed_once_safety_margin_is_reached() {
        let issuer = CountingIssuer::new(3600);
        let store = token_store(issuer.clone());

        assert_eq!(store.get_valid_token().await.unwrap(), "token-1");

        // still inside expires_in - 60s
        tokio::time::advance(Duration::from_secs(3539)).await;
        assert_eq!(store.get_valid_token().await.unwrap(), "token-1");
        assert_eq!(issuer.calls(), 1);

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(!store.is_token_valid().await);
        assert_eq!(store.get_valid_token().await.unwrap(), "token-2");
        assert_eq!(issuer.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn short_lifetime_falls_back_to_five_minutes() {
        let issuer = CountingIssuer::new(30);
        let store = token_store(issuer.clone());

        store.get_valid_token().await.unwrap();
        tokio::time::advance(Duration::from_secs(299)).await;
        assert!(store.is_token_valid().await);
        assert_eq!(store.get_valid_token().await.unwrap(), "token-1");

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(store.get_valid_token().await.unwrap(), "token-2");
    }

    #[tokio::test(start_paused = true)]
    async fn custom_margin_is_honoured() {
        let issuer = CountingIssuer::new(120);
        let settings = TokenStoreSettings {
            safety_margin: Duration::from_secs(100),
            fallback_validity: Duration::from_secs(10),
        };
        let store = TokenStore::new(issuer.clone(), test_credentials(), settings);

        store.get_valid_token().await.unwrap();
        tokio::time::advance(Duration::from_secs(21)).await;
        store.get_valid_token().await.unwrap();
        assert_eq!(issuer.calls(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_callers_share_a_single_refresh() {
        let issuer = CountingIssuer::new(3600).with_delay(Duration::from_millis(100));
        let store = Arc::new(token_store(issuer.clone()));

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.get_valid_token().await })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "token-1");
        }
        assert_eq!(issuer.calls(), 1);
    }

    #[tokio::test]
    async fn clear_forces_refresh() {
        let issuer = CountingIssuer::new(3600);
        let store = token_store(issuer.clone());

        store.get_valid_token().await.unwrap();
        store.clear_token().await;
        assert!(!store.is_token_valid().await);
        assert!(!store.token_info().await.has_token);

        assert_eq!(store.get_valid_token().await.unwrap(), "token-2");
        assert_eq!(issuer.calls(), 2);
    }

    #[tokio::test]
    async fn conditional_clear_keeps_a_replaced_token() {
        let issuer = CountingIssuer::new(3600);
        let store = token_store(issuer.clone());

        assert!(!store.clear_token_if("token-1").await, "nothing cached yet");
        store.get_valid_token().await.unwrap();
        assert!(store.clear_token_if("token-1").await);
        assert_eq!(store.get_valid_token().await.unwrap(), "token-2");

        // a late caller still holding token-1 must not drop token-2
        assert!(!store.clear_token_if("token-1").await);
        assert_eq!(store.get_valid_token().await.unwrap(), "token-2");
        assert_eq!(issuer.calls(), 2);
    }

    #[tokio::test]
    async fn issuer_failure_is_returned_verbatim_and_nothing_is_cached() {
        let issuer = CountingIssuer::new(3600).failing();
        let store = token_store(issuer.clone());

        let err = store.get_valid_token().await.unwrap_err();
        assert_eq!(err.kind(), "auth");
        assert!(err.to_string().contains("401"));
        assert!(!store.is_token_valid().await);

        // no retry inside the store: each call is one issuer call
        let _ = store.get_valid_token().await;
        assert_eq!(issuer.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn token_info_reports_scopes_and_remaining_validity() {
        let store = token_store(CountingIssuer::new(3600));
        let empty = store.token_info().await;
        assert!(!empty.has_token && !empty.valid);
        assert!(empty.scopes.is_empty());

        store.get_valid_token().await.unwrap();
        let info = store.token_info().await;
        assert!(info.has_token && info.valid);
        assert_eq!(info.scopes, vec!["read".to_string()]);
        assert_eq!(info.remaining, Duration::from_secs(3540));
        let issued_at = info.issued_at.unwrap();
        assert_eq!((info.refresh_at.unwrap() - issued_at).num_seconds(), 3540);
    }
}
