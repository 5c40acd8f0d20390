//! SQLite repository integration tests.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pix_types::{
        CreateUserRequest, DomainError, PixId, PixRepository, PixStatus, RepoError, SettlePix,
        User, UserId,
    };

    use crate::SqliteRepo;
    use crate::security::hash_api_key;

    async fn setup_repo() -> SqliteRepo {
        SqliteRepo::new("sqlite::memory:").await.unwrap()
    }

    async fn user(repo: &SqliteRepo, first_name: &str, wallet: i64) -> User {
        repo.create_user(CreateUserRequest {
            first_name: first_name.to_string(),
            last_name: "Souza".to_string(),
            wallet,
        })
        .await
        .unwrap()
    }

    fn settle(pix_id: PixId, requester: &User, payer: &User, value: i64) -> SettlePix {
        SettlePix {
            pix_id,
            requesting_user_id: requester.id,
            paying_user_id: payer.id,
            value,
        }
    }

    async fn wallet(repo: &SqliteRepo, id: UserId) -> i64 {
        repo.get_user(id).await.unwrap().unwrap().wallet
    }

    #[tokio::test]
    async fn test_create_and_get_user() {
        let repo = setup_repo().await;

        let created = user(&repo, "Ana", 5000).await;
        let fetched = repo.get_user(created.id).await.unwrap().unwrap();

        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.first_name, "Ana");
        assert_eq!(fetched.wallet, 5000);
    }

    #[tokio::test]
    async fn test_create_user_empty_name_fails() {
        let repo = setup_repo().await;

        let result = repo
            .create_user(CreateUserRequest {
                first_name: "".to_string(),
                last_name: "Souza".to_string(),
                wallet: 0,
            })
            .await;

        assert!(matches!(
            result,
            Err(RepoError::Domain(DomainError::ValidationError(_)))
        ));
    }

    #[tokio::test]
    async fn test_get_user_not_found() {
        let repo = setup_repo().await;

        let result = repo.get_user(UserId::new()).await.unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_create_pix_is_open() {
        let repo = setup_repo().await;
        let ana = user(&repo, "Ana", 0).await;

        let pix = repo.create_pix(ana.id, 2500).await.unwrap();
        let stored = repo.get_pix(pix.id).await.unwrap().unwrap();

        assert_eq!(stored.status, PixStatus::Open);
        assert_eq!(stored.value, 2500);
        assert_eq!(stored.requesting_user_id, ana.id);
        assert!(stored.paying_user_id.is_none());
    }

    #[tokio::test]
    async fn test_create_pix_for_unknown_user_fails() {
        let repo = setup_repo().await;

        let result = repo.create_pix(UserId::new(), 100).await;

        assert!(matches!(result, Err(RepoError::Database(_))));
    }

    #[tokio::test]
    async fn test_settle_moves_money_and_closes_pix() {
        let repo = setup_repo().await;
        let ana = user(&repo, "Ana", 1000).await;
        let bruno = user(&repo, "Bruno", 5000).await;
        let pix = repo.create_pix(ana.id, 2500).await.unwrap();

        let closed = repo
            .settle_pix(settle(pix.id, &ana, &bruno, 2500))
            .await
            .unwrap();

        assert_eq!(closed.status, PixStatus::Close);
        assert_eq!(closed.paying_user_id, Some(bruno.id));
        assert_eq!(wallet(&repo, ana.id).await, 3500);
        assert_eq!(wallet(&repo, bruno.id).await, 2500);

        let stored = repo.get_pix(pix.id).await.unwrap().unwrap();
        assert_eq!(stored.status, PixStatus::Close);
        assert_eq!(stored.paying_user_id, Some(bruno.id));
    }

    #[tokio::test]
    async fn test_settle_insufficient_funds_changes_nothing() {
        let repo = setup_repo().await;
        let ana = user(&repo, "Ana", 1000).await;
        let bruno = user(&repo, "Bruno", 100).await;
        let pix = repo.create_pix(ana.id, 2500).await.unwrap();

        let result = repo.settle_pix(settle(pix.id, &ana, &bruno, 2500)).await;

        assert!(matches!(
            result,
            Err(RepoError::Domain(DomainError::InsufficientFunds {
                available: 100,
                requested: 2500
            }))
        ));
        assert_eq!(wallet(&repo, ana.id).await, 1000);
        assert_eq!(wallet(&repo, bruno.id).await, 100);
        let stored = repo.get_pix(pix.id).await.unwrap().unwrap();
        assert_eq!(stored.status, PixStatus::Open);
    }

    #[tokio::test]
    async fn test_settle_from_empty_wallet_goes_negative() {
        let repo = setup_repo().await;
        let ana = user(&repo, "Ana", 0).await;
        let bruno = user(&repo, "Bruno", 0).await;
        let first = repo.create_pix(ana.id, 300).await.unwrap();
        let second = repo.create_pix(ana.id, 100).await.unwrap();

        repo.settle_pix(settle(first.id, &ana, &bruno, 300))
            .await
            .unwrap();

        assert_eq!(wallet(&repo, ana.id).await, 300);
        assert_eq!(wallet(&repo, bruno.id).await, -300);

        let result = repo.settle_pix(settle(second.id, &ana, &bruno, 100)).await;

        assert!(matches!(
            result,
            Err(RepoError::Domain(DomainError::InsufficientFunds {
                available: -300,
                requested: 100
            }))
        ));
        assert_eq!(wallet(&repo, bruno.id).await, -300);
    }

    #[tokio::test]
    async fn test_settle_min_value_overflow_changes_nothing() {
        let repo = setup_repo().await;
        let ana = user(&repo, "Ana", 0).await;
        let bruno = user(&repo, "Bruno", 10).await;
        let pix = repo.create_pix(ana.id, i64::MIN).await.unwrap();

        let result = repo.settle_pix(settle(pix.id, &ana, &bruno, i64::MIN)).await;

        assert!(matches!(
            result,
            Err(RepoError::Domain(DomainError::BalanceOverflow))
        ));
        assert_eq!(wallet(&repo, ana.id).await, 0);
        assert_eq!(wallet(&repo, bruno.id).await, 10);
        let stored = repo.get_pix(pix.id).await.unwrap().unwrap();
        assert_eq!(stored.status, PixStatus::Open);
    }

    #[tokio::test]
    async fn test_settle_max_value_overflow_changes_nothing() {
        let repo = setup_repo().await;
        let ana = user(&repo, "Ana", 1).await;
        let bruno = user(&repo, "Bruno", 0).await;
        let pix = repo.create_pix(ana.id, i64::MAX).await.unwrap();

        let result = repo.settle_pix(settle(pix.id, &ana, &bruno, i64::MAX)).await;

        assert!(matches!(
            result,
            Err(RepoError::Domain(DomainError::BalanceOverflow))
        ));
        assert_eq!(wallet(&repo, ana.id).await, 1);
        assert_eq!(wallet(&repo, bruno.id).await, 0);
        let stored = repo.get_pix(pix.id).await.unwrap().unwrap();
        assert_eq!(stored.status, PixStatus::Open);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_settlements_pay_once() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("pix.db").display());
        let repo = Arc::new(SqliteRepo::new(&url).await.unwrap());

        for _ in 0..10 {
            let ana = user(&repo, "Ana", 0).await;
            let bruno = user(&repo, "Bruno", 1000).await;
            let carla = user(&repo, "Carla", 1000).await;
            let pix = repo.create_pix(ana.id, 100).await.unwrap();

            let first = tokio::spawn({
                let repo = repo.clone();
                let req = settle(pix.id, &ana, &bruno, 100);
                async move { repo.settle_pix(req).await }
            });
            let second = tokio::spawn({
                let repo = repo.clone();
                let req = settle(pix.id, &ana, &carla, 100);
                async move { repo.settle_pix(req).await }
            });
            let results = [first.await.unwrap(), second.await.unwrap()];

            assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
            assert!(
                results
                    .iter()
                    .any(|r| matches!(r, Err(RepoError::Domain(DomainError::InvalidKey)))),
                "loser should see an invalid key, got {:?}",
                results
            );
            assert_eq!(wallet(&repo, ana.id).await, 100);
            let paid = wallet(&repo, bruno.id).await + wallet(&repo, carla.id).await;
            assert_eq!(paid, 1900);
        }
    }

    #[tokio::test]
    async fn test_settle_unknown_requester_fails() {
        let repo = setup_repo().await;
        let bruno = user(&repo, "Bruno", 5000).await;
        let ghost = UserId::new();

        let result = repo
            .settle_pix(SettlePix {
                pix_id: PixId::new(),
                requesting_user_id: ghost,
                paying_user_id: bruno.id,
                value: 100,
            })
            .await;

        assert!(matches!(
            result,
            Err(RepoError::Domain(DomainError::UserNotFound(id))) if id == ghost
        ));
        assert_eq!(wallet(&repo, bruno.id).await, 5000);
    }

    #[tokio::test]
    async fn test_settle_twice_is_invalid_key() {
        let repo = setup_repo().await;
        let ana = user(&repo, "Ana", 0).await;
        let bruno = user(&repo, "Bruno", 5000).await;
        let carla = user(&repo, "Carla", 5000).await;
        let pix = repo.create_pix(ana.id, 1000).await.unwrap();

        repo.settle_pix(settle(pix.id, &ana, &bruno, 1000))
            .await
            .unwrap();
        let second = repo.settle_pix(settle(pix.id, &ana, &carla, 1000)).await;

        assert!(matches!(
            second,
            Err(RepoError::Domain(DomainError::InvalidKey))
        ));
        assert_eq!(wallet(&repo, ana.id).await, 1000);
        assert_eq!(wallet(&repo, carla.id).await, 5000);
    }

    #[tokio::test]
    async fn test_settle_with_mismatched_value_is_invalid_key() {
        let repo = setup_repo().await;
        let ana = user(&repo, "Ana", 0).await;
        let bruno = user(&repo, "Bruno", 5000).await;
        let pix = repo.create_pix(ana.id, 1000).await.unwrap();

        let result = repo.settle_pix(settle(pix.id, &ana, &bruno, 10)).await;

        assert!(matches!(
            result,
            Err(RepoError::Domain(DomainError::InvalidKey))
        ));
        assert_eq!(wallet(&repo, bruno.id).await, 5000);
    }

    #[tokio::test]
    async fn test_settle_self_pay_rejected() {
        let repo = setup_repo().await;
        let ana = user(&repo, "Ana", 5000).await;
        let pix = repo.create_pix(ana.id, 1000).await.unwrap();

        let result = repo.settle_pix(settle(pix.id, &ana, &ana, 1000)).await;

        assert!(matches!(result, Err(RepoError::Domain(DomainError::SelfPay))));
    }

    #[tokio::test]
    async fn test_history_lists_only_closed_pix_with_counterparty() {
        let repo = setup_repo().await;
        let ana = user(&repo, "Ana", 0).await;
        let bruno = user(&repo, "Bruno", 5000).await;

        let paid = repo.create_pix(ana.id, 1000).await.unwrap();
        repo.create_pix(ana.id, 700).await.unwrap();
        repo.settle_pix(settle(paid.id, &ana, &bruno, 1000))
            .await
            .unwrap();

        let received = repo.list_received(ana.id).await.unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].pix.id, paid.id);
        assert_eq!(received[0].counterparty.first_name, "Bruno");

        let bruno_paid = repo.list_paid(bruno.id).await.unwrap();
        assert_eq!(bruno_paid.len(), 1);
        assert_eq!(bruno_paid[0].counterparty.first_name, "Ana");

        assert!(repo.list_paid(ana.id).await.unwrap().is_empty());
        assert!(repo.list_received(bruno.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_api_key_round_trip() {
        let repo = setup_repo().await;
        let ana = user(&repo, "Ana", 0).await;

        let (created, raw) = repo.create_api_key(ana.id).await.unwrap();
        let found = repo
            .verify_api_key_hash(&hash_api_key(&raw))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(found.id, created.id);
        assert_eq!(found.user_id, ana.id);
        assert!(found.last_used_at.is_some());
    }

    #[tokio::test]
    async fn test_unknown_api_key_not_found() {
        let repo = setup_repo().await;

        let found = repo
            .verify_api_key_hash(&hash_api_key("sk_missing"))
            .await
            .unwrap();

        assert!(found.is_none());
    }
}
