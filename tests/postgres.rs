//! Runs the store against a live database, e.g.
//! `TEST_DATABASE_URL='host=localhost user=postgres password=postgres dbname=subscriptions_test'
//! cargo test --test postgres -- --ignored --test-threads=1`

use futures::future::join_all;
use log_error::LogError;
use std::collections::HashSet;
use std::sync::Arc;
use subscription_service::subscription::repository::PostgresSubscriptionRepository;
use subscription_types::date::MonthYear;
use subscription_types::subscription::repository::SubscriptionRepository;
use subscription_types::subscription::{CostFilter, NewSubscription, SubscriptionError};
use typesafe_repository::async_ops::{Get, List, Remove, Save};
use uuid::Uuid;

async fn repository() -> PostgresSubscriptionRepository {
    let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL is not set");
    let (mut client, connection) = tokio_postgres::connect(&url, tokio_postgres::NoTls)
        .await
        .expect("Unable to connect to test database");
    actix_rt::spawn(async move {
        connection.await.log_error("Postgres connection error");
    });
    subscription_service::migrations::runner()
        .run_async(&mut client)
        .await
        .expect("Unable to run migrations");
    PostgresSubscriptionRepository::new(Arc::new(client))
}

fn month(s: &str) -> MonthYear {
    MonthYear::parse(s).unwrap()
}

fn new_sub(name: &str, price: i32, user_id: Uuid, start: &str, end: Option<&str>) -> NewSubscription {
    NewSubscription {
        service_name: name.to_string(),
        price,
        user_id,
        start_date: month(start),
        end_date: end.map(month),
    }
}

#[actix_rt::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn crud_round_trip() {
    let repo = repository().await;
    let owner = Uuid::new_v4();
    let created = repo
        .create(new_sub("Netflix", 400, owner, "07-2024", None))
        .await
        .unwrap();
    assert_eq!(created.start_date, month("07-2024"));
    assert_eq!(created.end_date, None);
    assert_eq!(repo.get_one(&created.id).await.unwrap(), Some(created.clone()));

    let mut changed = created.clone();
    changed.price = 700;
    changed.user_id = Uuid::new_v4();
    changed.end_date = Some(month("12-2024"));
    repo.save(changed).await.unwrap();
    let updated = repo.get_one(&created.id).await.unwrap().unwrap();
    assert_eq!(updated.user_id, owner);
    assert_eq!(updated.price, 700);
    assert_eq!(updated.end_date, Some(month("12-2024")));

    repo.remove(&created.id).await.unwrap();
    assert_eq!(repo.get_one(&created.id).await.unwrap(), None);
    let err = repo.remove(&created.id).await.unwrap_err();
    assert_eq!(
        err.downcast_ref::<SubscriptionError>(),
        Some(&SubscriptionError::NotFound)
    );
    let mut missing = updated;
    missing.id = Uuid::new_v4();
    let err = repo.save(missing).await.unwrap_err();
    assert_eq!(
        err.downcast_ref::<SubscriptionError>(),
        Some(&SubscriptionError::NotFound)
    );
}

#[actix_rt::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn concurrent_creates_get_distinct_ids() {
    let repo = repository().await;
    let user = Uuid::new_v4();
    let created = join_all((0..100).map(|i| repo.create(new_sub("Netflix", i, user, "07-2024", None))))
        .await
        .into_iter()
        .map(|res| res.unwrap())
        .collect::<Vec<_>>();
    let ids = created.iter().map(|s| s.id).collect::<HashSet<_>>();
    assert_eq!(ids.len(), 100);
    let stored = repo
        .list()
        .await
        .unwrap()
        .into_iter()
        .filter(|s| s.user_id == user)
        .map(|s| s.id)
        .collect::<HashSet<_>>();
    assert_eq!(stored, ids);
}

#[actix_rt::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn total_cost_matches_overlap_predicate() {
    let repo = repository().await;
    let user = Uuid::new_v4();
    repo.create(new_sub("Netflix", 400, user, "01-2024", Some("06-2024")))
        .await
        .unwrap();
    repo.create(new_sub("Spotify", 250, user, "05-2024", None))
        .await
        .unwrap();

    let total = |from: &str, to: &str, name: Option<&str>| {
        CostFilter::new(user, name.map(str::to_string), month(from), month(to))
    };
    assert_eq!(repo.total_cost(&total("03-2024", "04-2024", None)).await.unwrap(), 400);
    assert_eq!(repo.total_cost(&total("07-2024", "12-2024", None)).await.unwrap(), 250);
    assert_eq!(repo.total_cost(&total("01-2024", "12-2024", None)).await.unwrap(), 650);
    assert_eq!(
        repo.total_cost(&total("01-2024", "12-2024", Some("Netflix")))
            .await
            .unwrap(),
        400
    );
    assert_eq!(repo.total_cost(&total("01-2020", "12-2020", None)).await.unwrap(), 0);
}
