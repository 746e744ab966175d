use crate::subscription::{CostFilter, NewSubscription, Subscription};
use async_trait::async_trait;
use typesafe_repository::async_ops::{Add, Get, List, Remove, Save};
use typesafe_repository::inmemory::InMemoryRepository;
use typesafe_repository::Repository;
use uuid::Uuid;

/// `Save` replaces every column except `user_id`. `Save` and `Remove`
/// fail with [`SubscriptionError::NotFound`](crate::subscription::SubscriptionError)
/// on stores that can tell a missing row apart.
#[async_trait]
pub trait SubscriptionRepository:
    Repository<Subscription, Error = anyhow::Error>
    + Get<Subscription>
    + List<Subscription>
    + Save<Subscription>
    + Remove<Subscription>
    + Send
    + Sync
{
    /// Persists `sub` under a freshly generated id.
    async fn create(&self, sub: NewSubscription) -> Result<Subscription, anyhow::Error>;
    async fn total_cost(&self, filter: &CostFilter) -> Result<i64, anyhow::Error>;
}

pub type InMemorySubscriptionRepository = InMemoryRepository<Subscription, anyhow::Error>;

#[async_trait]
impl SubscriptionRepository for InMemoryRepository<Subscription, anyhow::Error> {
    async fn create(&self, sub: NewSubscription) -> Result<Subscription, anyhow::Error> {
        let mut id = Uuid::new_v4();
        while self.get_one(&id).await?.is_some() {
            id = Uuid::new_v4();
        }
        let sub = sub.with_id(id);
        self.add(sub.clone()).await?;
        Ok(sub)
    }

    async fn total_cost(&self, filter: &CostFilter) -> Result<i64, anyhow::Error> {
        Ok(self
            .list()
            .await?
            .iter()
            .filter(|s| filter.matches(s))
            .map(|s| i64::from(s.price))
            .sum())
    }
}
