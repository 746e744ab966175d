use crate::subscription::repository::SubscriptionRepository;
use crate::subscription::{CostFilter, NewSubscription, Subscription, SubscriptionError};
use actix::prelude::*;
use std::sync::Arc;
use typesafe_repository::async_ops::{Get as _, List as _, Remove as _, Save as _};
use typesafe_repository::IdentityOf;

pub struct SubscriptionService {
    repository: Arc<dyn SubscriptionRepository>,
}

impl Actor for SubscriptionService {
    type Context = Context<Self>;
}

impl SubscriptionService {
    pub fn new(repository: Arc<dyn SubscriptionRepository>) -> Self {
        Self { repository }
    }
}

#[derive(Message)]
#[rtype(result = "Result<Option<Subscription>, anyhow::Error>")]
pub struct Get(pub IdentityOf<Subscription>);

#[derive(Message)]
#[rtype(result = "Result<Vec<Subscription>, anyhow::Error>")]
pub struct List;

#[derive(Message)]
#[rtype(result = "Result<Subscription, anyhow::Error>")]
pub struct Add(pub NewSubscription);

#[derive(Message)]
#[rtype(result = "Result<Subscription, anyhow::Error>")]
pub struct Update(pub Subscription);

#[derive(Message)]
#[rtype(result = "Result<(), anyhow::Error>")]
pub struct Remove(pub IdentityOf<Subscription>);

#[derive(Message)]
#[rtype(result = "Result<i64, anyhow::Error>")]
pub struct TotalCost(pub CostFilter);

impl Handler<Get> for SubscriptionService {
    type Result = ResponseActFuture<Self, Result<Option<Subscription>, anyhow::Error>>;

    fn handle(&mut self, Get(id): Get, _: &mut Context<Self>) -> Self::Result {
        let repo = self.repository.clone();
        Box::pin(
            async move {
                let res = repo.get_one(&id).await?;
                Ok(res)
            }
            .into_actor(self),
        )
    }
}

impl Handler<List> for SubscriptionService {
    type Result = ResponseActFuture<Self, Result<Vec<Subscription>, anyhow::Error>>;

    fn handle(&mut self, _: List, _: &mut Context<Self>) -> Self::Result {
        let repo = self.repository.clone();
        Box::pin(
            async move {
                let res = repo.list().await?;
                Ok(res)
            }
            .into_actor(self),
        )
    }
}

impl Handler<Add> for SubscriptionService {
    type Result = ResponseActFuture<Self, Result<Subscription, anyhow::Error>>;

    fn handle(&mut self, Add(sub): Add, _: &mut Context<Self>) -> Self::Result {
        let repo = self.repository.clone();
        Box::pin(
            async move {
                sub.validate()?;
                let res = repo.create(sub).await?;
                log::info!("Subscription created: {}", res.id);
                Ok(res)
            }
            .into_actor(self),
        )
    }
}

impl Handler<Update> for SubscriptionService {
    type Result = ResponseActFuture<Self, Result<Subscription, anyhow::Error>>;

    fn handle(&mut self, Update(sub): Update, _: &mut Context<Self>) -> Self::Result {
        let repo = self.repository.clone();
        Box::pin(
            async move {
                sub.validate()?;
                let id = sub.id;
                let res = async {
                    let stored = repo.get_one(&id).await?.ok_or(SubscriptionError::NotFound)?;
                    let sub = Subscription {
                        user_id: stored.user_id,
                        ..sub
                    };
                    repo.save(sub.clone()).await?;
                    Ok::<_, anyhow::Error>(sub)
                }
                .await
                .inspect_err(|err| log::warn!("Failed to update {id}: {err}"))?;
                log::info!("Subscription updated: {id}");
                Ok(res)
            }
            .into_actor(self),
        )
    }
}

impl Handler<Remove> for SubscriptionService {
    type Result = ResponseActFuture<Self, Result<(), anyhow::Error>>;

    fn handle(&mut self, Remove(id): Remove, _: &mut Context<Self>) -> Self::Result {
        let repo = self.repository.clone();
        Box::pin(
            async move {
                async {
                    repo.get_one(&id).await?.ok_or(SubscriptionError::NotFound)?;
                    repo.remove(&id).await?;
                    Ok::<_, anyhow::Error>(())
                }
                .await
                .inspect_err(|err| log::warn!("Failed to delete {id}: {err}"))?;
                log::info!("Subscription deleted: {id}");
                Ok(())
            }
            .into_actor(self),
        )
    }
}

impl Handler<TotalCost> for SubscriptionService {
    type Result = ResponseActFuture<Self, Result<i64, anyhow::Error>>;

    fn handle(&mut self, TotalCost(filter): TotalCost, _: &mut Context<Self>) -> Self::Result {
        let repo = self.repository.clone();
        Box::pin(
            async move {
                let res = repo.total_cost(&filter).await?;
                Ok(res)
            }
            .into_actor(self),
        )
    }
}
