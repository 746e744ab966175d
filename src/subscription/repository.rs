use crate::SqlWrapper;
use async_trait::async_trait;
use bytes::BytesMut;
use std::error::Error;
use std::sync::Arc;
use subscription_types::date::MonthYear;
use subscription_types::subscription::repository::SubscriptionRepository;
use subscription_types::subscription::{
    CostFilter, NewSubscription, Subscription, SubscriptionError,
};
use time::Date;
use tokio_postgres::types::{IsNull, ToSql, Type};
use tokio_postgres::{Client, Row};
use typesafe_repository::async_ops::{Get, List, Remove, Save};
use typesafe_repository::{IdentityOf, Repository};

impl TryFrom<Row> for SqlWrapper<Subscription> {
    type Error = anyhow::Error;

    fn try_from(r: Row) -> Result<Self, Self::Error> {
        Ok(SqlWrapper(Subscription {
            id: r.try_get("id")?,
            service_name: r.try_get("service_name")?,
            price: r.try_get("price")?,
            user_id: r.try_get("user_id")?,
            start_date: r.try_get::<_, Date>("start_date")?.into(),
            end_date: r
                .try_get::<_, Option<Date>>("end_date")?
                .map(MonthYear::from),
        }))
    }
}

impl ToSql for SqlWrapper<MonthYear> {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        self.0.date().to_sql(ty, out)
    }

    fn accepts(ty: &Type) -> bool {
        <Date as ToSql>::accepts(ty)
    }

    fn to_sql_checked(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        self.0.date().to_sql_checked(ty, out)
    }
}

pub struct PostgresSubscriptionRepository {
    client: Arc<Client>,
}

impl PostgresSubscriptionRepository {
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }
}

impl Repository<Subscription> for PostgresSubscriptionRepository {
    type Error = anyhow::Error;
}

#[async_trait]
impl Get<Subscription> for PostgresSubscriptionRepository {
    async fn get_one(
        &self,
        id: &IdentityOf<Subscription>,
    ) -> Result<Option<Subscription>, Self::Error> {
        self.client
            .query_opt(
                "SELECT id, service_name, price, user_id, start_date, end_date \
                FROM subscriptions WHERE id = $1",
                &[id],
            )
            .await?
            .map(SqlWrapper::<Subscription>::from_sql)
            .transpose()
    }
}

#[async_trait]
impl List<Subscription> for PostgresSubscriptionRepository {
    async fn list(&self) -> Result<Vec<Subscription>, Self::Error> {
        self.client
            .query(
                "SELECT id, service_name, price, user_id, start_date, end_date FROM subscriptions",
                &[],
            )
            .await?
            .into_iter()
            .map(SqlWrapper::<Subscription>::from_sql)
            .collect()
    }
}

#[async_trait]
impl SubscriptionRepository for PostgresSubscriptionRepository {
    async fn create(&self, sub: NewSubscription) -> Result<Subscription, anyhow::Error> {
        let row = self
            .client
            .query_one(
                "INSERT INTO subscriptions (service_name, price, user_id, start_date, end_date) \
                VALUES ($1, $2, $3, $4, $5) \
                RETURNING id, service_name, price, user_id, start_date, end_date",
                &[
                    &sub.service_name,
                    &sub.price,
                    &sub.user_id,
                    &SqlWrapper(sub.start_date),
                    &sub.end_date.map(SqlWrapper),
                ],
            )
            .await?;
        SqlWrapper::<Subscription>::from_sql(row)
    }

    async fn total_cost(&self, filter: &CostFilter) -> Result<i64, anyhow::Error> {
        let row = self
            .client
            .query_one(
                "SELECT COALESCE(SUM(price), 0)::BIGINT AS total FROM subscriptions \
                WHERE user_id = $1 \
                AND ($2::TEXT IS NULL OR service_name = $2) \
                AND start_date <= $4 \
                AND (end_date IS NULL OR end_date >= $3)",
                &[
                    &filter.user_id,
                    &filter.service_name,
                    &SqlWrapper(filter.start_date),
                    &SqlWrapper(filter.end_date),
                ],
            )
            .await?;
        Ok(row.try_get("total")?)
    }
}

#[async_trait]
impl Save<Subscription> for PostgresSubscriptionRepository {
    async fn save(&self, sub: Subscription) -> Result<(), Self::Error> {
        let count = self
            .client
            .execute(
                "UPDATE subscriptions \
                SET service_name = $1, price = $2, start_date = $3, end_date = $4, updated_at = NOW() \
                WHERE id = $5",
                &[
                    &sub.service_name,
                    &sub.price,
                    &SqlWrapper(sub.start_date),
                    &sub.end_date.map(SqlWrapper),
                    &sub.id,
                ],
            )
            .await?;
        if count == 0 {
            return Err(SubscriptionError::NotFound.into());
        }
        Ok(())
    }
}

#[async_trait]
impl Remove<Subscription> for PostgresSubscriptionRepository {
    async fn remove(&self, id: &IdentityOf<Subscription>) -> Result<(), Self::Error> {
        let count = self
            .client
            .execute("DELETE FROM subscriptions WHERE id = $1", &[id])
            .await?;
        if count == 0 {
            return Err(SubscriptionError::NotFound.into());
        }
        Ok(())
    }
}
