use crate::date::{optional_month_year, MonthYear};
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use typesafe_repository::macros::Id;
use typesafe_repository::{GetIdentity, Identity, IdentityOf, RefIdentity};
use utoipa::ToSchema;
use uuid::Uuid;

pub mod repository;
pub mod service;

pub type UserId = Uuid;

#[derive(Serialize, Deserialize, ToSchema, Id, Debug, Clone, PartialEq, Eq)]
#[Id(get_id, ref_id)]
pub struct Subscription {
    #[id]
    pub id: Uuid,
    #[schema(example = "Yandex Plus")]
    pub service_name: String,
    #[schema(example = 400)]
    pub price: i32,
    #[schema(value_type = Uuid)]
    pub user_id: UserId,
    #[schema(value_type = String, example = "07-2025")]
    pub start_date: MonthYear,
    #[schema(value_type = Option<String>, example = "12-2025")]
    #[serde(
        default,
        deserialize_with = "optional_month_year",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_date: Option<MonthYear>,
}

impl Subscription {
    pub fn validate(&self) -> Result<(), SubscriptionError> {
        validate_fields(&self.service_name, self.price)
    }
}

/// Subscription before the store has assigned it an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubscription {
    pub service_name: String,
    pub price: i32,
    pub user_id: UserId,
    pub start_date: MonthYear,
    pub end_date: Option<MonthYear>,
}

impl NewSubscription {
    pub fn validate(&self) -> Result<(), SubscriptionError> {
        validate_fields(&self.service_name, self.price)
    }

    pub fn with_id(self, id: IdentityOf<Subscription>) -> Subscription {
        let Self {
            service_name,
            price,
            user_id,
            start_date,
            end_date,
        } = self;
        Subscription {
            id,
            service_name,
            price,
            user_id,
            start_date,
            end_date,
        }
    }
}

fn validate_fields(service_name: &str, price: i32) -> Result<(), SubscriptionError> {
    if service_name.trim().is_empty() {
        return Err(SubscriptionError::Validation {
            field: "service_name",
            msg: "must not be empty".to_string(),
        });
    }
    if price < 0 {
        return Err(SubscriptionError::Validation {
            field: "price",
            msg: format!("must be non-negative, got {price}"),
        });
    }
    Ok(())
}

#[derive(Debug, Display, Error, PartialEq, Eq)]
pub enum SubscriptionError {
    #[display("subscription not found")]
    NotFound,
    #[display("Invalid field {field}: {msg}")]
    Validation { field: &'static str, msg: String },
}

/// Parameters of the total cost query.
///
/// A subscription is counted when it belongs to `user_id`, matches
/// `service_name` (if any) and its active window overlaps
/// `[start_date, end_date]`. Open-ended subscriptions never end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostFilter {
    pub user_id: UserId,
    pub service_name: Option<String>,
    pub start_date: MonthYear,
    pub end_date: MonthYear,
}

impl CostFilter {
    pub fn new(
        user_id: UserId,
        service_name: Option<String>,
        start_date: MonthYear,
        end_date: MonthYear,
    ) -> Self {
        Self {
            user_id,
            service_name: service_name.filter(|s| !s.is_empty()),
            start_date,
            end_date,
        }
    }

    pub fn matches(&self, sub: &Subscription) -> bool {
        sub.user_id == self.user_id
            && self
                .service_name
                .as_ref()
                .map_or(true, |name| *name == sub.service_name)
            && sub.start_date <= self.end_date
            && sub.end_date.map_or(true, |end| end >= self.start_date)
    }
}
