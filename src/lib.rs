#![deny(clippy::unwrap_used)]
#![allow(clippy::from_over_into)]

use refinery::embed_migrations;

pub mod config;
pub mod control;
pub mod subscription;

pub use subscription::controllers::configure;

embed_migrations!("./migrations");

#[derive(Debug)]
pub struct SqlWrapper<T>(pub T);

impl<T> SqlWrapper<T> {
    pub fn from_sql<R>(r: R) -> Result<T, <Self as TryFrom<R>>::Error>
    where
        Self: TryFrom<R>,
    {
        r.try_into().map(|w: Self| w.0)
    }
}
