use std::fmt::Display;

use async_trait::async_trait;

use crate::context::Context;

/// The per-item operations a batch drives.
///
/// `validate` is pure and runs before any slot or rate-gate budget is taken.
/// `execute` performs the single remote attempt for one item; the dispatcher
/// has already passed the shared rate gate on its behalf.
#[async_trait]
pub trait BatchExecutor: Send + Sync + 'static {
    type Item: Send + Sync + 'static;
    type Response: Send + 'static;
    type Error: Display + Send + 'static;

    fn validate(&self, item: &Self::Item) -> Result<(), Self::Error>;

    async fn execute(&self, ctx: &Context, item: &Self::Item)
    -> Result<Self::Response, Self::Error>;
}
