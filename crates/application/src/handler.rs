//! Command and query handler traits.

use async_trait::async_trait;
use domain::Result;

use crate::access::Caller;

/// Handler for a command that changes catalogue state.
///
/// A command handler is responsible for:
/// 1. Authorizing the caller through the access-control collaborator
/// 2. Loading the aggregates the command touches
/// 3. Invoking their mutators
/// 4. Saving every touched aggregate through its repository
#[async_trait]
pub trait CommandHandler<C>: Send + Sync
where
    C: Send + 'static,
{
    type Output: Send;

    async fn execute(&self, caller: &Caller, command: C) -> Result<Self::Output>;
}

/// Handler for a read-only query.
#[async_trait]
pub trait QueryHandler<Q>: Send + Sync
where
    Q: Send + 'static,
{
    type Output: Send;

    async fn execute(&self, caller: &Caller, query: Q) -> Result<Self::Output>;
}
