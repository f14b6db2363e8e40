use crate::{command::Command, context::CommandContext, error::AppError};
use async_trait::async_trait;

#[async_trait]
pub trait CommandHandler<C>: Send + Sync
where
    C: Command,
{
    async fn handle(&self, ctx: &mut CommandContext, cmd: C) -> Result<C::Output, AppError>;
}
