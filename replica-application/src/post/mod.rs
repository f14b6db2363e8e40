//! 帖子上下文：帖子与评论是源实体，会员为本地副本
//!
pub mod app;
pub mod domain;
pub mod listener;

use crate::error::AppError;
use crate::inmemory_command_bus::InMemoryCommandBus;
use app::{AddPostComment, PostService, WritePost};
use domain::{Post, PostComment, PostMember};
use listener::PostSyncMemberHandler;
use replica_domain::eventing::InProcessDispatcher;
use replica_domain::persist::Table;
use std::sync::Arc;

pub struct PostContext {
    pub members: Table<PostMember>,
    pub posts: Table<Post>,
    pub comments: Table<PostComment>,
}

impl Default for PostContext {
    fn default() -> Self {
        Self::new()
    }
}

impl PostContext {
    pub fn new() -> Self {
        Self {
            members: Table::new("post_member"),
            posts: Table::new("post_post"),
            comments: Table::new("post_comment"),
        }
    }

    pub fn register_handlers(&self, dispatcher: &InProcessDispatcher) -> Result<(), AppError> {
        dispatcher.register(Arc::new(PostSyncMemberHandler::new(self.members.clone())))?;
        Ok(())
    }

    pub fn register_commands(&self, bus: &InMemoryCommandBus) -> Result<(), AppError> {
        let service = Arc::new(PostService::new(
            self.members.clone(),
            self.posts.clone(),
            self.comments.clone(),
        ));
        bus.register::<WritePost, _>(service.clone())?;
        bus.register::<AddPostComment, _>(service)?;
        Ok(())
    }
}
