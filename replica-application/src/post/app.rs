use super::domain::{Post, PostComment, PostMember};
use crate::command::Command;
use crate::command_handler::CommandHandler;
use crate::context::CommandContext;
use crate::error::AppError;
use crate::shared::member::MemberId;
use crate::shared::post::{PostCommentDto, PostDto, PostId};
use async_trait::async_trait;
use replica_domain::domain_event::DomainEvents;
use replica_domain::persist::Table;

/// 发帖：作者必须已同步到本上下文
#[derive(Debug, Clone)]
pub struct WritePost {
    pub author_id: MemberId,
    pub title: String,
    pub content: String,
}

impl Command for WritePost {
    const NAME: &'static str = "post.write";
    type Output = PostDto;
}

#[derive(Debug, Clone)]
pub struct AddPostComment {
    pub post_id: PostId,
    pub author_id: MemberId,
    pub content: String,
}

impl Command for AddPostComment {
    const NAME: &'static str = "post.add_comment";
    type Output = PostCommentDto;
}

#[derive(Clone)]
pub struct PostService {
    members: Table<PostMember>,
    posts: Table<Post>,
    comments: Table<PostComment>,
}

impl PostService {
    pub fn new(
        members: Table<PostMember>,
        posts: Table<Post>,
        comments: Table<PostComment>,
    ) -> Self {
        Self {
            members,
            posts,
            comments,
        }
    }
}

#[async_trait]
impl CommandHandler<WritePost> for PostService {
    async fn handle(&self, ctx: &mut CommandContext, cmd: WritePost) -> Result<PostDto, AppError> {
        let author = self.members.get(ctx.tx(), &cmd.author_id)?;
        let post = self
            .posts
            .insert(ctx.tx(), Post::write(&author, cmd.title, cmd.content)?)?;

        // 只改计数，不回写副本的白名单字段
        self.members
            .modify(ctx.tx(), &cmd.author_id, PostMember::increase_post_count)?;

        let mut events = DomainEvents::new();
        post.raise_created(&mut events)?;
        ctx.publish_all(events).await?;
        Ok(post.to_dto())
    }
}

#[async_trait]
impl CommandHandler<AddPostComment> for PostService {
    async fn handle(
        &self,
        ctx: &mut CommandContext,
        cmd: AddPostComment,
    ) -> Result<PostCommentDto, AppError> {
        let post = self.posts.get(ctx.tx(), &cmd.post_id)?;
        let author = self.members.get(ctx.tx(), &cmd.author_id)?;
        let comment = self
            .comments
            .insert(ctx.tx(), PostComment::write(&post, &author, cmd.content)?)?;

        let mut events = DomainEvents::new();
        comment.raise_created(&mut events)?;
        ctx.publish_all(events).await?;
        Ok(comment.to_dto())
    }
}
