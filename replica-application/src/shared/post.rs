use crate::dto::Dto;
use crate::shared::member::MemberId;
use chrono::{DateTime, Utc};
use replica_macros::{domain_event, entity_id};
use serde::{Deserialize, Serialize};

#[entity_id(sequential)]
pub struct PostId(i64);

#[entity_id(sequential)]
pub struct PostCommentId(i64);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostDto {
    pub id: PostId,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub author_id: MemberId,
    pub author_name: String,
    pub title: String,
    pub content: String,
}

impl Dto for PostDto {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostCommentDto {
    pub id: PostCommentId,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub post_id: PostId,
    pub author_id: MemberId,
    pub author_name: String,
    pub content: String,
}

impl Dto for PostCommentDto {}

#[domain_event(kind = "post.created")]
pub struct PostCreated {
    pub post: PostDto,
}

#[domain_event(kind = "post.comment.created")]
pub struct PostCommentCreated {
    pub comment: PostCommentDto,
}
