use crate::shared::member::{MemberDto, MemberId, ReplicaMember};
use crate::shared::post::{
    PostCommentCreated, PostCommentDto, PostCommentId, PostCreated, PostDto, PostId,
};
use chrono::{DateTime, Utc};
use replica_domain::domain_event::DomainEvents;
use replica_domain::entity::{
    HasAuditTimestamps, HasIdentity, ReplicaEntity, SequentialIdentity, SourceEntity,
};
use replica_domain::error::{DomainError, DomainResult};
use replica_domain::value_object::AuditStamp;

/// 帖子上下文的会员副本；`post_count` 由本上下文维护，折叠时保持不变
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostMember {
    base: ReplicaMember,
    post_count: u32,
}

impl PostMember {
    pub fn nickname(&self) -> &str {
        self.base.profile().nickname()
    }

    pub fn activity_score(&self) -> i32 {
        self.base.profile().activity_score()
    }

    pub fn post_count(&self) -> u32 {
        self.post_count
    }

    pub fn increase_post_count(&mut self) {
        self.post_count += 1;
    }

    pub fn replica(&self) -> &ReplicaMember {
        &self.base
    }
}

impl HasIdentity for PostMember {
    type Id = MemberId;

    fn id(&self) -> &MemberId {
        self.base.id()
    }
}

impl HasAuditTimestamps for PostMember {
    fn created_at(&self) -> DateTime<Utc> {
        self.base.created_at()
    }

    fn modified_at(&self) -> DateTime<Utc> {
        self.base.modified_at()
    }
}

impl ReplicaEntity for PostMember {
    type Snapshot = MemberDto;

    fn from_snapshot(snapshot: &MemberDto, folded_at: DateTime<Utc>) -> Self {
        Self {
            base: ReplicaMember::first_sight(snapshot, folded_at),
            post_count: 0,
        }
    }

    fn refresh(&mut self, snapshot: &MemberDto, folded_at: DateTime<Utc>) {
        self.base.refresh(snapshot, folded_at);
    }

    fn folded_at(&self) -> DateTime<Utc> {
        self.base.stamp().folded_at()
    }
}

/// 帖子（源实体）
#[derive(Debug, Clone)]
pub struct Post {
    id: PostId,
    audit: AuditStamp,
    author_id: MemberId,
    author_name: String,
    title: String,
    content: String,
}

impl Post {
    pub fn write(
        author: &PostMember,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> DomainResult<Self> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(DomainError::invalid_command("post title must not be blank"));
        }

        Ok(Self {
            id: PostId::unassigned(),
            audit: AuditStamp::new(Utc::now()),
            author_id: author.id().clone(),
            author_name: author.nickname().to_string(),
            title,
            content: content.into(),
        })
    }

    pub fn author_id(&self) -> &MemberId {
        &self.author_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn to_dto(&self) -> PostDto {
        PostDto {
            id: self.id.clone(),
            created_at: self.created_at(),
            modified_at: self.modified_at(),
            author_id: self.author_id.clone(),
            author_name: self.author_name.clone(),
            title: self.title.clone(),
            content: self.content.clone(),
        }
    }

    pub fn raise_created(&self, events: &mut DomainEvents) -> DomainResult<()> {
        events.raise(&PostCreated {
            post: self.to_dto(),
        })
    }
}

impl HasIdentity for Post {
    type Id = PostId;

    fn id(&self) -> &PostId {
        &self.id
    }
}

impl HasAuditTimestamps for Post {
    fn created_at(&self) -> DateTime<Utc> {
        self.audit.created_at()
    }

    fn modified_at(&self) -> DateTime<Utc> {
        self.audit.modified_at()
    }
}

impl SourceEntity for Post {
    fn assign_id(&mut self, id: PostId) {
        self.id = id;
    }

    fn audit_mut(&mut self) -> &mut AuditStamp {
        &mut self.audit
    }
}

/// 评论（源实体）
#[derive(Debug, Clone)]
pub struct PostComment {
    id: PostCommentId,
    audit: AuditStamp,
    post_id: PostId,
    author_id: MemberId,
    author_name: String,
    content: String,
}

impl PostComment {
    pub fn write(post: &Post, author: &PostMember, content: impl Into<String>) -> DomainResult<Self> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(DomainError::invalid_command("comment must not be blank"));
        }

        Ok(Self {
            id: PostCommentId::unassigned(),
            audit: AuditStamp::new(Utc::now()),
            post_id: post.id().clone(),
            author_id: author.id().clone(),
            author_name: author.nickname().to_string(),
            content,
        })
    }

    pub fn post_id(&self) -> &PostId {
        &self.post_id
    }

    pub fn to_dto(&self) -> PostCommentDto {
        PostCommentDto {
            id: self.id.clone(),
            created_at: self.created_at(),
            modified_at: self.modified_at(),
            post_id: self.post_id.clone(),
            author_id: self.author_id.clone(),
            author_name: self.author_name.clone(),
            content: self.content.clone(),
        }
    }

    pub fn raise_created(&self, events: &mut DomainEvents) -> DomainResult<()> {
        events.raise(&PostCommentCreated {
            comment: self.to_dto(),
        })
    }
}

impl HasIdentity for PostComment {
    type Id = PostCommentId;

    fn id(&self) -> &PostCommentId {
        &self.id
    }
}

impl HasAuditTimestamps for PostComment {
    fn created_at(&self) -> DateTime<Utc> {
        self.audit.created_at()
    }

    fn modified_at(&self) -> DateTime<Utc> {
        self.audit.modified_at()
    }
}

impl SourceEntity for PostComment {
    fn assign_id(&mut self, id: PostCommentId) {
        self.id = id;
    }

    fn audit_mut(&mut self) -> &mut AuditStamp {
        &mut self.audit
    }
}
