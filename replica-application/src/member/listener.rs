use super::app::MemberService;
use crate::shared::member::MemberId;
use crate::shared::post::{PostCommentCreated, PostCreated};
use async_trait::async_trait;
use replica_domain::domain_event::{DomainEvent, EventEnvelope};
use replica_domain::error::{DomainError, DomainResult};
use replica_domain::eventing::{EventHandler, HandledEventType, HandlerContext};
use tracing::debug;

/// 发帖作者的活跃度增量
pub const POST_ACTIVITY_SCORE: i32 = 3;
/// 评论作者的活跃度增量
pub const COMMENT_ACTIVITY_SCORE: i32 = 1;

/// 帖子/评论创建后增加作者活跃度（提交后执行）
///
/// 目标会员不存在说明同步出现问题，直接失败而不是跳过。
pub struct MemberActivityHandler {
    service: MemberService,
}

impl MemberActivityHandler {
    pub fn new(service: MemberService) -> Self {
        Self { service }
    }

    fn target(envelope: &EventEnvelope) -> DomainResult<(MemberId, i32)> {
        if envelope.is::<PostCreated>() {
            let event: PostCreated = envelope.decode()?;
            return Ok((event.post.author_id, POST_ACTIVITY_SCORE));
        }
        if envelope.is::<PostCommentCreated>() {
            let event: PostCommentCreated = envelope.decode()?;
            return Ok((event.comment.author_id, COMMENT_ACTIVITY_SCORE));
        }
        Err(DomainError::TypeMismatch {
            expected: format!("{} | {}", PostCreated::KIND, PostCommentCreated::KIND),
            found: envelope.kind().to_string(),
        })
    }
}

#[async_trait]
impl EventHandler for MemberActivityHandler {
    fn handler_name(&self) -> &str {
        "MemberActivityHandler"
    }

    fn handled_event_type(&self) -> HandledEventType {
        HandledEventType::Many(vec![
            PostCreated::KIND.to_string(),
            PostCommentCreated::KIND.to_string(),
        ])
    }

    async fn handle(&self, ctx: &mut HandlerContext<'_>, envelope: &EventEnvelope) -> DomainResult<()> {
        let (author_id, amount) = Self::target(envelope)?;
        let (tx, publisher) = ctx.parts();
        let member = self
            .service
            .increase_activity_score(tx, publisher, &author_id, amount)
            .await?;
        debug!(
            member_id = %member.id,
            activity_score = member.activity_score,
            "activity score increased"
        );
        Ok(())
    }
}
