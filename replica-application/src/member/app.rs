use super::domain::Member;
use crate::command::Command;
use crate::command_handler::CommandHandler;
use crate::context::CommandContext;
use crate::error::AppError;
use crate::shared::member::{MemberDto, MemberId};
use async_trait::async_trait;
use replica_domain::domain_event::DomainEvents;
use replica_domain::entity::HasIdentity;
use replica_domain::error::DomainResult;
use replica_domain::eventing::EventPublisher;
use replica_domain::persist::{Table, Transaction};
use tracing::info;

/// 会员加入
#[derive(Debug, Clone)]
pub struct JoinMember {
    pub username: String,
    pub password: String,
    pub nickname: String,
}

impl Command for JoinMember {
    const NAME: &'static str = "member.join";
    type Output = MemberDto;
}

/// 修改昵称
#[derive(Debug, Clone)]
pub struct ChangeMemberNickname {
    pub member_id: MemberId,
    pub nickname: String,
}

impl Command for ChangeMemberNickname {
    const NAME: &'static str = "member.change_nickname";
    type Output = MemberDto;
}

/// 增加活跃度
#[derive(Debug, Clone)]
pub struct IncreaseActivityScore {
    pub member_id: MemberId,
    pub amount: i32,
}

impl Command for IncreaseActivityScore {
    const NAME: &'static str = "member.increase_activity_score";
    type Output = MemberDto;
}

/// 会员上下文用例：修改源实体并在同一事务内发布事件
#[derive(Clone)]
pub struct MemberService {
    members: Table<Member>,
}

impl MemberService {
    pub fn new(members: Table<Member>) -> Self {
        Self { members }
    }

    pub async fn join(
        &self,
        tx: &mut Transaction,
        publisher: &EventPublisher,
        cmd: JoinMember,
    ) -> DomainResult<MemberDto> {
        let member = self
            .members
            .insert(tx, Member::join(cmd.username, cmd.password, cmd.nickname)?)?;

        let mut events = DomainEvents::new();
        member.raise_joined(&mut events)?;
        publisher.publish_all(tx, events).await?;

        info!(member_id = %member.id(), "member joined");
        Ok(member.to_dto())
    }

    pub async fn change_nickname(
        &self,
        tx: &mut Transaction,
        publisher: &EventPublisher,
        member_id: &MemberId,
        nickname: String,
    ) -> DomainResult<MemberDto> {
        let mut member = self.members.get(tx, member_id)?;
        if !member.change_nickname(nickname)? {
            return Ok(member.to_dto());
        }
        self.save_modified(tx, publisher, member).await
    }

    pub async fn increase_activity_score(
        &self,
        tx: &mut Transaction,
        publisher: &EventPublisher,
        member_id: &MemberId,
        amount: i32,
    ) -> DomainResult<MemberDto> {
        let mut member = self.members.get(tx, member_id)?;
        member.increase_activity_score(amount)?;
        self.save_modified(tx, publisher, member).await
    }

    async fn save_modified(
        &self,
        tx: &mut Transaction,
        publisher: &EventPublisher,
        member: Member,
    ) -> DomainResult<MemberDto> {
        let member = self.members.update(tx, member)?;
        let mut events = DomainEvents::new();
        member.raise_modified(&mut events)?;
        publisher.publish_all(tx, events).await?;
        Ok(member.to_dto())
    }
}

#[async_trait]
impl CommandHandler<JoinMember> for MemberService {
    async fn handle(&self, ctx: &mut CommandContext, cmd: JoinMember) -> Result<MemberDto, AppError> {
        if cmd.password.is_empty() {
            return Err(AppError::validation("password must not be empty"));
        }
        let (tx, publisher) = ctx.parts();
        Ok(self.join(tx, publisher, cmd).await?)
    }
}

#[async_trait]
impl CommandHandler<ChangeMemberNickname> for MemberService {
    async fn handle(
        &self,
        ctx: &mut CommandContext,
        cmd: ChangeMemberNickname,
    ) -> Result<MemberDto, AppError> {
        let (tx, publisher) = ctx.parts();
        Ok(self
            .change_nickname(tx, publisher, &cmd.member_id, cmd.nickname)
            .await?)
    }
}

#[async_trait]
impl CommandHandler<IncreaseActivityScore> for MemberService {
    async fn handle(
        &self,
        ctx: &mut CommandContext,
        cmd: IncreaseActivityScore,
    ) -> Result<MemberDto, AppError> {
        let (tx, publisher) = ctx.parts();
        Ok(self
            .increase_activity_score(tx, publisher, &cmd.member_id, cmd.amount)
            .await?)
    }
}
