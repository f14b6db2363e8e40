use anyhow::Result as AnyResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use replica_domain::domain_event::{DomainEvents, EventEnvelope};
use replica_domain::entity::{
    HasAuditTimestamps, HasIdentity, ReplicaEntity, SequentialIdentity, SourceEntity,
};
use replica_domain::error::{DomainError, DomainResult};
use replica_domain::eventing::{
    DeliveryPhase, DispatchConfig, EventHandler, EventPublisher, FoldOutcome, HandledEventType,
    HandlerContext, InProcessDispatcher, PostCommitMode, fold_replica,
};
use replica_domain::persist::{Table, TransactionManager};
use replica_domain::value_object::{AuditStamp, ReplicaStamp};
use replica_macros::{domain_event, entity_id};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

#[entity_id(sequential)]
struct AccountId(i64);

#[derive(Debug, Clone)]
struct Account {
    id: AccountId,
    audit: AuditStamp,
    name: String,
}

impl Account {
    fn open(name: &str) -> Self {
        Self {
            id: AccountId::unassigned(),
            audit: AuditStamp::new(Utc::now()),
            name: name.into(),
        }
    }

    fn rename(&mut self, name: &str) {
        self.name = name.into();
    }
}

impl HasIdentity for Account {
    type Id = AccountId;
    fn id(&self) -> &AccountId {
        &self.id
    }
}

impl HasAuditTimestamps for Account {
    fn created_at(&self) -> DateTime<Utc> {
        self.audit.created_at()
    }
    fn modified_at(&self) -> DateTime<Utc> {
        self.audit.modified_at()
    }
}

impl SourceEntity for Account {
    fn assign_id(&mut self, id: AccountId) {
        self.id = id;
    }
    fn audit_mut(&mut self) -> &mut AuditStamp {
        &mut self.audit
    }
}

#[domain_event(kind = "account.changed")]
struct AccountChanged {
    id: AccountId,
    name: String,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
}

impl From<&Account> for AccountChanged {
    fn from(a: &Account) -> Self {
        Self {
            id: a.id.clone(),
            name: a.name.clone(),
            created_at: a.created_at(),
            modified_at: a.modified_at(),
        }
    }
}

impl HasIdentity for AccountChanged {
    type Id = AccountId;
    fn id(&self) -> &AccountId {
        &self.id
    }
}

#[domain_event(kind = "account.view.created")]
struct AccountViewCreated {
    id: AccountId,
}

/// 依赖上下文中的副本，`notes` 为副本自有的派生字段
#[derive(Debug, Clone)]
struct AccountView {
    id: AccountId,
    stamp: ReplicaStamp,
    name: String,
    notes: u32,
}

impl HasIdentity for AccountView {
    type Id = AccountId;
    fn id(&self) -> &AccountId {
        &self.id
    }
}

impl HasAuditTimestamps for AccountView {
    fn created_at(&self) -> DateTime<Utc> {
        self.stamp.origin().created_at()
    }
    fn modified_at(&self) -> DateTime<Utc> {
        self.stamp.origin().modified_at()
    }
}

impl ReplicaEntity for AccountView {
    type Snapshot = AccountChanged;

    fn from_snapshot(s: &AccountChanged, folded_at: DateTime<Utc>) -> Self {
        Self {
            id: s.id.clone(),
            stamp: ReplicaStamp::first_sight(
                AuditStamp::copied(s.created_at, s.modified_at),
                folded_at,
            ),
            name: s.name.clone(),
            notes: 0,
        }
    }

    fn refresh(&mut self, s: &AccountChanged, folded_at: DateTime<Utc>) {
        self.stamp.refresh(s.modified_at, folded_at);
        self.name = s.name.clone();
    }

    fn folded_at(&self) -> DateTime<Utc> {
        self.stamp.folded_at()
    }
}

struct SyncViewHandler {
    views: Table<AccountView>,
}

#[async_trait]
impl EventHandler for SyncViewHandler {
    fn handler_name(&self) -> &str {
        "SyncViewHandler"
    }

    fn handled_event_type(&self) -> HandledEventType {
        HandledEventType::of::<AccountChanged>()
    }

    async fn handle(&self, ctx: &mut HandlerContext<'_>, envelope: &EventEnvelope) -> DomainResult<()> {
        let snapshot: AccountChanged = envelope.decode()?;
        let (view, outcome) = fold_replica(&self.views, ctx.tx(), &snapshot)?;
        if outcome == FoldOutcome::Created {
            ctx.publish(&AccountViewCreated { id: view.id.clone() }).await?;
        }
        Ok(())
    }
}

#[derive(Default)]
struct WelcomeHandler {
    seen: AtomicUsize,
}

#[async_trait]
impl EventHandler for WelcomeHandler {
    fn handler_name(&self) -> &str {
        "WelcomeHandler"
    }

    fn handled_event_type(&self) -> HandledEventType {
        HandledEventType::of::<AccountViewCreated>()
    }

    async fn handle(&self, ctx: &mut HandlerContext<'_>, envelope: &EventEnvelope) -> DomainResult<()> {
        assert_eq!(ctx.tx().context().causation_id(), Some(envelope.event_id()));
        self.seen.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// 事务内处理器：名称为 "veto" 时否决
struct VetoHandler;

#[async_trait]
impl EventHandler for VetoHandler {
    fn handler_name(&self) -> &str {
        "VetoHandler"
    }

    fn handled_event_type(&self) -> HandledEventType {
        HandledEventType::of::<AccountChanged>()
    }

    fn delivery_phase(&self) -> DeliveryPhase {
        DeliveryPhase::InTransaction
    }

    async fn handle(&self, _ctx: &mut HandlerContext<'_>, envelope: &EventEnvelope) -> DomainResult<()> {
        let snapshot: AccountChanged = envelope.decode()?;
        if snapshot.name == "veto" {
            return Err(DomainError::invalid_state("name is vetoed"));
        }
        Ok(())
    }
}

/// 首次执行失败，之后成功
#[derive(Default)]
struct FlakyHandler {
    failed_once: AtomicBool,
    succeeded: AtomicUsize,
}

#[async_trait]
impl EventHandler for FlakyHandler {
    fn handler_name(&self) -> &str {
        "FlakyHandler"
    }

    fn handled_event_type(&self) -> HandledEventType {
        HandledEventType::All
    }

    async fn handle(&self, _ctx: &mut HandlerContext<'_>, envelope: &EventEnvelope) -> DomainResult<()> {
        if !envelope.is::<AccountChanged>() {
            return Ok(());
        }
        if !self.failed_once.swap(true, Ordering::SeqCst) {
            return Err(DomainError::not_found("downstream row missing"));
        }
        self.succeeded.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct Fixture {
    accounts: Table<Account>,
    views: Table<AccountView>,
    dispatcher: Arc<InProcessDispatcher>,
    manager: TransactionManager,
    welcome: Arc<WelcomeHandler>,
}

fn fixture(mode: PostCommitMode) -> AnyResult<Fixture> {
    let accounts = Table::new("accounts");
    let views = Table::new("account_views");
    let dispatcher = Arc::new(InProcessDispatcher::new());
    let welcome = Arc::new(WelcomeHandler::default());

    dispatcher.register(Arc::new(VetoHandler))?;
    dispatcher.register(Arc::new(SyncViewHandler {
        views: views.clone(),
    }))?;
    dispatcher.register(welcome.clone())?;

    let manager = TransactionManager::builder()
        .publisher(EventPublisher::new(dispatcher.clone()))
        .config(DispatchConfig::builder().post_commit(mode).build())
        .build();

    Ok(Fixture {
        accounts,
        views,
        dispatcher,
        manager,
        welcome,
    })
}

impl Fixture {
    async fn open_and_rename(&self, name: &str) -> DomainResult<Account> {
        let mut tx = self.manager.begin();
        let mut account = self.accounts.insert(&mut tx, Account::open("draft"))?;
        account.rename(name);
        let account = self.accounts.update(&mut tx, account)?;
        let mut events = DomainEvents::new();
        events.raise(&AccountChanged::from(&account))?;

        match self.manager.publisher().publish_all(&mut tx, events).await {
            Ok(()) => {
                self.manager.commit(tx).await?;
                Ok(account)
            }
            Err(err) => {
                self.manager.rollback(tx);
                Err(err)
            }
        }
    }
}

#[tokio::test]
async fn after_commit_fold_creates_replica_and_chains() -> AnyResult<()> {
    let f = fixture(PostCommitMode::Inline)?;
    let account = f.open_and_rename("ann").await?;

    let view = f.views.find_committed(&account.id).expect("replica folded");
    assert_eq!(view.name, "ann");
    assert_eq!(view.created_at(), account.created_at());
    assert_eq!(f.welcome.seen.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn vetoed_transaction_keeps_source_and_replicas_untouched() -> AnyResult<()> {
    let f = fixture(PostCommitMode::Inline)?;

    let err = f.open_and_rename("veto").await.unwrap_err();
    assert!(matches!(err, DomainError::EventHandler { ref handler, .. } if handler == "VetoHandler"));
    assert!(matches!(err.root_cause(), DomainError::InvalidState { .. }));

    assert_eq!(f.accounts.count_committed(), 0);
    assert_eq!(f.views.count_committed(), 0);
    assert_eq!(f.welcome.seen.load(Ordering::SeqCst), 0);
    Ok(())
}

#[tokio::test]
async fn rollback_discards_after_commit_handlers() -> AnyResult<()> {
    let f = fixture(PostCommitMode::Inline)?;
    let mut tx = f.manager.begin();
    let account = f.accounts.insert(&mut tx, Account::open("ghost"))?;
    f.manager
        .publisher()
        .publish(&mut tx, &AccountChanged::from(&account))
        .await?;
    assert_eq!(tx.pending_deliveries(), 1);
    f.manager.rollback(tx);

    assert_eq!(f.accounts.count_committed(), 0);
    assert_eq!(f.views.count_committed(), 0);
    Ok(())
}

#[tokio::test]
async fn fold_is_idempotent_and_preserves_owned_fields() -> AnyResult<()> {
    let f = fixture(PostCommitMode::Inline)?;
    let account = f.open_and_rename("ann").await?;
    let snapshot = AccountChanged::from(&account);

    // 副本自有字段
    let mut tx = f.manager.begin();
    let mut view = f.views.get(&tx, &account.id)?;
    view.notes = 5;
    f.views.save(&mut tx, view)?;
    f.manager.commit(tx).await?;

    for _ in 0..2 {
        let mut tx = f.manager.begin();
        let (_, outcome) = fold_replica(&f.views, &mut tx, &snapshot)?;
        assert_eq!(outcome, FoldOutcome::Updated);
        f.manager.commit(tx).await?;
    }

    let view = f.views.find_committed(&account.id).expect("replica");
    assert_eq!(f.views.count_committed(), 1);
    assert_eq!(view.name, "ann");
    assert_eq!(view.notes, 5);
    assert_eq!(view.created_at(), account.created_at());
    Ok(())
}

#[tokio::test]
async fn failed_after_commit_handler_is_dead_lettered_and_redeliverable() -> AnyResult<()> {
    let f = fixture(PostCommitMode::Inline)?;
    let flaky = Arc::new(FlakyHandler::default());
    f.dispatcher.register(flaky.clone())?;

    let mut tx = f.manager.begin();
    let account = f.accounts.insert(&mut tx, Account::open("bob"))?;
    f.manager
        .publisher()
        .publish(&mut tx, &AccountChanged::from(&account))
        .await?;
    let report = f.manager.commit(tx).await?;

    // 源事务已提交，其他处理器照常执行
    assert!(f.accounts.find_committed(&account.id).is_some());
    assert!(f.views.find_committed(&account.id).is_some());
    assert_eq!(report.failures().len(), 1);
    assert_eq!(report.failures()[0].handler, "FlakyHandler");

    let letters = f.manager.dead_letters().fetch_pending().await?;
    assert_eq!(letters.len(), 1);
    assert_eq!(letters[0].attempts(), 1);

    let replay = f.manager.redeliver(&letters[0]).await?;
    assert!(replay.is_clean());
    assert_eq!(flaky.succeeded.load(Ordering::SeqCst), 1);
    assert!(f.manager.dead_letters().fetch_pending().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn duplicate_handler_names_are_rejected() -> AnyResult<()> {
    let f = fixture(PostCommitMode::Inline)?;
    let err = f.dispatcher.register(Arc::new(VetoHandler)).unwrap_err();
    assert!(matches!(err, DomainError::Dispatch { .. }));
    Ok(())
}

#[tokio::test]
async fn publishing_without_handlers_is_a_no_op() -> AnyResult<()> {
    let dispatcher = Arc::new(InProcessDispatcher::new());
    let manager = TransactionManager::builder()
        .publisher(EventPublisher::new(dispatcher))
        .build();

    let mut tx = manager.begin();
    manager
        .publisher()
        .publish(&mut tx, &AccountViewCreated { id: AccountId::from_sequence(1) })
        .await?;
    let report = manager.commit(tx).await?;
    assert_eq!(report.delivered(), 0);
    assert!(report.is_clean());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn detached_mode_runs_after_commit_work_on_background_task() -> AnyResult<()> {
    let f = fixture(PostCommitMode::Detached)?;
    let account = f.open_and_rename("ann").await?;

    tokio::time::timeout(Duration::from_secs(2), f.manager.wait_detached()).await?;
    assert!(f.views.find_committed(&account.id).is_some());
    assert_eq!(f.welcome.seen.load(Ordering::SeqCst), 1);
    Ok(())
}
