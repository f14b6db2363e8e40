use crate::{
    command::Command,
    command_bus::CommandBus,
    command_handler::CommandHandler,
    context::{AppContext, CommandContext},
    error::AppError,
};
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use replica_domain::persist::TransactionManager;
use std::any::{Any, TypeId};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{Instrument, debug, info_span, warn};

type CmdOutput = Box<dyn Any + Send>;

type CmdHandlerFuture<'a> = Pin<Box<dyn Future<Output = Result<CmdOutput, AppError>> + Send + 'a>>;

type CmdHandlerFn = Arc<
    dyn for<'a> Fn(Box<dyn Any + Send>, &'a mut CommandContext) -> CmdHandlerFuture<'a>
        + Send
        + Sync,
>;

/// 基于内存的事务性 CommandBus 实现
/// - 通过 TypeId 注册不同 Command 对应的 Handler
/// - 运行时以类型擦除（Any）方式进行调度
/// - 每条命令一个事务：处理成功则提交并释放提交后处理器，失败则回滚
pub struct InMemoryCommandBus {
    manager: TransactionManager,
    handlers: DashMap<TypeId, CmdHandlerFn>,
}

impl InMemoryCommandBus {
    pub fn new(manager: TransactionManager) -> Self {
        Self {
            manager,
            handlers: DashMap::new(),
        }
    }

    pub fn manager(&self) -> &TransactionManager {
        &self.manager
    }

    /// 注册命令处理器；同一命令只能注册一次
    pub fn register<C, H>(&self, handler: Arc<H>) -> Result<(), AppError>
    where
        C: Command,
        H: CommandHandler<C> + 'static,
    {
        let f: CmdHandlerFn = Arc::new(move |boxed_cmd, ctx| {
            let handler = handler.clone();

            Box::pin(async move {
                // 键与闭包同一泛型 C，downcast 不会失败
                match boxed_cmd.downcast::<C>() {
                    Ok(cmd) => handler
                        .handle(ctx, *cmd)
                        .await
                        .map(|out| Box::new(out) as CmdOutput),
                    Err(_) => Err(AppError::TypeMismatch {
                        expected: C::NAME,
                        found: "unknown",
                    }),
                }
            })
        });

        match self.handlers.entry(TypeId::of::<C>()) {
            Entry::Occupied(_) => Err(AppError::AlreadyRegisteredCommand { command: C::NAME }),
            Entry::Vacant(slot) => {
                slot.insert(f);
                Ok(())
            }
        }
    }
}

#[async_trait]
impl CommandBus for InMemoryCommandBus {
    async fn dispatch<C: Command>(&self, ctx: &AppContext, cmd: C) -> Result<C::Output, AppError> {
        let Some(f) = self.handlers.get(&TypeId::of::<C>()).map(|h| h.clone()) else {
            return Err(AppError::HandlerNotFound(C::NAME));
        };

        let tx = self.manager.begin_with(ctx.biz.clone());
        let span = info_span!("command", name = C::NAME, transaction_id = %tx.id());
        let mut cmd_ctx = CommandContext::new(ctx.clone(), tx, self.manager.publisher().clone());

        let result = (f)(Box::new(cmd), &mut cmd_ctx)
            .instrument(span.clone())
            .await;
        let tx = cmd_ctx.into_transaction();

        match result {
            Ok(output) => {
                let report = self.manager.commit(tx).instrument(span).await?;
                if !report.is_clean() {
                    warn!(
                        command = C::NAME,
                        failures = report.failures().len(),
                        "command committed, some after-commit handlers failed"
                    );
                }
                output
                    .downcast::<C::Output>()
                    .map(|out| *out)
                    .map_err(|_| AppError::TypeMismatch {
                        expected: std::any::type_name::<C::Output>(),
                        found: "unknown",
                    })
            }
            Err(err) => {
                debug!(command = C::NAME, error = %err, "command failed, rolling back");
                self.manager.rollback(tx);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use replica_domain::eventing::{EventPublisher, InProcessDispatcher};
    use replica_domain::persist::Table;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Ping(usize);

    impl Command for Ping {
        const NAME: &'static str = "Ping";
        type Output = usize;
    }

    #[derive(Default)]
    struct PingHandler {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CommandHandler<Ping> for PingHandler {
        async fn handle(&self, _ctx: &mut CommandContext, cmd: Ping) -> Result<usize, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if cmd.0 == 0 {
                return Err(AppError::validation("zero"));
            }
            Ok(cmd.0 * 2)
        }
    }

    fn manager() -> TransactionManager {
        TransactionManager::builder()
            .publisher(EventPublisher::new(Arc::new(InProcessDispatcher::new())))
            .build()
    }

    #[tokio::test]
    async fn dispatch_routes_by_command_type() {
        let bus = InMemoryCommandBus::new(manager());
        let handler = Arc::new(PingHandler::default());
        bus.register::<Ping, _>(handler.clone()).unwrap();

        let out = bus.dispatch(&AppContext::default(), Ping(21)).await.unwrap();
        assert_eq!(out, 42);

        let err = bus.dispatch(&AppContext::default(), Ping(0)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(handler.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn duplicate_registration_and_missing_handler() {
        let bus = InMemoryCommandBus::new(manager());
        bus.register::<Ping, _>(Arc::new(PingHandler::default())).unwrap();
        let err = bus
            .register::<Ping, _>(Arc::new(PingHandler::default()))
            .unwrap_err();
        assert!(matches!(err, AppError::AlreadyRegisteredCommand { command: "Ping" }));

        let empty = InMemoryCommandBus::new(manager());
        let err = empty.dispatch(&AppContext::default(), Ping(1)).await.unwrap_err();
        assert!(matches!(err, AppError::HandlerNotFound("Ping")));
    }

    #[derive(Debug, Clone)]
    struct Row {
        id: Key,
    }

    #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
    struct Key(i64);

    impl std::fmt::Display for Key {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    impl replica_domain::entity::Identity for Key {}

    impl replica_domain::entity::HasIdentity for Row {
        type Id = Key;
        fn id(&self) -> &Key {
            &self.id
        }
    }

    struct WriteThenFail {
        rows: Table<Row>,
    }

    impl Command for WriteThenFailCmd {
        const NAME: &'static str = "WriteThenFail";
        type Output = ();
    }

    struct WriteThenFailCmd {
        fail: bool,
    }

    #[async_trait]
    impl CommandHandler<WriteThenFailCmd> for WriteThenFail {
        async fn handle(&self, ctx: &mut CommandContext, cmd: WriteThenFailCmd) -> Result<(), AppError> {
            self.rows.save(ctx.tx(), Row { id: Key(1) })?;
            if cmd.fail {
                return Err(AppError::validation("fail after write"));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn failed_command_rolls_back_its_writes() {
        let rows = Table::<Row>::new("rows");
        let bus = InMemoryCommandBus::new(manager());
        bus.register::<WriteThenFailCmd, _>(Arc::new(WriteThenFail { rows: rows.clone() }))
            .unwrap();

        let _ = bus
            .dispatch(&AppContext::default(), WriteThenFailCmd { fail: true })
            .await;
        assert_eq!(rows.count_committed(), 0);

        bus.dispatch(&AppContext::default(), WriteThenFailCmd { fail: false })
            .await
            .unwrap();
        assert_eq!(rows.count_committed(), 1);
    }
}
