use anyhow::Result as AnyResult;
use async_trait::async_trait;
use replica_application::Platform;
use replica_application::cash::app::Deposit;
use replica_application::config::AppConfig;
use replica_application::context::AppContext;
use replica_application::error::AppError;
use replica_application::market::app::{AddCartItem, CompleteOrderPayment, PlaceOrder};
use replica_application::member::app::JoinMember;
use replica_application::shared::market::{MarketOrderPaymentCompleted, OrderDto};
use replica_application::shared::member::MemberDto;
use replica_domain::domain_event::EventEnvelope;
use replica_domain::error::{DomainError, DomainResult};
use replica_domain::eventing::{EventHandler, HandledEventType, HandlerContext};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Default)]
struct PaymentSpy {
    calls: AtomicUsize,
}

#[async_trait]
impl EventHandler for PaymentSpy {
    fn handler_name(&self) -> &str {
        "PaymentSpy"
    }

    fn handled_event_type(&self) -> HandledEventType {
        HandledEventType::of::<MarketOrderPaymentCompleted>()
    }

    async fn handle(&self, _ctx: &mut HandlerContext<'_>, _envelope: &EventEnvelope) -> DomainResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

async fn setup() -> AnyResult<(Platform, Arc<PaymentSpy>, MemberDto, OrderDto)> {
    let platform = Platform::new(&AppConfig::default())?;
    let spy = Arc::new(PaymentSpy::default());
    platform.dispatcher().register(spy.clone())?;

    let ctx = AppContext::default();
    let buyer = platform
        .execute(
            &ctx,
            JoinMember {
                username: "buyer".into(),
                password: "secret".into(),
                nickname: "buyer".into(),
            },
        )
        .await?;

    for (product_id, price) in [(1, 3_000), (2, 2_000)] {
        platform
            .execute(
                &ctx,
                AddCartItem {
                    buyer_id: buyer.id.clone(),
                    product_id,
                    price,
                },
            )
            .await?;
    }
    let order = platform
        .execute(
            &ctx,
            PlaceOrder {
                buyer_id: buyer.id.clone(),
            },
        )
        .await?;
    assert_eq!(order.total_price, 5_000);
    assert!(!order.paid);

    Ok((platform, spy, buyer, order))
}

#[tokio::test]
async fn insufficient_balance_vetoes_payment() -> AnyResult<()> {
    let (platform, spy, buyer, order) = setup().await?;
    platform
        .execute(
            &AppContext::default(),
            Deposit {
                holder_id: buyer.id.clone(),
                amount: 1_000,
            },
        )
        .await?;

    let err = platform
        .execute(
            &AppContext::default(),
            CompleteOrderPayment {
                order_id: order.id.clone(),
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Domain(DomainError::EventHandler { .. })));
    assert!(matches!(
        err.domain_cause(),
        Some(DomainError::InvalidState { reason }) if reason.contains("insufficient balance")
    ));

    let stored = platform.market.orders.find_committed(&order.id).expect("order");
    assert!(!stored.is_paid());
    let wallet = platform.cash.wallets.find_committed(&buyer.id).expect("wallet");
    assert_eq!(wallet.balance(), 1_000);
    assert_eq!(spy.calls.load(Ordering::SeqCst), 0);
    Ok(())
}

#[tokio::test]
async fn funded_payment_debits_wallet_then_notifies() -> AnyResult<()> {
    let (platform, spy, buyer, order) = setup().await?;
    platform
        .execute(
            &AppContext::default(),
            Deposit {
                holder_id: buyer.id.clone(),
                amount: 8_000,
            },
        )
        .await?;

    let paid = platform
        .execute(
            &AppContext::default(),
            CompleteOrderPayment {
                order_id: order.id.clone(),
            },
        )
        .await?;
    assert!(paid.paid);

    let wallet = platform.cash.wallets.find_committed(&buyer.id).expect("wallet");
    assert_eq!(wallet.balance(), 3_000);
    assert_eq!(spy.calls.load(Ordering::SeqCst), 1);
    assert!(platform.market.carts.find_committed(&buyer.id).is_some_and(|c| !c.has_items()));

    // 重复支付由订单自身拒绝
    let err = platform
        .execute(
            &AppContext::default(),
            CompleteOrderPayment {
                order_id: order.id.clone(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err.domain_cause(), Some(DomainError::InvalidState { .. })));
    assert_eq!(
        platform.cash.wallets.find_committed(&buyer.id).map(|w| w.balance()),
        Some(3_000)
    );
    Ok(())
}

#[tokio::test]
async fn ordering_an_empty_cart_fails() -> AnyResult<()> {
    let (platform, _spy, buyer, _order) = setup().await?;
    let err = platform
        .execute(
            &AppContext::default(),
            PlaceOrder {
                buyer_id: buyer.id.clone(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Domain(DomainError::InvalidState { .. })));
    assert_eq!(platform.market.orders.count_committed(), 1);
    Ok(())
}
