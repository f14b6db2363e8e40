use replica_application::Platform;
use replica_application::cash::app::Deposit;
use replica_application::config::AppConfig;
use replica_application::context::AppContext;
use replica_application::market::app::{AddCartItem, CompleteOrderPayment, PlaceOrder};
use replica_application::member::app::JoinMember;
use replica_application::post::app::WritePost;
use replica_application::telemetry;
use tracing::info;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    telemetry::init(&config.log_filter);
    let platform = Platform::new(&config)?;
    let ctx = AppContext::actor("demo", "cli");

    // 加入会员
    let ann = platform
        .execute(
            &ctx,
            JoinMember {
                username: "ann".into(),
                password: "secret".into(),
                nickname: "ann".into(),
            },
        )
        .await?;
    platform.manager().wait_detached().await;
    info!(member_id = %ann.id, "joined");

    // 发帖：作者活跃度 +3，随后各上下文的副本重新折叠
    let post = platform
        .execute(
            &ctx,
            WritePost {
                author_id: ann.id.clone(),
                title: "hello".into(),
                content: "replicas everywhere".into(),
            },
        )
        .await?;
    platform.manager().wait_detached().await;
    println!("post #{} by {}", post.id, post.author_name);

    if let Some(member) = platform.payout.members.find_committed(&ann.id) {
        println!(
            "payout replica: nickname={}, activity_score={}",
            member.nickname(),
            member.activity_score()
        );
    }

    // 下单并支付：余额不足时支付被现金上下文否决
    platform
        .execute(
            &ctx,
            AddCartItem {
                buyer_id: ann.id.clone(),
                product_id: 1,
                price: 4_000,
            },
        )
        .await?;
    let order = platform
        .execute(&ctx, PlaceOrder { buyer_id: ann.id.clone() })
        .await?;

    let payment = CompleteOrderPayment {
        order_id: order.id.clone(),
    };
    if let Err(err) = platform.execute(&ctx, payment.clone()).await {
        println!("payment vetoed: {err}");
    }

    platform
        .execute(
            &ctx,
            Deposit {
                holder_id: ann.id.clone(),
                amount: 10_000,
            },
        )
        .await?;
    let paid = platform.execute(&ctx, payment).await?;
    platform.manager().wait_detached().await;
    println!("order #{} paid={}, total={}", paid.id, paid.paid, paid.total_price);

    if let Some(wallet) = platform.cash.wallets.find_committed(&ann.id) {
        println!("wallet balance={}", wallet.balance());
    }

    let failures = platform.manager().dead_letters().fetch_pending().await?;
    println!("dead letters: {}", failures.len());
    Ok(())
}
