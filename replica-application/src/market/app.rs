use super::domain::{Cart, LineItem, MarketMember, Order};
use crate::command::Command;
use crate::command_handler::CommandHandler;
use crate::context::CommandContext;
use crate::error::AppError;
use crate::shared::market::{CartDto, OrderDto, OrderId};
use crate::shared::member::MemberId;
use async_trait::async_trait;
use replica_domain::domain_event::DomainEvents;
use replica_domain::error::DomainResult;
use replica_domain::persist::{Table, Transaction};
use tracing::info;

#[derive(Debug, Clone)]
pub struct AddCartItem {
    pub buyer_id: MemberId,
    pub product_id: i64,
    pub price: i64,
}

impl Command for AddCartItem {
    const NAME: &'static str = "market.add_cart_item";
    type Output = CartDto;
}

/// 以购物车当前内容下单
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub buyer_id: MemberId,
}

impl Command for PlaceOrder {
    const NAME: &'static str = "market.place_order";
    type Output = OrderDto;
}

/// 完成订单支付；现金上下文在同一事务内扣款，余额不足时整个事务回滚
#[derive(Debug, Clone)]
pub struct CompleteOrderPayment {
    pub order_id: OrderId,
}

impl Command for CompleteOrderPayment {
    const NAME: &'static str = "market.complete_order_payment";
    type Output = OrderDto;
}

#[derive(Clone)]
pub struct MarketService {
    members: Table<MarketMember>,
    carts: Table<Cart>,
    orders: Table<Order>,
}

impl MarketService {
    pub fn new(members: Table<MarketMember>, carts: Table<Cart>, orders: Table<Order>) -> Self {
        Self {
            members,
            carts,
            orders,
        }
    }

    /// 为新同步的会员创建购物车；已存在时不重复创建
    pub fn create_cart(&self, tx: &mut Transaction, buyer_id: &MemberId) -> DomainResult<CartDto> {
        if let Some(cart) = self.carts.find(tx, buyer_id)? {
            return Ok(cart.to_dto());
        }
        let buyer = self.members.get(tx, buyer_id)?;
        let cart = Cart::new(&buyer);
        self.carts.save(tx, cart.clone())?;
        info!(member_id = %buyer_id, "cart created");
        Ok(cart.to_dto())
    }
}

#[async_trait]
impl CommandHandler<AddCartItem> for MarketService {
    async fn handle(&self, ctx: &mut CommandContext, cmd: AddCartItem) -> Result<CartDto, AppError> {
        let mut cart = self.carts.get(ctx.tx(), &cmd.buyer_id)?;
        cart.add_item(LineItem::new(cmd.product_id, cmd.price)?);
        self.carts.save(ctx.tx(), cart.clone())?;
        Ok(cart.to_dto())
    }
}

#[async_trait]
impl CommandHandler<PlaceOrder> for MarketService {
    async fn handle(&self, ctx: &mut CommandContext, cmd: PlaceOrder) -> Result<OrderDto, AppError> {
        let mut cart = self.carts.get(ctx.tx(), &cmd.buyer_id)?;
        let order = Order::place(&mut cart)?;
        self.carts.save(ctx.tx(), cart)?;
        let order = self.orders.insert(ctx.tx(), order)?;
        Ok(order.to_dto())
    }
}

#[async_trait]
impl CommandHandler<CompleteOrderPayment> for MarketService {
    async fn handle(
        &self,
        ctx: &mut CommandContext,
        cmd: CompleteOrderPayment,
    ) -> Result<OrderDto, AppError> {
        let mut order = self.orders.get(ctx.tx(), &cmd.order_id)?;
        order.complete_payment()?;
        let order = self.orders.update(ctx.tx(), order)?;

        let mut events = DomainEvents::new();
        order.raise_payment_completed(&mut events)?;
        ctx.publish_all(events).await?;
        Ok(order.to_dto())
    }
}
