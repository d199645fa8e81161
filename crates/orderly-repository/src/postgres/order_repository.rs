//! Postgres order repository implementation.

use crate::{traits::OrderRepository, DatabasePoolInterface};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use orderly_core::{Delivery, Item, Order, OrderHeader, OrderlyError, OrderlyResult, Payment};
use shaku::Component;
use sqlx::{FromRow, PgExecutor, Postgres, QueryBuilder};
use std::sync::Arc;
use tracing::{debug, info};

/// Postgres order repository implementation.
#[derive(Component, Clone)]
#[shaku(interface = OrderRepository)]
pub struct PgOrderRepository {
    #[shaku(inject)]
    pool: Arc<dyn DatabasePoolInterface>,
}

impl PgOrderRepository {
    /// Creates a new Postgres order repository.
    #[must_use]
    pub fn new(pool: Arc<dyn DatabasePoolInterface>) -> Self {
        Self { pool }
    }
}

/// Rows per item insert statement. Each row binds 13 parameters and
/// Postgres caps a statement at 65535.
const ITEM_INSERT_BATCH: usize = 1000;

const SELECT_ORDER: &str = r"
    SELECT order_uid, track_number, entry, locale, internal_signature, customer_id,
           delivery_service, shardkey, sm_id, date_created, oof_shard
    FROM orders";

#[derive(Debug, FromRow)]
struct OrderRow {
    order_uid: String,
    track_number: String,
    entry: String,
    locale: String,
    internal_signature: String,
    customer_id: String,
    delivery_service: String,
    shardkey: String,
    sm_id: i32,
    date_created: DateTime<Utc>,
    oof_shard: String,
}

impl From<OrderRow> for OrderHeader {
    fn from(row: OrderRow) -> Self {
        Self {
            uid: row.order_uid,
            track_number: row.track_number,
            entry: row.entry,
            locale: row.locale,
            internal_signature: row.internal_signature,
            customer_id: row.customer_id,
            delivery_service: row.delivery_service,
            shard_key: row.shardkey,
            stock_management_id: row.sm_id,
            date_created: row.date_created,
            out_of_failure_shard: row.oof_shard,
        }
    }
}

#[derive(Debug, FromRow)]
struct DeliveryRow {
    name: String,
    phone: String,
    zip: String,
    city: String,
    address: String,
    region: String,
    email: String,
}

impl From<DeliveryRow> for Delivery {
    fn from(row: DeliveryRow) -> Self {
        Self {
            name: row.name,
            phone: row.phone,
            zip: row.zip,
            city: row.city,
            address: row.address,
            region: row.region,
            email: row.email,
        }
    }
}

#[derive(Debug, FromRow)]
struct PaymentRow {
    transaction: String,
    request_id: String,
    currency: String,
    provider: String,
    amount: i64,
    payment_dt: i64,
    bank: String,
    delivery_cost: i64,
    goods_total: i64,
    custom_fee: i64,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = OrderlyError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        Ok(Self {
            transaction_id: row.transaction,
            request_id: row.request_id,
            currency: row.currency,
            provider: row.provider,
            amount: money("payments.amount", row.amount)?,
            payment_timestamp: row.payment_dt,
            bank: row.bank,
            delivery_cost: money("payments.delivery_cost", row.delivery_cost)?,
            goods_total: money("payments.goods_total", row.goods_total)?,
            custom_fee: money("payments.custom_fee", row.custom_fee)?,
        })
    }
}

#[derive(Debug, FromRow)]
struct ItemRow {
    chrt_id: i64,
    track_number: String,
    price: i64,
    rid: String,
    name: String,
    sale: i16,
    size: String,
    total_price: i64,
    nm_id: i64,
    brand: String,
    status: i32,
}

impl TryFrom<ItemRow> for Item {
    type Error = OrderlyError;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        Ok(Self {
            chart_id: row.chrt_id,
            track_number: row.track_number,
            price: money("order_items.price", row.price)?,
            rid: row.rid,
            name: row.name,
            sale_percent: i8::try_from(row.sale).map_err(|_| out_of_range("order_items.sale", row.sale))?,
            size: row.size,
            total_price: money("order_items.total_price", row.total_price)?,
            nomenclature_id: row.nm_id,
            brand: row.brand,
            status: row.status,
        })
    }
}

fn money(column: &str, value: i64) -> OrderlyResult<u32> {
    u32::try_from(value).map_err(|_| out_of_range(column, value))
}

fn out_of_range(column: &str, value: impl std::fmt::Display) -> OrderlyError {
    OrderlyError::internal(format!("Column {column} out of range: {value}"))
}

async fn load_header<'e, E: PgExecutor<'e>>(executor: E, order_uid: &str) -> OrderlyResult<OrderHeader> {
    sqlx::query_as::<_, OrderRow>(&format!("{SELECT_ORDER} WHERE order_uid = $1"))
        .bind(order_uid)
        .fetch_optional(executor)
        .await?
        .map(OrderHeader::from)
        .ok_or_else(|| OrderlyError::not_found("Order", order_uid))
}

async fn load_delivery<'e, E: PgExecutor<'e>>(executor: E, order_uid: &str) -> OrderlyResult<Delivery> {
    sqlx::query_as::<_, DeliveryRow>(
        r"
        SELECT name, phone, zip, city, address, region, email
        FROM deliveries
        WHERE order_uid = $1
        ",
    )
    .bind(order_uid)
    .fetch_optional(executor)
    .await?
    .map(Delivery::from)
    .ok_or_else(|| OrderlyError::not_found("Delivery", order_uid))
}

async fn load_payment<'e, E: PgExecutor<'e>>(executor: E, order_uid: &str) -> OrderlyResult<Payment> {
    sqlx::query_as::<_, PaymentRow>(
        r"
        SELECT transaction, request_id, currency, provider, amount, payment_dt,
               bank, delivery_cost, goods_total, custom_fee
        FROM payments
        WHERE order_uid = $1
        ",
    )
    .bind(order_uid)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| OrderlyError::not_found("Payment", order_uid))?
    .try_into()
}

async fn load_items<'e, E: PgExecutor<'e>>(executor: E, order_uid: &str) -> OrderlyResult<Vec<Item>> {
    sqlx::query_as::<_, ItemRow>(
        r"
        SELECT chrt_id, track_number, price, rid, name, sale, size,
               total_price, nm_id, brand, status
        FROM order_items
        WHERE order_uid = $1
        ORDER BY position
        ",
    )
    .bind(order_uid)
    .fetch_all(executor)
    .await?
    .into_iter()
    .map(Item::try_from)
    .collect()
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn exists(&self, order_uid: &str) -> OrderlyResult<bool> {
        let result: Option<i32> = sqlx::query_scalar("SELECT 1 FROM orders WHERE order_uid = $1")
            .bind(order_uid)
            .fetch_optional(self.pool.inner())
            .await?;

        Ok(result.is_some())
    }

    async fn find_by_uid(&self, order_uid: &str) -> OrderlyResult<Order> {
        debug!(order_uid = %order_uid, "Loading order");

        let mut tx = self.pool.inner().begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ")
            .execute(&mut *tx)
            .await?;

        let header = load_header(&mut *tx, order_uid).await?;
        let delivery = load_delivery(&mut *tx, order_uid).await?;
        let payment = load_payment(&mut *tx, order_uid).await?;
        let items = load_items(&mut *tx, order_uid).await?;
        tx.commit().await?;

        Ok(Order::from_parts(header, delivery, payment, items))
    }

    async fn find_recent(&self, limit: u32) -> OrderlyResult<Vec<OrderHeader>> {
        debug!(limit, "Loading most recent orders");

        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "{SELECT_ORDER} ORDER BY date_created DESC, order_uid LIMIT $1"
        ))
        .bind(i64::from(limit))
        .fetch_all(self.pool.inner())
        .await?;

        Ok(rows.into_iter().map(OrderHeader::from).collect())
    }

    async fn find_delivery(&self, order_uid: &str) -> OrderlyResult<Delivery> {
        load_delivery(self.pool.inner(), order_uid).await
    }

    async fn find_payment(&self, order_uid: &str) -> OrderlyResult<Payment> {
        load_payment(self.pool.inner(), order_uid).await
    }

    async fn find_items(&self, order_uid: &str) -> OrderlyResult<Vec<Item>> {
        load_items(self.pool.inner(), order_uid).await
    }

    async fn save(&self, order: &Order) -> OrderlyResult<()> {
        debug!(order_uid = %order.uid, items = order.items.len(), "Saving order");

        let mut tx = self.pool.inner().begin().await?;

        sqlx::query(
            r"
            INSERT INTO orders (order_uid, track_number, entry, locale, internal_signature,
                                customer_id, delivery_service, shardkey, sm_id, date_created, oof_shard)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (order_uid) DO UPDATE SET
                track_number = EXCLUDED.track_number,
                entry = EXCLUDED.entry,
                locale = EXCLUDED.locale,
                internal_signature = EXCLUDED.internal_signature,
                customer_id = EXCLUDED.customer_id,
                delivery_service = EXCLUDED.delivery_service,
                shardkey = EXCLUDED.shardkey,
                sm_id = EXCLUDED.sm_id,
                date_created = EXCLUDED.date_created,
                oof_shard = EXCLUDED.oof_shard
            ",
        )
        .bind(&order.uid)
        .bind(&order.track_number)
        .bind(&order.entry)
        .bind(&order.locale)
        .bind(&order.internal_signature)
        .bind(&order.customer_id)
        .bind(&order.delivery_service)
        .bind(&order.shard_key)
        .bind(order.stock_management_id)
        .bind(order.date_created)
        .bind(&order.out_of_failure_shard)
        .execute(&mut *tx)
        .await?;

        let delivery = &order.delivery;
        sqlx::query(
            r"
            INSERT INTO deliveries (order_uid, name, phone, zip, city, address, region, email)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (order_uid) DO UPDATE SET
                name = EXCLUDED.name,
                phone = EXCLUDED.phone,
                zip = EXCLUDED.zip,
                city = EXCLUDED.city,
                address = EXCLUDED.address,
                region = EXCLUDED.region,
                email = EXCLUDED.email
            ",
        )
        .bind(&order.uid)
        .bind(&delivery.name)
        .bind(&delivery.phone)
        .bind(&delivery.zip)
        .bind(&delivery.city)
        .bind(&delivery.address)
        .bind(&delivery.region)
        .bind(&delivery.email)
        .execute(&mut *tx)
        .await?;

        let payment = &order.payment;
        sqlx::query(
            r"
            INSERT INTO payments (order_uid, transaction, request_id, currency, provider, amount,
                                  payment_dt, bank, delivery_cost, goods_total, custom_fee)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (order_uid) DO UPDATE SET
                transaction = EXCLUDED.transaction,
                request_id = EXCLUDED.request_id,
                currency = EXCLUDED.currency,
                provider = EXCLUDED.provider,
                amount = EXCLUDED.amount,
                payment_dt = EXCLUDED.payment_dt,
                bank = EXCLUDED.bank,
                delivery_cost = EXCLUDED.delivery_cost,
                goods_total = EXCLUDED.goods_total,
                custom_fee = EXCLUDED.custom_fee
            ",
        )
        .bind(&order.uid)
        .bind(&payment.transaction_id)
        .bind(&payment.request_id)
        .bind(&payment.currency)
        .bind(&payment.provider)
        .bind(i64::from(payment.amount))
        .bind(payment.payment_timestamp)
        .bind(&payment.bank)
        .bind(i64::from(payment.delivery_cost))
        .bind(i64::from(payment.goods_total))
        .bind(i64::from(payment.custom_fee))
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM order_items WHERE order_uid = $1")
            .bind(&order.uid)
            .execute(&mut *tx)
            .await?;

        for (batch, items) in order.items.chunks(ITEM_INSERT_BATCH).enumerate() {
            let first = i32::try_from(batch * ITEM_INSERT_BATCH)
                .map_err(|_| OrderlyError::invalid_entity("order.items", "too many items"))?;
            let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new(
                "INSERT INTO order_items (order_uid, position, chrt_id, track_number, price, rid, \
                 name, sale, size, total_price, nm_id, brand, status) ",
            );
            builder.push_values((first..).zip(items), |mut row, (position, item)| {
                row.push_bind(&order.uid)
                    .push_bind(position)
                    .push_bind(item.chart_id)
                    .push_bind(&item.track_number)
                    .push_bind(i64::from(item.price))
                    .push_bind(&item.rid)
                    .push_bind(&item.name)
                    .push_bind(i16::from(item.sale_percent))
                    .push_bind(&item.size)
                    .push_bind(i64::from(item.total_price))
                    .push_bind(item.nomenclature_id)
                    .push_bind(&item.brand)
                    .push_bind(item.status);
            });
            builder.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;

        info!(order_uid = %order.uid, items = order.items.len(), "Order persisted");
        Ok(())
    }
}
