use std::collections::HashMap;

use async_trait::async_trait;
use common::{MemberId, OrderId, Page, PageRequest, PaymentId, ProductId, Version};
use domain::{Money, Order, OrderItem, OrderRecord};
use rust_decimal::Decimal;
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{OrderRepository, Result, StoreError};

const ORDER_COLUMNS: &str = "id, member_id, total_amount, payment_method, status, payment_id, \
                             version, created_at, updated_at";

/// PostgreSQL-backed order repository.
#[derive(Clone)]
pub struct PostgresOrderRepository {
    pool: PgPool,
}

impl PostgresOrderRepository {
    /// Creates a new PostgreSQL order repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    async fn insert(&self, order: &Order) -> Result<Order> {
        let mut tx = self.pool.begin().await?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO orders (member_id, total_amount, payment_method, status, payment_id, version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(order.member_id().as_i64())
        .bind(order.total_amount().amount())
        .bind(order.payment_method().as_str())
        .bind(order.status().as_str())
        .bind(order.payment_id().map(|p| p.as_i64()))
        .bind(Version::first().as_i64())
        .bind(order.created_at())
        .bind(order.updated_at())
        .fetch_one(&mut *tx)
        .await?;

        for (line_no, item) in order.items().iter().enumerate() {
            let line_no = int_column("line_no", line_no)?;
            let quantity = int_column("quantity", item.quantity())?;
            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, line_no, product_id, product_name, unit_price, quantity)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(id)
            .bind(line_no)
            .bind(item.product_id().as_i64())
            .bind(item.product_name())
            .bind(item.unit_price().amount())
            .bind(quantity)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(order.clone().into_persisted(OrderId::new(id), Version::first()))
    }

    async fn update(&self, id: OrderId, order: &Order) -> Result<Order> {
        // Items and total are fixed at creation; only lifecycle columns change.
        let new_version: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE orders
            SET status = $1, payment_id = $2, updated_at = $3, version = version + 1
            WHERE id = $4 AND version = $5
            RETURNING version
            "#,
        )
        .bind(order.status().as_str())
        .bind(order.payment_id().map(|p| p.as_i64()))
        .bind(order.updated_at())
        .bind(id.as_i64())
        .bind(order.version().as_i64())
        .fetch_optional(&self.pool)
        .await?;

        if let Some(version) = new_version {
            return Ok(order.clone().into_persisted(id, Version::new(version)));
        }

        let current: Option<i64> = sqlx::query_scalar("SELECT version FROM orders WHERE id = $1")
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        match current {
            Some(actual) => Err(StoreError::ConcurrencyConflict {
                order_id: id,
                expected: order.version(),
                actual: Version::new(actual),
            }),
            None => Err(StoreError::OrderNotFound(id)),
        }
    }

    async fn load_items(&self, ids: &[i64]) -> Result<HashMap<i64, Vec<OrderItem>>> {
        let rows = sqlx::query(
            r#"
            SELECT order_id, product_id, product_name, unit_price, quantity
            FROM order_items
            WHERE order_id = ANY($1)
            ORDER BY order_id ASC, line_no ASC
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let mut items: HashMap<i64, Vec<OrderItem>> = HashMap::new();
        for row in rows {
            let order_id: i64 = row.try_get("order_id")?;
            items.entry(order_id).or_default().push(Self::row_to_item(&row)?);
        }
        Ok(items)
    }

    async fn fetch_page(
        &self,
        member_id: Option<MemberId>,
        page: PageRequest,
    ) -> Result<Page<Order>> {
        let member_filter = member_id.map(|m| m.as_i64());

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM orders WHERE ($1::BIGINT IS NULL OR member_id = $1)",
        )
        .bind(member_filter)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE ($1::BIGINT IS NULL OR member_id = $1) \
             ORDER BY id ASC LIMIT $2 OFFSET $3"
        ))
        .bind(member_filter)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let ids = rows
            .iter()
            .map(|row| row.try_get::<i64, _>("id"))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let mut items = self.load_items(&ids).await?;

        let orders = rows
            .into_iter()
            .map(|row| {
                let id: i64 = row.try_get("id")?;
                Self::row_to_order(row, items.remove(&id).unwrap_or_default())
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Page::new(orders, page, total.max(0) as u64))
    }

    fn row_to_item(row: &PgRow) -> Result<OrderItem> {
        let quantity: i32 = row.try_get("quantity")?;
        let quantity = u32::try_from(quantity)
            .map_err(|_| StoreError::InvalidRecord(format!("negative quantity {quantity}")))?;
        let unit_price: Decimal = row.try_get("unit_price")?;
        let product_name: String = row.try_get("product_name")?;

        OrderItem::new(
            ProductId::new(row.try_get("product_id")?),
            product_name,
            Money::new(unit_price),
            quantity,
        )
        .map_err(|e| StoreError::InvalidRecord(e.to_string()))
    }

    fn row_to_order(row: PgRow, items: Vec<OrderItem>) -> Result<Order> {
        let payment_method: String = row.try_get("payment_method")?;
        let status: String = row.try_get("status")?;
        let total_amount: Decimal = row.try_get("total_amount")?;
        let payment_id: Option<i64> = row.try_get("payment_id")?;

        let record = OrderRecord {
            id: OrderId::new(row.try_get("id")?),
            member_id: MemberId::new(row.try_get("member_id")?),
            items,
            total_amount: Money::new(total_amount),
            payment_method: payment_method
                .parse()
                .map_err(|e: domain::DomainError| StoreError::InvalidRecord(e.to_string()))?,
            status: status
                .parse()
                .map_err(|e: domain::DomainError| StoreError::InvalidRecord(e.to_string()))?,
            payment_id: payment_id.map(PaymentId::new),
            version: Version::new(row.try_get("version")?),
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        };

        Ok(Order::from_record(record))
    }
}

/// Converts a value bound to an `INT` column, refusing values that do not fit.
fn int_column<T>(column: &str, value: T) -> Result<i32>
where
    T: TryInto<i32> + std::fmt::Display + Copy,
{
    value
        .try_into()
        .map_err(|_| StoreError::InvalidRecord(format!("{column} out of range: {value}")))
}

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    async fn save(&self, order: &Order) -> Result<Order> {
        let saved = match order.id() {
            None => self.insert(order).await?,
            Some(id) => self.update(id, order).await?,
        };
        tracing::debug!(order_id = ?saved.id(), version = %saved.version(), "order saved");
        Ok(saved)
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut items = self.load_items(&[id.as_i64()]).await?;
        let order = Self::row_to_order(row, items.remove(&id.as_i64()).unwrap_or_default())?;
        Ok(Some(order))
    }

    async fn list(&self, page: PageRequest) -> Result<Page<Order>> {
        self.fetch_page(None, page).await
    }

    async fn list_by_member(&self, member_id: MemberId, page: PageRequest) -> Result<Page<Order>> {
        self.fetch_page(Some(member_id), page).await
    }
}
