//! Order creation: the one place that turns a quantity map from the
//! session into an order with items, stock decrements and inventory log
//! entries.
//!
//! The whole sequence runs inside a single transaction, so the invariant
//! `sum(order_items.subtotal_cents) == orders.total_cents` and the
//! one-log-per-decrement rule hold even if the process dies mid-way.

use crate::error::{AppError, AppResult};
use crate::model::{
    Order, OrderStatus, PaymentMethod, PaymentStatus, format_cents, generate_order_number,
};
use indexmap::IndexMap;
use sqlx::SqlitePool;

pub const REASON_SALE: &str = "Venta";

/// A priced line, used to render the cart and POS screens.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SaleLine {
    pub product_id: i64,
    pub product_name: String,
    pub unit_price_cents: i64,
    pub quantity: i64,
    pub subtotal_cents: i64,
    pub stock: i64,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct PricedSale {
    pub lines: Vec<SaleLine>,
    pub total_cents: i64,
}

/// Price the session's quantity map against current product rows,
/// without touching stock. Unknown products are dropped (they may have
/// been deleted while sitting in a cart).
pub async fn price_lines(pool: &SqlitePool, quantities: &IndexMap<i64, i64>) -> AppResult<PricedSale> {
    let mut lines = Vec::with_capacity(quantities.len());
    let mut total_cents = 0;

    for (&product_id, &quantity) in quantities {
        let Some(product) = crate::repo::products::find_by_id(pool, product_id).await? else {
            continue;
        };
        let subtotal_cents = product.price_cents * quantity;
        total_cents += subtotal_cents;
        lines.push(SaleLine {
            product_id,
            product_name: product.name,
            unit_price_cents: product.price_cents,
            quantity,
            subtotal_cents,
            stock: product.stock,
        });
    }

    Ok(PricedSale { lines, total_cents })
}

#[derive(Debug, Clone)]
pub struct OrderParams {
    /// Order number prefix: "ORD" for checkout, "POS" for point of sale.
    pub prefix: &'static str,
    pub customer_id: Option<i64>,
    pub customer_name: Option<String>,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    /// Cash tendered, in cents. When set, payment is validated against
    /// the total and the notes record payment and change.
    pub tendered_cents: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub order: Order,
    pub total_cents: i64,
    pub tendered_cents: Option<i64>,
    pub change_cents: i64,
}

/// Validate every line's stock, create the order, its items, the stock
/// decrements and one inventory log row per decrement, atomically.
///
/// Ids whose product no longer exists are dropped, like in
/// [`price_lines`]. Any rejection (nothing left to sell, short stock,
/// short payment) rolls back with no side effects.
pub async fn place_order(
    pool: &SqlitePool,
    quantities: &IndexMap<i64, i64>,
    params: OrderParams,
) -> AppResult<PlacedOrder> {
    let quantities: Vec<(i64, i64)> = quantities
        .iter()
        .map(|(&id, &qty)| (id, qty))
        .filter(|&(_, qty)| qty > 0)
        .collect();
    if quantities.is_empty() {
        return Err(AppError::EmptySale);
    }

    let now = chrono::Utc::now().naive_utc();
    let order_number = generate_order_number(params.prefix);

    let mut tx = pool.begin().await?;

    // Re-validate stock against current rows inside the transaction.
    // Products deleted since the cart was filled are dropped, mirroring
    // price_lines.
    let mut lines = Vec::with_capacity(quantities.len());
    let mut total_cents = 0;
    for (product_id, quantity) in quantities {
        let product: Option<crate::model::Product> =
            sqlx::query_as("SELECT * FROM products WHERE id = ?1")
                .bind(product_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(product) = product else {
            continue;
        };

        if product.stock < quantity {
            return Err(AppError::InsufficientStock {
                product: product.name,
                available: product.stock,
                requested: quantity,
            });
        }

        total_cents += product.price_cents * quantity;
        lines.push((product, quantity));
    }

    if lines.is_empty() {
        return Err(AppError::EmptySale);
    }

    let (notes, change_cents) = match params.tendered_cents {
        Some(tendered) => {
            if tendered < total_cents {
                return Err(AppError::InsufficientPayment {
                    total_cents,
                    paid_cents: tendered,
                });
            }
            let change = tendered - total_cents;
            let notes = format!(
                "Pago: ${} | Cambio: ${}",
                format_cents(tendered),
                format_cents(change)
            );
            (Some(notes), change)
        }
        None => (None, 0),
    };

    let order_id = sqlx::query(
        "INSERT INTO orders (order_number, customer_id, customer_name, total_cents, status, \
                             payment_method, payment_status, notes, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
    )
    .bind(&order_number)
    .bind(params.customer_id)
    .bind(&params.customer_name)
    .bind(total_cents)
    .bind(params.status)
    .bind(params.payment_method)
    .bind(params.payment_status)
    .bind(&notes)
    .bind(now)
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    for (product, quantity) in &lines {
        let subtotal_cents = product.price_cents * quantity;
        sqlx::query(
            "INSERT INTO order_items (order_id, product_id, quantity, unit_price_cents, \
                                      subtotal_cents, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(order_id)
        .bind(product.id)
        .bind(quantity)
        .bind(product.price_cents)
        .bind(subtotal_cents)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE products SET stock = stock - ?1, updated_at = ?2 WHERE id = ?3")
            .bind(quantity)
            .bind(now)
            .bind(product.id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO inventory_logs (product_id, quantity_change, reason, created_at) \
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(product.id)
        .bind(-quantity)
        .bind(REASON_SALE)
        .bind(now)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    tracing::info!(
        order_number = %order_number,
        total_cents,
        line_count = lines.len(),
        "order placed"
    );

    let order = crate::repo::orders::find_by_id(pool, order_id)
        .await?
        .ok_or(AppError::NotFound("order"))?;

    Ok(PlacedOrder {
        order,
        total_cents,
        tendered_cents: params.tendered_cents,
        change_cents,
    })
}
