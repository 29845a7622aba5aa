//! Session cart and customer checkout.

use crate::auth;
use crate::error::{AppError, AppResult};
use crate::model::{OrderStatus, PaymentMethod, PaymentStatus};
use crate::routes::page;
use crate::sales::{self, OrderParams};
use crate::session::Flash;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Json, Redirect, Response};
use axum::Form;
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tera::Context;

#[derive(Debug, Deserialize)]
pub struct QtyForm {
    #[serde(default)]
    pub qty: Option<String>,
}

impl QtyForm {
    /// Quantity with the lenient default the add form uses.
    pub(crate) fn qty_or_one(&self) -> i64 {
        self.qty
            .as_deref()
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .unwrap_or(1)
    }
}

pub async fn cart_view(State(state): State<Arc<AppState>>, jar: CookieJar) -> AppResult<Response> {
    let (jar, sid) = state.sessions().ensure(jar);

    let quantities = state.sessions().with_session(&sid, |s| s.cart.clone());
    let priced = sales::price_lines(state.pool(), &quantities).await?;

    // Products deleted while in the cart priced to nothing; drop their
    // stale ids from the session too.
    if priced.lines.len() != quantities.len() {
        let live: Vec<i64> = priced.lines.iter().map(|line| line.product_id).collect();
        state
            .sessions()
            .with_session(&sid, |s| s.cart.retain(|id, _| live.contains(id)));
    }

    let mut ctx = Context::new();
    ctx.insert("items", &priced.lines);
    ctx.insert("total_cents", &priced.total_cents);

    let body = page(&state, &sid, "cart.html", ctx).await?;
    Ok((jar, body).into_response())
}

pub async fn add_to_cart(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(product_id): Path<i64>,
    Form(form): Form<QtyForm>,
) -> AppResult<Response> {
    let (jar, sid) = state.sessions().ensure(jar);

    let qty = form.qty_or_one().max(1);
    state
        .sessions()
        .with_session(&sid, |s| *s.cart.entry(product_id).or_insert(0) += qty);
    state
        .sessions()
        .push_flash(&sid, Flash::success("Producto agregado al carrito"));

    Ok((jar, Redirect::to("/cart")).into_response())
}

pub async fn remove_from_cart(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(product_id): Path<i64>,
) -> AppResult<Response> {
    let (jar, sid) = state.sessions().ensure(jar);
    state
        .sessions()
        .with_session(&sid, |s| s.cart.shift_remove(&product_id));
    Ok((jar, Redirect::to("/cart")).into_response())
}

pub async fn update_cart_qty(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(product_id): Path<i64>,
    Form(form): Form<QtyForm>,
) -> AppResult<Response> {
    let (jar, sid) = state.sessions().ensure(jar);

    // A missing qty removes the line; garbage input rejects the update
    // so a typo cannot silently wipe the line.
    let qty = match form.qty.as_deref() {
        None => 0,
        Some(raw) => match raw.trim().parse::<i64>() {
            Ok(qty) => qty,
            Err(_) => {
                state
                    .sessions()
                    .push_flash(&sid, Flash::error("Cantidad inválida"));
                return Ok((jar, Redirect::to("/cart")).into_response());
            }
        },
    };

    state.sessions().with_session(&sid, |s| {
        if qty > 0 {
            s.cart.insert(product_id, qty);
        } else {
            s.cart.shift_remove(&product_id);
        }
    });

    Ok((jar, Redirect::to("/cart")).into_response())
}

pub async fn cart_count(State(state): State<Arc<AppState>>, jar: CookieJar) -> AppResult<Response> {
    let (jar, sid) = state.sessions().ensure(jar);
    let count: i64 = state
        .sessions()
        .with_session(&sid, |s| s.cart.values().sum());
    Ok((jar, Json(json!({ "count": count }))).into_response())
}

pub async fn checkout_form(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> AppResult<Response> {
    let (jar, sid) = state.sessions().ensure(jar);
    auth::require_user(&state, &sid).await?;

    let quantities = state.sessions().with_session(&sid, |s| s.cart.clone());
    if quantities.is_empty() {
        state
            .sessions()
            .push_flash(&sid, Flash::error("Carrito vacío"));
        return Ok((jar, Redirect::to("/")).into_response());
    }

    let priced = sales::price_lines(state.pool(), &quantities).await?;

    let mut ctx = Context::new();
    ctx.insert("items", &priced.lines);
    ctx.insert("total_cents", &priced.total_cents);

    let body = page(&state, &sid, "checkout.html", ctx).await?;
    Ok((jar, body).into_response())
}

pub async fn checkout_submit(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> AppResult<Response> {
    let (jar, sid) = state.sessions().ensure(jar);
    let user = auth::require_user(&state, &sid).await?;

    let quantities = state.sessions().with_session(&sid, |s| s.cart.clone());
    if quantities.is_empty() {
        state
            .sessions()
            .push_flash(&sid, Flash::error("Carrito vacío"));
        return Ok((jar, Redirect::to("/")).into_response());
    }

    let params = OrderParams {
        prefix: "ORD",
        customer_id: Some(user.id),
        customer_name: Some(user.username.clone()),
        status: OrderStatus::Pending,
        payment_method: PaymentMethod::Cash,
        payment_status: PaymentStatus::Pending,
        tendered_cents: None,
    };

    match sales::place_order(state.pool(), &quantities, params).await {
        Ok(placed) => {
            state.sessions().with_session(&sid, |s| s.cart.clear());
            state.sessions().push_flash(
                &sid,
                Flash::success(format!(
                    "Orden {} creada correctamente",
                    placed.order.order_number
                )),
            );
            Ok((jar, Redirect::to("/")).into_response())
        }
        Err(err @ (AppError::InsufficientStock { .. } | AppError::EmptySale)) => {
            state
                .sessions()
                .push_flash(&sid, Flash::error(err.to_string()));
            Ok((jar, Redirect::to("/cart")).into_response())
        }
        Err(other) => Err(other),
    }
}
