//! Staff point of sale: accumulate a sale in the session, then turn it
//! into a completed cash order with payment and change recorded.

use crate::auth;
use crate::error::{AppError, AppResult};
use crate::model::{format_cents, parse_money_cents, OrderStatus, PaymentMethod, PaymentStatus};
use crate::repo::products;
use crate::routes::page;
use crate::sales::{self, OrderParams};
use crate::session::Flash;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use std::sync::Arc;
use tera::Context;

use super::cart::QtyForm;

pub async fn pos_view(State(state): State<Arc<AppState>>, jar: CookieJar) -> AppResult<Response> {
    let (jar, sid) = state.sessions().ensure(jar);
    auth::require_staff(&state, &sid).await?;

    let quantities = state.sessions().with_session(&sid, |s| s.sale.clone());
    let priced = sales::price_lines(state.pool(), &quantities).await?;

    let mut ctx = Context::new();
    ctx.insert("items", &priced.lines);
    ctx.insert("total_cents", &priced.total_cents);

    let body = page(&state, &sid, "pos.html", ctx).await?;
    Ok((jar, body).into_response())
}

pub async fn add_to_sale(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(product_id): Path<i64>,
    Form(form): Form<QtyForm>,
) -> AppResult<Response> {
    let (jar, sid) = state.sessions().ensure(jar);
    auth::require_staff(&state, &sid).await?;

    let product = products::find_by_id(state.pool(), product_id)
        .await?
        .ok_or(AppError::NotFound("product"))?;

    let qty = form.qty_or_one().max(1);
    let requested = state
        .sessions()
        .with_session(&sid, |s| s.sale.get(&product_id).copied().unwrap_or(0))
        + qty;

    if requested > product.stock {
        state.sessions().push_flash(
            &sid,
            Flash::error(format!(
                "Stock insuficiente de {}: quedan {}",
                product.name, product.stock
            )),
        );
        return Ok((jar, Redirect::to("/pos")).into_response());
    }

    state
        .sessions()
        .with_session(&sid, |s| *s.sale.entry(product_id).or_insert(0) += qty);

    Ok((jar, Redirect::to("/pos")).into_response())
}

pub async fn remove_from_sale(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(product_id): Path<i64>,
) -> AppResult<Response> {
    let (jar, sid) = state.sessions().ensure(jar);
    auth::require_staff(&state, &sid).await?;

    state
        .sessions()
        .with_session(&sid, |s| s.sale.shift_remove(&product_id));
    Ok((jar, Redirect::to("/pos")).into_response())
}

pub async fn clear_sale(State(state): State<Arc<AppState>>, jar: CookieJar) -> AppResult<Response> {
    let (jar, sid) = state.sessions().ensure(jar);
    auth::require_staff(&state, &sid).await?;

    state.sessions().with_session(&sid, |s| s.sale.clear());
    Ok((jar, Redirect::to("/pos")).into_response())
}

#[derive(Debug, Deserialize)]
pub struct CompleteSaleForm {
    pub amount_paid: String,
}

pub async fn complete_sale(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<CompleteSaleForm>,
) -> AppResult<Response> {
    let (jar, sid) = state.sessions().ensure(jar);
    let seller = auth::require_staff(&state, &sid).await?;

    let quantities = state.sessions().with_session(&sid, |s| s.sale.clone());
    if quantities.is_empty() {
        state
            .sessions()
            .push_flash(&sid, Flash::error("No hay productos en la venta"));
        return Ok((jar, Redirect::to("/pos")).into_response());
    }

    let Some(tendered_cents) = parse_money_cents(&form.amount_paid) else {
        state
            .sessions()
            .push_flash(&sid, Flash::error("Monto de pago inválido"));
        return Ok((jar, Redirect::to("/pos")).into_response());
    };

    let params = OrderParams {
        prefix: "POS",
        customer_id: None,
        customer_name: Some(format!("Venta en mostrador ({})", seller.username)),
        status: OrderStatus::Completed,
        payment_method: PaymentMethod::Cash,
        payment_status: PaymentStatus::Paid,
        tendered_cents: Some(tendered_cents),
    };

    match sales::place_order(state.pool(), &quantities, params).await {
        Ok(placed) => {
            state.sessions().with_session(&sid, |s| s.sale.clear());

            let mut ctx = Context::new();
            ctx.insert("order", &placed.order);
            ctx.insert("total_cents", &placed.total_cents);
            ctx.insert("paid_cents", &placed.tendered_cents);
            ctx.insert("change_cents", &placed.change_cents);

            let body = page(&state, &sid, "receipt.html", ctx).await?;
            Ok((jar, body).into_response())
        }
        Err(AppError::InsufficientPayment {
            total_cents,
            paid_cents,
        }) => {
            state.sessions().push_flash(
                &sid,
                Flash::error(format!(
                    "Pago insuficiente: total ${}, recibido ${}",
                    format_cents(total_cents),
                    format_cents(paid_cents)
                )),
            );
            Ok((jar, Redirect::to("/pos")).into_response())
        }
        Err(err @ (AppError::InsufficientStock { .. } | AppError::EmptySale)) => {
            state
                .sessions()
                .push_flash(&sid, Flash::error(err.to_string()));
            Ok((jar, Redirect::to("/pos")).into_response())
        }
        Err(other) => Err(other),
    }
}
