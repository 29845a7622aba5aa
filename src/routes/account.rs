//! Registration, login/logout and the customer's own order history.

use crate::auth;
use crate::error::{AppError, AppResult};
use crate::forms::RegisterForm;
use crate::repo::{orders, users};
use crate::routes::page;
use crate::session::Flash;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use std::sync::Arc;
use tera::Context;

pub async fn register_form(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> AppResult<Response> {
    let (jar, sid) = state.sessions().ensure(jar);
    let body = page(&state, &sid, "register.html", Context::new()).await?;
    Ok((jar, body).into_response())
}

pub async fn register_submit(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> AppResult<Response> {
    let (jar, sid) = state.sessions().ensure(jar);

    let mut errors = Vec::new();
    let input = match form.clone().validate() {
        Ok(input) => {
            if users::username_exists(state.pool(), &input.username).await? {
                errors.push("Este nombre de usuario ya está en uso".to_string());
                None
            } else {
                Some(input)
            }
        }
        Err(form_errors) => {
            errors = form_errors;
            None
        }
    };

    let Some(input) = input else {
        let mut ctx = Context::new();
        ctx.insert("errors", &errors);
        ctx.insert("username", &form.username);
        ctx.insert("email", &form.email);
        let body = page(&state, &sid, "register.html", ctx).await?;
        return Ok((jar, body).into_response());
    };

    let hash = auth::hash_password(&input.password)?;
    let create = crate::forms::UserCreateInput {
        username: input.username,
        email: input.email,
        password: input.password,
        role: crate::model::Role::Customer,
    };
    users::create(state.pool(), &create, &hash, chrono::Utc::now().naive_utc()).await?;

    state
        .sessions()
        .push_flash(&sid, Flash::success("Cuenta creada. Ingresa ahora."));
    Ok((jar, Redirect::to("/login")).into_response())
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

pub async fn login_form(State(state): State<Arc<AppState>>, jar: CookieJar) -> AppResult<Response> {
    let (jar, sid) = state.sessions().ensure(jar);
    let body = page(&state, &sid, "login.html", Context::new()).await?;
    Ok((jar, body).into_response())
}

pub async fn login_submit(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let (jar, sid) = state.sessions().ensure(jar);

    let user = users::find_by_username(state.pool(), form.username.trim())
        .await?
        .filter(|u| u.is_active && auth::verify_password(&form.password, &u.password_hash));

    let Some(user) = user else {
        let mut ctx = Context::new();
        ctx.insert("errors", &["Usuario o contraseña incorrectos"]);
        ctx.insert("username", &form.username);
        let body = page(&state, &sid, "login.html", ctx).await?;
        return Ok((jar, body).into_response());
    };

    state
        .sessions()
        .with_session(&sid, |s| s.user_id = Some(user.id));
    tracing::info!(username = %user.username, role = %user.role, "user logged in");

    Ok((jar, Redirect::to("/")).into_response())
}

pub async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> AppResult<Response> {
    let (jar, sid) = state.sessions().ensure(jar);
    state.sessions().with_session(&sid, |s| {
        s.user_id = None;
        s.cart.clear();
        s.sale.clear();
        s.wishlist.clear();
    });
    Ok((jar, Redirect::to("/login")).into_response())
}

pub async fn my_orders(State(state): State<Arc<AppState>>, jar: CookieJar) -> AppResult<Response> {
    let (jar, sid) = state.sessions().ensure(jar);
    let user = auth::require_user(&state, &sid).await?;

    let orders = orders::list_for_customer(state.pool(), user.id).await?;

    let mut ctx = Context::new();
    ctx.insert("orders", &orders);

    let body = page(&state, &sid, "user_orders.html", ctx).await?;
    Ok((jar, body).into_response())
}

pub async fn order_detail(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(order_id): Path<i64>,
) -> AppResult<Response> {
    let (jar, sid) = state.sessions().ensure(jar);
    let user = auth::require_user(&state, &sid).await?;

    let order = orders::find_for_customer(state.pool(), order_id, user.id)
        .await?
        .ok_or(AppError::NotFound("order"))?;
    let items = orders::items_for_order(state.pool(), order.id).await?;

    let mut ctx = Context::new();
    ctx.insert("order", &order);
    ctx.insert("items", &items);

    let body = page(&state, &sid, "order_detail.html", ctx).await?;
    Ok((jar, body).into_response())
}
