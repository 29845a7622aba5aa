//! Administrative panel: dashboard, product/category/user CRUD, order
//! management and sales reports. Every handler sits behind the admin
//! role gate.

use crate::auth;
use crate::error::{AppError, AppResult};
use crate::forms::{CategoryForm, ProductForm, UserCreateForm, UserEditForm};
use crate::model::OrderStatus;
use crate::repo::{categories, orders, products, reports, users};
use crate::routes::page;
use crate::session::Flash;
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use axum_extra::extract::cookie::CookieJar;
use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;
use tera::Context;

const DASHBOARD_LIST_LIMIT: i64 = 10;

fn day_range(date: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    let start = date.and_time(NaiveTime::MIN);
    let end = date
        .checked_add_days(Days::new(1))
        .unwrap_or(date)
        .and_time(NaiveTime::MIN);
    (start, end)
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

pub async fn dashboard(State(state): State<Arc<AppState>>, jar: CookieJar) -> AppResult<Response> {
    let (jar, sid) = state.sessions().ensure(jar);
    auth::require_admin(&state, &sid).await?;

    let today = Utc::now().date_naive();
    let (today_start, today_end) = day_range(today);
    let month_start = today.with_day(1).unwrap_or(today).and_time(NaiveTime::MIN);

    let total_products = products::count(state.pool()).await?;
    let total_orders = orders::count(state.pool()).await?;
    let total_customers = orders::distinct_customers(state.pool()).await?;
    let daily_sales = reports::sales_total_between(state.pool(), today_start, today_end).await?;
    let monthly_sales = reports::sales_total_between(state.pool(), month_start, today_end).await?;
    let low_stock = products::low_stock(
        state.pool(),
        state.config().low_stock_threshold,
        DASHBOARD_LIST_LIMIT,
    )
    .await?;
    let recent_orders = orders::recent(state.pool(), DASHBOARD_LIST_LIMIT).await?;
    let top_products = reports::top_products(state.pool(), DASHBOARD_LIST_LIMIT).await?;

    let mut ctx = Context::new();
    ctx.insert("total_products", &total_products);
    ctx.insert("total_orders", &total_orders);
    ctx.insert("total_customers", &total_customers);
    ctx.insert("daily_sales_cents", &daily_sales);
    ctx.insert("monthly_sales_cents", &monthly_sales);
    ctx.insert("low_stock", &low_stock);
    ctx.insert("recent_orders", &recent_orders);
    ctx.insert("top_products", &top_products);

    let body = page(&state, &sid, "admin/dashboard.html", ctx).await?;
    Ok((jar, body).into_response())
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

pub async fn product_list(State(state): State<Arc<AppState>>, jar: CookieJar) -> AppResult<Response> {
    let (jar, sid) = state.sessions().ensure(jar);
    auth::require_admin(&state, &sid).await?;

    let products = products::list_all(state.pool()).await?;

    let mut ctx = Context::new();
    ctx.insert("products", &products);

    let body = page(&state, &sid, "admin/products.html", ctx).await?;
    Ok((jar, body).into_response())
}

async fn product_form_page(
    state: &AppState,
    sid: &str,
    mut ctx: Context,
) -> AppResult<axum::response::Html<String>> {
    let categories = categories::list_all(state.pool()).await?;
    ctx.insert("categories", &categories);
    page(state, sid, "admin/product_form.html", ctx).await
}

pub async fn product_create_form(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> AppResult<Response> {
    let (jar, sid) = state.sessions().ensure(jar);
    auth::require_admin(&state, &sid).await?;

    let body = product_form_page(&state, &sid, Context::new()).await?;
    Ok((jar, body).into_response())
}

pub async fn product_create_submit(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<ProductForm>,
) -> AppResult<Response> {
    let (jar, sid) = state.sessions().ensure(jar);
    auth::require_admin(&state, &sid).await?;

    match form.clone().validate() {
        Ok(input) => {
            products::create(state.pool(), &input, Utc::now().naive_utc()).await?;
            state
                .sessions()
                .push_flash(&sid, Flash::success("Producto creado"));
            Ok((jar, Redirect::to("/admin/products")).into_response())
        }
        Err(errors) => {
            let mut ctx = Context::new();
            ctx.insert("errors", &errors);
            ctx.insert("form", &form_values(&form));
            let body = product_form_page(&state, &sid, ctx).await?;
            Ok((jar, body).into_response())
        }
    }
}

/// Raw form echo for re-rendering after validation failure.
fn form_values(form: &ProductForm) -> serde_json::Value {
    serde_json::json!({
        "name": form.name,
        "description": form.description,
        "category_id": form.category_id,
        "kind": form.kind,
        "price": form.price,
        "image_url": form.image_url,
        "stock": form.stock,
        "is_active": form.is_active.is_some(),
    })
}

pub async fn product_edit_form(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(product_id): Path<i64>,
) -> AppResult<Response> {
    let (jar, sid) = state.sessions().ensure(jar);
    auth::require_admin(&state, &sid).await?;

    let product = products::find_by_id(state.pool(), product_id)
        .await?
        .ok_or(AppError::NotFound("product"))?;

    let mut ctx = Context::new();
    ctx.insert("product", &product);
    let body = product_form_page(&state, &sid, ctx).await?;
    Ok((jar, body).into_response())
}

pub async fn product_edit_submit(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(product_id): Path<i64>,
    Form(form): Form<ProductForm>,
) -> AppResult<Response> {
    let (jar, sid) = state.sessions().ensure(jar);
    auth::require_admin(&state, &sid).await?;

    let product = products::find_by_id(state.pool(), product_id)
        .await?
        .ok_or(AppError::NotFound("product"))?;

    match form.clone().validate() {
        Ok(input) => {
            products::update(state.pool(), product.id, &input, Utc::now().naive_utc()).await?;
            state
                .sessions()
                .push_flash(&sid, Flash::success("Producto actualizado"));
            Ok((jar, Redirect::to("/admin/products")).into_response())
        }
        Err(errors) => {
            let mut ctx = Context::new();
            ctx.insert("errors", &errors);
            ctx.insert("product", &product);
            ctx.insert("form", &form_values(&form));
            let body = product_form_page(&state, &sid, ctx).await?;
            Ok((jar, body).into_response())
        }
    }
}

pub async fn product_delete(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(product_id): Path<i64>,
) -> AppResult<Response> {
    let (jar, sid) = state.sessions().ensure(jar);
    auth::require_admin(&state, &sid).await?;

    products::find_by_id(state.pool(), product_id)
        .await?
        .ok_or(AppError::NotFound("product"))?;
    products::delete(state.pool(), product_id).await?;

    state
        .sessions()
        .push_flash(&sid, Flash::success("Producto eliminado"));
    Ok((jar, Redirect::to("/admin/products")).into_response())
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

pub async fn category_list(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> AppResult<Response> {
    let (jar, sid) = state.sessions().ensure(jar);
    auth::require_admin(&state, &sid).await?;

    let categories = categories::list_all(state.pool()).await?;

    let mut ctx = Context::new();
    ctx.insert("categories", &categories);

    let body = page(&state, &sid, "admin/categories.html", ctx).await?;
    Ok((jar, body).into_response())
}

pub async fn category_create_form(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> AppResult<Response> {
    let (jar, sid) = state.sessions().ensure(jar);
    auth::require_admin(&state, &sid).await?;

    let body = page(&state, &sid, "admin/category_form.html", Context::new()).await?;
    Ok((jar, body).into_response())
}

pub async fn category_create_submit(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<CategoryForm>,
) -> AppResult<Response> {
    let (jar, sid) = state.sessions().ensure(jar);
    auth::require_admin(&state, &sid).await?;

    match form.validate() {
        Ok(input) => {
            categories::create(state.pool(), &input, Utc::now().naive_utc()).await?;
            state
                .sessions()
                .push_flash(&sid, Flash::success("Categoría creada exitosamente"));
            Ok((jar, Redirect::to("/admin/categories")).into_response())
        }
        Err(errors) => {
            let mut ctx = Context::new();
            ctx.insert("errors", &errors);
            let body = page(&state, &sid, "admin/category_form.html", ctx).await?;
            Ok((jar, body).into_response())
        }
    }
}

pub async fn category_edit_form(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(category_id): Path<i64>,
) -> AppResult<Response> {
    let (jar, sid) = state.sessions().ensure(jar);
    auth::require_admin(&state, &sid).await?;

    let category = categories::find_by_id(state.pool(), category_id)
        .await?
        .ok_or(AppError::NotFound("category"))?;

    let mut ctx = Context::new();
    ctx.insert("category", &category);

    let body = page(&state, &sid, "admin/category_form.html", ctx).await?;
    Ok((jar, body).into_response())
}

pub async fn category_edit_submit(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(category_id): Path<i64>,
    Form(form): Form<CategoryForm>,
) -> AppResult<Response> {
    let (jar, sid) = state.sessions().ensure(jar);
    auth::require_admin(&state, &sid).await?;

    let category = categories::find_by_id(state.pool(), category_id)
        .await?
        .ok_or(AppError::NotFound("category"))?;

    match form.validate() {
        Ok(input) => {
            categories::update(state.pool(), category.id, &input, Utc::now().naive_utc()).await?;
            state
                .sessions()
                .push_flash(&sid, Flash::success("Categoría actualizada"));
            Ok((jar, Redirect::to("/admin/categories")).into_response())
        }
        Err(errors) => {
            let mut ctx = Context::new();
            ctx.insert("errors", &errors);
            ctx.insert("category", &category);
            let body = page(&state, &sid, "admin/category_form.html", ctx).await?;
            Ok((jar, body).into_response())
        }
    }
}

pub async fn category_delete(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(category_id): Path<i64>,
) -> AppResult<Response> {
    let (jar, sid) = state.sessions().ensure(jar);
    auth::require_admin(&state, &sid).await?;

    categories::find_by_id(state.pool(), category_id)
        .await?
        .ok_or(AppError::NotFound("category"))?;
    categories::delete(state.pool(), category_id).await?;

    state
        .sessions()
        .push_flash(&sid, Flash::success("Categoría eliminada"));
    Ok((jar, Redirect::to("/admin/categories")).into_response())
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct OrderListParams {
    #[serde(default)]
    pub status: Option<String>,
}

pub async fn order_list(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<OrderListParams>,
) -> AppResult<Response> {
    let (jar, sid) = state.sessions().ensure(jar);
    auth::require_admin(&state, &sid).await?;

    let status_filter = params
        .status
        .as_deref()
        .filter(|s| !s.is_empty())
        .and_then(|raw| OrderStatus::from_str(raw).ok());
    let orders = orders::list_all(state.pool(), status_filter).await?;

    let mut ctx = Context::new();
    ctx.insert("orders", &orders);
    ctx.insert("status_filter", &params.status);

    let body = page(&state, &sid, "admin/orders.html", ctx).await?;
    Ok((jar, body).into_response())
}

pub async fn order_detail(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(order_id): Path<i64>,
) -> AppResult<Response> {
    let (jar, sid) = state.sessions().ensure(jar);
    auth::require_admin(&state, &sid).await?;

    let order = orders::find_by_id(state.pool(), order_id)
        .await?
        .ok_or(AppError::NotFound("order"))?;
    let items = orders::items_for_order(state.pool(), order.id).await?;

    let mut ctx = Context::new();
    ctx.insert("order", &order);
    ctx.insert("items", &items);

    let body = page(&state, &sid, "admin/order_detail.html", ctx).await?;
    Ok((jar, body).into_response())
}

#[derive(Debug, Deserialize)]
pub struct OrderStatusForm {
    pub status: String,
}

pub async fn order_update_status(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(order_id): Path<i64>,
    Form(form): Form<OrderStatusForm>,
) -> AppResult<Response> {
    let (jar, sid) = state.sessions().ensure(jar);
    auth::require_admin(&state, &sid).await?;

    let order = orders::find_by_id(state.pool(), order_id)
        .await?
        .ok_or(AppError::NotFound("order"))?;
    let status = OrderStatus::from_str(&form.status)
        .map_err(|_| AppError::Validation(format!("estado desconocido: {}", form.status)))?;

    orders::update_status(state.pool(), order.id, status, Utc::now().naive_utc()).await?;
    state
        .sessions()
        .push_flash(&sid, Flash::success(format!("Orden actualizada a {status}")));

    Ok((jar, Redirect::to("/admin/orders")).into_response())
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

pub async fn user_list(State(state): State<Arc<AppState>>, jar: CookieJar) -> AppResult<Response> {
    let (jar, sid) = state.sessions().ensure(jar);
    auth::require_admin(&state, &sid).await?;

    let users = users::list_all(state.pool()).await?;

    let mut ctx = Context::new();
    ctx.insert("users", &users);

    let body = page(&state, &sid, "admin/users.html", ctx).await?;
    Ok((jar, body).into_response())
}

pub async fn user_create_form(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> AppResult<Response> {
    let (jar, sid) = state.sessions().ensure(jar);
    auth::require_admin(&state, &sid).await?;

    let body = page(&state, &sid, "admin/user_form.html", Context::new()).await?;
    Ok((jar, body).into_response())
}

pub async fn user_create_submit(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<UserCreateForm>,
) -> AppResult<Response> {
    let (jar, sid) = state.sessions().ensure(jar);
    auth::require_admin(&state, &sid).await?;

    let mut errors = Vec::new();
    let input = match form.validate() {
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
        let body = page(&state, &sid, "admin/user_form.html", ctx).await?;
        return Ok((jar, body).into_response());
    };

    let hash = auth::hash_password(&input.password)?;
    users::create(state.pool(), &input, &hash, Utc::now().naive_utc()).await?;

    state
        .sessions()
        .push_flash(&sid, Flash::success("Usuario creado"));
    Ok((jar, Redirect::to("/admin/users")).into_response())
}

pub async fn user_edit_form(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(user_id): Path<i64>,
) -> AppResult<Response> {
    let (jar, sid) = state.sessions().ensure(jar);
    auth::require_admin(&state, &sid).await?;

    let user = users::find_by_id(state.pool(), user_id)
        .await?
        .ok_or(AppError::NotFound("user"))?;

    let mut ctx = Context::new();
    ctx.insert("user", &user);

    let body = page(&state, &sid, "admin/user_form.html", ctx).await?;
    Ok((jar, body).into_response())
}

pub async fn user_edit_submit(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(user_id): Path<i64>,
    Form(form): Form<UserEditForm>,
) -> AppResult<Response> {
    let (jar, sid) = state.sessions().ensure(jar);
    auth::require_admin(&state, &sid).await?;

    let user = users::find_by_id(state.pool(), user_id)
        .await?
        .ok_or(AppError::NotFound("user"))?;

    match form.validate() {
        Ok(input) => {
            users::update(state.pool(), user.id, &input).await?;
            state
                .sessions()
                .push_flash(&sid, Flash::success("Usuario actualizado"));
            Ok((jar, Redirect::to("/admin/users")).into_response())
        }
        Err(errors) => {
            let mut ctx = Context::new();
            ctx.insert("errors", &errors);
            ctx.insert("user", &user);
            let body = page(&state, &sid, "admin/user_form.html", ctx).await?;
            Ok((jar, body).into_response())
        }
    }
}

pub async fn user_delete(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(user_id): Path<i64>,
) -> AppResult<Response> {
    let (jar, sid) = state.sessions().ensure(jar);
    let admin = auth::require_admin(&state, &sid).await?;

    if admin.id == user_id {
        state
            .sessions()
            .push_flash(&sid, Flash::error("No puedes eliminar tu propia cuenta"));
        return Ok((jar, Redirect::to("/admin/users")).into_response());
    }

    users::find_by_id(state.pool(), user_id)
        .await?
        .ok_or(AppError::NotFound("user"))?;
    users::delete(state.pool(), user_id).await?;

    state
        .sessions()
        .push_flash(&sid, Flash::success("Usuario eliminado"));
    Ok((jar, Redirect::to("/admin/users")).into_response())
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ReportParams {
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

pub async fn sales_report(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<ReportParams>,
) -> AppResult<Response> {
    let (jar, sid) = state.sessions().ensure(jar);
    auth::require_admin(&state, &sid).await?;

    let today = Utc::now().date_naive();
    let parse = |raw: &Option<String>| {
        raw.as_deref()
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
    };
    let start_date = parse(&params.start_date).unwrap_or(today);
    let end_date = parse(&params.end_date).unwrap_or(start_date);

    let (start, _) = day_range(start_date);
    let (_, end) = day_range(end_date);

    let range_orders = reports::orders_between(state.pool(), start, end).await?;
    let range_total = reports::sales_total_between(state.pool(), start, end).await?;
    let top_products = reports::top_products(state.pool(), DASHBOARD_LIST_LIMIT).await?;

    let mut ctx = Context::new();
    ctx.insert("orders", &range_orders);
    ctx.insert("total_cents", &range_total);
    ctx.insert("sold", &top_products);
    ctx.insert("start_date", &start_date.to_string());
    ctx.insert("end_date", &end_date.to_string());

    let body = page(&state, &sid, "admin/reports.html", ctx).await?;
    Ok((jar, body).into_response())
}
