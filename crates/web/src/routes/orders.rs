//! Order route handlers (server-rendered shop pages).

use askama::Template;
use askama_web::WebTemplate;
use axum::Form;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use tracing::instrument;

use kiosk_core::{OrderId, UserId};

use crate::db::{OrderRepository, ProductRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::filters;
use crate::forms::{OrderForm, ValidationErrors};
use crate::middleware::{RequireAuth, RequireStaff};
use crate::models::{CurrentUser, OrderDetail, OrderSummary};
use crate::routes::products::ProductView;
use crate::state::AppState;

/// Order view for list templates.
#[derive(Debug, Clone)]
pub struct OrderView {
    pub id: OrderId,
    pub delivery_address: String,
    pub promo_code: String,
    pub created_at: String,
    pub username: Option<String>,
    pub product_count: i64,
    pub total_price: String,
}

impl From<&OrderSummary> for OrderView {
    fn from(summary: &OrderSummary) -> Self {
        Self {
            id: summary.order.id,
            delivery_address: summary.order.delivery_address.clone(),
            promo_code: summary.order.promo_code.clone(),
            created_at: summary.order.created_at.format("%Y-%m-%d %H:%M").to_string(),
            username: summary.username.clone(),
            product_count: summary.product_count,
            total_price: format!("{:.2}", summary.total_price),
        }
    }
}

/// Orders list page template.
#[derive(Template, WebTemplate)]
#[template(path = "shop/orders_list.html")]
pub struct OrdersListTemplate {
    pub user: Option<CurrentUser>,
    pub orders: Vec<OrderView>,
}

/// Order detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "shop/order_detail.html")]
pub struct OrderDetailTemplate {
    pub user: Option<CurrentUser>,
    pub order: OrderView,
    pub products: Vec<ProductView>,
}

/// Order create/update form template.
#[derive(Template, WebTemplate)]
#[template(path = "shop/order_form.html")]
pub struct OrderFormTemplate {
    pub user: Option<CurrentUser>,
    pub heading: String,
    pub action: String,
    pub form: OrderForm,
    pub errors: ValidationErrors,
    /// Products available for the comma-separated id field.
    pub available: Vec<ProductView>,
}

/// One user's orders page template.
#[derive(Template, WebTemplate)]
#[template(path = "shop/user_orders.html")]
pub struct UserOrdersTemplate {
    pub user: Option<CurrentUser>,
    pub owner: String,
    pub orders: Vec<OrderView>,
}

fn detail_view(detail: &OrderDetail) -> (OrderView, Vec<ProductView>) {
    let products: Vec<ProductView> = detail.products.iter().map(ProductView::from).collect();
    let view = OrderView {
        id: detail.order.id,
        delivery_address: detail.order.delivery_address.clone(),
        promo_code: detail.order.promo_code.clone(),
        created_at: detail.order.created_at.format("%Y-%m-%d %H:%M").to_string(),
        username: detail.username.clone(),
        product_count: detail.products.len() as i64,
        total_price: format!("{:.2}", detail.total_price()),
    };
    (view, products)
}

/// List all orders (login required).
#[instrument(skip(state, user))]
pub async fn index(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<OrdersListTemplate> {
    let orders = OrderRepository::new(state.pool()).list_summaries().await?;
    Ok(OrdersListTemplate {
        user: Some(user),
        orders: orders.iter().map(OrderView::from).collect(),
    })
}

/// Order detail (staff or owner).
#[instrument(skip(state, user))]
pub async fn show(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<OrderDetailTemplate> {
    let detail = OrderRepository::new(state.pool())
        .get_detail(OrderId::new(id))
        .await?
        .ok_or(AppError::NotFound)?;

    if !user.can_view_owned_by(detail.order.user_id) {
        return Err(AppError::Forbidden);
    }

    let (order, products) = detail_view(&detail);
    Ok(OrderDetailTemplate {
        user: Some(user),
        order,
        products,
    })
}

/// Empty order form.
#[instrument(skip(state, user))]
pub async fn create_form(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<OrderFormTemplate> {
    let available = ProductRepository::new(state.pool()).list_active().await?;
    Ok(OrderFormTemplate {
        user: Some(user),
        heading: "New order".to_string(),
        action: "/shop/orders/create/".to_string(),
        form: OrderForm::default(),
        errors: ValidationErrors::default(),
        available: available.iter().map(ProductView::from).collect(),
    })
}

/// Create an order owned by the logged-in user.
#[instrument(skip(state, user, form))]
pub async fn create(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Form(form): Form<OrderForm>,
) -> Result<Response> {
    let input = match form.validate(Some(user.id)) {
        Ok(input) => input,
        Err(errors) => {
            let available = ProductRepository::new(state.pool()).list_active().await?;
            let template = OrderFormTemplate {
                user: Some(user),
                heading: "New order".to_string(),
                action: "/shop/orders/create/".to_string(),
                form,
                errors,
                available: available.iter().map(ProductView::from).collect(),
            };
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, template).into_response());
        }
    };

    let order = OrderRepository::new(state.pool()).create(&input).await?;
    tracing::info!(order_id = %order.id, "order created");
    Ok(Redirect::to("/shop/orders/").into_response())
}

/// Pre-filled order form (staff or owner).
#[instrument(skip(state, user))]
pub async fn update_form(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<OrderFormTemplate> {
    let detail = OrderRepository::new(state.pool())
        .get_detail(OrderId::new(id))
        .await?
        .ok_or(AppError::NotFound)?;

    if !user.can_view_owned_by(detail.order.user_id) {
        return Err(AppError::Forbidden);
    }

    let product_ids: Vec<String> = detail
        .products
        .iter()
        .map(|p| p.id.to_string())
        .collect();
    let available = ProductRepository::new(state.pool()).list_active().await?;

    Ok(OrderFormTemplate {
        user: Some(user),
        heading: format!("Update order #{id}"),
        action: format!("/shop/orders/{id}/update/"),
        form: OrderForm {
            delivery_address: detail.order.delivery_address,
            promo_code: detail.order.promo_code,
            product_ids: product_ids.join(","),
        },
        errors: ValidationErrors::default(),
        available: available.iter().map(ProductView::from).collect(),
    })
}

/// Update an order and redirect to its detail page.
#[instrument(skip(state, user, form))]
pub async fn update(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Form(form): Form<OrderForm>,
) -> Result<Response> {
    let repo = OrderRepository::new(state.pool());
    let detail = repo
        .get_detail(OrderId::new(id))
        .await?
        .ok_or(AppError::NotFound)?;

    if !user.can_view_owned_by(detail.order.user_id) {
        return Err(AppError::Forbidden);
    }

    let input = match form.validate(detail.order.user_id) {
        Ok(input) => input,
        Err(errors) => {
            let available = ProductRepository::new(state.pool()).list_active().await?;
            let template = OrderFormTemplate {
                user: Some(user),
                heading: format!("Update order #{id}"),
                action: format!("/shop/orders/{id}/update/"),
                form,
                errors,
                available: available.iter().map(ProductView::from).collect(),
            };
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, template).into_response());
        }
    };

    repo.update(OrderId::new(id), &input).await?;
    Ok(Redirect::to(&format!("/shop/orders/{id}/")).into_response())
}

/// Hard-delete an order (staff only). Products are never touched.
#[instrument(skip(state, _user))]
pub async fn delete(
    RequireStaff(_user): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Redirect> {
    OrderRepository::new(state.pool())
        .delete(OrderId::new(id))
        .await?;
    tracing::info!(order_id = id, "order deleted");
    Ok(Redirect::to("/shop/orders/"))
}

/// One user's orders (login required; 404 for unknown user).
#[instrument(skip(state, user))]
pub async fn user_orders(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<UserOrdersTemplate> {
    let owner = UserRepository::new(state.pool())
        .get(UserId::new(id))
        .await?
        .ok_or(AppError::NotFound)?;

    let orders = OrderRepository::new(state.pool())
        .list_for_user(owner.id)
        .await?;

    Ok(UserOrdersTemplate {
        user: Some(user),
        owner: owner.username,
        orders: orders.iter().map(OrderView::from).collect(),
    })
}
