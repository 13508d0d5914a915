//! Product route handlers (server-rendered shop pages).

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum::Form;
use tracing::instrument;

use kiosk_core::ProductId;

use crate::error::{AppError, Result};
use crate::filters;
use crate::forms::{ProductForm, ValidationErrors};
use crate::db::ProductRepository;
use crate::middleware::{OptionalAuth, RequireStaff};
use crate::models::{CurrentUser, Product};
use crate::state::AppState;

/// Product view for templates.
#[derive(Debug, Clone)]
pub struct ProductView {
    pub id: ProductId,
    pub name: String,
    pub description_short: String,
    pub description: String,
    pub price: String,
    pub quantity: i32,
    pub has_extended_warranty: bool,
    pub archived: bool,
    pub preview_path: Option<String>,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            description_short: product.description_short(),
            description: product.description.clone(),
            price: product.price.to_string(),
            quantity: product.quantity,
            has_extended_warranty: product.has_extended_warranty,
            archived: product.archived,
            preview_path: product.preview_path.clone(),
        }
    }
}

/// Products list page template.
#[derive(Template, WebTemplate)]
#[template(path = "shop/products_list.html")]
pub struct ProductsListTemplate {
    pub user: Option<CurrentUser>,
    pub products: Vec<ProductView>,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "shop/product_detail.html")]
pub struct ProductDetailTemplate {
    pub user: Option<CurrentUser>,
    pub product: ProductView,
}

/// Product create/update form template.
#[derive(Template, WebTemplate)]
#[template(path = "shop/product_form.html")]
pub struct ProductFormTemplate {
    pub user: Option<CurrentUser>,
    pub heading: String,
    pub action: String,
    pub form: ProductForm,
    pub errors: ValidationErrors,
}

/// Archive confirmation page template.
#[derive(Template, WebTemplate)]
#[template(path = "shop/product_confirm_archive.html")]
pub struct ProductConfirmArchiveTemplate {
    pub user: Option<CurrentUser>,
    pub product: ProductView,
}

/// List non-archived products in the default ordering.
#[instrument(skip(state, user))]
pub async fn index(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
) -> Result<ProductsListTemplate> {
    let products = ProductRepository::new(state.pool()).list_active().await?;
    Ok(ProductsListTemplate {
        user,
        products: products.iter().map(ProductView::from).collect(),
    })
}

/// Product detail. Archived products stay addressable here.
#[instrument(skip(state, user))]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Path(id): Path<i32>,
) -> Result<ProductDetailTemplate> {
    let product = ProductRepository::new(state.pool())
        .get(ProductId::new(id))
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(ProductDetailTemplate {
        user,
        product: ProductView::from(&product),
    })
}

/// Empty product form (staff only).
#[instrument(skip(user))]
pub async fn create_form(RequireStaff(user): RequireStaff) -> ProductFormTemplate {
    ProductFormTemplate {
        user: Some(user),
        heading: "New product".to_string(),
        action: "/shop/products/create/".to_string(),
        form: ProductForm::default(),
        errors: ValidationErrors::default(),
    }
}

/// Create a product; on validation failure re-render the form with messages.
#[instrument(skip(state, user, form))]
pub async fn create(
    RequireStaff(user): RequireStaff,
    State(state): State<AppState>,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    let input = match form.validate(Some(user.id)) {
        Ok(input) => input,
        Err(errors) => {
            let template = ProductFormTemplate {
                user: Some(user),
                heading: "New product".to_string(),
                action: "/shop/products/create/".to_string(),
                form,
                errors,
            };
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, template).into_response());
        }
    };

    let product = ProductRepository::new(state.pool()).create(&input).await?;
    tracing::info!(product_id = %product.id, "product created");
    Ok(Redirect::to("/shop/products/").into_response())
}

/// Pre-filled product form (staff only).
#[instrument(skip(state, user))]
pub async fn update_form(
    RequireStaff(user): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<ProductFormTemplate> {
    let product = ProductRepository::new(state.pool())
        .get(ProductId::new(id))
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(ProductFormTemplate {
        user: Some(user),
        heading: format!("Update {}", product.name),
        action: format!("/shop/products/{id}/update/"),
        form: ProductForm {
            name: product.name,
            description: product.description,
            price: product.price.to_string(),
            quantity: product.quantity.to_string(),
            has_extended_warranty: product.has_extended_warranty.then(|| "on".to_string()),
            archived: product.archived.then(|| "on".to_string()),
            preview_path: product.preview_path,
        },
        errors: ValidationErrors::default(),
    })
}

/// Update a product and redirect to its detail page.
#[instrument(skip(state, user, form))]
pub async fn update(
    RequireStaff(user): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    let input = match form.validate(None) {
        Ok(input) => input,
        Err(errors) => {
            let template = ProductFormTemplate {
                user: Some(user),
                heading: "Update product".to_string(),
                action: format!("/shop/products/{id}/update/"),
                form,
                errors,
            };
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, template).into_response());
        }
    };

    ProductRepository::new(state.pool())
        .update(ProductId::new(id), &input)
        .await?;
    Ok(Redirect::to(&format!("/shop/products/{id}/")).into_response())
}

/// Confirmation page before archiving (staff only).
#[instrument(skip(state, user))]
pub async fn archive_confirm(
    RequireStaff(user): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<ProductConfirmArchiveTemplate> {
    let product = ProductRepository::new(state.pool())
        .get(ProductId::new(id))
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(ProductConfirmArchiveTemplate {
        user: Some(user),
        product: ProductView::from(&product),
    })
}

/// Soft-delete: flip the archived flag, keep the row.
#[instrument(skip(state, _user))]
pub async fn archive(
    RequireStaff(_user): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Redirect> {
    ProductRepository::new(state.pool())
        .set_archived(ProductId::new(id), true)
        .await?;
    tracing::info!(product_id = id, "product archived");
    Ok(Redirect::to("/shop/products/"))
}

/// Restore an archived product.
#[instrument(skip(state, _user))]
pub async fn unarchive(
    RequireStaff(_user): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Redirect> {
    ProductRepository::new(state.pool())
        .set_archived(ProductId::new(id), false)
        .await?;
    tracing::info!(product_id = id, "product unarchived");
    Ok(Redirect::to(&format!("/shop/products/{id}/")))
}
