//! Authentication route handlers.
//!
//! Session-backed login, logout, and registration, plus user listing and
//! profile pages.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use kiosk_core::UserId;

use crate::db::UserRepository;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{OptionalAuth, RequireAuth, clear_current_user, set_current_user};
use crate::models::{CurrentUser, User};
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Registration form data.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirm: String,
}

/// Profile form data.
#[derive(Debug, Default, Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub avatar_path: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub user: Option<CurrentUser>,
    pub error: Option<String>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub user: Option<CurrentUser>,
    pub error: Option<String>,
}

/// User view for templates.
#[derive(Debug, Clone)]
pub struct UserView {
    pub id: UserId,
    pub username: String,
    pub is_staff: bool,
    pub joined: String,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            is_staff: user.is_staff,
            joined: user.created_at.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Users list page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/users_list.html")]
pub struct UsersListTemplate {
    pub user: Option<CurrentUser>,
    pub users: Vec<UserView>,
}

/// User detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/user_detail.html")]
pub struct UserDetailTemplate {
    pub user: Option<CurrentUser>,
    pub shown: UserView,
    pub bio: String,
    pub avatar_path: Option<String>,
}

/// Profile update form template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/profile_form.html")]
pub struct ProfileFormTemplate {
    pub user: Option<CurrentUser>,
    pub shown: UserView,
    pub form: ProfileForm,
}

// =============================================================================
// Login / Logout
// =============================================================================

/// Display the login page; authenticated users are redirected away.
#[instrument(skip(user))]
pub async fn login_page(OptionalAuth(user): OptionalAuth) -> Response {
    if user.is_some() {
        return Redirect::to("/shop/products/").into_response();
    }
    LoginTemplate { user, error: None }.into_response()
}

/// Handle login form submission.
///
/// On bad credentials the form is re-rendered with an error message.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    match AuthService::new(state.pool())
        .login(&form.username, &form.password)
        .await
    {
        Ok(user) => {
            let current = CurrentUser {
                id: user.id,
                username: user.username,
                is_staff: user.is_staff,
            };
            set_current_user(&session, &current)
                .await
                .map_err(|e| AppError::Internal(format!("session store failed: {e}")))?;
            tracing::info!(user_id = %current.id, "user logged in");
            Ok(Redirect::to("/shop/products/").into_response())
        }
        Err(AuthError::InvalidCredentials) => {
            tracing::warn!(username = %form.username, "failed login attempt");
            let template = LoginTemplate {
                user: None,
                error: Some("invalid login credentials".to_string()),
            };
            Ok((StatusCode::UNAUTHORIZED, template).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// Log out and return to the login page.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Redirect> {
    clear_current_user(&session)
        .await
        .map_err(|e| AppError::Internal(format!("session store failed: {e}")))?;
    Ok(Redirect::to("/auth/login/"))
}

// =============================================================================
// Registration
// =============================================================================

/// Display the registration page.
#[instrument(skip(user))]
pub async fn register_page(OptionalAuth(user): OptionalAuth) -> Response {
    if user.is_some() {
        return Redirect::to("/shop/products/").into_response();
    }
    RegisterTemplate { user, error: None }.into_response()
}

/// Handle registration: create the user and profile, then log them in.
#[instrument(skip(state, session, form))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    if form.password != form.password_confirm {
        let template = RegisterTemplate {
            user: None,
            error: Some("passwords do not match".to_string()),
        };
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, template).into_response());
    }

    match AuthService::new(state.pool())
        .register(&form.username, &form.password)
        .await
    {
        Ok(user) => {
            // Profile rows are created eagerly at registration so the
            // about-me page always has one to show.
            UserRepository::new(state.pool())
                .get_or_create_profile(user.id)
                .await?;

            let current = CurrentUser {
                id: user.id,
                username: user.username,
                is_staff: user.is_staff,
            };
            set_current_user(&session, &current)
                .await
                .map_err(|e| AppError::Internal(format!("session store failed: {e}")))?;
            tracing::info!(user_id = %current.id, "user registered");
            Ok(Redirect::to(&format!("/auth/users/{}/", current.id)).into_response())
        }
        Err(
            e @ (AuthError::InvalidUsername(_)
            | AuthError::WeakPassword(_)
            | AuthError::UserAlreadyExists),
        ) => {
            let template = RegisterTemplate {
                user: None,
                error: Some(e.to_string()),
            };
            Ok((StatusCode::UNPROCESSABLE_ENTITY, template).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

// =============================================================================
// Users & Profiles
// =============================================================================

/// List all users (login required).
#[instrument(skip(state, user))]
pub async fn users_list(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<UsersListTemplate> {
    let users = UserRepository::new(state.pool()).list().await?;
    Ok(UsersListTemplate {
        user: Some(user),
        users: users.iter().map(UserView::from).collect(),
    })
}

/// Load a user for a staff-or-self page, enforcing the access policy.
async fn shown_user(state: &AppState, viewer: &CurrentUser, id: i32) -> Result<User> {
    let shown = UserRepository::new(state.pool())
        .get(UserId::new(id))
        .await?
        .ok_or(AppError::NotFound)?;

    if !viewer.can_view_owned_by(Some(shown.id)) {
        return Err(AppError::Forbidden);
    }
    Ok(shown)
}

/// User detail with profile (staff or self).
#[instrument(skip(state, user))]
pub async fn user_detail(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<UserDetailTemplate> {
    let shown = shown_user(&state, &user, id).await?;
    let profile = UserRepository::new(state.pool())
        .get_or_create_profile(shown.id)
        .await?;

    Ok(UserDetailTemplate {
        user: Some(user),
        shown: UserView::from(&shown),
        bio: profile.bio,
        avatar_path: profile.avatar_path,
    })
}

/// Profile update form (staff or self).
#[instrument(skip(state, user))]
pub async fn profile_form(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<ProfileFormTemplate> {
    let shown = shown_user(&state, &user, id).await?;
    let profile = UserRepository::new(state.pool())
        .get_or_create_profile(shown.id)
        .await?;

    Ok(ProfileFormTemplate {
        user: Some(user),
        shown: UserView::from(&shown),
        form: ProfileForm {
            bio: profile.bio,
            avatar_path: profile.avatar_path,
        },
    })
}

/// Apply a profile update and return to the user detail page.
#[instrument(skip(state, user, form))]
pub async fn profile_update(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Form(form): Form<ProfileForm>,
) -> Result<Redirect> {
    let shown = shown_user(&state, &user, id).await?;

    let repo = UserRepository::new(state.pool());
    repo.get_or_create_profile(shown.id).await?;
    repo.update_profile(
        shown.id,
        form.bio.trim(),
        form.avatar_path
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty()),
    )
    .await?;

    Ok(Redirect::to(&format!("/auth/users/{id}/")))
}
