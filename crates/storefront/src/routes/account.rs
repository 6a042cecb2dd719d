//! Account route handlers.
//!
//! Authentication is owned by the Shop API: logging in sets the API's session
//! cookie, which is relayed to the browser and forwarded on later calls.
//! Customer reads and mutations therefore need no local auth state.

use axum::{
    Form, Json,
    extract::{Path, State},
    response::Response,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use shopfront_core::validation::{
    validate_email, validate_name, validate_password, validate_phone, validate_required,
};
use shopfront_core::{AddressId, FieldErrors};

use crate::checkout::CHECKOUT_SESSION_KEY;
use crate::commerce::{
    AddressInput, ApiSession, Country, CurrentUser, Customer, RegisterCustomerInput,
    UpdateCustomerInput,
};
use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::state::AppState;

use super::forms::{AddressForm, non_blank};
use super::respond;

/// Login form data.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginForm {
    #[serde(default)]
    pub email_address: String,
    #[serde(default)]
    pub password: String,
    /// Checkbox: present when ticked.
    pub remember_me: Option<String>,
}

/// Registration form data.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterForm {
    pub email_address: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub phone_number: Option<String>,
}

/// Account verification form data.
#[derive(Debug, Deserialize)]
pub struct VerifyForm {
    pub token: String,
    pub password: Option<String>,
}

/// Password reset request form data.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordResetRequestForm {
    #[serde(default)]
    pub email_address: String,
}

/// Password reset form data.
#[derive(Debug, Deserialize)]
pub struct PasswordResetForm {
    pub token: String,
    #[serde(default)]
    pub password: String,
}

/// Profile form data.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileForm {
    pub title: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
}

/// Password change form data.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordForm {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
}

/// Email change form data.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEmailForm {
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub new_email_address: String,
}

/// Acknowledgement for mutations with no payload.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Done {
    pub success: bool,
}

const DONE: Done = Done { success: true };

// =============================================================================
// Auth
// =============================================================================

/// Log in.
#[instrument(skip(state, api, form), fields(email = %form.email_address))]
pub async fn login(
    State(state): State<AppState>,
    api: ApiSession,
    Form(form): Form<LoginForm>,
) -> Response {
    let result = async {
        let mut errors = FieldErrors::new();
        errors.check("emailAddress", validate_email(&form.email_address));
        errors.check("password", validate_required(&form.password, "Password"));
        errors.into_result()?;

        let user = state
            .client()
            .authenticate(
                &api,
                form.email_address.trim(),
                &form.password,
                form.remember_me.is_some(),
            )
            .await?
            .into_result()?;

        set_sentry_user(&user.id, Some(user.identifier.as_str()));
        tracing::info!(user_id = %user.id, "Customer logged in");
        Ok::<CurrentUser, AppError>(user)
    }
    .await;
    respond(&api, result)
}

/// Log out and forget checkout progress.
#[instrument(skip(state, api, session))]
pub async fn logout(State(state): State<AppState>, api: ApiSession, session: Session) -> Response {
    let result = async {
        state.client().logout(&api).await?;
        session
            .remove::<serde_json::Value>(CHECKOUT_SESSION_KEY)
            .await?;
        clear_sentry_user();
        Ok::<Done, AppError>(DONE)
    }
    .await;
    respond(&api, result)
}

/// Register a new account. The customer must verify it before logging in.
#[instrument(skip(state, api, form), fields(email = %form.email_address))]
pub async fn register(
    State(state): State<AppState>,
    api: ApiSession,
    Form(form): Form<RegisterForm>,
) -> Response {
    let input = RegisterCustomerInput {
        email_address: form.email_address.trim().to_string(),
        first_name: form.first_name.trim().to_string(),
        last_name: form.last_name.trim().to_string(),
        password: form.password,
        phone_number: non_blank(form.phone_number),
    };

    let result = async {
        input.validate()?;
        state
            .client()
            .register_customer_account(&api, &input)
            .await?
            .into_result()?;
        Ok::<Done, AppError>(DONE)
    }
    .await;
    respond(&api, result)
}

/// Verify a new account with the emailed token.
#[instrument(skip_all)]
pub async fn verify(
    State(state): State<AppState>,
    api: ApiSession,
    Form(form): Form<VerifyForm>,
) -> Response {
    let password = non_blank(form.password);
    let result = async {
        if let Some(password) = &password {
            let mut errors = FieldErrors::new();
            errors.check("password", validate_password(password));
            errors.into_result()?;
        }
        let user = state
            .client()
            .verify_customer_account(&api, form.token.trim(), password.as_deref())
            .await?
            .into_result()?;
        set_sentry_user(&user.id, Some(user.identifier.as_str()));
        Ok::<CurrentUser, AppError>(user)
    }
    .await;
    respond(&api, result)
}

/// Email a password reset token.
#[instrument(skip(state, api, form), fields(email = %form.email_address))]
pub async fn request_password_reset(
    State(state): State<AppState>,
    api: ApiSession,
    Form(form): Form<PasswordResetRequestForm>,
) -> Response {
    let result = async {
        let mut errors = FieldErrors::new();
        errors.check("emailAddress", validate_email(&form.email_address));
        errors.into_result()?;

        state
            .client()
            .request_password_reset(&api, form.email_address.trim())
            .await?
            .into_result()?;
        Ok::<Done, AppError>(DONE)
    }
    .await;
    respond(&api, result)
}

/// Set a new password with a reset token. Logs the customer in.
#[instrument(skip_all)]
pub async fn reset_password(
    State(state): State<AppState>,
    api: ApiSession,
    Form(form): Form<PasswordResetForm>,
) -> Response {
    let result = async {
        let mut errors = FieldErrors::new();
        errors.check("token", validate_required(&form.token, "Reset token"));
        errors.check("password", validate_password(&form.password));
        errors.into_result()?;

        let user = state
            .client()
            .reset_password(&api, form.token.trim(), &form.password)
            .await?
            .into_result()?;
        set_sentry_user(&user.id, Some(user.identifier.as_str()));
        Ok::<CurrentUser, AppError>(user)
    }
    .await;
    respond(&api, result)
}

// =============================================================================
// Profile
// =============================================================================

/// The logged-in customer with saved addresses.
#[instrument(skip(state, api))]
pub async fn index(State(state): State<AppState>, api: ApiSession) -> Response {
    let result = require_customer(&state, &api).await;
    respond(&api, result)
}

async fn require_customer(state: &AppState, api: &ApiSession) -> Result<Customer> {
    state
        .client()
        .active_customer(api)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Please sign in to continue.".to_string()))
}

/// Update name, title and phone number.
#[instrument(skip(state, api))]
pub async fn update_profile(
    State(state): State<AppState>,
    api: ApiSession,
    Form(form): Form<ProfileForm>,
) -> Response {
    let input = UpdateCustomerInput {
        title: non_blank(form.title),
        first_name: non_blank(form.first_name),
        last_name: non_blank(form.last_name),
        phone_number: non_blank(form.phone_number),
    };

    let result = async {
        let mut errors = FieldErrors::new();
        if let Some(first_name) = &input.first_name {
            errors.check("firstName", validate_name(first_name, "First name"));
        }
        if let Some(last_name) = &input.last_name {
            errors.check("lastName", validate_name(last_name, "Last name"));
        }
        if let Some(phone) = &input.phone_number {
            errors.check("phoneNumber", validate_phone(phone));
        }
        errors.into_result()?;

        Ok::<Customer, AppError>(state.client().update_customer(&api, &input).await?)
    }
    .await;
    respond(&api, result)
}

/// Change password.
#[instrument(skip_all)]
pub async fn change_password(
    State(state): State<AppState>,
    api: ApiSession,
    Form(form): Form<ChangePasswordForm>,
) -> Response {
    let result = async {
        let mut errors = FieldErrors::new();
        errors.check(
            "currentPassword",
            validate_required(&form.current_password, "Current password"),
        );
        errors.check("newPassword", validate_password(&form.new_password));
        errors.into_result()?;

        state
            .client()
            .update_customer_password(&api, &form.current_password, &form.new_password)
            .await?
            .into_result()?;
        Ok::<Done, AppError>(DONE)
    }
    .await;
    respond(&api, result)
}

/// Request an email address change; the new address must be verified.
#[instrument(skip_all)]
pub async fn change_email(
    State(state): State<AppState>,
    api: ApiSession,
    Form(form): Form<ChangeEmailForm>,
) -> Response {
    let result = async {
        let mut errors = FieldErrors::new();
        errors.check("password", validate_required(&form.password, "Password"));
        errors.check("newEmailAddress", validate_email(&form.new_email_address));
        errors.into_result()?;

        state
            .client()
            .request_update_customer_email_address(
                &api,
                &form.password,
                form.new_email_address.trim(),
            )
            .await?
            .into_result()?;
        Ok::<Done, AppError>(DONE)
    }
    .await;
    respond(&api, result)
}

// =============================================================================
// Addresses
// =============================================================================

/// Save a new address.
#[instrument(skip(state, api, form))]
pub async fn create_address(
    State(state): State<AppState>,
    api: ApiSession,
    Form(form): Form<AddressForm>,
) -> Response {
    let input = AddressInput::from(form);
    let result = async {
        input.validate()?;
        Ok::<_, AppError>(state.client().create_customer_address(&api, &input).await?)
    }
    .await;
    respond(&api, result)
}

/// Replace a saved address.
#[instrument(skip(state, api, form))]
pub async fn update_address(
    State(state): State<AppState>,
    api: ApiSession,
    Path(id): Path<String>,
    Form(form): Form<AddressForm>,
) -> Response {
    let id = AddressId::new(id);
    let input = AddressInput::from(form);
    let result = async {
        input.validate()?;
        Ok::<_, AppError>(
            state
                .client()
                .update_customer_address(&api, &id, &input)
                .await?,
        )
    }
    .await;
    respond(&api, result)
}

/// Delete a saved address.
#[instrument(skip(state, api))]
pub async fn delete_address(
    State(state): State<AppState>,
    api: ApiSession,
    Path(id): Path<String>,
) -> Response {
    let id = AddressId::new(id);
    let result = state
        .client()
        .delete_customer_address(&api, &id)
        .await
        .map_err(AppError::from)
        .and_then(|deleted| {
            if deleted.success {
                Ok(DONE)
            } else {
                Err(AppError::NotFound(format!("address {id}")))
            }
        });
    respond(&api, result)
}

/// Countries the channel ships to.
#[instrument(skip(state))]
pub async fn countries(State(state): State<AppState>) -> Result<Json<Vec<Country>>> {
    Ok(Json(state.client().available_countries().await?))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_login_form_remember_me_checkbox() {
        let form: LoginForm =
            serde_json::from_value(serde_json::json!({
                "emailAddress": "ada@example.com",
                "password": "hunter22",
                "rememberMe": "on"
            }))
            .unwrap();
        assert!(form.remember_me.is_some());

        let form: LoginForm =
            serde_json::from_value(serde_json::json!({ "emailAddress": "ada@example.com" }))
                .unwrap();
        assert!(form.remember_me.is_none());
        assert!(form.password.is_empty());
    }

    #[test]
    fn test_done_serializes_success_flag() {
        assert_eq!(
            serde_json::to_value(DONE).unwrap(),
            serde_json::json!({ "success": true })
        );
    }
}
