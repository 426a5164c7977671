//! Account API handlers.
//!
//! ```text
//! POST /api/v1/accounts
//! GET /api/v1/accounts/me
//! DELETE /api/v1/session
//! ```

use actix_web::{HttpResponse, delete, get, post, web};

use crate::domain::{Error, RegistrationDraft};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::{ProfileResponse, RegisterRequest};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_role, required_text};

/// Register an account and sign it in.
#[utoipa::path(
    post,
    path = "/api/v1/accounts",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = ProfileResponse,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = Error),
        (status = 409, description = "Username taken", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "registerAccount",
    security([])
)]
#[post("/accounts")]
pub async fn register(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let RegisterRequest {
        username,
        role,
        document,
        phone,
    } = payload.into_inner();
    let username = required_text(username, FieldName::new("username"))?;
    let raw_role = required_text(role, FieldName::new("role"))?;
    let draft = RegistrationDraft {
        username,
        role: parse_role(&raw_role, FieldName::new("role"))?,
        document,
        phone,
    };

    let account = state.accounts.register(draft).await?;
    session.persist_user(&account.user().id())?;
    Ok(HttpResponse::Created().json(ProfileResponse::from(account)))
}

/// The signed-in user's profile and balance.
#[utoipa::path(
    get,
    path = "/api/v1/accounts/me",
    responses(
        (status = 200, description = "Current profile", body = ProfileResponse),
        (status = 401, description = "Not signed in", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "currentAccount"
)]
#[get("/accounts/me")]
pub async fn current_account(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<ProfileResponse>> {
    let account = state.account(&session).await?;
    Ok(web::Json(ProfileResponse::from(account)))
}

/// Sign out.
#[utoipa::path(
    delete,
    path = "/api/v1/session",
    responses((status = 204, description = "Signed out")),
    tags = ["accounts"],
    operation_id = "logout",
    security([])
)]
#[delete("/session")]
pub async fn logout(session: SessionContext) -> HttpResponse {
    session.clear();
    HttpResponse::NoContent().finish()
}

#[cfg(test)]
#[path = "accounts_tests.rs"]
mod tests;
