use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::entities::employee::EmployeeRole;
use crate::error::{AppError, AppResult};
use crate::utils::jwt::{verify_token, Claims};
use crate::AppState;

/// Extract and validate JWT token from Authorization header
pub async fn auth_middleware(
    State(state): State<AppState>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    mut request: Request,
    next: Next,
) -> AppResult<Response> {
    let claims = verify_token(auth.token(), &state.config.jwt_secret)?;
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

fn ensure_role(request: &Request, allowed: &[EmployeeRole], denied: &str) -> AppResult<()> {
    let claims = request
        .extensions()
        .get::<Claims>()
        .ok_or_else(|| AppError::Unauthorized("No authentication found".to_string()))?;

    if !claims.has_role(allowed) {
        return Err(AppError::Forbidden(denied.to_string()));
    }
    Ok(())
}

/// Require admin role
pub async fn require_admin(request: Request, next: Next) -> AppResult<Response> {
    ensure_role(&request, &[EmployeeRole::Admin], "Admin access required")?;
    Ok(next.run(request).await)
}

/// Admin or general affairs: may list and decide bookings
pub async fn require_approver(request: Request, next: Next) -> AppResult<Response> {
    ensure_role(
        &request,
        &[EmployeeRole::Admin, EmployeeRole::Ga],
        "Approver access required",
    )?;
    Ok(next.run(request).await)
}

/// Admin or employee: may request bookings
pub async fn require_booker(request: Request, next: Next) -> AppResult<Response> {
    ensure_role(
        &request,
        &[EmployeeRole::Admin, EmployeeRole::Employee],
        "Employee access required",
    )?;
    Ok(next.run(request).await)
}
