use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use service_core::error::AppError;

/// Role that may map short names and ingest EFT files.
pub const STAFF_ROLE: &str = "staff";

/// Caller identity extracted from the `X-User-ID` and `X-User-Roles` headers.
///
/// Headers are set by the gateway after authentication and are trusted as is.
#[derive(Debug, Clone)]
pub struct UserContext {
    pub user_id: String,
    pub roles: Vec<String>,
}

impl UserContext {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.eq_ignore_ascii_case(role))
    }

    pub fn require_role(&self, role: &str) -> Result<(), AppError> {
        if self.has_role(role) {
            Ok(())
        } else {
            tracing::warn!(user_id = %self.user_id, role = role, "Missing required role");
            Err(AppError::Forbidden(anyhow::anyhow!(
                "Role '{}' is required for this operation",
                role
            )))
        }
    }
}

fn parse_roles(header: &str) -> Vec<String> {
    header
        .split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl<S> FromRequestParts<S> for UserContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get("X-User-ID")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Missing X-User-ID header")))?;

        let roles = parts
            .headers
            .get("X-User-Roles")
            .and_then(|v| v.to_str().ok())
            .map(parse_roles)
            .unwrap_or_default();

        tracing::Span::current().record("user_id", user_id);

        Ok(UserContext {
            user_id: user_id.to_string(),
            roles,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> Result<UserContext, AppError> {
        let (mut parts, _) = request.into_parts();
        UserContext::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn roles_are_split_on_commas() {
        let request = Request::builder()
            .header("X-User-ID", "staff-1")
            .header("X-User-Roles", "viewer, staff ,")
            .body(())
            .unwrap();

        let user = extract(request).await.unwrap();
        assert_eq!(user.user_id, "staff-1");
        assert_eq!(user.roles, vec!["viewer", "staff"]);
        assert!(user.require_role(STAFF_ROLE).is_ok());
    }

    #[tokio::test]
    async fn missing_user_is_unauthorized() {
        let request = Request::builder().body(()).unwrap();
        let err = extract(request).await.unwrap_err();
        assert_eq!(err.code(), "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn user_without_staff_role_is_forbidden() {
        let request = Request::builder()
            .header("X-User-ID", "user-2")
            .body(())
            .unwrap();

        let user = extract(request).await.unwrap();
        let err = user.require_role(STAFF_ROLE).unwrap_err();
        assert_eq!(err.code(), "FORBIDDEN");
    }
}
