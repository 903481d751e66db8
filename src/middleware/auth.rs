use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::error::Error;

pub const STAFF_ROLES: [&str; 2] = ["admin", "staff"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub role: Option<String>,
}

impl Claims {
    pub fn has_any_role(&self, allowed: &[&str]) -> bool {
        let role = self.role.as_deref().unwrap_or_default();
        allowed.iter().any(|r| r.eq_ignore_ascii_case(role))
    }
}

/// Decodes the bearer token of `req` against the configured secret.
pub fn bearer_claims(req: &Request, secret: &str) -> Result<Claims, &'static str> {
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .ok_or("missing_authorization")?;
    let auth_str = auth_header.to_str().map_err(|_| "bad_authorization")?;
    let token = auth_str.strip_prefix("Bearer ").ok_or("unsupported_scheme")?;

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|_| "invalid_token")
}

pub async fn require_roles(mut req: Request, next: Next, allowed: &[&str]) -> Response {
    let config = crate::config::get_config();
    let claims = match bearer_claims(&req, &config.jwt_secret) {
        Ok(claims) => claims,
        Err(code) => return Error::Unauthorized(code.to_string()).into_response(),
    };
    if !allowed.is_empty() && !claims.has_any_role(allowed) {
        tracing::warn!(sub = %claims.sub, role = ?claims.role, "staff route refused");
        return Error::Forbidden("forbidden".to_string()).into_response();
    }
    req.extensions_mut().insert(claims);
    next.run(req).await
}

/// Dealership staff only: roles `admin` or `staff`.
pub async fn require_staff(req: Request, next: Next) -> Response {
    require_roles(req, next, &STAFF_ROLES).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn request_with(token: Option<&str>) -> Request {
        let mut builder = Request::builder().uri("/");
        if let Some(token) = token {
            builder = builder.header("authorization", token);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn token(role: &str, secret: &str) -> String {
        let claims = Claims {
            sub: "7".into(),
            exp: (chrono::Utc::now().timestamp() + 3600) as usize,
            role: Some(role.into()),
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn decodes_valid_bearer_tokens() {
        let bearer = format!("Bearer {}", token("Staff", "s3cret"));
        let claims = bearer_claims(&request_with(Some(&bearer)), "s3cret").unwrap();
        assert!(claims.has_any_role(&STAFF_ROLES));
        assert!(!claims.has_any_role(&["admin"]));
    }

    #[test]
    fn rejects_missing_or_foreign_tokens() {
        assert_eq!(bearer_claims(&request_with(None), "s3cret").unwrap_err(), "missing_authorization");
        assert_eq!(
            bearer_claims(&request_with(Some("Basic abc")), "s3cret").unwrap_err(),
            "unsupported_scheme"
        );
        let bearer = format!("Bearer {}", token("admin", "other"));
        assert_eq!(bearer_claims(&request_with(Some(&bearer)), "s3cret").unwrap_err(), "invalid_token");
    }
}
