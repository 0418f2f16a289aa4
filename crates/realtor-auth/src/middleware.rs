//! Actix-web request extractors
//!
//! Bearer-token authentication with realtor/admin role checks. Every
//! rejection is answered with 401.

use crate::jwt::JwtService;
use crate::Claims;
use actix_web::{dev::Payload, error::ErrorUnauthorized, web, FromRequest, HttpRequest};
use futures::future::{ready, Ready};
use realtor_core::error::AppError;
use realtor_core::models::UserRole;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Extract the bearer token from the Authorization header
fn extract_bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Authenticated user extractor
///
/// # Examples
///
/// ```no_run
/// use actix_web::HttpResponse;
/// use realtor_auth::middleware::AuthenticatedUser;
///
/// async fn me(user: AuthenticatedUser) -> HttpResponse {
///     HttpResponse::Ok().json(serde_json::json!({ "id": user.user_id }))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: UserRole,

    /// Full claims from the JWT token
    pub claims: Claims,
}

impl AuthenticatedUser {
    /// Check if user has admin privileges
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    fn from_claims(claims: Claims) -> Result<Self, AppError> {
        Ok(Self {
            user_id: claims.user_id()?,
            email: claims.email.clone(),
            role: claims.role,
            claims,
        })
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let jwt_service = match req.app_data::<web::Data<Arc<JwtService>>>() {
            Some(service) => service.get_ref().clone(),
            None => {
                warn!("JwtService not found in app data");
                return ready(Err(ErrorUnauthorized(AppError::Unauthorized(
                    "Authentication service not configured".to_string(),
                ))));
            }
        };

        let token = match extract_bearer_token(req) {
            Some(t) => t,
            None => {
                debug!("No bearer token found in request");
                return ready(Err(ErrorUnauthorized(AppError::Unauthorized(
                    "No authentication token provided".to_string(),
                ))));
            }
        };

        match jwt_service
            .validate_token(token)
            .and_then(AuthenticatedUser::from_claims)
        {
            Ok(user) => {
                debug!(user_id = %user.user_id, role = %user.role, "User authenticated");
                ready(Ok(user))
            }
            Err(e) => {
                warn!(error = %e, "Token validation failed");
                ready(Err(ErrorUnauthorized(e)))
            }
        }
    }
}

/// Admin user extractor
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthenticatedUser);

impl std::ops::Deref for AdminUser {
    type Target = AuthenticatedUser;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequest for AdminUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let auth_user = match AuthenticatedUser::from_request(req, payload).into_inner() {
            Ok(user) => user,
            Err(e) => return ready(Err(e)),
        };

        if !auth_user.is_admin() {
            warn!(
                user_id = %auth_user.user_id,
                role = %auth_user.role,
                "User attempted admin access without privileges"
            );
            return ready(Err(ErrorUnauthorized(AppError::Forbidden)));
        }

        ready(Ok(AdminUser(auth_user)))
    }
}

/// Realtor user extractor
///
/// Used on routes that spend the caller's own credits or create orders.
#[derive(Debug, Clone)]
pub struct RealtorUser(pub AuthenticatedUser);

impl std::ops::Deref for RealtorUser {
    type Target = AuthenticatedUser;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequest for RealtorUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let auth_user = match AuthenticatedUser::from_request(req, payload).into_inner() {
            Ok(user) => user,
            Err(e) => return ready(Err(e)),
        };

        if auth_user.role != UserRole::Realtor {
            warn!(
                user_id = %auth_user.user_id,
                "Non-realtor attempted a realtor-only action"
            );
            return ready(Err(ErrorUnauthorized(AppError::Forbidden)));
        }

        ready(Ok(RealtorUser(auth_user)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};

    fn create_test_jwt_service() -> Arc<JwtService> {
        Arc::new(JwtService::new("test-secret-key-12345", 3600))
    }

    fn token_for(jwt: &JwtService, role: UserRole) -> (Uuid, String) {
        let id = Uuid::new_v4();
        let token = jwt
            .create_token(&Claims::new(id, "user@example.com", role))
            .unwrap();
        (id, token)
    }

    #[actix_web::test]
    async fn test_bearer_token_authenticates() {
        let jwt_service = create_test_jwt_service();
        let (id, token) = token_for(&jwt_service, UserRole::Realtor);

        let app = test::init_service(App::new().app_data(web::Data::new(jwt_service)).route(
            "/me",
            web::get().to(move |user: AuthenticatedUser| async move {
                assert_eq!(user.user_id, id);
                "OK"
            }),
        ))
        .await;

        let req = test::TestRequest::get()
            .uri("/me")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
    }

    #[actix_web::test]
    async fn test_missing_token() {
        let jwt_service = create_test_jwt_service();

        let app = test::init_service(App::new().app_data(web::Data::new(jwt_service)).route(
            "/me",
            web::get().to(|_user: AuthenticatedUser| async { "OK" }),
        ))
        .await;

        let req = test::TestRequest::get().uri("/me").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 401);
    }

    #[actix_web::test]
    async fn test_non_bearer_scheme_rejected() {
        let jwt_service = create_test_jwt_service();
        let (_, token) = token_for(&jwt_service, UserRole::Realtor);

        let app = test::init_service(App::new().app_data(web::Data::new(jwt_service)).route(
            "/me",
            web::get().to(|_user: AuthenticatedUser| async { "OK" }),
        ))
        .await;

        let req = test::TestRequest::get()
            .uri("/me")
            .insert_header(("Authorization", format!("Token {}", token)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 401);
    }

    #[actix_web::test]
    async fn test_admin_route_rejects_realtor() {
        let jwt_service = create_test_jwt_service();
        let (_, token) = token_for(&jwt_service, UserRole::Realtor);

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(jwt_service))
                .route("/admin", web::get().to(|_admin: AdminUser| async { "OK" })),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/admin")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 401);
    }

    #[actix_web::test]
    async fn test_admin_route_accepts_admin() {
        let jwt_service = create_test_jwt_service();
        let (_, token) = token_for(&jwt_service, UserRole::Admin);

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(jwt_service))
                .route("/admin", web::get().to(|_admin: AdminUser| async { "OK" })),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/admin")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
    }

    #[actix_web::test]
    async fn test_realtor_route_rejects_admin() {
        let jwt_service = create_test_jwt_service();
        let (_, token) = token_for(&jwt_service, UserRole::Admin);

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(jwt_service))
                .route("/charge", web::post().to(|_user: RealtorUser| async { "OK" })),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/charge")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 401);
    }
}
