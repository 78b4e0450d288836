use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};

use crate::auth::token::TokenIssuer;
use crate::error::AppError;

/// Bearer-token middleware for everything under `/api`.
///
/// Resolves the caller's identity exactly once per request: the token from
/// the `Authorization` header is verified against the `TokenIssuer` held in
/// application data, and the resulting account id is placed into request
/// extensions for the `AuthenticatedUserId` extractor.
pub struct AuthMiddleware;

// Endpoints reachable without a token: registration, login, and the two
// halves of the password-reset flow (the reset credential is its own proof).
const PUBLIC_PATHS: [&str; 4] = [
    "/api/auth/register",
    "/api/auth/login",
    "/api/auth/password-reset",
    "/api/auth/password-reset/confirm",
];

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService { service }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if PUBLIC_PATHS.contains(&req.path()) {
            let fut = self.service.call(req);
            return Box::pin(fut);
        }

        let tokens = match req.app_data::<web::Data<TokenIssuer>>() {
            Some(tokens) => tokens,
            None => {
                let app_err = AppError::Internal("TokenIssuer not configured".into());
                return Box::pin(async move { Err(app_err.into()) });
            }
        };

        let bearer = req
            .headers()
            .get("Authorization")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));

        // A missing header and a bad token get the same treatment: one
        // Unauthenticated error, no hint about which check failed.
        let verified = bearer
            .ok_or_else(|| AppError::Unauthenticated("Invalid or expired token".into()))
            .and_then(|token| tokens.verify(token));

        match verified {
            Ok(account_id) => {
                req.extensions_mut().insert(account_id);
                let fut = self.service.call(req);
                Box::pin(fut)
            }
            Err(app_err) => Box::pin(async move { Err(app_err.into()) }),
        }
    }
}
