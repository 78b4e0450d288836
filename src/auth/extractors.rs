use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use crate::error::AppError;

/// Extracts the authenticated account's id from request extensions.
///
/// `AuthMiddleware` verifies the bearer token and inserts the account id;
/// this extractor is how handlers receive it. On a route that the
/// middleware did not cover the id is absent and extraction fails with
/// `Unauthenticated`.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUserId(pub i32);

impl FromRequest for AuthenticatedUserId {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<i32>().copied() {
            Some(account_id) => ready(Ok(AuthenticatedUserId(account_id))),
            None => {
                let err = AppError::Unauthenticated("Invalid or expired token".into());
                ready(Err(err.into()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::dev::Payload;
    use actix_web::http::StatusCode;
    use actix_web::test;

    #[actix_rt::test]
    async fn test_authenticated_user_id_extractor_success() {
        let req = test::TestRequest::default().to_http_request();
        req.extensions_mut().insert(123_i32);

        let mut payload = Payload::None;
        let extracted = AuthenticatedUserId::from_request(&req, &mut payload).await;
        assert!(extracted.is_ok());
        assert_eq!(extracted.unwrap().0, 123);
    }

    #[actix_rt::test]
    async fn test_authenticated_user_id_extractor_failure() {
        let req = test::TestRequest::default().to_http_request();

        let mut payload = Payload::None;
        let result = AuthenticatedUserId::from_request(&req, &mut payload).await;
        assert!(result.is_err());

        let response = result.unwrap_err().error_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
