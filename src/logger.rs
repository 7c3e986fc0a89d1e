use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use log::info;
use std::rc::Rc;
use std::time::Instant;

use crate::auth::Claims;

/// Request logging middleware.
///
/// Logs method, path, status and latency, plus the username when the
/// request carried a valid access token. Wrap it outside
/// [`crate::middleware::Authenticate`] so the claims are present by the
/// time the response is logged.
pub struct LoggerMiddleware;

impl<S, B> Transform<S, ServiceRequest> for LoggerMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = LoggerMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(LoggerMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct LoggerMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for LoggerMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let start_time = Instant::now();
        let method = req.method().to_string();
        let path = req.path().to_string();

        let service = self.service.clone();

        Box::pin(async move {
            let res = service.call(req).await?;

            let identity = request_identity(&res);

            info!(
                "{} {} {} user={} ({}ms)",
                method,
                path,
                res.status().as_u16(),
                identity,
                start_time.elapsed().as_millis()
            );

            Ok(res)
        })
    }
}

/// Username attached by the authentication middleware, or `-`.
fn request_identity<B>(res: &ServiceResponse<B>) -> String {
    res.request()
        .extensions()
        .get::<Claims>()
        .map(|claims| claims.username.clone())
        .unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthHelper, MIN_SALT_ROUNDS};
    use crate::configuration::AuthSettings;
    use crate::middleware::Authenticate;
    use crate::users::InMemoryUserStore;
    use actix_web::http::header::AUTHORIZATION;
    use actix_web::{test, web, App, HttpResponse};
    use std::sync::Arc;

    fn helper() -> web::Data<AuthHelper> {
        let settings = AuthSettings {
            password_hash_salt_rounds: MIN_SALT_ROUNDS,
            user_token_secret: "logger-access".to_string(),
            refresh_token_secret: "logger-refresh".to_string(),
            access_token_expiry: 3600,
            refresh_token_expiry: 86400,
        };
        web::Data::new(AuthHelper::new(settings, Arc::new(InMemoryUserStore::new())))
    }

    #[actix_web::test]
    async fn test_identity_comes_from_authenticated_claims() {
        let helper = helper();
        let token = helper.generate_access_token("alice", false, 1).unwrap();
        let refresh = helper.generate_refresh_token("alice", false, 1).unwrap();
        let app = test::init_service(
            App::new()
                .wrap(Authenticate::new(helper.clone()))
                .wrap(LoggerMiddleware)
                .route("/", web::get().to(|| async { HttpResponse::Ok().finish() })),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/")
            .insert_header((AUTHORIZATION, format!("Bearer {}", token)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.request().extensions().get::<Claims>().map(|c| c.id), Some(1));
        assert_eq!(request_identity(&resp), "alice");

        let cases: Vec<(Option<String>, &str)> = vec![
            (None, "no header"),
            (Some("Bearer garbage".to_string()), "garbage token"),
            (Some(format!("Bearer {}", refresh)), "refresh token"),
        ];
        for (authorization, reason) in cases {
            let mut req = test::TestRequest::get().uri("/");
            if let Some(value) = authorization {
                req = req.insert_header((AUTHORIZATION, value));
            }
            let resp = test::call_service(&app, req.to_request()).await;
            assert_eq!(request_identity(&resp), "-", "Should be anonymous: {}", reason);
        }
    }

    #[actix_web::test]
    async fn test_logger_passes_response_through() {
        let app = test::init_service(
            App::new()
                .wrap(LoggerMiddleware)
                .route("/", web::get().to(|| async { HttpResponse::Accepted().finish() })),
        )
        .await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(resp.status().as_u16(), 202);
    }
}
