/// Bearer Authentication Middleware
///
/// Runs [`AuthHelper::authenticate`] on every request. Valid access token
/// claims land in the request extensions, where handlers read them with
/// `web::ReqData<Claims>`. Requests without a valid token pass through
/// unchanged; handlers decide whether to reject them.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::auth::AuthHelper;

pub struct Authenticate {
    helper: web::Data<AuthHelper>,
}

impl Authenticate {
    pub fn new(helper: web::Data<AuthHelper>) -> Self {
        Self { helper }
    }
}

impl<S, B> Transform<S, ServiceRequest> for Authenticate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthenticateService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(AuthenticateService {
            service: Rc::new(service),
            helper: self.helper.clone(),
        }))
    }
}

pub struct AuthenticateService<S> {
    service: Rc<S>,
    helper: web::Data<AuthHelper>,
}

impl<S, B> Service<ServiceRequest> for AuthenticateService<S>
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
        if self.helper.authenticate(req.request()) {
            tracing::debug!(path = %req.path(), "Bearer token accepted");
        }

        let service = self.service.clone();
        Box::pin(async move { service.call(req).await })
    }
}
