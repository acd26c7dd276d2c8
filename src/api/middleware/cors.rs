use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::{
        header::{self, HeaderMap, HeaderValue},
        Method,
    },
    Error, HttpResponse,
};
use std::{
    future::{ready, Future, Ready},
    pin::Pin,
    rc::Rc,
};
use tracing::warn;

pub const ALLOW_HEADERS: &str = "authorization, x-client-info, apikey, content-type";
pub const ALLOW_METHODS: &str = "POST, OPTIONS";

/// Answers preflight requests itself and stamps the cross-origin headers on
/// every other response, errors included.
#[derive(Clone)]
pub struct Cors {
    allow_origin: HeaderValue,
}

impl Cors {
    pub fn permissive() -> Self {
        Self {
            allow_origin: HeaderValue::from_static("*"),
        }
    }

    pub fn with_origin(origin: &str) -> Self {
        match HeaderValue::from_str(origin) {
            Ok(allow_origin) => Self { allow_origin },
            Err(_) => {
                warn!("Invalid CORS origin '{}', allowing any origin", origin);
                Self::permissive()
            }
        }
    }
}

impl Default for Cors {
    fn default() -> Self {
        Self::permissive()
    }
}

fn apply_headers(headers: &mut HeaderMap, origin: &HeaderValue) {
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
}

impl<S, B> Transform<S, ServiceRequest> for Cors
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = CorsMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CorsMiddleware {
            service: Rc::new(service),
            allow_origin: self.allow_origin.clone(),
        }))
    }
}

pub struct CorsMiddleware<S> {
    service: Rc<S>,
    allow_origin: HeaderValue,
}

impl<S, B> Service<ServiceRequest> for CorsMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let origin = self.allow_origin.clone();

        if req.method() == Method::OPTIONS {
            let mut res = req.into_response(HttpResponse::Ok().finish());
            apply_headers(res.headers_mut(), &origin);
            return Box::pin(async move { Ok(res.map_into_right_body()) });
        }

        let srv = self.service.clone();
        let http_req = req.request().clone();

        Box::pin(async move {
            let mut res = match srv.call(req).await {
                Ok(res) => res.map_into_left_body(),
                Err(err) => ServiceResponse::new(http_req, err.error_response()).map_into_right_body(),
            };
            apply_headers(res.headers_mut(), &origin);
            Ok(res)
        })
    }
}
