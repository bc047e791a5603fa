use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
};
use futures::future::LocalBoxFuture;
use log::{error, info, warn};
use std::rc::Rc;
use std::time::Instant;

/// Request logging middleware
///
/// Logs every request on entry and on completion with its status and
/// latency. Request bodies are never logged: they carry passwords and
/// refresh tokens.
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

        info!("Request started: {} {}", method, path);

        let service = self.service.clone();

        Box::pin(async move {
            let result = service.call(req).await;
            let elapsed = start_time.elapsed().as_millis();

            match &result {
                Ok(res) => {
                    let status = res.status();
                    if status.is_server_error() {
                        error!(
                            "Request failed: {} {} - Status: {} ({}ms)",
                            method,
                            path,
                            status.as_u16(),
                            elapsed
                        );
                    } else {
                        info!(
                            "Request completed: {} {} - Status: {} ({}ms)",
                            method,
                            path,
                            status.as_u16(),
                            elapsed
                        );
                    }
                }
                Err(e) => {
                    // Rejected by inner middleware before reaching a handler
                    warn!(
                        "Request rejected: {} {} - Status: {} ({}ms)",
                        method,
                        path,
                        e.as_response_error().status_code().as_u16(),
                        elapsed
                    );
                }
            }

            result
        })
    }
}
