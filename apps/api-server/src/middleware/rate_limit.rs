//! Rate limiting middleware for the public form endpoints.

use actix_web::{
    Error, HttpResponse,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use meridian_shared::ErrorResponse;
use std::future::{Future, Ready, ready};
use std::pin::Pin;
use std::sync::Arc;

use meridian_core::ports::RateLimiter;

/// Client identifier for rate limiting: first entry of `X-Forwarded-For`,
/// else `X-Real-IP`, else `"unknown"`.
///
/// Clients that arrive with neither header all share the `"unknown"` quota.
/// That imprecision is accepted; the alternative is trusting the socket
/// address, which behind the CDN is always the proxy.
pub fn client_identifier(req: &ServiceRequest) -> String {
    if let Some(forwarded) = req.headers().get("x-forwarded-for") {
        if let Ok(value) = forwarded.to_str() {
            if let Some(first) = value.split(',').next() {
                let first = first.trim();
                if !first.is_empty() {
                    return first.to_string();
                }
            }
        }
    }

    if let Some(real_ip) = req.headers().get("x-real-ip") {
        if let Ok(value) = real_ip.to_str() {
            let value = value.trim();
            if !value.is_empty() {
                return value.to_string();
            }
        }
    }

    "unknown".to_string()
}

/// Rate limiting middleware factory.
pub struct RateLimitMiddleware {
    limiter: Arc<dyn RateLimiter>,
}

impl RateLimitMiddleware {
    pub fn new(limiter: Arc<dyn RateLimiter>) -> Self {
        Self { limiter }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimitMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RateLimitMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddlewareService {
            service,
            limiter: self.limiter.clone(),
        }))
    }
}

pub struct RateLimitMiddlewareService<S> {
    service: S,
    limiter: Arc<dyn RateLimiter>,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let limiter = self.limiter.clone();
        let key = client_identifier(&req);

        // Check rate limit synchronously before calling inner service.
        // The in-memory backend resolves immediately; only the Redis
        // backend actually suspends here.
        let check_result = { futures::executor::block_on(limiter.check(&key)) };

        match check_result {
            Ok(decision) if !decision.allowed => {
                // Rate limited - return 429 immediately
                tracing::warn!("Rate limit exceeded for key: {}", key);

                let retry_after = decision.reset_after.as_secs().max(1);
                let error = ErrorResponse::too_many_requests(retry_after);

                let response = HttpResponse::TooManyRequests()
                    .insert_header(("X-RateLimit-Remaining", "0"))
                    .insert_header(("Retry-After", retry_after.to_string()))
                    .json(error);

                let (http_req, _payload) = req.into_parts();
                let srv_response = ServiceResponse::new(http_req, response);

                Box::pin(async move { Ok(srv_response.map_into_right_body()) })
            }
            Ok(_) | Err(_) => {
                // Allowed or backend error (fail open) - proceed with request
                if check_result.is_err() {
                    tracing::error!("Rate limiter error, failing open");
                }

                let fut = self.service.call(req);
                Box::pin(async move {
                    let res = fut.await?;
                    Ok(res.map_into_left_body())
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{App, test, web};
    use meridian_infra::{FixedWindowConfig, FixedWindowRateLimiter};
    use std::time::Duration;

    fn limiter(max_requests: u32) -> Arc<dyn RateLimiter> {
        Arc::new(FixedWindowRateLimiter::new(FixedWindowConfig {
            max_requests,
            window: Duration::from_secs(60),
            sweep_every: 100,
        }))
    }

    async fn accepted() -> actix_web::HttpResponse {
        actix_web::HttpResponse::Accepted().finish()
    }

    #[actix_web::test]
    async fn identifier_prefers_forwarded_for_first_entry() {
        let req = test::TestRequest::default()
            .insert_header(("x-forwarded-for", "203.0.113.7, 10.0.0.1"))
            .insert_header(("x-real-ip", "198.51.100.2"))
            .to_srv_request();
        assert_eq!(client_identifier(&req), "203.0.113.7");
    }

    #[actix_web::test]
    async fn identifier_falls_back_to_real_ip_then_unknown() {
        let req = test::TestRequest::default()
            .insert_header(("x-real-ip", "198.51.100.2"))
            .to_srv_request();
        assert_eq!(client_identifier(&req), "198.51.100.2");

        let req = test::TestRequest::default().to_srv_request();
        assert_eq!(client_identifier(&req), "unknown");
    }

    #[actix_web::test]
    async fn denies_with_retry_after_once_spent() {
        let app = test::init_service(
            App::new()
                .wrap(RateLimitMiddleware::new(limiter(2)))
                .route("/submit", web::post().to(accepted)),
        )
        .await;

        for _ in 0..2 {
            let req = test::TestRequest::post()
                .uri("/submit")
                .insert_header(("x-forwarded-for", "203.0.113.7"))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::ACCEPTED);
        }

        let req = test::TestRequest::post()
            .uri("/submit")
            .insert_header(("x-forwarded-for", "203.0.113.7"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(resp.headers().contains_key("retry-after"));
    }

    #[actix_web::test]
    async fn quotas_are_scoped_by_first_forwarded_entry() {
        let app = test::init_service(
            App::new()
                .wrap(RateLimitMiddleware::new(limiter(1)))
                .route("/submit", web::post().to(accepted)),
        )
        .await;

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/submit")
                .insert_header(("x-forwarded-for", "203.0.113.7, 10.0.0.1"))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::ACCEPTED);

        // Same client behind a different proxy chain: still limited.
        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/submit")
                .insert_header(("x-forwarded-for", "203.0.113.7, 10.9.9.9"))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);

        // A different client is unaffected.
        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/submit")
                .insert_header(("x-forwarded-for", "198.51.100.9"))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::ACCEPTED);
    }

    #[actix_web::test]
    async fn anonymous_clients_share_one_quota() {
        let app = test::init_service(
            App::new()
                .wrap(RateLimitMiddleware::new(limiter(1)))
                .route("/submit", web::post().to(accepted)),
        )
        .await;

        let resp = test::call_service(
            &app,
            test::TestRequest::post().uri("/submit").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::ACCEPTED);

        let resp = test::call_service(
            &app,
            test::TestRequest::post().uri("/submit").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
