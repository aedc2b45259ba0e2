use async_trait::async_trait;
use axum::extract::Request;
use axum::http::header::{HOST, STRICT_TRANSPORT_SECURITY};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use tracing::debug;

use super::context::RequestContext;
use super::stack::{Interceptor, Next};
use crate::server::error::status_response;

const FORWARDED_PROTO: &str = "x-forwarded-proto";
const HSTS: &str = "max-age=63072000; includeSubDomains";

/// Redirects plain-HTTP requests to HTTPS and pins HTTPS afterwards.
///
/// TLS terminates at a proxy in front of the server, so the scheme comes
/// from `X-Forwarded-Proto`. Hosts in `local_hosts` (port ignored) are
/// served as-is for local development.
pub struct EnforceHttps {
    local_hosts: Vec<String>,
}

impl EnforceHttps {
    pub fn new(local_hosts: Vec<String>) -> Self {
        Self {
            local_hosts: local_hosts
                .into_iter()
                .map(|h| h.to_ascii_lowercase())
                .collect(),
        }
    }

    fn is_local(&self, host: &str) -> bool {
        let name = host_name(host).to_ascii_lowercase();
        self.local_hosts.iter().any(|h| *h == name)
    }
}

/// Host without its port; keeps the brackets of an IPv6 literal
fn host_name(host: &str) -> &str {
    if host.starts_with('[') {
        match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        }
    } else {
        host.split(':').next().unwrap_or(host)
    }
}

fn forwarded_https(headers: &HeaderMap) -> bool {
    headers
        .get(FORWARDED_PROTO)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .is_some_and(|proto| proto.trim().eq_ignore_ascii_case("https"))
}

#[async_trait]
impl Interceptor for EnforceHttps {
    fn name(&self) -> &'static str {
        "enforce_https"
    }

    async fn intercept(
        &self,
        request: Request,
        ctx: &mut RequestContext,
        next: Next<'_>,
    ) -> Response {
        let host = request
            .headers()
            .get(HOST)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .or_else(|| request.uri().authority().map(|a| a.to_string()));

        let Some(host) = host else {
            debug!("Rejecting request without a host");
            return status_response(StatusCode::BAD_REQUEST);
        };

        if self.is_local(&host) {
            return next.run(request, ctx).await;
        }

        if !forwarded_https(request.headers()) {
            let target = request
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str())
                .unwrap_or("/");
            debug!(%host, %target, "Redirecting to HTTPS");
            return Redirect::permanent(&format!("https://{}{}", host, target)).into_response();
        }

        ctx.stage_header(STRICT_TRANSPORT_SECURITY, HeaderValue::from_static(HSTS));
        next.run(request, ctx).await
    }
}
