//! Ordered interceptor chain run around every request.
//!
//! The chain is an explicit list: the first interceptor pushed is the
//! outermost. Each interceptor receives the request, the request context and
//! a [`Next`] handle; it may act before delegating, after delegating, or
//! answer on its own without delegating at all.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use storyboard_core::server::middleware::{MiddlewareStack, SecureHeaders, LogRequest};
//!
//! let stack = MiddlewareStack::new()
//!     .with(Arc::new(SecureHeaders))
//!     .with(Arc::new(LogRequest));
//! assert_eq!(stack.len(), 2);
//! ```

use async_trait::async_trait;
use axum::extract::{Request, State};
use axum::middleware;
use axum::response::Response;
use std::sync::Arc;

use super::context::RequestContext;

#[async_trait]
pub trait Interceptor: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    async fn intercept(
        &self,
        request: Request,
        ctx: &mut RequestContext,
        next: Next<'_>,
    ) -> Response;
}

/// Remainder of the chain, ending at the routed endpoint
pub struct Next<'a> {
    chain: &'a [Arc<dyn Interceptor>],
    endpoint: middleware::Next,
}

impl<'a> Next<'a> {
    /// Hand the request to the next interceptor, or to the endpoint when the
    /// chain is exhausted. The endpoint sees a snapshot of `ctx`.
    pub async fn run(self, mut request: Request, ctx: &mut RequestContext) -> Response {
        match self.chain.split_first() {
            Some((head, rest)) => {
                let next = Next {
                    chain: rest,
                    endpoint: self.endpoint,
                };
                head.intercept(request, ctx, next).await
            }
            None => {
                request.extensions_mut().insert(ctx.clone());
                self.endpoint.run(request).await
            }
        }
    }
}

#[derive(Default, Clone)]
pub struct MiddlewareStack {
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl MiddlewareStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an interceptor; it runs inside every one pushed before it
    pub fn push(&mut self, interceptor: Arc<dyn Interceptor>) {
        self.interceptors.push(interceptor);
    }

    pub fn with(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.push(interceptor);
        self
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    /// Interceptor names, outermost first
    pub fn names(&self) -> Vec<&'static str> {
        self.interceptors.iter().map(|i| i.name()).collect()
    }

    /// Run the whole chain for one request.
    ///
    /// Owns the request context; once the chain has produced a response,
    /// headers and cookies staged in the context are merged into it.
    pub async fn execute(&self, request: Request, endpoint: middleware::Next) -> Response {
        let mut ctx = RequestContext::default();
        let next = Next {
            chain: &self.interceptors,
            endpoint,
        };
        let mut response = next.run(request, &mut ctx).await;
        ctx.apply_staged(&mut response);
        response
    }
}

/// Axum adapter: `middleware::from_fn_with_state(Arc<MiddlewareStack>, run_middleware_stack)`
pub async fn run_middleware_stack(
    State(stack): State<Arc<MiddlewareStack>>,
    request: Request,
    next: middleware::Next,
) -> Response {
    stack.execute(request, next).await
}
