// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Ordered interceptor chain.
//!
//! ```text
//! Chain::new().with(a).with(b)
//!
//! request -> a -> b -> terminal
//!            |    |
//!            +----+--> short-circuit response
//! ```
//!
//! The first interceptor added is the outermost. Each one either returns a
//! response of its own or hands the (possibly enriched) request to
//! [`Next::run`]. The terminal handler runs only if every interceptor forwards.

use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use std::task::{Context, Poll};

use async_trait::async_trait;
use axum::{body::Body, http::Request, response::Response};
use futures::future::BoxFuture;
use tower::{Layer, Service, ServiceExt};

// =============================================================================
// Interceptor
// =============================================================================

/// A step in the request pipeline.
#[async_trait]
pub trait Interceptor: Send + Sync + 'static {
    /// Handles the request, either answering it or forwarding it to `next`.
    async fn intercept(&self, req: Request<Body>, next: Next) -> Response;
}

/// Interceptor backed by an async closure.
#[derive(Clone)]
pub struct FnInterceptor<F> {
    f: F,
}

/// Wraps an async closure as an [`Interceptor`].
pub fn interceptor_fn<F, Fut>(f: F) -> FnInterceptor<F>
where
    F: Fn(Request<Body>, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    FnInterceptor { f }
}

#[async_trait]
impl<F, Fut> Interceptor for FnInterceptor<F>
where
    F: Fn(Request<Body>, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    async fn intercept(&self, req: Request<Body>, next: Next) -> Response {
        (self.f)(req, next).await
    }
}

// =============================================================================
// Next
// =============================================================================

type Terminal = Box<dyn FnOnce(Request<Body>) -> BoxFuture<'static, Response> + Send>;

/// The remainder of the chain after the current interceptor.
pub struct Next {
    interceptors: Arc<[Arc<dyn Interceptor>]>,
    position: usize,
    terminal: Terminal,
}

impl Next {
    fn new(interceptors: Arc<[Arc<dyn Interceptor>]>, terminal: Terminal) -> Self {
        Self {
            interceptors,
            position: 0,
            terminal,
        }
    }

    /// Runs the rest of the chain.
    pub async fn run(self, req: Request<Body>) -> Response {
        let current = self.interceptors.get(self.position).cloned();
        match current {
            Some(interceptor) => {
                let next = Next {
                    interceptors: self.interceptors,
                    position: self.position + 1,
                    terminal: self.terminal,
                };
                interceptor.intercept(req, next).await
            }
            None => (self.terminal)(req).await,
        }
    }
}

impl std::fmt::Debug for Next {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Next")
            .field("position", &self.position)
            .field("remaining", &(self.interceptors.len() - self.position))
            .finish()
    }
}

// =============================================================================
// Chain
// =============================================================================

/// Builder folding interceptors around a terminal handler.
///
/// Implements [`tower::Layer`], so a chain can wrap axum routes directly.
#[derive(Clone, Default)]
pub struct Chain {
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl Chain {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an interceptor; it runs after every interceptor added before it.
    pub fn with(mut self, interceptor: impl Interceptor) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    /// Appends a shared interceptor.
    pub fn with_shared(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Returns the number of interceptors.
    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    /// Returns `true` if the chain has no interceptors.
    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    /// Runs the chain with `terminal` as the innermost handler.
    pub async fn run<F, Fut>(&self, req: Request<Body>, terminal: F) -> Response
    where
        F: FnOnce(Request<Body>) -> Fut + Send + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        let terminal: Terminal =
            Box::new(move |req: Request<Body>| -> BoxFuture<'static, Response> {
                Box::pin(terminal(req))
            });
        let next = Next::new(Arc::from(self.interceptors.clone()), terminal);
        next.run(req).await
    }
}

impl std::fmt::Debug for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain")
            .field("interceptors", &self.interceptors.len())
            .finish()
    }
}

impl<S> Layer<S> for Chain {
    type Service = ChainService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ChainService {
            inner,
            interceptors: Arc::from(self.interceptors.clone()),
        }
    }
}

// =============================================================================
// ChainService
// =============================================================================

/// Service produced by [`Chain`] as a layer.
#[derive(Clone)]
pub struct ChainService<S> {
    inner: S,
    interceptors: Arc<[Arc<dyn Interceptor>]>,
}

impl<S> Service<Request<Body>> for ChainService<S>
where
    S: Service<Request<Body>, Response = Response, Error = Infallible>
        + Clone
        + Send
        + Sync
        + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        // The inner service is driven through `oneshot` on a clone.
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let inner = self.inner.clone();
        let terminal: Terminal = Box::new(move |req: Request<Body>| -> BoxFuture<'static, Response> {
            Box::pin(async move {
                match inner.oneshot(req).await {
                    Ok(response) => response,
                    Err(never) => match never {},
                }
            })
        });
        let next = Next::new(self.interceptors.clone(), terminal);

        Box::pin(async move { Ok(next.run(req).await) })
    }
}

// =============================================================================
// Tests
// =============================================================================
