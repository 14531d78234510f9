use super::Router;
use crate::middleware::{FnFilter, Next};
use crate::pattern;
use crate::route::{Endpoint, HandlerResult, MethodHandler, Task};
use crate::{Error, RouteError};
use hyper::{Method, Request};
use std::future::Future;
use std::sync::Arc;

/// Registers routes on a router under a common path prefix.
///
/// Created by [`Router::group`](./struct.Router.html#method.group) and
/// [`RouterBuilder::group`](./struct.RouterBuilder.html#method.group).
pub struct Group<'a, B, E> {
    prefix: String,
    router: &'a mut Router<B, E>,
}

impl<'a, B: Send + 'static, E: Into<RouteError> + 'static> Group<'a, B, E> {
    pub(crate) fn new(prefix: &str, router: &'a mut Router<B, E>) -> Self {
        Group {
            prefix: prefix.to_owned(),
            router,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn path(&self, pattern: &str) -> crate::Result<String> {
        if !pattern.starts_with('/') {
            return Err(Error::InvalidPattern {
                pattern: pattern.to_owned(),
                reason: "pattern must start with '/'",
            });
        }
        Ok(pattern::join(&self.prefix, pattern))
    }

    pub fn route(&mut self, pattern: &str, endpoint: Endpoint<B, E>) -> crate::Result<()> {
        let path = self.path(pattern)?;
        self.router.route(&path, endpoint)
    }

    pub fn handle(&mut self, pattern: &str, methods: MethodHandler<B, E>) -> crate::Result<()> {
        self.route(pattern, Endpoint::Handler(methods))
    }

    pub fn add<H, R>(&mut self, pattern: &str, methods: &[Method], handler: H) -> crate::Result<()>
    where
        H: Fn(Request<B>) -> R + Send + Sync + 'static,
        R: Future<Output = HandlerResult<E>> + Send + 'static,
    {
        let path = self.path(pattern)?;
        self.router.add(&path, methods, handler)
    }

    pub fn get<H, R>(&mut self, pattern: &str, handler: H) -> crate::Result<()>
    where
        H: Fn(Request<B>) -> R + Send + Sync + 'static,
        R: Future<Output = HandlerResult<E>> + Send + 'static,
    {
        self.add(pattern, &[Method::GET], handler)
    }

    pub fn post<H, R>(&mut self, pattern: &str, handler: H) -> crate::Result<()>
    where
        H: Fn(Request<B>) -> R + Send + Sync + 'static,
        R: Future<Output = HandlerResult<E>> + Send + 'static,
    {
        self.add(pattern, &[Method::POST], handler)
    }

    pub fn put<H, R>(&mut self, pattern: &str, handler: H) -> crate::Result<()>
    where
        H: Fn(Request<B>) -> R + Send + Sync + 'static,
        R: Future<Output = HandlerResult<E>> + Send + 'static,
    {
        self.add(pattern, &[Method::PUT], handler)
    }

    pub fn delete<H, R>(&mut self, pattern: &str, handler: H) -> crate::Result<()>
    where
        H: Fn(Request<B>) -> R + Send + Sync + 'static,
        R: Future<Output = HandlerResult<E>> + Send + 'static,
    {
        self.add(pattern, &[Method::DELETE], handler)
    }

    pub fn patch<H, R>(&mut self, pattern: &str, handler: H) -> crate::Result<()>
    where
        H: Fn(Request<B>) -> R + Send + Sync + 'static,
        R: Future<Output = HandlerResult<E>> + Send + 'static,
    {
        self.add(pattern, &[Method::PATCH], handler)
    }

    pub fn filter<H, R>(&mut self, pattern: &str, filter: H) -> crate::Result<()>
    where
        H: Fn(Request<B>, Next<B, E>) -> R + Send + Sync + 'static,
        R: Future<Output = HandlerResult<E>> + Send + 'static,
    {
        self.route(pattern, Endpoint::Filter(Arc::new(FnFilter(filter))))
    }

    pub fn websocket<H, R>(&mut self, pattern: &str, handler: H) -> crate::Result<()>
    where
        H: Fn(Request<B>) -> R + Send + Sync + 'static,
        R: Future<Output = HandlerResult<E>> + Send + 'static,
    {
        let path = self.path(pattern)?;
        self.router.websocket(&path, handler)
    }

    pub fn task<H>(&mut self, pattern: &str, handler: H) -> crate::Result<()>
    where
        H: Fn(Task) + Send + Sync + 'static,
    {
        let path = self.path(pattern)?;
        self.router.task(&path, handler)
    }

    /// Opens a nested group; its prefix is appended to this one.
    pub fn group<F>(&mut self, prefix: &str, f: F) -> crate::Result<()>
    where
        F: FnOnce(&mut Group<'_, B, E>) -> crate::Result<()>,
    {
        let prefix = self.path(prefix)?;
        f(&mut Group::new(&prefix, self.router))
    }
}
