use crate::component::Environment;
use crate::RouteError;
use http::Method;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Request, Response};
use std::any::Any;
use std::collections::HashMap;
use std::fmt::{self, Debug, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// A boxed, sendable future.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// What route handlers and filters resolve to.
pub type HandlerResult<E> = Result<Response<Full<Bytes>>, E>;

/// A request handler.
///
/// Plain `async` functions and closures are turned into handlers by the [`RouterBuilder`](./struct.RouterBuilder.html)
/// methods. Implement the trait directly when the handler needs the `init`/`destroy` lifecycle
/// hooks, which the router runs once before serving and once on teardown.
pub trait Handler<B, E>: Send + Sync + 'static {
    fn call(&self, req: Request<B>) -> BoxFuture<HandlerResult<E>>;

    fn init(&self, _env: &Environment) -> Result<(), RouteError> {
        Ok(())
    }

    fn destroy(&self) {}
}

/// Adapts an `async` function or closure to [`Handler`].
pub(crate) struct FnHandler<H>(pub(crate) H);

impl<B, E, H, R> Handler<B, E> for FnHandler<H>
where
    H: Fn(Request<B>) -> R + Send + Sync + 'static,
    R: Future<Output = HandlerResult<E>> + Send + 'static,
{
    fn call(&self, req: Request<B>) -> BoxFuture<HandlerResult<E>> {
        Box::pin((self.0)(req))
    }
}

/// Wraps an `async` function or closure into a shareable handler.
pub fn handler_fn<B, E, H, R>(handler: H) -> Arc<dyn Handler<B, E>>
where
    B: 'static,
    E: 'static,
    H: Fn(Request<B>) -> R + Send + Sync + 'static,
    R: Future<Output = HandlerResult<E>> + Send + 'static,
{
    Arc::new(FnHandler(handler))
}

/// The handler slot of a route: one handler per HTTP method.
///
/// A path that has a `MethodHandler` but no entry for the request's method answers with
/// "method not allowed" rather than "not found".
pub struct MethodHandler<B, E> {
    handlers: HashMap<Method, Arc<dyn Handler<B, E>>>,
}

impl<B: 'static, E: 'static> MethodHandler<B, E> {
    pub fn new() -> Self {
        MethodHandler {
            handlers: HashMap::new(),
        }
    }

    /// Sets the handler for `method`, replacing a previous one.
    pub fn on(mut self, method: Method, handler: Arc<dyn Handler<B, E>>) -> Self {
        self.handlers.insert(method, handler);
        self
    }

    pub fn get<H, R>(self, handler: H) -> Self
    where
        H: Fn(Request<B>) -> R + Send + Sync + 'static,
        R: Future<Output = HandlerResult<E>> + Send + 'static,
    {
        self.on(Method::GET, handler_fn(handler))
    }

    pub fn post<H, R>(self, handler: H) -> Self
    where
        H: Fn(Request<B>) -> R + Send + Sync + 'static,
        R: Future<Output = HandlerResult<E>> + Send + 'static,
    {
        self.on(Method::POST, handler_fn(handler))
    }

    pub fn put<H, R>(self, handler: H) -> Self
    where
        H: Fn(Request<B>) -> R + Send + Sync + 'static,
        R: Future<Output = HandlerResult<E>> + Send + 'static,
    {
        self.on(Method::PUT, handler_fn(handler))
    }

    pub fn delete<H, R>(self, handler: H) -> Self
    where
        H: Fn(Request<B>) -> R + Send + Sync + 'static,
        R: Future<Output = HandlerResult<E>> + Send + 'static,
    {
        self.on(Method::DELETE, handler_fn(handler))
    }

    pub fn patch<H, R>(self, handler: H) -> Self
    where
        H: Fn(Request<B>) -> R + Send + Sync + 'static,
        R: Future<Output = HandlerResult<E>> + Send + 'static,
    {
        self.on(Method::PATCH, handler_fn(handler))
    }
}

impl<B, E> MethodHandler<B, E> {
    pub fn lookup(&self, method: &Method) -> Option<&Arc<dyn Handler<B, E>>> {
        self.handlers.get(method)
    }

    pub fn allowed_methods(&self) -> impl Iterator<Item = &Method> + '_ {
        self.handlers.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Moves the handlers of `other` into `self`. Fails without changing anything if a method
    /// is present in both.
    pub(crate) fn merge(&mut self, other: MethodHandler<B, E>) -> Result<(), Method> {
        if let Some(method) = other.handlers.keys().find(|m| self.handlers.contains_key(*m)) {
            return Err(method.clone());
        }
        self.handlers.extend(other.handlers);
        Ok(())
    }

    pub(crate) fn handlers(&self) -> impl Iterator<Item = &Arc<dyn Handler<B, E>>> + '_ {
        self.handlers.values()
    }
}

impl<B: 'static, E: 'static> Default for MethodHandler<B, E> {
    fn default() -> Self {
        MethodHandler::new()
    }
}

impl<B, E> Debug for MethodHandler<B, E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.handlers.keys()).finish()
    }
}

/// The value handed to a [`TaskHandler`].
pub type Task = Box<dyn Any + Send>;

/// Handles values submitted with [`Router::start_task`](./struct.Router.html#method.start_task).
pub trait TaskHandler: Send + Sync + 'static {
    fn handle(&self, task: Task);

    fn init(&self, _env: &Environment) -> Result<(), RouteError> {
        Ok(())
    }

    fn destroy(&self) {}
}

pub(crate) struct FnTaskHandler<H>(pub(crate) H);

impl<H> TaskHandler for FnTaskHandler<H>
where
    H: Fn(Task) + Send + Sync + 'static,
{
    fn handle(&self, task: Task) {
        (self.0)(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    type Methods = MethodHandler<Full<Bytes>, Infallible>;

    async fn ok(_: Request<Full<Bytes>>) -> HandlerResult<Infallible> {
        Ok(Response::new(Full::new(Bytes::from("ok"))))
    }

    #[test]
    fn should_merge_disjoint_methods() {
        let mut methods = Methods::new().get(ok);
        methods.merge(Methods::new().post(ok)).unwrap();

        assert!(methods.lookup(&Method::GET).is_some());
        assert!(methods.lookup(&Method::POST).is_some());
        assert!(methods.lookup(&Method::PUT).is_none());
    }

    #[test]
    fn should_refuse_duplicate_method_on_merge() {
        let mut methods = Methods::new().get(ok);
        let err = methods.merge(Methods::new().get(ok).post(ok)).unwrap_err();

        assert_eq!(err, Method::GET);
        assert!(methods.lookup(&Method::POST).is_none());
    }

    #[tokio::test]
    async fn should_call_function_handler() {
        let methods = Methods::new().get(ok);
        let handler = methods.lookup(&Method::GET).unwrap();
        let req = Request::new(Full::new(Bytes::new()));

        let resp = handler.call(req).await.unwrap();
        assert_eq!(resp.status(), http::StatusCode::OK);
    }
}
