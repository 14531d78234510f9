use super::{ErrHandler, Group, Router};
use crate::middleware::{ArcFilter, FnFilter, Next};
use crate::route::{BoxFuture, Endpoint, FnHandler, Handler, HandlerResult, MethodHandler, Task, TaskHandler};
use crate::RouteError;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Request, Response};
use std::fmt::{self, Debug, Formatter};
use std::future::Future;
use std::sync::Arc;

/// Builder for the [Router](./struct.Router.html) type.
///
/// This `RouterBuilder<B, E>` type accepts two type parameters: `B` and `E`.
///
/// * The `B` represents the request body type which will be used by route handlers and filters.
/// * The `E` represents any error type which will be used by route handlers and filters. This error type must convert
///   into [`RouteError`](./type.RouteError.html).
///
/// The first registration error is kept and returned by [`build`](#method.build); later calls are skipped.
///
/// # Examples
///
/// ```
/// use http_body_util::Full;
/// use hyper::{body::{Bytes, Incoming}, Request, Response};
/// use routerify_trie::{Router, RouterBuilder};
///
/// async fn home_handler(_: Request<Incoming>) -> Result<Response<Full<Bytes>>, hyper::Error> {
///     Ok(Response::new(Full::new(Bytes::from("home"))))
/// }
///
/// // Create a builder.
/// let builder: RouterBuilder<Incoming, hyper::Error> = Router::builder().get("/", home_handler);
///
/// // Build the router.
/// let router: Router<Incoming, hyper::Error> = builder.build().unwrap();
/// ```
pub struct RouterBuilder<B, E> {
    inner: crate::Result<Router<B, E>>,
}

impl<B: Send + 'static, E: Into<RouteError> + 'static> RouterBuilder<B, E> {
    /// Creates a new `RouterBuilder` instance with default options.
    pub fn new() -> RouterBuilder<B, E> {
        RouterBuilder::default()
    }

    /// Creates a new [Router](./struct.Router.html) instance from the added configuration.
    pub fn build(self) -> crate::Result<Router<B, E>> {
        self.inner
    }

    fn and_then<F: FnOnce(Router<B, E>) -> crate::Result<Router<B, E>>>(self, func: F) -> Self {
        RouterBuilder {
            inner: self.inner.and_then(func),
        }
    }

    fn register(self, path: &str, endpoint: Endpoint<B, E>) -> Self {
        self.and_then(move |mut router| {
            router.route(path, endpoint)?;
            Ok(router)
        })
    }
}

impl<B: Send + 'static, E: Into<RouteError> + 'static> RouterBuilder<B, E> {
    /// Adds a new route with `GET` method and the handler at the specified path.
    ///
    /// # Examples
    ///
    /// ```
    /// use http_body_util::Full;
    /// use hyper::{body::{Bytes, Incoming}, Response};
    /// use routerify_trie::Router;
    /// use std::convert::Infallible;
    ///
    /// # fn run() -> Router<Incoming, Infallible> {
    /// let router = Router::builder()
    ///     .get("/", |_| async { Ok(Response::new(Full::new(Bytes::from("Hello world!")))) })
    ///     .build()
    ///     .unwrap();
    /// # router
    /// # }
    /// # run();
    /// ```
    pub fn get<H, R>(self, path: &str, handler: H) -> Self
    where
        H: Fn(Request<B>) -> R + Send + Sync + 'static,
        R: Future<Output = HandlerResult<E>> + Send + 'static,
    {
        self.add(path, &[Method::GET], handler)
    }

    /// Adds a new route with `GET` and `HEAD` methods and the handler at the specified path.
    pub fn get_or_head<H, R>(self, path: &str, handler: H) -> Self
    where
        H: Fn(Request<B>) -> R + Send + Sync + 'static,
        R: Future<Output = HandlerResult<E>> + Send + 'static,
    {
        self.add(path, &[Method::GET, Method::HEAD], handler)
    }

    pub fn post<H, R>(self, path: &str, handler: H) -> Self
    where
        H: Fn(Request<B>) -> R + Send + Sync + 'static,
        R: Future<Output = HandlerResult<E>> + Send + 'static,
    {
        self.add(path, &[Method::POST], handler)
    }

    pub fn put<H, R>(self, path: &str, handler: H) -> Self
    where
        H: Fn(Request<B>) -> R + Send + Sync + 'static,
        R: Future<Output = HandlerResult<E>> + Send + 'static,
    {
        self.add(path, &[Method::PUT], handler)
    }

    pub fn delete<H, R>(self, path: &str, handler: H) -> Self
    where
        H: Fn(Request<B>) -> R + Send + Sync + 'static,
        R: Future<Output = HandlerResult<E>> + Send + 'static,
    {
        self.add(path, &[Method::DELETE], handler)
    }

    pub fn head<H, R>(self, path: &str, handler: H) -> Self
    where
        H: Fn(Request<B>) -> R + Send + Sync + 'static,
        R: Future<Output = HandlerResult<E>> + Send + 'static,
    {
        self.add(path, &[Method::HEAD], handler)
    }

    pub fn patch<H, R>(self, path: &str, handler: H) -> Self
    where
        H: Fn(Request<B>) -> R + Send + Sync + 'static,
        R: Future<Output = HandlerResult<E>> + Send + 'static,
    {
        self.add(path, &[Method::PATCH], handler)
    }

    pub fn options<H, R>(self, path: &str, handler: H) -> Self
    where
        H: Fn(Request<B>) -> R + Send + Sync + 'static,
        R: Future<Output = HandlerResult<E>> + Send + 'static,
    {
        self.add(path, &[Method::OPTIONS], handler)
    }

    /// Adds a new route with the specified methods and the handler at the specified path.
    ///
    /// Methods already taken at the same path are an error; others are merged in.
    pub fn add<H, R>(self, path: &str, methods: &[Method], handler: H) -> Self
    where
        H: Fn(Request<B>) -> R + Send + Sync + 'static,
        R: Future<Output = HandlerResult<E>> + Send + 'static,
    {
        self.and_then(move |mut router| {
            router.add(path, methods, handler)?;
            Ok(router)
        })
    }

    /// Adds per-method handlers, e.g. ones implementing [`Handler`](./trait.Handler.html) directly.
    pub fn handle(self, path: &str, methods: MethodHandler<B, E>) -> Self {
        self.register(path, Endpoint::Handler(methods))
    }

    /// Adds a filter for every route at or below `path`.
    ///
    /// Filters run outermost first: one at `/api` runs before one at `/api/users`. Filters
    /// registered at the same path run in registration order.
    pub fn filter<H, R>(self, path: &str, filter: H) -> Self
    where
        H: Fn(Request<B>, Next<B, E>) -> R + Send + Sync + 'static,
        R: Future<Output = HandlerResult<E>> + Send + 'static,
    {
        self.filter_with(path, Arc::new(FnFilter(filter)))
    }

    pub fn filter_with(self, path: &str, filter: ArcFilter<B, E>) -> Self {
        self.register(path, Endpoint::Filter(filter))
    }

    /// Adds the handler for websocket upgrade requests at `path`.
    pub fn websocket<H, R>(self, path: &str, handler: H) -> Self
    where
        H: Fn(Request<B>) -> R + Send + Sync + 'static,
        R: Future<Output = HandlerResult<E>> + Send + 'static,
    {
        self.websocket_with(path, Arc::new(FnHandler(handler)))
    }

    pub fn websocket_with(self, path: &str, handler: Arc<dyn Handler<B, E>>) -> Self {
        self.register(path, Endpoint::WebSocketHandler(handler))
    }

    /// Adds a task handler, reached through [`Router::start_task`](./struct.Router.html#method.start_task).
    pub fn task<H>(self, path: &str, handler: H) -> Self
    where
        H: Fn(Task) + Send + Sync + 'static,
    {
        self.and_then(move |mut router| {
            router.task(path, handler)?;
            Ok(router)
        })
    }

    pub fn task_with(self, path: &str, handler: Arc<dyn TaskHandler>) -> Self {
        self.register(path, Endpoint::TaskHandler(handler))
    }

    /// Mounts all routes of another router under `path`.
    ///
    /// # Examples
    ///
    /// ```
    /// use http_body_util::Full;
    /// use hyper::{body::{Bytes, Incoming}, Response};
    /// use routerify_trie::Router;
    /// use std::convert::Infallible;
    ///
    /// fn api_router() -> Router<Incoming, Infallible> {
    ///     Router::builder()
    ///         .get("/books", |_| async { Ok(Response::new(Full::new(Bytes::from("List of books")))) })
    ///         .get("/books/:id", |_| async { Ok(Response::new(Full::new(Bytes::from("Show book")))) })
    ///         .build()
    ///         .unwrap()
    /// }
    ///
    /// # fn run() -> Router<Incoming, Infallible> {
    /// let router = Router::builder()
    ///     // Mounts "/books" and "/books/:id" as "/api/books" and "/api/books/:id".
    ///     .scope("/api", api_router())
    ///     .build()
    ///     .unwrap();
    /// # router
    /// # }
    /// # run();
    /// ```
    pub fn scope(self, path: &str, router: Router<B, E>) -> Self {
        self.and_then(move |mut parent| {
            parent.mount(path, router)?;
            Ok(parent)
        })
    }

    /// Registers routes under a common prefix. See [`Router::group`](./struct.Router.html#method.group).
    pub fn group<F>(self, prefix: &str, f: F) -> Self
    where
        F: FnOnce(&mut Group<'_, B, E>) -> crate::Result<()>,
    {
        self.and_then(move |mut router| {
            router.group(prefix, f)?;
            Ok(router)
        })
    }

    /// Stores shared data, readable from handlers with
    /// [`RequestExt::data`](./ext/trait.RequestExt.html#tymethod.data) and passed to every `init` hook.
    ///
    /// # Examples
    ///
    /// ```
    /// use http_body_util::Full;
    /// use hyper::{body::{Bytes, Incoming}, Request, Response};
    /// use routerify_trie::prelude::*;
    /// use routerify_trie::Router;
    /// use std::convert::Infallible;
    ///
    /// #[derive(Clone)]
    /// struct State(u64);
    ///
    /// async fn home(req: Request<Incoming>) -> Result<Response<Full<Bytes>>, Infallible> {
    ///     let state = req.data::<State>().unwrap();
    ///     Ok(Response::new(Full::new(Bytes::from(format!("State value: {}", state.0)))))
    /// }
    ///
    /// # fn run() -> Router<Incoming, Infallible> {
    /// let router = Router::builder().data(State(100)).get("/", home).build().unwrap();
    /// # router
    /// # }
    /// # run();
    /// ```
    pub fn data<T: Clone + Send + Sync + 'static>(self, data: T) -> Self {
        self.and_then(move |mut router| {
            router.data(data);
            Ok(router)
        })
    }

    /// Sets the handler for requests that match no route.
    pub fn not_found<H, R>(self, handler: H) -> Self
    where
        H: Fn(Request<B>) -> R + Send + Sync + 'static,
        R: Future<Output = HandlerResult<E>> + Send + 'static,
    {
        self.and_then(move |mut router| {
            router.not_found = Arc::new(FnHandler(handler));
            Ok(router)
        })
    }

    /// Sets the handler for requests whose path has handlers, none for the request method.
    pub fn method_not_allowed<H, R>(self, handler: H) -> Self
    where
        H: Fn(Request<B>) -> R + Send + Sync + 'static,
        R: Future<Output = HandlerResult<E>> + Send + 'static,
    {
        self.and_then(move |mut router| {
            router.method_not_allowed = Arc::new(FnHandler(handler));
            Ok(router)
        })
    }

    /// Adds a handler to turn errors returned by route handlers and filters into responses.
    ///
    /// # Examples
    ///
    /// ```
    /// use http_body_util::Full;
    /// use hyper::{body::{Bytes, Incoming}, Response, StatusCode};
    /// use routerify_trie::{RouteError, Router};
    ///
    /// async fn error_handler(err: RouteError) -> Response<Full<Bytes>> {
    ///     Response::builder()
    ///         .status(StatusCode::INTERNAL_SERVER_ERROR)
    ///         .body(Full::new(Bytes::from(format!("Something went wrong: {}", err))))
    ///         .unwrap()
    /// }
    ///
    /// # fn run() -> Router<Incoming, hyper::Error> {
    /// let router = Router::builder()
    ///     .get("/users", |_| async { Ok(Response::new(Full::new(Bytes::from("List of users")))) })
    ///     .err_handler(error_handler)
    ///     .build()
    ///     .unwrap();
    /// # router
    /// # }
    /// # run();
    /// ```
    pub fn err_handler<H, R>(self, handler: H) -> Self
    where
        H: Fn(RouteError) -> R + Send + Sync + 'static,
        R: Future<Output = Response<Full<Bytes>>> + Send + 'static,
    {
        let handler: ErrHandler = Arc::new(move |err: RouteError| -> BoxFuture<Response<Full<Bytes>>> {
            Box::pin(handler(err))
        });

        self.and_then(move |mut router| {
            router.err_handler = handler;
            Ok(router)
        })
    }

    /// Sets how many scratch buffers per kind are kept for reuse between requests. Defaults to 1024.
    pub fn scratch_pool_size(self, size: usize) -> Self {
        self.and_then(move |mut router| {
            router.set_scratch_pool_size(size);
            Ok(router)
        })
    }
}

impl<B: Send + 'static, E: Into<RouteError> + 'static> Default for RouterBuilder<B, E> {
    fn default() -> RouterBuilder<B, E> {
        RouterBuilder {
            inner: Ok(Router::new()),
        }
    }
}

impl<B, E> Debug for RouterBuilder<B, E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.inner {
            Ok(router) => router.fmt(f),
            Err(err) => write!(f, "RouterBuilder {{ error: {} }}", err),
        }
    }
}
