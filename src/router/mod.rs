use crate::component::Environment;
use crate::helpers;
use crate::middleware::{compose, ArcFilter, FilterList, FnFilter};
use crate::pattern::{compile, normalize, trim_trailing_slash, Token};
use crate::pool::{Pool, Pooled, DEFAULT_POOL_SIZE};
use crate::route::{
    BoxFuture, Endpoint, FnHandler, FnTaskHandler, Handler, HandlerResult, MethodHandler, RouteSlots, Slot, SlotKind,
    Task, TaskHandler,
};
use crate::tree::{NodeId, Span, Tree};
use crate::types::RouteParams;
use crate::{Error, RouteError};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Request, Response, StatusCode};
use std::any::Any;
use std::fmt::{self, Debug, Formatter};
use std::future::Future;
use std::io;
use std::sync::Arc;

pub use self::builder::RouterBuilder;
pub use self::group::Group;

mod builder;
mod group;

pub(crate) type ErrHandler = Arc<dyn Fn(RouteError) -> BoxFuture<Response<Full<Bytes>>> + Send + Sync + 'static>;

/// The outcome of looking up a route handler.
#[derive(Debug)]
pub enum Lookup<T> {
    Found(T),
    /// The path has handlers, none for the request method.
    MethodNotAllowed,
    NotFound,
}

impl<T> Lookup<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }
}

/// A handler lookup together with the filters of every node on the matched path.
pub struct HandlerMatch<B, E> {
    pub handler: Lookup<Arc<dyn Handler<B, E>>>,
    pub params: RouteParams,
    pub filters: FilterList<B, E>,
}

/// Routes requests to handlers through a compressed trie of route patterns.
///
/// Routes are registered while the router is owned mutably, usually through
/// [`RouterBuilder`](./struct.RouterBuilder.html). Once it is handed to a
/// [`RouterService`](./struct.RouterService.html) the router is shared read-only between all
/// connections and needs no locking.
///
/// This `Router<B, E>` type accepts two type parameters: `B` and `E`.
///
/// * The `B` represents the request body type, e.g. [`hyper::body::Incoming`](https://docs.rs/hyper/1/hyper/body/struct.Incoming.html)
///   for a router served by [`RouterService`](./struct.RouterService.html).
/// * The `E` represents the error type of route handlers and filters. It must convert into
///   [`RouteError`](./type.RouteError.html).
///
/// # Examples
///
/// ```
/// use http_body_util::Full;
/// use hyper::{
///     body::{Bytes, Incoming},
///     Request, Response,
/// };
/// use routerify_trie::Router;
///
/// async fn home_handler(_: Request<Incoming>) -> Result<Response<Full<Bytes>>, hyper::Error> {
///     Ok(Response::new(Full::new(Bytes::from("home"))))
/// }
///
/// fn run() -> Router<Incoming, hyper::Error> {
///     let router = Router::builder().get("/", home_handler).build().unwrap();
///     router
/// }
/// ```
pub struct Router<B, E> {
    tree: Tree<RouteSlots<B, E>>,
    has_filters: bool,
    env: Environment,
    span_pool: Arc<Pool<Vec<Span>>>,
    filter_pool: Arc<Pool<Vec<ArcFilter<B, E>>>>,
    pub(crate) not_found: Arc<dyn Handler<B, E>>,
    pub(crate) method_not_allowed: Arc<dyn Handler<B, E>>,
    pub(crate) err_handler: ErrHandler,
}

impl<B: Send + 'static, E: Into<RouteError> + 'static> Router<B, E> {
    pub fn new() -> Self {
        Router {
            tree: Tree::new(),
            has_filters: false,
            env: Environment::new(),
            span_pool: Pool::new(DEFAULT_POOL_SIZE),
            filter_pool: Pool::new(DEFAULT_POOL_SIZE),
            not_found: status_handler(StatusCode::NOT_FOUND),
            method_not_allowed: status_handler(StatusCode::METHOD_NOT_ALLOWED),
            err_handler: Arc::new(|err: RouteError| -> BoxFuture<Response<Full<Bytes>>> {
                Box::pin(async move {
                    let mut resp = Response::new(Full::new(Bytes::from(format!("Internal Server Error: {}", err))));
                    *resp.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                    resp
                })
            }),
        }
    }

    /// Return a [RouterBuilder](./struct.RouterBuilder.html) instance to build a `Router`.
    pub fn builder() -> RouterBuilder<B, E> {
        RouterBuilder::new()
    }

    /// Registers `endpoint` at `pattern`.
    ///
    /// Fails if the pattern doesn't compile, if one of its captures sits where a different capture
    /// is already registered, or if the slot is taken.
    pub fn route(&mut self, pattern: &str, endpoint: Endpoint<B, E>) -> crate::Result<()> {
        let compiled = compile(pattern)?;
        let kind = endpoint.kind();

        let id = self.tree.insert(compiled.tokens()).map_err(|_| Error::ConflictingCapture {
            pattern: pattern.to_owned(),
        })?;
        self.tree.slots_mut(id).register(pattern, &compiled, endpoint)?;

        if kind == SlotKind::Filter {
            self.has_filters = true;
        }

        tracing::debug!(pattern, %kind, "registered route");
        Ok(())
    }

    /// Registers per-method handlers at `pattern`, merging them with handlers already there.
    pub fn handle(&mut self, pattern: &str, methods: MethodHandler<B, E>) -> crate::Result<()> {
        self.route(pattern, Endpoint::Handler(methods))
    }

    /// Registers one handler for several methods.
    pub fn add<H, R>(&mut self, pattern: &str, methods: &[Method], handler: H) -> crate::Result<()>
    where
        H: Fn(Request<B>) -> R + Send + Sync + 'static,
        R: Future<Output = HandlerResult<E>> + Send + 'static,
    {
        let handler: Arc<dyn Handler<B, E>> = Arc::new(FnHandler(handler));
        let methods = methods
            .iter()
            .fold(MethodHandler::new(), |acc, m| acc.on(m.clone(), Arc::clone(&handler)));
        self.handle(pattern, methods)
    }

    /// Registers a filter that runs for every request whose path passes through `pattern`.
    pub fn filter<H, R>(&mut self, pattern: &str, filter: H) -> crate::Result<()>
    where
        H: Fn(Request<B>, crate::Next<B, E>) -> R + Send + Sync + 'static,
        R: Future<Output = HandlerResult<E>> + Send + 'static,
    {
        self.route(pattern, Endpoint::Filter(Arc::new(FnFilter(filter))))
    }

    /// Registers the handler for websocket upgrade requests at `pattern`.
    pub fn websocket<H, R>(&mut self, pattern: &str, handler: H) -> crate::Result<()>
    where
        H: Fn(Request<B>) -> R + Send + Sync + 'static,
        R: Future<Output = HandlerResult<E>> + Send + 'static,
    {
        self.route(pattern, Endpoint::WebSocketHandler(Arc::new(FnHandler(handler))))
    }

    pub fn task<H>(&mut self, pattern: &str, handler: H) -> crate::Result<()>
    where
        H: Fn(Task) + Send + Sync + 'static,
    {
        self.route(pattern, Endpoint::TaskHandler(Arc::new(FnTaskHandler(handler))))
    }

    /// Grafts all routes of `router` under `prefix`.
    ///
    /// The prefix must be literal. Its environment is merged into this router's; its not-found,
    /// method-not-allowed and error handlers are dropped.
    pub fn mount(&mut self, prefix: &str, router: Router<B, E>) -> crate::Result<()> {
        let compiled = compile(prefix)?;
        if compiled.capture_count() > 0 {
            return Err(Error::InvalidPattern {
                pattern: prefix.to_owned(),
                reason: "mount prefix can't contain captures",
            });
        }

        let tokens = match compiled.tokens() {
            [Token::Byte(b'/')] => &[][..],
            tokens => tokens,
        };

        let Router {
            mut tree,
            has_filters,
            env,
            ..
        } = router;
        for slots in tree.all_slots_mut() {
            slots.prefix_patterns(prefix);
        }

        if !self.tree.mount(tokens, tree) {
            return Err(Error::MountConflict {
                prefix: prefix.to_owned(),
            });
        }

        self.has_filters |= has_filters;
        self.env.extend(&env);

        tracing::debug!(prefix, "mounted router");
        Ok(())
    }

    /// Registers routes under a common prefix.
    ///
    /// ```
    /// use http_body_util::Full;
    /// use hyper::{body::Bytes, Response};
    /// use routerify_trie::Router;
    /// use std::convert::Infallible;
    ///
    /// let mut router: Router<Full<Bytes>, Infallible> = Router::new();
    /// router
    ///     .group("/api/v1", |api| {
    ///         api.get("/users", |_| async { Ok(Response::new(Full::new(Bytes::from("users")))) })?;
    ///         api.get("/users/:id", |_| async { Ok(Response::new(Full::new(Bytes::from("user")))) })
    ///     })
    ///     .unwrap();
    /// ```
    pub fn group<F>(&mut self, prefix: &str, f: F) -> crate::Result<()>
    where
        F: FnOnce(&mut Group<'_, B, E>) -> crate::Result<()>,
    {
        if !prefix.starts_with('/') {
            return Err(Error::InvalidPattern {
                pattern: prefix.to_owned(),
                reason: "group prefix must start with '/'",
            });
        }
        f(&mut Group::new(prefix, self))
    }

    /// Stores shared data in the router environment.
    pub fn data<T: Clone + Send + Sync + 'static>(&mut self, value: T) {
        self.env.insert(value);
    }

    pub(crate) fn set_scratch_pool_size(&mut self, size: usize) {
        self.span_pool = Pool::new(size);
        self.filter_pool = Pool::new(size);
    }
}

impl<B: 'static, E: 'static> Router<B, E> {
    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Finds the handler for `method` and `path`.
    ///
    /// A trailing `/` and a query string are ignored. A path that has handlers but none for
    /// `method` yields [`Lookup::MethodNotAllowed`].
    pub fn match_handler(&self, method: &Method, path: &str) -> (Lookup<Arc<dyn Handler<B, E>>>, RouteParams) {
        self.find_handler(method, normalize(path))
    }

    /// Like [`Router::match_handler`], also collecting the filters of every node the path passes
    /// through, outermost first.
    pub fn match_handler_with_filters(&self, method: &Method, path: &str) -> HandlerMatch<B, E> {
        self.find_handler_with_filters(method, normalize(path))
    }

    pub fn match_websocket_handler(&self, path: &str) -> Option<(Arc<dyn Handler<B, E>>, RouteParams)> {
        self.find_websocket_handler(normalize(path))
    }

    // The `find_*` lookups take a path that has no query string and no trailing `/`.
    fn find_handler(&self, method: &Method, path: &str) -> (Lookup<Arc<dyn Handler<B, E>>>, RouteParams) {
        let mut spans = self.span_pool.acquire();
        let node = self.tree.match_one(path, &mut *spans);
        self.resolve_handler(node, method, path, spans)
    }

    fn find_handler_with_filters(&self, method: &Method, path: &str) -> HandlerMatch<B, E> {
        if !self.has_filters {
            let (handler, params) = self.find_handler(method, path);
            return HandlerMatch {
                handler,
                params,
                filters: FilterList::empty(),
            };
        }

        let mut spans = self.span_pool.acquire();
        let mut filters = self.filter_pool.acquire();
        let node = self
            .tree
            .match_multiple(path, &mut *spans, |slots| filters.extend(slots.filters.iter().cloned()));
        let (handler, params) = self.resolve_handler(node, method, path, spans);

        HandlerMatch {
            handler,
            params,
            filters: FilterList::pooled(filters),
        }
    }

    fn find_websocket_handler(&self, path: &str) -> Option<(Arc<dyn Handler<B, E>>, RouteParams)> {
        let mut spans = self.span_pool.acquire();
        let node = self.tree.match_one(path, &mut *spans)?;
        let slot = self.tree.slots(node).websocket.as_ref()?;
        Some((Arc::clone(&slot.payload), RouteParams::new(slot, path, spans)))
    }

    pub fn match_task_handler(&self, path: &str) -> Option<Arc<dyn TaskHandler>> {
        let node = self.tree.match_only(normalize(path))?;
        let slot = self.tree.slots(node).task.as_ref()?;
        Some(Arc::clone(&slot.payload))
    }

    /// Hands `value` to the task handler registered for `path`.
    pub fn start_task<T: Any + Send>(&self, path: &str, value: T) -> crate::Result<()> {
        let handler = self.match_task_handler(path).ok_or_else(|| Error::TaskNotFound {
            path: path.to_owned(),
        })?;
        handler.handle(Box::new(value));
        Ok(())
    }

    /// Writes the route tree, one node per line.
    pub fn print_tree<W: io::Write>(&self, w: &mut W) -> io::Result<()> {
        self.tree.print(w)
    }

    /// Runs the `init` hook of every registered component with the router environment.
    pub fn init(&self) -> crate::Result<()> {
        let env = &self.env;
        for slots in self.tree.all_slots() {
            if let Some(slot) = &slots.handler {
                for handler in slot.payload.handlers() {
                    handler.init(env).map_err(Error::Init)?;
                }
            }
            for filter in &slots.filters {
                filter.init(env).map_err(Error::Init)?;
            }
            if let Some(slot) = &slots.websocket {
                slot.payload.init(env).map_err(Error::Init)?;
            }
            if let Some(slot) = &slots.task {
                slot.payload.init(env).map_err(Error::Init)?;
            }
        }

        self.not_found.init(env).map_err(Error::Init)?;
        self.method_not_allowed.init(env).map_err(Error::Init)?;

        tracing::debug!("initialized route components");
        Ok(())
    }

    /// Runs the `destroy` hook of every registered component.
    pub fn destroy(&self) {
        for slots in self.tree.all_slots() {
            if let Some(slot) = &slots.handler {
                slot.payload.handlers().for_each(|h| h.destroy());
            }
            slots.filters.iter().for_each(|f| f.destroy());
            if let Some(slot) = &slots.websocket {
                slot.payload.destroy();
            }
            if let Some(slot) = &slots.task {
                slot.payload.destroy();
            }
        }

        self.not_found.destroy();
        self.method_not_allowed.destroy();
    }

    fn resolve_handler(
        &self,
        node: Option<NodeId>,
        method: &Method,
        path: &str,
        spans: Pooled<Vec<Span>>,
    ) -> (Lookup<Arc<dyn Handler<B, E>>>, RouteParams) {
        let slot: &Slot<MethodHandler<B, E>> = match node.and_then(|id| self.tree.slots(id).handler.as_ref()) {
            Some(slot) => slot,
            None => return (Lookup::NotFound, RouteParams::default()),
        };

        match slot.payload.lookup(method) {
            Some(handler) => (Lookup::Found(Arc::clone(handler)), RouteParams::new(slot, path, spans)),
            None => (Lookup::MethodNotAllowed, RouteParams::default()),
        }
    }
}

impl<B: Send + 'static, E: Into<RouteError> + 'static> Router<B, E> {
    /// Dispatches one request whose percent-decoded path is `target_path`.
    ///
    /// `target_path` comes from the URI path, so a `?` in it was percent-encoded and is matched
    /// literally.
    ///
    /// Websocket upgrades go straight to the websocket handler of the path, without filters, or to
    /// the not-found handler when the path has none. Everything else runs through the filters on
    /// the path and then the route handler, or the not-found or method-not-allowed handler when
    /// there is none.
    pub(crate) async fn process(&self, target_path: &str, mut req: Request<B>) -> Response<Full<Bytes>> {
        req.extensions_mut().insert(self.env.clone());
        let path = trim_trailing_slash(target_path);

        let result: Result<_, RouteError> = if helpers::is_websocket_upgrade(&req) {
            let (handler, params) = match self.find_websocket_handler(path) {
                Some(found) => found,
                None => {
                    tracing::debug!(path = target_path, "no websocket route found");
                    (Arc::clone(&self.not_found), RouteParams::default())
                }
            };
            tracing::trace!(path = target_path, "dispatching websocket upgrade");
            req.extensions_mut().insert(params);
            handler.call(req).await.map_err(Into::into)
        } else {
            let HandlerMatch {
                handler,
                params,
                filters,
            } = self.find_handler_with_filters(req.method(), path);

            let terminal = match handler {
                Lookup::Found(handler) => handler,
                Lookup::MethodNotAllowed => {
                    tracing::debug!(method = %req.method(), path = target_path, "method not allowed");
                    Arc::clone(&self.method_not_allowed)
                }
                Lookup::NotFound => {
                    tracing::debug!(method = %req.method(), path = target_path, "no route found");
                    Arc::clone(&self.not_found)
                }
            };

            req.extensions_mut().insert(params);
            compose(filters, terminal).run(req).await.map_err(Into::into)
        };

        let err = match result {
            Ok(resp) => return resp,
            Err(err) => err,
        };

        tracing::error!(error = %err, path = target_path, "route handler failed");
        (self.err_handler)(err).await
    }
}

impl<B: Send + 'static, E: Into<RouteError> + 'static> Default for Router<B, E> {
    fn default() -> Self {
        Router::new()
    }
}

impl<B, E> Debug for Router<B, E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut tree = Vec::new();
        let _ = self.tree.print(&mut tree);
        f.debug_struct("Router")
            .field("tree", &String::from_utf8_lossy(&tree))
            .field("has_filters", &self.has_filters)
            .field("env", &self.env)
            .finish()
    }
}

fn status_handler<B: 'static, E: 'static>(status: StatusCode) -> Arc<dyn Handler<B, E>> {
    Arc::new(FnHandler(move |_: Request<B>| async move { Ok::<_, E>(helpers::status_response(status)) }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ext::RequestExt;
    use crate::middleware::Next;
    use http_body_util::BodyExt;
    use std::convert::Infallible;
    use std::sync::Mutex;

    type Body = Full<Bytes>;
    type TestRouter = Router<Body, Infallible>;

    fn reply(text: &'static str) -> impl Fn(Request<Body>) -> BoxFuture<HandlerResult<Infallible>> + Send + Sync {
        move |_| Box::pin(async move { Ok(Response::new(Full::new(Bytes::from(text)))) })
    }

    fn request(method: Method, path: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(path)
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    async fn text(resp: Response<Body>) -> String {
        String::from_utf8(resp.into_body().collect().await.unwrap().to_bytes().to_vec()).unwrap()
    }

    #[tokio::test]
    async fn should_capture_route_params() {
        let router: TestRouter = Router::builder()
            .get("/repos/:owner/:name/stargazers", |req| async move {
                let body = format!("{}/{}", req.param("owner").unwrap(), req.param("name").unwrap());
                Ok(Response::new(Full::new(Bytes::from(body))))
            })
            .build()
            .unwrap();

        let (handler, params) = router.match_handler(&Method::GET, "/repos/cosiner/zerver/stargazers");
        assert!(handler.is_found());
        assert_eq!(params.get("owner"), Some("cosiner"));
        assert_eq!(params.get("name"), Some("zerver"));
        assert_eq!(params.pattern(), Some("/repos/:owner/:name/stargazers"));

        let path = "/repos/cosiner/zerver/stargazers";
        let resp = router.process(path, request(Method::GET, path)).await;
        assert_eq!(text(resp).await, "cosiner/zerver");
    }

    #[test]
    fn should_tell_method_not_allowed_from_not_found() {
        let router: TestRouter = Router::builder().get("/a", reply("a")).build().unwrap();

        assert!(matches!(router.match_handler(&Method::POST, "/a").0, Lookup::MethodNotAllowed));
        assert!(matches!(router.match_handler(&Method::GET, "/b").0, Lookup::NotFound));
        assert!(router.match_handler(&Method::GET, "/a/").0.is_found());
        assert!(router.match_handler(&Method::GET, "/a?page=2").0.is_found());
    }

    #[tokio::test]
    async fn should_answer_404_and_405() {
        let router: TestRouter = Router::builder().get("/a", reply("a")).build().unwrap();

        let resp = router.process("/a", request(Method::POST, "/a")).await;
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);

        let resp = router.process("/b", request(Method::GET, "/b")).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn should_merge_methods_at_same_path() {
        let router: TestRouter = Router::builder()
            .get("/users/:id", reply("get"))
            .post("/users/:id", reply("post"))
            .build()
            .unwrap();

        assert!(router.match_handler(&Method::GET, "/users/1").0.is_found());
        assert!(router.match_handler(&Method::POST, "/users/1").0.is_found());
        assert!(matches!(router.match_handler(&Method::PUT, "/users/1").0, Lookup::MethodNotAllowed));
    }

    #[test]
    fn should_report_registration_errors() {
        let err = TestRouter::builder().get("/a", reply("1")).get("/a/", reply("2")).build().unwrap_err();
        assert!(matches!(
            err,
            Error::RouteExists {
                kind: SlotKind::Handler,
                ..
            }
        ));

        let err = TestRouter::builder()
            .get("/:user/:id", reply("1"))
            .get("/*user", reply("2"))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::ConflictingCapture { .. }));

        let err = TestRouter::builder().get("users", reply("1")).build().unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { .. }));
    }

    #[tokio::test]
    async fn should_run_filters_from_root_to_leaf() {
        let log: Arc<Mutex<Vec<&'static str>>> = Arc::default();
        let recorder = |name: &'static str| {
            let log = Arc::clone(&log);
            move |req: Request<Body>, next: Next<Body, Infallible>| {
                log.lock().unwrap().push(name);
                next.run(req)
            }
        };

        let router: TestRouter = Router::builder()
            .filter("/api/users", recorder("users"))
            .filter("/api", recorder("api"))
            .filter("/api", recorder("api-2"))
            .get("/api/users/:id", reply("user"))
            .build()
            .unwrap();

        let HandlerMatch { handler, filters, .. } = router.match_handler_with_filters(&Method::GET, "/api/users/42");
        assert!(handler.is_found());
        assert_eq!(filters.len(), 3);
        drop(filters);

        let resp = router
            .process("/api/users/42", request(Method::GET, "/api/users/42"))
            .await;
        assert_eq!(text(resp).await, "user");
        assert_eq!(*log.lock().unwrap(), vec!["api", "api-2", "users"]);
    }

    #[tokio::test]
    async fn should_filter_not_found_requests() {
        let router: TestRouter = Router::builder()
            .filter("/", |req: Request<Body>, next: Next<Body, Infallible>| async move {
                let mut resp = next.run(req).await?;
                resp.headers_mut().insert("x-filtered", "1".parse().unwrap());
                Ok(resp)
            })
            .get("/a", reply("a"))
            .build()
            .unwrap();

        let resp = router.process("/missing", request(Method::GET, "/missing")).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(resp.headers()["x-filtered"], "1");
    }

    #[tokio::test]
    async fn should_hide_handler_behind_filter() {
        let router: TestRouter = Router::builder()
            .filter("/secret", |_: Request<Body>, _: Next<Body, Infallible>| async {
                Ok(helpers::status_response(StatusCode::FORBIDDEN))
            })
            .get("/secret/data", reply("data"))
            .build()
            .unwrap();

        let resp = router.process("/secret/data", request(Method::GET, "/secret/data")).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn should_mount_sub_router() {
        let users: TestRouter = Router::builder()
            .get("/info/:id", |req| async move {
                let pattern = req.params().and_then(|p| p.pattern()).unwrap_or_default().to_owned();
                Ok(Response::new(Full::new(Bytes::from(pattern))))
            })
            .build()
            .unwrap();
        let books: TestRouter = Router::builder().get("/count/:name", reply("count")).build().unwrap();

        let router: TestRouter = Router::builder()
            .get("/", reply("home"))
            .scope("/user", users)
            .scope("/book", books)
            .build()
            .unwrap();

        let resp = router.process("/user/info/7", request(Method::GET, "/user/info/7")).await;
        assert_eq!(text(resp).await, "/user/info/:id");

        let (handler, params) = router.match_handler(&Method::GET, "/book/count/rust");
        assert!(handler.is_found());
        assert_eq!(params.get("name"), Some("rust"));
        assert!(router.match_handler(&Method::GET, "/").0.is_found());
    }

    #[test]
    fn should_refuse_mount_conflicts() {
        let sub = || -> TestRouter { Router::builder().get("/books", reply("books")).build().unwrap() };

        let err = TestRouter::builder()
            .get("/api/users", reply("users"))
            .scope("/api", sub())
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::MountConflict { .. }));

        let err = TestRouter::builder().scope("/:tenant", sub()).build().unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { .. }));
    }

    #[test]
    fn should_register_group_routes() {
        let router: TestRouter = Router::builder()
            .group("/api", |api| {
                api.get("/", reply("index"))?;
                api.group("/v1", |v1| v1.get("/users/:id", reply("user")))
            })
            .build()
            .unwrap();

        assert!(router.match_handler(&Method::GET, "/api").0.is_found());
        let (handler, params) = router.match_handler(&Method::GET, "/api/v1/users/9");
        assert!(handler.is_found());
        assert_eq!(params.pattern(), Some("/api/v1/users/:id"));
    }

    #[test]
    fn should_reject_group_patterns_without_leading_slash() {
        let err = TestRouter::builder()
            .group("/api", |api| api.get("users", reply("users")))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { ref pattern, .. } if pattern == "users"));

        let err = TestRouter::builder()
            .group("api", |api| api.get("/users", reply("users")))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { .. }));

        let mut router = TestRouter::new();
        let err = router
            .group("/api", |api| api.group("v1", |v1| v1.get("/users", reply("users"))))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { .. }));
        assert!(!router.match_handler(&Method::GET, "/apiv1/users").0.is_found());
    }

    #[tokio::test]
    async fn should_dispatch_websocket_upgrade_without_filters() {
        let router: TestRouter = Router::builder()
            .filter("/ws", |_: Request<Body>, _: Next<Body, Infallible>| async {
                Ok(helpers::status_response(StatusCode::FORBIDDEN))
            })
            .websocket("/ws/:room", |req| async move {
                let room = req.param("room").unwrap_or_default().to_owned();
                Ok(Response::new(Full::new(Bytes::from(room))))
            })
            .build()
            .unwrap();

        let req = Request::builder()
            .uri("/ws/lobby")
            .header(http::header::CONNECTION, "Upgrade")
            .header(http::header::UPGRADE, "websocket")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let resp = router.process("/ws/lobby", req).await;
        assert_eq!(text(resp).await, "lobby");

        let resp = router.process("/ws/lobby", request(Method::GET, "/ws/lobby")).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn should_answer_not_found_to_upgrade_without_websocket_route() {
        let router: TestRouter = Router::builder().get("/chat", reply("chat")).build().unwrap();

        let req = Request::builder()
            .uri("/chat")
            .header(http::header::CONNECTION, "Upgrade")
            .header(http::header::UPGRADE, "websocket")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let resp = router.process("/chat", req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn should_match_decoded_question_mark_literally() {
        let router: TestRouter = Router::builder()
            .get("/files/:name", |req| async move {
                Ok(Response::new(Full::new(Bytes::from(req.param("name").unwrap_or_default().to_owned()))))
            })
            .get("/q/*rest", |req| async move {
                Ok(Response::new(Full::new(Bytes::from(req.param("rest").unwrap_or_default().to_owned()))))
            })
            .build()
            .unwrap();

        let resp = router.process("/files/what?now", request(Method::GET, "/files/what%3Fnow")).await;
        assert_eq!(text(resp).await, "what?now");

        let resp = router.process("/q/a?b/c/", request(Method::GET, "/q/a%3Fb/c/")).await;
        assert_eq!(text(resp).await, "a?b/c");
    }

    #[test]
    fn should_start_tasks_by_path() {
        let seen: Arc<Mutex<Vec<u32>>> = Arc::default();
        let sink = Arc::clone(&seen);

        let router: TestRouter = Router::builder()
            .task("/jobs/:kind", move |task: Task| {
                if let Ok(n) = task.downcast::<u32>() {
                    sink.lock().unwrap().push(*n);
                }
            })
            .build()
            .unwrap();

        router.start_task("/jobs/mail", 7_u32).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![7]);

        let err = router.start_task("/other", 1_u32).unwrap_err();
        assert!(matches!(err, Error::TaskNotFound { .. }));
        assert!(router.match_handler(&Method::GET, "/jobs/mail").0.found().is_none());
    }

    #[tokio::test]
    async fn should_pass_handler_errors_to_err_handler() {
        let router: Router<Body, std::io::Error> = Router::builder()
            .get("/fail", |_| async { Err(std::io::Error::new(std::io::ErrorKind::Other, "disk on fire")) })
            .err_handler(|err: RouteError| async move {
                let mut resp = Response::new(Full::new(Bytes::from(err.to_string())));
                *resp.status_mut() = StatusCode::SERVICE_UNAVAILABLE;
                resp
            })
            .build()
            .unwrap();

        let resp = router.process("/fail", request(Method::GET, "/fail")).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(text(resp).await, "disk on fire");
    }

    #[test]
    fn should_print_tree() {
        let router: TestRouter = Router::builder()
            .get("/user/:id", reply("user"))
            .get("/user/static", reply("static"))
            .build()
            .unwrap();

        let mut out = Vec::new();
        router.print_tree(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "/user/\n/user/-static\n/user/-:\n");
    }

    #[test]
    fn should_share_environment_data() {
        let mut sub: TestRouter = Router::new();
        sub.data(5_u8);

        let mut router: TestRouter = Router::new();
        router.data("app");
        router.mount("/sub", sub).unwrap();

        assert_eq!(router.env().get::<u8>(), Some(&5));
        assert_eq!(router.env().get::<&'static str>(), Some(&"app"));
    }
}
