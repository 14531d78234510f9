//! `routerify-trie` is a [hyper](https://hyper.rs/) router that matches request paths against a compressed trie of
//! route patterns.
//!
//! Core features:
//!
//! - Matching walks the trie once, byte by byte, without regexes and without backtracking.
//!
//! - Route parameters are captured as byte ranges of the request path; the scratch buffers are pooled.
//!
//! - Filters wrap the handlers of a whole subtree and run outermost first.
//!
//! - Routers can be grouped under a prefix or mounted into other routers.
//!
//! - Handlers, filters and task handlers share one [`Environment`] and get `init`/`destroy` hooks.
//!
//! ## Basic Example
//!
//! ```no_run
//! use http_body_util::Full;
//! use hyper::body::{Bytes, Incoming};
//! use hyper::service::Service;
//! use hyper::{Request, Response, StatusCode};
//! use hyper_util::rt::{TokioExecutor, TokioIo};
//! use hyper_util::server::conn::auto::Builder;
//! // Import the prelude traits.
//! use routerify_trie::prelude::*;
//! use routerify_trie::{Next, RouteError, Router, RouterService};
//! use std::sync::Arc;
//! use std::{convert::Infallible, net::SocketAddr};
//! use tokio::net::TcpListener;
//!
//! // Define an app state to share it across the route handlers and filters.
//! #[derive(Clone)]
//! struct State(u64);
//!
//! // A handler for "/" page.
//! async fn home_handler(req: Request<Incoming>) -> Result<Response<Full<Bytes>>, Infallible> {
//!     let state = req.data::<State>().unwrap();
//!     Ok(Response::new(Full::new(Bytes::from(format!("State value: {}", state.0)))))
//! }
//!
//! // A handler for "/users/:userId" page.
//! async fn user_handler(req: Request<Incoming>) -> Result<Response<Full<Bytes>>, Infallible> {
//!     let user_id = req.param("userId").unwrap();
//!     Ok(Response::new(Full::new(Bytes::from(format!("Hello {}", user_id)))))
//! }
//!
//! // A filter which logs every request and its response status.
//! async fn logger(req: Request<Incoming>, next: Next<Incoming, Infallible>) -> Result<Response<Full<Bytes>>, Infallible> {
//!     let line = format!("{:?} {} {}", req.remote_addr(), req.method(), req.uri().path());
//!     let resp = next.run(req).await?;
//!     println!("{} -> {}", line, resp.status());
//!     Ok(resp)
//! }
//!
//! // Turns errors returned by handlers and filters into responses.
//! async fn error_handler(err: RouteError) -> Response<Full<Bytes>> {
//!     let mut resp = Response::new(Full::new(Bytes::from(format!("Something went wrong: {}", err))));
//!     *resp.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
//!     resp
//! }
//!
//! fn router() -> Router<Incoming, Infallible> {
//!     Router::builder()
//!         .data(State(100))
//!         .filter("/", logger)
//!         .get("/", home_handler)
//!         .get("/users/:userId", user_handler)
//!         .err_handler(error_handler)
//!         .build()
//!         .unwrap()
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let service = Arc::new(RouterService::new(router()).unwrap());
//!     let addr = SocketAddr::from(([127, 0, 0, 1], 3001));
//!     let listener = TcpListener::bind(addr).await.unwrap();
//!     println!("App is running on: {}", addr);
//!
//!     loop {
//!         let (stream, _) = listener.accept().await.unwrap();
//!         let service = Arc::clone(&service);
//!
//!         tokio::spawn(async move {
//!             let request_service = service.call(&stream).await.unwrap();
//!             let io = TokioIo::new(stream);
//!             if let Err(err) = Builder::new(TokioExecutor::new()).serve_connection(io, request_service).await {
//!                 eprintln!("Error serving connection: {:?}", err);
//!             }
//!         });
//!     }
//! }
//! ```
//!
//! ## Routing
//!
//! ### Route Paths
//!
//! A route pattern is a `/` separated path. Within a segment, the last `:` or `*` starts a capture
//! that runs to the end of the segment:
//!
//! | Pattern            | Matches                     | Captures                      |
//! |--------------------|-----------------------------|-------------------------------|
//! | `/users/:id`       | `/users/42`                 | `id = "42"`                   |
//! | `/user.:format`    | `/user.json`                | `format = "json"`             |
//! | `/files/*path`     | `/files/a/b.txt`            | `path = "a/b.txt"`            |
//! | `/v:version/docs`  | `/v2/docs`                  | `version = "2"`               |
//!
//! A `:` capture stops at the next `/`, a `*` capture takes everything that is left. Literal
//! branches are always tried before the capture branch at the same position, and a branch that
//! was entered is never left again: with `/user/12:id` and `/user/:id` registered, `/user/1x`
//! matches neither. A trailing `/` and the query string of a request path are ignored.
//!
//! Only one kind of capture can sit at a given position: registering `/:user` and `/*path`
//! together is an error. So is registering two handlers for the same method at one path.
//!
//! ### Route Parameters
//!
//! ```
//! use http_body_util::Full;
//! use hyper::{body::{Bytes, Incoming}, Response};
//! use routerify_trie::prelude::*;
//! use routerify_trie::Router;
//! # use std::convert::Infallible;
//!
//! # fn run() -> Router<Incoming, Infallible> {
//! let router = Router::builder()
//!     .get("/users/:userName/books/:bookName", |req| async move {
//!         let user_name = req.param("userName").unwrap();
//!         let book_name = req.param("bookName").unwrap();
//!
//!         Ok(Response::new(Full::new(Bytes::from(format!(
//!             "Username: {}, Book Name: {}",
//!             user_name, book_name
//!         )))))
//!     })
//!     .build()
//!     .unwrap();
//! # router
//! # }
//! # run();
//! ```
//!
//! ### Handle 404 and 405 Pages
//!
//! A request whose path matches no handler gets the not-found handler. When the path does have
//! handlers, just not for the request method, it gets the method-not-allowed handler. Both
//! default to a plain status response and both run inside the filters of the path.
//!
//! ```
//! use http_body_util::Full;
//! use hyper::{body::{Bytes, Incoming}, Response, StatusCode};
//! use routerify_trie::Router;
//! # use std::convert::Infallible;
//!
//! # fn run() -> Router<Incoming, Infallible> {
//! let router = Router::builder()
//!     .get("/users", |_| async { Ok(Response::new(Full::new(Bytes::from("List of users")))) })
//!     .not_found(|_| async {
//!         let mut resp = Response::new(Full::new(Bytes::from("NOT FOUND")));
//!         *resp.status_mut() = StatusCode::NOT_FOUND;
//!         Ok(resp)
//!     })
//!     .build()
//!     .unwrap();
//! # router
//! # }
//! # run();
//! ```
//!
//! ### Scoping, Mounting and Groups
//!
//! A router can be mounted under a literal prefix of another one with `.scope()`, or routes can be
//! registered under a prefix with `.group()`:
//!
//! ```
//! use http_body_util::Full;
//! use hyper::{body::{Bytes, Incoming}, Response};
//! use routerify_trie::Router;
//! use std::convert::Infallible;
//!
//! fn books() -> Router<Incoming, Infallible> {
//!     Router::builder()
//!         .get("/books", |_| async { Ok(Response::new(Full::new(Bytes::from("List of books")))) })
//!         .build()
//!         .unwrap()
//! }
//!
//! # fn run() -> Router<Incoming, Infallible> {
//! let router = Router::builder()
//!     .scope("/api", books())
//!     .group("/admin", |admin| {
//!         admin.get("/stats", |_| async { Ok(Response::new(Full::new(Bytes::from("stats")))) })
//!     })
//!     .build()
//!     .unwrap();
//! # router
//! # }
//! # run();
//! ```
//!
//! ## Filters
//!
//! A filter registered at a path wraps every handler at or below it. See the [`middleware`]
//! module docs for an example.
//!
//! ## Tasks
//!
//! Task handlers are addressed by path like routes but are invoked directly with
//! [`Router::start_task`] instead of by HTTP requests.
//!
//! ## Error Handling
//!
//! Registration errors are returned by [`RouterBuilder::build`]. Errors returned by handlers and
//! filters are passed to the error handler set with [`RouterBuilder::err_handler`], which turns
//! them into a response.

pub use self::component::Environment;
pub use self::error::{Error, RouteError};
pub use self::middleware::{compose, ArcFilter, Filter, FilterList, Intercept, Next};
pub use self::pattern::{compile, CompiledPattern, Token, VarIndex};
pub use self::route::{
    handler_fn, BoxFuture, Endpoint, Handler, HandlerResult, MethodHandler, SlotKind, Task, TaskHandler,
};
pub use self::router::{Group, HandlerMatch, Lookup, Router, RouterBuilder};
pub use self::service::{RequestService, RequestServiceBuilder, RouterService};
pub use self::types::RouteParams;

mod component;
mod error;
pub mod ext;
mod helpers;
pub mod middleware;
mod pattern;
mod pool;
pub mod prelude;
mod route;
mod router;
mod service;
mod tree;
mod types;

/// A Result type often returned from methods that can have routerify errors.
pub type Result<T> = std::result::Result<T, Error>;
