//! Filters wrap the handler of every route below the path they are registered at.
//!
//! A filter receives the request together with a [`Next`] continuation. It either calls
//! [`Next::run`] to hand the request on (and may rewrite the response that comes back) or returns a
//! response of its own, which skips everything further down the chain.
//!
//! ```
//! use http_body_util::Full;
//! use hyper::{body::Bytes, Request, Response, StatusCode};
//! use routerify_trie::{Next, Router};
//! use std::convert::Infallible;
//!
//! async fn require_token(req: Request<Full<Bytes>>, next: Next<Full<Bytes>, Infallible>) -> Result<Response<Full<Bytes>>, Infallible> {
//!     if req.headers().contains_key("x-token") {
//!         next.run(req).await
//!     } else {
//!         let mut resp = Response::new(Full::new(Bytes::from("missing token")));
//!         *resp.status_mut() = StatusCode::UNAUTHORIZED;
//!         Ok(resp)
//!     }
//! }
//!
//! # fn run() -> Router<Full<Bytes>, Infallible> {
//! let router = Router::builder()
//!     .filter("/admin", require_token)
//!     .get("/admin/stats", |_| async { Ok(Response::new(Full::new(Bytes::from("stats")))) })
//!     .build()
//!     .unwrap();
//! # router
//! # }
//! # run();
//! ```

use crate::component::Environment;
use crate::route::{BoxFuture, HandlerResult};
use crate::RouteError;
use hyper::Request;
use std::future::Future;

pub use self::chain::{compose, ArcFilter, FilterList, Intercept, Next};

mod chain;

pub trait Filter<B, E>: Send + Sync + 'static {
    fn filter(&self, req: Request<B>, next: Next<B, E>) -> BoxFuture<HandlerResult<E>>;

    fn init(&self, _env: &Environment) -> Result<(), RouteError> {
        Ok(())
    }

    fn destroy(&self) {}
}

/// Adapts an `async` function or closure to [`Filter`].
pub(crate) struct FnFilter<H>(pub(crate) H);

impl<B, E, H, R> Filter<B, E> for FnFilter<H>
where
    B: 'static,
    E: 'static,
    H: Fn(Request<B>, Next<B, E>) -> R + Send + Sync + 'static,
    R: Future<Output = HandlerResult<E>> + Send + 'static,
{
    fn filter(&self, req: Request<B>, next: Next<B, E>) -> BoxFuture<HandlerResult<E>> {
        Box::pin((self.0)(req, next))
    }
}
