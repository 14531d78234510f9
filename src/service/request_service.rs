use crate::helpers;
use crate::route::BoxFuture;
use crate::router::Router;
use crate::types::RequestMeta;
use crate::RouteError;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{service::Service, Request, Response};
use std::fmt::{self, Debug, Formatter};
use std::net::SocketAddr;
use std::ops::Deref;
use std::sync::Arc;

/// An initialized router. Its components are destroyed once the last service using it is gone.
struct LiveRouter<B: 'static, E: 'static> {
    router: Router<B, E>,
}

impl<B: 'static, E: 'static> Deref for LiveRouter<B, E> {
    type Target = Router<B, E>;

    fn deref(&self) -> &Router<B, E> {
        &self.router
    }
}

impl<B: 'static, E: 'static> Drop for LiveRouter<B, E> {
    fn drop(&mut self) {
        self.router.destroy();
        tracing::debug!("destroyed route components");
    }
}

/// Serves the requests of one connection.
pub struct RequestService<B: 'static, E: 'static> {
    router: Arc<LiveRouter<B, E>>,
    remote_addr: SocketAddr,
}

impl<B, E> Service<Request<B>> for RequestService<B, E>
where
    B: Send + 'static,
    E: Into<RouteError> + 'static,
{
    type Response = Response<Full<Bytes>>;
    type Error = RouteError;
    type Future = BoxFuture<Result<Self::Response, Self::Error>>;

    fn call(&self, mut req: Request<B>) -> Self::Future {
        let router = Arc::clone(&self.router);
        let remote_addr = self.remote_addr;

        let fut = async move {
            req.extensions_mut().insert(RequestMeta { remote_addr });

            let target_path = helpers::percent_decode_request_path(req.uri().path())?;
            tracing::trace!(method = %req.method(), path = %target_path, %remote_addr, "dispatching request");

            Ok(router.process(&target_path, req).await)
        };

        Box::pin(fut)
    }
}

impl<B: 'static, E: 'static> Debug for RequestService<B, E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestService")
            .field("remote_addr", &self.remote_addr)
            .finish()
    }
}

/// Initializes a router once and hands out a [`RequestService`] per connection.
pub struct RequestServiceBuilder<B: 'static, E: 'static> {
    router: Arc<LiveRouter<B, E>>,
}

impl<B: Send + 'static, E: Into<RouteError> + 'static> RequestServiceBuilder<B, E> {
    /// Runs the `init` hook of every component registered on `router`.
    ///
    /// If one of them fails, the `destroy` hooks of all components run before the error is
    /// returned.
    pub fn new(router: Router<B, E>) -> crate::Result<Self> {
        if let Err(err) = router.init() {
            router.destroy();
            return Err(err);
        }
        Ok(Self {
            router: Arc::new(LiveRouter { router }),
        })
    }

    pub fn build(&self, remote_addr: SocketAddr) -> RequestService<B, E> {
        RequestService {
            router: Arc::clone(&self.router),
            remote_addr,
        }
    }

    pub fn router(&self) -> &Router<B, E> {
        &self.router
    }
}

impl<B: 'static, E: 'static> Debug for RequestServiceBuilder<B, E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestServiceBuilder")
            .field("router", &self.router.router)
            .finish()
    }
}
