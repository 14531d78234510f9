use crate::component::Environment;
use crate::types::{RequestMeta, RouteParams};
use hyper::Request;
use std::net::SocketAddr;

/// Accessors for what the router attaches to a request.
pub trait RequestExt {
    /// All captures of the matched route.
    fn params(&self) -> Option<&RouteParams>;

    /// The value captured under `name`.
    ///
    /// # Examples
    ///
    /// ```
    /// use http_body_util::Full;
    /// use hyper::{body::Bytes, Request, Response};
    /// use routerify_trie::prelude::*;
    /// use routerify_trie::Router;
    /// use std::convert::Infallible;
    ///
    /// async fn user(req: Request<Full<Bytes>>) -> Result<Response<Full<Bytes>>, Infallible> {
    ///     let id = req.param("id").unwrap_or("anonymous");
    ///     Ok(Response::new(Full::new(Bytes::from(format!("user {}", id)))))
    /// }
    ///
    /// # fn run() -> Router<Full<Bytes>, Infallible> {
    /// let router = Router::builder().get("/users/:id", user).build().unwrap();
    /// # router
    /// # }
    /// # run();
    /// ```
    fn param<P: AsRef<str>>(&self, name: P) -> Option<&str>;

    /// The peer address of the connection the request came in on.
    fn remote_addr(&self) -> Option<SocketAddr>;

    /// Shared data stored with [`RouterBuilder::data`](../struct.RouterBuilder.html#method.data).
    fn data<T: Send + Sync + 'static>(&self) -> Option<&T>;

    /// The router environment.
    fn env(&self) -> Option<&Environment>;
}

impl<B> RequestExt for Request<B> {
    fn params(&self) -> Option<&RouteParams> {
        self.extensions().get::<RouteParams>()
    }

    fn param<P: AsRef<str>>(&self, name: P) -> Option<&str> {
        self.params().and_then(|params| params.get(name.as_ref()))
    }

    fn remote_addr(&self) -> Option<SocketAddr> {
        self.extensions().get::<RequestMeta>().map(|meta| meta.remote_addr)
    }

    fn data<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.env().and_then(|env| env.get::<T>())
    }

    fn env(&self) -> Option<&Environment> {
        self.extensions().get::<Environment>()
    }
}
