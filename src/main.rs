use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::service::Service;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder;
// Import the prelude traits.
use routerify_trie::prelude::*;
use routerify_trie::{Next, RouteError, Router, RouterService, Task};
use std::sync::Arc;
use std::{convert::Infallible, net::SocketAddr};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

// Define an app state to share it across the route handlers and filters.
#[derive(Clone)]
struct State(u64);

async fn home_handler(req: Request<Incoming>) -> Result<Response<Full<Bytes>>, Infallible> {
    let state = req.data::<State>().map_or(0, |s| s.0);
    Ok(Response::new(Full::new(Bytes::from(format!("Home page, state {}", state)))))
}

async fn user_handler(req: Request<Incoming>) -> Result<Response<Full<Bytes>>, Infallible> {
    let user_id = req.param("userId").unwrap_or("unknown");
    Ok(Response::new(Full::new(Bytes::from(format!("Hello {}", user_id)))))
}

async fn file_handler(req: Request<Incoming>) -> Result<Response<Full<Bytes>>, Infallible> {
    let path = req.param("path").unwrap_or_default();
    Ok(Response::new(Full::new(Bytes::from(format!("File {}", path)))))
}

// Logs every request together with the status the rest of the chain produced.
async fn logger(req: Request<Incoming>, next: Next<Incoming, Infallible>) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let remote_addr = req.remote_addr();

    let resp = next.run(req).await?;
    tracing::info!(%method, %path, ?remote_addr, status = %resp.status(), "served request");
    Ok(resp)
}

async fn error_handler(err: RouteError) -> Response<Full<Bytes>> {
    tracing::error!(error = %err, "request failed");
    let mut resp = Response::new(Full::new(Bytes::from(format!("Something went wrong: {}", err))));
    *resp.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    resp
}

fn router() -> routerify_trie::Result<Router<Incoming, Infallible>> {
    let router = Router::builder()
        .data(State(100))
        .filter("/", logger)
        .get("/", home_handler)
        .group("/users", |users| {
            users.get("/:userId", user_handler)?;
            users.post("/:userId", user_handler)
        })
        .get("/files/*path", file_handler)
        .task("/audit/:event", |task: Task| {
            if let Ok(event) = task.downcast::<String>() {
                tracing::info!(%event, "audit event");
            }
        })
        .err_handler(error_handler)
        .build()?;

    let mut tree = Vec::new();
    if router.print_tree(&mut tree).is_ok() {
        tracing::debug!("route tree:\n{}", String::from_utf8_lossy(&tree));
    }

    Ok(router)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let router = router()?;
    router.start_task("/audit/startup", String::from("server starting"))?;

    // Create a Service from the router above to handle incoming requests.
    let service = Arc::new(RouterService::new(router)?);

    // The address on which the server will be listening.
    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "app is running");

    loop {
        match listener.accept().await {
            Ok((stream, _)) => {
                let service = Arc::clone(&service);

                tokio::task::spawn(async move {
                    let request_service = match service.call(&stream).await {
                        Ok(request_service) => request_service,
                        Err(err) => match err {},
                    };
                    let io = TokioIo::new(stream);
                    if let Err(err) = Builder::new(TokioExecutor::new())
                        .serve_connection(io, request_service)
                        .await
                    {
                        tracing::warn!(error = %err, "error serving connection");
                    }
                });
            }
            Err(err) => {
                tracing::warn!(error = %err, "error accepting connection");
            }
        }
    }
}
