use crate::middleware::Filter;
use crate::pattern::{self, CompiledPattern, VarIndex};
use crate::Error;
use std::fmt::{self, Debug, Display, Formatter};
use std::sync::Arc;

pub use self::handler::{handler_fn, BoxFuture, Handler, HandlerResult, MethodHandler, Task, TaskHandler};
pub(crate) use self::handler::{FnHandler, FnTaskHandler};

mod handler;

/// The kinds of component a route node can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    Handler,
    Filter,
    WebSocketHandler,
    TaskHandler,
}

impl Display for SlotKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            SlotKind::Handler => "Handler",
            SlotKind::Filter => "Filter",
            SlotKind::WebSocketHandler => "WebSocketHandler",
            SlotKind::TaskHandler => "TaskHandler",
        };
        f.write_str(name)
    }
}

/// A component to register at a route pattern with [`Router::route`](./struct.Router.html#method.route).
pub enum Endpoint<B, E> {
    Handler(MethodHandler<B, E>),
    Filter(Arc<dyn Filter<B, E>>),
    WebSocketHandler(Arc<dyn Handler<B, E>>),
    TaskHandler(Arc<dyn TaskHandler>),
}

impl<B, E> Endpoint<B, E> {
    pub fn kind(&self) -> SlotKind {
        match self {
            Endpoint::Handler(_) => SlotKind::Handler,
            Endpoint::Filter(_) => SlotKind::Filter,
            Endpoint::WebSocketHandler(_) => SlotKind::WebSocketHandler,
            Endpoint::TaskHandler(_) => SlotKind::TaskHandler,
        }
    }
}

impl<B, E> Debug for Endpoint<B, E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Handler(methods) => f.debug_tuple("Handler").field(methods).finish(),
            other => write!(f, "{}", other.kind()),
        }
    }
}

/// An occupied single-valued slot: the component plus the pattern it was registered with.
pub(crate) struct Slot<T> {
    pub(crate) pattern: Arc<str>,
    pub(crate) vars: Arc<VarIndex>,
    pub(crate) payload: T,
}

impl<T> Slot<T> {
    fn new(pattern: &str, compiled: &CompiledPattern, payload: T) -> Self {
        Slot {
            pattern: Arc::from(pattern),
            vars: Arc::clone(compiled.vars()),
            payload,
        }
    }
}

/// Everything registered at one tree node.
///
/// Handler, websocket and task slots hold at most one component each. Filters accumulate in
/// registration order.
pub(crate) struct RouteSlots<B, E> {
    pub(crate) handler: Option<Slot<MethodHandler<B, E>>>,
    pub(crate) filters: Vec<Arc<dyn Filter<B, E>>>,
    pub(crate) websocket: Option<Slot<Arc<dyn Handler<B, E>>>>,
    pub(crate) task: Option<Slot<Arc<dyn TaskHandler>>>,
}

impl<B, E> Default for RouteSlots<B, E> {
    fn default() -> Self {
        RouteSlots {
            handler: None,
            filters: Vec::new(),
            websocket: None,
            task: None,
        }
    }
}

impl<B, E> RouteSlots<B, E> {
    /// Stores `endpoint` in the matching slot.
    ///
    /// A handler registered at a path that already has one is merged into it when both patterns
    /// name their captures the same way and no HTTP method is claimed twice.
    pub(crate) fn register(&mut self, pattern: &str, compiled: &CompiledPattern, endpoint: Endpoint<B, E>) -> crate::Result<()> {
        let kind = endpoint.kind();
        let exists = || Error::RouteExists {
            kind,
            pattern: pattern.to_owned(),
        };

        match endpoint {
            Endpoint::Handler(methods) => match &mut self.handler {
                Some(slot) if slot.vars == *compiled.vars() => slot.payload.merge(methods).map_err(|_| exists()),
                Some(_) => Err(exists()),
                None => {
                    self.handler = Some(Slot::new(pattern, compiled, methods));
                    Ok(())
                }
            },
            Endpoint::Filter(filter) => {
                self.filters.push(filter);
                Ok(())
            }
            Endpoint::WebSocketHandler(handler) => {
                if self.websocket.is_some() {
                    return Err(exists());
                }
                self.websocket = Some(Slot::new(pattern, compiled, handler));
                Ok(())
            }
            Endpoint::TaskHandler(handler) => {
                if self.task.is_some() {
                    return Err(exists());
                }
                self.task = Some(Slot::new(pattern, compiled, handler));
                Ok(())
            }
        }
    }

    /// Rewrites the stored patterns of a router that is being mounted under `prefix`.
    pub(crate) fn prefix_patterns(&mut self, prefix: &str) {
        let join = |p: &mut Arc<str>| *p = Arc::from(pattern::join(prefix, p));

        if let Some(slot) = &mut self.handler {
            join(&mut slot.pattern);
        }
        if let Some(slot) = &mut self.websocket {
            join(&mut slot.pattern);
        }
        if let Some(slot) = &mut self.task {
            join(&mut slot.pattern);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::compile;
    use http_body_util::Full;
    use hyper::body::Bytes;
    use hyper::{Request, Response};
    use std::convert::Infallible;

    type Slots = RouteSlots<Full<Bytes>, Infallible>;

    async fn ok(_: Request<Full<Bytes>>) -> HandlerResult<Infallible> {
        Ok(Response::new(Full::new(Bytes::new())))
    }

    fn register(slots: &mut Slots, pattern: &str, endpoint: Endpoint<Full<Bytes>, Infallible>) -> crate::Result<()> {
        slots.register(pattern, &compile(pattern).unwrap(), endpoint)
    }

    #[test]
    fn should_merge_methods_with_same_capture_names() {
        let mut slots = Slots::default();
        register(&mut slots, "/users/:id", Endpoint::Handler(MethodHandler::new().get(ok))).unwrap();
        register(&mut slots, "/users/:id", Endpoint::Handler(MethodHandler::new().post(ok))).unwrap();

        let slot = slots.handler.as_ref().unwrap();
        assert_eq!(slot.payload.allowed_methods().count(), 2);
        assert_eq!(&*slot.pattern, "/users/:id");
    }

    #[test]
    fn should_refuse_handler_with_other_capture_names() {
        let mut slots = Slots::default();
        register(&mut slots, "/users/:id", Endpoint::Handler(MethodHandler::new().get(ok))).unwrap();
        let err = register(&mut slots, "/users/:name", Endpoint::Handler(MethodHandler::new().post(ok))).unwrap_err();

        assert!(matches!(
            err,
            Error::RouteExists {
                kind: SlotKind::Handler,
                ..
            }
        ));
    }

    #[test]
    fn should_refuse_second_task_handler() {
        let mut slots = Slots::default();
        let task = || Endpoint::TaskHandler(Arc::new(FnTaskHandler(|_: Task| {})) as Arc<dyn TaskHandler>);
        register(&mut slots, "/jobs", task()).unwrap();
        let err = register(&mut slots, "/jobs", task()).unwrap_err();

        assert_eq!(err.to_string(), "TaskHandler for route pattern \"/jobs\" already exists");
    }
}
