use super::{Filter, FnFilter};
use crate::component::Environment;
use crate::pool::Pooled;
use crate::route::{BoxFuture, Handler, HandlerResult};
use crate::RouteError;
use hyper::Request;
use std::fmt::{self, Debug, Formatter};
use std::future::Future;
use std::sync::Arc;

pub type ArcFilter<B, E> = Arc<dyn Filter<B, E>>;

enum Filters<B, E> {
    Empty,
    Pooled(Pooled<Vec<ArcFilter<B, E>>>),
    Shared(Arc<[ArcFilter<B, E>]>),
}

/// The filters that apply to one request, outermost first.
pub struct FilterList<B, E> {
    inner: Filters<B, E>,
}

impl<B, E> FilterList<B, E> {
    pub fn empty() -> Self {
        FilterList { inner: Filters::Empty }
    }

    pub(crate) fn pooled(list: Pooled<Vec<ArcFilter<B, E>>>) -> Self {
        if list.is_empty() {
            return FilterList::empty();
        }
        FilterList {
            inner: Filters::Pooled(list),
        }
    }

    pub(crate) fn shared(list: Arc<[ArcFilter<B, E>]>) -> Self {
        FilterList {
            inner: Filters::Shared(list),
        }
    }

    pub fn as_slice(&self) -> &[ArcFilter<B, E>] {
        match &self.inner {
            Filters::Empty => &[],
            Filters::Pooled(list) => list.as_slice(),
            Filters::Shared(list) => &list[..],
        }
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }
}

impl<B, E> From<Vec<ArcFilter<B, E>>> for FilterList<B, E> {
    fn from(list: Vec<ArcFilter<B, E>>) -> Self {
        if list.is_empty() {
            return FilterList::empty();
        }
        FilterList::shared(list.into())
    }
}

impl<B, E> Debug for FilterList<B, E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterList").field("len", &self.len()).finish()
    }
}

/// The rest of a filter chain.
///
/// `run` takes the continuation by value, so a filter can hand the request on at most once.
/// Dropping it without calling `run` short-circuits the chain.
pub struct Next<B, E> {
    filters: FilterList<B, E>,
    cursor: usize,
    terminal: Arc<dyn Handler<B, E>>,
}

impl<B: 'static, E: 'static> Next<B, E> {
    pub async fn run(mut self, req: Request<B>) -> HandlerResult<E> {
        let filter = self.filters.as_slice().get(self.cursor).cloned();
        match filter {
            Some(filter) => {
                self.cursor += 1;
                filter.filter(req, self).await
            }
            None => {
                let terminal = Arc::clone(&self.terminal);
                // Hands the filter buffer back before the handler runs.
                drop(self);
                terminal.call(req).await
            }
        }
    }

    /// Number of filters still to run before the handler.
    pub fn remaining(&self) -> usize {
        self.filters.len() - self.cursor
    }
}

impl<B, E> Debug for Next<B, E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("filters", &self.filters.len())
            .field("cursor", &self.cursor)
            .finish()
    }
}

/// Chains `filters` around `terminal`; the first filter runs first.
///
/// With no filters the continuation calls `terminal` directly.
pub fn compose<B, E>(filters: FilterList<B, E>, terminal: Arc<dyn Handler<B, E>>) -> Next<B, E> {
    Next {
        filters,
        cursor: 0,
        terminal,
    }
}

/// A handler wrapped in its own filters, independent of the route tree.
///
/// Unlike [`Next`] it can be called any number of times, and it is itself a [`Handler`] so it can be
/// registered like any other.
pub struct Intercept<B, E> {
    filters: Arc<[ArcFilter<B, E>]>,
    handler: Arc<dyn Handler<B, E>>,
}

impl<B: 'static, E: 'static> Intercept<B, E> {
    pub fn new(handler: Arc<dyn Handler<B, E>>) -> Self {
        Intercept {
            filters: Arc::new([]),
            handler,
        }
    }

    /// Adds a filter inside the ones added before it.
    pub fn filter<H, R>(self, filter: H) -> Self
    where
        H: Fn(Request<B>, Next<B, E>) -> R + Send + Sync + 'static,
        R: Future<Output = HandlerResult<E>> + Send + 'static,
    {
        self.filter_with(Arc::new(FnFilter(filter)))
    }

    pub fn filter_with(mut self, filter: ArcFilter<B, E>) -> Self {
        let mut filters = self.filters.to_vec();
        filters.push(filter);
        self.filters = filters.into();
        self
    }
}

impl<B: Send + 'static, E: 'static> Handler<B, E> for Intercept<B, E> {
    fn call(&self, req: Request<B>) -> BoxFuture<HandlerResult<E>> {
        let next = compose(FilterList::shared(Arc::clone(&self.filters)), Arc::clone(&self.handler));
        Box::pin(next.run(req))
    }

    fn init(&self, env: &Environment) -> Result<(), RouteError> {
        for filter in self.filters.iter() {
            filter.init(env)?;
        }
        self.handler.init(env)
    }

    fn destroy(&self) {
        for filter in self.filters.iter() {
            filter.destroy();
        }
        self.handler.destroy();
    }
}
