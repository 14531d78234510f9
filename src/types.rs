use crate::pattern::VarIndex;
use crate::pool::Pooled;
use crate::route::Slot;
use crate::tree::Span;
use std::fmt::{self, Debug, Formatter};
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

/// The capture values of a matched route.
///
/// Handlers usually read them through [`RequestExt::param`](./ext/trait.RequestExt.html#tymethod.param).
/// Values are borrowed from one copy of the matched path whose span buffer goes back to the router's
/// pool when the last clone is dropped.
#[derive(Clone, Default)]
pub struct RouteParams {
    inner: Option<Arc<Captured>>,
}

struct Captured {
    pattern: Arc<str>,
    vars: Arc<VarIndex>,
    path: String,
    spans: Pooled<Vec<Span>>,
}

impl RouteParams {
    pub(crate) fn new<T>(slot: &Slot<T>, path: &str, spans: Pooled<Vec<Span>>) -> Self {
        let path = if spans.is_empty() { String::new() } else { path.to_owned() };
        RouteParams {
            inner: Some(Arc::new(Captured {
                pattern: Arc::clone(&slot.pattern),
                vars: Arc::clone(&slot.vars),
                path,
                spans,
            })),
        }
    }

    /// The pattern the matched route was registered with, e.g. `/users/:id`.
    pub fn pattern(&self) -> Option<&str> {
        self.inner.as_ref().map(|c| &*c.pattern)
    }

    /// The value captured under `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        let captured = self.inner.as_ref()?;
        let idx = *captured.vars.get(name)?;
        captured.value(idx)
    }

    pub fn get_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.get(name).unwrap_or(default)
    }

    /// Parses the value captured under `name`. `None` if there is no such capture.
    pub fn parse<T: FromStr>(&self, name: &str) -> Option<Result<T, T::Err>> {
        self.get(name).map(str::parse)
    }

    /// The value of the capture at position `idx`, named or anonymous.
    pub fn at(&self, idx: usize) -> Option<&str> {
        self.inner.as_ref()?.value(idx)
    }

    /// Named captures and their values, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.inner.iter().flat_map(|captured| {
            captured
                .vars
                .iter()
                .filter_map(move |(name, &idx)| captured.value(idx).map(|v| (name.as_str(), v)))
        })
    }

    /// Number of captured values, anonymous ones included.
    pub fn len(&self) -> usize {
        self.inner.as_ref().map_or(0, |c| c.spans.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Captured {
    fn value(&self, idx: usize) -> Option<&str> {
        let span = self.spans.get(idx)?;
        self.path.get(span.clone())
    }
}

impl Debug for RouteParams {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Connection data attached to every request served through a
/// [`RequestService`](./struct.RequestService.html).
#[derive(Debug, Clone, Copy)]
pub(crate) struct RequestMeta {
    pub(crate) remote_addr: SocketAddr,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::compile;
    use crate::pool::Pool;

    fn params(pattern: &str, path: &str, spans: Vec<Span>) -> (RouteParams, Arc<Pool<Vec<Span>>>) {
        let compiled = compile(pattern).unwrap();
        let slot = Slot {
            pattern: Arc::from(pattern),
            vars: Arc::clone(compiled.vars()),
            payload: (),
        };
        let pool: Arc<Pool<Vec<Span>>> = Pool::new(2);
        let mut buf = pool.acquire();
        buf.extend(spans);
        (RouteParams::new(&slot, path, buf), pool)
    }

    #[test]
    fn should_look_up_values_by_name() {
        let (p, _) = params("/repos/:owner/:name/stargazers", "/repos/cosiner/zerver/stargazers", vec![7..14, 15..21]);

        assert_eq!(p.get("owner"), Some("cosiner"));
        assert_eq!(p.get("name"), Some("zerver"));
        assert_eq!(p.get("missing"), None);
        assert_eq!(p.get_or("missing", "none"), "none");
        assert_eq!(p.pattern(), Some("/repos/:owner/:name/stargazers"));
        assert_eq!(p.len(), 2);
    }

    #[test]
    fn should_parse_values() {
        let (p, _) = params("/users/:id/:slug", "/users/42/abc", vec![7..9, 10..13]);

        assert_eq!(p.parse::<u32>("id"), Some(Ok(42)));
        assert!(matches!(p.parse::<u32>("slug"), Some(Err(_))));
        assert_eq!(p.parse::<u32>("other"), None);
    }

    #[test]
    fn should_expose_anonymous_captures_by_position() {
        let (p, _) = params("/a/:/:b", "/a/x/y", vec![3..4, 5..6]);

        assert_eq!(p.at(0), Some("x"));
        assert_eq!(p.get("b"), Some("y"));
        assert_eq!(p.iter().collect::<Vec<_>>(), vec![("b", "y")]);
    }

    #[test]
    fn should_return_spans_when_last_clone_drops() {
        let (p, pool) = params("/users/:id", "/users/1", vec![7..8]);
        let copy = p.clone();
        drop(p);
        assert_eq!(pool.idle(), 0);
        assert_eq!(copy.get("id"), Some("1"));
        drop(copy);
        assert_eq!(pool.idle(), 1);
    }

    #[test]
    fn should_be_empty_by_default() {
        let p = RouteParams::default();
        assert!(p.is_empty());
        assert_eq!(p.get("id"), None);
        assert_eq!(p.pattern(), None);
    }
}
