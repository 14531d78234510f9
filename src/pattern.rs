//! Compiles human readable route patterns into the token form stored in the route tree.
//!
//! A pattern is a `/` separated path where the last `:name` or `*name` of a segment turns the
//! rest of that segment into a capture:
//!
//! * `/users/:id` captures one path segment, stopping at the next `/`.
//! * `/files/*path` captures the whole remaining path, `/` included.
//! * `/user.:format` keeps `/user.` literal and captures what follows it.
//!
//! Names may be empty (`/:` or `/*`); such captures still occupy a position but can't be looked
//! up by name.

use crate::Error;
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

/// Maps capture names to their position among the captures of one pattern.
pub type VarIndex = HashMap<String, usize>;

lazy_static! {
    static ref EMPTY_VARS: Arc<VarIndex> = Arc::new(VarIndex::new());
}

pub(crate) const MATCH_WILDCARD: u8 = b':';
pub(crate) const MATCH_CATCHALL: u8 = b'*';

/// One unit of a compiled path.
///
/// The derived ordering puts every literal byte before [`Token::Wildcard`] and that before
/// [`Token::Catchall`], so sorted child lists always end with the dynamic branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Token {
    Byte(u8),
    /// Captures up to the next `/`.
    Wildcard,
    /// Captures everything that is left.
    Catchall,
}

impl Token {
    pub fn is_capture(self) -> bool {
        !matches!(self, Token::Byte(_))
    }

    pub(crate) fn as_byte(self) -> u8 {
        match self {
            Token::Byte(b) => b,
            Token::Wildcard => MATCH_WILDCARD,
            Token::Catchall => MATCH_CATCHALL,
        }
    }
}

/// Renders tokens back into pattern syntax, captures shown as bare `:` and `*`.
pub(crate) fn render(tokens: &[Token]) -> String {
    let bytes = tokens.iter().map(|t| t.as_byte()).collect::<Vec<_>>();
    String::from_utf8_lossy(&bytes).into_owned()
}

/// The result of [`compile`]: the token path and the capture name index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPattern {
    tokens: Vec<Token>,
    vars: Arc<VarIndex>,
}

impl CompiledPattern {
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn vars(&self) -> &Arc<VarIndex> {
        &self.vars
    }

    /// Number of captures, named or not.
    pub fn capture_count(&self) -> usize {
        self.tokens.iter().filter(|t| t.is_capture()).count()
    }
}

impl Display for CompiledPattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&render(&self.tokens))
    }
}

/// Strips the query string and a single trailing `/` (unless the path is just `/`).
pub(crate) fn normalize(path: &str) -> &str {
    let path = match path.find('?') {
        Some(idx) => &path[..idx],
        None => path,
    };
    trim_trailing_slash(path)
}

pub(crate) fn trim_trailing_slash(path: &str) -> &str {
    if path.len() > 1 && path.ends_with('/') {
        &path[..path.len() - 1]
    } else {
        path
    }
}

/// Joins a mount or group prefix with a pattern registered below it.
pub(crate) fn join(prefix: &str, pattern: &str) -> String {
    let prefix = normalize(prefix).trim_end_matches('/');
    let joined = format!("{}{}", prefix, pattern);
    match normalize(&joined) {
        "" => "/".to_owned(),
        path if path.len() == joined.len() => joined,
        path => path.to_owned(),
    }
}

/// Compiles a route pattern.
///
/// `/a/` and `/a` compile to the same tokens; a query string is discarded.
pub fn compile(pattern: &str) -> crate::Result<CompiledPattern> {
    let invalid = |reason| Error::InvalidPattern {
        pattern: pattern.to_owned(),
        reason,
    };

    let path = normalize(pattern);
    if !path.starts_with('/') {
        return Err(invalid("pattern must start with '/'"));
    }

    let mut tokens = Vec::with_capacity(path.len());
    let mut vars: Option<VarIndex> = None;
    let mut index = 0;
    let mut catchall_at = None;

    for section in path[1..].split('/') {
        tokens.push(Token::Byte(b'/'));

        let capture = section
            .bytes()
            .rposition(|b| b == MATCH_WILDCARD || b == MATCH_CATCHALL)
            .map(|pos| {
                let token = if section.as_bytes()[pos] == MATCH_WILDCARD {
                    Token::Wildcard
                } else {
                    Token::Catchall
                };
                (pos, token)
            });

        let literal_end = capture.map(|(pos, _)| pos).unwrap_or(section.len());
        tokens.extend(section[..literal_end].bytes().map(Token::Byte));

        if let Some((pos, token)) = capture {
            let name = &section[pos + 1..];
            if !name.is_empty() && vars.get_or_insert_with(VarIndex::new).insert(name.to_owned(), index).is_some() {
                return Err(invalid("duplicate capture name"));
            }

            index += 1;
            tokens.push(token);

            if token == Token::Catchall && catchall_at.is_none() {
                catchall_at = Some(tokens.len());
            }
        }
    }

    if let Some(end) = catchall_at {
        if end < tokens.len() {
            tracing::warn!(
                pattern,
                "everything after the catch-all capture of this route pattern is unreachable"
            );
        }
    }

    Ok(CompiledPattern {
        tokens,
        vars: vars.map(Arc::new).unwrap_or_else(|| Arc::clone(&EMPTY_VARS)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(s: &str) -> Vec<Token> {
        s.bytes().map(Token::Byte).collect()
    }

    #[test]
    fn should_compile_root() {
        let p = compile("/").unwrap();
        assert_eq!(p.tokens(), lit("/").as_slice());
        assert!(p.vars().is_empty());
    }

    #[test]
    fn should_compile_named_captures_in_order() {
        let p = compile("/user/:a/:abc/").unwrap();

        let mut expected = lit("/user/");
        expected.push(Token::Wildcard);
        expected.push(Token::Byte(b'/'));
        expected.push(Token::Wildcard);
        assert_eq!(p.tokens(), expected.as_slice());
        assert_eq!(p.vars().get("a"), Some(&0));
        assert_eq!(p.vars().get("abc"), Some(&1));
        assert_eq!(p.to_string(), "/user/:/:");
    }

    #[test]
    fn should_count_anonymous_captures() {
        let p = compile("/user/:/:abc").unwrap();
        assert_eq!(p.capture_count(), 2);
        assert_eq!(p.vars().len(), 1);
        assert_eq!(p.vars().get("abc"), Some(&1));
    }

    #[test]
    fn should_keep_segment_prefix_literal() {
        let p = compile("/user.:format").unwrap();
        let mut expected = lit("/user.");
        expected.push(Token::Wildcard);
        assert_eq!(p.tokens(), expected.as_slice());
        assert_eq!(p.vars().get("format"), Some(&0));
    }

    #[test]
    fn should_compile_catchall() {
        let p = compile("/files/*rest").unwrap();
        assert_eq!(p.tokens().last(), Some(&Token::Catchall));
        assert_eq!(p.vars().get("rest"), Some(&0));
    }

    #[test]
    fn should_normalize_trailing_slash_and_query() {
        assert_eq!(compile("/a/").unwrap(), compile("/a").unwrap());
        assert_eq!(compile("/a?x=1").unwrap(), compile("/a").unwrap());
        assert_eq!(normalize("/"), "/");
        assert_eq!(normalize("/a/b/?q"), "/a/b");
    }

    #[test]
    fn should_reject_invalid_patterns() {
        assert!(matches!(compile(""), Err(Error::InvalidPattern { .. })));
        assert!(matches!(compile("users"), Err(Error::InvalidPattern { .. })));
        assert!(matches!(compile("/:id/:id"), Err(Error::InvalidPattern { .. })));
    }

    #[test]
    fn should_join_prefix_and_pattern() {
        assert_eq!(join("/api", "/users/:id"), "/api/users/:id");
        assert_eq!(join("/api/", "/"), "/api");
        assert_eq!(join("/", "/users"), "/users");
        assert_eq!(join("", "/"), "/");
    }

    #[test]
    fn should_order_literals_before_captures() {
        assert!(Token::Byte(u8::MAX) < Token::Wildcard);
        assert!(Token::Wildcard < Token::Catchall);
    }

    #[test]
    fn should_accept_former_sentinel_characters_in_literals() {
        let p = compile("/a|b/~c").unwrap();
        assert_eq!(p.tokens(), lit("/a|b/~c").as_slice());
    }
}
