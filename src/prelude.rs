//! Extension traits for handlers and filters.
//!
//! ```
//! use routerify_trie::prelude::*;
//! ```

pub use crate::ext::RequestExt;
