//! Comment threading engine.
//!
//! Flat records go in, a forest comes out; expansion and pager state decide
//! which slice of each thread is visible.

pub mod deep_link;
pub mod expansion;
pub mod forest;
pub mod pager;
pub mod reply;
pub mod slice;

pub use deep_link::{DeepLink, resolve};
pub use expansion::{ExpansionState, normalize_to_root};
pub use forest::{Forest, MAX_DEPTH, ThreadNode};
pub use pager::{DEFAULT_PAGE_SIZE, Page, PagerEntry, PagerState, paginate};
pub use reply::{encode_parent, extract_parent};
pub use slice::{PagerInfo, ReplyBranch, ThreadSlice, Toggle, forest_slices, thread_slice};
