//! worktrack-ui - threaded comment client for the worktrack project tracker
//!
//! Flat comment records are threaded through encoded reply markers, then
//! expansion, pagination and deep links decide what each thread shows.
//! Uses Elm Architecture (Message/Update) around a single-flight reload loop.

pub mod command;
pub mod config;
pub mod error;
pub mod loader;
pub mod locator;
pub mod logging;
pub mod message;
pub mod model;
pub mod session;
pub mod store;
pub mod text;
pub mod thread;
pub mod update;
pub mod view;

pub use error::{ActionError, CommandError, StoreError};
pub use loader::{ReloadOutcome, SingleFlightLoader};
pub use message::Message;
pub use model::{CommentId, CommentRecord, EntityKind, EntityRef};
pub use session::{CommentSession, LoadStatus};
pub use store::{CommentStore, HttpStore, NewComment, SqliteStore};
pub use update::update;
pub use view::{TextPresenter, ThreadPresenter, ThreadView};
