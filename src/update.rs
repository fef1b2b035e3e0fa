//! State update logic (Elm Architecture)

use tracing::debug;

use crate::error::ActionError;
use crate::message::Message;
use crate::session::CommentSession;
use crate::store::CommentStore;
use crate::view::ThreadPresenter;

/// What the event loop should do after a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    ShowHelp,
    Quit,
}

/// Apply `msg` to `session`.
///
/// # Errors
///
/// Returns the action's error; the session state is unchanged and no reload
/// was requested.
pub async fn update<S, P>(session: &CommentSession<S, P>, msg: Message) -> Result<Flow, ActionError>
where
    S: CommentStore,
    P: ThreadPresenter,
{
    debug!(?msg, "update");
    match msg {
        // === Threads ===
        Message::Toggle(id) => {
            session.toggle(id).await?;
        }
        Message::ChangePage { root, page } => {
            session.change_page(root, page).await?;
        }
        Message::GoTo(id) => {
            session.resolve_locator(id).await;
        }

        // === Mutations ===
        Message::Create(body) => {
            session.create(&body).await?;
        }
        Message::Reply { parent, body } => {
            session.reply(parent, &body).await?;
        }
        Message::Edit { id, body } => {
            session.edit(id, &body).await?;
        }
        Message::Delete(id) => {
            session.delete(id).await?;
        }

        // === System ===
        Message::Reload => {
            session.load().await;
        }
        Message::Help => return Ok(Flow::ShowHelp),
        Message::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}
