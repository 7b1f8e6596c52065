use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::session::{CallSnapshot, SessionCommand};

/// Client-side grip on a running call session.
///
/// Dropping the handle (without `end`) closes the command channel, which
/// the session treats as a hang-up.
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    snapshots: watch::Receiver<CallSnapshot>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    pub(crate) fn new(
        commands: mpsc::Sender<SessionCommand>,
        snapshots: watch::Receiver<CallSnapshot>,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            commands,
            snapshots,
            task,
        }
    }

    /// Current call state, cloned out of the watch channel.
    pub fn snapshot(&self) -> CallSnapshot {
        self.snapshots.borrow().clone()
    }

    /// A receiver that observes every published snapshot.
    pub fn watch(&self) -> watch::Receiver<CallSnapshot> {
        self.snapshots.clone()
    }

    pub async fn command(&self, command: SessionCommand) {
        let _ = self.commands.send(command).await;
    }

    /// Hangs up and waits for the session task to finish its teardown.
    pub async fn end(self) {
        let _ = self.commands.send(SessionCommand::EndCall).await;
        let _ = self.task.await;
    }
}
