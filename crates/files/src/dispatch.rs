//! Sinks for [`FilesAction`] events.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tracing::warn;

use crate::actions::FilesAction;
use crate::state::FilesState;

/// Receives state transitions. Dispatch never fails and never blocks.
pub trait FilesDispatch: Send + Sync {
    fn dispatch(&self, action: FilesAction);
}

/// Applies every action to a shared [`FilesState`].
#[derive(Clone, Default)]
pub struct StateDispatch {
    state: Arc<RwLock<FilesState>>,
}

impl StateDispatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clone of the current state.
    pub fn snapshot(&self) -> FilesState {
        self.state.read().clone()
    }
}

impl FilesDispatch for StateDispatch {
    fn dispatch(&self, action: FilesAction) {
        self.state.write().apply(action);
    }
}

/// Forwards actions to an async consumer.
#[derive(Clone)]
pub struct ChannelDispatch {
    tx: mpsc::UnboundedSender<FilesAction>,
}

impl ChannelDispatch {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<FilesAction>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl FilesDispatch for ChannelDispatch {
    fn dispatch(&self, action: FilesAction) {
        if let Err(err) = self.tx.send(action) {
            warn!(action = err.0.kind(), "files action dropped: receiver closed");
        }
    }
}

/// Records actions in order; used by tests and the CLI.
#[derive(Clone, Default)]
pub struct ActionLog {
    actions: Arc<Mutex<Vec<FilesAction>>>,
}

impl ActionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn actions(&self) -> Vec<FilesAction> {
        self.actions.lock().clone()
    }

    /// Drain the recorded actions.
    pub fn take(&self) -> Vec<FilesAction> {
        std::mem::take(&mut *self.actions.lock())
    }
}

impl FilesDispatch for ActionLog {
    fn dispatch(&self, action: FilesAction) {
        self.actions.lock().push(action);
    }
}

/// Fans one action out to several sinks.
pub struct FanoutDispatch {
    sinks: Vec<Arc<dyn FilesDispatch>>,
}

impl FanoutDispatch {
    pub fn new(sinks: Vec<Arc<dyn FilesDispatch>>) -> Self {
        Self { sinks }
    }
}

impl FilesDispatch for FanoutDispatch {
    fn dispatch(&self, action: FilesAction) {
        if let Some((last, rest)) = self.sinks.split_last() {
            for sink in rest {
                sink.dispatch(action.clone());
            }
            last.dispatch(action);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn channel_dispatch_delivers_in_order() {
        let (dispatch, mut rx) = ChannelDispatch::new();
        dispatch.dispatch(FilesAction::ResetFiles);
        dispatch.dispatch(FilesAction::PublishResetDir);

        assert_eq!(rx.recv().await, Some(FilesAction::ResetFiles));
        assert_eq!(rx.recv().await, Some(FilesAction::PublishResetDir));
    }

    #[test]
    fn closed_channel_is_ignored() {
        let (dispatch, rx) = ChannelDispatch::new();
        drop(rx);
        dispatch.dispatch(FilesAction::ResetFiles);
    }

    #[test]
    fn fanout_reaches_every_sink() {
        let log = ActionLog::new();
        let state = StateDispatch::new();
        let fanout = FanoutDispatch::new(vec![Arc::new(log.clone()), Arc::new(state.clone())]);

        fanout.dispatch(FilesAction::PublishResetDir);
        assert_eq!(log.take(), vec![FilesAction::PublishResetDir]);
        assert!(log.actions().is_empty());
        assert_eq!(state.snapshot(), FilesState::new());
    }
}
