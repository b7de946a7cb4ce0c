use super::Session;
use crate::core::cancel::CancellationToken;
use crate::error::{Result, SessionError};
use std::thread::JoinHandle;

/// A scan or transfer running on its own thread
pub struct RunHandle<T> {
    thread: JoinHandle<Result<T>>,
    cancel: CancellationToken,
    session: Session,
}

impl<T> RunHandle<T> {
    pub(super) fn new(thread: JoinHandle<Result<T>>, cancel: CancellationToken, session: Session) -> Self {
        Self {
            thread,
            cancel,
            session,
        }
    }

    /// Request cancellation; the run stops at its next check point
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Wait for the run to end
    pub fn join(self) -> Result<T> {
        match self.thread.join() {
            Ok(result) => result,
            Err(_) => {
                let error = SessionError::WorkerPanicked;
                self.session.mark_failed(&error);
                Err(error.into())
            }
        }
    }
}
