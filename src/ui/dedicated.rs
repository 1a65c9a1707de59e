use std::{
    panic::{self, AssertUnwindSafe},
    sync::{mpsc, Mutex},
    thread::{self, JoinHandle, ThreadId},
};

use anyhow::{anyhow, Context, Result};

use super::{UiTask, UiThread};

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info};

enum UiCommand {
    Run(UiTask),
    Shutdown,
}

/// A UI context backed by one named OS thread draining a FIFO queue.
///
/// Hosts without a platform main loop (tests, headless services) use this in place
/// of the platform's main thread.
pub struct DedicatedUiThread {
    sender: Mutex<mpsc::Sender<UiCommand>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    thread_id: ThreadId,
}

impl DedicatedUiThread {
    pub fn spawn(name: &str) -> Result<Self> {
        let (command_tx, command_rx) = mpsc::channel::<UiCommand>();
        let thread_name = name.to_string();

        let worker = thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || {
                while let Ok(command) = command_rx.recv() {
                    match command {
                        UiCommand::Run(task) => {
                            if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
                                log_error!("UI task panicked on {thread_name}; continuing");
                            }
                        }
                        UiCommand::Shutdown => break,
                    }
                }

                log_info!("UI thread {thread_name} shutting down");
            })
            .with_context(|| format!("failed to spawn UI thread '{name}'"))?;

        let thread_id = worker.thread().id();

        Ok(Self {
            sender: Mutex::new(command_tx),
            worker: Mutex::new(Some(worker)),
            thread_id,
        })
    }
}

impl UiThread for DedicatedUiThread {
    fn dispatch(&self, task: UiTask) -> Result<()> {
        let sender = self
            .sender
            .lock()
            .map_err(|_| anyhow!("UI thread sender poisoned"))?;
        sender
            .send(UiCommand::Run(task))
            .map_err(|_| anyhow!("UI thread has shut down"))
    }

    fn is_current(&self) -> bool {
        thread::current().id() == self.thread_id
    }
}

impl Drop for DedicatedUiThread {
    fn drop(&mut self) {
        let mut guard = match self.worker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let Some(handle) = guard.take() else {
            return;
        };

        if let Ok(sender) = self.sender.lock() {
            let _ = sender.send(UiCommand::Shutdown);
        }

        // Joining ourselves would deadlock.
        if thread::current().id() == self.thread_id {
            return;
        }
        if let Err(join_err) = handle.join() {
            log_error!("Failed to join UI thread: {join_err:?}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex as StdMutex};

    use super::*;
    use crate::error::BridgeError;
    use crate::ui::run_on_ui;

    #[tokio::test]
    async fn runs_tasks_on_its_own_thread() {
        let ui = Arc::new(DedicatedUiThread::spawn("test-ui").unwrap());
        let handle = ui.clone();
        let on_ui = run_on_ui(ui.as_ref(), move || handle.is_current()).await.unwrap();
        assert!(on_ui);
        assert!(!ui.is_current());
    }

    #[tokio::test]
    async fn preserves_submission_order() {
        let ui = DedicatedUiThread::spawn("ordered-ui").unwrap();
        let seen = Arc::new(StdMutex::new(Vec::new()));
        for i in 0..20 {
            let seen = seen.clone();
            ui.dispatch(Box::new(move || seen.lock().unwrap().push(i)))
                .unwrap();
        }
        run_on_ui(&ui, || ()).await.unwrap();
        assert_eq!(*seen.lock().unwrap(), (0..20).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn survives_a_panicking_task() {
        let ui = DedicatedUiThread::spawn("panicky-ui").unwrap();
        let result: Result<(), BridgeError> = run_on_ui(&ui, || panic!("boom")).await;
        assert!(matches!(result, Err(BridgeError::UiThreadUnavailable(_))));
        assert_eq!(run_on_ui(&ui, || 7).await.unwrap(), 7);
    }
}
