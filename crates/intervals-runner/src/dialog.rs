//! Dialog visibility that follows a boolean source

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// An open/closed flag mirroring a watched boolean.
///
/// Starts closed; only changes published after creation are mirrored.
pub struct Dialog {
    is_open: watch::Receiver<bool>,
    task: JoinHandle<()>,
}

/// Mirror `source` into a dialog flag. Must be called within a tokio runtime.
pub fn use_dialog(mut source: watch::Receiver<bool>) -> Dialog {
    let (open_tx, is_open) = watch::channel(false);

    let task = tokio::spawn(async move {
        while source.changed().await.is_ok() {
            let value = *source.borrow_and_update();
            open_tx.send_if_modified(|open| {
                let changed = *open != value;
                *open = value;
                changed
            });
        }
    });

    Dialog { is_open, task }
}

impl Dialog {
    pub fn is_open(&self) -> bool {
        *self.is_open.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.is_open.clone()
    }
}

impl Drop for Dialog {
    fn drop(&mut self) {
        self.task.abort();
    }
}
