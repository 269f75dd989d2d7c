use tokio::sync::watch;

/// Fires its paired `CancelSignal` when cancelled or dropped.
#[derive(Debug)]
pub struct CancelGuard {
    tx: watch::Sender<bool>,
}

/// Observed by long-running work (the run polling loop) to stop early.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

pub fn cancel_pair() -> (CancelGuard, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelGuard { tx }, CancelSignal { rx })
}

impl CancelGuard {
    pub fn cancel(&self) {
        //no receiver left is fine, nobody is waiting anymore
        let _ = self.tx.send(true);
    }
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl CancelSignal {
    /// A signal nobody can fire.
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        CancelSignal { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the guard fired. Pending forever for `never()`.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                //sender gone without firing
                std::future::pending::<()>().await;
            }
        }
    }
}
