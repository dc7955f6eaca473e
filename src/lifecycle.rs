use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;

/// Serving side of the one-shot readiness signal.
pub struct ReadySignal(oneshot::Sender<()>);

impl ReadySignal {
    /// Tell the console the server is accepting connections. Consumes the
    /// signal: readiness is delivered at most once.
    pub fn fire(self) {
        let _ = self.0.send(());
    }
}

/// Console side of the readiness signal.
pub struct ReadyGate(oneshot::Receiver<()>);

impl ReadyGate {
    /// Block until the server is ready. Returns false if the serving side
    /// went away without ever becoming ready.
    pub fn wait(self) -> bool {
        self.0.blocking_recv().is_ok()
    }
}

pub fn ready_channel() -> (ReadySignal, ReadyGate) {
    let (tx, rx) = oneshot::channel();
    (ReadySignal(tx), ReadyGate(rx))
}

/// Requests process shutdown. Cloneable so the console, the signal watcher,
/// and anything else can race: the signal is delivered exactly once no
/// matter how many triggers fire.
#[derive(Clone)]
pub struct DoneHandle {
    tx: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}

impl DoneHandle {
    /// Returns true for the one trigger that actually delivered the signal.
    pub fn signal(&self) -> bool {
        match self.tx.lock().unwrap().take() {
            Some(tx) => tx.send(()).is_ok(),
            None => false,
        }
    }
}

/// Serving side: resolves once Done is signaled, or once every handle is
/// gone (a dead console counts as a shutdown request).
pub struct DoneGate(oneshot::Receiver<()>);

impl DoneGate {
    pub async fn wait(&mut self) {
        let _ = (&mut self.0).await;
    }

    /// Non-blocking probe: has Done been delivered?
    pub fn try_wait(&mut self) -> bool {
        self.0.try_recv().is_ok()
    }

    /// Block the current thread until Done. Returns false if every handle
    /// was dropped without signaling.
    pub fn blocking_wait(self) -> bool {
        self.0.blocking_recv().is_ok()
    }
}

pub fn done_channel() -> (DoneHandle, DoneGate) {
    let (tx, rx) = oneshot::channel();
    (
        DoneHandle {
            tx: Arc::new(Mutex::new(Some(tx))),
        },
        DoneGate(rx),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_is_delivered_once() {
        let (signal, gate) = ready_channel();
        signal.fire();
        assert!(gate.wait());
    }

    #[test]
    fn dropped_ready_signal_unblocks_the_gate() {
        let (signal, gate) = ready_channel();
        drop(signal);
        assert!(!gate.wait());
    }

    #[test]
    fn done_delivers_exactly_once() {
        let (handle, gate) = done_channel();
        let second = handle.clone();
        assert!(handle.signal());
        assert!(!second.signal());
        assert!(!handle.signal());
        assert!(gate.blocking_wait());
    }

    #[test]
    fn racing_done_triggers_deliver_once() {
        let (handle, gate) = done_channel();
        let handles: Vec<_> = (0..8).map(|_| handle.clone()).collect();
        let delivered: usize = handles
            .into_iter()
            .map(|h| std::thread::spawn(move || h.signal()))
            .collect::<Vec<_>>()
            .into_iter()
            .map(|t| usize::from(t.join().unwrap()))
            .sum();
        assert_eq!(delivered, 1);
        assert!(gate.blocking_wait());
    }

    #[test]
    fn try_wait_reports_pending_and_delivered() {
        let (handle, mut gate) = done_channel();
        assert!(!gate.try_wait());
        handle.signal();
        assert!(gate.try_wait());
    }
}
