// ABOUTME: Contracts the session consumes from the serial layer
// ABOUTME: The serial driver trait and the new-message monitor it signals

use std::future::Future;
use std::io;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

/// What woke a waiter on the [`NewMessageMonitor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MonitorState {
    /// Nothing observed; also the result of a timed-out wait.
    None = 0,
    /// Bytes arrived on the serial buffer.
    Data = 1,
    /// The device raised an unsolicited new-message indication (`+CMTI`).
    Cmti = 2,
}

/// Condition the serial driver raises when buffer activity or a CMTI
/// indication suggests new messages. The receive loop waits on it instead of
/// polling the device blind.
///
/// Raising a state never downgrades one already pending: a CMTI observed
/// while DATA is pending stays CMTI until [`reset`](Self::reset).
#[derive(Debug, Default)]
pub struct NewMessageMonitor {
    state: AtomicU8,
    waiters: Notify,
}

impl NewMessageMonitor {
    pub fn new() -> Self {
        NewMessageMonitor::default()
    }

    /// Raises `state` and wakes any waiter.
    pub fn notify(&self, state: MonitorState) {
        self.state.fetch_max(state as u8, Ordering::SeqCst);
        self.waiters.notify_waiters();
    }

    /// The currently pending state.
    pub fn state(&self) -> MonitorState {
        match self.state.load(Ordering::SeqCst) {
            2 => MonitorState::Cmti,
            1 => MonitorState::Data,
            _ => MonitorState::None,
        }
    }

    /// Clears the pending state.
    pub fn reset(&self) {
        self.state.store(MonitorState::None as u8, Ordering::SeqCst);
    }

    /// Waits until a state is raised or `timeout` elapses, returning the
    /// pending state either way.
    pub async fn wait_event(&self, timeout: Duration) -> MonitorState {
        let notified = self.waiters.notified();
        let current = self.state();
        if current != MonitorState::None {
            return current;
        }
        let _ = tokio::time::timeout(timeout, notified).await;
        self.state()
    }
}

/// The raw serial line under the modem, supplied by the embedding
/// application. The session owns it exclusively; all calls are serialized by
/// the session mutex.
///
/// `read_buffer` returns the accumulated response to the last command - the
/// driver is expected to gather bytes until the device goes quiet or a
/// terminator (`OK`, `ERROR`, `>`) arrives, like a buffered serial
/// implementation naturally does.
pub trait SerialDriver: Send + 'static {
    /// Opens the port.
    fn open(&mut self) -> impl Future<Output = io::Result<()>> + Send;

    /// Closes the port. Best effort; called during teardown.
    fn close(&mut self) -> impl Future<Output = io::Result<()>> + Send;

    /// Writes raw bytes to the device.
    fn send(&mut self, data: &[u8]) -> impl Future<Output = io::Result<()>> + Send;

    /// Reads whatever response the device has produced.
    fn read_buffer(&mut self) -> impl Future<Output = io::Result<String>> + Send;

    /// Discards any pending input, remembering it for
    /// [`last_cleared_buffer`](Self::last_cleared_buffer).
    fn empty_buffer(&mut self) -> impl Future<Output = io::Result<()>> + Send;

    /// The input most recently discarded by [`empty_buffer`](Self::empty_buffer).
    fn last_cleared_buffer(&self) -> String;

    /// True when unread bytes are waiting in the receive buffer.
    fn data_available(&self) -> bool;

    /// Installs the monitor the driver raises on buffer activity and CMTI
    /// indications.
    fn set_monitor(&mut self, monitor: Arc<NewMessageMonitor>);

    /// Name of the underlying port (for logging).
    fn port_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn wait_returns_pending_state_immediately() {
        let monitor = NewMessageMonitor::new();
        monitor.notify(MonitorState::Cmti);
        assert_eq!(
            monitor.wait_event(Duration::from_millis(1)).await,
            MonitorState::Cmti
        );
    }

    #[tokio::test]
    async fn wait_times_out_to_none() {
        let monitor = NewMessageMonitor::new();
        assert_eq!(
            monitor.wait_event(Duration::from_millis(5)).await,
            MonitorState::None
        );
    }

    #[tokio::test]
    async fn notify_wakes_waiter() {
        let monitor = Arc::new(NewMessageMonitor::new());
        let waiter = {
            let monitor = monitor.clone();
            tokio::spawn(async move { monitor.wait_event(Duration::from_secs(5)).await })
        };
        tokio::task::yield_now().await;
        monitor.notify(MonitorState::Data);
        assert_eq!(waiter.await.unwrap(), MonitorState::Data);
    }

    #[test]
    fn cmti_outranks_data() {
        let monitor = NewMessageMonitor::new();
        monitor.notify(MonitorState::Cmti);
        monitor.notify(MonitorState::Data);
        assert_eq!(monitor.state(), MonitorState::Cmti);
        monitor.reset();
        assert_eq!(monitor.state(), MonitorState::None);
    }
}
