// ABOUTME: Background workers - the receive loop and the keep-alive pulse
// ABOUTME: Cancellable tasks with explicit stop flags and wakeable waits

use std::sync::atomic::Ordering;

use tracing::{debug, error, info, warn};

use crate::driver::{MonitorState, SerialDriver};
use crate::handler::HandlerError;
use crate::session::{ReceiveMode, SessionInner};

impl<D: SerialDriver> SessionInner<D> {
    fn receive_mode_now(&self) -> ReceiveMode {
        match self.receive_mode.load(Ordering::SeqCst) {
            1 => ReceiveMode::AsyncCmti,
            2 => ReceiveMode::AsyncPoll,
            _ => ReceiveMode::Sync,
        }
    }

    /// The receive loop. Waits on the new-message monitor (bounded by the
    /// poll interval), reads all pending messages and dispatches them to
    /// the listener; consumed messages are deleted from the device.
    /// Failures inside one round are logged and the loop continues.
    pub(crate) async fn run_receive_loop(&self) {
        loop {
            let state = tokio::select! {
                _ = self.stop_notify.notified() => {
                    if self.stopping.load(Ordering::SeqCst) {
                        break;
                    }
                    continue;
                }
                state = self.monitor.wait_event(self.config.async_poll_interval) => state,
            };
            if self.stopping.load(Ordering::SeqCst) {
                break;
            }
            let mode = self.receive_mode_now();
            if !self.connected.load(Ordering::SeqCst)
                || !matches!(mode, ReceiveMode::AsyncCmti | ReceiveMode::AsyncPoll)
            {
                continue;
            }

            // A data wakeup with nothing actually buffered (and no CMTI
            // racing in behind it) is a spurious one.
            if state == MonitorState::Data {
                let has_data = self.handler.lock().await.data_available();
                if !has_data && self.monitor.state() != MonitorState::Cmti {
                    continue;
                }
            }

            self.monitor.reset();
            match self.read_messages(self.config.async_recv_class).await {
                Ok(messages) => {
                    for message in messages {
                        let consumed = {
                            let listener = self.listener.lock().expect("listener poisoned");
                            match listener.as_ref() {
                                Some(callback) => callback(&message),
                                None => false,
                            }
                        };
                        if consumed {
                            if let Err(e) = self.delete_message(&message).await {
                                error!(error = %e, "failed to delete consumed message");
                            }
                        }
                    }
                }
                Err(e) => error!(error = %e, "unexpected error on receive worker"),
            }
        }
        debug!("receive worker terminated");
        self.receive_stopped.store(true, Ordering::SeqCst);
    }

    /// The keep-alive loop. Pulses the device with a liveness probe every
    /// interval; an I/O failure on the link terminates both the loop and
    /// the session.
    pub(crate) async fn run_keep_alive_loop(&self) {
        loop {
            tokio::select! {
                _ = self.stop_notify.notified() => {}
                _ = tokio::time::sleep(self.config.keep_alive_interval) => {}
            }
            if self.stopping.load(Ordering::SeqCst) {
                break;
            }
            if !self.connected.load(Ordering::SeqCst) {
                continue;
            }
            info!("keep-alive");
            let result = {
                let mut handler = self.handler.lock().await;
                handler.is_alive().await
            };
            match result {
                Ok(alive) => {
                    if !alive {
                        warn!("keep-alive went unanswered");
                    }
                }
                Err(HandlerError::Io(e)) => {
                    warn!(error = %e, "keep-alive failed; tearing the session down");
                    self.keep_alive_stopped.store(true, Ordering::SeqCst);
                    if let Err(e) = self.disconnect().await {
                        info!(error = %e, "disconnect after keep-alive failure");
                    }
                    return;
                }
                Err(e) => warn!(error = %e, "keep-alive error"),
            }
        }
        debug!("keep-alive worker terminated");
        self.keep_alive_stopped.store(true, Ordering::SeqCst);
    }
}
