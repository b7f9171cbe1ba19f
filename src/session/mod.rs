// ABOUTME: The modem session controller - connect flow, PIN handling, send/read/delete
// ABOUTME: Owns the serial link; all handler traffic serializes on one session mutex

pub mod config;
pub mod error;
pub mod info;
mod text;
mod workers;

pub use config::{ReceiveMode, SessionConfig};
pub use error::{RegistrationError, SessionError, SessionResult};
pub use info::{DeviceInfo, TrafficStats};

use std::sync::atomic::{AtomicBool, AtomicU16, AtomicU8, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard, Notify};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::driver::{NewMessageMonitor, SerialDriver};
use crate::handler::{
    self, dialect, AtHandler, HandlerError, Protocol, SendOutcome,
};
use crate::message::{MessageClass, OutgoingMessage, ReceivedMessage};
use crate::multipart::Reassembler;
use crate::pdu::deliver;
use crate::response;

/// Budget for winding background workers down during disconnect.
const DISCONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Polling step while waiting for workers to stop.
const DISCONNECT_WAIT_STEP: Duration = Duration::from_millis(100);

/// Callback invoked on the receive worker for every complete message.
/// Returning `true` consumes the message: the session deletes it (and every
/// fragment of a reassembled multipart) from device memory.
pub type MessageListener = Box<dyn Fn(&ReceivedMessage) -> bool + Send + Sync>;

/// An SMS session over one GSM modem.
///
/// Cheap to clone; clones share the same underlying session. The serial
/// line is owned exclusively and every handler interaction holds the
/// session mutex, so sends, reads, keep-alive pulses and deletes never
/// interleave on the wire.
pub struct SmsSession<D: SerialDriver> {
    inner: Arc<SessionInner<D>>,
}

impl<D: SerialDriver> Clone for SmsSession<D> {
    fn clone(&self) -> Self {
        SmsSession {
            inner: self.inner.clone(),
        }
    }
}

pub(crate) struct SessionInner<D: SerialDriver> {
    /// The session mutex. Held for the full duration of any handler call.
    pub(crate) handler: Mutex<AtHandler<D>>,
    pub(crate) dialect: &'static handler::Dialect,
    pub(crate) config: SessionConfig,
    pub(crate) protocol: Protocol,
    pub(crate) connected: AtomicBool,
    pub(crate) receive_mode: AtomicU8,
    pub(crate) monitor: Arc<NewMessageMonitor>,
    pub(crate) reassembler: StdMutex<Reassembler>,
    /// Rolling concatenation reference; advanced once per outgoing message.
    out_mp_ref: AtomicU16,
    pub(crate) device_info: StdMutex<DeviceInfo>,
    pub(crate) listener: StdMutex<Option<MessageListener>>,
    pub(crate) stopping: AtomicBool,
    pub(crate) stop_notify: Notify,
    pub(crate) receive_stopped: AtomicBool,
    pub(crate) keep_alive_stopped: AtomicBool,
    workers: StdMutex<Workers>,
}

#[derive(Default)]
struct Workers {
    receive: Option<JoinHandle<()>>,
    keep_alive: Option<JoinHandle<()>>,
}

impl<D: SerialDriver> SmsSession<D> {
    /// Creates a session over `driver`, resolving the AT dialect from the
    /// configured device identity. Nothing touches the port until
    /// [`connect`](Self::connect).
    pub fn new(driver: D, config: SessionConfig) -> Self {
        let dialect = dialect::resolve(
            &config.manufacturer,
            &config.model,
            &config.handler_alias,
        );
        let protocol = config.protocol.unwrap_or(dialect.preferred_protocol);
        let handler = AtHandler::new(
            driver,
            dialect,
            config.retry.clone(),
            config.storage_locations.clone(),
        );
        info!(port = handler.port_name(), dialect = dialect.name, "session created");
        let receive_mode = config.receive_mode;
        SmsSession {
            inner: Arc::new(SessionInner {
                handler: Mutex::new(handler),
                dialect,
                config,
                protocol,
                connected: AtomicBool::new(false),
                receive_mode: AtomicU8::new(receive_mode as u8),
                monitor: Arc::new(NewMessageMonitor::new()),
                reassembler: StdMutex::new(Reassembler::new()),
                out_mp_ref: AtomicU16::new(rand::random()),
                device_info: StdMutex::new(DeviceInfo::default()),
                listener: StdMutex::new(None),
                stopping: AtomicBool::new(false),
                stop_notify: Notify::new(),
                receive_stopped: AtomicBool::new(true),
                keep_alive_stopped: AtomicBool::new(true),
                workers: StdMutex::new(Workers::default()),
            }),
        }
    }

    /// The "theoretical" connection status - the flag, not a live probe of
    /// the device.
    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::SeqCst)
    }

    /// Snapshot of the device information gathered so far.
    pub fn device_info(&self) -> DeviceInfo {
        self.inner.device_info.lock().expect("device info poisoned").clone()
    }

    pub fn protocol(&self) -> Protocol {
        self.inner.protocol
    }

    /// Installs the message listener dispatched on the receive worker.
    pub fn set_message_listener(&self, listener: MessageListener) {
        *self.inner.listener.lock().expect("listener poisoned") = Some(listener);
    }

    pub fn supports_receive(&self) -> bool {
        self.dialect().supports_receive
    }

    pub fn supports_binary(&self) -> bool {
        self.dialect().supports_binary
    }

    pub fn supports_ucs2(&self) -> bool {
        self.dialect().supports_ucs2
    }

    pub fn supports_stk(&self) -> bool {
        self.dialect().supports_stk
    }

    pub fn dialect_name(&self) -> &'static str {
        self.dialect().name
    }

    fn dialect(&self) -> &'static handler::Dialect {
        self.inner.dialect
    }

    /// Connects to the GSM modem: opens the serial link, authenticates
    /// against the SIM, waits for network registration, selects the
    /// protocol, applies the receive mode and starts the background
    /// workers.
    ///
    /// Every failure on the way funnels through an internal disconnect
    /// before it propagates, so a failed connect never leaks a half-open
    /// port or a running worker.
    pub async fn connect(&self) -> SessionResult<()> {
        if self.is_connected() {
            return Err(SessionError::AlreadyConnected);
        }
        let mut guard = self.inner.handler.lock().await;
        match self.connect_locked(&mut guard).await {
            Ok(()) => {
                drop(guard);
                self.spawn_workers();
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "connect failed; disconnecting");
                let _ = guard.close().await;
                self.inner.connected.store(false, Ordering::SeqCst);
                Err(e)
            }
        }
    }

    async fn connect_locked(
        &self,
        handler: &mut MutexGuard<'_, AtHandler<D>>,
    ) -> SessionResult<()> {
        let inner = &self.inner;
        handler.open().await.map_err(HandlerError::from)?;
        inner.connected.store(true, Ordering::SeqCst);

        handler.sync().await?;
        handler.empty_buffer().await.map_err(HandlerError::from)?;
        handler.reset().await?;
        handler.set_monitor(inner.monitor.clone());
        inner.monitor.reset();

        if !handler.is_alive().await? {
            return Err(SessionError::NotConnected);
        }

        // SIM authentication. The device may chain PIN, PIN2 and PUK
        // requests; each answer changes what it asks for next.
        let mut pin_state = handler.pin_state().await?;
        if handler::is_waiting_for_pin(&pin_state) {
            let pin = inner.config.sim_pin.as_deref().ok_or(SessionError::NoPin)?;
            if !handler.enter_pin(pin).await? {
                return Err(SessionError::InvalidPin);
            }
            pin_state = handler.pin_state().await?;
        }
        if handler::is_waiting_for_pin2(&pin_state) {
            match inner.config.sim_pin2.as_deref() {
                Some(pin2) => {
                    if !handler.enter_pin(pin2).await? {
                        return Err(SessionError::InvalidPin2);
                    }
                }
                None if inner.config.fail_on_missing_pin2 => {
                    return Err(SessionError::NoPin2);
                }
                None => warn!("device asks for SIM PIN2 but none is configured; continuing"),
            }
            pin_state = handler.pin_state().await?;
        }
        if handler::is_waiting_for_puk(&pin_state) {
            return Err(SessionError::PukRequired);
        }

        handler.init().await?;
        handler.echo_off().await?;
        if !self.wait_for_network_registration(handler).await? {
            warn!("network registration reported an error response; continuing");
        }
        handler.set_verbose_errors().await?;

        if handler.storage_locations.is_empty() {
            handler.discover_storage_locations().await?;
        }
        info!(locations = %handler.storage_locations, "storage locations found");

        match inner.protocol {
            Protocol::Pdu => {
                info!("using PDU protocol");
                if !handler.set_pdu_mode().await? {
                    return Err(SessionError::NoPduSupport);
                }
            }
            Protocol::Text => {
                info!("using TEXT protocol");
                if !handler.set_text_mode().await? {
                    return Err(SessionError::NoTextSupport);
                }
            }
        }

        self.apply_receive_mode(handler, self.receive_mode()).await?;
        self.refresh_device_info_locked(handler).await?;
        Ok(())
    }

    /// Repeatedly queries registration until the device reaches the home
    /// network or roaming. `Ok(false)` means the device answered with an
    /// error response; searching retries after a second.
    async fn wait_for_network_registration(
        &self,
        handler: &mut MutexGuard<'_, AtHandler<D>>,
    ) -> SessionResult<bool> {
        loop {
            let raw = handler.network_registration().await?;
            debug!(response = raw.trim(), "registration response");
            let Some(state) = response::parse_registration(&raw) else {
                return Ok(false);
            };
            match state {
                response::NetworkRegistration::Home => {
                    info!("registered to home network");
                    return Ok(true);
                }
                response::NetworkRegistration::Roaming => {
                    info!("registered to foreign network (roaming)");
                    return Ok(true);
                }
                response::NetworkRegistration::Searching => {
                    warn!("not registered yet, searching for network");
                    sleep(Duration::from_secs(1)).await;
                }
                response::NetworkRegistration::Disabled => {
                    return Err(RegistrationError::AutoRegistrationDisabled.into());
                }
                response::NetworkRegistration::Denied => {
                    return Err(RegistrationError::Denied.into());
                }
                response::NetworkRegistration::Unknown => {
                    return Err(RegistrationError::Unknown.into());
                }
                response::NetworkRegistration::Invalid => {
                    return Err(RegistrationError::InvalidResponse.into());
                }
            }
        }
    }

    fn spawn_workers(&self) {
        let mut workers = self.inner.workers.lock().expect("workers poisoned");
        self.inner.stopping.store(false, Ordering::SeqCst);
        self.inner.receive_stopped.store(false, Ordering::SeqCst);
        self.inner.keep_alive_stopped.store(false, Ordering::SeqCst);
        let receive = {
            let inner = self.inner.clone();
            tokio::spawn(async move { inner.run_receive_loop().await })
        };
        let keep_alive = {
            let inner = self.inner.clone();
            tokio::spawn(async move { inner.run_keep_alive_loop().await })
        };
        workers.receive = Some(receive);
        workers.keep_alive = Some(keep_alive);
    }

    /// Disconnects from the modem: stops both background workers, closes
    /// the serial link and clears the connected flag. Idempotent and best
    /// effort - it tries to tear everything down even when the session was
    /// never fully up.
    pub async fn disconnect(&self) -> SessionResult<()> {
        self.inner.disconnect().await
    }

    /// Current receive mode.
    pub fn receive_mode(&self) -> ReceiveMode {
        match self.inner.receive_mode.load(Ordering::SeqCst) {
            1 => ReceiveMode::AsyncCmti,
            2 => ReceiveMode::AsyncPoll,
            _ => ReceiveMode::Sync,
        }
    }

    /// Changes the receive mode, toggling unsolicited indications on the
    /// device when connected.
    pub async fn set_receive_mode(&self, mode: ReceiveMode) -> SessionResult<()> {
        self.inner.receive_mode.store(mode as u8, Ordering::SeqCst);
        if self.is_connected() {
            let mut handler = self.inner.handler.lock().await;
            self.apply_receive_mode(&mut handler, mode).await?;
        }
        Ok(())
    }

    async fn apply_receive_mode(
        &self,
        handler: &mut MutexGuard<'_, AtHandler<D>>,
        mode: ReceiveMode,
    ) -> SessionResult<()> {
        if mode == ReceiveMode::AsyncCmti {
            if !handler.enable_indications().await? {
                warn!("could not enable CMTI indications, continuing without them");
            }
        } else if !handler.disable_indications().await? {
            warn!("could not disable CMTI indications, continuing");
        }
        Ok(())
    }

    /// Sends one message, fragmenting into concatenated parts as needed.
    ///
    /// On success the message's reference number and dispatch timestamp are
    /// set. A device rejection abandons the remaining parts and leaves the
    /// reference negative; only link-level failures surface as errors (and
    /// tear the session down).
    pub async fn send_message(&self, message: &mut OutgoingMessage) -> SessionResult<()> {
        if !self.is_connected() {
            return Err(SessionError::NotConnected);
        }
        match self.inner.protocol {
            Protocol::Pdu => self.send_message_pdu(message).await,
            Protocol::Text => self.send_message_text(message).await,
        }
    }

    /// Sends a batch of messages, nudging the device to hold the GSM link
    /// open first.
    pub async fn send_messages(&self, messages: &mut [OutgoingMessage]) -> SessionResult<()> {
        if !self.is_connected() {
            return Err(SessionError::NotConnected);
        }
        self.keep_gsm_link_open().await?;
        for message in messages {
            self.send_message(message).await?;
        }
        Ok(())
    }

    async fn send_message_pdu(&self, message: &mut OutgoingMessage) -> SessionResult<()> {
        let inner = &self.inner;
        let mp_ref = inner.out_mp_ref.load(Ordering::SeqCst);
        let smsc = message
            .smsc
            .clone()
            .unwrap_or_else(|| inner.config.smsc_number.clone());
        message.set_concat_ref(mp_ref);
        let pdus = message.generate_pdus(&smsc, mp_ref)?;

        for pdu in &pdus {
            // The modem wants the TPDU length, which excludes the encoded
            // SMSC prefix at the front of the hex string.
            let pdu_len = pdu.len() / 2 - encoded_smsc_octets(&smsc);
            let outcome = {
                let mut handler = inner.handler.lock().await;
                handler.send_message_pdu(pdu_len, pdu).await
            };
            match outcome {
                Ok(SendOutcome::Accepted(ref_no)) => {
                    message.set_ref_no(ref_no);
                    message.mark_dispatched();
                    inner.device_info.lock().expect("device info poisoned").stats.total_out += 1;
                }
                Ok(SendOutcome::Rejected) => {
                    message.set_ref_no(-1);
                    break;
                }
                Err(e) => {
                    // Link-level failure: tear the session down and abort
                    // the batch.
                    message.set_ref_no(-2);
                    let _ = inner.disconnect().await;
                    return Err(e.into());
                }
            }
        }

        // Advance once per message, never per part, so the next message's
        // fragments cannot collide with this one's.
        inner.out_mp_ref.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn send_message_text(&self, message: &mut OutgoingMessage) -> SessionResult<()> {
        let Some(text) = message.text_body() else {
            // Binary payloads have no TEXT-mode representation.
            message.set_ref_no(-1);
            return Ok(());
        };
        let septets = crate::pdu::alphabet::string_to_septets(text)?;
        let hex_body = crate::pdu::hex::encode(&septets);
        let recipient = message.recipient.clone();
        let outcome = {
            let mut handler = self.inner.handler.lock().await;
            handler.send_message_text(&recipient, &hex_body).await
        };
        match outcome {
            Ok(SendOutcome::Accepted(ref_no)) => {
                message.set_ref_no(ref_no);
                message.mark_dispatched();
                self.inner
                    .device_info
                    .lock()
                    .expect("device info poisoned")
                    .stats
                    .total_out += 1;
                Ok(())
            }
            Ok(SendOutcome::Rejected) => {
                message.set_ref_no(-1);
                Ok(())
            }
            Err(e) => {
                message.set_ref_no(-2);
                let _ = self.inner.disconnect().await;
                Err(e.into())
            }
        }
    }

    /// Reads all stored messages of `class` from every storage location,
    /// reassembling multipart fragments. Fragments of incomplete messages
    /// stay buffered until their siblings arrive on a later read.
    pub async fn read_messages(&self, class: MessageClass) -> SessionResult<Vec<ReceivedMessage>> {
        self.inner.read_messages(class).await
    }

    /// Deletes a previously read message from device memory. A reassembled
    /// multipart message deletes every one of its fragments. Irreversible.
    pub async fn delete_message(&self, message: &ReceivedMessage) -> SessionResult<()> {
        self.inner.delete_message(message).await
    }

    /// Nudges the device to keep the GSM link open ahead of a send batch.
    pub async fn keep_gsm_link_open(&self) -> SessionResult<()> {
        let mut handler = self.inner.handler.lock().await;
        handler.keep_link_open().await?;
        Ok(())
    }

    /// Refreshes device information (manufacturer, signal level, battery and
    /// friends). Called automatically on connect; call it again whenever
    /// fresh values are needed.
    pub async fn refresh_device_info(&self) -> SessionResult<()> {
        if !self.is_connected() {
            return Err(SessionError::NotConnected);
        }
        let mut handler = self.inner.handler.lock().await;
        self.refresh_device_info_locked(&mut handler).await
    }

    async fn refresh_device_info_locked(
        &self,
        handler: &mut MutexGuard<'_, AtHandler<D>>,
    ) -> SessionResult<()> {
        let mut update = self.device_info();
        if update.manufacturer.is_empty() {
            update.manufacturer = response::parse_manufacturer(&handler.get_manufacturer().await?);
        }
        if update.model.is_empty() {
            update.model = response::parse_model(&handler.get_model().await?);
        }
        if update.serial_no.is_empty() {
            update.serial_no = response::parse_serial_no(&handler.get_serial_no().await?);
        }
        if update.imsi.is_empty() {
            update.imsi = response::parse_imsi(&handler.get_imsi().await?);
        }
        if update.sw_version.is_empty() {
            update.sw_version = response::parse_sw_version(&handler.get_sw_version().await?);
        }
        update.gprs_attached = response::parse_gprs_attached(&handler.get_gprs_status().await?);
        update.battery_level = response::parse_battery_level(&handler.get_battery_level().await?);
        update.signal_level = response::parse_signal_level(&handler.get_signal_level().await?);

        let mut device_info = self.inner.device_info.lock().expect("device info poisoned");
        update.stats = device_info.stats;
        *device_info = update;
        Ok(())
    }

    /// The subscriber number reported by the device.
    pub async fn msisdn(&self) -> SessionResult<String> {
        if !self.is_connected() {
            return Err(SessionError::NotConnected);
        }
        let mut handler = self.inner.handler.lock().await;
        Ok(response::parse_msisdn(&handler.get_msisdn().await?))
    }
}

impl<D: SerialDriver> SessionInner<D> {
    pub(crate) async fn disconnect(&self) -> SessionResult<()> {
        if !self.connected.load(Ordering::SeqCst) {
            warn!("not connected; attempting disconnection anyway");
        }
        self.stopping.store(true, Ordering::SeqCst);
        self.stop_notify.notify_waiters();
        self.monitor.notify(crate::driver::MonitorState::Data);

        let mut budget = DISCONNECT_TIMEOUT;
        while !(self.receive_stopped.load(Ordering::SeqCst)
            && self.keep_alive_stopped.load(Ordering::SeqCst))
            && budget > Duration::ZERO
        {
            sleep(DISCONNECT_WAIT_STEP).await;
            budget = budget.saturating_sub(DISCONNECT_WAIT_STEP);
        }

        {
            let mut handler = self.handler.lock().await;
            if let Err(e) = handler.close().await {
                warn!(error = %e, "error closing serial driver");
            }
        }

        // Join the receive worker; the keep-alive worker is deliberately not
        // joined, as it may be blocked on an unresponsive device.
        let (receive, _keep_alive) = {
            let mut workers = self.workers.lock().expect("workers poisoned");
            (workers.receive.take(), workers.keep_alive.take())
        };
        if let Some(handle) = receive {
            if !self.receive_stopped.load(Ordering::SeqCst) {
                handle.abort();
            }
            let _ = handle.await;
        }

        self.connected.store(false, Ordering::SeqCst);
        info!("disconnected");
        Ok(())
    }

    pub(crate) async fn read_messages(
        &self,
        class: MessageClass,
    ) -> SessionResult<Vec<ReceivedMessage>> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(SessionError::NotConnected);
        }
        let mut out = Vec::new();
        {
            let mut handler = self.handler.lock().await;
            let locations = handler.storage_locations.clone();
            debug!(locations = %locations, "checking storage locations");
            let mut start = 0;
            while start + 2 <= locations.len() {
                let location = &locations[start..start + 2];
                start += 2;
                if !handler.set_memory_location(location).await? {
                    continue;
                }
                let listing = handler.list_messages(class, self.protocol).await?;
                match self.protocol {
                    Protocol::Pdu => self.collect_pdu_listing(&listing, location, &mut out),
                    Protocol::Text => {
                        let parsed = text::parse_text_listing(&listing, location);
                        let mut device_info =
                            self.device_info.lock().expect("device info poisoned");
                        device_info.stats.total_in += parsed.len() as u64;
                        out.extend(parsed);
                    }
                }
            }
        }

        // Emit any multipart messages this read completed.
        let assembled = {
            let mut reassembler = self.reassembler.lock().expect("reassembler poisoned");
            reassembler.drain_complete()
        };
        if !assembled.is_empty() {
            let mut device_info = self.device_info.lock().expect("device info poisoned");
            device_info.stats.total_in += assembled.len() as u64;
            out.extend(assembled.into_iter().map(ReceivedMessage::Sms));
        }
        Ok(out)
    }

    /// Walks (header, PDU) line pairs of a PDU-mode listing. Undecodable
    /// PDUs are logged and skipped; the rest of the batch proceeds.
    fn collect_pdu_listing(&self, listing: &str, location: &str, out: &mut Vec<ReceivedMessage>) {
        let mut lines = listing.lines();
        while let Some(header) = response::next_useful_line(&mut lines) {
            if header.eq_ignore_ascii_case("OK") {
                break;
            }
            let Some(mem_index) = response::mem_index_of_line(header) else {
                warn!(line = header, "unparseable listing line; skipping");
                continue;
            };
            let Some(pdu) = response::next_useful_line(&mut lines) else {
                warn!("listing ended without a PDU line");
                break;
            };
            debug!(mem_index, pdu, "read PDU");
            match deliver::decode_incoming(pdu, mem_index, location) {
                Ok(ReceivedMessage::Sms(msg)) if msg.is_multipart() => {
                    self.reassembler
                        .lock()
                        .expect("reassembler poisoned")
                        .add(msg);
                }
                Ok(message) => {
                    self.device_info
                        .lock()
                        .expect("device info poisoned")
                        .stats
                        .total_in += 1;
                    out.push(message);
                }
                Err(e) => warn!(error = %e, pdu, "problem processing PDU; skipping"),
            }
        }
    }

    pub(crate) async fn delete_message(&self, message: &ReceivedMessage) -> SessionResult<()> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(SessionError::NotConnected);
        }
        let mut handler = self.handler.lock().await;
        let mem_index = message.mem_index();
        if mem_index >= 0 {
            handler
                .delete_message(mem_index, message.mem_location())
                .await?;
        } else {
            for &index in message.mp_mem_indices() {
                handler
                    .delete_message(index as i32, message.mem_location())
                    .await?;
            }
        }
        Ok(())
    }
}

/// Octets the encoded SMSC field occupies at the front of a generated PDU:
/// one for the zero length byte when no number is set, otherwise the length
/// byte, the type-of-address and the packed digits.
fn encoded_smsc_octets(smsc: &str) -> usize {
    if smsc.is_empty() {
        1
    } else {
        let digits = smsc.len() - usize::from(smsc.starts_with('+'));
        2 + (digits + 1) / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdu::address::encode_address;

    #[test]
    fn smsc_octet_count_matches_encoder() {
        for smsc in ["", "07890123456", "0789012345", "+447890123456", "+44789012345"] {
            assert_eq!(
                encoded_smsc_octets(smsc),
                encode_address(smsc, true).unwrap().len(),
                "disagreement for {smsc:?}"
            );
        }
    }

    #[test]
    fn cmgs_length_excludes_smsc_prefix() {
        // An SMSC of +447890123456 occupies 8 octets; the 27-octet PDU is
        // announced to the device as 19.
        let pdu = "079144870921436531000AA160480173770000FF06E3777DFCAE03";
        assert_eq!(pdu.len() / 2 - encoded_smsc_octets("+447890123456"), 19);
    }
}
