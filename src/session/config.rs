// ABOUTME: Session configuration with builder-style construction
// ABOUTME: Device identity, SIM secrets, protocol/receive-mode selection and timing knobs

use std::time::Duration;

use crate::handler::{Protocol, RetryPolicy};
use crate::message::MessageClass;

/// How the session learns about new incoming messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveMode {
    /// The caller polls with `read_messages` itself.
    Sync,
    /// The device raises unsolicited `+CMTI` indications; the receive worker
    /// reads on each one.
    AsyncCmti,
    /// The receive worker polls the device on a timer.
    AsyncPoll,
}

/// Configuration for an SMS session.
///
/// ```
/// use smsmodem::session::SessionConfig;
///
/// let config = SessionConfig::new("Wavecom", "M1306B")
///     .with_sim_pin("0000")
///     .with_keep_alive_interval(std::time::Duration::from_secs(60));
/// ```
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Manufacturer reported for (or known about) the device; drives dialect
    /// resolution.
    pub manufacturer: String,
    /// Model, likewise.
    pub model: String,
    /// Explicit dialect alias overriding manufacturer/model resolution.
    pub handler_alias: String,
    /// Service-centre number. Normally left empty so the device takes the
    /// one stored on its SIM.
    pub smsc_number: String,
    /// PIN submitted when the SIM asks for one.
    pub sim_pin: Option<String>,
    /// Second PIN, unlocking advanced SIM features on some devices.
    pub sim_pin2: Option<String>,
    /// Fail the connect when the SIM asks for PIN2 and none is configured.
    /// When false the request is logged and ignored.
    pub fail_on_missing_pin2: bool,
    /// Protocol override; the dialect's preference applies when unset.
    pub protocol: Option<Protocol>,
    pub receive_mode: ReceiveMode,
    /// How often the receive worker wakes when nothing nudges it.
    pub async_poll_interval: Duration,
    /// Spacing of keep-alive pulses on the idle link.
    pub keep_alive_interval: Duration,
    /// Which message class the receive worker reads.
    pub async_recv_class: MessageClass,
    /// AT round-trip retry policy.
    pub retry: RetryPolicy,
    /// Storage locations override for devices that misreport their own.
    pub storage_locations: Option<String>,
}

impl SessionConfig {
    pub fn new(manufacturer: impl Into<String>, model: impl Into<String>) -> Self {
        SessionConfig {
            manufacturer: manufacturer.into(),
            model: model.into(),
            handler_alias: String::new(),
            smsc_number: String::new(),
            sim_pin: None,
            sim_pin2: None,
            fail_on_missing_pin2: false,
            protocol: None,
            receive_mode: ReceiveMode::Sync,
            async_poll_interval: Duration::from_secs(10),
            keep_alive_interval: Duration::from_secs(30),
            async_recv_class: MessageClass::All,
            retry: RetryPolicy::default(),
            storage_locations: None,
        }
    }

    /// Forces a specific dialect instead of resolving one from the device
    /// identity.
    pub fn with_handler_alias(mut self, alias: impl Into<String>) -> Self {
        self.handler_alias = alias.into();
        self
    }

    /// Sets the service-centre number. Needed in rare cases only; normally
    /// the device determines it from the SIM.
    pub fn with_smsc_number(mut self, smsc: impl Into<String>) -> Self {
        self.smsc_number = smsc.into();
        self
    }

    pub fn with_sim_pin(mut self, pin: impl Into<String>) -> Self {
        self.sim_pin = Some(pin.into());
        self
    }

    pub fn with_sim_pin2(mut self, pin2: impl Into<String>) -> Self {
        self.sim_pin2 = Some(pin2.into());
        self
    }

    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = Some(protocol);
        self
    }

    pub fn with_receive_mode(mut self, mode: ReceiveMode) -> Self {
        self.receive_mode = mode;
        self
    }

    pub fn with_async_poll_interval(mut self, interval: Duration) -> Self {
        self.async_poll_interval = interval;
        self
    }

    pub fn with_keep_alive_interval(mut self, interval: Duration) -> Self {
        self.keep_alive_interval = interval;
        self
    }

    pub fn with_async_recv_class(mut self, class: MessageClass) -> Self {
        self.async_recv_class = class;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Overrides the storage locations read by the message loop, e.g.
    /// `"SMME"` for SIM plus device memory.
    pub fn with_storage_locations(mut self, locations: impl Into<String>) -> Self {
        self.storage_locations = Some(locations.into());
        self
    }
}
