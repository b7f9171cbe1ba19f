// ABOUTME: AT command handler - drives the serial line through a vendor dialect
// ABOUTME: Enforces per-command timeouts, no-response retries and CMS-error retries

pub mod dialect;

pub use dialect::Dialect;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use crate::driver::{NewMessageMonitor, SerialDriver};
use crate::message::MessageClass;
use crate::response;

/// Modem message protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// Binary TPDUs over `AT+CMGF=0`. The primary mode.
    Pdu,
    /// Legacy comma-tokenized listings over `AT+CMGF=1`.
    Text,
}

/// SUB character terminating a PDU body after the `>` prompt.
const CTRL_Z: u8 = 0x1A;

/// Retry behavior for AT round-trips.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// How long to wait for any response to a single command.
    pub command_timeout: Duration,
    /// Retries when a command gets no response at all.
    pub retries_no_response: u32,
    /// Spacing between no-response retries.
    pub delay_no_response: Duration,
    /// Retries when a send is answered with a CMS error.
    pub retries_cms_errors: u32,
    /// Spacing between CMS-error retries.
    pub delay_cms_errors: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            command_timeout: Duration::from_secs(30),
            retries_no_response: 5,
            delay_no_response: Duration::from_secs(5),
            retries_cms_errors: 5,
            delay_cms_errors: Duration::from_secs(5),
        }
    }
}

/// Errors from the AT command layer.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The serial link itself failed. Fatal to the session.
    #[error("I/O error on the serial link: {0}")]
    Io(#[from] io::Error),

    /// The device stayed silent through every retry.
    #[error("no response to {command:?} after retries")]
    NoResponse { command: String },

    /// The device answered with an error the operation cannot proceed past.
    #[error("device rejected {command:?}: {response:?}")]
    CommandFailed { command: String, response: String },
}

/// Outcome of handing one PDU to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The device accepted the PDU and assigned this message reference.
    Accepted(i32),
    /// The device refused the PDU past all retries. The message (and its
    /// remaining parts) should be abandoned, but the session survives.
    Rejected,
}

/// True when an `AT+CPIN?` response asks for the SIM PIN.
pub fn is_waiting_for_pin(pin_response: &str) -> bool {
    pin_response.contains("SIM PIN") && !pin_response.contains("SIM PIN2")
}

/// True when an `AT+CPIN?` response asks for the second SIM PIN.
pub fn is_waiting_for_pin2(pin_response: &str) -> bool {
    pin_response.contains("SIM PIN2")
}

/// True when an `AT+CPIN?` response asks for the PUK.
pub fn is_waiting_for_puk(pin_response: &str) -> bool {
    pin_response.contains("SIM PUK")
}

/// Drives a [`SerialDriver`] through the AT dialect of a particular vendor.
///
/// Every operation here is a complete command round-trip; serialization
/// against concurrent use is the session's responsibility.
pub struct AtHandler<D: SerialDriver> {
    driver: D,
    dialect: &'static Dialect,
    retry: RetryPolicy,
    /// Two-letter memory codes read by the message loop, e.g. "SMME".
    pub(crate) storage_locations: String,
}

impl<D: SerialDriver> AtHandler<D> {
    pub fn new(
        driver: D,
        dialect: &'static Dialect,
        retry: RetryPolicy,
        storage_override: Option<String>,
    ) -> Self {
        AtHandler {
            driver,
            dialect,
            retry,
            storage_locations: storage_override
                .unwrap_or_else(|| dialect.default_storage.to_owned()),
        }
    }

    pub fn dialect(&self) -> &'static Dialect {
        self.dialect
    }

    pub fn port_name(&self) -> &str {
        self.driver.port_name()
    }

    pub async fn open(&mut self) -> io::Result<()> {
        self.driver.open().await
    }

    pub async fn close(&mut self) -> io::Result<()> {
        self.driver.close().await
    }

    pub async fn empty_buffer(&mut self) -> io::Result<()> {
        self.driver.empty_buffer().await
    }

    pub fn set_monitor(&mut self, monitor: Arc<NewMessageMonitor>) {
        self.driver.set_monitor(monitor);
    }

    pub fn data_available(&self) -> bool {
        self.driver.data_available()
    }

    /// One command round-trip with the full no-response retry policy.
    async fn send_receive(&mut self, command: &str) -> Result<String, HandlerError> {
        let mut attempt = 0;
        loop {
            debug!(command = command.trim(), attempt, "AT send");
            self.driver.send(command.as_bytes()).await?;
            match timeout(self.retry.command_timeout, self.driver.read_buffer()).await {
                Ok(Ok(resp)) if !resp.trim().is_empty() => {
                    debug!(response = resp.trim(), "AT receive");
                    return Ok(resp);
                }
                Ok(Ok(_)) | Err(_) => {}
                Ok(Err(e)) => return Err(e.into()),
            }
            attempt += 1;
            if attempt > self.retry.retries_no_response {
                return Err(HandlerError::NoResponse {
                    command: command.trim().to_owned(),
                });
            }
            warn!(
                command = command.trim(),
                attempt, "no response; retrying after delay"
            );
            sleep(self.retry.delay_no_response).await;
        }
    }

    /// One command round-trip that must not be answered with an error.
    async fn send_expect_ok(&mut self, command: &str) -> Result<(), HandlerError> {
        let resp = self.send_receive(command).await?;
        if response::is_error(&resp) {
            return Err(HandlerError::CommandFailed {
                command: command.trim().to_owned(),
                response: resp,
            });
        }
        Ok(())
    }

    /// Single read with the command timeout; distinguishes link failure from
    /// plain silence.
    async fn read_response(&mut self) -> Result<Option<String>, HandlerError> {
        match timeout(self.retry.command_timeout, self.driver.read_buffer()).await {
            Ok(Ok(resp)) => Ok(Some(resp)),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Ok(None),
        }
    }

    /// Lines up the command parser: fires a bare `AT` and gives the device a
    /// moment, ignoring whatever comes back.
    pub async fn sync(&mut self) -> Result<(), HandlerError> {
        self.driver.send(b"AT\r").await?;
        sleep(Duration::from_millis(100)).await;
        Ok(())
    }

    pub async fn reset(&mut self) -> Result<(), HandlerError> {
        let _ = self.send_receive(self.dialect.reset_command).await?;
        Ok(())
    }

    /// True when the device answers a bare `AT`. A silent device is not
    /// alive; only a broken link is an error.
    pub async fn is_alive(&mut self) -> Result<bool, HandlerError> {
        self.driver.send(b"AT\r").await?;
        match self.read_response().await? {
            Some(resp) => Ok(!response::is_error(&resp)),
            None => Ok(false),
        }
    }

    pub async fn echo_off(&mut self) -> Result<(), HandlerError> {
        let _ = self.send_receive("ATE0\r").await?;
        Ok(())
    }

    pub async fn set_verbose_errors(&mut self) -> Result<(), HandlerError> {
        let _ = self.send_receive("AT+CMEE=1\r").await?;
        Ok(())
    }

    /// Issues the dialect's extra initialization commands.
    pub async fn init(&mut self) -> Result<(), HandlerError> {
        for command in self.dialect.init_commands {
            let _ = self.send_receive(command).await?;
        }
        Ok(())
    }

    /// Raw `AT+CPIN?` response describing what the SIM is waiting for.
    pub async fn pin_state(&mut self) -> Result<String, HandlerError> {
        self.send_receive("AT+CPIN?\r").await
    }

    pub async fn enter_pin(&mut self, pin: &str) -> Result<bool, HandlerError> {
        let resp = self.send_receive(&format!("AT+CPIN={pin}\r")).await?;
        Ok(!response::is_error(&resp))
    }

    pub async fn network_registration(&mut self) -> Result<String, HandlerError> {
        self.send_receive("AT+CREG?\r").await
    }

    pub async fn set_pdu_mode(&mut self) -> Result<bool, HandlerError> {
        let resp = self.send_receive("AT+CMGF=0\r").await?;
        Ok(!response::is_error(&resp))
    }

    pub async fn set_text_mode(&mut self) -> Result<bool, HandlerError> {
        let resp = self.send_receive("AT+CMGF=1\r").await?;
        Ok(!response::is_error(&resp))
    }

    pub async fn enable_indications(&mut self) -> Result<bool, HandlerError> {
        let resp = self.send_receive(self.dialect.enable_indications).await?;
        Ok(!response::is_error(&resp))
    }

    pub async fn disable_indications(&mut self) -> Result<bool, HandlerError> {
        let resp = self.send_receive(self.dialect.disable_indications).await?;
        Ok(!response::is_error(&resp))
    }

    /// Asks the device which storage locations it has and remembers them.
    pub async fn discover_storage_locations(&mut self) -> Result<(), HandlerError> {
        let resp = self.send_receive("AT+CPMS?\r").await?;
        self.storage_locations = response::parse_storage_locations(&resp);
        Ok(())
    }

    pub async fn set_memory_location(&mut self, location: &str) -> Result<bool, HandlerError> {
        let resp = self
            .send_receive(&format!("AT+CPMS=\"{location}\"\r"))
            .await?;
        Ok(!response::is_error(&resp))
    }

    /// Lists stored messages; returns the raw multi-line response.
    pub async fn list_messages(
        &mut self,
        class: MessageClass,
        protocol: Protocol,
    ) -> Result<String, HandlerError> {
        let command = match protocol {
            Protocol::Pdu => format!("AT+CMGL={}\r", class.pdu_mode_id()),
            Protocol::Text => format!("AT+CMGL=\"{}\"\r", class.text_mode_id()),
        };
        self.send_receive(&command).await
    }

    /// Hands one PDU to the device via `AT+CMGS`, retrying CMS errors per
    /// policy. `pdu_len_octets` excludes the encoded SMSC prefix.
    pub async fn send_message_pdu(
        &mut self,
        pdu_len_octets: usize,
        pdu_hex: &str,
    ) -> Result<SendOutcome, HandlerError> {
        let command = format!("AT+CMGS={pdu_len_octets}\r");
        let mut body = pdu_hex.as_bytes().to_vec();
        body.push(CTRL_Z);

        for attempt in 0..=self.retry.retries_cms_errors {
            if attempt > 0 {
                sleep(self.retry.delay_cms_errors).await;
            }
            self.driver.send(command.as_bytes()).await?;
            match self.read_response().await? {
                Some(prompt) if prompt.contains('>') => {}
                Some(prompt) => {
                    warn!(response = prompt.trim(), "no PDU prompt; retrying");
                    continue;
                }
                None => {
                    warn!("device silent instead of PDU prompt; retrying");
                    continue;
                }
            }

            self.driver.send(&body).await?;
            let Some(resp) = self.read_response().await? else {
                warn!("no response to PDU body; retrying");
                continue;
            };
            if let Some(ref_no) = response::parse_send_ref(&resp) {
                return Ok(SendOutcome::Accepted(ref_no));
            }
            if response::is_cms_error(&resp) {
                warn!(response = resp.trim(), "CMS error on send; retrying");
                continue;
            }
            warn!(response = resp.trim(), "send rejected");
            return Ok(SendOutcome::Rejected);
        }
        Ok(SendOutcome::Rejected)
    }

    /// Sends a TEXT-mode message: recipient in the command, hex-encoded body
    /// after the prompt.
    pub async fn send_message_text(
        &mut self,
        recipient: &str,
        hex_body: &str,
    ) -> Result<SendOutcome, HandlerError> {
        let command = format!("AT+CMGS=\"{recipient}\"\r");
        let mut body = hex_body.as_bytes().to_vec();
        body.push(CTRL_Z);

        for attempt in 0..=self.retry.retries_cms_errors {
            if attempt > 0 {
                sleep(self.retry.delay_cms_errors).await;
            }
            self.driver.send(command.as_bytes()).await?;
            match self.read_response().await? {
                Some(prompt) if prompt.contains('>') => {}
                _ => continue,
            }
            self.driver.send(&body).await?;
            let Some(resp) = self.read_response().await? else {
                continue;
            };
            if let Some(ref_no) = response::parse_send_ref(&resp) {
                return Ok(SendOutcome::Accepted(ref_no));
            }
            if response::is_cms_error(&resp) {
                continue;
            }
            return Ok(SendOutcome::Rejected);
        }
        Ok(SendOutcome::Rejected)
    }

    /// Deletes the message at `index` in `location`. Irreversible.
    pub async fn delete_message(
        &mut self,
        index: i32,
        location: &str,
    ) -> Result<(), HandlerError> {
        self.set_memory_location(location).await?;
        self.send_expect_ok(&format!("AT+CMGD={index}\r")).await
    }

    /// Nudges the device to hold the GSM link open ahead of a send batch,
    /// where the dialect has such a command.
    pub async fn keep_link_open(&mut self) -> Result<(), HandlerError> {
        if !self.dialect.keep_link_open.is_empty() {
            let _ = self.send_receive(self.dialect.keep_link_open).await?;
        }
        Ok(())
    }

    pub async fn get_manufacturer(&mut self) -> Result<String, HandlerError> {
        self.send_receive("AT+CGMI\r").await
    }

    pub async fn get_model(&mut self) -> Result<String, HandlerError> {
        self.send_receive("AT+CGMM\r").await
    }

    pub async fn get_serial_no(&mut self) -> Result<String, HandlerError> {
        self.send_receive("AT+CGSN\r").await
    }

    pub async fn get_imsi(&mut self) -> Result<String, HandlerError> {
        self.send_receive("AT+CIMI\r").await
    }

    pub async fn get_sw_version(&mut self) -> Result<String, HandlerError> {
        self.send_receive("AT+CGMR\r").await
    }

    pub async fn get_msisdn(&mut self) -> Result<String, HandlerError> {
        self.send_receive("AT+CNUM\r").await
    }

    pub async fn get_battery_level(&mut self) -> Result<String, HandlerError> {
        self.send_receive("AT+CBC\r").await
    }

    pub async fn get_signal_level(&mut self) -> Result<String, HandlerError> {
        self.send_receive("AT+CSQ\r").await
    }

    pub async fn get_gprs_status(&mut self) -> Result<String, HandlerError> {
        self.send_receive("AT+CGATT?\r").await
    }
}
