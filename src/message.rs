// ABOUTME: Message models - outgoing submissions, incoming deliveries and status reports
// ABOUTME: Provides builder-style construction with sensible defaults for common cases

use chrono::Utc;

use crate::pdu::submit::{self, SubmitOptions};
use crate::pdu::udh::ConcatInfo;
use crate::pdu::{alphabet, MessageEncoding, PduError};

/// Which stored messages a list operation returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageClass {
    /// All messages.
    All,
    /// Unread messages; the device marks them read once listed.
    Unread,
    /// Already-read messages.
    Read,
}

impl MessageClass {
    /// Integer id used with `AT+CMGL` in PDU mode.
    pub fn pdu_mode_id(self) -> u8 {
        match self {
            MessageClass::All => 4,
            MessageClass::Unread => 0,
            MessageClass::Read => 1,
        }
    }

    /// Text id used with `AT+CMGL` in TEXT mode.
    pub fn text_mode_id(self) -> &'static str {
        match self {
            MessageClass::All => "ALL",
            MessageClass::Unread => "REC UNREAD",
            MessageClass::Read => "REC READ",
        }
    }
}

/// Delivery outcome reported by a status report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    /// No report decoded yet.
    Unknown,
    /// The message reached the recipient.
    Delivered,
    /// Not delivered yet; the service centre keeps trying.
    KeepTrying,
    /// Not delivered; the service centre gave up.
    Aborted,
}

/// User data of a message: decoded text or raw octets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    Binary(Vec<u8>),
}

/// A message to be sent through the modem.
///
/// The session mutates `ref_no` and `dispatched_at` when the message is
/// handed to the device; everything else is caller-owned.
#[derive(Debug, Clone)]
pub struct OutgoingMessage {
    /// Destination address, optionally `+`-prefixed.
    pub recipient: String,
    /// Per-message service-centre override; the session default applies when
    /// unset.
    pub smsc: Option<String>,
    payload: Payload,
    encoding: MessageEncoding,
    /// Application source port; 0 when unported.
    pub source_port: u16,
    /// Application destination port; 0 when unported.
    pub dest_port: u16,
    /// Ask the service centre for a delivery status report.
    pub request_status_report: bool,
    /// Validity period in hours; 0 requests the maximum.
    pub validity_period_hours: u16,
    /// [TP-PID] protocol identifier.
    pub protocol_id: u8,
    /// [TP-DCS] override; derived from the encoding when unset.
    pub dcs: Option<u8>,
    concat_ref: u16,
    ref_no: i32,
    dispatched_at: Option<i64>,
}

impl OutgoingMessage {
    /// Creates a text message. GSM 7-bit is used when the text fits the
    /// default alphabet, UCS-2 otherwise.
    pub fn text(recipient: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let encoding = if alphabet::fits(&text) {
            MessageEncoding::Gsm7Bit
        } else {
            MessageEncoding::Ucs2
        };
        OutgoingMessage {
            recipient: recipient.into(),
            smsc: None,
            payload: Payload::Text(text),
            encoding,
            source_port: 0,
            dest_port: 0,
            request_status_report: false,
            validity_period_hours: 0,
            protocol_id: 0,
            dcs: None,
            concat_ref: 0,
            ref_no: -1,
            dispatched_at: None,
        }
    }

    /// Creates an 8-bit binary message.
    pub fn binary(recipient: impl Into<String>, payload: Vec<u8>) -> Self {
        OutgoingMessage {
            recipient: recipient.into(),
            smsc: None,
            payload: Payload::Binary(payload),
            encoding: MessageEncoding::Binary8Bit,
            source_port: 0,
            dest_port: 0,
            request_status_report: false,
            validity_period_hours: 0,
            protocol_id: 0,
            dcs: None,
            concat_ref: 0,
            ref_no: -1,
            dispatched_at: None,
        }
    }

    /// Forces UCS-2 encoding for a text payload.
    pub fn with_ucs2(mut self) -> Self {
        if matches!(self.payload, Payload::Text(_)) {
            self.encoding = MessageEncoding::Ucs2;
        }
        self
    }

    /// Addresses the message to an application port pair.
    pub fn with_ports(mut self, source: u16, dest: u16) -> Self {
        self.source_port = source;
        self.dest_port = dest;
        self
    }

    /// Requests a delivery status report.
    pub fn with_status_report(mut self) -> Self {
        self.request_status_report = true;
        self
    }

    pub fn encoding(&self) -> MessageEncoding {
        self.encoding
    }

    pub fn text_body(&self) -> Option<&str> {
        match &self.payload {
            Payload::Text(t) => Some(t),
            Payload::Binary(_) => None,
        }
    }

    /// Concatenation reference embedded in this message's multipart headers,
    /// recorded when the message is sent.
    pub fn concat_ref(&self) -> u16 {
        self.concat_ref
    }

    /// Reference number assigned by the device on dispatch; negative while
    /// unsent or failed.
    pub fn ref_no(&self) -> i32 {
        self.ref_no
    }

    /// UTC milliseconds of the moment the device accepted the message.
    pub fn dispatched_at(&self) -> Option<i64> {
        self.dispatched_at
    }

    pub(crate) fn set_concat_ref(&mut self, concat_ref: u16) {
        self.concat_ref = concat_ref;
    }

    pub(crate) fn set_ref_no(&mut self, ref_no: i32) {
        self.ref_no = ref_no;
    }

    pub(crate) fn mark_dispatched(&mut self) {
        self.dispatched_at = Some(Utc::now().timestamp_millis());
    }

    /// Generates the hex PDUs that carry this message, one per part.
    pub fn generate_pdus(&self, smsc: &str, mp_ref: u16) -> Result<Vec<String>, PduError> {
        let opts = SubmitOptions {
            smsc,
            recipient: &self.recipient,
            mp_ref,
            source_port: self.source_port,
            dest_port: self.dest_port,
            request_status_report: self.request_status_report,
            validity_period_hours: self.validity_period_hours,
            protocol_id: self.protocol_id,
            dcs: self.dcs.unwrap_or_else(|| self.encoding.dcs_byte()),
        };
        match (&self.payload, self.encoding) {
            (Payload::Binary(data), _) => submit::generate_pdus_8bit(data, &opts),
            (Payload::Text(text), MessageEncoding::Ucs2) => {
                submit::generate_pdus_ucs2(text, &opts)
            }
            (Payload::Text(text), _) => submit::generate_pdus_gsm7(text, &opts),
        }
    }
}

/// A message read from the device.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    /// Index in device memory; -1 for a virtual message assembled from
    /// multipart fragments.
    pub mem_index: i32,
    /// Two-letter memory location code the message was read from.
    pub mem_location: String,
    /// Sender address.
    pub originator: String,
    /// Service-centre number the message travelled through.
    pub smsc: String,
    /// [TP-SCTS] converted to UTC milliseconds.
    pub timestamp_millis: i64,
    pub encoding: MessageEncoding,
    pub payload: Payload,
    /// Application ports from the UDH, if any.
    pub source_port: Option<u16>,
    pub dest_port: Option<u16>,
    /// Concatenation info when this is (or was assembled from) a multipart
    /// fragment.
    pub concat: Option<ConcatInfo>,
    /// Memory indices of all fragments of a reassembled message, so every
    /// part can be deleted once the whole is consumed.
    pub mp_mem_indices: Vec<u16>,
}

impl IncomingMessage {
    /// True when this message is one fragment of a concatenated message.
    pub fn is_multipart(&self) -> bool {
        self.concat.is_some()
    }

    pub fn text(&self) -> Option<&str> {
        match &self.payload {
            Payload::Text(t) => Some(t),
            Payload::Binary(_) => None,
        }
    }

    pub fn binary(&self) -> Option<&[u8]> {
        match &self.payload {
            Payload::Binary(b) => Some(b),
            Payload::Text(_) => None,
        }
    }
}

/// A delivery status report for a previously submitted message.
#[derive(Debug, Clone)]
pub struct StatusReport {
    /// Index in device memory.
    pub mem_index: i32,
    /// Two-letter memory location code the report was read from.
    pub mem_location: String,
    /// Service-centre number the report travelled through.
    pub smsc: String,
    /// [TP-MR] of the submission this report answers.
    pub ref_no: u8,
    /// The address the original message was sent to. This is the datum the
    /// report's address field carries, whichever direction it is read from.
    pub recipient: String,
    /// When the service centre accepted the original message, UTC millis.
    pub submitted_at_millis: i64,
    /// When the message was delivered or failed, UTC millis.
    pub discharged_at_millis: i64,
    pub status: DeliveryStatus,
    /// Human-readable rendering of the status octet.
    pub text: String,
}

/// Anything the device can hand us: a plain message or a status report.
#[derive(Debug, Clone)]
pub enum ReceivedMessage {
    Sms(IncomingMessage),
    StatusReport(StatusReport),
}

impl ReceivedMessage {
    pub fn mem_index(&self) -> i32 {
        match self {
            ReceivedMessage::Sms(m) => m.mem_index,
            ReceivedMessage::StatusReport(r) => r.mem_index,
        }
    }

    pub fn mem_location(&self) -> &str {
        match self {
            ReceivedMessage::Sms(m) => &m.mem_location,
            ReceivedMessage::StatusReport(r) => &r.mem_location,
        }
    }

    /// Fragment indices of a reassembled multipart message; empty otherwise.
    pub fn mp_mem_indices(&self) -> &[u16] {
        match self {
            ReceivedMessage::Sms(m) => &m.mp_mem_indices,
            ReceivedMessage::StatusReport(_) => &[],
        }
    }
}
