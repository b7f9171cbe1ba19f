// SMS TPDU codec - byte-exact encoding and decoding of 3GPP TS 23.040
// transfer protocol data units.
//
// This module provides a clean separation between the wire format (hex,
// semi-octets, addresses, user-data headers) and the message models built on
// top of it. The encoder side produces SMS-SUBMIT PDUs ready to hand to a
// modem's `AT+CMGS`; the decoder side consumes SMS-DELIVER and
// SMS-STATUS-REPORT PDUs as listed by `AT+CMGL`.

pub mod address;
pub mod alphabet;
pub mod deliver;
pub mod hex;
pub mod submit;
pub mod udh;

use thiserror::Error;

/// Maximum size, in octets, of the user data of a single PDU.
pub const MAX_UD_OCTETS: usize = 140;

// [TP-MTI: TP-Message-Type-Indicator] Bits 1-0 of the first byte of the TPDU.
/// Mask to extract the MTI from the first byte of a TPDU.
pub(crate) const TP_MTI_MASK: u8 = 0x03;
/// 2-bit value indicating an MO message is of type SMS-SUBMIT.
pub(crate) const TP_MTI_MO_SUBMIT: u8 = 0x01;
/// 2-bit value indicating an MT message is of type SMS-DELIVER.
pub(crate) const TP_MTI_MT_DELIVER: u8 = 0x00;
/// 2-bit value indicating an MT message is of type SMS-STATUS-REPORT.
pub(crate) const TP_MTI_MT_STATUS_REPORT: u8 = 0x02;
/// 2-bit value indicating an MT message is of Reserved type.
///
/// 3GPP TS 23.040 section 9.2.3.1: a TPDU with a reserved TP-MTI shall be
/// processed as if it were an SMS-DELIVER.
pub(crate) const TP_MTI_MT_RESERVED: u8 = 0x03;

/// [TP-UDHI: TP-User-Data-Header-Indicator] Flag indicating the TP-UD field
/// starts with a header.
pub(crate) const TP_UDHI: u8 = 1 << 6;
/// [TP-SRR: TP-Status-Report-Request] Flag requesting a status report.
/// Only meaningful on SMS-SUBMIT.
pub(crate) const TP_SRR: u8 = 1 << 5;
/// [TP-VPF: TP-Validity-Period-Format] Relative validity period present.
pub(crate) const TP_VPF_RELATIVE: u8 = 2 << 3;

// [TP-DCS: TP-Data-Coding-Scheme] The character-set bits at xxxx??xx.
pub(crate) const TP_DCS_CHARSET_MASK: u8 = 0x0C;
pub(crate) const TP_DCS_CHARSET_GSM_7BIT: u8 = 0x00;
pub(crate) const TP_DCS_CHARSET_8BIT: u8 = 0x04;
pub(crate) const TP_DCS_CHARSET_UCS2: u8 = 0x08;

/// Character set used for the user data of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageEncoding {
    /// GSM 7-bit default alphabet, packed as septets.
    Gsm7Bit,
    /// 8-bit binary data.
    Binary8Bit,
    /// UCS-2 (16-bit) text.
    Ucs2,
}

impl MessageEncoding {
    /// The TP-DCS octet for a standard, non-custom coding of this encoding.
    pub fn dcs_byte(self) -> u8 {
        match self {
            MessageEncoding::Gsm7Bit => TP_DCS_CHARSET_GSM_7BIT,
            MessageEncoding::Binary8Bit => TP_DCS_CHARSET_8BIT,
            MessageEncoding::Ucs2 => TP_DCS_CHARSET_UCS2,
        }
    }

    /// Extracts the encoding from a TP-DCS octet. Unrecognized charset bits
    /// fall back to the GSM 7-bit default alphabet.
    pub fn from_dcs(dcs: u8) -> Self {
        match dcs & TP_DCS_CHARSET_MASK {
            TP_DCS_CHARSET_8BIT => MessageEncoding::Binary8Bit,
            TP_DCS_CHARSET_UCS2 => MessageEncoding::Ucs2,
            _ => MessageEncoding::Gsm7Bit,
        }
    }
}

/// Errors raised while encoding or decoding TPDUs.
#[derive(Debug, Error)]
pub enum PduError {
    #[error("odd-length hex string ({0} characters)")]
    OddHexLength(usize),

    #[error("invalid hex character {0:?}")]
    InvalidHexChar(char),

    #[error("address is {0} characters; the maximum length of an address field is 20")]
    AddressTooLong(usize),

    #[error("character {0:?} cannot be encoded as a semi-octet")]
    InvalidSemiOctetChar(char),

    #[error("truncated PDU while reading {field}")]
    Truncated { field: &'static str },

    #[error("invalid service-centre timestamp")]
    InvalidTimestamp,

    #[error("unsupported message type indicator {0}")]
    UnsupportedMessageType(u8),

    #[error("character {0:?} is outside the GSM 7-bit default alphabet")]
    UnsupportedGsmChar(char),

    #[error("message part {part} of {total} is outside the valid range")]
    InvalidPartNumber { part: usize, total: usize },

    #[error("message needs {0} parts; at most 255 are addressable")]
    TooManyParts(usize),
}

/// Cursor over the raw octets of a PDU. Reads fail with
/// [`PduError::Truncated`] naming the field being read, so a malformed listing
/// entry produces a useful log line instead of a panic.
pub(crate) struct PduReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> PduReader<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        PduReader { bytes, pos: 0 }
    }

    pub(crate) fn read_u8(&mut self, field: &'static str) -> Result<u8, PduError> {
        let byte = *self
            .bytes
            .get(self.pos)
            .ok_or(PduError::Truncated { field })?;
        self.pos += 1;
        Ok(byte)
    }

    pub(crate) fn read_bytes(
        &mut self,
        n: usize,
        field: &'static str,
    ) -> Result<&'a [u8], PduError> {
        if self.pos + n > self.bytes.len() {
            return Err(PduError::Truncated { field });
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Consumes and returns everything left in the buffer.
    pub(crate) fn rest(&mut self) -> &'a [u8] {
        let slice = &self.bytes[self.pos..];
        self.pos = self.bytes.len();
        slice
    }
}
