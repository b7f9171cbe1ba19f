// ABOUTME: Decoder for mobile-terminated TPDUs - SMS-DELIVER and SMS-STATUS-REPORT
// ABOUTME: Extracts originator, service-centre timestamp, UDH and user data per encoding

use chrono::{TimeZone, Utc};

use crate::message::{DeliveryStatus, IncomingMessage, Payload, ReceivedMessage, StatusReport};
use crate::pdu::udh::UserDataHeader;
use crate::pdu::{
    address, alphabet, hex, submit, udh, MessageEncoding, PduError, PduReader, TP_MTI_MASK,
    TP_MTI_MT_DELIVER, TP_MTI_MT_RESERVED, TP_MTI_MT_STATUS_REPORT, TP_UDHI,
};

/// [TP-SCTS] Sign flag of the timezone octet (1 = behind GMT).
const SCTS_TIMEZONE_NEGATIVE: u8 = 0x80;

/// Decodes a hex PDU as listed by `AT+CMGL` into an incoming message or a
/// status report.
///
/// A reserved TP-MTI is processed as an SMS-DELIVER, as 3GPP TS 23.040
/// requires. SMS-SUBMIT-REPORT is not handled.
pub fn decode_incoming(
    pdu: &str,
    mem_index: i32,
    mem_location: &str,
) -> Result<ReceivedMessage, PduError> {
    let bytes = hex::decode(pdu)?;
    let mut reader = PduReader::new(&bytes);

    let smsc = address::decode_address(&mut reader, true)?;
    let byte_zero = reader.read_u8("first octet")?;

    match byte_zero & TP_MTI_MASK {
        TP_MTI_MT_DELIVER | TP_MTI_MT_RESERVED => {
            decode_deliver(&mut reader, byte_zero, smsc, mem_index, mem_location)
                .map(ReceivedMessage::Sms)
        }
        TP_MTI_MT_STATUS_REPORT => {
            decode_status_report(&mut reader, smsc, mem_index, mem_location)
                .map(ReceivedMessage::StatusReport)
        }
        other => Err(PduError::UnsupportedMessageType(other)),
    }
}

/// True when the PDU's TP-MTI marks it as an SMS-DELIVER (or reserved, which
/// is treated the same).
pub fn is_deliver_pdu(pdu: &str) -> bool {
    matches!(
        mti_of(pdu),
        Some(TP_MTI_MT_DELIVER) | Some(TP_MTI_MT_RESERVED)
    )
}

/// True when the PDU's TP-MTI marks it as an SMS-STATUS-REPORT.
pub fn is_status_report_pdu(pdu: &str) -> bool {
    mti_of(pdu) == Some(TP_MTI_MT_STATUS_REPORT)
}

/// Skips over the SMSC field and extracts the TP-MTI of an incoming PDU.
fn mti_of(pdu: &str) -> Option<u8> {
    let bytes = hex::decode(pdu).ok()?;
    let smsc_len = *bytes.first()? as usize;
    bytes.get(smsc_len + 1).map(|b| b & TP_MTI_MASK)
}

fn decode_deliver(
    reader: &mut PduReader<'_>,
    byte_zero: u8,
    smsc: String,
    mem_index: i32,
    mem_location: &str,
) -> Result<IncomingMessage, PduError> {
    let originator = address::decode_address(reader, false)?;
    let _pid = reader.read_u8("protocol identifier")?;
    let dcs = reader.read_u8("data coding scheme")?;
    let encoding = MessageEncoding::from_dcs(dcs);
    let timestamp_millis = decode_scts(reader)?;
    let ud_len = reader.read_u8("user data length")? as usize;

    let (header, udh_octets) = if byte_zero & TP_UDHI != 0 {
        let (header, octets) = udh::parse_udh(reader)?;
        (header, octets)
    } else {
        (UserDataHeader::default(), 0)
    };

    let payload = match encoding {
        MessageEncoding::Gsm7Bit => {
            let skip_bits = alphabet::bit_skip(udh_octets);
            // Septets consumed by the header and its padding.
            let header_septets = (udh_octets * 8 + skip_bits as usize) / 7;
            let septets = alphabet::unpack_septets(
                reader.rest(),
                skip_bits,
                ud_len.saturating_sub(header_septets),
            );
            Payload::Text(alphabet::septets_to_string(&septets))
        }
        MessageEncoding::Ucs2 => Payload::Text(submit::decode_ucs2(reader.rest())),
        MessageEncoding::Binary8Bit => {
            let data = reader.rest();
            let wanted = ud_len.saturating_sub(udh_octets).min(data.len());
            Payload::Binary(data[..wanted].to_vec())
        }
    };

    Ok(IncomingMessage {
        mem_index,
        mem_location: mem_location.to_owned(),
        originator,
        smsc,
        timestamp_millis,
        encoding,
        payload,
        source_port: header.source_port,
        dest_port: header.dest_port,
        concat: header.concat,
        mp_mem_indices: Vec::new(),
    })
}

fn decode_status_report(
    reader: &mut PduReader<'_>,
    smsc: String,
    mem_index: i32,
    mem_location: &str,
) -> Result<StatusReport, PduError> {
    let ref_no = reader.read_u8("message reference")?;
    let recipient = address::decode_address(reader, false)?;
    let submitted_at_millis = decode_scts(reader)?;
    let discharged_at_millis = decode_scts(reader)?;
    let status_octet = reader.read_u8("status")?;

    let (status, text) = match (status_octet >> 5) & 0x03 {
        0 => (DeliveryStatus::Delivered, "00 - Successful delivery."),
        1 => (DeliveryStatus::KeepTrying, "01 - Errors, will retry dispatch."),
        2 => (DeliveryStatus::Aborted, "02 - Errors, stopped retrying dispatch."),
        _ => (DeliveryStatus::Aborted, "03 - Errors, stopped retrying dispatch."),
    };

    Ok(StatusReport {
        mem_index,
        mem_location: mem_location.to_owned(),
        smsc,
        ref_no,
        recipient,
        submitted_at_millis,
        discharged_at_millis,
        status,
        text: text.to_owned(),
    })
}

/// Decodes the 7-octet [TP-SCTS] service-centre timestamp into UTC
/// milliseconds.
///
/// The first six octets are digit-pair-swapped BCD (year offset 2000, month,
/// day, hour, minute, second). The seventh octet carries the difference from
/// GMT in quarter hours; the shift is subtracted to yield UTC. Years before
/// 2000 are not representable.
pub(crate) fn decode_scts(reader: &mut PduReader<'_>) -> Result<i64, PduError> {
    let year = address::decode_semi_octet_number(reader.read_u8("timestamp year")?) as i32 + 2000;
    let month = address::decode_semi_octet_number(reader.read_u8("timestamp month")?);
    let day = address::decode_semi_octet_number(reader.read_u8("timestamp day")?);
    let hour = address::decode_semi_octet_number(reader.read_u8("timestamp hour")?);
    let minute = address::decode_semi_octet_number(reader.read_u8("timestamp minute")?);
    let second = address::decode_semi_octet_number(reader.read_u8("timestamp second")?);
    let timezone = reader.read_u8("timestamp timezone")?;

    let mut millis = Utc
        .with_ymd_and_hms(year, month, day, hour, minute, second)
        .single()
        .ok_or(PduError::InvalidTimestamp)?
        .timestamp_millis();
    if timezone != 0 {
        millis -= timezone_difference_minutes(timezone) * 60 * 1000;
    }
    Ok(millis)
}

/// Minutes the timestamp's local time differs from GMT. The timezone octet
/// holds the offset in quarter hours with the sign in its top bit (1 =
/// negative).
fn timezone_difference_minutes(timezone: u8) -> i64 {
    let quarter_hours = (timezone & !SCTS_TIMEZONE_NEGATIVE) as i64;
    let minutes = 15 * quarter_hours;
    if timezone & SCTS_TIMEZONE_NEGATIVE != 0 {
        -minutes
    } else {
        minutes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Status-report PDU with an SMSC prefix, captured from a live device.
    const STATUS_REPORT_PDU: &str =
        "07A17098103254F606130C91527420121670110172111332E11101721113322100";

    #[test]
    fn classifies_pdus_by_mti() {
        assert!(is_status_report_pdu(STATUS_REPORT_PDU));
        assert!(!is_deliver_pdu(STATUS_REPORT_PDU));
        // Same report without the SMSC prefix.
        assert!(is_status_report_pdu(
            "06130C91527420121670110172111332E11101721113322100"
        ));
    }

    #[test]
    fn decodes_status_report() {
        let decoded = decode_incoming(STATUS_REPORT_PDU, 3, "SM").unwrap();
        let report = match decoded {
            ReceivedMessage::StatusReport(r) => r,
            other => panic!("expected status report, got {other:?}"),
        };
        assert_eq!(report.status, DeliveryStatus::Delivered);
        assert!(report.recipient.starts_with("+2547"));
        assert_eq!(report.recipient, "+254702216107");
        assert_eq!(report.ref_no, 0x13);
        assert_eq!(report.smsc, "07890123456");
        assert_eq!(report.mem_index, 3);
    }

    #[test]
    fn status_octet_maps_to_delivery_status() {
        for (octet, expected) in [
            (0x00u8, DeliveryStatus::Delivered),
            (0x20, DeliveryStatus::KeepTrying),
            (0x40, DeliveryStatus::Aborted),
            (0x60, DeliveryStatus::Aborted),
        ] {
            let mut pdu = STATUS_REPORT_PDU[..STATUS_REPORT_PDU.len() - 2].to_owned();
            pdu.push_str(&hex::encode(&[octet]));
            let decoded = decode_incoming(&pdu, 0, "SM").unwrap();
            match decoded {
                ReceivedMessage::StatusReport(r) => assert_eq!(r.status, expected),
                other => panic!("expected status report, got {other:?}"),
            }
        }
    }

    #[test]
    fn decodes_gsm7_deliver() {
        // Real listing entry: "+447988156550" via SMSC "+447772800080".
        let pdu = "0791447728008000040C9144978851560500009030215153950008D972180DBA97D3";
        let decoded = decode_incoming(pdu, 2, "SM").unwrap();
        let msg = match decoded {
            ReceivedMessage::Sms(m) => m,
            other => panic!("expected message, got {other:?}"),
        };
        assert_eq!(msg.originator, "+447988156550");
        assert_eq!(msg.smsc, "+447772800080");
        assert_eq!(msg.encoding, MessageEncoding::Gsm7Bit);
        assert_eq!(msg.text(), Some("Yeah wei"));
        assert!(msg.concat.is_none());
        // 2009-03-12 15:35:59 UTC.
        assert_eq!(msg.timestamp_millis, 1_236_872_159_000);
    }

    #[test]
    fn decodes_binary_multipart_fragment() {
        // Part 2 of 3: ports 0/0 and an 8-bit concat IE, 128 octets of
        // counting payload.
        let mut pdu = String::from("0791448720003023400C914467420873770004806011111380408C0B0504000000000003B90302");
        for b in 0x80..=0xFFu32 {
            pdu.push_str(&hex::encode(&[b as u8]));
        }
        let decoded = decode_incoming(&pdu, 8, "SM").unwrap();
        let msg = match decoded {
            ReceivedMessage::Sms(m) => m,
            other => panic!("expected message, got {other:?}"),
        };
        assert_eq!(msg.originator, "+447624803777");
        assert_eq!(msg.encoding, MessageEncoding::Binary8Bit);
        let concat = msg.concat.expect("fragment carries concat info");
        assert_eq!(concat.reference, 0xB9);
        assert_eq!(concat.total, 3);
        assert_eq!(concat.sequence, 2);
        assert_eq!(msg.source_port, Some(0));
        assert_eq!(msg.dest_port, Some(0));
        let payload = msg.binary().unwrap();
        assert_eq!(payload.len(), 128);
        assert_eq!(payload[0], 0x80);
        assert_eq!(payload[127], 0xFF);
    }

    #[test]
    fn submit_report_mti_is_rejected() {
        // MTI = 1 after a zero-length SMSC.
        assert!(matches!(
            decode_incoming("0001", 0, "SM"),
            Err(PduError::UnsupportedMessageType(1))
        ));
    }

    #[test]
    fn timezone_zero_is_utc() {
        assert_eq!(timezone_difference_minutes(0x00), 0);
    }

    #[test]
    fn timezone_negative_ten_quarter_hours() {
        assert_eq!(timezone_difference_minutes(0x8A), -150);
    }

    #[test]
    fn scts_applies_timezone_shift() {
        // 2024-01-02 03:04:05 local, 150 minutes behind GMT.
        let bytes = [0x42, 0x10, 0x20, 0x30, 0x40, 0x50, 0x8A];
        let millis = decode_scts(&mut PduReader::new(&bytes)).unwrap();
        let base = Utc
            .with_ymd_and_hms(2024, 1, 2, 3, 4, 5)
            .single()
            .unwrap()
            .timestamp_millis();
        assert_eq!(millis, base + 150 * 60 * 1000);
    }
}
