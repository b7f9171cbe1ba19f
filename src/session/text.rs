// ABOUTME: TEXT-protocol listing parser - comma-tokenized +CMGL entries
// ABOUTME: Legacy path for devices without PDU mode; PDU mode is the primary protocol

use chrono::{TimeZone, Utc};
use tracing::warn;

use crate::message::{
    DeliveryStatus, IncomingMessage, Payload, ReceivedMessage, StatusReport,
};
use crate::pdu::{alphabet, hex, MessageEncoding};
use crate::response;

/// Parses a TEXT-mode `AT+CMGL` listing into messages and status reports.
///
/// Entries that cannot be interpreted are logged and skipped; the rest of
/// the listing still parses.
pub(crate) fn parse_text_listing(listing: &str, location: &str) -> Vec<ReceivedMessage> {
    let mut out = Vec::new();
    let mut lines = listing.lines();
    while let Some(header) = response::next_useful_line(&mut lines) {
        if header.eq_ignore_ascii_case("OK") {
            break;
        }
        let Some(mem_index) = response::mem_index_of_line(header) else {
            warn!(line = header, "unparseable TEXT listing line; skipping");
            continue;
        };

        // Empty fields would be swallowed by the tokenizer; keep a space
        // placeholder so field positions stay stable.
        let fixed = header.replace(",,", ", ,");
        let tokens: Vec<&str> = fixed.split(',').filter(|t| !t.is_empty()).collect();

        // A digit in the third field marks a status report (it is the first
        // octet); a delivered message carries its quoted originator there.
        let is_status_report = tokens
            .get(2)
            .map(|t| t.trim().starts_with(|c: char| c.is_ascii_digit()))
            .unwrap_or(false);

        if is_status_report {
            let ref_no = tokens
                .get(3)
                .and_then(|t| unquote(t).parse::<u8>().ok())
                .unwrap_or(0);
            let (Some(submitted), Some(discharged)) = (
                timestamp_of(tokens.get(5), tokens.get(6)),
                timestamp_of(tokens.get(7), tokens.get(8)),
            ) else {
                warn!(line = header, "status report with unparseable dates; skipping");
                continue;
            };
            out.push(ReceivedMessage::StatusReport(StatusReport {
                mem_index,
                mem_location: location.to_owned(),
                smsc: String::new(),
                ref_no,
                recipient: String::new(),
                submitted_at_millis: submitted,
                discharged_at_millis: discharged,
                status: DeliveryStatus::Unknown,
                text: String::new(),
            }));
        } else {
            let originator = tokens.get(2).map(|t| unquote(t)).unwrap_or_default();
            let Some(timestamp) = timestamp_of(tokens.get(4), tokens.get(5)) else {
                warn!(line = header, "message with unparseable date; skipping");
                continue;
            };
            let Some(body_line) = response::next_useful_line(&mut lines) else {
                warn!(line = header, "listing ended before the message body");
                break;
            };
            // The body arrives as hex-encoded 7-bit alphabet values.
            let text = match hex::decode(body_line) {
                Ok(bytes) => alphabet::septets_to_string(&bytes),
                Err(e) => {
                    warn!(error = %e, body = body_line, "undecodable TEXT body; skipping");
                    continue;
                }
            };
            out.push(ReceivedMessage::Sms(IncomingMessage {
                mem_index,
                mem_location: location.to_owned(),
                originator,
                smsc: String::new(),
                timestamp_millis: timestamp,
                encoding: MessageEncoding::Gsm7Bit,
                payload: Payload::Text(text),
                source_port: None,
                dest_port: None,
                concat: None,
                mp_mem_indices: Vec::new(),
            }));
        }
    }
    out
}

fn unquote(token: &str) -> String {
    token.trim().replace('"', "")
}

/// Builds a UTC timestamp from the `"yy/MM/dd` and `hh:mm:ss±zz"` halves of
/// a quoted TEXT-mode date.
fn timestamp_of(date: Option<&&str>, time: Option<&&str>) -> Option<i64> {
    let date = unquote(date?);
    let time = unquote(time?);
    let year = 2000 + date.get(0..2)?.parse::<i32>().ok()?;
    let month = date.get(3..5)?.parse().ok()?;
    let day = date.get(6..8)?.parse().ok()?;
    let hour = time.get(0..2)?.parse().ok()?;
    let minute = time.get(3..5)?.parse().ok()?;
    let second = time.get(6..8)?.parse().ok()?;
    Utc.with_ymd_and_hms(year, month, day, hour, minute, second)
        .single()
        .map(|t| t.timestamp_millis())
}
