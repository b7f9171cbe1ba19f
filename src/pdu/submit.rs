// ABOUTME: SMS-SUBMIT encoder - builds hex PDUs for GSM 7-bit, 8-bit binary and UCS-2 payloads
// ABOUTME: Handles fragmentation into concatenated parts and the relative validity period table

use bytes::{BufMut, BytesMut};

use crate::pdu::{
    address, alphabet, hex, udh, PduError, MAX_UD_OCTETS, TP_MTI_MO_SUBMIT, TP_SRR, TP_UDHI,
    TP_VPF_RELATIVE,
};

/// Septets available in the user data of a single PDU (140 octets).
const MAX_UD_SEPTETS: usize = MAX_UD_OCTETS * 8 / 7;

/// Everything an SMS-SUBMIT needs besides its payload.
#[derive(Debug, Clone)]
pub struct SubmitOptions<'a> {
    /// Service-centre number; empty means "use the one on the SIM".
    pub smsc: &'a str,
    /// Destination address.
    pub recipient: &'a str,
    /// Concatenation reference embedded in multipart UDHs.
    pub mp_ref: u16,
    /// Application source port; 0 when unported.
    pub source_port: u16,
    /// Application destination port; 0 when unported.
    pub dest_port: u16,
    /// Request a delivery status report from the service centre.
    pub request_status_report: bool,
    /// Validity period in hours; 0 requests the maximum.
    pub validity_period_hours: u16,
    /// [TP-PID] Higher-layer protocol identifier.
    pub protocol_id: u8,
    /// [TP-DCS] Data coding scheme octet.
    pub dcs: u8,
}

impl SubmitOptions<'_> {
    fn is_ported(&self) -> bool {
        self.source_port > 0 || self.dest_port > 0
    }
}

/// Generates a relative validity period octet per the 3GPP TS 23.040 table:
///
/// ```text
/// (TP-VP + 1) x 5 minutes (up to 12 hours)    0 to 143
/// 12 hours + ((TP-VP - 143) x 30 minutes)     144 to 167
/// (TP-VP - 166) x 1 day                       168 to 196
/// (TP-VP - 192) x 1 week                      197 to 255
/// ```
///
/// A zero validity period requests the maximum.
pub fn relative_validity_period(hours: u16) -> u8 {
    let hours = hours as u32;
    if hours == 0 {
        0xFF
    } else if hours <= 12 {
        (hours * 12 - 1) as u8
    } else if hours <= 24 {
        ((hours - 12) * 2 + 143) as u8
    } else if hours <= 720 {
        (hours / 24 + 166) as u8
    } else {
        (hours / 168 + 192).min(0xFF) as u8
    }
}

/// First byte of an SMS-SUBMIT. The validity period format is always
/// relative here.
fn byte_zero(requires_udh: bool, request_status_report: bool) -> u8 {
    let mut b = TP_MTI_MO_SUBMIT | TP_VPF_RELATIVE;
    if requires_udh {
        b |= TP_UDHI;
    }
    if request_status_report {
        b |= TP_SRR;
    }
    b
}

/// Encodes text as big-endian UCS-2 octets. SMS UCS-2 is plain UTF-16
/// without byte-order marks.
pub fn encode_ucs2(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() * 2);
    for unit in text.encode_utf16() {
        out.extend_from_slice(&unit.to_be_bytes());
    }
    out
}

/// Decodes a UCS-2 octet stream, undoing [`encode_ucs2`]. A trailing odd
/// octet is ignored.
pub fn decode_ucs2(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}

/// Number of separate messages needed to carry `payload_len` octets of
/// 8-bit data.
pub fn messages_needed_8bit(payload_len: usize, is_ported: bool) -> usize {
    // Assume single part first; only if it does not fit is the larger
    // multipart UDH accounted for.
    let udh_single = udh::udh_size(true, is_ported, false);
    if payload_len + udh_single <= MAX_UD_OCTETS {
        1
    } else {
        let max_ud = MAX_UD_OCTETS - udh::udh_size(true, is_ported, true);
        payload_len.div_ceil(max_ud)
    }
}

/// Splits text destined for a UCS-2 message. Each UTF-16 unit occupies two
/// octets, and a character is never split across a fragment boundary.
pub fn split_text_ucs2(text: &str, is_ported: bool) -> Vec<String> {
    let total_units: usize = text.chars().map(char::len_utf16).sum();
    let udh_single = udh::udh_size(true, is_ported, false);
    if total_units * 2 + udh_single <= MAX_UD_OCTETS {
        return vec![text.to_owned()];
    }

    let units_per_part = (MAX_UD_OCTETS - udh::udh_size(true, is_ported, true)) / 2;
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut used = 0;
    for c in text.chars() {
        let cost = c.len_utf16();
        if used + cost > units_per_part {
            parts.push(std::mem::take(&mut current));
            used = 0;
        }
        current.push(c);
        used += cost;
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

/// Septets available per part once a UDH of `udh_octets` octets (and its
/// padding to the next septet boundary) is accounted for.
fn septet_budget(udh_octets: usize) -> usize {
    MAX_UD_SEPTETS - (udh_octets * 8).div_ceil(7)
}

/// Splits text destined for a GSM 7-bit message against the septet budget.
/// Extension characters cost two septets and are never split from their
/// escape.
pub fn split_text_gsm7(text: &str, is_ported: bool) -> Result<Vec<String>, PduError> {
    let total = alphabet::septet_len(text)?;
    if total <= septet_budget(udh::udh_size(true, is_ported, false)) {
        return Ok(vec![text.to_owned()]);
    }

    let budget = septet_budget(udh::udh_size(true, is_ported, true));
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut used = 0;
    for c in text.chars() {
        let cost = alphabet::septet_len(c.encode_utf8(&mut [0u8; 4]))?;
        if used + cost > budget {
            parts.push(std::mem::take(&mut current));
            used = 0;
        }
        current.push(c);
        used += cost;
    }
    if !current.is_empty() {
        parts.push(current);
    }
    Ok(parts)
}

/// Writes the part-independent front of a SUBMIT PDU: SMSC address, byte
/// zero, TP-MR, destination, TP-PID, TP-DCS and TP-VP.
fn put_submit_front(
    out: &mut BytesMut,
    opts: &SubmitOptions<'_>,
    requires_udh: bool,
) -> Result<(), PduError> {
    out.put_slice(&address::encode_address(opts.smsc, true)?);
    out.put_u8(byte_zero(requires_udh, opts.request_status_report));
    // [TP-MR] Message reference; always zero on submit, the device assigns
    // the real one.
    out.put_u8(0);
    out.put_slice(&address::encode_address(opts.recipient, false)?);
    out.put_u8(opts.protocol_id);
    out.put_u8(opts.dcs);
    out.put_u8(relative_validity_period(opts.validity_period_hours));
    Ok(())
}

/// Generates the hex-encoded TPDUs for a GSM 7-bit text message.
pub fn generate_pdus_gsm7(text: &str, opts: &SubmitOptions<'_>) -> Result<Vec<String>, PduError> {
    let parts = split_text_gsm7(text, opts.is_ported())?;
    let total = parts.len();
    let requires_udh = total > 1 || opts.is_ported();
    let udh_total = udh::udh_size(true, opts.is_ported(), total > 1);

    let mut pdus = Vec::with_capacity(total);
    for (index, part) in parts.iter().enumerate() {
        let mut out = BytesMut::new();
        put_submit_front(&mut out, opts, requires_udh)?;

        let septets = alphabet::string_to_septets(part)?;
        let skip_bits = alphabet::bit_skip(udh_total);

        // [TP-UDL] For the 7-bit alphabet this is the septet count of the
        // whole UD, header and padding included.
        let ud_len = (udh_total * 8 + septets.len() * 7 + skip_bits as usize).div_ceil(7);
        out.put_u8(ud_len as u8);
        if requires_udh {
            out.put_slice(&udh::build_udh(
                index + 1,
                total,
                opts.mp_ref,
                opts.source_port,
                opts.dest_port,
            )?);
        }
        out.put_slice(&alphabet::pack_septets(&septets, skip_bits));
        pdus.push(hex::encode(&out));
    }
    Ok(pdus)
}

/// Generates the hex-encoded TPDUs for a UCS-2 text message.
pub fn generate_pdus_ucs2(text: &str, opts: &SubmitOptions<'_>) -> Result<Vec<String>, PduError> {
    let parts = split_text_ucs2(text, opts.is_ported());
    let total = parts.len();
    let requires_udh = total > 1 || opts.is_ported();
    let udh_total = udh::udh_size(true, opts.is_ported(), total > 1);

    let mut pdus = Vec::with_capacity(total);
    for (index, part) in parts.iter().enumerate() {
        let mut out = BytesMut::new();
        put_submit_front(&mut out, opts, requires_udh)?;

        let encoded = encode_ucs2(part);
        out.put_u8((encoded.len() + udh_total) as u8);
        if requires_udh {
            out.put_slice(&udh::build_udh(
                index + 1,
                total,
                opts.mp_ref,
                opts.source_port,
                opts.dest_port,
            )?);
        }
        out.put_slice(&encoded);
        pdus.push(hex::encode(&out));
    }
    Ok(pdus)
}

/// Generates the hex-encoded TPDUs for an 8-bit binary message. Binary
/// payloads may be split mid-byte-run; there are no character boundaries to
/// respect.
pub fn generate_pdus_8bit(payload: &[u8], opts: &SubmitOptions<'_>) -> Result<Vec<String>, PduError> {
    let total = messages_needed_8bit(payload.len(), opts.is_ported());
    let requires_udh = total > 1 || opts.is_ported();
    let udh_total = udh::udh_size(true, opts.is_ported(), total > 1);
    let chunk_size = MAX_UD_OCTETS - udh_total;

    let chunks: Vec<&[u8]> = if payload.is_empty() {
        vec![&[]]
    } else {
        payload.chunks(chunk_size).collect()
    };

    let mut pdus = Vec::with_capacity(total);
    for (index, chunk) in chunks.iter().enumerate() {
        let mut out = BytesMut::new();
        put_submit_front(&mut out, opts, requires_udh)?;

        out.put_u8((chunk.len() + udh_total) as u8);
        if requires_udh {
            out.put_slice(&udh::build_udh(
                index + 1,
                total,
                opts.mp_ref,
                opts.source_port,
                opts.dest_port,
            )?);
        }
        out.put_slice(chunk);
        pdus.push(hex::encode(&out));
    }
    Ok(pdus)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options<'a>(smsc: &'a str, recipient: &'a str) -> SubmitOptions<'a> {
        SubmitOptions {
            smsc,
            recipient,
            mp_ref: 0x42,
            source_port: 0,
            dest_port: 0,
            request_status_report: false,
            validity_period_hours: 0,
            protocol_id: 0,
            dcs: 0,
        }
    }

    #[test]
    fn validity_period_table() {
        assert_eq!(relative_validity_period(0), 0xFF);
        assert_eq!(relative_validity_period(1), 11);
        assert_eq!(relative_validity_period(12), 143);
        assert_eq!(relative_validity_period(24), 167);
        assert_eq!(relative_validity_period(720), 196);
        assert_eq!(relative_validity_period(721), 196);
        assert_eq!(relative_validity_period(5 * 168), 197);
    }

    #[test]
    fn validity_period_is_monotonic_and_bounded() {
        let mut previous = relative_validity_period(0);
        assert_eq!(previous, 0xFF);
        previous = relative_validity_period(1);
        for hours in 2..=u16::MAX {
            let vp = relative_validity_period(hours);
            assert!(vp >= previous, "vp regressed at {hours} hours");
            previous = vp;
        }
        assert_eq!(relative_validity_period(u16::MAX), 0xFF);
    }

    #[test]
    fn single_part_gsm7_layout() {
        let pdus = generate_pdus_gsm7("hello", &options("+447890123456", "07890123456")).unwrap();
        assert_eq!(pdus.len(), 1);
        let pdu = &pdus[0];
        // SMSC, byte zero (SUBMIT + relative VP), TP-MR.
        assert!(pdu.starts_with("07914487092143651100"));
        // Destination: 11 semi-octets, unknown/ISDN.
        assert!(pdu.contains("0B817098103254F6"));
        // PID, DCS, VP=FF, UDL=5, then "hello" packed.
        assert!(pdu.ends_with("0000FF05E8329BFD06"));
    }

    #[test]
    fn status_report_request_sets_srr() {
        let mut opts = options("", "123");
        opts.request_status_report = true;
        let pdus = generate_pdus_gsm7("x", &opts).unwrap();
        // Empty SMSC encodes as "00"; byte zero follows.
        assert!(pdus[0].starts_with("0031"));
    }

    #[test]
    fn gsm7_multipart_reconstructs_text() {
        let text = "a".repeat(400);
        let opts = options("", "123");
        let pdus = generate_pdus_gsm7(&text, &opts).unwrap();
        assert_eq!(pdus.len(), 3);
        // 153 septets per part with a 6-octet concat UDH.
        let parts = split_text_gsm7(&text, false).unwrap();
        assert_eq!(parts[0].len(), 153);
        assert_eq!(parts.concat(), text);
    }

    #[test]
    fn gsm7_escape_never_split_across_parts() {
        // 152 'a's followed by a euro sign: the 2-septet escape pair cannot
        // fit in the 153-septet budget, so it must move to part two whole.
        let mut text = "a".repeat(152);
        text.push('€');
        text.push_str(&"b".repeat(10));
        let parts = split_text_gsm7(&text, false).unwrap();
        assert_eq!(parts[0], "a".repeat(152));
        assert!(parts[1].starts_with('€'));
    }

    #[test]
    fn ucs2_split_respects_character_boundaries() {
        // 70 UCS-2 characters fit a single unported part.
        let short = "ψ".repeat(70);
        assert_eq!(split_text_ucs2(&short, false).len(), 1);

        // Astral characters occupy two UTF-16 units and are never bisected.
        let long = "𐐷".repeat(70);
        let parts = split_text_ucs2(&long, false);
        assert!(parts.len() > 1);
        for part in &parts {
            let units: usize = part.chars().map(char::len_utf16).sum();
            assert!(units * 2 <= MAX_UD_OCTETS - udh::udh_size(true, false, true));
            assert_eq!(part.chars().next().unwrap(), '𐐷');
        }
        assert_eq!(parts.concat(), long);
    }

    #[test]
    fn binary_multipart_reconstructs_payload() {
        let payload: Vec<u8> = (0..300u16).map(|b| b as u8).collect();
        let opts = options("", "123");
        let pdus = generate_pdus_8bit(&payload, &opts).unwrap();
        assert_eq!(pdus.len(), messages_needed_8bit(payload.len(), false));
        assert_eq!(pdus.len(), 3);

        // Strip the fixed front and the UDH of each part, then glue the user
        // data back together.
        let mut reassembled = Vec::new();
        for pdu in &pdus {
            let bytes = crate::pdu::hex::decode(pdu).unwrap();
            // 00 smsc, byte0, mr, [03 81 21 F3] dest, pid, dcs, vp, udl => 11
            // octets of front matter, then a 6-octet UDH.
            reassembled.extend_from_slice(&bytes[11 + 6..]);
        }
        assert_eq!(reassembled, payload);
    }

    #[test]
    fn binary_single_part_threshold() {
        assert_eq!(messages_needed_8bit(140, false), 1);
        assert_eq!(messages_needed_8bit(141, false), 2);
        // A ported single part loses 7 octets to the UDH.
        assert_eq!(messages_needed_8bit(133, true), 1);
        assert_eq!(messages_needed_8bit(134, true), 2);
    }

    #[test]
    fn empty_binary_payload_yields_one_part() {
        let pdus = generate_pdus_8bit(&[], &options("", "123")).unwrap();
        assert_eq!(pdus.len(), 1);
    }
}
