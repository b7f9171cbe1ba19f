// ABOUTME: GSM 7-bit default alphabet tables and septet stream packing
// ABOUTME: Pure conversions between Rust strings, septet values and packed octet streams

use crate::pdu::PduError;

/// Escape code introducing a character from the extension table.
const ESCAPE: u8 = 0x1B;

/// The GSM 7-bit default alphabet (3GPP TS 23.038 section 6.2.1), indexed by
/// septet value.
const DEFAULT_TABLE: [char; 128] = [
    '@', '£', '$', '¥', 'è', 'é', 'ù', 'ì', 'ò', 'Ç', '\n', 'Ø', 'ø', '\r', 'Å', 'å', //
    'Δ', '_', 'Φ', 'Γ', 'Λ', 'Ω', 'Π', 'Ψ', 'Σ', 'Θ', 'Ξ', '\u{1b}', 'Æ', 'æ', 'ß', 'É', //
    ' ', '!', '"', '#', '¤', '%', '&', '\'', '(', ')', '*', '+', ',', '-', '.', '/', //
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', ':', ';', '<', '=', '>', '?', //
    '¡', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', //
    'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', 'Ä', 'Ö', 'Ñ', 'Ü', '§', //
    '¿', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', //
    'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', 'ä', 'ö', 'ñ', 'ü', 'à',
];

/// The default alphabet extension table, reached through [`ESCAPE`].
const EXTENSION_TABLE: [(u8, char); 10] = [
    (0x0A, '\u{0C}'),
    (0x14, '^'),
    (0x28, '{'),
    (0x29, '}'),
    (0x2F, '\\'),
    (0x3C, '['),
    (0x3D, '~'),
    (0x3E, ']'),
    (0x40, '|'),
    (0x65, '€'),
];

fn default_septet(c: char) -> Option<u8> {
    DEFAULT_TABLE
        .iter()
        .position(|&t| t == c)
        .filter(|&i| i != ESCAPE as usize)
        .map(|i| i as u8)
}

fn extension_septet(c: char) -> Option<u8> {
    EXTENSION_TABLE
        .iter()
        .find(|&&(_, t)| t == c)
        .map(|&(code, _)| code)
}

/// Returns true when every character of `text` is representable in the GSM
/// 7-bit default alphabet (including its extension table).
pub fn fits(text: &str) -> bool {
    text.chars()
        .all(|c| default_septet(c).is_some() || extension_septet(c).is_some())
}

/// Number of septets `text` occupies once encoded. Extension characters count
/// double for the escape code.
pub fn septet_len(text: &str) -> Result<usize, PduError> {
    let mut len = 0;
    for c in text.chars() {
        if default_septet(c).is_some() {
            len += 1;
        } else if extension_septet(c).is_some() {
            len += 2;
        } else {
            return Err(PduError::UnsupportedGsmChar(c));
        }
    }
    Ok(len)
}

/// Encodes a string as a sequence of unpacked septet values.
pub fn string_to_septets(text: &str) -> Result<Vec<u8>, PduError> {
    let mut out = Vec::with_capacity(text.len());
    for c in text.chars() {
        if let Some(septet) = default_septet(c) {
            out.push(septet);
        } else if let Some(code) = extension_septet(c) {
            out.push(ESCAPE);
            out.push(code);
        } else {
            return Err(PduError::UnsupportedGsmChar(c));
        }
    }
    Ok(out)
}

/// Decodes a sequence of unpacked septet values into a string. An escape code
/// followed by an unknown extension value decodes to a space, mirroring the
/// receive-and-continue stance the rest of the decoder takes.
pub fn septets_to_string(septets: &[u8]) -> String {
    let mut out = String::with_capacity(septets.len());
    let mut iter = septets.iter();
    while let Some(&septet) = iter.next() {
        if septet == ESCAPE {
            match iter.next() {
                Some(&code) => match EXTENSION_TABLE.iter().find(|&&(e, _)| e == code) {
                    Some(&(_, c)) => out.push(c),
                    None => out.push(' '),
                },
                None => break,
            }
        } else {
            out.push(DEFAULT_TABLE[(septet & 0x7F) as usize]);
        }
    }
    out
}

/// Number of padding bits needed so that packed septets following a UDH of
/// `udh_octets` octets start on a septet boundary.
pub fn bit_skip(udh_octets: usize) -> u32 {
    ((7 - (udh_octets * 8) % 7) % 7) as u32
}

/// Packs septet values into an octet stream, LSB first, with `skip_bits`
/// zero bits of padding at the front.
pub fn pack_septets(septets: &[u8], skip_bits: u32) -> Vec<u8> {
    let total_bits = skip_bits as usize + septets.len() * 7;
    let mut out = vec![0u8; (total_bits + 7) / 8];
    let mut bit = skip_bits as usize;
    for &septet in septets {
        for i in 0..7 {
            if septet & (1 << i) != 0 {
                out[bit / 8] |= 1 << (bit % 8);
            }
            bit += 1;
        }
    }
    out
}

/// Unpacks `count` septet values from an octet stream, skipping `skip_bits`
/// bits of padding at the front. Never reads past the end of `octets`; the
/// count is capped to the bits actually present.
pub fn unpack_septets(octets: &[u8], skip_bits: u32, count: usize) -> Vec<u8> {
    let available = (octets.len() * 8).saturating_sub(skip_bits as usize) / 7;
    let count = count.min(available);
    let mut out = Vec::with_capacity(count);
    let mut bit = skip_bits as usize;
    for _ in 0..count {
        let mut septet = 0u8;
        for i in 0..7 {
            if octets[bit / 8] & (1 << (bit % 8)) != 0 {
                septet |= 1 << i;
            }
            bit += 1;
        }
        out.push(septet);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_text_round_trip() {
        let text = "Hello world 123 :-)";
        let septets = string_to_septets(text).unwrap();
        assert_eq!(septets_to_string(&septets), text);
    }

    #[test]
    fn extension_characters_escape() {
        let septets = string_to_septets("{}").unwrap();
        assert_eq!(septets, vec![ESCAPE, 0x28, ESCAPE, 0x29]);
        assert_eq!(septets_to_string(&septets), "{}");
        assert_eq!(septet_len("€").unwrap(), 2);
    }

    #[test]
    fn rejects_characters_outside_alphabet() {
        assert!(matches!(
            string_to_septets("日本"),
            Err(PduError::UnsupportedGsmChar('日'))
        ));
        assert!(!fits("日本"));
        assert!(fits("ÑÄ@£€[]"));
    }

    #[test]
    fn packing_round_trip_without_padding() {
        let septets = string_to_septets("hellohello").unwrap();
        let packed = pack_septets(&septets, 0);
        // Canonical example: "hellohello" packs into 9 octets.
        assert_eq!(packed.len(), 9);
        assert_eq!(unpack_septets(&packed, 0, septets.len()), septets);
    }

    #[test]
    fn packing_round_trip_with_padding() {
        // One-byte UDHL plus a 5-octet concat IE leaves a 6-octet header;
        // (7 - 48 % 7) % 7 == 1 bit of padding.
        assert_eq!(bit_skip(6), 1);
        let septets = string_to_septets("padding test").unwrap();
        for skip in 0..7 {
            let packed = pack_septets(&septets, skip);
            assert_eq!(unpack_septets(&packed, skip, septets.len()), septets);
        }
    }

    #[test]
    fn skip_of_one_byte_udh_header() {
        // A UDH consisting of the UDHL octet alone: (7 - 8 % 7) % 7 == 6,
        // while the full 1-byte-UDHL-plus-concat case lands on 1.
        assert_eq!(bit_skip(1), 6);
        assert_eq!(bit_skip(0), 0);
        assert_eq!(bit_skip(7), 0);
    }

    #[test]
    fn unpack_caps_count_to_available_bits() {
        let packed = pack_septets(&[1, 2, 3], 0);
        assert_eq!(unpack_septets(&packed, 0, 100), vec![1, 2, 3]);
    }
}
