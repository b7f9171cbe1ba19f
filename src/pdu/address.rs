// ABOUTME: Encoding and decoding of PDU address fields (SMSC and peer numbers)
// ABOUTME: Covers semi-octet digits, Type-of-Address layout and SMSC length accounting

use num_enum::TryFromPrimitive;

use crate::pdu::{alphabet, PduError, PduReader};

/// Characters allowable in GSM semi-octet format, indexed by semi-octet
/// value. Index 15 (0xF) decodes to a space and is used as the high-nibble
/// fill when encoding an odd-length string.
pub(crate) const SEMI_OCTET_CHARS: &[u8; 16] = b"0123456789*#abc ";

/// Type-of-Address fields always have their top bit set.
const TOA_TOP_BIT: u8 = 0x80;
/// Numbering-plan-identification: ISDN/telephone (E.164/E.163).
const TOA_NPI_ISDN_TELEPHONE: u8 = 0x01;
/// Shift to place the 3 Type-of-number bits inside a Type-of-Address.
const TOA_TON_SHIFT: u8 = 4;
/// Mask to extract the Type-of-number from a Type-of-Address.
const TOA_TON_MASK: u8 = 7 << TOA_TON_SHIFT;

/// [ToA Ton: Type-of-Address Type-of-number] The three type-of-number bits of
/// an address field, as defined by 3GPP TS 23.040 section 9.1.2.5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum TypeOfNumber {
    /// No a priori information about the numbering plan.
    Unknown = 0,
    /// International number; rendered with a `+` prefix.
    International = 1,
    /// National number; prefix and escape digits are not included.
    National = 2,
    /// Administration/service number specific to the serving network.
    NetworkSpecific = 3,
    /// Short number representation stored in the service centre.
    Subscriber = 4,
    /// Text coded in the GSM 7-bit default alphabet instead of digits.
    Alphanumeric = 5,
    /// Abbreviated number.
    Abbreviated = 6,
}

/// Converts a digit string into GSM semi-octet (swapped BCD) format. An
/// odd-length input has its final high nibble filled with 0xF, which decodes
/// as a space.
pub(crate) fn to_semi_octets(digits: &str) -> Result<Vec<u8>, PduError> {
    let mut nibbles = Vec::with_capacity(digits.len() + 1);
    for c in digits.chars() {
        let value = SEMI_OCTET_CHARS
            .iter()
            .position(|&t| t as char == c)
            .ok_or(PduError::InvalidSemiOctetChar(c))?;
        nibbles.push(value as u8);
    }
    if nibbles.len() % 2 == 1 {
        nibbles.push(0x0F);
    }
    Ok(nibbles
        .chunks(2)
        .map(|pair| (pair[1] << 4) | pair[0])
        .collect())
}

/// Encodes an address for use in a PDU, as specified in 3GPP TS 24.011.
///
/// The layout is `[length][type-of-address][semi-octets...]`. The length
/// semantics differ by context: for an SMSC number the length counts the
/// octets that follow it (type-of-address included); for any other address it
/// counts the useful semi-octets, excluding fill.
///
/// An empty SMSC address encodes as a single zero octet, which tells the
/// device to use the service-centre number stored on the SIM.
pub fn encode_address(address: &str, is_smsc: bool) -> Result<Vec<u8>, PduError> {
    if is_smsc && address.is_empty() {
        return Ok(vec![0]);
    }

    let is_international = address.starts_with('+');
    let digits = if is_international { &address[1..] } else { address };
    if digits.len() > 20 {
        return Err(PduError::AddressTooLong(digits.len()));
    }

    let semi_octets = to_semi_octets(digits)?;
    let reported_length = if is_smsc {
        // Octets following the length byte, type-of-address included.
        1 + (digits.len() + 1) / 2
    } else {
        digits.len()
    };

    let ton = if is_international {
        TypeOfNumber::International
    } else {
        // Unknown works better than National for non-prefixed numbers in
        // the field.
        TypeOfNumber::Unknown
    };

    let mut out = Vec::with_capacity(semi_octets.len() + 2);
    out.push(reported_length as u8);
    out.push(TOA_TOP_BIT | TOA_NPI_ISDN_TELEPHONE | ((ton as u8) << TOA_TON_SHIFT));
    out.extend_from_slice(&semi_octets);
    Ok(out)
}

/// Reads an encoded address from a PDU octet stream, reversing
/// [`encode_address`].
///
/// The address-length field of a normal address counts useful semi-octets
/// only, so fill semi-octets do not decrement the running count; for an SMSC
/// number every semi-octet, fill included, is counted.
pub fn decode_address(reader: &mut PduReader<'_>, is_smsc: bool) -> Result<String, PduError> {
    let mut length = reader.read_u8("address length")? as usize;
    if length == 0 {
        return Ok(String::new());
    }
    if is_smsc {
        // Convert from octets-following to a semi-octet count.
        length = (length - 1) * 2;
    }

    let toa = reader.read_u8("type of address")?;
    let ton = TypeOfNumber::try_from((toa & TOA_TON_MASK) >> TOA_TON_SHIFT)
        .unwrap_or(TypeOfNumber::Unknown);

    if ton == TypeOfNumber::Alphanumeric {
        // The length is in semi-octets; consume whole octets and decode them
        // with the standard 7-bit alphabet.
        let octets = reader.read_bytes(length / 2 + length % 2, "alphanumeric address")?;
        let septets = alphabet::unpack_septets(octets, 0, octets.len() * 8 / 7);
        return Ok(alphabet::septets_to_string(&septets));
    }

    let mut out = String::with_capacity(length + 1);
    if ton == TypeOfNumber::International {
        out.push('+');
    }
    let mut remaining = length as isize;
    while remaining > 0 {
        let octet = reader.read_u8("address digits")?;
        for nibble in [octet & 0x0F, octet >> 4] {
            let digit = SEMI_OCTET_CHARS[nibble as usize] as char;
            if is_smsc || digit != ' ' {
                if digit != ' ' {
                    out.push(digit);
                }
                remaining -= 1;
            }
        }
    }
    Ok(out)
}

/// Decodes the number held in a single octet's two semi-octets, low nibble
/// first, skipping fill. Yields 0 when the octet does not hold decimal
/// digits; device clocks produce garbage often enough that this is the only
/// robust stance.
pub(crate) fn decode_semi_octet_number(octet: u8) -> u32 {
    let mut text = String::with_capacity(2);
    for nibble in [octet & 0x0F, octet >> 4] {
        let c = SEMI_OCTET_CHARS[nibble as usize] as char;
        if c != ' ' {
            text.push(c);
        }
    }
    text.parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdu::hex;

    fn decode_str(bytes: &[u8], is_smsc: bool) -> String {
        decode_address(&mut PduReader::new(bytes), is_smsc).unwrap()
    }

    #[test]
    fn smsc_international_eleven_digits() {
        let encoded = encode_address("+447890123456", true).unwrap();
        assert_eq!(hex::encode(&encoded), "0791448709214365");
        // 12 digits => 6 octets + 1 for the type-of-address.
        assert_eq!(encoded[0], 0x07);
        assert_eq!(decode_str(&encoded, true), "+447890123456");
    }

    #[test]
    fn smsc_length_counts_fill() {
        let encoded = encode_address("+44789012345", true).unwrap();
        assert_eq!(hex::encode(&encoded), "07914487092143F5");
        assert_eq!(decode_str(&encoded, true), "+44789012345");
    }

    #[test]
    fn empty_smsc_is_single_zero_byte() {
        assert_eq!(encode_address("", true).unwrap(), vec![0]);
    }

    #[test]
    fn non_smsc_length_is_semi_octet_count() {
        let encoded = encode_address("07890123456", false).unwrap();
        assert_eq!(encoded[0], 11);
        assert_eq!(encoded[1], 0x81);
        assert_eq!(decode_str(&encoded, false), "07890123456");
    }

    #[test]
    fn odd_length_pads_high_nibble() {
        let encoded = encode_address("123", false).unwrap();
        assert_eq!(encoded, vec![0x03, 0x81, 0x21, 0xF3]);
        // Round trip drops the fill.
        assert_eq!(decode_str(&encoded, false), "123");
    }

    #[test]
    fn special_digits_encode() {
        let encoded = encode_address("*#ab", false).unwrap();
        assert_eq!(&encoded[2..], &[0xBA, 0xDC]);
        assert_eq!(decode_str(&encoded, false), "*#ab");
    }

    #[test]
    fn address_longer_than_twenty_rejected() {
        assert!(matches!(
            encode_address("+123456789012345678901", false),
            Err(PduError::AddressTooLong(21))
        ));
    }

    #[test]
    fn alphanumeric_originator_decodes_via_gsm7() {
        // "Hello" packed as septets, type-of-number alphanumeric.
        let packed = alphabet::pack_septets(&alphabet::string_to_septets("Hello").unwrap(), 0);
        let mut bytes = vec![(packed.len() * 2) as u8, 0xD0];
        bytes.extend_from_slice(&packed);
        assert_eq!(decode_str(&bytes, false), "Hello");
    }

    #[test]
    fn zero_length_address_is_empty() {
        assert_eq!(decode_str(&[0x00], false), "");
        assert_eq!(decode_str(&[0x00], true), "");
    }

    #[test]
    fn semi_octet_number_tolerates_garbage() {
        assert_eq!(decode_semi_octet_number(0x21), 12);
        assert_eq!(decode_semi_octet_number(0xE1), 0);
    }
}
