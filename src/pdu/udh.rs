// ABOUTME: User-Data-Header construction and parsing
// ABOUTME: Application port addressing and 8/16-bit concatenation information elements

use bytes::{BufMut, BytesMut};

use crate::pdu::{PduError, PduReader};

/// [IEI] Application port addressing scheme, 16-bit addresses.
pub const IEI_APP_PORT_16BIT: u8 = 0x05;
/// Length, in octets, of the data following [`IEI_APP_PORT_16BIT`].
pub const IEI_APP_PORT_16BIT_LEN: u8 = 4;
/// [IEI] Concatenated short message, 8-bit reference number.
pub const IEI_CONCAT_8BIT: u8 = 0x00;
/// Length, in octets, of the data following [`IEI_CONCAT_8BIT`].
pub const IEI_CONCAT_8BIT_LEN: u8 = 3;
/// [IEI] Concatenated short message, 16-bit reference number.
pub const IEI_CONCAT_16BIT: u8 = 0x08;
/// Length, in octets, of the data following [`IEI_CONCAT_16BIT`].
pub const IEI_CONCAT_16BIT_LEN: u8 = 4;

/// Use 8-bit or 16-bit concatenation references for outgoing messages.
pub(crate) const CONCAT_USE_16_BIT: bool = false;

/// Concatenation info carried in a UDH: which message a fragment belongs to
/// and where it sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConcatInfo {
    /// Reference number shared by all fragments of one message.
    pub reference: u16,
    /// Total number of fragments.
    pub total: u8,
    /// 1-based position of this fragment.
    pub sequence: u8,
}

/// The information elements recognized in an incoming UDH. Unrecognized IEs
/// are skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserDataHeader {
    pub source_port: Option<u16>,
    pub dest_port: Option<u16>,
    pub concat: Option<ConcatInfo>,
}

/// Size, in octets, of the UDH needed for the given features. Zero when no
/// header is required at all.
pub fn udh_size(include_length_octet: bool, is_ported: bool, requires_concat: bool) -> usize {
    if !is_ported && !requires_concat {
        return 0;
    }
    let mut size = 0;
    if include_length_octet {
        size += 1;
    }
    if is_ported {
        size += 2 + IEI_APP_PORT_16BIT_LEN as usize;
    }
    if requires_concat {
        if CONCAT_USE_16_BIT {
            size += 2 + IEI_CONCAT_16BIT_LEN as usize;
        } else {
            size += 2 + IEI_CONCAT_8BIT_LEN as usize;
        }
    }
    size
}

/// Generates the UD-header for one part of an outgoing message. The header is
/// optional; callers check [`udh_size`] before emitting one. IEs whose
/// feature is absent (single part, no ports) are omitted.
pub fn build_udh(
    part: usize,
    total: usize,
    mp_ref: u16,
    source_port: u16,
    dest_port: u16,
) -> Result<Vec<u8>, PduError> {
    let mut udh = BytesMut::new();
    // [TP-UDHL] placeholder, fixed up below.
    udh.put_u8(0);

    if source_port != 0 || dest_port != 0 {
        udh.put_u8(IEI_APP_PORT_16BIT);
        udh.put_u8(IEI_APP_PORT_16BIT_LEN);
        udh.put_u16(dest_port);
        udh.put_u16(source_port);
    }

    if total != 1 {
        if part < 1 || part > total {
            return Err(PduError::InvalidPartNumber { part, total });
        }
        if total > 0xFF {
            return Err(PduError::TooManyParts(total));
        }
        if CONCAT_USE_16_BIT {
            udh.put_u8(IEI_CONCAT_16BIT);
            udh.put_u8(IEI_CONCAT_16BIT_LEN);
            udh.put_u16(mp_ref);
        } else {
            udh.put_u8(IEI_CONCAT_8BIT);
            udh.put_u8(IEI_CONCAT_8BIT_LEN);
            udh.put_u8(mp_ref as u8);
        }
        udh.put_u8(total as u8);
        udh.put_u8(part as u8);
    }

    // [TP-UDHL] length of the header content, excluding the length octet.
    let mut out = udh.to_vec();
    out[0] = (out.len() - 1) as u8;
    Ok(out)
}

/// Parses the UDH at the front of a user-data field. Returns the recognized
/// information elements together with the total header size in octets,
/// length octet included.
pub fn parse_udh(reader: &mut PduReader<'_>) -> Result<(UserDataHeader, usize), PduError> {
    let udhl = reader.read_u8("UDH length")? as usize;
    let mut remaining = udhl;
    let mut header = UserDataHeader::default();
    while remaining >= 2 {
        let iei = reader.read_u8("IEI")?;
        let len = reader.read_u8("IE length")? as usize;
        remaining -= 2;
        if len > remaining {
            return Err(PduError::Truncated { field: "IE data" });
        }
        let data = reader.read_bytes(len, "IE data")?;
        remaining -= len;
        match (iei, len) {
            (IEI_CONCAT_8BIT, 3) => {
                header.concat = Some(ConcatInfo {
                    reference: data[0] as u16,
                    total: data[1],
                    sequence: data[2],
                });
            }
            (IEI_CONCAT_16BIT, 4) => {
                header.concat = Some(ConcatInfo {
                    reference: u16::from_be_bytes([data[0], data[1]]),
                    total: data[2],
                    sequence: data[3],
                });
            }
            (IEI_APP_PORT_16BIT, 4) => {
                header.dest_port = Some(u16::from_be_bytes([data[0], data[1]]));
                header.source_port = Some(u16::from_be_bytes([data[2], data[3]]));
            }
            _ => {}
        }
    }
    Ok((header, udhl + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_accounts_for_each_feature() {
        assert_eq!(udh_size(true, false, false), 0);
        assert_eq!(udh_size(true, false, true), 6);
        assert_eq!(udh_size(true, true, false), 7);
        assert_eq!(udh_size(true, true, true), 12);
        assert_eq!(udh_size(false, true, true), 11);
    }

    #[test]
    fn concat_only_header_layout() {
        let udh = build_udh(2, 3, 0xB9, 0, 0).unwrap();
        assert_eq!(udh, vec![0x05, 0x00, 0x03, 0xB9, 0x03, 0x02]);
    }

    #[test]
    fn ported_multipart_header_layout() {
        let udh = build_udh(1, 2, 0x42, 0x1234, 0x50F4).unwrap();
        assert_eq!(
            udh,
            vec![0x0B, 0x05, 0x04, 0x50, 0xF4, 0x12, 0x34, 0x00, 0x03, 0x42, 0x02, 0x01]
        );
    }

    #[test]
    fn single_part_unported_is_empty_header() {
        let udh = build_udh(1, 1, 0, 0, 0).unwrap();
        assert_eq!(udh, vec![0x00]);
    }

    #[test]
    fn build_and_parse_agree() {
        let udh = build_udh(3, 5, 0x77, 1000, 2000).unwrap();
        let mut reader = PduReader::new(&udh);
        let (parsed, size) = parse_udh(&mut reader).unwrap();
        assert_eq!(size, udh.len());
        assert_eq!(parsed.source_port, Some(1000));
        assert_eq!(parsed.dest_port, Some(2000));
        assert_eq!(
            parsed.concat,
            Some(ConcatInfo {
                reference: 0x77,
                total: 5,
                sequence: 3,
            })
        );
    }

    #[test]
    fn parse_recognizes_16_bit_concat() {
        let bytes = [0x06, IEI_CONCAT_16BIT, 0x04, 0xAB, 0xCD, 0x04, 0x02];
        let (parsed, size) = parse_udh(&mut PduReader::new(&bytes)).unwrap();
        assert_eq!(size, 7);
        assert_eq!(
            parsed.concat,
            Some(ConcatInfo {
                reference: 0xABCD,
                total: 4,
                sequence: 2,
            })
        );
    }

    #[test]
    fn parse_skips_unknown_ies() {
        // National-language shift IE (0x24) ahead of an 8-bit concat.
        let bytes = [0x08, 0x24, 0x01, 0x01, IEI_CONCAT_8BIT, 0x03, 0x10, 0x02, 0x01];
        let (parsed, _) = parse_udh(&mut PduReader::new(&bytes)).unwrap();
        assert_eq!(
            parsed.concat,
            Some(ConcatInfo {
                reference: 0x10,
                total: 2,
                sequence: 1,
            })
        );
    }

    #[test]
    fn rejects_out_of_range_part() {
        assert!(matches!(
            build_udh(4, 3, 0, 0, 0),
            Err(PduError::InvalidPartNumber { part: 4, total: 3 })
        ));
    }
}
