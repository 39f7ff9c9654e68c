//! The `record` module defines [`Record`] and [`RecordKind`], used for decoding
//! single Intel HEX text lines, plus the two's-complement checksum both the
//! decoder and its tests rely on.

use crate::error::McBootErrorKind;

mod sizes {
    pub const BYTE_CHAR_LEN: usize = 2;
    /// ':' + (size + address + kind + checksum) as hex pairs
    pub const SMALLEST_RECORD: usize = 1 + (1 + 2 + 1 + 1) * BYTE_CHAR_LEN;
    /// Header bytes (size, address, kind) plus the trailing checksum byte
    pub const OVERHEAD_BYTES: usize = 5;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RecordKind {
    Data = 0x0,
    EndOfFile = 0x1,
    ExtendedSegmentAddress = 0x2,
    StartSegmentAddress = 0x3,
    ExtendedLinearAddress = 0x4,
    StartLinearAddress = 0x5,
}

impl RecordKind {
    fn from_byte(byte: u8) -> Result<Self, McBootErrorKind> {
        match byte {
            0x0 => Ok(Self::Data),
            0x1 => Ok(Self::EndOfFile),
            0x2 => Ok(Self::ExtendedSegmentAddress),
            0x3 => Ok(Self::StartSegmentAddress),
            0x4 => Ok(Self::ExtendedLinearAddress),
            0x5 => Ok(Self::StartLinearAddress),
            _ => Err(McBootErrorKind::InvalidRecordType(byte)),
        }
    }

    /// Payload length the record kind mandates, or `None` when any length is valid.
    const fn expected_payload_length(self) -> Option<usize> {
        match self {
            Self::Data => None,
            Self::EndOfFile => Some(0),
            Self::ExtendedSegmentAddress | Self::ExtendedLinearAddress => Some(2),
            Self::StartSegmentAddress | Self::StartLinearAddress => Some(4),
        }
    }
}

/// A single decoded Intel HEX record. Created and consumed within one decode
/// call; never stored by the model.
#[derive(Debug, PartialEq, Eq)]
pub struct Record {
    pub kind: RecordKind,
    pub address: u16,
    pub size: u8,
    pub data: Vec<u8>,
}

impl Record {
    /// Intel HEX checksum: sum all bytes mod 256, then take the two's complement.
    ///
    /// Appending the computed checksum to its input yields a sequence that sums
    /// to zero mod 256, which is how records are validated.
    #[must_use]
    pub fn checksum(bytes: &[u8]) -> u8 {
        let mut sum: u8 = 0;
        for byte in bytes {
            sum = sum.wrapping_add(*byte);
        }
        (!sum).wrapping_add(1) // two's complement
    }

    /// Decode one record line into a [`Record`].
    ///
    /// The caller is expected to have trimmed surrounding whitespace. Any
    /// malformation aborts with an error kind; no partial records are produced.
    pub(crate) fn parse(line: &str) -> Result<Self, McBootErrorKind> {
        // Check for start code
        if !line.starts_with(':') {
            return Err(McBootErrorKind::MissingStartCode);
        }

        let hexdigit_part = &line[1..];

        // Validate all characters are hexadecimal
        if !hexdigit_part.chars().all(|ch| ch.is_ascii_hexdigit()) {
            return Err(McBootErrorKind::ContainsInvalidCharacters);
        }

        // Validate record's size
        if line.len() < sizes::SMALLEST_RECORD {
            return Err(McBootErrorKind::RecordTooShort);
        } else if hexdigit_part.len() % 2 != 0 {
            return Err(McBootErrorKind::RecordNotEvenLength);
        }

        // Decode the hex pairs
        let mut bytes: Vec<u8> = Vec::with_capacity(hexdigit_part.len() / sizes::BYTE_CHAR_LEN);
        for i in (0..hexdigit_part.len()).step_by(sizes::BYTE_CHAR_LEN) {
            let byte = u8::from_str_radix(&hexdigit_part[i..i + sizes::BYTE_CHAR_LEN], 16)
                .map_err(|_| McBootErrorKind::ContainsInvalidCharacters)?;
            bytes.push(byte);
        }

        // Declared payload size must match what was actually decoded
        let size = bytes[0];
        let actual = bytes.len() - sizes::OVERHEAD_BYTES;
        if usize::from(size) != actual {
            return Err(McBootErrorKind::RecordSizeMismatch(usize::from(size), actual));
        }

        let address = u16::from_be_bytes([bytes[1], bytes[2]]);
        let kind = RecordKind::from_byte(bytes[3])?;

        if let Some(expected) = kind.expected_payload_length()
            && expected != actual
        {
            return Err(McBootErrorKind::RecordLengthInvalidForKind(
                kind, expected, actual,
            ));
        }

        // Validate checksum over everything but the trailing checksum byte
        let actual_checksum = bytes[bytes.len() - 1];
        let expected_checksum = Self::checksum(&bytes[..bytes.len() - 1]);
        if expected_checksum != actual_checksum {
            return Err(McBootErrorKind::RecordChecksumMismatch(
                expected_checksum,
                actual_checksum,
            ));
        }

        let data = bytes[4..bytes.len() - 1].to_vec();

        Ok(Self {
            kind,
            address,
            size,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_checksum_known_values() {
        // Each tuple = (byte sequence, expected checksum)
        let cases: [(&[u8], u8); 4] = [
            (&[0x01, 0x02, 0x03, 0xAA, 0xFF], 81),
            (&[67, 56, 89, 45], 255),
            (
                &[
                    0x58, 0x84, 0x05, 0xbc, 0x7b, 0xe1, 0xf1, 0x54, 0xbb, 0xab, 0x51, 0x42, 0x7e,
                    0x25, 0x40, 0x50, 0x42, 0x5d, 0xcf, 0x55,
                ],
                211,
            ),
            (
                &[
                    0x10, 0x00, 0x00, 0x00, 0xE0, 0x1A, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x04,
                    0x1A, 0x00, 0x00, 0x08, 0x1A, 0x00, 0x00,
                ],
                178,
            ),
        ];

        for (bytes, expected) in cases {
            assert_eq!(Record::checksum(bytes), expected);
        }
    }

    #[test]
    fn test_checksum_round_trip() {
        // Arrange
        let rng = rand::rng();
        let mut bytes: Vec<u8> = rng
            .sample_iter(rand::distr::StandardUniform)
            .take(64)
            .collect();

        // Act - append the computed checksum
        bytes.push(Record::checksum(&bytes));

        // Assert - the full sequence sums to zero mod 256
        let sum = bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
        assert_eq!(sum, 0);
    }

    #[test]
    fn test_parse_data_record() {
        // Arrange - first record of the flash regression fixture
        let line = ":10000000E01A040000000000041A0000081A0000B2";

        // Act
        let record = Record::parse(line).unwrap();

        // Assert
        assert_eq!(record.kind, RecordKind::Data);
        assert_eq!(record.address, 0);
        assert_eq!(record.size, 16);
        assert_eq!(
            record.data,
            vec![
                0xe0, 0x1a, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x04, 0x1a, 0x00, 0x00, 0x08,
                0x1a, 0x00, 0x00
            ]
        );
    }

    #[test]
    fn test_parse_valid_records() {
        let cases = [
            (":00000001FF", RecordKind::EndOfFile, 0u16, 0usize),
            (":020000021200EA", RecordKind::ExtendedSegmentAddress, 0, 2),
            (":020000040003F7", RecordKind::ExtendedLinearAddress, 0, 2),
            (
                ":10010000214601360121470136007EFE09D2190140",
                RecordKind::Data,
                0x0100,
                16,
            ),
        ];

        for (line, kind, address, data_len) in cases {
            let record = Record::parse(line).unwrap();
            assert_eq!(record.kind, kind);
            assert_eq!(record.address, address);
            assert_eq!(record.data.len(), data_len);
        }
    }

    #[test]
    fn test_parse_invalid_records() {
        let cases = [
            // Removed ':' from record str
            ("00000001FF", McBootErrorKind::MissingStartCode),
            // Payload shorter than record size byte
            (":100000000000FF", McBootErrorKind::RecordSizeMismatch(16, 2)),
            // Payload longer than record size byte
            (
                ":02000000000000FF",
                McBootErrorKind::RecordSizeMismatch(2, 3),
            ),
            // EOF record with fewer chars
            (":0000FF", McBootErrorKind::RecordTooShort),
            // EOF record with extra '0' added
            (":000000001FF", McBootErrorKind::RecordNotEvenLength),
            // Char 'Z' is not a hex digit
            (":0000000ZFF", McBootErrorKind::ContainsInvalidCharacters),
            // Checksum wrong - should be 0xF0
            (
                ":1000000000000000000000000000000000000000AA",
                McBootErrorKind::RecordChecksumMismatch(0xF0, 0xAA),
            ),
            // Record type 0x06 does not exist
            (":00000006FA", McBootErrorKind::InvalidRecordType(0x06)),
            // Extended segment address record must carry 2 bytes
            (
                ":01000002AA53",
                McBootErrorKind::RecordLengthInvalidForKind(
                    RecordKind::ExtendedSegmentAddress,
                    2,
                    1,
                ),
            ),
        ];

        for (line, expected_error) in cases {
            assert_eq!(Record::parse(line).unwrap_err(), expected_error);
        }
    }
}
