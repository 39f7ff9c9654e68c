//! The `error` module defines the [`McBootError`] enum that describes the errors that
//! can occur while preparing a firmware image for the bootloader.
//! It carries two pieces of information:
//! 1. Where the error occurred, e.g., during record parsing, model maintenance,
//!    chunking, or protocol packet decoding.
//! 2. What kind of error was encountered (via [`McBootErrorKind`]), including the
//!    line number of the hex file where applicable.

use crate::record::RecordKind;
use std::error::Error;
use std::fmt;

#[derive(Debug, PartialEq, Eq)]
pub enum McBootError {
    ParseRecordError(McBootErrorKind, usize),
    ModelError(McBootErrorKind),
    ChunkError(McBootErrorKind),
    DecodePacketError(McBootErrorKind),
}

impl fmt::Display for McBootError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ParseRecordError(base_err, line) => {
                write!(
                    f,
                    "Error encountered during record parsing at line #{line} of the hex file:\n{base_err}",
                )
            }
            Self::ModelError(base_err) => {
                write!(
                    f,
                    "Error encountered while updating the memory model:\n{base_err}",
                )
            }
            Self::ChunkError(base_err) => {
                write!(
                    f,
                    "Error encountered while splitting data into write chunks:\n{base_err}",
                )
            }
            Self::DecodePacketError(base_err) => {
                write!(
                    f,
                    "Error encountered while decoding a bootloader packet:\n{base_err}",
                )
            }
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum McBootErrorKind {
    /// Record does not begin with a ':'
    MissingStartCode,
    /// Record contains non-hexadecimal characters
    ContainsInvalidCharacters,
    /// Record is shorter than the smallest valid
    RecordTooShort,
    /// Record has an odd number of hex digits
    RecordNotEvenLength,
    /// Record's declared payload size does not match the decoded byte count
    RecordSizeMismatch(usize, usize),
    /// Record's payload length does not match the record kind
    RecordLengthInvalidForKind(RecordKind, usize, usize),
    /// Record checksum mismatch
    RecordChecksumMismatch(u8, u8),
    /// Provided record type does not exist
    InvalidRecordType(u8),
    /// Data merged into a segment must be adjacent to one of its edges
    NonAdjacentData,
    /// The model holds no segments yet
    HexFileEmpty,
    /// No data left within the device's program memory window
    EmptyProgramRange,
    /// Chunk size must be a multiple of the alignment
    SizeNotMultipleOfAlignment(u32, u32),
    /// Padding must be exactly one word
    PaddingNotWordSized(usize, u32),
    /// Write size must be a positive whole number of device words
    InvalidWriteSize(u16),
    /// Packet too small for the request header plus one write unit
    PacketLengthTooSmall(u16, u16),
    /// Padded chunking needs the segment to start on a word boundary
    SegmentNotWordAligned(u32, u32),
    /// Padded chunking needs the segment to hold whole words
    SegmentNotWordSized(usize, u32),
    /// Byte does not map to a bootloader command code
    UnknownCommandCode(u8),
    /// Byte does not map to a bootloader response code
    UnknownResponseCode(u8),
}

impl fmt::Display for McBootErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingStartCode => {
                write!(f, "Missing start code ':'")
            }
            Self::ContainsInvalidCharacters => {
                write!(f, "Record contains invalid character(s)")
            }
            Self::RecordTooShort => {
                write!(f, "Record too short")
            }
            Self::RecordNotEvenLength => {
                write!(f, "Record with uneven length")
            }
            Self::RecordSizeMismatch(declared, actual) => {
                write!(
                    f,
                    "Declared payload size is {declared} bytes, found {actual}"
                )
            }
            Self::RecordLengthInvalidForKind(kind, expected, actual) => {
                write!(
                    f,
                    "For record kind {kind:?} expected payload length is {expected} bytes, found {actual}"
                )
            }
            Self::RecordChecksumMismatch(expected, actual) => {
                write!(
                    f,
                    "Invalid record checksum - expected: 0x{expected:02X}, found: 0x{actual:02X}"
                )
            }
            Self::InvalidRecordType(byte) => {
                write!(f, "Invalid record type: 0x{byte:02X}")
            }
            Self::NonAdjacentData => {
                write!(
                    f,
                    "Data added to a segment must be adjacent to the segment's current range"
                )
            }
            Self::HexFileEmpty => {
                write!(f, "Hex file model holds no segments")
            }
            Self::EmptyProgramRange => {
                write!(
                    f,
                    "HEX file contains no data within the program memory range"
                )
            }
            Self::SizeNotMultipleOfAlignment(size, alignment) => {
                write!(
                    f,
                    "Chunk size {size} is not a multiple of alignment {alignment}"
                )
            }
            Self::PaddingNotWordSized(length, word_size) => {
                write!(
                    f,
                    "Padding of {length} byte(s) is not a single {word_size}-byte word"
                )
            }
            Self::InvalidWriteSize(write_size) => {
                write!(
                    f,
                    "Write size of {write_size} byte(s) is not a positive whole number of words"
                )
            }
            Self::PacketLengthTooSmall(packet_length, write_size) => {
                write!(
                    f,
                    "Packet length {packet_length} cannot hold the request header and a {write_size}-byte write unit"
                )
            }
            Self::SegmentNotWordAligned(address, word_size) => {
                write!(
                    f,
                    "Segment start address 0x{address:X} is not aligned to the {word_size}-byte word size"
                )
            }
            Self::SegmentNotWordSized(length, word_size) => {
                write!(
                    f,
                    "Segment of {length} byte(s) does not hold whole {word_size}-byte words"
                )
            }
            Self::UnknownCommandCode(byte) => {
                write!(f, "Unknown command code: 0x{byte:02X}")
            }
            Self::UnknownResponseCode(byte) => {
                write!(f, "Unknown response code: 0x{byte:02X}")
            }
        }
    }
}

impl Error for McBootError {}
impl Error for McBootErrorKind {}
