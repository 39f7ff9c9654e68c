//! The `protocol` module defines the bootloader's fixed-layout packets:
//! little-endian wire structures with explicit offsets and `to_bytes` /
//! `from_bytes` pairs. Only the codecs live here; the serial session that
//! exchanges them is a collaborator's concern.

use crate::error::{McBootError, McBootErrorKind};

/// Request codes understood by the bootloader.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CommandCode {
    ReadVersion = 0x00,
    ReadFlash = 0x01,
    WriteFlash = 0x02,
    EraseFlash = 0x03,
    CalcChecksum = 0x08,
    ResetDevice = 0x09,
    SelfVerify = 0x0A,
    GetMemoryAddressRange = 0x0B,
}

impl TryFrom<u8> for CommandCode {
    type Error = McBootError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            0x00 => Ok(Self::ReadVersion),
            0x01 => Ok(Self::ReadFlash),
            0x02 => Ok(Self::WriteFlash),
            0x03 => Ok(Self::EraseFlash),
            0x08 => Ok(Self::CalcChecksum),
            0x09 => Ok(Self::ResetDevice),
            0x0A => Ok(Self::SelfVerify),
            0x0B => Ok(Self::GetMemoryAddressRange),
            _ => Err(McBootError::DecodePacketError(
                McBootErrorKind::UnknownCommandCode(byte),
            )),
        }
    }
}

/// Status byte carried by every bootloader response.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ResponseCode {
    Success = 0x01,
    VerifyFail = 0xFC,
    BadLength = 0xFD,
    BadAddress = 0xFE,
    UnsupportedCommand = 0xFF,
}

impl TryFrom<u8> for ResponseCode {
    type Error = McBootError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            0x01 => Ok(Self::Success),
            0xFC => Ok(Self::VerifyFail),
            0xFD => Ok(Self::BadLength),
            0xFE => Ok(Self::BadAddress),
            0xFF => Ok(Self::UnsupportedCommand),
            _ => Err(McBootError::DecodePacketError(
                McBootErrorKind::UnknownResponseCode(byte),
            )),
        }
    }
}

/// Request header sent ahead of every command.
///
/// Layout: `command (1) | data_length (2) | unlock_sequence (4) | address (4)`,
/// all little-endian. [`Command::SIZE`] is the packet-overhead constant that
/// bounds the payload of a flash-write chunk.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Command {
    pub command: CommandCode,
    pub data_length: u16,
    pub unlock_sequence: u32,
    pub address: u32,
}

impl Command {
    pub const SIZE: usize = 11;

    /// A header with all numeric fields zeroed.
    #[must_use]
    pub const fn new(command: CommandCode) -> Self {
        Self {
            command,
            data_length: 0,
            unlock_sequence: 0,
            address: 0,
        }
    }

    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buffer = [0u8; Self::SIZE];
        buffer[0] = self.command as u8;
        buffer[1..3].copy_from_slice(&self.data_length.to_le_bytes());
        buffer[3..7].copy_from_slice(&self.unlock_sequence.to_le_bytes());
        buffer[7..11].copy_from_slice(&self.address.to_le_bytes());
        buffer
    }

    pub fn from_bytes(buffer: &[u8; Self::SIZE]) -> Result<Self, McBootError> {
        Ok(Self {
            command: CommandCode::try_from(buffer[0])?,
            data_length: u16::from_le_bytes([buffer[1], buffer[2]]),
            unlock_sequence: u32::from_le_bytes([buffer[3], buffer[4], buffer[5], buffer[6]]),
            address: u32::from_le_bytes([buffer[7], buffer[8], buffer[9], buffer[10]]),
        })
    }
}

/// Echoed request header plus a status byte at offset 11.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub command: Command,
    pub success: ResponseCode,
}

impl Response {
    pub const SIZE: usize = 12;

    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buffer = [0u8; Self::SIZE];
        buffer[..Command::SIZE].copy_from_slice(&self.command.to_bytes());
        buffer[11] = self.success as u8;
        buffer
    }

    pub fn from_bytes(buffer: &[u8; Self::SIZE]) -> Result<Self, McBootError> {
        let mut header = [0u8; Command::SIZE];
        header.copy_from_slice(&buffer[..Command::SIZE]);
        Ok(Self {
            command: Command::from_bytes(&header)?,
            success: ResponseCode::try_from(buffer[11])?,
        })
    }
}

/// `ReadVersion` response. The device description fields sit at fixed offsets
/// past the header, with reserved gaps in between.
///
/// Layout past the header: `version @11 | max_packet_length @13 | reserved |
/// device_id @17 | reserved | erase_size @21 | write_size @23 | reserved`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Version {
    pub command: Command,
    pub version: u16,
    pub max_packet_length: u16,
    pub device_id: u16,
    pub erase_size: u16,
    pub write_size: u16,
}

impl Version {
    pub const SIZE: usize = 37;

    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buffer = [0u8; Self::SIZE];
        buffer[..Command::SIZE].copy_from_slice(&self.command.to_bytes());
        buffer[11..13].copy_from_slice(&self.version.to_le_bytes());
        buffer[13..15].copy_from_slice(&self.max_packet_length.to_le_bytes());
        buffer[17..19].copy_from_slice(&self.device_id.to_le_bytes());
        buffer[21..23].copy_from_slice(&self.erase_size.to_le_bytes());
        buffer[23..25].copy_from_slice(&self.write_size.to_le_bytes());
        buffer
    }

    pub fn from_bytes(buffer: &[u8; Self::SIZE]) -> Result<Self, McBootError> {
        let mut header = [0u8; Command::SIZE];
        header.copy_from_slice(&buffer[..Command::SIZE]);
        Ok(Self {
            command: Command::from_bytes(&header)?,
            version: u16::from_le_bytes([buffer[11], buffer[12]]),
            max_packet_length: u16::from_le_bytes([buffer[13], buffer[14]]),
            device_id: u16::from_le_bytes([buffer[17], buffer[18]]),
            erase_size: u16::from_le_bytes([buffer[21], buffer[22]]),
            write_size: u16::from_le_bytes([buffer[23], buffer[24]]),
        })
    }
}

/// `GetMemoryAddressRange` response: the flashable program window.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MemoryRange {
    pub response: Response,
    pub program_start: u32,
    pub program_end: u32,
}

impl MemoryRange {
    pub const SIZE: usize = 20;

    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buffer = [0u8; Self::SIZE];
        buffer[..Response::SIZE].copy_from_slice(&self.response.to_bytes());
        buffer[12..16].copy_from_slice(&self.program_start.to_le_bytes());
        buffer[16..20].copy_from_slice(&self.program_end.to_le_bytes());
        buffer
    }

    pub fn from_bytes(buffer: &[u8; Self::SIZE]) -> Result<Self, McBootError> {
        let mut base = [0u8; Response::SIZE];
        base.copy_from_slice(&buffer[..Response::SIZE]);
        Ok(Self {
            response: Response::from_bytes(&base)?,
            program_start: u32::from_le_bytes([buffer[12], buffer[13], buffer[14], buffer[15]]),
            program_end: u32::from_le_bytes([buffer[16], buffer[17], buffer[18], buffer[19]]),
        })
    }
}

/// `CalcChecksum` response carrying the device-computed checksum.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Checksum {
    pub response: Response,
    pub checksum: u16,
}

impl Checksum {
    pub const SIZE: usize = 14;

    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buffer = [0u8; Self::SIZE];
        buffer[..Response::SIZE].copy_from_slice(&self.response.to_bytes());
        buffer[12..14].copy_from_slice(&self.checksum.to_le_bytes());
        buffer
    }

    pub fn from_bytes(buffer: &[u8; Self::SIZE]) -> Result<Self, McBootError> {
        let mut base = [0u8; Response::SIZE];
        base.copy_from_slice(&buffer[..Response::SIZE]);
        Ok(Self {
            response: Response::from_bytes(&base)?,
            checksum: u16::from_le_bytes([buffer[12], buffer[13]]),
        })
    }
}

/// Everything the chunk-preparation pipeline needs to know about the attached
/// device, gathered by the caller from `ReadVersion` and
/// `GetMemoryAddressRange` exchanges. `memory_end` is exclusive.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct BootAttrs {
    pub version: u16,
    pub max_packet_length: u16,
    pub device_id: u16,
    pub erase_size: u16,
    pub write_size: u16,
    pub memory_start: u32,
    pub memory_end: u32,
    pub has_checksum: bool,
}
