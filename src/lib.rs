//! # `mcbootlib`
//!
//! `mcbootlib` turns Intel HEX firmware images into write chunks for
//! Microchip's 16-bit serial bootloader.
//!
//! The library provides:
//! - Intel HEX record decoding with checksum validation (via [`Record`]).
//! - An address-space model of the image (via [`HexFile`]), kept as a sorted,
//!   merged list of [`Segment`]s under insertion and range deletion.
//! - Re-chunking of the cropped image into aligned, padded write blocks
//!   ([`Chunk`]), including the XOR seam merge where two segments' chunk
//!   grids overlap.
//! - The bootloader's fixed-layout packet codecs (via [`protocol`]).
//! - Error handling with [`McBootError`].
//!
//! ## Example
//!
//! ```
//! use mcbootlib::{BootAttrs, prepare};
//!
//! let attrs = BootAttrs {
//!     max_packet_length: 256,
//!     write_size: 8,
//!     memory_start: 6144,
//!     memory_end: 174_080,
//!     ..BootAttrs::default()
//! };
//! let chunks = prepare("tests/fixtures/flash.hex", &attrs).unwrap();
//! assert_eq!(chunks.len(), 5);
//! ```

mod error;
mod hexfile;
mod record;
mod segment;

pub mod protocol;

// Public APIs
pub use error::{McBootError, McBootErrorKind};
pub use hexfile::{HexFile, prepare};
pub use protocol::{BootAttrs, CommandCode, ResponseCode};
pub use record::{Record, RecordKind};
pub use segment::{Chunk, Segment};
