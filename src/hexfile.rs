//! The `hexfile` module holds [`HexFile`], the in-memory model of a firmware
//! image: an ordered, non-overlapping list of [`Segment`]s built from Intel
//! HEX records, with cropping to the device's program window and re-chunking
//! into bootloader write blocks. [`prepare`] is the one-call pipeline from a
//! hex file on disk to a ready-to-send chunk list.

use std::fs;
use std::path::Path;

use crate::error::{McBootError, McBootErrorKind};
use crate::protocol::{BootAttrs, Command};
use crate::record::{Record, RecordKind};
use crate::segment::{Chunk, Segment, validate_chunk_args};

/// Flash on the supported PIC24/dsPIC33 families is addressed in 2-byte
/// instruction words.
const DEVICE_WORD_SIZE: u32 = 2;

/// A firmware image assembled from Intel HEX records.
///
/// Segments are kept sorted ascending by start address, pairwise disjoint and
/// never merely adjacent: touching ranges are merged on insertion, so the list
/// is always a minimal tiling of committed memory.
#[derive(Debug, Clone, Default)]
pub struct HexFile {
    segments: Vec<Segment>,
    /// Every data record's range exactly as decoded, unmerged. Diagnostics only.
    raw_segments: Vec<Segment>,
    /// Index of the most recently grown segment, so sequential records append
    /// without a scan. Invalidated by any deletion.
    current_segment_index: Option<usize>,
    word_size_bytes: u32,
    execution_start_address: Option<u32>,
}

impl HexFile {
    /// Creates an empty model in the byte-addressed decode phase.
    #[must_use]
    pub fn new() -> Self {
        Self {
            segments: Vec::new(),
            raw_segments: Vec::new(),
            current_segment_index: None,
            word_size_bytes: 1,
            execution_start_address: None,
        }
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    #[must_use]
    pub fn raw_segments(&self) -> &[Segment] {
        &self.raw_segments
    }

    /// Execution start address from the last `StartSegmentAddress` or
    /// `StartLinearAddress` record, if any. Built from the first two payload
    /// bytes; the lower half-word of the vector is not kept.
    #[must_use]
    pub const fn execution_start_address(&self) -> Option<u32> {
        self.execution_start_address
    }

    /// Total committed payload across all segments, in words.
    #[must_use]
    pub fn total_word_length(&self) -> u32 {
        self.segments.iter().map(Segment::size_words).sum::<u32>()
    }

    /// Decode Intel HEX text into the model, one record per line.
    ///
    /// Lines are trimmed of surrounding whitespace first; an empty or
    /// unmarked line is a fatal format error carrying its 1-based line
    /// number. Every line is decoded and validated, `EndOfFile` records
    /// included; they carry no data and are otherwise ignored.
    ///
    /// # Examples
    ///
    /// ```
    /// use mcbootlib::HexFile;
    ///
    /// let mut hexfile = HexFile::new();
    /// hexfile.add_ihex(":10000000E01A040000000000041A0000081A0000B2\n:00000001FF")?;
    /// assert_eq!(hexfile.segments().len(), 1);
    /// assert_eq!(hexfile.total_word_length(), 16);
    /// # Ok::<(), mcbootlib::McBootError>(())
    /// ```
    pub fn add_ihex(&mut self, text: &str) -> Result<(), McBootError> {
        let mut extended_segment_address: u32 = 0;
        let mut extended_linear_address: u32 = 0;

        for (index, raw_line) in text.lines().enumerate() {
            let line_number = index + 1;
            let record = Record::parse(raw_line.trim())
                .map_err(|kind| McBootError::ParseRecordError(kind, line_number))?;

            match record.kind {
                RecordKind::Data => {
                    let minimum_address = u32::from(record.address);
                    let maximum_address = minimum_address + u32::from(record.size);
                    self.raw_segments.push(Segment::new(
                        minimum_address,
                        maximum_address,
                        record.data.clone(),
                        self.word_size_bytes,
                    ));
                    self.insert(minimum_address, maximum_address, &record.data)?;
                }
                RecordKind::EndOfFile => {}
                RecordKind::ExtendedSegmentAddress => {
                    extended_segment_address =
                        u32::from(u16::from_be_bytes([record.data[0], record.data[1]])) * 16;
                    log::debug!(
                        "line {line_number}: extended segment address {extended_segment_address:#x}"
                    );
                }
                RecordKind::ExtendedLinearAddress => {
                    extended_linear_address =
                        u32::from(u16::from_be_bytes([record.data[0], record.data[1]])) << 16;
                    log::debug!(
                        "line {line_number}: extended linear address {extended_linear_address:#x}"
                    );
                }
                RecordKind::StartSegmentAddress | RecordKind::StartLinearAddress => {
                    // Only the first two payload bytes are retained
                    self.execution_start_address = Some(u32::from(u16::from_be_bytes([
                        record.data[0],
                        record.data[1],
                    ])));
                }
            }
        }

        Ok(())
    }

    /// Commit the byte range `[minimum_address, maximum_address)` into the
    /// model, merging with any segment it touches.
    pub fn insert(
        &mut self,
        minimum_address: u32,
        maximum_address: u32,
        data: &[u8],
    ) -> Result<(), McBootError> {
        if self.segments.is_empty() {
            self.segments.push(Segment::new(
                minimum_address,
                maximum_address,
                data.to_vec(),
                self.word_size_bytes,
            ));
            self.current_segment_index = Some(0);
            return Ok(());
        }

        let mut placed = None;

        // Fast path: sequential records extend the last-touched segment
        if let Some(hint) = self.current_segment_index {
            if minimum_address == self.segments[hint].maximum_address {
                self.segments[hint].add_data(minimum_address, maximum_address, data)?;
                placed = Some(hint);
            }
        }

        let index = match placed {
            Some(index) => index,
            None => {
                // First segment whose end reaches the new range
                match self
                    .segments
                    .iter()
                    .position(|segment| segment.maximum_address >= minimum_address)
                {
                    None => {
                        self.segments.push(Segment::new(
                            minimum_address,
                            maximum_address,
                            data.to_vec(),
                            self.word_size_bytes,
                        ));
                        self.segments.len() - 1
                    }
                    Some(index) if maximum_address < self.segments[index].minimum_address => {
                        self.segments.insert(
                            index,
                            Segment::new(
                                minimum_address,
                                maximum_address,
                                data.to_vec(),
                                self.word_size_bytes,
                            ),
                        );
                        index
                    }
                    Some(index) => {
                        self.segments[index].add_data(minimum_address, maximum_address, data)?;
                        index
                    }
                }
            }
        };

        // The grown segment may now reach into its successors; collapse them
        while index + 1 < self.segments.len()
            && self.segments[index].maximum_address >= self.segments[index + 1].minimum_address
        {
            let next = self.segments.remove(index + 1);
            let current_max = self.segments[index].maximum_address;
            if current_max >= next.maximum_address {
                // Fully subsumed
                continue;
            }
            let tail_start = (current_max - next.minimum_address) as usize;
            self.segments[index].add_data(
                current_max,
                next.maximum_address,
                &next.data[tail_start..],
            )?;
            break;
        }

        self.current_segment_index = Some(index);
        Ok(())
    }

    /// Restrict the model to the word range `[minimum_word, maximum_word)`.
    ///
    /// Bounds are converted to bytes using the model's current word size. The
    /// highest committed address serves as the removal ceiling, so the model
    /// must be non-empty.
    pub fn crop(&mut self, minimum_word: u32, maximum_word: u32) -> Result<(), McBootError> {
        let ceiling = self
            .segments
            .last()
            .map(|segment| segment.maximum_address)
            .ok_or(McBootError::ModelError(McBootErrorKind::HexFileEmpty))?;

        let minimum_byte = minimum_word * self.word_size_bytes;
        let maximum_byte = maximum_word * self.word_size_bytes;
        self.remove_range(0, minimum_byte);
        self.remove_range(maximum_byte, ceiling);
        Ok(())
    }

    /// Delete the byte range `[minimum_address, maximum_address)` from every
    /// segment, dropping emptied segments and keeping split remainders in
    /// address order.
    pub fn remove_range(&mut self, minimum_address: u32, maximum_address: u32) {
        let mut rebuilt = Vec::with_capacity(self.segments.len());
        for mut segment in self.segments.drain(..) {
            let split = segment.remove_data(minimum_address, maximum_address);
            if segment.maximum_address > segment.minimum_address {
                rebuilt.push(segment);
            }
            if let Some(split) = split {
                rebuilt.push(split);
            }
        }
        self.segments = rebuilt;
        // Indices shifted; the hint no longer names the segment it did
        self.current_segment_index = None;
    }

    /// Switch the model's addressing phase, retagging every segment in place.
    /// Data is untouched; only the unit of `address()` changes.
    pub fn set_word_size_bytes(&mut self, word_size_bytes: u32) {
        self.word_size_bytes = word_size_bytes;
        for segment in &mut self.segments {
            segment.word_size_bytes = word_size_bytes;
        }
    }

    /// Chunk every segment per [`Segment::chunks`] and concatenate the
    /// results in address order.
    ///
    /// When two segments' independent alignment padding makes their chunk
    /// grids share one alignment word, the overlapping tail of the previous
    /// chunk and head of the next are combined by byte-wise XOR (with the
    /// padding value XOR-ed out once, since both sides contributed it). The
    /// previous chunk is emitted unchanged; writing both in order yields the
    /// correct seam word on the device.
    pub fn chunks(
        &self,
        size: u32,
        alignment: u32,
        padding: &[u8],
    ) -> Result<Vec<Segment>, McBootError> {
        validate_chunk_args(size, alignment, padding, self.word_size_bytes)?;

        let mut result: Vec<Segment> = Vec::new();
        for segment in &self.segments {
            let mut pieces = segment.chunks(size, alignment, padding)?;
            if !padding.is_empty() {
                if let (Some(previous), Some(first)) = (result.last(), pieces.first_mut()) {
                    let previous_data_end =
                        previous.minimum_address + previous.data.len() as u32;
                    if first.minimum_address < previous_data_end {
                        let seam = (alignment * self.word_size_bytes) as usize;
                        let offset =
                            (first.minimum_address - previous.minimum_address) as usize;
                        let merged: Vec<u8> = previous.data[offset..offset + seam]
                            .iter()
                            .zip(&first.data[..seam])
                            .enumerate()
                            .map(|(i, (low, high))| low ^ high ^ padding[i % padding.len()])
                            .collect();
                        first.data.splice(..seam, merged);
                    }
                }
            }
            result.extend(pieces);
        }
        Ok(result)
    }
}

/// Turn a hex file on disk into bootloader write chunks for the device
/// described by `attrs`.
///
/// The image is cropped to `[attrs.memory_start, attrs.memory_end)`, retagged
/// to word addressing, and sliced into zero-padded chunks sized to fill one
/// write packet and aligned to the device's write unit. Attributes that leave
/// no room for a single write unit, or a write size that is not a positive
/// whole number of words, are rejected before the file is read. An unreadable
/// file is reported as an empty chunk list; every later failure aborts the
/// run.
///
/// # Examples
///
/// ```no_run
/// use mcbootlib::{BootAttrs, prepare};
///
/// let attrs = BootAttrs {
///     max_packet_length: 256,
///     write_size: 8,
///     memory_start: 6144,
///     memory_end: 174_080,
///     ..BootAttrs::default()
/// };
/// let chunks = prepare("firmware.hex", &attrs)?;
/// for chunk in &chunks {
///     println!("{:#x}: {} bytes", chunk.address, chunk.data.len());
/// }
/// # Ok::<(), mcbootlib::McBootError>(())
/// ```
pub fn prepare<P: AsRef<Path>>(path: P, attrs: &BootAttrs) -> Result<Vec<Chunk>, McBootError> {
    let write_size = u32::from(attrs.write_size);
    if write_size == 0 || write_size % DEVICE_WORD_SIZE != 0 {
        return Err(McBootError::ChunkError(McBootErrorKind::InvalidWriteSize(
            attrs.write_size,
        )));
    }
    if u32::from(attrs.max_packet_length) < Command::SIZE as u32 + write_size {
        return Err(McBootError::ChunkError(
            McBootErrorKind::PacketLengthTooSmall(attrs.max_packet_length, attrs.write_size),
        ));
    }

    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) => {
            log::warn!("could not read {}: {err}", path.as_ref().display());
            return Ok(Vec::new());
        }
    };

    let mut hexfile = HexFile::new();
    hexfile.add_ihex(&text)?;
    hexfile.crop(attrs.memory_start, attrs.memory_end)?;
    hexfile.set_word_size_bytes(DEVICE_WORD_SIZE);

    if hexfile.total_word_length() * DEVICE_WORD_SIZE == 0 {
        return Err(McBootError::ChunkError(McBootErrorKind::EmptyProgramRange));
    }

    let payload_capacity = u32::from(attrs.max_packet_length) - Command::SIZE as u32;
    let chunk_size = payload_capacity / write_size * write_size / DEVICE_WORD_SIZE;
    let alignment = write_size / DEVICE_WORD_SIZE;

    log::info!(
        "prepared {} words in {} segment(s), chunk size {chunk_size} words, alignment {alignment}",
        hexfile.total_word_length(),
        hexfile.segments().len()
    );

    let chunks = hexfile.chunks(chunk_size, alignment, &[0, 0])?;
    Ok(chunks
        .into_iter()
        .map(|segment| Chunk {
            address: segment.address(),
            data: segment.data,
        })
        .collect())
}
