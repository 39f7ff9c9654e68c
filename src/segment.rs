//! The `segment` module defines [`Segment`], a contiguous address-tagged byte
//! range and the unit of storage in [`HexFile`](crate::HexFile), along with
//! [`Chunk`], the protocol-facing write unit a segment is eventually re-shaped
//! into.

use crate::error::{McBootError, McBootErrorKind};

/// A contiguous run of committed bytes.
///
/// The address range is half-open (`maximum_address` is exclusive) and counted
/// in bytes regardless of `word_size_bytes`; the word size only affects the
/// device-facing [`address`](Self::address). While byte-addressed
/// (`word_size_bytes == 1`), `data.len() == maximum_address - minimum_address`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub minimum_address: u32,
    pub maximum_address: u32,
    pub data: Vec<u8>,
    pub word_size_bytes: u32,
}

/// One bootloader flash-write unit: a device word address plus payload bytes,
/// sized and aligned for a single write command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub address: u32,
    pub data: Vec<u8>,
}

impl Segment {
    #[must_use]
    pub const fn new(
        minimum_address: u32,
        maximum_address: u32,
        data: Vec<u8>,
        word_size_bytes: u32,
    ) -> Self {
        Self {
            minimum_address,
            maximum_address,
            data,
            word_size_bytes,
        }
    }

    /// Device-facing start address, in words.
    #[must_use]
    pub const fn address(&self) -> u32 {
        self.minimum_address / self.word_size_bytes
    }

    /// Payload length, in words.
    #[must_use]
    pub const fn size_words(&self) -> u32 {
        self.data.len() as u32 / self.word_size_bytes
    }

    /// Merge a block of bytes into this segment.
    ///
    /// The block must be adjacent to exactly one edge of the current range:
    /// `minimum_address == self.maximum_address` appends, `maximum_address ==
    /// self.minimum_address` prepends. Any other relationship is a
    /// model-construction bug, not user input.
    pub(crate) fn add_data(
        &mut self,
        minimum_address: u32,
        maximum_address: u32,
        new_data: &[u8],
    ) -> Result<(), McBootError> {
        if minimum_address == self.maximum_address {
            self.maximum_address = maximum_address;
            self.data.extend_from_slice(new_data);
        } else if maximum_address == self.minimum_address {
            self.minimum_address = minimum_address;
            self.data.splice(0..0, new_data.iter().copied());
        } else {
            return Err(McBootError::ModelError(McBootErrorKind::NonAdjacentData));
        }
        Ok(())
    }

    /// Remove the byte range `[minimum_address, maximum_address)` from this
    /// segment.
    ///
    /// Returns the split-off upper remainder when the deletion lands strictly
    /// inside the segment. A deletion covering the whole segment leaves it
    /// degenerate (`maximum_address == minimum_address`); the caller is
    /// responsible for dropping it.
    pub(crate) fn remove_data(
        &mut self,
        minimum_address: u32,
        maximum_address: u32,
    ) -> Option<Self> {
        if minimum_address >= self.maximum_address || maximum_address <= self.minimum_address {
            return None;
        }

        // Clamp the deletion range to this segment's bounds
        let clamped_min = minimum_address.max(self.minimum_address);
        let clamped_max = maximum_address.min(self.maximum_address);

        let before_len = (clamped_min - self.minimum_address) as usize;
        let removed_len = (clamped_max - clamped_min) as usize;
        let after: Vec<u8> = self.data[before_len + removed_len..].to_vec();
        self.data.truncate(before_len);

        if !self.data.is_empty() && !after.is_empty() {
            // Deletion strictly inside: shrink to the lower part, split off the rest
            self.maximum_address = clamped_min;
            let after_len = after.len() as u32;
            return Some(Self::new(
                clamped_max,
                clamped_max + after_len,
                after,
                self.word_size_bytes,
            ));
        }

        if !self.data.is_empty() {
            // Tail trimmed
            self.maximum_address = clamped_min;
        } else if !after.is_empty() {
            // Head trimmed
            self.minimum_address = clamped_max;
            self.data = after;
        } else {
            // Fully removed; leave degenerate for the caller to drop
            self.maximum_address = self.minimum_address;
        }

        None
    }

    /// Split this segment into write-sized pieces of `size` words, aligned to
    /// `alignment` words.
    ///
    /// With a (one-word) `padding` value the segment is padded on both edges
    /// until it starts and ends on an alignment boundary, shifting the reported
    /// start address down accordingly. Without padding a misaligned start
    /// instead yields one short leading chunk covering exactly the misaligned
    /// prefix, so every following chunk starts aligned.
    ///
    /// The final piece may hold fewer than `size` words when no padding is
    /// supplied; its reported `maximum_address` still spans the full chunk
    /// size, matching what the bootloader is told to reserve for the write.
    pub fn chunks(
        &self,
        size: u32,
        alignment: u32,
        padding: &[u8],
    ) -> Result<Vec<Self>, McBootError> {
        validate_chunk_args(size, alignment, padding, self.word_size_bytes)?;

        // Padding advances in whole words; a segment off the word grid would
        // make the pad loops miss every alignment boundary
        if !padding.is_empty() {
            if self.minimum_address % self.word_size_bytes != 0 {
                return Err(McBootError::ChunkError(
                    McBootErrorKind::SegmentNotWordAligned(
                        self.minimum_address,
                        self.word_size_bytes,
                    ),
                ));
            }
            if self.data.len() % self.word_size_bytes as usize != 0 {
                return Err(McBootError::ChunkError(McBootErrorKind::SegmentNotWordSized(
                    self.data.len(),
                    self.word_size_bytes,
                )));
            }
        }

        let byte_size = (size * self.word_size_bytes) as usize;
        let byte_alignment = alignment * self.word_size_bytes;

        let mut address = self.minimum_address;
        let mut data = self.data.clone();
        let mut result = Vec::new();

        if padding.is_empty() {
            if address % byte_alignment != 0 {
                // Emit the misaligned prefix as one short leading chunk
                let prefix = ((byte_alignment - address % byte_alignment) as usize).min(data.len());
                result.push(Self::new(
                    address,
                    address + prefix as u32,
                    data[..prefix].to_vec(),
                    self.word_size_bytes,
                ));
                address += prefix as u32;
                data.drain(..prefix);
            }
        } else {
            // Pad the left edge down to an alignment boundary, one word at a time
            while address % byte_alignment != 0 {
                address -= self.word_size_bytes;
                data.splice(0..0, padding.iter().copied());
            }
            // Pad the right edge up to an alignment boundary
            while data.len() % byte_alignment as usize != 0 {
                data.extend_from_slice(padding);
            }
        }

        for (index, piece) in data.chunks(byte_size).enumerate() {
            let start = address + (index * byte_size) as u32;
            result.push(Self::new(
                start,
                start + byte_size as u32,
                piece.to_vec(),
                self.word_size_bytes,
            ));
        }

        Ok(result)
    }
}

/// Shared argument validation for segment- and model-level chunking.
pub(crate) fn validate_chunk_args(
    size: u32,
    alignment: u32,
    padding: &[u8],
    word_size_bytes: u32,
) -> Result<(), McBootError> {
    if size % alignment != 0 {
        return Err(McBootError::ChunkError(
            McBootErrorKind::SizeNotMultipleOfAlignment(size, alignment),
        ));
    }
    if !padding.is_empty() && padding.len() != word_size_bytes as usize {
        return Err(McBootError::ChunkError(
            McBootErrorKind::PaddingNotWordSized(padding.len(), word_size_bytes),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_in_word_units() {
        // Arrange
        let byte_addressed = Segment::new(12288, 12304, vec![0; 16], 1);
        let word_addressed = Segment::new(12288, 12304, vec![0; 16], 2);

        // Assert
        assert_eq!(byte_addressed.address(), 12288);
        assert_eq!(word_addressed.address(), 6144);
        assert_eq!(byte_addressed.size_words(), 16);
        assert_eq!(word_addressed.size_words(), 8);
    }

    #[test]
    fn test_add_data_append() {
        // Arrange
        let mut segment = Segment::new(0, 4, vec![1, 2, 3, 4], 1);

        // Act
        let res = segment.add_data(4, 8, &[5, 6, 7, 8]);

        // Assert
        assert!(res.is_ok());
        assert_eq!(segment, Segment::new(0, 8, vec![1, 2, 3, 4, 5, 6, 7, 8], 1));
    }

    #[test]
    fn test_add_data_prepend() {
        // Arrange
        let mut segment = Segment::new(4, 8, vec![5, 6, 7, 8], 1);

        // Act
        let res = segment.add_data(0, 4, &[1, 2, 3, 4]);

        // Assert
        assert!(res.is_ok());
        assert_eq!(segment, Segment::new(0, 8, vec![1, 2, 3, 4, 5, 6, 7, 8], 1));
    }

    #[test]
    fn test_add_data_non_adjacent() {
        // Arrange
        let mut segment = Segment::new(0, 4, vec![1, 2, 3, 4], 1);

        // Act
        let res = segment.add_data(6, 10, &[5, 6, 7, 8]);

        // Assert
        assert_eq!(
            res,
            Err(McBootError::ModelError(McBootErrorKind::NonAdjacentData))
        );
    }

    #[test]
    fn test_remove_data_splits_segment() {
        // Arrange - 100 bytes, delete the middle fifth
        let mut segment = Segment::new(0, 100, (0..100).collect(), 1);

        // Act
        let split = segment.remove_data(40, 60);

        // Assert
        assert_eq!(segment, Segment::new(0, 40, (0..40).collect(), 1));
        assert_eq!(split, Some(Segment::new(60, 100, (60..100).collect(), 1)));
    }

    #[test]
    fn test_remove_data_trims_tail() {
        // Arrange
        let mut segment = Segment::new(0, 10, (0..10).collect(), 1);

        // Act
        let split = segment.remove_data(6, 20);

        // Assert
        assert!(split.is_none());
        assert_eq!(segment, Segment::new(0, 6, (0..6).collect(), 1));
    }

    #[test]
    fn test_remove_data_trims_head() {
        // Arrange
        let mut segment = Segment::new(10, 20, (0..10).collect(), 1);

        // Act
        let split = segment.remove_data(0, 14);

        // Assert
        assert!(split.is_none());
        assert_eq!(segment, Segment::new(14, 20, (4..10).collect(), 1));
    }

    #[test]
    fn test_remove_data_covers_whole_segment() {
        // Arrange
        let mut segment = Segment::new(10, 20, (0..10).collect(), 1);

        // Act
        let split = segment.remove_data(0, 100);

        // Assert - degenerate, for the caller to drop
        assert!(split.is_none());
        assert_eq!(segment.minimum_address, segment.maximum_address);
        assert!(segment.data.is_empty());
    }

    #[test]
    fn test_remove_data_outside_range() {
        // Arrange
        let mut segment = Segment::new(10, 20, (0..10).collect(), 1);

        // Act
        let split = segment.remove_data(20, 30);

        // Assert - untouched
        assert!(split.is_none());
        assert_eq!(segment, Segment::new(10, 20, (0..10).collect(), 1));
    }

    #[test]
    fn test_chunks_aligned_slicing() {
        // Arrange
        let segment = Segment::new(0, 12, (0..12).collect(), 1);

        // Act
        let chunks = segment.chunks(4, 4, &[]).unwrap();

        // Assert
        assert_eq!(
            chunks,
            vec![
                Segment::new(0, 4, vec![0, 1, 2, 3], 1),
                Segment::new(4, 8, vec![4, 5, 6, 7], 1),
                Segment::new(8, 12, vec![8, 9, 10, 11], 1),
            ]
        );
    }

    #[test]
    fn test_chunks_unpadded_leading_prefix() {
        // Arrange - starts 3 bytes past an alignment boundary
        let segment = Segment::new(3, 13, (100..110).collect(), 1);

        // Act
        let chunks = segment.chunks(4, 4, &[]).unwrap();

        // Assert - one short leading chunk, then aligned slices; the last
        // slice is short but reports the full chunk span
        assert_eq!(
            chunks,
            vec![
                Segment::new(3, 4, vec![100], 1),
                Segment::new(4, 8, vec![101, 102, 103, 104], 1),
                Segment::new(8, 12, vec![105, 106, 107, 108], 1),
                Segment::new(12, 16, vec![109], 1),
            ]
        );
    }

    #[test]
    fn test_chunks_padding_both_edges() {
        // Arrange - word-addressed segment starting one word past a boundary
        let segment = Segment::new(6, 12, vec![1, 2, 3, 4, 5, 6], 2);

        // Act
        let chunks = segment.chunks(4, 2, &[0xFF, 0xFF]).unwrap();

        // Assert - left padding shifts the start down to the boundary
        assert_eq!(
            chunks,
            vec![Segment::new(
                4,
                12,
                vec![0xFF, 0xFF, 1, 2, 3, 4, 5, 6],
                2
            )]
        );
    }

    #[test]
    fn test_chunks_right_padding() {
        // Arrange - 5 bytes, alignment 4, zero padding
        let segment = Segment::new(0, 5, vec![10, 11, 12, 13, 14], 1);

        // Act
        let chunks = segment.chunks(8, 4, &[0]).unwrap();

        // Assert
        assert_eq!(
            chunks,
            vec![Segment::new(0, 8, vec![10, 11, 12, 13, 14, 0, 0, 0], 1)]
        );
    }

    #[test]
    fn test_chunks_invalid_arguments() {
        // Arrange
        let segment = Segment::new(0, 8, vec![0; 8], 2);

        // Act + Assert - size not a multiple of alignment
        assert_eq!(
            segment.chunks(6, 4, &[]),
            Err(McBootError::ChunkError(
                McBootErrorKind::SizeNotMultipleOfAlignment(6, 4)
            ))
        );

        // Act + Assert - padding is not one word
        assert_eq!(
            segment.chunks(4, 4, &[0]),
            Err(McBootError::ChunkError(McBootErrorKind::PaddingNotWordSized(
                1, 2
            )))
        );
    }

    #[test]
    fn test_chunks_padded_rejects_off_word_segments() {
        // Arrange - word-addressed segments off the word grid
        let odd_start = Segment::new(5, 9, vec![1, 2, 3, 4], 2);
        let odd_length = Segment::new(4, 9, vec![1, 2, 3, 4, 5], 2);

        // Act + Assert - padded chunking must reject both instead of
        // searching for an alignment boundary it can never land on
        assert_eq!(
            odd_start.chunks(4, 2, &[0, 0]),
            Err(McBootError::ChunkError(
                McBootErrorKind::SegmentNotWordAligned(5, 2)
            ))
        );
        assert_eq!(
            odd_length.chunks(4, 2, &[0, 0]),
            Err(McBootError::ChunkError(
                McBootErrorKind::SegmentNotWordSized(5, 2)
            ))
        );
    }
}
