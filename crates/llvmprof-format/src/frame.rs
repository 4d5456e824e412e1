//! Record framing: header encoding, argument padding and a frame parser.
//!
//! Every record is `[i32 tag][count][payload]` in native byte order. The count
//! is 4 bytes for argument and word-counter records and 8 bytes otherwise.
//! Only the argument record is padded, with zeros up to a multiple of
//! [`ARGUMENT_ALIGN`] payload bytes.

use crate::element::{decode_payload, CounterElement};
use crate::error::{Error, Result};
use crate::record::{CountWidth, Layout, RecordType, TAG_SIZE};

/// Alignment of the argument record payload.
pub const ARGUMENT_ALIGN: usize = 4;

/// Largest possible header: tag plus an 8-byte count.
pub const MAX_HEADER_LEN: usize = TAG_SIZE + 8;

/// Zero bytes used to pad the argument record.
pub const ZERO_PADDING: [u8; ARGUMENT_ALIGN] = [0; ARGUMENT_ALIGN];

/// Number of zero bytes following an argument payload of `len` bytes.
#[inline]
#[must_use]
pub const fn argument_padding(len: usize) -> usize {
    (ARGUMENT_ALIGN - len % ARGUMENT_ALIGN) % ARGUMENT_ALIGN
}

/// Encoded tag and count of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    buf: [u8; MAX_HEADER_LEN],
    len: usize,
}

impl RecordHeader {
    /// Encode a header with a raw tag.
    ///
    /// Fails if `count` does not fit in `width`.
    pub fn new(tag: i32, width: CountWidth, count: u64) -> Result<Self> {
        let mut buf = [0u8; MAX_HEADER_LEN];
        buf[..TAG_SIZE].copy_from_slice(&tag.to_ne_bytes());
        let count_bytes = match width {
            CountWidth::U32 => {
                let count = u32::try_from(count).map_err(|_| Error::CountOverflow {
                    count,
                    width: width.bytes(),
                })?;
                buf[TAG_SIZE..TAG_SIZE + 4].copy_from_slice(&count.to_ne_bytes());
                4
            }
            CountWidth::U64 => {
                buf[TAG_SIZE..TAG_SIZE + 8].copy_from_slice(&count.to_ne_bytes());
                8
            }
        };
        Ok(Self {
            buf,
            len: TAG_SIZE + count_bytes,
        })
    }

    /// Encode a header for a known record type.
    pub fn for_type(ty: RecordType, count: u64) -> Result<Self> {
        Self::new(ty.tag(), ty.layout().count_width(), count)
    }

    /// Header bytes as written to disk.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

/// Encode the complete argument record, padding included.
pub fn encode_arguments(args: &[u8]) -> Result<Vec<u8>> {
    let header = RecordHeader::for_type(RecordType::ArgumentInfo, args.len() as u64)?;
    let padding = argument_padding(args.len());
    let mut out = Vec::with_capacity(header.as_bytes().len() + args.len() + padding);
    out.extend_from_slice(header.as_bytes());
    out.extend_from_slice(args);
    out.extend_from_slice(&ZERO_PADDING[..padding]);
    Ok(out)
}

/// A single parsed record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame<'a> {
    /// Record type from the tag.
    pub record_type: RecordType,
    /// Count field: bytes for arguments, elements for counters.
    pub count: u64,
    /// Payload bytes, without padding.
    pub payload: &'a [u8],
}

impl<'a> Frame<'a> {
    /// Saved argument bytes, if this is the argument record.
    #[must_use]
    pub fn arguments(&self) -> Option<&'a [u8]> {
        (self.record_type == RecordType::ArgumentInfo).then_some(self.payload)
    }

    /// Decode the payload as counters of type `T`.
    ///
    /// Returns `None` if the record does not hold `T` elements.
    #[must_use]
    pub fn elements<T: CounterElement>(&self) -> Option<Vec<T>> {
        match self.record_type.layout() {
            Layout::Counters(kind) if kind == T::KIND => decode_payload(self.payload),
            _ => None,
        }
    }
}

/// Iterator over the records of a profile file held in memory.
///
/// Stops after the first error.
#[derive(Debug, Clone)]
pub struct FrameReader<'a> {
    input: &'a [u8],
    offset: usize,
    failed: bool,
}

impl<'a> FrameReader<'a> {
    /// Create a reader over a complete profile.
    #[must_use]
    pub const fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            offset: 0,
            failed: false,
        }
    }

    /// Byte offset of the next record.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    fn bytes(&self, start: usize, at: usize, len: usize) -> Result<&'a [u8]> {
        let end = at.checked_add(len);
        match end {
            Some(end) if end <= self.input.len() => Ok(&self.input[at..end]),
            _ => Err(Error::Truncated {
                offset: start,
                needed: end.map_or(usize::MAX, |end| end - start),
                available: self.input.len() - start,
            }),
        }
    }

    fn read_frame(&mut self) -> Result<Frame<'a>> {
        let start = self.offset;
        let tag_bytes = self.bytes(start, start, TAG_SIZE)?;
        let tag = i32::from_ne_bytes(tag_bytes.try_into().unwrap_or_default());
        let record_type = RecordType::from_tag(tag)?;
        let layout = record_type.layout();

        let count_at = start + TAG_SIZE;
        let width = layout.count_width();
        let count_bytes = self.bytes(start, count_at, width.bytes())?;
        let count = match width {
            CountWidth::U32 => u64::from(u32::from_ne_bytes(
                count_bytes.try_into().unwrap_or_default(),
            )),
            CountWidth::U64 => u64::from_ne_bytes(count_bytes.try_into().unwrap_or_default()),
        };

        let payload_len = usize::try_from(count)
            .ok()
            .and_then(|count| count.checked_mul(layout.element_width()))
            .ok_or(Error::CountOverflow {
                count,
                width: width.bytes(),
            })?;
        let payload_at = count_at + width.bytes();
        let payload = self.bytes(start, payload_at, payload_len)?;

        let padding = match layout {
            Layout::Arguments => argument_padding(payload_len),
            Layout::Counters(_) => 0,
        };
        self.bytes(start, payload_at + payload_len, padding)?;
        self.offset = payload_at + payload_len + padding;

        Ok(Frame {
            record_type,
            count,
            payload,
        })
    }
}

impl<'a> Iterator for FrameReader<'a> {
    type Item = Result<Frame<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset >= self.input.len() {
            return None;
        }
        let frame = self.read_frame();
        if frame.is_err() {
            self.failed = true;
        }
        Some(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::payload_bytes;

    fn counter_record(ty: RecordType, payload: &[u8], count: u64) -> Vec<u8> {
        let mut out = RecordHeader::for_type(ty, count).unwrap().as_bytes().to_vec();
        out.extend_from_slice(payload);
        out
    }

    #[test]
    fn padding_rounds_up_to_four() {
        assert_eq!(argument_padding(0), 0);
        assert_eq!(argument_padding(1), 3);
        assert_eq!(argument_padding(2), 2);
        assert_eq!(argument_padding(3), 1);
        assert_eq!(argument_padding(4), 0);
        assert_eq!(argument_padding(9), 3);
    }

    #[test]
    fn word_header_has_four_byte_count() {
        let header = RecordHeader::for_type(RecordType::EdgeInfo, 3).unwrap();
        let bytes = header.as_bytes();
        assert_eq!(bytes.len(), 8);
        assert_eq!(&bytes[..4], &4i32.to_ne_bytes());
        assert_eq!(&bytes[4..], &3u32.to_ne_bytes());
    }

    #[test]
    fn wide_header_has_eight_byte_count() {
        let header = RecordHeader::for_type(RecordType::TimeInfo, 2).unwrap();
        assert_eq!(header.as_bytes().len(), 12);
        assert_eq!(&header.as_bytes()[4..], &2u64.to_ne_bytes());
    }

    #[test]
    fn word_count_overflow_is_rejected() {
        let err = RecordHeader::new(4, CountWidth::U32, u64::from(u32::MAX) + 1).unwrap_err();
        assert!(matches!(err, Error::CountOverflow { width: 4, .. }));
    }

    #[test]
    fn empty_arguments_are_header_only() {
        let record = encode_arguments(b"").unwrap();
        assert_eq!(record.len(), 8);
        assert_eq!(&record[4..], &0u32.to_ne_bytes());
    }

    #[test]
    fn arguments_are_zero_padded() {
        let record = encode_arguments(b"prog a ").unwrap();
        assert_eq!(record.len(), 8 + 8);
        assert_eq!(&record[8..15], b"prog a ");
        assert_eq!(record[15], 0);
    }

    #[test]
    fn reader_walks_mixed_records() {
        let mut file = encode_arguments(b"prog ").unwrap();
        file.extend(counter_record(
            RecordType::EdgeInfo,
            payload_bytes(&[1u32, 2, 3]),
            3,
        ));
        file.extend(counter_record(
            RecordType::TimeInfo,
            payload_bytes(&[0.25f64]),
            1,
        ));

        let frames: Vec<_> = FrameReader::new(&file).collect::<Result<_>>().unwrap();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].arguments(), Some(&b"prog "[..]));
        assert_eq!(frames[1].elements::<u32>(), Some(vec![1, 2, 3]));
        assert_eq!(frames[1].elements::<u64>(), None);
        assert_eq!(frames[2].elements::<f64>(), Some(vec![0.25]));
    }

    #[test]
    fn reader_reports_truncation_once() {
        let mut file = counter_record(RecordType::EdgeInfo, payload_bytes(&[1u32, 2]), 2);
        file.truncate(file.len() - 1);

        let mut reader = FrameReader::new(&file);
        let err = reader.next().unwrap().unwrap_err();
        assert_eq!(
            err,
            Error::Truncated {
                offset: 0,
                needed: 16,
                available: 15,
            }
        );
        assert!(reader.next().is_none());
    }

    #[test]
    fn reader_rejects_unknown_tag() {
        let file = RecordHeader::new(99, CountWidth::U32, 0).unwrap();
        let mut reader = FrameReader::new(file.as_bytes());
        assert_eq!(
            reader.next().unwrap().unwrap_err(),
            Error::UnknownRecordType(99)
        );
    }
}
