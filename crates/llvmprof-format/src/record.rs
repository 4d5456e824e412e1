//! Record types and their on-disk layouts.

use crate::error::{Error, Result};

/// Version of the record tag assignments below.
pub const FORMAT_VERSION: u32 = 1;

/// Size of the leading type tag of every record.
pub const TAG_SIZE: usize = std::mem::size_of::<i32>();

/// Kind of a record, written as its leading `i32` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum RecordType {
    /// Saved command line of the profiled process. Always the first record.
    ArgumentInfo = 1,
    /// Function entry counters.
    FunctionInfo = 2,
    /// Basic block counters.
    BlockInfo = 3,
    /// Edge counters.
    EdgeInfo = 4,
    /// Path profiling counters.
    PathInfo = 5,
    /// Basic block trace.
    BBTraceInfo = 6,
    /// Optimal edge counters.
    OptEdgeInfo = 7,
    /// 64-bit counters.
    WideCounterInfo = 8,
    /// Floating-point timings.
    TimeInfo = 9,
    /// Floating-point timings emitted by the master rank only.
    RankTimeInfo = 10,
    /// Floating-point MPI timings.
    MpiTimeInfo = 11,
}

impl RecordType {
    /// All record types, in tag order.
    pub const ALL: [Self; 11] = [
        Self::ArgumentInfo,
        Self::FunctionInfo,
        Self::BlockInfo,
        Self::EdgeInfo,
        Self::PathInfo,
        Self::BBTraceInfo,
        Self::OptEdgeInfo,
        Self::WideCounterInfo,
        Self::TimeInfo,
        Self::RankTimeInfo,
        Self::MpiTimeInfo,
    ];

    /// The tag written to disk.
    #[must_use]
    pub const fn tag(self) -> i32 {
        self as i32
    }

    /// Look up a record type by its tag.
    pub fn from_tag(tag: i32) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|ty| ty.tag() == tag)
            .ok_or(Error::UnknownRecordType(tag))
    }

    /// Layout of records of this type.
    #[must_use]
    pub const fn layout(self) -> Layout {
        match self {
            Self::ArgumentInfo => Layout::Arguments,
            Self::FunctionInfo
            | Self::BlockInfo
            | Self::EdgeInfo
            | Self::PathInfo
            | Self::BBTraceInfo
            | Self::OptEdgeInfo => Layout::Counters(ElementKind::Word),
            Self::WideCounterInfo => Layout::Counters(ElementKind::Wide),
            Self::TimeInfo | Self::RankTimeInfo | Self::MpiTimeInfo => {
                Layout::Counters(ElementKind::Float)
            }
        }
    }

    /// Get a display name for this record type.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ArgumentInfo => "arguments",
            Self::FunctionInfo => "function",
            Self::BlockInfo => "block",
            Self::EdgeInfo => "edge",
            Self::PathInfo => "path",
            Self::BBTraceInfo => "bb-trace",
            Self::OptEdgeInfo => "opt-edge",
            Self::WideCounterInfo => "wide-counter",
            Self::TimeInfo => "time",
            Self::RankTimeInfo => "rank-time",
            Self::MpiTimeInfo => "mpi-time",
        }
    }
}

impl TryFrom<i32> for RecordType {
    type Error = Error;

    fn try_from(tag: i32) -> Result<Self> {
        Self::from_tag(tag)
    }
}

/// Payload element of a counter record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// Unsigned 32-bit counter.
    Word,
    /// Unsigned 64-bit counter.
    Wide,
    /// IEEE double.
    Float,
}

impl ElementKind {
    /// Size of one element in bytes.
    #[must_use]
    pub const fn width(self) -> usize {
        match self {
            Self::Word => 4,
            Self::Wide | Self::Float => 8,
        }
    }

    /// Width of the count field preceding the payload.
    #[must_use]
    pub const fn count_width(self) -> CountWidth {
        match self {
            Self::Word => CountWidth::U32,
            Self::Wide | Self::Float => CountWidth::U64,
        }
    }
}

/// Width of a record's count field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CountWidth {
    /// 4-byte unsigned count.
    U32,
    /// 8-byte unsigned count.
    U64,
}

impl CountWidth {
    /// Size of the count field in bytes.
    #[must_use]
    pub const fn bytes(self) -> usize {
        match self {
            Self::U32 => 4,
            Self::U64 => 8,
        }
    }
}

/// Shape of a record following its tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layout {
    /// `u32` byte length, the bytes, zero padding up to a multiple of 4.
    Arguments,
    /// Element count followed by the raw, unpadded elements.
    Counters(ElementKind),
}

impl Layout {
    /// Width of the count field for this layout.
    #[must_use]
    pub const fn count_width(self) -> CountWidth {
        match self {
            Self::Arguments => CountWidth::U32,
            Self::Counters(kind) => kind.count_width(),
        }
    }

    /// Size of one payload element in bytes.
    #[must_use]
    pub const fn element_width(self) -> usize {
        match self {
            Self::Arguments => 1,
            Self::Counters(kind) => kind.width(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_stable() {
        assert_eq!(RecordType::ArgumentInfo.tag(), 1);
        assert_eq!(RecordType::EdgeInfo.tag(), 4);
        assert_eq!(RecordType::OptEdgeInfo.tag(), 7);
        assert_eq!(RecordType::WideCounterInfo.tag(), 8);
        assert_eq!(RecordType::MpiTimeInfo.tag(), 11);
    }

    #[test]
    fn from_tag_matches_every_type() {
        for ty in RecordType::ALL {
            assert_eq!(RecordType::from_tag(ty.tag()), Ok(ty));
        }
    }

    #[test]
    fn from_tag_rejects_unknown() {
        assert_eq!(RecordType::from_tag(0), Err(Error::UnknownRecordType(0)));
        assert_eq!(
            RecordType::try_from(42),
            Err(Error::UnknownRecordType(42))
        );
    }

    #[test]
    fn count_widths_follow_element_kind() {
        assert_eq!(RecordType::EdgeInfo.layout().count_width(), CountWidth::U32);
        assert_eq!(
            RecordType::WideCounterInfo.layout().count_width(),
            CountWidth::U64
        );
        assert_eq!(RecordType::TimeInfo.layout().count_width(), CountWidth::U64);
        assert_eq!(RecordType::ArgumentInfo.layout().count_width(), CountWidth::U32);
        assert_eq!(RecordType::ArgumentInfo.layout().element_width(), 1);
        assert_eq!(RecordType::RankTimeInfo.layout().element_width(), 8);
    }
}
