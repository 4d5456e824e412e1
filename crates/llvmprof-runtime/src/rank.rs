//! Master-rank filtering for multi-process runs.

use crate::env::{Environment, MASTER_RANK_VAR};

/// Which ranks may emit a rank-filtered record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankFilter {
    /// `MASTER_RANK` is unset: every rank writes.
    All,
    /// Only the given rank writes.
    Master(i32),
}

impl RankFilter {
    /// Read the filter from `MASTER_RANK`.
    pub fn from_env(env: &dyn Environment) -> Self {
        env.var(MASTER_RANK_VAR)
            .map_or(Self::All, |value| Self::Master(parse_rank(&value.to_string_lossy())))
    }

    /// Whether a caller whose rank array is `ranks` may write.
    ///
    /// Only the first element is compared; an empty array never matches a
    /// master rank.
    #[must_use]
    pub fn admits(self, ranks: &[i32]) -> bool {
        match self {
            Self::All => true,
            Self::Master(rank) => ranks.first() == Some(&rank),
        }
    }
}

/// Parse a rank the way C `atoi` does.
///
/// Leading whitespace and one sign are accepted, parsing stops at the first
/// non-digit, and input without digits yields 0. Out-of-range values saturate.
#[must_use]
pub fn parse_rank(value: &str) -> i32 {
    let trimmed = value.trim_start_matches([' ', '\t', '\n', '\r', '\x0b', '\x0c']);
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let magnitude = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0i64, |acc, digit| {
            acc.saturating_mul(10)
                .saturating_add(i64::from(digit - b'0'))
        });
    let signed = if negative { -magnitude } else { magnitude };
    i32::try_from(signed).unwrap_or(if negative { i32::MIN } else { i32::MAX })
}
