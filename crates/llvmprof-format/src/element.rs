//! Counter element types that can be written as record payloads.

use bytemuck::Pod;

use crate::record::ElementKind;

mod sealed {
    pub trait Sealed {}

    impl Sealed for u32 {}
    impl Sealed for u64 {}
    impl Sealed for f64 {}
}

/// A plain-old-data counter element with a fixed on-disk kind.
///
/// Implemented for `u32` (word counters), `u64` (wide counters) and `f64`
/// (timings). Elements are written in native byte order.
pub trait CounterElement: Pod + sealed::Sealed {
    /// Kind recorded for arrays of this element.
    const KIND: ElementKind;
}

impl CounterElement for u32 {
    const KIND: ElementKind = ElementKind::Word;
}

impl CounterElement for u64 {
    const KIND: ElementKind = ElementKind::Wide;
}

impl CounterElement for f64 {
    const KIND: ElementKind = ElementKind::Float;
}

/// View a counter slice as its raw payload bytes.
#[inline]
#[must_use]
pub fn payload_bytes<T: CounterElement>(data: &[T]) -> &[u8] {
    bytemuck::cast_slice(data)
}

/// Decode a payload back into elements. Tolerates unaligned input.
///
/// Returns `None` if the payload is not a whole number of elements.
#[must_use]
pub fn decode_payload<T: CounterElement>(payload: &[u8]) -> Option<Vec<T>> {
    let width = T::KIND.width();
    if payload.len() % width != 0 {
        return None;
    }
    Some(
        payload
            .chunks_exact(width)
            .map(bytemuck::pod_read_unaligned)
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_widths_match_rust_types() {
        assert_eq!(u32::KIND.width(), std::mem::size_of::<u32>());
        assert_eq!(u64::KIND.width(), std::mem::size_of::<u64>());
        assert_eq!(f64::KIND.width(), std::mem::size_of::<f64>());
    }

    #[test]
    fn payload_is_native_endian() {
        let bytes = payload_bytes(&[1u32, 2, 3]);
        assert_eq!(bytes.len(), 12);
        assert_eq!(&bytes[4..8], &2u32.to_ne_bytes());
    }

    #[test]
    fn decode_rejects_partial_elements() {
        assert!(decode_payload::<u64>(&[0u8; 12]).is_none());
        let values = decode_payload::<f64>(payload_bytes(&[1.5f64, -2.0])).unwrap();
        assert_eq!(values, vec![1.5, -2.0]);
    }
}
