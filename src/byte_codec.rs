//! Chunking and network byte-order helpers used by the slice wire format.
//!
//! [`split`] and [`merge`] are exact inverses for any non-zero chunk size, and
//! the `u32` helpers keep Clippy expectations scoped to the conversion points
//! so protocol code can remain explicit about wire endianness.

use std::num::NonZeroUsize;

/// Split `data` into consecutive chunks of at most `chunk_size` bytes.
///
/// Every chunk except the last holds exactly `chunk_size` bytes. Empty input
/// yields no chunks at all.
///
/// # Examples
///
/// ```
/// use std::num::NonZeroUsize;
///
/// use slicegram::byte_codec::split;
///
/// let chunks = split(&[1, 2, 3, 4, 5], NonZeroUsize::new(2).expect("non-zero"));
/// assert_eq!(chunks, vec![vec![1, 2], vec![3, 4], vec![5]]);
/// ```
#[must_use]
pub fn split(data: &[u8], chunk_size: NonZeroUsize) -> Vec<Vec<u8>> {
    data.chunks(chunk_size.get()).map(<[u8]>::to_vec).collect()
}

/// Concatenate `chunks` in iteration order.
///
/// # Examples
///
/// ```
/// use slicegram::byte_codec::merge;
///
/// assert_eq!(merge([&[1_u8, 2][..], &[3][..]]), vec![1, 2, 3]);
/// ```
#[must_use]
pub fn merge<I, C>(chunks: I) -> Vec<u8>
where
    I: IntoIterator<Item = C>,
    C: AsRef<[u8]>,
{
    let mut data = Vec::new();
    for chunk in chunks {
        data.extend_from_slice(chunk.as_ref());
    }
    data
}

/// Serialise a `u32` in network byte order (big-endian).
///
/// # Examples
///
/// ```
/// use slicegram::byte_codec::write_network_u32;
///
/// assert_eq!(write_network_u32(0x1234_5678), [0x12, 0x34, 0x56, 0x78]);
/// ```
#[must_use]
pub fn write_network_u32(value: u32) -> [u8; 4] {
    #[expect(
        clippy::big_endian_bytes,
        reason = "Network byte order requires big-endian bytes."
    )]
    value.to_be_bytes()
}

/// Parse a network-order `u32` from its on-wire representation.
///
/// # Examples
///
/// ```
/// use slicegram::byte_codec::read_network_u32;
///
/// assert_eq!(read_network_u32([0x12, 0x34, 0x56, 0x78]), 0x1234_5678);
/// ```
#[must_use]
pub fn read_network_u32(bytes: [u8; 4]) -> u32 {
    #[expect(
        clippy::big_endian_bytes,
        reason = "Network byte order requires big-endian bytes."
    )]
    u32::from_be_bytes(bytes)
}
