use std::num::NonZeroUsize;

/// Default upstream write size: 100ms of 8kHz 16-bit mono PCM
pub const DEFAULT_CHUNK_SIZE: NonZeroUsize = match NonZeroUsize::new(1600) {
    Some(size) => size,
    None => unreachable!(),
};

/// Split an audio payload into `chunk_size`-byte slices for upstream delivery
///
/// Every slice is exactly `chunk_size` bytes except possibly the last, which
/// holds the remainder. Concatenating the result reproduces `payload`.
///
/// An empty payload yields a single empty slice rather than no slices, so a
/// zero-length frame still produces one (empty) upstream write.
pub fn split(payload: &[u8], chunk_size: NonZeroUsize) -> Vec<&[u8]> {
    if payload.is_empty() {
        return vec![payload];
    }

    payload.chunks(chunk_size.get()).collect()
}
