//! Growable buffer for decoded PCM samples.

use crate::error::{Error, Result};

/// Largest number of samples a [`SampleBuffer`] may ever hold.
///
/// A `Vec<i16>` cannot exceed `isize::MAX` bytes.
pub const MAX_SAMPLE_BUFFER_LEN: usize = isize::MAX as usize / std::mem::size_of::<i16>();

/// An append-only buffer of 16-bit PCM samples.
///
/// Capacity doubles when an append does not fit, so `n` appended samples cost
/// at most `O(log n)` reallocations. Growth is clamped to the buffer's
/// maximum length; an append that cannot fit even after clamping fails with
/// [`Error::CapacityOverflow`] and leaves the buffer unchanged.
///
/// Mutation requires `&mut self`, so concurrent use must go through an
/// external lock.
///
/// # Example
///
/// ```
/// use giztoy_mp3::SampleBuffer;
///
/// let mut buf = SampleBuffer::with_capacity(4);
/// buf.append(&[1, 2, 3]).unwrap();
/// buf.push(4).unwrap();
/// assert_eq!(buf.finish(), vec![1, 2, 3, 4]);
/// ```
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    buf: Vec<i16>,
    max_len: usize,
}

impl Default for SampleBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleBuffer {
    /// Creates an empty buffer with a small default capacity.
    pub fn new() -> Self {
        Self::with_capacity(32)
    }

    /// Creates an empty buffer able to hold `capacity` samples without
    /// reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_max_len(capacity, MAX_SAMPLE_BUFFER_LEN)
    }

    /// Creates an empty buffer that never grows beyond `max_len` samples.
    ///
    /// The initial capacity is clamped to `max_len`.
    pub fn with_max_len(capacity: usize, max_len: usize) -> Self {
        let max_len = max_len.min(MAX_SAMPLE_BUFFER_LEN);
        Self {
            buf: Vec::with_capacity(capacity.min(max_len)),
            max_len,
        }
    }

    /// Returns the number of samples written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if no samples have been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Returns the number of samples the buffer holds before it must grow.
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Returns the maximum number of samples the buffer may hold.
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Returns the samples written so far.
    pub fn as_slice(&self) -> &[i16] {
        &self.buf
    }

    /// Appends a single sample.
    pub fn push(&mut self, sample: i16) -> Result<()> {
        self.ensure_capacity(1)?;
        self.buf.push(sample);
        Ok(())
    }

    /// Appends all of `samples`.
    pub fn append(&mut self, samples: &[i16]) -> Result<()> {
        self.ensure_capacity(samples.len())?;
        self.buf.extend_from_slice(samples);
        Ok(())
    }

    /// Appends `count` samples of `samples` starting at `offset`.
    pub fn append_range(&mut self, samples: &[i16], offset: usize, count: usize) -> Result<()> {
        let end = offset
            .checked_add(count)
            .filter(|&end| end <= samples.len())
            .ok_or_else(|| {
                Error::InvalidParams(format!(
                    "range {}+{} out of bounds for {} samples",
                    offset,
                    count,
                    samples.len()
                ))
            })?;
        self.append(&samples[offset..end])
    }

    /// Truncates the buffer to zero samples, keeping its capacity.
    pub fn reset(&mut self) {
        self.buf.clear();
    }

    /// Returns an exact-length copy of the samples written so far.
    pub fn to_vec(&self) -> Vec<i16> {
        self.buf.clone()
    }

    /// Consumes the buffer and returns its samples with no spare capacity.
    pub fn finish(mut self) -> Vec<i16> {
        self.buf.shrink_to_fit();
        self.buf
    }

    /// Makes room for `additional` more samples.
    fn ensure_capacity(&mut self, additional: usize) -> Result<()> {
        let len = self.buf.len();
        let capacity = self.buf.capacity();
        let required = len
            .checked_add(additional)
            .ok_or(Error::CapacityOverflow { required: usize::MAX })?;
        if required > self.max_len {
            return Err(Error::CapacityOverflow { required });
        }
        if required <= capacity {
            return Ok(());
        }

        let new_capacity = grown_capacity(capacity, required - capacity, self.max_len)
            .ok_or(Error::CapacityOverflow { required })?;
        self.buf.reserve_exact(new_capacity - len);
        Ok(())
    }
}

/// Computes the capacity to grow to: the old capacity plus the larger of
/// `min_growth` and the old capacity, clamped to `max_len`.
///
/// Returns `None` if even `max_len` cannot hold `old + min_growth`.
fn grown_capacity(old: usize, min_growth: usize, max_len: usize) -> Option<usize> {
    let min_len = old.checked_add(min_growth)?;
    if min_len > max_len {
        return None;
    }
    let preferred = old.saturating_add(min_growth.max(old));
    Some(preferred.min(max_len))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequence(n: usize) -> Vec<i16> {
        (0..n).map(|i| (i % 65536) as u16 as i16).collect()
    }

    #[test]
    fn test_new_is_empty() {
        let buf = SampleBuffer::new();
        assert!(buf.is_empty());
        assert_eq!(buf.len(), 0);
        assert!(buf.finish().is_empty());
    }

    #[test]
    fn test_push_one_at_a_time() {
        for n in [0, 1, 2, 31, 32, 33, 1000, 4097, 65_537] {
            let expected = sequence(n);
            let mut buf = SampleBuffer::with_capacity(0);
            for &s in &expected {
                buf.push(s).unwrap();
            }
            assert_eq!(buf.len(), n);
            assert_eq!(buf.finish(), expected, "n = {}", n);
        }
    }

    #[test]
    fn test_append_in_uneven_chunks() {
        let chunk_sizes = [1usize, 7, 2, 1152, 2304, 0, 3, 4096];
        for n in [0usize, 5, 100, 2305, 10_000, 100_003] {
            let expected = sequence(n);
            let mut buf = SampleBuffer::with_capacity(2);
            let mut pos = 0;
            let mut i = 0;
            while pos < n {
                let take = chunk_sizes[i % chunk_sizes.len()].min(n - pos);
                buf.append(&expected[pos..pos + take]).unwrap();
                pos += take;
                i += 1;
            }
            assert_eq!(buf.to_vec(), expected, "n = {}", n);
        }
    }

    #[test]
    fn test_every_length_up_to_4096() {
        let source = sequence(4096);
        for n in 0..=4096 {
            let expected = &source[..n];

            let mut pushed = SampleBuffer::with_capacity(0);
            for &s in expected {
                pushed.push(s).unwrap();
            }
            assert_eq!(pushed.finish(), expected, "push, n = {}", n);

            let mut appended = SampleBuffer::with_capacity(1);
            let mut pos = 0;
            let mut step = n % 13;
            while pos < n {
                let take = (step + 1).min(n - pos);
                appended.append(&expected[pos..pos + take]).unwrap();
                pos += take;
                step = (step * 7 + 3) % 97;
            }
            assert_eq!(appended.finish(), expected, "append, n = {}", n);
        }
    }

    #[test]
    fn test_growth_is_logarithmic() {
        let mut buf = SampleBuffer::with_capacity(0);
        let mut reallocations = 0;
        let mut last_capacity = buf.capacity();
        for i in 0..200_000 {
            buf.push(i as i16).unwrap();
            if buf.capacity() != last_capacity {
                reallocations += 1;
                last_capacity = buf.capacity();
            }
        }
        assert!(reallocations <= 20, "{} reallocations", reallocations);
    }

    #[test]
    fn test_append_range() {
        let mut buf = SampleBuffer::new();
        buf.append_range(&[1, 2, 3, 4, 5], 1, 3).unwrap();
        assert_eq!(buf.as_slice(), &[2, 3, 4]);

        let err = buf.append_range(&[1, 2, 3], 2, 2).unwrap_err();
        assert!(matches!(err, Error::InvalidParams(_)));
        let err = buf.append_range(&[1, 2, 3], usize::MAX, 2).unwrap_err();
        assert!(matches!(err, Error::InvalidParams(_)));
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn test_reset_keeps_capacity() {
        let mut buf = SampleBuffer::with_capacity(0);
        buf.append(&sequence(1000)).unwrap();
        let capacity = buf.capacity();
        buf.reset();
        assert!(buf.is_empty());
        assert_eq!(buf.capacity(), capacity);
        buf.append(&[9, 8]).unwrap();
        assert_eq!(buf.finish(), vec![9, 8]);
    }

    #[test]
    fn test_growth_clamped_to_max_len() {
        let mut buf = SampleBuffer::with_max_len(6, 10);
        buf.append(&[0; 6]).unwrap();
        // Doubling would ask for 12; the clamp still fits 10.
        buf.append(&[1; 4]).unwrap();
        assert_eq!(buf.len(), 10);
        assert!(buf.capacity() >= 10);
    }

    #[test]
    fn test_overflow_fails_without_corruption() {
        let mut buf = SampleBuffer::with_max_len(4, 10);
        buf.append(&[1, 2, 3, 4, 5, 6, 7, 8]).unwrap();

        let err = buf.append(&[0; 3]).unwrap_err();
        assert!(matches!(err, Error::CapacityOverflow { required: 11 }));
        assert_eq!(buf.as_slice(), &[1, 2, 3, 4, 5, 6, 7, 8]);

        buf.push(9).unwrap();
        buf.push(10).unwrap();
        assert!(matches!(buf.push(11), Err(Error::CapacityOverflow { .. })));
        assert_eq!(buf.finish(), vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
    }

    #[test]
    fn test_grown_capacity() {
        assert_eq!(grown_capacity(0, 1, 100), Some(1));
        assert_eq!(grown_capacity(8, 1, 100), Some(16));
        assert_eq!(grown_capacity(8, 20, 100), Some(28));
        assert_eq!(grown_capacity(60, 1, 100), Some(100));
        assert_eq!(grown_capacity(60, 41, 100), None);
        assert_eq!(grown_capacity(usize::MAX, 1, usize::MAX), None);
    }
}
