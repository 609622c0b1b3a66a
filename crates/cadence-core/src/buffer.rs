//! Fixed-size multi-channel sample buffers.
//!
//! [`SampleBuffer`] is the unit of audio exchanged between the hardware
//! callback and the processing graph. It holds `channels` independent
//! sequences of `block_size` double-precision samples in one contiguous
//! allocation (channel-major, non-interleaved):
//!
//! ```text
//! [ ch0[0] .. ch0[N-1] | ch1[0] .. ch1[N-1] | ... ]
//! ```
//!
//! Dimensions are fixed at creation. The only way to change them is
//! [`create_buffers()`](SampleBuffer::create_buffers), which discards the
//! previous contents. That call allocates and belongs on the control thread;
//! everything else is allocation-free and safe for the audio thread.
//!
//! Hardware APIs hand out interleaved `f32` frames, so the buffer also
//! provides [`read_interleaved`](SampleBuffer::read_interleaved) and
//! [`write_interleaved`](SampleBuffer::write_interleaved) for the copy in and
//! out of the callback. Both clamp to the configured bounds and never index
//! out of range.
//!
//! # Example
//!
//! ```rust
//! use cadence_core::SampleBuffer;
//!
//! let mut buffer = SampleBuffer::with_size(2, 256);
//! buffer.set_sample(1, 10, 0.5).unwrap();
//! assert_eq!(buffer.sample(1, 10).unwrap(), 0.5);
//! assert!(buffer.sample(2, 0).is_err());
//! ```

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

/// Out-of-range access on a [`SampleBuffer`].
///
/// Real-time callers never trigger these: bounds are fixed when the stream
/// format is negotiated and callbacks never exceed them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferError {
    /// The channel index is not below the channel count.
    ChannelOutOfRange {
        /// Requested channel.
        index: usize,
        /// Configured channel count.
        channels: usize,
    },
    /// The frame index is not below the block size.
    FrameOutOfRange {
        /// Requested frame.
        index: usize,
        /// Configured block size.
        frames: usize,
    },
}

#[cfg(feature = "std")]
impl std::fmt::Display for BufferError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ChannelOutOfRange { index, channels } => {
                write!(f, "channel {index} out of range ({channels} channels)")
            }
            Self::FrameOutOfRange { index, frames } => {
                write!(f, "frame {index} out of range (block size {frames})")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for BufferError {}

/// Multi-channel, fixed-block-size `f64` sample buffer.
///
/// # Invariants
///
/// - Every channel has exactly `block_size` samples.
/// - `data.len() == channels * block_size`.
/// - Dimensions only change through [`create_buffers()`](Self::create_buffers).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleBuffer {
    data: Vec<f64>,
    channels: usize,
    block_size: usize,
}

impl SampleBuffer {
    /// Creates an empty buffer with no channels.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a zeroed buffer with the given dimensions.
    pub fn with_size(channels: usize, block_size: usize) -> Self {
        let mut buffer = Self::new();
        buffer.create_buffers(channels, block_size);
        buffer
    }

    /// (Re)allocates storage for `channels` sequences of `block_size` samples.
    ///
    /// Previous contents are discarded; the new storage is zeroed. Allocates,
    /// so call it from the control thread only.
    pub fn create_buffers(&mut self, channels: usize, block_size: usize) {
        #[cfg(feature = "tracing")]
        tracing::debug!(channels, block_size, "sample buffer reallocated");

        self.data.clear();
        self.data.resize(channels * block_size, 0.0);
        self.channels = channels;
        self.block_size = block_size;
    }

    /// Number of channels.
    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Samples per channel.
    #[inline]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// True when the buffer holds no samples.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Zero-fills every channel without reallocating.
    #[inline]
    pub fn clear(&mut self) {
        self.data.fill(0.0);
    }

    /// Read-only view of one channel's samples.
    pub fn channel(&self, channel: usize) -> Result<&[f64], BufferError> {
        let range = self.channel_range(channel)?;
        Ok(&self.data[range])
    }

    /// Mutable view of one channel's samples, for bulk copies.
    pub fn channel_mut(&mut self, channel: usize) -> Result<&mut [f64], BufferError> {
        let range = self.channel_range(channel)?;
        Ok(&mut self.data[range])
    }

    /// Reads a single sample.
    pub fn sample(&self, channel: usize, frame: usize) -> Result<f64, BufferError> {
        let index = self.sample_index(channel, frame)?;
        Ok(self.data[index])
    }

    /// Writes a single sample.
    pub fn set_sample(&mut self, channel: usize, frame: usize, value: f64) -> Result<(), BufferError> {
        let index = self.sample_index(channel, frame)?;
        self.data[index] = value;
        Ok(())
    }

    /// Iterates over all channels as slices.
    pub fn iter_channels(&self) -> impl Iterator<Item = &[f64]> {
        // chunks_exact(0) panics; an empty buffer has no channels to yield anyway
        self.data.chunks_exact(self.block_size.max(1)).take(self.channels)
    }

    /// Iterates over all channels as mutable slices.
    pub fn iter_channels_mut(&mut self) -> impl Iterator<Item = &mut [f64]> {
        let channels = self.channels;
        self.data
            .chunks_exact_mut(self.block_size.max(1))
            .take(channels)
    }

    /// Deinterleaves hardware frames into the start of this buffer.
    ///
    /// Copies up to `frames` frames from `src` (laid out `[c0, c1, .., c0, c1, ..]`
    /// with `src_channels` per frame) into positions `0..frames`. The copy is
    /// clamped to the block size and to the frames actually present in `src`.
    /// Channels the source does not carry are zeroed over that range; source
    /// channels beyond this buffer's channel count are dropped. With
    /// `src_channels == 0` every channel reads as silence.
    ///
    /// Returns the number of frames copied.
    pub fn read_interleaved(&mut self, src: &[f32], src_channels: usize, frames: usize) -> usize {
        let frames = if src_channels == 0 {
            frames.min(self.block_size)
        } else {
            self.clamp_frames(frames, src.len(), src_channels)
        };
        if frames == 0 {
            return 0;
        }
        let block_size = self.block_size;

        for (ch, dst) in self
            .data
            .chunks_exact_mut(block_size)
            .take(self.channels)
            .enumerate()
        {
            let dst = &mut dst[..frames];
            if ch < src_channels {
                for (sample, frame) in dst.iter_mut().zip(src.chunks_exact(src_channels)) {
                    *sample = f64::from(frame[ch]);
                }
            } else {
                dst.fill(0.0);
            }
        }
        frames
    }

    /// Interleaves the start of this buffer into hardware frames.
    ///
    /// Writes positions `0..frames` into `dst`, which has `dst_channels` per
    /// frame. Hardware channels beyond this buffer's channel count are left
    /// untouched (callers clear the output first).
    ///
    /// Returns the number of frames written.
    pub fn write_interleaved(&self, dst: &mut [f32], dst_channels: usize, frames: usize) -> usize {
        let frames = self.clamp_frames(frames, dst.len(), dst_channels);
        if frames == 0 {
            return 0;
        }

        for (ch, src) in self.iter_channels().enumerate().take(dst_channels) {
            for (frame, &sample) in dst.chunks_exact_mut(dst_channels).zip(&src[..frames]) {
                frame[ch] = sample as f32;
            }
        }
        frames
    }

    fn clamp_frames(&self, frames: usize, len: usize, channels: usize) -> usize {
        if channels == 0 {
            return 0;
        }
        frames.min(self.block_size).min(len / channels)
    }

    fn channel_range(&self, channel: usize) -> Result<core::ops::Range<usize>, BufferError> {
        if channel >= self.channels {
            return Err(BufferError::ChannelOutOfRange {
                index: channel,
                channels: self.channels,
            });
        }
        let start = channel * self.block_size;
        Ok(start..start + self.block_size)
    }

    fn sample_index(&self, channel: usize, frame: usize) -> Result<usize, BufferError> {
        let range = self.channel_range(channel)?;
        if frame >= self.block_size {
            return Err(BufferError::FrameOutOfRange {
                index: frame,
                frames: self.block_size,
            });
        }
        Ok(range.start + frame)
    }
}
