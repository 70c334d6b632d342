use std::time::{Duration, Instant};

/// A single camera frame: contiguous pixel bytes in row-major order.
///
/// The analysis stage treats pixel data as opaque; only the detector port
/// looks inside it.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
    captured_at: Instant,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
            captured_at: Instant::now(),
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Position of this frame in its capture stream, starting at 0.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn captured_at(&self) -> Instant {
        self.captured_at
    }

    /// Time elapsed since capture. Grows while the frame waits in the mailbox.
    pub fn age(&self) -> Duration {
        self.captured_at.elapsed()
    }
}
