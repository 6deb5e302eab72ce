//! Capture device and QR decoder seams.
//!
//! Both are black boxes to the session: the camera hands out raw frames, the
//! decoder turns a frame into text when it finds a code.

/// One captured bitmap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Frame {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixels,
        }
    }
}

/// Failure to open or read from the capture device.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CameraError {
    #[error("camera permission denied")]
    PermissionDenied,

    #[error("no camera available")]
    NotFound,

    #[error("frame not ready: {0}")]
    FrameUnavailable(String),
}

/// A capture device that can be acquired and released repeatedly.
///
/// The session pairs every successful `acquire` with exactly one `release`.
pub trait Camera {
    fn acquire(&mut self) -> Result<(), CameraError>;

    fn release(&mut self);

    /// Grabs the current frame. `Ok(None)` means the stream has no new data yet.
    fn capture(&mut self) -> Result<Option<Frame>, CameraError>;
}

/// Turns a frame into the payload of the QR code it contains, if any.
/// Unreadable input yields `None`; implementations must not panic.
pub trait FrameDecoder {
    fn decode(&mut self, frame: &Frame) -> Option<String>;
}

impl<F> FrameDecoder for F
where
    F: FnMut(&Frame) -> Option<String>,
{
    fn decode(&mut self, frame: &Frame) -> Option<String> {
        self(frame)
    }
}
