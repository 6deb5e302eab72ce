//! Keyboard-wedge QR reader.
//!
//! Handheld readers decode the code in hardware and type the payload followed
//! by Enter. Each typed line reaches the session as a one-row frame of text
//! bytes; the session arms and disarms the reader like any other camera.

use scan_core::{Camera, CameraError, Frame, FrameDecoder};

#[derive(Debug, Default)]
pub struct WedgeReader {
    armed: bool,
}

impl WedgeReader {
    pub fn is_armed(&self) -> bool {
        self.armed
    }
}

impl Camera for WedgeReader {
    fn acquire(&mut self) -> Result<(), CameraError> {
        self.armed = true;
        tracing::debug!("Wedge reader armed");
        Ok(())
    }

    fn release(&mut self) {
        self.armed = false;
        tracing::debug!("Wedge reader disarmed");
    }

    // Lines are pushed by the input loop; there is nothing to poll.
    fn capture(&mut self) -> Result<Option<Frame>, CameraError> {
        Ok(None)
    }
}

pub fn line_frame(line: &str) -> Frame {
    raw_frame(line.as_bytes())
}

/// Frame for bytes the reader typed, readable or not.
pub fn raw_frame(bytes: &[u8]) -> Frame {
    Frame::new(bytes.len() as u32, 1, bytes.to_vec())
}

/// Reads the text back out of a [`line_frame`].
#[derive(Debug, Default)]
pub struct LineDecoder;

impl FrameDecoder for LineDecoder {
    fn decode(&mut self, frame: &Frame) -> Option<String> {
        if frame.height != 1 || frame.pixels.is_empty() {
            return None;
        }
        String::from_utf8(frame.pixels.clone()).ok()
    }
}
