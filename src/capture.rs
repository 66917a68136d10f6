use crate::renderer::{FramePixels, RenderPass};
use anyhow::{Context, Result};
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Recording produced no frames")]
    EmptyBuffer,
    #[error("Frame pushed while no recording is active")]
    NotRecording,
    #[error("Failed to encode frame {index}")]
    Encode {
        index: u32,
        #[source]
        source: image::ImageError,
    },
}

/// One encoded frame. `index` is the contiguous position in the recording;
/// auxiliary passes share the index of the color frame they belong to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EncodedFrame {
    pub index: u32,
    pub pass: RenderPass,
    pub png: Vec<u8>,
}

/// The packaged artifact handed to the uploader: every frame of one
/// recording in index order, plus the bookkeeping the job needs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FramePackage {
    pub fps: u32,
    pub captured: u32,
    pub expected: u32,
    pub frames: Vec<EncodedFrame>,
}

impl FramePackage {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).context("Failed to serialize frame package")
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).context("Failed to deserialize frame package")
    }
}

/// Buffers frames during a recording. Frames are PNG-encoded inline as they
/// arrive; indices are assigned only on successful encode, so the sequence
/// stays contiguous even when surfaces drop frames.
#[derive(Default)]
pub struct FrameCapturePipeline {
    frames: Vec<EncodedFrame>,
    next_index: u32,
    skipped: u32,
    expected: u32,
    recording: bool,
}

impl FrameCapturePipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self) {
        self.frames.clear();
        self.next_index = 0;
        self.skipped = 0;
        self.expected = 0;
        self.recording = true;
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn captured(&self) -> u32 {
        self.next_index
    }

    pub fn skipped(&self) -> u32 {
        self.skipped
    }

    /// Appends the color frame for the current tick. Returns the index the
    /// frame was stored under.
    pub fn push_frame(&mut self, pixels: &FramePixels) -> Result<u32, CaptureError> {
        if !self.recording {
            return Err(CaptureError::NotRecording);
        }
        self.expected += 1;
        let index = self.next_index;
        let png = encode_png(pixels).map_err(|source| CaptureError::Encode { index, source })?;
        self.frames.push(EncodedFrame { index, pass: RenderPass::Color, png });
        self.next_index += 1;
        Ok(index)
    }

    /// Appends an auxiliary pass for the most recent color frame.
    pub fn push_aux_frame(&mut self, pass: RenderPass, pixels: &FramePixels) -> Result<(), CaptureError> {
        if !self.recording {
            return Err(CaptureError::NotRecording);
        }
        debug_assert!(pass != RenderPass::Color);
        let Some(index) = self.next_index.checked_sub(1) else {
            return Ok(());
        };
        let png = encode_png(pixels).map_err(|source| CaptureError::Encode { index, source })?;
        self.frames.push(EncodedFrame { index, pass, png });
        Ok(())
    }

    /// Records a frame the surface failed to deliver. The slot does not get
    /// an index; it only shows up in the captured-vs-expected accounting.
    pub fn note_missing_surface(&mut self) {
        if self.recording {
            self.expected += 1;
            self.skipped += 1;
        }
    }

    /// Drains the buffer into one package. Consumes the recording either
    /// way: after this call the pipeline is idle and empty.
    pub fn drain_and_package(&mut self, fps: u32) -> Result<FramePackage, CaptureError> {
        self.recording = false;
        if self.next_index == 0 {
            self.clear();
            return Err(CaptureError::EmptyBuffer);
        }
        let frames = std::mem::take(&mut self.frames);
        let package =
            FramePackage { fps, captured: self.next_index, expected: self.expected, frames };
        self.clear();
        Ok(package)
    }

    pub fn clear(&mut self) {
        self.frames.clear();
        self.next_index = 0;
        self.skipped = 0;
        self.expected = 0;
        self.recording = false;
    }
}

pub(crate) fn encode_png(pixels: &FramePixels) -> Result<Vec<u8>, image::ImageError> {
    let mut out = Vec::new();
    let encoder = PngEncoder::new(&mut out);
    encoder.write_image(&pixels.rgba, pixels.width, pixels.height, ExtendedColorType::Rgba8)?;
    Ok(out)
}
