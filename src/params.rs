//! Cached camera parameters and validation rules
//!
//! [`CameraParams`] holds the last *requested* value of every controllable
//! setting, independent of whether the peer is reachable. The cache is
//! deliberately optimistic: a failed transmission does not roll it back,
//! so callers always see "what was asked for" rather than "what was
//! confirmed".

use serde::{Deserialize, Serialize};

/// Region of interest as four percentage edges of the full field of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoomRect {
    pub left: u8,
    pub bottom: u8,
    pub right: u8,
    pub top: u8,
}

impl ZoomRect {
    /// Raw quadruple, no ordering checks (validation happens at update
    /// time against the currently cached rectangle)
    pub fn new(left: u8, bottom: u8, right: u8, top: u8) -> Self {
        ZoomRect {
            left,
            bottom,
            right,
            top,
        }
    }

    /// Full field of view
    pub fn full() -> Self {
        ZoomRect::new(0, 0, 100, 100)
    }
}

/// A supported camera capture mode
///
/// For available video modes see
/// <https://picamera.readthedocs.io/en/release-1.13/fov.html>
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraFormat {
    pub width: u32,
    pub height: u32,
    /// Nominal framerate for this mode
    pub framerate: u32,
    pub framerate_min: u32,
    pub framerate_max: u32,
}

/// Supported capture modes, loaded once
pub const CAMERA_FORMATS: [CameraFormat; 8] = [
    CameraFormat { width: 2592, height: 1944, framerate: 10, framerate_min: 1, framerate_max: 15 },
    CameraFormat { width: 1920, height: 1080, framerate: 10, framerate_min: 1, framerate_max: 15 },
    CameraFormat { width: 1296, height: 972, framerate: 30, framerate_min: 1, framerate_max: 42 },
    CameraFormat { width: 1296, height: 730, framerate: 30, framerate_min: 1, framerate_max: 49 },
    CameraFormat { width: 1280, height: 720, framerate: 30, framerate_min: 1, framerate_max: 49 },
    CameraFormat { width: 1024, height: 768, framerate: 30, framerate_min: 1, framerate_max: 60 },
    CameraFormat { width: 800, height: 600, framerate: 30, framerate_min: 1, framerate_max: 60 },
    CameraFormat { width: 640, height: 480, framerate: 30, framerate_min: 1, framerate_max: 90 },
];

/// Look up the capture mode for a resolution
pub fn find_format(width: u32, height: u32) -> Option<&'static CameraFormat> {
    CAMERA_FORMATS
        .iter()
        .find(|f| f.width == width && f.height == height)
}

/// Last-requested value of each controllable setting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraParams {
    pub width: u32,
    pub height: u32,
    pub framerate: u32,
    pub vflip: bool,
    pub hflip: bool,
    pub zoom: ZoomRect,
    /// White-balance gains (red, blue), each in [0, 8]
    pub gains: [f64; 2],
    pub recording: bool,
}

impl Default for CameraParams {
    fn default() -> Self {
        CameraParams {
            width: 640,
            height: 480,
            framerate: 30,
            vflip: false,
            hflip: false,
            zoom: ZoomRect::full(),
            gains: [1.0, 1.0],
            recording: false,
        }
    }
}

impl CameraParams {
    /// Apply a capture mode, cascading to the framerate
    ///
    /// A cached framerate inside the new mode's range is preserved;
    /// otherwise it resets to the mode's nominal default.
    pub fn apply_format(&mut self, format: &CameraFormat) {
        self.width = format.width;
        self.height = format.height;
        if self.framerate < format.framerate_min || self.framerate > format.framerate_max {
            self.framerate = format.framerate;
        }
    }

    /// Framerate range valid for the cached resolution
    ///
    /// Unknown resolutions fall back to the widest supported range.
    pub fn framerate_range(&self) -> (u32, u32) {
        match find_format(self.width, self.height) {
            Some(f) => (f.framerate_min, f.framerate_max),
            None => (1, 90),
        }
    }

    /// Validate a framerate against the cached resolution's range
    pub fn framerate_valid(&self, fps: u32) -> bool {
        let (min, max) = self.framerate_range();
        (min..=max).contains(&fps)
    }

    /// Validate and accept a zoom rectangle update
    ///
    /// Each edge must be in [0, 100] and stay strictly inside the
    /// *currently cached* opposite edge: a new `left`/`bottom` below the
    /// cached `right`/`top`, a new `right`/`top` above the cached
    /// `left`/`bottom`. Rejection leaves the cache untouched.
    pub fn try_set_zoom(&mut self, rect: ZoomRect) -> bool {
        let in_range = [rect.left, rect.bottom, rect.right, rect.top]
            .iter()
            .all(|&e| e <= 100);
        if !in_range {
            return false;
        }
        if rect.left >= self.zoom.right
            || rect.bottom >= self.zoom.top
            || rect.right <= self.zoom.left
            || rect.top <= self.zoom.bottom
        {
            return false;
        }
        self.zoom = rect;
        true
    }

    /// Validate and accept a white-balance gain update
    pub fn try_set_gain(&mut self, channel: usize, value: f64) -> bool {
        if channel > 1 || !(0.0..=8.0).contains(&value) {
            return false;
        }
        self.gains[channel] = value;
        true
    }
}
