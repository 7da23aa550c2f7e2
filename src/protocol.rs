//! Wire protocol for the remote camera service
//!
//! Message format: a single line of space-separated ASCII, verb first:
//!
//! ```text
//! Resolution 1280 720
//! Zoom 0.10 0.10 0.80 0.80
//! Start Experiment=1 Recording=2 Path=/data/session1
//! ```
//!
//! Zoom edges travel as fractions of 1.0 with two decimals; the cache and
//! the public API use percentages. Every command expects exactly one reply
//! line from the peer.
//!
//! There is no escaping scheme for embedded spaces in string arguments
//! (`Path=` values). Callers must sanitize paths upstream.

use crate::params::ZoomRect;

/// Flip axis selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipAxis {
    Vertical,
    Horizontal,
}

/// White-balance gain channel (red = 0, blue = 1)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GainChannel {
    Red = 0,
    Blue = 1,
}

/// Commands understood by the remote camera service
///
/// A closed set: every variant has exactly one wire form, matched
/// exhaustively in [`Command::encode`].
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Set capture resolution in pixels
    SetResolution { width: u32, height: u32 },
    /// Set capture framerate in frames per second
    SetFramerate(u32),
    /// Enable or disable image flip along one axis
    SetFlip { axis: FlipAxis, enabled: bool },
    /// Set the region of interest (edges in percent of full frame)
    SetZoom(ZoomRect),
    /// Reinitialize automatic gain and white-balance
    ResetGains,
    /// Query the current white-balance gain pair
    GetGains,
    /// Set one white-balance gain channel (value in [0, 8])
    SetGain { channel: GainChannel, value: f64 },
    /// Begin a recording on the remote side
    StartRecording {
        experiment: u32,
        recording: u32,
        path: String,
    },
    /// End the active recording
    StopRecording,
    /// Tell the peer to shut down its end of the session
    Close,
}

impl Command {
    /// Encode to the wire message, newline-terminated
    ///
    /// Deterministic: the same command always yields the same bytes.
    pub fn encode(&self) -> Vec<u8> {
        let mut line = self.wire_text();
        line.push('\n');
        line.into_bytes()
    }

    /// The message body without the line terminator
    pub fn wire_text(&self) -> String {
        match self {
            Command::SetResolution { width, height } => {
                format!("Resolution {} {}", width, height)
            }
            Command::SetFramerate(fps) => format!("Framerate {}", fps),
            Command::SetFlip { axis, enabled } => {
                let verb = match axis {
                    FlipAxis::Vertical => "VFlip",
                    FlipAxis::Horizontal => "HFlip",
                };
                format!("{} {}", verb, u8::from(*enabled))
            }
            Command::SetZoom(rect) => {
                // percent -> normalized [0,1] fractions, two decimals
                format!(
                    "Zoom {:.2} {:.2} {:.2} {:.2}",
                    rect.left as f64 / 100.0,
                    rect.bottom as f64 / 100.0,
                    rect.right as f64 / 100.0,
                    rect.top as f64 / 100.0,
                )
            }
            Command::ResetGains => "ResetGains".to_string(),
            Command::GetGains => "Gains".to_string(),
            Command::SetGain { channel, value } => {
                format!("Gain {} {:.6}", *channel as u8, value)
            }
            Command::StartRecording {
                experiment,
                recording,
                path,
            } => format!(
                "Start Experiment={} Recording={} Path={}",
                experiment, recording, path
            ),
            Command::StopRecording => "Stop".to_string(),
            Command::Close => "Close".to_string(),
        }
    }
}

/// Decode raw reply bytes to text
///
/// No interpretation beyond lossy UTF-8 conversion; never panics.
pub fn decode_reply(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_wire_form() {
        let cmd = Command::SetResolution {
            width: 640,
            height: 480,
        };
        assert_eq!(cmd.wire_text(), "Resolution 640 480");
        assert_eq!(cmd.encode(), b"Resolution 640 480\n");
    }

    #[test]
    fn test_framerate_wire_form() {
        assert_eq!(Command::SetFramerate(30).wire_text(), "Framerate 30");
    }

    #[test]
    fn test_flip_wire_forms() {
        let vflip = Command::SetFlip {
            axis: FlipAxis::Vertical,
            enabled: true,
        };
        let hflip = Command::SetFlip {
            axis: FlipAxis::Horizontal,
            enabled: false,
        };
        assert_eq!(vflip.wire_text(), "VFlip 1");
        assert_eq!(hflip.wire_text(), "HFlip 0");
    }

    #[test]
    fn test_zoom_percent_to_fraction() {
        let full = Command::SetZoom(ZoomRect::new(0, 0, 100, 100));
        assert_eq!(full.wire_text(), "Zoom 0.00 0.00 1.00 1.00");

        let roi = Command::SetZoom(ZoomRect::new(10, 10, 80, 80));
        assert_eq!(roi.wire_text(), "Zoom 0.10 0.10 0.80 0.80");
    }

    #[test]
    fn test_gain_wire_forms() {
        assert_eq!(Command::ResetGains.wire_text(), "ResetGains");
        assert_eq!(Command::GetGains.wire_text(), "Gains");
        let set = Command::SetGain {
            channel: GainChannel::Blue,
            value: 1.5,
        };
        assert_eq!(set.wire_text(), "Gain 1 1.500000");
    }

    #[test]
    fn test_recording_wire_forms() {
        let start = Command::StartRecording {
            experiment: 1,
            recording: 2,
            path: "/data/session1".to_string(),
        };
        assert_eq!(
            start.wire_text(),
            "Start Experiment=1 Recording=2 Path=/data/session1"
        );
        assert_eq!(Command::StopRecording.wire_text(), "Stop");
        assert_eq!(Command::Close.wire_text(), "Close");
    }

    #[test]
    fn test_encode_deterministic() {
        let cmd = Command::SetZoom(ZoomRect::new(25, 30, 75, 90));
        assert_eq!(cmd.encode(), cmd.encode());
    }

    #[test]
    fn test_decode_reply_lossy() {
        assert_eq!(decode_reply(b"Done"), "Done");
        assert_eq!(decode_reply(b""), "");
        // invalid UTF-8 must not panic
        assert_eq!(decode_reply(&[0xff, 0xfe]), "\u{fffd}\u{fffd}");
    }
}
