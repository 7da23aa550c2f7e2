//! Camera controller facade
//!
//! [`CameraController`] ties the parameter cache to the session: every
//! setting change updates the cache first, then pushes the value to the
//! peer best-effort when no recording is active. Transmission failures
//! are logged rather than surfaced, so the cache always reflects what was
//! last requested. While recording, setting changes stay local and take
//! effect on the next parameter replay or reconnect.
//!
//! All methods take `&self`; the session and the cache live behind
//! mutexes so callers on different threads are serialized onto the single
//! in-flight exchange the session allows.

use crate::connection::{Dialer, Endpoint};
use crate::error::{Error, Result};
use crate::params::{find_format, CameraParams, ZoomRect};
use crate::protocol::{Command, FlipAxis, GainChannel};
use crate::session::{CameraSession, DEFAULT_COMMAND_TIMEOUT};
use chrono::Local;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Host-supplied recording identifiers
///
/// Supplied by whatever session machinery owns experiment numbering and
/// the recording directory layout.
pub trait RecordingInfo: Send + Sync {
    /// Experiment number for the upcoming recording
    fn experiment_number(&self) -> u32;

    /// Recording number for the upcoming recording
    fn recording_number(&self) -> u32;

    /// Target recording directory; empty means "let the controller pick"
    fn recording_path(&self) -> String;
}

/// Notification pushed once per recording start
#[derive(Debug, Clone)]
pub struct RecordingStarted {
    /// Address of the camera endpoint
    pub address: String,
    /// Recording path assigned by the remote side
    pub remote_path: String,
    /// Software timestamp taken when the reply arrived
    pub timestamp: chrono::DateTime<Local>,
}

/// Sink for the one informational side-channel the controller has
pub trait EventSink: Send + Sync {
    fn recording_started(&self, event: &RecordingStarted);
}

/// Remote camera controller
///
/// Owns one [`CameraSession`] and the [`CameraParams`] cache. See the
/// module docs for update/transmit rules.
pub struct CameraController {
    session: Mutex<CameraSession>,
    params: Mutex<CameraParams>,
    endpoint: Mutex<Endpoint>,
    recording_info: Arc<dyn RecordingInfo>,
    events: Arc<dyn EventSink>,
    remote_rec_path: Mutex<String>,
    command_timeout: Mutex<Duration>,
}

impl CameraController {
    /// Create a disconnected controller
    pub fn new(
        dialer: Arc<dyn Dialer>,
        endpoint: Endpoint,
        recording_info: Arc<dyn RecordingInfo>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        CameraController {
            session: Mutex::new(CameraSession::new(dialer)),
            params: Mutex::new(CameraParams::default()),
            endpoint: Mutex::new(endpoint),
            recording_info,
            events,
            remote_rec_path: Mutex::new(String::new()),
            command_timeout: Mutex::new(DEFAULT_COMMAND_TIMEOUT),
        }
    }

    /// Override the receive timeout used for setting changes
    pub fn set_command_timeout(&self, timeout: Duration) {
        *self.command_timeout.lock() = timeout;
    }

    // === Connection lifecycle ===

    /// Connect (or reconnect) and replay resolution and framerate
    ///
    /// Flip, gain and zoom are not replayed automatically; callers
    /// re-send those explicitly if desired.
    pub fn connect(&self) -> Result<()> {
        let endpoint = self.endpoint.lock().clone();
        {
            let mut session = self.session.lock();
            session.close();
            session.open(&endpoint)?;
        }
        self.send_camera_parameters();
        Ok(())
    }

    /// Close the connection; idempotent
    pub fn disconnect(&self) {
        self.session.lock().close();
    }

    pub fn is_connected(&self) -> bool {
        self.session.lock().is_connected()
    }

    /// Change the peer address
    ///
    /// A different address while connected forces a close + reopen; with
    /// `connect` set the reopen happens even from the closed state.
    pub fn set_address(&self, address: &str, connect: bool) -> Result<()> {
        {
            let mut endpoint = self.endpoint.lock();
            if endpoint.address.eq_ignore_ascii_case(address) {
                return Ok(());
            }
            endpoint.address = address.to_string();
        }
        self.reopen_if(connect)
    }

    /// Change the peer port (same reconnect rules as [`set_address`])
    ///
    /// [`set_address`]: CameraController::set_address
    pub fn set_port(&self, port: u16, connect: bool) -> Result<()> {
        {
            let mut endpoint = self.endpoint.lock();
            if endpoint.port == port {
                return Ok(());
            }
            endpoint.port = port;
        }
        self.reopen_if(connect)
    }

    pub fn endpoint(&self) -> Endpoint {
        self.endpoint.lock().clone()
    }

    fn reopen_if(&self, force: bool) -> Result<()> {
        let was_open = {
            let mut session = self.session.lock();
            let open = session.is_connected();
            session.close();
            open
        };
        if force || was_open {
            let endpoint = self.endpoint.lock().clone();
            self.session.lock().open(&endpoint)?;
        }
        Ok(())
    }

    // === Settings ===

    /// Set the capture resolution
    ///
    /// A resolution matching a supported capture mode cascades to the
    /// framerate: the cached value is kept when the new mode's range
    /// allows it, otherwise it resets to the mode's nominal default (and
    /// the corrected framerate is pushed along with the resolution).
    pub fn set_resolution(&self, width: u32, height: u32) -> Result<()> {
        let (resolution_cmd, framerate_cmd) = {
            let mut params = self.params.lock();
            let old_framerate = params.framerate;
            match find_format(width, height) {
                Some(format) => params.apply_format(format),
                None => {
                    log::debug!("Unknown capture mode {}x{}", width, height);
                    params.width = width;
                    params.height = height;
                }
            }
            let framerate_cmd = (params.framerate != old_framerate)
                .then(|| Command::SetFramerate(params.framerate));
            (
                Command::SetResolution { width, height },
                framerate_cmd,
            )
        };

        self.push_if_idle(&resolution_cmd);
        if let Some(cmd) = framerate_cmd {
            self.push_if_idle(&cmd);
        }
        Ok(())
    }

    /// Set the capture framerate (validated against the cached mode)
    pub fn set_framerate(&self, fps: u32) -> Result<()> {
        {
            let mut params = self.params.lock();
            if !params.framerate_valid(fps) {
                let (min, max) = params.framerate_range();
                return Err(Error::InvalidParameter(format!(
                    "framerate {} outside [{}, {}]",
                    fps, min, max
                )));
            }
            params.framerate = fps;
        }
        self.push_if_idle(&Command::SetFramerate(fps));
        Ok(())
    }

    /// Enable or disable vertical flip
    pub fn set_vflip(&self, enabled: bool) -> Result<()> {
        self.params.lock().vflip = enabled;
        self.push_if_idle(&Command::SetFlip {
            axis: FlipAxis::Vertical,
            enabled,
        });
        Ok(())
    }

    /// Enable or disable horizontal flip
    pub fn set_hflip(&self, enabled: bool) -> Result<()> {
        self.params.lock().hflip = enabled;
        self.push_if_idle(&Command::SetFlip {
            axis: FlipAxis::Horizontal,
            enabled,
        });
        Ok(())
    }

    /// Update the region of interest
    ///
    /// Validated against the currently cached rectangle; a rejected
    /// update changes nothing and sends nothing.
    pub fn set_zoom(&self, rect: ZoomRect) -> Result<()> {
        {
            let mut params = self.params.lock();
            if !params.try_set_zoom(rect) {
                return Err(Error::InvalidParameter(format!(
                    "zoom {:?} rejected against cached {:?}",
                    rect, params.zoom
                )));
            }
        }
        self.push_if_idle(&Command::SetZoom(rect));
        Ok(())
    }

    /// Set one white-balance gain channel (value in [0, 8])
    pub fn set_gain(&self, channel: GainChannel, value: f64) -> Result<()> {
        {
            let mut params = self.params.lock();
            if !params.try_set_gain(channel as usize, value) {
                return Err(Error::InvalidParameter(format!(
                    "gain {} outside [0, 8]",
                    value
                )));
            }
        }
        self.push_if_idle(&Command::SetGain { channel, value });
        Ok(())
    }

    /// Reinitialize automatic gain and white-balance on the peer
    pub fn reset_gains(&self) -> Result<()> {
        self.push_if_idle(&Command::ResetGains);
        Ok(())
    }

    /// Query the peer's current white-balance gain pair
    ///
    /// Refreshes the cached pair on a parsable reply; an unparsable reply
    /// leaves the cache alone.
    pub fn get_gains(&self) -> Result<[f64; 2]> {
        let timeout = *self.command_timeout.lock();
        let reply = self
            .session
            .lock()
            .send_command(&Command::GetGains, Some(timeout))?;

        let mut parts = reply.split_whitespace();
        let parsed = match (parts.next(), parts.next()) {
            (Some(a), Some(b)) => match (a.parse::<f64>(), b.parse::<f64>()) {
                (Ok(g0), Ok(g1)) => Some([g0, g1]),
                _ => None,
            },
            _ => None,
        };

        match parsed {
            Some(gains) => {
                self.params.lock().gains = gains;
                Ok(gains)
            }
            None => Err(Error::InvalidParameter(format!(
                "unparsable gains reply: {:?}",
                reply
            ))),
        }
    }

    /// Replay the cached resolution and framerate to the peer
    pub fn send_camera_parameters(&self) {
        let (resolution, framerate) = {
            let params = self.params.lock();
            (
                Command::SetResolution {
                    width: params.width,
                    height: params.height,
                },
                Command::SetFramerate(params.framerate),
            )
        };
        self.push_if_idle(&resolution);
        self.push_if_idle(&framerate);
    }

    // === Recording ===

    /// Start a recording on the remote side
    ///
    /// Returns the recording path the peer assigned. The recording flag
    /// is set before transmission and stays set even if the exchange
    /// fails (optimistic cache; call [`stop_recording`] to clear it).
    /// A second start while recording is rejected.
    ///
    /// [`stop_recording`]: CameraController::stop_recording
    pub fn start_recording(&self) -> Result<String> {
        {
            let mut params = self.params.lock();
            if params.recording {
                return Err(Error::AlreadyRecording);
            }
            params.recording = true;
        }

        let mut path = self.recording_info.recording_path();
        if path.is_empty() {
            // unique directory name so the peer does not overwrite data
            path = generate_date_string();
        }

        let cmd = Command::StartRecording {
            experiment: self.recording_info.experiment_number(),
            recording: self.recording_info.recording_number(),
            path,
        };

        // recording start waits as long as the peer needs
        let remote_path = self.session.lock().send_command(&cmd, None)?;

        *self.remote_rec_path.lock() = remote_path.clone();

        let event = RecordingStarted {
            address: self.endpoint.lock().address.clone(),
            remote_path: remote_path.clone(),
            timestamp: Local::now(),
        };
        self.events.recording_started(&event);

        log::info!("Recording started, remote path: {}", remote_path);
        Ok(remote_path)
    }

    /// Stop the active recording (best-effort `Stop` to the peer)
    pub fn stop_recording(&self) -> Result<()> {
        self.params.lock().recording = false;

        let timeout = *self.command_timeout.lock();
        let mut session = self.session.lock();
        if let Err(e) = session.send_command(&Command::StopRecording, Some(timeout)) {
            log::warn!("Failed to send Stop: {}", e);
        }
        Ok(())
    }

    pub fn is_recording(&self) -> bool {
        self.params.lock().recording
    }

    /// Recording path assigned by the peer at the last start
    pub fn remote_recording_path(&self) -> String {
        self.remote_rec_path.lock().clone()
    }

    /// Snapshot of the cached parameter state
    pub fn params(&self) -> CameraParams {
        self.params.lock().clone()
    }

    // === Internals ===

    /// Push a command to the peer unless a recording is active
    ///
    /// Best-effort: failures are logged, never surfaced. The cache has
    /// already been updated by the caller.
    fn push_if_idle(&self, cmd: &Command) {
        if self.params.lock().recording {
            log::debug!("Recording active, holding back: {}", cmd.wire_text());
            return;
        }

        let timeout = *self.command_timeout.lock();
        let mut session = self.session.lock();
        match session.send_command(cmd, Some(timeout)) {
            Ok(reply) => log::debug!("Peer acknowledged {}: {}", cmd.wire_text(), reply),
            Err(e) => log::warn!("Failed to send {}: {}", cmd.wire_text(), e),
        }
    }
}

/// Fallback recording-directory name, `YYYY-MM-DD_HH-MM-SS`
fn generate_date_string() -> String {
    Local::now().format("%Y-%m-%d_%H-%M-%S").to_string()
}
