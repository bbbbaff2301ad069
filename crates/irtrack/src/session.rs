use irtrack_calib::{AddPointOutcome, CalibrationError, CalibrationPhase, HomographyCalibrator};
use irtrack_core::{GrayImageView, TargetRect};
use irtrack_marker::MarkerDetectorParams;
use irtrack_protocol::{PixelPoint, TransportError, UdpCoordinateSender};
use nalgebra::Point2;
use serde::Serialize;

use crate::compositor::{FrameCompositor, FrameResult};
use crate::config::{AppConfig, ConfigError};
use crate::source::{FrameSource, SourceError};

#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Operator commands delivered to the tracking loop.
#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    /// Calibration click in raw sensor coordinates.
    Click(Point2<f32>),
    Reset,
    ToggleSend,
    ApplySettings(AppConfig),
    Quit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionControl {
    Continue,
    Quit,
}

/// Per-frame summary, serializable as one JSON line.
#[derive(Clone, Debug, Serialize)]
pub struct FrameReport {
    pub frame: u64,
    pub phase: CalibrationPhase,
    pub markers: Vec<[f32; 2]>,
    pub in_bounds: Vec<PixelPoint>,
    /// Payload bytes published for this frame.
    pub sent_bytes: usize,
}

/// Output of one processed frame.
#[derive(Clone, Debug)]
pub struct Tick {
    pub result: FrameResult,
    pub report: FrameReport,
}

/// State of one tracking run: settings, calibration and the packet sender.
///
/// Only the loop thread touches a session, through `&mut self`.
#[derive(Debug)]
pub struct Session {
    config: AppConfig,
    target: TargetRect,
    calibrator: HomographyCalibrator,
    compositor: FrameCompositor,
    sender: UdpCoordinateSender,
    sending: bool,
    pending_exposure: Option<u32>,
    frames: u64,
}

impl Session {
    /// Validate `config`, bind an ephemeral sender socket and aim it at the
    /// configured destination.
    pub fn new(config: AppConfig, params: MarkerDetectorParams) -> Result<Self, SessionError> {
        let sender = UdpCoordinateSender::bind("0.0.0.0:0")?;
        Self::with_sender(config, params, sender)
    }

    pub fn with_sender(
        config: AppConfig,
        params: MarkerDetectorParams,
        mut sender: UdpCoordinateSender,
    ) -> Result<Self, SessionError> {
        let config = config.sanitized();
        config.validate()?;
        let target = config.target_rect().map_err(ConfigError::from)?;
        sender.set_target(&config.ip, config.port)?;
        Ok(Self {
            pending_exposure: Some(config.exposure),
            config,
            target,
            calibrator: HomographyCalibrator::new(),
            compositor: FrameCompositor::new(params),
            sender,
            sending: true,
            frames: 0,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn target(&self) -> &TargetRect {
        &self.target
    }

    pub fn calibrator(&self) -> &HomographyCalibrator {
        &self.calibrator
    }

    pub fn sender(&self) -> &UdpCoordinateSender {
        &self.sender
    }

    /// Whether in-bounds points are published once calibrated.
    pub fn is_sending(&self) -> bool {
        self.sending
    }

    pub fn set_sending(&mut self, sending: bool) {
        self.sending = sending;
    }

    /// Apply one operator command. Rejected clicks and settings are logged
    /// and leave the session unchanged.
    pub fn handle(&mut self, event: InputEvent) -> SessionControl {
        match event {
            InputEvent::Click(p) => {
                // the calibrator logs rejected corners itself
                let _ = self.click(p);
            }
            InputEvent::Reset => self.calibrator.reset(),
            InputEvent::ToggleSend => {
                self.sending = !self.sending;
                log::info!("continuous send {}", if self.sending { "on" } else { "off" });
            }
            InputEvent::ApplySettings(config) => {
                if let Err(err) = self.apply_settings(config) {
                    log::warn!("settings rejected: {err}");
                }
            }
            InputEvent::Quit => return SessionControl::Quit,
        }
        SessionControl::Continue
    }

    pub fn click(&mut self, p: Point2<f32>) -> Result<AddPointOutcome, CalibrationError> {
        self.calibrator.add_point(p, &self.target)
    }

    /// Replace the settings. A new target size resets calibration; a new
    /// address retargets the sender; a new exposure is forwarded to the
    /// frame source on the next [`tick`](Self::tick).
    pub fn apply_settings(&mut self, config: AppConfig) -> Result<(), SessionError> {
        let config = config.sanitized();
        config.validate()?;
        let target = config.target_rect().map_err(ConfigError::from)?;

        if config.ip != self.config.ip || config.port != self.config.port {
            self.sender.set_target(&config.ip, config.port)?;
        }
        if target != self.target {
            self.calibrator.reset();
            self.target = target;
        }
        if config.exposure != self.config.exposure {
            self.pending_exposure = Some(config.exposure);
        }
        self.config = config;
        Ok(())
    }

    /// Run the pipeline on `frame` and publish the in-bounds points.
    ///
    /// Nothing is sent before calibration completes, while sending is off,
    /// or when no marker falls inside the target. Send failures are logged
    /// and do not interrupt the loop.
    pub fn process_frame(&mut self, frame: &GrayImageView<'_>) -> Tick {
        let result = self.compositor.compose(frame, &self.calibrator, &self.target);
        let in_bounds: Vec<PixelPoint> = result
            .in_bounds
            .iter()
            .copied()
            .map(PixelPoint::from_point)
            .collect();

        let mut sent_bytes = 0;
        if self.sending && result.calibrated && !in_bounds.is_empty() {
            match self.sender.send(&in_bounds) {
                Ok(n) => sent_bytes = n,
                Err(err) => log::warn!("send failed: {err}"),
            }
        }

        let report = FrameReport {
            frame: self.frames,
            phase: self.calibrator.phase(),
            markers: result.markers.iter().map(|p| [p.x, p.y]).collect(),
            in_bounds,
            sent_bytes,
        };
        self.frames += 1;
        Tick { result, report }
    }

    /// Acquire one frame from `source` and process it. `Ok(None)` when the
    /// source had no frame ready.
    pub fn tick(&mut self, source: &mut dyn FrameSource) -> Result<Option<Tick>, SessionError> {
        if let Some(exposure) = self.pending_exposure.take() {
            source.set_exposure(exposure);
        }
        let Some(frame) = source.next_frame()? else {
            return Ok(None);
        };
        Ok(Some(self.process_frame(&frame.view())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        let sender = UdpCoordinateSender::bind("127.0.0.1:0").unwrap();
        Session::with_sender(AppConfig::default(), MarkerDetectorParams::default(), sender)
            .unwrap()
    }

    fn calibrate(s: &mut Session) {
        for p in [(10.0, 10.0), (630.0, 10.0), (630.0, 470.0), (10.0, 470.0)] {
            s.handle(InputEvent::Click(Point2::new(p.0, p.1)));
        }
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let sender = UdpCoordinateSender::bind("127.0.0.1:0").unwrap();
        let cfg = AppConfig {
            ip: "nowhere".into(),
            ..AppConfig::default()
        };
        assert!(matches!(
            Session::with_sender(cfg, MarkerDetectorParams::default(), sender),
            Err(SessionError::Config(_))
        ));
    }

    #[test]
    fn events_drive_calibration_and_toggles() {
        let mut s = session();
        calibrate(&mut s);
        assert!(s.calibrator().is_ready());

        assert_eq!(s.handle(InputEvent::ToggleSend), SessionControl::Continue);
        assert!(!s.is_sending());
        s.handle(InputEvent::Reset);
        assert!(s.calibrator().is_empty());
        assert_eq!(s.handle(InputEvent::Quit), SessionControl::Quit);
    }

    #[test]
    fn target_size_change_resets_calibration() {
        let mut s = session();
        calibrate(&mut s);

        let same_size = AppConfig {
            port: 9000,
            ..AppConfig::default()
        };
        s.handle(InputEvent::ApplySettings(same_size));
        assert!(s.calibrator().is_ready());
        assert_eq!(s.sender().target().map(|a| a.port()), Some(9000));

        let resized = AppConfig {
            target_width: 800,
            ..s.config().clone()
        };
        s.handle(InputEvent::ApplySettings(resized));
        assert!(!s.calibrator().is_ready());
        assert_eq!(s.target().width(), 800);
    }

    #[test]
    fn rejected_settings_leave_the_session_unchanged() {
        let mut s = session();
        calibrate(&mut s);
        let bad = AppConfig {
            target_width: 0,
            ..AppConfig::default()
        };
        assert!(s.apply_settings(bad).is_err());
        assert!(s.calibrator().is_ready());
        assert_eq!(s.config(), &AppConfig::default());
    }

    #[test]
    fn exposure_is_clamped() {
        let mut s = session();
        let bright = AppConfig {
            exposure: 20_000,
            ..AppConfig::default()
        };
        s.apply_settings(bright).unwrap();
        assert_eq!(s.config().exposure, 7500);
    }
}
