use std::collections::HashSet;

use crate::config::Config;
use crate::detection::Detection;
use crate::error::Error;
use crate::extractor::{ColorObservation, DominantColorExtractor};
use crate::frame::Frame;
use crate::registry::TrackRegistry;
use crate::report::{Report, ReportBuilder};
use crate::translate::translate;

/// Counters of what happened to the incoming frames and detections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub frames_seen: u64,
    pub frames_admitted: u64,
    pub detections: u64,
    pub rejected: u64,
    pub below_threshold: u64,
    pub not_allowed: u64,
    pub colors_extracted: u64,
}

/// Processing state of a single video.
pub struct Session {
    config: Config,
    frame_skip_factor: u64,
    registry: TrackRegistry,
    extractor: Option<DominantColorExtractor>,
    stats: SessionStats,
}

impl Session {
    /// `source_fps` is the frame rate of the video; frames are thinned out to
    /// roughly the configured classification rate.
    pub fn new(config: Config, source_fps: f32) -> Result<Self, Error> {
        config.validate()?;

        let frame_skip_factor = frame_skip_factor(source_fps, config.classification.fps);
        let extractor = if config.color.enabled {
            Some(DominantColorExtractor::new(&config.color))
        } else {
            None
        };

        log::debug!(
            "session: source fps {}, classifying every {} frame(s), at most {}",
            source_fps,
            frame_skip_factor,
            config.classification.max_predictions
        );

        Ok(Self {
            registry: TrackRegistry::new(config.motion),
            frame_skip_factor,
            extractor,
            config,
            stats: SessionStats::default(),
        })
    }

    #[inline]
    pub fn frame_skip_factor(&self) -> u64 {
        self.frame_skip_factor
    }

    #[inline]
    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    #[inline]
    pub fn registry(&self) -> &TrackRegistry {
        &self.registry
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Whether more frames can still be admitted.
    #[inline]
    pub fn is_saturated(&self) -> bool {
        self.stats.frames_admitted >= self.config.classification.max_predictions
    }

    #[inline]
    pub fn admits(&self, frame_index: u64) -> bool {
        !self.is_saturated() && frame_index % self.frame_skip_factor == 0
    }

    /// Folds the detections of one frame into the tracks.
    ///
    /// Returns `false` when the frame was skipped.
    pub fn process_frame(&mut self, frame: &Frame) -> Result<bool, Error> {
        self.stats.frames_seen += 1;

        if !self.admits(frame.index) {
            return Ok(false);
        }

        self.stats.frames_admitted += 1;
        let mut seen = HashSet::new();

        for det in frame.iter() {
            self.stats.detections += 1;

            if !det.is_well_formed() {
                self.stats.rejected += 1;
                log::warn!(
                    "frame {}: rejecting malformed detection of track {} (p={}, bbox={:?})",
                    frame.index,
                    det.track_id,
                    det.confidence,
                    det.bbox.as_slice()
                );
                continue;
            }

            if !seen.insert(det.track_id) {
                self.stats.rejected += 1;
                log::warn!(
                    "frame {}: rejecting repeated detection of track {}",
                    frame.index,
                    det.track_id
                );
                continue;
            }

            if det.confidence < self.config.classification.threshold {
                self.stats.below_threshold += 1;
                continue;
            }

            if let Some(allowed) = &self.config.classification.allowed_labels {
                if !allowed.iter().any(|l| l == &det.label) {
                    self.stats.not_allowed += 1;
                    continue;
                }
            }

            let color = self.sample_color(frame, det);

            if self.config.classification.translate_labels {
                let mut det = det.clone();
                det.label = translate(&det.label).to_string();
                self.registry.route(frame.index, frame.dims, &det, color)?;
            } else {
                self.registry.route(frame.index, frame.dims, det, color)?;
            }
        }

        Ok(true)
    }

    fn sample_color(&mut self, frame: &Frame, det: &Detection) -> Option<ColorObservation> {
        let extractor = self.extractor.as_ref()?;
        let pixels = frame.pixels.as_ref()?;

        if !self
            .registry
            .color_due(det.track_id, self.config.color.prediction_interval)
        {
            return None;
        }

        let obs = extractor.extract(pixels.view(), &det.bbox, det.mask.as_deref());
        self.stats.colors_extracted += 1;

        log::trace!("frame {}: track {} colors {:?}", frame.index, det.track_id, obs.names);

        Some(obs)
    }

    /// Ends the video and summarises every track seen at least `min_detections` times.
    pub fn finish(self) -> Report {
        let report = ReportBuilder::build(
            self.registry.all_tracks(),
            self.config.classification.min_detections,
        );

        log::info!(
            "session finished: {} of {} frames classified, {} tracks, {} reported, {} detections rejected",
            self.stats.frames_admitted,
            self.stats.frames_seen,
            self.registry.len(),
            report.object_count(),
            self.stats.rejected
        );

        report
    }
}

/// Every how many source frames one is classified, never less than one.
pub fn frame_skip_factor(source_fps: f32, classification_fps: f32) -> u64 {
    let factor = (source_fps / classification_fps).trunc();

    if factor.is_finite() && factor >= 1.0 {
        factor as u64
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bbox::BBox;
    use ndarray::Array3;

    fn config() -> Config {
        let mut config = Config::default();
        config.classification.min_detections = 1;
        config.color.enabled = false;
        config
    }

    fn det(id: u64, label: &str, p: f32) -> Detection {
        Detection::new(id, label, p, BBox::ltrb(0.0, 0.0, 10.0, 10.0))
    }

    #[test]
    fn test_frame_skip_factor() {
        assert_eq!(frame_skip_factor(25.0, 3.0), 8);
        assert_eq!(frame_skip_factor(30.0, 3.0), 10);
        assert_eq!(frame_skip_factor(2.0, 3.0), 1);
        assert_eq!(frame_skip_factor(0.0, 3.0), 1);
        assert_eq!(frame_skip_factor(f32::NAN, 3.0), 1);
    }

    #[test]
    fn test_admission() {
        let mut config = config();
        config.classification.max_predictions = 3;
        let mut session = Session::new(config, 30.0).unwrap();

        let admitted: Vec<u64> = (0..100)
            .filter(|&i| session.process_frame(&Frame::new(i, (10, 10), vec![])).unwrap())
            .collect();

        assert_eq!(admitted, vec![0, 10, 20]);
        assert_eq!(session.stats().frames_seen, 100);
        assert!(session.is_saturated());
    }

    #[test]
    fn test_filters() {
        let mut config = config();
        config.classification.allowed_labels = Some(vec!["car".into(), "person".into()]);
        let mut session = Session::new(config, 3.0).unwrap();

        let frame = Frame::new(
            0,
            (100, 100),
            vec![
                det(1, "car", 0.9),
                det(2, "person", 0.1),
                det(3, "dog", 0.9),
                det(4, "car", 1.7),
                det(5, "person", 0.6),
            ],
        );
        assert!(session.process_frame(&frame).unwrap());

        let stats = session.stats();
        assert_eq!(stats.detections, 5);
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.below_threshold, 1);
        assert_eq!(stats.not_allowed, 1);

        let report = session.finish();
        assert_eq!(report.properties(), &["car", "pedestrian"]);
    }

    #[test]
    fn test_repeated_id_in_frame() {
        let mut session = Session::new(config(), 3.0).unwrap();

        let frame = Frame::new(0, (10, 10), vec![det(1, "car", 0.9), det(1, "car", 0.8), det(2, "bus", 0.9)]);
        session.process_frame(&frame).unwrap();

        assert_eq!(session.stats().rejected, 1);
        assert_eq!(session.registry().get(1).unwrap().frames(), &[0]);
        assert_eq!(session.registry().get(1).unwrap().last_confidence(), 0.9);
    }

    #[test]
    fn test_frames_out_of_order() {
        let mut session = Session::new(config(), 3.0).unwrap();

        session
            .process_frame(&Frame::new(5, (10, 10), vec![det(1, "car", 0.9)]))
            .unwrap();
        let err = session
            .process_frame(&Frame::new(2, (10, 10), vec![det(1, "car", 0.9)]))
            .unwrap_err();

        assert!(matches!(err, Error::FramesOutOfOrder { id: 1, previous: 5, frame: 2 }));
        assert_eq!(session.registry().get(1).unwrap().occurrences(), 1);
    }

    #[test]
    fn test_oversized_box_and_mask() {
        let mut config = config();
        config.color.enabled = true;
        let mut session = Session::new(config, 3.0).unwrap();

        let pixels = Array3::<u8>::zeros((20, 20, 3));
        let dets = vec![
            Detection::new(1, "car", 0.9, BBox::ltrb(-1e30, 0.0, 1e30, 10.0)),
            det(2, "car", 0.9).with_mask(vec![[0, 0], [i32::MAX, 0], [0, 5]]),
        ];
        session
            .process_frame(&Frame::new(0, (0, 0), dets).with_pixels(pixels))
            .unwrap();

        assert_eq!(session.stats().colors_extracted, 2);
        assert_eq!(session.registry().get(1).unwrap().dominant_color_names(), &["black"]);
        assert_eq!(session.registry().get(2).unwrap().dominant_color_names(), &["black"]);
    }

    #[test]
    fn test_untranslated_labels() {
        let mut config = config();
        config.classification.translate_labels = false;
        let mut session = Session::new(config, 3.0).unwrap();

        session
            .process_frame(&Frame::new(0, (10, 10), vec![det(1, "truck", 0.9)]))
            .unwrap();

        assert_eq!(session.finish().properties(), &["truck"]);
    }

    #[test]
    fn test_min_detections() {
        let mut config = config();
        config.classification.min_detections = 2;
        let mut session = Session::new(config, 3.0).unwrap();

        session
            .process_frame(&Frame::new(0, (10, 10), vec![det(1, "car", 0.9), det(2, "bus", 0.9)]))
            .unwrap();
        session
            .process_frame(&Frame::new(1, (10, 10), vec![det(2, "bus", 0.9)]))
            .unwrap();

        assert_eq!(session.registry().len(), 2);
        assert_eq!(session.finish().properties(), &["bus"]);
    }

    #[test]
    fn test_colors_rate_limited() {
        let mut config = config();
        config.color.enabled = true;
        config.color.prediction_interval = 2;
        config.color.downsample_factor = 0.0;
        let mut session = Session::new(config, 3.0).unwrap();

        let pixels = Array3::from_shape_fn((20, 20, 3), |(_, _, c)| [0u8, 0, 255][c]);
        for i in 0..5 {
            let frame = Frame::new(i, (0, 0), vec![det(1, "car", 0.9)]).with_pixels(pixels.clone());
            session.process_frame(&frame).unwrap();
        }

        assert_eq!(session.stats().colors_extracted, 3);

        let track = session.registry().get(1).unwrap();
        assert_eq!(track.colors().len(), 3);
        assert_eq!(track.dominant_color_names(), &["red"]);
        assert_eq!(track.frame_dims(), (20, 20));
    }

    #[test]
    fn test_no_colors_without_pixels() {
        let mut config = config();
        config.color.enabled = true;
        let mut session = Session::new(config, 3.0).unwrap();

        session
            .process_frame(&Frame::new(0, (10, 10), vec![det(1, "car", 0.9)]))
            .unwrap();

        assert_eq!(session.stats().colors_extracted, 0);
        assert!(session.registry().get(1).unwrap().colors().is_empty());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = config();
        config.classification.fps = 0.0;

        assert!(matches!(Session::new(config, 25.0), Err(Error::Config(_))));
    }
}
