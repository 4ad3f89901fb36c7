use std::collections::HashMap;

use crate::config::MotionPolicy;
use crate::detection::Detection;
use crate::error::Error;
use crate::extractor::ColorObservation;
use crate::track::Track;

/// All tracks of one video, keyed by tracker id and kept in first-seen order.
#[derive(Debug, Clone)]
pub struct TrackRegistry {
    policy: MotionPolicy,
    tracks: Vec<Track>,
    index: HashMap<u64, usize>,
}

impl TrackRegistry {
    pub fn new(policy: MotionPolicy) -> Self {
        Self {
            policy,
            tracks: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Creates the track on first sight of `det.track_id`, otherwise folds the
    /// detection into the existing one.
    pub fn route(
        &mut self,
        frame_index: u64,
        frame_dims: (u32, u32),
        det: &Detection,
        color: Option<ColorObservation>,
    ) -> Result<(), Error> {
        if !self.index.contains_key(&det.track_id) {
            log::debug!("new track {} ({}) at frame {}", det.track_id, det.label, frame_index);

            self.index.insert(det.track_id, self.tracks.len());
            self.tracks.push(Track::new(
                det.track_id,
                &det.label,
                det.confidence,
                det.bbox,
                frame_index,
                frame_dims,
                color,
                self.policy,
            ));

            return Ok(());
        }

        self.update(frame_index, det, color)
    }

    fn update(
        &mut self,
        frame_index: u64,
        det: &Detection,
        color: Option<ColorObservation>,
    ) -> Result<(), Error> {
        let idx = *self
            .index
            .get(&det.track_id)
            .ok_or(Error::TrackNotFound(det.track_id))?;

        let track = self
            .tracks
            .get_mut(idx)
            .ok_or(Error::TrackNotFound(det.track_id))?;

        if frame_index <= track.last_frame() {
            return Err(Error::FramesOutOfOrder {
                id: det.track_id,
                previous: track.last_frame(),
                frame: frame_index,
            });
        }

        track.record_observation(&det.label, det.confidence, det.bbox, frame_index, color);
        track.check_invariants()
    }

    /// Whether the next observation of `id` should carry a color sample.
    ///
    /// Unknown ids are always due. A known track with `k` observations is due
    /// when `k` is a multiple of `interval`.
    pub fn color_due(&self, id: u64, interval: u32) -> bool {
        match self.get(id) {
            Some(track) => track.occurrences() % interval.max(1) as usize == 0,
            None => true,
        }
    }

    #[inline]
    pub fn get(&self, id: u64) -> Option<&Track> {
        self.tracks.get(*self.index.get(&id)?)
    }

    #[inline]
    pub fn contains(&self, id: u64) -> bool {
        self.index.contains_key(&id)
    }

    #[inline]
    pub fn all_tracks(&self) -> &[Track] {
        &self.tracks
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    #[inline]
    pub fn policy(&self) -> &MotionPolicy {
        &self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bbox::BBox;

    fn det(id: u64, label: &str, x: f32) -> Detection {
        Detection::new(id, label, 0.9, BBox::ltrb(x, 0.0, x + 10.0, 10.0))
    }

    #[test]
    fn test_route_creates_then_updates() {
        let mut reg = TrackRegistry::new(MotionPolicy::default());

        reg.route(0, (100, 100), &det(7, "car", 0.0), None).unwrap();
        reg.route(0, (100, 100), &det(3, "bus", 50.0), None).unwrap();
        reg.route(1, (100, 100), &det(7, "car", 5.0), None).unwrap();

        assert_eq!(reg.len(), 2);
        assert_eq!(reg.get(7).unwrap().occurrences(), 2);
        assert_eq!(reg.get(3).unwrap().occurrences(), 1);
        assert!(reg.get(1).is_none());
        assert!(reg.contains(3));
    }

    #[test]
    fn test_insertion_order() {
        let mut reg = TrackRegistry::new(MotionPolicy::default());

        for (frame, id) in [(0, 9), (0, 2), (1, 5), (2, 2), (3, 9)] {
            reg.route(frame, (100, 100), &det(id, "car", 0.0), None).unwrap();
        }

        let ids: Vec<u64> = reg.all_tracks().iter().map(|t| t.id()).collect();
        assert_eq!(ids, vec![9, 2, 5]);
    }

    #[test]
    fn test_update_unknown_id_fails() {
        let mut reg = TrackRegistry::new(MotionPolicy::default());

        let err = reg.update(0, &det(11, "car", 0.0), None).unwrap_err();
        assert!(matches!(err, Error::TrackNotFound(11)));
        assert!(reg.is_empty());
    }

    #[test]
    fn test_repeated_frame_is_rejected() {
        let mut reg = TrackRegistry::new(MotionPolicy::default());

        reg.route(3, (100, 100), &det(1, "car", 0.0), None).unwrap();
        reg.route(4, (100, 100), &det(1, "car", 2.0), None).unwrap();

        for frame in [4, 2] {
            let err = reg.route(frame, (100, 100), &det(1, "car", 4.0), None).unwrap_err();
            assert!(matches!(err, Error::FramesOutOfOrder { id: 1, previous: 4, .. }));
        }

        let track = reg.get(1).unwrap();
        assert_eq!(track.frames(), &[3, 4]);
        assert!(track.check_invariants().is_ok());
    }

    #[test]
    fn test_color_due() {
        let mut reg = TrackRegistry::new(MotionPolicy::default());
        assert!(reg.color_due(1, 3));

        let mut due = Vec::new();
        for frame in 0..7 {
            due.push(reg.color_due(1, 3));
            reg.route(frame, (100, 100), &det(1, "car", 0.0), None).unwrap();
        }

        assert_eq!(due, vec![true, false, false, true, false, false, true]);
    }

    #[test]
    fn test_color_due_every_time() {
        let mut reg = TrackRegistry::new(MotionPolicy::default());

        for frame in 0..4 {
            assert!(reg.color_due(1, 1));
            reg.route(frame, (100, 100), &det(1, "car", 0.0), None).unwrap();
        }
    }

    #[test]
    fn test_policy_is_passed_to_tracks() {
        let mut reg = TrackRegistry::new(MotionPolicy::new(5.0, 5.0));

        for frame in 0..3 {
            reg.route(frame, (100, 100), &det(1, "car", 0.0), None).unwrap();
        }

        assert!(!reg.get(1).unwrap().is_static());
        assert_eq!(reg.policy().min_distance, 5.0);
    }
}
