use nalgebra as na;

use crate::bbox::{BBox, Ltrb};
use crate::config::MotionPolicy;
use crate::error::Error;
use crate::extractor::ColorObservation;
use crate::tally::Tally;

/// Number of color names kept in the per-track summary.
pub const DOMINANT_COLOR_COUNT: usize = 3;

/// Everything observed about one tracked identity during a video.
#[derive(Debug, Clone)]
pub struct Track {
    id: u64,
    frame_width: u32,
    frame_height: u32,
    policy: MotionPolicy,

    frames: Vec<u64>,
    labels: Vec<String>,
    confidences: Vec<f32>,
    trajectory: Vec<BBox<Ltrb>>,
    centroids: Vec<na::Point2<f32>>,
    colors: Vec<ColorObservation>,

    // in px
    cumulative_distance: f32,
    net_displacement: f32,
    is_static: bool,

    label_votes: Tally<String>,
    majority_label: String,
    color_votes: Tally<String>,
    dominant_colors: Vec<String>,
}

impl Track {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: u64,
        label: &str,
        confidence: f32,
        bbox: BBox<Ltrb>,
        frame_index: u64,
        frame_dims: (u32, u32),
        color: Option<ColorObservation>,
        policy: MotionPolicy,
    ) -> Self {
        let mut label_votes = Tally::new();
        label_votes.push(label);

        let mut track = Self {
            id,
            frame_width: frame_dims.0,
            frame_height: frame_dims.1,
            policy,
            frames: vec![frame_index],
            labels: vec![label.to_string()],
            confidences: vec![confidence],
            trajectory: vec![bbox],
            centroids: vec![bbox.centroid()],
            colors: Vec::new(),
            cumulative_distance: 0.0,
            net_displacement: 0.0,
            is_static: true,
            label_votes,
            majority_label: label.to_string(),
            color_votes: Tally::new(),
            dominant_colors: Vec::new(),
        };

        if let Some(color) = color {
            track.push_color(color);
        }

        track
    }

    /// Folds one more detection of this identity into the track.
    ///
    /// All histories grow together and every derived value (distances, static
    /// flag, majority label, dominant colors) is brought up to date before
    /// returning, so no caller ever sees a half-updated track. `frame_index`
    /// must be greater than the last recorded one.
    pub fn record_observation(
        &mut self,
        label: &str,
        confidence: f32,
        bbox: BBox<Ltrb>,
        frame_index: u64,
        color: Option<ColorObservation>,
    ) {
        self.labels.push(label.to_string());
        self.confidences.push(confidence);
        self.trajectory.push(bbox);

        let centroid = bbox.centroid();
        let previous = self.centroids[self.centroids.len() - 1];
        self.centroids.push(centroid);
        self.frames.push(frame_index);

        if let Some(color) = color {
            self.push_color(color);
        }

        self.cumulative_distance += na::distance(&previous, &centroid);
        self.net_displacement = na::distance(&self.centroids[0], &centroid);
        self.is_static = self
            .policy
            .is_static(self.cumulative_distance, self.net_displacement);

        self.label_votes.push(label);
        if let Some(best) = self.label_votes.most_common() {
            self.majority_label.clone_from(best);
        }
    }

    fn push_color(&mut self, color: ColorObservation) {
        for name in &color.names {
            self.color_votes.push(name.as_str());
        }

        self.dominant_colors = self
            .color_votes
            .most_common_n(DOMINANT_COLOR_COUNT)
            .into_iter()
            .cloned()
            .collect();

        self.colors.push(color);
    }

    /// Fails when the per-observation histories have drifted apart or the
    /// frame indices are not strictly increasing.
    pub fn check_invariants(&self) -> Result<(), Error> {
        let n = self.frames.len();

        if self.trajectory.len() != n
            || self.centroids.len() != n
            || self.labels.len() != n
            || self.confidences.len() != n
        {
            return Err(Error::HistoryMismatch {
                id: self.id,
                frames: n,
                trajectory: self.trajectory.len(),
                centroids: self.centroids.len(),
                labels: self.labels.len(),
                confidences: self.confidences.len(),
            });
        }

        if let Some(pair) = self.frames.windows(2).find(|w| w[1] <= w[0]) {
            return Err(Error::FramesOutOfOrder {
                id: self.id,
                previous: pair[0],
                frame: pair[1],
            });
        }

        Ok(())
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    pub fn frame_dims(&self) -> (u32, u32) {
        (self.frame_width, self.frame_height)
    }

    #[inline]
    pub fn occurrences(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn first_frame(&self) -> u64 {
        self.frames[0]
    }

    #[inline]
    pub fn frames(&self) -> &[u64] {
        &self.frames
    }

    #[inline]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    #[inline]
    pub fn confidences(&self) -> &[f32] {
        &self.confidences
    }

    #[inline]
    pub fn trajectory(&self) -> &[BBox<Ltrb>] {
        &self.trajectory
    }

    #[inline]
    pub fn centroids(&self) -> &[na::Point2<f32>] {
        &self.centroids
    }

    #[inline]
    pub fn colors(&self) -> &[ColorObservation] {
        &self.colors
    }

    #[inline]
    pub fn cumulative_distance(&self) -> f32 {
        self.cumulative_distance
    }

    #[inline]
    pub fn net_displacement(&self) -> f32 {
        self.net_displacement
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    #[inline]
    pub fn majority_label(&self) -> &str {
        &self.majority_label
    }

    #[inline]
    pub fn dominant_color_names(&self) -> &[String] {
        &self.dominant_colors
    }

    #[inline]
    pub fn last_bbox(&self) -> &BBox<Ltrb> {
        &self.trajectory[self.trajectory.len() - 1]
    }

    #[inline]
    pub fn last_confidence(&self) -> f32 {
        self.confidences[self.confidences.len() - 1]
    }

    #[inline]
    pub fn last_frame(&self) -> u64 {
        self.frames[self.frames.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colorspace::Hls;
    use approx::assert_abs_diff_eq;

    fn bbox_at(x: f32, y: f32) -> BBox<Ltrb> {
        BBox::ltrb(x - 5.0, y - 5.0, x + 5.0, y + 5.0)
    }

    fn track_at(x: f32, y: f32, policy: MotionPolicy) -> Track {
        Track::new(1, "car", 0.9, bbox_at(x, y), 0, (640, 480), None, policy)
    }

    fn colors(names: &[&str]) -> ColorObservation {
        ColorObservation {
            bgr: names.iter().map(|_| vec![0, 0, 0]).collect(),
            hls: names.iter().map(|_| Hls::new(0, 0, 0)).collect(),
            names: names.iter().map(|n| n.to_string()).collect(),
        }
    }

    #[test]
    fn test_new_track() {
        let track = track_at(10.0, 20.0, MotionPolicy::default());

        assert_eq!(track.occurrences(), 1);
        assert!(track.is_static());
        assert_eq!(track.cumulative_distance(), 0.0);
        assert_eq!(track.net_displacement(), 0.0);
        assert_eq!(track.majority_label(), "car");
        assert_eq!(track.centroids()[0], na::Point2::new(10.0, 20.0));
        assert_eq!(track.frame_dims(), (640, 480));
        assert!(track.colors().is_empty());
        assert!(track.dominant_color_names().is_empty());
    }

    #[test]
    fn test_histories_stay_aligned() {
        let mut track = track_at(0.0, 0.0, MotionPolicy::default());

        for i in 1..20u64 {
            let color = if i % 3 == 0 { Some(colors(&["red"])) } else { None };
            track.record_observation("car", 0.5, bbox_at(i as f32, 0.0), i, color);

            assert_eq!(track.frames().len(), track.trajectory().len());
            assert_eq!(track.frames().len(), track.centroids().len());
            assert_eq!(track.frames().len(), track.labels().len());
            assert_eq!(track.frames().len(), track.confidences().len());
            assert!(track.check_invariants().is_ok());
        }

        assert_eq!(track.occurrences(), 20);
        assert_eq!(track.colors().len(), 6);
        assert_eq!(track.last_frame(), 19);
    }

    #[test]
    fn test_incremental_distance_matches_batch() {
        let path = [(0.0, 0.0), (3.0, 4.0), (3.0, 10.0), (-2.5, 7.25), (100.0, 0.5), (0.0, 0.0)];
        let mut track = track_at(path[0].0, path[0].1, MotionPolicy::default());

        for (i, &(x, y)) in path.iter().enumerate().skip(1) {
            track.record_observation("car", 0.5, bbox_at(x, y), i as u64, None);
        }

        let batch: f32 = track
            .centroids()
            .windows(2)
            .map(|w| na::distance(&w[0], &w[1]))
            .sum();

        assert_abs_diff_eq!(track.cumulative_distance(), batch, epsilon = 1e-3);
        assert_abs_diff_eq!(track.net_displacement(), 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_net_displacement_first_to_last() {
        let mut track = track_at(0.0, 0.0, MotionPolicy::default());
        track.record_observation("car", 0.5, bbox_at(30.0, 40.0), 1, None);
        track.record_observation("car", 0.5, bbox_at(6.0, 8.0), 2, None);

        assert_abs_diff_eq!(track.net_displacement(), 10.0, epsilon = 1e-5);
        assert_abs_diff_eq!(track.cumulative_distance(), 90.0, epsilon = 1e-4);
    }

    #[test]
    fn test_standing_still_is_not_static() {
        let mut track = track_at(0.0, 0.0, MotionPolicy::new(5.0, 5.0));
        track.record_observation("car", 0.5, bbox_at(0.0, 0.0), 1, None);
        track.record_observation("car", 0.5, bbox_at(0.0, 0.0), 2, None);

        assert_eq!(track.net_displacement(), 0.0);
        assert_eq!(track.cumulative_distance(), 0.0);
        assert!(!track.is_static());
    }

    #[test]
    fn test_wander_and_return_is_static() {
        let mut track = track_at(0.0, 0.0, MotionPolicy::new(5.0, 5.0));
        track.record_observation("car", 0.5, bbox_at(50.0, 0.0), 1, None);
        assert!(!track.is_static());

        track.record_observation("car", 0.5, bbox_at(1.0, 0.0), 2, None);
        assert!(track.is_static());
    }

    #[test]
    fn test_majority_label_tie_break() {
        let mut track = track_at(0.0, 0.0, MotionPolicy::default());
        track.record_observation("car", 0.5, bbox_at(0.0, 0.0), 1, None);
        track.record_observation("van", 0.5, bbox_at(0.0, 0.0), 2, None);
        track.record_observation("van", 0.5, bbox_at(0.0, 0.0), 3, None);

        assert_eq!(track.labels(), &["car", "car", "van", "van"]);
        assert_eq!(track.majority_label(), "car");

        track.record_observation("van", 0.5, bbox_at(0.0, 0.0), 4, None);
        assert_eq!(track.majority_label(), "van");
    }

    #[test]
    fn test_dominant_color_names() {
        let mut track = Track::new(
            2,
            "car",
            0.9,
            bbox_at(0.0, 0.0),
            0,
            (640, 480),
            Some(colors(&["red", "white"])),
            MotionPolicy::default(),
        );
        track.record_observation("car", 0.5, bbox_at(0.0, 0.0), 1, Some(colors(&["black", "white"])));
        track.record_observation("car", 0.5, bbox_at(0.0, 0.0), 2, Some(ColorObservation::default()));
        track.record_observation("car", 0.5, bbox_at(0.0, 0.0), 3, Some(colors(&["grey", "black"])));

        assert_eq!(track.colors().len(), 4);
        assert!(track.colors()[2].is_empty());
        assert_eq!(track.dominant_color_names(), &["white", "black", "red"]);
    }

    #[test]
    fn test_invariant_violations() {
        let mut track = track_at(0.0, 0.0, MotionPolicy::default());
        track.record_observation("car", 0.5, bbox_at(1.0, 0.0), 1, None);
        assert!(track.check_invariants().is_ok());

        let mut short = track.clone();
        short.labels.pop();
        assert!(matches!(
            short.check_invariants(),
            Err(Error::HistoryMismatch { id: 1, frames: 2, labels: 1, .. })
        ));

        track.record_observation("car", 0.5, bbox_at(2.0, 0.0), 1, None);
        assert!(matches!(
            track.check_invariants(),
            Err(Error::FramesOutOfOrder { id: 1, previous: 1, frame: 1 })
        ));
    }

    #[test]
    fn test_last_observation_accessors() {
        let mut track = track_at(0.0, 0.0, MotionPolicy::default());
        track.record_observation("bus", 0.42, bbox_at(7.0, 7.0), 5, None);

        assert_eq!(track.last_confidence(), 0.42);
        assert_eq!(track.last_bbox(), &bbox_at(7.0, 7.0));
        assert_eq!(track.first_frame(), 0);
    }
}
