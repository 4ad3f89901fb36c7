use ndarray::prelude::*;
use ndarray::s;
use serde_derive::{Deserialize, Serialize};

use crate::bbox::{BBox, Ltrb};
use crate::cluster::{ElbowSearch, KMeans};
use crate::colorspace::{bgr_to_hls, Hls};
use crate::config::ColorConfig;
use crate::namer::ColorNamer;
use crate::polygon::fill_mask;

/// Dominant colors of one object in one frame, most common first.
///
/// The three sequences are parallel. `bgr` entries have three channels for a
/// box crop and four (BGRA) for a segmented region.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ColorObservation {
    pub bgr: Vec<Vec<u8>>,
    pub hls: Vec<Hls>,
    pub names: Vec<String>,
}

impl ColorObservation {
    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

pub struct DominantColorExtractor {
    crop_reduction: f32,
    downsample_factor: f32,
    search: ElbowSearch,
    kmeans: KMeans,
    namer: ColorNamer,
}

impl DominantColorExtractor {
    pub fn new(config: &ColorConfig) -> Self {
        Self {
            crop_reduction: config.crop_reduction,
            downsample_factor: config.downsample_factor,
            search: ElbowSearch {
                min_clusters: config.min_clusters,
                max_clusters: config.max_clusters,
                threshold: config.elbow_threshold + config.increase_elbow,
            },
            kmeans: KMeans::new(config.max_iterations, config.seed),
            namer: ColorNamer::new(config.names),
        }
    }

    /// Dominant colors of the object inside `bbox`, or inside `mask` when the
    /// detector supplied a segmentation outline. `frame` is `height x width x 3` BGR.
    ///
    /// A region that is empty or cannot be clustered gives an empty observation.
    pub fn extract(
        &self,
        frame: ArrayView3<'_, u8>,
        bbox: &BBox<Ltrb>,
        mask: Option<&[[i32; 2]]>,
    ) -> ColorObservation {
        let pixels = match mask {
            Some(poly) => self.segment(frame, poly),
            None => self.crop(frame, bbox),
        };

        let fit = match self.search.run(&self.kmeans, pixels.view()) {
            Some(fit) => fit,
            None => {
                log::debug!("no dominant colors for region of {} pixels", pixels.nrows());
                return ColorObservation::default();
            }
        };

        let mut obs = ColorObservation::default();

        for (centre, _) in fit.ranked() {
            let bgr: Vec<u8> = centre.iter().map(|v| v.round().clamp(0.0, 255.0) as u8).collect();
            let hls = bgr_to_hls(&bgr);

            obs.names.push(self.namer.name_hls(hls));
            obs.hls.push(hls);
            obs.bgr.push(bgr);
        }

        obs
    }

    /// Box pixels as an `N x 3` matrix, after edge reduction and downsampling.
    fn crop(&self, frame: ArrayView3<'_, u8>, bbox: &BBox<Ltrb>) -> Array2<f32> {
        let (h, w, _) = frame.dim();

        let bbox = bbox.ordered();
        let (x1, x2) = reduced_span(bbox.left(), bbox.right(), self.crop_reduction, w);
        let (y1, y2) = reduced_span(bbox.top(), bbox.bottom(), self.crop_reduction, h);

        if x2 <= x1 || y2 <= y1 {
            return Array2::zeros((0, 3));
        }

        let region = frame.slice(s![y1..y2, x1..x2, 0..3]);
        let region = downsample(region, self.downsample_factor);

        flatten(region.view(), |_| true)
    }

    /// Opaque pixels of the frame composited with the polygon as alpha, as an `N x 4` matrix.
    fn segment(&self, frame: ArrayView3<'_, u8>, poly: &[[i32; 2]]) -> Array2<f32> {
        let (h, w, _) = frame.dim();
        let mask = fill_mask(poly, w, h);

        let rows: Vec<usize> = (0..h).filter(|&y| mask.row(y).iter().any(|&v| v)).collect();
        let cols: Vec<usize> = (0..w).filter(|&x| mask.column(x).iter().any(|&v| v)).collect();

        let (y0, y1) = match (rows.first(), rows.last()) {
            (Some(&a), Some(&b)) => (a, b + 1),
            _ => return Array2::zeros((0, 4)),
        };
        let (x0, x1) = match (cols.first(), cols.last()) {
            (Some(&a), Some(&b)) => (a, b + 1),
            _ => return Array2::zeros((0, 4)),
        };

        // pixels outside the polygon become transparent white
        let bgra = Array3::from_shape_fn((y1 - y0, x1 - x0, 4), |(y, x, c)| {
            let (fy, fx) = (y + y0, x + x0);
            match (mask[[fy, fx]], c) {
                (true, 3) => 255,
                (true, c) => frame[[fy, fx, c]],
                (false, 3) => 0,
                (false, _) => 255,
            }
        });

        let region = downsample(bgra.view(), self.downsample_factor);

        flatten(region.view(), |px| px[3] > 0)
    }
}

/// Truncated `lo..hi` shrunk by `reduction / 2` of its length on each side, clamped to `0..=limit`.
fn reduced_span(lo: f32, hi: f32, reduction: f32, limit: usize) -> (usize, usize) {
    // any finite f32 span fits in f64
    let (lo, hi) = (lo.trunc() as f64, hi.trunc() as f64);
    let d = ((hi - lo) * reduction as f64 / 2.0).trunc();
    let clamp = |v: f64| v.clamp(0.0, limit as f64) as usize;

    (clamp(lo + d), clamp(hi - d))
}

/// Nearest neighbour resize by `factor`; factors outside `(0, 1)` return the region unchanged.
fn downsample(region: ArrayView3<'_, u8>, factor: f32) -> Array3<u8> {
    let (h, w, c) = region.dim();

    if !(factor > 0.0 && factor < 1.0) || h == 0 || w == 0 {
        return region.to_owned();
    }

    let nh = ((h as f32 * factor).round() as usize).max(1);
    let nw = ((w as f32 * factor).round() as usize).max(1);

    Array3::from_shape_fn((nh, nw, c), |(y, x, ch)| {
        let sy = ((y as f32 / factor) as usize).min(h - 1);
        let sx = ((x as f32 / factor) as usize).min(w - 1);

        region[[sy, sx, ch]]
    })
}

fn flatten<F: Fn(ArrayView1<'_, u8>) -> bool>(region: ArrayView3<'_, u8>, keep: F) -> Array2<f32> {
    let (h, w, c) = region.dim();
    let mut data = Vec::with_capacity(h * w * c);
    let mut n = 0;

    for y in 0..h {
        for x in 0..w {
            let px = region.slice(s![y, x, ..]);
            if keep(px) {
                data.extend(px.iter().map(|&v| v as f32));
                n += 1;
            }
        }
    }

    Array2::from_shape_vec((n, c), data).unwrap_or_else(|_| Array2::zeros((0, c)))
}
