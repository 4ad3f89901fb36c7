use serde_derive::{Deserialize, Serialize};

/// 8-bit HLS triple with the usual video scaling: hue in `0..180` (degrees halved),
/// lightness and saturation in `0..=255`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(from = "[u8; 3]", into = "[u8; 3]")]
pub struct Hls {
    pub h: u8,
    pub l: u8,
    pub s: u8,
}

impl Hls {
    #[inline]
    pub fn new(h: u8, l: u8, s: u8) -> Self {
        Self { h, l, s }
    }

    #[inline]
    pub fn hue_degrees(&self) -> f32 {
        self.h as f32 * 2.0
    }

    #[inline]
    pub fn lightness(&self) -> f32 {
        self.l as f32 / 255.0
    }

    #[inline]
    pub fn saturation(&self) -> f32 {
        self.s as f32 / 255.0
    }
}

impl From<[u8; 3]> for Hls {
    fn from(v: [u8; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

impl From<Hls> for [u8; 3] {
    fn from(v: Hls) -> Self {
        [v.h, v.l, v.s]
    }
}

#[inline]
fn saturate(v: f32, max: f32) -> u8 {
    v.round().clamp(0.0, max) as u8
}

/// Converts a BGR pixel (extra channels such as alpha are ignored) to 8-bit HLS.
pub fn bgr_to_hls(bgr: &[u8]) -> Hls {
    let b = bgr[0] as f32 / 255.0;
    let g = bgr[1] as f32 / 255.0;
    let r = bgr[2] as f32 / 255.0;

    let vmax = r.max(g).max(b);
    let vmin = r.min(g).min(b);
    let diff = vmax - vmin;
    let l = (vmax + vmin) * 0.5;

    let (h, s) = if diff > f32::EPSILON {
        let s = if l < 0.5 {
            diff / (vmax + vmin)
        } else {
            diff / (2.0 - vmax - vmin)
        };

        let mut h = if vmax == r {
            (g - b) * 60.0 / diff
        } else if vmax == g {
            (b - r) * 60.0 / diff + 120.0
        } else {
            (r - g) * 60.0 / diff + 240.0
        };

        if h < 0.0 {
            h += 360.0;
        }

        (h, s)
    } else {
        (0.0, 0.0)
    };

    // hue wraps at 180 in 8-bit form
    let h = saturate(h * 0.5, 180.0) % 180;

    Hls::new(h, saturate(l * 255.0, 255.0), saturate(s * 255.0, 255.0))
}
