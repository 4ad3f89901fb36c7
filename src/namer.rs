use crate::colorspace::Hls;
use crate::config::ColorNameThresholds;

/// Hue names for the twelve 30 degree sectors, starting with the one centred on 0.
const HUE_NAMES: [&str; 12] = [
    "red",
    "orange",
    "yellow",
    "chartreuse",
    "green",
    "spring",
    "cyan",
    "azure",
    "blue",
    "violet",
    "magenta",
    "rose",
];

/// Maps colors to short human readable names ("dark blue", "dull red", "light grey").
#[derive(Debug, Clone, Copy, Default)]
pub struct ColorNamer {
    thresholds: ColorNameThresholds,
}

impl ColorNamer {
    pub fn new(thresholds: ColorNameThresholds) -> Self {
        Self { thresholds }
    }

    #[inline]
    pub fn name_hls(&self, hls: Hls) -> String {
        self.name(hls.hue_degrees(), hls.lightness(), hls.saturation())
    }

    /// `hue` in degrees `0..360`, `lightness` and `saturation` in `0..=1`.
    pub fn name(&self, hue: f32, lightness: f32, saturation: f32) -> String {
        let t = &self.thresholds;

        if lightness < t.black_lightness {
            return "black".to_string();
        } else if lightness > t.white_lightness {
            return "white".to_string();
        }

        let mut prefix = if lightness < t.dark_lightness {
            Some("dark")
        } else if lightness > t.light_lightness {
            Some("light")
        } else {
            None
        };

        let color = if saturation < t.grey_saturation {
            "grey"
        } else {
            if saturation < t.dull_saturation {
                prefix = Some("dull");
            }

            hue_name(hue)
        };

        match prefix {
            Some(prefix) => format!("{} {}", prefix, color),
            None => color.to_string(),
        }
    }
}

fn hue_name(hue: f32) -> &'static str {
    let hue = hue.rem_euclid(360.0);
    let sector = (((hue + 15.0) / 30.0) as usize) % HUE_NAMES.len();

    HUE_NAMES[sector]
}
