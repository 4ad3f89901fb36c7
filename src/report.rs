use std::path::Path;

use serde_derive::{Deserialize, Serialize};

use crate::bbox::{BBox, Ltrb};
use crate::colorspace::Hls;
use crate::error::Error;
use crate::track::Track;

pub const OPERATION: &str = "classify";

/// Per-track summary as it appears in the report.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackDetail {
    pub id: String,
    pub classified: String,
    pub distance: f32,
    pub static_distance: f32,
    pub is_static: bool,
    pub frame_width: u32,
    pub frame_height: u32,
    pub frame: u64,
    pub frames: Vec<u64>,
    // field name is part of the wire format
    pub occurence: usize,
    pub traject: Vec<BBox<Ltrb>>,
    pub traject_centroids: Vec<[f32; 2]>,
    #[serde(rename = "colorsBGR")]
    pub colors_bgr: Vec<Vec<Vec<u8>>>,
    #[serde(rename = "colorsHLS")]
    pub colors_hls: Vec<Vec<Hls>>,
    pub colors_str: Vec<Vec<String>>,
    pub color_str: Vec<String>,
}

impl From<&Track> for TrackDetail {
    fn from(track: &Track) -> Self {
        let (frame_width, frame_height) = track.frame_dims();

        Self {
            id: track.id().to_string(),
            classified: track.majority_label().to_string(),
            distance: track.cumulative_distance(),
            static_distance: track.net_displacement(),
            is_static: track.is_static(),
            frame_width,
            frame_height,
            frame: track.first_frame(),
            frames: track.frames().to_vec(),
            occurence: track.occurrences(),
            traject: track.trajectory().to_vec(),
            traject_centroids: track.centroids().iter().map(|p| [p.x, p.y]).collect(),
            colors_bgr: track.colors().iter().map(|c| c.bgr.clone()).collect(),
            colors_hls: track.colors().iter().map(|c| c.hls.clone()).collect(),
            colors_str: track.colors().iter().map(|c| c.names.clone()).collect(),
            color_str: track.dominant_color_names().to_vec(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportData {
    pub object_count: usize,
    pub properties: Vec<String>,
    pub details: Vec<TrackDetail>,
}

/// Classification result of one video.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Report {
    pub operation: String,
    pub data: ReportData,
}

impl Report {
    #[inline]
    pub fn object_count(&self) -> usize {
        self.data.object_count
    }

    #[inline]
    pub fn properties(&self) -> &[String] {
        &self.data.properties
    }

    #[inline]
    pub fn details(&self) -> &[TrackDetail] {
        &self.data.details
    }

    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(self)?)
    }

    /// Tab indented JSON, the layout of saved report files.
    pub fn to_json_pretty(&self) -> Result<String, Error> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        serde::Serialize::serialize(self, &mut ser)?;

        String::from_utf8(buf)
            .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
    }

    pub fn from_json(src: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(src)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json_pretty()?)?;
        log::info!("report with {} objects saved to {}", self.object_count(), path.display());

        Ok(())
    }

    /// Sets `operation` and `data` on an incoming queue message, keeping its other fields.
    pub fn attach_to(&self, message: &mut serde_json::Value) -> Result<(), Error> {
        let obj = message.as_object_mut().ok_or(Error::NotAnObject)?;

        obj.insert("operation".into(), serde_json::Value::String(self.operation.clone()));
        obj.insert("data".into(), serde_json::to_value(&self.data)?);

        Ok(())
    }
}

/// Collects the tracks seen often enough into a [`Report`].
pub struct ReportBuilder {
    min_occurrences: usize,
    data: ReportData,
}

impl ReportBuilder {
    pub fn new(min_occurrences: usize) -> Self {
        Self {
            min_occurrences,
            data: ReportData::default(),
        }
    }

    /// Adds the track if it has at least `min_occurrences` observations.
    pub fn push(&mut self, track: &Track) -> bool {
        if track.occurrences() < self.min_occurrences {
            return false;
        }

        self.data.object_count += 1;
        self.data.properties.push(track.majority_label().to_string());
        self.data.details.push(track.into());

        true
    }

    pub fn finish(self) -> Report {
        Report {
            operation: OPERATION.to_string(),
            data: self.data,
        }
    }

    pub fn build<'a, I>(tracks: I, min_occurrences: usize) -> Report
    where
        I: IntoIterator<Item = &'a Track>,
    {
        let mut builder = Self::new(min_occurrences);
        for track in tracks {
            builder.push(track);
        }

        builder.finish()
    }
}
