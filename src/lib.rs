pub mod bbox;
pub mod cluster;
pub mod colorspace;
pub mod config;
pub mod detection;
pub mod error;
pub mod extractor;
pub mod frame;
pub mod namer;
pub mod polygon;
pub mod registry;
pub mod report;
pub mod session;
pub mod tally;
pub mod translate;

mod track;

pub use config::Config;
pub use detection::Detection;
pub use error::Error;
pub use extractor::{ColorObservation, DominantColorExtractor};
pub use frame::Frame;
pub use registry::TrackRegistry;
pub use report::{Report, ReportBuilder};
pub use session::Session;
pub use track::Track;

use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Classifies several media sources at once, one [`Session`] per source.
pub struct Classifier {
    config: Config,
    sessions: HashMap<String, Session>,
}

impl Classifier {
    pub fn new(config: Config) -> Result<Self, Error> {
        config.validate()?;

        Ok(Self {
            config,
            sessions: HashMap::new(),
        })
    }

    /// Feeds frames of `src`, opening a session on first use.
    ///
    /// Returns how many of the frames were admitted for classification.
    pub fn update(&mut self, frames: &[Frame], src: &str, source_fps: f32) -> Result<usize, Error> {
        let session = match self.sessions.entry(src.to_string()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                log::info!("opening session for {}", src);

                entry.insert(Session::new(self.config.clone(), source_fps)?)
            }
        };

        let mut admitted = 0;
        for frame in frames {
            if session.process_frame(frame)? {
                admitted += 1;
            }
        }

        Ok(admitted)
    }

    /// Whether `src` still accepts frames. Unknown sources do.
    pub fn wants_frames(&self, src: &str) -> bool {
        self.sessions.get(src).map_or(true, |s| !s.is_saturated())
    }

    #[inline]
    pub fn session(&self, src: &str) -> Option<&Session> {
        self.sessions.get(src)
    }

    /// Closes `src` and returns its report; its tracks are dropped.
    pub fn finish(&mut self, src: &str) -> Option<Report> {
        self.sessions.remove(src).map(Session::finish)
    }

    #[inline]
    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.sessions.keys().map(String::as_str)
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self {
            config: Config::default(),
            sessions: HashMap::new(),
        }
    }
}
