pub mod channels;
pub mod constants;
pub mod demux;
pub mod error;
pub mod processor;
pub mod resample;
pub mod source;
pub mod track;
pub mod transcoder;
pub mod volume;

pub use error::AudioError;
pub use source::{PcmSource, SourceOpener};
pub use track::{Track, TrackInfo, TrackSource};
pub use transcoder::{PcmTranscoder, SymphoniaOpener};
pub use volume::apply_gain;
