pub mod audio;
pub mod input;
pub mod time;
pub mod track;

pub use audio::{AudioTrack, CountingAudio};
pub use input::{InputEvent, InputSource, ScriptedInput};
pub use time::{MockTimeProvider, SystemTimeProvider, TimeProvider};
pub use track::{TrackCall, TrackRecorder, TrackSink};
