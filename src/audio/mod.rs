pub mod decode;
pub mod source;

pub use decode::{decode_audio, AudioData};
pub use source::{AnalyserSettings, ByteFrequencyAnalyser, FileSignalSource, SignalSource};
