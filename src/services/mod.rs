mod transcript;

pub use transcript::{NoTranscripts, TranscriptFetcher};
