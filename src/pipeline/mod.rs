//! Corpus processing pipeline components.

mod coordinator;
mod processor;

pub use coordinator::{CorpusEntry, collect_corpus, raster_path_for};
pub use processor::{CorpusOutcome, RecordingProcessor, process_corpus};
