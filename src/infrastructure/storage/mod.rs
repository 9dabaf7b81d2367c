mod fs_transcript_store;

pub use fs_transcript_store::FsTranscriptStore;
