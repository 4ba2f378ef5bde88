// Daily Sequencer Infrastructure - Filesystem Adapters
// Implements: SequenceStore

pub mod file_store;

pub use file_store::FileSequenceStore;
