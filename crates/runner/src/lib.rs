//! Daily Sequencer runner: configuration, logging and wiring of the adapters
//! around [`dailyseq_core::application::DailySequencer`].

pub mod app;
pub mod logging;
pub mod settings;

pub use app::build_sequencer;
pub use settings::{LogFormat, Settings};
