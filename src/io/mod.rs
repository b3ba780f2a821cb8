//! CSV persistence for the weather table and the training corpus.

pub mod tables;

pub use tables::{read_corpus, read_weather, write_corpus, write_weather};
