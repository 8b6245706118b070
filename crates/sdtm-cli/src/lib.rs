//! Library side of the `sdtm` command: configuration, logging and the study run.

pub mod config;
pub mod logging;
pub mod pipeline;
