//! Process-wide infrastructure shared by every other crate in the workspace:
//! command line / environment configuration and logger setup.

pub mod config;
pub mod logging;
