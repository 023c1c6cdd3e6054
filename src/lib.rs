pub mod config;
pub mod diagnostics;
pub mod ir;
pub mod language;
pub mod logging;
pub mod provenance;
pub mod session;
pub mod stages;
pub mod view;
