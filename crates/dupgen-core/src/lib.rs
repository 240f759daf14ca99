//! dupgen Core Library
//!
//! Export engine for data update packages: identifier remapping, record
//! binding, literal rendering and two-pass import script composition, plus
//! the record sources and package assembly around them.

pub mod binder;
pub mod config;
pub mod eas;
pub mod error;
pub mod export;
pub mod literal;
pub mod logging;
pub mod package;
pub mod record;
pub mod remap;
pub mod request;
pub mod script;
pub mod source;
pub mod value;
