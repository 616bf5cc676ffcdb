//! Raw input events and touch classification.
//!
//! Events are kept in the kernel's `(type, code, value)` shape so this module
//! stays free of any device library.  The infrastructure layer converts
//! whatever its driver produces into [`event::RawEvent`] before the engine
//! sees it.

pub mod classify;
pub mod event;
