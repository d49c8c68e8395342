//! Infrastructure layer
//!
//! Concrete `FormBackend` adapters.

pub mod http;
pub mod in_memory;

pub use http::AjaxBackend;
pub use in_memory::InMemoryFormBackend;
