//! Backend module.

mod http;

pub use http::HttpForwarder;
