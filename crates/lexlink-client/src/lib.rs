//! law.go.kr transport: law page lookup and article side-panel fetch.

pub mod http;

pub use http::{ClientConfig, ClientError, LawClient, TIMEOUT_RANGE, extract_site_seq};
