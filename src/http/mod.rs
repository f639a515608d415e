//! HTTP layer: transport, retry policy and response mapping.

pub mod response;
mod retry;
mod transport;

pub use retry::{
    DEFAULT_BASE_DELAY, DEFAULT_MAX_DELAY, DEFAULT_MAX_RETRIES, DEFAULT_MAX_RETRY_AFTER,
    RetryPolicy,
};
#[cfg(test)]
pub use transport::MockTransport;
pub use transport::{
    ApiRequest, CSRF_COOKIE, CSRF_HEADER, HttpTransport, RawResponse, RequestBody, Transport,
};
