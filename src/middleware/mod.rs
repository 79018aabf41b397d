// Middleware for CORS and security headers

pub mod cors;
pub mod security_headers;

pub use cors::*;
pub use security_headers::*;
