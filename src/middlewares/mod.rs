pub mod access;

pub use access::{api_key_middleware, ip_allow_middleware, API_KEY_HEADER};
