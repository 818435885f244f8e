pub mod http;

pub use http::HttpProviderAdapter;
