pub mod cache;
pub mod dispatch;
pub mod error;
pub mod provider;
pub mod request;
pub mod upstream;

pub use error::DomainError;
