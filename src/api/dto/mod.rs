//! Data Transfer Objects for REST request/response serialization.

pub mod message_dto;
pub mod subscription_dto;

pub use message_dto::*;
pub use subscription_dto::*;
