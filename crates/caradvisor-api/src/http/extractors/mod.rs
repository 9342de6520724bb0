//! Request extractors that report rejections in the envelope format.

pub mod json;
pub mod query;
