pub mod annotation;
pub mod detection;
pub mod filtering;
pub mod pipeline;
pub mod shared;
pub mod video;
