pub mod color;
pub mod detail_enhancer;
pub mod gaussian;
