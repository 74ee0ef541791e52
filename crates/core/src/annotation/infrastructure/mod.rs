mod glyphs;
pub mod segment_painter;
