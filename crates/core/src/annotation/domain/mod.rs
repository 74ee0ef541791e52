pub mod overlay_painter;
