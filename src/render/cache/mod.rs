pub mod bitmaps;
