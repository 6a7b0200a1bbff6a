#![forbid(unsafe_code)]

//! Reading delimited text into [`tabula_frame::Table`]s and rendering tables as text.

pub mod delimited;
pub mod render;

pub use delimited::{read_delimited, read_path, CsvError, CsvOptions};
pub use render::{glimpse, print, GlimpseOptions, PrintOptions};
