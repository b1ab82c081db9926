pub mod io;
pub mod rgba;

pub use self::rgba::{ImageRgba, RgbaBuffer};
