pub mod locale_unpack;
pub mod unpacker;

pub use locale_unpack::{unpack_multi, UnpackMultiOptions};
pub use unpacker::unpack;
