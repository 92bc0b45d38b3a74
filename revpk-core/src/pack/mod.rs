pub mod delta_common;
pub mod locale_pack;
pub mod packer;

pub use delta_common::{pack_delta_common, DeltaCommonRecord, PackDeltaCommonOptions};
pub use locale_pack::{pack_multi, PackMultiOptions};
pub use packer::{pack, PackOptions, PackWarning};
