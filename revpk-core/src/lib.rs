#![forbid(unsafe_code)]

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod error;

pub mod util {
    pub mod crc_forward;
}

pub mod hash;

pub mod codec;

pub mod locale;

pub mod container;

pub mod manifest;

pub mod store;

pub mod worker;

pub mod pack;

pub mod unpack;

pub mod list;

pub mod stats;

#[cfg(test)]
mod integration_tests;

pub use crate::error::{RevpkError, Result};
pub use crate::stats::Stats;

pub use pack::{pack, pack_delta_common, pack_multi, PackOptions};
pub use unpack::{unpack, unpack_multi, UnpackMultiOptions};
pub use list::list;

pub mod prelude {
    pub use crate::container::{ChunkDescriptor, Directory, EntryBlock};
    pub use crate::error::{RevpkError, Result};
    pub use crate::list::list;
    pub use crate::manifest::{Manifest, ManifestEntry, MultiLocaleManifest};
    pub use crate::pack::{pack, pack_delta_common, pack_multi, PackOptions};
    pub use crate::stats::Stats;
    pub use crate::unpack::{unpack, unpack_multi, UnpackMultiOptions};
}
