//! Provider schema loading and inspection
//!
//! Each provider type ships a static schema document describing its
//! configuration fields. The registry composes those schemas with two
//! volatile facts looked up per call: the installed version of the backing
//! package and the operator's enable/disable map.

mod packages;
mod registry;
mod types;

pub use packages::{FsPackageIndex, PackageIndex, StaticPackageIndex, normalize_package_name};
pub use registry::{RegistryLoad, SchemaRegistry, short_provider_name};
pub use types::{FieldSpec, FieldType, PackageSpec, ProviderCapabilities, ProviderInfo, ProviderSchema};
