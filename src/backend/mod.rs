//! Backend contracts
//!
//! Descriptor types the passes publish, the [`PassEncoder`] command sink a
//! host renderer implements, and conversions into wgpu descriptors.

pub mod recorder;
pub mod traits;
pub mod types;
pub mod wgpu_conversion;

pub use recorder::{CommandRecorder, EncodedCommand};
pub use traits::*;
pub use types::*;
