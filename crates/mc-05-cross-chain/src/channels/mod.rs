//! Channel apps: one per bridged entity kind.

pub mod bucket;
pub mod group;
pub mod object;
pub mod permission;
pub mod sbt;
pub mod vc;

pub use bucket::BucketChannel;
pub use group::GroupChannel;
pub use object::ObjectChannel;
pub use permission::PermissionChannel;
pub use sbt::SbtChannel;
pub use vc::VcChannel;
