//! End-to-end block scenarios over the wired node.

mod bridge;
mod buckets;
mod objects;
mod registry;
