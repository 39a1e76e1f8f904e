//! # Storage Events

use crate::domain::entities::{BucketInfo, GroupInfo, ObjectInfo, Policy};
use shared_store::Event;
use shared_types::{Address, BucketId, ObjectId, PolicyId};

/// Emitted on bucket creation.
pub fn create_bucket(bucket: &BucketInfo) -> Event {
    Event::new(
        "create_bucket",
        vec![
            ("bucket_id".to_string(), bucket.id.to_string()),
            ("bucket_name".to_string(), bucket.name.clone()),
            ("owner".to_string(), bucket.owner.to_string()),
            ("primary_sp".to_string(), bucket.primary_sp_address.to_string()),
            ("gvg_family_id".to_string(), bucket.gvg_family_id.to_string()),
        ],
    )
}

/// Emitted on bucket deletion.
pub fn delete_bucket(id: BucketId, name: &str, operator: Address) -> Event {
    Event::new(
        "delete_bucket",
        vec![
            ("bucket_id".to_string(), id.to_string()),
            ("bucket_name".to_string(), name.to_string()),
            ("operator".to_string(), operator.to_string()),
        ],
    )
}

/// Emitted on bucket metadata updates.
pub fn update_bucket_info(bucket: &BucketInfo) -> Event {
    Event::new(
        "update_bucket_info",
        vec![
            ("bucket_id".to_string(), bucket.id.to_string()),
            ("charged_read_quota".to_string(), bucket.charged_read_quota.to_string()),
            ("payment_address".to_string(), bucket.payment_address.to_string()),
        ],
    )
}

/// Emitted on object creation.
pub fn create_object(object: &ObjectInfo) -> Event {
    Event::new(
        "create_object",
        vec![
            ("object_id".to_string(), object.id.to_string()),
            ("bucket_name".to_string(), object.bucket_name.clone()),
            ("object_name".to_string(), object.name.clone()),
            ("payload_size".to_string(), object.payload_size.to_string()),
            ("status".to_string(), format!("{:?}", object.status)),
        ],
    )
}

/// Emitted on seal.
pub fn seal_object(object: &ObjectInfo) -> Event {
    Event::new(
        "seal_object",
        vec![
            ("object_id".to_string(), object.id.to_string()),
            ("bucket_name".to_string(), object.bucket_name.clone()),
            ("object_name".to_string(), object.name.clone()),
        ],
    )
}

/// Emitted on object deletion (user or forced).
pub fn delete_object(id: ObjectId, bucket_name: &str, object_name: &str, forced: bool) -> Event {
    Event::new(
        "delete_object",
        vec![
            ("object_id".to_string(), id.to_string()),
            ("bucket_name".to_string(), bucket_name.to_string()),
            ("object_name".to_string(), object_name.to_string()),
            ("forced".to_string(), forced.to_string()),
        ],
    )
}

/// Emitted on content update.
pub fn update_object_content(object: &ObjectInfo) -> Event {
    Event::new(
        "update_object_content",
        vec![
            ("object_id".to_string(), object.id.to_string()),
            ("payload_size".to_string(), object.payload_size.to_string()),
        ],
    )
}

/// Emitted when an entity is discontinued.
pub fn discontinue(kind: &str, id: String, delete_at_height: u64) -> Event {
    Event::new(
        "discontinue",
        vec![
            ("kind".to_string(), kind.to_string()),
            ("id".to_string(), id),
            ("delete_at_height".to_string(), delete_at_height.to_string()),
        ],
    )
}

/// Emitted on group creation.
pub fn create_group(group: &GroupInfo) -> Event {
    Event::new(
        "create_group",
        vec![
            ("group_id".to_string(), group.id.to_string()),
            ("owner".to_string(), group.owner.to_string()),
            ("group_name".to_string(), group.name.clone()),
        ],
    )
}

/// Emitted on group membership changes.
pub fn update_group_member(group: &GroupInfo, added: usize, removed: usize) -> Event {
    Event::new(
        "update_group_member",
        vec![
            ("group_id".to_string(), group.id.to_string()),
            ("added".to_string(), added.to_string()),
            ("removed".to_string(), removed.to_string()),
        ],
    )
}

/// Emitted on group deletion.
pub fn delete_group(group: &GroupInfo) -> Event {
    Event::new(
        "delete_group",
        vec![
            ("group_id".to_string(), group.id.to_string()),
            ("owner".to_string(), group.owner.to_string()),
        ],
    )
}

/// Emitted when a policy is written.
pub fn put_policy(policy: &Policy) -> Event {
    Event::new(
        "put_policy",
        vec![
            ("policy_id".to_string(), policy.id.to_string()),
            ("resource_type".to_string(), format!("{:?}", policy.resource.resource_type)),
            ("resource_id".to_string(), policy.resource.resource_id.to_string()),
        ],
    )
}

/// Emitted when a policy is removed (explicitly or by GC).
pub fn delete_policy(id: PolicyId) -> Event {
    Event::new("delete_policy", vec![("policy_id".to_string(), id.to_string())])
}
