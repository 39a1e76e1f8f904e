//! # Policy Operations
//!
//! Policies bind a principal (account or group) to one resource. The
//! index is `(resource, principal) → policy id`; expirations queue into
//! a time-ordered GC lane drained by the end-blocker.

use super::StorageService;
use crate::domain::entities::{Policy, Statement};
use crate::domain::errors::StorageError;
use crate::domain::value_objects::{Principal, Resource, ResourceType};
use crate::events;
use crate::keys;
use shared_store::kv::{get_obj, put_obj};
use shared_store::{Context, KvRead, KvWrite};
use shared_types::{Address, PolicyId, Uint};

impl StorageService {
    /// Owner of a resource, if it exists.
    fn resource_owner(&self, store: &dyn KvRead, resource: &Resource) -> Option<Address> {
        match resource.resource_type {
            ResourceType::Bucket => {
                let name = self.get_bucket_name_by_id(store, resource.resource_id)?;
                self.get_bucket(store, &name).map(|bucket| bucket.owner)
            }
            ResourceType::Object => {
                let (bucket, object) = self.get_object_key_by_id(store, resource.resource_id)?;
                self.get_object(store, &bucket, &object).map(|object| object.owner)
            }
            ResourceType::Group => {
                let (owner, name) = self.get_group_key_by_id(store, resource.resource_id)?;
                self.get_group(store, owner, &name).map(|group| group.owner)
            }
        }
    }

    /// Write (or overwrite) the policy for `(resource, principal)`.
    pub fn put_policy(
        &self,
        ctx: &mut Context<'_>,
        operator: Address,
        principal: Principal,
        resource: Resource,
        statements: Vec<Statement>,
        expiration_time: Option<i64>,
    ) -> Result<PolicyId, StorageError> {
        let params = self.get_params(&ctx.store);
        if statements.len() as u32 > params.max_statements_num {
            return Err(StorageError::MaxStatements {
                got: statements.len() as u32,
                limit: params.max_statements_num,
            });
        }
        let owner = self
            .resource_owner(&ctx.store, &resource)
            .ok_or(StorageError::ResourceNotFound)?;
        if operator != owner {
            return Err(StorageError::AccessDenied { operator });
        }
        if let Principal::Group(group_id) = principal {
            if self.get_group_key_by_id(&ctx.store, group_id).is_none() {
                return Err(StorageError::ResourceNotFound);
            }
        }

        let index_key =
            keys::policy_index_key(resource.resource_type, resource.resource_id, &principal);
        let existing: Option<PolicyId> = get_obj(&ctx.store, &index_key);
        let id = match existing {
            Some(id) => {
                // Replacing: the old expiration queue entry must go.
                if let Some(old) = get_obj::<Policy>(&ctx.store, &keys::policy_key(id)) {
                    if let Some(exp) = old.expiration_time {
                        ctx.store.delete(&keys::policy_expiration_key(exp, id));
                    }
                }
                id
            }
            None => self.next_uint(&mut ctx.store, keys::policy_sequence_key()),
        };

        let policy = Policy {
            id,
            principal,
            resource,
            statements,
            expiration_time,
            created_at: ctx.block.time,
        };
        put_obj(&mut ctx.store, keys::policy_key(id), &policy);
        put_obj(&mut ctx.store, index_key, &id);
        if let Some(exp) = expiration_time {
            ctx.store.set(keys::policy_expiration_key(exp, id), Vec::new());
        }
        ctx.events.emit(events::put_policy(&policy));
        Ok(id)
    }

    /// Remove the policy for `(resource, principal)`.
    pub fn delete_policy(
        &self,
        ctx: &mut Context<'_>,
        operator: Address,
        principal: Principal,
        resource: Resource,
    ) -> Result<(), StorageError> {
        let owner = self
            .resource_owner(&ctx.store, &resource)
            .ok_or(StorageError::ResourceNotFound)?;
        if operator != owner {
            return Err(StorageError::AccessDenied { operator });
        }
        let index_key =
            keys::policy_index_key(resource.resource_type, resource.resource_id, &principal);
        let id: PolicyId = get_obj(&ctx.store, &index_key).ok_or(StorageError::PolicyNotFound)?;
        self.drop_policy(ctx, id, &index_key);
        Ok(())
    }

    /// Policy attached to `(resource, principal)`, if any.
    pub fn get_policy(
        &self,
        store: &dyn KvRead,
        principal: &Principal,
        resource_type: ResourceType,
        resource_id: Uint,
    ) -> Option<Policy> {
        let id: PolicyId =
            get_obj(store, &keys::policy_index_key(resource_type, resource_id, principal))?;
        get_obj(store, &keys::policy_key(id))
    }

    /// Drop every policy attached to a resource (entity deletion path).
    pub(crate) fn remove_policies_for_resource(
        &self,
        ctx: &mut Context<'_>,
        resource_type: ResourceType,
        resource_id: Uint,
    ) {
        let attached: Vec<(Vec<u8>, PolicyId)> = ctx
            .store
            .scan_prefix(&keys::policy_resource_prefix(resource_type, resource_id))
            .into_iter()
            .map(|(key, bytes)| {
                let id: PolicyId = bincode::deserialize(&bytes)
                    .unwrap_or_else(|e| panic!("corrupt policy index: {e}"));
                (key, id)
            })
            .collect();
        for (index_key, id) in attached {
            self.drop_policy(ctx, id, &index_key);
        }
    }

    pub(crate) fn drop_policy(&self, ctx: &mut Context<'_>, id: PolicyId, index_key: &[u8]) {
        if let Some(policy) = get_obj::<Policy>(&ctx.store, &keys::policy_key(id)) {
            if let Some(exp) = policy.expiration_time {
                ctx.store.delete(&keys::policy_expiration_key(exp, id));
            }
        }
        ctx.store.delete(&keys::policy_key(id));
        ctx.store.delete(index_key);
        ctx.events.emit(events::delete_policy(id));
    }
}
