//! # Group Operations

use super::{ensure_permission, StorageService};
use crate::domain::entities::{GroupInfo, GroupMember};
use crate::domain::errors::StorageError;
use crate::domain::names::validate_group_name;
use crate::domain::value_objects::{ActionType, ResourceType};
use crate::events;
use crate::keys;
use shared_store::kv::{get_obj, put_obj};
use shared_store::{Context, KvRead, KvWrite};
use shared_types::{Address, GroupId};

impl StorageService {
    /// Group by `(owner, name)`.
    pub fn get_group(&self, store: &dyn KvRead, owner: Address, name: &str) -> Option<GroupInfo> {
        get_obj(store, &keys::group_key(owner, name))
    }

    /// Natural key by group id.
    pub fn get_group_key_by_id(
        &self,
        store: &dyn KvRead,
        id: GroupId,
    ) -> Option<(Address, String)> {
        get_obj(store, &keys::group_id_index_key(id))
    }

    /// Create a group.
    pub fn create_group(
        &self,
        ctx: &mut Context<'_>,
        owner: Address,
        name: &str,
        extra: String,
    ) -> Result<GroupId, StorageError> {
        validate_group_name(name)?;
        if ctx.store.has(&keys::group_key(owner, name)) {
            return Err(StorageError::GroupExists { name: name.to_string() });
        }
        let id = self.next_uint(&mut ctx.store, keys::group_sequence_key());
        let group = GroupInfo { id, owner, name: name.to_string(), extra, member_count: 0 };
        put_obj(&mut ctx.store, keys::group_key(owner, name), &group);
        put_obj(&mut ctx.store, keys::group_id_index_key(id), &(owner, name.to_string()));
        ctx.events.emit(events::create_group(&group));
        Ok(id)
    }

    /// Add and remove members. The cap applies to the post-change count.
    pub fn update_group_members(
        &self,
        ctx: &mut Context<'_>,
        operator: Address,
        group_owner: Address,
        group_name: &str,
        add: Vec<(Address, Option<i64>)>,
        remove: Vec<Address>,
    ) -> Result<(), StorageError> {
        let mut group = self
            .get_group(&ctx.store, group_owner, group_name)
            .ok_or(StorageError::GroupNotFound)?;
        ensure_permission(
            &ctx.store,
            operator,
            group.owner,
            ResourceType::Group,
            group.id,
            ActionType::UpdateGroupMember,
            ctx.block.time,
        )?;
        let params = self.get_params(&ctx.store);

        let added = add.len();
        let removed = remove.len();
        for member in remove {
            let key = keys::group_member_key(group.id, member);
            if ctx.store.has(&key) {
                ctx.store.delete(&key);
                group.member_count = group.member_count.saturating_sub(1);
            }
        }
        for (member, expiration) in add {
            let key = keys::group_member_key(group.id, member);
            if !ctx.store.has(&key) {
                group.member_count += 1;
                if group.member_count > params.max_group_num {
                    return Err(StorageError::MaxGroupMembers {
                        current: group.member_count,
                        limit: params.max_group_num,
                    });
                }
            }
            put_obj(&mut ctx.store, key, &GroupMember { expiration });
        }
        put_obj(&mut ctx.store, keys::group_key(group.owner, &group.name), &group);
        ctx.events.emit(events::update_group_member(&group, added, removed));
        Ok(())
    }

    /// Extend existing memberships' expirations.
    pub fn renew_group_members(
        &self,
        ctx: &mut Context<'_>,
        operator: Address,
        group_owner: Address,
        group_name: &str,
        members: Vec<(Address, Option<i64>)>,
    ) -> Result<(), StorageError> {
        let group = self
            .get_group(&ctx.store, group_owner, group_name)
            .ok_or(StorageError::GroupNotFound)?;
        ensure_permission(
            &ctx.store,
            operator,
            group.owner,
            ResourceType::Group,
            group.id,
            ActionType::UpdateGroupMember,
            ctx.block.time,
        )?;
        for (member, expiration) in members {
            let key = keys::group_member_key(group.id, member);
            if !ctx.store.has(&key) {
                return Err(StorageError::GroupNotFound);
            }
            put_obj(&mut ctx.store, key, &GroupMember { expiration });
        }
        Ok(())
    }

    /// A member removes itself.
    pub fn leave_group(
        &self,
        ctx: &mut Context<'_>,
        member: Address,
        group_owner: Address,
        group_name: &str,
    ) -> Result<(), StorageError> {
        let mut group = self
            .get_group(&ctx.store, group_owner, group_name)
            .ok_or(StorageError::GroupNotFound)?;
        let key = keys::group_member_key(group.id, member);
        if !ctx.store.has(&key) {
            return Err(StorageError::GroupNotFound);
        }
        ctx.store.delete(&key);
        group.member_count = group.member_count.saturating_sub(1);
        put_obj(&mut ctx.store, keys::group_key(group.owner, &group.name), &group);
        Ok(())
    }

    /// Update the free-form extra field.
    pub fn update_group_extra(
        &self,
        ctx: &mut Context<'_>,
        operator: Address,
        group_owner: Address,
        group_name: &str,
        extra: String,
    ) -> Result<(), StorageError> {
        let mut group = self
            .get_group(&ctx.store, group_owner, group_name)
            .ok_or(StorageError::GroupNotFound)?;
        ensure_permission(
            &ctx.store,
            operator,
            group.owner,
            ResourceType::Group,
            group.id,
            ActionType::UpdateGroupExtra,
            ctx.block.time,
        )?;
        group.extra = extra;
        put_obj(&mut ctx.store, keys::group_key(group.owner, &group.name), &group);
        Ok(())
    }

    /// Delete a group, its memberships and attached policies.
    pub fn delete_group(
        &self,
        ctx: &mut Context<'_>,
        operator: Address,
        group_owner: Address,
        group_name: &str,
    ) -> Result<(), StorageError> {
        let group = self
            .get_group(&ctx.store, group_owner, group_name)
            .ok_or(StorageError::GroupNotFound)?;
        ensure_permission(
            &ctx.store,
            operator,
            group.owner,
            ResourceType::Group,
            group.id,
            ActionType::DeleteGroup,
            ctx.block.time,
        )?;
        let members: Vec<Vec<u8>> = ctx
            .store
            .scan_prefix(&keys::group_member_prefix(group.id))
            .into_iter()
            .map(|(key, _)| key)
            .collect();
        for key in members {
            ctx.store.delete(&key);
        }
        self.remove_policies_for_resource(ctx, ResourceType::Group, group.id);
        ctx.store.delete(&keys::group_key(group.owner, &group.name));
        ctx.store.delete(&keys::group_id_index_key(group.id));
        ctx.events.emit(events::delete_group(&group));
        Ok(())
    }
}
