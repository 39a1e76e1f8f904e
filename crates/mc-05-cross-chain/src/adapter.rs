//! # Storage Adapter
//!
//! Implements the bridge's storage port over the real storage service,
//! translating packet-level requests into keeper messages.

use crate::ports::{BridgeCreateBucket, BridgePolicy, StorageBridgeApi};
use mc_04_storage::approval::PrimarySpApproval;
use mc_04_storage::service::bucket::CreateBucketMsg;
use mc_04_storage::{
    ActionType, Effect, Principal, ResourceType, Statement, StorageService,
};
use shared_crypto::EcdsaSignature;
use shared_store::Context;
use shared_types::{Address, SourceType, Uint, Visibility};

fn action_from_byte(byte: u8) -> ActionType {
    match byte {
        0x00 => ActionType::TypeAll,
        0x01 => ActionType::UpdateBucketInfo,
        0x02 => ActionType::DeleteBucket,
        0x03 => ActionType::CreateObject,
        0x04 => ActionType::DeleteObject,
        0x05 => ActionType::CopyObject,
        0x06 => ActionType::GetObject,
        0x07 => ActionType::UpdateObjectContent,
        0x08 => ActionType::UpdateGroupMember,
        0x09 => ActionType::DeleteGroup,
        0x0A => ActionType::UpdateGroupExtra,
        other => panic!("unknown policy action byte {other:#04x}"),
    }
}

fn resource_type_from_byte(byte: u8) -> ResourceType {
    match byte {
        0x01 => ResourceType::Bucket,
        0x02 => ResourceType::Object,
        0x03 => ResourceType::Group,
        other => panic!("unknown resource type byte {other:#04x}"),
    }
}

fn principal_from_packet(principal_type: u8, value: &[u8; 32]) -> Principal {
    match principal_type {
        0x01 => {
            let mut addr = [0u8; 20];
            addr.copy_from_slice(&value[12..32]);
            Principal::Account(Address::new(addr))
        }
        0x02 => Principal::Group(Uint::from_big_endian(value)),
        other => panic!("unknown principal type byte {other:#04x}"),
    }
}

impl StorageBridgeApi for StorageService {
    fn create_bucket(
        &self,
        ctx: &mut Context<'_>,
        msg: BridgeCreateBucket,
    ) -> Result<Uint, String> {
        let sig =
            EcdsaSignature::from_slice(&msg.approval_sig).map_err(|e| e.to_string())?;
        self.create_bucket(
            ctx,
            CreateBucketMsg {
                creator: msg.creator,
                bucket_name: msg.bucket_name,
                visibility: Visibility::Private,
                payment_address: msg.payment_address,
                primary_sp_address: msg.primary_sp_address,
                primary_sp_approval: Some(PrimarySpApproval {
                    expired_height: msg.expired_height,
                    global_virtual_group_family_id: msg.global_virtual_group_family_id,
                    sig,
                }),
                approval_msg_bytes: Some(msg.approval_msg_bytes),
                charged_read_quota: msg.charged_read_quota,
                source_type: SourceType::CrossChain,
            },
        )
        .map_err(|e| e.to_string())
    }

    fn delete_bucket(
        &self,
        ctx: &mut Context<'_>,
        operator: Address,
        id: Uint,
    ) -> Result<(), String> {
        let name = self
            .get_bucket_name_by_id(&ctx.store, id)
            .ok_or_else(|| "bucket not found".to_string())?;
        StorageService::delete_bucket(self, ctx, operator, &name).map_err(|e| e.to_string())
    }

    fn ack_mirror_bucket(
        &self,
        ctx: &mut Context<'_>,
        id: Uint,
        success: bool,
    ) -> Result<(), String> {
        StorageService::ack_mirror_bucket(self, ctx, id, success).map_err(|e| e.to_string())
    }

    fn delete_object(
        &self,
        ctx: &mut Context<'_>,
        operator: Address,
        id: Uint,
    ) -> Result<(), String> {
        let (bucket_name, object_name) = self
            .get_object_key_by_id(&ctx.store, id)
            .ok_or_else(|| "object not found".to_string())?;
        StorageService::delete_object(self, ctx, operator, &bucket_name, &object_name)
            .map_err(|e| e.to_string())
    }

    fn ack_mirror_object(
        &self,
        ctx: &mut Context<'_>,
        id: Uint,
        success: bool,
    ) -> Result<(), String> {
        StorageService::ack_mirror_object(self, ctx, id, success).map_err(|e| e.to_string())
    }

    fn create_group(
        &self,
        ctx: &mut Context<'_>,
        owner: Address,
        name: &str,
    ) -> Result<Uint, String> {
        StorageService::create_group(self, ctx, owner, name, String::new())
            .map_err(|e| e.to_string())
    }

    fn delete_group(
        &self,
        ctx: &mut Context<'_>,
        operator: Address,
        id: Uint,
    ) -> Result<(), String> {
        let (owner, name) = self
            .get_group_key_by_id(&ctx.store, id)
            .ok_or_else(|| "group not found".to_string())?;
        StorageService::delete_group(self, ctx, operator, owner, &name).map_err(|e| e.to_string())
    }

    fn put_policy(&self, ctx: &mut Context<'_>, policy: BridgePolicy) -> Result<Uint, String> {
        let statements = vec![Statement {
            actions: vec![action_from_byte(policy.action)],
            effect: if policy.effect == 0 { Effect::Allow } else { Effect::Deny },
            expiration_time: (policy.expiration_time > 0)
                .then_some(policy.expiration_time as i64),
        }];
        StorageService::put_policy(
            self,
            ctx,
            policy.operator,
            principal_from_packet(policy.principal_type, &policy.principal_value),
            mc_04_storage::domain::value_objects::Resource {
                resource_type: resource_type_from_byte(policy.resource_type),
                resource_id: policy.resource_id,
            },
            statements,
            None,
        )
        .map_err(|e| e.to_string())
    }

    fn delete_policy(&self, ctx: &mut Context<'_>, policy: BridgePolicy) -> Result<(), String> {
        StorageService::delete_policy(
            self,
            ctx,
            policy.operator,
            principal_from_packet(policy.principal_type, &policy.principal_value),
            mc_04_storage::domain::value_objects::Resource {
                resource_type: resource_type_from_byte(policy.resource_type),
                resource_id: policy.resource_id,
            },
        )
        .map_err(|e| e.to_string())
    }
}
