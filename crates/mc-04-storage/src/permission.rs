//! # Permission Engine
//!
//! Every state-changing call resolves access the same way: owner bypass,
//! then account policies, then group policies evaluated member by member
//! with expirations honored. An explicit deny anywhere wins.

use crate::domain::entities::{GroupMember, Policy};
use crate::domain::value_objects::{ActionType, Effect, Principal, ResourceType};
use crate::keys;
use shared_store::kv::get_obj;
use shared_store::KvRead;
use shared_types::{Address, PolicyId, Uint};

/// Outcome of policy evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// Some statement allows and none denies.
    Allow,
    /// An explicit deny matched.
    Deny,
    /// No statement matched.
    Unspecified,
}

/// Resolve whether `operator` may perform `action` on the resource.
/// `owner` short-circuits to allow.
pub fn verify_permission(
    store: &dyn KvRead,
    operator: Address,
    owner: Address,
    resource_type: ResourceType,
    resource_id: Uint,
    action: ActionType,
    now: i64,
) -> bool {
    if operator == owner {
        return true;
    }

    // Account policy first.
    match eval_principal_policy(
        store,
        resource_type,
        resource_id,
        &Principal::Account(operator),
        action,
        now,
    ) {
        Verdict::Allow => return true,
        Verdict::Deny => return false,
        Verdict::Unspecified => {}
    }

    // Group policies, member by member.
    for (key, bytes) in store.scan_prefix(&keys::policy_resource_prefix(resource_type, resource_id))
    {
        // Principal tag byte sits right after the 32-byte resource id.
        let tag_offset = key.len() - 33;
        if key[tag_offset] != 0x02 {
            continue; // account principals were handled above
        }
        let policy_id: PolicyId = bincode::deserialize(&bytes)
            .unwrap_or_else(|e| panic!("corrupt policy index: {e}"));
        let Some(policy) = get_obj::<Policy>(store, &keys::policy_key(policy_id)) else {
            continue;
        };
        let Principal::Group(group_id) = policy.principal else {
            continue;
        };
        let membership: Option<GroupMember> =
            get_obj(store, &keys::group_member_key(group_id, operator));
        let is_member = membership.map(|m| m.is_valid_at(now)).unwrap_or(false);
        if !is_member {
            continue;
        }
        match eval_policy(&policy, action, now) {
            Verdict::Allow => return true,
            Verdict::Deny => return false,
            Verdict::Unspecified => {}
        }
    }
    false
}

/// Evaluate the policy stored for one `(resource, principal)` pair.
pub fn eval_principal_policy(
    store: &dyn KvRead,
    resource_type: ResourceType,
    resource_id: Uint,
    principal: &Principal,
    action: ActionType,
    now: i64,
) -> Verdict {
    let index_key = keys::policy_index_key(resource_type, resource_id, principal);
    let Some(policy_id) = get_obj::<PolicyId>(store, &index_key) else {
        return Verdict::Unspecified;
    };
    let Some(policy) = get_obj::<Policy>(store, &keys::policy_key(policy_id)) else {
        return Verdict::Unspecified;
    };
    eval_policy(&policy, action, now)
}

/// Evaluate one policy's statements. Deny wins over allow.
pub fn eval_policy(policy: &Policy, action: ActionType, now: i64) -> Verdict {
    if policy.expiration_time.map(|exp| exp <= now).unwrap_or(false) {
        return Verdict::Unspecified;
    }
    let mut verdict = Verdict::Unspecified;
    for statement in &policy.statements {
        if statement.expiration_time.map(|exp| exp <= now).unwrap_or(false) {
            continue;
        }
        let matches =
            statement.actions.contains(&ActionType::TypeAll) || statement.actions.contains(&action);
        if !matches {
            continue;
        }
        match statement.effect {
            Effect::Deny => return Verdict::Deny,
            Effect::Allow => verdict = Verdict::Allow,
        }
    }
    verdict
}

// =============================================================================
// TESTS
// =============================================================================
