//! # Virtual-Group Events

use crate::domain::entities::{GlobalVirtualGroup, GvgFamily};
use shared_store::Event;
use shared_types::{FamilyId, GvgId, SpId};

/// Emitted on group creation.
pub fn create_gvg(gvg: &GlobalVirtualGroup) -> Event {
    Event::new(
        "create_global_virtual_group",
        vec![
            ("gvg_id".to_string(), gvg.id.to_string()),
            ("family_id".to_string(), gvg.family_id.to_string()),
            ("primary_sp_id".to_string(), gvg.primary_sp_id.to_string()),
            ("total_deposit".to_string(), gvg.total_deposit.to_string()),
        ],
    )
}

/// Emitted on group deletion.
pub fn delete_gvg(gvg_id: GvgId) -> Event {
    Event::new("delete_global_virtual_group", vec![("gvg_id".to_string(), gvg_id.to_string())])
}

/// Emitted on family creation.
pub fn create_family(family: &GvgFamily) -> Event {
    Event::new(
        "create_global_virtual_group_family",
        vec![
            ("family_id".to_string(), family.id.to_string()),
            ("primary_sp_id".to_string(), family.primary_sp_id.to_string()),
        ],
    )
}

/// Emitted when a swap-out is reserved.
pub fn swap_out(sp_id: SpId, successor_sp_id: SpId, family_id: FamilyId, gvg_count: usize) -> Event {
    Event::new(
        "swap_out",
        vec![
            ("sp_id".to_string(), sp_id.to_string()),
            ("successor_sp_id".to_string(), successor_sp_id.to_string()),
            ("family_id".to_string(), family_id.to_string()),
            ("gvg_count".to_string(), gvg_count.to_string()),
        ],
    )
}

/// Emitted when a swap-out completes.
pub fn complete_swap_out(successor_sp_id: SpId, family_id: FamilyId, gvg_count: usize) -> Event {
    Event::new(
        "complete_swap_out",
        vec![
            ("successor_sp_id".to_string(), successor_sp_id.to_string()),
            ("family_id".to_string(), family_id.to_string()),
            ("gvg_count".to_string(), gvg_count.to_string()),
        ],
    )
}

/// Emitted when a swap-in is reserved.
pub fn reserve_swap_in(successor_sp_id: SpId, target_sp_id: SpId, family_id: FamilyId, gvg_id: GvgId) -> Event {
    Event::new(
        "reserve_swap_in",
        vec![
            ("successor_sp_id".to_string(), successor_sp_id.to_string()),
            ("target_sp_id".to_string(), target_sp_id.to_string()),
            ("family_id".to_string(), family_id.to_string()),
            ("gvg_id".to_string(), gvg_id.to_string()),
        ],
    )
}

/// Emitted when a swap-in completes.
pub fn complete_swap_in(successor_sp_id: SpId, family_id: FamilyId, gvg_id: GvgId) -> Event {
    Event::new(
        "complete_swap_in",
        vec![
            ("successor_sp_id".to_string(), successor_sp_id.to_string()),
            ("family_id".to_string(), family_id.to_string()),
            ("gvg_id".to_string(), gvg_id.to_string()),
        ],
    )
}

/// Emitted when a swap-in reservation is cancelled.
pub fn cancel_swap_in(family_id: FamilyId, gvg_id: GvgId) -> Event {
    Event::new(
        "cancel_swap_in",
        vec![
            ("family_id".to_string(), family_id.to_string()),
            ("gvg_id".to_string(), gvg_id.to_string()),
        ],
    )
}

/// Emitted when a family settles its virtual payment account.
pub fn settle_family(family_id: FamilyId, amount: u128) -> Event {
    Event::new(
        "settle_gvg_family",
        vec![
            ("family_id".to_string(), family_id.to_string()),
            ("amount".to_string(), amount.to_string()),
        ],
    )
}

/// Emitted when a group settles its virtual payment account.
pub fn settle_gvg(gvg_id: GvgId, amount: u128) -> Event {
    Event::new(
        "settle_gvg",
        vec![
            ("gvg_id".to_string(), gvg_id.to_string()),
            ("amount".to_string(), amount.to_string()),
        ],
    )
}
