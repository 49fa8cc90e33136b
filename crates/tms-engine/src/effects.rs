//! Side effects attached to specific status transitions.

use tms_core::ContractStatus;

/// Work committed together with a status change and its log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideEffect {
    /// Take the contract's item back into stock as a new asset.
    RegisterAsset,
}

/// One row of the transition table. `from: None` matches any old status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionEffect {
    pub from: Option<ContractStatus>,
    pub to: ContractStatus,
    pub effect: SideEffect,
}

pub const SIDE_EFFECTS: &[TransitionEffect] = &[TransitionEffect {
    from: None,
    to: ContractStatus::AssetReturn,
    effect: SideEffect::RegisterAsset,
}];

/// Effects for `from -> to`, in table order.
pub fn effects_for(from: ContractStatus, to: ContractStatus) -> Vec<SideEffect> {
    SIDE_EFFECTS
        .iter()
        .filter(|row| row.to == to && row.from.is_none_or(|f| f == from))
        .map(|row| row.effect)
        .collect()
}
