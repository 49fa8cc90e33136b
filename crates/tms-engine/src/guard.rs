//! Password-gated contract status changes with an append-only audit log.
//!
//! A status change is a two-phase operation:
//!
//! 1. [`StatusGuard::request_status_change`] validates the request. Admins
//!    get the change applied at once; everyone else gets a
//!    [`PendingApproval`] back.
//! 2. The caller collects the approver password from a human and passes it
//!    to [`StatusGuard::confirm`], or drops the request with
//!    [`PendingApproval::abandon`].
//!
//! Only applied changes are logged. A wrong password leaves the request
//! pending so it can be retried.

use std::fmt;

use chrono::{DateTime, Utc};
use tms_core::{
    ApproverSecret, Asset, Authorization, Contract, ContractStatus, StatusChangeLogEntry,
};
use tms_store::{KvStore, Repository};
use tracing::{debug, info, warn};

use crate::EngineError;
use crate::effects::{SideEffect, effects_for};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Staff,
}

/// Who is asking for a change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub name: String,
    pub role: Role,
}

impl Actor {
    pub fn admin(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: Role::Admin,
        }
    }

    pub fn staff(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: Role::Staff,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalState {
    Pending,
    Confirmed,
    Abandoned,
}

impl fmt::Display for ApprovalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ApprovalState::Pending => "pending",
            ApprovalState::Confirmed => "confirmed",
            ApprovalState::Abandoned => "abandoned",
        })
    }
}

/// A status change parked until a human supplies the approver password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingApproval {
    contract_id: String,
    from: ContractStatus,
    to: ContractStatus,
    actor: String,
    state: ApprovalState,
    failed_attempts: u32,
}

impl PendingApproval {
    pub fn contract_id(&self) -> &str {
        &self.contract_id
    }

    /// Status of the contract when the request was made.
    pub fn from(&self) -> ContractStatus {
        self.from
    }

    pub fn to(&self) -> ContractStatus {
        self.to
    }

    pub fn state(&self) -> ApprovalState {
        self.state
    }

    pub fn failed_attempts(&self) -> u32 {
        self.failed_attempts
    }

    /// Drop the request. Nothing is mutated or logged.
    pub fn abandon(&mut self) -> Result<(), EngineError> {
        self.ensure_pending()?;
        self.state = ApprovalState::Abandoned;
        info!(contract = %self.contract_id, to = %self.to, "status change abandoned");
        Ok(())
    }

    fn ensure_pending(&self) -> Result<(), EngineError> {
        if self.state != ApprovalState::Pending {
            return Err(EngineError::NotPending {
                contract_id: self.contract_id.clone(),
                state: self.state,
            });
        }
        Ok(())
    }
}

/// An applied status change.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    pub entry: StatusChangeLogEntry,
    /// Assets registered by the transition's side effects.
    pub assets: Vec<Asset>,
}

/// Outcome of [`StatusGuard::request_status_change`].
#[derive(Debug, Clone, PartialEq)]
pub enum StatusRequest {
    /// The contract already has the requested status; nothing happened.
    Unchanged(ContractStatus),
    /// Admin request, applied immediately.
    Applied(StatusChange),
    AwaitingApproval(PendingApproval),
}

/// Authorizes, applies, and logs contract status changes.
pub struct StatusGuard<'a, S> {
    repo: &'a Repository<S>,
    secret: ApproverSecret,
}

impl<'a, S: KvStore> StatusGuard<'a, S> {
    pub fn new(repo: &'a Repository<S>, secret: ApproverSecret) -> Self {
        Self { repo, secret }
    }

    /// Start a status change.
    ///
    /// Unknown statuses and unknown contracts are rejected before any
    /// approval is requested.
    pub fn request_status_change(
        &self,
        contract_id: &str,
        new_status: &str,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<StatusRequest, EngineError> {
        let to: ContractStatus = new_status.parse()?;
        let contract = self
            .repo
            .find_contract(contract_id)?
            .ok_or_else(|| EngineError::ContractNotFound(contract_id.to_string()))?;

        if contract.status == to {
            debug!(contract = %contract_id, status = %to, "status unchanged");
            return Ok(StatusRequest::Unchanged(to));
        }

        if actor.is_admin() {
            let change = self.apply(
                contract_id,
                contract.status,
                to,
                &actor.name,
                Authorization::Admin,
                now,
            )?;
            return Ok(StatusRequest::Applied(change));
        }

        info!(
            contract = %contract_id,
            from = %contract.status,
            to = %to,
            actor = %actor.name,
            "status change awaiting approval"
        );
        Ok(StatusRequest::AwaitingApproval(PendingApproval {
            contract_id: contract_id.to_string(),
            from: contract.status,
            to,
            actor: actor.name.clone(),
            state: ApprovalState::Pending,
            failed_attempts: 0,
        }))
    }

    /// Approve a pending change with the approver password.
    ///
    /// On a wrong password the request stays [`ApprovalState::Pending`] and
    /// [`EngineError::WrongPassword`] is returned; nothing is written.
    ///
    /// If the contract's status moved away from [`PendingApproval::from`]
    /// while the request waited, the request is abandoned and
    /// [`EngineError::StatusMoved`] is returned; nothing is written.
    pub fn confirm(
        &self,
        pending: &mut PendingApproval,
        proof: &str,
        now: DateTime<Utc>,
    ) -> Result<StatusChange, EngineError> {
        pending.ensure_pending()?;
        if !self.secret.verify(proof) {
            pending.failed_attempts += 1;
            warn!(
                contract = %pending.contract_id,
                attempts = pending.failed_attempts,
                "approval rejected: wrong password"
            );
            return Err(EngineError::WrongPassword);
        }
        let applied = self.apply(
            &pending.contract_id,
            pending.from,
            pending.to,
            &pending.actor,
            Authorization::Password,
            now,
        );
        match applied {
            Ok(change) => {
                pending.state = ApprovalState::Confirmed;
                Ok(change)
            }
            Err(err @ EngineError::StatusMoved { .. }) => {
                pending.state = ApprovalState::Abandoned;
                warn!(contract = %pending.contract_id, error = %err, "stale approval request");
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// Move `contract_id` from `from` to `to`, log it, and run the
    /// transition's side effects.
    ///
    /// Every document involved is read before anything is written. If a
    /// later write fails, the earlier ones are restored.
    fn apply(
        &self,
        contract_id: &str,
        from: ContractStatus,
        to: ContractStatus,
        actor: &str,
        authorization: Authorization,
        now: DateTime<Utc>,
    ) -> Result<StatusChange, EngineError> {
        let original = self.repo.contracts()?;
        let mut log = self.repo.status_log()?;
        let effects = effects_for(from, to);
        let mut assets = if effects.is_empty() {
            Vec::new()
        } else {
            self.repo.assets()?
        };

        let mut contracts = original.clone();
        let contract = contracts
            .iter_mut()
            .find(|c| c.id == contract_id)
            .ok_or_else(|| EngineError::ContractNotFound(contract_id.to_string()))?;
        if contract.status != from {
            return Err(EngineError::StatusMoved {
                contract_id: contract_id.to_string(),
                expected: from,
                found: contract.status,
            });
        }
        contract.status = to;
        let contract = contract.clone();

        let entry = StatusChangeLogEntry {
            contract_id: contract_id.to_string(),
            old_status: from,
            new_status: to,
            changed_at: now,
            actor: actor.to_string(),
            authorization,
        };
        log.push(entry.clone());

        let mut registered = Vec::new();
        for effect in effects {
            match effect {
                SideEffect::RegisterAsset => {
                    let asset = new_asset(&contract, assets.len() + 1, now);
                    assets.push(asset.clone());
                    registered.push(asset);
                }
            }
        }

        self.repo.save_contracts(&contracts)?;
        let rest = self.repo.save_status_log(&log).and_then(|()| {
            if registered.is_empty() {
                Ok(())
            } else {
                self.repo.save_assets(&assets)
            }
        });
        if let Err(err) = rest {
            log.pop();
            let undo = self
                .repo
                .save_contracts(&original)
                .and_then(|()| self.repo.save_status_log(&log));
            if let Err(undo_err) = undo {
                warn!(contract = %contract_id, error = %undo_err, "status change rollback failed");
            }
            return Err(err.into());
        }

        for asset in &registered {
            info!(asset = %asset.id, contract = %contract_id, "asset registered");
        }
        info!(
            contract = %contract_id,
            from = %from,
            to = %to,
            actor,
            ?authorization,
            assets = registered.len(),
            "status changed"
        );
        Ok(StatusChange {
            entry,
            assets: registered,
        })
    }
}

/// Stock entry for an item taken back from `contract`; `seq` is its
/// 1-based position in the asset register.
fn new_asset(contract: &Contract, seq: usize, now: DateTime<Utc>) -> Asset {
    let name = if contract.plan_type.is_empty() {
        contract.name.clone()
    } else {
        format!("{} ({})", contract.plan_type, contract.name)
    };
    Asset {
        id: format!("AST-{seq:04}"),
        contract_id: contract.id.clone(),
        name,
        cost: contract.cost,
        resale: contract.resale,
        registered_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ReadOnlyKey;
    use chrono::TimeZone;
    use tms_store::{ASSETS_KEY, MemoryStore, STATUS_CHANGE_LOG_KEY};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 20, 10, 0, 0).unwrap()
    }

    fn repo_with(contracts: &[Contract]) -> Repository<MemoryStore> {
        let repo = Repository::new(MemoryStore::new());
        repo.save_contracts(contracts).unwrap();
        repo
    }

    fn guard(repo: &Repository<MemoryStore>) -> StatusGuard<'_, MemoryStore> {
        StatusGuard::new(repo, ApproverSecret::from_password("1234"))
    }

    fn pending(request: StatusRequest) -> PendingApproval {
        match request {
            StatusRequest::AwaitingApproval(p) => p,
            other => panic!("expected approval request, got {other:?}"),
        }
    }

    #[test]
    fn admin_change_applies_immediately() {
        let repo = repo_with(&[Contract::new("C001", "Somchai")]);
        let request = guard(&repo)
            .request_status_change("C001", "Closed", &Actor::admin("boss"), now())
            .unwrap();
        let StatusRequest::Applied(change) = request else {
            panic!("expected applied change");
        };
        assert_eq!(change.entry.old_status, ContractStatus::Active);
        assert_eq!(change.entry.authorization, Authorization::Admin);
        assert_eq!(
            repo.find_contract("C001").unwrap().unwrap().status,
            ContractStatus::Closed
        );
        assert_eq!(repo.status_log().unwrap().len(), 1);
    }

    #[test]
    fn staff_change_waits_for_approval() {
        let repo = repo_with(&[Contract::new("C001", "Somchai")]);
        let p = pending(
            guard(&repo)
                .request_status_change("C001", "Closed", &Actor::staff("clerk"), now())
                .unwrap(),
        );
        assert_eq!(p.state(), ApprovalState::Pending);
        assert_eq!(p.from(), ContractStatus::Active);
        assert_eq!(p.to(), ContractStatus::Closed);
        // Nothing applied yet.
        assert_eq!(
            repo.find_contract("C001").unwrap().unwrap().status,
            ContractStatus::Active
        );
        assert!(repo.status_log().unwrap().is_empty());
    }

    #[test]
    fn wrong_password_keeps_request_pending() {
        let repo = repo_with(&[Contract::new("C001", "Somchai")]);
        let guard = guard(&repo);
        let mut p = pending(
            guard
                .request_status_change("C001", "Closed", &Actor::staff("clerk"), now())
                .unwrap(),
        );

        let result = guard.confirm(&mut p, "wrongpassword", now());
        assert!(matches!(result, Err(EngineError::WrongPassword)));
        assert_eq!(p.state(), ApprovalState::Pending);
        assert_eq!(p.failed_attempts(), 1);
        assert_eq!(
            repo.find_contract("C001").unwrap().unwrap().status,
            ContractStatus::Active
        );
        assert!(repo.status_log().unwrap().is_empty());
    }

    #[test]
    fn retry_with_correct_password_applies_once() {
        let repo = repo_with(&[Contract::new("C001", "Somchai")]);
        let guard = guard(&repo);
        let mut p = pending(
            guard
                .request_status_change("C001", "Closed", &Actor::staff("clerk"), now())
                .unwrap(),
        );
        assert!(guard.confirm(&mut p, "nope", now()).is_err());

        let change = guard.confirm(&mut p, "1234", now()).unwrap();
        assert_eq!(p.state(), ApprovalState::Confirmed);
        assert_eq!(change.entry.old_status, ContractStatus::Active);
        assert_eq!(change.entry.new_status, ContractStatus::Closed);
        assert_eq!(change.entry.actor, "clerk");
        assert_eq!(change.entry.authorization, Authorization::Password);

        let log = repo.status_log().unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0], change.entry);

        // A confirmed request cannot be replayed.
        assert!(matches!(
            guard.confirm(&mut p, "1234", now()),
            Err(EngineError::NotPending {
                state: ApprovalState::Confirmed,
                ..
            })
        ));
        assert_eq!(repo.status_log().unwrap().len(), 1);
    }

    #[test]
    fn abandoned_request_changes_nothing() {
        let repo = repo_with(&[Contract::new("C001", "Somchai")]);
        let guard = guard(&repo);
        let mut p = pending(
            guard
                .request_status_change("C001", "Overdue", &Actor::staff("clerk"), now())
                .unwrap(),
        );
        p.abandon().unwrap();
        assert_eq!(p.state(), ApprovalState::Abandoned);
        assert!(matches!(
            guard.confirm(&mut p, "1234", now()),
            Err(EngineError::NotPending { .. })
        ));
        assert!(p.abandon().is_err());
        assert_eq!(
            repo.find_contract("C001").unwrap().unwrap().status,
            ContractStatus::Active
        );
        assert!(repo.status_log().unwrap().is_empty());
    }

    #[test]
    fn unknown_status_rejected_before_approval() {
        let repo = repo_with(&[Contract::new("C001", "Somchai")]);
        let result =
            guard(&repo).request_status_change("C001", "Archived", &Actor::staff("clerk"), now());
        assert!(matches!(result, Err(EngineError::InvalidStatus(_))));
    }

    #[test]
    fn unknown_contract_rejected() {
        let repo = repo_with(&[]);
        let result =
            guard(&repo).request_status_change("C404", "Closed", &Actor::admin("boss"), now());
        assert!(matches!(result, Err(EngineError::ContractNotFound(id)) if id == "C404"));
    }

    #[test]
    fn same_status_is_a_no_op() {
        let repo = repo_with(&[Contract::new("C001", "Somchai")]);
        let request = guard(&repo)
            .request_status_change("C001", "active", &Actor::staff("clerk"), now())
            .unwrap();
        assert_eq!(request, StatusRequest::Unchanged(ContractStatus::Active));
        assert!(repo.status_log().unwrap().is_empty());
    }

    #[test]
    fn asset_return_registers_asset_on_approval() {
        let mut contract = Contract::new("C001", "Somchai");
        contract.plan_type = "Phone".into();
        contract.cost = 8000.0;
        contract.resale = 5000.0;
        let repo = repo_with(&[contract]);
        let guard = guard(&repo);
        assert!(repo.assets().unwrap().is_empty());

        let mut p = pending(
            guard
                .request_status_change("C001", "Asset Return", &Actor::staff("clerk"), now())
                .unwrap(),
        );
        assert!(repo.assets().unwrap().is_empty());

        let change = guard.confirm(&mut p, "1234", now()).unwrap();
        assert_eq!(change.assets.len(), 1);
        let assets = repo.assets().unwrap();
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].id, "AST-0001");
        assert_eq!(assets[0].contract_id, "C001");
        assert_eq!(assets[0].name, "Phone (Somchai)");
        assert_eq!(assets[0].cost, 8000.0);
    }

    #[test]
    fn asset_ids_continue_sequence() {
        let repo = repo_with(&[Contract::new("C001", "A"), Contract::new("C002", "B")]);
        let guard = guard(&repo);
        let admin = Actor::admin("boss");
        guard.request_status_change("C001", "Asset Return", &admin, now()).unwrap();
        guard.request_status_change("C002", "Asset Return", &admin, now()).unwrap();
        let ids: Vec<String> = repo.assets().unwrap().into_iter().map(|a| a.id).collect();
        assert_eq!(ids, vec!["AST-0001", "AST-0002"]);
    }

    #[test]
    fn confirm_after_status_moved_is_rejected() {
        let repo = repo_with(&[Contract::new("C001", "Somchai")]);
        let guard = guard(&repo);
        let mut p = pending(
            guard
                .request_status_change("C001", "Asset Return", &Actor::staff("clerk"), now())
                .unwrap(),
        );
        guard
            .request_status_change("C001", "Asset Return", &Actor::admin("boss"), now())
            .unwrap();

        let result = guard.confirm(&mut p, "1234", now());
        assert!(matches!(
            result,
            Err(EngineError::StatusMoved {
                expected: ContractStatus::Active,
                found: ContractStatus::AssetReturn,
                ..
            })
        ));
        assert_eq!(p.state(), ApprovalState::Abandoned);
        assert_eq!(repo.status_log().unwrap().len(), 1);
        assert_eq!(repo.assets().unwrap().len(), 1);
    }

    #[test]
    fn corrupt_log_leaves_status_unchanged() {
        let repo = repo_with(&[Contract::new("C001", "Somchai")]);
        repo.store().set(STATUS_CHANGE_LOG_KEY, "{corrupt").unwrap();

        let result =
            guard(&repo).request_status_change("C001", "Closed", &Actor::admin("boss"), now());
        assert!(matches!(result, Err(EngineError::Store(_))));
        assert_eq!(
            repo.find_contract("C001").unwrap().unwrap().status,
            ContractStatus::Active
        );
    }

    #[test]
    fn failed_asset_write_rolls_back_status_and_log() {
        let repo = Repository::new(ReadOnlyKey::new(ASSETS_KEY));
        repo.save_contracts(&[Contract::new("C001", "Somchai")]).unwrap();
        let guard = StatusGuard::new(&repo, ApproverSecret::from_password("1234"));

        let result =
            guard.request_status_change("C001", "Asset Return", &Actor::admin("boss"), now());
        assert!(matches!(result, Err(EngineError::Store(_))));
        assert_eq!(
            repo.find_contract("C001").unwrap().unwrap().status,
            ContractStatus::Active
        );
        assert!(repo.status_log().unwrap().is_empty());
        assert!(repo.assets().unwrap().is_empty());
    }
}
