//! First-run demo data.

use tms_core::{Contract, ContractStatus};
use tms_store::{KvStore, Repository};
use tracing::info;

use crate::EngineError;

/// The contracts a fresh store starts with.
pub fn demo_contracts() -> Vec<Contract> {
    vec![
        Contract {
            phone: "0812345678".into(),
            date: "2025-09-01".into(),
            total: 12000.0,
            paid: 4000.0,
            installments: 12,
            cost: 8000.0,
            resale: 6000.0,
            plan_type: "Phone".into(),
            ..Contract::new("C001", "Somchai Jaidee")
        },
        Contract {
            phone: "0898765432".into(),
            date: "2025-08-15".into(),
            total: 24000.0,
            paid: 2000.0,
            installments: 10,
            cost: 18000.0,
            resale: 12000.0,
            plan_type: "Laptop".into(),
            ..Contract::new("C002", "Malee Srisuk")
        },
        Contract {
            phone: "0861112222".into(),
            date: "2025-06-10".into(),
            status: ContractStatus::Overdue,
            total: 9000.0,
            paid: 1500.0,
            installments: 6,
            cost: 6500.0,
            resale: 4000.0,
            plan_type: "Tablet".into(),
            ..Contract::new("C003", "Niran Thongdee")
        },
    ]
}

/// Write the demo contracts if the store has none (or if `force` is set).
///
/// Logs, receipt counters, and assets are left alone. Returns the number of
/// contracts written.
pub fn seed<S: KvStore>(repo: &Repository<S>, force: bool) -> Result<usize, EngineError> {
    if repo.has_contracts()? && !force {
        info!("contracts already present, skipping seed");
        return Ok(0);
    }
    let contracts = demo_contracts();
    repo.save_contracts(&contracts)?;
    info!(count = contracts.len(), "seeded demo contracts");
    Ok(contracts.len())
}
