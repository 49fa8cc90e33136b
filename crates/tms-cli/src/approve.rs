//! Interactive approver-password prompt for pending status changes.

use std::io::{BufRead, Write};

use chrono::Utc;
use tms_engine::{EngineError, PendingApproval, StatusChange, StatusGuard};
use tms_store::KvStore;

/// Ask for the approver password until it is accepted, the operator enters
/// an empty line, input ends, or `max_attempts` wrong passwords were given.
///
/// Returns `None` when the request was abandoned.
pub fn prompt<S, R, W>(
    guard: &StatusGuard<'_, S>,
    pending: &mut PendingApproval,
    max_attempts: u32,
    mut input: R,
    mut out: W,
) -> anyhow::Result<Option<StatusChange>>
where
    S: KvStore,
    R: BufRead,
    W: Write,
{
    loop {
        write!(
            out,
            "Approver password for {}: {} -> {} (empty to cancel): ",
            pending.contract_id(),
            pending.from(),
            pending.to()
        )?;
        out.flush()?;

        let mut line = String::new();
        let read = input.read_line(&mut line)?;
        let proof = line.trim_end_matches(['\r', '\n']);
        if read == 0 || proof.is_empty() {
            pending.abandon()?;
            writeln!(out, "Cancelled; status unchanged.")?;
            return Ok(None);
        }

        match guard.confirm(pending, proof, Utc::now()) {
            Ok(change) => return Ok(Some(change)),
            Err(EngineError::WrongPassword) => {
                writeln!(out, "Wrong password.")?;
                if pending.failed_attempts() >= max_attempts {
                    pending.abandon()?;
                    writeln!(out, "Too many attempts; status unchanged.")?;
                    return Ok(None);
                }
            }
            Err(e) => return Err(e.into()),
        }
    }
}
