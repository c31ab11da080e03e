//! Post-run consistency checks.
//!
//! Runs after every resolution, before the plan is handed out. Either
//! check failing means the resolver's bookkeeping is wrong, so the run is
//! reported as an invariant violation instead of returning a plan.
//!
//! - **Claims**: for every key, the stock leaves in the tree sum to what
//!   the run added to the ledger's reserved pool and never exceed what was
//!   available when the run started. This is the at-most-once consumption
//!   rule across sibling branches.
//! - **Need identity**: for every need node, covered plus unsatisfiable
//!   units equal the amount needed, and no invocation applies more units
//!   than it produced.

use std::collections::{BTreeMap, BTreeSet};

use autocraft_ledger::{BalanceResult, Ledger, LedgerAnomaly};
use autocraft_types::ResourceKey;

use crate::tree::NeedNode;

/// Check the tree's stock claims against the ledger as it was before the
/// run (`before`) and after it (`after`).
///
/// Imbalances carry (`expected`, `claimed`) where `expected` is the amount
/// the run reserved, or the amount that was available when the claim
/// exceeds it.
pub fn audit_claims(
    tree: &NeedNode,
    before: &Ledger,
    after: &Ledger,
) -> Result<(), LedgerAnomaly> {
    if let BalanceResult::Anomaly(anomaly) = after.verify_balance() {
        return Err(anomaly);
    }

    let claims = tree.stock_claims();
    let keys: BTreeSet<&ResourceKey> = claims
        .keys()
        .chain(after.reserved_pool().keys())
        .collect();

    let mut imbalances = BTreeMap::new();
    for key in keys {
        let claimed = claims.get(key).copied().unwrap_or(0);
        let available = before.available(key);
        let reserved = after.reserved(key).saturating_sub(before.reserved(key));
        if claimed > available {
            imbalances.insert(key.clone(), (available, claimed));
        } else if claimed != reserved {
            imbalances.insert(key.clone(), (reserved, claimed));
        }
    }

    if imbalances.is_empty() {
        return Ok(());
    }
    let message = format!(
        "stock claims disagree with the ledger for {} key(s)",
        imbalances.len()
    );
    Err(LedgerAnomaly {
        imbalances,
        message,
    })
}

/// Check that every need node accounts for exactly its amount.
///
/// Imbalances carry (`amount`, `satisfied + residual`) for the first
/// offending node of each key.
pub fn audit_tree(tree: &NeedNode) -> Result<(), LedgerAnomaly> {
    let mut imbalances: BTreeMap<ResourceKey, (u64, u64)> = BTreeMap::new();
    tree.visit(&mut |need| {
        let accounted = need.satisfied().saturating_add(need.residual());
        let overdrawn = need.invocations().any(|inv| inv.used > inv.produced);
        if accounted != need.amount || overdrawn {
            imbalances
                .entry(need.key.clone())
                .or_insert((need.amount, accounted));
        }
    });

    if imbalances.is_empty() {
        return Ok(());
    }
    let message = format!(
        "resolution tree does not account for {} key(s)",
        imbalances.len()
    );
    Err(LedgerAnomaly {
        imbalances,
        message,
    })
}
