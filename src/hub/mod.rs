//! Hub dispatcher: routes profile, publication and follow actions and runs
//! each one as an all-or-nothing step.

use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{error, info, warn};

use crate::contracts::{ContractRef, FollowRegistry};
use crate::error::{GateError, Result};
use crate::ledger::{
    HubAction, LedgerEvent, LedgerSnapshot, LedgerState, Profile, ProfileId, PubId, Publication,
};
use crate::receipt::{action_digest, Receipt, ReceiptOutcome};
use crate::reference::{ModuleTable, ReferenceModule};

#[derive(Debug, Default)]
pub struct Hub {
    state: LedgerState,
    modules: ModuleTable,
    receipts: Vec<Receipt>,
}

impl Hub {
    /// A hub with no reference modules registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// A hub with the follower-only module registered, see
    /// [`ModuleTable::with_follower_only`].
    pub fn with_follower_only() -> Self {
        Self::with_modules(ModuleTable::with_follower_only())
    }

    pub fn with_modules(modules: ModuleTable) -> Self {
        Self {
            state: LedgerState::new(),
            modules,
            receipts: Vec::new(),
        }
    }

    pub fn register_reference_module(
        &mut self,
        id: &str,
        module: Box<dyn ReferenceModule>,
    ) -> Result<()> {
        self.modules.register(id, module)?;
        info!(module = id, "reference module registered");
        Ok(())
    }

    /// Like [`Hub::execute_at`], stamped with the wall clock in seconds.
    pub fn execute(&mut self, sender: &str, action: HubAction) -> Result<Vec<LedgerEvent>> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default();
        self.execute_at(sender, action, timestamp)
    }

    /// Runs `action` against a staged copy of the state. The copy replaces the
    /// committed state only if the action and the registry check both succeed.
    pub fn execute_at(
        &mut self,
        sender: &str,
        action: HubAction,
        timestamp: u64,
    ) -> Result<Vec<LedgerEvent>> {
        let digest = action_digest(sender, &action, timestamp)?;
        let mut staged = self.state.stage();
        let applied = staged
            .apply(&self.modules, sender, &action, timestamp)
            .and_then(|events| staged.follows.check_invariants().map(|()| events));

        match applied {
            Ok(events) => {
                staged.meta.height += 1;
                staged.meta.timestamp = timestamp;
                let outcome = ReceiptOutcome::Accepted {
                    events: events.clone(),
                };
                let receipt = self.record(sender, digest, timestamp, &staged, outcome)?;
                staged.meta.previous_receipt = Some(receipt);
                self.state.commit(staged);
                let height = self.state.meta.height;
                info!(action = action.name(), sender, height, "action committed");
                Ok(events)
            }
            Err(err) => {
                if err.is_recoverable() {
                    warn!(action = action.name(), sender, %err, "action rejected");
                } else {
                    error!(action = action.name(), sender, %err, "follow registry corrupted");
                }
                let outcome = ReceiptOutcome::Rejected {
                    reason: err.to_string(),
                };
                let committed = (self.state.meta.height, self.state.state_root());
                self.push_receipt(sender, digest, timestamp, committed, outcome)?;
                Err(err)
            }
        }
    }

    fn record(
        &mut self,
        sender: &str,
        action_digest: [u8; 32],
        timestamp: u64,
        state: &LedgerState,
        outcome: ReceiptOutcome,
    ) -> Result<[u8; 32]> {
        let committed = (state.meta.height, state.state_root());
        self.push_receipt(sender, action_digest, timestamp, committed, outcome)
    }

    fn push_receipt(
        &mut self,
        sender: &str,
        action_digest: [u8; 32],
        timestamp: u64,
        (height, state_root): (u64, [u8; 32]),
        outcome: ReceiptOutcome,
    ) -> Result<[u8; 32]> {
        let previous = match self.receipts.last() {
            Some(last) => Some(last.digest()?),
            None => None,
        };
        let receipt = Receipt {
            height,
            timestamp,
            sender: sender.to_string(),
            action_digest,
            outcome,
            previous,
            state_root,
        };
        let digest = receipt.digest()?;
        self.receipts.push(receipt);
        Ok(digest)
    }

    pub fn profile(&self, profile_id: ProfileId) -> Result<&Profile> {
        self.state.profile(profile_id)
    }

    pub fn publication(&self, profile_id: ProfileId, pub_id: PubId) -> Result<&Publication> {
        self.state.publication(profile_id, pub_id)
    }

    /// Read-only view of the follow registry.
    pub fn follows(&self) -> &FollowRegistry {
        &self.state.follows
    }

    pub fn follow_credential_of(&self, profile_id: ProfileId) -> Option<ContractRef> {
        self.state.follows.contract_of(profile_id)
    }

    pub fn events(&self) -> &[LedgerEvent] {
        &self.state.events
    }

    pub fn receipts(&self) -> &[Receipt] {
        &self.receipts
    }

    pub fn height(&self) -> u64 {
        self.state.meta.height
    }

    pub fn modules(&self) -> &ModuleTable {
        &self.modules
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        self.state.snapshot()
    }
}

/// Shorthand used by callers that only care whether an action was refused
/// for lack of a follow credential.
pub fn is_follow_invalid<T>(result: &Result<T>) -> bool {
    matches!(result, Err(GateError::FollowInvalid))
}
