use std::collections::{btree_map::Entry, BTreeMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{GateError, Result};
use crate::ledger::{Address, ProfileId, TokenId};

/// Stable handle of a profile's follow-credential contract.
///
/// Derived from the profile id alone, so a second deployment for the same
/// profile could only ever collide with the first.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContractRef(pub [u8; 32]);

impl ContractRef {
    pub fn for_profile(profile_id: ProfileId) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"follow-credential");
        hasher.update(profile_id.to_le_bytes());
        Self(hasher.finalize().into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for ContractRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0[..20]))
    }
}

/// Non-fungible follow credentials issued for a single profile.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FollowCredential {
    pub profile_id: ProfileId,
    pub contract: ContractRef,
    owners: BTreeMap<TokenId, Address>,
    balances: BTreeMap<Address, u64>,
    minted: TokenId,
}

impl FollowCredential {
    fn new(profile_id: ProfileId) -> Self {
        Self {
            profile_id,
            contract: ContractRef::for_profile(profile_id),
            owners: BTreeMap::new(),
            balances: BTreeMap::new(),
            minted: 0,
        }
    }

    pub fn balance_of(&self, owner: &str) -> u64 {
        self.balances.get(owner).copied().unwrap_or(0)
    }

    pub fn owner_of(&self, token_id: TokenId) -> Option<&Address> {
        self.owners.get(&token_id)
    }

    pub fn total_supply(&self) -> u64 {
        self.minted
    }

    pub fn tokens_of(&self, owner: &str) -> Vec<TokenId> {
        self.owners
            .iter()
            .filter(|(_, holder)| holder.as_str() == owner)
            .map(|(token_id, _)| *token_id)
            .collect()
    }

    pub fn holders(&self) -> impl Iterator<Item = (&TokenId, &Address)> {
        self.owners.iter()
    }

    /// Issues the next token (ids start at 1) to `to`.
    pub fn mint(&mut self, to: &str) -> Result<TokenId> {
        if to.is_empty() {
            return Err(GateError::InvalidRecipient);
        }
        self.minted += 1;
        let token_id = self.minted;
        self.owners.insert(token_id, to.to_string());
        *self.balances.entry(to.to_string()).or_default() += 1;
        debug!(profile_id = self.profile_id, token_id, to, "follow credential minted");
        Ok(token_id)
    }

    /// Moves `token_id` from `from` to `to`. Only the current owner may move it.
    pub fn transfer(
        &mut self,
        caller: &str,
        from: &str,
        to: &str,
        token_id: TokenId,
    ) -> Result<()> {
        if to.is_empty() {
            return Err(GateError::InvalidRecipient);
        }
        let owner = self
            .owners
            .get_mut(&token_id)
            .ok_or(GateError::TokenNotFound {
                profile_id: self.profile_id,
                token_id,
            })?;
        if owner.as_str() != from || caller != from {
            return Err(GateError::NotTokenOwner {
                profile_id: self.profile_id,
                token_id,
                caller: caller.to_string(),
            });
        }
        *owner = to.to_string();

        if let Entry::Occupied(mut balance) = self.balances.entry(from.to_string()) {
            *balance.get_mut() -= 1;
            if *balance.get() == 0 {
                balance.remove();
            }
        }
        *self.balances.entry(to.to_string()).or_default() += 1;
        debug!(profile_id = self.profile_id, token_id, from, to, "follow credential transferred");
        Ok(())
    }

    fn check_invariants(&self, key: ProfileId) -> Result<()> {
        if self.profile_id != key || self.contract != ContractRef::for_profile(key) {
            return Err(GateError::RegistryCorrupted(format!(
                "contract {} registered under profile {key} belongs to profile {}",
                self.contract, self.profile_id
            )));
        }
        if self.owners.len() as u64 != self.minted {
            return Err(GateError::RegistryCorrupted(format!(
                "profile {key}: {} tokens owned, {} minted",
                self.owners.len(),
                self.minted
            )));
        }
        let mut counted: BTreeMap<&str, u64> = BTreeMap::new();
        for holder in self.owners.values() {
            *counted.entry(holder.as_str()).or_default() += 1;
        }
        let stored: BTreeMap<&str, u64> = self
            .balances
            .iter()
            .map(|(holder, balance)| (holder.as_str(), *balance))
            .collect();
        if counted != stored {
            return Err(GateError::RegistryCorrupted(format!(
                "profile {key}: balance table disagrees with token owners"
            )));
        }
        Ok(())
    }
}

/// Outcome of [`FollowRegistry::ensure_deployed`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Deployment {
    /// A contract already existed; nothing changed.
    Existing(ContractRef),
    /// The contract was created by this call.
    Fresh(ContractRef),
}

impl Deployment {
    pub fn contract(&self) -> ContractRef {
        match self {
            Deployment::Existing(contract) | Deployment::Fresh(contract) => *contract,
        }
    }

    pub fn is_fresh(&self) -> bool {
        matches!(self, Deployment::Fresh(_))
    }
}

/// Per-profile follow-credential contracts.
///
/// Reads never deploy. The only path that creates a contract is
/// [`ensure_deployed`](Self::ensure_deployed), which requires `&mut self`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct FollowRegistry {
    credentials: BTreeMap<ProfileId, FollowCredential>,
}

impl FollowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deployed(&self, profile_id: ProfileId) -> bool {
        self.credentials.contains_key(&profile_id)
    }

    pub fn contract_of(&self, profile_id: ProfileId) -> Option<ContractRef> {
        self.credentials.get(&profile_id).map(|c| c.contract)
    }

    pub fn credential(&self, profile_id: ProfileId) -> Option<&FollowCredential> {
        self.credentials.get(&profile_id)
    }

    pub fn balance_of(&self, profile_id: ProfileId, owner: &str) -> u64 {
        self.credentials
            .get(&profile_id)
            .map(|c| c.balance_of(owner))
            .unwrap_or(0)
    }

    /// True iff `owner` holds at least one live credential of `profile_id` right now.
    pub fn is_follower(&self, profile_id: ProfileId, owner: &str) -> bool {
        match self.credentials.get(&profile_id) {
            None => false,
            Some(credential) => credential.balance_of(owner) > 0,
        }
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ProfileId, &FollowCredential)> {
        self.credentials.iter()
    }

    pub fn ensure_deployed(&mut self, profile_id: ProfileId) -> Deployment {
        match self.credentials.entry(profile_id) {
            Entry::Occupied(existing) => Deployment::Existing(existing.get().contract),
            Entry::Vacant(slot) => {
                let contract = slot.insert(FollowCredential::new(profile_id)).contract;
                debug!(profile_id, %contract, "follow credential deployed");
                Deployment::Fresh(contract)
            }
        }
    }

    pub fn mint(&mut self, profile_id: ProfileId, to: &str) -> Result<TokenId> {
        self.credential_mut(profile_id)?.mint(to)
    }

    pub fn transfer(
        &mut self,
        profile_id: ProfileId,
        caller: &str,
        from: &str,
        to: &str,
        token_id: TokenId,
    ) -> Result<()> {
        self.credential_mut(profile_id)?
            .transfer(caller, from, to, token_id)
    }

    pub fn check_invariants(&self) -> Result<()> {
        for (profile_id, credential) in &self.credentials {
            credential.check_invariants(*profile_id)?;
        }
        Ok(())
    }

    fn credential_mut(&mut self, profile_id: ProfileId) -> Result<&mut FollowCredential> {
        self.credentials
            .get_mut(&profile_id)
            .ok_or(GateError::CredentialNotDeployed(profile_id))
    }
}
