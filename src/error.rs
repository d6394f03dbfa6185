use thiserror::Error;

use crate::ledger::{Address, ModuleId, ProfileId, PubId, TokenId};

/// Canonical error type for the hub, the follow registry and reference modules.
#[derive(Debug, Error)]
pub enum GateError {
    /// The acting address holds no live follow credential for the pointed profile,
    /// or no credential contract was ever deployed for it.
    #[error("follow invalid")]
    FollowInvalid,

    #[error("profile {0} does not exist")]
    ProfileNotFound(ProfileId),

    #[error("publication {profile_id}/{pub_id} does not exist")]
    PublicationNotFound { profile_id: ProfileId, pub_id: PubId },

    #[error("{caller} does not own profile {profile_id}")]
    NotProfileOwner { profile_id: ProfileId, caller: Address },

    #[error("no follow credential deployed for profile {0}")]
    CredentialNotDeployed(ProfileId),

    #[error("follow credential {token_id} of profile {profile_id} does not exist")]
    TokenNotFound { profile_id: ProfileId, token_id: TokenId },

    #[error("{caller} may not transfer follow credential {token_id} of profile {profile_id}")]
    NotTokenOwner {
        profile_id: ProfileId,
        token_id: TokenId,
        caller: Address,
    },

    #[error("recipient address is empty")]
    InvalidRecipient,

    #[error("reference module {0} is not registered")]
    ModuleNotRegistered(ModuleId),

    #[error("reference module {0} is already registered")]
    ModuleAlreadyRegistered(ModuleId),

    /// Follow registry invariant breach. Never produced by a healthy hub.
    #[error("follow registry corrupted: {0}")]
    RegistryCorrupted(String),

    #[error("encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl GateError {
    /// Whether the caller can recover by acting differently (following, retrying).
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, GateError::RegistryCorrupted(_))
    }
}

pub type Result<T> = std::result::Result<T, GateError>;
