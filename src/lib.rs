//! Follower-only gating for a social-graph publication hub.
//!
//! * [`contracts`] — per-profile follow credentials, the registry that owns
//!   them and its idempotent lazy deployer.
//! * [`reference`] — the reference-module interface and the follower-only
//!   module that allows a comment or mirror only to current credential holders.
//! * [`ledger`] — hub state, actions and events.
//! * [`hub`] — the dispatcher executing each action atomically.
//! * [`receipt`] — hashed, chained receipts for executed actions.
//! * [`config`] — JSON hub configuration.
//!
//! Follower status is read from live ownership on every validation. Sending a
//! credential away revokes the right to comment; receiving one restores it.

pub mod config;
pub mod contracts;
pub mod error;
pub mod hub;
pub mod ledger;
pub mod receipt;
pub mod reference;

pub use contracts::{ContractRef, Deployment, FollowCredential, FollowRegistry};
pub use error::{GateError, Result};
pub use hub::Hub;
pub use ledger::{Address, HubAction, LedgerEvent, ModuleId, ProfileId, PubId, TokenId};
pub use reference::{
    Decision, FollowerOnlyReferenceModule, ReferenceContext, ReferenceModule, FOLLOWER_ONLY,
};
