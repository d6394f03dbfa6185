use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::contracts::{ContractRef, FollowRegistry};
use crate::error::{GateError, Result};
use crate::reference::{ModuleTable, ReferenceContext};

pub type Address = String;
pub type ProfileId = u64;
pub type PubId = u64;
pub type TokenId = u64;
pub type ModuleId = String;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    pub id: ProfileId,
    pub owner: Address,
    pub pub_count: PubId,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PublicationKind {
    Post,
    Comment {
        profile_id_pointed: ProfileId,
        pub_id_pointed: PubId,
    },
    Mirror {
        profile_id_pointed: ProfileId,
        pub_id_pointed: PubId,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Publication {
    pub profile_id: ProfileId,
    pub pub_id: PubId,
    pub kind: PublicationKind,
    pub content_uri: Option<String>,
    pub reference_module: Option<ModuleId>,
    #[serde(with = "crate::receipt::serde_bytes")]
    pub reference_module_data: Vec<u8>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SnapshotMetadata {
    pub height: u64,
    pub timestamp: u64,
    pub previous_receipt: Option<[u8; 32]>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerSnapshot {
    pub meta: SnapshotMetadata,
    pub profiles: BTreeMap<ProfileId, Profile>,
    pub publications: usize,
    pub follows: FollowRegistry,
    pub events: Vec<LedgerEvent>,
    pub state_root: [u8; 32],
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEvent {
    ProfileCreated {
        profile_id: ProfileId,
        to: Address,
    },
    FollowCredentialDeployed {
        profile_id: ProfileId,
        contract: ContractRef,
    },
    FollowCredentialMinted {
        profile_id: ProfileId,
        token_id: TokenId,
        to: Address,
    },
    FollowCredentialTransferred {
        profile_id: ProfileId,
        token_id: TokenId,
        from: Address,
        to: Address,
    },
    Followed {
        follower: Address,
        profile_ids: Vec<ProfileId>,
    },
    PostCreated {
        profile_id: ProfileId,
        pub_id: PubId,
        content_uri: String,
        reference_module: Option<ModuleId>,
        #[serde(with = "crate::receipt::serde_bytes")]
        reference_module_data: Vec<u8>,
        timestamp: u64,
    },
    CommentCreated {
        profile_id: ProfileId,
        pub_id: PubId,
        content_uri: String,
        profile_id_pointed: ProfileId,
        pub_id_pointed: PubId,
        reference_module: Option<ModuleId>,
        #[serde(with = "crate::receipt::serde_bytes")]
        reference_module_data: Vec<u8>,
        timestamp: u64,
    },
    MirrorCreated {
        profile_id: ProfileId,
        pub_id: PubId,
        profile_id_pointed: ProfileId,
        pub_id_pointed: PubId,
        reference_module: Option<ModuleId>,
        #[serde(with = "crate::receipt::serde_bytes")]
        reference_module_data: Vec<u8>,
        timestamp: u64,
    },
}

/// An action submitted to the hub by a sender.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HubAction {
    CreateProfile {
        to: Address,
    },
    Post {
        profile_id: ProfileId,
        content_uri: String,
        #[serde(default)]
        reference_module: Option<ModuleId>,
        #[serde(default, with = "crate::receipt::serde_bytes")]
        reference_module_data: Vec<u8>,
    },
    Comment {
        profile_id: ProfileId,
        content_uri: String,
        profile_id_pointed: ProfileId,
        pub_id_pointed: PubId,
        #[serde(default)]
        reference_module: Option<ModuleId>,
        #[serde(default, with = "crate::receipt::serde_bytes")]
        reference_module_data: Vec<u8>,
        #[serde(default, with = "crate::receipt::serde_bytes")]
        reference_validation_data: Vec<u8>,
    },
    Mirror {
        profile_id: ProfileId,
        profile_id_pointed: ProfileId,
        pub_id_pointed: PubId,
        #[serde(default)]
        reference_module: Option<ModuleId>,
        #[serde(default, with = "crate::receipt::serde_bytes")]
        reference_module_data: Vec<u8>,
        #[serde(default, with = "crate::receipt::serde_bytes")]
        reference_validation_data: Vec<u8>,
    },
    Follow {
        profile_ids: Vec<ProfileId>,
    },
    TransferFollowCredential {
        profile_id: ProfileId,
        from: Address,
        to: Address,
        token_id: TokenId,
    },
}

impl HubAction {
    pub fn name(&self) -> &'static str {
        match self {
            HubAction::CreateProfile { .. } => "create_profile",
            HubAction::Post { .. } => "post",
            HubAction::Comment { .. } => "comment",
            HubAction::Mirror { .. } => "mirror",
            HubAction::Follow { .. } => "follow",
            HubAction::TransferFollowCredential { .. } => "transfer_follow_credential",
        }
    }
}

/// Committed hub state. Mutated only through [`LedgerState::apply`].
#[derive(Clone, Debug, Default)]
pub struct LedgerState {
    pub meta: SnapshotMetadata,
    pub profiles: BTreeMap<ProfileId, Profile>,
    pub publications: BTreeMap<(ProfileId, PubId), Publication>,
    pub follows: FollowRegistry,
    pub events: Vec<LedgerEvent>,
}

impl LedgerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn profile(&self, profile_id: ProfileId) -> Result<&Profile> {
        self.profiles
            .get(&profile_id)
            .ok_or(GateError::ProfileNotFound(profile_id))
    }

    pub fn publication(&self, profile_id: ProfileId, pub_id: PubId) -> Result<&Publication> {
        self.publications
            .get(&(profile_id, pub_id))
            .ok_or(GateError::PublicationNotFound { profile_id, pub_id })
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            meta: self.meta.clone(),
            profiles: self.profiles.clone(),
            publications: self.publications.len(),
            follows: self.follows.clone(),
            events: self.events.clone(),
            state_root: self.state_root(),
        }
    }

    pub fn state_root(&self) -> [u8; 32] {
        compute_state_root(&self.profiles, &self.publications, &self.follows)
    }

    /// Working copy for one action. The event log is left behind; only the
    /// events the action emits end up in the copy.
    pub fn stage(&self) -> Self {
        Self {
            meta: self.meta.clone(),
            profiles: self.profiles.clone(),
            publications: self.publications.clone(),
            follows: self.follows.clone(),
            events: Vec::new(),
        }
    }

    /// Adopts a copy made by [`LedgerState::stage`], appending its events to
    /// the log kept here.
    pub fn commit(&mut self, mut staged: Self) {
        let mut events = std::mem::take(&mut self.events);
        events.append(&mut staged.events);
        staged.events = events;
        *self = staged;
    }

    /// Applies one action in place and returns the events it emitted.
    ///
    /// On error `self` may be partially modified; callers apply to a staged copy
    /// and drop it on failure (see [`crate::hub::Hub`]).
    pub fn apply(
        &mut self,
        modules: &ModuleTable,
        sender: &str,
        action: &HubAction,
        timestamp: u64,
    ) -> Result<Vec<LedgerEvent>> {
        let mut emitted = Vec::new();
        match action {
            HubAction::CreateProfile { to } => {
                if to.is_empty() {
                    return Err(GateError::InvalidRecipient);
                }
                let profile_id = self.profiles.len() as ProfileId + 1;
                self.profiles.insert(
                    profile_id,
                    Profile {
                        id: profile_id,
                        owner: to.clone(),
                        pub_count: 0,
                    },
                );
                emitted.push(LedgerEvent::ProfileCreated {
                    profile_id,
                    to: to.clone(),
                });
            }
            HubAction::Post {
                profile_id,
                content_uri,
                reference_module,
                reference_module_data,
            } => {
                self.ensure_owner(*profile_id, sender)?;
                let pub_id = self.profile(*profile_id)?.pub_count + 1;
                let module_data = init_reference_module(
                    modules,
                    reference_module,
                    *profile_id,
                    pub_id,
                    reference_module_data,
                )?;
                self.insert_publication(Publication {
                    profile_id: *profile_id,
                    pub_id,
                    kind: PublicationKind::Post,
                    content_uri: Some(content_uri.clone()),
                    reference_module: reference_module.clone(),
                    reference_module_data: module_data.clone(),
                })?;
                emitted.push(LedgerEvent::PostCreated {
                    profile_id: *profile_id,
                    pub_id,
                    content_uri: content_uri.clone(),
                    reference_module: reference_module.clone(),
                    reference_module_data: module_data,
                    timestamp,
                });
            }
            HubAction::Comment {
                profile_id,
                content_uri,
                profile_id_pointed,
                pub_id_pointed,
                reference_module,
                reference_module_data,
                reference_validation_data,
            } => {
                let commenter = self.ensure_owner(*profile_id, sender)?.owner.clone();
                let pointed_module = self
                    .publication(*profile_id_pointed, *pub_id_pointed)?
                    .reference_module
                    .clone();
                if let Some(module_id) = &pointed_module {
                    let ctx = ReferenceContext::new(&self.follows);
                    modules.get(module_id)?.validate_comment(
                        &ctx,
                        *profile_id_pointed,
                        &commenter,
                        reference_validation_data,
                    )?;
                }
                let pub_id = self.profile(*profile_id)?.pub_count + 1;
                let module_data = init_reference_module(
                    modules,
                    reference_module,
                    *profile_id,
                    pub_id,
                    reference_module_data,
                )?;
                self.insert_publication(Publication {
                    profile_id: *profile_id,
                    pub_id,
                    kind: PublicationKind::Comment {
                        profile_id_pointed: *profile_id_pointed,
                        pub_id_pointed: *pub_id_pointed,
                    },
                    content_uri: Some(content_uri.clone()),
                    reference_module: reference_module.clone(),
                    reference_module_data: module_data.clone(),
                })?;
                emitted.push(LedgerEvent::CommentCreated {
                    profile_id: *profile_id,
                    pub_id,
                    content_uri: content_uri.clone(),
                    profile_id_pointed: *profile_id_pointed,
                    pub_id_pointed: *pub_id_pointed,
                    reference_module: reference_module.clone(),
                    reference_module_data: module_data,
                    timestamp,
                });
            }
            HubAction::Mirror {
                profile_id,
                profile_id_pointed,
                pub_id_pointed,
                reference_module,
                reference_module_data,
                reference_validation_data,
            } => {
                let publisher = self.ensure_owner(*profile_id, sender)?.owner.clone();
                let (root_profile, root_pub) = self.root_of(*profile_id_pointed, *pub_id_pointed)?;
                let root_module = self
                    .publication(root_profile, root_pub)?
                    .reference_module
                    .clone();
                if let Some(module_id) = &root_module {
                    let ctx = ReferenceContext::new(&self.follows);
                    modules.get(module_id)?.validate_mirror(
                        &ctx,
                        root_profile,
                        &publisher,
                        reference_validation_data,
                    )?;
                }
                let pub_id = self.profile(*profile_id)?.pub_count + 1;
                let module_data = init_reference_module(
                    modules,
                    reference_module,
                    *profile_id,
                    pub_id,
                    reference_module_data,
                )?;
                self.insert_publication(Publication {
                    profile_id: *profile_id,
                    pub_id,
                    kind: PublicationKind::Mirror {
                        profile_id_pointed: root_profile,
                        pub_id_pointed: root_pub,
                    },
                    content_uri: None,
                    reference_module: reference_module.clone(),
                    reference_module_data: module_data.clone(),
                })?;
                emitted.push(LedgerEvent::MirrorCreated {
                    profile_id: *profile_id,
                    pub_id,
                    profile_id_pointed: root_profile,
                    pub_id_pointed: root_pub,
                    reference_module: reference_module.clone(),
                    reference_module_data: module_data,
                    timestamp,
                });
            }
            HubAction::Follow { profile_ids } => {
                for profile_id in profile_ids {
                    self.profile(*profile_id)?;
                    let deployment = self.follows.ensure_deployed(*profile_id);
                    if deployment.is_fresh() {
                        emitted.push(LedgerEvent::FollowCredentialDeployed {
                            profile_id: *profile_id,
                            contract: deployment.contract(),
                        });
                    }
                    let token_id = self.follows.mint(*profile_id, sender)?;
                    emitted.push(LedgerEvent::FollowCredentialMinted {
                        profile_id: *profile_id,
                        token_id,
                        to: sender.to_string(),
                    });
                }
                emitted.push(LedgerEvent::Followed {
                    follower: sender.to_string(),
                    profile_ids: profile_ids.clone(),
                });
            }
            HubAction::TransferFollowCredential {
                profile_id,
                from,
                to,
                token_id,
            } => {
                self.follows.transfer(*profile_id, sender, from, to, *token_id)?;
                emitted.push(LedgerEvent::FollowCredentialTransferred {
                    profile_id: *profile_id,
                    token_id: *token_id,
                    from: from.clone(),
                    to: to.clone(),
                });
            }
        }

        debug!(action = action.name(), sender, events = emitted.len(), "action applied");
        self.events.extend(emitted.iter().cloned());
        Ok(emitted)
    }

    fn ensure_owner(&self, profile_id: ProfileId, sender: &str) -> Result<&Profile> {
        let profile = self.profile(profile_id)?;
        if profile.owner != sender {
            return Err(GateError::NotProfileOwner {
                profile_id,
                caller: sender.to_string(),
            });
        }
        Ok(profile)
    }

    /// Mirrors always point at the publication they mirror, never at another mirror.
    fn root_of(&self, profile_id: ProfileId, pub_id: PubId) -> Result<(ProfileId, PubId)> {
        match self.publication(profile_id, pub_id)?.kind {
            PublicationKind::Mirror {
                profile_id_pointed,
                pub_id_pointed,
            } => Ok((profile_id_pointed, pub_id_pointed)),
            _ => Ok((profile_id, pub_id)),
        }
    }

    fn insert_publication(&mut self, publication: Publication) -> Result<()> {
        let profile = self
            .profiles
            .get_mut(&publication.profile_id)
            .ok_or(GateError::ProfileNotFound(publication.profile_id))?;
        profile.pub_count = publication.pub_id;
        self.publications
            .insert((publication.profile_id, publication.pub_id), publication);
        Ok(())
    }
}

fn init_reference_module(
    modules: &ModuleTable,
    reference_module: &Option<ModuleId>,
    profile_id: ProfileId,
    pub_id: PubId,
    data: &[u8],
) -> Result<Vec<u8>> {
    match reference_module {
        Some(module_id) => modules
            .get(module_id)?
            .initialize_publication(profile_id, pub_id, data),
        None => Ok(Vec::new()),
    }
}

fn compute_state_root(
    profiles: &BTreeMap<ProfileId, Profile>,
    publications: &BTreeMap<(ProfileId, PubId), Publication>,
    follows: &FollowRegistry,
) -> [u8; 32] {
    let mut leaves: Vec<[u8; 32]> = Vec::new();
    for (profile_id, profile) in profiles {
        let mut hasher = Sha256::new();
        hasher.update(b"profile");
        hasher.update(profile_id.to_le_bytes());
        hasher.update(profile.owner.as_bytes());
        hasher.update(profile.pub_count.to_le_bytes());
        leaves.push(hasher.finalize().into());
    }
    for ((profile_id, pub_id), publication) in publications {
        let mut hasher = Sha256::new();
        hasher.update(b"publication");
        hasher.update(profile_id.to_le_bytes());
        hasher.update(pub_id.to_le_bytes());
        if let Some(module_id) = &publication.reference_module {
            hasher.update(module_id.as_bytes());
        }
        hasher.update(&publication.reference_module_data);
        leaves.push(hasher.finalize().into());
    }
    for (profile_id, credential) in follows.iter() {
        for (token_id, holder) in credential.holders() {
            let mut hasher = Sha256::new();
            hasher.update(b"credential");
            hasher.update(credential.contract.as_bytes());
            hasher.update(profile_id.to_le_bytes());
            hasher.update(token_id.to_le_bytes());
            hasher.update(holder.as_bytes());
            leaves.push(hasher.finalize().into());
        }
    }
    build_merkle(leaves)
}

fn build_merkle(mut leaves: Vec<[u8; 32]>) -> [u8; 32] {
    if leaves.is_empty() {
        return Sha256::digest(b"follow-gate-empty").into();
    }
    while leaves.len() > 1 {
        let mut next = Vec::with_capacity((leaves.len() + 1) / 2);
        for chunk in leaves.chunks(2) {
            let mut hasher = Sha256::new();
            hasher.update(b"node");
            hasher.update(chunk[0]);
            if chunk.len() == 2 {
                hasher.update(chunk[1]);
            } else {
                hasher.update(chunk[0]);
            }
            next.push(hasher.finalize().into());
        }
        leaves = next;
    }
    leaves[0]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::{FollowerOnlyReferenceModule, FOLLOWER_ONLY};

    fn modules() -> ModuleTable {
        let mut table = ModuleTable::new();
        table
            .register(FOLLOWER_ONLY, Box::new(FollowerOnlyReferenceModule))
            .unwrap();
        table
    }

    fn with_gated_post(modules: &ModuleTable) -> LedgerState {
        let mut ledger = LedgerState::new();
        ledger
            .apply(modules, "gov", &HubAction::CreateProfile { to: "alice".into() }, 1)
            .unwrap();
        ledger
            .apply(
                modules,
                "alice",
                &HubAction::Post {
                    profile_id: 1,
                    content_uri: "ipfs://post".into(),
                    reference_module: Some(FOLLOWER_ONLY.into()),
                    reference_module_data: vec![],
                },
                2,
            )
            .unwrap();
        ledger
    }

    fn comment(profile_id: ProfileId) -> HubAction {
        HubAction::Comment {
            profile_id,
            content_uri: "ipfs://comment".into(),
            profile_id_pointed: 1,
            pub_id_pointed: 1,
            reference_module: None,
            reference_module_data: vec![],
            reference_validation_data: vec![],
        }
    }

    #[test]
    fn state_root_is_deterministic() {
        let modules = modules();
        let ledger = with_gated_post(&modules);
        assert_eq!(ledger.snapshot().state_root, ledger.snapshot().state_root);
        assert_ne!(ledger.snapshot().state_root, LedgerState::new().snapshot().state_root);
    }

    #[test]
    fn staged_copy_starts_with_empty_log_and_commit_appends() {
        let modules = modules();
        let mut ledger = with_gated_post(&modules);
        let mut staged = ledger.stage();
        assert!(staged.events.is_empty());
        assert_eq!(staged.state_root(), ledger.state_root());

        let follow = HubAction::Follow {
            profile_ids: vec![1],
        };
        let emitted = staged.apply(&modules, "bob", &follow, 3).unwrap();
        assert_eq!(staged.events, emitted);
        ledger.commit(staged);
        assert_eq!(ledger.events.len(), 2 + emitted.len());
        assert_eq!(ledger.events[2..], emitted[..]);
        assert!(ledger.follows.is_follower(1, "bob"));
    }

    #[test]
    fn post_emits_single_event_and_stores_module() {
        let modules = modules();
        let ledger = with_gated_post(&modules);
        let publication = ledger.publication(1, 1).unwrap();
        assert_eq!(publication.reference_module.as_deref(), Some(FOLLOWER_ONLY));
        assert!(publication.reference_module_data.is_empty());
        assert_eq!(ledger.profile(1).unwrap().pub_count, 1);
        assert_eq!(ledger.events.len(), 2);
        assert!(matches!(
            ledger.events[1],
            LedgerEvent::PostCreated {
                pub_id: 1,
                timestamp: 2,
                ..
            }
        ));
    }

    #[test]
    fn follow_deploys_once_and_mints_sequentially() {
        let modules = modules();
        let mut ledger = with_gated_post(&modules);
        let first = ledger
            .apply(&modules, "bob", &HubAction::Follow { profile_ids: vec![1] }, 3)
            .unwrap();
        assert_eq!(first.len(), 3);
        assert!(matches!(first[0], LedgerEvent::FollowCredentialDeployed { profile_id: 1, .. }));
        let second = ledger
            .apply(&modules, "carol", &HubAction::Follow { profile_ids: vec![1] }, 4)
            .unwrap();
        assert_eq!(second.len(), 2);
        assert!(matches!(second[0], LedgerEvent::FollowCredentialMinted { token_id: 2, .. }));
        assert_eq!(ledger.follows.len(), 1);
    }

    #[test]
    fn comment_requires_live_credential() {
        let modules = modules();
        let mut ledger = with_gated_post(&modules);
        let err = ledger.apply(&modules, "alice", &comment(1), 3).unwrap_err();
        assert!(matches!(err, GateError::FollowInvalid));

        ledger
            .apply(&modules, "alice", &HubAction::Follow { profile_ids: vec![1] }, 4)
            .unwrap();
        let events = ledger.apply(&modules, "alice", &comment(1), 5).unwrap();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], LedgerEvent::CommentCreated { pub_id: 2, .. }));
    }

    #[test]
    fn comment_checks_profile_ownership_and_target() {
        let modules = modules();
        let mut ledger = with_gated_post(&modules);
        let err = ledger.apply(&modules, "mallory", &comment(1), 3).unwrap_err();
        assert!(matches!(err, GateError::NotProfileOwner { profile_id: 1, .. }));
        let err = ledger.apply(&modules, "alice", &comment(2), 3).unwrap_err();
        assert!(matches!(err, GateError::ProfileNotFound(2)));

        let missing = HubAction::Comment {
            profile_id: 1,
            content_uri: "ipfs://comment".into(),
            profile_id_pointed: 1,
            pub_id_pointed: 5,
            reference_module: None,
            reference_module_data: vec![],
            reference_validation_data: vec![],
        };
        let err = ledger.apply(&modules, "alice", &missing, 3).unwrap_err();
        assert!(matches!(err, GateError::PublicationNotFound { pub_id: 5, .. }));
    }

    #[test]
    fn mirror_of_mirror_points_at_root() {
        let modules = modules();
        let mut ledger = with_gated_post(&modules);
        ledger
            .apply(&modules, "alice", &HubAction::Follow { profile_ids: vec![1] }, 3)
            .unwrap();
        let mirror = |pub_id_pointed| HubAction::Mirror {
            profile_id: 1,
            profile_id_pointed: 1,
            pub_id_pointed,
            reference_module: None,
            reference_module_data: vec![],
            reference_validation_data: vec![],
        };
        ledger.apply(&modules, "alice", &mirror(1), 4).unwrap();
        let events = ledger.apply(&modules, "alice", &mirror(2), 5).unwrap();
        assert!(matches!(
            events[0],
            LedgerEvent::MirrorCreated {
                pub_id: 3,
                profile_id_pointed: 1,
                pub_id_pointed: 1,
                ..
            }
        ));
    }

    #[test]
    fn unregistered_module_rejects_post() {
        let modules = modules();
        let mut ledger = with_gated_post(&modules);
        let err = ledger
            .apply(
                &modules,
                "alice",
                &HubAction::Post {
                    profile_id: 1,
                    content_uri: "ipfs://post".into(),
                    reference_module: Some("unknown".into()),
                    reference_module_data: vec![],
                },
                3,
            )
            .unwrap_err();
        assert!(matches!(err, GateError::ModuleNotRegistered(_)));
    }

    #[test]
    fn comment_action_parses_with_defaults() {
        let raw = r#"{
            "type": "comment",
            "profile_id": 1,
            "content_uri": "ipfs://comment",
            "profile_id_pointed": 1,
            "pub_id_pointed": 1
        }"#;
        let action: HubAction = serde_json::from_str(raw).unwrap();
        assert_eq!(action, comment(1));

        let raw = r#"{
            "type": "post",
            "profile_id": 1,
            "content_uri": "x",
            "reference_module_data": "0xff"
        }"#;
        let action: HubAction = serde_json::from_str(raw).unwrap();
        match action {
            HubAction::Post {
                reference_module,
                reference_module_data,
                ..
            } => {
                assert_eq!(reference_module, None);
                assert_eq!(reference_module_data, vec![0xff]);
            }
            other => panic!("unexpected action {other:?}"),
        }
    }
}
