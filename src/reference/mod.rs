//! Reference modules: pluggable gates deciding who may comment on or mirror a
//! publication.
//!
//! The hub resolves the module a publication designates and calls it through
//! [`ReferenceModule`]. Modules only ever see a [`ReferenceContext`], which
//! lends them the follow registry read-only.

use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use crate::contracts::FollowRegistry;
use crate::error::{GateError, Result};
use crate::ledger::{ModuleId, ProfileId, PubId};

/// Identifier under which [`FollowerOnlyReferenceModule`] is registered by default.
pub const FOLLOWER_ONLY: &str = "follower-only";

/// Read-only view of hub state handed to a module for one validation.
#[derive(Clone, Copy)]
pub struct ReferenceContext<'a> {
    pub follows: &'a FollowRegistry,
}

impl<'a> ReferenceContext<'a> {
    pub fn new(follows: &'a FollowRegistry) -> Self {
        Self { follows }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        self == Decision::Allow
    }

    /// Maps a denial to [`GateError::FollowInvalid`].
    pub fn into_result(self) -> Result<()> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny => Err(GateError::FollowInvalid),
        }
    }
}

pub trait ReferenceModule: Send + Sync {
    /// Called once when a publication designating this module is created.
    /// Returns the configuration bytes stored alongside the publication.
    fn initialize_publication(
        &self,
        profile_id: ProfileId,
        pub_id: PubId,
        data: &[u8],
    ) -> Result<Vec<u8>>;

    fn validate_comment(
        &self,
        ctx: &ReferenceContext<'_>,
        profile_id_pointed: ProfileId,
        commenter: &str,
        data: &[u8],
    ) -> Result<()>;

    fn validate_mirror(
        &self,
        ctx: &ReferenceContext<'_>,
        profile_id_pointed: ProfileId,
        publisher: &str,
        data: &[u8],
    ) -> Result<()>;
}

/// Allows a comment or mirror only when the acting address currently holds a
/// follow credential of the pointed profile.
///
/// There is no owner bypass: until somebody follows the profile no contract
/// exists and everyone is denied, the profile owner included.
#[derive(Clone, Copy, Debug, Default)]
pub struct FollowerOnlyReferenceModule;

impl FollowerOnlyReferenceModule {
    pub fn new() -> Self {
        Self
    }

    pub fn decide(
        &self,
        follows: &FollowRegistry,
        profile_id_pointed: ProfileId,
        actor: &str,
    ) -> Decision {
        if !follows.deployed(profile_id_pointed) {
            return Decision::Deny;
        }
        if follows.is_follower(profile_id_pointed, actor) {
            Decision::Allow
        } else {
            Decision::Deny
        }
    }
}

impl ReferenceModule for FollowerOnlyReferenceModule {
    fn initialize_publication(
        &self,
        _profile_id: ProfileId,
        _pub_id: PubId,
        _data: &[u8],
    ) -> Result<Vec<u8>> {
        Ok(Vec::new())
    }

    fn validate_comment(
        &self,
        ctx: &ReferenceContext<'_>,
        profile_id_pointed: ProfileId,
        commenter: &str,
        _data: &[u8],
    ) -> Result<()> {
        let decision = self.decide(ctx.follows, profile_id_pointed, commenter);
        debug!(profile_id_pointed, commenter, ?decision, "follower-only comment check");
        decision.into_result()
    }

    fn validate_mirror(
        &self,
        ctx: &ReferenceContext<'_>,
        profile_id_pointed: ProfileId,
        publisher: &str,
        _data: &[u8],
    ) -> Result<()> {
        let decision = self.decide(ctx.follows, profile_id_pointed, publisher);
        debug!(profile_id_pointed, publisher, ?decision, "follower-only mirror check");
        decision.into_result()
    }
}

/// Registered reference modules, keyed by the id publications refer to.
#[derive(Default)]
pub struct ModuleTable {
    modules: BTreeMap<ModuleId, Box<dyn ReferenceModule>>,
}

impl ModuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// A table holding only [`FollowerOnlyReferenceModule`] under [`FOLLOWER_ONLY`].
    pub fn with_follower_only() -> Self {
        let mut modules: BTreeMap<ModuleId, Box<dyn ReferenceModule>> = BTreeMap::new();
        modules.insert(
            FOLLOWER_ONLY.to_string(),
            Box::new(FollowerOnlyReferenceModule::new()),
        );
        Self { modules }
    }

    pub fn register(
        &mut self,
        id: impl Into<ModuleId>,
        module: Box<dyn ReferenceModule>,
    ) -> Result<()> {
        let id = id.into();
        if self.modules.contains_key(&id) {
            return Err(GateError::ModuleAlreadyRegistered(id));
        }
        self.modules.insert(id, module);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<&dyn ReferenceModule> {
        self.modules
            .get(id)
            .map(|module| module.as_ref())
            .ok_or_else(|| GateError::ModuleNotRegistered(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.modules.contains_key(id)
    }

    pub fn ids(&self) -> Vec<ModuleId> {
        self.modules.keys().cloned().collect()
    }
}

impl fmt::Debug for ModuleTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleTable").field("modules", &self.ids()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn followed(profile_id: ProfileId, follower: &str) -> FollowRegistry {
        let mut registry = FollowRegistry::new();
        registry.ensure_deployed(profile_id);
        registry.mint(profile_id, follower).unwrap();
        registry
    }

    #[test]
    fn denies_everyone_before_deployment() {
        let registry = FollowRegistry::new();
        let ctx = ReferenceContext::new(&registry);
        let module = FollowerOnlyReferenceModule::new();
        assert_eq!(module.decide(&registry, 1, "owner"), Decision::Deny);
        let err = module.validate_comment(&ctx, 1, "owner", &[]).unwrap_err();
        assert!(matches!(err, GateError::FollowInvalid));
        let err = module.validate_mirror(&ctx, 1, "owner", &[]).unwrap_err();
        assert!(matches!(err, GateError::FollowInvalid));
    }

    #[test]
    fn deployed_but_not_holding_is_denied() {
        let registry = followed(1, "alice");
        let module = FollowerOnlyReferenceModule::new();
        assert_eq!(module.decide(&registry, 1, "bob"), Decision::Deny);
        assert_eq!(module.decide(&registry, 1, "alice"), Decision::Allow);
    }

    #[test]
    fn comment_and_mirror_share_the_predicate() {
        let registry = followed(1, "alice");
        let ctx = ReferenceContext::new(&registry);
        let module = FollowerOnlyReferenceModule::new();
        for actor in ["alice", "bob"] {
            let comment = module.validate_comment(&ctx, 1, actor, b"ignored").is_ok();
            let mirror = module.validate_mirror(&ctx, 1, actor, &[]).is_ok();
            assert_eq!(comment, mirror);
        }
    }

    #[test]
    fn credential_of_another_profile_does_not_count() {
        let registry = followed(2, "alice");
        let module = FollowerOnlyReferenceModule::new();
        assert_eq!(module.decide(&registry, 1, "alice"), Decision::Deny);
    }

    #[test]
    fn initialization_accepts_any_data() {
        let module = FollowerOnlyReferenceModule::new();
        assert!(module.initialize_publication(1, 1, &[]).unwrap().is_empty());
        let accepted = module.initialize_publication(9, 3, &[0xff; 64]).unwrap();
        assert!(accepted.is_empty());
    }

    #[test]
    fn module_table_rejects_duplicates_and_unknown_ids() {
        let mut table = ModuleTable::new();
        table
            .register(FOLLOWER_ONLY, Box::new(FollowerOnlyReferenceModule))
            .unwrap();
        let err = table
            .register(FOLLOWER_ONLY, Box::new(FollowerOnlyReferenceModule))
            .unwrap_err();
        assert!(matches!(err, GateError::ModuleAlreadyRegistered(_)));
        assert!(table.get(FOLLOWER_ONLY).is_ok());
        assert!(matches!(
            table.get("collect-fee"),
            Err(GateError::ModuleNotRegistered(_))
        ));
        assert_eq!(table.ids(), vec![FOLLOWER_ONLY.to_string()]);
    }

    #[test]
    fn follower_only_table_matches_registered_one() {
        let prebuilt = ModuleTable::with_follower_only();
        let mut registered = ModuleTable::new();
        registered
            .register(FOLLOWER_ONLY, Box::new(FollowerOnlyReferenceModule))
            .unwrap();
        assert_eq!(prebuilt.ids(), registered.ids());
        assert!(prebuilt.get(FOLLOWER_ONLY).is_ok());
    }
}
