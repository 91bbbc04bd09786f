//! Player aggregate - one seat at the table within a session
//!
//! # Invariants
//!
//! - `0 <= hp <= max_hp` at all times
//! - `max_hp > 0`, fixed at creation
//! - a player either has no mana pool or `0 <= mp <= max_mp` with `max_mp > 0`
//! - status effects form a set (no duplicate labels)
//! - a resource quantity is negative only if its name is in `allow_negative`

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_objects::PlayerName;

/// Creation-time description of a player.
///
/// Deserializable so outer layers can accept it straight from a request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSpec {
    pub name: String,
    pub max_hp: i32,
    /// Health at creation and after a reset. Defaults to `max_hp`.
    #[serde(default)]
    pub starting_hp: Option<i32>,
    /// Size of the mana pool; `None` for games without mana.
    #[serde(default)]
    pub max_mp: Option<i32>,
    /// Mana at creation and after a reset. Defaults to `max_mp`.
    #[serde(default)]
    pub starting_mp: Option<i32>,
    #[serde(default)]
    pub resources: BTreeMap<String, i64>,
    /// Resource names that may go below zero (debts, negative victory points).
    #[serde(default)]
    pub allow_negative: BTreeSet<String>,
}

impl PlayerSpec {
    pub fn new(name: impl Into<String>, max_hp: i32) -> Self {
        Self {
            name: name.into(),
            max_hp,
            starting_hp: None,
            max_mp: None,
            starting_mp: None,
            resources: BTreeMap::new(),
            allow_negative: BTreeSet::new(),
        }
    }

    pub fn with_starting_hp(mut self, hp: i32) -> Self {
        self.starting_hp = Some(hp);
        self
    }

    pub fn with_mana(mut self, max_mp: i32) -> Self {
        self.max_mp = Some(max_mp);
        self
    }

    pub fn with_starting_mp(mut self, mp: i32) -> Self {
        self.starting_mp = Some(mp);
        self
    }

    pub fn with_resource(mut self, name: impl Into<String>, quantity: i64) -> Self {
        self.resources.insert(name.into(), quantity);
        self
    }

    pub fn allowing_negative(mut self, resource: impl Into<String>) -> Self {
        self.allow_negative.insert(resource.into());
        self
    }
}

/// Optional mana, clamped like health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManaPool {
    pub mp: i32,
    pub max_mp: i32,
    pub starting_mp: i32,
}

/// A player's live state within a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    name: PlayerName,
    hp: i32,
    max_hp: i32,
    starting_hp: i32,
    #[serde(default)]
    mana: Option<ManaPool>,
    status_effects: BTreeSet<String>,
    resources: BTreeMap<String, i64>,
    starting_resources: BTreeMap<String, i64>,
    allow_negative: BTreeSet<String>,
}

impl Player {
    /// Build a player from its creation spec.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the name is invalid, `max_hp` is not
    /// positive, `starting_hp` falls outside `0..=max_hp`, the mana pool is
    /// inconsistent, a resource name is blank, or a starting resource is
    /// negative without being allow-negative. A starting hp of 0 creates a
    /// downed player.
    pub fn from_spec(spec: PlayerSpec) -> Result<Self, DomainError> {
        let name = PlayerName::new(spec.name)?;
        if spec.max_hp <= 0 {
            return Err(DomainError::validation(format!(
                "Player '{}' must have positive max_hp, got {}",
                name, spec.max_hp
            )));
        }
        let starting_hp = spec.starting_hp.unwrap_or(spec.max_hp);
        if !(0..=spec.max_hp).contains(&starting_hp) {
            return Err(DomainError::validation(format!(
                "Player '{}' starting hp {} must be within 0..={}",
                name, starting_hp, spec.max_hp
            )));
        }
        let mana = mana_pool(&name, spec.max_mp, spec.starting_mp)?;

        let allow_negative: BTreeSet<String> = spec
            .allow_negative
            .into_iter()
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect();

        let mut resources = BTreeMap::new();
        for (resource, quantity) in spec.resources {
            let resource = resource.trim().to_string();
            if resource.is_empty() {
                return Err(DomainError::validation(format!(
                    "Player '{}' has a resource with an empty name",
                    name
                )));
            }
            if quantity < 0 && !allow_negative.contains(&resource) {
                return Err(DomainError::validation(format!(
                    "Player '{}' cannot start with negative {} ({})",
                    name, resource, quantity
                )));
            }
            resources.insert(resource, quantity);
        }

        Ok(Self {
            name,
            hp: starting_hp,
            max_hp: spec.max_hp,
            starting_hp,
            mana,
            status_effects: BTreeSet::new(),
            starting_resources: resources.clone(),
            resources,
            allow_negative,
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn name(&self) -> &PlayerName {
        &self.name
    }

    #[inline]
    pub fn hp(&self) -> i32 {
        self.hp
    }

    #[inline]
    pub fn max_hp(&self) -> i32 {
        self.max_hp
    }

    #[inline]
    pub fn starting_hp(&self) -> i32 {
        self.starting_hp
    }

    pub fn mana(&self) -> Option<&ManaPool> {
        self.mana.as_ref()
    }

    pub fn status_effects(&self) -> &BTreeSet<String> {
        &self.status_effects
    }

    pub fn has_effect(&self, effect: &str) -> bool {
        self.status_effects.contains(effect)
    }

    pub fn resources(&self) -> &BTreeMap<String, i64> {
        &self.resources
    }

    /// Current quantity of a resource. Untracked resources read as zero.
    pub fn resource(&self, name: &str) -> i64 {
        self.resources.get(name).copied().unwrap_or(0)
    }

    pub fn starting_resources(&self) -> &BTreeMap<String, i64> {
        &self.starting_resources
    }

    pub fn allows_negative(&self, resource: &str) -> bool {
        self.allow_negative.contains(resource)
    }

    // =========================================================================
    // Mutations (transition engine only)
    // =========================================================================

    /// Set health, clamped into `0..=max_hp`.
    pub(crate) fn set_hp(&mut self, hp: i32) {
        self.hp = hp.clamp(0, self.max_hp);
    }

    /// Set mana, clamped into `0..=max_mp`. No-op without a pool.
    pub(crate) fn set_mp(&mut self, mp: i32) {
        if let Some(pool) = &mut self.mana {
            pool.mp = mp.clamp(0, pool.max_mp);
        }
    }

    /// Returns false if the effect was already present.
    pub(crate) fn insert_effect(&mut self, effect: String) -> bool {
        self.status_effects.insert(effect)
    }

    /// Returns false if the effect was absent.
    pub(crate) fn remove_effect(&mut self, effect: &str) -> bool {
        self.status_effects.remove(effect)
    }

    pub(crate) fn set_resource(&mut self, resource: String, quantity: i64) {
        self.resources.insert(resource, quantity);
    }

    /// Back to creation-time health and resources with no effects.
    pub(crate) fn reset(&mut self) {
        self.hp = self.starting_hp;
        if let Some(pool) = &mut self.mana {
            pool.mp = pool.starting_mp;
        }
        self.status_effects.clear();
        self.resources = self.starting_resources.clone();
    }

    pub(crate) fn invariants_hold(&self) -> bool {
        let hp_ok = (0..=self.max_hp).contains(&self.hp);
        let mana_ok = self
            .mana
            .map_or(true, |pool| (0..=pool.max_mp).contains(&pool.mp));
        let resources_ok = self
            .resources
            .iter()
            .all(|(name, qty)| *qty >= 0 || self.allow_negative.contains(name));
        hp_ok && mana_ok && resources_ok
    }
}

fn mana_pool(
    name: &PlayerName,
    max_mp: Option<i32>,
    starting_mp: Option<i32>,
) -> Result<Option<ManaPool>, DomainError> {
    let Some(max_mp) = max_mp else {
        if starting_mp.is_some() {
            return Err(DomainError::validation(format!(
                "Player '{}' has starting mp but no max_mp",
                name
            )));
        }
        return Ok(None);
    };
    if max_mp <= 0 {
        return Err(DomainError::validation(format!(
            "Player '{}' must have positive max_mp, got {}",
            name, max_mp
        )));
    }
    let starting_mp = starting_mp.unwrap_or(max_mp);
    if !(0..=max_mp).contains(&starting_mp) {
        return Err(DomainError::validation(format!(
            "Player '{}' starting mp {} must be within 0..={}",
            name, starting_mp, max_mp
        )));
    }
    Ok(Some(ManaPool {
        mp: starting_mp,
        max_mp,
        starting_mp,
    }))
}
