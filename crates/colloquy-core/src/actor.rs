//! Actors and the population they are selected from
//!
//! An actor is anything that can start a conversation. The population is
//! kept in an insertion-ordered map so every participant scans it in the
//! same order.

use crate::ActorId;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

/// Mutually exclusive population classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PopulationGroup {
    /// Members of the home group; their total is the preferred baseline
    Primary,
    /// Subordinate members bound to the home group
    Subordinate,
    /// Held against their will
    Captive,
    /// Guests and traders
    Visiting,
    /// Enemies present in the area
    Hostile,
}

impl PopulationGroup {
    /// Every group, in the order totals are reported
    pub const ALL: [PopulationGroup; 5] = [
        PopulationGroup::Primary,
        PopulationGroup::Subordinate,
        PopulationGroup::Captive,
        PopulationGroup::Visiting,
        PopulationGroup::Hostile,
    ];

    /// Dense index for per-group arrays
    pub fn index(self) -> usize {
        match self {
            PopulationGroup::Primary => 0,
            PopulationGroup::Subordinate => 1,
            PopulationGroup::Captive => 2,
            PopulationGroup::Visiting => 3,
            PopulationGroup::Hostile => 4,
        }
    }
}

/// An actor as seen by the selector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    /// Stable key
    pub id: ActorId,
    /// Display name, also used as the speaker name in payloads
    pub name: String,
    /// Current classification
    pub group: PopulationGroup,
    /// Non-negative, finite selection weight
    #[serde(deserialize_with = "deserialize_weight")]
    selection_weight: f64,
}

impl Actor {
    /// Create a new actor
    pub fn new(id: ActorId, name: impl Into<String>, group: PopulationGroup, weight: f64) -> Self {
        Self {
            id,
            name: name.into(),
            group,
            selection_weight: sanitize_weight(weight),
        }
    }

    /// Selection weight, always finite and non-negative
    pub fn selection_weight(&self) -> f64 {
        self.selection_weight
    }
}

/// Registry of actors in a stable, deterministic order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Population {
    actors: IndexMap<ActorId, Actor>,
}

impl Population {
    /// Create an empty population
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an actor; a replaced actor keeps its position
    pub fn upsert(&mut self, actor: Actor) {
        self.actors.insert(actor.id, actor);
    }

    /// Remove an actor, preserving the order of the rest
    pub fn remove(&mut self, id: ActorId) -> Option<Actor> {
        self.actors.shift_remove(&id)
    }

    /// Look up an actor
    pub fn get(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(&id)
    }

    /// Find an actor by display name
    pub fn find_by_name(&self, name: &str) -> Option<&Actor> {
        self.actors.values().find(|a| a.name == name)
    }

    /// Whether the actor is present
    pub fn contains(&self, id: ActorId) -> bool {
        self.actors.contains_key(&id)
    }

    /// Update an actor's weight; returns false if unknown
    pub fn set_weight(&mut self, id: ActorId, weight: f64) -> bool {
        match self.actors.get_mut(&id) {
            Some(actor) => {
                actor.selection_weight = sanitize_weight(weight);
                true
            }
            None => false,
        }
    }

    /// Reclassify an actor; returns false if unknown
    pub fn set_group(&mut self, id: ActorId, group: PopulationGroup) -> bool {
        match self.actors.get_mut(&id) {
            Some(actor) => {
                actor.group = group;
                true
            }
            None => false,
        }
    }

    /// Actors in stable order
    pub fn iter(&self) -> impl Iterator<Item = &Actor> {
        self.actors.values()
    }

    /// Number of actors
    pub fn len(&self) -> usize {
        self.actors.len()
    }

    /// Whether there are no actors
    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    /// Remove every actor
    pub fn clear(&mut self) {
        self.actors.clear();
    }
}

impl FromIterator<Actor> for Population {
    fn from_iter<I: IntoIterator<Item = Actor>>(iter: I) -> Self {
        let mut population = Population::new();
        for actor in iter {
            population.upsert(actor);
        }
        population
    }
}

fn sanitize_weight(weight: f64) -> f64 {
    if weight.is_finite() && weight > 0.0 {
        weight
    } else {
        0.0
    }
}

fn deserialize_weight<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    f64::deserialize(deserializer).map(sanitize_weight)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(id: u64, name: &str) -> Actor {
        Actor::new(ActorId::new(id), name, PopulationGroup::Primary, 1.0)
    }

    #[test]
    fn test_order_is_stable() {
        let mut population: Population = [actor(3, "c"), actor(1, "a"), actor(2, "b")]
            .into_iter()
            .collect();

        let ids: Vec<u64> = population.iter().map(|a| a.id.raw()).collect();
        assert_eq!(ids, vec![3, 1, 2]);

        // Replacing keeps the slot, removal keeps the rest in order
        population.upsert(actor(1, "a2"));
        population.remove(ActorId::new(3));
        let names: Vec<&str> = population.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["a2", "b"]);
    }

    #[test]
    fn test_weight_sanitized() {
        let mut population = Population::new();
        population.upsert(Actor::new(ActorId::new(1), "a", PopulationGroup::Hostile, -3.0));
        assert_eq!(population.get(ActorId::new(1)).unwrap().selection_weight(), 0.0);

        assert!(population.set_weight(ActorId::new(1), f64::NAN));
        assert_eq!(population.get(ActorId::new(1)).unwrap().selection_weight(), 0.0);

        assert!(population.set_weight(ActorId::new(1), 2.5));
        assert_eq!(population.get(ActorId::new(1)).unwrap().selection_weight(), 2.5);
        assert!(!population.set_weight(ActorId::new(9), 1.0));
    }

    #[test]
    fn test_deserialized_weight_sanitized() {
        let negative: Actor =
            serde_json::from_str(r#"{"id":1,"name":"a","group":"Hostile","selection_weight":-2.0}"#).unwrap();
        assert_eq!(negative.selection_weight(), 0.0);

        let valid: Actor =
            serde_json::from_str(r#"{"id":2,"name":"b","group":"Primary","selection_weight":1.5}"#).unwrap();
        assert_eq!(valid.selection_weight(), 1.5);
    }

    #[test]
    fn test_reclassify_and_lookup() {
        let mut population: Population = [actor(1, "Ada")].into_iter().collect();
        assert!(population.set_group(ActorId::new(1), PopulationGroup::Visiting));
        assert_eq!(
            population.find_by_name("Ada").map(|a| a.group),
            Some(PopulationGroup::Visiting)
        );
        assert!(population.find_by_name("Bob").is_none());
    }

    #[test]
    fn test_group_index_dense() {
        for (i, group) in PopulationGroup::ALL.iter().enumerate() {
            assert_eq!(group.index(), i);
        }
    }
}
