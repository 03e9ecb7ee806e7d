//! # Content Registry
//!
//! Maps node names to content ids. Generators resolve every name they need
//! once at construction; hot loops only ever see ids.
//!
//! Ids are handed out from 0 upward, skipping the reserved range
//! (`CONTENT_UNKNOWN`, `CONTENT_AIR`, `CONTENT_IGNORE`).

use std::collections::HashMap;

use crate::error::{CoreError, CoreResult};
use crate::voxel::node::{ContentId, CONTENT_AIR, CONTENT_IGNORE, CONTENT_UNKNOWN};

/// Per-content attributes the generator cares about.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ContentFeatures {
    /// Caves and dungeons may excavate this content.
    pub is_ground_content: bool,
    /// Liquid (water, lava).
    pub is_liquid: bool,
}

impl ContentFeatures {
    /// Solid, carvable ground.
    pub const GROUND: Self = Self {
        is_ground_content: true,
        is_liquid: false,
    };

    /// Liquid.
    pub const LIQUID: Self = Self {
        is_ground_content: false,
        is_liquid: true,
    };

    /// Neither ground nor liquid (air, ignore, built structures).
    pub const INERT: Self = Self {
        is_ground_content: false,
        is_liquid: false,
    };
}

/// Name/id table for node content.
#[derive(Clone, Debug)]
pub struct ContentRegistry {
    /// Name to id.
    by_name: HashMap<String, ContentId>,
    /// Id to name and features. Indexed by id.
    defs: Vec<Option<(String, ContentFeatures)>>,
    /// Next candidate id.
    next_id: u32,
}

impl Default for ContentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentRegistry {
    /// Node names registered by [`with_defaults`](Self::with_defaults).
    pub const DEFAULT_NODES: &'static [(&'static str, ContentFeatures)] = &[
        ("stone", ContentFeatures::GROUND),
        ("water_source", ContentFeatures::LIQUID),
        ("river_water_source", ContentFeatures::LIQUID),
        ("lava_source", ContentFeatures::LIQUID),
        ("cobble", ContentFeatures::INERT),
        ("mossycobble", ContentFeatures::INERT),
        ("dirt", ContentFeatures::GROUND),
        ("dirt_with_grass", ContentFeatures::GROUND),
        ("dirt_with_rainforest_litter", ContentFeatures::GROUND),
        ("dirt_with_coniferous_litter", ContentFeatures::GROUND),
        ("dry_dirt_with_dry_grass", ContentFeatures::GROUND),
        ("dry_dirt", ContentFeatures::GROUND),
        ("sand", ContentFeatures::GROUND),
        ("desert_stone", ContentFeatures::GROUND),
        ("desert_sand", ContentFeatures::GROUND),
        ("sandstone", ContentFeatures::GROUND),
        ("snowblock", ContentFeatures::GROUND),
        ("dirt_with_snow", ContentFeatures::GROUND),
        ("permafrost_with_stones", ContentFeatures::GROUND),
        ("gravel", ContentFeatures::GROUND),
        ("ice", ContentFeatures::GROUND),
    ];

    /// Creates a registry holding only the reserved contents.
    #[must_use]
    pub fn new() -> Self {
        let mut reg = Self {
            by_name: HashMap::new(),
            defs: Vec::new(),
            next_id: 0,
        };
        reg.insert_at("unknown", CONTENT_UNKNOWN, ContentFeatures::INERT);
        reg.insert_at("air", CONTENT_AIR, ContentFeatures::INERT);
        reg.insert_at("ignore", CONTENT_IGNORE, ContentFeatures::INERT);
        reg
    }

    /// Creates a registry with every node the terrain generator uses.
    ///
    /// # Panics
    ///
    /// Never in practice: the default table is far smaller than the id
    /// space and is registered into a fresh registry.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut reg = Self::new();
        for (name, features) in Self::DEFAULT_NODES {
            reg.register_with(name, *features)
                .expect("default node table fits the id space");
        }
        reg
    }

    fn insert_at(&mut self, name: &str, id: ContentId, features: ContentFeatures) {
        let slot = usize::from(id);
        if self.defs.len() <= slot {
            self.defs.resize(slot + 1, None);
        }
        self.defs[slot] = Some((name.to_owned(), features));
        self.by_name.insert(name.to_owned(), id);
    }

    /// Registers `name` as carvable ground content.
    ///
    /// # Errors
    ///
    /// See [`register_with`](Self::register_with).
    pub fn register(&mut self, name: &str) -> CoreResult<ContentId> {
        self.register_with(name, ContentFeatures::GROUND)
    }

    /// Registers `name` with explicit features, returning its id.
    ///
    /// Registering an existing name returns the existing id unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::RegistryFull`] if no id is left.
    pub fn register_with(&mut self, name: &str, features: ContentFeatures) -> CoreResult<ContentId> {
        if let Some(&id) = self.by_name.get(name) {
            return Ok(id);
        }
        loop {
            let Ok(id) = ContentId::try_from(self.next_id) else {
                return Err(CoreError::RegistryFull(name.to_owned()));
            };
            self.next_id += 1;
            let taken = self.defs.get(usize::from(id)).is_some_and(Option::is_some);
            if !taken {
                self.insert_at(name, id, features);
                return Ok(id);
            }
        }
    }

    /// Resolves a name to its id.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<ContentId> {
        self.by_name.get(name).copied()
    }

    /// Name registered for `id`.
    #[must_use]
    pub fn name_of(&self, id: ContentId) -> Option<&str> {
        self.defs
            .get(usize::from(id))
            .and_then(Option::as_ref)
            .map(|(name, _)| name.as_str())
    }

    /// Features of `id`. Unregistered ids are inert.
    #[must_use]
    pub fn features(&self, id: ContentId) -> ContentFeatures {
        self.defs
            .get(usize::from(id))
            .and_then(Option::as_ref)
            .map_or(ContentFeatures::INERT, |(_, f)| *f)
    }

    /// Dense table of ground-content flags, indexed by id.
    ///
    /// Lets carvers test a node without hashing.
    #[must_use]
    pub fn ground_content_table(&self) -> Vec<bool> {
        self.defs
            .iter()
            .map(|d| d.as_ref().is_some_and(|(_, f)| f.is_ground_content))
            .collect()
    }

    /// Number of registered contents, reserved ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// True if only the reserved contents exist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.len() <= 3
    }
}
