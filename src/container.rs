//! In-memory arena of decoded objects plus the indices and classification
//! helpers built on top of it. See `spec.md` §3, §4.6, and §9 (arena
//! indices instead of reference-counted graphs).

use crate::object::GameObject;
use std::collections::HashMap;
use uuid::Uuid;

/// Class-name substrings that mark an object as *not* a structure, even
/// though it has a `TargetingTeam` property. Mirrors `_NON_STRUCTURE_PATTERNS`
/// in `game_objects/container.py` and `files/world_save.py`.
const NON_STRUCTURE_PATTERNS: &[&str] = &[
    "_Character_BP",
    "DinoCharacter",
    "PlayerPawn",
    "Buff_",
    "PrimalBuff",
    "Weap",
    "StatusComponent",
    "Inventory",
    "DroppedItem",
    "DeathItemCache",
    "NPCZone",
    "DinoDropInventory",
];

#[derive(Debug, Default)]
pub struct Container {
    pub objects: Vec<GameObject>,
    by_guid: HashMap<Uuid, usize>,
    by_class_name: HashMap<String, Vec<usize>>,
    by_primary_name: HashMap<String, usize>,
}

impl Container {
    pub fn new(objects: Vec<GameObject>) -> Self {
        let mut container = Container {
            objects,
            by_guid: HashMap::new(),
            by_class_name: HashMap::new(),
            by_primary_name: HashMap::new(),
        };
        container.build_indices();
        container.build_relationships();
        container
    }

    fn build_indices(&mut self) {
        for (index, object) in self.objects.iter().enumerate() {
            if let Some(guid) = object.guid {
                self.by_guid.insert(guid, index);
            }
            self.by_class_name
                .entry(object.class_name.clone())
                .or_default()
                .push(index);
            if let Some(name) = object.primary_name() {
                self.by_primary_name.insert(name.to_string(), index);
            }
        }
    }

    /// Links component objects to their owning object by resolving each
    /// component's trailing name against the owner's primary name.
    fn build_relationships(&mut self) {
        let mut links = Vec::new();
        for (index, object) in self.objects.iter().enumerate() {
            if let Some(owner_name) = object.parent_lookup_name() {
                if let Some(&owner_index) = self.by_primary_name.get(owner_name) {
                    if owner_index != index {
                        let key = object
                            .primary_name()
                            .unwrap_or(object.class_name.as_str())
                            .to_string();
                        links.push((index, owner_index, key));
                    }
                }
            }
        }
        for (component_index, owner_index, key) in links {
            self.objects[component_index].parent = Some(owner_index);
            self.objects[owner_index]
                .components
                .insert(key, component_index);
        }
    }

    pub fn by_guid(&self, guid: &Uuid) -> Option<&GameObject> {
        self.by_guid.get(guid).map(|&i| &self.objects[i])
    }

    pub fn by_class_name<'a>(&'a self, class_name: &str) -> impl Iterator<Item = &'a GameObject> {
        self.by_class_name
            .get(class_name)
            .into_iter()
            .flatten()
            .map(move |&i| &self.objects[i])
    }

    pub fn by_primary_name(&self, name: &str) -> Option<&GameObject> {
        self.by_primary_name.get(name).map(|&i| &self.objects[i])
    }

    pub fn parent_of(&self, object: &GameObject) -> Option<&GameObject> {
        object.parent.map(|i| &self.objects[i])
    }

    /// Tribe-owned placed structures: has `TargetingTeam`, lacks `DinoID1`,
    /// and doesn't match any non-structure class-name pattern.
    fn is_structure(&self, object: &GameObject) -> bool {
        object.has_property("TargetingTeam")
            && !object.has_property("DinoID1")
            && !NON_STRUCTURE_PATTERNS
                .iter()
                .any(|pattern| object.class_name.contains(pattern))
    }

    pub fn get_structures(&self) -> impl Iterator<Item = &GameObject> {
        self.objects.iter().filter(|o| self.is_structure(o))
    }

    fn is_creature(object: &GameObject) -> bool {
        object.class_name.contains("_Character_BP") || object.class_name.contains("DinoCharacter")
    }

    /// Tribute/city terminals placed on the map, excluding their inventory
    /// and item sub-objects.
    pub fn get_terminals(&self) -> impl Iterator<Item = &GameObject> {
        self.objects.iter().filter(|o| {
            (o.class_name.contains("TributeTerminal") || o.class_name.contains("CityTerminal"))
                && !o.is_item
                && !o.class_name.contains("Inventory")
                && !o.class_name.contains("PrimalItem")
        })
    }

    pub fn get_supply_drops(&self) -> impl Iterator<Item = &GameObject> {
        const SUPPLY_PATTERNS: &[&str] = &["SupplyCrate", "OrbitalSupply", "SupplyDrop"];
        self.objects.iter().filter(|o| {
            SUPPLY_PATTERNS.iter().any(|p| o.class_name.contains(p))
                && !o.class_name.contains("Inventory")
                && !o.is_item
        })
    }

    pub fn get_artifact_crates(&self) -> impl Iterator<Item = &GameObject> {
        self.objects.iter().filter(|o| {
            o.class_name.contains("ArtifactCrate")
                && !o.class_name.contains("Inventory")
                && !o.is_item
        })
    }

    /// Engine-placed resource/vein/node objects: oil, water, gas, charge,
    /// element veins, and beaver dams.
    pub fn get_map_resources(&self) -> impl Iterator<Item = &GameObject> {
        const RESOURCE_PATTERNS: &[&str] = &[
            "OilVein",
            "WaterVein",
            "GasVein",
            "ChargeNode",
            "ElementVein",
            "BeaverDam",
        ];
        self.objects.iter().filter(|o| {
            RESOURCE_PATTERNS.iter().any(|p| o.class_name.contains(p))
                && !o.class_name.contains("Inventory")
                && !o.is_item
        })
    }

    pub fn get_wild_creatures(&self) -> impl Iterator<Item = &GameObject> {
        self.objects
            .iter()
            .filter(|o| Self::is_creature(o) && !o.has_property("TamingTeamID"))
    }

    pub fn get_tamed_creatures(&self) -> impl Iterator<Item = &GameObject> {
        self.objects
            .iter()
            .filter(|o| Self::is_creature(o) && o.has_property("TamingTeamID"))
    }

    pub fn get_players(&self) -> impl Iterator<Item = &GameObject> {
        self.objects.iter().filter(|o| {
            o.class_name == "PrimalPlayerData" || o.class_name.contains("PlayerPawnTest")
        })
    }

    pub fn get_player_pawns(&self) -> impl Iterator<Item = &GameObject> {
        self.objects
            .iter()
            .filter(|o| o.class_name.contains("PlayerPawn"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name::Name;
    use crate::value::{Property, PropertyValue};

    fn bool_property(name: &str) -> Property {
        Property {
            name: Name::new(name, 0),
            type_tag: "BoolProperty".to_string(),
            array_index: 0,
            value: PropertyValue::Bool(true),
        }
    }

    fn object(class_name: &str, names: Vec<&str>, properties: Vec<&str>) -> GameObject {
        GameObject {
            id: None,
            guid: Some(Uuid::new_v4()),
            class_name: class_name.to_string(),
            is_item: false,
            names: names.into_iter().map(|n| Name::new(n, 0)).collect(),
            from_data_file: true,
            data_file_index: 0,
            location: None,
            properties_offset: 0,
            properties: properties.into_iter().map(bool_property).collect(),
            extra_data: None,
            parent: None,
            components: Default::default(),
        }
    }

    #[test]
    fn component_links_to_owner_by_trailing_name() {
        let owner = object("Structure_Wall", vec!["Wall_1"], vec!["TargetingTeam"]);
        let component = object(
            "Structure_Wall_Child",
            vec!["Wall_1_Health", "Wall_1"],
            vec![],
        );
        let container = Container::new(vec![owner, component]);
        let owner_index = container.by_primary_name("Wall_1").unwrap();
        assert!(owner_index.components.contains_key("Wall_1_Health"));
        let component = container.objects.iter().find(|o| o.class_name.ends_with("Child")).unwrap();
        assert_eq!(component.parent, Some(0));
    }

    #[test]
    fn structure_classification_requires_targeting_team_and_excludes_creatures() {
        let wall = object("Structure_Wall", vec!["Wall_1"], vec!["TargetingTeam"]);
        let dino = object(
            "MyMap_Character_BP_Rex",
            vec![],
            vec!["TargetingTeam", "TamingTeamID"],
        );
        let unowned = object("Structure_Foundation", vec![], vec![]);
        let container = Container::new(vec![wall, dino, unowned]);
        let structures: Vec<_> = container.get_structures().collect();
        assert_eq!(structures.len(), 1);
        assert_eq!(structures[0].class_name, "Structure_Wall");
    }

    #[test]
    fn tamed_creature_requires_taming_team_id() {
        let wild = object("MyMap_Character_BP_Rex", vec![], vec![]);
        let tamed = object(
            "MyMap_Character_BP_Rex",
            vec![],
            vec!["TamingTeamID"],
        );
        let container = Container::new(vec![wild, tamed]);
        assert_eq!(container.get_wild_creatures().count(), 1);
        assert_eq!(container.get_tamed_creatures().count(), 1);
    }
}
