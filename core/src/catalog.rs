//! Data-driven unit archetypes resolved once at load time.
//!
//! Content is authored with string keys ([`CatalogDefinition`]) and resolved
//! into a [`Catalog`] of dense identifiers before the simulation starts, so the
//! tick loop never dispatches on strings. Person types come from two sources:
//! direct definitions, and compositions that combine a species, a dao and an
//! optional title.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{BaseStats, ItemId, PersonTypeId, SkillId, StatModifier, UnitRole};

/// Serialized catalog as authored by content tooling.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogDefinition {
    /// Skills that defenders may equip.
    pub skills: Vec<SkillDefinition>,
    /// Items that attackers may drop.
    pub items: Vec<ItemDefinition>,
    /// Directly authored person types.
    pub person_types: Vec<PersonTypeDefinition>,
    /// Species available to the composition system.
    pub species: Vec<SpeciesDefinition>,
    /// Daos available to the composition system.
    pub daos: Vec<DaoDefinition>,
    /// Titles available to the composition system.
    pub titles: Vec<TitleDefinition>,
    /// Person types assembled from species, dao and title records.
    pub compositions: Vec<CompositionDefinition>,
}

/// Authored skill record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkillDefinition {
    /// Unique key referenced by person types.
    pub key: String,
    /// Display name.
    pub name: String,
    /// Bonuses granted while equipped.
    #[serde(default)]
    pub modifiers: Vec<StatModifier>,
}

/// Authored item record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemDefinition {
    /// Unique key.
    pub key: String,
    /// Display name.
    pub name: String,
    /// Bonuses granted while carried.
    #[serde(default)]
    pub modifiers: Vec<StatModifier>,
    /// Relative likelihood of this item being chosen when a drop occurs.
    #[serde(default = "default_weight")]
    pub drop_weight: u32,
}

/// Authored person type record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PersonTypeDefinition {
    /// Unique key.
    pub key: String,
    /// Display name.
    pub name: String,
    /// Glyph used by presentation layers.
    #[serde(default)]
    pub emoji: String,
    /// Battlefield role.
    pub role: UnitRole,
    /// Unmodified combat stats.
    pub stats: BaseStats,
    /// Movement speed in tiles per second (attackers only).
    #[serde(default = "default_speed")]
    pub speed: f32,
    /// Qi granted when defeated (attackers only).
    #[serde(default)]
    pub reward: u32,
    /// Qi required to deploy (defenders only).
    #[serde(default)]
    pub cost: u32,
    /// Relative likelihood of appearing in synthesized waves.
    #[serde(default = "default_weight")]
    pub spawn_weight: u32,
    /// First wave in which synthesized generation may pick the type.
    #[serde(default = "default_first_wave")]
    pub first_wave: u32,
    /// Keys of skills the type may equip.
    #[serde(default)]
    pub skills: Vec<String>,
    /// Keys of items the type favours.
    #[serde(default)]
    pub items: Vec<String>,
}

/// Species record for the composition system.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpeciesDefinition {
    /// Unique key.
    pub key: String,
    /// Display name.
    pub name: String,
    /// Glyph used by presentation layers.
    #[serde(default)]
    pub emoji: String,
    /// Battlefield role of every composition built on the species.
    pub role: UnitRole,
    /// Unmodified combat stats.
    pub stats: BaseStats,
    /// Movement speed in tiles per second.
    #[serde(default = "default_speed")]
    pub speed: f32,
    /// Qi granted when defeated.
    #[serde(default)]
    pub reward: u32,
    /// Qi required to deploy.
    #[serde(default)]
    pub cost: u32,
    /// Relative likelihood of appearing in synthesized waves.
    #[serde(default = "default_weight")]
    pub spawn_weight: u32,
    /// First wave in which synthesized generation may pick compositions.
    #[serde(default = "default_first_wave")]
    pub first_wave: u32,
}

/// Dao record for the composition system.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DaoDefinition {
    /// Unique key.
    pub key: String,
    /// Display name.
    pub name: String,
    /// Flat additions to the species' base stats.
    #[serde(default)]
    pub bonus: BaseStats,
    /// Keys of skills unlocked by the dao.
    #[serde(default)]
    pub skills: Vec<String>,
}

/// Title record for the composition system.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TitleDefinition {
    /// Unique key.
    pub key: String,
    /// Display name, prefixed to the composed name.
    pub name: String,
    /// Deployment cost scaling in percent.
    #[serde(default = "default_percent")]
    pub cost_percent: u32,
    /// Kill reward scaling in percent.
    #[serde(default = "default_percent")]
    pub reward_percent: u32,
}

/// Person type assembled from composition records.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompositionDefinition {
    /// Unique key of the resulting person type.
    pub key: String,
    /// Species key.
    pub species: String,
    /// Dao key.
    pub dao: String,
    /// Optional title key.
    #[serde(default)]
    pub title: Option<String>,
}

fn default_weight() -> u32 {
    1
}

fn default_speed() -> f32 {
    1.0
}

fn default_first_wave() -> u32 {
    1
}

fn default_percent() -> u32 {
    100
}

/// Resolved skill.
#[derive(Clone, Debug, PartialEq)]
pub struct Skill {
    /// Dense identifier.
    pub id: SkillId,
    /// Authored key.
    pub key: String,
    /// Display name.
    pub name: String,
    /// Bonuses granted while equipped.
    pub modifiers: Vec<StatModifier>,
}

/// Resolved item.
#[derive(Clone, Debug, PartialEq)]
pub struct Item {
    /// Dense identifier.
    pub id: ItemId,
    /// Authored key.
    pub key: String,
    /// Display name.
    pub name: String,
    /// Bonuses granted while carried.
    pub modifiers: Vec<StatModifier>,
    /// Relative drop likelihood.
    pub drop_weight: u32,
}

/// Resolved person type.
#[derive(Clone, Debug, PartialEq)]
pub struct PersonType {
    /// Dense identifier.
    pub id: PersonTypeId,
    /// Authored key.
    pub key: String,
    /// Display name.
    pub name: String,
    /// Glyph used by presentation layers.
    pub emoji: String,
    /// Battlefield role.
    pub role: UnitRole,
    /// Unmodified combat stats.
    pub stats: BaseStats,
    /// Movement speed in tiles per second.
    pub speed: f32,
    /// Qi granted when defeated.
    pub reward: u32,
    /// Qi required to deploy.
    pub cost: u32,
    /// Relative likelihood of appearing in synthesized waves.
    pub spawn_weight: u32,
    /// First wave in which synthesized generation may pick the type.
    pub first_wave: u32,
    /// Skills the type may equip.
    pub compatible_skills: Vec<SkillId>,
    /// Items the type favours.
    pub compatible_items: Vec<ItemId>,
}

impl PersonType {
    /// Reports whether the type may equip the provided skill.
    #[must_use]
    pub fn can_equip(&self, skill: SkillId) -> bool {
        self.compatible_skills.contains(&skill)
    }
}

/// Errors raised while resolving a [`CatalogDefinition`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    /// Two records of the same kind share a key.
    #[error("duplicate {kind} key `{key}`")]
    DuplicateKey {
        /// Kind of record.
        kind: &'static str,
        /// Offending key.
        key: String,
    },
    /// A record references a key that does not exist.
    #[error("`{owner}` references unknown {kind} `{key}`")]
    UnknownReference {
        /// Key of the referencing record.
        owner: String,
        /// Kind of the missing record.
        kind: &'static str,
        /// Missing key.
        key: String,
    },
    /// A table exceeded the identifier space.
    #[error("too many {kind} records")]
    TooManyEntries {
        /// Kind of record.
        kind: &'static str,
    },
}

/// Composition building blocks borrowed while resolving a catalog.
struct Lineage<'a> {
    species: &'a [SpeciesDefinition],
    daos: &'a [DaoDefinition],
    titles: &'a [TitleDefinition],
}

/// Immutable lookup tables of every archetype, skill and item.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    skills: Vec<Skill>,
    items: Vec<Item>,
    person_types: Vec<PersonType>,
    skill_keys: HashMap<String, SkillId>,
    item_keys: HashMap<String, ItemId>,
    person_type_keys: HashMap<String, PersonTypeId>,
}

impl Catalog {
    /// Resolves authored records into dense lookup tables.
    pub fn from_definition(definition: CatalogDefinition) -> Result<Self, CatalogError> {
        let CatalogDefinition {
            skills,
            items,
            person_types,
            species,
            daos,
            titles,
            compositions,
        } = definition;
        let lineage = Lineage {
            species: &species,
            daos: &daos,
            titles: &titles,
        };
        let mut catalog = Catalog::default();

        for skill in skills {
            let id = SkillId::new(next_index(catalog.skills.len(), "skill")?);
            insert_key(&mut catalog.skill_keys, "skill", &skill.key, id)?;
            catalog.skills.push(Skill {
                id,
                key: skill.key,
                name: skill.name,
                modifiers: skill.modifiers,
            });
        }

        for item in items {
            let id = ItemId::new(next_index(catalog.items.len(), "item")?);
            insert_key(&mut catalog.item_keys, "item", &item.key, id)?;
            catalog.items.push(Item {
                id,
                key: item.key,
                name: item.name,
                modifiers: item.modifiers,
                drop_weight: item.drop_weight,
            });
        }

        for person in person_types {
            let compatible_skills = catalog.resolve_skills(&person.key, &person.skills)?;
            let compatible_items = person
                .items
                .iter()
                .map(|key| {
                    catalog
                        .item_keys
                        .get(key)
                        .copied()
                        .ok_or_else(|| CatalogError::UnknownReference {
                            owner: person.key.clone(),
                            kind: "item",
                            key: key.clone(),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            catalog.push_person_type(PersonType {
                id: PersonTypeId::new(0),
                key: person.key,
                name: person.name,
                emoji: person.emoji,
                role: person.role,
                stats: person.stats,
                speed: person.speed,
                reward: person.reward,
                cost: person.cost,
                spawn_weight: person.spawn_weight,
                first_wave: person.first_wave,
                compatible_skills,
                compatible_items,
            })?;
        }

        for composition in &compositions {
            let person = catalog.compose(composition, &lineage)?;
            catalog.push_person_type(person)?;
        }

        Ok(catalog)
    }

    fn compose(
        &self,
        composition: &CompositionDefinition,
        lineage: &Lineage<'_>,
    ) -> Result<PersonType, CatalogError> {
        let unknown = |kind: &'static str, key: &str| CatalogError::UnknownReference {
            owner: composition.key.clone(),
            kind,
            key: key.to_owned(),
        };

        let species = lineage
            .species
            .iter()
            .find(|species| species.key == composition.species)
            .ok_or_else(|| unknown("species", &composition.species))?;
        let dao = lineage
            .daos
            .iter()
            .find(|dao| dao.key == composition.dao)
            .ok_or_else(|| unknown("dao", &composition.dao))?;
        let title = match &composition.title {
            Some(key) => Some(
                lineage
                    .titles
                    .iter()
                    .find(|title| &title.key == key)
                    .ok_or_else(|| unknown("title", key))?,
            ),
            None => None,
        };

        let mut name = format!("{} {}", dao.name, species.name);
        let mut cost = species.cost;
        let mut reward = species.reward;
        if let Some(title) = title {
            name = format!("{} {name}", title.name);
            cost = scale_percent(cost, title.cost_percent);
            reward = scale_percent(reward, title.reward_percent);
        }

        Ok(PersonType {
            id: PersonTypeId::new(0),
            key: composition.key.clone(),
            name,
            emoji: species.emoji.clone(),
            role: species.role,
            stats: species.stats.saturating_add(&dao.bonus),
            speed: species.speed,
            reward,
            cost,
            spawn_weight: species.spawn_weight,
            first_wave: species.first_wave,
            compatible_skills: self.resolve_skills(&composition.key, &dao.skills)?,
            compatible_items: Vec::new(),
        })
    }

    fn resolve_skills(&self, owner: &str, keys: &[String]) -> Result<Vec<SkillId>, CatalogError> {
        keys.iter()
            .map(|key| {
                self.skill_keys
                    .get(key)
                    .copied()
                    .ok_or_else(|| CatalogError::UnknownReference {
                        owner: owner.to_owned(),
                        kind: "skill",
                        key: key.clone(),
                    })
            })
            .collect()
    }

    fn push_person_type(&mut self, mut person: PersonType) -> Result<(), CatalogError> {
        let id = PersonTypeId::new(next_index(self.person_types.len(), "person type")?);
        insert_key(&mut self.person_type_keys, "person type", &person.key, id)?;
        person.id = id;
        self.person_types.push(person);
        Ok(())
    }

    /// Looks up a person type by identifier.
    #[must_use]
    pub fn person_type(&self, id: PersonTypeId) -> Option<&PersonType> {
        self.person_types.get(id.index())
    }

    /// Looks up a person type by its authored key.
    #[must_use]
    pub fn person_type_by_key(&self, key: &str) -> Option<&PersonType> {
        self.person_type_keys
            .get(key)
            .and_then(|id| self.person_type(*id))
    }

    /// Iterator over every person type in identifier order.
    pub fn person_types(&self) -> impl Iterator<Item = &PersonType> {
        self.person_types.iter()
    }

    /// Iterator over every person type able to defend.
    pub fn defenders(&self) -> impl Iterator<Item = &PersonType> {
        self.person_types
            .iter()
            .filter(|person| person.role == UnitRole::Defender)
    }

    /// Iterator over every person type able to attack.
    pub fn attackers(&self) -> impl Iterator<Item = &PersonType> {
        self.person_types
            .iter()
            .filter(|person| person.role == UnitRole::Attacker)
    }

    /// Looks up a skill by identifier.
    #[must_use]
    pub fn skill(&self, id: SkillId) -> Option<&Skill> {
        self.skills.get(id.index())
    }

    /// Looks up a skill by its authored key.
    #[must_use]
    pub fn skill_by_key(&self, key: &str) -> Option<&Skill> {
        self.skill_keys.get(key).and_then(|id| self.skill(*id))
    }

    /// Looks up an item by identifier.
    #[must_use]
    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.get(id.index())
    }

    /// Looks up an item by its authored key.
    #[must_use]
    pub fn item_by_key(&self, key: &str) -> Option<&Item> {
        self.item_keys.get(key).and_then(|id| self.item(*id))
    }

    /// Every item in identifier order.
    #[must_use]
    pub fn items(&self) -> &[Item] {
        &self.items
    }
}

fn next_index(len: usize, kind: &'static str) -> Result<u16, CatalogError> {
    u16::try_from(len).map_err(|_| CatalogError::TooManyEntries { kind })
}

fn insert_key<T: Copy>(
    keys: &mut HashMap<String, T>,
    kind: &'static str,
    key: &str,
    id: T,
) -> Result<(), CatalogError> {
    if keys.insert(key.to_owned(), id).is_some() {
        return Err(CatalogError::DuplicateKey {
            kind,
            key: key.to_owned(),
        });
    }
    Ok(())
}

fn scale_percent(value: u32, percent: u32) -> u32 {
    let scaled = u64::from(value) * u64::from(percent) / 100;
    u32::try_from(scaled).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StatKind;

    fn base(damage: u32, health: u32) -> BaseStats {
        BaseStats {
            damage,
            attack_speed_ms: 1000,
            range: 100,
            health,
        }
    }

    fn definition() -> CatalogDefinition {
        CatalogDefinition {
            skills: vec![SkillDefinition {
                key: "sword_intent".into(),
                name: "Sword Intent".into(),
                modifiers: vec![StatModifier::scaled(StatKind::Damage, 0.2)],
            }],
            items: vec![ItemDefinition {
                key: "jade".into(),
                name: "Jade".into(),
                modifiers: vec![StatModifier::flat(StatKind::Damage, 5.0)],
                drop_weight: 2,
            }],
            person_types: vec![PersonTypeDefinition {
                key: "disciple".into(),
                name: "Disciple".into(),
                emoji: String::new(),
                role: UnitRole::Defender,
                stats: base(20, 100),
                speed: 1.0,
                reward: 0,
                cost: 100,
                spawn_weight: 1,
                first_wave: 1,
                skills: vec!["sword_intent".into()],
                items: vec!["jade".into()],
            }],
            species: vec![SpeciesDefinition {
                key: "fox".into(),
                name: "Fox".into(),
                emoji: String::new(),
                role: UnitRole::Attacker,
                stats: base(5, 40),
                speed: 1.5,
                reward: 10,
                cost: 0,
                spawn_weight: 3,
                first_wave: 2,
            }],
            daos: vec![DaoDefinition {
                key: "flame".into(),
                name: "Flame".into(),
                bonus: base(3, 10),
                skills: vec!["sword_intent".into()],
            }],
            titles: vec![TitleDefinition {
                key: "elder".into(),
                name: "Elder".into(),
                cost_percent: 100,
                reward_percent: 150,
            }],
            compositions: vec![CompositionDefinition {
                key: "elder_flame_fox".into(),
                species: "fox".into(),
                dao: "flame".into(),
                title: Some("elder".into()),
            }],
        }
    }

    #[test]
    fn resolves_keys_into_dense_identifiers() {
        let catalog = Catalog::from_definition(definition()).expect("valid catalog");

        let disciple = catalog.person_type_by_key("disciple").expect("disciple");
        assert_eq!(disciple.id, PersonTypeId::new(0));
        assert_eq!(disciple.compatible_skills, vec![SkillId::new(0)]);
        assert_eq!(disciple.compatible_items, vec![ItemId::new(0)]);
        assert!(disciple.can_equip(SkillId::new(0)));
        assert_eq!(catalog.defenders().count(), 1);
    }

    #[test]
    fn compositions_combine_species_dao_and_title() {
        let catalog = Catalog::from_definition(definition()).expect("valid catalog");

        let fox = catalog.person_type_by_key("elder_flame_fox").expect("composed");
        assert_eq!(fox.name, "Elder Flame Fox");
        assert_eq!(fox.role, UnitRole::Attacker);
        assert_eq!(fox.stats.damage, 8);
        assert_eq!(fox.stats.health, 50);
        assert_eq!(fox.stats.attack_speed_ms, 2000);
        assert_eq!(fox.reward, 15);
        assert_eq!(fox.first_wave, 2);
        assert_eq!(catalog.attackers().count(), 1);
    }

    #[test]
    fn unknown_skill_reference_is_rejected() {
        let mut definition = definition();
        definition.person_types[0].skills.push("missing".into());

        let error = Catalog::from_definition(definition).expect_err("unknown skill");
        assert_eq!(
            error,
            CatalogError::UnknownReference {
                owner: "disciple".into(),
                kind: "skill",
                key: "missing".into(),
            }
        );
    }

    #[test]
    fn duplicate_person_type_keys_are_rejected() {
        let mut definition = definition();
        definition.compositions[0].key = "disciple".into();

        let error = Catalog::from_definition(definition).expect_err("duplicate");
        assert!(matches!(error, CatalogError::DuplicateKey { .. }));
    }

    #[test]
    fn unknown_species_reference_is_rejected() {
        let mut definition = definition();
        definition.compositions[0].species = "dragon".into();

        let error = Catalog::from_definition(definition).expect_err("unknown species");
        assert!(matches!(
            error,
            CatalogError::UnknownReference { kind: "species", .. }
        ));
    }
}
