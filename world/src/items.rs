//! Item drops, automatic pickup by nearby defenders and despawning.

use std::time::Duration;

use cultivator_defence_core::{DropId, Event, ItemId, UnitId, MAX_INVENTORY_ITEMS, TILE_SIZE};
use glam::Vec2;
use rand::{
    distributions::{Distribution, WeightedIndex},
    Rng,
};

use crate::World;

/// Chance that a defeated attacker leaves an item behind.
pub(crate) const ITEM_DROP_CHANCE: f64 = 0.15;

/// Distance within which a defender claims a dropped item.
pub(crate) const PICKUP_RADIUS: f32 = 1.5 * TILE_SIZE;

/// Time an unclaimed item stays on the battlefield.
pub(crate) const ITEM_LIFETIME: Duration = Duration::from_secs(30);

#[derive(Clone, Debug)]
pub(crate) struct DroppedItem {
    pub(crate) item: ItemId,
    pub(crate) position: Vec2,
    pub(crate) spawned_at: Duration,
}

impl World {
    /// Rolls for a drop at `position` and picks the item by drop weight.
    pub(crate) fn roll_drop(&mut self, position: Vec2, out_events: &mut Vec<Event>) {
        if self.catalog.items().is_empty() || !self.rng.gen_bool(ITEM_DROP_CHANCE) {
            return;
        }
        let Ok(weights) = WeightedIndex::new(self.catalog.items().iter().map(|item| item.drop_weight))
        else {
            return;
        };
        let item = self.catalog.items()[weights.sample(&mut self.rng)].id;

        let drop = self.allocate_drop_id();
        let _ = self.drops.insert(
            drop,
            DroppedItem {
                item,
                position,
                spawned_at: self.clock,
            },
        );
        out_events.push(Event::ItemDropped {
            drop,
            item,
            position,
        });
    }

    /// Hands each dropped item to the nearest defender in reach with a free slot.
    pub(crate) fn collect_items(&mut self, out_events: &mut Vec<Event>) {
        let drops: Vec<DropId> = self.drops.keys().copied().collect();
        for drop in drops {
            let Some(position) = self.drops.get(&drop).map(|dropped| dropped.position) else {
                continue;
            };
            let Some(tower) = self.nearest_collector(position) else {
                continue;
            };
            let Some(dropped) = self.drops.remove(&drop) else {
                continue;
            };

            if let Some(unit) = self.units.get_mut(&tower) {
                if let Some(defender) = unit.defender_mut() {
                    defender.inventory.push(dropped.item);
                }
                unit.refresh_stats(&self.catalog);
            }
            out_events.push(Event::ItemPickedUp {
                drop,
                item: dropped.item,
                tower,
            });
        }
    }

    fn nearest_collector(&self, position: Vec2) -> Option<UnitId> {
        let mut best: Option<(UnitId, f32)> = None;
        for unit in self.units.values() {
            let has_room = unit
                .defender()
                .is_some_and(|defender| defender.inventory.len() < MAX_INVENTORY_ITEMS);
            if !has_room {
                continue;
            }
            let distance = unit.position.distance(position);
            if distance > PICKUP_RADIUS {
                continue;
            }
            match best {
                Some((_, closest)) if distance >= closest => {}
                _ => best = Some((unit.id, distance)),
            }
        }
        best.map(|(id, _)| id)
    }

    /// Removes items that stayed unclaimed for too long.
    pub(crate) fn despawn_items(&mut self, out_events: &mut Vec<Event>) {
        let now = self.clock;
        let expired: Vec<DropId> = self
            .drops
            .iter()
            .filter(|(_, dropped)| now.saturating_sub(dropped.spawned_at) >= ITEM_LIFETIME)
            .map(|(id, _)| *id)
            .collect();

        for drop in expired {
            let _ = self.drops.remove(&drop);
            out_events.push(Event::ItemDespawned { drop });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{query, tests::world};
    use cultivator_defence_core::{
        Catalog, CatalogDefinition, CellCoord, Command, ItemDefinition, PersonTypeId,
    };

    fn loot(key: &str, drop_weight: u32) -> ItemDefinition {
        ItemDefinition {
            key: key.into(),
            name: key.into(),
            modifiers: Vec::new(),
            drop_weight,
        }
    }

    fn world_with_tower() -> World {
        let mut world = world();
        let mut events = Vec::new();
        crate::apply(
            &mut world,
            Command::PlaceTower {
                person_type: PersonTypeId::new(0),
                cell: CellCoord::new(1, 1),
            },
            &mut events,
        );
        world
    }

    fn scatter(world: &mut World, id: u32, cell: CellCoord) {
        let _ = world.drops.insert(
            DropId::new(id),
            DroppedItem {
                item: ItemId::new(0),
                position: cell.center(),
                spawned_at: Duration::ZERO,
            },
        );
    }

    #[test]
    fn nearby_tower_claims_drop() {
        let mut world = world_with_tower();
        scatter(&mut world, 0, CellCoord::new(2, 1));

        let mut events = Vec::new();
        world.collect_items(&mut events);

        assert_eq!(
            events,
            vec![Event::ItemPickedUp {
                drop: DropId::new(0),
                item: ItemId::new(0),
                tower: UnitId::new(0),
            }]
        );
        let tower = query::tower_view(&world).into_vec().remove(0);
        assert_eq!(tower.inventory, vec![ItemId::new(0)]);
        assert!(query::snapshot(&world).dropped_items.is_empty());
    }

    #[test]
    fn full_inventory_leaves_drop_on_the_ground() {
        let mut world = world_with_tower();
        if let Some(defender) = world
            .units
            .get_mut(&UnitId::new(0))
            .and_then(|unit| unit.defender_mut())
        {
            defender.inventory = vec![ItemId::new(0); MAX_INVENTORY_ITEMS];
        }
        scatter(&mut world, 0, CellCoord::new(2, 2));

        let mut events = Vec::new();
        world.collect_items(&mut events);

        assert!(events.is_empty());
        assert_eq!(world.drops.len(), 1);
    }

    #[test]
    fn unclaimed_drop_despawns_after_lifetime() {
        let mut world = world_with_tower();
        scatter(&mut world, 4, CellCoord::new(7, 0));

        let mut events = Vec::new();
        world.collect_items(&mut events);
        assert!(events.is_empty());

        world.clock = ITEM_LIFETIME - Duration::from_millis(50);
        world.despawn_items(&mut events);
        assert!(events.is_empty());

        world.clock = ITEM_LIFETIME;
        world.despawn_items(&mut events);
        assert_eq!(
            events,
            vec![Event::ItemDespawned {
                drop: DropId::new(4)
            }]
        );
    }

    #[test]
    fn drops_follow_chance_and_item_weights() {
        let mut world = world();
        world.catalog = Catalog::from_definition(CatalogDefinition {
            items: vec![loot("jade", 1), loot("relic", 0), loot("pebble", 3)],
            ..CatalogDefinition::default()
        })
        .expect("catalog");

        let mut events = Vec::new();
        for _ in 0..2_000 {
            world.roll_drop(Vec2::new(60.0, 60.0), &mut events);
        }

        let dropped: Vec<ItemId> = events
            .iter()
            .filter_map(|event| match event {
                Event::ItemDropped { item, .. } => Some(*item),
                _ => None,
            })
            .collect();
        assert!((200..=400).contains(&dropped.len()), "{} drops", dropped.len());
        assert_eq!(world.drops.len(), dropped.len());

        let count = |id: u16| dropped.iter().filter(|item| **item == ItemId::new(id)).count();
        assert_eq!(count(1), 0);
        assert!(count(2) > count(0) * 2);
    }

    #[test]
    fn nearest_tower_with_room_wins_the_drop() {
        let mut world = world_with_tower();
        let mut events = Vec::new();
        crate::apply(
            &mut world,
            Command::PlaceTower {
                person_type: PersonTypeId::new(0),
                cell: CellCoord::new(3, 1),
            },
            &mut events,
        );
        let _ = world.drops.insert(
            DropId::new(0),
            DroppedItem {
                item: ItemId::new(0),
                position: CellCoord::new(2, 1).center() + Vec2::new(10.0, 0.0),
                spawned_at: Duration::ZERO,
            },
        );

        events.clear();
        world.collect_items(&mut events);

        assert_eq!(
            events,
            vec![Event::ItemPickedUp {
                drop: DropId::new(0),
                item: ItemId::new(0),
                tower: UnitId::new(1),
            }]
        );
    }
}
