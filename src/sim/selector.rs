//! Content rotation
//!
//! Picks the next dish and image so players see as little repetition as
//! the catalog allows:
//! - Dishes not shown since the last catalog exhaustion come first
//! - Dishes already played in the current game are never picked twice
//!   unless the catalog is smaller than the game
//! - Up to `max_recent_repeats` dishes from recent games may be folded
//!   back into the pool per game
//! - Images rotate first-unused, then least recently used

use std::collections::HashSet;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::catalog::{ContentCatalog, Dish, DishId};
use crate::error::GameError;
use crate::persistence::SessionRecord;

/// Outcome of one selection
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub dish: Dish,
    pub image_index: usize,
    /// The dish came from the recent-games fold-in
    pub recent_repeat: bool,
}

impl Selection {
    /// Reference of the chosen image
    pub fn image(&self) -> &str {
        &self.dish.images[self.image_index]
    }
}

/// Selection bookkeeping for the game in progress
#[derive(Debug, Clone, Default)]
pub struct GameSelection {
    played: Vec<DishId>,
    recent_repeats: u32,
}

impl GameSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dishes picked so far, in order
    pub fn played(&self) -> &[DishId] {
        &self.played
    }

    /// Recent-game dishes folded back in so far
    pub fn recent_repeats(&self) -> u32 {
        self.recent_repeats
    }
}

/// Chooses dishes from a catalog snapshot
#[derive(Debug, Clone)]
pub struct ContentSelector {
    /// Dishes with at least one image, in catalog order
    eligible: Vec<Dish>,
    max_recent_repeats: u32,
}

impl ContentSelector {
    pub fn new<C: ContentCatalog + ?Sized>(catalog: &C, max_recent_repeats: u32) -> Self {
        let dishes = catalog.dishes();
        let total = dishes.len();
        let eligible: Vec<Dish> = dishes.into_iter().filter(Dish::is_eligible).collect();
        if eligible.len() < total {
            log::warn!(
                "{} of {} dishes have no images and will never be shown",
                total - eligible.len(),
                total
            );
        }
        Self {
            eligible,
            max_recent_repeats,
        }
    }

    pub fn eligible_count(&self) -> usize {
        self.eligible.len()
    }

    /// Pick the next dish and image, recording the pick in `session`.
    ///
    /// Fails only when no dish has an image.
    pub fn select_next_dish<R: Rng + ?Sized>(
        &self,
        session: &mut SessionRecord,
        game: &mut GameSelection,
        rng: &mut R,
    ) -> Result<Selection, GameError> {
        if self.eligible.is_empty() {
            return Err(GameError::NoContentAvailable);
        }

        let played: HashSet<&DishId> = game.played.iter().collect();
        let mut candidates: Vec<&Dish> = self
            .eligible
            .iter()
            .filter(|d| !session.used_dish_ids.contains(&d.id) && !played.contains(&d.id))
            .collect();

        if candidates.is_empty() {
            log::info!(
                "All {} dishes seen, starting a new rotation",
                self.eligible.len()
            );
            session.used_dish_ids.clear();
            candidates = self
                .eligible
                .iter()
                .filter(|d| !played.contains(&d.id))
                .collect();
            if candidates.is_empty() {
                // Catalog is smaller than the game
                candidates = self.eligible.iter().collect();
            }
        }

        let allowance = self.max_recent_repeats.saturating_sub(game.recent_repeats) as usize;
        let mut folded: HashSet<&DishId> = HashSet::new();
        if allowance > 0 {
            let in_pool: HashSet<&DishId> = candidates.iter().copied().map(|d| &d.id).collect();
            let recent: HashSet<&DishId> = session.recent_dish_ids.iter().collect();
            let mut extra: Vec<&Dish> = self
                .eligible
                .iter()
                .filter(|d| {
                    recent.contains(&d.id) && !in_pool.contains(&d.id) && !played.contains(&d.id)
                })
                .collect();
            extra.shuffle(rng);
            extra.truncate(allowance);
            folded.extend(extra.iter().copied().map(|d| &d.id));
            candidates.extend(extra);
        }

        candidates.shuffle(rng);
        let Some(&dish) = candidates.first() else {
            return Err(GameError::NoContentAvailable);
        };
        let recent_repeat = folded.contains(&dish.id);
        let dish = dish.clone();
        drop(played);

        let image_index = least_used_image(&dish, session);
        session.used_dish_ids.insert(dish.id.clone());
        record_image_use(session, &dish, image_index);

        game.played.push(dish.id.clone());
        if recent_repeat {
            game.recent_repeats += 1;
        }
        log::debug!(
            "Selected {} image {} from {} candidates{}",
            dish.id,
            image_index,
            candidates.len(),
            if recent_repeat { " (recent repeat)" } else { "" }
        );

        Ok(Selection {
            dish,
            image_index,
            recent_repeat,
        })
    }
}

/// Which image of `dish` to show next.
///
/// The first index never shown wins; once every image has been shown, the
/// one shown longest ago. Stored indices past the dish's image count are
/// ignored.
pub fn least_used_image(dish: &Dish, session: &SessionRecord) -> usize {
    let count = dish.image_count();
    let history: Vec<usize> = session
        .image_history(&dish.id)
        .iter()
        .copied()
        .filter(|&i| i < count)
        .collect();

    if let Some(unused) = (0..count).find(|i| !history.contains(i)) {
        return unused;
    }
    history.first().copied().unwrap_or(0)
}

/// Append `index` to the dish's usage history, keeping at most one entry
/// per image (oldest dropped first).
pub fn record_image_use(session: &mut SessionRecord, dish: &Dish, index: usize) {
    let count = dish.image_count();
    let history = session
        .used_images_by_dish
        .entry(dish.id.clone())
        .or_default();
    history.retain(|&i| i < count);
    history.push(index);
    if history.len() > count {
        let excess = history.len() - count;
        history.drain(..excess);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StaticCatalog;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn dish(id: &str, images: usize) -> Dish {
        Dish {
            id: DishId::from(id),
            name: id.to_uppercase(),
            latitude: 10.0,
            longitude: 20.0,
            images: (0..images).map(|i| format!("{id}-{i}.jpg")).collect(),
            origin_label: String::new(),
            description: String::new(),
        }
    }

    fn catalog(n: usize) -> StaticCatalog {
        StaticCatalog::new((0..n).map(|i| dish(&format!("d{i}"), 2)).collect())
    }

    #[test]
    fn test_lru_image_rotation() {
        let pasta = dish("pasta", 3);
        let mut session = SessionRecord::default();
        let mut seen = Vec::new();
        for _ in 0..5 {
            let idx = least_used_image(&pasta, &session);
            record_image_use(&mut session, &pasta, idx);
            seen.push(idx);
        }
        assert_eq!(seen, vec![0, 1, 2, 0, 1]);
        assert_eq!(session.image_history(&pasta.id), &[2, 0, 1]);
    }

    #[test]
    fn test_first_unused_image_fills_gaps() {
        let curry = dish("curry", 4);
        let mut session = SessionRecord::default();
        session
            .used_images_by_dish
            .insert(curry.id.clone(), vec![2, 0]);
        assert_eq!(least_used_image(&curry, &session), 1);
    }

    #[test]
    fn test_stale_image_indices_are_ignored() {
        let soup = dish("soup", 2);
        let mut session = SessionRecord::default();
        session
            .used_images_by_dish
            .insert(soup.id.clone(), vec![5, 1, 0]);
        // Index 5 no longer exists; 1 is the oldest real entry
        assert_eq!(least_used_image(&soup, &session), 1);
        record_image_use(&mut session, &soup, 1);
        assert_eq!(session.image_history(&soup.id), &[0, 1]);
    }

    #[test]
    fn test_empty_catalog_fails() {
        let selector = ContentSelector::new(&StaticCatalog::default(), 2);
        let mut rng = Pcg32::seed_from_u64(1);
        let result = selector.select_next_dish(
            &mut SessionRecord::default(),
            &mut GameSelection::new(),
            &mut rng,
        );
        assert_eq!(result, Err(GameError::NoContentAvailable));
    }

    #[test]
    fn test_imageless_dishes_are_never_eligible() {
        let catalog = StaticCatalog::new(vec![dish("a", 0), dish("b", 0)]);
        let selector = ContentSelector::new(&catalog, 2);
        assert_eq!(selector.eligible_count(), 0);
        let mut rng = Pcg32::seed_from_u64(1);
        assert!(
            selector
                .select_next_dish(
                    &mut SessionRecord::default(),
                    &mut GameSelection::new(),
                    &mut rng
                )
                .is_err()
        );

        let catalog = StaticCatalog::new(vec![dish("a", 0), dish("b", 1)]);
        let selector = ContentSelector::new(&catalog, 2);
        let pick = selector
            .select_next_dish(
                &mut SessionRecord::default(),
                &mut GameSelection::new(),
                &mut rng,
            )
            .unwrap();
        assert_eq!(pick.dish.id, DishId::from("b"));
        assert_eq!(pick.image(), "b-0.jpg");
    }

    #[test]
    fn test_exhaustion_resets_rotation() {
        let selector = ContentSelector::new(&catalog(3), 0);
        let mut session = SessionRecord::default();
        for i in 0..3 {
            session.used_dish_ids.insert(DishId::new(format!("d{i}")));
        }
        let mut rng = Pcg32::seed_from_u64(7);
        let pick = selector
            .select_next_dish(&mut session, &mut GameSelection::new(), &mut rng)
            .unwrap();
        assert_eq!(session.used_dish_ids.len(), 1);
        assert!(session.used_dish_ids.contains(&pick.dish.id));
    }

    #[test]
    fn test_small_catalog_repeats_within_game() {
        let selector = ContentSelector::new(&catalog(2), 0);
        let mut session = SessionRecord::default();
        let mut game = GameSelection::new();
        let mut rng = Pcg32::seed_from_u64(3);
        for _ in 0..6 {
            selector
                .select_next_dish(&mut session, &mut game, &mut rng)
                .unwrap();
        }
        assert_eq!(game.played().len(), 6);
        // The first two picks cover the catalog before anything repeats
        assert_ne!(game.played()[0], game.played()[1]);
    }

    #[test]
    fn test_recent_dishes_fold_in_at_most_twice() {
        // Every dish is recent and already seen except one fresh dish, so
        // the fold-in pool is large and the cap is what limits repeats.
        let selector = ContentSelector::new(&catalog(20), 2);
        for seed in 0..50 {
            let mut session = SessionRecord::default();
            for i in 1..20 {
                let id = DishId::new(format!("d{i}"));
                session.used_dish_ids.insert(id.clone());
                session.recent_dish_ids.push_back(id);
            }
            let mut game = GameSelection::new();
            let mut rng = Pcg32::seed_from_u64(seed);
            for _ in 0..6 {
                selector
                    .select_next_dish(&mut session, &mut game, &mut rng)
                    .unwrap();
            }
            assert!(game.recent_repeats() <= 2);
        }
    }

    #[test]
    fn test_fold_in_disabled() {
        let selector = ContentSelector::new(&catalog(8), 0);
        let mut session = SessionRecord::default();
        for i in 0..4 {
            let id = DishId::new(format!("d{i}"));
            session.used_dish_ids.insert(id.clone());
            session.recent_dish_ids.push_back(id);
        }
        let mut game = GameSelection::new();
        let mut rng = Pcg32::seed_from_u64(11);
        for _ in 0..4 {
            let pick = selector
                .select_next_dish(&mut session, &mut game, &mut rng)
                .unwrap();
            assert!(!pick.recent_repeat);
            let n: usize = pick.dish.id.as_str()[1..].parse().unwrap();
            assert!(n >= 4, "picked seen dish {}", pick.dish.id);
        }
    }

    #[test]
    fn test_selection_is_spread_across_catalog() {
        // Uniform pick: every dish shows up as a first pick for some seed
        let selector = ContentSelector::new(&catalog(5), 0);
        let mut firsts = HashSet::new();
        for seed in 0..200 {
            let mut rng = Pcg32::seed_from_u64(seed);
            let pick = selector
                .select_next_dish(
                    &mut SessionRecord::default(),
                    &mut GameSelection::new(),
                    &mut rng,
                )
                .unwrap();
            firsts.insert(pick.dish.id);
        }
        assert_eq!(firsts.len(), 5);
    }

    proptest! {
        #[test]
        fn prop_no_repeat_within_game(
            size in 6usize..30,
            seen in 0usize..30,
            recent in 0usize..18,
            seed in any::<u64>(),
        ) {
            let selector = ContentSelector::new(&catalog(size), 2);
            let mut session = SessionRecord::default();
            for i in 0..seen.min(size) {
                session.used_dish_ids.insert(DishId::new(format!("d{i}")));
            }
            for i in 0..recent.min(size) {
                session.recent_dish_ids.push_back(DishId::new(format!("d{i}")));
            }
            let mut game = GameSelection::new();
            let mut rng = Pcg32::seed_from_u64(seed);
            for _ in 0..6 {
                selector.select_next_dish(&mut session, &mut game, &mut rng).unwrap();
            }
            let unique: HashSet<&DishId> = game.played().iter().collect();
            prop_assert_eq!(unique.len(), 6);
            prop_assert!(game.recent_repeats() <= 2);
        }

        #[test]
        fn prop_image_history_stays_bounded(images in 1usize..6, picks in 1usize..40) {
            let d = dish("x", images);
            let mut session = SessionRecord::default();
            for _ in 0..picks {
                let idx = least_used_image(&d, &session);
                prop_assert!(idx < images);
                record_image_use(&mut session, &d, idx);
                prop_assert!(session.image_history(&d.id).len() <= images);
            }
        }
    }
}
