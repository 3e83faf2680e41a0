//! Property tests for the replication invariants: single-writer authority,
//! permutation-preserving shuffles, and layout index bounds.

use std::collections::HashMap;

use proptest::prelude::*;

use cardtable::core::{CardId, ParticipantId, PlayableId, TableRng, Vec2};
use cardtable::sync::AuthorityArbiter;
use cardtable::table::{insertion_index, StackState, ZoneLayout};

/// Repeated shuffles of a three-card stack hit all six orderings at
/// frequencies a chi-squared test accepts as uniform (df = 5, p = 0.001).
#[test]
fn shuffle_frequencies_are_uniform() {
    const TRIALS: usize = 6000;
    let cards: Vec<CardId> = (1..=3).map(CardId::new).collect();
    let mut rng = TableRng::new(42);

    let mut counts: HashMap<Vec<CardId>, usize> = HashMap::new();
    for _ in 0..TRIALS {
        let mut stack = StackState::new("Deck", cards.clone());
        stack.shuffle(&mut rng);
        *counts.entry(stack.cards().to_vec()).or_insert(0) += 1;
    }

    assert_eq!(counts.len(), 6, "some orderings never occurred: {counts:?}");
    let expected = TRIALS as f64 / 6.0;
    let chi2: f64 = counts
        .values()
        .map(|&n| {
            let d = n as f64 - expected;
            d * d / expected
        })
        .sum();
    assert!(chi2 < 20.52, "chi2 = {chi2:.2}, counts = {counts:?}");
}

proptest! {
    /// However many participants race for a playable, exactly one holds it
    /// afterward, and it is the first in arrival order.
    #[test]
    fn authority_race_grants_exactly_one(
        requesters in proptest::collection::vec(0u8..8, 1..20),
        object in 1u32..1000,
    ) {
        let object = PlayableId(object);
        let mut arbiter = AuthorityArbiter::new();

        let mut winner = None;
        for &r in &requesters {
            let requester = ParticipantId::new(r);
            let granted = arbiter.request(object, requester);
            match winner {
                None => {
                    prop_assert!(granted);
                    winner = Some(requester);
                }
                Some(w) => prop_assert_eq!(granted, w == requester),
            }
        }
        prop_assert_eq!(arbiter.holder(object), winner);
    }

    /// Releases from non-holders never free the playable.
    #[test]
    fn only_holder_can_release(
        holder in 0u8..4,
        releasers in proptest::collection::vec(0u8..8, 0..20),
    ) {
        let object = PlayableId(1);
        let holder = ParticipantId::new(holder);
        let mut arbiter = AuthorityArbiter::new();
        arbiter.request(object, holder);

        let mut held = true;
        for &r in &releasers {
            let releaser = ParticipantId::new(r);
            if arbiter.release(object, releaser) {
                prop_assert!(held, "release succeeded on an unheld playable");
                prop_assert_eq!(releaser, holder);
                held = false;
            }
        }
        prop_assert_eq!(arbiter.is_held(object), held);
    }

    /// A shuffle is a permutation: same multiset of identities, and the
    /// same seed reproduces the same order.
    #[test]
    fn shuffle_is_deterministic_permutation(
        ids in proptest::collection::vec(1u32..10_000, 0..64),
        seed in any::<u64>(),
    ) {
        let cards: Vec<CardId> = ids.iter().copied().map(CardId::new).collect();
        let mut a = StackState::new("Deck", cards.clone());
        let mut b = StackState::new("Deck", cards.clone());

        a.shuffle(&mut TableRng::new(seed));
        b.shuffle(&mut TableRng::new(seed));
        prop_assert_eq!(a.cards(), b.cards());

        let mut sorted = a.cards().to_vec();
        sorted.sort_by_key(|c| c.0);
        let mut original = cards;
        original.sort_by_key(|c| c.0);
        prop_assert_eq!(sorted, original);
    }

    /// The layout engine always yields an index within the post-removal
    /// child count.
    #[test]
    fn insertion_index_is_in_bounds(
        ys in proptest::collection::vec(-500f32..500.0, 0..16),
        target_y in -600f32..600.0,
        current in proptest::option::of(0usize..16),
    ) {
        let positions: Vec<Vec2> = ys.iter().map(|&y| Vec2::new(0.0, y)).collect();
        let current = current.filter(|&c| c < positions.len());

        let index = insertion_index(
            ZoneLayout::Vertical,
            &positions,
            Vec2::new(0.0, target_y),
            current,
        );

        let limit = if current.is_some() {
            positions.len().saturating_sub(1)
        } else {
            positions.len()
        };
        prop_assert!(index <= limit, "index {} exceeds {}", index, limit);
    }

    /// For a column already sorted in descending Y, insertion at the
    /// computed index keeps it sorted.
    #[test]
    fn insertion_preserves_descending_order(
        mut ys in proptest::collection::vec(-500f32..500.0, 0..16),
        target_y in -600f32..600.0,
    ) {
        ys.sort_by(|a, b| b.partial_cmp(a).unwrap());
        let positions: Vec<Vec2> = ys.iter().map(|&y| Vec2::new(0.0, y)).collect();

        let index = insertion_index(
            ZoneLayout::Vertical,
            &positions,
            Vec2::new(0.0, target_y),
            None,
        );

        let mut with_target = ys.clone();
        with_target.insert(index, target_y);
        for pair in with_target.windows(2) {
            prop_assert!(pair[0] >= pair[1], "column no longer descending: {:?}", with_target);
        }
    }
}
