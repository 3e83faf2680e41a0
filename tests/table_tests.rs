//! End-to-end table scenarios: a host replica and client replicas
//! exchanging requests and updates over a loopback "transport".

use cardtable::catalog::{CardCatalog, CardInfo};
use cardtable::core::{CardId, ParticipantId, PlayableId, PointerId, Vec2};
use cardtable::input::DragPhase;
use cardtable::sync::Request;
use cardtable::table::{
    CardAction, Color, FacePreference, Table, TableEvent, ZoneLayout, ZoneState,
};

// =============================================================================
// Harness
// =============================================================================

fn catalog() -> CardCatalog {
    let mut catalog = CardCatalog::new();
    for (id, name) in [(1, "Island"), (2, "Forest"), (3, "Mountain"), (4, "Swamp")] {
        catalog.register(CardInfo::new(CardId::new(id), name));
    }
    catalog
}

fn session(n_clients: u8) -> (Table, Vec<Table>) {
    let host_id = ParticipantId::new(0);
    let host = Table::host(host_id, catalog(), 42);
    let clients = (1..=n_clients)
        .map(|i| Table::client(ParticipantId::new(i), host_id, catalog()))
        .collect();
    (host, clients)
}

/// Deliver every queued request to the host and every queued update to the
/// clients, repeating until the session is quiet.
fn sync(host: &mut Table, clients: &mut [Table]) {
    loop {
        let mut quiet = true;
        let host_from = host.local();
        for request in host.drain_outbound() {
            quiet = false;
            host.host_apply(host_from, request);
        }
        for client in clients.iter_mut() {
            let from = client.local();
            for request in client.drain_outbound() {
                quiet = false;
                host.host_apply(from, request);
            }
        }
        let updates = host.drain_updates();
        if !updates.is_empty() {
            quiet = false;
        }
        for update in updates {
            for client in clients.iter_mut() {
                client.apply_update(update.clone());
            }
        }
        if quiet {
            return;
        }
    }
}

/// Run one full client drag from `from` to `to` and resolve the drop,
/// including the glide toward any placeholder.
fn drag_between(
    host: &mut Table,
    clients: &mut [Table],
    who: usize,
    object: PlayableId,
    from: Vec2,
    to: Vec2,
) -> Option<PlayableId> {
    let pointer = PointerId(0);
    clients[who].pointer_down(object, pointer, from);
    let dragged = clients[who].begin_drag(object, pointer, from)?;
    sync(host, clients); // authority grant arrives

    clients[who].drag(dragged, pointer, to);
    sync(host, clients);
    clients[who].end_drag(dragged, pointer, to);
    sync(host, clients);

    // Glide to the placeholder, if one was recorded.
    for _ in 0..300 {
        if clients[who].placeholder(dragged).is_none() {
            break;
        }
        clients[who].update(0.016);
        sync(host, clients);
    }
    sync(host, clients);
    Some(dragged)
}

// =============================================================================
// Spawning and convergence
// =============================================================================

/// A client-spawned playable appears on every replica without an id
/// round-trip.
#[test]
fn test_client_spawn_converges() {
    let (mut host, mut clients) = session(2);

    let card = clients[0].spawn_card(CardId::new(1), Vec2::new(10.0, 10.0));
    sync(&mut host, &mut clients);

    assert!(host.get(card).is_some());
    assert!(clients[1].get(card).is_some());
    assert_eq!(clients[1].get(card).unwrap().pos(), Vec2::new(10.0, 10.0));
    assert_eq!(card.spawner(), clients[0].local());
}

/// Two clients spawning concurrently never collide: ids come from disjoint
/// namespaces.
#[test]
fn test_concurrent_spawns_use_disjoint_ids() {
    let (mut host, mut clients) = session(2);

    let a = clients[0].spawn_card(CardId::new(1), Vec2::ZERO);
    let b = clients[1].spawn_card(CardId::new(2), Vec2::ZERO);
    sync(&mut host, &mut clients);

    assert_ne!(a, b);
    assert_eq!(host.len(), 2);
}

// =============================================================================
// Authority
// =============================================================================

/// Concurrent authority requests resolve by arrival order: the first
/// request wins on every replica, the loser gets nothing.
#[test]
fn test_authority_race_first_arrival_wins() {
    let (mut host, mut clients) = session(2);
    let card = host.spawn_card(CardId::new(1), Vec2::ZERO);
    sync(&mut host, &mut clients);

    // Both clients request; client 1's request reaches the host first.
    let winner = clients[1].local();
    host.host_apply(winner, Request::RequestAuthority { object: card });
    host.host_apply(clients[0].local(), Request::RequestAuthority { object: card });
    sync(&mut host, &mut clients);

    assert_eq!(host.holder(card), Some(winner));
    assert_eq!(clients[0].holder(card), Some(winner));
    assert_eq!(clients[1].holder(card), Some(winner));
}

/// A playable a remote participant once held keeps its foreign tint after
/// release; claiming it locally clears the tint.
#[test]
fn test_foreign_touch_tint_outlives_release() {
    let (mut host, mut clients) = session(2);
    let card = host.spawn_card(CardId::new(1), Vec2::ZERO);
    sync(&mut host, &mut clients);

    clients[0].request_authority(card);
    sync(&mut host, &mut clients);
    clients[0].release_authority(card);
    sync(&mut host, &mut clients);

    assert_eq!(clients[1].holder(card), None);
    assert!(clients[1].get(card).unwrap().foreign_touched);

    clients[1].request_authority(card);
    sync(&mut host, &mut clients);
    assert!(!clients[1].get(card).unwrap().foreign_touched);
}

/// Only the local authority holder's replica predicts position; everyone
/// else waits for the host's update.
#[test]
fn test_position_prediction_and_replication() {
    let (mut host, mut clients) = session(2);
    let card = host.spawn_card(CardId::new(1), Vec2::ZERO);
    let zone = host.spawn_zone(
        ZoneState::new(ZoneLayout::Area { grid: None }, Vec2::new(1000.0, 1000.0)),
        Vec2::ZERO,
    );
    sync(&mut host, &mut clients);
    let _ = zone;

    let pointer = PointerId(0);
    clients[0].pointer_down(card, pointer, Vec2::ZERO);
    clients[0].begin_drag(card, pointer, Vec2::ZERO);
    sync(&mut host, &mut clients);
    assert_eq!(clients[0].holder(card), Some(clients[0].local()));

    clients[0].drag(card, pointer, Vec2::new(40.0, 0.0));
    // Predicted immediately on the dragger.
    assert_eq!(clients[0].get(card).unwrap().pos(), Vec2::new(40.0, 0.0));
    // Not yet on anyone else.
    assert_eq!(clients[1].get(card).unwrap().pos(), Vec2::ZERO);

    sync(&mut host, &mut clients);
    assert_eq!(host.get(card).unwrap().pos(), Vec2::new(40.0, 0.0));
    assert_eq!(clients[1].get(card).unwrap().pos(), Vec2::new(40.0, 0.0));
}

/// A replica whose claim lost the race never moves the playable, not even
/// through the post-drop glide: every replica keeps the holder's view.
#[test]
fn test_lost_claim_never_moves_or_commits() {
    let (mut host, mut clients) = session(2);
    let zone = host.spawn_zone(
        ZoneState::new(ZoneLayout::Area { grid: None }, Vec2::new(400.0, 400.0)),
        Vec2::new(300.0, 0.0),
    );
    let card = host.spawn_card(CardId::new(1), Vec2::ZERO);
    sync(&mut host, &mut clients);

    // Client 1's claim reaches the host first.
    clients[1].request_authority(card);
    sync(&mut host, &mut clients);
    assert_eq!(host.holder(card), Some(clients[1].local()));

    let pointer = PointerId(0);
    clients[0].pointer_down(card, pointer, Vec2::ZERO);
    clients[0].begin_drag(card, pointer, Vec2::ZERO);
    sync(&mut host, &mut clients); // the claim loses silently
    clients[0].drag(card, pointer, Vec2::new(300.0, 0.0));
    clients[0].end_drag(card, pointer, Vec2::new(300.0, 0.0));
    sync(&mut host, &mut clients);
    for _ in 0..60 {
        clients[0].update(0.016);
        sync(&mut host, &mut clients);
    }

    // The losing replica neither moved nor reparented the card.
    assert_eq!(clients[0].get(card).unwrap().pos(), Vec2::ZERO);
    assert_eq!(host.get(card).unwrap().pos(), Vec2::ZERO);
    assert_eq!(host.get(card).unwrap().zone, None);
    assert_eq!(
        host.get(zone).unwrap().as_zone().unwrap().children(),
        &[] as &[PlayableId]
    );
    assert_eq!(host.holder(card), Some(clients[1].local()));
}

// =============================================================================
// Zones and drops
// =============================================================================

/// Dropping into a vertical list zone between two children slots the card
/// at the position-derived index on every replica.
#[test]
fn test_drop_into_vertical_zone_between_children() {
    let (mut host, mut clients) = session(2);
    let zone = host.spawn_zone(
        ZoneState::new(ZoneLayout::Vertical, Vec2::new(100.0, 400.0)),
        Vec2::new(200.0, 20.0),
    );
    // Children in descending Y, as a vertical list lays them out.
    let top = host.spawn_card(CardId::new(1), Vec2::new(200.0, 30.0));
    let mid = host.spawn_card(CardId::new(2), Vec2::new(200.0, 20.0));
    let bottom = host.spawn_card(CardId::new(3), Vec2::new(200.0, 10.0));
    sync(&mut host, &mut clients);
    for (i, child) in [top, mid, bottom].into_iter().enumerate() {
        let pos = host.get(child).unwrap().pos();
        host.host_apply(
            host.local(),
            Request::Reparent {
                object: child,
                zone: Some(zone),
                index: i,
                position: pos,
            },
        );
    }
    sync(&mut host, &mut clients);

    let dropped = host.spawn_card(CardId::new(4), Vec2::ZERO);
    sync(&mut host, &mut clients);

    // Client 0 drags the new card to Y=25, between the top two children.
    let _ = drag_between(
        &mut host,
        &mut clients,
        0,
        dropped,
        Vec2::ZERO,
        Vec2::new(200.0, 25.0),
    );

    let expected = vec![top, dropped, mid, bottom];
    assert_eq!(
        host.get(zone).unwrap().as_zone().unwrap().children(),
        expected.as_slice()
    );
    assert_eq!(
        clients[1].get(zone).unwrap().as_zone().unwrap().children(),
        expected.as_slice()
    );
    assert_eq!(clients[1].get(dropped).unwrap().zone, Some(zone));
    // Authority handed back after the commit.
    assert_eq!(host.holder(dropped), None);
}

/// A zone with a face preference flips cards as they arrive, on every
/// replica, and assigns its default action.
#[test]
fn test_zone_face_preference_and_default_action() {
    let (mut host, mut clients) = session(2);
    let mut discard = ZoneState::new(ZoneLayout::Vertical, Vec2::new(100.0, 400.0));
    discard.face_preference = FacePreference::Up;
    discard.default_action = Some(CardAction::Discard);
    let zone = host.spawn_zone(discard, Vec2::new(300.0, 0.0));

    let card = host.spawn_card(CardId::new(1), Vec2::ZERO);
    sync(&mut host, &mut clients);
    host.flip_card(card);
    sync(&mut host, &mut clients);
    assert!(clients[0].get(card).unwrap().as_card().unwrap().is_facedown());

    let _ = drag_between(
        &mut host,
        &mut clients,
        0,
        card,
        Vec2::ZERO,
        Vec2::new(300.0, 0.0),
    );

    for replica in std::iter::once(&host).chain(clients.iter()) {
        let state = replica.get(card).unwrap().as_card().unwrap();
        assert!(!state.is_facedown(), "face preference forces face up");
        assert_eq!(state.default_action, Some(CardAction::Discard));
    }
}

/// The first drop into a gridded area zone already lands on the nearest
/// cell, on every replica.
#[test]
fn test_area_drop_snaps_to_grid() {
    let (mut host, mut clients) = session(2);
    let zone = host.spawn_zone(
        ZoneState::new(
            ZoneLayout::Area { grid: Some(50.0) },
            Vec2::new(2000.0, 2000.0),
        ),
        Vec2::new(500.0, 500.0),
    );
    let card = host.spawn_card(CardId::new(1), Vec2::new(-600.0, -600.0));
    sync(&mut host, &mut clients);

    let _ = drag_between(
        &mut host,
        &mut clients,
        0,
        card,
        Vec2::new(-600.0, -600.0),
        Vec2::new(637.0, 662.0),
    );

    for replica in std::iter::once(&host).chain(clients.iter()) {
        let playable = replica.get(card).unwrap();
        assert_eq!(playable.zone, Some(zone));
        assert_eq!(playable.pos(), Vec2::new(650.0, 650.0));
    }
}

/// Dropping over empty table space discards the playable everywhere.
#[test]
fn test_empty_space_drop_discards() {
    let (mut host, mut clients) = session(2);
    let card = host.spawn_card(CardId::new(1), Vec2::ZERO);
    sync(&mut host, &mut clients);

    let _ = drag_between(
        &mut host,
        &mut clients,
        0,
        card,
        Vec2::ZERO,
        Vec2::new(999.0, 999.0),
    );

    assert!(host.get(card).is_none());
    assert!(clients[1].get(card).is_none());
    assert!(clients[1]
        .drain_events()
        .contains(&TableEvent::Discarded { object: card }));
}

/// An immediate-release zone commits the drop without any glide.
#[test]
fn test_immediate_release_zone_commits_on_drop() {
    let (mut host, mut clients) = session(1);
    let mut hand = ZoneState::new(ZoneLayout::Horizontal, Vec2::new(400.0, 100.0));
    hand.immediate_release = true;
    let zone = host.spawn_zone(hand, Vec2::new(0.0, -200.0));
    let card = host.spawn_card(CardId::new(1), Vec2::ZERO);
    sync(&mut host, &mut clients);

    let pointer = PointerId(0);
    clients[0].pointer_down(card, pointer, Vec2::ZERO);
    clients[0].begin_drag(card, pointer, Vec2::ZERO);
    sync(&mut host, &mut clients);
    clients[0].drag(card, pointer, Vec2::new(0.0, -200.0));
    clients[0].end_drag(card, pointer, Vec2::new(0.0, -200.0));
    sync(&mut host, &mut clients);

    // No glide needed: membership is already committed.
    assert!(clients[0].placeholder(card).is_none());
    assert_eq!(host.get(card).unwrap().zone, Some(zone));
    assert_eq!(
        host.get(zone).unwrap().as_zone().unwrap().children(),
        &[card]
    );
}

/// Dragging a card around inside a scrollable list forwards the gesture as
/// scrolling instead of moving the card.
#[test]
fn test_scrollable_list_forwards_drag() {
    let (mut host, mut clients) = session(1);
    let mut hand = ZoneState::new(ZoneLayout::Horizontal, Vec2::new(400.0, 100.0));
    hand.scrollable = true;
    let zone = host.spawn_zone(hand, Vec2::ZERO);
    let card = host.spawn_card(CardId::new(1), Vec2::ZERO);
    sync(&mut host, &mut clients);
    host.host_apply(
        host.local(),
        Request::Reparent {
            object: card,
            zone: Some(zone),
            index: 0,
            position: Vec2::ZERO,
        },
    );
    sync(&mut host, &mut clients);

    let pointer = PointerId(0);
    clients[0].pointer_down(card, pointer, Vec2::ZERO);
    clients[0].begin_drag(card, pointer, Vec2::ZERO);
    sync(&mut host, &mut clients);
    clients[0].drag(card, pointer, Vec2::new(50.0, 0.0)); // still inside
    sync(&mut host, &mut clients);

    let events = clients[0].drain_events();
    assert!(events.iter().any(|e| matches!(
        e,
        TableEvent::ScrollForwarded {
            zone: z,
            phase: DragPhase::Drag,
            ..
        } if *z == zone
    )));
    // The card never moved.
    assert_eq!(clients[0].get(card).unwrap().pos(), Vec2::ZERO);
}

// =============================================================================
// Stacks
// =============================================================================

/// A quick grab of a stack peels its top card into a fresh face-down
/// playable; the stack shrinks on every replica and the stack's authority
/// is handed back.
#[test]
fn test_drag_from_stack_peels_top_card() {
    let (mut host, mut clients) = session(2);
    let cards: Vec<CardId> = (1..=3).map(CardId::new).collect();
    let stack = host.spawn_stack("Deck", cards, Vec2::new(100.0, 100.0));
    sync(&mut host, &mut clients);

    let pointer = PointerId(0);
    clients[0].pointer_down(stack, pointer, Vec2::new(100.0, 100.0));
    let card = clients[0]
        .begin_drag(stack, pointer, Vec2::new(100.0, 100.0))
        .unwrap();
    assert_ne!(card, stack);
    sync(&mut host, &mut clients);

    // The top card (3) left the stack everywhere.
    for replica in std::iter::once(&host).chain(clients.iter()) {
        let s = replica.get(stack).unwrap().as_stack().unwrap();
        assert_eq!(s.cards(), &[CardId::new(1), CardId::new(2)]);
    }
    // The peeled card exists everywhere, face down, held by the dragger.
    assert!(clients[1].get(card).is_some());
    assert!(host.get(card).unwrap().as_card().unwrap().is_facedown());
    assert_eq!(host.holder(card), Some(clients[0].local()));
    assert_eq!(host.holder(stack), None);
}

/// Grabbing a stack someone else holds drags the whole stack instead of
/// peeling: no card is spawned, the order is untouched, and the claim
/// loses silently.
#[test]
fn test_quick_grab_of_held_stack_does_not_peel() {
    let (mut host, mut clients) = session(2);
    let cards: Vec<CardId> = (1..=3).map(CardId::new).collect();
    let stack = host.spawn_stack("Deck", cards.clone(), Vec2::new(100.0, 100.0));
    sync(&mut host, &mut clients);

    clients[1].request_authority(stack);
    sync(&mut host, &mut clients);
    assert_eq!(clients[0].holder(stack), Some(clients[1].local()));

    let before = host.len();
    let pointer = PointerId(0);
    clients[0].pointer_down(stack, pointer, Vec2::new(100.0, 100.0));
    let dragged = clients[0].begin_drag(stack, pointer, Vec2::new(100.0, 100.0));
    sync(&mut host, &mut clients);

    // The grab targets the stack itself; nothing new was spawned.
    assert_eq!(dragged, Some(stack));
    assert_eq!(host.len(), before);
    for replica in std::iter::once(&host).chain(clients.iter()) {
        let s = replica.get(stack).unwrap().as_stack().unwrap();
        assert_eq!(s.cards(), cards.as_slice());
    }
    assert_eq!(host.holder(stack), Some(clients[1].local()));
}

/// A shuffle replicates as a full order refresh; every replica ends with
/// the host's permutation.
#[test]
fn test_shuffle_converges_on_host_order() {
    let (mut host, mut clients) = session(2);
    let cards: Vec<CardId> = (1..=4).map(CardId::new).collect();
    let stack = host.spawn_stack("Deck", cards, Vec2::ZERO);
    sync(&mut host, &mut clients);

    clients[0].shuffle_stack(stack);
    sync(&mut host, &mut clients);

    let host_order = host.get(stack).unwrap().as_stack().unwrap().cards().to_vec();
    for client in &clients {
        assert_eq!(
            client.get(stack).unwrap().as_stack().unwrap().cards(),
            host_order.as_slice()
        );
    }
}

// =============================================================================
// Counters
// =============================================================================

/// Any participant may bump or recolor a counter without claiming it;
/// sequential adjustments from different clients converge everywhere.
#[test]
fn test_counter_adjust_and_recolor_converge() {
    let (mut host, mut clients) = session(2);
    let counter = host.spawn_counter(20, Vec2::ZERO);
    sync(&mut host, &mut clients);

    clients[0].adjust_counter(counter, -5);
    sync(&mut host, &mut clients);
    clients[1].adjust_counter(counter, 2);
    sync(&mut host, &mut clients);

    let red = Color::new(1.0, 0.0, 0.0, 1.0);
    clients[1].set_counter_color(counter, red);
    sync(&mut host, &mut clients);

    for replica in std::iter::once(&host).chain(clients.iter()) {
        let state = replica.get(counter).unwrap().as_counter().unwrap();
        assert_eq!(state.current(), 17);
        assert_eq!(*state.color.get(), red);
    }
    assert_eq!(host.view_value(counter), "Count: 17");
}

// =============================================================================
// Dice and previews
// =============================================================================

/// A die roll tumbles on the host and every replica converges on the final
/// value.
#[test]
fn test_die_roll_converges() {
    let (mut host, mut clients) = session(2);
    let die = host.spawn_die(1, 20, Vec2::ZERO);
    sync(&mut host, &mut clients);

    clients[0].roll_die(die);
    sync(&mut host, &mut clients);
    for _ in 0..120 {
        host.update(0.02);
        sync(&mut host, &mut clients);
    }

    let value = host.get(die).unwrap().as_die().unwrap().current();
    assert!((1..=20).contains(&value));
    for client in &clients {
        assert_eq!(client.get(die).unwrap().as_die().unwrap().current(), value);
    }
}

/// Resting a pointer on a playable long enough raises a one-shot preview
/// event.
#[test]
fn test_hold_to_preview() {
    let (mut host, mut clients) = session(1);
    let card = host.spawn_card(CardId::new(1), Vec2::ZERO);
    sync(&mut host, &mut clients);

    clients[0].pointer_down(card, PointerId(0), Vec2::ZERO);
    clients[0].update(0.3);
    assert!(!clients[0]
        .drain_events()
        .contains(&TableEvent::PreviewRequested { object: card }));

    clients[0].update(0.3);
    let events = clients[0].drain_events();
    assert!(events.contains(&TableEvent::PreviewRequested { object: card }));

    // Latched until the pointer lifts.
    clients[0].update(1.0);
    assert!(!clients[0]
        .drain_events()
        .contains(&TableEvent::PreviewRequested { object: card }));
}
