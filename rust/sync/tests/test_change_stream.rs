use std::sync::Arc;
use std::time::Duration;

use cardroom_engine::action::{timeout_action, Action, GameKind};
use cardroom_sync::{
    commit_with_retry, enforce_turn_deadline, DeadlineOutcome,
    InMemoryRoomStore, RoomStore, SyncClient, SyncSettings,
};
use tokio_stream::StreamExt;

fn started(settings: &SyncSettings, kind: GameKind) -> (Arc<InMemoryRoomStore>, String) {
    let store = Arc::new(InMemoryRoomStore::with_settings(settings));
    let code = store.create_room("a").unwrap().room_code;
    store.join_room(&code, "b").unwrap();
    store.set_ready(&code, "a", true).unwrap();
    store.set_ready(&code, "b", true).unwrap();
    store.start_game(&code, kind, 31).unwrap();
    (store, code)
}

#[tokio::test]
async fn subscription_delivers_changes_in_commit_order() {
    let settings = SyncSettings::default();
    let store = Arc::new(InMemoryRoomStore::with_settings(&settings));
    let code = store.create_room("a").unwrap().room_code;
    let mut changes = store.subscribe_to_changes(&code).unwrap();

    store.join_room(&code, "b").unwrap();
    store.set_ready(&code, "a", true).unwrap();
    store.set_ready(&code, "b", true).unwrap();

    let versions: Vec<u64> = (&mut changes).take(3).map(|s| s.version).collect().await;
    assert_eq!(versions, vec![2, 3, 4]);
}

#[tokio::test]
async fn slow_client_is_cut_off_and_resyncs() {
    let settings = SyncSettings {
        event_buffer: 2,
        ..Default::default()
    };
    let (store, code) = started(&settings, GameKind::ColorClash);
    let mut lagging = SyncClient::connect(store.clone(), &code, "b", settings.clone()).unwrap();

    for _ in 0..3 {
        let current = store.current_room_state(&code).unwrap();
        let (player, action) = timeout_action(current.game.as_ref().unwrap()).unwrap();
        commit_with_retry(store.as_ref(), &current, &player, &action, 1).unwrap();
    }

    // drain what fit in the buffer, then the stream ends
    while lagging.next_change().await.is_some() {}
    assert!(lagging.is_disconnected());
    assert!(lagging.last_known().version < store.current_room_state(&code).unwrap().version);

    let resynced = lagging.resync().unwrap().version;
    assert_eq!(resynced, store.current_room_state(&code).unwrap().version);
    assert!(!lagging.is_disconnected());
}

#[tokio::test]
async fn duplicate_and_old_versions_are_ignored() {
    let settings = SyncSettings::default();
    let (store, code) = started(&settings, GameKind::ColorClash);
    let mut client = SyncClient::connect(store.clone(), &code, "a", settings).unwrap();
    let stale = client.last_known().clone();

    // replay an old document through the bus; the client keeps its view
    store.event_bus().broadcast(&stale);
    assert_eq!(client.poll_changes(), 0);
    assert_eq!(client.last_known(), &stale);
}

#[tokio::test(start_paused = true)]
async fn player_acting_in_time_beats_the_timer() {
    let settings = SyncSettings::default();
    let (store, code) = started(&settings, GameKind::Flip21);
    let mut timer = SyncClient::connect(store.clone(), &code, "timer", settings.clone()).unwrap();
    let Some(holder) = timer
        .last_known()
        .game
        .as_ref()
        .and_then(|g| g.current_player().cloned())
    else {
        return;
    };

    let actor_store = store.clone();
    let actor = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(5)).await;
        let snapshot = actor_store.current_room_state(&code).unwrap();
        commit_with_retry(actor_store.as_ref(), &snapshot, &holder, &Action::Stand, 3)
    });

    let outcome = enforce_turn_deadline(&mut timer, Duration::from_secs(30))
        .await
        .unwrap();
    let receipt = actor.await.unwrap().unwrap();
    assert_eq!(
        outcome,
        DeadlineOutcome::Advanced {
            version: receipt.version
        }
    );
}
