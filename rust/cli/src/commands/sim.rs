//! `sim`: whole games played through the shared-room protocol.
//!
//! Every seat is its own tokio task holding a [`SyncClient`]: it picks an
//! action from its last known state, submits it with the conditional commit
//! and then waits for the change stream. Seats that are not on turn still
//! declare and catch, so commits genuinely race. A turn timer runs alongside
//! as it would in a live room.

use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use cardroom_ai::{create_seeded_ai, AIPlayer, AI_KINDS};
use cardroom_engine::action::{Action, GameKind, GameState};
use cardroom_engine::cards::COLOR_CLASH_DECK_SIZE;
use cardroom_engine::logger::{format_record_id, ActionLogger, ActionRecord};
use cardroom_engine::player::PlayerId;
use cardroom_sync::{
    run_turn_timer, InMemoryRoomStore, RoomState, RoomStatus, RoomStore, SyncClient, SyncError,
    Version,
};

use super::{new_table, seat_names};
use crate::cli::GameArg;
use crate::config::{self, Config};
use crate::error::CliError;
use crate::ui;

/// Commits after which a game is abandoned and its room closed.
const MAX_COMMITS_PER_GAME: u64 = 20_000;

const TIMER_ID: &str = "turn-timer";

#[derive(Debug, Clone)]
pub struct SimOptions {
    pub game: GameArg,
    pub players: u8,
    pub games: u32,
    pub seed: Option<u64>,
    pub output: Option<String>,
    pub ai: String,
}

/// A commit won by one seat.
#[derive(Debug, Clone)]
struct Committed {
    version: Version,
    player_id: PlayerId,
    action: Action,
    attempts: u32,
}

#[derive(Debug, Default)]
struct SeatReport {
    commits: Vec<Committed>,
    conflicts: usize,
    stale: u32,
    resyncs: u32,
    observed: usize,
}

#[derive(Debug)]
struct GameReport {
    room_code: String,
    seed: u64,
    commits: Vec<Committed>,
    conflicts: usize,
    stale: u32,
    resyncs: u32,
    timeouts: u32,
    observed: usize,
    final_state: RoomState,
}

pub fn handle_sim_command(
    opts: SimOptions,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<(), CliError> {
    if opts.games == 0 {
        ui::write_error(err, "games must be >= 1")?;
        return Err(CliError::InvalidInput("games must be >= 1".to_string()));
    }
    if opts.players < 2 {
        ui::write_error(err, "a room needs at least 2 players")?;
        return Err(CliError::InvalidInput(
            "a room needs at least 2 players".to_string(),
        ));
    }
    if !AI_KINDS.contains(&opts.ai.as_str()) {
        let msg = format!("unknown ai {:?} (expected one of {:?})", opts.ai, AI_KINDS);
        ui::write_error(err, &msg)?;
        return Err(CliError::InvalidInput(msg));
    }
    let cfg = config::load().map_err(|e| CliError::Config(e.to_string()))?;
    let base_seed = opts.seed.or(cfg.seed).unwrap_or_else(rand::random);
    let kind = opts.game.kind();
    let seats = seat_names(opts.players);

    let mut logger = match &opts.output {
        Some(path) => match ActionLogger::create(path) {
            Ok(logger) => logger,
            Err(e) => {
                ui::write_error(err, &format!("Failed to open output file: {}", e))?;
                return Err(CliError::Io(e));
            }
        },
        None => ActionLogger::discard(),
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let (mut commits, mut conflicts, mut stale, mut timeouts) = (0usize, 0usize, 0u32, 0u32);
    for index in 0..opts.games {
        let seed = base_seed.wrapping_add(u64::from(index));
        let report = runtime.block_on(play_game(kind, &seats, seed, &cfg, &opts.ai))?;

        for c in &report.commits {
            logger.write(&ActionRecord {
                record_id: format_record_id(&report.room_code, c.version),
                room_code: report.room_code.clone(),
                game: kind,
                version: c.version,
                player_id: c.player_id.clone(),
                action: c.action.clone(),
                attempts: c.attempts,
                ts: None,
                meta: Some(serde_json::json!({ "game_index": index, "seed": seed })),
            })?;
        }

        writeln!(
            out,
            "Game {}/{} [room {} seed {}]: {} after {} commits (conflicts {}, stale {}, timeouts {}, resyncs {})",
            index + 1,
            opts.games,
            report.room_code,
            report.seed,
            describe_outcome(&report.final_state),
            report.commits.len(),
            report.conflicts,
            report.stale,
            report.timeouts,
            report.resyncs,
        )?;
        if !report
            .final_state
            .game
            .as_ref()
            .is_some_and(GameState::is_finished)
        {
            ui::display_warning(
                err,
                &format!("game {} in room {} was abandoned", index + 1, report.room_code),
            )?;
        }
        tracing::info!(
            room_code = %report.room_code,
            seed = report.seed,
            commits = report.commits.len(),
            observed = report.observed,
            "simulated game finished"
        );

        commits += report.commits.len();
        conflicts += report.conflicts;
        stale += report.stale;
        timeouts += report.timeouts;
    }

    writeln!(
        out,
        "Simulated {} game(s) of {}: {} commits, {} conflicts, {} stale actions, {} timeouts",
        opts.games,
        game_name(kind),
        commits,
        conflicts,
        stale,
        timeouts
    )?;
    if let Some(path) = &opts.output {
        writeln!(out, "Action log: {} ({} records)", path, logger.written())?;
    }
    Ok(())
}

fn game_name(kind: GameKind) -> &'static str {
    match kind {
        GameKind::ColorClash => "color-clash",
        GameKind::Flip21 => "flip21",
    }
}

fn describe_outcome(state: &RoomState) -> String {
    match state.game.as_ref() {
        Some(GameState::ColorClash(clash)) => match &clash.winner {
            Some(winner) => format!("{winner} won"),
            None => "unfinished".to_string(),
        },
        Some(GameState::Flip21(table)) if !table.results.is_empty() => table
            .results
            .iter()
            .map(|(player, result)| format!("{player} {result:?}").to_lowercase())
            .collect::<Vec<_>>()
            .join(", "),
        _ => "unfinished".to_string(),
    }
}

async fn play_game(
    kind: GameKind,
    seats: &[PlayerId],
    seed: u64,
    cfg: &Config,
    ai_kind: &str,
) -> Result<GameReport, CliError> {
    let settings = cfg.sync_settings();
    let store = Arc::new(InMemoryRoomStore::with_settings(&settings));
    let (host, guests) = seats
        .split_first()
        .ok_or_else(|| CliError::InvalidInput("no players".into()))?;
    let room_code = store.create_room(host)?.room_code;
    for guest in guests {
        store.join_room(&room_code, guest)?;
    }
    for seat in seats {
        store.set_ready(&room_code, seat, true)?;
    }
    store.start_prepared_game(
        &room_code,
        new_table(kind, seats.to_vec(), seed, cfg.hand_size)?,
    )?;
    let shared: Arc<dyn RoomStore> = store.clone();

    // every client is connected before the first commit
    let timer = SyncClient::connect(shared.clone(), &room_code, TIMER_ID, settings.clone())?;
    let mut clients = Vec::with_capacity(seats.len());
    for seat in seats {
        clients.push(SyncClient::connect(
            shared.clone(),
            &room_code,
            seat,
            settings.clone(),
        )?);
    }

    let timer_task = tokio::spawn(run_turn_timer(timer));
    let budget = Arc::new(AtomicU64::new(0));
    let mut tasks = Vec::with_capacity(clients.len());
    for (n, client) in clients.into_iter().enumerate() {
        let ai: Arc<dyn AIPlayer> = create_seeded_ai(ai_kind, seed.wrapping_add(n as u64))
            .map(Arc::from)
            .ok_or_else(|| CliError::InvalidInput(format!("unknown ai {ai_kind:?}")))?;
        tasks.push(tokio::spawn(play_seat(
            client,
            ai,
            store.clone(),
            budget.clone(),
        )));
    }

    let mut seat_reports = Vec::with_capacity(tasks.len());
    let mut first_error = None;
    for task in tasks {
        match task.await {
            Ok(Ok(report)) => seat_reports.push(report),
            Ok(Err(e)) => {
                first_error.get_or_insert(e);
            }
            Err(join) => {
                first_error.get_or_insert(CliError::Invariant(format!("seat task failed: {join}")));
            }
        }
    }
    let final_state = store.current_room_state(&room_code)?;
    store.close_room(&room_code)?;
    let timeouts = timer_task
        .await
        .map_err(|join| CliError::Invariant(format!("turn timer failed: {join}")))??;
    if let Some(e) = first_error {
        return Err(e);
    }

    let mut commits: Vec<Committed> = Vec::new();
    let (mut conflicts, mut stale, mut resyncs, mut observed) = (0, 0, 0, 0);
    for report in seat_reports {
        commits.extend(report.commits);
        conflicts += report.conflicts;
        stale += report.stale;
        resyncs += report.resyncs;
        observed += report.observed;
    }
    commits.sort_by_key(|c| c.version);
    if let Some(pair) = commits.windows(2).find(|w| w[0].version == w[1].version) {
        return Err(CliError::Invariant(format!(
            "{} and {} both committed version {}",
            pair[0].player_id, pair[1].player_id, pair[0].version
        )));
    }

    Ok(GameReport {
        room_code,
        seed,
        commits,
        conflicts,
        stale,
        resyncs,
        timeouts,
        observed,
        final_state,
    })
}

/// Runs one seat; a failing seat closes the room so the others stop too.
async fn play_seat(
    mut client: SyncClient,
    ai: Arc<dyn AIPlayer>,
    store: Arc<InMemoryRoomStore>,
    budget: Arc<AtomicU64>,
) -> Result<SeatReport, CliError> {
    let result = seat_loop(&mut client, ai.as_ref(), &store, &budget).await;
    if let Err(e) = &result {
        if let CliError::Sync(sync_error) = e {
            sync_error.log(client.room_code());
        }
        tracing::warn!(
            room_code = %client.room_code(),
            player_id = %client.player_id(),
            error = %e,
            "seat failed, closing room"
        );
        let _ = store.close_room(client.room_code());
    }
    result
}

async fn seat_loop(
    client: &mut SyncClient,
    ai: &dyn AIPlayer,
    store: &InMemoryRoomStore,
    budget: &AtomicU64,
) -> Result<SeatReport, CliError> {
    let mut report = SeatReport::default();
    loop {
        client.poll_changes();
        let state = client.last_known().clone();
        check_conservation(&state)?;
        report.observed += 1;
        if state.status == RoomStatus::Closed {
            break;
        }
        let Some(game) = state.game.as_ref() else {
            break;
        };
        if game.is_finished() {
            break;
        }

        if let Some(action) = ai.choose_action(game, client.player_id()) {
            match client.submit(&action) {
                Ok(receipt) => {
                    report.conflicts += receipt.conflicts();
                    report.commits.push(Committed {
                        version: receipt.version,
                        player_id: client.player_id().to_string(),
                        action,
                        attempts: receipt.attempts,
                    });
                    if budget.fetch_add(1, Ordering::Relaxed) + 1 >= MAX_COMMITS_PER_GAME {
                        tracing::warn!(
                            room_code = %client.room_code(),
                            limit = MAX_COMMITS_PER_GAME,
                            "commit limit reached, abandoning game"
                        );
                        store.close_room(client.room_code())?;
                    }
                }
                Err(SyncError::StaleAction { .. }) => report.stale += 1,
                Err(SyncError::RoomClosed(_)) => break,
                Err(e) => return Err(e.into()),
            }
        }

        if client.next_change().await.is_none() {
            match client.resync() {
                Ok(_) => report.resyncs += 1,
                Err(SyncError::RoomClosed(_)) | Err(SyncError::RoomNotFound(_)) => break,
                Err(e) => return Err(e.into()),
            }
        }
    }
    Ok(report)
}

fn check_conservation(state: &RoomState) -> Result<(), CliError> {
    if let Some(GameState::ColorClash(clash)) = &state.game {
        let total = clash.total_cards();
        if total != COLOR_CLASH_DECK_SIZE {
            return Err(CliError::Invariant(format!(
                "room {} version {} holds {} cards",
                state.room_code, state.version, total
            )));
        }
    }
    Ok(())
}
