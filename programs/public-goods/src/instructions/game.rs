//! Round lifecycle: automated moves, deadlines, settlement and finalization

use std::collections::BTreeMap;
use settlement_logic::{
    advance_round, finalize_game, resolve_decision, DecisionContext, DecisionSource, Fallback,
    GameResult, PlayedRound, PlayerId, RandomSource, RoundAdvance, RoundLedger, SeededRng,
};
use crate::config::PlatformConfig;
use crate::error::PlatformError;
use crate::instructions::player::MoveOutcome;
use crate::state::{GameEvent, GameSession, GameStatus, OpenRound, PlayerKind};

/// Decision source per automated seat
pub type SeatSources = BTreeMap<PlayerId, Box<dyn DecisionSource>>;

/// Open `round` with a fresh ledger over every seated player.
pub(crate) fn open_round(
    session: &mut GameSession,
    round: u32,
    now: i64,
) -> Result<(), PlatformError> {
    let ledger = RoundLedger::new(round, session.config.tokens_per_round, session.player_ids())?;
    install_round(session, ledger, now);
    Ok(())
}

fn install_round(session: &mut GameSession, ledger: RoundLedger, now: i64) {
    let round = ledger.round_number();
    let deadline = now.saturating_add(session.move_timeout_secs.min(i64::MAX as u64) as i64);
    session.current_round = round;
    session.open_round = Some(OpenRound { ledger, opened_at: now, deadline });
    session.log(GameEvent::RoundOpened { round, deadline, at: now });
}

/// What follows a settled round, worked out before the session changes
enum AfterSettle {
    Open(RoundLedger),
    Finish(GameResult),
}

/// Settle the open round if every seat has moved, then open the next round
/// or finalize the game.
pub(crate) fn settle_if_complete(session: &mut GameSession, now: i64) -> Result<MoveOutcome, PlatformError> {
    let status = session.status;
    let open = session
        .open_round
        .as_ref()
        .ok_or(PlatformError::InvalidState { status })?;
    if !open.ledger.is_complete() {
        return Ok(MoveOutcome::Accepted);
    }

    let round = open.round_number();
    let settlement = open.ledger.settle(&session.config)?;
    let moves = open.ledger.moves().to_vec();

    let after = match advance_round(round, session.config.rounds_per_game)? {
        RoundAdvance::Next(next_round) => AfterSettle::Open(RoundLedger::new(
            next_round,
            session.config.tokens_per_round,
            session.player_ids(),
        )?),
        RoundAdvance::Finalize => {
            let mut settled = session.settlements();
            settled.push(settlement.clone());
            AfterSettle::Finish(finalize_game(&settled)?)
        }
    };

    log::info!(
        "Game {} round {} settled: pool {} tokens, payouts ${:.2}",
        session.id,
        round,
        settlement.pool_total,
        settlement.total_payoff(),
    );

    session.open_round = None;
    session.rounds.push(PlayedRound { settlement: settlement.clone(), moves });
    session.log(GameEvent::RoundSettled { settlement, at: now });

    match after {
        AfterSettle::Open(ledger) => {
            let next_round = ledger.round_number();
            install_round(session, ledger, now);
            Ok(MoveOutcome::RoundComplete { next_round })
        }
        AfterSettle::Finish(result) => {
            if let Some(winner) = result.winner() {
                log::info!(
                    "Game {} finalized after {} rounds, winner {} with ${:.2}",
                    session.id,
                    result.total_rounds,
                    winner.player_id,
                    winner.total_earnings,
                );
            }
            session.status = GameStatus::Completed;
            session.finished_at = Some(now);
            session.result = Some(result.clone());
            session.log(GameEvent::GameFinalized { result, at: now });
            Ok(MoveOutcome::GameComplete)
        }
    }
}

/// Decision sources for every automated seat.
///
/// Dev-random seats, and agent seats in dev mode, get seeded random sources.
/// Agent seats otherwise get whatever `agent` builds for their model.
/// Human seats get nothing.
pub fn automated_sources<F>(session: &GameSession, config: &PlatformConfig, mut agent: F) -> SeatSources
where
    F: FnMut(&str) -> Box<dyn DecisionSource>,
{
    let rng = session.rng(config.seed);
    let mut sources = SeatSources::new();
    for player in &session.players {
        let source: Box<dyn DecisionSource> = match &player.kind {
            PlayerKind::Human => continue,
            PlayerKind::DevRandom => Box::new(RandomSource::new(rng.clone())),
            PlayerKind::Agent { .. } if config.dev_mode => Box::new(RandomSource::new(rng.clone())),
            PlayerKind::Agent { model } => agent(model),
            PlayerKind::Scripted { strategy } => Box::new(*strategy),
        };
        sources.insert(player.id.clone(), source);
    }
    sources
}

/// Ask each automated seat that has not moved yet for its investment.
///
/// Seats without an entry in `sources` are left for the deadline. A source
/// that fails or answers out of range gets `fallback` instead.
pub fn collect_automated_moves(
    session: &mut GameSession,
    sources: &mut SeatSources,
    fallback: Fallback,
    rng: &SeededRng,
    now: i64,
) -> Result<MoveOutcome, PlatformError> {
    require!(
        session.status == GameStatus::Active,
        PlatformError::InvalidState { status: session.status }
    );

    let history = session.settlements();
    let seats: Vec<(u32, PlayerId)> = session
        .players
        .iter()
        .filter(|p| p.kind.is_automated())
        .map(|p| (p.position, p.id.clone()))
        .collect();

    for (seat, player_id) in seats {
        let status = session.status;
        let open = session
            .open_round
            .as_mut()
            .ok_or(PlatformError::InvalidState { status })?;
        if open.ledger.has_moved(&player_id) {
            continue;
        }
        let Some(source) = sources.get_mut(&player_id) else {
            continue;
        };

        let round = open.round_number();
        let endowment = open.ledger.endowment();
        let ctx = DecisionContext {
            player: &player_id,
            seat,
            round_number: round,
            endowment,
            config: &session.config,
            history: &history,
        };
        let mut fallback_rng = rng.for_seat(u32::MAX - seat, round);
        let resolved = resolve_decision(source.decide(&ctx), endowment, fallback, &mut fallback_rng);

        if let Some(error) = &resolved.error {
            log::warn!(
                "Game {} round {}: {} ({}) failed to decide, using {:?} fallback: {}",
                session.id,
                round,
                player_id,
                source.label(),
                fallback,
                error,
            );
            open.ledger.record_fallback(&player_id, resolved.invested)?;
        } else {
            open.ledger.record(&player_id, resolved.invested as i64)?;
        }

        session.log(GameEvent::MoveRecorded {
            round,
            player: player_id.clone(),
            invested: resolved.invested,
            fallback: resolved.fallback,
            at: now,
        });
        log::info!(
            "Game {} round {}: {} invested {} of {}",
            session.id,
            round,
            player_id,
            resolved.invested,
            endowment,
        );
    }

    settle_if_complete(session, now)
}

/// Fill every missing move with `fallback` once the round deadline has passed,
/// then settle.
pub fn close_expired_round(
    session: &mut GameSession,
    fallback: Fallback,
    rng: &SeededRng,
    now: i64,
) -> Result<MoveOutcome, PlatformError> {
    require!(
        session.status == GameStatus::Active,
        PlatformError::InvalidState { status: session.status }
    );
    let status = session.status;
    let open = session
        .open_round
        .as_mut()
        .ok_or(PlatformError::InvalidState { status })?;
    let round = open.round_number();
    require!(
        open.is_expired(now),
        PlatformError::RoundStillOpen { round, deadline: open.deadline }
    );

    let endowment = open.ledger.endowment();
    let missing = open.ledger.missing_players();
    let mut filled = Vec::with_capacity(missing.len());
    for player_id in missing {
        let seat = open
            .ledger
            .active_players()
            .iter()
            .position(|p| p == &player_id)
            .unwrap_or_default() as u32;
        let invested = fallback.pick(endowment, &mut rng.for_seat(u32::MAX - seat, round));
        open.ledger.record_fallback(&player_id, invested)?;
        filled.push((player_id, invested));
    }

    for (player_id, invested) in filled {
        log::warn!(
            "Game {} round {}: {} missed the deadline, recorded {}",
            session.id,
            round,
            player_id,
            invested,
        );
        session.log(GameEvent::MoveRecorded {
            round,
            player: player_id,
            invested,
            fallback: true,
            at: now,
        });
    }

    settle_if_complete(session, now)
}

/// Play an active game with automated seats only until it completes.
pub fn play_to_completion(
    session: &mut GameSession,
    sources: &mut SeatSources,
    fallback: Fallback,
    rng: &SeededRng,
    now: i64,
) -> Result<GameResult, PlatformError> {
    match session.status {
        GameStatus::Active => {}
        GameStatus::Waiting => {
            return Err(PlatformError::NotEnoughPlayers {
                joined: session.players.len() as u32,
                required: session.config.num_players,
            });
        }
        status => return Err(PlatformError::InvalidState { status }),
    }
    let unsourced = session
        .players
        .iter()
        .find(|p| !sources.contains_key(&p.id) || !p.kind.is_automated());
    if let Some(player) = unsourced {
        return Err(PlatformError::NoDecisionSource { player: player.id.clone() });
    }

    loop {
        match collect_automated_moves(session, sources, fallback, rng, now)? {
            MoveOutcome::GameComplete => break,
            MoveOutcome::RoundComplete { .. } => {}
            // Every seat is automated and has a source, so a round always completes
            MoveOutcome::Accepted => {
                return Err(PlatformError::InvalidState { status: session.status });
            }
        }
    }

    session
        .result
        .clone()
        .ok_or(PlatformError::InvalidState { status: session.status })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instructions::admin::create_game;
    use crate::instructions::player::{join_game, submit_move};
    use settlement_logic::{DecisionError, SettlementError, Strategy};

    struct Broken;

    impl DecisionSource for Broken {
        fn decide(&mut self, _ctx: &DecisionContext<'_>) -> Result<u32, DecisionError> {
            Err(DecisionError::Model("connection reset".to_string()))
        }

        fn label(&self) -> String {
            "broken".to_string()
        }
    }

    fn config(rounds: u32) -> PlatformConfig {
        let mut config = PlatformConfig::default();
        config.game.rounds_per_game = rounds;
        config
    }

    fn seated(config: &PlatformConfig, kinds: Vec<PlayerKind>) -> GameSession {
        let mut session = create_game("g1", config, 0).unwrap();
        for (i, kind) in kinds.into_iter().enumerate() {
            join_game(&mut session, format!("P{}", i + 1), kind, 0).unwrap();
        }
        session
    }

    #[test]
    fn test_scripted_game_plays_to_completion() {
        let config = config(15);
        let mut session = seated(&config, vec![
            PlayerKind::Scripted { strategy: Strategy::FullContributor },
            PlayerKind::Scripted { strategy: Strategy::FreeRider },
            PlayerKind::Scripted { strategy: Strategy::FreeRider },
            PlayerKind::Scripted { strategy: Strategy::FreeRider },
        ]);
        let mut sources = automated_sources(&session, &config, |_| Box::new(Broken));
        let rng = session.rng(config.seed);

        let result = play_to_completion(&mut session, &mut sources, Fallback::Zero, &rng, 100).unwrap();
        assert_eq!(session.status, GameStatus::Completed);
        assert_eq!(result.total_rounds, 15);
        assert_eq!(result.rankings.last().unwrap().player_id, PlayerId::from("p1"));
        assert!(session.open_round.is_none());
        assert!(matches!(session.events().last(), Some(GameEvent::GameFinalized { .. })));
    }

    #[test]
    fn test_failed_finalize_leaves_round_open() {
        let config = config(2);
        let mut session = seated(&config, vec![PlayerKind::Human; 4]);
        let players = session.player_ids();
        for player in &players {
            submit_move(&mut session, player, 2, 1).unwrap();
        }
        // A settled history that no longer numbers 1..=n cannot be finalized
        session.rounds[0].settlement.round_number = 7;
        let events_before = session.events().len();

        for player in &players[..3] {
            submit_move(&mut session, player, 1, 2).unwrap();
        }
        let err = submit_move(&mut session, &players[3], 1, 3).unwrap_err();
        assert!(matches!(err, PlatformError::Settlement(SettlementError::InvalidRound { .. })));

        assert_eq!(session.status, GameStatus::Active);
        assert_eq!(session.rounds.len(), 1);
        assert!(session.result.is_none());
        let open = session.open_round.as_ref().unwrap();
        assert_eq!(open.round_number(), 2);
        assert!(open.ledger.is_complete());
        // Only the four round-2 moves were logged
        assert_eq!(session.events().len(), events_before + 4);
    }

    #[test]
    fn test_failing_agent_falls_back() {
        let config = config(2);
        let mut session = seated(&config, vec![
            PlayerKind::Agent { model: "m".to_string() },
            PlayerKind::Scripted { strategy: Strategy::Fixed(3) },
            PlayerKind::DevRandom,
            PlayerKind::Human,
        ]);
        let mut sources = automated_sources(&session, &config, |_| Box::new(Broken));
        assert_eq!(sources.len(), 3);
        let rng = session.rng(config.seed);

        let outcome = collect_automated_moves(&mut session, &mut sources, Fallback::Zero, &rng, 1).unwrap();
        assert_eq!(outcome, MoveOutcome::Accepted);
        let moves = session.pending_moves();
        assert_eq!(moves.len(), 3);
        assert_eq!(moves[0].invested, 0);
        assert!(moves[0].fallback);
        assert_eq!(moves[1].invested, 3);
        assert!(!moves[1].fallback);

        // Asking again does not record twice
        collect_automated_moves(&mut session, &mut sources, Fallback::Zero, &rng, 2).unwrap();
        assert_eq!(session.pending_moves().len(), 3);

        let human = PlayerId::from("p4");
        assert_eq!(
            submit_move(&mut session, &human, 5, 3).unwrap(),
            MoveOutcome::RoundComplete { next_round: 2 }
        );
    }

    #[test]
    fn test_dev_mode_agents_play_random() {
        let mut config = config(3);
        config.dev_mode = true;
        let agents = (0..4).map(|_| PlayerKind::Agent { model: "m".to_string() }).collect();
        let mut session = seated(&config, agents);
        let mut sources = automated_sources(&session, &config, |_| Box::new(Broken));
        let rng = session.rng(config.seed);

        play_to_completion(&mut session, &mut sources, Fallback::Zero, &rng, 0).unwrap();
        for round in &session.rounds {
            assert!(round.moves.iter().all(|m| !m.fallback && m.invested <= 5));
        }
    }

    #[test]
    fn test_deadline_fills_missing_moves() {
        let config = config(15);
        let mut session = seated(&config, vec![PlayerKind::Human; 4]);
        let rng = session.rng(config.seed);
        submit_move(&mut session, &PlayerId::from("p2"), 4, 10).unwrap();

        assert_eq!(
            close_expired_round(&mut session, Fallback::Zero, &rng, 59).unwrap_err(),
            PlatformError::RoundStillOpen { round: 1, deadline: 60 }
        );
        assert_eq!(session.pending_moves().len(), 1);

        assert_eq!(
            close_expired_round(&mut session, Fallback::Zero, &rng, 60).unwrap(),
            MoveOutcome::RoundComplete { next_round: 2 }
        );
        let moves = &session.rounds[0].moves;
        assert_eq!(moves.len(), 4);
        assert_eq!(moves.iter().filter(|m| m.fallback).count(), 3);
        assert_eq!(session.rounds[0].settlement.pool_total, 4);
        assert_eq!(session.open_round.as_ref().unwrap().deadline, 120);
    }

    #[test]
    fn test_play_requires_full_automated_table() {
        let config = config(15);
        let mut waiting = create_game("g2", &config, 0).unwrap();
        join_game(&mut waiting, "a", PlayerKind::DevRandom, 0).unwrap();
        let rng = waiting.rng(1);
        assert_eq!(
            play_to_completion(&mut waiting, &mut SeatSources::new(), Fallback::Zero, &rng, 0).unwrap_err(),
            PlatformError::NotEnoughPlayers { joined: 1, required: 4 }
        );

        let mut session = seated(&config, vec![
            PlayerKind::DevRandom,
            PlayerKind::Human,
            PlayerKind::DevRandom,
            PlayerKind::DevRandom,
        ]);
        let mut sources = automated_sources(&session, &config, |_| Box::new(Broken));
        assert_eq!(
            play_to_completion(&mut session, &mut sources, Fallback::Zero, &rng, 0).unwrap_err(),
            PlatformError::NoDecisionSource { player: PlayerId::from("p2") }
        );
    }

    #[test]
    fn test_completed_game_rejects_moves() {
        let config = config(1);
        let mut session = seated(&config, vec![PlayerKind::Human; 4]);
        let rng = session.rng(config.seed);
        assert_eq!(
            close_expired_round(&mut session, Fallback::Random, &rng, 60).unwrap(),
            MoveOutcome::GameComplete
        );
        assert_eq!(session.status, GameStatus::Completed);
        assert!(session.result.is_some());
        assert_eq!(
            submit_move(&mut session, &PlayerId::from("p1"), 1, 61).unwrap_err(),
            PlatformError::InvalidState { status: GameStatus::Completed }
        );
    }
}
