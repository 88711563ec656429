//! WASM bindings for the dashboard

#![cfg(feature = "wasm")]

use wasm_bindgen::prelude::*;
use crate::{
    describe_strategy as describe, finalize_game, settle_round, GameConfig, PlayerId, RoundInput,
    RoundSettlement, Strategy,
};

fn parse_config(config_json: &str) -> Result<GameConfig, JsError> {
    let config: GameConfig = if config_json.trim().is_empty() {
        GameConfig::standard()
    } else {
        serde_json::from_str(config_json)
            .map_err(|e| JsError::new(&format!("Invalid config: {}", e)))?
    };
    config.validate()
        .map_err(|e| JsError::new(&format!("Invalid config: {}", e)))?;
    Ok(config)
}

/// Settle one round
///
/// # Arguments
/// * `round_json` - JSON `RoundInput`
/// * `players_json` - JSON array of active player ids, in seating order
/// * `config_json` - JSON `GameConfig`, or empty for the standard setup
///
/// # Returns
/// JSON serialized RoundSettlement
#[wasm_bindgen]
pub fn settle_round_json(
    round_json: &str,
    players_json: &str,
    config_json: &str,
) -> Result<JsValue, JsError> {
    let round: RoundInput = serde_json::from_str(round_json)
        .map_err(|e| JsError::new(&format!("Invalid round: {}", e)))?;
    let players: Vec<PlayerId> = serde_json::from_str(players_json)
        .map_err(|e| JsError::new(&format!("Invalid players: {}", e)))?;
    let config = parse_config(config_json)?;

    let settlement = settle_round(&round, &players, &config)
        .map_err(|e| JsError::new(&e.to_string()))?;

    serde_wasm_bindgen::to_value(&settlement)
        .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
}

/// Rankings and cooperation trend from a JSON array of settled rounds
#[wasm_bindgen]
pub fn finalize_game_json(rounds_json: &str) -> Result<JsValue, JsError> {
    let rounds: Vec<RoundSettlement> = serde_json::from_str(rounds_json)
        .map_err(|e| JsError::new(&format!("Invalid rounds: {}", e)))?;

    let result = finalize_game(&rounds)
        .map_err(|e| JsError::new(&e.to_string()))?;

    serde_wasm_bindgen::to_value(&result)
        .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
}

/// The standard game configuration as JSON
#[wasm_bindgen]
pub fn default_config_json() -> Result<String, JsError> {
    serde_json::to_string(&GameConfig::standard())
        .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
}

/// Get human-readable description of a scripted strategy
#[wasm_bindgen]
pub fn describe_strategy(strategy_json: &str) -> Result<String, JsError> {
    let strategy: Strategy = serde_json::from_str(strategy_json)
        .map_err(|e| JsError::new(&format!("Invalid strategy: {}", e)))?;

    Ok(describe(&strategy))
}
