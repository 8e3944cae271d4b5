//! Action dispatcher - maps named client actions onto lobby operations

use tracing::debug;

use crate::game::{Direction, GameError, MatchId, PlayerProfile};
use crate::http::middleware::AuthenticatedPlayer;
use crate::http::protocol::{
    ActionParams, ActionResponse, ClientAction, CreateMatchResponse, JoinMatchResponse,
    SetDirectionResponse,
};
use crate::lobby::LobbyService;

/// Color used when the client does not pick one
pub const DEFAULT_COLOR: &str = "#000000";

/// Accept `#rrggbb`; fall back to the default when absent
pub fn validate_color(color: Option<String>) -> Result<String, GameError> {
    let Some(color) = color.map(|c| c.trim().to_string()) else {
        return Ok(DEFAULT_COLOR.to_string());
    };
    if color.is_empty() {
        return Ok(DEFAULT_COLOR.to_string());
    }

    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());
    if valid {
        Ok(color.to_ascii_lowercase())
    } else {
        Err(GameError::InvalidRequest(format!("invalid color: {color}")))
    }
}

fn require_match_id(raw: Option<String>) -> Result<MatchId, GameError> {
    let raw = raw.ok_or_else(|| GameError::InvalidRequest("missing match_id".to_string()))?;
    MatchId::parse(raw.trim())
}

impl TryFrom<ActionParams> for ClientAction {
    type Error = GameError;

    fn try_from(params: ActionParams) -> Result<Self, Self::Error> {
        let action = params
            .action
            .ok_or_else(|| GameError::InvalidRequest("missing action".to_string()))?;

        // Older clients use the lobby-era names
        match action.as_str() {
            "create_match" | "create_lobby" => Ok(ClientAction::CreateMatch {
                color: validate_color(params.color)?,
            }),
            "join_match" | "join_game" => Ok(ClientAction::JoinMatch {
                match_id: require_match_id(params.match_id)?,
                color: validate_color(params.color)?,
            }),
            "list_open_matches" | "list_games" => Ok(ClientAction::ListOpenMatches),
            "get_state" => Ok(ClientAction::GetState {
                match_id: require_match_id(params.match_id)?,
            }),
            "set_direction" => {
                let match_id = require_match_id(params.match_id)?;
                let direction: Direction = params.direction.unwrap_or_default().parse()?;
                Ok(ClientAction::SetDirection { match_id, direction })
            }
            "ping" => Ok(ClientAction::Ping {
                match_id: require_match_id(params.match_id)?,
                client_timestamp: params.client_timestamp.unwrap_or(0.0),
            }),
            other => Err(GameError::InvalidAction(other.to_string())),
        }
    }
}

/// Run one action on behalf of an authenticated player
pub fn dispatch(
    lobby: &LobbyService,
    player: &AuthenticatedPlayer,
    action: ClientAction,
) -> Result<ActionResponse, GameError> {
    debug!(player_id = %player.player_id, action = ?action, "Dispatching action");

    let profile = |color: String| PlayerProfile {
        id: player.player_id.clone(),
        name: player.display_name.clone(),
        color,
    };

    match action {
        ClientAction::CreateMatch { color } => {
            let (match_id, player_slot) = lobby.create_match(profile(color));
            Ok(ActionResponse::Created(CreateMatchResponse {
                match_id,
                player_slot,
            }))
        }
        ClientAction::JoinMatch { match_id, color } => {
            let player_slot = lobby.join_match(&match_id, profile(color))?;
            Ok(ActionResponse::Joined(JoinMatchResponse {
                match_id,
                player_slot,
            }))
        }
        ClientAction::ListOpenMatches => Ok(ActionResponse::OpenMatches(lobby.list_open())),
        ClientAction::GetState { match_id } => {
            let view = lobby.get_state(&match_id, &player.player_id)?;
            Ok(ActionResponse::State(Box::new(view)))
        }
        ClientAction::SetDirection {
            match_id,
            direction,
        } => {
            let accepted = lobby.set_direction(&match_id, &player.player_id, direction)?;
            Ok(ActionResponse::Direction(SetDirectionResponse {
                accepted,
                reason: (!accepted).then_some("Cannot reverse direction"),
            }))
        }
        ClientAction::Ping {
            match_id,
            client_timestamp,
        } => Ok(ActionResponse::Pong(lobby.ping(
            &match_id,
            &player.player_id,
            client_timestamp,
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(action: &str) -> ActionParams {
        ActionParams {
            action: Some(action.to_string()),
            ..ActionParams::default()
        }
    }

    #[test]
    fn unknown_action_is_invalid_action() {
        let err = ClientAction::try_from(params("teleport")).unwrap_err();
        assert_eq!(err, GameError::InvalidAction("teleport".to_string()));
    }

    #[test]
    fn missing_match_id_is_invalid_request() {
        let err = ClientAction::try_from(params("get_state")).unwrap_err();
        assert!(matches!(err, GameError::InvalidRequest(_)));
    }

    #[test]
    fn bad_direction_is_invalid_direction() {
        let mut p = params("set_direction");
        p.match_id = Some(MatchId::generate().to_string());
        p.direction = Some("sideways".to_string());
        let err = ClientAction::try_from(p).unwrap_err();
        assert_eq!(err, GameError::InvalidDirection("sideways".to_string()));
    }

    #[test]
    fn legacy_names_map_to_current_actions() {
        assert_eq!(
            ClientAction::try_from(params("list_games")).unwrap(),
            ClientAction::ListOpenMatches
        );
        assert_eq!(
            ClientAction::try_from(params("create_lobby")).unwrap(),
            ClientAction::CreateMatch {
                color: DEFAULT_COLOR.to_string()
            }
        );
    }

    #[test]
    fn colors_are_validated() {
        assert_eq!(validate_color(None).unwrap(), DEFAULT_COLOR);
        assert_eq!(validate_color(Some("#A1B2C3".into())).unwrap(), "#a1b2c3");
        assert!(validate_color(Some("red".into())).is_err());
        assert!(validate_color(Some("#12345".into())).is_err());
    }

    #[test]
    fn ping_without_timestamp_defaults_to_zero() {
        let mut p = params("ping");
        let id = MatchId::generate();
        p.match_id = Some(id.to_string());
        assert_eq!(
            ClientAction::try_from(p).unwrap(),
            ClientAction::Ping {
                match_id: id,
                client_timestamp: 0.0
            }
        );
    }
}
