//! Administrator handlers: users, teams, games and results.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::NaiveDateTime;
use serde::Deserialize;
use tracing::{Span, field, info, instrument, warn};

use super::routes::{json_body, path_param};
use super::{AdminUser, ApiError, AppState, blocking};
use crate::db::{Game, NewGame, NewTeam, Team, User};

/// Body of `POST /api/admin/teams`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeamRequest {
    /// Short name, e.g. "Chiefs".
    pub name: String,
    /// Full name, e.g. "Kansas City Chiefs".
    pub display_name: String,
    /// Unique abbreviation, e.g. "KC".
    pub abbreviation: String,
    /// Optional logo URL.
    #[serde(default)]
    pub logo_url: Option<String>,
    /// Optional primary color.
    #[serde(default)]
    pub color: Option<String>,
}

/// Body of `POST /api/admin/games`.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGameRequest {
    /// Season year.
    pub season: i32,
    /// Week number, starting at 1.
    pub week: i32,
    /// Home team id.
    pub home_team_id: i32,
    /// Away team id.
    pub away_team_id: i32,
    /// Scheduled kickoff, UTC.
    pub start_time: NaiveDateTime,
}

/// Body of `POST /api/admin/games/{id}/result`.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordResultRequest {
    /// Final home score.
    pub home_score: i32,
    /// Final away score.
    pub away_score: i32,
}

#[instrument(skip_all, fields(admin_id = admin.id()))]
pub(super) async fn list_users(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
) -> Result<Json<Vec<User>>, ApiError> {
    let repository = state.repository().clone();
    let users = blocking(move || repository.list_users()).await?;
    Ok(Json(users))
}

#[instrument(skip_all, fields(admin_id = admin.id()))]
pub(super) async fn create_team(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    payload: Result<Json<CreateTeamRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Team>), ApiError> {
    let request = json_body(payload)?;
    let abbreviation = request.abbreviation.trim().to_uppercase();
    if abbreviation.is_empty() || request.name.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "name and abbreviation are required".to_string(),
        ));
    }

    let repository = state.repository().clone();
    let team = blocking(move || {
        repository.create_team(NewTeam::new(
            request.name,
            request.display_name,
            abbreviation,
            request.logo_url,
            request.color,
        ))
    })
    .await?;

    info!(team_id = team.id(), "Team created by admin");
    Ok((StatusCode::CREATED, Json(team)))
}

#[instrument(skip_all, fields(admin_id = admin.id()))]
pub(super) async fn create_game(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    payload: Result<Json<CreateGameRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Game>), ApiError> {
    let request = json_body(payload)?;
    if request.home_team_id == request.away_team_id {
        return Err(ApiError::BadRequest(
            "home and away teams must differ".to_string(),
        ));
    }
    if request.week < 1 {
        return Err(ApiError::BadRequest("week must be at least 1".to_string()));
    }

    let repository = state.repository().clone();
    let game = blocking(move || -> Result<Game, ApiError> {
        for team_id in [request.home_team_id, request.away_team_id] {
            if repository.get_team(team_id)?.is_none() {
                return Err(ApiError::NotFound(format!("Team {} not found", team_id)));
            }
        }
        Ok(repository.create_game(NewGame::new(
            request.season,
            request.week,
            request.home_team_id,
            request.away_team_id,
            request.start_time,
        ))?)
    })
    .await?;

    info!(game_id = game.id(), "Game created by admin");
    Ok((StatusCode::CREATED, Json(game)))
}

/// Records a final score. Only games that have kicked off can be scored,
/// so a result is never known while picks on the game are still open.
#[instrument(skip_all, fields(admin_id = admin.id(), game_id = field::Empty))]
pub(super) async fn record_result(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    path: Result<Path<i32>, PathRejection>,
    payload: Result<Json<RecordResultRequest>, JsonRejection>,
) -> Result<Json<Game>, ApiError> {
    let game_id = path_param(path)?;
    Span::current().record("game_id", game_id);
    let request = json_body(payload)?;
    if request.home_score < 0 || request.away_score < 0 {
        return Err(ApiError::BadRequest("scores cannot be negative".to_string()));
    }

    let repository = state.repository().clone();
    let now = state.clock().now();
    let game = blocking(move || -> Result<Game, ApiError> {
        let game = repository
            .get_game(game_id)?
            .ok_or_else(|| ApiError::NotFound("Game not found".to_string()))?;
        if !game.has_started(now) {
            warn!(start_time = %game.start_time(), "Result before kickoff refused");
            return Err(ApiError::BadRequest("Game has not started yet".to_string()));
        }
        repository
            .record_result(game_id, request.home_score, request.away_score)?
            .ok_or_else(|| ApiError::NotFound("Game not found".to_string()))
    })
    .await?;

    info!(
        home_score = request.home_score,
        away_score = request.away_score,
        "Result recorded by admin"
    );
    Ok(Json(game))
}
