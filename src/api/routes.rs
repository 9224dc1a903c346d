//! Player-facing handlers.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{Span, field, info, instrument};

use super::{ApiError, AppState, CurrentUser, blocking};
use crate::db::{Game, GameStatus, PickDetail, PickFilter, Team, User};
use crate::leaderboard::{Leaderboard, LeaderboardScope};

/// A game plus its status at request time.
#[derive(Debug, Clone, Serialize)]
pub struct GameView {
    #[serde(flatten)]
    game: Game,
    status: GameStatus,
}

/// Query string for `GET /api/picks`.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickQuery {
    /// Only this game.
    pub game_id: Option<i32>,
    /// Week number; requires `season`.
    pub week: Option<i32>,
    /// Season year; requires `week`.
    pub season: Option<i32>,
}

impl PickQuery {
    /// Resolves the query to a filter. A game id wins over week/season.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::BadRequest`] if only one of week and season is given.
    pub fn filter(&self) -> Result<PickFilter, ApiError> {
        match (self.game_id, self.week, self.season) {
            (Some(game_id), _, _) => Ok(PickFilter::Game(game_id)),
            (None, Some(week), Some(season)) => Ok(PickFilter::Week { week, season }),
            (None, None, None) => Ok(PickFilter::All),
            _ => Err(ApiError::BadRequest(
                "week and season must be given together".to_string(),
            )),
        }
    }
}

/// Query string narrowing games or the leaderboard.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ScopeQuery {
    /// Season year.
    pub season: Option<i32>,
    /// Week number.
    pub week: Option<i32>,
}

impl ScopeQuery {
    /// Resolves to a leaderboard scope.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::BadRequest`] if a week is given without a season.
    pub fn scope(&self) -> Result<LeaderboardScope, ApiError> {
        match (self.season, self.week) {
            (None, None) => Ok(LeaderboardScope::AllTime),
            (Some(season), None) => Ok(LeaderboardScope::Season(season)),
            (Some(season), Some(week)) => Ok(LeaderboardScope::Week { week, season }),
            (None, Some(_)) => Err(ApiError::BadRequest("week requires season".to_string())),
        }
    }
}

/// Body of `POST /api/picks`.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitPickRequest {
    /// Game picked on.
    pub game_id: i32,
    /// Team picked to win.
    pub team_id: i32,
}

pub(super) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

pub(super) fn path_param<T>(path: Result<Path<T>, PathRejection>) -> Result<T, ApiError> {
    path.map(|Path(value)| value)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

pub(super) fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    query
        .map(|Query(value)| value)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

pub(super) async fn health() -> &'static str {
    "ok"
}

#[instrument(skip_all, fields(user_id = user.id()))]
pub(super) async fn me(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}

#[instrument(skip_all)]
pub(super) async fn list_teams(State(state): State<AppState>) -> Result<Json<Vec<Team>>, ApiError> {
    let repository = state.repository().clone();
    let teams = blocking(move || repository.list_teams()).await?;
    Ok(Json(teams))
}

#[instrument(skip_all)]
pub(super) async fn list_games(
    State(state): State<AppState>,
    query: Result<Query<ScopeQuery>, QueryRejection>,
) -> Result<Json<Vec<GameView>>, ApiError> {
    let query = query_params(query)?;
    let repository = state.repository().clone();
    let games = blocking(move || repository.list_games(query.season, query.week)).await?;
    let now = state.clock().now();
    Ok(Json(
        games
            .into_iter()
            .map(|game| GameView {
                status: game.status(now),
                game,
            })
            .collect(),
    ))
}

#[instrument(skip_all, fields(game_id = field::Empty))]
pub(super) async fn get_game(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<GameView>, ApiError> {
    let game_id = path_param(path)?;
    Span::current().record("game_id", game_id);
    let repository = state.repository().clone();
    let game = blocking(move || repository.get_game(game_id))
        .await?
        .ok_or_else(|| ApiError::NotFound("Game not found".to_string()))?;
    Ok(Json(GameView {
        status: game.status(state.clock().now()),
        game,
    }))
}

#[instrument(skip_all, fields(user_id = user.id()))]
pub(super) async fn list_picks(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    query: Result<Query<PickQuery>, QueryRejection>,
) -> Result<Json<Vec<PickDetail>>, ApiError> {
    let filter = query_params(query)?.filter()?;
    let validator = state.validator();
    let user_id = *user.id();
    let picks = blocking(move || validator.list_picks(user_id, filter)).await?;
    Ok(Json(picks))
}

#[instrument(skip_all, fields(user_id = user.id()))]
pub(super) async fn submit_pick(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<SubmitPickRequest>, JsonRejection>,
) -> Result<Json<PickDetail>, ApiError> {
    let request = json_body(payload)?;
    let validator = state.validator();
    let now = state.clock().now();
    let user_id = *user.id();

    let pick = blocking(move || {
        validator.submit_pick(user_id, request.game_id, request.team_id, now)
    })
    .await?;

    info!(game_id = request.game_id, team_id = request.team_id, "Pick submitted");
    Ok(Json(pick))
}

#[instrument(skip_all, fields(user_id = user.id(), game_id = field::Empty))]
pub(super) async fn retract_pick(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    path: Result<Path<i32>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let game_id = path_param(path)?;
    Span::current().record("game_id", game_id);
    let validator = state.validator();
    let now = state.clock().now();
    let user_id = *user.id();

    blocking(move || validator.retract_pick(user_id, game_id, now)).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip_all)]
pub(super) async fn leaderboard(
    State(state): State<AppState>,
    query: Result<Query<ScopeQuery>, QueryRejection>,
) -> Result<Json<Leaderboard>, ApiError> {
    let scope = query_params(query)?.scope()?;
    let repository = state.repository().clone();
    let board = blocking(move || Leaderboard::load(&repository, scope)).await?;
    Ok(Json(board))
}
