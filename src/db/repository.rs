//! SQLite repository for teams, users, games and picks.

use chrono::NaiveDateTime;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{debug, info, instrument, warn};

use crate::db::{
    DbError, DbErrorKind, Game, GradedPick, NewGame, NewPick, NewTeam, NewUser, Pick, PickDetail,
    PickFilter, Team, User, schema,
};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Database repository for pick'em data.
///
/// Holds only the database path; every operation opens its own connection so
/// the repository is cheap to clone into blocking tasks.
#[derive(Debug, Clone)]
pub struct PickemRepository {
    db_path: String,
}

impl PickemRepository {
    /// Creates a repository for the SQLite database at `db_path`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the path is empty.
    #[instrument(skip(db_path), fields(db_path = %db_path))]
    pub fn new(db_path: String) -> Result<Self, DbError> {
        if db_path.trim().is_empty() {
            return Err(DbError::with_kind(
                DbErrorKind::Connection,
                "Database path must not be empty",
            ));
        }
        info!(path = %db_path, "Creating PickemRepository");
        Ok(Self { db_path })
    }

    /// Path this repository connects to.
    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    /// Establishes a database connection with foreign keys enforced.
    #[instrument(skip(self))]
    fn connection(&self) -> Result<SqliteConnection, DbError> {
        debug!(path = %self.db_path, "Establishing connection");
        let mut conn = SqliteConnection::establish(&self.db_path).map_err(|e| {
            DbError::with_kind(
                DbErrorKind::Connection,
                format!("Failed to connect to '{}': {}", self.db_path, e),
            )
        })?;
        conn.batch_execute("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")
            .map_err(|e| {
                DbError::with_kind(
                    DbErrorKind::Connection,
                    format!("Failed to configure connection: {}", e),
                )
            })?;
        Ok(conn)
    }

    /// Applies any pending embedded migrations. Returns how many ran.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a migration fails.
    #[instrument(skip(self))]
    pub fn migrate(&self) -> Result<usize, DbError> {
        let mut conn = self.connection()?;
        let applied = conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
            DbError::with_kind(DbErrorKind::Migration, format!("Migrations failed: {}", e))
        })?;
        info!(count = applied.len(), "Migrations applied");
        Ok(applied.len())
    }

    /// Runs `f` inside one transaction on one connection. Any error rolls
    /// back every write `f` made.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the connection fails or `f` returns an error.
    #[instrument(skip_all)]
    pub fn transaction<T, F>(&self, f: F) -> Result<T, DbError>
    where
        F: FnOnce(&mut Transaction<'_>) -> Result<T, DbError>,
    {
        let mut conn = self.connection()?;
        let result = conn.transaction(|conn| f(&mut Transaction { conn }));
        if let Err(e) = &result {
            warn!(error = %e, "Transaction rolled back");
        }
        result
    }

    // ─────────────────────────────────────────────────────────────
    //  Teams
    // ─────────────────────────────────────────────────────────────

    /// Creates a team.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the abbreviation is taken or a database error occurs.
    #[instrument(skip(self, team), fields(abbreviation = %team.abbreviation()))]
    pub fn create_team(&self, team: NewTeam) -> Result<Team, DbError> {
        let mut conn = self.connection()?;

        let team = diesel::insert_into(schema::teams::table)
            .values(&team)
            .returning(Team::as_returning())
            .get_result(&mut conn)?;

        info!(team_id = team.id(), abbreviation = %team.abbreviation(), "Team created");
        Ok(team)
    }

    /// Inserts a team, or refreshes the display fields of the team that
    /// already holds the abbreviation.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self, team), fields(abbreviation = %team.abbreviation()))]
    pub fn upsert_team(&self, team: NewTeam) -> Result<Team, DbError> {
        let mut conn = self.connection()?;
        upsert_team(&mut conn, &team)
    }

    /// Gets a team by id. Returns `None` if not found.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn get_team(&self, team_id: i32) -> Result<Option<Team>, DbError> {
        let mut conn = self.connection()?;
        let team = schema::teams::table
            .find(team_id)
            .select(Team::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(team)
    }

    /// Gets a team by abbreviation. Returns `None` if not found.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn get_team_by_abbreviation(&self, abbreviation: &str) -> Result<Option<Team>, DbError> {
        let mut conn = self.connection()?;
        let team = schema::teams::table
            .filter(schema::teams::abbreviation.eq(abbreviation))
            .select(Team::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(team)
    }

    /// Lists all teams ordered by abbreviation.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn list_teams(&self) -> Result<Vec<Team>, DbError> {
        let mut conn = self.connection()?;
        let teams = schema::teams::table
            .order(schema::teams::abbreviation.asc())
            .select(Team::as_select())
            .load(&mut conn)?;
        debug!(count = teams.len(), "Teams loaded");
        Ok(teams)
    }

    // ─────────────────────────────────────────────────────────────
    //  Users
    // ─────────────────────────────────────────────────────────────

    /// Creates a user profile.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the display name is already taken or a database error occurs.
    #[instrument(skip(self, user))]
    pub fn create_user(&self, user: NewUser) -> Result<User, DbError> {
        let mut conn = self.connection()?;

        let user = diesel::insert_into(schema::users::table)
            .values(&user)
            .returning(User::as_returning())
            .get_result(&mut conn)?;

        info!(user_id = user.id(), display_name = %user.display_name(), "User created");
        Ok(user)
    }

    /// Gets a user by id. Returns `None` if not found.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn get_user(&self, user_id: i32) -> Result<Option<User>, DbError> {
        let mut conn = self.connection()?;
        let user = schema::users::table
            .find(user_id)
            .select(User::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(user)
    }

    /// Gets a user by display name. Returns `None` if not found.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn get_user_by_name(&self, display_name: &str) -> Result<Option<User>, DbError> {
        let mut conn = self.connection()?;
        let user = schema::users::table
            .filter(schema::users::display_name.eq(display_name))
            .select(User::as_select())
            .first(&mut conn)
            .optional()?;

        if user.is_none() {
            debug!(display_name = %display_name, "User not found");
        }
        Ok(user)
    }

    /// Lists all users ordered by creation time.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn list_users(&self) -> Result<Vec<User>, DbError> {
        let mut conn = self.connection()?;
        let users = schema::users::table
            .order((schema::users::created_at.asc(), schema::users::id.asc()))
            .select(User::as_select())
            .load(&mut conn)?;
        debug!(count = users.len(), "Users loaded");
        Ok(users)
    }

    /// Grants or revokes the administrative flag. Returns `None` if the user
    /// does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn set_admin(&self, user_id: i32, is_admin: bool) -> Result<Option<User>, DbError> {
        let mut conn = self.connection()?;
        let user = diesel::update(schema::users::table.find(user_id))
            .set((
                schema::users::is_admin.eq(is_admin),
                schema::users::updated_at.eq(diesel::dsl::now),
            ))
            .returning(User::as_returning())
            .get_result(&mut conn)
            .optional()?;

        match &user {
            Some(_) => info!(user_id, is_admin, "Admin flag updated"),
            None => warn!(user_id, "Cannot update admin flag of unknown user"),
        }
        Ok(user)
    }

    // ─────────────────────────────────────────────────────────────
    //  Games
    // ─────────────────────────────────────────────────────────────

    /// Creates a game.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a team does not exist, the matchup is already
    /// scheduled that week, or a database error occurs.
    #[instrument(skip(self, game), fields(season = game.season(), week = game.week()))]
    pub fn create_game(&self, game: NewGame) -> Result<Game, DbError> {
        let mut conn = self.connection()?;

        let game = diesel::insert_into(schema::games::table)
            .values(&game)
            .returning(Game::as_returning())
            .get_result(&mut conn)?;

        info!(
            game_id = game.id(),
            home = game.home_team_id(),
            away = game.away_team_id(),
            start_time = %game.start_time(),
            "Game created"
        );
        Ok(game)
    }

    /// Inserts a game, or moves the start time of the game already scheduled
    /// for the same (season, week, home, away).
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a team does not exist or a database error occurs.
    #[instrument(skip(self, game), fields(season = game.season(), week = game.week()))]
    pub fn upsert_game(&self, game: NewGame) -> Result<Game, DbError> {
        let mut conn = self.connection()?;
        upsert_game(&mut conn, &game)
    }

    /// Gets a game by id. Returns `None` if not found.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn get_game(&self, game_id: i32) -> Result<Option<Game>, DbError> {
        let mut conn = self.connection()?;
        let game = schema::games::table
            .find(game_id)
            .select(Game::as_select())
            .first(&mut conn)
            .optional()?;

        if game.is_none() {
            debug!(game_id, "Game not found");
        }
        Ok(game)
    }

    /// Lists games ordered by start time, optionally narrowed to a season
    /// and/or week.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn list_games(&self, season: Option<i32>, week: Option<i32>) -> Result<Vec<Game>, DbError> {
        let mut conn = self.connection()?;

        let mut query = schema::games::table
            .select(Game::as_select())
            .order((schema::games::start_time.asc(), schema::games::id.asc()))
            .into_boxed();
        if let Some(season) = season {
            query = query.filter(schema::games::season.eq(season));
        }
        if let Some(week) = week {
            query = query.filter(schema::games::week.eq(week));
        }

        let games = query.load(&mut conn)?;
        debug!(count = games.len(), "Games loaded");
        Ok(games)
    }

    /// Records the final score and marks the game completed. Returns `None`
    /// if the game does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn record_result(
        &self,
        game_id: i32,
        home_score: i32,
        away_score: i32,
    ) -> Result<Option<Game>, DbError> {
        let mut conn = self.connection()?;

        let game = diesel::update(schema::games::table.find(game_id))
            .set((
                schema::games::home_score.eq(Some(home_score)),
                schema::games::away_score.eq(Some(away_score)),
                schema::games::completed.eq(true),
            ))
            .returning(Game::as_returning())
            .get_result(&mut conn)
            .optional()?;

        match &game {
            Some(_) => info!(game_id, home_score, away_score, "Result recorded"),
            None => warn!(game_id, "Cannot record result of unknown game"),
        }
        Ok(game)
    }

    // ─────────────────────────────────────────────────────────────
    //  Picks
    // ─────────────────────────────────────────────────────────────

    /// Inserts the pick for (user, game) or overwrites its team, in one
    /// statement so concurrent submissions for the same pair serialize.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a referenced row is missing or a database error occurs.
    #[instrument(skip(self))]
    pub fn upsert_pick(
        &self,
        user_id: i32,
        game_id: i32,
        team_id: i32,
        now: NaiveDateTime,
    ) -> Result<Pick, DbError> {
        let mut conn = self.connection()?;

        let new_pick = NewPick::new(user_id, game_id, team_id, now, now);
        let pick = diesel::insert_into(schema::picks::table)
            .values(&new_pick)
            .on_conflict((schema::picks::user_id, schema::picks::game_id))
            .do_update()
            .set((
                schema::picks::team_id.eq(team_id),
                schema::picks::updated_at.eq(now),
            ))
            .returning(Pick::as_returning())
            .get_result(&mut conn)?;

        info!(pick_id = pick.id(), user_id, game_id, team_id, "Pick stored");
        Ok(pick)
    }

    /// Gets the pick for (user, game). Returns `None` if there is none.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn get_pick(&self, user_id: i32, game_id: i32) -> Result<Option<Pick>, DbError> {
        let mut conn = self.connection()?;
        let pick = schema::picks::table
            .filter(schema::picks::user_id.eq(user_id))
            .filter(schema::picks::game_id.eq(game_id))
            .select(Pick::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(pick)
    }

    /// Deletes the pick for (user, game). Returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn delete_pick(&self, user_id: i32, game_id: i32) -> Result<bool, DbError> {
        let mut conn = self.connection()?;
        let removed = diesel::delete(
            schema::picks::table
                .filter(schema::picks::user_id.eq(user_id))
                .filter(schema::picks::game_id.eq(game_id)),
        )
        .execute(&mut conn)?;

        debug!(user_id, game_id, removed, "Pick delete executed");
        Ok(removed > 0)
    }

    /// Lists a user's picks with game and team, most recent first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn list_picks(&self, user_id: i32, filter: PickFilter) -> Result<Vec<PickDetail>, DbError> {
        let mut conn = self.connection()?;

        let mut query = schema::picks::table
            .inner_join(schema::games::table)
            .inner_join(schema::teams::table)
            .filter(schema::picks::user_id.eq(user_id))
            .select((Pick::as_select(), Game::as_select(), Team::as_select()))
            .order((schema::picks::created_at.desc(), schema::picks::id.desc()))
            .into_boxed();

        match filter {
            PickFilter::Game(game_id) => {
                query = query.filter(schema::picks::game_id.eq(game_id));
            }
            PickFilter::Week { week, season } => {
                query = query
                    .filter(schema::games::week.eq(week))
                    .filter(schema::games::season.eq(season));
            }
            PickFilter::All => {}
        }

        let rows: Vec<(Pick, Game, Team)> = query.load(&mut conn)?;
        debug!(user_id, count = rows.len(), "Picks loaded");

        Ok(rows
            .into_iter()
            .map(|(pick, game, team)| PickDetail::new(pick, game, team))
            .collect())
    }

    /// Loads every pick on a completed, scored game, optionally narrowed to a
    /// season and/or week.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn graded_picks(
        &self,
        season: Option<i32>,
        week: Option<i32>,
    ) -> Result<Vec<GradedPick>, DbError> {
        let mut conn = self.connection()?;

        let mut query = schema::picks::table
            .inner_join(schema::games::table)
            .filter(schema::games::completed.eq(true))
            .filter(schema::games::home_score.is_not_null())
            .filter(schema::games::away_score.is_not_null())
            .select((Pick::as_select(), Game::as_select()))
            .into_boxed();
        if let Some(season) = season {
            query = query.filter(schema::games::season.eq(season));
        }
        if let Some(week) = week {
            query = query.filter(schema::games::week.eq(week));
        }

        let rows: Vec<(Pick, Game)> = query.load(&mut conn)?;
        debug!(count = rows.len(), "Graded picks loaded");

        Ok(rows
            .into_iter()
            .map(|(pick, game)| GradedPick::new(pick, game))
            .collect())
    }
}

/// Writes bound to the connection of an open
/// [`PickemRepository::transaction`].
pub struct Transaction<'a> {
    conn: &'a mut SqliteConnection,
}

impl Transaction<'_> {
    /// Same as [`PickemRepository::upsert_team`], inside the transaction.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    pub fn upsert_team(&mut self, team: &NewTeam) -> Result<Team, DbError> {
        upsert_team(self.conn, team)
    }

    /// Same as [`PickemRepository::upsert_game`], inside the transaction.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a team does not exist or a database error occurs.
    pub fn upsert_game(&mut self, game: &NewGame) -> Result<Game, DbError> {
        upsert_game(self.conn, game)
    }
}

fn upsert_team(conn: &mut SqliteConnection, team: &NewTeam) -> Result<Team, DbError> {
    let team = diesel::insert_into(schema::teams::table)
        .values(team)
        .on_conflict(schema::teams::abbreviation)
        .do_update()
        .set(team)
        .returning(Team::as_returning())
        .get_result(conn)?;

    debug!(team_id = team.id(), "Team upserted");
    Ok(team)
}

fn upsert_game(conn: &mut SqliteConnection, game: &NewGame) -> Result<Game, DbError> {
    let game = diesel::insert_into(schema::games::table)
        .values(game)
        .on_conflict((
            schema::games::season,
            schema::games::week,
            schema::games::home_team_id,
            schema::games::away_team_id,
        ))
        .do_update()
        .set(schema::games::start_time.eq(*game.start_time()))
        .returning(Game::as_returning())
        .get_result(conn)?;

    debug!(game_id = game.id(), "Game upserted");
    Ok(game)
}
