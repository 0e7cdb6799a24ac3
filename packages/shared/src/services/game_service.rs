use std::str::FromStr;
use std::sync::Arc;

use futures::stream::{self, BoxStream, StreamExt};
use tracing::{debug, error, info, warn};

use crate::models::game::{Game, GameState, GameUpdate, GameView, Scoreboard};
use crate::models::requests::CreateGameRequest;
use crate::models::user::{PlayerProfile, User};
use crate::repositories::errors::game_repository_errors::GameRepositoryError;
use crate::repositories::errors::user_repository_errors::UserDirectoryError;
use crate::repositories::game_repository::GameRepository;
use crate::repositories::user_repository::UserDirectory;
use crate::services::errors::game_service_errors::GameServiceError;

/// Attempts a conditional write on `game` gets. Each lost race is progress by
/// another writer, and under the strict policy a game of n seats takes at most
/// n joins and two transitions, so the rule checks fail first.
pub fn write_attempts(game: &Game) -> usize {
    (game.max_players as usize).saturating_add(2)
}

/// How strictly `start_game` and `end_game` enforce the lifecycle order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecyclePolicy {
    /// WAITING -> IN_PROGRESS -> FINISHED, nothing else.
    #[default]
    Strict,
    /// Start and end are accepted from any state.
    Permissive,
}

impl FromStr for LifecyclePolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(LifecyclePolicy::Strict),
            "permissive" => Ok(LifecyclePolicy::Permissive),
            other => Err(format!("Unknown lifecycle policy: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewGame {
    pub name: String,
    pub max_players: u32,
    pub creator_id: Option<String>,
    pub initial_state: Option<GameState>,
}

impl From<CreateGameRequest> for NewGame {
    fn from(request: CreateGameRequest) -> Self {
        NewGame {
            name: request.name,
            max_players: request.max_players,
            creator_id: request.user_id,
            initial_state: request.state,
        }
    }
}

/// Owns the game lifecycle and membership rules. Holds no state of its own;
/// everything lives in the game store.
#[derive(Clone)]
pub struct GameService {
    games: Arc<dyn GameRepository + Send + Sync>,
    users: Arc<dyn UserDirectory + Send + Sync>,
    policy: LifecyclePolicy,
}

impl GameService {
    pub fn new(
        games: Arc<dyn GameRepository + Send + Sync>,
        users: Arc<dyn UserDirectory + Send + Sync>,
    ) -> Self {
        Self::with_policy(games, users, LifecyclePolicy::default())
    }

    pub fn with_policy(
        games: Arc<dyn GameRepository + Send + Sync>,
        users: Arc<dyn UserDirectory + Send + Sync>,
        policy: LifecyclePolicy,
    ) -> Self {
        GameService {
            games,
            users,
            policy,
        }
    }

    pub fn policy(&self) -> LifecyclePolicy {
        self.policy
    }

    pub async fn create_game(&self, new_game: NewGame) -> Result<GameView, GameServiceError> {
        let name = new_game.name.trim();
        if name.is_empty() {
            return Err(GameServiceError::InvalidArgument(
                "Game name cannot be empty".to_string(),
            ));
        }
        if new_game.max_players == 0 {
            return Err(GameServiceError::InvalidArgument(
                "maxPlayers must be a positive integer".to_string(),
            ));
        }

        let state = new_game.initial_state.unwrap_or_default();
        if state == GameState::Finished && self.policy == LifecyclePolicy::Strict {
            return Err(GameServiceError::InvalidArgument(
                "A game cannot be created in the FINISHED state".to_string(),
            ));
        }

        // Resolve the creator before writing anything so an unknown user
        // never leaves an orphaned game behind.
        let creator = match new_game.creator_id.as_deref().map(str::trim) {
            Some("") => {
                return Err(GameServiceError::InvalidArgument(
                    "userId cannot be empty".to_string(),
                ))
            }
            Some(user_id) => Some(self.resolve_user(user_id).await?),
            None => None,
        };

        let game = Game::new(name, new_game.max_players, state);
        self.games
            .create_game(&game)
            .await
            .map_err(classify("creating a game"))?;
        info!("Created game {} ({})", game.id, game.name);

        if let Some(creator) = creator {
            if let Err(err) = self.admit(game.clone(), &creator, false).await {
                warn!(
                    "Creator {} rejected from new game {}: {}",
                    creator.id, game.id, err
                );
                if let Err(cleanup) = self.games.delete_game(&game.id).await {
                    error!(
                        "Failed to remove game {} after rejecting its creator: {}",
                        game.id, cleanup
                    );
                }
                return Err(err);
            }
        }

        self.find_game(&game.id).await
    }

    pub async fn find_game(&self, game_id: &str) -> Result<GameView, GameServiceError> {
        let game = self.load_game(game_id).await?;
        self.resolve_players(game).await
    }

    /// Streams every game, optionally only those in `status`. The store is
    /// read once up front; players are resolved as the stream is polled.
    pub async fn list_games(
        &self,
        status: Option<GameState>,
    ) -> Result<BoxStream<'_, Result<GameView, GameServiceError>>, GameServiceError> {
        let games = self
            .games
            .list_games(status)
            .await
            .map_err(classify("listing games"))?;
        debug!("Listing {} games (status filter: {:?})", games.len(), status);

        Ok(stream::iter(games)
            .then(move |game| self.resolve_players(game))
            .boxed())
    }

    /// Adds `user_id` to the game. Rules are checked in a fixed order and the
    /// first violation is returned.
    pub async fn join_game(
        &self,
        game_id: &str,
        user_id: Option<&str>,
    ) -> Result<String, GameServiceError> {
        let user_id = match user_id.map(str::trim) {
            Some(user_id) if !user_id.is_empty() => user_id,
            _ => {
                return Err(GameServiceError::InvalidArgument(
                    "userId must be provided".to_string(),
                ))
            }
        };

        let game = self.load_game(game_id).await?;
        ensure_joinable(&game)?;
        let user = self.resolve_user(user_id).await?;

        let game_name = game.name.clone();
        self.admit(game, &user, true).await?;

        info!("User {} joined game {}", user.id, game_id);
        Ok(format!("{} joined {} successfully", user.fullname, game_name))
    }

    pub async fn start_game(&self, game_id: &str) -> Result<String, GameServiceError> {
        let update = GameUpdate {
            state: Some(GameState::InProgress),
            score: None,
        };
        let game = self
            .transition(game_id, update, ensure_startable, "starting a game")
            .await?;

        info!("Game {} started with {} players", game_id, game.player_ids.len());
        Ok(format!("The game {} has been started", game.name))
    }

    pub async fn end_game(
        &self,
        game_id: &str,
        score: Scoreboard,
    ) -> Result<String, GameServiceError> {
        if let Some((user_id, _)) = score.iter().find(|(_, value)| !value.is_finite()) {
            return Err(GameServiceError::InvalidArgument(format!(
                "Score for user {} must be a finite number",
                user_id
            )));
        }

        let update = GameUpdate {
            state: Some(GameState::Finished),
            score: Some(score),
        };
        let game = self
            .transition(game_id, update, ensure_finishable, "ending a game")
            .await?;

        info!("Game {} finished", game_id);
        Ok(format!("Game {} finished", game.name))
    }

    /// Deletes the game and its memberships, whatever its state.
    pub async fn remove_game(&self, game_id: &str) -> Result<String, GameServiceError> {
        self.games
            .delete_game(game_id)
            .await
            .map_err(write_error(game_id, "removing a game"))?;

        info!("Game {} removed", game_id);
        Ok("Game deleted successfully".to_string())
    }

    /// Writes `update` as a compare-and-swap on the version that `check`
    /// approved. On a lost race the game is re-read and checked again, so a
    /// stale snapshot can never finish a game twice or move it backwards.
    /// Returns the snapshot the write was based on.
    async fn transition(
        &self,
        game_id: &str,
        update: GameUpdate,
        check: fn(LifecyclePolicy, &Game) -> Result<(), GameServiceError>,
        context: &'static str,
    ) -> Result<Game, GameServiceError> {
        let mut game = self.load_game(game_id).await?;
        let mut attempt = 1;
        loop {
            check(self.policy, &game)?;

            match self
                .games
                .update_game(game_id, update.clone(), game.version)
                .await
            {
                Ok(_) => return Ok(game),
                Err(GameRepositoryError::VersionConflict) if attempt < write_attempts(&game) => {
                    debug!(
                        "Game {} changed while {} (attempt {}), retrying",
                        game_id, context, attempt
                    );
                    attempt += 1;
                    game = self.load_game(game_id).await?;
                }
                Err(GameRepositoryError::VersionConflict) => {
                    return Err(contended(game_id, context, attempt))
                }
                Err(err) => return Err(write_error(game_id, context)(err)),
            }
        }
    }

    async fn load_game(&self, game_id: &str) -> Result<Game, GameServiceError> {
        self.games
            .get_game(game_id)
            .await
            .map_err(classify("loading a game"))?
            .ok_or_else(|| GameServiceError::game_not_found(game_id))
    }

    async fn resolve_user(&self, user_id: &str) -> Result<User, GameServiceError> {
        match self.users.find_user(user_id).await {
            Ok(user) => Ok(user),
            Err(UserDirectoryError::NotFound) => Err(GameServiceError::user_not_found(user_id)),
            Err(err) => Err(classify("resolving a user")(err)),
        }
    }

    async fn resolve_players(&self, game: Game) -> Result<GameView, GameServiceError> {
        let mut players = Vec::with_capacity(game.player_ids.len());
        for player_id in &game.player_ids {
            match self.users.find_user(player_id).await {
                Ok(user) => players.push(PlayerProfile::from(user)),
                Err(UserDirectoryError::NotFound) => {
                    warn!("Game {} references unknown user {}", game.id, player_id);
                }
                Err(err) => return Err(classify("resolving players")(err)),
            }
        }
        Ok(GameView::from_game(game, players))
    }

    /// Membership rules shared by joining and game creation: not already a
    /// member, not active elsewhere, room left. The write is a compare-and-swap
    /// on the version of `game`; on a lost race the game is re-read and the
    /// rules are checked again.
    async fn admit(
        &self,
        mut game: Game,
        user: &User,
        require_waiting: bool,
    ) -> Result<(), GameServiceError> {
        let mut attempt = 1;
        loop {
            self.check_admission(&game, user).await?;

            match self.games.add_member(&game.id, &user.id, game.version).await {
                Ok(()) => return Ok(()),
                Err(GameRepositoryError::VersionConflict) if attempt < write_attempts(&game) => {
                    debug!(
                        "Game {} changed while adding user {} (attempt {}), retrying",
                        game.id, user.id, attempt
                    );
                    attempt += 1;
                    game = self.load_game(&game.id).await?;
                    if require_waiting {
                        ensure_joinable(&game)?;
                    }
                }
                Err(GameRepositoryError::VersionConflict) => {
                    return Err(contended(&game.id, "adding a member", attempt))
                }
                Err(err) => return Err(classify("adding a member")(err)),
            }
        }
    }

    async fn check_admission(&self, game: &Game, user: &User) -> Result<(), GameServiceError> {
        if game.has_member(&user.id) {
            return Err(GameServiceError::AlreadyMember {
                user_id: user.id.clone(),
                game_id: game.id.clone(),
            });
        }

        let memberships = self
            .games
            .list_games_by_member(&user.id)
            .await
            .map_err(classify("checking active games"))?;
        if let Some(active) = memberships
            .iter()
            .find(|other| other.id != game.id && other.state.is_active())
        {
            return Err(GameServiceError::AlreadyInActiveGame {
                user_id: user.id.clone(),
                game_id: active.id.clone(),
                game_name: active.name.clone(),
            });
        }

        if game.is_full() {
            return Err(GameServiceError::GameFull {
                game_id: game.id.clone(),
                max_players: game.max_players,
            });
        }

        Ok(())
    }
}

fn ensure_joinable(game: &Game) -> Result<(), GameServiceError> {
    if game.state == GameState::Waiting {
        Ok(())
    } else {
        Err(GameServiceError::InvalidState {
            game_id: game.id.clone(),
            state: game.state,
            action: "joinable",
        })
    }
}

fn ensure_startable(policy: LifecyclePolicy, game: &Game) -> Result<(), GameServiceError> {
    if policy == LifecyclePolicy::Strict && game.state != GameState::Waiting {
        return Err(GameServiceError::InvalidState {
            game_id: game.id.clone(),
            state: game.state,
            action: "startable",
        });
    }
    Ok(())
}

fn ensure_finishable(policy: LifecyclePolicy, game: &Game) -> Result<(), GameServiceError> {
    if policy == LifecyclePolicy::Strict && game.state != GameState::InProgress {
        return Err(GameServiceError::InvalidState {
            game_id: game.id.clone(),
            state: game.state,
            action: "finishable",
        });
    }
    Ok(())
}

fn contended(game_id: &str, context: &'static str, attempts: usize) -> GameServiceError {
    warn!(
        "Giving up {} on game {} after {} concurrent modifications",
        context, game_id, attempts
    );
    GameServiceError::ConcurrentModification {
        game_id: game_id.to_string(),
    }
}

/// Converts a store error and logs it when it is not the caller's fault.
fn classify<E>(context: &'static str) -> impl FnOnce(E) -> GameServiceError
where
    E: Into<GameServiceError>,
{
    move |err| {
        let err = err.into();
        if !err.is_client_fault() {
            error!("Store failure while {}: {}", context, err);
        }
        err
    }
}

/// Like `classify`, but a missing game is reported as not found.
fn write_error<'a>(
    game_id: &'a str,
    context: &'static str,
) -> impl FnOnce(GameRepositoryError) -> GameServiceError + 'a {
    move |err| match err {
        GameRepositoryError::NotFound => GameServiceError::game_not_found(game_id),
        other => classify(context)(other),
    }
}
