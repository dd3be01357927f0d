//! Состояние клиента между запусками: вход, выбранный город, избранное и голоса.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::store::{LocalStore, LocalStoreExt, StoreError};
use crate::controllers::auth::AuthResponse;
use crate::models::User;

pub const AUTH_KEY: &str = "auth-session";
pub const CITY_KEY: &str = "selected-city";
pub const FAVORITES_KEY: &str = "favorite-movies";
pub const VOTED_MOVIES_KEY: &str = "voted-movies";
pub const DEFAULT_CITY: &str = "Delhi";

const BASE_VOTES_MIN: u64 = 1000;
const BASE_VOTES_SPREAD: u64 = 5000;

pub fn votes_key(movie_id: Uuid) -> String {
    format!("movie-votes-{movie_id}")
}

/// Голоса за фильм на этом устройстве.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieVotes {
    pub movie_id: Uuid,
    pub vote_count: u64,
    pub user_voted: bool,
}

impl MovieVotes {
    /// Стартовый счётчик 1000..6000, стабильный для одного фильма.
    fn initial(movie_id: Uuid) -> Self {
        let base = BASE_VOTES_MIN + (movie_id.as_u128() % BASE_VOTES_SPREAD as u128) as u64;
        Self {
            movie_id,
            vote_count: base,
            user_voted: false,
        }
    }
}

pub struct Session<S: LocalStore> {
    store: S,
}

impl<S: LocalStore> Session<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn auth(&self) -> Result<Option<AuthResponse>, StoreError> {
        self.store.get_json(AUTH_KEY)
    }

    pub fn token(&self) -> Result<Option<String>, StoreError> {
        Ok(self.auth()?.map(|auth| auth.token))
    }

    pub fn user(&self) -> Result<Option<User>, StoreError> {
        Ok(self.auth()?.map(|auth| auth.user))
    }

    pub fn save_auth(&self, auth: &AuthResponse) -> Result<(), StoreError> {
        self.store.set_json(AUTH_KEY, auth)
    }

    pub fn clear_auth(&self) -> Result<(), StoreError> {
        self.store.remove(AUTH_KEY)
    }

    pub fn city(&self) -> Result<String, StoreError> {
        Ok(self
            .store
            .get_json::<String>(CITY_KEY)?
            .unwrap_or_else(|| DEFAULT_CITY.to_string()))
    }

    pub fn set_city(&self, city: &str) -> Result<(), StoreError> {
        self.store.set_json(CITY_KEY, city.trim())
    }

    pub fn favorites(&self) -> Result<Vec<Uuid>, StoreError> {
        Ok(self.store.get_json(FAVORITES_KEY)?.unwrap_or_default())
    }

    pub fn is_favorite(&self, movie_id: Uuid) -> Result<bool, StoreError> {
        Ok(self.favorites()?.contains(&movie_id))
    }

    /// Добавляет или убирает фильм. Возвращает, в избранном ли он теперь.
    pub fn toggle_favorite(&self, movie_id: Uuid) -> Result<bool, StoreError> {
        let mut favorites = self.favorites()?;
        let now_favorite = match favorites.iter().position(|id| *id == movie_id) {
            Some(idx) => {
                favorites.remove(idx);
                false
            }
            None => {
                favorites.push(movie_id);
                true
            }
        };
        self.store.set_json(FAVORITES_KEY, &favorites)?;
        Ok(now_favorite)
    }

    pub fn voted_movies(&self) -> Result<Vec<Uuid>, StoreError> {
        Ok(self.store.get_json(VOTED_MOVIES_KEY)?.unwrap_or_default())
    }

    pub fn votes(&self, movie_id: Uuid) -> Result<MovieVotes, StoreError> {
        let mut votes = self
            .store
            .get_json(&votes_key(movie_id))?
            .unwrap_or_else(|| MovieVotes::initial(movie_id));
        if self.voted_movies()?.contains(&movie_id) {
            votes.user_voted = true;
        }
        Ok(votes)
    }

    /// Голос ставится или снимается: счётчик меняется на единицу.
    pub fn toggle_vote(&self, movie_id: Uuid) -> Result<MovieVotes, StoreError> {
        let mut votes = self.votes(movie_id)?;
        if votes.user_voted {
            votes.vote_count = votes.vote_count.saturating_sub(1);
        } else {
            votes.vote_count += 1;
        }
        votes.user_voted = !votes.user_voted;
        self.store.set_json(&votes_key(movie_id), &votes)?;

        let mut voted = self.voted_movies()?;
        voted.retain(|id| *id != movie_id);
        if votes.user_voted {
            voted.push(movie_id);
        }
        self.store.set_json(VOTED_MOVIES_KEY, &voted)?;
        Ok(votes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::store::MemoryStore;
    use chrono::Utc;

    #[test]
    fn test_city_defaults_to_delhi() {
        let session = Session::new(MemoryStore::new());
        assert_eq!(session.city().unwrap(), "Delhi");
        session.set_city(" Bengaluru ").unwrap();
        assert_eq!(session.city().unwrap(), "Bengaluru");
    }

    #[test]
    fn test_toggle_favorite() {
        let session = Session::new(MemoryStore::new());
        let movie = Uuid::new_v4();

        assert!(session.toggle_favorite(movie).unwrap());
        assert!(session.is_favorite(movie).unwrap());
        assert!(!session.toggle_favorite(movie).unwrap());
        assert!(session.favorites().unwrap().is_empty());
    }

    #[test]
    fn test_vote_twice_restores_count() {
        let session = Session::new(MemoryStore::new());
        let movie = Uuid::new_v4();
        let initial = session.votes(movie).unwrap();
        assert!(!initial.user_voted);
        assert!((1000..6000).contains(&initial.vote_count));

        let voted = session.toggle_vote(movie).unwrap();
        assert!(voted.user_voted);
        assert_eq!(voted.vote_count, initial.vote_count + 1);
        assert_eq!(session.voted_movies().unwrap(), vec![movie]);
        assert_eq!(session.votes(movie).unwrap(), voted);

        let unvoted = session.toggle_vote(movie).unwrap();
        assert!(!unvoted.user_voted);
        assert_eq!(unvoted.vote_count, initial.vote_count);
        assert!(session.voted_movies().unwrap().is_empty());
    }

    #[test]
    fn test_votes_stored_under_movie_key() {
        let session = Session::new(MemoryStore::new());
        let movie = Uuid::new_v4();
        session.toggle_vote(movie).unwrap();

        let stored: MovieVotes = session.store().get_json(&votes_key(movie)).unwrap().unwrap();
        assert!(stored.user_voted);
        assert_eq!(votes_key(movie), format!("movie-votes-{movie}"));
    }

    #[test]
    fn test_auth_round_trip_through_store() {
        let session = Session::new(MemoryStore::new());
        assert_eq!(session.token().unwrap(), None);

        let auth = AuthResponse {
            token: "jwt-token".into(),
            expires_at: Utc::now(),
            user: User {
                id: Uuid::new_v4(),
                email: Some("asha@example.com".into()),
                phone_number: None,
                full_name: "Asha Rao".into(),
                password_hash: None,
                is_admin: false,
                created_at: Utc::now(),
            },
        };
        session.save_auth(&auth).unwrap();
        assert_eq!(session.token().unwrap().as_deref(), Some("jwt-token"));
        assert_eq!(session.user().unwrap().unwrap().full_name, "Asha Rao");

        session.clear_auth().unwrap();
        assert!(session.user().unwrap().is_none());
    }
}
