//! Поиск и сортировка фильмов, группировка сеансов и схема зала для выдачи.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

use crate::booking::{SeatId, SeatLayout, SeatTier};
use crate::models::{Movie, ShowDetails};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovieSort {
    #[default]
    Rating,
    Title,
    ReleaseDate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovieFilter {
    pub query: Option<String>,
    pub genres: Vec<String>,
    pub languages: Vec<String>,
    pub sort: MovieSort,
}

/// `"Action, Drama,"` → `["Action", "Drama"]`.
pub fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|raw| {
        raw.split(',')
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

fn any_of(values: &[String], wanted: &[String]) -> bool {
    wanted.is_empty()
        || values
            .iter()
            .any(|value| wanted.iter().any(|w| w.eq_ignore_ascii_case(value)))
}

impl MovieFilter {
    pub fn matches(&self, movie: &Movie) -> bool {
        let query_ok = match self.query.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(query) => {
                let needle = query.to_lowercase();
                contains_ci(&movie.title, &needle)
                    || movie.genres.iter().any(|g| contains_ci(g, &needle))
                    || movie.languages.iter().any(|l| contains_ci(l, &needle))
            }
        };
        query_ok && any_of(&movie.genres, &self.genres) && any_of(&movie.languages, &self.languages)
    }

    pub fn apply(&self, movies: Vec<Movie>) -> Vec<Movie> {
        let mut result: Vec<Movie> = movies.into_iter().filter(|m| self.matches(m)).collect();
        sort_movies(&mut result, self.sort);
        result
    }
}

// None всегда в конце
fn desc_some_first<T: PartialOrd>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub fn sort_movies(movies: &mut [Movie], sort: MovieSort) {
    let by_title = |a: &Movie, b: &Movie| a.title.to_lowercase().cmp(&b.title.to_lowercase());
    match sort {
        MovieSort::Rating => movies.sort_by(|a, b| desc_some_first(a.rating, b.rating).then_with(|| by_title(a, b))),
        MovieSort::Title => movies.sort_by(by_title),
        MovieSort::ReleaseDate => {
            movies.sort_by(|a, b| desc_some_first(a.release_date, b.release_date).then_with(|| by_title(a, b)))
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facets {
    pub genres: Vec<String>,
    pub languages: Vec<String>,
}

pub fn facets(movies: &[Movie]) -> Facets {
    let genres: BTreeSet<&String> = movies.iter().flat_map(|m| m.genres.iter()).collect();
    let languages: BTreeSet<&String> = movies.iter().flat_map(|m| m.languages.iter()).collect();
    Facets {
        genres: genres.into_iter().cloned().collect(),
        languages: languages.into_iter().cloned().collect(),
    }
}

/// Сеансы одного кинотеатра для выбора на шаге «кинотеатр».
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TheaterShows {
    pub theater_id: Uuid,
    pub theater_name: String,
    pub city: String,
    pub location: String,
    pub shows: Vec<ShowDetails>,
}

/// Группы идут по имени кинотеатра, сеансы внутри по времени начала.
pub fn group_by_theater(shows: Vec<ShowDetails>) -> Vec<TheaterShows> {
    let mut groups: BTreeMap<(String, Uuid), TheaterShows> = BTreeMap::new();
    for show in shows {
        groups
            .entry((show.theater_name.clone(), show.theater_id))
            .or_insert_with(|| TheaterShows {
                theater_id: show.theater_id,
                theater_name: show.theater_name.clone(),
                city: show.theater_city.clone(),
                location: show.theater_location.clone(),
                shows: Vec::new(),
            })
            .shows
            .push(show);
    }
    groups
        .into_values()
        .map(|mut group| {
            group.shows.sort_by_key(|show| show.start_time);
            group
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeatStatus {
    Available,
    Unavailable,
    Sold,
    Held,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatCell {
    pub id: String,
    pub number: u16,
    pub status: SeatStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowMap {
    pub row: char,
    pub seats: Vec<SeatCell>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierMap {
    pub tier: SeatTier,
    pub name: String,
    pub price: i64,
    pub rows: Vec<RowMap>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatMap {
    pub show_id: Uuid,
    pub seats_per_row: u16,
    pub tiers: Vec<TierMap>,
}

impl SeatMap {
    pub fn available_count(&self) -> usize {
        self.cells().filter(|cell| cell.status == SeatStatus::Available).count()
    }

    pub fn status_of(&self, seat: &str) -> Option<SeatStatus> {
        self.cells().find(|cell| cell.id == seat).map(|cell| cell.status)
    }

    fn cells(&self) -> impl Iterator<Item = &SeatCell> {
        self.tiers
            .iter()
            .flat_map(|tier| tier.rows.iter())
            .flat_map(|row| row.seats.iter())
    }
}

/// Статус места: схема зала, затем продажи, затем удержания.
pub fn build_seat_map(
    show_id: Uuid,
    layout: &SeatLayout,
    sold: &BTreeSet<String>,
    held: &BTreeSet<String>,
) -> SeatMap {
    let tiers = layout
        .tiers()
        .iter()
        .map(|tier| TierMap {
            tier: tier.tier,
            name: tier.tier.display_name().to_string(),
            price: tier.price,
            rows: tier
                .rows
                .iter()
                .map(|&row| RowMap {
                    row,
                    seats: (1..=layout.seats_per_row())
                        .filter_map(|number| SeatId::new(row, number).ok())
                        .map(|seat| {
                            let id = seat.to_string();
                            let status = if layout.is_unavailable(&seat) {
                                SeatStatus::Unavailable
                            } else if sold.contains(&id) {
                                SeatStatus::Sold
                            } else if held.contains(&id) {
                                SeatStatus::Held
                            } else {
                                SeatStatus::Available
                            };
                            SeatCell { id, number: seat.number(), status }
                        })
                        .collect(),
                })
                .collect(),
        })
        .collect();

    SeatMap {
        show_id,
        seats_per_row: layout.seats_per_row(),
        tiers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use fake::faker::lorem::en::Words;
    use fake::Fake;

    fn movie(title: &str, genres: &[&str], languages: &[&str], rating: Option<f64>) -> Movie {
        Movie {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: None,
            duration_minutes: (90..180).fake(),
            languages: languages.iter().map(|s| s.to_string()).collect(),
            genres: genres.iter().map(|s| s.to_string()).collect(),
            rating,
            certification: "UA".into(),
            poster_url: None,
            trailer_url: None,
            release_date: None,
            created_at: Utc::now(),
        }
    }

    fn random_movie() -> Movie {
        let words: Vec<String> = Words(1..4).fake();
        let rating: f64 = (0.0..10.0).fake();
        movie(&words.join(" "), &["Drama"], &["Hindi"], Some(rating))
    }

    #[test]
    fn test_search_is_case_insensitive_across_fields() {
        let movies = vec![
            movie("Kantara Chapter-1", &["Action"], &["Kannada"], Some(8.7)),
            movie("Jolly LLB 3", &["Comedy"], &["Hindi"], Some(7.1)),
            movie("Lokah", &["Fantasy"], &["Malayalam"], None),
        ];
        let by = |q: &str| MovieFilter { query: Some(q.into()), ..Default::default() }.apply(movies.clone());

        assert_eq!(by("kantara").len(), 1);
        assert_eq!(by("COMEDY")[0].title, "Jolly LLB 3");
        assert_eq!(by("malay")[0].title, "Lokah");
        assert_eq!(by("  ").len(), 3);
        assert!(by("zzz").is_empty());
    }

    #[test]
    fn test_genre_and_language_filters_match_any() {
        let movies = vec![
            movie("A", &["Action", "Drama"], &["Hindi"], None),
            movie("B", &["Comedy"], &["Tamil"], None),
            movie("C", &["Horror"], &["Hindi", "Tamil"], None),
        ];
        let filter = MovieFilter {
            genres: vec!["drama".into(), "Comedy".into()],
            ..Default::default()
        };
        let titles: Vec<_> = filter.apply(movies.clone()).into_iter().map(|m| m.title).collect();
        assert_eq!(titles.len(), 2);

        let filter = MovieFilter {
            languages: vec!["Tamil".into()],
            genres: vec!["Horror".into()],
            ..Default::default()
        };
        let found = filter.apply(movies);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "C");
    }

    #[test]
    fn test_rating_sort_puts_unrated_last() {
        let mut movies: Vec<Movie> = (0..20).map(|_| random_movie()).collect();
        movies.push(movie("Unrated", &[], &[], None));
        sort_movies(&mut movies, MovieSort::Rating);

        assert_eq!(movies.last().unwrap().title, "Unrated");
        for pair in movies[..movies.len() - 1].windows(2) {
            assert!(pair[0].rating >= pair[1].rating);
        }
    }

    #[test]
    fn test_release_date_and_title_sort() {
        let mut old = movie("beta", &[], &[], None);
        old.release_date = NaiveDate::from_ymd_opt(2020, 1, 1);
        let mut new = movie("Alpha", &[], &[], None);
        new.release_date = NaiveDate::from_ymd_opt(2025, 10, 2);
        let undated = movie("gamma", &[], &[], None);

        let mut movies = vec![undated.clone(), old.clone(), new.clone()];
        sort_movies(&mut movies, MovieSort::ReleaseDate);
        let titles: Vec<_> = movies.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, ["Alpha", "beta", "gamma"]);

        let mut movies = vec![undated, old, new];
        sort_movies(&mut movies, MovieSort::Title);
        let titles: Vec<_> = movies.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, ["Alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_facets_are_sorted_and_distinct() {
        let movies = vec![
            movie("A", &["Drama", "Action"], &["Hindi"], None),
            movie("B", &["Action"], &["Tamil", "Hindi"], None),
        ];
        let facets = facets(&movies);
        assert_eq!(facets.genres, ["Action", "Drama"]);
        assert_eq!(facets.languages, ["Hindi", "Tamil"]);
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list(Some("Action, Drama,,")), ["Action", "Drama"]);
        assert!(split_list(None).is_empty());
    }

    fn show(theater: &str, theater_id: Uuid, hour: u32) -> ShowDetails {
        ShowDetails {
            id: Uuid::new_v4(),
            movie_id: Uuid::nil(),
            theater_id,
            start_time: NaiveDate::from_ymd_opt(2026, 11, 1)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            end_time: None,
            language: None,
            price: 250,
            movie_title: "Kantara Chapter-1".into(),
            movie_duration: 168,
            theater_name: theater.into(),
            theater_city: "Delhi".into(),
            theater_location: "Saket".into(),
        }
    }

    #[test]
    fn test_group_by_theater() {
        let pvr = Uuid::new_v4();
        let inox = Uuid::new_v4();
        let groups = group_by_theater(vec![
            show("PVR Select City", pvr, 21),
            show("INOX Nehru Place", inox, 18),
            show("PVR Select City", pvr, 10),
        ]);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].theater_name, "INOX Nehru Place");
        let hours: Vec<_> = groups[1].shows.iter().map(|s| s.start_time.format("%H").to_string()).collect();
        assert_eq!(hours, ["10", "21"]);
    }

    #[test]
    fn test_seat_map_statuses() {
        let layout = SeatLayout::standard();
        let sold: BTreeSet<String> = ["C5".to_string()].into();
        let held: BTreeSet<String> = ["C6".to_string(), "C5".to_string()].into();
        let map = build_seat_map(Uuid::nil(), &layout, &sold, &held);

        assert_eq!(map.status_of("D5"), Some(SeatStatus::Unavailable));
        assert_eq!(map.status_of("F2"), Some(SeatStatus::Unavailable));
        assert_eq!(map.status_of("C5"), Some(SeatStatus::Sold));
        assert_eq!(map.status_of("C6"), Some(SeatStatus::Held));
        assert_eq!(map.status_of("A1"), Some(SeatStatus::Available));
        assert_eq!(map.status_of("K1"), None);
        assert_eq!(map.available_count(), layout.capacity() - 2 - 2);
    }
}
