use serde::{Deserialize, Serialize};
use watch_log_models::{Candidate, CandidateDetails, MediaKind};

#[derive(Debug, Serialize, Deserialize)]
pub struct TmdbPage<T> {
    #[serde(default)]
    pub page: u32,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u32,
}

/// Entry of a search or trending list. Movies carry `title`/`release_date`,
/// shows carry `name`/`first_air_date`.
#[derive(Debug, Serialize, Deserialize)]
pub struct TmdbListEntry {
    pub id: u64,
    pub title: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "media_type")]
    pub media_type: Option<String>,
    pub poster_path: Option<String>,
    pub overview: Option<String>,
    pub release_date: Option<String>,
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub genre_ids: Vec<u32>,
    pub vote_average: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TmdbGenre {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TmdbGenreList {
    #[serde(default)]
    pub genres: Vec<TmdbGenre>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TmdbCountry {
    #[serde(rename = "iso_3166_1")]
    pub iso_3166_1: String,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TmdbMovieDetails {
    pub id: u64,
    pub title: String,
    pub original_title: Option<String>,
    pub runtime: Option<u32>,
    #[serde(default)]
    pub production_countries: Vec<TmdbCountry>,
    #[serde(default)]
    pub genres: Vec<TmdbGenre>,
    pub poster_path: Option<String>,
    pub release_date: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TmdbTvDetails {
    pub id: u64,
    pub name: String,
    pub original_name: Option<String>,
    #[serde(default)]
    pub episode_run_time: Vec<u32>,
    #[serde(default)]
    pub production_countries: Vec<TmdbCountry>,
    #[serde(default)]
    pub genres: Vec<TmdbGenre>,
    pub poster_path: Option<String>,
    pub first_air_date: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TmdbErrorBody {
    pub status_code: Option<i32>,
    pub status_message: Option<String>,
}

impl TmdbListEntry {
    /// Convert to a candidate. People (and entries without any title) are dropped.
    /// `fallback_kind` is used when the endpoint is kind-specific and omits `media_type`.
    pub fn into_candidate(self, fallback_kind: Option<MediaKind>) -> Option<Candidate> {
        let kind = match self.media_type.as_deref() {
            Some("movie") => Some(MediaKind::Movie),
            Some("tv") => Some(MediaKind::Tv),
            Some(_) => return None,
            None => fallback_kind,
        };
        let title = self.title.or(self.name).filter(|t| !t.trim().is_empty())?;
        Some(Candidate {
            id: self.id,
            title,
            poster_path: self.poster_path,
            media_kind: kind,
            overview: self.overview.filter(|o| !o.is_empty()),
            release_date: self.release_date.or(self.first_air_date).filter(|d| !d.is_empty()),
            genre_ids: self.genre_ids,
            vote_average: self.vote_average,
        })
    }
}

impl From<TmdbMovieDetails> for CandidateDetails {
    fn from(details: TmdbMovieDetails) -> Self {
        CandidateDetails {
            id: details.id,
            original_title: details.original_title.filter(|t| t != &details.title),
            title: details.title,
            media_kind: MediaKind::Movie,
            runtime_minutes: details.runtime.unwrap_or(0),
            countries: details.production_countries.into_iter().map(|c| c.name).collect(),
            genres: details.genres.into_iter().map(|g| g.name).collect(),
            poster_path: details.poster_path,
            release_date: details.release_date.filter(|d| !d.is_empty()),
        }
    }
}

impl From<TmdbTvDetails> for CandidateDetails {
    fn from(details: TmdbTvDetails) -> Self {
        // A show only has a runtime when every episode runs the same length
        let runtime_minutes = match details.episode_run_time.as_slice() {
            [single] => *single,
            _ => 0,
        };
        CandidateDetails {
            id: details.id,
            original_title: details.original_name.filter(|t| t != &details.name),
            title: details.name,
            media_kind: MediaKind::Tv,
            runtime_minutes,
            countries: details.production_countries.into_iter().map(|c| c.name).collect(),
            genres: details.genres.into_iter().map(|g| g.name).collect(),
            poster_path: details.poster_path,
            release_date: details.first_air_date.filter(|d| !d.is_empty()),
        }
    }
}
