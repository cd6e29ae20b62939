use serde::{Deserialize, Serialize};
use crate::media::MediaKind;

/// A title offered by the metadata catalog (search or trending result)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candidate {
    pub id: u64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_kind: Option<MediaKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(default)]
    pub genre_ids: Vec<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vote_average: Option<f32>,
}

impl Candidate {
    pub fn new(id: u64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            poster_path: None,
            media_kind: None,
            overview: None,
            release_date: None,
            genre_ids: Vec::new(),
            vote_average: None,
        }
    }

    /// Release year parsed from the `YYYY-MM-DD` release date
    pub fn release_year(&self) -> Option<i32> {
        self.release_date
            .as_deref()
            .and_then(|d| d.get(..4))
            .and_then(|y| y.parse().ok())
    }
}

/// Full record of a single title, used to enrich new collection items
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandidateDetails {
    pub id: u64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_title: Option<String>,
    pub media_kind: MediaKind,
    #[serde(default)]
    pub runtime_minutes: u32,
    #[serde(default)]
    pub countries: Vec<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_year() {
        let mut c = Candidate::new(1, "Dune");
        assert_eq!(c.release_year(), None);
        c.release_date = Some("2021-09-15".to_string());
        assert_eq!(c.release_year(), Some(2021));
        c.release_date = Some("".to_string());
        assert_eq!(c.release_year(), None);
    }
}
