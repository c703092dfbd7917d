//! Shapes of the mangadex JSON envelopes and their mapping onto [`Manga`] and [`Cover`].

use super::query::Endpoints;
use super::CoverError;
use crate::model::{Cover, CoverSize, Manga};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::warn;

/// Body of `GET /manga`.
#[derive(Debug, Deserialize)]
pub struct MangaListResponse {
    pub result: String,
    pub response: String,
    pub data: Vec<MangaEntity>,
    pub limit: usize,
    pub offset: usize,
    pub total: usize,
}

/// Body of `GET /manga/{id}`.
#[derive(Debug, Deserialize)]
pub struct MangaResponse {
    pub result: String,
    pub response: String,
    pub data: MangaEntity,
}

/// Body of `GET /cover`.
#[derive(Debug, Deserialize)]
pub struct CoverListResponse {
    pub result: String,
    pub response: String,
    pub data: Vec<CoverEntity>,
    pub limit: usize,
    pub offset: usize,
    pub total: usize,
}

#[derive(Debug, Deserialize)]
pub struct MangaEntity {
    pub id: String,
    pub attributes: MangaAttributes,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MangaAttributes {
    pub title: BTreeMap<String, String>,
    #[serde(default)]
    pub alt_titles: Vec<BTreeMap<String, String>>,
}

#[derive(Debug, Deserialize)]
pub struct CoverEntity {
    pub id: String,
    pub attributes: CoverAttributes,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverAttributes {
    pub volume: Option<String>,
    pub file_name: String,
    pub locale: Option<String>,
}

/// A related entity. `attributes` is only present when expanded with `includes[]`.
#[derive(Debug, Deserialize)]
pub struct Relationship {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub attributes: Option<RelationshipAttributes>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipAttributes {
    pub file_name: Option<String>,
}

impl MangaAttributes {
    /// English title first, then any other language, then the alternative titles.
    pub fn preferred_title(&self) -> Option<&str> {
        self.title
            .get("en")
            .or_else(|| self.title.values().next())
            .or_else(|| self.alt_titles.iter().find_map(|t| t.values().next()))
            .map(String::as_str)
    }
}

impl MangaEntity {
    pub fn title(&self) -> Result<&str, CoverError> {
        self.attributes
            .preferred_title()
            .ok_or_else(|| CoverError::MissingTitle(self.id.clone()))
    }

    pub fn cover_file_name(&self) -> Option<&str> {
        self.relationships
            .iter()
            .filter(|r| r.kind == "cover_art")
            .find_map(|r| r.attributes.as_ref()?.file_name.as_deref())
    }

    pub fn to_manga(&self, endpoints: &Endpoints) -> Result<Manga, CoverError> {
        let title = self.title()?;
        let file_name = self
            .cover_file_name()
            .ok_or_else(|| CoverError::MissingCover(self.id.clone()))?;
        let url = CoverSize::Small.apply(&endpoints.cover_url(&self.id, file_name));
        Manga::new(&self.id, title, url)
    }
}

impl MangaListResponse {
    pub fn into_mangas(self, endpoints: &Endpoints) -> Vec<Manga> {
        self.data
            .iter()
            .filter_map(|entity| match entity.to_manga(endpoints) {
                Ok(manga) => Some(manga),
                Err(e) => {
                    warn!(id = %entity.id, "skip manga: {e}");
                    None
                }
            })
            .collect()
    }
}

impl CoverEntity {
    pub fn to_cover(&self, endpoints: &Endpoints, manga_id: &str, title: &str) -> Cover {
        Cover::new(
            &self.id,
            title,
            self.attributes.volume.as_deref().unwrap_or_default(),
            endpoints.cover_url(manga_id, &self.attributes.file_name),
        )
    }
}

impl CoverListResponse {
    pub fn into_covers(self, endpoints: &Endpoints, manga_id: &str, title: &str) -> Vec<Cover> {
        self.data
            .iter()
            .map(|c| c.to_cover(endpoints, manga_id, title))
            .collect()
    }
}
