use super::CoverError;
use crate::model::{Cover, Manga};
use crate::response::{CoverListResponse, MangaListResponse, MangaResponse};
use derive_builder::Builder;
use getset::Getters;
use reqwest::IntoUrl;
use serde::de::DeserializeOwned;
use tracing::debug;
use tracing::instrument;

pub const API_URL: &str = "https://api.mangadex.org";
pub const COVERS_URL: &str = "https://uploads.mangadex.org/covers";

const COVER_PAGE_LIMIT: usize = 100;

/// Base urls of the metadata API and of the image host.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Getters)]
#[builder(setter(into), default)]
#[getset(get = "pub")]
pub struct Endpoints {
    api_url: String,
    covers_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            api_url: API_URL.to_string(),
            covers_url: COVERS_URL.to_string(),
        }
    }
}

impl Endpoints {
    pub(crate) fn api(&self, path: &str) -> String {
        format!("{}/{}", self.api_url.trim_end_matches('/'), path)
    }

    /// `<covers>/<manga id>/<file name>`
    pub fn cover_url(&self, manga_id: &str, file_name: &str) -> String {
        format!(
            "{}/{}/{}",
            self.covers_url.trim_end_matches('/'),
            manga_id,
            file_name
        )
    }
}

async fn get_json<T: DeserializeOwned>(
    url: String,
    query: &[(&str, String)],
) -> Result<T, CoverError> {
    debug!(%url, ?query, "GET");
    let bytes = reqwest::Client::new()
        .get(url)
        .query(query)
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Pulls the manga id out of `https://mangadex.org/title/<id>/...`.
fn title_id_from_url(url: impl IntoUrl + Clone + ToString) -> Result<String, CoverError> {
    let url = url
        .clone()
        .into_url()
        .map_err(|_e| CoverError::UrlParseError(url.to_string()))?;
    if !url.domain().is_some_and(|x| x == "mangadex.org") {
        return Err(CoverError::UrlParseError(url.to_string()));
    }
    let mut segments = url
        .path_segments()
        .ok_or_else(|| CoverError::UrlParseError(url.to_string()))?;
    match (segments.next(), segments.next()) {
        (Some("title"), Some(id)) if !id.is_empty() => Ok(id.to_string()),
        _ => Err(CoverError::UrlParseError(url.to_string())),
    }
}

/// Accepts a bare manga id or a mangadex title url.
pub fn parse_manga_id(input: &str) -> Result<String, CoverError> {
    let input = input.trim();
    if input.contains("mangadex.org") {
        title_id_from_url(input)
    } else if input.is_empty() {
        Err(CoverError::UrlParseError(input.to_string()))
    } else {
        Ok(input.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct MangaListQuery {
    pub(crate) title: Option<String>,
    pub(crate) limit: usize,
    pub(crate) offset: usize,
    pub(crate) content_rating: Vec<String>,
    pub(crate) endpoints: Endpoints,
}

impl Default for MangaListQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl MangaListQuery {
    pub fn new() -> Self {
        Self {
            title: None,
            limit: 10,
            offset: 0,
            content_rating: Vec::new(),
            endpoints: Endpoints::default(),
        }
    }

    pub fn title(mut self, title: impl ToString) -> Self {
        self.title = Some(title.to_string());
        self
    }

    /// The API accepts 1 to 100 results per page.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit.clamp(1, 100);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn content_rating(mut self, rating: impl ToString) -> Self {
        self.content_rating.push(rating.to_string());
        self
    }

    pub fn endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub(crate) fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("limit", self.limit.to_string()),
            ("offset", self.offset.to_string()),
            ("includes[]", String::from("cover_art")),
        ];
        if let Some(title) = &self.title {
            query.push(("title", title.clone()));
            query.push(("order[relevance]", String::from("desc")));
        }
        for rating in &self.content_rating {
            query.push(("contentRating[]", rating.clone()));
        }
        query
    }

    #[instrument(skip(self), fields(title = ?self.title))]
    pub async fn execute(self) -> Result<Vec<Manga>, CoverError> {
        let response: MangaListResponse =
            get_json(self.endpoints.api("manga"), &self.query_pairs()).await?;
        debug!(total = response.total, "manga list");
        Ok(response.into_mangas(&self.endpoints))
    }
}

#[derive(Debug, Clone)]
pub struct CoverQuery {
    pub(crate) id: String,
    pub(crate) title: Option<String>,
    pub(crate) volumes: Vec<String>,
    pub(crate) locales: Vec<String>,
    pub(crate) endpoints: Endpoints,
}

impl CoverQuery {
    pub fn new(id: impl ToString) -> Self {
        Self {
            id: id.to_string(),
            title: None,
            volumes: Vec::new(),
            locales: Vec::new(),
            endpoints: Endpoints::default(),
        }
    }

    pub fn from_url(url: impl IntoUrl + Clone + ToString) -> Result<Self, CoverError> {
        Ok(Self::new(title_id_from_url(url)?))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Skips the title lookup.
    pub fn title(mut self, title: impl ToString) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn volume(mut self, volume: impl ToString) -> Self {
        self.volumes.push(volume.to_string());
        self
    }

    pub fn locale(mut self, locale: impl ToString) -> Self {
        self.locales.push(locale.to_string());
        self
    }

    pub fn endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub(crate) fn query_pairs(&self, offset: usize) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("manga[]", self.id.clone()),
            ("limit", COVER_PAGE_LIMIT.to_string()),
            ("offset", offset.to_string()),
            ("order[volume]", String::from("asc")),
        ];
        for locale in &self.locales {
            query.push(("locales[]", locale.clone()));
        }
        query
    }

    async fn fetch_title(&self) -> Result<String, CoverError> {
        let response: MangaResponse =
            get_json(self.endpoints.api(&format!("manga/{}", self.id)), &[]).await?;
        Ok(response.data.title()?.to_string())
    }

    #[instrument(skip(self), fields(id = %self.id))]
    pub async fn execute(self) -> Result<Vec<Cover>, CoverError> {
        let title = match &self.title {
            Some(title) => title.clone(),
            None => self.fetch_title().await?,
        };

        let mut covers = Vec::new();
        let mut offset = 0;
        loop {
            let page: CoverListResponse =
                get_json(self.endpoints.api("cover"), &self.query_pairs(offset)).await?;
            let fetched = page.data.len();
            let total = page.total;
            covers.extend(page.into_covers(&self.endpoints, &self.id, &title));
            offset += fetched;
            debug!(offset, total, "cover page");
            if fetched == 0 || offset >= total {
                break;
            }
        }

        if !self.volumes.is_empty() {
            covers.retain(|c| self.volumes.contains(c.volume()));
        }
        Ok(covers)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_url_parse() {
        assert!(CoverQuery::from_url("https://mangadex.org/title/99b8eaeb-9041-4bfd-8eb7-d72addc88eb7/the-cafe-terrace-and-its-goddesses").is_ok());
        assert!(CoverQuery::from_url("https://mangadex.org/chapter/99b8eaeb-9041-4bfd-8eb7-d72addc88eb7/the-cafe-terrace-and-its-goddesses").is_err());
        assert!(CoverQuery::from_url("https://mangapark.com/title/99b8eaeb-9041-4bfd-8eb7-d72addc88eb7/the-cafe-terrace-and-its-goddesses").is_err());
        assert!(CoverQuery::from_url("https://mangadex.org/title").is_err());
    }

    #[test]
    fn test_parse_manga_id() {
        assert_eq!(
            parse_manga_id("https://mangadex.org/title/abc-123/some-name").unwrap(),
            "abc-123"
        );
        assert_eq!(parse_manga_id(" abc-123 ").unwrap(), "abc-123");
        assert!(parse_manga_id("").is_err());
    }

    #[test]
    fn test_endpoints() {
        let endpoints = EndpointsBuilder::default()
            .api_url("http://127.0.0.1:9000/")
            .build()
            .unwrap();
        assert_eq!(endpoints.api("cover"), "http://127.0.0.1:9000/cover");
        assert_eq!(endpoints.covers_url(), COVERS_URL);
        assert_eq!(
            endpoints.cover_url("m", "f.jpg"),
            "https://uploads.mangadex.org/covers/m/f.jpg"
        );
    }

    #[test]
    fn test_manga_list_query_pairs() {
        let query = MangaListQuery::new().title("Frieren").limit(500).content_rating("safe");
        assert_eq!(query.limit, 100);
        let pairs = query.query_pairs();
        assert!(pairs.contains(&("title", String::from("Frieren"))));
        assert!(pairs.contains(&("includes[]", String::from("cover_art"))));
        assert!(pairs.contains(&("contentRating[]", String::from("safe"))));
        assert!(pairs.contains(&("order[relevance]", String::from("desc"))));

        let pairs = MangaListQuery::new().limit(0).query_pairs();
        assert!(pairs.contains(&("limit", String::from("1"))));
        assert!(!pairs.iter().any(|(k, _)| *k == "title"));
    }

    #[test]
    fn test_cover_query_pairs() {
        let query = CoverQuery::new("m1").locale("ja").locale("en");
        let pairs = query.query_pairs(100);
        assert!(pairs.contains(&("manga[]", String::from("m1"))));
        assert!(pairs.contains(&("offset", String::from("100"))));
        assert!(pairs.contains(&("locales[]", String::from("ja"))));
        assert!(pairs.contains(&("locales[]", String::from("en"))));
        assert!(!CoverQuery::new("m1")
            .query_pairs(0)
            .iter()
            .any(|(k, _)| *k == "locales[]"));
    }

    #[tokio::test]
    #[ignore = "requires network access"]
    async fn test_cover_query() {
        let covers = CoverQuery::new("d7037b2a-874a-4360-8a7b-07f2899152fd")
            .execute()
            .await
            .unwrap();
        assert!(!covers.is_empty());
        assert!(covers.iter().all(|c| c.blob().is_none()));
    }

    #[tokio::test]
    #[ignore = "requires network access"]
    async fn test_manga_list_query() {
        let mangas = MangaListQuery::new().title("one piece").limit(5).execute().await.unwrap();
        assert!(!mangas.is_empty());
    }
}
