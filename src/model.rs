use super::CoverError;
use getset::Getters;
use reqwest::Url;
use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Deserialize)]
struct RawManga {
    id: String,
    title: String,
    cover: String,
}

/// A manga series together with the thumbnail of its main cover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
#[serde(try_from = "RawManga")]
#[getset(get = "pub")]
pub struct Manga {
    id: String,
    title: String,
    cover: String,
}

impl Manga {
    pub fn new(
        id: impl ToString,
        title: impl ToString,
        cover: impl ToString,
    ) -> Result<Self, CoverError> {
        let cover = cover.to_string();
        Url::parse(&cover).map_err(|_e| CoverError::UrlParseError(cover.clone()))?;
        Ok(Self {
            id: id.to_string(),
            title: title.to_string(),
            cover,
        })
    }
}

impl TryFrom<RawManga> for Manga {
    type Error = CoverError;

    fn try_from(raw: RawManga) -> Result<Self, Self::Error> {
        Self::new(raw.id, raw.title, raw.cover)
    }
}

/// Replaces everything but alphanumerics, `-` and `.` with `_`, so the
/// result is a single path component.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// One cover edition of a manga. `blob` stays empty until the image is downloaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
#[getset(get = "pub")]
pub struct Cover {
    id: String,
    title: String,
    volume: String,
    url: String,
    #[serde(skip)]
    blob: Option<Vec<u8>>,
}

impl Cover {
    pub fn new(
        id: impl ToString,
        title: impl ToString,
        volume: impl ToString,
        url: impl ToString,
    ) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            volume: volume.to_string(),
            url: url.to_string(),
            blob: None,
        }
    }

    pub fn set_blob(&mut self, blob: Vec<u8>) {
        self.blob = Some(blob);
    }

    pub fn take_blob(&mut self) -> Option<Vec<u8>> {
        self.blob.take()
    }

    pub fn is_downloaded(&self) -> bool {
        self.blob.is_some()
    }

    /// File name that stays distinct across volumes and cover ids,
    /// e.g. `volume_3_0a1b...jpg`.
    pub fn file_name(&self) -> String {
        self.file_name_with(CoverSize::Original)
    }

    /// Same as [`Cover::file_name`], with the extension of the requested variant.
    pub fn file_name_with(&self, size: CoverSize) -> String {
        let url = size.apply(&self.url);
        let label = if self.volume.is_empty() {
            String::from("volume_none")
        } else {
            format!("volume_{}", sanitize_file_name(&self.volume))
        };
        let last = url.rsplit('/').next().unwrap_or_default();
        let ext = match last.rsplit_once('.') {
            Some((_, ext)) if !ext.is_empty() => sanitize_file_name(ext),
            _ => String::from("jpg"),
        };
        format!("{label}_{}.{ext}", sanitize_file_name(&self.id))
    }
}

/// Image variants served by the covers host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CoverSize {
    #[default]
    Original,
    Medium,
    Small,
}

impl CoverSize {
    pub fn apply(&self, url: &str) -> String {
        match self {
            CoverSize::Original => url.to_string(),
            CoverSize::Medium => format!("{url}.512.jpg"),
            CoverSize::Small => format!("{url}.256.jpg"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawProgress {
    total: u64,
    current: u64,
}

/// Counter pair for an in-flight download. `current` never exceeds `total`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Getters)]
#[serde(try_from = "RawProgress")]
#[getset(get = "pub")]
pub struct DownloadProgress {
    total: u64,
    current: u64,
}

impl TryFrom<RawProgress> for DownloadProgress {
    type Error = CoverError;

    fn try_from(raw: RawProgress) -> Result<Self, Self::Error> {
        Self::try_new(raw.total, raw.current)
    }
}

impl DownloadProgress {
    pub fn new(total: u64) -> Self {
        Self { total, current: 0 }
    }

    pub fn try_new(total: u64, current: u64) -> Result<Self, CoverError> {
        if current > total {
            return Err(CoverError::InvalidProgress { current, total });
        }
        Ok(Self { total, current })
    }

    /// Counts `n` more units as done. An unknown or short total is raised to match.
    pub fn advance(&mut self, n: u64) {
        self.current = self.current.saturating_add(n);
        self.total = self.total.max(self.current);
    }

    /// True once `current` reaches `total`. A fresh progress with an
    /// unknown (zero) total already reads as complete, so callers that
    /// stream should only check this after the last chunk.
    pub fn is_complete(&self) -> bool {
        self.current == self.total
    }

    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.current as f64 / self.total as f64
    }
}

impl std::fmt::Display for DownloadProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}/{}]", self.current, self.total)
    }
}
