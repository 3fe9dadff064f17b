use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::info;

const DEFAULT_CATEGORY: &str = "adventure";

#[derive(Error, Debug, PartialEq)]
pub enum CatalogError {
    #[error("video {0} not found")]
    NotFound(String),
    #[error("{0}")]
    ValidationError(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub id: String,
    pub title: String,
    pub description: String,
    pub thumbnail: String,
    /// Embed URL of the third-party player
    pub video_url: String,
    /// Human readable, e.g. `2:01:28`
    pub duration: String,
    pub category: String,
}

/// Submitted add/edit form. Every field but `category` is required.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub video_url: String,
    #[serde(default)]
    pub duration: String,
    pub category: Option<String>,
}

impl VideoForm {
    fn into_video(self, id: String) -> Result<Video, CatalogError> {
        let video = Video {
            id,
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            thumbnail: self.thumbnail.trim().to_string(),
            video_url: self.video_url.trim().to_string(),
            duration: self.duration.trim().to_string(),
            category: self
                .category
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
        };

        let required = [
            &video.title,
            &video.description,
            &video.thumbnail,
            &video.video_url,
            &video.duration,
        ];
        if required.iter().any(|field| field.is_empty()) {
            return Err(CatalogError::ValidationError(
                "All fields are required. Please fill in all fields.".to_string(),
            ));
        }

        Ok(video)
    }
}

/// In-memory video collection. Nothing survives a restart.
#[derive(Debug, Clone)]
pub struct Catalog {
    videos: BTreeMap<String, Video>,
    categories: Vec<Category>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::seeded()
    }
}

impl Catalog {
    pub fn empty() -> Self {
        Self {
            videos: BTreeMap::new(),
            categories: default_categories(),
        }
    }

    /// Catalog with the demo titles
    pub fn seeded() -> Self {
        let mut catalog = Self::empty();
        for video in demo_videos() {
            catalog.videos.insert(video.id.clone(), video);
        }
        catalog
    }

    /// All videos, in numeric id order
    pub fn videos(&self) -> Vec<&Video> {
        let mut videos: Vec<&Video> = self.videos.values().collect();
        videos.sort_by_key(|v| (v.id.parse::<u64>().unwrap_or(u64::MAX), v.id.clone()));
        videos
    }

    pub fn get(&self, id: &str) -> Option<&Video> {
        self.videos.get(id)
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    /// Display name, falling back to the capitalized id
    pub fn category_name(&self, id: &str) -> String {
        match self.category(id) {
            Some(category) => category.name.clone(),
            None => capitalize(id),
        }
    }

    /// Videos matching a category and a case-insensitive search over title
    /// and description. `None`, empty and `"all"` match every category.
    pub fn filter(&self, search: Option<&str>, category: Option<&str>) -> Vec<&Video> {
        let category = category.map(str::trim).filter(|c| !c.is_empty() && *c != "all");
        let search = search
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());

        self.videos()
            .into_iter()
            .filter(|v| category.is_none_or(|c| v.category == c))
            .filter(|v| {
                search.as_ref().is_none_or(|s| {
                    v.title.to_lowercase().contains(s) || v.description.to_lowercase().contains(s)
                })
            })
            .collect()
    }

    /// One past the highest numeric id, `"1"` when empty
    pub fn next_id(&self) -> String {
        self.videos
            .keys()
            .filter_map(|id| id.parse::<u64>().ok())
            .max()
            .map(|max| max + 1)
            .unwrap_or(1)
            .to_string()
    }

    pub fn add(&mut self, form: VideoForm) -> Result<&Video, CatalogError> {
        let id = self.next_id();
        let video = form.into_video(id.clone())?;
        info!(id = %id, title = %video.title, "video added");
        Ok(self.videos.entry(id).or_insert(video))
    }

    pub fn update(&mut self, id: &str, form: VideoForm) -> Result<&Video, CatalogError> {
        let Some(existing) = self.videos.get_mut(id) else {
            return Err(CatalogError::NotFound(id.to_string()));
        };
        *existing = form.into_video(id.to_string())?;
        info!(id, "video updated");
        Ok(existing)
    }

    /// Remove a video. Unknown ids are ignored.
    pub fn delete(&mut self, id: &str) -> Option<Video> {
        let removed = self.videos.remove(id);
        if removed.is_some() {
            info!(id, "video deleted");
        }
        removed
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn default_categories() -> Vec<Category> {
    [
        ("action", "Action", "zap"),
        ("adventure", "Adventure", "compass"),
        ("drama", "Drama", "heart"),
        ("thriller", "Thriller", "alert-circle"),
        ("comedy", "Comedy", "smile"),
        ("scifi", "Sci-Fi", "rocket"),
        ("horror", "Horror", "moon"),
        ("romance", "Romance", "heart"),
        ("documentary", "Documentary", "film"),
    ]
    .into_iter()
    .map(|(id, name, icon)| Category {
        id: id.to_string(),
        name: name.to_string(),
        icon: icon.to_string(),
    })
    .collect()
}

fn demo_videos() -> Vec<Video> {
    vec![
        Video {
            id: "1".to_string(),
            title: "Suzume".to_string(),
            description: "A high school girl teams up with a mysterious young man to close \
                supernatural doors across Japan that unleash disasters, on a road trip \
                about loss, memory and healing."
                .to_string(),
            thumbnail: "/static/images/suzume-poster.jpg".to_string(),
            video_url: "https://drive.google.com/file/d/suzume/preview".to_string(),
            duration: "2:01:28".to_string(),
            category: "adventure".to_string(),
        },
        Video {
            id: "2".to_string(),
            title: "Bhool Bhulaiyaa 3".to_string(),
            description: "A fake exorcist hired to stage an exorcism at a haunted palace in \
                Bengal runs into real spirits and a mystery over which of two women is \
                the ghost."
                .to_string(),
            thumbnail: "/static/images/maxresdefault.jpg".to_string(),
            video_url: "https://drive.google.com/file/d/bhool-bhulaiyaa-3/preview".to_string(),
            duration: "2:38:00".to_string(),
            category: "horror".to_string(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(title: &str) -> VideoForm {
        VideoForm {
            title: title.to_string(),
            description: "A description".to_string(),
            thumbnail: "/static/images/x.jpg".to_string(),
            video_url: "https://example.com/embed/x".to_string(),
            duration: "1:30:00".to_string(),
            category: Some("drama".to_string()),
        }
    }

    #[test]
    fn test_seeded_catalog() {
        let catalog = Catalog::seeded();
        let titles: Vec<&str> = catalog.videos().iter().map(|v| v.title.as_str()).collect();
        assert_eq!(titles, vec!["Suzume", "Bhool Bhulaiyaa 3"]);
        assert_eq!(catalog.get("1").unwrap().duration, "2:01:28");
        assert_eq!(catalog.categories().len(), 9);
    }

    #[test]
    fn test_category_name_fallback() {
        let catalog = Catalog::empty();
        assert_eq!(catalog.category_name("scifi"), "Sci-Fi");
        assert_eq!(catalog.category_name("westerns"), "Westerns");
        assert_eq!(catalog.category_name(""), "");
    }

    #[test]
    fn test_filter_by_category() {
        let catalog = Catalog::seeded();
        assert_eq!(catalog.filter(None, Some("all")).len(), 2);
        assert_eq!(catalog.filter(None, Some("")).len(), 2);
        let horror = catalog.filter(None, Some("horror"));
        assert_eq!(horror.len(), 1);
        assert_eq!(horror[0].id, "2");
        assert!(catalog.filter(None, Some("comedy")).is_empty());
    }

    #[test]
    fn test_filter_by_search_is_case_insensitive() {
        let catalog = Catalog::seeded();
        let found = catalog.filter(Some("  SUZUME "), None);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "1");

        // Matches description text too
        assert_eq!(catalog.filter(Some("exorcist"), None)[0].id, "2");
        assert!(catalog.filter(Some("exorcist"), Some("adventure")).is_empty());
        assert_eq!(catalog.filter(Some(""), None).len(), 2);
    }

    #[test]
    fn test_next_id() {
        let mut catalog = Catalog::empty();
        assert_eq!(catalog.next_id(), "1");

        catalog.add(form("One")).unwrap();
        catalog.add(form("Two")).unwrap();
        catalog.delete("1");
        assert_eq!(catalog.next_id(), "3");
    }

    #[test]
    fn test_videos_sorted_numerically() {
        let mut catalog = Catalog::empty();
        for i in 0..11 {
            catalog.add(form(&format!("Video {}", i))).unwrap();
        }
        let ids: Vec<&str> = catalog.videos().iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids.first(), Some(&"1"));
        assert_eq!(ids.last(), Some(&"11"));
    }

    #[test]
    fn test_add_trims_and_defaults_category() {
        let mut catalog = Catalog::seeded();
        let video = catalog
            .add(VideoForm {
                title: "  New  ".to_string(),
                category: None,
                ..form("")
            })
            .unwrap()
            .clone();

        assert_eq!(video.id, "3");
        assert_eq!(video.title, "New");
        assert_eq!(video.category, "adventure");
    }

    #[test]
    fn test_add_requires_all_fields() {
        let mut catalog = Catalog::seeded();
        let err = catalog
            .add(VideoForm {
                duration: "   ".to_string(),
                ..form("Title")
            })
            .unwrap_err();

        assert_eq!(
            err,
            CatalogError::ValidationError(
                "All fields are required. Please fill in all fields.".to_string()
            )
        );
        assert_eq!(catalog.videos().len(), 2);
    }

    #[test]
    fn test_update_and_delete() {
        let mut catalog = Catalog::seeded();
        let updated = catalog.update("1", form("Renamed")).unwrap();
        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.id, "1");

        assert_eq!(
            catalog.update("42", form("Nope")).unwrap_err(),
            CatalogError::NotFound("42".to_string())
        );

        assert!(catalog.delete("1").is_some());
        assert!(catalog.delete("1").is_none());
        assert!(catalog.get("1").is_none());
    }

    #[test]
    fn test_failed_update_keeps_existing() {
        let mut catalog = Catalog::seeded();
        assert!(catalog.update("1", form("")).is_err());
        assert_eq!(catalog.get("1").unwrap().title, "Suzume");
    }
}
