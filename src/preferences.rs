//! Locally stored user preferences.

use crate::error::AppResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Colour scheme
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

/// Interface language
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Hi,
    En,
}

/// Navigation and button labels for one language
#[derive(Debug, Clone, Serialize)]
pub struct Labels {
    pub nav_links: [&'static str; 8],
    pub language_button: &'static str,
    pub sign_in: &'static str,
    pub sign_up: &'static str,
}

impl Language {
    pub fn toggled(self) -> Self {
        match self {
            Language::Hi => Language::En,
            Language::En => Language::Hi,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Hi => "hi",
            Language::En => "en",
        }
    }

    pub fn labels(&self) -> Labels {
        match self {
            Language::Hi => Labels {
                nav_links: [
                    "होम",
                    "अन्वेषण",
                    "यात्रा योजना",
                    "त्योहार",
                    "गैलरी",
                    "परिवहन",
                    "सहायता",
                    "संपर्क",
                ],
                language_button: "हिंदी",
                sign_in: "साइन इन",
                sign_up: "साइन अप",
            },
            Language::En => Labels {
                nav_links: [
                    "Home",
                    "Explore",
                    "Plan Trip",
                    "Festivals",
                    "Gallery",
                    "Transport",
                    "Help",
                    "Contact",
                ],
                language_button: "English",
                sign_in: "Sign In",
                sign_up: "Sign Up",
            },
        }
    }
}

/// Saved preference values
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub remember_me: bool,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub language: Language,
}

/// File-backed preference store.
///
/// A missing or unreadable file yields the defaults. Every change is written
/// through immediately.
pub struct PreferenceStore {
    path: Option<PathBuf>,
    current: RwLock<Preferences>,
}

impl PreferenceStore {
    /// Load preferences from `path`
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let current = read_preferences(&path).await;
        Self {
            path: Some(path),
            current: RwLock::new(current),
        }
    }

    /// Preferences that are never written to disk
    pub fn in_memory(initial: Preferences) -> Self {
        Self {
            path: None,
            current: RwLock::new(initial),
        }
    }

    pub async fn get(&self) -> Preferences {
        self.current.read().await.clone()
    }

    pub async fn remember_me(&self) -> bool {
        self.current.read().await.remember_me
    }

    pub async fn set_remember_me(&self, remember: bool) -> AppResult<()> {
        self.update(|prefs| prefs.remember_me = remember).await.map(|_| ())
    }

    pub async fn toggle_theme(&self) -> AppResult<Theme> {
        self.update(|prefs| prefs.theme = prefs.theme.toggled())
            .await
            .map(|prefs| prefs.theme)
    }

    pub async fn toggle_language(&self) -> AppResult<Language> {
        self.update(|prefs| prefs.language = prefs.language.toggled())
            .await
            .map(|prefs| prefs.language)
    }

    async fn update<F>(&self, change: F) -> AppResult<Preferences>
    where
        F: FnOnce(&mut Preferences),
    {
        let mut current = self.current.write().await;
        change(&mut current);

        if let Some(path) = &self.path {
            if let Some(dir) = path.parent() {
                tokio::fs::create_dir_all(dir).await?;
            }
            tokio::fs::write(path, serde_json::to_vec_pretty(&*current)?).await?;
            debug!("Saved preferences to {}", path.display());
        }
        Ok(current.clone())
    }
}

async fn read_preferences(path: &Path) -> Preferences {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Preferences::default(),
        Err(e) => {
            warn!("Could not read preferences {}: {}", path.display(), e);
            return Preferences::default();
        }
    };

    serde_json::from_slice(&bytes).unwrap_or_else(|e| {
        warn!("Ignoring corrupt preferences {}: {}", path.display(), e);
        Preferences::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_defaults_when_file_missing() {
        let dir = tempdir().unwrap();
        let store = PreferenceStore::load(dir.path().join("preferences.json")).await;
        let prefs = store.get().await;

        assert!(!prefs.remember_me);
        assert_eq!(prefs.theme, Theme::Light);
        assert_eq!(prefs.language, Language::Hi);
    }

    #[tokio::test]
    async fn test_changes_survive_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("preferences.json");

        let store = PreferenceStore::load(&path).await;
        store.set_remember_me(true).await.unwrap();
        assert_eq!(store.toggle_theme().await.unwrap(), Theme::Dark);
        assert_eq!(store.toggle_language().await.unwrap(), Language::En);

        let reloaded = PreferenceStore::load(&path).await.get().await;
        assert!(reloaded.remember_me);
        assert_eq!(reloaded.theme, Theme::Dark);
        assert_eq!(reloaded.language.labels().sign_in, "Sign In");
    }

    #[tokio::test]
    async fn test_corrupt_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        tokio::fs::write(&path, b"{not json").await.unwrap();

        let store = PreferenceStore::load(&path).await;
        assert_eq!(store.get().await, Preferences::default());
    }
}
