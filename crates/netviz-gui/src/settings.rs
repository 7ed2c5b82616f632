use netviz_graph::CanvasConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const MAX_RECENT_GRAPHS: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub canvas: CanvasConfig,
    pub show_info_panel: bool,
    #[serde(default = "default_reopen_last_graph")]
    pub reopen_last_graph: bool,
    pub last_graph: Option<PathBuf>,
    pub recent_graphs: Vec<PathBuf>,
}

fn default_reopen_last_graph() -> bool {
    true
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            canvas: CanvasConfig::default(),
            show_info_panel: true,
            reopen_last_graph: true,
            last_graph: None,
            recent_graphs: Vec::new(),
        }
    }
}

impl AppSettings {
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("netviz").join("settings.json"))
    }

    pub fn load() -> Self {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Self {
        tracing::info!("Loading settings from {:?}", path);
        if !path.exists() {
            tracing::info!("Settings file not found, using defaults");
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(settings) => return settings,
                Err(e) => tracing::error!("Failed to parse settings: {}", e),
            },
            Err(e) => tracing::error!("Failed to read settings file: {}", e),
        }
        Self::default()
    }

    pub fn save(&self) {
        if let Some(path) = Self::path() {
            if let Err(e) = self.save_to(&path) {
                tracing::error!("Failed to save settings: {}", e);
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Record a successfully opened graph at the front of the recent list.
    pub fn remember_graph(&mut self, path: &Path) {
        self.recent_graphs.retain(|p| p != path);
        self.recent_graphs.insert(0, path.to_path_buf());
        self.recent_graphs.truncate(MAX_RECENT_GRAPHS);
        self.last_graph = Some(path.to_path_buf());
    }
}
