//! Project container

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{DashboardConfig, DashboardPanel};

/// Named container of dashboard panels and appended snapshots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub dashboard: DashboardConfig,
    pub created_at: DateTime<Utc>,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: Uuid::new_v4(),
            dashboard: DashboardConfig {
                name: name.clone(),
                panels: Vec::new(),
            },
            name,
            description: String::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn add_panel(&mut self, panel: DashboardPanel) {
        self.dashboard.add_panel(panel);
    }
}
