//! Filesystem workspace
//!
//! Layout under the workspace root:
//!
//! ```text
//! <root>/<project_id>/project.json
//! <root>/<project_id>/snapshots/<snapshot_id>.json
//! ```
//!
//! Projects are written once at creation. Snapshots are append-only.

mod dashboard;

pub use dashboard::monitoring_panels;

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

use crate::contracts::*;
use crate::error::{MonitorError, Result};

pub const PROJECT_FILE: &str = "project.json";
pub const SNAPSHOTS_DIR: &str = "snapshots";

/// Destination of generated reports and test suites
pub trait SnapshotStore {
    /// Append a report to a project
    fn add_report(&self, project_id: Uuid, report: &Report) -> Result<()>;

    /// Append a test suite to a project
    fn add_test_suite(&self, project_id: Uuid, test_suite: &TestSuite) -> Result<()>;
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum SnapshotRef<'a> {
    Report(&'a Report),
    TestSuite(&'a TestSuite),
}

/// Project store rooted at a local directory
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Open the workspace at `path`, creating the directory if needed
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let root = path.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create and persist an empty project
    pub fn create_project(&self, name: &str, description: &str) -> Result<Project> {
        let project = Project::new(name).with_description(description);
        self.save_project(&project)?;
        Ok(project)
    }

    /// Create the monitoring project with its dashboard panels
    pub fn create_monitoring_project(&self, name: &str, description: &str) -> Result<Project> {
        let mut project = Project::new(name).with_description(description);
        for panel in monitoring_panels() {
            project.add_panel(panel);
        }
        self.save_project(&project)?;

        info!(
            project_id = %project.id,
            project = %project.name,
            panels = project.dashboard.panels.len(),
            "Created workspace project"
        );
        Ok(project)
    }

    /// Write the project file
    pub fn save_project(&self, project: &Project) -> Result<()> {
        let dir = self.project_dir(project.id);
        fs::create_dir_all(dir.join(SNAPSHOTS_DIR))?;
        fs::write(dir.join(PROJECT_FILE), serde_json::to_string_pretty(project)?)?;
        Ok(())
    }

    pub fn load_project(&self, project_id: Uuid) -> Result<Project> {
        let path = self.project_dir(project_id).join(PROJECT_FILE);
        if !path.exists() {
            return Err(MonitorError::ProjectNotFound(project_id));
        }
        let content = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// All projects, oldest first; directories without a project file are skipped
    pub fn list_projects(&self) -> Result<Vec<Project>> {
        let mut projects = Vec::new();

        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            let file = path.join(PROJECT_FILE);
            if path.is_dir() && file.exists() {
                let content = fs::read_to_string(&file)?;
                projects.push(serde_json::from_str::<Project>(&content)?);
            }
        }

        projects.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(projects)
    }

    /// Snapshots of a project in timestamp order
    pub fn list_snapshots(&self, project_id: Uuid) -> Result<Vec<Snapshot>> {
        let dir = self.snapshots_dir(project_id)?;
        let mut snapshots = Vec::new();

        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().map_or(false, |ext| ext == "json") {
                let content = fs::read_to_string(&path)?;
                snapshots.push(serde_json::from_str::<Snapshot>(&content)?);
            }
        }

        snapshots.sort_by(|a, b| a.timestamp().cmp(&b.timestamp()));
        Ok(snapshots)
    }

    fn project_dir(&self, project_id: Uuid) -> PathBuf {
        self.root.join(project_id.to_string())
    }

    fn snapshots_dir(&self, project_id: Uuid) -> Result<PathBuf> {
        let project_dir = self.project_dir(project_id);
        if !project_dir.join(PROJECT_FILE).exists() {
            return Err(MonitorError::ProjectNotFound(project_id));
        }
        let dir = project_dir.join(SNAPSHOTS_DIR);
        if !dir.is_dir() {
            return Err(MonitorError::workspace(format!(
                "missing snapshot directory {}",
                dir.display()
            )));
        }
        Ok(dir)
    }

    fn write_snapshot(&self, project_id: Uuid, id: Uuid, snapshot: SnapshotRef<'_>) -> Result<()> {
        let path = self.snapshots_dir(project_id)?.join(format!("{}.json", id));
        fs::write(&path, serde_json::to_string_pretty(&snapshot)?)?;
        Ok(())
    }
}

impl SnapshotStore for Workspace {
    fn add_report(&self, project_id: Uuid, report: &Report) -> Result<()> {
        self.write_snapshot(project_id, report.id, SnapshotRef::Report(report))
    }

    fn add_test_suite(&self, project_id: Uuid, test_suite: &TestSuite) -> Result<()> {
        self.write_snapshot(project_id, test_suite.id, SnapshotRef::TestSuite(test_suite))
    }
}
