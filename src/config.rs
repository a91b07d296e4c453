use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, ValueEnum};
use tracing::info;

use crate::actions::CountDetectedObjects;
use crate::core::db::CountDb;
use crate::debug::DebugRenderer;
use crate::detection::{Detector, FakeObjectDetector, LabelMap, TfServingDetector};

/// Wiring profile selected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Environment {
    /// Fake detector and a local SQLite database
    Dev,
    /// TensorFlow Serving detector and PostgreSQL
    Prod,
}

/// Runtime configuration. Every option can also be set through its environment variable.
#[derive(Args, Debug, Clone)]
pub struct Settings {
    /// Wiring profile
    #[arg(long = "env", env = "ENV", value_enum, default_value = "dev")]
    pub environment: Environment,

    /// Database url used by the dev profile
    #[arg(long, env = "DEV_DB_URL", default_value = "sqlite://dev_counter.db?mode=rwc")]
    pub dev_db_url: String,

    /// TensorFlow Serving host
    #[arg(long, env = "TFS_HOST", default_value = "localhost")]
    pub tfs_host: String,

    /// TensorFlow Serving REST port
    #[arg(long, env = "TFS_PORT", default_value_t = 8503)]
    pub tfs_port: u16,

    /// Served model name
    #[arg(long, env = "TFS_MODEL", default_value = "rfcn")]
    pub tfs_model: String,

    /// Inference request timeout in seconds
    #[arg(long, env = "TFS_TIMEOUT_SECS", default_value_t = 30)]
    pub tfs_timeout_secs: u64,

    /// Label map JSON (`[{"id", "display_name"}]`); the bundled MS COCO map when unset
    #[arg(long, env = "LABEL_MAP", value_name = "FILE")]
    pub label_map: Option<PathBuf>,

    #[arg(long, env = "POSTGRES_HOST", default_value = "localhost")]
    pub postgres_host: String,

    #[arg(long, env = "POSTGRES_PORT", default_value_t = 5434)]
    pub postgres_port: u16,

    #[arg(long, env = "POSTGRES_DB", default_value = "")]
    pub postgres_db: String,

    #[arg(long, env = "POSTGRES_USER", default_value = "")]
    pub postgres_user: String,

    #[arg(long, env = "POSTGRES_PASSWORD", default_value = "", hide_env_values = true)]
    pub postgres_password: String,

    /// Save annotated debug images into this directory
    #[arg(long, env = "DEBUG_DIR", value_name = "DIR")]
    pub debug_dir: Option<PathBuf>,

    /// TrueType font for debug image labels
    #[arg(long, env = "DEBUG_FONT", value_name = "FILE")]
    pub debug_font: Option<PathBuf>,
}

impl Settings {
    pub fn postgres_url(&self) -> String {
        format!(
            "postgresql://{}:{}@{}:{}/{}",
            self.postgres_user,
            self.postgres_password,
            self.postgres_host,
            self.postgres_port,
            self.postgres_db
        )
    }

    pub fn database_url(&self) -> String {
        match self.environment {
            Environment::Dev => self.dev_db_url.clone(),
            Environment::Prod => self.postgres_url(),
        }
    }

    fn detector(&self) -> anyhow::Result<Detector> {
        match self.environment {
            Environment::Dev => Ok(Detector::Fake(FakeObjectDetector)),
            Environment::Prod => {
                let labels = match &self.label_map {
                    Some(path) => LabelMap::from_file(path)?,
                    None => LabelMap::mscoco()?,
                };
                let detector = TfServingDetector::new(
                    &self.tfs_host,
                    self.tfs_port,
                    &self.tfs_model,
                    labels,
                    Duration::from_secs(self.tfs_timeout_secs),
                )?;
                Ok(Detector::TfServing(detector))
            }
        }
    }

    fn debug_renderer(&self) -> anyhow::Result<Option<DebugRenderer>> {
        let Some(dir) = &self.debug_dir else {
            return Ok(None);
        };
        let renderer = DebugRenderer::new(dir);
        let renderer = match &self.debug_font {
            Some(font) => renderer.with_font_file(font)?,
            None => renderer,
        };
        Ok(Some(renderer))
    }
}

pub type CountAction = CountDetectedObjects<Detector, CountDb>;

/// Everything a request handler needs, built once at process start.
#[derive(Debug)]
pub struct AppContext {
    count_action: CountAction,
    count_db: CountDb,
}

impl AppContext {
    pub fn new(count_action: CountAction, count_db: CountDb) -> Self {
        Self {
            count_action,
            count_db,
        }
    }

    pub async fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        info!(environment = ?settings.environment, "configuring count action");
        let detector = settings
            .detector()
            .context("Failed to configure object detector")?;
        let count_db = CountDb::new(&settings.database_url())
            .await
            .context("Failed to open count database")?;

        let mut count_action = CountDetectedObjects::new(detector, count_db.clone());
        if let Some(renderer) = settings
            .debug_renderer()
            .context("Failed to configure debug renderer")?
        {
            info!(dir = ?renderer.output_dir(), "debug images enabled");
            count_action = count_action.with_debug_renderer(renderer);
        }
        Ok(Self::new(count_action, count_db))
    }

    pub fn count_action(&self) -> &CountAction {
        &self.count_action
    }

    pub async fn shutdown(&self) {
        self.count_db.close().await;
    }
}
