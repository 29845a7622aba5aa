//! Shared application state handed to every handler.

use crate::config::ServerConfig;
use crate::render::build_tera;
use crate::session::SessionRegistry;
use anyhow::Result;
use sqlx::SqlitePool;
use std::sync::Arc;
use tera::Tera;

pub struct AppState {
    config: Arc<ServerConfig>,
    pool: SqlitePool,
    sessions: Arc<SessionRegistry>,
    templates: Tera,
}

impl AppState {
    pub fn new(config: Arc<ServerConfig>, pool: SqlitePool) -> Result<Self> {
        let templates = build_tera(&config.template_glob())?;
        let sessions = Arc::new(SessionRegistry::new(config.session_ttl));
        Ok(Self {
            config,
            pool,
            sessions,
            templates,
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    pub fn templates(&self) -> &Tera {
        &self.templates
    }
}
