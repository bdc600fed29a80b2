mod command;

pub use command::CommandLayout;

use std::fs;
use std::path::PathBuf;

use crib_core::model::deck::Deck;
use crib_core::model::layout::Layout;
use rand::SeedableRng;
use rand::rngs::StdRng;
use thiserror::Error;
use tracing::{Level, event};

use crate::config::{LayoutConfig, LayoutSourceKind};

/// Supplies the four dealt piles for each game.
pub trait LayoutSource {
    fn name(&self) -> &str;

    /// `attempt` counts every game played in the run, retries included.
    fn next_layout(&mut self, attempt: usize) -> Result<Layout, PerceptionError>;
}

/// The same layout for every game.
#[derive(Debug, Clone)]
pub struct FixedLayout {
    layout: Layout,
}

impl FixedLayout {
    pub fn new(layout: Layout) -> Self {
        Self { layout }
    }

    pub fn sample() -> Self {
        Self::new(Layout::sample())
    }
}

impl LayoutSource for FixedLayout {
    fn name(&self) -> &str {
        "fixed"
    }

    fn next_layout(&mut self, _attempt: usize) -> Result<Layout, PerceptionError> {
        Ok(self.layout.clone())
    }
}

/// A fresh shuffled deal for every game, reproducible from one seed.
#[derive(Debug)]
pub struct SeededLayout {
    rng: StdRng,
}

impl SeededLayout {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl LayoutSource for SeededLayout {
    fn name(&self) -> &str {
        "seeded"
    }

    fn next_layout(&mut self, _attempt: usize) -> Result<Layout, PerceptionError> {
        Ok(Deck::shuffled(&mut self.rng).deal())
    }
}

/// Reads a layout file (JSON, or YAML for any other extension) on every
/// game, so an external tool may rewrite it between games.
#[derive(Debug, Clone)]
pub struct FileLayout {
    path: PathBuf,
}

impl FileLayout {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl LayoutSource for FileLayout {
    fn name(&self) -> &str {
        "file"
    }

    fn next_layout(&mut self, _attempt: usize) -> Result<Layout, PerceptionError> {
        let raw = fs::read_to_string(&self.path).map_err(|source| PerceptionError::Read {
            path: self.path.clone(),
            source,
        })?;
        let is_json = self
            .path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let parsed = if is_json {
            serde_json::from_str::<Layout>(&raw).map_err(|err| err.to_string())
        } else {
            serde_yaml::from_str::<Layout>(&raw).map_err(|err| err.to_string())
        };
        parsed.map_err(|message| PerceptionError::Malformed {
            source_name: self.path.display().to_string(),
            message,
        })
    }
}

#[derive(Debug, Error)]
pub enum PerceptionError {
    #[error("failed to read layout {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to launch recogniser '{program}': {message}")]
    Spawn { program: String, message: String },
    #[error("recogniser '{program}' failed with {status}: {stderr}")]
    Status {
        program: String,
        status: String,
        stderr: String,
    },
    #[error("malformed layout from {source_name}: {message}")]
    Malformed { source_name: String, message: String },
}

/// Builds the layout source a validated configuration asks for.
pub fn source_from_config(config: &LayoutConfig) -> Box<dyn LayoutSource> {
    let source: Box<dyn LayoutSource> = match config.source {
        LayoutSourceKind::Sample => Box::new(FixedLayout::sample()),
        LayoutSourceKind::Seeded => Box::new(SeededLayout::new(config.seed.unwrap_or(0))),
        LayoutSourceKind::File => match &config.path {
            Some(path) => Box::new(FileLayout::new(path.clone())),
            None => Box::new(FixedLayout::sample()),
        },
        LayoutSourceKind::Command => match &config.command {
            Some(program) => Box::new(CommandLayout::new(program.clone(), config.args.clone())),
            None => Box::new(FixedLayout::sample()),
        },
    };
    event!(
        target: "crib_runner::perception",
        Level::DEBUG,
        source = source.name(),
        "layout source ready"
    );
    source
}
