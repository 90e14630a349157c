use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tj_core::{all_destinations_by_creation_ascending, Configuration, Destination, Snapshot};
use tj_storage::{RecordStore, UnavailableStore};
use tj_storage_sqlite::SqliteStore;
use tj_timeline::{now_unix, CancellationToken, SnapshotFetcher, Timeline, TimelineGenerator};

use crate::Config;

/// Journal store plus the timeline pipeline reading from it. The store handle is passed
/// down explicitly; nothing here is process-global.
///
/// Reads go through a read-only handle. A journal that cannot be opened still yields a
/// provider whose snapshots carry no destination.
pub struct WidgetProvider {
    pub root: PathBuf,
    pub cfg: Config,
    db_path: PathBuf,
    store: Arc<dyn RecordStore>,
    generator: TimelineGenerator,
}

impl WidgetProvider {
    pub fn open(root: PathBuf) -> Result<Self> {
        let cfg_path = Config::config_path(&root);
        let cfg = if cfg_path.exists() {
            Config::load_from(&cfg_path)?
        } else {
            let cfg = Config::default_for_root();
            cfg.save_to(&cfg_path)?;
            cfg
        };

        let db_path = cfg.db_path(&root);
        let store = open_reader(&db_path);
        let generator = TimelineGenerator::new(SnapshotFetcher::new(store.clone()));

        Ok(Self {
            root,
            cfg,
            db_path,
            store,
            generator,
        })
    }

    pub fn init(root: &Path) -> Result<()> {
        let cfg_path = Config::config_path(root);
        let cfg = if cfg_path.exists() {
            Config::load_from(&cfg_path)?
        } else {
            let cfg = Config::default_for_root();
            cfg.save_to(&cfg_path)?;
            cfg
        };
        // create db
        let _ = SqliteStore::open(&cfg.db_path(root))?;
        Ok(())
    }

    /// Configuration to use when a request brings none.
    pub fn default_configuration(&self) -> &Configuration {
        &self.cfg.widget.params
    }

    pub fn placeholder(&self) -> Snapshot {
        self.generator.fetcher().placeholder()
    }

    pub fn snapshot(&self, configuration: &Configuration) -> Snapshot {
        self.generator.fetcher().fetch(configuration.clone())
    }

    pub fn timeline(&self, configuration: &Configuration) -> Result<Timeline> {
        self.timeline_for(configuration, self.cfg.window()?, self.cfg.tick()?, &CancellationToken::new())
    }

    pub fn timeline_for(
        &self,
        configuration: &Configuration,
        window: Duration,
        tick: Duration,
        cancel: &CancellationToken,
    ) -> Result<Timeline> {
        let timeline = self
            .generator
            .generate_with_cancel(configuration, window, tick, cancel)
            .context("generate timeline")?;
        Ok(timeline)
    }

    pub fn add_destination(
        &self,
        caption: &str,
        details: &str,
        image: Option<Vec<u8>>,
        created_at_unix: Option<i64>,
    ) -> Result<Destination> {
        let mut destination = Destination::new(caption, details, created_at_unix.unwrap_or_else(now_unix));
        destination.image = image;
        let writer = SqliteStore::open(&self.db_path)?;
        writer
            .insert_destination(destination.clone())
            .with_context(|| format!("insert destination {}", destination.id))?;
        Ok(destination)
    }

    pub fn list_destinations(&self) -> Result<Vec<Destination>> {
        let all = self.store.query(&all_destinations_by_creation_ascending())?;
        Ok(all)
    }
}

/// Read-only handle for the widget side. A journal that does not exist yet is created
/// first; any other open failure becomes an `UnavailableStore`.
fn open_reader(db_path: &Path) -> Arc<dyn RecordStore> {
    if !db_path.exists() {
        if let Err(e) = SqliteStore::open(db_path) {
            tracing::warn!(db = %db_path.display(), error = %format!("{e:#}"), "could not create journal");
        }
    }
    match SqliteStore::open_read_only(db_path) {
        Ok(store) => {
            tracing::debug!(db = %db_path.display(), "journal opened read-only");
            Arc::new(store)
        }
        Err(e) => {
            tracing::warn!(db = %db_path.display(), error = %e, "journal unavailable");
            Arc::new(UnavailableStore::new(&e))
        }
    }
}
