//! Image tabs.
//!
//! The transform writes image files into a scratch directory scoped to
//! `(athlete_id, key)`. Each run stores its files under names prefixed with
//! a fresh run id, then writes the `images.json` manifest naming them. Until
//! the manifest is replaced, readers keep seeing the previous run's complete
//! set. The scratch directory is removed whether generation succeeds or fails.

use std::fs;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::{Activity, AthleteId, Tab, TabEnv, TabError, TabMeta};

pub const IMAGE_TAB_TYPE: &str = "image_tab";
pub const IMAGE_MANIFEST: &str = "images.json";

pub type ImageFn = Box<dyn Fn(&[Activity], &Path) -> anyhow::Result<()> + Send + Sync>;

pub struct ImageTab {
    meta: TabMeta,
    description: String,
    create_images_function: ImageFn,
}

impl ImageTab {
    pub fn new<F>(name: &str, detailed: bool, description: &str, create_images_function: F) -> Self
    where
        F: Fn(&[Activity], &Path) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            meta: TabMeta::new(name, detailed),
            description: description.to_string(),
            create_images_function: Box::new(create_images_function),
        }
    }

    pub fn with_key(mut self, key: &str) -> Self {
        self.meta.key = Some(key.to_string());
        self
    }

    /// Scratch directory for one athlete's run of this tab.
    pub fn scratch_dir(&self, env: &TabEnv, athlete_id: AthleteId) -> PathBuf {
        env.scratch_root()
            .join(athlete_id.to_string())
            .join(self.get_key())
    }

    /// Public URL of a stored image.
    pub fn image_url(&self, file_name: &str) -> String {
        format!("/api/images/{}/{}", self.get_key(), file_name)
    }

    fn generate_and_store(
        &self,
        activities: &[Activity],
        env: &TabEnv,
        athlete_id: AthleteId,
        dir: &Path,
    ) -> Result<usize, TabError> {
        let key = self.get_key();
        let generated = catch_unwind(AssertUnwindSafe(|| {
            (self.create_images_function)(activities, dir)
        }));
        match generated {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(TabError::generation(&key, &e)),
            Err(_) => {
                return Err(TabError::GenerationFailed {
                    key,
                    reason: "image generation panicked".into(),
                })
            }
        }

        let fail = |reason: String| TabError::GenerationFailed {
            key: key.clone(),
            reason,
        };

        let mut files = Vec::new();
        let entries = fs::read_dir(dir).map_err(|e| fail(format!("reading scratch dir: {e}")))?;
        for entry in entries {
            let entry = entry.map_err(|e| fail(format!("reading scratch dir: {e}")))?;
            let is_file = entry
                .file_type()
                .map_err(|e| fail(format!("reading scratch dir: {e}")))?
                .is_file();
            if !is_file {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) if name.starts_with('.') => {}
                Ok(name) => files.push(name),
                Err(raw) => return Err(fail(format!("non UTF-8 image file name {raw:?}"))),
            }
        }
        files.sort();

        let run_id = uuid::Uuid::new_v4().simple().to_string();
        let mut stored = Vec::with_capacity(files.len());
        for name in &files {
            let bytes = fs::read(dir.join(name)).map_err(|e| fail(format!("reading {name}: {e}")))?;
            let stored_name = format!("{run_id}-{name}");
            env.artifacts
                .save(athlete_id, &key, &stored_name, &bytes)
                .map_err(|e| fail(format!("storing {name}: {e}")))?;
            stored.push(stored_name);
        }

        let manifest = serde_json::to_vec(&stored)?;
        env.artifacts
            .save(athlete_id, &key, IMAGE_MANIFEST, &manifest)
            .map_err(|e| fail(format!("storing {IMAGE_MANIFEST}: {e}")))?;
        Ok(files.len())
    }
}

impl Tab for ImageTab {
    fn meta(&self) -> &TabMeta {
        &self.meta
    }

    fn get_type(&self) -> &'static str {
        IMAGE_TAB_TYPE
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn retrieve_frontend_data(&self, env: &TabEnv, athlete_id: AthleteId) -> Result<Value, TabError> {
        let bytes = env.load_artifact(athlete_id, &self.get_key(), IMAGE_MANIFEST)?;
        let files: Vec<String> = serde_json::from_slice(&bytes)?;
        let images: Vec<String> = files.iter().map(|f| self.image_url(f)).collect();
        Ok(serde_json::json!({
            "description": self.description,
            "images": images,
        }))
    }

    fn backend_processing_hook(
        &self,
        activities: &[Activity],
        env: &TabEnv,
        athlete_id: AthleteId,
    ) -> Result<(), TabError> {
        let dir = self.scratch_dir(env, athlete_id);
        let prepared = if dir.exists() {
            fs::remove_dir_all(&dir).and_then(|_| fs::create_dir_all(&dir))
        } else {
            fs::create_dir_all(&dir)
        };
        if let Err(e) = prepared {
            return Err(TabError::GenerationFailed {
                key: self.get_key(),
                reason: format!("preparing scratch dir {}: {e}", dir.display()),
            });
        }

        let result = self.generate_and_store(activities, env, athlete_id, &dir);

        if let Err(e) = fs::remove_dir_all(&dir) {
            tracing::warn!(dir = %dir.display(), error = %e, "failed to remove image scratch dir");
        }

        match result {
            Ok(count) => {
                tracing::debug!(key = %self.get_key(), athlete = %athlete_id, images = count, "stored images");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(key = %self.get_key(), athlete = %athlete_id, error = %e, "image generation failed");
                Err(e)
            }
        }
    }
}
