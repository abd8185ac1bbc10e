//! Generation pipeline: synthesize a prompt, run inference, store the image.

use crate::ai::{build_image_service, ImageGenerationService};
use crate::config::Config;
use crate::image::ImageStore;
use crate::models::Generation;
use crate::prompts::PromptSynthesizer;
use crate::words::WordBank;
use crate::{Error, Result};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

/// Coordinates prompt synthesis, inference and storage for one request.
///
/// At most `max_concurrent` generations run at once; further triggers are
/// rejected with [`Error::Busy`] rather than queued behind the model.
pub struct Generator {
    synthesizer: PromptSynthesizer,
    image_gen: Box<dyn ImageGenerationService>,
    store: ImageStore,
    permits: Arc<Semaphore>,
    max_concurrent: usize,
}

/// Injectable service bundle used to construct [`Generator`] in tests.
pub struct GeneratorServices {
    pub synthesizer: PromptSynthesizer,
    pub image_gen: Box<dyn ImageGenerationService>,
    pub store: ImageStore,
}

impl Generator {
    pub fn with_services(services: GeneratorServices, max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            synthesizer: services.synthesizer,
            image_gen: services.image_gen,
            store: services.store,
            permits: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
        }
    }

    /// Load word lists, open the image store and build the configured provider.
    pub fn from_config(config: &Config) -> Result<Self> {
        let bank = WordBank::from_dir(&config.words_dir)?;
        match &bank {
            Some(bank) => info!(
                "Loaded {} word categories from {}",
                bank.len(),
                config.words_dir.display()
            ),
            None => warn!(
                "Word directory {} is missing; /generate will fail until it exists and the server restarts",
                config.words_dir.display()
            ),
        }

        let synthesizer = PromptSynthesizer::new(bank).with_chimera_chance(config.chimera_chance);
        let store = ImageStore::new(&config.images_dir)?;
        info!("Storing images in {}", store.dir().display());

        Ok(Self::with_services(
            GeneratorServices {
                synthesizer,
                image_gen: build_image_service(config)?,
                store,
            },
            config.max_concurrent_generations,
        ))
    }

    /// Run one full generation.
    pub async fn generate(&self) -> Result<Generation> {
        let generated = {
            let mut rng = rand::thread_rng();
            self.synthesizer.synthesize(&mut rng)
        };
        let Some(generated) = generated else {
            error!("Failed to generate prompt: no word lists loaded");
            return Err(Error::WordSelection("Failed to generate prompt".to_string()));
        };

        let _permit = self.permits.clone().try_acquire_owned().map_err(|_| {
            warn!("Rejecting generation: all {} slots busy", self.max_concurrent);
            Error::Busy
        })?;

        info!("Generating '{}'", generated.title);
        info!("Prompt ({} chars): {}", generated.prompt.len(), generated.prompt);

        let image_data = self
            .image_gen
            .generate_image(&generated.prompt)
            .await
            .map_err(|e| {
                error!("Inference failed for '{}': {}", generated.title, e);
                e
            })?;
        info!("Generated image ({} bytes)", image_data.len());

        let filename = self.store.save(&image_data).await?;

        Ok(Generation {
            title: generated.title,
            prompt: generated.prompt,
            filename,
        })
    }

    /// Stored image bytes by file name.
    pub async fn fetch_image(&self, filename: &str) -> Result<Option<Vec<u8>>> {
        self.store.load(filename).await
    }

    /// Generation slots currently free.
    pub fn available_slots(&self) -> usize {
        self.permits.available_permits()
    }

    pub fn has_words(&self) -> bool {
        self.synthesizer.has_words()
    }
}
