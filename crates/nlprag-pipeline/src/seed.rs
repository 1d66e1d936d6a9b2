//! Seed corpus loaded from a `disease,description` CSV.

use std::io::Read;
use std::path::Path;

use nlprag_core::{Error, Result, TaskKind};
use serde::Deserialize;

use crate::{PipelineContext, TRACING_TARGET_SEED};

/// One usable row of the seed file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SeedRecord {
    pub disease: String,
    pub description: String,
}

/// Seed documents for every task collection.
#[derive(Debug, Clone, Default)]
pub struct SeedCorpus {
    records: Vec<SeedRecord>,
    max_length: usize,
}

impl SeedCorpus {
    /// Loads up to `limit` usable rows from a CSV file.
    pub fn load(path: impl AsRef<Path>, limit: usize, max_length: usize) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| {
            Error::configuration()
                .with_message(format!("cannot open seed file {}", path.display()))
                .with_source(e)
        })?;

        let corpus = Self::from_reader(file, limit, max_length)?;
        tracing::info!(
            target: TRACING_TARGET_SEED,
            path = %path.display(),
            records = corpus.len(),
            "Loaded seed corpus"
        );
        Ok(corpus)
    }

    /// Reads up to `limit` usable rows from CSV data with a header line.
    ///
    /// Rows with an empty disease or description are skipped.
    pub fn from_reader<R: Read>(reader: R, limit: usize, max_length: usize) -> Result<Self> {
        let mut reader = csv::Reader::from_reader(reader);
        let mut records = Vec::new();

        for (index, row) in reader.deserialize::<SeedRecord>().enumerate() {
            if records.len() >= limit {
                break;
            }

            let row = row.map_err(|e| {
                Error::invalid_input()
                    .with_message(format!("malformed seed row {}", index + 2))
                    .with_source(e)
            })?;

            let disease = row.disease.trim();
            let description = row.description.trim();
            if disease.is_empty() || description.is_empty() {
                tracing::warn!(
                    target: TRACING_TARGET_SEED,
                    row = index + 2,
                    "Skipping seed row with empty disease or description"
                );
                continue;
            }

            records.push(SeedRecord {
                disease: disease.to_owned(),
                description: description.to_owned(),
            });
        }

        Ok(Self {
            records,
            max_length,
        })
    }

    /// Returns the number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns whether the corpus holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the texts indexed into the collection of `kind`.
    ///
    /// Each text is at most the configured number of characters long.
    pub fn texts(&self, kind: TaskKind) -> Vec<String> {
        self.records
            .iter()
            .map(|record| {
                let prefix = match kind {
                    TaskKind::Classify => format!("{}: ", record.disease),
                    TaskKind::ExtractEntities | TaskKind::Summarize => String::new(),
                    TaskKind::Sentiment => format!("Information on {}: ", record.disease),
                };
                let room = self.max_length.saturating_sub(prefix.chars().count());
                let description: String = record.description.chars().take(room).collect();
                format!("{prefix}{description}")
            })
            .collect()
    }

    /// Indexes the corpus into every collection that holds no points yet.
    ///
    /// Returns the number of documents written.
    #[tracing::instrument(skip_all, fields(records = self.len()), target = TRACING_TARGET_SEED)]
    pub async fn seed(&self, ctx: &PipelineContext) -> Result<usize> {
        if self.is_empty() {
            return Ok(0);
        }

        let mut written = 0;
        for kind in TaskKind::ALL {
            let collection = kind.collection_name();
            let existing = ctx.store.count(collection).await?;
            if existing > 0 {
                tracing::info!(
                    target: TRACING_TARGET_SEED,
                    collection = %collection,
                    points = existing,
                    "Collection already populated, skipping seed"
                );
                continue;
            }

            let texts = self.texts(kind);
            let vectors = ctx.embeddings.embed(&texts).await?;
            let ids = ctx
                .store
                .upsert(collection, texts.into_iter().zip(vectors).collect())
                .await?;

            tracing::info!(
                target: TRACING_TARGET_SEED,
                collection = %collection,
                points = ids.len(),
                "Seeded collection"
            );
            written += ids.len();
        }

        Ok(written)
    }
}
