use anyhow::Result;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{error, info, Instrument};

use crate::catalog::entry::{normalize, Platform, RawCatalogEntry};
use crate::catalog::source::{CatalogClient, CatalogSources, FetchError};
use crate::database_ops::games::{GameStore, NewGame};

/// Fatal import failure. Raised before any row is written.
#[derive(Debug, thiserror::Error)]
pub enum PopulateError {
    #[error("failed to fetch {platform} catalog: {source}")]
    Fetch {
        platform: Platform,
        #[source]
        source: FetchError,
    },
}

/// Running tally of a reconciliation pass, and its final report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PopulateSummary {
    /// Candidates created or updated.
    pub processed: usize,
    pub total: usize,
    pub created: usize,
    pub updated: usize,
    pub failed: usize,
}

impl PopulateSummary {
    fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    fn record(self, outcome: Outcome) -> Self {
        let (created, updated) = match outcome {
            Outcome::Created => (self.created + 1, self.updated),
            Outcome::Updated => (self.created, self.updated + 1),
        };
        Self {
            processed: self.processed + 1,
            created,
            updated,
            ..self
        }
    }

    fn record_failure(self) -> Self {
        Self {
            failed: self.failed + 1,
            ..self
        }
    }

    pub fn message(&self) -> String {
        format!(
            "Successfully processed {} out of {} games",
            self.processed, self.total
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Created,
    Updated,
}

/// Fetch both catalogs, merge them and reconcile every candidate against `store`.
pub async fn populate<S>(
    client: &CatalogClient,
    store: &S,
    sources: &CatalogSources,
) -> Result<PopulateSummary, PopulateError>
where
    S: GameStore + ?Sized,
{
    let run_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("populate", %run_id);
    async move {
        let candidates = fetch_candidates(client, sources).await?;
        info!(candidates = candidates.len(), "catalogs fetched");
        let summary = reconcile(store, candidates).await;
        info!(
            processed = summary.processed,
            total = summary.total,
            created = summary.created,
            updated = summary.updated,
            failed = summary.failed,
            "catalog import finished"
        );
        Ok(summary)
    }
    .instrument(span)
    .await
}

/// Fetch both sources concurrently; either failing fails the whole stage.
pub async fn fetch_candidates(
    client: &CatalogClient,
    sources: &CatalogSources,
) -> Result<Vec<NewGame>, PopulateError> {
    let fetch = |platform: Platform| async move {
        client
            .fetch(sources.url(platform))
            .await
            .map(|body| body.into_entries())
            .map_err(|source| PopulateError::Fetch { platform, source })
    };
    let (android, ios) = tokio::try_join!(fetch(Platform::Android), fetch(Platform::Ios))?;
    Ok(merge_candidates(android, ios))
}

/// Android candidates in source order, then ios candidates in source order.
pub fn merge_candidates(android: Vec<RawCatalogEntry>, ios: Vec<RawCatalogEntry>) -> Vec<NewGame> {
    android
        .into_iter()
        .map(|e| normalize(e, Platform::Android))
        .chain(ios.into_iter().map(|e| normalize(e, Platform::Ios)))
        .collect()
}

/// Upsert each candidate by (name, platform), one at a time. A failing
/// candidate is logged and skipped.
///
/// Lookup and write are separate statements, so two concurrent passes over the
/// same catalog can both insert the same natural key.
pub async fn reconcile<S>(store: &S, candidates: Vec<NewGame>) -> PopulateSummary
where
    S: GameStore + ?Sized,
{
    let total = candidates.len();
    stream::iter(candidates)
        .fold(PopulateSummary::new(total), |tally, candidate| async move {
            match reconcile_one(store, &candidate).await {
                Ok(outcome) => tally.record(outcome),
                Err(e) => {
                    error!(
                        name = %candidate.name,
                        platform = %candidate.platform,
                        error = %format!("{e:#}"),
                        "error processing catalog game"
                    );
                    tally.record_failure()
                }
            }
        })
        .await
}

async fn reconcile_one<S>(store: &S, candidate: &NewGame) -> Result<Outcome>
where
    S: GameStore + ?Sized,
{
    match store
        .find_by_natural_key(&candidate.name, &candidate.platform)
        .await?
    {
        Some(existing) => {
            store.update(existing.id, candidate).await?;
            Ok(Outcome::Updated)
        }
        None => {
            store.create(candidate).await?;
            Ok(Outcome::Created)
        }
    }
}
