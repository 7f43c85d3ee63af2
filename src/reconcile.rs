//! Reconciliation of two language variants of the same table.
//!
//! The primary-language table is loaded into a working set. Each row of the
//! secondary-language table is translated into the primary language, first
//! with the local model and, unless that gave an exact match, with the cloud
//! translator. The best candidate is committed in place; rows with no
//! candidate at all are appended as new records. A final back-fill pass
//! completes the secondary-language fields that are still missing.

use crate::i18n::{label_in_other, Language};
use crate::matcher::find_best;
use crate::record::{Record, WorkingSet};
use crate::translation::{Backend, TranslateError, TranslationGateway};
use tracing::{debug, info};

/// Backends in evaluation order. Earlier wins ties.
const BACKENDS: [Backend; 2] = [Backend::LocalModel, Backend::CloudApi];

/// Column names of a bilingual table.
///
/// Category and name columns are `type_<language>` and `name_<language>`,
/// e.g. `type_english` and `name_french`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BilingualLayout {
    pub id: String,
    pub primary: Language,
    pub secondary: Language,
}

impl BilingualLayout {
    pub fn new(id: &str, primary: Language, secondary: Language) -> Self {
        Self {
            id: id.to_string(),
            primary,
            secondary,
        }
    }

    /// NOC elements: English primary, French secondary, keyed by `noc_code`.
    pub fn noc() -> Self {
        Self::new("noc_code", Language::ENGLISH, Language::FRENCH)
    }

    pub fn type_key(&self, language: Language) -> String {
        format!("type_{}", language.column_suffix())
    }

    pub fn name_key(&self, language: Language) -> String {
        format!("name_{}", language.column_suffix())
    }

    /// A record with every layout column present and null.
    pub fn blank(&self) -> Record {
        Record::new()
            .with_null(&self.id)
            .with_null(&self.type_key(self.primary))
            .with_null(&self.name_key(self.primary))
            .with_null(&self.type_key(self.secondary))
            .with_null(&self.name_key(self.secondary))
    }
}

impl Default for BilingualLayout {
    fn default() -> Self {
        Self::noc()
    }
}

/// A provisional match proposed by one backend's translation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateMatch {
    pub backend: Backend,
    pub index: usize,
    pub score: f64,
}

/// Pick the candidate with the strictly highest score.
///
/// On equal scores the candidate listed first wins, so callers list them in
/// backend evaluation order.
pub fn arbitrate(candidates: &[CandidateMatch]) -> Option<CandidateMatch> {
    let mut best: Option<CandidateMatch> = None;
    for candidate in candidates {
        if best.map_or(true, |b| candidate.score > b.score) {
            best = Some(*candidate);
        }
    }
    best
}

/// What happened to one secondary-language row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    /// Matched with score 1.0 using `backend`'s translation.
    Exact { index: usize, backend: Backend },
    /// Merged into the best provisional candidate.
    Arbitrated { index: usize, backend: Backend, score: f64 },
    /// No candidate; appended as a new record at `index`.
    Synthesized { index: usize },
}

impl Outcome {
    pub fn index(&self) -> usize {
        match *self {
            Outcome::Exact { index, .. }
            | Outcome::Arbitrated { index, .. }
            | Outcome::Synthesized { index } => index,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    pub exact: usize,
    pub arbitrated: usize,
    pub synthesized: usize,
}

impl ReconcileStats {
    fn count(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Exact { .. } => self.exact += 1,
            Outcome::Arbitrated { .. } => self.arbitrated += 1,
            Outcome::Synthesized { .. } => self.synthesized += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackfillStats {
    pub types_filled: usize,
    pub names_translated: usize,
    pub skipped: usize,
}

/// Builds the merged table one secondary-language row at a time.
pub struct Reconciler<'a, G> {
    gateway: &'a G,
    layout: BilingualLayout,
    set: WorkingSet,
}

impl<'a, G: TranslationGateway> Reconciler<'a, G> {
    pub fn new(gateway: &'a G, layout: BilingualLayout) -> Self {
        Self {
            gateway,
            layout,
            set: WorkingSet::new(),
        }
    }

    /// Load primary-language rows. Layout columns they lack are added as null.
    pub fn seed(&mut self, primary: Vec<Record>) {
        let blank = self.layout.blank();
        for record in primary {
            self.set.push(record.over(&blank));
        }
    }

    pub fn working_set(&self) -> &WorkingSet {
        &self.set
    }

    pub fn into_working_set(self) -> WorkingSet {
        self.set
    }

    /// Reconcile one secondary-language row against the working set.
    pub async fn reconcile_row(&mut self, row: &Record) -> Result<Outcome, TranslateError> {
        let layout = self.layout.clone();
        let primary_name = layout.name_key(layout.primary);
        let secondary_type = row.get(&layout.type_key(layout.secondary));
        let secondary_name = row.get(&layout.name_key(layout.secondary));

        // Secondary columns stay null so already matched records never qualify
        let mut probe = layout.blank();
        probe.set(&layout.id, row.get(&layout.id).map(str::to_string));
        probe.set(
            &layout.type_key(layout.primary),
            secondary_type
                .and_then(|label| label_in_other(label, layout.secondary))
                .map(str::to_string),
        );

        // Without a name there is nothing to translate a second time
        let evaluated = if secondary_name.is_some() { BACKENDS.len() } else { 1 };

        let mut candidates = Vec::new();
        let mut first_translation: Option<String> = None;

        for backend in BACKENDS.into_iter().take(evaluated) {
            let translated = match secondary_name {
                Some(name) => Some(
                    self.gateway
                        .translate(name, layout.secondary, layout.primary, backend)
                        .await?,
                ),
                None => None,
            };
            if first_translation.is_none() {
                first_translation = translated.clone();
            }
            probe.set(&primary_name, translated);

            match find_best(&probe, self.set.records(), &primary_name) {
                Some(found) if found.is_exact() => {
                    debug!(
                        "{:?}: exact match at {} via {}",
                        secondary_name, found.index, backend
                    );
                    self.commit(found.index, row);
                    return Ok(Outcome::Exact {
                        index: found.index,
                        backend,
                    });
                }
                Some(found) => {
                    debug!(
                        "{:?}: candidate {} ({:.3}) via {}",
                        secondary_name, found.index, found.score, backend
                    );
                    candidates.push(CandidateMatch {
                        backend,
                        index: found.index,
                        score: found.score,
                    });
                }
                None => debug!("{:?}: no candidate via {}", secondary_name, backend),
            }
        }

        if let Some(winner) = arbitrate(&candidates) {
            self.commit(winner.index, row);
            return Ok(Outcome::Arbitrated {
                index: winner.index,
                backend: winner.backend,
                score: winner.score,
            });
        }

        let index = self.synthesize(row, probe, first_translation);
        debug!("{:?}: synthesized record {}", secondary_name, index);
        Ok(Outcome::Synthesized { index })
    }

    /// Complete missing secondary-language fields of every record.
    pub async fn backfill(&mut self) -> Result<BackfillStats, TranslateError> {
        backfill(self.gateway, &self.layout, &mut self.set).await
    }

    fn commit(&mut self, index: usize, row: &Record) {
        for key in [
            self.layout.type_key(self.layout.secondary),
            self.layout.name_key(self.layout.secondary),
        ] {
            self.set
                .set_field(index, &key, row.get(&key).map(str::to_string));
        }
    }

    fn synthesize(&mut self, row: &Record, probe: Record, translation: Option<String>) -> usize {
        let layout = &self.layout;
        let mut record = probe;
        record.set(&layout.name_key(layout.primary), translation);
        for key in [
            layout.type_key(layout.secondary),
            layout.name_key(layout.secondary),
        ] {
            record.set(&key, row.get(&key).map(str::to_string));
        }
        self.set.push(record)
    }
}

/// Fill missing (null or empty) secondary-language fields in place.
///
/// The category comes from the lexicon and stays null when the primary label
/// is unknown. The name is translated from the primary name with the cloud
/// translator. Records without a primary name still get their category but
/// keep a blank name.
pub async fn backfill<G: TranslationGateway>(
    gateway: &G,
    layout: &BilingualLayout,
    set: &mut WorkingSet,
) -> Result<BackfillStats, TranslateError> {
    let primary_type = layout.type_key(layout.primary);
    let primary_name = layout.name_key(layout.primary);
    let secondary_type = layout.type_key(layout.secondary);
    let secondary_name = layout.name_key(layout.secondary);

    let mut stats = BackfillStats::default();

    for index in 0..set.len() {
        let Some(record) = set.get(index) else {
            continue;
        };

        if record.is_blank(&secondary_type) {
            let label = record
                .get(&primary_type)
                .and_then(|label| label_in_other(label, layout.primary));
            if let Some(label) = label {
                set.set_field(index, &secondary_type, Some(label.to_string()));
                stats.types_filled += 1;
            }
        }

        let Some(record) = set.get(index) else {
            continue;
        };
        let Some(name) = record.get(&primary_name).filter(|n| !n.is_empty()) else {
            stats.skipped += 1;
            continue;
        };
        let name = name.to_string();

        if record.is_blank(&secondary_name) {
            let translated = gateway
                .translate(&name, layout.primary, layout.secondary, Backend::CloudApi)
                .await?;
            set.set_field(index, &secondary_name, Some(translated));
            stats.names_translated += 1;
        }
    }

    info!(
        "Back-fill: {} categories filled, {} names translated, {} records without a {} name",
        stats.types_filled,
        stats.names_translated,
        stats.skipped,
        layout.primary.name()
    );
    Ok(stats)
}

/// Reconcile `secondary` rows into `primary` rows, then back-fill.
pub async fn reconcile<G: TranslationGateway>(
    gateway: &G,
    layout: BilingualLayout,
    primary: Vec<Record>,
    secondary: &[Record],
) -> Result<WorkingSet, TranslateError> {
    info!(
        "Reconciling {} {} rows into {} {} rows",
        secondary.len(),
        layout.secondary.name(),
        primary.len(),
        layout.primary.name()
    );

    let mut reconciler = Reconciler::new(gateway, layout);
    reconciler.seed(primary);

    let mut stats = ReconcileStats::default();
    for row in secondary {
        let outcome = reconciler.reconcile_row(row).await?;
        stats.count(&outcome);
    }

    info!(
        "Reconciled: {} exact, {} arbitrated, {} synthesized",
        stats.exact, stats.arbitrated, stats.synthesized
    );

    reconciler.backfill().await?;
    Ok(reconciler.into_working_set())
}
