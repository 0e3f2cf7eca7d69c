//! Expands one entry template across a selection of dates.
//!
//! For leave types that need supporting documents, the files are attached to
//! a single primary day and every other selected day points back to it.

use std::collections::{BTreeMap, HashMap};

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::models::{
    Entry, EntryType, HalfDayPeriod, SupportingDocument, WorkingHoursPreset,
};
use crate::error::{AppError, ValidationError};
use crate::ports::DocumentStore;
use crate::services::entry_store::EntryStore;

/// Fields shared by every day of a bulk edit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EntryTemplate {
    pub entry_type: EntryType,
    #[serde(default)]
    pub start_time: Option<NaiveTime>,
    #[serde(default)]
    pub end_time: Option<NaiveTime>,
    #[serde(default)]
    pub half_day_period: Option<HalfDayPeriod>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl EntryTemplate {
    pub fn new(entry_type: EntryType) -> Self {
        Self {
            entry_type,
            start_time: None,
            end_time: None,
            half_day_period: None,
            notes: None,
        }
    }
}

/// Per-date values layered over the template.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EntryOverride {
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub date_earned: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkEditRequest {
    pub dates: Vec<NaiveDate>,
    pub template: EntryTemplate,
    #[serde(default)]
    pub overrides: BTreeMap<NaiveDate, EntryOverride>,
    /// Ids returned by the document store for files uploaded with this edit.
    #[serde(default)]
    pub document_ids: Vec<Uuid>,
    #[serde(default)]
    pub primary_date: Option<NaiveDate>,
    #[serde(default)]
    pub preset_id: Option<String>,
}

pub fn reference_note(primary: NaiveDate) -> String {
    format!("Supporting documents attached to {}", primary.format("%d %b %Y"))
}

fn append_note(notes: Option<String>, fragment: String) -> Option<String> {
    match notes {
        Some(notes) if !notes.trim().is_empty() => {
            Some(format!("{} - {}", notes.trim_end(), fragment))
        }
        _ => Some(fragment),
    }
}

#[derive(Debug, Clone)]
pub struct BulkEditCoordinator {
    presets: Vec<WorkingHoursPreset>,
}

impl Default for BulkEditCoordinator {
    fn default() -> Self {
        Self::new(WorkingHoursPreset::builtin())
    }
}

impl BulkEditCoordinator {
    pub fn new(presets: Vec<WorkingHoursPreset>) -> Self {
        Self { presets }
    }

    pub fn presets(&self) -> &[WorkingHoursPreset] {
        &self.presets
    }

    fn working_hours(
        &self,
        template: &EntryTemplate,
        preset_id: Option<&str>,
    ) -> Result<(NaiveTime, NaiveTime), ValidationError> {
        if let (Some(start), Some(end)) = (template.start_time, template.end_time) {
            return Ok((start, end));
        }
        WorkingHoursPreset::resolve(&self.presets, preset_id)
            .map(|preset| (preset.start_time, preset.end_time))
            .ok_or_else(|| {
                ValidationError::Other(format!(
                    "unknown working hours preset {}",
                    preset_id.unwrap_or("(default)")
                ))
            })
    }

    /// Looks up the metadata of the request's documents. Every id must have
    /// been uploaded by `owner_id`.
    pub async fn resolve_documents(
        &self,
        store: &dyn DocumentStore,
        owner_id: Uuid,
        ids: &[Uuid],
    ) -> Result<Vec<SupportingDocument>, AppError> {
        let mut unique = Vec::with_capacity(ids.len());
        for id in ids {
            if !unique.contains(id) {
                unique.push(*id);
            }
        }

        let mut known: HashMap<Uuid, _> = store
            .describe(&unique)
            .await?
            .into_iter()
            .filter(|record| record.owner_id == owner_id)
            .map(|record| (record.document.id, record.document))
            .collect();

        unique
            .into_iter()
            .map(|id| {
                known
                    .remove(&id)
                    .ok_or_else(|| AppError::from(ValidationError::UnknownDocument(id)))
            })
            .collect()
    }

    /// Builds one finalized entry per selected date, attaching `documents`
    /// to the primary day. Nothing is written; an error rejects the whole
    /// selection.
    pub fn expand(
        &self,
        request: &BulkEditRequest,
        documents: &[SupportingDocument],
    ) -> Result<Vec<Entry>, AppError> {
        let mut dates = request.dates.clone();
        dates.sort_unstable();
        dates.dedup();

        let Some(&first) = dates.first() else {
            log::warn!("Bulk edit requested with no dates selected; nothing to do");
            return Ok(Vec::new());
        };

        let template = &request.template;
        let entry_type = template.entry_type;

        if entry_type.requires_documents() && documents.is_empty() {
            return Err(ValidationError::NoDocumentsUploaded.into());
        }

        if entry_type.requires_date_earned() {
            let missing = dates
                .iter()
                .filter(|date| {
                    request
                        .overrides
                        .get(date)
                        .and_then(|o| o.date_earned)
                        .is_none()
                })
                .count();
            if missing > 0 {
                return Err(ValidationError::IncompleteDateEarned { missing }.into());
            }
        }

        let links_documents = !documents.is_empty();
        let primary = match request.primary_date {
            Some(date) if links_documents && dates.binary_search(&date).is_err() => {
                return Err(ValidationError::PrimaryDateNotSelected(date).into());
            }
            Some(date) if links_documents => Some(date),
            _ if links_documents => Some(first),
            _ => None,
        };

        let hours = if entry_type.requires_hours() {
            Some(self.working_hours(template, request.preset_id.as_deref())?)
        } else {
            None
        };

        let entries = dates
            .iter()
            .map(|&date| {
                let overrides = request.overrides.get(&date);
                let mut entry = Entry::new(date, entry_type);

                if let Some((start, end)) = hours {
                    entry.start_time = Some(start);
                    entry.end_time = Some(end);
                }
                entry.half_day_period = template.half_day_period;
                entry.date_earned = overrides.and_then(|o| o.date_earned);
                entry.notes = overrides
                    .and_then(|o| o.notes.clone())
                    .or_else(|| template.notes.clone());

                match primary {
                    Some(primary) if primary == date => {
                        entry.supporting_documents = documents.to_vec();
                        entry.is_primary_document = true;
                    }
                    Some(primary) => {
                        entry.document_reference = Some(primary);
                        entry.notes = append_note(entry.notes.take(), reference_note(primary));
                    }
                    None => {}
                }
                entry
            })
            .collect();

        Ok(entries)
    }

    /// Expands the request into `store`'s overlay. Returns how many entries
    /// were staged.
    pub fn apply(
        &self,
        store: &mut EntryStore,
        request: &BulkEditRequest,
        documents: &[SupportingDocument],
    ) -> Result<usize, AppError> {
        let entries = self.expand(request, documents)?;
        if entries.is_empty() {
            return Ok(0);
        }
        for entry in &entries {
            entry.validate(store.today())?;
        }

        let staged = entries.len();
        store.save_bulk(entries)?;
        log::info!(
            "Staged bulk edit of {} {} entries for {}",
            staged,
            request.template.entry_type,
            store.period()
        );
        Ok(staged)
    }
}
