// Inline bulk editing of meter readings
//
// The board owns the rows of one property and every unsaved draft typed
// into them. It is plain state: the caller drives it and performs the
// persistence calls in between `begin_save` and `finish_save`.
use super::cost::{CostBreakdown, cost_breakdown};
use super::error::{DraftIssue, DraftWarning, ReadingError};
use super::meter::{Meter, ReadingStatus};
use std::collections::{HashMap, HashSet};
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadingField {
    Current,
    Previous,
}

type DraftKey = (String, ReadingField);

#[derive(Debug, Clone, PartialEq)]
struct Draft {
    raw: String,
    parsed: Result<f64, DraftIssue>,
}

/// Everything a row needs to render while being edited.
#[derive(Debug, Clone, PartialEq)]
pub struct RowState {
    pub dirty: bool,
    pub has_error: bool,
    pub show_warning: bool,
    pub issue: Option<DraftIssue>,
    pub warning: Option<DraftWarning>,
    pub preview: CostBreakdown,
    /// Message from the last failed save of this row.
    pub save_error: Option<String>,
}

/// One raw input in a staged batch.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingEntry {
    pub meter_id: String,
    pub current_reading: String,
    pub previous_reading: Option<String>,
}

/// Targeted write for one row.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingUpdate {
    pub meter_id: String,
    pub previous_reading: Option<f64>,
    pub current_reading: Option<f64>,
    pub consumption: f64,
    pub cost: f64,
    pub status: ReadingStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SaveOutcome {
    pub meter_id: String,
    pub result: Result<(), ReadingError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPress {
    Enter { shift: bool },
    Escape,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    /// Move focus to this meter's input; `None` when there is no such row.
    Focus(Option<String>),
    Reverted,
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub text: String,
    pub cursor: usize,
}

struct InFlight {
    update: ReadingUpdate,
    drafts: Vec<(DraftKey, Draft)>,
}

pub struct ReadingBoard {
    property_id: String,
    apartment_count: u32,
    meters: Vec<Meter>,
    drafts: HashMap<DraftKey, Draft>,
    duplicates: HashSet<String>,
    save_errors: HashMap<String, String>,
    in_flight: Option<HashMap<String, InFlight>>,
}

impl ReadingBoard {
    pub fn new(property_id: impl Into<String>, meters: Vec<Meter>, apartment_count: u32) -> Self {
        Self {
            property_id: property_id.into(),
            apartment_count: apartment_count.max(1),
            meters,
            drafts: HashMap::new(),
            duplicates: HashSet::new(),
            save_errors: HashMap::new(),
            in_flight: None,
        }
    }

    pub fn property_id(&self) -> &str {
        &self.property_id
    }

    pub fn apartment_count(&self) -> u32 {
        self.apartment_count
    }

    pub fn meters(&self) -> &[Meter] {
        &self.meters
    }

    pub fn meter(&self, meter_id: &str) -> Option<&Meter> {
        self.meters.iter().find(|m| m.id == meter_id)
    }

    pub fn is_saving(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Record a keystroke. A value equal to the stored one leaves the row clean.
    pub fn edit(
        &mut self,
        meter_id: &str,
        field: ReadingField,
        raw: &str,
    ) -> Result<RowState, ReadingError> {
        let meter = self
            .meter(meter_id)
            .ok_or_else(|| ReadingError::UnknownMeter(meter_id.to_string()))?;

        let parsed = if meter.is_fixed_fee() {
            Err(DraftIssue::NotMetered)
        } else {
            parse_reading(raw)
        };
        let unchanged = matches!(parsed, Ok(v) if Some(v) == stored_value(meter, field));

        let key = (meter_id.to_string(), field);
        if unchanged {
            self.drafts.remove(&key);
        } else {
            self.drafts.insert(
                key,
                Draft {
                    raw: raw.to_string(),
                    parsed,
                },
            );
        }
        self.duplicates.remove(meter_id);
        self.save_errors.remove(meter_id);

        self.row_state(meter_id)
            .ok_or_else(|| ReadingError::UnknownMeter(meter_id.to_string()))
    }

    /// Apply a pasted or submitted batch. A meter appearing more than once is
    /// flagged on its row instead of silently keeping the last value.
    pub fn stage_batch(&mut self, entries: &[ReadingEntry]) -> Result<(), ReadingError> {
        let mut seen: HashMap<&str, usize> = HashMap::new();
        for entry in entries {
            *seen.entry(entry.meter_id.as_str()).or_default() += 1;
        }

        for entry in entries {
            if let Some(previous) = &entry.previous_reading {
                self.edit(&entry.meter_id, ReadingField::Previous, previous)?;
            }
            self.edit(&entry.meter_id, ReadingField::Current, &entry.current_reading)?;
        }

        for (meter_id, count) in seen {
            if count > 1 {
                self.duplicates.insert(meter_id.to_string());
            }
        }
        Ok(())
    }

    pub fn draft_text(&self, meter_id: &str, field: ReadingField) -> Option<&str> {
        self.drafts
            .get(&(meter_id.to_string(), field))
            .map(|d| d.raw.as_str())
    }

    pub fn discard(&mut self, meter_id: &str) {
        self.drafts.retain(|(id, _), _| id != meter_id);
        self.duplicates.remove(meter_id);
        self.save_errors.remove(meter_id);
    }

    pub fn discard_field(&mut self, meter_id: &str, field: ReadingField) {
        self.drafts.remove(&(meter_id.to_string(), field));
        if !self.is_dirty(meter_id) {
            self.duplicates.remove(meter_id);
        }
    }

    pub fn discard_all(&mut self) {
        self.drafts.clear();
        self.duplicates.clear();
        self.save_errors.clear();
    }

    pub fn is_dirty(&self, meter_id: &str) -> bool {
        self.drafts.keys().any(|(id, _)| id == meter_id)
    }

    /// Dirty meter ids in row order.
    pub fn dirty_ids(&self) -> Vec<String> {
        self.meters
            .iter()
            .filter(|m| self.is_dirty(&m.id))
            .map(|m| m.id.clone())
            .collect()
    }

    pub fn row_state(&self, meter_id: &str) -> Option<RowState> {
        let meter = self.meter(meter_id)?;
        let dirty = self.is_dirty(meter_id);

        let issue = [ReadingField::Current, ReadingField::Previous]
            .into_iter()
            .filter_map(|field| self.drafts.get(&(meter_id.to_string(), field)))
            .find_map(|d| d.parsed.clone().err())
            .or_else(|| {
                self.duplicates
                    .contains(meter_id)
                    .then_some(DraftIssue::Duplicate)
            });

        let projected = self.projected(meter);
        let warning = match (dirty, projected.previous_reading, projected.current_reading) {
            (true, Some(previous), Some(current)) if current < previous => {
                Some(DraftWarning::ReadingRegression { previous, current })
            }
            _ => None,
        };

        Some(RowState {
            dirty,
            has_error: issue.is_some(),
            show_warning: warning.is_some(),
            issue,
            warning,
            preview: cost_breakdown(&projected, self.apartment_count),
            save_error: self.save_errors.get(meter_id).cloned(),
        })
    }

    /// Rows that need the operator's attention: dirty rows plus rows flagged
    /// as duplicates by the last batch, in row order.
    pub fn flagged_ids(&self) -> Vec<String> {
        self.meters
            .iter()
            .filter(|m| self.is_dirty(&m.id) || self.duplicates.contains(&m.id))
            .map(|m| m.id.clone())
            .collect()
    }

    /// Rows currently holding an invalid value, including a duplicate flag
    /// left on a row whose last value matched the stored one.
    pub fn error_count(&self) -> usize {
        self.flagged_ids()
            .iter()
            .filter_map(|id| self.row_state(id))
            .filter(|row| row.has_error)
            .count()
    }

    pub fn can_save(&self) -> bool {
        !self.is_saving() && !self.drafts.is_empty() && self.error_count() == 0
    }

    /// Snapshot the dirty rows into updates and clear them from the dirty set.
    /// New keystrokes are accepted while the batch is in flight.
    pub fn begin_save(&mut self) -> Result<Vec<ReadingUpdate>, ReadingError> {
        if self.is_saving() {
            return Err(ReadingError::SaveInFlight);
        }
        let errors = self.error_count();
        if errors > 0 {
            return Err(ReadingError::SaveBlocked(errors));
        }
        if self.drafts.is_empty() {
            return Err(ReadingError::NothingToSave);
        }

        let mut in_flight = HashMap::new();
        let mut updates = Vec::new();
        for meter_id in self.dirty_ids() {
            let Some(meter) = self.meter(&meter_id) else {
                continue;
            };
            let projected = self.projected(meter);
            let breakdown = cost_breakdown(&projected, self.apartment_count);
            let update = ReadingUpdate {
                meter_id: meter_id.clone(),
                previous_reading: projected.previous_reading,
                current_reading: projected.current_reading,
                consumption: breakdown.consumption,
                cost: breakdown.unit_cost,
                status: ReadingStatus::Ok,
            };

            let keys: Vec<DraftKey> = self
                .drafts
                .keys()
                .filter(|(id, _)| *id == meter_id)
                .cloned()
                .collect();
            let drafts = keys
                .into_iter()
                .filter_map(|key| self.drafts.remove(&key).map(|d| (key, d)))
                .collect();

            updates.push(update.clone());
            in_flight.insert(meter_id, InFlight { update, drafts });
        }

        self.in_flight = Some(in_flight);
        Ok(updates)
    }

    /// Apply per-row results. Failed rows get their drafts back unless the
    /// operator already typed something newer.
    pub fn finish_save(&mut self, outcomes: Vec<SaveOutcome>) {
        let mut in_flight = self.in_flight.take().unwrap_or_default();

        for outcome in outcomes {
            let Some(row) = in_flight.remove(&outcome.meter_id) else {
                continue;
            };
            match outcome.result {
                Ok(()) => self.commit(row.update),
                Err(err) => self.restore(row, err.to_string()),
            }
        }

        // rows the caller never reported on are treated as not saved
        for (_, row) in in_flight {
            self.restore(row, "save result unknown".to_string());
        }
    }

    /// Swap in a freshly fetched meter list, keeping drafts for rows that remain.
    pub fn replace_meters(&mut self, meters: Vec<Meter>) {
        self.meters = meters;
        let ids: HashSet<String> = self.meters.iter().map(|m| m.id.clone()).collect();

        let stale: Vec<DraftKey> = self
            .drafts
            .iter()
            .filter(|((id, field), draft)| {
                !ids.contains(id)
                    || self
                        .meter(id)
                        .is_some_and(|m| matches!(draft.parsed, Ok(v) if Some(v) == stored_value(m, *field)))
            })
            .map(|(key, _)| key.clone())
            .collect();
        for key in stale {
            self.drafts.remove(&key);
        }
        self.duplicates.retain(|id| ids.contains(id));
        self.save_errors.retain(|id, _| ids.contains(id));
    }

    pub fn apply_approval(&mut self, meter_id: &str, value: f64) {
        if let Some(meter) = self.meters.iter_mut().find(|m| m.id == meter_id) {
            meter.current_reading = Some(value);
            meter.status = ReadingStatus::Ok;
        }
        self.discard(meter_id);
    }

    pub fn apply_rejection(&mut self, meter_id: &str) {
        if let Some(meter) = self.meters.iter_mut().find(|m| m.id == meter_id) {
            meter.current_reading = None;
            meter.photo_url = None;
            meter.status = ReadingStatus::Missing;
        }
        self.discard(meter_id);
    }

    pub fn handle_key(&mut self, meter_id: &str, field: ReadingField, key: KeyPress) -> KeyAction {
        match key {
            KeyPress::Enter { shift } => KeyAction::Focus(self.neighbour(meter_id, shift)),
            KeyPress::Escape => {
                self.discard_field(meter_id, field);
                KeyAction::Reverted
            }
            KeyPress::Other => KeyAction::Ignored,
        }
    }

    fn neighbour(&self, meter_id: &str, backwards: bool) -> Option<String> {
        let editable: Vec<&Meter> = self.meters.iter().filter(|m| !m.is_fixed_fee()).collect();
        let pos = editable.iter().position(|m| m.id == meter_id)?;
        let next = if backwards {
            pos.checked_sub(1)?
        } else {
            pos + 1
        };
        editable.get(next).map(|m| m.id.clone())
    }

    fn projected(&self, meter: &Meter) -> Meter {
        let mut projected = meter.clone();
        if let Some(v) = self.parsed_draft(&meter.id, ReadingField::Current) {
            projected.current_reading = Some(v);
        }
        if let Some(v) = self.parsed_draft(&meter.id, ReadingField::Previous) {
            projected.previous_reading = Some(v);
        }
        projected
    }

    fn parsed_draft(&self, meter_id: &str, field: ReadingField) -> Option<f64> {
        self.drafts
            .get(&(meter_id.to_string(), field))
            .and_then(|d| d.parsed.clone().ok())
    }

    fn commit(&mut self, update: ReadingUpdate) {
        if let Some(meter) = self.meters.iter_mut().find(|m| m.id == update.meter_id) {
            meter.previous_reading = update.previous_reading;
            meter.current_reading = update.current_reading;
            meter.status = update.status;
        }
        self.save_errors.remove(&update.meter_id);

        // a newer draft that now matches the stored value is no longer dirty
        if let Some(meter) = self.meter(&update.meter_id).cloned() {
            self.drafts.retain(|(id, field), draft| {
                *id != meter.id
                    || !matches!(draft.parsed, Ok(v) if Some(v) == stored_value(&meter, *field))
            });
        }
    }

    fn restore(&mut self, row: InFlight, message: String) {
        for (key, draft) in row.drafts {
            self.drafts.entry(key).or_insert(draft);
        }
        self.save_errors.insert(row.update.meter_id, message);
    }
}

fn stored_value(meter: &Meter, field: ReadingField) -> Option<f64> {
    match field {
        ReadingField::Current => meter.current_reading,
        ReadingField::Previous => meter.previous_reading,
    }
}

/// Parse operator input, accepting a decimal comma.
pub fn parse_reading(raw: &str) -> Result<f64, DraftIssue> {
    let normalized = raw.trim().replace(',', ".");
    let value: f64 = normalized.parse().map_err(|_| DraftIssue::NotANumber)?;
    if !value.is_finite() {
        return Err(DraftIssue::NotANumber);
    }
    if value < 0.0 {
        return Err(DraftIssue::Negative);
    }
    Ok(value)
}

/// Replace the selection (char offsets) with a decimal point, as typed when
/// the operator presses the locale comma key.
pub fn rewrite_decimal_comma(text: &str, selection: Range<usize>) -> TextEdit {
    let chars: Vec<char> = text.chars().collect();
    let end = selection.end.min(chars.len());
    let start = selection.start.min(end);

    let mut rewritten: String = chars[..start].iter().collect();
    rewritten.push('.');
    rewritten.extend(&chars[end..]);

    TextEdit {
        text: rewritten,
        cursor: start + 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::meter::{DistributionMethod, MeterScope, MeterUnit};

    fn water(id: &str, prev: f64, curr: f64) -> Meter {
        let mut meter = Meter::new(id, format!("Vanduo {id}"));
        meter.unit = MeterUnit::CubicMeter;
        meter.scope = MeterScope::Communal;
        meter.distribution_method = Some(DistributionMethod::PerApartment);
        meter.previous_reading = Some(prev);
        meter.current_reading = Some(curr);
        meter.price_per_unit = Some(0.5);
        meter
    }

    fn internet(id: &str) -> Meter {
        let mut meter = Meter::new(id, "Internetas");
        meter.unit = MeterUnit::Other;
        meter.fixed_price = Some(15.0);
        meter
    }

    fn board() -> ReadingBoard {
        ReadingBoard::new(
            "prop-1",
            vec![water("a", 100.0, 120.0), internet("net"), water("b", 10.0, 10.0)],
            5,
        )
    }

    #[test]
    fn test_edit_marks_row_dirty_and_previews_cost() {
        let mut board = board();
        let row = board.edit("a", ReadingField::Current, "150").unwrap();
        assert!(row.dirty);
        assert!(!row.has_error);
        assert_eq!(row.preview.consumption, 50.0);
        assert_eq!(row.preview.unit_cost, 5.0);
        assert!(board.can_save());
    }

    #[test]
    fn test_typing_back_stored_value_cleans_row() {
        let mut board = board();
        board.edit("a", ReadingField::Current, "130").unwrap();
        let row = board.edit("a", ReadingField::Current, "120,0").unwrap();
        assert!(!row.dirty);
        assert!(!board.can_save());
    }

    #[test]
    fn test_regression_warns_without_blocking() {
        let mut board = board();
        let row = board.edit("a", ReadingField::Current, "90").unwrap();
        assert!(row.show_warning);
        assert!(!row.has_error);
        assert_eq!(
            row.warning,
            Some(DraftWarning::ReadingRegression {
                previous: 100.0,
                current: 90.0
            })
        );
        assert_eq!(row.preview.consumption, 0.0);
        assert!(board.can_save());
    }

    #[test]
    fn test_invalid_row_blocks_whole_batch() {
        let mut board = board();
        board.edit("a", ReadingField::Current, "130").unwrap();
        let row = board.edit("b", ReadingField::Current, "12x").unwrap();
        assert_eq!(row.issue, Some(DraftIssue::NotANumber));
        assert!(!board.can_save());
        assert_eq!(board.begin_save(), Err(ReadingError::SaveBlocked(1)));

        let row = board.edit("b", ReadingField::Current, "-4").unwrap();
        assert_eq!(row.issue, Some(DraftIssue::Negative));

        board.discard("b");
        assert!(board.can_save());
    }

    #[test]
    fn test_fixed_fee_rows_take_no_readings() {
        let mut board = board();
        let row = board.edit("net", ReadingField::Current, "5").unwrap();
        assert_eq!(row.issue, Some(DraftIssue::NotMetered));
        assert!(!board.can_save());
    }

    #[test]
    fn test_unknown_meter_is_rejected() {
        let mut board = board();
        assert_eq!(
            board.edit("zzz", ReadingField::Current, "1"),
            Err(ReadingError::UnknownMeter("zzz".to_string()))
        );
    }

    #[test]
    fn test_duplicate_entries_in_batch() {
        let mut board = board();
        let entry = |id: &str, value: &str| ReadingEntry {
            meter_id: id.to_string(),
            current_reading: value.to_string(),
            previous_reading: None,
        };
        board
            .stage_batch(&[entry("a", "130"), entry("b", "11"), entry("a", "131")])
            .unwrap();

        assert_eq!(board.row_state("a").unwrap().issue, Some(DraftIssue::Duplicate));
        assert!(!board.row_state("b").unwrap().has_error);
        assert!(!board.can_save());

        board.edit("a", ReadingField::Current, "131").unwrap();
        assert!(board.can_save());
    }

    #[test]
    fn test_duplicate_ending_on_stored_value_still_blocks() {
        let mut board = board();
        let entry = |value: &str| ReadingEntry {
            meter_id: "a".to_string(),
            current_reading: value.to_string(),
            previous_reading: None,
        };
        // the second value matches what is stored, so the row ends up clean
        board.stage_batch(&[entry("130"), entry("120")]).unwrap();

        let row = board.row_state("a").unwrap();
        assert!(!row.dirty);
        assert_eq!(row.issue, Some(DraftIssue::Duplicate));
        assert_eq!(board.flagged_ids(), vec!["a".to_string()]);
        assert_eq!(board.error_count(), 1);
        assert!(!board.can_save());
        assert_eq!(board.begin_save(), Err(ReadingError::SaveBlocked(1)));

        board.discard("a");
        assert_eq!(board.error_count(), 0);
        assert_eq!(board.begin_save(), Err(ReadingError::NothingToSave));
    }

    #[test]
    fn test_previous_reading_draft_feeds_preview() {
        let mut board = board();
        board
            .stage_batch(&[ReadingEntry {
                meter_id: "b".to_string(),
                current_reading: "30".to_string(),
                previous_reading: Some("20".to_string()),
            }])
            .unwrap();
        let row = board.row_state("b").unwrap();
        assert_eq!(row.preview.consumption, 10.0);
        assert_eq!(row.preview.unit_cost, 1.0);
    }

    #[test]
    fn test_save_lifecycle_with_partial_failure() {
        let mut board = board();
        board.edit("a", ReadingField::Current, "150").unwrap();
        board.edit("b", ReadingField::Current, "20").unwrap();

        let updates = board.begin_save().unwrap();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].meter_id, "a");
        assert_eq!(updates[0].current_reading, Some(150.0));
        assert_eq!(updates[0].cost, 5.0);
        assert!(board.is_saving());
        assert!(board.dirty_ids().is_empty());
        assert_eq!(board.begin_save(), Err(ReadingError::SaveInFlight));

        // keystrokes keep working during the save
        board.edit("b", ReadingField::Current, "21").unwrap();

        board.finish_save(vec![
            SaveOutcome {
                meter_id: "a".to_string(),
                result: Ok(()),
            },
            SaveOutcome {
                meter_id: "b".to_string(),
                result: Err(ReadingError::PersistenceFailure {
                    meter_id: "b".to_string(),
                    message: "connection reset".to_string(),
                }),
            },
        ]);

        assert!(!board.is_saving());
        assert_eq!(board.meter("a").unwrap().current_reading, Some(150.0));
        assert_eq!(board.meter("a").unwrap().status, ReadingStatus::Ok);
        assert!(!board.is_dirty("a"));

        let row = board.row_state("b").unwrap();
        assert!(row.dirty);
        assert!(row.save_error.unwrap().contains("connection reset"));
        assert_eq!(board.draft_text("b", ReadingField::Current), Some("21"));
        assert_eq!(board.meter("b").unwrap().current_reading, Some(10.0));
    }

    #[test]
    fn test_timed_out_row_keeps_draft_while_others_commit() {
        let mut board = board();
        board.edit("a", ReadingField::Current, "150").unwrap();
        board.edit("b", ReadingField::Current, "20").unwrap();
        board.begin_save().unwrap();
        board.finish_save(vec![
            SaveOutcome {
                meter_id: "a".to_string(),
                result: Err(ReadingError::TimedOut {
                    meter_id: "a".to_string(),
                    after: std::time::Duration::from_secs(10),
                }),
            },
            SaveOutcome {
                meter_id: "b".to_string(),
                result: Ok(()),
            },
        ]);

        assert!(!board.is_saving());
        assert_eq!(board.draft_text("a", ReadingField::Current), Some("150"));
        assert!(board.row_state("a").unwrap().save_error.unwrap().contains("timed out"));
        assert_eq!(board.meter("b").unwrap().current_reading, Some(20.0));
        assert!(!board.is_dirty("b"));
        assert!(board.can_save());
    }

    #[test]
    fn test_unreported_rows_are_restored() {
        let mut board = board();
        board.edit("a", ReadingField::Current, "150").unwrap();
        board.begin_save().unwrap();
        board.finish_save(Vec::new());

        assert_eq!(board.draft_text("a", ReadingField::Current), Some("150"));
        assert_eq!(
            board.row_state("a").unwrap().save_error.as_deref(),
            Some("save result unknown")
        );
    }

    #[test]
    fn test_nothing_to_save() {
        let mut board = board();
        assert_eq!(board.begin_save(), Err(ReadingError::NothingToSave));
    }

    #[test]
    fn test_keyboard_navigation_skips_fixed_rows() {
        let mut board = board();
        let enter = KeyPress::Enter { shift: false };
        let shift_enter = KeyPress::Enter { shift: true };

        assert_eq!(
            board.handle_key("a", ReadingField::Current, enter),
            KeyAction::Focus(Some("b".to_string()))
        );
        assert_eq!(
            board.handle_key("b", ReadingField::Current, shift_enter),
            KeyAction::Focus(Some("a".to_string()))
        );
        assert_eq!(
            board.handle_key("a", ReadingField::Current, shift_enter),
            KeyAction::Focus(None)
        );
        assert_eq!(board.handle_key("b", ReadingField::Current, enter), KeyAction::Focus(None));
    }

    #[test]
    fn test_escape_reverts_field() {
        let mut board = board();
        board.edit("a", ReadingField::Current, "999").unwrap();
        assert_eq!(
            board.handle_key("a", ReadingField::Current, KeyPress::Escape),
            KeyAction::Reverted
        );
        assert!(!board.is_dirty("a"));
        assert_eq!(
            board.handle_key("a", ReadingField::Current, KeyPress::Other),
            KeyAction::Ignored
        );
    }

    #[test]
    fn test_decimal_comma_rewrite() {
        assert_eq!(
            rewrite_decimal_comma("12", 2..2),
            TextEdit {
                text: "12.".to_string(),
                cursor: 3
            }
        );
        assert_eq!(
            rewrite_decimal_comma("1234", 1..3),
            TextEdit {
                text: "1.4".to_string(),
                cursor: 2
            }
        );
        assert_eq!(rewrite_decimal_comma("5", 9..12).text, "5.");
        assert_eq!(parse_reading(" 12,5 "), Ok(12.5));
        assert_eq!(parse_reading(""), Err(DraftIssue::NotANumber));
        assert_eq!(parse_reading("NaN"), Err(DraftIssue::NotANumber));
    }

    #[test]
    fn test_refresh_keeps_drafts_for_remaining_meters() {
        let mut board = board();
        board.edit("a", ReadingField::Current, "150").unwrap();
        board.edit("b", ReadingField::Current, "12").unwrap();

        // "b" now has 12 stored (e.g. tenant submission approved elsewhere), "a" is gone
        board.replace_meters(vec![water("b", 10.0, 12.0), water("c", 0.0, 1.0)]);
        assert!(!board.is_dirty("a"));
        assert!(!board.is_dirty("b"));
        assert!(board.meter("c").is_some());
    }

    #[test]
    fn test_approval_and_rejection_clear_drafts() {
        let mut pending = water("p", 5.0, 7.0);
        pending.status = ReadingStatus::Photo;
        pending.photo_url = Some("readings/p.jpg".to_string());
        let mut board = ReadingBoard::new("prop-1", vec![pending, water("q", 1.0, 2.0)], 2);

        board.edit("p", ReadingField::Current, "8").unwrap();
        board.apply_approval("p", 7.5);
        let meter = board.meter("p").unwrap();
        assert_eq!(meter.current_reading, Some(7.5));
        assert_eq!(meter.status, ReadingStatus::Ok);
        assert!(!board.is_dirty("p"));

        board.edit("q", ReadingField::Current, "3").unwrap();
        board.apply_rejection("q");
        let meter = board.meter("q").unwrap();
        assert_eq!(meter.current_reading, None);
        assert_eq!(meter.status, ReadingStatus::Missing);
        assert!(!board.is_dirty("q"));
    }
}
