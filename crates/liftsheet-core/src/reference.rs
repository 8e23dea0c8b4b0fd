use std::collections::BTreeSet;

use crate::config::{ColumnRule, ReferenceCategory};
use crate::workbook::{CellValue, Workbook};

/// Distinct values collected from the mapped columns of every sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceSets {
    pub main_movements: BTreeSet<String>,
    pub accessory_movements: BTreeSet<String>,
    pub workout_formats: BTreeSet<String>,
    pub intensity_levels: BTreeSet<String>,
}

impl ReferenceSets {
    pub fn set_mut(&mut self, category: ReferenceCategory) -> &mut BTreeSet<String> {
        match category {
            ReferenceCategory::MainMovement => &mut self.main_movements,
            ReferenceCategory::AccessoryMovement => &mut self.accessory_movements,
            ReferenceCategory::WorkoutFormat => &mut self.workout_formats,
            ReferenceCategory::IntensityLevel => &mut self.intensity_levels,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.main_movements.is_empty()
            && self.accessory_movements.is_empty()
            && self.workout_formats.is_empty()
            && self.intensity_levels.is_empty()
    }

    /// Record one cell under `rule`. Falsy cells are ignored.
    pub fn record(&mut self, rule: &ColumnRule, cell: &CellValue) {
        if !cell.is_truthy() {
            return;
        }
        let Some(text) = cell.display_text() else {
            return;
        };

        let set = self.set_mut(rule.category);
        if rule.split {
            set.extend(
                text.split(',')
                    .map(str::trim)
                    .filter(|segment| !segment.is_empty())
                    .map(str::to_string),
            );
        } else {
            set.insert(text.trim().to_string());
        }
    }
}

/// Scan every row of every sheet through the column mapping table.
pub fn extract_references(workbook: &Workbook, rules: &[ColumnRule]) -> ReferenceSets {
    let mut sets = ReferenceSets::default();
    for sheet in &workbook.sheets {
        for row in &sheet.rows {
            for rule in rules {
                sets.record(rule, row.get(rule.index));
            }
        }
    }
    sets
}
