use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::DocFileNames;
use crate::error::Result;
use crate::reference::ReferenceSets;

fn push_bullets(out: &mut String, items: &BTreeSet<String>) {
    for item in items {
        out.push_str("- ");
        out.push_str(item);
        out.push('\n');
    }
}

pub fn render_movements(sets: &ReferenceSets) -> String {
    let mut out = String::from("# Movements Reference\n\n## Main Movements\n");
    push_bullets(&mut out, &sets.main_movements);
    out.push_str("\n## Accessory/Finisher Movements\n");
    push_bullets(&mut out, &sets.accessory_movements);
    out
}

/// A single titled bullet list.
pub fn render_list(title: &str, items: &BTreeSet<String>) -> String {
    let mut out = format!("# {title}\n\n");
    push_bullets(&mut out, items);
    out
}

pub fn render_workout_formats(sets: &ReferenceSets) -> String {
    render_list("Workout Formats Reference", &sets.workout_formats)
}

pub fn render_intensity_levels(sets: &ReferenceSets) -> String {
    render_list("Intensity Levels Reference", &sets.intensity_levels)
}

/// Write the three reference documents into `dir`, creating it if needed.
/// Returns the written paths in write order.
pub fn write_reference_docs(
    dir: &Path,
    sets: &ReferenceSets,
    names: &DocFileNames,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;

    let documents = [
        (&names.movements, render_movements(sets)),
        (&names.workout_formats, render_workout_formats(sets)),
        (&names.intensity_levels, render_intensity_levels(sets)),
    ];

    let mut written = Vec::with_capacity(documents.len());
    for (name, content) in documents {
        let path = dir.join(name);
        fs::write(&path, content)?;
        written.push(path);
    }
    Ok(written)
}
