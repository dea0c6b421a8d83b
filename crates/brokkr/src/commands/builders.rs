//! Builders command

use anyhow::Result;
use brokkr_builders::BuilderKind;
use brokkr_core::{MergeStrategy, Schema};
use serde::Serialize;

use crate::cli::BuildersArgs;
use crate::output;

#[derive(Debug, Serialize)]
struct BuilderSummary {
    name: &'static str,
    sections: Vec<&'static str>,
    keys: usize,
}

#[derive(Debug, Serialize)]
struct FieldRow {
    key: &'static str,
    section: &'static str,
    merge: &'static str,
    interpolated: bool,
}

pub fn run(args: BuildersArgs) -> Result<()> {
    match args.builder {
        Some(kind) => show_fields(kind, args.json),
        None => list(args.json),
    }
}

fn list(json: bool) -> Result<()> {
    let summaries: Vec<BuilderSummary> = BuilderKind::all()
        .iter()
        .map(|kind| {
            let schema = kind.schema();
            BuilderSummary {
                name: kind.as_str(),
                sections: schema.section_names(),
                keys: schema.keys().len(),
            }
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    output::header("Builders");
    for summary in &summaries {
        output::kv(
            summary.name,
            &format!("{} keys in {}", summary.keys, summary.sections.join(", ")),
        );
    }
    Ok(())
}

fn show_fields(kind: BuilderKind, json: bool) -> Result<()> {
    let rows = field_rows(&kind.schema());

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    output::header(kind.as_str());
    for row in &rows {
        let mut detail = format!("{} ({})", row.section, row.merge);
        if !row.interpolated {
            detail.push_str(", verbatim");
        }
        output::kv(row.key, &detail);
    }
    Ok(())
}

fn field_rows(schema: &Schema) -> Vec<FieldRow> {
    schema
        .keys()
        .into_iter()
        .filter_map(|key| {
            let (section, spec) = schema.field(key)?;
            Some(FieldRow {
                key,
                section,
                merge: match spec.merge {
                    MergeStrategy::Replace => "replace",
                    MergeStrategy::Union => "union",
                },
                interpolated: schema.is_interpolated(key),
            })
        })
        .collect()
}
