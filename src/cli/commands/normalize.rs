//! Normalize command - print identifiers for raw terms.

use serde::Serialize;

use crate::config::Settings;
use crate::normalize::TermRecord;

#[derive(Serialize)]
struct NormalizedOutput<'a> {
    #[serde(flatten)]
    record: &'a TermRecord,
    id: Option<String>,
}

/// Run normalize command.
pub fn run(terms: &[String], json: bool, settings: &Settings) {
    let prefix = &settings.annotate.id_prefix;
    let records: Vec<TermRecord> = terms.iter().map(TermRecord::new).collect();

    if json {
        let output: Vec<NormalizedOutput> = records
            .iter()
            .map(|record| NormalizedOutput {
                record,
                id: record.id(prefix),
            })
            .collect();
        match serde_json::to_string_pretty(&output) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    for record in &records {
        match record.id(prefix) {
            Some(id) => println!("{}\t{}\t{}", record.term, record.normalized, id),
            None => println!("{}\t\t(no identifier)", record.term),
        }
    }
}
