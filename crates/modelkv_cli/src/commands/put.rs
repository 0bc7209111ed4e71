//! Put command implementation.

use super::{emit, Target};
use modelkv_core::{Collection, CoreResult, Record};
use serde_json::Value;
use std::io::Write;

/// Saves a JSON object as a record and prints the stored form.
///
/// A missing `id` is generated. If an entity with the id already exists and
/// the input does not carry a newer `rev`, the input replaces it as the next
/// revision, keeping its position.
pub async fn run<W: Write>(
    target: &Target,
    json: &str,
    out: &mut W,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut value: Value = serde_json::from_str(json)?;
    let object = value.as_object_mut().ok_or("input must be a JSON object")?;
    if !object.contains_key("id") {
        object.insert("id".into(), Record::with_generated_id().id.into());
    }
    let record: Record = serde_json::from_value(value)?;

    let collection = target.open()?;
    let saved = save_revision(&collection, record).await;
    collection.close().await;
    emit(out, &saved?)
}

async fn save_revision(
    collection: &Collection<Record>,
    mut record: Record,
) -> CoreResult<Record> {
    if let Some(existing) = collection.load(record.id.clone()).await? {
        if record.rev <= existing.rev {
            record.rev = existing.rev + 1;
        }
        record.idx = existing.idx;
    }
    collection.save(record).await
}
