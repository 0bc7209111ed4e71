//! Head, tail and ids command implementations.

use super::{emit, Target};
use modelkv_core::Direction;
use std::io::Write;

/// Prints one page of entities, one JSON object per line.
pub async fn entities<W: Write>(
    target: &Target,
    direction: Direction,
    offset: usize,
    limit: Option<usize>,
    out: &mut W,
) -> Result<(), Box<dyn std::error::Error>> {
    let collection = target.open()?;
    let page = match direction {
        Direction::Head => collection.head(offset, limit).await,
        Direction::Tail => collection.tail(offset, limit).await,
    };
    let records = page.map(|page| page.into_items());
    collection.close().await;
    for record in &records? {
        emit(out, record)?;
    }
    Ok(())
}

/// Prints every id, one JSON string per line.
pub async fn ids<W: Write>(
    target: &Target,
    reverse: bool,
    out: &mut W,
) -> Result<(), Box<dyn std::error::Error>> {
    let collection = target.open()?;
    let direction = if reverse {
        Direction::Tail
    } else {
        Direction::Head
    };
    let ids = collection.list_ids(direction, 0, None).await;
    collection.close().await;
    for id in &ids? {
        emit(out, id)?;
    }
    Ok(())
}
