//! Integration tests for insertion-ordered pagination.

use modelkv_core::{Cursor, Direction};
use modelkv_testkit::prelude::*;
use proptest::prelude::*;

fn ids(notes: &[Note]) -> Vec<&str> {
    notes.iter().map(|n| n.id.as_str()).collect()
}

#[tokio::test]
async fn head_and_tail_follow_insertion_not_key_order() {
    let (notes, _store) = memory_notes();
    // Ids deliberately sort opposite to insertion order.
    save_all(
        &notes,
        vec![
            Note::new("zulu", "1"),
            Note::new("mike", "2"),
            Note::new("alpha", "3"),
        ],
    )
    .await;

    let head = notes.head(0, Some(3)).await.unwrap();
    assert_eq!(ids(head.items()), vec!["zulu", "mike", "alpha"]);
    let tail = notes.tail(0, Some(3)).await.unwrap();
    assert_eq!(ids(tail.items()), vec!["alpha", "mike", "zulu"]);
}

#[tokio::test]
async fn offset_and_limit_window_the_listing() {
    let (notes, _store) = memory_notes();
    save_all(&notes, numbered_notes(10)).await;

    let page = notes.head(3, Some(4)).await.unwrap();
    assert_eq!(
        ids(page.items()),
        vec!["note-003", "note-004", "note-005", "note-006"]
    );

    let page = notes.tail(8, Some(5)).await.unwrap();
    assert_eq!(ids(page.items()), vec!["note-001", "note-000"]);
    assert!(page.is_last());

    assert!(notes.head(10, Some(5)).await.unwrap().is_empty());
    assert!(notes.head(0, Some(0)).await.unwrap().is_empty());
    assert_eq!(notes.head(0, None).await.unwrap().len(), 10);
}

#[tokio::test]
async fn chained_pages_visit_every_entity_once_in_order() {
    let (notes, _store) = memory_notes();
    let saved = save_all(&notes, numbered_notes(11)).await;

    for direction in [Direction::Head, Direction::Tail] {
        let mut seen = Vec::new();
        let mut page = notes.page(Cursor {
            direction,
            offset: 0,
            limit: Some(3),
        })
        .await
        .unwrap();
        let mut pages = 0;
        loop {
            assert!(page.len() <= 3);
            seen.extend(page.items().iter().map(|n| n.id.clone()));
            pages += 1;
            if page.is_last() {
                break;
            }
            page = page.next_page().await.unwrap();
        }

        let mut expected: Vec<String> = saved.iter().map(|n| n.id.clone()).collect();
        if direction.is_reverse() {
            expected.reverse();
        }
        assert_eq!(seen, expected);
        assert_eq!(pages, 4);
    }
}

#[tokio::test]
async fn next_page_after_the_end_is_empty() {
    let (notes, _store) = memory_notes();
    save_all(&notes, numbered_notes(2)).await;

    let page = notes.head(0, Some(2)).await.unwrap();
    assert!(!page.is_last());
    let next = page.next_page().await.unwrap();
    assert!(next.is_empty());
    assert_eq!(next.cursor().offset, 2);
}

#[tokio::test]
async fn pages_see_entities_added_between_fetches() {
    let (notes, _store) = memory_notes();
    save_all(&notes, numbered_notes(2)).await;

    let page = notes.head(0, Some(2)).await.unwrap();
    notes.save(Note::new("late", "z")).await.unwrap();
    let next = page.next_page().await.unwrap();
    assert_eq!(ids(next.items()), vec!["late"]);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn any_window_matches_slicing_the_full_listing(
        count in 0usize..15,
        cursor in cursor_strategy(),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async {
            let (notes, _store) = memory_notes();
            let saved = save_all(&notes, numbered_notes(count)).await;

            let mut expected: Vec<String> = saved.into_iter().map(|n| n.id).collect();
            if cursor.direction.is_reverse() {
                expected.reverse();
            }
            let expected: Vec<String> = expected
                .into_iter()
                .skip(cursor.offset)
                .take(cursor.limit.unwrap_or(usize::MAX))
                .collect();

            let page = notes.page(cursor).await.unwrap();
            let got: Vec<String> = page.into_iter().map(|n| n.id).collect();
            assert_eq!(got, expected);
        });
    }
}
