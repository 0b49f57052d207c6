use super::*;
use serde_json::{json, Number};

#[test]
fn apply_overwrites_only_present_fields() {
    let mut item = FeedbackItem::new(FeedbackId::Int(1), 2, "Old");
    let patch: FeedbackPatch =
        serde_json::from_value(json!({ "id": 1, "text": "Edited" })).expect("decode patch");

    item.apply(patch);

    assert_eq!(item, FeedbackItem::new(FeedbackId::Int(1), 2, "Edited"));
}

#[test]
fn apply_never_changes_identity() {
    let mut item = FeedbackItem::new(FeedbackId::Int(7), 4, "keep id");
    let patch: FeedbackPatch =
        serde_json::from_value(json!({ "id": 99, "rating": 9 })).expect("decode patch");

    item.apply(patch);

    assert_eq!(item.id, FeedbackId::Int(7));
    assert_eq!(item.rating, Number::from(9));
    assert!(item.extra.is_empty());
}

#[test]
fn unknown_server_fields_survive_decode_and_encode() {
    let raw = json!({ "id": 3, "rating": 10, "text": "nice", "author": "sam" });
    let item: FeedbackItem = serde_json::from_value(raw.clone()).expect("decode item");

    assert_eq!(item.extra.get("author"), Some(&json!("sam")));
    assert_eq!(serde_json::to_value(&item).expect("encode item"), raw);
}

#[test]
fn patch_serializes_without_absent_fields() {
    let patch = FeedbackPatch::default().with_text("only text");
    assert_eq!(
        serde_json::to_value(&patch).expect("encode patch"),
        json!({ "text": "only text" })
    );
}

#[test]
fn stats_round_average_to_one_decimal() {
    let items = vec![
        FeedbackItem::new(FeedbackId::Int(3), 10, "a"),
        FeedbackItem::new(FeedbackId::Int(2), 9, "b"),
        FeedbackItem::new(FeedbackId::Int(1), 7, "c"),
    ];

    let stats = FeedbackStats::from_items(&items);

    assert_eq!(stats.count, 3);
    assert_eq!(stats.average_rating, Some(8.7));
}

#[test]
fn stats_for_empty_list_have_no_average() {
    assert_eq!(FeedbackStats::from_items(&[]), FeedbackStats::default());
}

#[test]
fn list_query_requests_descending_ids() {
    let query = crate::protocol::ListFeedbackQuery::newest_first();
    assert_eq!(
        serde_json::to_value(&query).expect("encode query"),
        json!({ "_sort": "id", "_order": "desc" })
    );
}

#[test]
fn string_ids_and_fractional_ratings_decode() {
    let item: FeedbackItem =
        serde_json::from_value(json!({ "id": "a1f3", "rating": 4.5, "text": "half" }))
            .expect("decode item");

    assert_eq!(item.id, FeedbackId::from("a1f3"));
    assert_eq!(item.rating.as_f64(), Some(4.5));
    assert_eq!(item.id.to_string(), "a1f3");
    assert_eq!(
        serde_json::to_value(&item).expect("encode item"),
        json!({ "id": "a1f3", "rating": 4.5, "text": "half" })
    );
}

#[test]
fn ids_parse_as_integers_when_possible() {
    assert_eq!("42".parse::<FeedbackId>(), Ok(FeedbackId::Int(42)));
    assert_eq!("a1f3".parse::<FeedbackId>(), Ok(FeedbackId::from("a1f3")));
}

#[test]
fn replacement_body_keeps_unchanged_fields() {
    let mut item = FeedbackItem::new(FeedbackId::Int(1), 2, "Old");
    item.extra.insert("author".into(), json!("sam"));

    let body = item.with_changes(FeedbackPatch::default().with_text("Edited"));

    assert_eq!(
        serde_json::to_value(&body).expect("encode body"),
        json!({ "rating": 2, "text": "Edited", "author": "sam" })
    );
}

#[test]
fn patch_from_item_carries_every_field_but_id() {
    let item = FeedbackItem::new(FeedbackId::Int(5), 8, "whole");

    let patch = FeedbackPatch::from(item);

    assert_eq!(patch, FeedbackPatch::default().with_rating(8).with_text("whole"));
}

#[test]
fn stats_average_fractional_ratings() {
    let items = vec![
        FeedbackItem::new(FeedbackId::Int(2), 10, "a"),
        serde_json::from_value(json!({ "id": "x", "rating": 4.5, "text": "b" }))
            .expect("decode item"),
    ];

    assert_eq!(FeedbackStats::from_items(&items).average_rating, Some(7.3));
}
