//! End-to-end behaviour of the tracked-changes feed: identity merging,
//! sample bounds, ordering, truncation and the since cursor.


use generators::*;
use std::cell::Cell;
use std::rc::Rc;
use updraft_core::change::{Change, Contributor, SupportersData, parse_changes};
use updraft_core::cursor::{CallbackCursor, FileCursor, MemoryCursor};
use updraft_core::feed::{ChangeKey, FeedOptions, MergeOutcome, TrackedChanges};
use updraft_core::profile::HexJsonProfileDecoder;
use updraft_core::CursorStore;

fn feed_with_target(target_count: usize) -> TrackedChanges<MemoryCursor> {
    TrackedChanges::with_options(
        MemoryCursor::new(),
        HexJsonProfileDecoder,
        FeedOptions {
            target_count,
            ..FeedOptions::default()
        },
    )
}

fn stored_supporters<'a, C: CursorStore>(
    feed: &'a TrackedChanges<C>,
    idea_id: &str,
) -> &'a SupportersData {
    let key = ChangeKey::NewSupporters {
        idea: idea_id.to_string(),
    };
    match feed.get(&key) {
        Some(Change::NewSupporters(data)) => data,
        other => panic!("no supporters entry for {idea_id}: {other:?}"),
    }
}

#[test]
fn four_supporters_collapse_into_one_entry() {
    let mut feed = TrackedChanges::new(MemoryCursor::new());
    feed.add_change(supporter("i1", "0xA", 1000));
    feed.add_change(supporter("i1", "0xB", 2000));
    feed.add_change(supporter("i1", "0xC", 3000));
    feed.add_change(supporter("i1", "0xD", 4000));

    assert_eq!(feed.len(), 1);
    let data = stored_supporters(&feed, "i1");
    let ids: Vec<_> = data.supporters.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["0xA", "0xB", "0xC"]);
    assert_eq!(data.additional_count, 1);
    assert_eq!(data.time, 4000);
}

#[test]
fn repeated_goal_reached_is_tracked_once() {
    let mut feed = TrackedChanges::new(MemoryCursor::new());
    assert_eq!(
        feed.add_change(goal_reached("s1", 10)),
        MergeOutcome::Inserted
    );
    assert_eq!(feed.len(), 1);
    assert_eq!(feed.add_change(goal_reached("s1", 20)), MergeOutcome::Ignored);
    assert_eq!(feed.len(), 1);
}

#[test]
fn same_solution_distinct_kinds_are_separate_entries() {
    let mut feed = TrackedChanges::new(MemoryCursor::new());
    feed.extend([
        goal_reached("s1", 1),
        goal_failed("s1", 2),
        solution_updated("s1", 3),
        funder("s1", "0xA", 4),
        new_solution("i1", "s1", 5),
    ]);
    assert_eq!(feed.len(), 5);
}

#[test]
fn truncation_returns_newest_and_moves_cursor() {
    let mut feed = feed_with_target(2);
    feed.extend([goal_reached("a", 300), goal_reached("b", 200), goal_reached("c", 100)]);

    let times: Vec<_> = feed.changes_to_render().iter().map(Change::time).collect();
    assert_eq!(times, vec![300, 200]);
    assert_eq!(feed.cursor().get(), Some(200 / 1000));
}

#[test]
fn no_truncation_means_no_cursor_write() {
    let mut feed = feed_with_target(10);
    feed.extend([goal_reached("a", 300), goal_reached("b", 200), goal_reached("c", 100)]);

    assert_eq!(feed.changes_to_render().len(), 3);
    assert_eq!(feed.cursor().updates(), 0);
    assert_eq!(feed.cursor().get(), None);
}

#[test]
fn clear_resets_fully() {
    let mut feed = feed_with_target(10);
    feed.extend([supporter("i1", "0xA", 1), goal_reached("s1", 2)]);
    feed.clear();
    assert_eq!(feed.len(), 0);
    assert!(feed.changes_to_render().is_empty());

    // A fresh supporter after clear starts a new sample.
    feed.add_change(supporter("i1", "0xB", 3));
    let data = stored_supporters(&feed, "i1");
    assert_eq!(data.supporters.len(), 1);
    assert_eq!(data.supporters[0].id, "0xB");
}

#[test]
fn late_supporter_moves_entry_to_top() {
    let mut feed = feed_with_target(1);
    feed.extend([
        supporter("i1", "0xA", 1_000),
        goal_reached("s1", 5_000),
        supporter("i1", "0xB", 9_000),
    ]);
    let rendered = feed.changes_to_render();
    assert_eq!(rendered.len(), 1);
    assert!(matches!(rendered[0], Change::NewSupporters(_)));
    assert_eq!(feed.cursor().get(), Some(9));
}

#[test]
fn unrecognized_changes_are_never_merged() {
    let input = concat!(
        r#"{"type":"newComment","time":5}"#,
        "\n",
        r#"{"type":"newComment","time":5}"#,
        "\n",
    );
    let mut feed = TrackedChanges::new(MemoryCursor::new());
    for change in parse_changes(input).expect("parse") {
        assert_eq!(feed.add_change(change), MergeOutcome::Inserted);
    }
    assert_eq!(feed.len(), 2);
    assert_eq!(feed.changes_to_render().len(), 2);
}

#[test]
fn profile_names_flow_into_rendered_changes() {
    let mut feed = TrackedChanges::new(MemoryCursor::new());
    let profile = hex::encode(r#"{"name":"","team":"Acme Labs"}"#);
    feed.add_change(Change::NewSupporters(SupportersData {
        idea: idea("i1"),
        supporters: vec![Contributor::new("0xA").with_profile(profile)],
        additional_count: 0,
        time: 1,
    }));
    feed.add_change(Change::NewSupporters(SupportersData {
        idea: idea("i1"),
        supporters: vec![Contributor::new("0xB").with_profile("0xnothex")],
        additional_count: 0,
        time: 2,
    }));

    let rendered = feed.changes_to_render();
    let Change::NewSupporters(data) = &rendered[0] else {
        panic!("expected supporters");
    };
    let names: Vec<_> = data.supporters.iter().map(Contributor::display_name).collect();
    assert_eq!(names, vec!["Acme Labs", "0xB"]);
    assert_eq!(rendered[0].summary(), "Acme Labs, 0xB supported Idea i1");
}

#[test]
fn callback_cursor_receives_watermark() {
    let watermark = Rc::new(Cell::new(None));
    let sink = Rc::clone(&watermark);
    let cursor = CallbackCursor::new(|| None, move |secs| sink.set(Some(secs)));
    let mut feed = TrackedChanges::with_options(
        cursor,
        HexJsonProfileDecoder,
        FeedOptions {
            target_count: 1,
            sample_cap: 3,
        },
    );
    feed.extend([goal_reached("a", 7_500), goal_reached("b", 2_000)]);
    feed.changes_to_render();
    assert_eq!(watermark.get(), Some(7));
}

#[test]
fn file_cursor_persists_across_feeds() {
    let dir = tempfile::TempDir::new().expect("tempdir");
    let path = dir.path().join(".updraft/since.json");

    let mut feed = TrackedChanges::with_options(
        FileCursor::new(&path),
        HexJsonProfileDecoder,
        FeedOptions {
            target_count: 2,
            sample_cap: 3,
        },
    );
    feed.extend([
        goal_reached("a", 3_000_000),
        goal_reached("b", 2_000_000),
        goal_reached("c", 1_000_000),
    ]);
    feed.changes_to_render();
    drop(feed);

    assert_eq!(FileCursor::new(&path).since().expect("read"), Some(2_000));
}
