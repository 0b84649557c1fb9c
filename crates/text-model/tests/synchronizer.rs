use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ops::Range;
use text_model::{
    Document, DocumentOptions, DocumentSynchronizer, TextModelError, TransactionStateError,
};

fn fragments(sync: &DocumentSynchronizer, doc: &Document) -> Vec<(Range<usize>, String)> {
    sync.fragments(doc)
        .unwrap()
        .iter()
        .map(|f| (f.range(), f.replacement().to_string()))
        .collect()
}

fn simulate(text: &str, edits: &[(usize, usize, &str)]) -> String {
    let mut chars: Vec<char> = text.chars().collect();
    for &(start, end, replacement) in edits {
        chars.splice(start..end, replacement.chars());
    }
    chars.into_iter().collect()
}

#[test]
fn test_non_overlapping_edits_commit_separately() {
    let mut doc = Document::new("0123456789");
    let mut sync = DocumentSynchronizer::new();

    sync.start_transaction(&doc).unwrap();
    sync.insert_string(&doc, 1, "a").unwrap();
    sync.replace_string(&doc, 3, 4, "a").unwrap();
    // The document itself is untouched until commit.
    assert_eq!(doc.text(), "0123456789");

    let summary = sync.commit_transaction(&mut doc).unwrap();
    let expected = simulate("0123456789", &[(1, 1, "a"), (3, 4, "a")]);
    assert_eq!(doc.text(), expected);
    assert_eq!(summary.fragments, 2);
    assert_eq!(summary.events.len(), 2);
    // Fragments are replayed from the end of the document.
    assert_eq!(summary.events[0].offset, 2);
    assert_eq!(summary.events[1].offset, 1);
}

#[test]
fn test_overlapping_edits_merge_into_one_fragment() {
    let mut doc = Document::new("0123456789");
    let mut sync = DocumentSynchronizer::new();

    sync.start_transaction(&doc).unwrap();
    sync.replace_string(&doc, 3, 4, "a").unwrap();
    sync.replace_string(&doc, 3, 5, "bb").unwrap();
    assert_eq!(fragments(&sync, &doc), vec![(3..5, "bb".to_string())]);

    let summary = sync.commit_transaction(&mut doc).unwrap();
    assert_eq!(summary.fragments, 1);
    assert_eq!(
        doc.text(),
        simulate("0123456789", &[(3, 4, "a"), (3, 5, "bb")])
    );
}

#[test]
fn test_edit_bridging_two_fragments_merges_all() {
    let doc = Document::new("0123456789");
    let mut sync = DocumentSynchronizer::new();

    sync.start_transaction(&doc).unwrap();
    sync.replace_string(&doc, 1, 2, "xy").unwrap();
    sync.replace_string(&doc, 7, 8, "z").unwrap();
    assert_eq!(fragments(&sync, &doc).len(), 2);

    // Working copy is "0xy2345z789"; the deletion reaches into both fragments.
    sync.delete_string(&doc, 2, 9).unwrap();
    assert_eq!(sync.transaction_text(&doc).unwrap(), "0x89");
    assert_eq!(fragments(&sync, &doc), vec![(1..8, "x".to_string())]);
}

#[test]
fn test_reads_inside_transaction_see_working_copy() {
    let doc = Document::new("hello world");
    let mut sync = DocumentSynchronizer::new();
    sync.start_transaction(&doc).unwrap();
    sync.replace_string(&doc, 0, 5, "goodbye").unwrap();
    assert_eq!(sync.transaction_text(&doc).unwrap(), "goodbye world");
    sync.insert_string(&doc, 13, "!").unwrap();
    assert_eq!(sync.transaction_text(&doc).unwrap(), "goodbye world!");
}

#[test]
fn test_deletion_is_aligned_to_line_boundary() {
    let mut doc = Document::new("xy\nab\nab");
    let mut sync = DocumentSynchronizer::new();
    sync.start_transaction(&doc).unwrap();
    sync.replace_string(&doc, 2, 8, "\nab").unwrap();
    assert_eq!(fragments(&sync, &doc), vec![(3..6, String::new())]);

    let summary = sync.commit_transaction(&mut doc).unwrap();
    assert_eq!(doc.text(), "xy\nab");
    assert_eq!(summary.events[0].old_text, "ab\n");
}

#[test]
fn test_deletion_alignment_can_be_disabled() {
    let options = DocumentOptions::default().with_align_deletions_to_lines(false);
    let mut doc = Document::with_options("xy\nab\nab", options);
    let mut sync = DocumentSynchronizer::new();
    sync.start_transaction(&doc).unwrap();
    sync.replace_string(&doc, 2, 8, "\nab").unwrap();
    assert_eq!(fragments(&sync, &doc), vec![(5..8, String::new())]);

    sync.commit_transaction(&mut doc).unwrap();
    assert_eq!(doc.text(), "xy\nab");
}

#[test]
fn test_markers_on_peer_follow_commit() {
    let mut doc = Document::new("fn main() {}\n");
    let name = doc.create_range_marker(3, 7).unwrap();
    let body = doc.create_range_marker(10, 12).unwrap();
    let mut sync = DocumentSynchronizer::new();

    sync.start_transaction(&doc).unwrap();
    sync.replace_string(&doc, 3, 7, "start").unwrap();
    sync.insert_string(&doc, 12, " ").unwrap();
    sync.insert_string(&doc, 13, "run();").unwrap();
    sync.commit_transaction(&mut doc).unwrap();

    assert_eq!(doc.text(), "fn start() { run();}\n");
    assert_eq!(doc.marker_range(name), Some(3..8));
    assert_eq!(doc.buffer().slice(3..8).unwrap(), "start");
    assert_eq!(doc.marker_range(body), Some(11..20));
}

#[test]
fn test_abort_leaves_document_untouched() {
    let doc = Document::new("abc");
    let mut sync = DocumentSynchronizer::new();
    sync.start_transaction(&doc).unwrap();
    sync.insert_string(&doc, 0, "zzz").unwrap();
    sync.abort_transaction(&doc).unwrap();
    assert!(!sync.is_in_transaction(&doc));
    assert_eq!(doc.text(), "abc");
    // A new transaction starts from scratch.
    sync.start_transaction(&doc).unwrap();
    assert_eq!(sync.transaction_text(&doc).unwrap(), "abc");
}

#[test]
fn test_transaction_state_errors() {
    let mut doc = Document::new("abc");
    let id = doc.id();
    let mut sync = DocumentSynchronizer::new();

    assert_eq!(
        sync.insert_string(&doc, 0, "x"),
        Err(TextModelError::TransactionState(
            TransactionStateError::NotStarted(id)
        ))
    );
    assert_eq!(
        sync.commit_transaction(&mut doc),
        Err(TransactionStateError::NotStarted(id).into())
    );
    assert!(sync.abort_transaction(&doc).is_err());
    assert!(sync.transaction_text(&doc).is_err());

    sync.start_transaction(&doc).unwrap();
    assert_eq!(
        sync.start_transaction(&doc),
        Err(TransactionStateError::AlreadyStarted(id).into())
    );
}

#[test]
fn test_commit_rejects_modified_peer() {
    let mut doc = Document::new("abc");
    let mut sync = DocumentSynchronizer::new();
    sync.start_transaction(&doc).unwrap();
    sync.insert_string(&doc, 3, "d").unwrap();
    doc.insert_string(0, "!").unwrap();

    assert_eq!(
        sync.commit_transaction(&mut doc),
        Err(TransactionStateError::PeerModified {
            document: doc.id(),
            expected: 0,
            found: 1,
        }
        .into())
    );
    // The transaction stays open until the caller aborts it.
    assert!(sync.is_in_transaction(&doc));
    assert_eq!(doc.text(), "!abc");
}

#[test]
fn test_transactions_are_per_document() {
    let mut first = Document::new("one");
    let mut second = Document::new("two");
    let mut sync = DocumentSynchronizer::new();

    sync.start_transaction(&first).unwrap();
    sync.start_transaction(&second).unwrap();
    sync.insert_string(&first, 3, "!").unwrap();
    sync.insert_string(&second, 0, "#").unwrap();

    sync.commit_transaction(&mut second).unwrap();
    assert!(sync.is_in_transaction(&first));
    sync.commit_transaction(&mut first).unwrap();
    assert_eq!(first.text(), "one!");
    assert_eq!(second.text(), "#two");
}

#[test]
fn test_random_transactions_match_simulation() {
    let alphabet = ['a', 'b', '\n'];
    let mut rng = StdRng::seed_from_u64(0xC0FFEE);

    for _ in 0..300 {
        let initial: String = (0..rng.gen_range(0..20))
            .map(|_| alphabet[rng.gen_range(0..alphabet.len())])
            .collect();
        let options = DocumentOptions::default()
            .with_check_invariants(true)
            .with_align_deletions_to_lines(rng.gen_bool(0.5));
        let mut doc = Document::with_options(&initial, options);
        for _ in 0..4 {
            let len = doc.len_chars();
            let a = rng.gen_range(0..=len);
            let b = rng.gen_range(0..=len);
            doc.create_range_marker(a.min(b), a.max(b)).unwrap();
        }

        let mut sync = DocumentSynchronizer::new();
        sync.start_transaction(&doc).unwrap();
        let mut simulated: Vec<char> = initial.chars().collect();
        let edit_count = rng.gen_range(1..10);

        for _ in 0..edit_count {
            let len = simulated.len();
            let a = rng.gen_range(0..=len);
            let b = rng.gen_range(0..=len);
            let (start, end) = (a.min(b), a.max(b));
            let replacement: String = (0..rng.gen_range(0..4))
                .map(|_| alphabet[rng.gen_range(0..alphabet.len())])
                .collect();

            sync.replace_string(&doc, start, end, &replacement).unwrap();
            simulated.splice(start..end, replacement.chars());

            let expected: String = simulated.iter().collect();
            assert_eq!(sync.transaction_text(&doc).unwrap(), expected);

            let ranges: Vec<Range<usize>> = sync
                .fragments(&doc)
                .unwrap()
                .iter()
                .map(|f| f.range())
                .collect();
            for pair in ranges.windows(2) {
                assert!(pair[0].end < pair[1].start, "fragments not disjoint: {ranges:?}");
            }
            assert!(ranges.iter().all(|r| r.end <= doc.len_chars()));
        }

        let summary = sync.commit_transaction(&mut doc).unwrap();
        let expected: String = simulated.iter().collect();
        assert_eq!(doc.text(), expected, "initial {initial:?}");
        assert!(summary.fragments <= edit_count);
        for marker in doc.markers() {
            assert!(marker.start_offset <= marker.end_offset);
            assert!(marker.end_offset <= doc.len_chars());
        }
    }
}
