use text_model::{Document, DocumentSynchronizer};

fn main() {
    let mut doc = Document::new("fn main() {\n    old();\n}\n");
    let body = doc.create_range_marker(11, 23).unwrap();
    let mut sync = DocumentSynchronizer::new();

    sync.start_transaction(&doc).unwrap();
    sync.replace_string(&doc, 16, 19, "new").unwrap();
    sync.insert_string(&doc, 23, "    log();\n").unwrap();
    println!("working copy:\n{}", sync.transaction_text(&doc).unwrap());

    for fragment in sync.fragments(&doc).unwrap() {
        println!("{:?} <- {:?}", fragment.range(), fragment.replacement());
    }

    let summary = sync.commit_transaction(&mut doc).unwrap();
    println!(
        "committed {} fragments in {} events",
        summary.fragments,
        summary.events.len()
    );
    assert_eq!(doc.text(), "fn main() {\n    new();\n    log();\n}\n");
    println!("body marker: {:?}", doc.marker_range(body));
}
