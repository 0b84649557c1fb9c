use text_model::Document;

fn main() {
    let mut doc = Document::new("let value = compute();\n");
    let name = doc.create_range_marker(4, 9).unwrap();
    let call = doc.create_range_marker(12, 21).unwrap();
    let cursor = doc.create_point_marker(21).unwrap();
    doc.set_sticking_to_right(cursor, true);

    let listener = doc.add_listener(|event| {
        println!(
            "edit at {}: {:?} -> {:?} (v{} -> v{})",
            event.offset, event.old_text, event.new_text, event.old_version, event.new_version
        );
    });

    // Rename the binding; the marker covering it grows with the new name.
    doc.replace_string(4, 9, "result").unwrap();
    assert_eq!(doc.marker_range(name), Some(4..10));
    assert_eq!(doc.marker_range(call), Some(13..22));

    // Typing at the cursor pushes it forward.
    doc.insert_string(22, " + 1").unwrap();
    assert_eq!(doc.marker_range(cursor), Some(26..26));

    // Deleting the whole call destroys its marker.
    doc.delete_string(12, 26).unwrap();
    assert!(!doc.is_valid(call));

    doc.remove_listener(listener);
    for marker in doc.markers() {
        println!("{} {:?}", marker.id, marker.range());
    }
    println!("{}", doc.text());
}
