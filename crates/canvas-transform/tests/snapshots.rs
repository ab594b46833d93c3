//! Snapshot tests for generated documents.

use canvas_transform::{convert, ConvertOptions};
use std::fs;
use std::path::PathBuf;

fn fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../test-fixtures/inputs")
        .join(name);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("failed to read {}: {}", path.display(), e))
}

#[test]
fn test_markup_pair_page() {
    let result = convert(&fixture("ribbon_page.html"), &ConvertOptions::default()).unwrap();
    insta::assert_snapshot!("ribbon_page_markup", result.artifacts.markup_text);
}
