// Chunk: docs/chunks/input_line - Input line storage with dirty range tracking

//! Integration tests for realistic editing sequences.
//!
//! These tests verify that the cursor, the contents and the dirty range stay
//! consistent through the edits a user makes at the prompt.

use conline_buffer::{DirtyRange, LineBuffer};

fn invariant_holds(line: &LineBuffer) -> bool {
    line.cursor() <= line.len() && line.len() < line.capacity()
}

#[test]
fn test_type_word_then_delete_entirely() {
    let mut line = LineBuffer::new();

    for ch in "hello".chars() {
        line.insert(&[ch], true).unwrap();
    }
    assert_eq!(line.text(), "hello");
    assert_eq!(line.cursor(), 5);

    for _ in 0..5 {
        line.delete_backward(1);
    }
    assert!(line.is_empty());
    assert_eq!(line.cursor(), 0);
}

#[test]
fn test_fix_typo_mid_line() {
    let mut line = LineBuffer::new();
    line.insert_str("cd c:\\windwos", true).unwrap();
    line.take_dirty();

    // Step back over the last letter and retype the transposed pair.
    line.move_left();
    line.delete_backward(2);
    line.insert_str("ow", true).unwrap();

    assert_eq!(line.text(), "cd c:\\windows");
    assert_eq!(line.cursor(), 12);
    assert_eq!(line.take_dirty(), DirtyRange::new(10, 3));
    assert!(invariant_holds(&line));
}

#[test]
fn test_overwrite_then_extend() {
    let mut line = LineBuffer::from_str("copy a b");
    line.take_dirty();
    line.set_cursor(5);

    // Overwriting runs past the end and lengthens the line.
    line.insert_str("src dst", false).unwrap();
    assert_eq!(line.text(), "copy src dst");
    assert_eq!(line.take_dirty(), DirtyRange::new(5, 7));
}

#[test]
fn test_dirty_ranges_accumulate_between_paints() {
    let mut line = LineBuffer::from_str("echo hi");
    line.take_dirty();

    line.move_to_start();
    line.delete_forward(1);
    line.move_to_end();
    line.insert_str("!", true).unwrap();

    // One paint must cover both edits.
    assert_eq!(line.text(), "cho hi!");
    assert_eq!(line.take_dirty(), DirtyRange::new(0, 7));
    assert!(line.take_dirty().is_clean());
}

#[test]
fn test_replace_range_like_completion() {
    let mut line = LineBuffer::from_str("type rea");
    line.replace_range(5, 8, &"README.md".chars().collect::<Vec<_>>())
        .unwrap();
    assert_eq!(line.text(), "type README.md");
    assert_eq!(line.cursor(), 14);

    // Cycling to the next match replaces the same span again.
    line.replace_range(5, 14, &"readme.txt".chars().collect::<Vec<_>>())
        .unwrap();
    assert_eq!(line.text(), "type readme.txt");
}

#[test]
fn test_long_line_grows_by_quadrupling() {
    let mut line = LineBuffer::new();
    let text: String = std::iter::repeat('x').take(300).collect();
    line.insert_str(&text, true).unwrap();

    assert_eq!(line.len(), 300);
    assert_eq!(line.capacity(), 1024);
    assert!(invariant_holds(&line));
}

#[test]
fn test_failed_growth_keeps_line() {
    let mut line = LineBuffer::new();
    line.set_limit(Some(256));
    let text: String = std::iter::repeat('x').take(255).collect();
    line.insert_str(&text, true).unwrap();

    let err = line.insert_str("y", true).unwrap_err();
    assert_eq!(err.requested, 256);
    assert_eq!(line.len(), 255);
    assert_eq!(line.cursor(), 255);
    assert!(invariant_holds(&line));
}

#[test]
fn test_delete_selected_span_keeps_cursor_on_text() {
    let mut line = LineBuffer::from_str("del /q /s temp");
    line.set_cursor(10);
    line.delete_range(3, 9);
    assert_eq!(line.text(), "del temp");
    assert_eq!(line.cursor(), 4);
}
