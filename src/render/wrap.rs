//! Greedy line wrapping against a pixel width budget.
//!
//! The wrapper is a pure function of its inputs: the text, the budget, and
//! the measurement function. The compositor feeds it the report face's
//! measurement; tests feed it synthetic measures.

/// Break `text` into lines no wider than `max_width` under `measure`.
///
/// Explicit `'\n'` breaks are honored first; an empty paragraph contributes
/// exactly one empty line so blank lines survive visually. Words are joined
/// by single spaces and accumulated greedily. A single word wider than the
/// budget is split character by character (common for CJK text), and no
/// output line exceeds the budget except one unsplittable character.
pub fn wrap_text<F>(text: &str, max_width: f32, measure: F) -> Vec<String>
where
    F: Fn(&str) -> f32,
{
    let mut all_lines = Vec::new();

    for paragraph in text.split('\n') {
        if paragraph.is_empty() {
            all_lines.push(String::new());
            continue;
        }

        let mut current_line = String::new();
        for word in paragraph.split(' ') {
            let test_line = if current_line.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current_line, word)
            };

            if measure(&test_line) > max_width {
                if measure(word) > max_width {
                    // The word alone overflows the budget: flush what we
                    // have, then split it character by character.
                    if !current_line.is_empty() {
                        all_lines.push(std::mem::take(&mut current_line));
                    }
                    let mut buffer = String::new();
                    for ch in word.chars() {
                        let mut candidate = buffer.clone();
                        candidate.push(ch);
                        if measure(&candidate) > max_width {
                            all_lines.push(buffer);
                            buffer = ch.to_string();
                        } else {
                            buffer = candidate;
                        }
                    }
                    current_line = buffer;
                } else {
                    all_lines.push(std::mem::take(&mut current_line));
                    current_line = word.to_string();
                }
            } else {
                current_line = test_line;
            }
        }
        if !current_line.is_empty() {
            all_lines.push(current_line);
        }
    }

    all_lines
}
