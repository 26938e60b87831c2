//! Text chunking with boundary snapping and overlap.

/// Split text into overlapping character chunks.
///
/// Chunk boundaries snap to the nearest paragraph break when one exists
/// in the back half of the chunk (searched up to 100 characters past the
/// nominal end), falling back to sentence breaks (up to 50 past), so
/// chunks end on natural seams instead of mid-sentence.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    if text.trim().is_empty() {
        return vec![];
    }

    let text_len = text.len();
    let mut chunks = Vec::new();
    let mut start = 0usize;

    while start < text_len {
        let mut end = floor_char_boundary(text, (start + chunk_size).min(text_len));

        if end < text_len {
            let window_start = floor_char_boundary(text, start + chunk_size / 2).max(start);
            let para_window_end = floor_char_boundary(text, (end + 100).min(text_len));

            // Prefer a paragraph break
            if let Some(pos) = rfind_in(text, window_start, para_window_end, "\n\n") {
                end = pos + 2;
            } else {
                // Fall back to a sentence break
                let sent_window_end = floor_char_boundary(text, (end + 50).min(text_len));
                for sep in [". ", ".\n", "! ", "? "] {
                    if let Some(pos) = rfind_in(text, window_start, sent_window_end, sep) {
                        end = pos + sep.len();
                        break;
                    }
                }
            }
        }

        let chunk = text[start..end].trim();
        if !chunk.is_empty() {
            chunks.push(chunk.to_string());
        }

        if end >= text_len {
            break;
        }

        // Step back by the overlap; always make forward progress
        let mut next_start = end.saturating_sub(overlap);
        if next_start <= start {
            next_start = end;
        }
        while next_start < text_len && !text.is_char_boundary(next_start) {
            next_start += 1;
        }
        start = next_start;
    }

    tracing::debug!(
        "Chunked text into {} chunks (size: {}, overlap: {})",
        chunks.len(),
        chunk_size,
        overlap
    );

    chunks
}

/// Largest char boundary not greater than `index`.
fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    index = index.min(text.len());
    while index > 0 && !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Rightmost occurrence of `needle` in `text[from..to]`, as an absolute
/// byte offset.
fn rfind_in(text: &str, from: usize, to: usize, needle: &str) -> Option<usize> {
    if from >= to {
        return None;
    }
    text[from..to].rfind(needle).map(|pos| from + pos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_basic() {
        let text = "a".repeat(2500);
        let chunks = chunk_text(&text, 1000, 200);

        assert!(chunks.len() >= 3);
        assert!(chunks[0].len() <= 1100);
    }

    #[test]
    fn test_chunk_empty() {
        assert!(chunk_text("", 1000, 200).is_empty());
        assert!(chunk_text("   \n  ", 1000, 200).is_empty());
    }

    #[test]
    fn test_chunk_shorter_than_size() {
        let chunks = chunk_text("short document", 1000, 200);
        assert_eq!(chunks, vec!["short document".to_string()]);
    }

    #[test]
    fn test_snaps_to_paragraph_break() {
        let first = "x".repeat(700);
        let second = "y".repeat(600);
        let text = format!("{}\n\n{}", first, second);

        let chunks = chunk_text(&text, 1000, 100);
        // The first chunk ends at the paragraph break, not mid-paragraph
        assert_eq!(chunks[0], first);
    }

    #[test]
    fn test_snaps_to_sentence_break() {
        let sentence = format!("{}. ", "w".repeat(800));
        let text = format!("{}{}", sentence, "z".repeat(600));

        let chunks = chunk_text(&text, 1000, 100);
        assert!(chunks[0].ends_with('.'));
    }

    #[test]
    fn test_overlap_repeats_content() {
        let words: Vec<String> = (0..200).map(|i| format!("word{}", i)).collect();
        let text = words.join(" ");

        let chunks = chunk_text(&text, 400, 100);
        assert!(chunks.len() > 1);

        // The tail of chunk N reappears at the head of chunk N+1
        let tail: String = chunks[0].chars().rev().take(40).collect::<String>();
        let tail: String = tail.chars().rev().collect();
        assert!(chunks[1].contains(tail.split_whitespace().next().unwrap()));
    }

    #[test]
    fn test_utf8_content() {
        let text = "ação ção coração ".repeat(100);
        let chunks = chunk_text(&text, 300, 50);
        assert!(!chunks.is_empty());
        // Slicing never panics on multi-byte boundaries; content survives
        assert!(chunks.iter().all(|c| c.contains("ção")));
    }

    #[test]
    fn test_progress_with_degenerate_overlap() {
        // Overlap nearly as large as the chunk still terminates
        let text = "k".repeat(500);
        let chunks = chunk_text(&text, 100, 99);
        assert!(!chunks.is_empty());
    }
}
