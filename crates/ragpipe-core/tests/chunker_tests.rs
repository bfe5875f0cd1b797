use ragpipe_core::chunker::{calculate_size, Chunker};

const PROSE: &str = "The quick brown fox jumps over the lazy dog while the\n\n  \
    curious cat watches from a sunny windowsill, wondering why anyone would \
    bother jumping over dogs at all when there are perfectly good fences.";

fn words(segment: &str) -> Vec<&str> { segment.split(' ').collect() }

#[test]
fn splits_on_size_without_overlap() {
    let chunks = Chunker::new(10, 0).chunk_text("one two three four five six");
    assert_eq!(chunks, vec!["one two", "three", "four five", "six"]);
}

#[test]
fn empty_input_yields_no_segments() {
    assert!(Chunker::new(10, 2).chunk_text("").is_empty());
}

#[test]
fn whitespace_only_input_is_returned_verbatim() {
    let text = "  \n\t ";
    assert_eq!(Chunker::new(10, 2).chunk_text(text), vec![text.to_string()]);
}

#[test]
fn short_text_is_a_single_normalized_segment() {
    let chunks = Chunker::new(100, 5).chunk_text("  hello \n\n   world  ");
    assert_eq!(chunks, vec!["hello world"]);
}

#[test]
fn oversized_word_is_never_split() {
    let long = "supercalifragilisticexpialidocious";
    let chunks = Chunker::new(10, 0).chunk_text(&format!("a {long} b"));
    assert_eq!(chunks, vec!["a".to_string(), long.to_string(), "b".to_string()]);

    let alone = Chunker::new(5, 3).chunk_text(long);
    assert_eq!(alone, vec![long.to_string()]);
}

#[test]
fn overlap_carries_trailing_words_forward() {
    let text = "alpha bravo charlie delta echo foxtrot golf hotel";
    let chunks = Chunker::new(20, 2).chunk_text(text);
    assert!(chunks.len() > 1);
    for pair in chunks.windows(2) {
        let prev = words(&pair[0]);
        let next = words(&pair[1]);
        let carried = 2.min(prev.len());
        let tail = &prev[prev.len() - carried..];
        assert_eq!(&next[..carried], tail, "{:?} -> {:?}", pair[0], pair[1]);
    }
}

#[test]
fn every_non_empty_input_yields_non_empty_segments() {
    for size in [1usize, 5, 16, 40, 200] {
        for overlap in [0usize, 1, 3] {
            let chunks = Chunker::new(size, overlap).chunk_text(PROSE);
            assert!(!chunks.is_empty(), "size={size} overlap={overlap}");
            assert!(chunks.iter().all(|c| !c.is_empty()), "size={size} overlap={overlap}");
        }
    }
}

#[test]
fn segments_respect_size_bound_unless_a_single_word() {
    for size in [8usize, 16, 32, 64] {
        for chunk in Chunker::new(size, 0).chunk_text(PROSE) {
            let ws = words(&chunk);
            assert!(
                calculate_size(&ws) <= size || ws.len() == 1,
                "size={size} chunk={chunk:?}"
            );
        }
    }
}

#[test]
fn segments_without_overlap_reconstruct_the_token_stream() {
    let chunks = Chunker::new(24, 0).chunk_text(PROSE);
    let rejoined = chunks.join(" ");
    let original: Vec<&str> = PROSE.split_whitespace().collect();
    assert_eq!(rejoined, original.join(" "));
}

#[test]
fn segments_with_overlap_reconstruct_after_dropping_carried_words() {
    let overlap = 2;
    let chunks = Chunker::new(24, overlap).chunk_text(PROSE);
    let mut stream: Vec<&str> = Vec::new();
    let mut prev_len = 0usize;
    for (i, chunk) in chunks.iter().enumerate() {
        let ws = words(chunk);
        let skip = if i == 0 { 0 } else { overlap.min(prev_len) };
        stream.extend_from_slice(&ws[skip..]);
        prev_len = ws.len();
    }
    let original: Vec<&str> = PROSE.split_whitespace().collect();
    assert_eq!(stream, original);
}

#[test]
fn overlap_word_selection() {
    let ws = ["one", "two", "three", "four", "five"];
    assert_eq!(Chunker::new(10, 2).overlap_words(&ws), &["four", "five"]);
    assert_eq!(Chunker::new(10, 9).overlap_words(&ws), &ws[..]);
    assert!(Chunker::new(10, 0).overlap_words(&ws).is_empty());
    assert!(Chunker::new(10, 3).overlap_words(&[]).is_empty());
}

#[test]
fn size_calculation() {
    assert_eq!(calculate_size(&[]), 0);
    assert_eq!(calculate_size(&["hello"]), 5);
    assert_eq!(calculate_size(&["one", "two", "three"]), 13);
}

#[test]
fn chunker_is_usable_as_a_capability() {
    use ragpipe_core::traits::TextChunker;
    let chunker: Box<dyn TextChunker> = Box::new(Chunker::new(10, 0));
    assert_eq!(chunker.chunk_text("one two three").len(), 2);
}
