//! Line-oriented chunking of the knowledge corpus.

/// Split a corpus into retrieval chunks.
///
/// Lines are grouped greedily, in order, into chunks of at most `max_chars`
/// characters (joined by `\n`). A line longer than `max_chars` becomes a chunk
/// of its own. Blank lines are skipped.
pub fn chunk_lines(corpus: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0;

    for line in corpus.lines() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            continue;
        }
        let line_chars = line.chars().count();

        if !current.is_empty() && current_chars + 1 + line_chars > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_chars = 0;
        }

        if !current.is_empty() {
            current.push('\n');
            current_chars += 1;
        }
        current.push_str(line);
        current_chars += line_chars;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
