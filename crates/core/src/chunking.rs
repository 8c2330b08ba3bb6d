/// Splits a document body into chunks of at most `chunk_size` characters.
///
/// Paragraphs (blank-line separated) are accumulated until the next one
/// would overflow the chunk; a single paragraph longer than the chunk size
/// is hard-split on character boundaries.
pub fn split_text(text: &str, chunk_size: usize) -> Vec<String> {
    let size = chunk_size.max(1);

    let paragraphs = text
        .split("\n\n")
        .map(str::trim)
        .filter(|paragraph| !paragraph.is_empty())
        .collect::<Vec<_>>();

    let mut grouped = Vec::new();
    let mut current = String::new();

    for paragraph in paragraphs {
        if current.is_empty() {
            current.push_str(paragraph);
            continue;
        }

        if current.len() + paragraph.len() + 2 <= size {
            current.push_str("\n\n");
            current.push_str(paragraph);
        } else {
            grouped.push(std::mem::take(&mut current));
            current.push_str(paragraph);
        }
    }

    if !current.is_empty() {
        grouped.push(current);
    }

    let mut chunks = Vec::new();
    for piece in grouped {
        if piece.chars().count() <= size {
            chunks.push(piece);
            continue;
        }

        let chars: Vec<char> = piece.chars().collect();
        let mut start = 0;
        while start < chars.len() {
            let end = (start + size).min(chars.len());
            chunks.push(chars[start..end].iter().collect());
            start = end;
        }
    }

    chunks
}
