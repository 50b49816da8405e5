use crate::error::{MemoryError, Result};

/// Split text into overlapping fixed-size character windows.
///
/// Each chunk is `chunk_size` characters (the last may be shorter); the next
/// window starts `chunk_size - overlap` characters after the previous one.
/// Empty content yields an empty sequence.
///
/// # Errors
///
/// Returns `InvalidChunking` when `chunk_size` is zero or `overlap` is not
/// smaller than `chunk_size` — a non-advancing window would otherwise loop
/// forever.
pub fn chunk(content: &str, chunk_size: usize, overlap: usize) -> Result<Vec<String>> {
    if chunk_size == 0 {
        return Err(MemoryError::InvalidChunking(
            "chunk_size must be positive".into(),
        ));
    }
    if overlap >= chunk_size {
        return Err(MemoryError::InvalidChunking(format!(
            "overlap {overlap} must be smaller than chunk_size {chunk_size}"
        )));
    }

    let chars: Vec<char> = content.chars().collect();
    let step = chunk_size - overlap;
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let end = (start + chunk_size).min(chars.len());
        chunks.push(chars[start..end].iter().collect());
        start += step;
    }

    Ok(chunks)
}
