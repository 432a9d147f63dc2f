//! Basic Text Chunking
//!
//! Fixed windows over a string, then over every `.rs` file in `src/`.
//!
//! ```bash
//! cargo run --example basic_chunking
//! ```

use kiru::Chunker;

fn main() -> kiru::Result<()> {
    let document = "Machine learning models learn patterns from data. \
        They generalize these patterns to make predictions. \
        This is fundamentally different from traditional programming.";

    // 60 characters per chunk, 10 shared with the previous one
    let chunker = Chunker::by_characters(60, 10)?;

    println!("Document: {} chars", document.chars().count());
    println!("Expected chunks: {}\n", chunker.estimate_chunks(document.chars().count()));

    for chunk in chunker.on_string(document) {
        let chunk = chunk?;
        println!("[{}] {:?}: \"{}\"", chunk.index, chunk.span(), chunk.to_string_lossy());
    }

    // Many files: each chunk is tagged with the file it came from.
    let chunker = Chunker::by_bytes(2048, 128)?;
    let mut per_file = std::collections::BTreeMap::new();
    for item in chunker.on_sources(["glob://src/**/*.rs"]) {
        match item {
            Ok(tagged) => *per_file.entry(tagged.id).or_insert(0usize) += 1,
            Err(failure) => eprintln!("{failure}: {}", failure.error),
        }
    }

    println!("\nFiles: {}", per_file.len());
    for (id, chunks) in per_file {
        println!("  source {id}: {chunks} chunks");
    }

    Ok(())
}
