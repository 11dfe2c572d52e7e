use std::fs;
use std::io::Write;
use tempfile::TempDir;

use passage_core::config::ChunkingSettings;
use passage_core::data_processor::DataProcessor;

#[test]
fn process_directory_single_small_file() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    let file_path = dir.join("a.txt");
    let mut f = fs::File::create(&file_path).unwrap();
    writeln!(f, "Short text").unwrap();

    let processor = DataProcessor::new();
    let chunks = processor.process_directory(dir).expect("process");

    assert_eq!(chunks.len(), 1, "one small paragraph becomes one chunk");
    assert_eq!(chunks[0].content, "Short text");
    assert_eq!(chunks[0].chunk_index, 0);
    assert_eq!(chunks[0].id, format!("{}:0", file_path.display()));
}

#[test]
fn only_text_and_markdown_files_are_picked_up() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::create_dir_all(dir.join("nested")).unwrap();
    fs::write(dir.join("a.txt"), "alpha").unwrap();
    fs::write(dir.join("nested/b.MD"), "bravo").unwrap();
    fs::write(dir.join("c.json"), "{\"charlie\": 1}").unwrap();

    let chunks = DataProcessor::new().process_directory(dir).expect("process");
    let contents: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
    assert_eq!(contents, vec!["alpha", "bravo"]);
}

#[test]
fn process_directory_limited_two_files_limit_one() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::write(dir.join("a.txt"), "alpha bravo").unwrap();
    fs::write(dir.join("b.txt"), "charlie delta").unwrap();

    let processor = DataProcessor::new();
    let chunks = processor.process_directory_limited(dir, 1).expect("process limited");

    let mut sources = std::collections::HashSet::new();
    for c in &chunks { sources.insert(c.source.clone()); }
    assert_eq!(sources.len(), 1, "limited to one source document");
}

#[test]
fn long_file_is_chunked_with_metadata() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("long.md");
    fs::write(&path, "word ".repeat(100)).unwrap();

    let settings = ChunkingSettings { chunk_size: 60, chunk_overlap: 10 };
    let chunks = DataProcessor::with_settings(&settings).process_file(&path).expect("process file");
    assert!(chunks.len() > 1);
    for (i, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.chunk_index, i);
        assert!(chunk.content.chars().count() <= 60);
        let meta = chunk.metadata();
        assert_eq!(meta["source"], serde_json::json!(path.to_string_lossy()));
        assert_eq!(meta["chunk"], serde_json::json!(i));
    }
}

#[test]
fn missing_directory_yields_no_chunks() {
    let tmp = TempDir::new().unwrap();
    let chunks = DataProcessor::new().process_directory(&tmp.path().join("absent")).expect("process");
    assert!(chunks.is_empty());
}
