use std::env;
use std::error::Error;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use fst::MapBuilder;
use rkyv::{rancor::Error as RkyvError, to_bytes};
use zstd::bulk::compress as zstd_compress;

#[allow(dead_code)]
#[path = "src/data.rs"]
mod data_model;
use data_model::{BundledContent, GlossaryRecord, LearningPath, TermLinks};

const ARCHIVE_COMPRESSION_LEVEL: i32 = 9;

fn main() -> Result<(), Box<dyn Error>> {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let out_dir = PathBuf::from(env::var("OUT_DIR")?);
    println!("cargo:rerun-if-changed=src/data.rs");

    let records: Vec<GlossaryRecord> = load_json(&manifest_dir.join("data/glossary.json"))?;
    let paths: Vec<LearningPath> = load_json(&manifest_dir.join("data/learning_paths.json"))?;
    let term_links: Vec<TermLinks> = load_json(&manifest_dir.join("data/term_links.json"))?;
    build_id_fst(&records, &out_dir)?;
    build_content_archive(
        BundledContent {
            records,
            paths,
            term_links,
        },
        &out_dir,
    )?;

    Ok(())
}

fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, Box<dyn Error>> {
    println!("cargo:rerun-if-changed={}", path.display());
    if !path.exists() {
        panic!("Missing {}.", path.display());
    }
    let reader = BufReader::new(File::open(path)?);
    let parsed = serde_json::from_reader(reader)
        .map_err(|err| format!("Failed to parse {}: {err}", path.display()))?;
    Ok(parsed)
}

fn build_id_fst(records: &[GlossaryRecord], out_dir: &Path) -> Result<(), Box<dyn Error>> {
    let mut sorted: Vec<(&str, u64)> = records
        .iter()
        .enumerate()
        .map(|(idx, record)| (record.id.as_str(), idx as u64))
        .collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    for pair in sorted.windows(2) {
        if pair[0].0 == pair[1].0 {
            panic!("Duplicate glossary id {:?}", pair[0].0);
        }
    }
    for record in records {
        if record.term.trim().is_empty() || record.definition.trim().is_empty() {
            panic!("Glossary record {:?} needs a term and a definition", record.id);
        }
    }

    let fst_path = out_dir.join("glossary_ids.fst");
    let writer = BufWriter::new(File::create(&fst_path)?);
    let mut builder = MapBuilder::new(writer)?;
    for (id, index) in &sorted {
        builder.insert(id, *index)?;
    }
    builder.finish()?;
    println!("cargo:rustc-env=CRUMB_ID_FST={}", fst_path.display());
    Ok(())
}

fn build_content_archive(content: BundledContent, out_dir: &Path) -> Result<(), Box<dyn Error>> {
    let bytes = to_bytes::<RkyvError>(&content)
        .map_err(|err| format!("Failed to serialize glossary content: {err}"))?
        .into_vec();
    let compressed = zstd_compress(&bytes, ARCHIVE_COMPRESSION_LEVEL)?;

    let data_path = out_dir.join("glossary.rkyv");
    fs::write(&data_path, compressed)?;
    println!("cargo:rustc-env=CRUMB_CONTENT={}", data_path.display());
    Ok(())
}
