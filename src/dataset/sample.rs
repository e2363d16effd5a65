//! Random training-subset selection.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;

use crate::error::DatasetError;

fn create_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_rng(&mut rand::rng()),
    }
}

/// Picks `size` distinct indices out of `population`, ascending.
pub fn sample_indices(population: usize, size: usize, seed: Option<u64>) -> Result<Vec<usize>, DatasetError> {
    if size > population {
        return Err(DatasetError::SampleTooLarge {
            requested: size,
            available: population,
        });
    }
    let mut rng = create_rng(seed);
    let mut indices: Vec<usize> = (0..population).collect();
    indices.shuffle(&mut rng);
    indices.truncate(size);
    indices.sort_unstable();
    Ok(indices)
}

/// Copies `size` randomly chosen non-blank lines of `input` to `output`,
/// keeping their original order. Returns the number of lines written.
pub fn sample_lines(
    input: &Path,
    output: &Path,
    size: usize,
    seed: Option<u64>,
) -> Result<usize, DatasetError> {
    if !input.exists() {
        return Err(DatasetError::NotFound(input.to_path_buf()));
    }
    let content = fs::read_to_string(input)?;
    let lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).collect();
    let indices = sample_indices(lines.len(), size, seed)?;

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut writer = BufWriter::new(File::create(output)?);
    for &index in &indices {
        writeln!(writer, "{}", lines[index])?;
    }
    writer.flush()?;

    info!(
        input = %input.display(),
        output = %output.display(),
        sampled = indices.len(),
        population = lines.len(),
        "Sampled training subset"
    );
    Ok(indices.len())
}
