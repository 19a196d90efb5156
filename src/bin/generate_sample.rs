use std::fs::File;
use std::io::{BufWriter, Write};

use anyhow::{Context, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const N_GENES: usize = 60;

/// Box-Muller transform for a normal sample.
fn gauss(rng: &mut StdRng, mean: f64, std_dev: f64) -> f64 {
    let u1: f64 = rng.gen::<f64>().max(1e-15);
    let u2: f64 = rng.gen();
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    mean + std_dev * z
}

fn main() -> Result<()> {
    let output_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "sample_data.tsv.gz".to_string());
    let mut rng = StdRng::seed_from_u64(42);

    // (column prefix, replicates, fold change applied to every third gene)
    let conditions = [("WT", 3, 1.0), ("KO", 3, 0.35), ("HET", 2, 0.7)];

    let mut header = vec!["gene_id".to_string(), "symbol".to_string()];
    for (prefix, reps, _) in &conditions {
        header.extend((1..=*reps).map(|r| format!("{prefix}_{r}")));
    }

    let file = File::create(&output_path)
        .with_context(|| format!("creating {output_path}"))?;
    let encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(encoder);
    writer.write_record(&header)?;

    for g in 0..N_GENES {
        let baseline = 20.0 + rng.gen::<f64>() * 480.0;
        let mut record = vec![format!("GENE{:04}", g + 1), format!("Sym{}", g + 1)];

        for (_, reps, fold) in &conditions {
            let level = if g % 3 == 0 { baseline * fold } else { baseline };
            for _ in 0..*reps {
                // Sprinkle a few missing cells so the viewer has something to skip.
                let cell = if rng.gen::<f64>() < 0.02 {
                    "NA".to_string()
                } else {
                    format!("{:.3}", gauss(&mut rng, level, level * 0.12).max(0.0))
                };
                record.push(cell);
            }
        }
        writer.write_record(&record)?;
    }

    let encoder = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("flushing TSV writer: {}", e.error()))?;
    let mut file = encoder.finish().context("finishing gzip stream")?;
    file.flush().with_context(|| format!("writing {output_path}"))?;

    println!(
        "Wrote {N_GENES} genes × {} samples to {output_path}",
        header.len() - 2
    );
    Ok(())
}
