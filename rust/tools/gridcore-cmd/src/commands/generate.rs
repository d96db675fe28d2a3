use std::io::{BufWriter, Write};

use anyhow::{Context, Result};
use gridcore_datagen::SyntheticSpec;

pub fn run(rows: usize, cols: usize, chunk: usize) -> Result<()> {
    let spec = SyntheticSpec::new(rows, cols, chunk);
    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    for batch in spec.batches()? {
        for row in &batch {
            serde_json::to_writer(&mut out, row).with_context(|| "Failed to serialize row")?;
            out.write_all(b"\n")?;
        }
    }
    out.flush()?;
    Ok(())
}
