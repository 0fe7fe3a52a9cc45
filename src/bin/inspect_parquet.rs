use anyhow::{bail, Context, Result};
use parquet::file::metadata::RowGroupMetaData;
use parquet::file::reader::{FileReader, SerializedFileReader};
use sales_pipeline::export::read_parquet;
use std::{env, fs::File, path::Path};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        bail!("usage: {} <PARQUET_FILE>", args[0]);
    }
    let path = Path::new(&args[1]);
    print_metadata(path)?;

    // decode through the same reader the pipeline uses
    let table = read_parquet(path).with_context(|| format!("reading {}", path.display()))?;
    println!("=== Contents ({} rows) ===", table.num_rows());
    println!("{}", table.pretty()?);
    Ok(())
}

fn print_metadata(path: &Path) -> Result<()> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let reader = SerializedFileReader::new(file)?;
    let meta = reader.metadata();
    let file_meta = meta.file_metadata();

    println!("=== Parquet File: {} ===", path.display());
    println!("Created by:     {}", file_meta.created_by().unwrap_or("<unknown>"));
    println!("Total rows:     {}", file_meta.num_rows());
    println!("Row groups:     {}", meta.num_row_groups());
    println!("Size on disk:   {} bytes", std::fs::metadata(path)?.len());
    println!();

    println!("=== Columns ===");
    for col in file_meta.schema_descr().columns() {
        let logical = col
            .logical_type()
            .as_ref()
            .map_or("<none>".to_string(), |lt| format!("{:?}", lt));
        println!(
            "- {:<12} | Physical: {:<10} | Logical: {}",
            col.name(),
            format!("{:?}", col.physical_type()),
            logical
        );
    }
    println!();

    for (idx, rg) in meta.row_groups().iter().enumerate() {
        print_row_group(idx, rg);
    }
    Ok(())
}

fn print_row_group(idx: usize, rg: &RowGroupMetaData) {
    println!("--- Row Group {} ({} rows) ---", idx, rg.num_rows());
    for col in rg.columns() {
        let nulls = col
            .statistics()
            .and_then(|s| s.null_count_opt())
            .map_or("?".to_string(), |n| n.to_string());
        println!(
            "  {:<12} {:?}, {} values, {} nulls, {} -> {} bytes",
            col.column_descr().name(),
            col.compression(),
            col.num_values(),
            nulls,
            col.uncompressed_size(),
            col.compressed_size()
        );
    }
    println!();
}
