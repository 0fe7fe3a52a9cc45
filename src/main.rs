use anyhow::{Context, Result};
use sales_pipeline::{
    catalog::{
        aggregate::{city_revenue_ranking, AGGREGATED_SALES_VIEW},
        query::{count_rows, describe, exclude, filter_eq, min_columns, summarize},
    },
    config::Config,
    pipeline::{build_catalog, compare_loaders, export_aggregated, RAW_TABLE},
    process::SALES_TABLE,
    Catalog, Table, Value,
};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn show(title: &str, table: &Table) -> Result<()> {
    println!("── {} ({} rows)", title, table.num_rows());
    println!("{}", table.pretty()?);
    Ok(())
}

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    // ─── 2) configuration ────────────────────────────────────────────
    let config_path = Config::locate();
    let config = Config::load(config_path.as_deref()).context("loading configuration")?;
    info!(
        input = %config.input_glob,
        export = %config.export_path.display(),
        "configured"
    );

    // ─── 3) load twice, compare timings, preview ─────────────────────
    let (raw, timings) = compare_loaders(&config.input_glob, config.missing_input)
        .with_context(|| format!("loading {}", config.input_glob))?;
    for t in &timings {
        println!("time ({}): {:?}", t.strategy.as_str(), t.elapsed);
    }
    show("preview", &raw.head(config.preview_rows).to_table()?)?;

    // ─── 4) inspect the raw load before any cleaning ─────────────────
    let loaded = raw.to_table()?;
    show("DESCRIBE df", &describe(&loaded)?)?;
    show("COUNT(*) df", &count_rows(&loaded)?)?;
    show("null counts", &summarize(&loaded)?)?;

    // ─── 5) register raw, typed and aggregated relations ─────────────
    let catalog: Catalog = build_catalog(raw, &config.columns, false)?;
    let df = catalog.scan(RAW_TABLE)?;
    show("COUNT(*) df after dropping empty rows", &count_rows(&df)?)?;
    show("null counts after dropping empty rows", &summarize(&df)?)?;
    show(
        "df lookup",
        &filter_eq(
            &df,
            &config.columns.order_id,
            &Value::from(config.lookup_order_id.as_str()),
        )?,
    )?;

    // ─── 6) typed sales reports ──────────────────────────────────────
    let sales = catalog.scan(SALES_TABLE)?;
    show("sales", &sales)?;
    let untyped = ["product", "order_date", "purchase_address"];
    let numeric = exclude(&sales, &untyped)?;
    show("sales EXCLUDE", &numeric)?;
    let numeric_names: Vec<&str> = numeric.schema().names().collect();
    show("MIN of numeric columns", &min_columns(&numeric, &numeric_names)?)?;

    // ─── 7) aggregated view + city ranking ───────────────────────────
    let aggregated = catalog.scan(AGGREGATED_SALES_VIEW)?;
    show("aggregated_sales", &aggregated)?;
    show("revenue by city", &city_revenue_ranking(&aggregated)?)?;

    // ─── 8) export and read back ─────────────────────────────────────
    let written = export_aggregated(&catalog, &config.export_path, config.compression)
        .with_context(|| format!("exporting {}", config.export_path.display()))?;
    info!(rows = written, path = %config.export_path.display(), "exported");

    let mut reread = Catalog::new();
    reread.register_parquet("aggregated_sales_parquet", &config.export_path)?;
    show(
        "FROM aggregated_sales.parquet",
        &*reread.scan("aggregated_sales_parquet")?,
    )?;

    info!("done");
    Ok(())
}
