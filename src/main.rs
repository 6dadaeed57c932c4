use anyhow::Result;
use chrono::NaiveDate;
use indecscraper::{
    cache::ByteCache,
    fetch,
    series::NamedSeries,
    sources::price_csv::{parse_price_csv, PriceCsvSpec},
    transform,
};
use serde::Serialize;
use std::{fs, path::PathBuf, time::Duration};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

/// One monthly statistical release published as a named-column price CSV.
struct PriceSource {
    name: &'static str,
    url: &'static str,
    columns: PriceCsvSpec,
}

static PRICE_SOURCES: &[PriceSource] = &[PriceSource {
    name: "ipim",
    url: "https://www.indec.gob.ar/ftp/cuadros/economia/indice_ipim.csv",
    columns: PriceCsvSpec {
        period_col: "periodo",
        category_col: "nivel_general_aperturas",
        value_col: "indice_ipim",
    },
}];

/// Source bytes are immutable within a release cycle; half a day is plenty.
const CACHE_TTL: Duration = Duration::from_secs(12 * 60 * 60);

/// What the presentation layer consumes, one file per category.
#[derive(Serialize)]
struct SeriesReport<'a> {
    series: &'a NamedSeries,
    /// Last month-over-month % change.
    mom_pct: Option<f64>,
    /// Last year-over-year % change.
    yoy_pct: Option<f64>,
    as_of: Option<NaiveDate>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    std::panic::set_hook(Box::new(|info| {
        eprintln!("panic: {:?}", info);
    }));

    // ─── 2) configure dirs + cache ───────────────────────────────────
    let client = fetch::build_client()?;
    let cache_dir = PathBuf::from("cache");
    let out_dir = PathBuf::from("out");
    fs::create_dir_all(&out_dir)?;

    let cache = ByteCache::new(&cache_dir, CACHE_TTL)?;

    // ─── 3) fetch all sources (cache read-through) ───────────────────
    let fetches = PRICE_SOURCES.iter().map(|src| {
        let client = client.clone();
        let cache = &cache;
        async move {
            if let Some(bytes) = cache.get(src.url) {
                return (src, Ok(bytes));
            }
            match fetch::download_bytes(&client, src.url).await {
                Ok(bytes) => {
                    if let Err(e) = cache.put(src.url, &bytes) {
                        warn!("caching {} failed: {}", src.name, e);
                    }
                    (src, Ok(bytes))
                }
                Err(e) => (src, Err(e)),
            }
        }
    });
    let fetched = futures::future::join_all(fetches).await;

    // ─── 4) parse + derive, one source at a time ─────────────────────
    for (src, result) in fetched {
        let bytes = match result {
            Ok(bytes) => bytes,
            Err(e) => {
                error!("fetch {} failed: {}", src.name, e);
                continue;
            }
        };

        let table = match parse_price_csv(&bytes, &src.columns) {
            Ok(table) => table,
            Err(e) => {
                error!("parse {} failed: {}", src.name, e);
                continue;
            }
        };
        if table.is_empty() {
            warn!("{}: no categories extracted", src.name);
            continue;
        }

        let src_dir = out_dir.join(src.name);
        fs::create_dir_all(&src_dir)?;

        for (category, series) in &table {
            let mom = transform::pct_change(series, 1);
            let yoy = transform::pct_change(series, 12);

            let report = SeriesReport {
                series,
                mom_pct: mom.last_value().map(|(_, v)| v),
                yoy_pct: yoy.last_value().map(|(_, v)| v),
                as_of: series.last().map(|p| p.date),
            };
            info!(
                source = src.name,
                category = %category,
                points = series.len(),
                mom = ?report.mom_pct,
                yoy = ?report.yoy_pct,
                "derived"
            );

            let path = src_dir.join(format!("{}.json", category));
            fs::write(&path, serde_json::to_vec_pretty(&report)?)?;
        }
        info!("{}: wrote {} series", src.name, table.len());
    }

    // ─── 5) drop stale cache entries ─────────────────────────────────
    let removed = cache.purge()?;
    info!(removed, "purged stale cache entries; all done");

    Ok(())
}
