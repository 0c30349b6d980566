//! rustcinii - CiNii Research batch fetcher and spreadsheet flattener
//!
//! Each subcommand is one step of the review workflow: search for IDs, fetch
//! JSON-LD records, then export them to spreadsheets for manual review.
//!
//! ## Usage
//!
//! ```bash
//! rustcinii search --q がん --ids-out ids.txt
//! rustcinii fetch ids.txt --output records.ndjson --resume
//! rustcinii export records.ndjson --layout relational --format xlsx
//! ```

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use rustcinii::aggregate::{self, AggregateResults, LocalCreators, RemoteCreators};
use rustcinii::client::{CiniiClient, CINII_BASE_URL};
use rustcinii::count::CountReport;
use rustcinii::flatten::DriftPolicy;
use rustcinii::labeled::labeled_table;
use rustcinii::ndjson;
use rustcinii::opensearch::{ItemsPerPage, OpenSearchQuery, SearchType, SortOrder};
use rustcinii::paginate::{fetch_pages_with, is_japanese_item};
use rustcinii::schema::RecordKind;
use rustcinii::sink::{self, TableFormat};
use rustcinii::tables::{self, Table};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn, Level};
use tracing_subscriber::{fmt, EnvFilter};

// ============================================================================
// CLI Definition
// ============================================================================

/// CiNii Research batch fetcher and spreadsheet flattener
#[derive(Parser)]
#[command(name = "rustcinii")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Connection settings shared by the subcommands that call CiNii
#[derive(Args, Clone)]
struct ClientArgs {
    /// CiNii application ID
    #[arg(long, env = "CINII_APP_ID")]
    appid: Option<String>,

    /// API host (a mirror or a local mock)
    #[arg(long, env = "CINII_BASE_URL", default_value = CINII_BASE_URL)]
    base_url: String,

    /// Minimum milliseconds between requests
    #[arg(long, default_value = "1500")]
    interval_ms: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an OpenSearch query and append the result IDs to a list file
    Search {
        /// Search type: all, data, articles, books, dissertations, projects
        #[arg(long = "type", default_value = "articles")]
        search_type: String,

        /// Free keyword
        #[arg(long)]
        q: Option<String>,

        /// Creator name
        #[arg(long)]
        creator: Option<String>,

        /// Title words
        #[arg(long)]
        title: Option<String>,

        /// Affiliation
        #[arg(long)]
        affiliation: Option<String>,

        /// Journal title
        #[arg(long)]
        publication_title: Option<String>,

        /// Publication period start (YYYY or YYYYMM)
        #[arg(long)]
        from: Option<String>,

        /// Publication period end (YYYY or YYYYMM)
        #[arg(long)]
        until: Option<String>,

        /// Data source types (comma separated, e.g. "JALC,CROSSREF")
        #[arg(long, value_delimiter = ',')]
        data_source_type: Vec<String>,

        /// Resource types (comma separated)
        #[arg(long, value_delimiter = ',')]
        resource_type: Vec<String>,

        /// Response language
        #[arg(long, value_parser = ["ja", "en"])]
        lang: Option<String>,

        /// Sort order: 0 newest, 1 oldest, 4 relevance, 10 most cited
        #[arg(long)]
        sortorder: Option<u8>,

        /// Results per page: 20, 50, 100 or 200
        #[arg(long, default_value = "200")]
        count: u32,

        /// Start index of the first result (1-based, as CiNii counts)
        #[arg(long, default_value = "1")]
        offset: u32,

        /// Maximum results collected in this run
        #[arg(long, default_value = "10000")]
        batch_limit: u32,

        /// Keep only items with a Japanese title or creator
        #[arg(long)]
        japanese_only: bool,

        /// ID list file (appended)
        #[arg(long, default_value = "ids.txt")]
        ids_out: PathBuf,

        /// Raw OpenSearch items NDJSON (appended)
        #[arg(long)]
        items_out: Option<PathBuf>,

        #[command(flatten)]
        client: ClientArgs,
    },

    /// Fetch the JSON-LD record of every ID in a list file
    Fetch {
        /// ID list file
        ids: PathBuf,

        /// Records NDJSON (appended)
        #[arg(short, long, default_value = "records.ndjson")]
        output: PathBuf,

        /// Skip IDs already present in the output file
        #[arg(long)]
        resume: bool,

        /// Records buffered between writes
        #[arg(long, default_value = "100")]
        batch_size: usize,

        #[command(flatten)]
        client: ClientArgs,
    },

    /// Export records NDJSON to spreadsheets
    Export {
        /// Records NDJSON
        input: PathBuf,

        /// Record kind
        #[arg(long, default_value = "article", value_parser = ["article", "author"])]
        kind: String,

        /// Sheet layout
        #[arg(long, default_value = "relational", value_parser = ["relational", "onesheet", "labeled"])]
        layout: String,

        /// Table format
        #[arg(long, default_value = "xlsx", value_parser = ["xlsx", "csv"])]
        format: String,

        /// Warn instead of failing on columns missing from the allow-lists
        #[arg(long)]
        lenient: bool,

        /// Keep only articles linked to JAMAS
        #[arg(long)]
        medical_journal_only: bool,

        /// Also write the records with labeled keys as NDJSON
        #[arg(long)]
        labeled_json: bool,

        /// Output base name (default: input file stem)
        #[arg(long)]
        name: Option<String>,

        /// Output directory
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,
    },

    /// Build the article/author review sheets
    Authors {
        /// Article records NDJSON (author records NDJSON with --summary)
        input: PathBuf,

        /// "remote" to fetch creators from CiNii, or an author records NDJSON
        #[arg(long, default_value = "remote")]
        author_source: String,

        /// Input holds author records; list them without articles
        #[arg(long)]
        summary: bool,

        /// Keep only articles linked to JAMAS
        #[arg(long)]
        medical_journal_only: bool,

        /// Table format
        #[arg(long, default_value = "xlsx", value_parser = ["xlsx", "csv"])]
        format: String,

        /// Output base name (default: input file stem)
        #[arg(long)]
        name: Option<String>,

        /// Output directory
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,

        #[command(flatten)]
        client: ClientArgs,
    },

    /// Count property values across records
    Count {
        /// Records NDJSON
        input: PathBuf,

        /// Report base name (default: input file stem)
        #[arg(long)]
        name: Option<String>,

        /// Output directory
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,
    },
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .init();

    let outcome = match cli.command {
        Commands::Search {
            search_type,
            q,
            creator,
            title,
            affiliation,
            publication_title,
            from,
            until,
            data_source_type,
            resource_type,
            lang,
            sortorder,
            count,
            offset,
            batch_limit,
            japanese_only,
            ids_out,
            items_out,
            client,
        } => {
            let query = OpenSearchQuery {
                lang: lang.map(|l| l.parse()).transpose()?,
                sortorder: sortorder.map(SortOrder::try_from).transpose()?,
                q,
                creator,
                from,
                until,
                title,
                affiliation,
                publication_title,
                data_source_type,
                resource_type,
                ..Default::default()
            };
            let search = SearchArgs {
                search_type: search_type.parse()?,
                count: ItemsPerPage::try_from(count)?,
                offset,
                batch_limit,
                japanese_only,
                ids_out,
                items_out,
            };
            run_search(&client, &query, search).await
        }
        Commands::Fetch {
            ids,
            output,
            resume,
            batch_size,
            client,
        } => run_fetch(&client, &ids, &output, resume, batch_size).await,
        Commands::Export {
            input,
            kind,
            layout,
            format,
            lenient,
            medical_journal_only,
            labeled_json,
            name,
            output,
        } => {
            let export = ExportArgs {
                kind: kind.parse()?,
                layout,
                format: format.parse()?,
                policy: if lenient {
                    DriftPolicy::Warn
                } else {
                    DriftPolicy::Fail
                },
                medical_journal_only,
                labeled_json,
            };
            run_export(&input, export, name, &output)
        }
        Commands::Authors {
            input,
            author_source,
            summary,
            medical_journal_only,
            format,
            name,
            output,
            client,
        } => {
            run_authors(
                &client,
                &input,
                &author_source,
                summary,
                medical_journal_only,
                format.parse()?,
                name,
                &output,
            )
            .await
        }
        Commands::Count {
            input,
            name,
            output,
        } => run_count(&input, name, &output),
    };

    if let Err(e) = &outcome {
        error!(error = %e, "Command failed");
    }
    outcome
}

// ============================================================================
// Helpers
// ============================================================================

fn build_client(args: &ClientArgs) -> Result<CiniiClient> {
    let client = CiniiClient::with_base_url(&args.base_url, args.appid.clone())
        .context("Failed to create CiNii client")?
        .with_interval(Duration::from_millis(args.interval_ms));
    if args.appid.is_none() {
        warn!("No CiNii application ID set (CINII_APP_ID)");
    }
    Ok(client)
}

/// Timestamped folder under `output_dir`
fn output_folder(output_dir: &Path, name: &str) -> Result<PathBuf> {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let folder = output_dir.join(format!("{}_{}", timestamp, name));
    std::fs::create_dir_all(&folder).context("Failed to create output directory")?;
    println!("Output folder: {}", folder.display());
    Ok(folder)
}

fn base_name(input: &Path, name: Option<String>) -> String {
    name.unwrap_or_else(|| {
        input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "records".to_string())
    })
}

fn load_records(input: &Path, medical_journal_only: bool) -> Result<Vec<Value>> {
    let mut records = ndjson::read_records(input)
        .with_context(|| format!("Failed to read records from {}", input.display()))?;
    println!("Loaded {} records from {}", records.len(), input.display());

    if medical_journal_only {
        records.retain(aggregate::is_medical_journal);
        println!("Medical journal records: {}", records.len());
    }
    Ok(records)
}

/// Table output path: a workbook file for XLSX, a directory for CSV
fn table_path(folder: &Path, name: &str, format: TableFormat) -> PathBuf {
    match format {
        TableFormat::Xlsx => folder.join(format!("{}.xlsx", name)),
        TableFormat::Csv => folder.join(name),
    }
}

fn save_tables(folder: &Path, name: &str, format: TableFormat, tables: &[Table]) -> Result<()> {
    let path = table_path(folder, name, format);
    sink::write_tables(format, &path, tables)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Saved: {}", path.display());
    Ok(())
}

// ============================================================================
// Search
// ============================================================================

struct SearchArgs {
    search_type: SearchType,
    count: ItemsPerPage,
    offset: u32,
    batch_limit: u32,
    japanese_only: bool,
    ids_out: PathBuf,
    items_out: Option<PathBuf>,
}

async fn run_search(client_args: &ClientArgs, query: &OpenSearchQuery, args: SearchArgs) -> Result<()> {
    let client = build_client(client_args)?;
    let mut kept = 0usize;

    println!(
        "\n--- OpenSearch: {} (offset {}, limit {}) ---",
        args.search_type, args.offset, args.batch_limit
    );

    let batch = fetch_pages_with(
        &client,
        args.search_type,
        query,
        args.offset,
        args.count,
        args.batch_limit,
        |response| {
            let items: Vec<_> = response
                .items
                .iter()
                .filter(|item| !args.japanese_only || is_japanese_item(item))
                .collect();

            let ids: Vec<&str> = items.iter().map(|item| item.id.as_str()).collect();
            ndjson::append_ids(&args.ids_out, &ids)?;
            if let Some(path) = &args.items_out {
                ndjson::append_records(path, &items)?;
            }

            kept += items.len();
            println!(
                "Page start={}: {} items ({} kept), total {}",
                response.start_index,
                response.items.len(),
                items.len(),
                response.total_results
            );
            Ok(())
        },
    )
    .await
    .context("OpenSearch batch failed")?;

    let fetched = batch.items().count();
    println!("Fetched {} items, kept {}", fetched, kept);
    println!("IDs appended to {}", args.ids_out.display());
    match batch.next_offset {
        Some(next) => println!("More results remain; resume with --offset {}", next),
        None => println!("All results collected."),
    }
    Ok(())
}

// ============================================================================
// Fetch
// ============================================================================

async fn run_fetch(
    client_args: &ClientArgs,
    ids_path: &Path,
    output: &Path,
    resume: bool,
    batch_size: usize,
) -> Result<()> {
    let client = build_client(client_args)?;
    let mut ids = ndjson::read_id_list(ids_path)
        .with_context(|| format!("Failed to read ID list {}", ids_path.display()))?;

    if resume {
        let done = ndjson::existing_ids(output)?;
        let before = ids.len();
        ids.retain(|id| !done.contains(id));
        println!("Resume: {} of {} IDs already fetched", before - ids.len(), before);
    }

    println!("\n--- Fetching {} records ---", ids.len());

    let batch_size = batch_size.max(1);
    let mut buffer: Vec<Value> = Vec::with_capacity(batch_size);
    let mut written = 0usize;

    for (index, id) in ids.iter().enumerate() {
        let record = match client.record(id).await {
            Ok(record) => record,
            Err(e) => {
                ndjson::append_records(output, &buffer)?;
                written += buffer.len();
                println!("Stopped after {} records; rerun with --resume", written);
                return Err(e).with_context(|| format!("Failed to fetch {}", id));
            }
        };
        buffer.push(record);

        if buffer.len() >= batch_size {
            ndjson::append_records(output, &buffer)?;
            written += buffer.len();
            buffer.clear();
            println!("Fetched {}/{}", index + 1, ids.len());
        }
    }

    ndjson::append_records(output, &buffer)?;
    written += buffer.len();
    info!(written, path = %output.display(), "Fetch complete");
    println!("Saved {} records to {}", written, output.display());
    Ok(())
}

// ============================================================================
// Export
// ============================================================================

struct ExportArgs {
    kind: RecordKind,
    layout: String,
    format: TableFormat,
    policy: DriftPolicy,
    medical_journal_only: bool,
    labeled_json: bool,
}

fn run_export(input: &Path, args: ExportArgs, name: Option<String>, output_dir: &Path) -> Result<()> {
    let name = base_name(input, name);
    let records = load_records(input, args.medical_journal_only)?;
    let folder = output_folder(output_dir, &name)?;

    let tables = match args.layout.as_str() {
        "onesheet" => vec![tables::onesheet_table(args.kind, &records, args.policy)?],
        "labeled" => vec![labeled_table(&records)],
        _ => tables::build_tables(args.kind, &records, args.policy)?,
    };
    println!("Built {} sheet(s) for {} {}", tables.len(), records.len(), args.kind);

    save_tables(&folder, &name, args.format, &tables)?;

    if args.labeled_json {
        let path = folder.join(format!("{}_labeled.ndjson", name));
        sink::write_labeled_ndjson(&path, &records)?;
        println!("Saved: {}", path.display());
    }
    Ok(())
}

// ============================================================================
// Authors
// ============================================================================

#[allow(clippy::too_many_arguments)]
async fn run_authors(
    client_args: &ClientArgs,
    input: &Path,
    author_source: &str,
    summary: bool,
    medical_journal_only: bool,
    format: TableFormat,
    name: Option<String>,
    output_dir: &Path,
) -> Result<()> {
    let name = base_name(input, name);
    let records = load_records(input, medical_journal_only && !summary)?;
    let folder = output_folder(output_dir, &name)?;

    if summary {
        let table = aggregate::author_summary_table(&records)?;
        return save_tables(&folder, &name, format, &[table]);
    }

    println!("\n--- Aggregating authors ({}) ---", author_source);
    let results: AggregateResults = if author_source == "remote" {
        let client = build_client(client_args)?;
        aggregate::aggregate(&records, &RemoteCreators::new(&client)).await?
    } else {
        let authors = ndjson::read_records(Path::new(author_source))
            .with_context(|| format!("Failed to read author records from {}", author_source))?;
        aggregate::aggregate(&records, &LocalCreators::new(authors)).await?
    };

    println!(
        "Rows: {} all, {} with authors, {} with affiliations",
        results.all.len(),
        results.ignore_no_author.len(),
        results.ignore_no_author_and_no_affiliation.len()
    );

    let variants = [
        (name.clone(), &results.all),
        (format!("{}_ignore_no_author", name), &results.ignore_no_author),
        (
            format!("{}_ignore_no_author_and_no_affiliation", name),
            &results.ignore_no_author_and_no_affiliation,
        ),
    ];
    for (file_name, rows) in variants {
        save_tables(&folder, &file_name, format, &[aggregate::aggregate_table(rows)])?;
    }
    Ok(())
}

// ============================================================================
// Count
// ============================================================================

fn run_count(input: &Path, name: Option<String>, output_dir: &Path) -> Result<()> {
    let name = base_name(input, name);
    let records = load_records(input, false)?;
    let folder = output_folder(output_dir, &name)?;

    let report = CountReport::from_records(&records);
    let path = folder.join(format!("{}.json", name));
    report
        .write(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!(
        "Counted {} shallow and {} deep properties",
        report.shallow.len(),
        report.deep.len()
    );
    println!("Saved: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_offset_starts_at_one() -> Result<()> {
        let cli = Cli::try_parse_from(["rustcinii", "search", "--q", "がん"])?;
        match cli.command {
            Commands::Search { offset, count, .. } => {
                assert_eq!(offset, 1);
                assert_eq!(count, 200);
            }
            _ => panic!("expected search"),
        }
        Ok(())
    }
}
