// ABOUTME: blogport command line: scrapes a list of blog post URLs and writes WXR, JSON, CSV and link exports.
// ABOUTME: Also extracts a single saved HTML page with --html/--url for offline checks.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use blogport_export::{
    analyze_links, write_csv, write_json, write_link_dump, write_wxr, ExportOptions,
};
use blogport_extract::{
    DuplicatePolicy, Extractor, PostRecord, RunReport, RunSummary, SelectorTable, StopList,
};
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use url::Url;

const XML_FILE: &str = "blog_posts.xml";
const JSON_FILE: &str = "blog_posts.json";
const CSV_FILE: &str = "blog_posts.csv";
const LINKS_FILE: &str = "extracted_links.txt";
const IMAGES_DIR: &str = "images";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Xml,
    Json,
    Csv,
    All,
}

impl Format {
    fn includes(self, other: Format) -> bool {
        self == Format::All || self == other
    }
}

/// Scrape blog posts and export them for a WordPress import.
#[derive(Parser, Debug)]
#[command(name = "blogport", version)]
#[command(about = "Scrape blog posts from any platform and export them as WordPress WXR", long_about = None)]
struct Args {
    /// Post URLs. When given, --urls is ignored.
    targets: Vec<String>,

    /// File with one URL per line; blank lines and # comments are skipped.
    #[arg(long = "urls", value_name = "FILE", default_value = "urls.txt")]
    urls_file: PathBuf,

    /// Extract a saved HTML page instead of fetching.
    #[arg(long, value_name = "FILE", requires = "url")]
    html: Option<PathBuf>,

    /// Page URL of the --html file.
    #[arg(long, value_name = "URL", requires = "html")]
    url: Option<String>,

    /// Output directory.
    #[arg(short, long, value_name = "DIR", default_value = "output")]
    output: PathBuf,

    #[arg(long, value_enum, default_value_t = Format::Xml)]
    format: Format,

    /// Seconds to wait between requests when running sequentially.
    #[arg(long, value_name = "SECS", default_value_t = 2.0)]
    delay: f64,

    #[arg(long, default_value_t = 3)]
    retries: u32,

    /// Request timeout in seconds.
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    timeout: u64,

    /// Number of pages fetched at once.
    #[arg(long, value_name = "N", default_value_t = 1)]
    concurrent: usize,

    /// Write links to the site's own host as root-relative paths.
    #[arg(long)]
    relative_links: bool,

    /// Drop images from the post content.
    #[arg(long)]
    no_images: bool,

    /// Keep remote image URLs instead of downloading the files.
    #[arg(long)]
    no_download_images: bool,

    /// Export posts with repeated content too.
    #[arg(long)]
    keep_duplicates: bool,

    /// JSON selector table replacing the built-in one.
    #[arg(long, value_name = "FILE")]
    selectors: Option<PathBuf>,

    /// Category/tag stop terms, one per line.
    #[arg(long, value_name = "FILE")]
    stop_terms: Option<PathBuf>,

    /// Find/replace applied to the XML export, e.g. old.com=new.com. Repeatable.
    #[arg(long = "replace", value_name = "FIND=REPLACE", value_parser = parse_replacement)]
    replacements: Vec<(String, String)>,

    /// Channel title of the WXR export.
    #[arg(long, default_value = "Imported Blog")]
    site_title: String,

    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    #[arg(short, long)]
    quiet: bool,
}

fn parse_replacement(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((find, replace)) if !find.is_empty() => Ok((find.to_string(), replace.to_string())),
        _ => Err(format!("expected FIND=REPLACE, got {:?}", raw)),
    }
}

fn init_tracing(args: &Args) {
    let level = if args.verbose {
        "debug"
    } else if args.quiet {
        "warn"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Keeps http(s) URLs, skipping blanks and `#` comments.
fn filter_urls<'a>(lines: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut urls = Vec::new();
    for (n, line) in lines.into_iter().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match Url::parse(line) {
            Ok(u) if matches!(u.scheme(), "http" | "https") => urls.push(line.to_string()),
            _ => warn!(line = n + 1, value = line, "skipping invalid URL"),
        }
    }
    urls
}

fn read_url_file(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading URL list {}", path.display()))?;
    Ok(filter_urls(text.lines()))
}

fn build_extractor(args: &Args) -> Result<Extractor> {
    let policy = if args.keep_duplicates {
        DuplicatePolicy::Include
    } else {
        DuplicatePolicy::Skip
    };
    let mut builder = Extractor::builder()
        .timeout(Duration::from_secs(args.timeout))
        .retries(args.retries)
        .delay(Duration::from_secs_f64(args.delay.max(0.0)))
        .concurrency(args.concurrent)
        .include_images(!args.no_images)
        .duplicate_policy(policy);

    if !args.no_images && !args.no_download_images {
        builder = builder.image_dir(args.output.join(IMAGES_DIR));
    }
    if let Some(path) = &args.selectors {
        let json = fs::read_to_string(path)
            .with_context(|| format!("reading selector table {}", path.display()))?;
        let table = SelectorTable::from_json(&json)
            .with_context(|| format!("parsing selector table {}", path.display()))?;
        builder = builder.selectors(table);
    }
    if let Some(path) = &args.stop_terms {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading stop terms {}", path.display()))?;
        builder = builder.stop_list(StopList::from_lines(&text));
    }
    Ok(builder.build())
}

async fn extract_saved_page(extractor: &Extractor, path: &Path, url: &str) -> Result<RunReport> {
    let html =
        fs::read_to_string(path).with_context(|| format!("reading HTML file {}", path.display()))?;
    let record = match extractor.extract_html(url, &html).await {
        Ok(record) => record,
        Err(err) => {
            warn!(url, error = %err, "post failed");
            PostRecord::failed(url, &err)
        }
    };
    let posts = vec![record];
    let summary = RunSummary::from_posts(&posts, extractor.images_downloaded());
    Ok(RunReport { posts, summary })
}

async fn scrape(extractor: &Extractor, urls: &[String], quiet: bool) -> Result<RunReport> {
    if quiet {
        return Ok(extractor.run(urls).await);
    }
    let pb = ProgressBar::new(urls.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} {wide_msg}")?
            .progress_chars("=> "),
    );
    let progress = pb.clone();
    let report = extractor
        .run_with(urls, move |url| {
            progress.set_message(url.to_string());
            progress.inc(1);
        })
        .await;
    pb.finish_and_clear();
    Ok(report)
}

fn export(args: &Args, report: &RunReport, policy: DuplicatePolicy) -> Result<()> {
    let opts = ExportOptions {
        site_title: args.site_title.clone(),
        relative_links: args.relative_links,
        duplicate_policy: policy,
        replacements: args.replacements.clone(),
        ..ExportOptions::default()
    };
    let out = &args.output;

    if args.format.includes(Format::Xml) {
        let path = out.join(XML_FILE);
        write_wxr(&path, &report.posts, &opts)
            .with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), "wrote WXR export");
    }
    if args.format.includes(Format::Json) {
        let path = out.join(JSON_FILE);
        write_json(&path, &report.posts, &opts)
            .with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), "wrote JSON export");
    }
    if args.format.includes(Format::Csv) {
        let path = out.join(CSV_FILE);
        write_csv(&path, &report.posts, &opts)
            .with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), "wrote CSV export");
    }
    let path = out.join(LINKS_FILE);
    write_link_dump(&path, &report.posts, policy)
        .with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), "wrote link dump");

    let analysis = analyze_links(&report.posts, policy);
    info!(
        total = analysis.total,
        internal = analysis.internal,
        external = analysis.external,
        "link analysis"
    );
    for host in &analysis.hosts {
        debug!(host = %host.host, count = host.count, "linked host");
    }
    Ok(())
}

/// Runs the whole job; `Ok(true)` when every URL succeeded.
async fn run(args: Args) -> Result<bool> {
    fs::create_dir_all(&args.output)
        .with_context(|| format!("creating output directory {}", args.output.display()))?;
    let extractor = build_extractor(&args)?;

    let report = match (&args.html, &args.url) {
        (Some(path), Some(url)) => extract_saved_page(&extractor, path, url).await?,
        _ => {
            let urls = if args.targets.is_empty() {
                read_url_file(&args.urls_file)?
            } else {
                filter_urls(args.targets.iter().map(String::as_str))
            };
            if urls.is_empty() {
                bail!("no valid URLs to process");
            }
            scrape(&extractor, &urls, args.quiet).await?
        }
    };

    export(&args, &report, extractor.duplicate_policy())?;
    eprintln!("{}", report.summary);
    Ok(report.summary.all_succeeded())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) if err.use_stderr() => {
            let _ = err.print();
            return ExitCode::FAILURE;
        }
        Err(err) => err.exit(),
    };
    init_tracing(&args);

    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn args_are_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn replacement_pairs() {
        assert_eq!(
            parse_replacement("old.com=new.com"),
            Ok(("old.com".to_string(), "new.com".to_string()))
        );
        assert_eq!(
            parse_replacement("a=b=c"),
            Ok(("a".to_string(), "b=c".to_string()))
        );
        assert_eq!(parse_replacement("x="), Ok(("x".to_string(), String::new())));
        assert!(parse_replacement("=x").is_err());
        assert!(parse_replacement("nothing").is_err());
    }

    #[test]
    fn url_list_skips_comments_and_bad_lines() {
        let text = "# posts\n\nhttps://a.com/1\n  http://a.com/2  \nftp://a.com/3\nnot a url\n";
        assert_eq!(
            filter_urls(text.lines()),
            vec!["https://a.com/1".to_string(), "http://a.com/2".to_string()]
        );
    }

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["blogport"]).unwrap();
        assert_eq!(args.urls_file, PathBuf::from("urls.txt"));
        assert_eq!(args.output, PathBuf::from("output"));
        assert_eq!(args.format, Format::Xml);
        assert_eq!(args.delay, 2.0);
        assert_eq!(args.retries, 3);
        assert_eq!(args.timeout, 30);
        assert_eq!(args.concurrent, 1);
        assert_eq!(args.site_title, "Imported Blog");
    }

    #[test]
    fn html_needs_url() {
        assert!(Args::try_parse_from(["blogport", "--html", "page.html"]).is_err());
        assert!(Args::try_parse_from([
            "blogport",
            "--html",
            "page.html",
            "--url",
            "https://a.com/p"
        ])
        .is_ok());
    }

    #[test]
    fn format_all_includes_everything() {
        assert!(Format::All.includes(Format::Csv));
        assert!(Format::Json.includes(Format::Json));
        assert!(!Format::Json.includes(Format::Xml));
    }
}
