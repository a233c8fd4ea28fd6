use anyhow::{Context, Result};
use backend_client::BackendClient;
use clap::{Parser, Subcommand};
use form_editor_core::{flatten, DocumentLayout, FormDocument, PageRasterCache, Scale};
use pdf_engine::{default_engine, OpenSource, PdfEngine, RasterRequest};
use serde::Serialize;
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "form-editor-cli")]
#[command(about = "PDF form editor CLI")]
pub struct Cli {
    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print machine-readable PDF metadata.
    Info {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Rasterize one page to a PNG.
    Render {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(long, default_value_t = 1)]
        page: u16,
        #[arg(long, default_value_t = 1.0)]
        scale: f32,
        #[arg(long)]
        output: PathBuf,
    },
    /// Apply a saved field layout and flatten to a new PDF file.
    Flatten {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(long)]
        layout: Option<PathBuf>,
        #[arg(long)]
        output: PathBuf,
    },
    /// Flatten through the in-memory preview path and write the bytes out.
    Preview {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(long)]
        layout: Option<PathBuf>,
        #[arg(long)]
        output: PathBuf,
    },
    /// List documents stored on the server.
    List {
        #[arg(long)]
        server: String,
    },
    /// Upload a PDF, optionally with a field layout.
    Push {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(long)]
        server: String,
        #[arg(long)]
        layout: Option<PathBuf>,
        /// Name to store on the server; defaults to the file name.
        #[arg(long)]
        name: Option<String>,
    },
    /// Download a stored PDF and its layout to local files.
    Pull {
        #[arg(value_name = "ID")]
        id: String,
        #[arg(long)]
        server: String,
        #[arg(long)]
        output: PathBuf,
        #[arg(long)]
        layout_output: Option<PathBuf>,
    },
    /// Delete a stored document.
    Delete {
        #[arg(value_name = "ID")]
        id: String,
        #[arg(long)]
        server: String,
    },
    /// Print CLI version.
    Version,
}

#[derive(Debug, Serialize)]
struct InfoOutput {
    path: String,
    page_count: u16,
    pages: Vec<PageSizeOutput>,
    field_count: usize,
}

#[derive(Debug, Serialize)]
struct PageSizeOutput {
    width: f32,
    height: f32,
}

#[derive(Debug, Serialize)]
struct ListOutput {
    id: String,
    name: String,
    created_at: Option<String>,
}

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);
    init_logging(cli.verbose);

    match cli.command {
        Commands::Info { file } => run_info(&file),
        Commands::Render { file, page, scale, output } => {
            run_render(&file, page, scale, &output)
        }
        Commands::Flatten { file, layout, output } => {
            run_flatten(&file, layout.as_deref(), &output, false)
        }
        Commands::Preview { file, layout, output } => {
            run_flatten(&file, layout.as_deref(), &output, true)
        }
        Commands::List { server } => run_list(&server),
        Commands::Push { file, server, layout, name } => {
            run_push(&file, &server, layout.as_deref(), name)
        }
        Commands::Pull { id, server, output, layout_output } => {
            run_pull(&id, &server, &output, layout_output.as_deref())
        }
        Commands::Delete { id, server } => run_delete(&id, &server),
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Warn };
    let _ = TermLogger::init(level, Config::default(), TerminalMode::Stderr, ColorChoice::Auto);
}

fn run_info(file: &Path) -> Result<()> {
    let (_engine, document) = open_document(file)?;

    let payload = InfoOutput {
        path: file.display().to_string(),
        page_count: document.page_count(),
        pages: document
            .pages()
            .iter()
            .map(|page| PageSizeOutput { width: page.size.width_pt, height: page.size.height_pt })
            .collect(),
        field_count: document.fields().total_count(),
    };

    let json = serde_json::to_string_pretty(&payload)?;
    println!("{json}");

    Ok(())
}

fn run_render(file: &Path, page: u16, scale: f32, output: &Path) -> Result<()> {
    ensure_pdf_exists(file)?;

    if page == 0 {
        anyhow::bail!("--page is 1-based and must be >= 1");
    }

    let mut engine = default_engine();
    let handle = engine.open(OpenSource::from(file)).context("failed to open PDF")?;

    let image = engine
        .render_page(handle, RasterRequest::new(u32::from(page) - 1, scale))
        .context("failed to render page")?;

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    image
        .save(output)
        .with_context(|| format!("failed to write image to {}", output.display()))?;

    println!("{}", output.display());

    engine.close(handle)?;

    Ok(())
}

fn run_flatten(file: &Path, layout: Option<&Path>, output: &Path, preview: bool) -> Result<()> {
    let (engine, mut document) = open_document(file)?;

    if let Some(layout_path) = layout {
        document.load_layout(read_layout(layout_path)?);
    }

    let mut rasters = PageRasterCache::new(Scale::default());

    if preview {
        let bytes = flatten::flatten_to_bytes(&document, &mut rasters, &engine)
            .context("failed to flatten document")?;
        fs::write(output, bytes)
            .with_context(|| format!("failed to write {}", output.display()))?;
    } else {
        rasters.render_all(&engine, &document);
        flatten::flatten_to_file(&document, &rasters, output)
            .context("failed to flatten document")?;
    }

    println!("{}", output.display());

    Ok(())
}

fn run_list(server: &str) -> Result<()> {
    let client = BackendClient::new(server)?;
    let documents: Vec<ListOutput> = client
        .list()
        .context("failed to list documents")?
        .into_iter()
        .map(|summary| ListOutput {
            id: summary.id,
            name: summary.name,
            created_at: summary.created_at,
        })
        .collect();

    let json = serde_json::to_string_pretty(&documents)?;
    println!("{json}");

    Ok(())
}

fn run_push(file: &Path, server: &str, layout: Option<&Path>, name: Option<String>) -> Result<()> {
    ensure_pdf_exists(file)?;

    let bytes = fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
    let name = name.unwrap_or_else(|| {
        file.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
    });

    let client = BackendClient::new(server)?;
    let uploaded = client.upload(&name, bytes).context("failed to upload PDF")?;

    if let Some(layout_path) = layout {
        let layout = read_layout(layout_path)?;
        client.save_fields(&uploaded.id, &layout).context("failed to save field layout")?;
    }

    println!("{}", uploaded.id);

    Ok(())
}

fn run_pull(id: &str, server: &str, output: &Path, layout_output: Option<&Path>) -> Result<()> {
    let client = BackendClient::new(server)?;

    let bytes = client.download(id).context("failed to download PDF")?;
    fs::write(output, bytes).with_context(|| format!("failed to write {}", output.display()))?;
    println!("{}", output.display());

    if let Some(layout_path) = layout_output {
        let info = client.info(id).context("failed to fetch field layout")?;
        let json = serde_json::to_string_pretty(&info.layout)?;
        fs::write(layout_path, json)
            .with_context(|| format!("failed to write {}", layout_path.display()))?;
        println!("{}", layout_path.display());
    }

    Ok(())
}

fn run_delete(id: &str, server: &str) -> Result<()> {
    let client = BackendClient::new(server)?;
    client.delete(id).context("failed to delete document")?;
    println!("deleted {id}");

    Ok(())
}

/// Open a document together with the engine that holds it; the engine must
/// stay alive for as long as the document's handle is used.
fn open_document(file: &Path) -> Result<(pdf_engine::LopdfEngine, FormDocument)> {
    ensure_pdf_exists(file)?;

    let bytes = fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
    let mut engine = default_engine();
    let document = FormDocument::open(&mut engine, bytes).context("failed to open PDF")?;
    Ok((engine, document))
}

fn read_layout(path: &Path) -> Result<DocumentLayout> {
    let json =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("invalid layout in {}", path.display()))
}

fn ensure_pdf_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("file does not exist: {}", path.display());
    }

    if !path.is_file() {
        anyhow::bail!("path is not a file: {}", path.display());
    }

    Ok(())
}
