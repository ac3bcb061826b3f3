use clap::{Parser, Subcommand};
use cellmask::{
    CommandOutput, InMemoryNavigator, NoReferenceCounts, Outcome, RecordingPersistence,
    ReferenceCounts, Session, SessionCommand, SessionConfig, StaticReferenceCounts,
};
use cli::{AnnotatorConfig, CommandScript, CsvReferenceCounts, DirectoryNavigator, FsPersistence, load_image};
use color_eyre::eyre::{Result, eyre};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the configured commands over every image and save the routed masks
    Process {
        /// Path to the TOML or JSON configuration file
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Apply a command script to one image and print its regions as JSON
    Inspect {
        /// Image to inspect
        #[arg(short, long)]
        image: PathBuf,
        /// Optional TOML or JSON command script
        #[arg(short, long)]
        script: Option<PathBuf>,
        /// Write the source with region borders highlighted here
        #[arg(short, long)]
        overlay: Option<PathBuf>,
    },
    /// Print the JSON schema of the command language
    Schema {
        /// Print the configuration file schema instead
        #[arg(long)]
        config: bool,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Process { config } => {
            process_directory(config)?;
        }
        Commands::Inspect { image, script, overlay } => {
            inspect_image(image, script.as_deref(), overlay.as_deref())?;
        }
        Commands::Schema { config } => {
            let schema = if *config {
                serde_json::to_string_pretty(&AnnotatorConfig::schema())?
            } else {
                serde_json::to_string_pretty(&SessionCommand::schema())?
            };
            println!("{}", schema);
        }
    }

    Ok(())
}

/// Tally of where masks were routed.
#[derive(Debug, Default)]
struct Summary {
    matched: usize,
    mismatched: usize,
    no_reference: usize,
}

fn process_directory(config_path: &Path) -> Result<()> {
    let config = AnnotatorConfig::from_file(config_path)?;
    info!("Annotating {:?} into {:?}", config.source_dir, config.destination_dir);

    let references: Box<dyn ReferenceCounts> = match &config.reference_file {
        Some(path) => Box::new(CsvReferenceCounts::from_file(path)?),
        None => {
            warn!("No reference file configured; every mask is saved unvalidated");
            Box::new(NoReferenceCounts)
        }
    };

    // Saving is explicit here, so navigation must not autosave as well.
    let mut session_config = config.session.clone();
    let save_original = session_config.autosave.save_original;
    session_config.autosave.enabled = false;

    let navigator = DirectoryNavigator::open(&config.source_dir)?;
    if navigator.is_empty() {
        return Err(eyre!("No supported images in {:?}", config.source_dir));
    }
    let mut session = Session::new(
        navigator,
        references,
        FsPersistence::new(&config.destination_dir),
        session_config,
    );

    let mut summary = Summary::default();
    session.open_current()?;
    for index in 0..session.image_count() {
        if index > 0 {
            session.select_image(&index.to_string())?;
        }

        for command in &config.commands {
            if command.is_navigation() {
                warn!("Skipping '{}': navigation is driven by the directory", command);
                continue;
            }
            let output = session.execute(command.clone())?;
            info!("{} -> {}", command, serde_json::to_string(&output)?);
        }

        if save_original {
            session.save_source_image("")?;
        }
        match session.save_preview_mask("", None)? {
            Some(decision) => match decision.outcome {
                Outcome::Matched => summary.matched += 1,
                Outcome::Mismatched => summary.mismatched += 1,
                Outcome::NoReference => summary.no_reference += 1,
            },
            None => warn!("Image {} could not be loaded", index),
        }
    }

    info!(
        "Annotation completed: {} matched, {} mismatched, {} without reference",
        summary.matched, summary.mismatched, summary.no_reference
    );
    Ok(())
}

fn inspect_image(image_path: &Path, script: Option<&Path>, overlay: Option<&Path>) -> Result<()> {
    let script = match script {
        Some(path) => CommandScript::from_file(path)?,
        None => CommandScript::default(),
    };

    let mut session = Session::new(
        InMemoryNavigator::new(vec![load_image(image_path)?]),
        StaticReferenceCounts::new(),
        RecordingPersistence::default(),
        SessionConfig::default(),
    );
    session.open_current()?;

    let mut seeds = Vec::new();
    for command in script.commands {
        if let SessionCommand::GrowRegion { seeds: grown, .. } = &command {
            seeds.extend_from_slice(grown);
        }
        match session.execute(command)? {
            CommandOutput::Applied(false) => warn!("A command was skipped"),
            output => info!("{}", serde_json::to_string(&output)?),
        }
    }

    let contours = session.native_contours()?;
    println!("{}", serde_json::to_string_pretty(&contours)?);

    if let Some(path) = overlay {
        let canvas = session
            .overlay(&seeds)?
            .ok_or_else(|| eyre!("No image loaded"))?;
        canvas.save(path)?;
        info!("Overlay written to {:?}", path);
    }

    Ok(())
}
