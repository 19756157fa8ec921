//! BSP command-line runner: simulated acquisition → configured pipeline

mod report;

use anyhow::{anyhow, Context, Result};
use bsp_core::{Biosignal, BiosignalKind, PrecisionTimestamp, SourceOptions};
use bsp_pipeline::PipelineConfig;
use bsp_simulation::{SignalPattern, SimulatedSource, SimulationConfig};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "bsp-cli", author, version, about = "Biosignal processing pipelines")]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Read a simulated recording and run a pipeline over it
    Run {
        /// Pipeline configuration (JSON)
        #[arg(short, long)]
        pipeline: PathBuf,

        #[command(flatten)]
        acquisition: Acquisition,
    },
    /// Assemble a pipeline without running it
    Check {
        /// Pipeline configuration (JSON)
        #[arg(short, long)]
        pipeline: PathBuf,
    },
    /// Print a simulated recording
    Simulate {
        #[command(flatten)]
        acquisition: Acquisition,
    },
}

#[derive(Args, Debug)]
struct Acquisition {
    /// Simulation configuration (JSON); defaults apply when omitted
    #[arg(short, long)]
    simulation: Option<PathBuf>,

    /// Source options (JSON): channel labels, body locations, device id
    #[arg(long)]
    source_options: Option<PathBuf>,

    /// Channel type to acquire
    #[arg(short, long, value_enum, default_value = "ecg")]
    kind: KindArg,

    /// Recording location passed to the source
    #[arg(long, default_value = "session")]
    location: PathBuf,

    /// Where the recording was made, e.g. "Lab 2" or "home"
    #[arg(long)]
    acquisition_location: Option<String>,

    /// Start of the first acquisition (RFC 3339), overriding the simulation config
    #[arg(long)]
    start: Option<String>,

    /// Named waveform preset, overriding the simulation config pattern
    #[arg(long)]
    preset: Option<String>,

    /// Biosignal name
    #[arg(long)]
    name: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum KindArg {
    Ecg,
    Eda,
    Emg,
    Acc,
    Ppg,
    Resp,
}

impl From<KindArg> for BiosignalKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Ecg => BiosignalKind::ECG,
            KindArg::Eda => BiosignalKind::EDA,
            KindArg::Emg => BiosignalKind::EMG,
            KindArg::Acc => BiosignalKind::ACC,
            KindArg::Ppg => BiosignalKind::PPG,
            KindArg::Resp => BiosignalKind::RESP,
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt().with_env_filter(filter).init();
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn load_pipeline_config(path: &Path) -> Result<PipelineConfig> {
    let json = read_file(path)?;
    PipelineConfig::from_json(&json).with_context(|| format!("parsing {}", path.display()))
}

impl Acquisition {
    fn simulation_config(&self) -> Result<SimulationConfig> {
        let mut config = match &self.simulation {
            Some(path) => serde_json::from_str::<SimulationConfig>(&read_file(path)?)
                .with_context(|| format!("parsing {}", path.display()))?,
            None => SimulationConfig::default(),
        };

        if let Some(start) = &self.start {
            config.start = PrecisionTimestamp::parse_rfc3339(start)
                .with_context(|| format!("invalid start time '{}'", start))?;
        }

        if let Some(name) = &self.preset {
            let pattern = SignalPattern::preset(name).ok_or_else(|| {
                let known: Vec<&str> = SignalPattern::presets().iter().map(|(n, _)| *n).collect();
                anyhow!("unknown preset '{}', expected one of: {}", name, known.join(", "))
            })?;
            info!(preset = %name, pattern = pattern.description(), "using waveform preset");
            config.pattern = Some(pattern);
        }

        Ok(config)
    }

    fn acquire(&self) -> Result<Biosignal> {
        let config = self.simulation_config()?;
        let options = match &self.source_options {
            Some(path) => serde_json::from_str::<SourceOptions>(&read_file(path)?)
                .with_context(|| format!("parsing {}", path.display()))?,
            None => SourceOptions::default(),
        };

        let source = SimulatedSource::new(config).context("invalid simulation configuration")?;
        let mut biosignal = Biosignal::from_source(&source, &self.location, self.kind.into(), &options)?;

        if let Some(location) = &self.acquisition_location {
            biosignal = biosignal.with_acquisition_location(location.clone());
        }
        if let Some(name) = &self.name {
            biosignal = biosignal.with_name(name.clone());
        }
        Ok(biosignal)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.cmd {
        Commands::Run { pipeline, acquisition } => {
            let config = load_pipeline_config(&pipeline)?;
            let mut pipeline = config.build().context("assembling pipeline")?;
            let biosignal = acquisition.acquire()?;
            info!(biosignal = biosignal.name(), units = pipeline.len(), "running pipeline");

            pipeline.load(vec![biosignal])?;
            match pipeline.apply_all().context("running pipeline")? {
                Some(packet) => print!("{}", report::packet(packet)),
                None => println!("Pipeline has no units"),
            }
        }
        Commands::Check { pipeline } => {
            let config = load_pipeline_config(&pipeline)?;
            let assembled = config.build().context("assembling pipeline")?;
            println!("Pipeline '{}' is valid: {}", config.name, assembled.unit_names().join(" -> "));
            println!("{}", config.to_json()?);
        }
        Commands::Simulate { acquisition } => {
            let biosignal = acquisition.acquire()?;
            print!("{}", report::biosignal(&biosignal));
        }
    }

    Ok(())
}
