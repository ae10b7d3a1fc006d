//! linkae - train and evaluate learned AWGN autoencoders
//!
//! ```text
//! linkae config > link.json
//! linkae --config link.json train --mode rl
//! linkae --config link.json evaluate --csv ber.csv
//! linkae --require-gpu benchmark --sizes 1024,4096
//! ```

use burn::module::AutodiffModule;
use burn::tensor::backend::AutodiffBackend;
use clap::{Parser, Subcommand, ValueEnum};
use linkae_core::config::LinkConfig;
use linkae_core::observe::{init_logging, LogConfig, LogFormat};
use linkae_core::report::{BerReport, TrainingReport};
use linkae_core::simulation::{simulate_ber, BaselineLink, LinkSimulator, SweepConfig};
use linkae_core::source::RandomSource;
use linkae_core::types::{LinkError, LinkResult};
use linkae_train::bench::{matmul_benchmark, timing_table};
use linkae_train::checkpoint::{load_weights, save_weights, weights_exist};
use linkae_train::device::{cpu_device, select_device, DeviceChoice, TrainBackend};
use linkae_train::{Autoencoder, ConventionalTrainer, RlTrainer, TrainedLink, TrainingHistory};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "linkae", version, about = "Learned AWGN autoencoder: training and BER evaluation")]
struct Cli {
    /// JSON configuration file (defaults are used for missing fields)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log output format: pretty, compact or json
    #[arg(long, global = true, default_value = "pretty")]
    log_format: LogFormat,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Abort unless an accelerator backend is available
    #[arg(long, global = true)]
    require_gpu: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train the autoencoder and write its weights
    Train {
        #[arg(long, value_enum, default_value_t = Mode::Rl)]
        mode: Mode,
        /// Also write the training report as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// BER/BLER sweep of the baseline and every trained model on disk
    Evaluate {
        /// Write all curves as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Write the full report as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Time square matrix products on the selected backend
    Benchmark {
        #[arg(long, value_delimiter = ',', default_values_t = [256usize, 512, 1024, 2048])]
        sizes: Vec<usize>,
        #[arg(long, default_value_t = 10)]
        repeats: usize,
    },
    /// Print the default configuration as JSON
    Config,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Conventional,
    Rl,
    Both,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(&LogConfig::from_verbosity(cli.verbose, cli.log_format));

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, fatal = e.is_fatal_at_startup(), "linkae failed");
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: Option<&Path>) -> LinkResult<LinkConfig> {
    match path {
        Some(path) => LinkConfig::from_json_file(path),
        None => {
            let config = LinkConfig::default();
            config.validate()?;
            Ok(config)
        }
    }
}

fn run(cli: &Cli) -> LinkResult<()> {
    if let Command::Config = cli.command {
        println!("{}", LinkConfig::default().to_json_pretty()?);
        return Ok(());
    }

    let config = load_config(cli.config.as_deref())?;
    let choice = select_device(cli.require_gpu || config.require_accelerator)?;
    match choice {
        DeviceChoice::Cpu => dispatch::<TrainBackend>(cli, &config, &cpu_device(), choice),
        DeviceChoice::Gpu => dispatch_gpu(cli, &config, choice),
    }
}

#[cfg(feature = "gpu")]
fn dispatch_gpu(cli: &Cli, config: &LinkConfig, choice: DeviceChoice) -> LinkResult<()> {
    let device = burn::backend::wgpu::WgpuDevice::default();
    dispatch::<linkae_train::device::GpuBackend>(cli, config, &device, choice)
}

#[cfg(not(feature = "gpu"))]
fn dispatch_gpu(_cli: &Cli, _config: &LinkConfig, _choice: DeviceChoice) -> LinkResult<()> {
    Err(LinkError::AcceleratorUnavailable("built without the `gpu` feature".into()))
}

fn dispatch<B: AutodiffBackend>(
    cli: &Cli,
    config: &LinkConfig,
    device: &B::Device,
    choice: DeviceChoice,
) -> LinkResult<()> {
    match &cli.command {
        Command::Train { mode, report } => {
            let mut reports = Vec::new();
            if matches!(mode, Mode::Conventional | Mode::Both) {
                reports.push(train_conventional::<B>(config, device, choice)?);
            }
            if matches!(mode, Mode::Rl | Mode::Both) {
                reports.push(train_rl::<B>(config, device, choice)?);
            }
            for r in &reports {
                println!("{}", r.to_text());
            }
            if let Some(path) = report {
                let json = serde_json::to_string_pretty(&reports)?;
                std::fs::write(path, json)?;
            }
            Ok(())
        }
        Command::Evaluate { csv, json } => {
            let report = evaluate::<B>(config, device)?;
            println!("{}", report.to_text());
            if let Some(path) = csv {
                std::fs::write(path, report.to_csv())?;
            }
            if let Some(path) = json {
                std::fs::write(path, report.to_json())?;
            }
            Ok(())
        }
        Command::Benchmark { sizes, repeats } => {
            tracing::info!(backend = %choice, ?sizes, repeats, "matmul benchmark");
            let timings = matmul_benchmark::<B>(sizes, *repeats, device);
            println!("Backend: {}\n{}", choice, timing_table(&timings));
            Ok(())
        }
        Command::Config => Ok(()),
    }
}

fn training_report(mode: &str, choice: DeviceChoice, path: &Path, history: &TrainingHistory) -> TrainingReport {
    let mut report = TrainingReport::new(mode, choice.label(), &path.display().to_string());
    report.iterations = history.iterations;
    report.receiver_updates = history.receiver_updates;
    report.transmitter_updates = history.transmitter_updates;
    report.final_loss = history.final_loss();
    report.final_transmitter_loss = history.final_transmitter_loss();
    report.elapsed_sec = history.elapsed_sec;
    report
}

fn train_conventional<B: AutodiffBackend>(
    config: &LinkConfig,
    device: &B::Device,
    choice: DeviceChoice,
) -> LinkResult<TrainingReport> {
    B::seed(config.seed);
    let model = Autoencoder::<B>::new(config, device);
    let mut trainer = ConventionalTrainer::new(config, RandomSource::seeded(config.seed));
    let (model, history) = trainer.fit(model)?;
    save_weights(&model, &config.conventional_weights_path)?;
    Ok(training_report("conventional", choice, &config.conventional_weights_path, &history))
}

fn train_rl<B: AutodiffBackend>(
    config: &LinkConfig,
    device: &B::Device,
    choice: DeviceChoice,
) -> LinkResult<TrainingReport> {
    B::seed(config.seed);
    let model = Autoencoder::<B>::new(config, device);
    let mut trainer = RlTrainer::new(config, RandomSource::seeded(config.seed))?;
    let (model, history) = trainer.fit(model)?;
    save_weights(&model, &config.rl_weights_path)?;
    Ok(training_report("rl", choice, &config.rl_weights_path, &history))
}

fn evaluate<B: AutodiffBackend>(config: &LinkConfig, device: &B::Device) -> LinkResult<BerReport> {
    let sweep = SweepConfig {
        ebno_db: config.evaluation_sweep()?,
        ..SweepConfig::from_link_config(config)
    };
    let mut links: Vec<Box<dyn LinkSimulator>> = vec![Box::new(BaselineLink::new(
        config,
        RandomSource::seeded(config.seed),
    )?)];

    for (name, path) in [
        ("conventional", &config.conventional_weights_path),
        ("rl", &config.rl_weights_path),
    ] {
        if !weights_exist(path) {
            tracing::warn!(system = name, path = %path.display(), "no weights, skipping");
            continue;
        }
        let model = load_weights(Autoencoder::<B>::new(config, device), path, device)?.valid();
        links.push(Box::new(TrainedLink::new(
            name,
            model,
            config,
            RandomSource::seeded(config.seed),
        )?));
    }

    let mut curves = Vec::with_capacity(links.len());
    for link in links.iter_mut() {
        curves.push(simulate_ber(link.as_mut(), &sweep)?);
    }
    Ok(BerReport::new(curves))
}
