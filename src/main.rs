//! Command-line driver: `winograd <input-file> <output-file>`

use std::fs;
use std::path::PathBuf;
use std::process;

use clap::error::ErrorKind;
use clap::Parser;

use winograd_cl::config::{Backend, DevicePreference, PipelineConfig};
use winograd_cl::gpu::{AcceleratorRuntime, HostRuntime};
use winograd_cl::{io, reference, Problem, Result, RunContext, TileGeometry, WinogradError};

const USAGE: &str = "Usage: winograd <input filename> <output filename>";

#[derive(Parser, Debug)]
#[command(name = "winograd", version, about = "Winograd F(2,3) convolution on an OpenCL accelerator")]
struct Cli {
    /// Problem file: `K C H W`, filters, then image
    input: PathBuf,

    /// Where to write the convolution output
    output: PathBuf,

    /// Runtime executing the stages (host or opencl)
    #[arg(long)]
    backend: Option<Backend>,

    /// OpenCL C source with the four stage kernels
    #[arg(long, value_name = "FILE")]
    kernels: Option<PathBuf>,

    /// OpenCL device kind to select (gpu, cpu or any)
    #[arg(long)]
    device: Option<DevicePreference>,

    /// JSON pipeline configuration
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Cross-check the result against direct convolution
    #[arg(long)]
    verify: bool,
}

fn main() {
    env_logger::init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return;
        }
        Err(e) => {
            log::debug!("argument error: {}", e);
            println!("{}", USAGE);
            return;
        }
    };

    match run(&cli) {
        Ok(()) => {}
        Err(e) if e.is_image_extent_error() => {
            println!("Please make sure that:");
            println!("H (height of image) is even and at least 4");
            println!("W (width of image) is even and at least 4");
            println!("({})", e);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn load_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }
    if let Some(device) = cli.device {
        config.device_preference = device;
    }
    if let Some(kernels) = &cli.kernels {
        config.kernel_source = Some(kernels.clone());
    }
    config.verify |= cli.verify;
    Ok(config)
}

fn run(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;

    let text = fs::read_to_string(&cli.input)
        .map_err(|e| WinogradError::File(format!("Failed to open {}: {}", cli.input.display(), e)))?;

    // Reject odd extents before reading any tensor data.
    let shape = io::parse_shape(&text)?;
    TileGeometry::new(&shape)?;
    let problem = io::parse_problem(&text)?;

    let source = config.load_kernel_source()?;
    match config.backend {
        Backend::Host => execute(HostRuntime::new(), &source, &problem, cli, &config),
        Backend::OpenCl => run_opencl(&source, &problem, cli, &config),
    }
}

#[cfg(feature = "gpu")]
fn run_opencl(source: &str, problem: &Problem, cli: &Cli, config: &PipelineConfig) -> Result<()> {
    let runtime = winograd_cl::gpu::OclRuntime::new(config.device_preference)?;
    execute(runtime, source, problem, cli, config)
}

#[cfg(not(feature = "gpu"))]
fn run_opencl(_source: &str, _problem: &Problem, _cli: &Cli, _config: &PipelineConfig) -> Result<()> {
    Err(WinogradError::Config(
        "OpenCL backend not compiled. Enable with --features gpu or pass --backend host".to_string(),
    ))
}

fn execute<R: AcceleratorRuntime>(
    runtime: R,
    source: &str,
    problem: &Problem,
    cli: &Cli,
    config: &PipelineConfig,
) -> Result<()> {
    println!("{}", runtime.device_info()?);

    let mut context = RunContext::new(runtime, source)?;
    context.set_reuse_buffers(config.reuse_buffers);
    let result = context.run(problem)?;

    println!("{}", result.statistics);

    if config.verify {
        let expected = reference::direct_conv(problem.filters(), problem.image());
        let error = reference::max_abs_diff(&expected, &result.output);
        println!("Max abs error vs direct convolution: {:e}", error);
    }

    io::write_output(&cli.output, &problem.shape(), &result.output)
}
