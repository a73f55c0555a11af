//! SigmaCopy CLI - Secure File Transfer with Quality Monitoring
//!
//! Transfers files over SSH/SFTP with digest verification, retry with
//! exponential backoff, and Six Sigma throughput analysis.

use clap::Parser;
use sigmacopy::config::{ChannelConfig, CliArgs, QualitySpec, TransferPolicy};
use sigmacopy::core::{TransferRecord, TransferSession};
use sigmacopy::error::Result;
use sigmacopy::network::SshChannel;
use sigmacopy::report::QualityReportBuilder;
use sigmacopy::stats::SpcAnalyzer;
use tracing_subscriber::EnvFilter;

fn main() {
    // Parse CLI arguments
    let args = CliArgs::parse();

    // Initialize logging
    let default_filter = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .init();

    // Handle result
    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: CliArgs) -> Result<()> {
    let (sources, target) = args.split_paths()?;
    let channel_config = ChannelConfig::from_cli(&args, &target)?;
    let policy = TransferPolicy::from_cli(&args)?;
    let spec = QualitySpec::from_cli(&args);

    // Session setup is outside the retry loop; a connection failure is
    // fatal rather than retried
    let channel = SshChannel::connect(&channel_config)?;
    let mut session = TransferSession::new(channel, policy);

    let pairs: Vec<(std::path::PathBuf, String)> = sources
        .iter()
        .map(|source| (source.clone(), target.remote_path_for(source)))
        .collect();

    let succeeded = session.transfer_all(&pairs);
    let failed = pairs.len() - succeeded;

    // Releases the channel on every path out of the session
    let records = session.finish();

    if !args.quiet {
        print_summary(&records, succeeded, failed, &spec);
    }

    let builder = QualityReportBuilder::new(&records, spec);

    if let Some(path) = &args.report {
        match builder.build() {
            Some(report) => {
                report.save(path)?;
                tracing::info!("Quality report written to {}", path.display());
            }
            None => tracing::warn!("No successful transfers; skipping quality report"),
        }
    }

    if let Some(path) = &args.chart_data {
        match builder.chart_data() {
            Some(chart) => {
                chart.save(path)?;
                tracing::info!("Control chart data written to {}", path.display());
            }
            None => tracing::warn!("Fewer than 2 samples; skipping control chart data"),
        }
    }

    if failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn print_summary(records: &[TransferRecord], succeeded: usize, failed: usize, spec: &QualitySpec) {
    println!("\n=== Transfer Summary ===");
    println!("Files transferred: {}", succeeded);
    println!("Files failed:      {}", failed);

    let total_bytes: u64 = records.iter().map(|r| r.size_bytes).sum();
    println!(
        "Bytes transferred: {}",
        humansize::format_size(total_bytes, humansize::BINARY)
    );

    let analyzer = SpcAnalyzer::new(records.iter().map(|r| r.throughput_mbps).collect());
    if analyzer.len() >= 2 {
        println!("\nThroughput (Mbps):");
        println!("  Mean:        {:.2}", analyzer.mean());
        println!("  Std dev:     {:.2}", analyzer.std_dev());
        println!(
            "  Cpk:         {:.3}",
            analyzer.capability_index(spec.upper_spec_limit, spec.lower_spec_limit)
        );
        println!(
            "  Sigma level: {:.3}",
            analyzer.sigma_level(spec.defect_threshold)
        );
        if let Some(limits) = analyzer.control_limits() {
            println!(
                "  UCL/LCL:     {:.2} / {:.2}",
                limits.upper_limit, limits.lower_limit
            );
        }
    }
}
