mod formatter;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use formatter::{format_analysis, format_hosts, format_json, format_outcome, format_summary, format_triggers};
use hostwatch_core::analysis::render_analysis;
use hostwatch_core::archive::ArtifactArchive;
use hostwatch_core::config::AppConfig;
use hostwatch_core::delivery::{NullSink, ReportSink, SmtpSink};
use hostwatch_core::extract::SignalExtractor;
use hostwatch_core::risk::RiskClassifier;
use hostwatch_core::schedule::crontab::program_command;
use hostwatch_core::schedule::{CrontabStore, Scheduler};
use hostwatch_core::types::AuditReport;
use hostwatch_core::AuditRunner;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "/etc/hostwatch/hostwatch.toml";

#[derive(Parser)]
#[command(name = "hostwatch")]
#[command(version)]
#[command(about = "Scheduled security posture audits for a fleet of Linux hosts", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG)]
    config: PathBuf,

    /// More log output (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Audit one host from the registry
    Audit {
        host: String,

        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,

        /// Do not mail the report
        #[arg(long)]
        no_email: bool,
    },
    /// Audit every enabled host
    AuditAll {
        #[arg(long)]
        json: bool,

        #[arg(long)]
        no_email: bool,
    },
    /// List configured hosts
    List,
    /// Manage cron triggers for scheduled audits
    Schedule {
        #[command(subcommand)]
        action: ScheduleAction,
    },
    /// Re-run signal extraction and risk classification on an archived report
    Analyze {
        file: PathBuf,

        #[arg(long)]
        json: bool,

        /// Write the analysis document next to the report
        #[arg(long)]
        store: bool,
    },
}

#[derive(Subcommand)]
enum ScheduleAction {
    /// Install triggers for one host, or for every scheduled host
    Install { host: Option<String> },
    /// Remove the trigger of one host, or every trigger
    Remove { host: Option<String> },
    /// Show installed triggers
    Show {
        #[arg(long)]
        json: bool,
    },
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Audit { host, json, no_email } => {
            let config = load_config(&cli.config)?;
            let runner = runner(&config, no_email)?;
            let outcome = runner
                .audit_host(&host)
                .with_context(|| format!("audit of '{}' failed", host))?;

            if json {
                println!("{}", format_json(&outcome, true)?);
            } else {
                print!("{}", format_outcome(&outcome));
            }
        }
        Command::AuditAll { json, no_email } => {
            let config = load_config(&cli.config)?;
            let summary = runner(&config, no_email)?.audit_all();

            if json {
                println!("{}", format_json(&summary, true)?);
            } else {
                print!("{}", format_summary(&summary));
            }

            if !summary.all_succeeded() {
                bail!("{} host(s) could not be audited", summary.failed.len());
            }
        }
        Command::List => {
            let registry = load_config(&cli.config)?.registry();
            print!("{}", format_hosts(&registry));
        }
        Command::Schedule { action } => schedule(&cli.config, action)?,
        Command::Analyze { file, json, store } => analyze(&cli.config, &file, json, store)?,
    }

    Ok(())
}

fn load_config(path: &Path) -> Result<AppConfig> {
    let config = AppConfig::load_from(path)?;
    config.validate()?;
    Ok(config)
}

fn runner(config: &AppConfig, no_email: bool) -> Result<AuditRunner> {
    let sink: Box<dyn ReportSink> = if config.general.deliver && !no_email {
        Box::new(SmtpSink::new(config.smtp.clone()))
    } else {
        Box::new(NullSink)
    };

    let runner = AuditRunner::new(config, sink)?;
    Ok(if no_email { runner.with_delivery(false) } else { runner })
}

/// Command the cron entries run: this binary pointed at the same config
fn scheduled_program(config_path: &Path) -> Result<String> {
    let exe = std::env::current_exe().context("cannot locate the hostwatch binary")?;
    let config = std::fs::canonicalize(config_path).unwrap_or_else(|_| config_path.to_path_buf());
    Ok(program_command(&exe, &config))
}

fn schedule(config_path: &Path, action: ScheduleAction) -> Result<()> {
    let config = load_config(config_path)?;
    let registry = config.registry();
    let scheduler = Scheduler::new(CrontabStore::new(scheduled_program(config_path)?));

    match action {
        ScheduleAction::Install { host: Some(host) } => {
            let trigger = scheduler.install(registry.get(&host)?)?;
            println!("Installed: {} ({})", trigger.cron_fields(), trigger.host);
        }
        ScheduleAction::Install { host: None } => {
            let mut failures = 0;
            for profile in registry.list_enabled().into_iter().filter(|h| h.schedule.is_some()) {
                match scheduler.install(profile) {
                    Ok(trigger) => println!("Installed: {} ({})", trigger.cron_fields(), trigger.host),
                    Err(e) => {
                        tracing::error!(host = %profile.name, error = %e, "trigger not installed");
                        failures += 1;
                    }
                }
            }
            if failures > 0 {
                bail!("{} trigger(s) could not be installed", failures);
            }
        }
        ScheduleAction::Remove { host: Some(host) } => {
            if scheduler.remove_host(&host)? {
                println!("Removed trigger for {}", host);
            } else {
                println!("No trigger installed for {}", host);
            }
        }
        ScheduleAction::Remove { host: None } => {
            let count = scheduler.remove_all()?;
            println!("Removed {} trigger(s)", count);
        }
        ScheduleAction::Show { json } => {
            let triggers = scheduler.installed()?;
            if json {
                println!("{}", format_json(&triggers, true)?);
            } else {
                print!("{}", format_triggers(&triggers));
            }
        }
    }

    Ok(())
}

fn analyze(config_path: &Path, file: &Path, json: bool, store: bool) -> Result<()> {
    let config = if config_path.exists() {
        load_config(config_path)?
    } else {
        tracing::debug!(path = %config_path.display(), "no configuration file, using analysis defaults");
        AppConfig::default()
    };

    let text = std::fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?;
    let report = AuditReport::parse(&text)?;

    let signals = SignalExtractor::from_config(&config.analysis)?.extract(&report);
    let assessment = RiskClassifier::new(config.analysis.thresholds).classify(&signals);

    if store {
        let dir = file.parent().unwrap_or_else(|| Path::new("."));
        let document = render_analysis(&report, &signals, &assessment);
        let path = ArtifactArchive::new(dir).store_analysis(&report, &document)?;
        tracing::info!(path = %path.display(), "analysis stored");
    }

    if json {
        let value = serde_json::json!({
            "host": report.metadata.host,
            "signals": signals,
            "assessment": assessment,
        });
        println!("{}", format_json(&value, true)?);
    } else {
        print!("{}", format_analysis(&report.metadata.host, &signals, &assessment));
    }

    Ok(())
}
