use std::io::{self, IsTerminal, Read};
use std::sync::Arc;

use clap::{CommandFactory, Parser};
use colored::*;
use tracing_subscriber::EnvFilter;

use empathy_view::cli::{unescape_inline, Args};
use empathy_view::client::{AnalysisClient, ClientConfig};
use empathy_view::config::{FileConfig, Settings};
use empathy_view::pipeline::Pipeline;
use empathy_view::render::html::HtmlSurface;
use empathy_view::render::terminal::TerminalSurface;
use empathy_view::render::{draw, Dashboard};
use empathy_view::{web, ViewError};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if let Some(shell) = args.completions {
        let mut cmd = Args::command();
        clap_complete::generate(shell, &mut cmd, "empathy-view", &mut io::stdout());
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("empathy_view=info")),
        )
        .with_writer(io::stderr)
        .init();

    if args.no_color {
        colored::control::set_override(false);
    }

    let file = args.config.as_deref().map(FileConfig::load).transpose()?;
    let settings = Settings::resolve(file, args.endpoint.clone(), args.port)?;
    let client = AnalysisClient::new(ClientConfig::new(settings.endpoint.clone()));

    if args.health {
        return check_health(&client).await;
    }

    let pipeline = Arc::new(Pipeline::new(client, settings.palette));

    // Web UI mode
    if args.web {
        web::serve(settings.port, pipeline, !args.no_open).await?;
        return Ok(());
    }

    let raw = read_input(&args)?;
    let dashboard = match pipeline.analyze(&raw).await {
        Ok(d) => d,
        Err(e) => {
            report_failure(&e);
            std::process::exit(1);
        }
    };

    print_dashboard(&args, &dashboard)?;
    Ok(())
}

fn read_input(args: &Args) -> Result<String, ViewError> {
    if let Some(text) = &args.text {
        return Ok(unescape_inline(text));
    }
    if args.reads_stdin() {
        if io::stdin().is_terminal() {
            eprintln!("{}", "Enter chat messages, one per line; end with Ctrl+D.".bright_blue());
        }
        let mut raw = String::new();
        io::stdin().read_to_string(&mut raw)?;
        return Ok(raw);
    }
    match &args.input {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => Ok(String::new()),
    }
}

fn print_dashboard(args: &Args, dashboard: &Dashboard) -> Result<(), ViewError> {
    if let Some(path) = &args.html {
        let mut surface = HtmlSurface::new();
        draw(&mut surface, dashboard);
        std::fs::write(path, surface.document())?;
        eprintln!("{}", format!("  HTML report written to {}", path.display()).bright_green());
    }

    if args.json {
        let json = serde_json::to_string_pretty(dashboard)
            .map_err(|e| ViewError::Malformed(e.to_string()))?;
        println!("{json}");
        return Ok(());
    }

    let color = !args.no_color && io::stdout().is_terminal();
    let mut surface = TerminalSurface::new(color);
    draw(&mut surface, dashboard);
    print!("{}", surface.contents());
    if let Some(mean) = dashboard.mean_intensity {
        eprintln!("{}", format!("  mean intensity: {mean:.2}").dimmed());
    }
    if let Some(ms) = dashboard.processing_time_ms {
        eprintln!("{}", format!("  backend processing time: {ms:.1} ms").dimmed());
    }
    Ok(())
}

fn report_failure(err: &ViewError) {
    eprintln!("{} {}", "error:".bright_red().bold(), err.user_notice());
    eprintln!("  {}", err.to_string().dimmed());
}

async fn check_health(client: &AnalysisClient) -> Result<(), Box<dyn std::error::Error>> {
    match client.health().await {
        Ok(h) => println!("{}: {} ({})", "Backend".bright_yellow(), h.status.bright_green(), h.message),
        Err(e) => {
            report_failure(&e);
            std::process::exit(1);
        }
    }
    match client.model_info().await {
        Ok(m) => {
            println!("{}: {}", "Model".bright_yellow(), m.model_name);
            println!("{}: {}", "Device".bright_yellow(), m.device);
            println!("{}: {}", "Labels".bright_yellow(), m.num_labels);
            println!("{}: {}", "Loaded".bright_yellow(), m.loaded);
        }
        Err(e) => eprintln!("{} {}", "warning:".bright_yellow(), e),
    }
    Ok(())
}
