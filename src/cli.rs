use std::path::PathBuf;

use clap::Parser;
use clap_complete::Shell;

#[derive(Parser, Debug)]
#[command(name = "empathy-view")]
#[command(version)]
#[command(about = "Send chat lines to an emotion-analysis backend and render the results")]
pub struct Args {
    /// File with one chat message per line (`-` or omitted reads stdin)
    pub input: Option<PathBuf>,

    /// Chat text given inline instead of a file; `\n` separates messages
    #[arg(long, short, conflicts_with = "input")]
    pub text: Option<String>,

    /// Analysis endpoint URL (default http://127.0.0.1:8000/analyze-chat)
    #[arg(long, short)]
    pub endpoint: Option<String>,

    /// TOML config file with endpoint, port and palette overrides
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Launch web UI on localhost instead of terminal output
    #[arg(long)]
    pub web: bool,

    /// Port for the web UI server (default 8888)
    #[arg(long)]
    pub port: Option<u16>,

    /// Do not try to open a browser when the web UI starts
    #[arg(long)]
    pub no_open: bool,

    /// Also write a standalone HTML report to this path
    #[arg(long, value_name = "PATH")]
    pub html: Option<PathBuf>,

    /// Print the projected dashboard as JSON instead of the colored report
    #[arg(long)]
    pub json: bool,

    /// Disable colored terminal output
    #[arg(long)]
    pub no_color: bool,

    /// Check that the analysis backend is up and print model info
    #[arg(long)]
    pub health: bool,

    /// Print shell completions and exit
    #[arg(long, value_enum, value_name = "SHELL")]
    pub completions: Option<Shell>,
}

impl Args {
    /// True when messages should be read from stdin.
    pub fn reads_stdin(&self) -> bool {
        self.text.is_none()
            && self
                .input
                .as_ref()
                .map_or(true, |p| p.as_os_str() == "-")
    }
}

/// Turn literal `\n` escapes from the command line into real line breaks.
pub fn unescape_inline(text: &str) -> String {
    text.replace("\\n", "\n")
}
