use super::Parser;

#[derive(Parser, Debug)]
#[command(name = "tokengate", about = "Session token issuer and request gate")]
pub struct Cli {
    #[arg(long)]
    pub settings: Option<String>,
    /// Disable ANSI colors in log output.
    #[arg(long)]
    pub no_color: bool,
}
