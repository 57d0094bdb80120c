use std::fs::File;
use std::io;
use std::path::PathBuf;

use clap::{CommandFactory, Parser};
use clap_complete::{generate, Shell};
use gcparser::{FetcherConfig, GcParser, ParseArgs};
use tokio::runtime;

/// Geocaching.com page parser
#[derive(Debug, Parser)]
#[clap(version)]
pub struct Args {
    #[clap(subcommand)]
    pub cmd: SubCommand,
    /// Optional yaml configuration file
    #[clap(env = "GCPARSER_CONFIG", parse(from_os_str), long, global = true)]
    pub config: Option<PathBuf>,
    /// Override the geocaching.com username
    #[clap(long, global = true)]
    pub username: Option<String>,
    /// Override the geocaching.com password
    #[clap(env = "GCPARSER_PASSWORD", long, global = true, hide_env_values = true)]
    pub password: Option<String>,
    /// Override the directory holding cookies and user agent
    #[clap(parse(from_os_str), long, global = true)]
    pub data_dir: Option<PathBuf>,
    /// Override the site base url
    #[clap(long, global = true)]
    pub base_url: Option<String>,
    /// Download pages without pauses
    #[clap(long, global = true)]
    pub no_throttle: bool,
    /// When quiet no logs are outputted
    #[clap(long, short, global = true)]
    pub quiet: bool,
}

#[derive(Debug, clap::Subcommand)]
pub enum SubCommand {
    #[clap(name = "parse")]
    Parse(ParseCmd),
    /// List registered parsers
    #[clap(name = "list")]
    List,
    #[clap(hide = true)]
    Completion,
}

/// Run a parser and print its record as json
#[derive(Debug, clap::Args)]
pub struct ParseCmd {
    /// Parser name, see `list`
    pub name: String,
    /// Parser arguments as key=value, a bare key is a flag
    pub pairs: Vec<String>,
}

impl TryFrom<&Args> for FetcherConfig {
    type Error = anyhow::Error;

    fn try_from(args: &Args) -> Result<Self, Self::Error> {
        let mut conf = if let Some(file) = args.config.as_ref().map(File::open) {
            serde_yaml::from_reader(file?)?
        } else {
            FetcherConfig::default()
        };
        if let Some(username) = &args.username {
            conf.username = Some(username.to_string());
        }
        if let Some(password) = &args.password {
            conf.password = Some(password.to_string());
        }
        if let Some(data_dir) = &args.data_dir {
            conf.data_dir = Some(data_dir.clone());
        }
        if let Some(base_url) = &args.base_url {
            conf.base_url = base_url.to_string();
        }
        if args.no_throttle {
            conf.throttle = false;
        }
        Ok(conf)
    }
}

pub fn parse(conf: FetcherConfig, cmd: ParseCmd) -> anyhow::Result<()> {
    let args = ParseArgs::from_pairs(&cmd.pairs)?;
    let gc = GcParser::new(conf)?;
    let rt = runtime::Builder::new_multi_thread().enable_all().build()?;
    let record = rt.block_on(gc.parse(&cmd.name, &args))?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

pub fn list(conf: FetcherConfig) -> anyhow::Result<()> {
    let gc = GcParser::new(conf)?;
    for name in gc.parser_names() {
        println!("{name}");
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if !args.quiet {
        env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or("gcparser=warn,gc_fetcher=warn"),
        )
        .init();
    }

    let conf = FetcherConfig::try_from(&args)?;
    match args.cmd {
        SubCommand::Parse(cmd) => parse(conf, cmd),
        SubCommand::List => list(conf),
        SubCommand::Completion => {
            generate(Shell::Bash, &mut Args::command(), "gcparser", &mut io::stdout());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "baseUrl: http://localhost:8080\nusername: alice\nretries: 5\nthrottle: true"
        )
        .unwrap();

        let path = file.path().to_str().unwrap();
        let args = Args::parse_from([
            "gcparser",
            "--config",
            path,
            "--username",
            "bob",
            "--no-throttle",
            "list",
        ]);
        let conf = FetcherConfig::try_from(&args).unwrap();
        assert_eq!(conf.base_url, "http://localhost:8080");
        assert_eq!(conf.username.as_deref(), Some("bob"));
        assert_eq!(conf.retries, 5);
        assert!(!conf.throttle);
        assert_eq!(conf.timeout, 30.0);
    }

    #[test]
    fn parse_command_collects_pairs() {
        let args = Args::parse_from(["gcparser", "parse", "cache", "guid=abc", "logs"]);
        let SubCommand::Parse(cmd) = args.cmd else {
            panic!("expected parse");
        };
        assert_eq!(cmd.name, "cache");
        assert_eq!(cmd.pairs, vec!["guid=abc", "logs"]);
    }
}
