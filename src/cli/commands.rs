//! CLI arguments

use clap::Parser;
use std::path::PathBuf;

/// WorkRamp extraction tap
#[derive(Parser, Debug)]
#[command(name = "tap-workramp")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (JSON)
    #[arg(short, long)]
    pub config: PathBuf,

    /// Print the catalog of available streams and exit
    #[arg(short, long)]
    pub discover: bool,

    /// Catalog file selecting the streams to sync
    #[arg(long, visible_alias = "properties")]
    pub catalog: Option<PathBuf>,

    /// State file (JSON), echoed back unchanged
    #[arg(short, long)]
    pub state: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_discover() {
        let cli = Cli::try_parse_from(["tap-workramp", "--config", "config.json", "--discover"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("config.json"));
        assert!(cli.discover);
        assert!(cli.catalog.is_none());
    }

    #[test]
    fn test_parse_sync() {
        let cli = Cli::try_parse_from([
            "tap-workramp",
            "-c",
            "config.json",
            "--catalog",
            "catalog.json",
            "--state",
            "state.json",
        ])
        .unwrap();
        assert!(!cli.discover);
        assert_eq!(cli.catalog, Some(PathBuf::from("catalog.json")));
        assert_eq!(cli.state, Some(PathBuf::from("state.json")));
    }

    #[test]
    fn test_properties_alias() {
        let cli = Cli::try_parse_from(["tap-workramp", "-c", "c.json", "--properties", "p.json"]).unwrap();
        assert_eq!(cli.catalog, Some(PathBuf::from("p.json")));
    }

    #[test]
    fn test_config_required() {
        assert!(Cli::try_parse_from(["tap-workramp", "--discover"]).is_err());
    }
}
