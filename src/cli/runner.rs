//! CLI runner - executes a discover or sync run

use crate::catalog::{discover, Catalog};
use crate::cli::commands::Cli;
use crate::config::Config;
use crate::engine::{SyncEngine, SyncSummary};
use crate::error::{Error, Result, ResultExt};
use crate::http::HttpClient;
use crate::output::{JsonLinesWriter, OutputSink};
use crate::types::JsonValue;
use serde_json::json;
use std::fs;
use std::path::Path;
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    ///
    /// The config is loaded and validated first, so a bad config fails
    /// before any catalog or network work.
    pub async fn run(&self) -> Result<()> {
        let config = Config::from_file(&self.cli.config)?;

        if self.cli.discover {
            return self.discover();
        }

        let mut writer = JsonLinesWriter::stdout();
        self.sync(&config, HttpClient::with_config(config.http_client_config())?, &mut writer)
            .await?;
        Ok(())
    }

    /// Print the catalog for every known stream
    fn discover(&self) -> Result<()> {
        info!("Starting discover");
        let catalog = discover()?;
        println!("{}", catalog.to_json_pretty()?);
        info!("Finished discover");
        Ok(())
    }

    /// Sync the selected streams into `sink`
    pub async fn sync<S: OutputSink>(
        &self,
        config: &Config,
        client: HttpClient,
        sink: &mut S,
    ) -> Result<SyncSummary> {
        let catalog = self.load_catalog()?;
        let state = self.load_state()?;

        SyncEngine::new(client, &config.start_date)
            .with_state(state)
            .sync(&catalog, sink)
            .await
    }

    /// Load the operator catalog, falling back to the discovered one
    fn load_catalog(&self) -> Result<Catalog> {
        match &self.cli.catalog {
            Some(path) => Catalog::from_file(path),
            None => {
                info!("No catalog given, using discovered catalog");
                discover()
            }
        }
    }

    /// Load state
    fn load_state(&self) -> Result<JsonValue> {
        match &self.cli.state {
            Some(path) => load_state_file(path),
            None => Ok(json!({})),
        }
    }
}

fn load_state_file(path: &Path) -> Result<JsonValue> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read state file {}", path.display()))?;
    serde_json::from_str(&content).map_err(|e| Error::config(format!("Invalid state JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpClientConfig;
    use crate::output::MemorySink;
    use std::io::Write;
    use std::path::PathBuf;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn cli(catalog: Option<PathBuf>, state: Option<PathBuf>) -> Cli {
        Cli {
            config: PathBuf::from("config.json"),
            discover: false,
            catalog,
            state,
        }
    }

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_state_default() {
        let runner = Runner::new(cli(None, None));
        assert_eq!(runner.load_state().unwrap(), json!({}));
    }

    #[test]
    fn test_load_state_file() {
        let file = write_temp(r#"{"bookmarks": {}}"#);
        let runner = Runner::new(cli(None, Some(file.path().to_path_buf())));
        assert_eq!(runner.load_state().unwrap(), json!({"bookmarks": {}}));
    }

    #[test]
    fn test_load_state_invalid() {
        let file = write_temp("not json");
        let runner = Runner::new(cli(None, Some(file.path().to_path_buf())));
        let err = runner.load_state().unwrap_err();
        assert!(err.to_string().contains("Invalid state JSON"));
    }

    #[test]
    fn test_load_catalog_without_file_is_discovered() {
        let runner = Runner::new(cli(None, None));
        let catalog = runner.load_catalog().unwrap();
        assert_eq!(catalog.streams.len(), 5);
        assert!(catalog.selected_stream_ids().is_empty());
    }

    #[tokio::test]
    async fn test_sync_with_catalog_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users"))
            .and(header("Authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "u1"}])))
            .expect(1)
            .mount(&server)
            .await;

        let mut catalog = discover().unwrap();
        catalog.select(["users"]).unwrap();
        let catalog_file = write_temp(&catalog.to_json_pretty().unwrap());
        let state_file = write_temp(r#"{"seen": true}"#);

        let runner = Runner::new(cli(
            Some(catalog_file.path().to_path_buf()),
            Some(state_file.path().to_path_buf()),
        ));
        let config = Config::new("secret", "2021-01-01");
        let client = HttpClient::with_config(
            HttpClientConfig::builder()
                .base_url(server.uri())
                .bearer_token(&config.access_token)
                .build(),
        )
        .unwrap();

        let mut sink = MemorySink::new();
        let summary = runner.sync(&config, client, &mut sink).await.unwrap();

        assert_eq!(summary.rows_for("users"), Some(1));
        assert_eq!(sink.schema_streams(), vec!["users"]);
        assert_eq!(sink.state_count(), 2);
    }
}
