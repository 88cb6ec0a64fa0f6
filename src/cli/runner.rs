//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::connector::{Connector, PokedexConnector};
use crate::error::{Result, ResultExt};
use crate::loader::{load_connector, ConnectorDefinition};
use crate::schema::{ColumnInferrer, TableSchema};
use crate::types::{FlatRow, JsonValue, Phase};
use serde_json::{json, Value};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Instant;

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
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Tables => self.tables(),
            Commands::Validate => self.validate(),
            Commands::Schema { sample } => self.schema(*sample).await,
            Commands::Fetch {
                table,
                last_record,
                max_limit,
                no_cache,
                output,
            } => {
                self.fetch(
                    table,
                    last_record.as_deref(),
                    *max_limit,
                    *no_cache,
                    output.as_deref(),
                )
                .await
            }
            Commands::Serve { port, db } => {
                let config = crate::cli::ServerConfig {
                    db_path: db.clone(),
                };
                crate::cli::serve(config, *port).await
            }
        }
    }

    /// Load connector definition
    fn load_connector(&self) -> Result<ConnectorDefinition> {
        load_connector(&self.cli.connector)
    }

    /// List table ids
    fn tables(&self) -> Result<()> {
        let connector = self.load_connector()?;

        let tables: Vec<Value> = connector
            .tables
            .iter()
            .map(|t| {
                json!({
                    "id": t.id,
                    "alias": t.alias,
                    "resource": t.resource().as_str()
                })
            })
            .collect();

        self.output_message(&json!({
            "type": "TABLES",
            "connector": connector.name,
            "tables": tables
        }));

        Ok(())
    }

    /// Validate connector definition
    fn validate(&self) -> Result<()> {
        let connector = self.load_connector()?;

        self.output_message(&json!({
            "type": "LOG",
            "log": {
                "level": "INFO",
                "message": format!(
                    "Connector '{}' v{} is valid with {} tables",
                    connector.name,
                    connector.version,
                    connector.tables.len()
                )
            }
        }));

        Ok(())
    }

    /// Print static schemas, or schemas inferred from `sample` items per table
    async fn schema(&self, sample: usize) -> Result<()> {
        let mut definition = self.load_connector()?;

        let schemas: Vec<TableSchema> = if sample == 0 {
            definition.tables.iter().map(|t| t.schema()).collect()
        } else {
            definition.caching = false;
            definition.pagination.max_limit = sample;
            self.sample_schemas(definition).await?
        };

        self.output_message(&json!({
            "type": "SCHEMA",
            "tables": schemas
        }));

        Ok(())
    }

    /// Infer column types from a short walk of every table
    async fn sample_schemas(&self, definition: ConnectorDefinition) -> Result<Vec<TableSchema>> {
        let connector = PokedexConnector::from_definition(definition)?;
        let inferrer = ColumnInferrer::new();
        let mut schemas = Vec::new();

        for table in connector.tables() {
            let outcome = table.get_data(None).await?;
            let rows = table.post_process(outcome.items).await?;

            let declared = table.schema();
            if rows.is_empty() {
                tracing::warn!("No sample rows for {}, using declared schema", table.id());
                schemas.push(declared);
                continue;
            }

            let incremental = declared.incremental_column().map(|c| c.id.clone());
            let columns = inferrer
                .clone()
                .with_incremental_column(incremental.as_deref().or(Some("id")))
                .infer(&rows);

            let mut inferred = TableSchema::new(declared.id, columns);
            inferred.alias = declared.alias;
            schemas.push(inferred);
        }

        Ok(schemas)
    }

    /// Fetch one table and write its rows as JSON lines
    async fn fetch(
        &self,
        table_id: &str,
        last_record: Option<&str>,
        max_limit: Option<usize>,
        no_cache: bool,
        output: Option<&Path>,
    ) -> Result<()> {
        let started = Instant::now();
        let mut definition = self.load_connector()?;
        if no_cache {
            definition.caching = false;
        }
        if let Some(max_limit) = max_limit {
            definition.pagination.max_limit = max_limit;
        }

        let connector = PokedexConnector::from_definition(definition)?;
        connector.setup(Phase::GatherData).await?;

        let table = connector.table(table_id)?;
        let last_record = last_record.map(|s| JsonValue::String(s.to_string()));
        let outcome = table.get_data(last_record.as_ref()).await?;

        let aborted = outcome.abort_reason().map(str::to_string);
        let rows = table.post_process(outcome.items).await?;

        connector.teardown().await?;

        match output {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("Failed to create {}", path.display()))?;
                write_rows(BufWriter::new(file), &rows)?;
            }
            None => write_rows(io::stdout().lock(), &rows)?,
        }

        match aborted {
            Some(reason) => tracing::warn!(
                "Fetched {} rows from {} before aborting: {}",
                rows.len(),
                table_id,
                reason
            ),
            None => tracing::info!(
                "Fetched {} rows from {} in {:.2}s",
                rows.len(),
                table_id,
                started.elapsed().as_secs_f64()
            ),
        }

        Ok(())
    }

    /// Output a message
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

/// Write `rows` as JSON lines
fn write_rows<W: Write>(mut writer: W, rows: &[FlatRow]) -> Result<()> {
    for row in rows {
        serde_json::to_writer(&mut writer, row)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}
