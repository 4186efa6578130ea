// SPDX-FileCopyrightText: (C) 2020 Jason Ish <jason@codemonkey.net>
// SPDX-License-Identifier: MIT

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{ArgAction, Parser};
use template_loader::elastic::ClientBuilder;
use template_loader::paths::Paths;
use template_loader::{logger, resource, version, BeatInfo, Loader, TemplateConfig};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "template-loader", version, about = "Load the index template into Elasticsearch")]
struct Args {
    /// Elasticsearch URL
    #[arg(
        short = 'e',
        long,
        env = "TEMPLATE_LOADER_ELASTICSEARCH",
        value_name = "URL",
        default_value = "http://localhost:9200"
    )]
    elasticsearch: String,

    /// Elasticsearch index prefix
    #[arg(
        short,
        long,
        env = "TEMPLATE_LOADER_INDEX",
        value_name = "PREFIX",
        default_value = "logstash"
    )]
    index: String,

    /// Configuration filename
    #[arg(short, long, env = "TEMPLATE_LOADER_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Overwrite an existing template
    #[arg(long, env = "TEMPLATE_LOADER_OVERWRITE")]
    overwrite: bool,

    /// Fields definition to load instead of the built-in one
    #[arg(long, env = "TEMPLATE_LOADER_FIELDS", value_name = "FILE")]
    fields: Option<String>,

    /// Directory relative fields filenames are resolved against
    #[arg(long = "path.config", env = "TEMPLATE_LOADER_PATH_CONFIG", value_name = "DIR")]
    path_config: Option<PathBuf>,

    /// Elasticsearch username
    #[arg(short, long, env = "TEMPLATE_LOADER_USERNAME")]
    username: Option<String>,

    /// Elasticsearch password
    #[arg(short, long, env = "TEMPLATE_LOADER_PASSWORD")]
    password: Option<String>,

    /// Disable TLS certificate validation
    #[arg(short = 'k', long = "no-check-certificate")]
    no_check_certificate: bool,

    /// Increase verbosity
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

fn main() {
    // Must be done before any threads are started.
    logger::init_offset();

    let args = Args::parse();

    let level = logger::level_from_verbosity(args.verbose);
    if let Err(err) = logger::init_logger(level) {
        eprintln!("Failed to initialize logging: {}", err);
    }
    if let Err(err) = logger::init_stdlog() {
        eprintln!("Failed to initialize log bridge: {}", err);
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            error!("Failed to create runtime: {}", err);
            std::process::exit(1);
        }
    };

    if let Err(err) = runtime.block_on(run(args)) {
        error!("{:#}", err);
        std::process::exit(1);
    }
}

/// Read the template configuration from the `setup.template` section of
/// the configuration file.
fn load_config(filename: &Path) -> anyhow::Result<TemplateConfig> {
    let file = std::fs::File::open(filename)
        .with_context(|| format!("Failed to open {}", filename.display()))?;
    let config: serde_yaml::Value = serde_yaml::from_reader(file)
        .with_context(|| format!("Failed to parse {}", filename.display()))?;
    let section = config
        .get("setup")
        .and_then(|setup| setup.get("template"))
        .cloned()
        .unwrap_or(serde_yaml::Value::Null);
    Ok(TemplateConfig::from_value(&section)?)
}

/// The template configuration from the configuration file, with command
/// line overrides applied.
fn template_config(args: &Args) -> anyhow::Result<TemplateConfig> {
    let mut config = match &args.config {
        Some(filename) => load_config(filename)?,
        None => TemplateConfig::default(),
    };
    if args.overwrite {
        config.overwrite = true;
    }
    if let Some(fields) = &args.fields {
        config.fields = fields.clone();
    }
    Ok(config)
}

async fn run(args: Args) -> anyhow::Result<()> {
    version::log_version();

    let config = template_config(&args)?;
    if !config.enabled {
        info!("Template loading is disabled");
        return Ok(());
    }

    let paths = match args.path_config {
        Some(dir) => Paths::new(dir),
        None => Paths::default(),
    };

    let mut builder = ClientBuilder::new(&args.elasticsearch);
    builder.disable_certificate_validation(args.no_check_certificate);
    if let Some(username) = &args.username {
        builder.with_username(username);
    }
    if let Some(password) = &args.password {
        builder.with_password(password);
    }
    let client = builder.build();

    let es_version = client.fetch_version().await.with_context(|| {
        format!("Failed to get Elasticsearch version from {}", args.elasticsearch)
    })?;
    info!(
        "Found Elasticsearch version {} at {}",
        es_version.version, args.elasticsearch
    );

    let beat = BeatInfo {
        version: version::version().to_string(),
        index_prefix: args.index,
    };
    let loader = Loader::with_config(config, Arc::new(client), beat, resource::default_fields())
        .with_paths(paths);
    loader.load().await?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    fn write_config(dir: &Path, yaml: &str) -> PathBuf {
        let filename = dir.join("loader.yml");
        std::fs::write(&filename, yaml).unwrap();
        filename
    }

    #[test]
    fn test_template_config_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let filename = write_config(
            dir.path(),
            "setup:\n  template:\n    fields: base.yml\n    name: suricata\n",
        );
        let args = Args::parse_from([
            "template-loader",
            "-c",
            filename.to_str().unwrap(),
            "--overwrite",
            "--fields",
            "custom.yml",
        ]);
        let config = template_config(&args).unwrap();
        assert!(config.overwrite);
        assert_eq!(config.fields, "custom.yml");
        assert_eq!(config.name, "suricata");
    }

    #[tokio::test]
    async fn test_disabled_skips_elasticsearch() {
        // Nothing listens on port 1, so any request would fail.
        let dir = tempfile::tempdir().unwrap();
        let filename = write_config(dir.path(), "setup:\n  template:\n    enabled: false\n");
        let args = Args::parse_from([
            "template-loader",
            "-e",
            "http://127.0.0.1:1",
            "-c",
            filename.to_str().unwrap(),
            "--overwrite",
        ]);
        run(args).await.unwrap();
    }
}
