use anyhow::Context;
use clap::Parser;
use gridworld_core::{ModelDirectory, ResourceDataset, SimConfig, Simulation};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "gridworld-server", about = "Serve the grid-world agent simulation over HTTP")]
pub struct ServerConfig {
    /// Resource dataset: JSON object of name -> {x_coordinate, y_coordinate}.
    #[arg(long, env = "GRIDWORLD_DATA", default_value = "extracted_data.json")]
    pub data: PathBuf,

    /// Directory holding model artifacts.
    #[arg(long, env = "GRIDWORLD_MODELS_DIR", default_value = ".")]
    pub models_dir: PathBuf,

    /// File-name suffix that marks a model artifact in listings.
    #[arg(long, env = "GRIDWORLD_MODEL_EXTENSION", default_value = ModelDirectory::DEFAULT_EXTENSION)]
    pub model_extension: String,

    #[arg(long, env = "GRIDWORLD_BIND", default_value = "127.0.0.1:8000")]
    pub bind: SocketAddr,

    /// Optional JSON file with simulation settings; omitted keys keep defaults.
    #[arg(long, env = "GRIDWORLD_SIM_CONFIG")]
    pub sim_config: Option<PathBuf>,

    #[arg(long, env = "GRIDWORLD_GRID_WIDTH", requires = "grid_height")]
    pub grid_width: Option<usize>,

    #[arg(long, env = "GRIDWORLD_GRID_HEIGHT", requires = "grid_width")]
    pub grid_height: Option<usize>,
}

impl ServerConfig {
    /// Settings file (if any) with command-line grid overrides applied on top.
    pub fn sim_config(&self) -> anyhow::Result<SimConfig> {
        let mut config = match &self.sim_config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                serde_json::from_str::<SimConfig>(&text)
                    .with_context(|| format!("parsing {}", path.display()))?
            }
            None => SimConfig::default(),
        };
        if let (Some(width), Some(height)) = (self.grid_width, self.grid_height) {
            config.grid_width = Some(width);
            config.grid_height = Some(height);
        }
        config.validate()?;
        Ok(config)
    }

    /// Load the dataset and derive the grid. Any data problem is fatal.
    pub fn build_simulation(&self) -> anyhow::Result<Simulation> {
        let config = self.sim_config()?;
        let dataset = if !self.data.exists() && config.grid_override().is_some() {
            tracing::warn!(path = %self.data.display(), "dataset not found; using an empty resource set");
            ResourceDataset::default()
        } else {
            ResourceDataset::load(&self.data)
                .with_context(|| format!("loading resource dataset {}", self.data.display()))?
        };
        let source = ModelDirectory::new(&self.models_dir, &self.model_extension);
        Simulation::try_new(dataset, config, Box::new(source))
            .context("building grid from resource dataset")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = ServerConfig::try_parse_from(["gridworld-server"]).unwrap();
        assert_eq!(config.data, PathBuf::from("extracted_data.json"));
        assert_eq!(config.model_extension, ".pth");
        assert_eq!(config.bind, "127.0.0.1:8000".parse::<SocketAddr>().unwrap());
        assert!(config.sim_config.is_none());
    }

    #[test]
    fn grid_dimensions_must_be_paired() {
        assert!(ServerConfig::try_parse_from(["gridworld-server", "--grid-width", "3"]).is_err());
        let config = ServerConfig::try_parse_from([
            "gridworld-server",
            "--grid-width",
            "3",
            "--grid-height",
            "4",
        ])
        .unwrap();
        let sim = config.sim_config().unwrap();
        assert_eq!(sim.grid_override(), Some((3, 4)));
    }

    #[test]
    fn settings_file_is_merged_with_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"scale": 10.0, "grid_width": 9, "grid_height": 9}}"#).unwrap();
        let args: Vec<OsString> = vec![
            "gridworld-server".into(),
            "--sim-config".into(),
            file.path().into(),
            "--grid-width".into(),
            "2".into(),
            "--grid-height".into(),
            "5".into(),
        ];
        let config = ServerConfig::try_parse_from(args).unwrap();
        let sim = config.sim_config().unwrap();
        assert_eq!(sim.scale, 10.0);
        assert_eq!(sim.grid_override(), Some((2, 5)));
    }

    #[test]
    fn missing_dataset_is_fatal_without_grid_size() {
        let dir = tempfile::tempdir().unwrap();
        let args: Vec<OsString> = vec![
            "gridworld-server".into(),
            "--data".into(),
            dir.path().join("absent.json").into(),
        ];
        let config = ServerConfig::try_parse_from(args).unwrap();
        assert!(config.build_simulation().is_err());
    }
}
