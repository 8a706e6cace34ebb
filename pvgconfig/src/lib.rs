//! # PVGrid Configuration Module
//!
//! This module provides configuration management for PVGrid, including:
//! - Loading configuration from YAML files
//! - Merging with embedded default configuration
//! - Environment variable overrides
//! - Type-safe getters and setters for configuration values
//! - Thread-safe singleton access pattern
//!
//! ## Usage
//!
//! ```no_run
//! use pvgconfig::get_config;
//!
//! // Get the global configuration
//! let config = get_config();
//!
//! // Access configuration values
//! let ranges = config.get_address_ranges()?;
//! let (min, max) = config.get_rotation_interval_minutes();
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{Result, anyhow};
use dirs::home_dir;
use lazy_static::lazy_static;
use serde_yaml::{Mapping, Number, Value};
use std::{
    env, fs,
    path::Path,
    sync::{Arc, Mutex},
};
use tracing::info;

use pvgutils::AddressRange;

// Configuration par défaut intégrée
const DEFAULT_CONFIG: &str = include_str!("pvgrid.yaml");

lazy_static! {
    static ref CONFIG: Arc<Config> =
        Arc::new(Config::load_config("").expect("Failed to load PVGrid configuration"));
}

const ENV_CONFIG_DIR: &str = "PVGRID_CONFIG";
const ENV_PREFIX: &str = "PVGRID_CONFIG__";

// Default values for configuration
const DEFAULT_MAX_SLOTS: u64 = 30;
const DEFAULT_ROTATION_MIN_MINUTES: u64 = 30;
const DEFAULT_ROTATION_MAX_MINUTES: u64 = 60;
const DEFAULT_STAGGER_STEP_MILLIS: u64 = 25;
const DEFAULT_JITTER_MAX_MILLIS: u64 = 100;
const DEFAULT_STAGGER_POLICY: &str = "linear";

/// Macro to generate getter/setter for u64 values with default
macro_rules! impl_u64_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> u64 {
            match self.get_value($path) {
                Ok(Value::Number(n)) if n.is_u64() => n.as_u64().unwrap(),
                Ok(Value::Number(n)) if n.is_i64() => n.as_i64().unwrap().max(0) as u64,
                _ => $default,
            }
        }

        pub fn $setter(&self, value: u64) -> Result<()> {
            let n = Number::from(value);
            self.set_value($path, Value::Number(n))
        }
    };
}

/// Configuration manager for PVGrid
///
/// This structure manages the application configuration, including:
/// - Loading configuration from YAML files
/// - Merging with default configuration
/// - Handling environment variable overrides
/// - Providing typed getters/setters for configuration values
#[derive(Debug)]
pub struct Config {
    config_dir: String,
    path: String,
    data: Mutex<Value>,
}

impl Config {
    /// Finds a config directory by trying different locations in order
    fn find_config_dir(directory: &str) -> String {
        // 1. Try provided directory
        if !directory.is_empty() {
            return directory.to_string();
        }

        // 2. Try environment variable
        if let Ok(env_path) = env::var(ENV_CONFIG_DIR) {
            info!(env_var=ENV_CONFIG_DIR, path=%env_path, "Trying to load config from env");
            return env_path;
        }

        // 3. Try current directory
        if Path::new(".pvgrid").exists() {
            return ".pvgrid".to_string();
        }

        // 4. Try home directory
        if let Some(home) = home_dir() {
            let home_config = home.join(".pvgrid");
            if home_config.exists() {
                return home_config.to_string_lossy().to_string();
            }
        }

        // Default fallback
        ".pvgrid".to_string()
    }

    /// Validates and prepares a config directory
    fn validate_config_dir(path: &Path) -> Result<()> {
        // Create if doesn't exist
        if !path.exists() {
            fs::create_dir_all(path)?;
        }

        // Verify it's a directory
        if !path.is_dir() {
            return Err(anyhow!("Le chemin spécifié n'est pas un répertoire"));
        }

        // Test write permission
        let test_file = path.join(".write_test");
        fs::write(&test_file, b"test")?;
        fs::remove_file(&test_file)?;

        Ok(())
    }

    /// Determines and validates the configuration directory
    ///
    /// The directory is searched in the following order:
    /// 1. The provided `directory` parameter if not empty
    /// 2. The `PVGRID_CONFIG` environment variable
    /// 3. `.pvgrid` in the current directory
    /// 4. `.pvgrid` in the user's home directory
    ///
    /// The directory is created if it doesn't exist, and validated for
    /// read/write permissions.
    pub fn config_dir(directory: &str) -> Result<String> {
        let dir_path = Self::find_config_dir(directory);
        let path = Path::new(&dir_path);
        Self::validate_config_dir(path)?;
        Ok(dir_path)
    }

    /// Loads the configuration from the specified directory
    ///
    /// This method:
    /// 1. Determines the configuration directory
    /// 2. Loads the default embedded configuration
    /// 3. Merges it with the external config.yaml file if present
    /// 4. Applies environment variable overrides
    /// 5. Saves the merged configuration
    ///
    /// # Arguments
    ///
    /// * `directory` - The directory containing the config.yaml file, or
    ///   empty to use the default search order
    pub fn load_config(directory: &str) -> Result<Self> {
        // Obtenir le répertoire de configuration
        let config_dir = Self::config_dir(directory)?;
        info!(config_dir=%config_dir, "Using config directory");

        // Construire le chemin du fichier config.yaml
        let config_file_path = Path::new(&config_dir).join("config.yaml");
        let path = config_file_path.to_string_lossy().to_string();

        // Charger la configuration par défaut
        let mut default_value: Value = serde_yaml::from_str(DEFAULT_CONFIG)?;

        // Essayer de charger le fichier de configuration
        let yaml_data = if let Ok(data) = fs::read(&path) {
            info!(config_file=%path, "Loaded config file");
            data
        } else {
            info!(config_file=%path, "Config file not found, using default embedded config");
            DEFAULT_CONFIG.as_bytes().to_vec()
        };

        // Merger avec la config par défaut
        let external_value: Value = serde_yaml::from_slice(&yaml_data)?;
        merge_yaml(&mut default_value, &external_value);
        let mut config_value = Self::lower_keys_value(default_value);

        // Appliquer les overrides depuis les variables d'environnement
        Self::apply_env_overrides(&mut config_value);

        // Créer la configuration
        let config = Config {
            config_dir,
            path,
            data: Mutex::new(config_value),
        };

        // Sauvegarder la configuration
        config.save()?;
        Ok(config)
    }

    /// Saves the current configuration to the config.yaml file
    pub fn save(&self) -> Result<()> {
        let data = self.data.lock().unwrap();
        let yaml = serde_yaml::to_string(&*data)?;
        fs::write(&self.path, yaml)?;
        Ok(())
    }

    /// Sets a configuration value at the specified path and saves it
    ///
    /// # Arguments
    ///
    /// * `path` - Array of keys representing the path (e.g., `&["rotation", "min_minutes"]`)
    /// * `value` - The YAML value to set
    pub fn set_value(&self, path: &[&str], value: Value) -> Result<()> {
        let mut data = self.data.lock().unwrap();
        Self::set_value_internal(&mut data, path, value)?;
        drop(data);
        self.save()?;
        Ok(())
    }

    fn set_value_internal(data: &mut Value, path: &[&str], value: Value) -> Result<()> {
        if path.is_empty() {
            *data = value;
            return Ok(());
        }
        if let Value::Mapping(map) = data {
            let key = path[0].to_lowercase();
            let key_value = Value::String(key);
            if path.len() == 1 {
                map.insert(key_value, value);
            } else {
                let entry = map
                    .entry(key_value)
                    .or_insert(Value::Mapping(Mapping::new()));
                Self::set_value_internal(entry, &path[1..], value)?;
            }
            Ok(())
        } else {
            Err(anyhow!("Current node is not a map"))
        }
    }

    /// Gets a configuration value at the specified path
    pub fn get_value(&self, path: &[&str]) -> Result<Value> {
        let data = self.data.lock().unwrap();
        Self::get_value_internal(&data, path)
    }

    fn get_value_internal(data: &Value, path: &[&str]) -> Result<Value> {
        let mut current = data;
        for (i, key) in path.iter().enumerate() {
            if let Value::Mapping(map) = current {
                let key = key.to_lowercase();
                if let Some(next) = map.get(&Value::String(key)) {
                    current = next;
                } else {
                    return Err(anyhow!("Path {} does not exist", path[..=i].join(".")));
                }
            } else {
                return Err(anyhow!("Path {} is not a Config", path[..i].join(".")));
            }
        }
        Ok(current.clone())
    }

    fn apply_env_overrides(config: &mut Value) {
        for (key, value) in env::vars() {
            if key.starts_with(ENV_PREFIX) {
                let key_path = key
                    .trim_start_matches(ENV_PREFIX)
                    .split("__")
                    .collect::<Vec<_>>();
                let yaml_value = Self::convert_env_value(&value);
                let _ = Self::set_value_internal(config, &key_path, yaml_value);
            }
        }
    }

    fn convert_env_value(value: &str) -> Value {
        if let Ok(parsed) = serde_yaml::from_str::<Value>(value) {
            return parsed;
        }
        Value::String(value.to_string())
    }

    fn lower_keys_value(value: Value) -> Value {
        match value {
            Value::Mapping(map) => {
                let mut new_map = Mapping::new();
                for (k, v) in map {
                    if let Value::String(s) = k {
                        let new_key = Value::String(s.to_lowercase());
                        new_map.insert(new_key, Self::lower_keys_value(v));
                    } else {
                        new_map.insert(k, Self::lower_keys_value(v));
                    }
                }
                Value::Mapping(new_map)
            }
            Value::Sequence(seq) => {
                Value::Sequence(seq.into_iter().map(Self::lower_keys_value).collect())
            }
            _ => value,
        }
    }

    /// Récupère les blocs d'adresses configurés pour le pool.
    ///
    /// Les blocs sont validés à la désérialisation (`start <= end`). Un
    /// ensemble vide est rejeté : le pool ne peut rien sélectionner sans
    /// bloc, l'appelant doit corriger la configuration.
    pub fn get_address_ranges(&self) -> Result<Vec<AddressRange>> {
        let value = self.get_value(&["pool", "ranges"])?;
        let ranges: Vec<AddressRange> = serde_yaml::from_value(value)
            .map_err(|e| anyhow!("Invalid pool.ranges configuration: {}", e))?;
        if ranges.is_empty() {
            return Err(anyhow!("pool.ranges is empty: at least one range is required"));
        }
        Ok(ranges)
    }

    /// Remplace les blocs d'adresses du pool et sauvegarde.
    pub fn set_address_ranges(&self, ranges: &[AddressRange]) -> Result<()> {
        let value = serde_yaml::to_value(ranges)?;
        self.set_value(&["pool", "ranges"], value)
    }

    /// Bornes de l'intervalle de rotation, en minutes.
    ///
    /// Retourne `(min, max)` avec les valeurs par défaut 30–60 si la
    /// configuration est absente ou incohérente (min > max).
    pub fn get_rotation_interval_minutes(&self) -> (u64, u64) {
        let min = self.get_rotation_min_minutes();
        let max = self.get_rotation_max_minutes();
        if min > max {
            tracing::warn!(
                min, max,
                "rotation.min_minutes > rotation.max_minutes, using defaults"
            );
            return (DEFAULT_ROTATION_MIN_MINUTES, DEFAULT_ROTATION_MAX_MINUTES);
        }
        (min, max)
    }

    impl_u64_config!(
        get_rotation_min_minutes,
        set_rotation_min_minutes,
        &["rotation", "min_minutes"],
        DEFAULT_ROTATION_MIN_MINUTES
    );

    impl_u64_config!(
        get_rotation_max_minutes,
        set_rotation_max_minutes,
        &["rotation", "max_minutes"],
        DEFAULT_ROTATION_MAX_MINUTES
    );

    impl_u64_config!(
        get_stagger_step_millis,
        set_stagger_step_millis,
        &["broadcast", "stagger_step_millis"],
        DEFAULT_STAGGER_STEP_MILLIS
    );

    impl_u64_config!(
        get_jitter_max_millis,
        set_jitter_max_millis,
        &["broadcast", "jitter_max_millis"],
        DEFAULT_JITTER_MAX_MILLIS
    );

    impl_u64_config!(
        get_max_slots,
        set_max_slots,
        &["grid", "max_slots"],
        DEFAULT_MAX_SLOTS
    );

    impl_u64_config!(
        get_default_slots,
        set_default_slots,
        &["grid", "default_slots"],
        1
    );

    /// Politique d'étalement des livraisons : `"linear"` ou `"jitter"`.
    pub fn get_stagger_policy(&self) -> String {
        match self.get_value(&["broadcast", "stagger"]) {
            Ok(Value::String(s)) if !s.is_empty() => s,
            _ => DEFAULT_STAGGER_POLICY.to_string(),
        }
    }

    /// Répertoire de configuration utilisé par cette instance.
    pub fn dir(&self) -> &str {
        &self.config_dir
    }
}

/// Returns the global configuration instance
///
/// This function provides access to the singleton configuration instance,
/// which is lazily loaded on first access.
pub fn get_config() -> Arc<Config> {
    CONFIG.clone()
}

/// Merges external YAML configuration into default configuration
///
/// This function recursively merges two YAML value trees:
/// - For mappings (objects), it merges keys from external into default
/// - For scalars and sequences, external values replace default values
fn merge_yaml(default: &mut Value, external: &Value) {
    match (default, external) {
        (Value::Mapping(dmap), Value::Mapping(emap)) => {
            for (k, v) in emap {
                match dmap.get_mut(k) {
                    Some(dv) => merge_yaml(dv, v),
                    None => {
                        dmap.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        (d, e) => *d = e.clone(), // pour les scalaires ou séquences, on remplace
    }
}
