use crate::config::EngineConfigOverrides;
use anyhow::{anyhow, bail, Result};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CliOverrides {
    pub config: Option<PathBuf>,
    pub trace: Option<PathBuf>,
    profiles_dir: Option<PathBuf>,
    defaults_dir: Option<PathBuf>,
    bindings: Option<PathBuf>,
}

impl CliOverrides {
    pub fn parse_from_env() -> Result<Self> {
        Self::parse(env::args())
    }

    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut overrides = CliOverrides::default();
        let mut iter = args.into_iter();
        let _ = iter.next(); // skip program name if present
        while let Some(raw_flag) = iter.next() {
            let flag = raw_flag.as_ref();
            let Some(key) = flag.strip_prefix("--") else {
                bail!("Unexpected argument '{flag}'. Flags take the form --name <value>.");
            };
            let value =
                iter.next().ok_or_else(|| anyhow!("Expected a value after '{flag}'"))?.as_ref().to_string();
            if value.trim().is_empty() {
                bail!("Empty value for '{flag}'");
            }
            let path = PathBuf::from(value);
            match key {
                "config" => overrides.config = Some(path),
                "trace" => overrides.trace = Some(path),
                "profiles-dir" => overrides.profiles_dir = Some(path),
                "defaults-dir" => overrides.defaults_dir = Some(path),
                "bindings" => overrides.bindings = Some(path),
                _ => bail!(
                    "Unknown flag '{flag}'. Supported flags: --config, --trace, --profiles-dir, --defaults-dir, --bindings."
                ),
            }
        }
        Ok(overrides)
    }

    pub fn config_overrides(&self) -> EngineConfigOverrides {
        EngineConfigOverrides {
            profiles_dir: self.profiles_dir.clone(),
            default_profiles_dir: self.defaults_dir.clone(),
            bindings_path: self.bindings.clone(),
        }
    }
}
