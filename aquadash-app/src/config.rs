use anyhow::{Context, Result};
use aquadash_core::error::AquadashError;
use aquadash_schemas::file_formats::PolicyFile;
use aquadash_schemas::policy::RiskPolicy;
use std::{collections::HashMap, fs, path::Path};

/// All risk policies available to a run: the built-in site revisions plus any
/// loaded from YAML files. A file policy with a built-in's name shadows the
/// built-in, so a site can re-tune a revision without a rebuild.
pub struct PolicyLibrary {
    policies: HashMap<String, RiskPolicy>,
}

impl PolicyLibrary {
    pub fn builtin() -> Self {
        let policies = RiskPolicy::builtin_revisions()
            .into_iter()
            .map(|p| (p.name.clone(), p))
            .collect();
        Self { policies }
    }

    /// Loads every `*.yaml`/`*.yml` policy file in the directory on top of
    /// the built-ins.
    pub fn load(dir: &Path) -> Result<Self> {
        let mut library = Self::builtin();
        println!("Loading risk policies from '{}'...", dir.display());

        for entry in fs::read_dir(dir)
            .with_context(|| format!("failed to read policy directory '{}'", dir.display()))?
        {
            let path = entry?.path();
            let is_yaml = path
                .extension()
                .map_or(false, |ext| ext == "yaml" || ext == "yml");
            if !path.is_file() || !is_yaml {
                continue;
            }
            let content = fs::read_to_string(&path)?;
            let file: PolicyFile = serde_yaml::from_str(&content)
                .with_context(|| format!("failed to parse policy file {:?}", path))?;
            for policy in file.policies {
                library.policies.insert(policy.name.clone(), policy);
            }
        }

        println!("{} risk policies available.", library.policies.len());
        Ok(library)
    }

    pub fn get(&self, name: &str) -> Result<&RiskPolicy> {
        self.policies.get(name).ok_or_else(|| {
            let mut available: Vec<&str> =
                self.policies.keys().map(String::as_str).collect();
            available.sort_unstable();
            anyhow::Error::from(AquadashError::PolicyNotFound(name.to_string()))
                .context(format!("available policies: {}", available.join(", ")))
        })
    }
}
