//! Model URI parsing and local model file resolution
//!
//! Accepts either `hf:<owner>/<repo>[:<quant>]` or a plain file path. Nothing
//! is downloaded here: a URI resolves only if a matching GGUF file is already
//! present in the models directory.

use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

const HF_SCHEME: &str = "hf:";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelUriError {
    #[error("model URI is empty")]
    Empty,
    #[error("invalid hf: model URI {0:?}, expected hf:<owner>/<repo>[:<quant>]")]
    InvalidHf(String),
}

/// Where a model comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelUri {
    HuggingFace {
        owner: String,
        repo: String,
        quant: Option<String>,
    },
    Path(PathBuf),
}

impl ModelUri {
    pub fn parse(uri: &str) -> Result<Self, ModelUriError> {
        let uri = uri.trim();
        if uri.is_empty() {
            return Err(ModelUriError::Empty);
        }

        let Some(rest) = uri.strip_prefix(HF_SCHEME) else {
            return Ok(ModelUri::Path(PathBuf::from(uri)));
        };

        let invalid = || ModelUriError::InvalidHf(uri.to_string());

        let (repo_path, quant) = match rest.split_once(':') {
            Some((_, "")) => return Err(invalid()),
            Some((path, quant)) => (path, Some(quant.to_string())),
            None => (rest, None),
        };

        let (owner, repo) = repo_path.split_once('/').ok_or_else(invalid)?;
        if owner.is_empty() || repo.is_empty() || repo.contains('/') {
            return Err(invalid());
        }

        Ok(ModelUri::HuggingFace {
            owner: owner.to_string(),
            repo: repo.to_string(),
            quant,
        })
    }

    /// Find the model file in `models_dir` without touching the network
    pub fn resolve_local(&self, models_dir: &Path) -> Option<PathBuf> {
        match self {
            ModelUri::Path(path) => {
                let candidate = if path.is_absolute() {
                    path.clone()
                } else {
                    models_dir.join(path)
                };
                if candidate.is_file() {
                    Some(candidate)
                } else if path.is_file() {
                    Some(path.clone())
                } else {
                    None
                }
            }
            ModelUri::HuggingFace { repo, quant, .. } => {
                let stem = repo_stem(repo).to_lowercase();
                let quant = quant.as_deref().map(str::to_lowercase);

                let mut files: Vec<PathBuf> = std::fs::read_dir(models_dir)
                    .ok()?
                    .filter_map(Result::ok)
                    .map(|entry| entry.path())
                    .filter(|path| path.is_file() && is_gguf(path))
                    .collect();
                files.sort();

                files.into_iter().find(|path| {
                    let name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().to_lowercase())
                        .unwrap_or_default();
                    name.contains(&stem) && quant.as_ref().map_or(true, |q| name.contains(q))
                })
            }
        }
    }
}

impl fmt::Display for ModelUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelUri::HuggingFace {
                owner,
                repo,
                quant: Some(quant),
            } => write!(f, "{owner}/{repo}:{quant}"),
            ModelUri::HuggingFace {
                owner,
                repo,
                quant: None,
            } => write!(f, "{owner}/{repo}"),
            ModelUri::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// GGUF repos are conventionally suffixed `-GGUF`; files inside are not
fn repo_stem(repo: &str) -> &str {
    let lower = repo.to_ascii_lowercase();
    if lower.ends_with("-gguf") {
        repo.get(..repo.len() - "-gguf".len()).unwrap_or(repo)
    } else {
        repo
    }
}

fn is_gguf(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gguf"))
}
