use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::{fs, path::Path};

#[derive(Deserialize)]
#[serde(untagged)]
enum EncoderJson {
    Wrapped { classes: Vec<String> },
    Bare(Vec<String>),
}

/// Fitted district label encoder: the set of district names the model was
/// trained on. Classes are kept sorted and unique.
#[derive(Debug, Clone)]
pub struct DistrictEncoder {
    classes: Vec<String>,
}

impl DistrictEncoder {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut classes: Vec<String> = labels.into_iter().map(Into::into).collect();
        classes.sort();
        classes.dedup();
        Self { classes }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let txt = fs::read_to_string(path)
            .with_context(|| format!("failed to read encoder at {}", path.display()))?;
        let raw: EncoderJson = serde_json::from_str(&txt)
            .with_context(|| format!("failed to parse encoder {}", path.display()))?;
        let labels = match raw {
            EncoderJson::Wrapped { classes } => classes,
            EncoderJson::Bare(classes) => classes,
        };
        if labels.is_empty() {
            bail!("encoder {} has no classes", path.display());
        }
        Ok(Self::new(labels))
    }

    pub fn contains(&self, label: &str) -> bool {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(label))
            .is_ok()
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
