//! Flexibility assumption table
//!
//! JSON object of `category -> end-use -> [small, low, medium, high]`
//! proportions. The key order of the file is kept and becomes the column
//! order of every output table.

use serde::de::Error as _;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

use super::RepoError;
use crate::domain::{EndUseCategory, FlexibilityProfile};

#[derive(Debug, Clone, PartialEq)]
pub struct EndUseAssumption {
    pub end_use: String,
    pub category: EndUseCategory,
    pub profile: FlexibilityProfile,
}

#[derive(Debug, Clone, Default)]
pub struct AssumptionTable {
    entries: Vec<EndUseAssumption>,
    index: HashMap<String, usize>,
}

impl AssumptionTable {
    pub fn load(path: &Path) -> Result<Self, RepoError> {
        let raw = std::fs::read_to_string(path).map_err(|source| RepoError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw).map_err(|e| match e {
            ParseFailure::Json(source) => RepoError::Assumptions {
                path: path.to_path_buf(),
                source,
            },
            ParseFailure::Repo(e) => e,
        })
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ParseFailure> {
        let root: Value = serde_json::from_str(raw)?;
        let categories = root
            .as_object()
            .ok_or_else(|| serde_json::Error::custom("assumption table must be a JSON object"))?;

        let mut table = Self::default();
        for (category_name, end_uses) in categories {
            let category = EndUseCategory::parse(category_name);
            let end_uses = end_uses.as_object().ok_or_else(|| {
                serde_json::Error::custom(format!(
                    "category '{category_name}' must map end-uses to proportions"
                ))
            })?;

            for (end_use, proportions) in end_uses {
                let profile: FlexibilityProfile = serde_json::from_value(proportions.clone())?;
                table.push(EndUseAssumption {
                    end_use: end_use.clone(),
                    category: category.clone(),
                    profile,
                })?;
            }
        }
        Ok(table)
    }

    pub fn push(&mut self, assumption: EndUseAssumption) -> Result<(), RepoError> {
        if self.index.contains_key(&assumption.end_use) {
            return Err(RepoError::DuplicateEndUse {
                end_use: assumption.end_use,
            });
        }
        self.index
            .insert(assumption.end_use.clone(), self.entries.len());
        self.entries.push(assumption);
        Ok(())
    }

    pub fn get(&self, end_use: &str) -> Option<&EndUseAssumption> {
        self.index.get(end_use).map(|&i| &self.entries[i])
    }

    pub fn entries(&self) -> &[EndUseAssumption] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &EndUseAssumption> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Assumption parsing error before a file path is attached
#[derive(Debug, thiserror::Error)]
pub enum ParseFailure {
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Repo(#[from] RepoError),
}
