// src/core/scanner/parameter_scanner.rs

use async_trait::async_trait;
use std::collections::HashSet;

use super::{Discovery, ParameterSource, ScanContext};
use crate::core::error::ScanError;
use crate::core::models::{ParameterFinding, ParameterOrigin};
use crate::core::target::Target;
use crate::core::wordlists::{PARAMETERS, PARAMETERS_DEEP};

/// Emits the common parameter names from the wordlist without probing, plus
/// the credential and session names in deep mode. Names seen in the wild are
/// added later by the crawler.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordlistParameterSource;

#[async_trait]
impl ParameterSource for WordlistParameterSource {
    async fn discover(&self, _target: &Target, ctx: ScanContext<'_>) -> Result<Discovery<ParameterFinding>, ScanError> {
        let mut names = ctx.wordlists.get(PARAMETERS);
        if ctx.deep {
            names.extend(ctx.wordlists.get(PARAMETERS_DEEP));
        }
        let mut seen = HashSet::new();
        let findings: Vec<ParameterFinding> = names
            .into_iter()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty() && seen.insert(name.clone()))
            .map(|name| ParameterFinding { name, origin: ParameterOrigin::Wordlist })
            .collect();
        Ok(Discovery { probed: 0, failed: 0, findings })
    }
}
