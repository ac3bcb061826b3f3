//! Decides where a curated mask goes by comparing its region count with the
//! reference count for the image.

use std::path::PathBuf;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};
use tracing::info;

use crate::{contours::ContourAnalyzer, error::Result, model::Image};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq,
    Serialize, Deserialize, JsonSchema, Display, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Outcome {
    Matched,
    Mismatched,
    NoReference,
}

/// Where a save should land. The core only names the handle; the persistence
/// provider owns what it points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Destination {
    /// Default output, also used for matched masks
    Primary,
    /// Masks whose count disagrees with the reference
    Secondary,
    /// Copies of source images
    Origin,
    /// Explicit location chosen by the operator
    Other(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RoutingDecision {
    pub outcome: Outcome,
    pub destination: Destination,
    /// Region count used for the comparison, when one was taken
    pub contour_count: Option<usize>,
    pub reference_count: Option<u32>,
}

/// Routes previews using the region counts of the analyzer it borrows, so
/// routing and counting share one contour cache.
#[derive(Clone, Copy)]
pub struct ValidationRouter<'a> {
    analyzer: &'a ContourAnalyzer,
}

impl<'a> ValidationRouter<'a> {
    pub fn new(analyzer: &'a ContourAnalyzer) -> Self {
        Self { analyzer }
    }

    /// Routes `preview` given the reference count looked up for its source.
    ///
    /// An untouched preview counts as an operator confirmation of zero cells.
    pub fn route(&self, preview: &mut Image, reference: Option<u32>) -> Result<RoutingDecision> {
        let (outcome, contour_count) = match reference {
            None => (Outcome::NoReference, None),
            Some(expected) if !preview.is_masked() => {
                (if expected == 0 { Outcome::Matched } else { Outcome::Mismatched }, None)
            }
            Some(expected) => {
                let count = self.analyzer.count(preview)?;
                let matched = usize::try_from(expected).is_ok_and(|e| e == count);
                (if matched { Outcome::Matched } else { Outcome::Mismatched }, Some(count))
            }
        };

        let destination = match outcome {
            Outcome::Matched | Outcome::NoReference => Destination::Primary,
            Outcome::Mismatched => Destination::Secondary,
        };

        info!(
            "Validation of '{}': {} (contours {:?}, reference {:?})",
            preview.name(),
            outcome,
            contour_count,
            reference
        );
        Ok(RoutingDecision { outcome, destination, contour_count, reference_count: reference })
    }
}
