// Copyright 2025 HWBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Table-driven resolution of requested variants into backend flags.
//!
//! A [`VariantTable`] lists the variants a benchmark supports in canonical
//! order, each with an optional baseline flag fragment. Architecture-specific
//! alternates live in a separate substitution list keyed by
//! (variant, architecture); a matching substitution replaces the baseline
//! flags and appends its suffix to the metric name.
//!
//! ```
//! use hwbench_benchmarks::variant::{ArchFlags, Variant, VariantTable};
//!
//! static TABLE: VariantTable = VariantTable {
//!     variants: &[
//!         Variant { label: "FP64", flags: Some("-r f64_r -f gemm") },
//!         Variant { label: "FP32", flags: Some("-r f32_r -f gemm") },
//!     ],
//!     substitutions: &[ArchFlags {
//!         label: "FP32",
//!         architectures: &["gfx90a"],
//!         flags: "-r f32_r -f gemm_ex --compute_type f32_r",
//!         metric_suffix: "_xDLOPS",
//!     }],
//! };
//!
//! let archs = ["gfx90a".to_string()].into_iter().collect();
//! let resolved = TABLE.resolve(&["fp32".to_string()], &archs);
//! assert_eq!(resolved[0].metric, "FP32_xDLOPS");
//! ```

use std::collections::BTreeSet;

use tracing::{debug, warn};

/// A variant with its baseline flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Variant {
    /// Canonical label, also the baseline metric name.
    pub label: &'static str,
    /// Baseline flag fragment; `None` when the variant only runs through a
    /// substitution.
    pub flags: Option<&'static str>,
}

/// Alternate flags for a variant on specific architectures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchFlags {
    /// Variant label the substitution applies to.
    pub label: &'static str,
    /// Architecture tags that enable it.
    pub architectures: &'static [&'static str],
    /// Replacement flag fragment.
    pub flags: &'static str,
    /// Suffix appended to the metric name.
    pub metric_suffix: &'static str,
}

impl ArchFlags {
    fn applies_to(&self, architectures: &BTreeSet<String>) -> bool {
        self.architectures
            .iter()
            .any(|arch| architectures.contains(*arch))
    }
}

/// A variant resolved against the detected architectures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVariant {
    /// Canonical label.
    pub label: &'static str,
    /// Metric name the variant's output is recorded under.
    pub metric: String,
    /// Flag fragment to pass to the binary.
    pub flags: &'static str,
}

/// Supported variants and their architecture substitutions.
#[derive(Debug, Clone, Copy)]
pub struct VariantTable {
    /// Variants in canonical order.
    pub variants: &'static [Variant],
    /// Substitutions; the first match for a variant wins.
    pub substitutions: &'static [ArchFlags],
}

impl VariantTable {
    /// Canonical labels.
    pub fn supported_labels(&self) -> Vec<&'static str> {
        self.variants.iter().map(|v| v.label).collect()
    }

    /// Intersect `requested` with the supported variants.
    ///
    /// Matching is case-insensitive and also accepts a label with a
    /// substitution suffix (`FP32_xDLOPS`). The result follows canonical
    /// order. Unknown labels are dropped. An empty request selects every
    /// variant.
    pub fn select(&self, requested: &[String]) -> Vec<&'static Variant> {
        if requested.is_empty() {
            return self.variants.iter().collect();
        }

        let wanted: Vec<String> = requested.iter().map(|r| r.trim().to_lowercase()).collect();
        for label in &wanted {
            if !self.knows(label) {
                warn!(label = %label, supported = ?self.supported_labels(), "Ignoring unsupported variant");
            }
        }

        self.variants
            .iter()
            .filter(|variant| wanted.iter().any(|label| self.names(variant, label)))
            .collect()
    }

    /// Select `requested` and pick flags for each surviving variant.
    ///
    /// Variants with no baseline flags and no substitution for
    /// `architectures` are skipped.
    pub fn resolve(&self, requested: &[String], architectures: &BTreeSet<String>) -> Vec<ResolvedVariant> {
        self.select(requested)
            .into_iter()
            .filter_map(|variant| {
                let substitution = self
                    .substitutions
                    .iter()
                    .find(|sub| sub.label == variant.label && sub.applies_to(architectures));

                match (substitution, variant.flags) {
                    (Some(sub), _) => Some(ResolvedVariant {
                        label: variant.label,
                        metric: format!("{}{}", variant.label, sub.metric_suffix),
                        flags: sub.flags,
                    }),
                    (None, Some(flags)) => Some(ResolvedVariant {
                        label: variant.label,
                        metric: variant.label.to_string(),
                        flags,
                    }),
                    (None, None) => {
                        debug!(label = variant.label, ?architectures, "No flags for variant on this architecture");
                        None
                    }
                }
            })
            .collect()
    }

    fn knows(&self, label: &str) -> bool {
        self.variants.iter().any(|variant| self.names(variant, label))
    }

    fn names(&self, variant: &Variant, label: &str) -> bool {
        if variant.label.eq_ignore_ascii_case(label) {
            return true;
        }
        self.substitutions
            .iter()
            .filter(|sub| sub.label == variant.label && !sub.metric_suffix.is_empty())
            .any(|sub| format!("{}{}", sub.label, sub.metric_suffix).eq_ignore_ascii_case(label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static TABLE: VariantTable = VariantTable {
        variants: &[
            Variant { label: "FP64", flags: Some("-r f64_r") },
            Variant { label: "FP32", flags: Some("-r f32_r") },
            Variant { label: "FP16", flags: Some("-r f16_r") },
            Variant { label: "INT8", flags: None },
        ],
        substitutions: &[
            ArchFlags {
                label: "FP32",
                architectures: &["gfx908", "gfx90a"],
                flags: "-r f32_r --compute_type f32_r",
                metric_suffix: "_xDLOPS",
            },
            ArchFlags {
                label: "FP32",
                architectures: &["gfx90a"],
                flags: "unreachable",
                metric_suffix: "_other",
            },
            ArchFlags {
                label: "INT8",
                architectures: &["gfx90a"],
                flags: "--a_type i8_r",
                metric_suffix: "_xDLOPS",
            },
        ],
    };

    fn tags(tags: &[&str]) -> BTreeSet<String> {
        tags.iter().map(|t| t.to_string()).collect()
    }

    fn request(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|l| l.to_string()).collect()
    }

    #[test]
    fn test_empty_request_selects_all_in_canonical_order() {
        let labels: Vec<_> = TABLE.select(&[]).iter().map(|v| v.label).collect();
        assert_eq!(labels, vec!["FP64", "FP32", "FP16", "INT8"]);
    }

    #[test]
    fn test_select_keeps_canonical_order_and_drops_unknown() {
        let labels: Vec<_> = TABLE
            .select(&request(&["fp16", "BF64", "FP64"]))
            .iter()
            .map(|v| v.label)
            .collect();
        assert_eq!(labels, vec!["FP64", "FP16"]);
    }

    #[test]
    fn test_disjoint_request_is_empty() {
        assert!(TABLE.select(&request(&["BF64"])).is_empty());
        assert!(TABLE.resolve(&request(&["BF64"]), &tags(&["gfx90a"])).is_empty());
    }

    #[test]
    fn test_suffixed_label_selects_variant() {
        let labels: Vec<_> = TABLE
            .select(&request(&["fp32_xdlops"]))
            .iter()
            .map(|v| v.label)
            .collect();
        assert_eq!(labels, vec!["FP32"]);
    }

    #[test]
    fn test_baseline_flags_without_matching_architecture() {
        let resolved = TABLE.resolve(&[], &tags(&["gfx906"]));
        let metrics: Vec<_> = resolved.iter().map(|r| r.metric.as_str()).collect();
        assert_eq!(metrics, vec!["FP64", "FP32", "FP16"]);
        assert_eq!(resolved[1].flags, "-r f32_r");
    }

    #[test]
    fn test_first_matching_substitution_wins() {
        let resolved = TABLE.resolve(&[], &tags(&["gfx90a"]));
        let metrics: Vec<_> = resolved.iter().map(|r| r.metric.as_str()).collect();
        assert_eq!(metrics, vec!["FP64", "FP32_xDLOPS", "FP16", "INT8_xDLOPS"]);
        assert_eq!(resolved[1].flags, "-r f32_r --compute_type f32_r");
        assert_eq!(resolved[3].flags, "--a_type i8_r");
    }
}
