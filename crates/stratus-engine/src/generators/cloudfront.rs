//! CloudFront distribution origins to S3 buckets.
//!
//! Origins name buckets by domain, so every domain a bucket can be reached
//! at is reconstructed and matched against the origin domains.

use stratus_core::errors::{GraphError, SelectorError};
use stratus_core::FxHashMap;

use super::{normalize_dns, str_field, str_list, EdgeGenerator, GeneratorContext, GeneratorOutput};
use crate::graph::types::GraphEdge;
use crate::selector::Selector;

/// Items: `{id, origins: [domain...]}`.
pub const DEFAULT_DISTRIBUTIONS_SELECTOR: &str = "CloudFront|ListDistributions|[*].result.DistributionList.Items[].{id: ARN, origins: Origins.Items[].DomainName}";
/// Items: `{name, region?}`. Buckets without a region are tried in every scanned region.
pub const DEFAULT_BUCKETS_SELECTOR: &str =
    "S3|ListBuckets|[*].result.Buckets[].{name: Name, region: BucketRegion}";

#[derive(Debug, Clone)]
pub struct CloudFrontOriginGenerator {
    pub distributions: Selector,
    pub buckets: Selector,
}

impl CloudFrontOriginGenerator {
    pub fn new(distributions: &str, buckets: &str) -> Result<Self, SelectorError> {
        Ok(Self {
            distributions: Selector::parse(distributions)?,
            buckets: Selector::parse(buckets)?,
        })
    }

    pub fn builtin() -> Result<Self, SelectorError> {
        Self::new(DEFAULT_DISTRIBUTIONS_SELECTOR, DEFAULT_BUCKETS_SELECTOR)
    }
}

/// REST and website endpoints for a bucket: global, legacy `s3-<region>`,
/// and dotted regional forms.
pub fn bucket_domains(bucket: &str, region: Option<&str>, known_regions: &[String]) -> Vec<String> {
    let mut domains = vec![format!("{bucket}.s3.amazonaws.com")];
    let regions: Vec<&str> = match region {
        Some(r) => vec![r],
        None => known_regions.iter().map(String::as_str).collect(),
    };
    for region in regions {
        domains.push(format!("{bucket}.s3.{region}.amazonaws.com"));
        domains.push(format!("{bucket}.s3-{region}.amazonaws.com"));
        domains.push(format!("{bucket}.s3-website-{region}.amazonaws.com"));
        domains.push(format!("{bucket}.s3-website.{region}.amazonaws.com"));
    }
    domains
}

impl EdgeGenerator for CloudFrontOriginGenerator {
    fn name(&self) -> &str {
        "cloudfront-s3-origin"
    }

    fn generate(&self, ctx: &GeneratorContext<'_>) -> Result<GeneratorOutput, GraphError> {
        let distributions = ctx.evaluate(&self.distributions)?;
        if distributions.is_empty() {
            return Ok(GeneratorOutput::default());
        }

        let known_regions: Vec<String> = ctx.known_regions()?.into_iter().collect();
        let mut by_domain: FxHashMap<String, String> = FxHashMap::default();
        for bucket in ctx.evaluate(&self.buckets)? {
            let Some(name) = str_field(&bucket, "name") else {
                continue;
            };
            for domain in bucket_domains(name, str_field(&bucket, "region"), &known_regions) {
                by_domain.entry(normalize_dns(&domain)).or_insert_with(|| name.to_string());
            }
        }

        let mut output = GeneratorOutput::default();
        for distribution in &distributions {
            let Some(id) = str_field(distribution, "id") else {
                continue;
            };
            for origin in str_list(distribution, "origins") {
                if let Some(bucket) = by_domain.get(&normalize_dns(origin)) {
                    output.edges.push(GraphEdge::new(id, bucket.clone(), "origin"));
                }
            }
        }
        Ok(output)
    }
}
