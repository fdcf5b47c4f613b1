//! Route 53 alias records to their targets, matched by DNS name.

use stratus_core::errors::{GraphError, SelectorError};
use stratus_core::FxHashMap;

use super::{normalize_dns, str_field, EdgeGenerator, GeneratorContext, GeneratorOutput};
use crate::graph::types::GraphEdge;
use crate::selector::Selector;

/// Items: `{name, dnsName}`.
pub const DEFAULT_RECORDS_SELECTOR: &str = "Route53|ListResourceRecordSets|[*].result.ResourceRecordSets[] | [?AliasTarget].{name: Name, dnsName: AliasTarget.DNSName}";
/// Items: `{id, domainName}`.
pub const DEFAULT_DISTRIBUTIONS_SELECTOR: &str =
    "CloudFront|ListDistributions|[*].result.DistributionList.Items[].{id: ARN, domainName: DomainName}";
/// Items: bucket names.
pub const DEFAULT_BUCKETS_SELECTOR: &str = "S3|ListBuckets|[*].result.Buckets[].Name";
/// Items: `{id, dnsName}`.
pub const DEFAULT_LOAD_BALANCERS_SELECTOR: &str = "ElasticLoadBalancingV2|DescribeLoadBalancers|[*].result.LoadBalancers[].{id: LoadBalancerArn, dnsName: DNSName}";

const CLOUDFRONT_SUFFIX: &str = ".cloudfront.net";
const ELB_SUFFIX: &str = ".elb.amazonaws.com";
const S3_WEBSITE_MARKER: &str = "s3-website";

/// Alias record → CloudFront distribution, S3 website bucket, or load balancer.
#[derive(Debug, Clone)]
pub struct Route53AliasGenerator {
    pub records: Selector,
    pub distributions: Selector,
    pub buckets: Selector,
    pub load_balancers: Selector,
}

impl Route53AliasGenerator {
    pub fn new(
        records: &str,
        distributions: &str,
        buckets: &str,
        load_balancers: &str,
    ) -> Result<Self, SelectorError> {
        Ok(Self {
            records: Selector::parse(records)?,
            distributions: Selector::parse(distributions)?,
            buckets: Selector::parse(buckets)?,
            load_balancers: Selector::parse(load_balancers)?,
        })
    }

    pub fn builtin() -> Result<Self, SelectorError> {
        Self::new(
            DEFAULT_RECORDS_SELECTOR,
            DEFAULT_DISTRIBUTIONS_SELECTOR,
            DEFAULT_BUCKETS_SELECTOR,
            DEFAULT_LOAD_BALANCERS_SELECTOR,
        )
    }
}

impl EdgeGenerator for Route53AliasGenerator {
    fn name(&self) -> &str {
        "route53-alias"
    }

    fn generate(&self, ctx: &GeneratorContext<'_>) -> Result<GeneratorOutput, GraphError> {
        let records = ctx.evaluate(&self.records)?;
        if records.is_empty() {
            return Ok(GeneratorOutput::default());
        }

        let distributions: FxHashMap<String, String> = ctx
            .evaluate(&self.distributions)?
            .iter()
            .filter_map(|d| Some((normalize_dns(str_field(d, "domainName")?), str_field(d, "id")?.to_string())))
            .collect();
        let load_balancers: FxHashMap<String, String> = ctx
            .evaluate(&self.load_balancers)?
            .iter()
            .filter_map(|lb| Some((normalize_dns(str_field(lb, "dnsName")?), str_field(lb, "id")?.to_string())))
            .collect();
        let buckets: Vec<String> = ctx
            .evaluate(&self.buckets)?
            .iter()
            .filter_map(|b| b.as_str().map(str::to_string))
            .collect();

        let mut output = GeneratorOutput::default();
        for record in &records {
            let (Some(name), Some(dns)) = (str_field(record, "name"), str_field(record, "dnsName")) else {
                continue;
            };
            let dns = normalize_dns(dns);

            let target = if dns.ends_with(CLOUDFRONT_SUFFIX) {
                distributions.get(&dns).cloned()
            } else if dns.contains(S3_WEBSITE_MARKER) {
                let bucket = normalize_dns(name);
                buckets.iter().find(|b| **b == bucket).cloned()
            } else if dns.ends_with(ELB_SUFFIX) {
                let dns = dns.strip_prefix("dualstack.").unwrap_or(&dns);
                load_balancers.get(dns).cloned()
            } else {
                None
            };

            match target {
                Some(target) => output.edges.push(GraphEdge::new(name, target, "alias")),
                None => tracing::debug!(record = name, dns = %dns, "alias target not found"),
            }
        }
        Ok(output)
    }
}
