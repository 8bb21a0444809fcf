// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Log dialect detection from the object key.
//!
//! AWS services name their log objects after fixed templates, so the key alone
//! is enough to pick a parser:
//!
//! ```text
//! ELB         123456789012_elasticloadbalancing_us-east-1_my-elb_20140215T2340Z_172.160.001.192_20sg3p1y.log
//! ALB         123456789012_elasticloadbalancing_us-east-2_app.my-lb.1234_20140215T2340Z_172.160.001.192_20sg3p1y.log.gz
//! CloudFront  E2K2LNL5N3WR51.2016-05-30-14.e1f3c8b4.gz
//! CloudTrail  123456789012_CloudTrail_us-east-2_20150801T0210Z_Mu0KsOhtH1ar15ZZ.json.gz
//! ```
//!
//! The ELB and ALB templates only differ by the `.gz` suffix. The rules are
//! evaluated in declaration order and the first match wins, so ELB must stay
//! ahead of ALB.

use regex::{Regex, RegexBuilder};
use std::fmt;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogDialect {
    Elb,
    Alb,
    CloudFront,
    CloudTrail,
    Unrecognized,
}

impl fmt::Display for LogDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Elb => "AWS ELB",
            Self::Alb => "AWS ALB",
            Self::CloudFront => "AWS CloudFront",
            Self::CloudTrail => "AWS CloudTrail",
            Self::Unrecognized => "unrecognized",
        };
        f.write_str(name)
    }
}

/// Key templates in priority order
const RULES: [(&str, LogDialect); 4] = [
    (
        r"\d+_\w+_\w{2}-\w{4,9}-[12]_.*._\d{8}T\d{4}Z_\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}_.*\.log$",
        LogDialect::Elb,
    ),
    (
        r"\d+_\w+_\w{2}-\w{4,9}-[12]_.*._\d{8}T\d{4}Z_\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}_.*\.log\.gz$",
        LogDialect::Alb,
    ),
    (r"\w+\.\d{4}-\d{2}-\d{2}-\d{2}\.\w+\.gz$", LogDialect::CloudFront),
    (
        r"\d+_CloudTrail_\w{2}-\w{4,9}-[12]_\d{8}T\d{4}Z.+\.json\.gz$",
        LogDialect::CloudTrail,
    ),
];

#[allow(clippy::expect_used)]
fn compiled_rules() -> &'static [(Regex, LogDialect)] {
    static COMPILED: OnceLock<Vec<(Regex, LogDialect)>> = OnceLock::new();
    COMPILED.get_or_init(|| {
        RULES
            .iter()
            .map(|(pattern, dialect)| {
                let regex = RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .expect("failed creating regex");
                (regex, *dialect)
            })
            .collect()
    })
}

/// Picks the dialect of an object from its (already percent-decoded) key.
pub fn classify(key: &str) -> LogDialect {
    compiled_rules()
        .iter()
        .find(|(regex, _)| regex.is_match(key))
        .map_or(LogDialect::Unrecognized, |(_, dialect)| *dialect)
}
