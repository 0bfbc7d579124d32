//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

//! Statistics collector

use stats::{MinMax, OnlineStats};
use std::collections::BTreeMap;
use std::fmt;

/// Milliseconds
type MeasurementType = u64;

struct StatCollector {
    online: OnlineStats,
    minmax: MinMax<MeasurementType>,
}

pub struct StatResults {
    pub len: usize,
    pub min: MeasurementType,
    pub max: MeasurementType,
    pub mean: f64,
    pub stddev: f64,
}

/// Render durations keyed by zoom level
#[derive(Default)]
pub struct Statistics(BTreeMap<String, StatCollector>);

impl Statistics {
    pub fn new() -> Statistics {
        Statistics(BTreeMap::new())
    }
    pub fn add(&mut self, key: &str, value: MeasurementType) {
        let collector = self.0.entry(key.to_string()).or_insert(StatCollector {
            online: OnlineStats::new(),
            minmax: MinMax::new(),
        });
        collector.online.add(value);
        collector.minmax.add(value);
    }
    pub fn results(&self, key: &str) -> StatResults {
        match self.0.get(key) {
            Some(collector) => StatResults {
                len: collector.minmax.len(),
                min: *collector.minmax.min().unwrap_or(&0),
                max: *collector.minmax.max().unwrap_or(&0),
                mean: collector.online.mean(),
                stddev: collector.online.stddev(),
            },
            None => StatResults {
                len: 0,
                min: 0,
                max: 0,
                mean: 0.0,
                stddev: 0.0,
            },
        }
    }
}

impl fmt::Debug for StatResults {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "#renders: {}, min: {}ms, max: {}ms, mean: {:.1}ms +/- {:.1}",
            self.len, self.min, self.max, self.mean, self.stddev
        )
    }
}

impl fmt::Debug for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for key in self.0.keys() {
            writeln!(f, "{}: {:?}", key, self.results(key))?;
        }
        Ok(())
    }
}

#[test]
fn usage() {
    let mut stats = Statistics::new();
    stats.add("zoom 10", 100);
    assert_eq!(stats.results("zoom 10").mean, 100.0);
    stats.add("zoom 10", 200);
    stats.add("zoom 11", 50);
    stats.add("zoom 10", 300);
    let res = stats.results("zoom 10");
    assert_eq!(res.mean, 200.0);
    assert_eq!(res.len, 3);
    assert_eq!(res.min, 100);
    assert_eq!(res.max, 300);
    assert_eq!(stats.results("zoom 11").len, 1);
    assert_eq!(stats.results("zoom 12").mean, 0.0);
    assert_eq!(
        format!("{:?}", stats.results("zoom 11")),
        "#renders: 1, min: 50ms, max: 50ms, mean: 50.0ms +/- 0.0"
    );
}
