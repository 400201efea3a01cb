// ============================================================
// Layer 2 - InspectUseCase
// ============================================================
// Quick look at a site before training: grid sizes, the time
// range and the per-level climatology of each variable.

use anyhow::Result;
use serde::Serialize;

use crate::domain::traits::ProfileSource;

#[derive(Debug, Clone, Serialize)]
pub struct VariableSummary {
    pub variable:    String,
    pub level_means: Vec<f32>,
    pub level_stds:  Vec<f32>,
    /// Standard deviation over the whole grid (the standardization scale)
    pub global_std:  f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SiteSummary {
    pub geo_id:     String,
    pub n_time:     usize,
    pub pressures:  Vec<f64>,
    pub first_time: Option<f64>,
    pub last_time:  Option<f64>,
    pub variables:  Vec<VariableSummary>,
}

impl SiteSummary {
    /// Fixed-width table: one line per level, mean ± std per variable.
    pub fn render(&self) -> String {
        let mut out = format!(
            "Site {}: {} time steps, {} levels, time {} .. {}\n",
            self.geo_id,
            self.n_time,
            self.pressures.len(),
            self.first_time.map_or("-".to_string(), |t| t.to_string()),
            self.last_time.map_or("-".to_string(), |t| t.to_string()),
        );

        out.push_str(&format!("{:>10}", "pressure"));
        for v in &self.variables {
            out.push_str(&format!(" {:>26}", format!("{} mean ± std", v.variable)));
        }
        out.push('\n');

        for (l, p) in self.pressures.iter().enumerate() {
            out.push_str(&format!("{:>10.1}", p));
            for v in &self.variables {
                out.push_str(&format!(" {:>12.4e} ± {:>11.4e}", v.level_means[l], v.level_stds[l]));
            }
            out.push('\n');
        }
        out
    }
}

pub struct InspectUseCase<'a> {
    source: &'a dyn ProfileSource,
}

impl<'a> InspectUseCase<'a> {
    pub fn new(source: &'a dyn ProfileSource) -> Self {
        Self { source }
    }

    pub fn summarize(&self, geo_id: &str) -> Result<SiteSummary> {
        let site = self.source.load_site(geo_id)?;

        let variables = [&site.temperature, &site.humidity, &site.vertical_velocity]
            .into_iter()
            .map(|s| VariableSummary {
                variable:    s.variable.clone(),
                level_means: s.level_means(),
                level_stds:  s.level_stds(),
                global_std:  s.global_std(),
            })
            .collect();

        Ok(SiteSummary {
            geo_id:     site.geo_id.clone(),
            n_time:     site.n_time(),
            pressures:  site.pressures.clone(),
            first_time: site.times.first().copied(),
            last_time:  site.times.last().copied(),
            variables,
        })
    }
}
