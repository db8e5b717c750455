use super::{ensure_finite, ensure_non_negative, ensure_positive};
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Two species competing for shared resources (Lotka-Volterra competition).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompetitionParams {
    pub growth_a: f64,
    pub growth_b: f64,
    pub capacity_a: f64,
    pub capacity_b: f64,
    /// Competitive pressure one `B` individual puts on `A`.
    pub effect_of_b_on_a: f64,
    pub effect_of_a_on_b: f64,
}

impl CompetitionParams {
    pub fn new(
        growth_a: f64,
        growth_b: f64,
        capacity_a: f64,
        capacity_b: f64,
        effect_of_b_on_a: f64,
        effect_of_a_on_b: f64,
    ) -> Result<Self> {
        let params = Self {
            growth_a,
            growth_b,
            capacity_a,
            capacity_b,
            effect_of_b_on_a,
            effect_of_a_on_b,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        ensure_finite("growth_a", self.growth_a)?;
        ensure_finite("growth_b", self.growth_b)?;
        ensure_positive("capacity_a", self.capacity_a)?;
        ensure_positive("capacity_b", self.capacity_b)?;
        ensure_non_negative("effect_of_b_on_a", self.effect_of_b_on_a)?;
        ensure_non_negative("effect_of_a_on_b", self.effect_of_a_on_b)
    }
}

/// `A' = A + r_a A (1 - (A + alpha_ab B) / K_a)` and the mirror update for `B`.
pub fn competition_map(
    first: &[f64],
    second: &[f64],
    params: &CompetitionParams,
) -> Result<(Vec<f64>, Vec<f64>)> {
    if first.len() != second.len() {
        bail!(
            "Competitor vectors differ in length ({} vs {}).",
            first.len(),
            second.len()
        );
    }
    let p = params;
    Ok(first
        .iter()
        .zip(second)
        .map(|(&a, &b)| {
            let next_a = a + p.growth_a * a * (1.0 - (a + p.effect_of_b_on_a * b) / p.capacity_a);
            let next_b = b + p.growth_b * b * (1.0 - (b + p.effect_of_a_on_b * a) / p.capacity_b);
            (next_a.max(0.0), next_b.max(0.0))
        })
        .unzip())
}

#[cfg(test)]
mod tests {
    use super::{competition_map, CompetitionParams};
    use crate::models::test_support::assert_err_contains;
    use crate::simulate::simulate_pair;

    #[test]
    fn validation_rejects_negative_competition() {
        assert_err_contains(
            CompetitionParams::new(0.5, 0.4, 100.0, 80.0, -0.1, 0.5),
            "effect_of_b_on_a",
        );
        assert_err_contains(
            CompetitionParams::new(0.5, 0.4, 100.0, 0.0, 0.1, 0.5),
            "capacity_b",
        );
    }

    #[test]
    fn weak_competition_leads_to_coexistence() {
        let params = CompetitionParams::new(0.5, 0.4, 100.0, 80.0, 0.6, 0.5).expect("params");
        let (a, b) = simulate_pair(&[5.0], &[5.0], &mut competition_map, 500, &params)
            .expect("simulation");
        // A* = (K_a - alpha_ab K_b) / (1 - alpha_ab alpha_ba), B* likewise
        let denom = 1.0 - 0.6 * 0.5;
        let expected_a = (100.0 - 0.6 * 80.0) / denom;
        let expected_b = (80.0 - 0.5 * 100.0) / denom;
        assert!((a.last()[0] - expected_a).abs() < 1e-6);
        assert!((b.last()[0] - expected_b).abs() < 1e-6);
    }

    #[test]
    fn strong_competitor_excludes_the_other() {
        let params = CompetitionParams::new(0.5, 0.5, 100.0, 100.0, 0.5, 1.5).expect("params");
        let (a, b) = simulate_pair(&[5.0], &[5.0], &mut competition_map, 2_000, &params)
            .expect("simulation");
        assert!((a.last()[0] - 100.0).abs() < 1e-3);
        assert!(b.last()[0] < 1e-3);
    }

    #[test]
    fn lone_species_follows_logistic_growth() {
        let params = CompetitionParams::new(0.3, 0.3, 50.0, 50.0, 1.0, 1.0).expect("params");
        let (a, b) = simulate_pair(&[1.0], &[0.0], &mut competition_map, 300, &params)
            .expect("simulation");
        assert!((a.last()[0] - 50.0).abs() < 1e-6);
        assert_eq!(b.last(), vec![0.0]);
    }
}
