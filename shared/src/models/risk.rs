//! Environmental risk assessment models

use serde::{Deserialize, Serialize};

/// Ordinal stress severity
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl RiskLevel {
    /// 0 ⇒ low, 1 ⇒ moderate, 2 ⇒ high, 3+ ⇒ very high
    pub fn from_stress_count(count: usize) -> Self {
        match count {
            0 => RiskLevel::Low,
            1 => RiskLevel::Moderate,
            2 => RiskLevel::High,
            _ => RiskLevel::VeryHigh,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Moderate => "moderate",
            RiskLevel::High => "high",
            RiskLevel::VeryHigh => "very_high",
        }
    }

    /// Upper-case label used in technical metrics
    pub fn as_upper(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Moderate => "MODERATE",
            RiskLevel::High => "HIGH",
            RiskLevel::VeryHigh => "VERY_HIGH",
        }
    }

    pub fn label_hi(&self) -> &'static str {
        match self {
            RiskLevel::Low => "कम",
            RiskLevel::Moderate => "मध्यम",
            RiskLevel::High => "अधिक",
            RiskLevel::VeryHigh => "बहुत अधिक",
        }
    }
}

/// A condition that contributed to the risk level
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StressFactor {
    /// NDVI below 0.3
    LowVegetation,
    /// Soil moisture below 20%
    SevereDrought,
    /// Temperature above the optimal band
    HeatStress,
    /// Temperature below the optimal band
    ColdStress,
}

impl StressFactor {
    pub fn description(&self) -> &'static str {
        match self {
            StressFactor::LowVegetation => "Low vegetation vigour",
            StressFactor::SevereDrought => "Severe soil moisture deficit",
            StressFactor::HeatStress => "Temperature above optimal range",
            StressFactor::ColdStress => "Temperature below optimal range",
        }
    }

    pub fn description_hi(&self) -> &'static str {
        match self {
            StressFactor::LowVegetation => "फसल की बढ़वार कमज़ोर",
            StressFactor::SevereDrought => "मिट्टी में नमी की भारी कमी",
            StressFactor::HeatStress => "तापमान सामान्य से अधिक",
            StressFactor::ColdStress => "तापमान सामान्य से कम",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskAssessment {
    pub risk_level: RiskLevel,
    pub stress_factors: Vec<StressFactor>,
}

impl RiskAssessment {
    /// Risk level is always derived from the factor count
    pub fn from_factors(stress_factors: Vec<StressFactor>) -> Self {
        Self {
            risk_level: RiskLevel::from_stress_count(stress_factors.len()),
            stress_factors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ladder() {
        assert_eq!(RiskLevel::from_stress_count(0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_stress_count(2), RiskLevel::High);
        assert_eq!(RiskLevel::from_stress_count(7), RiskLevel::VeryHigh);
        assert!(RiskLevel::VeryHigh > RiskLevel::Moderate);
    }

    #[test]
    fn test_assessment_from_factors() {
        let assessment =
            RiskAssessment::from_factors(vec![StressFactor::SevereDrought, StressFactor::HeatStress]);
        assert_eq!(assessment.risk_level, RiskLevel::High);
        assert_eq!(serde_json::to_value(assessment.risk_level).unwrap(), "high");
    }
}
