//! Advisory domains a query can be routed to

use serde::{Deserialize, Serialize};

use crate::types::Language;

/// Closed set of advisory specializations
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    CropSelection,
    PestManagement,
    Irrigation,
    FinancePolicy,
    MarketTiming,
    HarvestPlanning,
    InputMaterials,
    General,
}

impl Domain {
    pub const ALL: [Domain; 8] = [
        Domain::CropSelection,
        Domain::PestManagement,
        Domain::Irrigation,
        Domain::FinancePolicy,
        Domain::MarketTiming,
        Domain::HarvestPlanning,
        Domain::InputMaterials,
        Domain::General,
    ];

    /// Tie-break order, most urgent first
    pub const PRIORITY: [Domain; 8] = [
        Domain::PestManagement,
        Domain::Irrigation,
        Domain::CropSelection,
        Domain::MarketTiming,
        Domain::HarvestPlanning,
        Domain::FinancePolicy,
        Domain::InputMaterials,
        Domain::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::CropSelection => "crop_selection",
            Domain::PestManagement => "pest_management",
            Domain::Irrigation => "irrigation",
            Domain::FinancePolicy => "finance_policy",
            Domain::MarketTiming => "market_timing",
            Domain::HarvestPlanning => "harvest_planning",
            Domain::InputMaterials => "input_materials",
            Domain::General => "general",
        }
    }

    /// Parse a domain tag, accepting the short aliases used in prompts
    pub fn parse(tag: &str) -> Option<Self> {
        let normalized = tag.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "crop_selection" | "crop" | "crops" => Some(Domain::CropSelection),
            "pest_management" | "pest" | "pests" | "disease" => Some(Domain::PestManagement),
            "irrigation" | "water" => Some(Domain::Irrigation),
            "finance_policy" | "finance" | "policy" | "credit" => Some(Domain::FinancePolicy),
            "market_timing" | "market" | "price" => Some(Domain::MarketTiming),
            "harvest_planning" | "harvest" => Some(Domain::HarvestPlanning),
            "input_materials" | "inputs" | "fertilizer" => Some(Domain::InputMaterials),
            "general" => Some(Domain::General),
            _ => None,
        }
    }

    /// Position in [`Domain::PRIORITY`]; lower wins ties
    pub fn priority_rank(&self) -> usize {
        Domain::PRIORITY
            .iter()
            .position(|d| d == self)
            .unwrap_or(Domain::PRIORITY.len())
    }

    /// Specialist name reported as `agent` in responses
    pub fn agent_name(&self) -> &'static str {
        match self {
            Domain::CropSelection => "crop_selection_specialist",
            Domain::PestManagement => "pest_management_specialist",
            Domain::Irrigation => "irrigation_specialist",
            Domain::FinancePolicy => "finance_policy_specialist",
            Domain::MarketTiming => "market_timing_specialist",
            Domain::HarvestPlanning => "harvest_planning_specialist",
            Domain::InputMaterials => "input_materials_specialist",
            Domain::General => "general_advisor",
        }
    }

    pub fn display_name(&self, language: Language) -> &'static str {
        match (self, language) {
            (Domain::CropSelection, Language::English) => "Crop selection",
            (Domain::CropSelection, _) => "फसल चयन",
            (Domain::PestManagement, Language::English) => "Pest management",
            (Domain::PestManagement, _) => "कीट प्रबंधन",
            (Domain::Irrigation, Language::English) => "Irrigation",
            (Domain::Irrigation, _) => "सिंचाई",
            (Domain::FinancePolicy, Language::English) => "Finance and schemes",
            (Domain::FinancePolicy, _) => "ऋण और योजनाएं",
            (Domain::MarketTiming, Language::English) => "Market timing",
            (Domain::MarketTiming, _) => "मंडी और भाव",
            (Domain::HarvestPlanning, Language::English) => "Harvest planning",
            (Domain::HarvestPlanning, _) => "कटाई योजना",
            (Domain::InputMaterials, Language::English) => "Fertilizers and inputs",
            (Domain::InputMaterials, _) => "खाद और उर्वरक",
            (Domain::General, Language::English) => "General advice",
            (Domain::General, _) => "सामान्य सलाह",
        }
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
