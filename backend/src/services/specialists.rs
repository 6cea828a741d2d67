//! Domain specialists
//!
//! Each advisory domain has one specialist. A specialist turns the computed
//! facts into domain-focused fact lines (fed to the text generator) and a
//! templated advice list used when generation is unavailable.

use chrono::Datelike;
use serde::Serialize;
use shared::{
    CalibrationTable, CropType, Domain, Language, MarketOutlook, Recommendation, RiskAssessment,
    RiskLevel, TelemetrySnapshot, VegetationHealth,
};

/// Everything a specialist may draw on
pub struct AdvisoryFacts<'a> {
    pub language: Language,
    pub crop: Option<CropType>,
    pub location_name: Option<&'a str>,
    pub snapshot: Option<&'a TelemetrySnapshot>,
    pub environmental_score: Option<f64>,
    pub risk: Option<&'a RiskAssessment>,
    pub recommendation: &'a Recommendation,
    pub calibration: &'a CalibrationTable,
}

impl AdvisoryFacts<'_> {
    fn say(&self, en: &str, hi: &str) -> String {
        if self.language.prefers_hindi() {
            hi.to_string()
        } else {
            en.to_string()
        }
    }
}

pub trait Specialist: Send + Sync {
    fn domain(&self) -> Domain;

    /// Domain-specific facts, in English, for the generation prompt
    fn key_facts(&self, facts: &AdvisoryFacts) -> Vec<String>;

    /// Templated advice in the farmer's language
    fn advice(&self, facts: &AdvisoryFacts) -> Vec<String>;
}

/// Lookup table from domain to specialist
pub fn specialist_for(domain: Domain) -> &'static dyn Specialist {
    match domain {
        Domain::CropSelection => &CropSelectionSpecialist,
        Domain::PestManagement => &PestManagementSpecialist,
        Domain::Irrigation => &IrrigationSpecialist,
        Domain::FinancePolicy => &FinancePolicySpecialist,
        Domain::MarketTiming => &MarketTimingSpecialist,
        Domain::HarvestPlanning => &HarvestPlanningSpecialist,
        Domain::InputMaterials => &InputMaterialsSpecialist,
        Domain::General => &GeneralAdvisor,
    }
}

// ============================================================================
// Irrigation
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum IrrigationUrgency {
    Low,
    Moderate,
    High,
    Critical,
}

impl IrrigationUrgency {
    /// From soil moisture, eased one step by more than 10 mm of rain
    pub fn assess(soil_moisture: f64, precipitation: f64) -> Self {
        let urgency = if soil_moisture > 70.0 {
            IrrigationUrgency::Low
        } else if soil_moisture > 40.0 {
            IrrigationUrgency::Moderate
        } else if soil_moisture > 20.0 {
            IrrigationUrgency::High
        } else {
            IrrigationUrgency::Critical
        };

        if precipitation > 10.0 {
            match urgency {
                IrrigationUrgency::Critical => IrrigationUrgency::High,
                IrrigationUrgency::High => IrrigationUrgency::Moderate,
                _ => IrrigationUrgency::Low,
            }
        } else {
            urgency
        }
    }
}

struct IrrigationSpecialist;

impl Specialist for IrrigationSpecialist {
    fn domain(&self) -> Domain {
        Domain::Irrigation
    }

    fn key_facts(&self, facts: &AdvisoryFacts) -> Vec<String> {
        match facts.snapshot {
            Some(s) => vec![
                format!("Soil moisture {:.1}%, rainfall {:.1} mm", s.soil_moisture(), s.precipitation()),
                format!(
                    "Irrigation urgency: {:?}",
                    IrrigationUrgency::assess(s.soil_moisture(), s.precipitation())
                ),
            ],
            None => Vec::new(),
        }
    }

    fn advice(&self, facts: &AdvisoryFacts) -> Vec<String> {
        let Some(s) = facts.snapshot else {
            return vec![facts.say(
                "Check soil moisture by hand at 10-15 cm depth before irrigating.",
                "सिंचाई से पहले 10-15 सेमी गहराई पर मिट्टी की नमी हाथ से जांचें।",
            )];
        };

        let line = match IrrigationUrgency::assess(s.soil_moisture(), s.precipitation()) {
            IrrigationUrgency::Low => facts.say(
                "Soil moisture is sufficient. Skip irrigation for now.",
                "मिट्टी में पर्याप्त नमी है। अभी सिंचाई की ज़रूरत नहीं है।",
            ),
            IrrigationUrgency::Moderate => facts.say(
                "Plan irrigation within the next 3-4 days.",
                "अगले 3-4 दिनों में सिंचाई की योजना बनाएं।",
            ),
            IrrigationUrgency::High => facts.say(
                "Irrigate within 1-2 days, preferably early morning.",
                "1-2 दिन में सिंचाई करें, सुबह जल्दी करना बेहतर है।",
            ),
            IrrigationUrgency::Critical => facts.say(
                "Irrigate immediately. The crop is under water stress.",
                "तुरंत सिंचाई करें। फसल पानी की कमी से जूझ रही है।",
            ),
        };

        let mut lines = vec![line];
        if s.precipitation() > 10.0 {
            lines.push(facts.say(
                "Recent rain has reduced the need for irrigation.",
                "हाल की बारिश से सिंचाई की ज़रूरत कम हुई है।",
            ));
        }
        lines
    }
}

// ============================================================================
// Pest Management
// ============================================================================

/// Fungal disease pressure from humidity and temperature
pub fn fungal_risk(humidity: f64, temperature: f64) -> RiskLevel {
    let warm = (20.0..=30.0).contains(&temperature);
    if humidity > 80.0 && warm {
        RiskLevel::High
    } else if humidity > 65.0 {
        RiskLevel::Moderate
    } else {
        RiskLevel::Low
    }
}

struct PestManagementSpecialist;

impl Specialist for PestManagementSpecialist {
    fn domain(&self) -> Domain {
        Domain::PestManagement
    }

    fn key_facts(&self, facts: &AdvisoryFacts) -> Vec<String> {
        match facts.snapshot {
            Some(s) => vec![format!(
                "Humidity {:.0}%, temperature {:.1}°C, fungal risk {}",
                s.humidity(),
                s.temperature(),
                fungal_risk(s.humidity(), s.temperature()).as_str()
            )],
            None => Vec::new(),
        }
    }

    fn advice(&self, facts: &AdvisoryFacts) -> Vec<String> {
        let mut lines = vec![facts.say(
            "Scout the field twice a week and check the underside of leaves.",
            "हफ्ते में दो बार खेत का निरीक्षण करें और पत्तियों के नीचे जांचें।",
        )];
        let risk = facts
            .snapshot
            .map(|s| fungal_risk(s.humidity(), s.temperature()))
            .unwrap_or(RiskLevel::Moderate);
        if risk >= RiskLevel::High {
            lines.push(facts.say(
                "Humid, warm weather favours fungal disease. Consider a preventive fungicide spray.",
                "नम और गर्म मौसम में फफूंद रोग बढ़ते हैं। बचाव के लिए फफूंदनाशक का छिड़काव करें।",
            ));
        }
        lines.push(facts.say(
            "Start with neem-based sprays and consult your local KVK before chemical pesticides.",
            "पहले नीम आधारित दवा का उपयोग करें, रासायनिक दवा से पहले नज़दीकी KVK से सलाह लें।",
        ));
        lines
    }
}

// ============================================================================
// Crop Selection
// ============================================================================

/// Crops whose optimal temperature band contains the current temperature
pub fn suitable_crops(calibration: &CalibrationTable, temperature: f64) -> Vec<CropType> {
    calibration
        .all()
        .iter()
        .filter(|c| c.temperature_band.contains(temperature))
        .map(|c| c.crop)
        .collect()
}

struct CropSelectionSpecialist;

impl Specialist for CropSelectionSpecialist {
    fn domain(&self) -> Domain {
        Domain::CropSelection
    }

    fn key_facts(&self, facts: &AdvisoryFacts) -> Vec<String> {
        let Some(s) = facts.snapshot else {
            return Vec::new();
        };
        let crops = suitable_crops(facts.calibration, s.temperature());
        vec![
            format!("Vegetation health: {:?}", s.vegetation_health()),
            format!(
                "Crops suited to {:.1}°C: {}",
                s.temperature(),
                crops.iter().map(|c| c.as_str()).collect::<Vec<_>>().join(", ")
            ),
        ]
    }

    fn advice(&self, facts: &AdvisoryFacts) -> Vec<String> {
        let season = facts
            .snapshot
            .map(|s| s.date().month())
            .map(|month| if (6..=10).contains(&month) { "kharif" } else { "rabi" });

        let mut lines = Vec::new();
        if let Some(s) = facts.snapshot {
            let crops = suitable_crops(facts.calibration, s.temperature());
            if !crops.is_empty() {
                let names = crops.iter().map(|c| c.as_str()).collect::<Vec<_>>().join(", ");
                lines.push(if facts.language.prefers_hindi() {
                    format!("मौजूदा तापमान के लिए उपयुक्त फसलें: {}", names)
                } else {
                    format!("Crops suited to current temperatures: {}", names)
                });
            }
        }
        if let Some(season) = season {
            lines.push(if facts.language.prefers_hindi() {
                format!("यह {} मौसम है, प्रमाणित बीज ही चुनें।", season)
            } else {
                format!("This is the {} season. Choose certified seed.", season)
            });
        }
        lines.push(facts.say(
            "Get a soil test done before deciding on the crop.",
            "फसल तय करने से पहले मिट्टी की जांच करवाएं।",
        ));
        lines
    }
}

// ============================================================================
// Market Timing
// ============================================================================

struct MarketTimingSpecialist;

impl Specialist for MarketTimingSpecialist {
    fn domain(&self) -> Domain {
        Domain::MarketTiming
    }

    fn key_facts(&self, facts: &AdvisoryFacts) -> Vec<String> {
        let rec = facts.recommendation;
        if !rec.telemetry_integrated {
            return Vec::new();
        }
        let mut lines = vec![format!(
            "Expected price adjustment {:+.1}% ({:?} outlook)",
            rec.price_adjustment.value() * 100.0,
            rec.market_outlook.unwrap_or(MarketOutlook::Stable)
        )];
        if let Some(price) = rec.adjusted_price_per_quintal {
            lines.push(format!("Indicative price ₹{} per quintal", price));
        }
        lines
    }

    fn advice(&self, facts: &AdvisoryFacts) -> Vec<String> {
        let outlook = facts.recommendation.market_outlook;
        let mut lines = vec![match outlook {
            Some(MarketOutlook::Rising) => facts.say(
                "Regional supply looks tight. If you can store safely, holding for 2-3 weeks may fetch a better price.",
                "क्षेत्र में आपूर्ति कम दिख रही है। सुरक्षित भंडारण हो तो 2-3 हफ्ते रुकने से बेहतर भाव मिल सकता है।",
            ),
            Some(MarketOutlook::Falling) => facts.say(
                "A good harvest is expected across the region. Selling early may avoid a price dip.",
                "क्षेत्र में अच्छी पैदावार की उम्मीद है। जल्दी बेचने से भाव गिरने से बच सकते हैं।",
            ),
            _ => facts.say(
                "Prices look stable. Sell in instalments and compare rates on eNAM.",
                "भाव स्थिर दिख रहे हैं। किस्तों में बेचें और eNAM पर भाव की तुलना करें।",
            ),
        }];
        if let Some(price) = facts.recommendation.adjusted_price_per_quintal {
            lines.push(if facts.language.prefers_hindi() {
                format!("अनुमानित भाव: ₹{} प्रति क्विंटल", price)
            } else {
                format!("Indicative price: ₹{} per quintal", price)
            });
        }
        lines
    }
}

// ============================================================================
// Harvest Planning
// ============================================================================

struct HarvestPlanningSpecialist;

impl Specialist for HarvestPlanningSpecialist {
    fn domain(&self) -> Domain {
        Domain::HarvestPlanning
    }

    fn key_facts(&self, facts: &AdvisoryFacts) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(forecast) = &facts.recommendation.forecast {
            lines.push(format!(
                "Expected {} yield {:.2} t/ha ({:.0}% of normal)",
                forecast.crop(),
                forecast.adjusted_yield(),
                forecast.yield_ratio() * 100.0
            ));
        }
        if let Some(s) = facts.snapshot {
            lines.push(format!("Rainfall {:.1} mm, cloud cover {:.0}%", s.precipitation(), s.cloud_cover()));
        }
        lines
    }

    fn advice(&self, facts: &AdvisoryFacts) -> Vec<String> {
        let mut lines = Vec::new();
        if facts.snapshot.map(|s| s.precipitation() > 10.0).unwrap_or(false) {
            lines.push(facts.say(
                "Rain is likely. Delay harvesting until the field dries.",
                "बारिश की संभावना है। खेत सूखने तक कटाई टालें।",
            ));
        } else {
            lines.push(facts.say(
                "Weather is suitable for harvesting once the grain is mature.",
                "दाने पकने पर कटाई के लिए मौसम अनुकूल है।",
            ));
        }
        if let Some(forecast) = &facts.recommendation.forecast {
            lines.push(if facts.language.prefers_hindi() {
                format!("अनुमानित उपज: {:.2} टन/हेक्टेयर", forecast.adjusted_yield())
            } else {
                format!("Expected yield: {:.2} t/ha", forecast.adjusted_yield())
            });
        }
        lines
    }
}

// ============================================================================
// Finance & Policy
// ============================================================================

struct FinancePolicySpecialist;

impl Specialist for FinancePolicySpecialist {
    fn domain(&self) -> Domain {
        Domain::FinancePolicy
    }

    fn key_facts(&self, facts: &AdvisoryFacts) -> Vec<String> {
        facts
            .risk
            .map(|r| vec![format!("Crop risk level {}", r.risk_level.as_str())])
            .unwrap_or_default()
    }

    fn advice(&self, facts: &AdvisoryFacts) -> Vec<String> {
        let mut lines = vec![facts.say(
            "A Kisan Credit Card gives short-term crop loans at subsidised interest.",
            "किसान क्रेडिट कार्ड से कम ब्याज पर फसल ऋण मिलता है।",
        )];
        let elevated = facts
            .risk
            .map(|r| r.risk_level >= RiskLevel::High)
            .unwrap_or(false);
        if elevated {
            lines.push(facts.say(
                "Field conditions show elevated risk. Make sure the crop is insured under PMFBY.",
                "खेत में जोखिम अधिक है। सुनिश्चित करें कि फसल PMFBY में बीमित है।",
            ));
        } else {
            lines.push(facts.say(
                "Check PM-KISAN and state subsidy schemes at your nearest CSC.",
                "PM-KISAN और राज्य की सब्सिडी योजनाओं की जानकारी नज़दीकी CSC से लें।",
            ));
        }
        lines
    }
}

// ============================================================================
// Input Materials
// ============================================================================

struct InputMaterialsSpecialist;

impl Specialist for InputMaterialsSpecialist {
    fn domain(&self) -> Domain {
        Domain::InputMaterials
    }

    fn key_facts(&self, facts: &AdvisoryFacts) -> Vec<String> {
        match facts.snapshot {
            Some(s) => vec![format!(
                "NDVI {:.2} ({:?}), soil moisture {:.1}%",
                s.ndvi(),
                s.vegetation_health(),
                s.soil_moisture()
            )],
            None => Vec::new(),
        }
    }

    fn advice(&self, facts: &AdvisoryFacts) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(s) = facts.snapshot {
            if matches!(
                s.vegetation_health(),
                VegetationHealth::Poor | VegetationHealth::Critical
            ) {
                lines.push(facts.say(
                    "Crop vigour is low. A nitrogen top dressing may help.",
                    "फसल की बढ़वार कमज़ोर है। नाइट्रोजन की टॉप ड्रेसिंग मददगार हो सकती है।",
                ));
            }
            if s.soil_moisture() < 20.0 {
                lines.push(facts.say(
                    "Apply urea only after irrigation, not on dry soil.",
                    "यूरिया सूखी मिट्टी में न डालें, सिंचाई के बाद ही डालें।",
                ));
            }
        }
        lines.push(facts.say(
            "Follow your Soil Health Card for NPK doses and add organic manure.",
            "NPK की मात्रा मृदा स्वास्थ्य कार्ड के अनुसार दें और गोबर की खाद मिलाएं।",
        ));
        lines
    }
}

// ============================================================================
// General
// ============================================================================

struct GeneralAdvisor;

impl Specialist for GeneralAdvisor {
    fn domain(&self) -> Domain {
        Domain::General
    }

    fn key_facts(&self, facts: &AdvisoryFacts) -> Vec<String> {
        facts
            .environmental_score
            .map(|score| vec![format!("Environmental score {:.0}/100", score)])
            .unwrap_or_default()
    }

    fn advice(&self, facts: &AdvisoryFacts) -> Vec<String> {
        vec![facts.say(
            "Tell us your crop and what you need help with: water, pests, fertiliser, prices or loans.",
            "अपनी फसल और समस्या बताइए: पानी, कीट, खाद, भाव या ऋण।",
        )]
    }
}
