use serde::{Deserialize, Serialize};

use crate::models::RiskLevel;

pub const MIN_RISK_SCORE: f64 = 0.05;
pub const MAX_RISK_SCORE: f64 = 1.0;

/// Inputs the risk rules read. Built by the service from the resolved
/// record plus the model's duration estimate.
#[derive(Debug, Clone)]
pub struct RiskInput<'a> {
    pub age: f64,
    pub missions: u32,
    pub predicted_duration: f64,
    pub mission_complexity: f64,
    pub success_probability: f64,
    pub role: &'a str,
    pub launch_weather: &'a str,
    pub military: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub risk_factors: Vec<String>,
    pub recommendations: Vec<String>,
}

/// One additive risk contribution: a score function returning the signed
/// contribution (0 when the rule does not apply) and an explanation
/// rendered only when the rule fired.
struct RiskRule {
    score: fn(&RiskInput) -> f64,
    explain: fn(&RiskInput, f64) -> String,
}

/// Evaluated in declaration order; factor strings preserve this order.
const RISK_RULES: [RiskRule; 8] = [
    RiskRule {
        score: |input| {
            if input.age > 50.0 {
                (input.age - 50.0) * 0.02
            } else {
                0.0
            }
        },
        explain: |input, score| {
            format!(
                "Age-related risk: {:.0} years old (score: {:.3})",
                input.age, score
            )
        },
    },
    RiskRule {
        score: |input| {
            if input.missions < 3 {
                (3 - input.missions) as f64 * 0.1
            } else {
                0.0
            }
        },
        explain: |input, score| {
            format!(
                "Limited experience: {} missions completed (score: {:.3})",
                input.missions, score
            )
        },
    },
    RiskRule {
        score: |input| {
            if input.predicted_duration > 300.0 {
                (input.predicted_duration - 300.0) * 0.001
            } else {
                0.0
            }
        },
        explain: |input, score| {
            format!(
                "Extended mission duration: {:.1} hours (score: {:.3})",
                input.predicted_duration, score
            )
        },
    },
    RiskRule {
        score: |input| {
            if input.mission_complexity > 0.7 {
                (input.mission_complexity - 0.7) * 0.3
            } else {
                0.0
            }
        },
        explain: |input, score| {
            format!(
                "High mission complexity: {:.2} (score: {:.3})",
                input.mission_complexity, score
            )
        },
    },
    RiskRule {
        score: |input| {
            if input.success_probability < 0.9 {
                (0.9 - input.success_probability) * 0.5
            } else {
                0.0
            }
        },
        explain: |input, score| {
            format!(
                "Lower success probability: {:.2} (score: {:.3})",
                input.success_probability, score
            )
        },
    },
    RiskRule {
        score: |input| match input.role {
            "commander" => 0.1,
            "pilot" => 0.05,
            _ => 0.0,
        },
        explain: |input, score| {
            format!(
                "Leadership role responsibility: {} (score: {:.3})",
                input.role, score
            )
        },
    },
    RiskRule {
        score: |input| match input.launch_weather {
            "Poor" => 0.15,
            "Overcast" => 0.08,
            _ => 0.0,
        },
        explain: |input, score| {
            format!(
                "Adverse launch conditions: {} (score: {:.3})",
                input.launch_weather, score
            )
        },
    },
    RiskRule {
        score: |input| if input.military { -0.05 } else { 0.0 },
        explain: |_, score| format!("Military experience advantage (score: {:.3})", score),
    },
];

/// Recommendation checklist, evaluated independently of the risk rules.
struct Recommendation {
    applies: fn(&RiskInput, f64) -> bool,
    message: &'static str,
}

const RECOMMENDATIONS: [Recommendation; 9] = [
    Recommendation {
        applies: |input, _| input.age > 50.0,
        message: "Consider additional health monitoring for older astronaut",
    },
    Recommendation {
        applies: |input, _| input.missions < 3,
        message: "Provide additional training and mentorship",
    },
    Recommendation {
        applies: |input, _| input.predicted_duration > 300.0,
        message: "Plan for extended mission support and regular check-ins",
    },
    Recommendation {
        applies: |input, _| input.mission_complexity > 0.7,
        message: "Enhanced mission planning and contingency protocols for high complexity",
    },
    Recommendation {
        applies: |input, _| input.success_probability < 0.85,
        message: "Additional risk mitigation measures and backup plans required",
    },
    Recommendation {
        applies: |input, _| matches!(input.role, "commander" | "pilot"),
        message: "Leadership training and stress management protocols",
    },
    Recommendation {
        applies: |input, _| matches!(input.launch_weather, "Poor" | "Overcast"),
        message: "Monitor weather conditions and consider launch delay if necessary",
    },
    Recommendation {
        applies: |input, _| !input.military,
        message: "Additional stress and emergency response training recommended",
    },
    Recommendation {
        applies: |_, risk_score| risk_score > 0.6,
        message: "Implement enhanced safety protocols",
    },
];

/// Score the astronaut/mission profile. Pure and deterministic; this layer
/// never errors.
pub fn assess(input: &RiskInput) -> RiskAssessment {
    let mut total = 0.0;
    let mut risk_factors = Vec::new();

    for rule in &RISK_RULES {
        let contribution = (rule.score)(input);
        if contribution != 0.0 {
            total += contribution;
            risk_factors.push((rule.explain)(input, contribution));
        }
    }

    let risk_score = total.clamp(MIN_RISK_SCORE, MAX_RISK_SCORE);

    if risk_factors.is_empty() {
        risk_factors.push("No significant risk factors identified".to_string());
    }
    risk_factors.push(summary_for(risk_score).to_string());

    let mut recommendations: Vec<String> = RECOMMENDATIONS
        .iter()
        .filter(|r| (r.applies)(input, risk_score))
        .map(|r| r.message.to_string())
        .collect();
    if recommendations.is_empty() {
        recommendations.push("Standard mission protocols apply".to_string());
    }

    RiskAssessment {
        risk_score,
        risk_level: RiskLevel::from_score(risk_score),
        risk_factors,
        recommendations,
    }
}

fn summary_for(risk_score: f64) -> &'static str {
    if risk_score >= 0.6 {
        "High overall risk profile - requires enhanced monitoring"
    } else if risk_score >= 0.4 {
        "Moderate risk profile - standard protocols with additional precautions"
    } else {
        "Low risk profile - standard mission protocols apply"
    }
}
