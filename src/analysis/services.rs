use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::errors::ParseError;
use crate::settings::Settings;

lazy_static! {
    static ref UNIT_SUFFIX: Regex = Regex::new(r"(?i)\s*(grams?|g)$").unwrap();
}

const CARBS_LABEL: &str = "CARBS:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// Structured view of a vision reply. Only `carbs_g` is required.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MealAnalysis {
    pub carbs_g: f64,
    pub protein_g: Option<f64>,
    pub fat_g: Option<f64>,
    pub confidence: Option<Confidence>,
    pub foods: Vec<String>,
    pub notes: Option<String>,
}

/// Carbohydrate grams from the first `CARBS:` line. Later CARBS lines are
/// ignored even when the first one is unusable.
pub fn parse_carbs(text: &str) -> Result<f64, ParseError> {
    let raw = labelled_value(text, CARBS_LABEL).ok_or(ParseError::MissingCarbs)?;
    parse_grams(raw).ok_or_else(|| ParseError::InvalidNumber(raw.to_string()))
}

pub fn parse_analysis(text: &str) -> Result<MealAnalysis, ParseError> {
    let carbs_g = parse_carbs(text)?;

    let confidence = labelled_value(text, "CONFIDENCE:").and_then(|v| {
        match v.to_ascii_lowercase().as_str() {
            "high" => Some(Confidence::High),
            "medium" => Some(Confidence::Medium),
            "low" => Some(Confidence::Low),
            _ => None,
        }
    });

    let foods = labelled_value(text, "FOODS:")
        .map(|v| {
            v.trim_start_matches('[')
                .trim_end_matches(']')
                .split(',')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Ok(MealAnalysis {
        carbs_g,
        protein_g: labelled_value(text, "PROTEIN:").and_then(parse_grams),
        fat_g: labelled_value(text, "FAT:").and_then(parse_grams),
        confidence,
        foods,
        notes: labelled_value(text, "NOTES:")
            .filter(|n| !n.is_empty())
            .map(str::to_string),
    })
}

/// Value after `label` on the first line carrying it, with surrounding
/// whitespace and markdown emphasis removed.
fn labelled_value<'a>(text: &'a str, label: &str) -> Option<&'a str> {
    text.lines().find_map(|line| {
        let (_, rest) = line.split_once(label)?;
        Some(rest.trim().trim_matches('*').trim())
    })
}

fn parse_grams(raw: &str) -> Option<f64> {
    let number = UNIT_SUFFIX.replace(raw.trim(), "");
    let value: f64 = number.trim().parse().ok()?;
    (value.is_finite() && value >= 0.0).then_some(value)
}

/// Instruction sent with the meal photo; asks for the line format parsed above.
pub fn vision_prompt(settings: &Settings) -> String {
    let current = settings
        .current_bs()
        .map(|bs| bs.to_string())
        .unwrap_or_else(|| "Not provided".to_string());
    format!(
        "Analyze this meal image and provide:

1. **Food Items**: List all visible foods
2. **Portion Estimates**: Estimate serving sizes
3. **Carbohydrate Content**: Estimate total carbs in grams (be specific)
4. **Macronutrients**: Estimate protein and fat content
5. **Glycemic Impact**: Note if high/medium/low glycemic index foods

User Context:
- Insulin-to-Carb Ratio (ICR): 1:{icr}
- Correction Factor: 1:{cf} mg/dL
- Target Blood Sugar: {target} mg/dL
- Current Blood Sugar: {current} mg/dL

Provide estimates in this format:
CARBS: [number]g
PROTEIN: [number]g
FAT: [number]g
CONFIDENCE: [High/Medium/Low]
FOODS: [list]
NOTES: [relevant observations]",
        icr = settings.icr(),
        cf = settings.cf(),
        target = settings.target_bs(),
    )
}
