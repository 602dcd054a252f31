//! Final safety results used when every provider came back empty.

use crate::intake::ColorStats;
use crate::types::DetectionResult;

pub const HEURISTIC_LABEL: &str = "Image Analysis";
pub const DEMO_LABEL: &str = "Demo Mode";
pub const DEMO_DISEASE: &str = "Demo Result - Unverified";

/// Best-effort label from mean channel intensities.
pub fn pixel_heuristic(stats: &ColorStats) -> DetectionResult {
    let (name, confidence, symptoms, severity) =
        if stats.mean_green > stats.mean_red && stats.mean_green > stats.mean_blue {
            ("Healthy Plant", 70.0, ["Good green color", "No visible spots"], "None")
        } else if stats.mean_red > stats.mean_green {
            ("Possible Fungal Disease", 60.0, ["Discoloration", "Possible spots"], "Medium")
        } else {
            ("Nutrient Deficiency or Disease", 65.0, ["Yellowing", "Possible chlorosis"], "Low")
        };

    let mut result = DetectionResult::new(name, confidence, HEURISTIC_LABEL);
    result.symptoms = symptoms.iter().map(|s| s.to_string()).collect();
    result.severity = Some(severity.to_string());
    if name == "Possible Fungal Disease" {
        result.pathogen = Some("Unknown fungus".to_string());
    }
    result.raw_response = serde_json::json!({
        "mean_rgb": [stats.mean_red, stats.mean_green, stats.mean_blue],
        "green_ratio": stats.green_ratio,
    });
    result.suggestions = vec![
        "This is a color-based estimate only; configure an AI provider for a real diagnosis"
            .to_string(),
    ];
    result
}

/// Clearly labeled placeholder for when no signal was available at all.
pub fn demo_result() -> DetectionResult {
    let mut result = DetectionResult::new(DEMO_DISEASE, 50.0, DEMO_LABEL);
    result.suggestions = vec![
        "No detection service produced an answer".to_string(),
        "Set GEMINI_API_KEY, OPENAI_API_KEY, ANTHROPIC_API_KEY or HF_TOKEN and retry".to_string(),
    ];
    result
}
