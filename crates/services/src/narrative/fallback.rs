use quiz_core::model::{DimensionId, DimensionScores, InstrumentConfig, Narrative};

/// Deterministic local narrative generator.
///
/// Templates are keyed by the primary/secondary pair so a result is always
/// producible offline; the wording is intentionally generic but references
/// the instrument's own dimension display names and computed averages.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalNarrativeGenerator;

impl LocalNarrativeGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    #[must_use]
    pub fn generate(
        &self,
        config: &InstrumentConfig,
        primary_type: &DimensionId,
        secondary_type: &DimensionId,
        scores: &DimensionScores,
    ) -> Narrative {
        let primary = display(config, primary_type);
        let secondary = display(config, secondary_type);
        let primary_score = scores.get(primary_type).unwrap_or(0.0);
        let secondary_score = scores.get(secondary_type).unwrap_or(0.0);

        let interpretation = format!(
            "Your strongest area is {primary} (average {primary_score:.1} of 5), \
             followed by {secondary} ({secondary_score:.1} of 5). Together they \
             describe the style you lean on most in everyday situations."
        );

        let recommendations = format!(
            "Lean into {primary} deliberately: it is where your responses were \
             most consistent. When {primary} alone does not fit the moment, \
             {secondary} is your most natural alternative, so practice switching \
             between the two."
        );

        let strengths = format!(
            "A clear {primary} profile usually means people around you can \
             predict and rely on how you engage. Your secondary strength in \
             {secondary} adds flexibility that a single-style profile lacks."
        );

        let areas_for_growth = {
            let lowest = scores
                .iter()
                .filter(|(_, score)| *score > 0.0)
                .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
                .map(|(id, score)| (display(config, id), score));
            match lowest {
                Some((name, score)) if name != primary => format!(
                    "{name} scored lowest for you ({score:.1} of 5). Small, \
                     deliberate practice there will broaden your range more than \
                     further sharpening {primary}."
                ),
                _ => format!(
                    "Your scores are closely grouped. Revisit the assessment \
                     after some time; shifts between {primary} and {secondary} \
                     often show up across life changes."
                ),
            }
        };

        Narrative {
            interpretation,
            recommendations,
            strengths,
            areas_for_growth,
        }
    }
}

fn display<'a>(config: &'a InstrumentConfig, dimension: &'a DimensionId) -> &'a str {
    config.display_name(dimension).unwrap_or(dimension.as_str())
}
