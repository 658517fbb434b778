use tracing::{info, warn};

use super::repo_types::{MealEntry, MealSource};
use crate::analysis::{parse_analysis, MealAnalysis};
use crate::dosing::Estimate;
use crate::errors::CoreError;
use crate::images::UploadItem;
use crate::llm::VisionAnalyzer;
use crate::session::SessionContext;
use crate::settings::SettingField;

/// Upper bound of the manual entry form.
pub const MAX_MANUAL_CARBS: f64 = 300.0;

#[derive(Debug)]
pub struct PhotoOutcome {
    pub entry: MealEntry,
    pub analysis: MealAnalysis,
}

pub fn log_manual_meal(
    ctx: &mut SessionContext,
    meal: Option<String>,
    carbs: f64,
    current_bs: Option<i32>,
) -> Result<MealEntry, CoreError> {
    if !(0.0..=MAX_MANUAL_CARBS).contains(&carbs) {
        return Err(CoreError::invalid(format!(
            "carbs must be between 0 and {MAX_MANUAL_CARBS}, got {carbs}"
        )));
    }
    let meal = meal.map(|m| m.trim().to_string()).filter(|m| !m.is_empty());
    // the reading entered with the meal applies to this meal only
    let settings = ctx.settings.snapshot().with_current_bs(current_bs)?;
    let estimate = Estimate::from_settings(carbs, &settings)?;

    let summary = format!(
        "Manual entry: {}\nCARBS: {carbs}g",
        meal.as_deref().unwrap_or_default()
    );
    let entry = MealEntry::new(estimate, settings, MealSource::Manual, meal, None);

    ctx.last_analysis = Some(summary);
    ctx.last_estimate = Some(estimate);
    ctx.meals.append(entry.clone());
    info!(meal_id = %entry.id(), carbs, total = estimate.total(), "manual meal logged");
    Ok(entry)
}

/// Runs the vision call, parses it and logs the meal. The session is only
/// touched once every step has succeeded.
pub async fn log_photo_meal(
    ctx: &mut SessionContext,
    vision: &dyn VisionAnalyzer,
    image: &UploadItem,
    current_bs: Option<i32>,
) -> Result<PhotoOutcome, CoreError> {
    let mut settings = ctx.settings.snapshot();
    if current_bs.is_some() {
        settings = settings.with_current_bs(current_bs)?;
    }

    let text = vision.analyze(image, &settings).await?;
    let analysis = match parse_analysis(&text) {
        Ok(a) => a,
        Err(reason) => {
            warn!(error = %reason, "vision reply had no usable carbs");
            return Err(CoreError::Parse {
                reason,
                analysis: Some(text),
            });
        }
    };
    let estimate = Estimate::from_settings(analysis.carbs_g, &settings)?;
    let entry = MealEntry::new(
        estimate,
        settings,
        MealSource::Photo,
        None,
        Some(text.clone()),
    );

    if current_bs.is_some() {
        ctx.settings.update(SettingField::CurrentGlucose, current_bs)?;
    }
    ctx.last_analysis = Some(text);
    ctx.last_estimate = Some(estimate);
    ctx.meals.append(entry.clone());
    info!(
        meal_id = %entry.id(),
        carbs = analysis.carbs_g,
        total = estimate.total(),
        "photo meal logged"
    );
    Ok(PhotoOutcome { entry, analysis })
}

#[cfg(test)]
mod meal_service_tests {
    use bytes::Bytes;

    use super::*;
    use crate::llm::fakes::ScriptedVision;

    fn photo() -> UploadItem {
        UploadItem::validated(Bytes::from_static(b"\x89PNG"), "image/png").unwrap()
    }

    #[test]
    fn manual_meal_uses_entered_reading() {
        let mut ctx = SessionContext::default();
        let entry = log_manual_meal(&mut ctx, Some(" Breakfast ".into()), 80.0, Some(180)).unwrap();
        assert_eq!(entry.meal(), Some("Breakfast"));
        assert_eq!(entry.source(), MealSource::Manual);
        assert!((entry.estimate().total() - 9.6).abs() < 1e-9);
        assert_eq!(entry.settings_used().current_bs(), Some(180));
        // the session reading is left alone
        assert_eq!(ctx.settings.snapshot().current_bs(), None);
        assert_eq!(
            ctx.last_analysis.as_deref(),
            Some("Manual entry: Breakfast\nCARBS: 80g")
        );
        assert_eq!(ctx.meals.len(), 1);
    }

    #[test]
    fn manual_meal_bounds() {
        let mut ctx = SessionContext::default();
        assert!(log_manual_meal(&mut ctx, None, 301.0, None).is_err());
        assert!(log_manual_meal(&mut ctx, None, 50.0, Some(20)).is_err());
        assert!(ctx.meals.is_empty());
        assert!(ctx.last_estimate.is_none());
    }

    #[tokio::test]
    async fn photo_meal_commits_on_success() {
        let mut ctx = SessionContext::default();
        let vision = ScriptedVision::replying("CARBS: 45g\nPROTEIN: 10g\nCONFIDENCE: High");
        let out = log_photo_meal(&mut ctx, &vision, &photo(), Some(150)).await.unwrap();

        assert_eq!(out.analysis.carbs_g, 45.0);
        assert_eq!(out.entry.source(), MealSource::Photo);
        // 4.5 meal + 1.0 correction
        assert!((out.entry.estimate().total() - 5.5).abs() < 1e-9);
        assert_eq!(ctx.settings.snapshot().current_bs(), Some(150));
        assert_eq!(ctx.meals.len(), 1);
        assert!(ctx.last_analysis.as_deref().unwrap().starts_with("CARBS: 45g"));
    }

    #[tokio::test]
    async fn parse_failure_returns_raw_text_and_commits_nothing() {
        let mut ctx = SessionContext::default();
        let vision = ScriptedVision::replying("I can't tell what this is.");
        let err = log_photo_meal(&mut ctx, &vision, &photo(), Some(150))
            .await
            .unwrap_err();
        match err {
            CoreError::Parse { analysis, .. } => {
                assert_eq!(analysis.as_deref(), Some("I can't tell what this is."))
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(ctx.meals.is_empty());
        assert!(ctx.last_analysis.is_none());
        assert_eq!(ctx.settings.snapshot().current_bs(), None);
    }

    #[tokio::test]
    async fn vision_failure_leaves_session_unchanged() {
        let mut ctx = SessionContext::default();
        log_manual_meal(&mut ctx, None, 20.0, None).unwrap();
        let vision = ScriptedVision::failing("timeout");
        let err = log_photo_meal(&mut ctx, &vision, &photo(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Collaborator(_)));
        assert_eq!(ctx.meals.len(), 1);
        assert_eq!(
            ctx.last_analysis.as_deref(),
            Some("Manual entry: \nCARBS: 20g")
        );
    }
}
