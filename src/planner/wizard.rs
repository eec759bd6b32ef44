use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::engine::{calculate_bmr, calculate_tdee};
use super::input::{normalize, RawPlannerForm};
use super::{compute_plans, PlanBundle};

/// The five linear onboarding steps.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Welcome,
    BasicInfo,
    ReviewEstimate,
    Customize,
    Confirm,
}

impl WizardStep {
    pub fn index(self) -> u8 {
        match self {
            WizardStep::Welcome => 1,
            WizardStep::BasicInfo => 2,
            WizardStep::ReviewEstimate => 3,
            WizardStep::Customize => 4,
            WizardStep::Confirm => 5,
        }
    }

    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            1 => Some(WizardStep::Welcome),
            2 => Some(WizardStep::BasicInfo),
            3 => Some(WizardStep::ReviewEstimate),
            4 => Some(WizardStep::Customize),
            5 => Some(WizardStep::Confirm),
            _ => None,
        }
    }

    fn next(self) -> WizardStep {
        match self {
            WizardStep::Welcome => WizardStep::BasicInfo,
            WizardStep::BasicInfo => WizardStep::ReviewEstimate,
            WizardStep::ReviewEstimate => WizardStep::Customize,
            WizardStep::Customize | WizardStep::Confirm => WizardStep::Confirm,
        }
    }
}

/// Explicit session identity handed into the computation layer.
///
/// Navigation and persistence stay with the controller that receives the
/// returned [`Transition`]; nothing in here triggers side effects.
#[derive(Debug, Clone, Copy)]
pub struct SessionContext {
    pub user_id: Uuid,
    /// Client being viewed by an authorized coach, if any.
    pub acting_for: Option<Uuid>,
    pub onboarding_complete: bool,
}

impl SessionContext {
    pub fn for_user(user_id: Uuid) -> Self {
        Self {
            user_id,
            acting_for: None,
            onboarding_complete: false,
        }
    }

    /// The account whose records are being read or written.
    pub fn subject(&self) -> Uuid {
        self.acting_for.unwrap_or(self.user_id)
    }
}

/// Live BMR/TDEE preview shown on the review step.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct EstimatePreview {
    pub bmr: f64,
    pub tdee: f64,
}

/// Outcome of a step submission. Callers react to these values; the wizard
/// itself never navigates, persists, or redirects.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Transition {
    /// Validation failed; stay on the step with user-facing messages.
    Stay {
        step: WizardStep,
        errors: Vec<String>,
    },
    /// Moved forward, optionally carrying a live preview.
    Advanced {
        step: WizardStep,
        estimate: Option<EstimatePreview>,
        preview: Option<PlanBundle>,
    },
    /// Wizard finished; the caller persists the bundle and marks onboarding.
    Completed { plans: PlanBundle },
}

/// In-memory wizard state. There is no draft persistence; abandoning loses
/// unsaved progress.
#[derive(Debug, Clone, Default)]
pub struct Wizard {
    form: RawPlannerForm,
}

impl Wizard {
    pub fn with_form(form: RawPlannerForm) -> Self {
        Self { form }
    }

    pub fn form(&self) -> &RawPlannerForm {
        &self.form
    }

    /// Submit a step: merge the newly entered fields and attempt to advance.
    pub fn advance(
        &mut self,
        _ctx: &SessionContext,
        step: WizardStep,
        entered: &RawPlannerForm,
    ) -> Transition {
        self.form = self.form.merged_with(entered);

        match step {
            WizardStep::Welcome => Transition::Advanced {
                step: step.next(),
                estimate: None,
                preview: None,
            },
            WizardStep::BasicInfo => self.review_estimate(step),
            WizardStep::ReviewEstimate | WizardStep::Customize => self.preview(step),
            WizardStep::Confirm => match normalize(&self.form).map_err(|e| e.to_string()) {
                Ok(input) => match compute_plans(&input) {
                    Ok(plans) => Transition::Completed { plans },
                    Err(e) => Transition::Stay {
                        step,
                        errors: vec![e.to_string()],
                    },
                },
                Err(message) => Transition::Stay {
                    step,
                    errors: vec![message],
                },
            },
        }
    }

    fn review_estimate(&self, step: WizardStep) -> Transition {
        let mut errors = Vec::new();
        if self.form.age.is_none() {
            errors.push("age is required".to_string());
        }
        if self.form.sex.is_none() {
            errors.push("sex is required".to_string());
        }
        if self.form.height_cm.is_none() {
            errors.push("height is required".to_string());
        }
        if self.form.weight_kg.is_none() {
            errors.push("weight is required".to_string());
        }
        if self.form.activity_level.is_none() {
            errors.push("activity level is required".to_string());
        }
        let (Some(age), Some(sex), Some(height_cm), Some(weight_kg), Some(activity)) = (
            self.form.age,
            self.form.sex,
            self.form.height_cm,
            self.form.weight_kg,
            self.form.activity_level,
        ) else {
            return Transition::Stay { step, errors };
        };

        let age = match u32::try_from(age) {
            Ok(age) => age,
            Err(_) => {
                return Transition::Stay {
                    step,
                    errors: vec!["age must be positive".to_string()],
                }
            }
        };
        let bmr = match calculate_bmr(sex, weight_kg, height_cm, age) {
            Ok(bmr) => bmr,
            Err(e) => {
                return Transition::Stay {
                    step,
                    errors: vec![e.to_string()],
                }
            }
        };
        let tdee = calculate_tdee(bmr, activity);

        Transition::Advanced {
            step: step.next(),
            estimate: Some(EstimatePreview { bmr, tdee }),
            preview: None,
        }
    }

    fn preview(&self, step: WizardStep) -> Transition {
        match normalize(&self.form) {
            Ok(input) => match compute_plans(&input) {
                Ok(plans) => Transition::Advanced {
                    step: step.next(),
                    estimate: None,
                    preview: Some(plans),
                },
                Err(e) => Transition::Stay {
                    step,
                    errors: vec![e.to_string()],
                },
            },
            Err(e) => Transition::Stay {
                step,
                errors: vec![e.to_string()],
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::engine::{ActivityLevel, DietGoal, Sex};

    fn ctx() -> SessionContext {
        SessionContext::for_user(Uuid::new_v4())
    }

    fn basic_info() -> RawPlannerForm {
        RawPlannerForm {
            age: Some(25),
            sex: Some(Sex::Female),
            height_cm: Some(165.0),
            weight_kg: Some(60.0),
            activity_level: Some(ActivityLevel::Sedentary),
            ..Default::default()
        }
    }

    #[test]
    fn happy_path_reaches_completed() {
        let ctx = ctx();
        let mut wizard = Wizard::default();

        let t = wizard.advance(&ctx, WizardStep::Welcome, &RawPlannerForm::default());
        assert!(matches!(
            t,
            Transition::Advanced {
                step: WizardStep::BasicInfo,
                ..
            }
        ));

        let t = wizard.advance(&ctx, WizardStep::BasicInfo, &basic_info());
        match t {
            Transition::Advanced {
                step,
                estimate: Some(estimate),
                ..
            } => {
                assert_eq!(step, WizardStep::ReviewEstimate);
                assert!((estimate.bmr - 1345.25).abs() < 1e-9);
                assert!((estimate.tdee - 1345.25 * 1.2).abs() < 1e-9);
            }
            other => panic!("unexpected transition: {other:?}"),
        }

        let goal = RawPlannerForm {
            diet_goal: Some(DietGoal::FatLoss),
            target_weight_1m_kg: Some(58.0),
            ..Default::default()
        };
        let t = wizard.advance(&ctx, WizardStep::ReviewEstimate, &goal);
        match t {
            Transition::Advanced {
                step,
                preview: Some(bundle),
                ..
            } => {
                assert_eq!(step, WizardStep::Customize);
                assert_eq!(bundle.default_plan.target_calories, 1545);
                assert!(bundle.custom_plan.is_none());
            }
            other => panic!("unexpected transition: {other:?}"),
        }

        let custom = RawPlannerForm {
            custom_total_calories: Some(1600.0),
            ..Default::default()
        };
        let t = wizard.advance(&ctx, WizardStep::Customize, &custom);
        match t {
            Transition::Advanced {
                step,
                preview: Some(bundle),
                ..
            } => {
                assert_eq!(step, WizardStep::Confirm);
                assert_eq!(
                    bundle.custom_plan.as_ref().map(|p| p.target_calories),
                    Some(1600)
                );
            }
            other => panic!("unexpected transition: {other:?}"),
        }

        let t = wizard.advance(&ctx, WizardStep::Confirm, &RawPlannerForm::default());
        match t {
            Transition::Completed { plans } => {
                assert_eq!(plans.default_plan.target_calories, 1545);
            }
            other => panic!("unexpected transition: {other:?}"),
        }
    }

    #[test]
    fn missing_basic_info_stays_with_all_messages() {
        let ctx = ctx();
        let mut wizard = Wizard::default();
        let partial = RawPlannerForm {
            age: Some(25),
            ..Default::default()
        };
        let t = wizard.advance(&ctx, WizardStep::BasicInfo, &partial);
        match t {
            Transition::Stay { step, errors } => {
                assert_eq!(step, WizardStep::BasicInfo);
                assert_eq!(errors.len(), 4);
            }
            other => panic!("unexpected transition: {other:?}"),
        }
    }

    #[test]
    fn confirm_without_goal_stays() {
        let ctx = ctx();
        let mut wizard = Wizard::with_form(basic_info());
        let t = wizard.advance(&ctx, WizardStep::Confirm, &RawPlannerForm::default());
        match t {
            Transition::Stay { errors, .. } => {
                assert!(errors[0].contains("diet_goal"));
            }
            other => panic!("unexpected transition: {other:?}"),
        }
    }

    #[test]
    fn subject_prefers_acting_for() {
        let coach = Uuid::new_v4();
        let client = Uuid::new_v4();
        let ctx = SessionContext {
            user_id: coach,
            acting_for: Some(client),
            onboarding_complete: true,
        };
        assert_eq!(ctx.subject(), client);
        assert_eq!(SessionContext::for_user(coach).subject(), coach);
    }

    #[test]
    fn step_indices_round_trip() {
        for i in 1..=5u8 {
            assert_eq!(WizardStep::from_index(i).unwrap().index(), i);
        }
        assert!(WizardStep::from_index(0).is_none());
        assert!(WizardStep::from_index(6).is_none());
    }
}
