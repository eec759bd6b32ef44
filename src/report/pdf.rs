use printpdf::{BuiltinFont, Mm, PdfDocument};

use crate::planner::engine::CalculatedTargets;
use crate::planner::input::{ProfileSource, RawPlannerForm};
use crate::planner::meals::MealBreakdown;

const PAGE_WIDTH_MM: f64 = 210.0;
const PAGE_HEIGHT_MM: f64 = 297.0;
const MARGIN_MM: f64 = 20.0;

/// Everything the report renders, fetched upstream.
pub struct ReportData<'a> {
    pub display_name: Option<&'a str>,
    pub email: &'a str,
    pub source: ProfileSource,
    pub profile: Option<&'a RawPlannerForm>,
    pub targets: &'a CalculatedTargets,
    pub meals: &'a MealBreakdown,
}

/// One line of the declarative layout the renderer walks.
struct Line {
    text: String,
    size: f64,
    bold: bool,
    gap_before_mm: f64,
}

impl Line {
    fn title(text: impl Into<String>) -> Self {
        Line {
            text: text.into(),
            size: 20.0,
            bold: true,
            gap_before_mm: 0.0,
        }
    }

    fn heading(text: impl Into<String>) -> Self {
        Line {
            text: text.into(),
            size: 13.0,
            bold: true,
            gap_before_mm: 6.0,
        }
    }

    fn body(text: impl Into<String>) -> Self {
        Line {
            text: text.into(),
            size: 10.0,
            bold: false,
            gap_before_mm: 0.0,
        }
    }
}

fn source_label(source: ProfileSource) -> &'static str {
    match source {
        ProfileSource::ManualMacros => "manual macro override",
        ProfileSource::SmartPlanner => "smart planner",
        ProfileSource::ProfileEstimate => "profile estimate",
    }
}

fn layout(data: &ReportData<'_>) -> Vec<Line> {
    let mut lines = vec![
        Line::title("NutriPlan Report"),
        Line::body(format!(
            "Prepared for {}",
            data.display_name.unwrap_or(data.email)
        )),
        Line::body(format!("Active targets from: {}", source_label(data.source))),
    ];

    let t = data.targets;
    lines.push(Line::heading("Daily Targets"));
    lines.push(Line::body(format!("BMR: {:.0} kcal", t.bmr)));
    lines.push(Line::body(format!("TDEE: {:.0} kcal", t.tdee)));
    lines.push(Line::body(format!(
        "Target calories: {} kcal",
        t.target_calories
    )));
    lines.push(Line::body(format!(
        "Estimated weekly change: {:+.2} kg",
        t.weekly_change_kg
    )));

    lines.push(Line::heading("Macros"));
    lines.push(Line::body(format!(
        "Protein: {:.0} g ({:.0}%)",
        t.protein_g, t.protein_pct
    )));
    lines.push(Line::body(format!(
        "Carbs: {:.0} g ({:.0}%)",
        t.carbs_g, t.carbs_pct
    )));
    lines.push(Line::body(format!(
        "Fat: {:.0} g ({:.0}%)",
        t.fat_g, t.fat_pct
    )));

    if let Some(profile) = data.profile {
        lines.push(Line::heading("Profile"));
        if let (Some(age), Some(sex)) = (profile.age, profile.sex) {
            lines.push(Line::body(format!("Age: {age}    Sex: {}", sex.as_str())));
        }
        if let (Some(height), Some(weight)) = (profile.height_cm, profile.weight_kg) {
            lines.push(Line::body(format!(
                "Height: {height:.0} cm    Weight: {weight:.1} kg"
            )));
        }
        if let Some(level) = profile.activity_level {
            lines.push(Line::body(format!("Activity: {}", level.as_str())));
        }
        if let Some(goal) = profile.diet_goal {
            lines.push(Line::body(format!("Goal: {}", goal.as_str())));
        }
    }

    if !data.meals.rows.is_empty() {
        lines.push(Line::heading("Meal Distribution"));
        for row in &data.meals.rows {
            lines.push(Line::body(format!(
                "{}: {:.0} kcal ({:.0}%)  P {:.0} g / C {:.0} g / F {:.0} g",
                row.name, row.calories, row.calories_pct, row.protein_g, row.carbs_g, row.fat_g
            )));
        }
        if !data.meals.sums_to_100 {
            lines.push(Line::body(format!(
                "Note: meal percentages sum to {:.2}%, not 100%.",
                data.meals.pct_sum
            )));
        }
    }

    lines
}

/// Walk the layout onto A4 pages.
pub fn render_plan_pdf(data: &ReportData<'_>) -> anyhow::Result<Vec<u8>> {
    let (doc, page, layer) = PdfDocument::new(
        "NutriPlan Report",
        Mm(PAGE_WIDTH_MM as _),
        Mm(PAGE_HEIGHT_MM as _),
        "Layer 1",
    );
    let regular = doc.add_builtin_font(BuiltinFont::Helvetica)?;
    let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;

    let mut current = doc.get_page(page).get_layer(layer);
    let mut y = PAGE_HEIGHT_MM - MARGIN_MM;

    for line in layout(data) {
        let line_height = line.size * 0.5;
        y -= line.gap_before_mm + line_height;
        if y < MARGIN_MM {
            let (page, layer) =
                doc.add_page(Mm(PAGE_WIDTH_MM as _), Mm(PAGE_HEIGHT_MM as _), "Layer 1");
            current = doc.get_page(page).get_layer(layer);
            y = PAGE_HEIGHT_MM - MARGIN_MM - line_height;
        }
        let font = if line.bold { &bold } else { &regular };
        current.use_text(line.text, line.size as _, Mm(MARGIN_MM as _), Mm(y as _), font);
    }

    let bytes = doc.save_to_bytes()?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::engine::DietGoal;
    use crate::planner::macros::{default_split, targets_from_split};
    use crate::planner::meals::{distribute, DailyTotals, MealSlot};

    fn sample() -> (CalculatedTargets, MealBreakdown) {
        let targets = targets_from_split(1600.0, 2000.0, 1800, default_split(DietGoal::Recomp));
        let slots = vec![
            MealSlot {
                name: "Breakfast".into(),
                calories_pct: 30.0,
            },
            MealSlot {
                name: "Dinner".into(),
                calories_pct: 70.0,
            },
        ];
        let meals = distribute(DailyTotals::from(&targets), &slots);
        (targets, meals)
    }

    #[test]
    fn layout_covers_targets_and_meals() {
        let (targets, meals) = sample();
        let data = ReportData {
            display_name: Some("Alex"),
            email: "alex@example.com",
            source: ProfileSource::SmartPlanner,
            profile: None,
            targets: &targets,
            meals: &meals,
        };
        let lines = layout(&data);
        let all: String = lines.iter().map(|l| l.text.as_str()).collect::<Vec<_>>().join("\n");
        assert!(all.contains("Prepared for Alex"));
        assert!(all.contains("Target calories: 1800 kcal"));
        assert!(all.contains("Breakfast"));
        assert!(all.contains("smart planner"));
    }

    #[test]
    fn render_produces_pdf_bytes() {
        let (targets, meals) = sample();
        let data = ReportData {
            display_name: None,
            email: "alex@example.com",
            source: ProfileSource::ManualMacros,
            profile: None,
            targets: &targets,
            meals: &meals,
        };
        let bytes = render_plan_pdf(&data).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
