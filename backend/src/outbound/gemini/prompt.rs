//! Prompt text sent to the model.

use std::fmt::Write as _;

use crate::domain::FoodIntakeItem;

pub(super) fn food_analysis_prompt(nutrition_language: &str) -> String {
    format!(
        "You are a nutritional expert. Analyze the provided food photo.\n\
         Respond with the food name (in the language it is most commonly known, \
         or English if unsure) and its detailed nutritional information in \
         {nutrition_language}.\n\
         Make the nutritional information comprehensive, one fact per line."
    )
}

pub(super) fn daily_summary_prompt(items: &[FoodIntakeItem]) -> String {
    let mut prompt = String::from(
        "You are a nutrition expert. Summarize the following daily nutritional \
         intake and highlight potential imbalances or areas for improvement.\n\n\
         Food items:\n",
    );
    for item in items {
        let _ = write!(
            prompt,
            "- {}: Calories: {}, Protein: {}g, Fat: {}g, Carbs: {}g",
            item.name(),
            item.calories(),
            item.protein_g(),
            item.fat_g(),
            item.carbohydrates_g(),
        );
        if let Some(vitamin_c) = item.vitamin_c_mg() {
            let _ = write!(prompt, ", Vitamin C: {vitamin_c}mg");
        }
        prompt.push('\n');
    }
    prompt
}
