// Keyword matching for passive check-ins.
//
// Each category is matched independently, so one message can count for
// several categories. Results come back in a fixed order: exercise, gym,
// badminton, cricket.

use super::points_models::Category;

const BADMINTON_EMOJI: &str = "🏸";
const CRICKET_EMOJI: &str = "🏏";

/// Categories a check-in message counts towards. Matching is case-insensitive.
pub fn match_categories(text: &str) -> Vec<Category> {
    let text = text.to_lowercase();
    let mut matched = Vec::new();

    // "pushups" and "dumbbells" are covered by their stems; "dumbell" is the
    // common misspelling and is accepted alongside "dumbbell".
    if text.contains("pushup") || text.contains("dumbell") || text.contains("dumbbell") {
        matched.push(Category::Exercise);
    }
    if text.contains("gym") {
        matched.push(Category::Gym);
    }
    if text.contains("badminton") || text.contains(BADMINTON_EMOJI) {
        matched.push(Category::Badminton);
    }
    if text.contains("cricket") || text.contains(CRICKET_EMOJI) {
        matched.push(Category::Cricket);
    }

    matched
}
