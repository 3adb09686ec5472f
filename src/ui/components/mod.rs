pub mod answer_sheet;
pub mod dashboard;
pub mod menu;
pub mod progress_bar;
pub mod question_view;
pub mod search_results;
