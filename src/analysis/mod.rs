pub mod services;

pub use services::{parse_analysis, vision_prompt, MealAnalysis};
