mod data;
mod food;
mod habit;
mod helpers;
mod insights;
mod protein;
mod screen;
mod snippet;

pub(crate) use data::{cmd_clear, cmd_export, cmd_import};
pub(crate) use food::{cmd_food_add, cmd_food_delete, cmd_food_list};
pub(crate) use habit::{
    cmd_habit_create, cmd_habit_default, cmd_habit_delete, cmd_habit_grid, cmd_habit_hide,
    cmd_habit_icon, cmd_habit_list, cmd_habit_set, cmd_habit_today, cmd_habit_toggle,
    cmd_habit_unhide,
};
pub(crate) use insights::{cmd_insights, cmd_monthly};
pub(crate) use protein::{cmd_protein_graph, cmd_protein_log, cmd_protein_show};
pub(crate) use screen::{cmd_screen_chart, cmd_screen_log, cmd_screen_show};
pub(crate) use snippet::{cmd_snippet_save, cmd_snippet_show};
