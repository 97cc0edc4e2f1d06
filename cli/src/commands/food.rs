use anyhow::Result;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use habitdash_core::models::FoodItem;
use habitdash_core::service::HabitService;

use super::helpers::{no_neg_zero, print_json, truncate};

pub(crate) fn print_food_table(foods: &[FoodItem]) {
    #[derive(Tabled)]
    struct FoodRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Protein/serving")]
        protein: String,
    }

    let rows: Vec<FoodRow> = foods
        .iter()
        .map(|f| FoodRow {
            id: f.id,
            name: truncate(&f.name, 35),
            protein: format!("{}g", no_neg_zero(f.protein_per_serving)),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn cmd_food_add(svc: &HabitService, name: &str, protein: f64, json: bool) -> Result<()> {
    let food = svc.add_food(name, protein)?;

    if json {
        print_json(&food)?;
    } else {
        println!(
            "Added {} ({}g protein per serving) [id: {}]",
            food.name,
            no_neg_zero(food.protein_per_serving),
            food.id
        );
    }

    Ok(())
}

pub(crate) fn cmd_food_list(svc: &HabitService, search: Option<&str>, json: bool) -> Result<()> {
    let foods = match search {
        Some(q) => svc.search_foods(q)?,
        None => svc.foods()?,
    };

    if json {
        print_json(&foods)?;
    } else if foods.is_empty() {
        eprintln!("No foods found. Use `habitdash food add` to add one.");
    } else {
        print_food_table(&foods);
    }

    Ok(())
}

pub(crate) fn cmd_food_delete(svc: &HabitService, id: i64, json: bool) -> Result<()> {
    let deleted = svc.delete_food(id)?;

    if json {
        println!("{}", serde_json::json!({ "deleted": deleted, "id": id }));
    } else if deleted {
        println!("Deleted food {id}");
    } else {
        eprintln!("No food with id {id}");
    }

    Ok(())
}
