use comfy_table::{Cell, Color, Table};

use unicircle_core::models::collection::{Collection, Visibility};
use unicircle_core::models::item::CollectionItem;

fn visibility_cell(visibility: Visibility) -> Cell {
    match visibility {
        Visibility::Public => Cell::new("public").fg(Color::Green),
        Visibility::Private => Cell::new("private").fg(Color::Yellow),
    }
}

pub fn collections_table(collections: &[Collection]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["ID", "NAME", "VISIBILITY", "TAGS", "ITEMS", "OWNER", "UPDATED"]);
    for c in collections {
        table.add_row(vec![
            Cell::new(&c.id),
            Cell::new(&c.name).fg(Color::Cyan),
            visibility_cell(c.visibility),
            Cell::new(c.tags.join(", ")),
            Cell::new(c.items.len().to_string()),
            Cell::new(&c.owner_id),
            Cell::new(c.updated_at.format("%Y-%m-%d %H:%M").to_string()),
        ]);
    }
    table
}

/// What an item points at, for display.
pub fn item_target(item: &CollectionItem) -> String {
    item.target
        .reference_id()
        .or(item.target.url())
        .unwrap_or("-")
        .to_string()
}

pub fn items_table(items: &[CollectionItem]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["ID", "TYPE", "TARGET", "NOTE", "ADDED"]);
    for item in items {
        table.add_row(vec![
            Cell::new(&item.id),
            Cell::new(item.kind()),
            Cell::new(item_target(item)),
            Cell::new(item.private_note.as_deref().unwrap_or("")),
            Cell::new(item.created_at.format("%Y-%m-%d %H:%M").to_string()),
        ]);
    }
    table
}

pub fn print_collection(c: &Collection) {
    println!("ID:           {}", c.id);
    println!("Name:         {}", c.name);
    if let Some(ref description) = c.description {
        println!("Description:  {}", description);
    }
    println!("Visibility:   {}", c.visibility);
    if !c.tags.is_empty() {
        println!("Tags:         {}", c.tags.join(", "));
    }
    println!("Owner:        {}", c.owner_id);
    println!("Created:      {}", c.created_at.format("%Y-%m-%d %H:%M:%S"));
    println!("Updated:      {}", c.updated_at.format("%Y-%m-%d %H:%M:%S"));

    if c.items.is_empty() {
        println!("\nNo items yet. Use `unicircle item add` to save one.");
    } else {
        println!("\n{}", items_table(&c.items));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unicircle_core::models::ids::CollectionId;
    use unicircle_core::models::item::ItemTarget;

    #[test]
    fn test_item_target_shows_payload() {
        let reference = CollectionItem::new(CollectionId::from("c1"), ItemTarget::resource("r1"), None);
        let link = CollectionItem::new(CollectionId::from("c1"), ItemTarget::external("https://x.test"), None);
        assert_eq!(item_target(&reference), "r1");
        assert_eq!(item_target(&link), "https://x.test");
    }
}
