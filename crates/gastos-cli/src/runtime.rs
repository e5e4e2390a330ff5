// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use gastos_app::{Item, ItemDraft, ItemId};
use gastos_store::Store;

pub struct StoreRuntime<'a> {
    store: &'a mut Store,
}

impl<'a> StoreRuntime<'a> {
    pub fn new(store: &'a mut Store) -> Self {
        Self { store }
    }
}

impl gastos_tui::AppRuntime for StoreRuntime<'_> {
    fn list_items(&mut self) -> Result<Vec<Item>> {
        Ok(self.store.items().to_vec())
    }

    fn add_item(&mut self, draft: &ItemDraft) -> Result<ItemId> {
        self.store.add(draft)
    }

    fn begin_edit(&mut self, id: ItemId) -> Result<Option<Item>> {
        if !self.store.begin_edit(id) {
            return Ok(None);
        }
        Ok(self.store.selected().cloned())
    }

    fn commit_edit(&mut self, draft: &ItemDraft) -> Result<bool> {
        self.store.update_selected(draft);
        self.store.commit_edit()
    }

    fn cancel_edit(&mut self) -> Result<()> {
        self.store.cancel_edit();
        Ok(())
    }

    fn delete_item(&mut self, id: ItemId) -> Result<()> {
        self.store.delete(id)
    }

    fn toggle_expanded(&mut self, id: ItemId) -> Result<()> {
        self.store.toggle_expanded(id)
    }

    fn toggle_expand_all(&mut self) -> Result<()> {
        self.store.toggle_expand_all()
    }
}

#[cfg(test)]
mod tests {
    use super::StoreRuntime;
    use anyhow::Result;
    use gastos_app::{ItemDraft, ItemId};
    use gastos_store::Store;
    use gastos_tui::AppRuntime;

    fn draft(name: &str, quantity: &str, price: &str) -> ItemDraft {
        ItemDraft {
            name: name.to_owned(),
            quantity: quantity.to_owned(),
            price: price.to_owned(),
        }
    }

    #[test]
    fn add_item_appends_and_lists_the_new_entry() -> Result<()> {
        let mut store = Store::open_memory()?;
        let mut runtime = StoreRuntime::new(&mut store);

        let id = runtime.add_item(&draft("Leche", "2", "3"))?;
        let items = runtime.list_items()?;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, id);
        assert_eq!(items[0].name, "Leche");
        Ok(())
    }

    #[test]
    fn edit_round_trip_replaces_the_entry() -> Result<()> {
        let mut store = Store::open_memory()?;
        let mut runtime = StoreRuntime::new(&mut store);

        let id = runtime.add_item(&draft("Pan", "1", "2"))?;
        let prefill = runtime.begin_edit(id)?.expect("item should be selectable");
        assert_eq!(prefill.name, "Pan");

        assert!(runtime.commit_edit(&draft("Pan integral", "3", "4.5"))?);
        let items = runtime.list_items()?;
        assert_eq!(items[0].name, "Pan integral");
        assert_eq!(items[0].quantity, 3.0);
        assert_eq!(items[0].price, 4.5);
        Ok(())
    }

    #[test]
    fn begin_edit_unknown_id_returns_none() -> Result<()> {
        let mut store = Store::open_memory()?;
        let mut runtime = StoreRuntime::new(&mut store);

        assert!(runtime.begin_edit(ItemId::new(42))?.is_none());
        Ok(())
    }

    #[test]
    fn commit_edit_without_selection_reports_no_op() -> Result<()> {
        let mut store = Store::open_memory()?;
        let mut runtime = StoreRuntime::new(&mut store);

        runtime.add_item(&draft("Huevos", "12", "6"))?;
        assert!(!runtime.commit_edit(&draft("Huevos", "6", "3"))?);
        assert_eq!(runtime.list_items()?[0].quantity, 12.0);
        Ok(())
    }

    #[test]
    fn cancel_edit_discards_pending_changes() -> Result<()> {
        let mut store = Store::open_memory()?;
        let mut runtime = StoreRuntime::new(&mut store);

        let id = runtime.add_item(&draft("Arroz", "1", "2"))?;
        runtime.begin_edit(id)?;
        runtime.cancel_edit()?;
        assert!(!runtime.commit_edit(&draft("Arroz", "9", "9"))?);
        assert_eq!(runtime.list_items()?[0].quantity, 1.0);
        Ok(())
    }

    #[test]
    fn delete_and_toggle_flow_round_trips() -> Result<()> {
        let mut store = Store::open_memory()?;
        let mut runtime = StoreRuntime::new(&mut store);

        let first = runtime.add_item(&draft("Queso", "1", "8"))?;
        let second = runtime.add_item(&draft("Cafe", "1", "10"))?;

        runtime.toggle_expanded(first)?;
        assert!(runtime.list_items()?[0].expanded);

        runtime.toggle_expand_all()?;
        assert!(runtime.list_items()?.iter().all(|item| item.expanded));

        runtime.delete_item(second)?;
        let items = runtime.list_items()?;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, first);
        Ok(())
    }
}
